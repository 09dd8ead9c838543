//! Best-effort bulk loading of rows into a provisioned collection.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::input::{CellValue, RawTable};
use crate::schema::AttributeKind;
use crate::store::{CollectionHandle, DocumentStore, StoreObject};

/// Outcome of loading one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Rows submitted to the store.
    pub attempted: usize,
    /// Rows the store accepted.
    pub accepted: usize,
    /// Rows the store rejected.
    pub rejected: usize,
    /// A bounded sample of rejection reasons.
    pub failure_samples: Vec<String>,
}

impl LoadReport {
    /// Returns true if some but not necessarily all rows were rejected.
    pub fn is_partial(&self) -> bool {
        self.rejected > 0
    }

    fn record_failure(&mut self, reason: String, limit: usize) {
        self.rejected += 1;
        if self.failure_samples.len() < limit {
            self.failure_samples.push(reason);
        }
    }
}

/// Streams table rows into the store in batched writes.
pub struct BulkLoader {
    store: Arc<dyn DocumentStore>,
    batch_size: usize,
    max_failure_samples: usize,
}

impl BulkLoader {
    /// Create a loader that writes `batch_size` rows at a time.
    pub fn new(store: Arc<dyn DocumentStore>, batch_size: usize, max_failure_samples: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            max_failure_samples,
        }
    }

    /// Load every row of `table` into the collection behind `handle`.
    ///
    /// Rejected rows are counted and never abort the remaining rows. A
    /// write that fails as a whole counts each of its rows as rejected.
    pub fn load(&self, handle: &CollectionHandle, table: &RawTable) -> LoadReport {
        let mut report = LoadReport::default();
        let objects: Vec<StoreObject> = table
            .rows
            .iter()
            .map(|row| to_object(handle, row))
            .collect();

        for (chunk_index, chunk) in objects.chunks(self.batch_size).enumerate() {
            report.attempted += chunk.len();
            let first_row = chunk_index * self.batch_size;

            match self.store.write_objects(&handle.name, chunk) {
                Ok(outcome) => {
                    report.accepted += outcome.accepted;
                    for error in outcome.errors {
                        report.record_failure(
                            format!("row {}: {}", first_row + error.index + 1, error.message),
                            self.max_failure_samples,
                        );
                    }
                }
                Err(e) => {
                    warn!(collection = %handle.name, rows = chunk.len(), "batch write failed: {}", e);
                    for offset in 0..chunk.len() {
                        report.record_failure(
                            format!("row {}: {}", first_row + offset + 1, e),
                            self.max_failure_samples,
                        );
                    }
                }
            }
        }

        if report.is_partial() {
            warn!(
                collection = %handle.name,
                accepted = report.accepted,
                rejected = report.rejected,
                "partial load"
            );
        } else {
            debug!(collection = %handle.name, accepted = report.accepted, "loaded rows");
        }
        report
    }
}

/// Build one stored object, omitting absent values.
fn to_object(handle: &CollectionHandle, row: &[CellValue]) -> StoreObject {
    let mut object = StoreObject::new();
    for rename in handle.schema.renames.iter() {
        let Some(cell) = row.get(rename.position) else {
            continue;
        };
        let kind = handle
            .schema
            .get_attribute(&rename.attribute)
            .map(|a| a.kind);
        if let Some(value) = coerce(cell, kind) {
            object.insert(rename.attribute.clone(), value);
        }
    }
    object
}

fn coerce(cell: &CellValue, kind: Option<AttributeKind>) -> Option<Value> {
    match (kind, cell) {
        (_, CellValue::Absent) => None,
        (Some(AttributeKind::Text), CellValue::Integer(_) | CellValue::Float(_)) => {
            Some(Value::String(cell.to_string()))
        }
        _ => cell.to_json(),
    }
}
