//! Schema construction from raw tables.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::{Result, VellumError};
use crate::inference::KindAnalysis;
use crate::input::RawTable;

use super::naming::{is_reserved, sanitize, RESERVED_SUFFIX};
use super::table::{AttributeSpec, RenameMap, TableSchema};

/// Builds collection schemas from raw tables.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder;

impl SchemaBuilder {
    /// Create a new schema builder.
    pub fn new() -> Self {
        Self
    }

    /// Build the schema and its description for one table.
    ///
    /// Columns without any present value are dropped. Reserved names get
    /// the `_field` suffix and names that still collide get `_2`, `_3`, ...
    pub fn build(&self, table_name: &str, table: &RawTable) -> Result<(TableSchema, String)> {
        let mut attributes = Vec::new();
        let mut renames = RenameMap::new();
        let mut taken: HashSet<String> = HashSet::new();

        for (position, label) in table.headers.iter().enumerate() {
            let analysis = KindAnalysis::from_values(table.column_values(position));
            if analysis.is_all_absent() {
                debug!(table = table_name, column = %label, "dropping column with no values");
                continue;
            }

            let mut name = sanitize(label);
            if is_reserved(&name) {
                name.push_str(RESERVED_SUFFIX);
                info!(table = table_name, "Renamed reserved column '{}' to '{}'", label, name);
            } else if name != *label {
                info!(table = table_name, "Renamed invalid column '{}' to '{}'", label, name);
            }

            if taken.contains(&name) {
                let deduped = first_free(&name, &taken);
                warn!(
                    table = table_name,
                    "Column '{}' collides with an earlier column as '{}', stored as '{}'",
                    label,
                    name,
                    deduped
                );
                name = deduped;
            }
            taken.insert(name.clone());

            renames.insert(position, label.clone(), name.clone());
            attributes.push(AttributeSpec::new(name, analysis.kind()));
        }

        if attributes.is_empty() {
            return Err(VellumError::EmptyData(format!(
                "table '{}' has no column with values",
                table_name
            )));
        }

        let schema = TableSchema {
            table_name: table_name.to_string(),
            attributes,
            renames,
        };
        let description = schema.describe();
        Ok((schema, description))
    }
}

fn first_free(name: &str, taken: &HashSet<String>) -> String {
    (2..)
        .map(|n| format!("{}_{}", name, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}
