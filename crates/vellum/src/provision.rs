//! Collection provisioning with destructive idempotency.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, VellumError};
use crate::schema::TableSchema;
use crate::store::{CollectionHandle, DocumentStore, VectorizerPolicy};

/// What an ingestion run deletes before any file is processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgePolicy {
    /// Delete every collection in the store.
    #[default]
    Reset,
    /// Only replace collections whose name is reused by the current batch.
    Additive,
}

impl fmt::Display for PurgePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurgePolicy::Reset => write!(f, "reset"),
            PurgePolicy::Additive => write!(f, "additive"),
        }
    }
}

impl FromStr for PurgePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reset" => Ok(PurgePolicy::Reset),
            "additive" => Ok(PurgePolicy::Additive),
            _ => Err(format!(
                "Unknown purge policy: {}. Use 'reset' or 'additive'",
                s
            )),
        }
    }
}

/// Creates collections that match a schema exactly.
pub struct CollectionProvisioner {
    store: Arc<dyn DocumentStore>,
    vectorizer: VectorizerPolicy,
}

impl CollectionProvisioner {
    /// Create a provisioner over a store.
    pub fn new(store: Arc<dyn DocumentStore>, vectorizer: VectorizerPolicy) -> Self {
        Self { store, vectorizer }
    }

    /// Guarantee a fresh collection named `name` with exactly this schema.
    ///
    /// An existing collection of the same name is deleted in full first.
    /// Schemas are never altered in place.
    pub fn provision(&self, name: &str, schema: &TableSchema) -> Result<CollectionHandle> {
        let exists = self
            .store
            .collection_exists(name)
            .map_err(|e| provision_error(name, e))?;

        if exists {
            self.store
                .delete_collection(name)
                .map_err(|e| provision_error(name, e))?;
            debug!(collection = name, "deleted previous collection");
        }

        self.store
            .create_collection(name, &schema.attributes, &self.vectorizer)
            .map_err(|e| provision_error(name, e))?;

        info!(
            collection = name,
            attributes = schema.attribute_count(),
            replaced = exists,
            "provisioned collection"
        );

        Ok(CollectionHandle {
            name: name.to_string(),
            schema: schema.clone(),
        })
    }

    /// Delete every collection in the store, returning the deleted names.
    pub fn purge_all(&self) -> Result<Vec<String>> {
        let existing = self
            .store
            .list_collections()
            .map_err(|e| provision_error("*", e))?;
        for name in &existing {
            self.store
                .delete_collection(name)
                .map_err(|e| provision_error(name, e))?;
        }
        info!(count = existing.len(), "Cleared all existing collections");
        Ok(existing)
    }
}

/// Store failures during provisioning become provision errors; timeouts keep their kind.
fn provision_error(collection: &str, err: VellumError) -> VellumError {
    match err {
        VellumError::Timeout { .. } => err,
        VellumError::Provision { .. } => err,
        VellumError::Store { operation, message } => VellumError::Provision {
            collection: collection.to_string(),
            message: format!("{} failed: {}", operation, message),
        },
        other => VellumError::Provision {
            collection: collection.to_string(),
            message: other.to_string(),
        },
    }
}
