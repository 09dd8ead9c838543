//! In-memory document store for testing and dry runs.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Result, VellumError};
use crate::schema::{AttributeKind, AttributeSpec};

use super::{BatchOutcome, DocumentStore, ObjectError, StoreObject, VectorizerPolicy};

/// A collection held by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryCollection {
    /// Attributes the collection was created with.
    pub attributes: Vec<AttributeSpec>,
    /// Vectorizer the collection was created with.
    pub vectorizer: VectorizerPolicy,
    /// Stored objects in write order.
    pub objects: Vec<StoreObject>,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: IndexMap<String, MemoryCollection>,
    rejected_names: HashSet<String>,
    rejected_values: Vec<(String, Value)>,
    unreachable: bool,
    closed: bool,
}

/// Process-local store that validates writes against committed schemas.
///
/// Faults can be injected to exercise failure handling: rejected collection
/// names, rejected attribute values, or an unreachable store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reachable(&self, operation: &str) -> Result<MutexGuard<'_, MemoryState>> {
        let state = self.state();
        if state.unreachable {
            return Err(VellumError::Store {
                operation: operation.to_string(),
                message: "store unreachable".to_string(),
            });
        }
        Ok(state)
    }

    /// Refuse to create collections with this name.
    pub fn reject_collection(&self, name: impl Into<String>) {
        self.state().rejected_names.insert(name.into());
    }

    /// Refuse objects whose attribute holds this value.
    pub fn reject_objects_where(&self, attribute: impl Into<String>, value: Value) {
        self.state().rejected_values.push((attribute.into(), value));
    }

    /// Make every call fail as if the store could not be reached.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state().unreachable = unreachable;
    }

    /// Add a collection directly, bypassing provisioning.
    pub fn seed_collection(&self, name: impl Into<String>, attributes: Vec<AttributeSpec>) {
        self.state().collections.insert(
            name.into(),
            MemoryCollection {
                attributes,
                vectorizer: VectorizerPolicy::default(),
                objects: Vec::new(),
            },
        );
    }

    /// Snapshot of a collection.
    pub fn collection(&self, name: &str) -> Option<MemoryCollection> {
        self.state().collections.get(name).cloned()
    }

    /// Number of objects stored in a collection.
    pub fn object_count(&self, name: &str) -> usize {
        self.state()
            .collections
            .get(name)
            .map(|c| c.objects.len())
            .unwrap_or(0)
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

impl DocumentStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        let state = self.reachable("list collections")?;
        Ok(state.collections.keys().cloned().collect())
    }

    fn collection_exists(&self, name: &str) -> Result<bool> {
        let state = self.reachable("check collection")?;
        Ok(state.collections.contains_key(name))
    }

    fn delete_collection(&self, name: &str) -> Result<()> {
        let mut state = self.reachable("delete collection")?;
        state.collections.shift_remove(name);
        Ok(())
    }

    fn create_collection(
        &self,
        name: &str,
        attributes: &[AttributeSpec],
        vectorizer: &VectorizerPolicy,
    ) -> Result<()> {
        let mut state = self.reachable("create collection")?;
        if state.rejected_names.contains(name) {
            return Err(VellumError::Store {
                operation: "create collection".to_string(),
                message: format!("collection name '{}' rejected", name),
            });
        }
        if state.collections.contains_key(name) {
            return Err(VellumError::Store {
                operation: "create collection".to_string(),
                message: format!("collection '{}' already exists", name),
            });
        }
        state.collections.insert(
            name.to_string(),
            MemoryCollection {
                attributes: attributes.to_vec(),
                vectorizer: vectorizer.clone(),
                objects: Vec::new(),
            },
        );
        Ok(())
    }

    fn write_objects(&self, collection: &str, objects: &[StoreObject]) -> Result<BatchOutcome> {
        let mut state = self.reachable("write objects")?;
        let rejected_values = state.rejected_values.clone();
        let target = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| VellumError::Store {
                operation: "write objects".to_string(),
                message: format!("collection '{}' does not exist", collection),
            })?;

        let mut outcome = BatchOutcome::default();
        for (index, object) in objects.iter().enumerate() {
            match validate(&target.attributes, &rejected_values, object) {
                Ok(()) => {
                    target.objects.push(object.clone());
                    outcome.accepted += 1;
                }
                Err(message) => outcome.errors.push(ObjectError { index, message }),
            }
        }
        Ok(outcome)
    }

    fn close(&self) {
        self.state().closed = true;
    }
}

fn validate(
    attributes: &[AttributeSpec],
    rejected_values: &[(String, Value)],
    object: &StoreObject,
) -> std::result::Result<(), String> {
    for (name, value) in object {
        let attribute = attributes
            .iter()
            .find(|a| &a.name == name)
            .ok_or_else(|| format!("no such property '{}'", name))?;

        let kind_ok = match attribute.kind {
            AttributeKind::Numeric => value.is_number(),
            AttributeKind::Text => value.is_string(),
        };
        if !kind_ok {
            return Err(format!(
                "property '{}' expects {} but got {}",
                name,
                attribute.kind.store_type(),
                value
            ));
        }

        if rejected_values
            .iter()
            .any(|(attr, rejected)| attr == name && rejected == value)
        {
            return Err(format!("value {} rejected for property '{}'", value, name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs() -> Vec<AttributeSpec> {
        vec![
            AttributeSpec::new("site", AttributeKind::Text),
            AttributeSpec::new("count", AttributeKind::Numeric),
        ]
    }

    fn object(pairs: &[(&str, Value)]) -> StoreObject {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_create_and_write() {
        let store = InMemoryStore::new();
        store
            .create_collection("sites", &attrs(), &VectorizerPolicy::default())
            .unwrap();

        let outcome = store
            .write_objects(
                "sites",
                &[
                    object(&[("site", json!("north")), ("count", json!(3))]),
                    object(&[("site", json!("south"))]),
                ],
            )
            .unwrap();

        assert_eq!(outcome.accepted, 2);
        assert!(outcome.errors.is_empty());
        assert_eq!(store.object_count("sites"), 2);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let store = InMemoryStore::new();
        store
            .create_collection("sites", &attrs(), &VectorizerPolicy::default())
            .unwrap();

        let outcome = store
            .write_objects(
                "sites",
                &[
                    object(&[("count", json!("lots"))]),
                    object(&[("unknown", json!(1))]),
                ],
            )
            .unwrap();

        assert_eq!(outcome.accepted, 0);
        assert_eq!(outcome.errors.len(), 2);
        assert_eq!(outcome.errors[1].index, 1);
    }

    #[test]
    fn test_duplicate_create_fails() {
        let store = InMemoryStore::new();
        let policy = VectorizerPolicy::default();
        store.create_collection("sites", &attrs(), &policy).unwrap();
        assert!(store.create_collection("sites", &attrs(), &policy).is_err());
    }

    #[test]
    fn test_unreachable_store() {
        let store = InMemoryStore::new();
        store.set_unreachable(true);
        assert!(store.list_collections().is_err());
        store.set_unreachable(false);
        assert!(store.list_collections().unwrap().is_empty());
    }

    #[test]
    fn test_close_is_recorded() {
        let store = InMemoryStore::new();
        assert!(!store.is_closed());
        store.close();
        store.close();
        assert!(store.is_closed());
    }
}
