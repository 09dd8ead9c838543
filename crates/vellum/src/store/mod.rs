//! Document store capability and its implementations.
//!
//! The store is consumed as an opaque service: it holds named, schema-typed
//! collections of objects and takes care of vectorization itself. Vellum
//! only needs the handful of operations on [`DocumentStore`].
//!
//! # Implementations
//!
//! - **Weaviate** - REST API over HTTP (requires `WEAVIATE_URL` and `WEAVIATE_API_KEY`)
//! - **In-memory** - process-local store for tests and dry runs
//!
//! # Example
//!
//! ```no_run
//! use vellum::{DocumentStore, StoreConfig, WeaviateStore};
//!
//! let store = WeaviateStore::connect(&StoreConfig::from_env().unwrap()).unwrap();
//! for name in store.list_collections().unwrap() {
//!     println!("{}", name);
//! }
//! ```

mod http;
mod memory;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::{AttributeSpec, TableSchema};

pub use http::WeaviateStore;
pub use memory::{InMemoryStore, MemoryCollection};

/// Default vectorizer module.
pub const DEFAULT_VECTORIZER: &str = "text2vec-weaviate";

/// Properties of one stored object, in attribute order.
pub type StoreObject = IndexMap<String, serde_json::Value>;

/// Vectorization applied uniformly to every created collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerPolicy {
    /// Store-side vectorizer module name.
    pub module: String,
}

impl VectorizerPolicy {
    /// Use a specific vectorizer module.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
        }
    }
}

impl Default for VectorizerPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_VECTORIZER)
    }
}

/// A rejected object within a batched write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectError {
    /// Position of the object in the submitted batch.
    pub index: usize,
    /// Reason given by the store.
    pub message: String,
}

/// Result of one batched write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Objects the store accepted.
    pub accepted: usize,
    /// Objects the store rejected.
    pub errors: Vec<ObjectError>,
}

/// A provisioned collection together with its committed schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionHandle {
    /// Collection name.
    pub name: String,
    /// Schema the collection was created with.
    pub schema: TableSchema,
}

/// Operations Vellum needs from a document store.
///
/// Implementations must be thread-safe (Send + Sync) so files can be
/// ingested concurrently over one connection.
pub trait DocumentStore: Send + Sync {
    /// Get the name of this store (for logging/debugging).
    fn name(&self) -> &str;

    /// Names of every collection currently in the store.
    fn list_collections(&self) -> Result<Vec<String>>;

    /// Whether a collection with this name exists.
    fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Delete a collection and everything stored in it.
    fn delete_collection(&self, name: &str) -> Result<()>;

    /// Create an empty collection with exactly these attributes.
    fn create_collection(
        &self,
        name: &str,
        attributes: &[AttributeSpec],
        vectorizer: &VectorizerPolicy,
    ) -> Result<()>;

    /// Submit a group of objects; per-object rejections are reported in the outcome.
    fn write_objects(&self, collection: &str, objects: &[StoreObject]) -> Result<BatchOutcome>;

    /// Release the connection. Calling it more than once is harmless.
    fn close(&self) {}
}
