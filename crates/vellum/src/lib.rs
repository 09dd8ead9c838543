//! Vellum: turns uploaded spreadsheets into queryable store collections.
//!
//! Each uploaded file becomes one schema-typed collection in a document
//! store. Column labels are sanitized into safe identifiers, column types
//! are inferred from the data and the collection is recreated from scratch
//! on every run. The resulting schemas feed a natural-language query layer.
//!
//! # Core Principles
//!
//! - **Deterministic schemas**: the same file always yields the same attributes
//! - **Destructive idempotency**: re-ingesting a name replaces it wholesale
//! - **Isolated failures**: one bad file never aborts the batch
//!
//! # Example
//!
//! ```no_run
//! use vellum::{StoreConfig, UploadedFile, Vellum, VellumConfig};
//!
//! let store_config = StoreConfig::from_env().unwrap();
//! let vellum = Vellum::connect(&store_config, VellumConfig::default()).unwrap();
//!
//! let result = vellum.ingest_paths(&["sites.xlsx", "alarms.csv"]).unwrap();
//! println!("Collections: {}", result.collections.join(", "));
//!
//! vellum.ensure_session(&result).unwrap();
//! let answer = vellum.ask("How many sites have alarm code 1000?").unwrap();
//! println!("{}", answer.final_answer);
//! ```

pub mod config;
pub mod error;
pub mod inference;
pub mod ingest;
pub mod input;
pub mod load;
pub mod provision;
pub mod query;
pub mod schema;
pub mod store;

mod vellum;

pub use crate::vellum::Vellum;
pub use config::{IngestConfig, QueryConfig, StoreConfig, VellumConfig};
pub use error::{ErrorKind, Result, VellumError};
pub use inference::{infer_kind, KindAnalysis};
pub use ingest::{
    derive_collection_name, CollectionSummary, FileFailure, IngestionOrchestrator,
    IngestionResult,
};
pub use input::{CellValue, Parser, ParserConfig, RawTable, SourceMetadata, UploadedFile};
pub use load::{BulkLoader, LoadReport};
pub use provision::{CollectionProvisioner, PurgePolicy};
pub use query::{
    role_prompt, Answer, MockQueryCapability, QueryAgentClient, QueryCapability, QuerySession,
    QuerySessionManager, SessionPolicy,
};
pub use schema::{sanitize, AttributeKind, AttributeSpec, RenameMap, SchemaBuilder, TableSchema};
pub use store::{
    BatchOutcome, CollectionHandle, DocumentStore, InMemoryStore, StoreObject, VectorizerPolicy,
    WeaviateStore,
};
