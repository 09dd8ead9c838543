//! Main Vellum struct and public API.

use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::config::{StoreConfig, VellumConfig};
use crate::error::Result;
use crate::ingest::{FileFailure, IngestionOrchestrator, IngestionResult};
use crate::input::UploadedFile;
use crate::query::{Answer, QueryAgentClient, QueryCapability, QuerySession, QuerySessionManager};
use crate::store::{DocumentStore, VectorizerPolicy, WeaviateStore};

/// Shared context wiring the store, the ingestion pipeline and the query session.
///
/// Construct one per process and pass it by reference.
pub struct Vellum {
    config: VellumConfig,
    store: Arc<dyn DocumentStore>,
    orchestrator: IngestionOrchestrator,
    sessions: QuerySessionManager,
}

impl Vellum {
    /// Create a context over an existing store and query capability.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        capability: Arc<dyn QueryCapability>,
        vectorizer: VectorizerPolicy,
        config: VellumConfig,
    ) -> Self {
        let orchestrator =
            IngestionOrchestrator::new(store.clone(), vectorizer, config.ingest.clone());
        let sessions = QuerySessionManager::new(capability, config.query.session_policy);
        Self {
            config,
            store,
            orchestrator,
            sessions,
        }
    }

    /// Connect to a Weaviate cluster and its hosted query agent.
    pub fn connect(store_config: &StoreConfig, config: VellumConfig) -> Result<Self> {
        let store = Arc::new(WeaviateStore::connect(store_config)?);
        let agent = Arc::new(QueryAgentClient::new(store_config, &config.query)?);
        Ok(Self::new(
            store,
            agent,
            store_config.vectorizer.clone(),
            config,
        ))
    }

    /// Configuration in use.
    pub fn config(&self) -> &VellumConfig {
        &self.config
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// The session manager.
    pub fn sessions(&self) -> &QuerySessionManager {
        &self.sessions
    }

    /// Ingest a batch of uploaded files.
    ///
    /// A query session bound to a collection this run purged or recreated
    /// is released; the next [`ensure_session`](Self::ensure_session)
    /// binds a new one.
    pub fn ingest(&self, files: &[UploadedFile]) -> Result<IngestionResult> {
        let result = self.orchestrator.ingest(files)?;
        self.sessions
            .release_stale(result.purged.iter().chain(&result.collections));
        Ok(result)
    }

    /// Read files from disk and ingest them.
    ///
    /// Files that cannot be read are reported as failures ahead of the
    /// ones the pipeline rejected.
    pub fn ingest_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<IngestionResult> {
        let mut files = Vec::new();
        let mut unreadable = Vec::new();
        for path in paths {
            match UploadedFile::from_path(path) {
                Ok(file) => files.push(file),
                Err(e) => {
                    warn!("Failed to read file: {}", e);
                    unreadable.push(FileFailure {
                        file: path.as_ref().display().to_string(),
                        kind: e.kind(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut result = self.ingest(&files)?;
        unreadable.append(&mut result.failures);
        result.failures = unreadable;
        Ok(result)
    }

    /// Bind the query session to the collections of an ingestion run.
    pub fn ensure_session(&self, result: &IngestionResult) -> Result<Arc<dyn QuerySession>> {
        self.sessions
            .ensure_session(&result.collections, &result.schema_text)
    }

    /// Ask a question of the current session.
    pub fn ask(&self, question: &str) -> Result<Answer> {
        self.sessions.ask_current(question)
    }

    /// Ask a follow-up question, passing an earlier answer as context.
    pub fn ask_follow_up(&self, question: &str, context: &Answer) -> Result<Answer> {
        self.sessions.ask_follow_up(question, context)
    }

    /// Release the store connection.
    pub fn close(&self) {
        self.store.close();
    }
}
