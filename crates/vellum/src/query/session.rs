//! Lazily created, shared query sessions.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, VellumError};

use super::capability::{Answer, QueryCapability, QuerySession};
use super::prompts::role_prompt;

/// When a new session replaces the current one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPolicy {
    /// One session for the lifetime of the process.
    #[default]
    ProcessLifetime,
    /// A new session whenever the collection set changes.
    PerBatch,
}

impl fmt::Display for SessionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPolicy::ProcessLifetime => write!(f, "process"),
            SessionPolicy::PerBatch => write!(f, "per-batch"),
        }
    }
}

impl FromStr for SessionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "process" | "process-lifetime" => Ok(SessionPolicy::ProcessLifetime),
            "per-batch" | "batch" => Ok(SessionPolicy::PerBatch),
            _ => Err(format!(
                "Unknown session policy: {}. Use 'process' or 'per-batch'",
                s
            )),
        }
    }
}

struct BoundSession {
    collections: Vec<String>,
    system_prompt: String,
    session: Arc<dyn QuerySession>,
}

/// Owns the query session and forwards questions to it.
///
/// Session creation happens under a lock, so concurrent callers observe
/// the same instance.
pub struct QuerySessionManager {
    capability: Arc<dyn QueryCapability>,
    policy: SessionPolicy,
    current: Mutex<Option<BoundSession>>,
}

impl QuerySessionManager {
    /// Create a manager with no session yet.
    pub fn new(capability: Arc<dyn QueryCapability>, policy: SessionPolicy) -> Self {
        Self {
            capability,
            policy,
            current: Mutex::new(None),
        }
    }

    /// Active policy.
    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    fn lock(&self) -> MutexGuard<'_, Option<BoundSession>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the session for `collections`, creating it on first use.
    ///
    /// An empty collection list means the batch produced nothing to query
    /// and yields [`VellumError::NoSession`].
    pub fn ensure_session(
        &self,
        collections: &[String],
        schema_text: &str,
    ) -> Result<Arc<dyn QuerySession>> {
        if collections.is_empty() {
            return Err(VellumError::NoSession(
                "no collections were created by the ingestion run".to_string(),
            ));
        }

        let system_prompt = role_prompt(schema_text);
        let mut current = self.lock();
        if let Some(bound) = current.as_ref() {
            let same_batch =
                bound.collections == collections && bound.system_prompt == system_prompt;
            match self.policy {
                SessionPolicy::ProcessLifetime => {
                    if !same_batch {
                        warn!(
                            bound = ?bound.collections,
                            "keeping existing session bound to an earlier batch"
                        );
                    }
                    return Ok(bound.session.clone());
                }
                SessionPolicy::PerBatch if same_batch => return Ok(bound.session.clone()),
                SessionPolicy::PerBatch => {
                    debug!("batch changed, replacing session");
                }
            }
        }

        let session = self
            .capability
            .create_session(collections, &system_prompt)?;
        info!(
            capability = self.capability.name(),
            collections = collections.len(),
            "Query agent is ready"
        );

        *current = Some(BoundSession {
            collections: collections.to_vec(),
            system_prompt,
            session: session.clone(),
        });
        Ok(session)
    }

    /// Drop the current session if it is bound to any of `names`.
    ///
    /// Called with the collections an ingestion run deleted or recreated,
    /// so the next [`ensure_session`](Self::ensure_session) binds afresh
    /// under either policy. Returns true when a session was released.
    pub fn release_stale<'a>(&self, names: impl IntoIterator<Item = &'a String>) -> bool {
        let mut current = self.lock();
        let stale = match current.as_ref() {
            Some(bound) => names.into_iter().any(|n| bound.collections.contains(n)),
            None => false,
        };
        if stale {
            info!("bound collections were replaced, releasing query session");
            *current = None;
        }
        stale
    }

    /// The current session, if one has been created.
    pub fn current(&self) -> Option<Arc<dyn QuerySession>> {
        self.lock().as_ref().map(|b| b.session.clone())
    }

    /// Forward a question to a session.
    ///
    /// A failed question leaves the session usable.
    pub fn ask(&self, session: &Arc<dyn QuerySession>, question: &str) -> Result<Answer> {
        debug!(question, "forwarding question");
        session.run(question)
    }

    fn require_current(&self) -> Result<Arc<dyn QuerySession>> {
        self.current()
            .ok_or_else(|| VellumError::NoSession("no batch has been ingested yet".to_string()))
    }

    /// Forward a question to the current session.
    pub fn ask_current(&self, question: &str) -> Result<Answer> {
        let session = self.require_current()?;
        self.ask(&session, question)
    }

    /// Forward a follow-up question to the current session with an earlier answer as context.
    pub fn ask_follow_up(&self, question: &str, context: &Answer) -> Result<Answer> {
        let session = self.require_current()?;
        debug!(question, "forwarding follow-up question");
        session.run_with_context(question, context)
    }
}
