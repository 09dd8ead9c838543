//! Query capability trait and types.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Structured answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Natural-language answer.
    pub final_answer: String,
    /// Intermediate reasoning and tool calls, passed through untouched.
    #[serde(default)]
    pub trace: serde_json::Value,
}

/// A query capability bound to a collection set and a role prompt.
pub trait QuerySession: Send + Sync {
    /// Collections this session answers over.
    fn collections(&self) -> &[String];

    /// Answer one question.
    fn run(&self, question: &str) -> Result<Answer>;

    /// Answer a follow-up question with an earlier answer as context.
    fn run_with_context(&self, question: &str, context: &Answer) -> Result<Answer>;
}

/// Factory for query sessions.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait QueryCapability: Send + Sync {
    /// Get the name of this capability (for logging/debugging).
    fn name(&self) -> &str;

    /// Bind a new session to `collections` with `system_prompt` as its role.
    fn create_session(
        &self,
        collections: &[String],
        system_prompt: &str,
    ) -> Result<Arc<dyn QuerySession>>;
}
