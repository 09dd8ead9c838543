//! Mock query capability for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;

use crate::error::{Result, VellumError};

use super::capability::{Answer, QueryCapability, QuerySession};

/// Query capability that answers predictably without any network access.
#[derive(Debug, Default)]
pub struct MockQueryCapability {
    sessions_created: AtomicUsize,
    fail_marker: Option<String>,
}

impl MockQueryCapability {
    /// Create a new mock capability.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every question that contains `marker`.
    pub fn failing_on(marker: impl Into<String>) -> Self {
        Self {
            sessions_created: AtomicUsize::new(0),
            fail_marker: Some(marker.into()),
        }
    }

    /// Number of sessions created so far.
    pub fn sessions_created(&self) -> usize {
        self.sessions_created.load(Ordering::SeqCst)
    }
}

impl QueryCapability for MockQueryCapability {
    fn name(&self) -> &str {
        "mock"
    }

    fn create_session(
        &self,
        collections: &[String],
        system_prompt: &str,
    ) -> Result<Arc<dyn QuerySession>> {
        let id = self.sessions_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Arc::new(MockSession {
            id,
            collections: collections.to_vec(),
            system_prompt: system_prompt.to_string(),
            fail_marker: self.fail_marker.clone(),
        }))
    }
}

struct MockSession {
    id: usize,
    collections: Vec<String>,
    system_prompt: String,
    fail_marker: Option<String>,
}

impl QuerySession for MockSession {
    fn collections(&self) -> &[String] {
        &self.collections
    }

    fn run(&self, question: &str) -> Result<Answer> {
        self.answer(question, None)
    }

    fn run_with_context(&self, question: &str, context: &Answer) -> Result<Answer> {
        self.answer(question, Some(context))
    }
}

impl MockSession {
    fn answer(&self, question: &str, context: Option<&Answer>) -> Result<Answer> {
        if let Some(marker) = &self.fail_marker {
            if question.contains(marker.as_str()) {
                return Err(VellumError::Query(format!(
                    "mock capability refused question containing '{}'",
                    marker
                )));
            }
        }

        Ok(Answer {
            final_answer: format!(
                "Mock answer to '{}' over {}",
                question,
                self.collections.join(", ")
            ),
            trace: json!({
                "session": self.id,
                "collections": self.collections,
                "system_prompt": self.system_prompt,
                "query": question,
                "context": context.map(|c| c.final_answer.as_str()),
            }),
        })
    }
}
