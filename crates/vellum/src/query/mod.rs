//! Natural-language query layer over ingested collections.
//!
//! Answering is delegated to an external capability. Vellum builds the
//! role prompt from the ingested schemas, binds one session to the
//! collection set and forwards questions to it.
//!
//! # Capabilities
//!
//! - **Query agent** - hosted agent over HTTP (uses the store credentials)
//! - **Mock** - deterministic answers for tests and dry runs
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vellum::{MockQueryCapability, QuerySessionManager, SessionPolicy};
//!
//! let manager = QuerySessionManager::new(
//!     Arc::new(MockQueryCapability::new()),
//!     SessionPolicy::ProcessLifetime,
//! );
//! let collections = vec!["sites".to_string()];
//! let session = manager
//!     .ensure_session(&collections, "Table: sites\n- site_id: Text\n")
//!     .unwrap();
//! let answer = manager.ask(&session, "How many sites are there?").unwrap();
//! println!("{}", answer.final_answer);
//! ```

mod agent;
mod capability;
mod mock;
mod prompts;
mod session;

pub use agent::QueryAgentClient;
pub use capability::{Answer, QueryCapability, QuerySession};
pub use mock::MockQueryCapability;
pub use prompts::role_prompt;
pub use session::{QuerySessionManager, SessionPolicy};
