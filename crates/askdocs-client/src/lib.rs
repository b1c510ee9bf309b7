//! askdocs-client: client-side orchestration for a retrieval-augmented Q&A backend
//!
//! Documents are uploaded one at a time into a backend-managed namespace, and
//! questions against that namespace come back as answers with `[n]` citation
//! markers plus timing and cost telemetry. Parsing, embedding, retrieval and
//! generation all happen on the backend; this crate sequences the calls,
//! keeps the session namespace and renders the results.

pub mod config;
pub mod error;
pub mod namespace;
pub mod orchestration;
pub mod providers;
pub mod render;
pub mod session;
pub mod types;

pub use config::ClientConfig;
pub use error::{Error, Operation, Result};
pub use namespace::{Namespace, NamespaceManager};
pub use orchestration::{BatchReport, QueryDispatcher, UploadOrchestrator};
pub use providers::{HttpBackend, RagBackend};
pub use session::{Session, SessionEvent, SessionState};
pub use types::{
    query::{Citation, QueryResult},
    upload::{UploadResult, UploadTask},
};
