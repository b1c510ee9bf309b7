//! Upload and query orchestration

pub mod query;
pub mod upload;

pub use query::{QueryDispatcher, SUGGESTED_QUERIES};
pub use upload::{BatchReport, FileOutcome, UploadOrchestrator};
