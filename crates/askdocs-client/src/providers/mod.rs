//! Provider abstraction for the retrieval backend
//!
//! The orchestration layer only talks to [`RagBackend`], so the HTTP client
//! can be swapped for an in-memory backend in tests.

pub mod backend;
pub mod http;

#[cfg(test)]
pub(crate) mod fake;

pub use backend::RagBackend;
pub use http::HttpBackend;
