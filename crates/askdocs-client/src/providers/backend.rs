//! Backend provider trait for the upload and query contracts

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{IndexSummary, QueryRequest, QueryResponse, UploadResponse, UploadTask};

/// Trait for the retrieval backend
///
/// Implementations:
/// - `HttpBackend`: the HTTP/JSON API
/// - in-memory fakes in tests
#[async_trait]
pub trait RagBackend: Send + Sync {
    /// Upload one document or text; the response carries the indexing stats
    async fn upload(&self, task: &UploadTask) -> Result<UploadResponse>;

    /// Ask a question against a namespace
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse>;

    /// Check if the backend is reachable and healthy
    async fn health_check(&self) -> Result<bool>;

    /// Describe the vectors and namespaces in the index
    async fn list_documents(&self) -> Result<IndexSummary>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
