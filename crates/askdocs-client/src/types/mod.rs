//! Core types exchanged with the backend

pub mod query;
pub mod upload;

pub use query::{Citation, CostEstimate, QueryRequest, QueryResponse, QueryResult, TimingBreakdown};
pub use upload::{
    FileType, IndexSummary, UploadPayload, UploadResponse, UploadResult, UploadStats, UploadTask,
};
