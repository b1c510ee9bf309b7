//! Scriptable in-memory backend for tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

use crate::error::{Error, Operation, Result};
use crate::types::{
    IndexSummary, QueryRequest, QueryResponse, UploadResponse, UploadStats, UploadTask,
};

use super::backend::RagBackend;

/// Replays scripted upload outcomes in call order and records every request
#[derive(Default)]
pub struct FakeBackend {
    upload_script: Mutex<VecDeque<Result<UploadResponse>>>,
    upload_requests: Mutex<Vec<UploadTask>>,
    query_script: Mutex<VecDeque<Result<QueryResponse>>>,
    query_requests: Mutex<Vec<QueryRequest>>,
    query_gate: Mutex<Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>>,
    index: Mutex<IndexSummary>,
    calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful upload returning `namespace`, without a message
    pub fn indexed(namespace: &str, chunks_created: u32) -> Result<UploadResponse> {
        Ok(Self::response(
            None,
            UploadStats {
                namespace: Some(namespace.to_string()),
                chunks_created,
                avg_chunk_tokens: 200,
                processing_time_ms: 50,
            },
        ))
    }

    /// Successful upload body with an optional message
    pub fn response(message: Option<&str>, stats: UploadStats) -> UploadResponse {
        UploadResponse {
            success: Some(true),
            message: message.map(str::to_string),
            stats,
        }
    }

    pub fn push_upload(&self, outcome: Result<UploadResponse>) {
        self.upload_script.lock().push_back(outcome);
    }

    pub fn push_query(&self, outcome: Result<QueryResponse>) {
        self.query_script.lock().push_back(outcome);
    }

    pub fn set_index(&self, index: IndexSummary) {
        *self.index.lock() = index;
    }

    /// Hold the next query until `release` fires; `entered` fires once it is pending
    pub fn gate_next_query(&self, entered: oneshot::Sender<()>, release: oneshot::Receiver<()>) {
        *self.query_gate.lock() = Some((entered, release));
    }

    pub fn upload_requests(&self) -> Vec<UploadTask> {
        self.upload_requests.lock().clone()
    }

    pub fn query_requests(&self) -> Vec<QueryRequest> {
        self.query_requests.lock().clone()
    }

    /// Total number of backend calls of any kind
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RagBackend for FakeBackend {
    async fn upload(&self, task: &UploadTask) -> Result<UploadResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.upload_requests.lock().push(task.clone());
        let next = self.upload_script.lock().pop_front();
        next.unwrap_or_else(|| Err(Error::network(Operation::Upload, "no scripted response")))
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.query_requests.lock().push(request.clone());

        let gate = self.query_gate.lock().take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.await;
        }

        let next = self.query_script.lock().pop_front();
        next.unwrap_or_else(|| Err(Error::network(Operation::Query, "no scripted response")))
    }

    async fn health_check(&self) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn list_documents(&self) -> Result<IndexSummary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.index.lock().clone())
    }

    fn name(&self) -> &str {
        "fake"
    }
}
