//! Sequential multi-file upload into one shared namespace
//!
//! Files are sent one at a time. The namespace returned by the first
//! successful upload is attached to every later request of the batch, so the
//! whole batch lands in one index. A failed file is recorded and skipped; it
//! never aborts the batch and never drops a namespace learned earlier.

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::namespace::{Namespace, NamespaceManager};
use crate::providers::RagBackend;
use crate::types::{UploadResponse, UploadResult, UploadTask};

/// Separator between log lines of one batch
pub const LOG_SEPARATOR: &str = " | ";

/// Message recorded when the backend indexes a file without saying anything
pub const INDEXED_MESSAGE: &str = "Document indexed successfully";

/// Result of one file within a batch
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    /// Title the file was uploaded under
    pub title: String,
    /// Namespace attached to the request
    pub requested_namespace: Option<Namespace>,
    /// Backend outcome
    pub result: UploadResult,
}

impl FileOutcome {
    /// `✓ <title> — <n> chunks` or `✗ <title> — <message>`
    pub fn log_line(&self) -> String {
        match &self.result {
            UploadResult::Indexed { stats, .. } => {
                format!("✓ {} — {} chunks", self.title, stats.chunks_created)
            }
            UploadResult::Failed { message } => format!("✗ {} — {}", self.title, message),
        }
    }
}

/// Outcome of a whole batch, in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// One entry per input task
    pub outcomes: Vec<FileOutcome>,
    /// Namespace after the batch, as persisted to the session
    pub namespace: Option<Namespace>,
    /// Wall-clock duration of the batch
    pub elapsed_ms: u64,
}

impl BatchReport {
    /// Pipe-joined result log
    pub fn log(&self) -> String {
        self.outcomes
            .iter()
            .map(FileOutcome::log_line)
            .collect::<Vec<_>>()
            .join(LOG_SEPARATOR)
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Some files failed while others may have succeeded
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Merge outcomes decided before upload back into input order
    ///
    /// `slots` has one entry per selected input: `Some` for a local failure,
    /// `None` for an input that was uploaded, in which case the next
    /// outcome of this report fills the slot.
    pub fn with_local_failures(mut self, slots: Vec<Option<FileOutcome>>) -> Self {
        let mut uploaded = std::mem::take(&mut self.outcomes).into_iter();
        self.outcomes = slots
            .into_iter()
            .filter_map(|slot| slot.or_else(|| uploaded.next()))
            .collect();
        self
    }

    pub fn total_chunks(&self) -> u32 {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.chunks_created())
            .sum()
    }
}

/// Accumulator threaded through the batch
#[derive(Debug, Default)]
struct BatchState {
    namespace: Option<Namespace>,
    outcomes: Vec<FileOutcome>,
}

/// Drives uploads against the backend for one session
#[derive(Clone)]
pub struct UploadOrchestrator {
    backend: Arc<dyn RagBackend>,
    namespaces: NamespaceManager,
    default_text_title: String,
}

impl UploadOrchestrator {
    /// Create an orchestrator bound to a session's namespace
    pub fn new(backend: Arc<dyn RagBackend>, namespaces: NamespaceManager) -> Self {
        Self {
            backend,
            namespaces,
            default_text_title: "Direct Input".to_string(),
        }
    }

    /// Title used for pasted text without one
    pub fn with_default_text_title(mut self, title: impl Into<String>) -> Self {
        self.default_text_title = title.into();
        self
    }

    /// Upload tasks strictly in order
    ///
    /// Only an empty batch is an error; per-file failures are reported in
    /// the returned [`BatchReport`].
    pub async fn run_batch(&self, tasks: Vec<UploadTask>) -> Result<BatchReport> {
        if tasks.is_empty() {
            return Err(Error::empty_input("at least one file"));
        }

        let start = Instant::now();
        let total = tasks.len();
        tracing::info!("Uploading {} file(s) via {}", total, self.backend.name());

        let mut state = BatchState {
            namespace: self.namespaces.get(),
            outcomes: Vec::with_capacity(total),
        };
        for task in tasks {
            state = self.step(state, task).await;
        }

        if let Some(namespace) = &state.namespace {
            self.namespaces.set(namespace.clone());
        }

        let report = BatchReport {
            outcomes: state.outcomes,
            namespace: state.namespace,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        if report.has_failures() {
            tracing::warn!(
                "Batch finished with {}/{} file(s) failed",
                report.failed(),
                total
            );
        } else {
            tracing::info!(
                "Batch finished: {} file(s), {} chunks in {}ms",
                total,
                report.total_chunks(),
                report.elapsed_ms
            );
        }

        Ok(report)
    }

    /// Upload pasted text as a one-item batch
    pub async fn upload_text(&self, text: &str, title: Option<&str>) -> Result<BatchReport> {
        let task = UploadTask::text(text, title, &self.default_text_title)?;
        self.run_batch(vec![task]).await
    }

    /// Process one task and fold its outcome into the accumulator
    async fn step(&self, mut state: BatchState, task: UploadTask) -> BatchState {
        let task = task.with_namespace(state.namespace.clone());
        let title = task.title.clone();

        let result = match self.backend.upload(&task).await {
            Ok(UploadResponse { message, stats, .. }) => {
                if let Some(returned) = stats.namespace() {
                    if state.namespace.as_ref() != Some(&returned) {
                        tracing::debug!("Backend assigned namespace {}", returned);
                    }
                    state.namespace = Some(returned);
                }
                tracing::info!("Indexed {}: {}", title, stats.summary());
                let message = message
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| INDEXED_MESSAGE.to_string());
                UploadResult::Indexed { message, stats }
            }
            Err(e) => {
                tracing::warn!("Upload of {} failed: {}", title, e);
                UploadResult::Failed {
                    message: e.user_message(),
                }
            }
        };

        state.outcomes.push(FileOutcome {
            title,
            requested_namespace: task.namespace,
            result,
        });
        state
    }
}
