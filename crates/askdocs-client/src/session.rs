//! Session state machine and the session context tying the components together

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::namespace::{Namespace, NamespaceManager};
use crate::orchestration::{BatchReport, QueryDispatcher, UploadOrchestrator};
use crate::providers::RagBackend;
use crate::render::ExpansionState;
use crate::types::{IndexSummary, QueryResult, UploadTask};

/// Interactive state of one session
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    /// Nothing pending, nothing shown
    #[default]
    Idle,
    /// A batch upload is running
    Uploading,
    /// A query is pending
    Querying,
    /// An answer is shown; `expanded` is the citation toggle on top of it
    Answered {
        result: QueryResult,
        expanded: ExpansionState,
    },
    /// The last query failed
    Errored { message: String },
}

/// Something that happened in the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    UploadStarted,
    UploadFinished,
    QueryStarted,
    QueryAnswered(QueryResult),
    QueryFailed(String),
    ToggleCitation(u32),
}

impl SessionState {
    /// Whether an upload or query is pending
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::Uploading | SessionState::Querying)
    }

    /// Next state for `event`; events that do not apply leave it unchanged
    pub fn apply(self, event: SessionEvent) -> SessionState {
        match (self, event) {
            (state, SessionEvent::UploadStarted) if !state.is_busy() => SessionState::Uploading,
            (SessionState::Uploading, SessionEvent::UploadFinished) => SessionState::Idle,
            (state, SessionEvent::QueryStarted) if !state.is_busy() => SessionState::Querying,
            (SessionState::Querying, SessionEvent::QueryAnswered(result)) => {
                SessionState::Answered {
                    result,
                    expanded: ExpansionState::new(),
                }
            }
            (SessionState::Querying, SessionEvent::QueryFailed(message)) => {
                SessionState::Errored { message }
            }
            (SessionState::Answered { result, expanded }, SessionEvent::ToggleCitation(n)) => {
                SessionState::Answered {
                    result,
                    expanded: expanded.toggled(n),
                }
            }
            (state, event) => {
                tracing::debug!("Ignoring {:?} in state {}", event, state.name());
                state
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Uploading => "uploading",
            SessionState::Querying => "querying",
            SessionState::Answered { .. } => "answered",
            SessionState::Errored { .. } => "errored",
        }
    }

    /// The live answer, if any
    pub fn result(&self) -> Option<&QueryResult> {
        match self {
            SessionState::Answered { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Current citation toggle; collapsed outside of an answer
    pub fn expansion(&self) -> ExpansionState {
        match self {
            SessionState::Answered { expanded, .. } => *expanded,
            _ => ExpansionState::new(),
        }
    }
}

/// One user session: its namespace, both orchestrators and the UI state
pub struct Session {
    backend: Arc<dyn RagBackend>,
    namespaces: NamespaceManager,
    uploads: UploadOrchestrator,
    queries: QueryDispatcher,
    state: SessionState,
    last_upload_log: Option<String>,
}

impl Session {
    /// Create a session over a backend
    pub fn new(backend: Arc<dyn RagBackend>, config: &ClientConfig) -> Self {
        Self::with_namespaces(backend, config, NamespaceManager::new())
    }

    /// Create a session sharing an existing namespace slot
    pub fn with_namespaces(
        backend: Arc<dyn RagBackend>,
        config: &ClientConfig,
        namespaces: NamespaceManager,
    ) -> Self {
        let uploads = UploadOrchestrator::new(Arc::clone(&backend), namespaces.clone())
            .with_default_text_title(config.upload.default_text_title.clone());
        let queries = QueryDispatcher::new(Arc::clone(&backend), namespaces.clone());

        Self {
            backend,
            namespaces,
            uploads,
            queries,
            state: SessionState::Idle,
            last_upload_log: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn namespace(&self) -> Option<Namespace> {
        self.namespaces.get()
    }

    /// Index contents and whether the session namespace is among them
    pub async fn documents(&self) -> Result<(IndexSummary, Option<bool>)> {
        let summary = self.backend.list_documents().await?;
        let indexed = self.namespace().map(|ns| summary.contains(&ns));
        Ok((summary, indexed))
    }

    /// Pipe-joined log of the last batch
    pub fn last_upload_log(&self) -> Option<&str> {
        self.last_upload_log.as_deref()
    }

    fn advance(&mut self, event: SessionEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(event);
    }

    /// Upload a batch of files
    ///
    /// Per-file failures never move the session to `errored`; they are part
    /// of the batch log.
    pub async fn upload(&mut self, tasks: Vec<UploadTask>) -> Result<BatchReport> {
        if tasks.is_empty() {
            return Err(Error::empty_input("at least one file"));
        }

        self.advance(SessionEvent::UploadStarted);
        let outcome = self.uploads.run_batch(tasks).await;
        self.advance(SessionEvent::UploadFinished);

        let report = outcome?;
        self.last_upload_log = Some(report.log());
        Ok(report)
    }

    /// Upload pasted text
    pub async fn paste(&mut self, text: &str, title: Option<&str>) -> Result<BatchReport> {
        if text.trim().is_empty() {
            return Err(Error::empty_input("some text"));
        }

        self.advance(SessionEvent::UploadStarted);
        let outcome = self.uploads.upload_text(text, title).await;
        self.advance(SessionEvent::UploadFinished);

        let report = outcome?;
        self.last_upload_log = Some(report.log());
        Ok(report)
    }

    /// Ask a question; the outcome is also reflected in [`Session::state`]
    pub async fn ask(&mut self, text: &str) -> Result<QueryResult> {
        if text.trim().is_empty() {
            return Err(Error::empty_input("a question"));
        }

        self.advance(SessionEvent::QueryStarted);
        match self.queries.ask(text).await {
            Ok(result) => {
                self.advance(SessionEvent::QueryAnswered(result.clone()));
                Ok(result)
            }
            Err(e) => {
                self.advance(SessionEvent::QueryFailed(e.user_message()));
                Err(e)
            }
        }
    }

    /// Click a citation tag or source entry
    pub fn toggle_citation(&mut self, number: u32) {
        self.advance(SessionEvent::ToggleCitation(number));
    }
}
