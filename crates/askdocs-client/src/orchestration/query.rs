//! Single-question dispatch against the session namespace

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::namespace::{Namespace, NamespaceManager};
use crate::providers::RagBackend;
use crate::types::{QueryRequest, QueryResult};

/// Questions offered before the first query
pub const SUGGESTED_QUERIES: [&str; 3] = [
    "What is the main topic?",
    "Summarize the key points",
    "List the main concepts",
];

/// Issues queries, at most one at a time
///
/// A call made while another is pending is refused with
/// [`Error::QueryInFlight`], not queued.
#[derive(Clone)]
pub struct QueryDispatcher {
    backend: Arc<dyn RagBackend>,
    namespaces: NamespaceManager,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag however the query ends
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl QueryDispatcher {
    pub fn new(backend: Arc<dyn RagBackend>, namespaces: NamespaceManager) -> Self {
        Self {
            backend,
            namespaces,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a query is pending; callers use this to disable input
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Ask against the session's current namespace
    pub async fn ask(&self, text: &str) -> Result<QueryResult> {
        let namespace = self.namespaces.get();
        self.query(text, namespace).await
    }

    /// Ask against an explicit namespace (or none)
    pub async fn query(&self, text: &str, namespace: Option<Namespace>) -> Result<QueryResult> {
        if text.trim().is_empty() {
            return Err(Error::empty_input("a question"));
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Refusing query while another is pending");
            return Err(Error::QueryInFlight);
        }
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));

        let request = QueryRequest {
            query: text.to_string(),
            namespace,
        };

        let start = Instant::now();
        let response = self.backend.query(&request).await.map_err(|e| {
            tracing::warn!("Query failed: {}", e);
            e
        })?;
        let result = QueryResult::from(response);

        tracing::info!(
            "Answered in {}ms with {} citation(s)",
            start.elapsed().as_millis(),
            result.citations.len()
        );

        Ok(result)
    }
}
