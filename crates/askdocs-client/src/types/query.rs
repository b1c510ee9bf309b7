//! Query request and response types
//!
//! The query endpoint has two response shapes in the wild: the nested
//! `timing` / `cost_estimate` objects and an older flat form with
//! `timing_ms` / `token_estimate`. Both deserialize into [`QueryResponse`];
//! [`QueryResult`] is what the rest of the client works with.

use serde::{Deserialize, Deserializer, Serialize};

use crate::namespace::Namespace;

/// Request body for `POST /api/query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question
    pub query: String,
    /// Namespace to search; `null` searches the backend default
    pub namespace: Option<Namespace>,
}

/// Source passage referenced by an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Marker number used as `[n]` in the answer text
    pub number: u32,
    /// Excerpt of the source passage
    #[serde(default)]
    pub text: String,
    /// Source identifier (usually the filename)
    #[serde(default)]
    pub source: String,
    /// Document title
    #[serde(default)]
    pub title: String,
    /// Relevance score (0.0-1.0)
    #[serde(default)]
    pub score: f64,
}

impl Citation {
    /// Relevance as a percentage with one decimal, e.g. `87.5%`
    pub fn score_percent(&self) -> String {
        format!("{:.1}%", self.score * 100.0)
    }
}

/// Per-stage latency, all in milliseconds
///
/// Every field is optional: a missing stage is unavailable, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingBreakdown {
    #[serde(default)]
    pub embedding_ms: Option<u64>,
    #[serde(default)]
    pub retrieval_ms: Option<u64>,
    #[serde(default)]
    pub reranking_ms: Option<u64>,
    #[serde(default)]
    pub generation_ms: Option<u64>,
    #[serde(default)]
    pub total_ms: Option<u64>,
}

/// Token usage and projected cost
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    #[serde(default)]
    pub input_tokens: Option<u64>,
    #[serde(default)]
    pub output_tokens: Option<u64>,
    #[serde(default)]
    pub estimated_cost_usd: Option<f64>,
}

/// Success body of the query endpoint, either shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub timing: Option<TimingBreakdown>,
    #[serde(default)]
    pub cost_estimate: Option<CostEstimate>,
    /// Flat total latency (older shape)
    #[serde(default)]
    pub timing_ms: Option<u64>,
    /// Flat total token count (older shape)
    #[serde(default)]
    pub token_estimate: Option<u64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Citation>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Citation>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Answer with citations and telemetry
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Answer text, possibly with `[n]` markers
    pub answer: String,
    /// Citations in backend order
    pub citations: Vec<Citation>,
    /// Stage timings, if the backend reported any
    pub timing: Option<TimingBreakdown>,
    /// Cost estimate, if the backend reported one
    pub cost_estimate: Option<CostEstimate>,
    /// Flat token count from the older response shape
    pub token_estimate: Option<u64>,
}

impl From<QueryResponse> for QueryResult {
    fn from(response: QueryResponse) -> Self {
        let timing = match (response.timing, response.timing_ms) {
            (Some(mut timing), flat) => {
                if timing.total_ms.is_none() {
                    timing.total_ms = flat;
                }
                Some(timing)
            }
            (None, Some(total_ms)) => Some(TimingBreakdown {
                total_ms: Some(total_ms),
                ..TimingBreakdown::default()
            }),
            (None, None) => None,
        };

        Self {
            answer: response.answer,
            citations: response.citations,
            timing,
            cost_estimate: response.cost_estimate,
            token_estimate: response.token_estimate,
        }
    }
}
