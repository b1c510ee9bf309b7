//! Display formatting for timing and cost telemetry
//!
//! Pure derivation only. Nothing is validated: `total_ms` is shown as the
//! backend reported it even when it differs from the sum of the stages.

use crate::types::{CostEstimate, QueryResult, TimingBreakdown};

/// Named pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Total,
    Embedding,
    Retrieval,
    Reranking,
    Generation,
}

impl Stage {
    /// Badge order
    pub const ALL: [Stage; 5] = [
        Stage::Total,
        Stage::Embedding,
        Stage::Retrieval,
        Stage::Reranking,
        Stage::Generation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Total => "Total",
            Stage::Embedding => "Embed",
            Stage::Retrieval => "Retrieve",
            Stage::Reranking => "Rerank",
            Stage::Generation => "Generate",
        }
    }
}

/// Milliseconds for one stage, `None` when not reported
pub fn stage_ms(timing: &TimingBreakdown, stage: Stage) -> Option<u64> {
    match stage {
        Stage::Total => timing.total_ms,
        Stage::Embedding => timing.embedding_ms,
        Stage::Retrieval => timing.retrieval_ms,
        Stage::Reranking => timing.reranking_ms,
        Stage::Generation => timing.generation_ms,
    }
}

/// Cost with exactly six decimals, e.g. `0.000123`
pub fn format_cost_usd(cost: f64) -> String {
    format!("{:.6}", cost)
}

/// Input plus output tokens, a missing side counting as zero
///
/// `None` only when neither side was reported.
pub fn total_tokens(cost: &CostEstimate) -> Option<u64> {
    match (cost.input_tokens, cost.output_tokens) {
        (None, None) => None,
        (input, output) => Some(input.unwrap_or(0) + output.unwrap_or(0)),
    }
}

/// Badge strings for everything the backend reported
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsView {
    /// `("Total", "1150ms")`-style pairs in badge order
    pub stages: Vec<(&'static str, String)>,
    /// `~1000 tokens`
    pub tokens: Option<String>,
    /// `$0.000143`
    pub cost: Option<String>,
}

impl StatsView {
    /// Derive badges from a query result
    ///
    /// The nested cost estimate wins for tokens; the flat `token_estimate`
    /// of older responses is used only when it is absent.
    pub fn from_result(result: &QueryResult) -> Self {
        let stages = result
            .timing
            .as_ref()
            .map(|timing| {
                Stage::ALL
                    .iter()
                    .filter_map(|stage| {
                        stage_ms(timing, *stage).map(|ms| (stage.label(), format!("{}ms", ms)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let tokens = result
            .cost_estimate
            .as_ref()
            .and_then(total_tokens)
            .or(result.token_estimate)
            .map(|n| format!("~{} tokens", n));

        let cost = result
            .cost_estimate
            .as_ref()
            .and_then(|c| c.estimated_cost_usd)
            .map(|usd| format!("${}", format_cost_usd(usd)));

        Self {
            stages,
            tokens,
            cost,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty() && self.tokens.is_none() && self.cost.is_none()
    }

    /// All badges as display strings
    pub fn badges(&self) -> Vec<String> {
        self.stages
            .iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .chain(self.tokens.iter().cloned())
            .chain(self.cost.iter().cloned())
            .collect()
    }
}
