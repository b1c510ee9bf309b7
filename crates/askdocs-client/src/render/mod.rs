//! Rendering of answers, citations and telemetry

pub mod citation;
pub mod stats;

pub use citation::{parse_answer, CitationRef, ExpansionState, Segment};
pub use stats::{format_cost_usd, StatsView};
