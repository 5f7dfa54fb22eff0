//! Presentation over finalized channel reports.
//!
//! Everything here is derivative: sorting, filtering, and truncation operate
//! on already-aggregated data and feed nothing back into the aggregator.

pub mod html;
#[cfg(feature = "cli")]
pub mod table;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Value, json};

use crate::aggregate::ChannelReport;
use crate::ingest::IngestOutcome;
use crate::logger::diagnostics::Diagnostic;

/// One channel row without the raw logs, the shape shared by the JSON
/// surface and the terminal table. Logs are only rendered by `inspect` and
/// the HTML report.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub name: String,
    pub message_count: u64,
    pub user_counts: BTreeMap<String, u64>,
    pub merged_count: u64,
    pub closed_count: u64,
    pub reflection_count: u64,
    pub grade: f64,
    pub entries: usize,
}

impl From<&ChannelReport> for ChannelSummary {
    fn from(report: &ChannelReport) -> Self {
        Self {
            name: report.name.clone(),
            message_count: report.message_count,
            user_counts: report.user_counts.clone(),
            merged_count: report.merged_count,
            closed_count: report.closed_count,
            reflection_count: report.reflection_count,
            grade: report.grade,
            entries: report.logs.len(),
        }
    }
}

/// Summaries for every channel, in channel-name order.
#[must_use]
pub fn summaries(outcome: &IngestOutcome) -> Vec<ChannelSummary> {
    outcome.channels.values().map(ChannelSummary::from).collect()
}

/// Machine-readable result of one run: stats, per-channel summaries, and the
/// diagnostic stream. Raw logs are deliberately omitted.
#[must_use]
pub fn to_json(outcome: &IngestOutcome, diagnostics: &[Diagnostic]) -> Value {
    json!({
        "stats": outcome.stats,
        "channels": summaries(outcome),
        "diagnostics": diagnostics,
    })
}
