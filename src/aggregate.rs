//! Channel aggregation: folds decoded archive entries into per-channel
//! accumulators, then finalizes them into read-only graded reports.
//!
//! Counters only ever increase while entries are processed. The accumulator
//! map lives for one ingestion run; a new load starts from an empty
//! aggregator and a freshly built directory.

#![allow(missing_docs)]

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::classify::Classification;
use crate::directory::UserDirectory;
use crate::grade::grade;
use crate::logger::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
use crate::message::Message;

/// Raw log retention for one archive entry, kept verbatim for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryLog {
    /// Full entry path inside the archive.
    pub entry_name: String,
    /// The decoded JSON array, untouched.
    pub messages: Vec<Value>,
}

/// Running per-channel counters.
///
/// Per-user tallies cover countable messages only, so
/// `message_count == sum(user_counts.values())` holds unconditionally; the
/// reconciliation pass in [`Aggregator::finish`] guards that sum as an
/// advisory check.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelAccumulator {
    pub message_count: u64,
    pub user_counts: BTreeMap<String, u64>,
    pub merged_count: u64,
    pub closed_count: u64,
    pub reflection_count: u64,
    pub logs: Vec<EntryLog>,
}

impl ChannelAccumulator {
    /// Fold one decoded entry into the accumulator.
    ///
    /// Messages are classified independently in sequence order; the raw
    /// array is appended to `logs` afterwards (retention order = arrival
    /// order).
    pub fn ingest(
        &mut self,
        entry_name: &str,
        raw_messages: Vec<Value>,
        directory: &UserDirectory,
    ) {
        for value in &raw_messages {
            let message = Message::from_entry_value(value);
            let classification = Classification::of(&message);
            if classification.countable {
                self.message_count += 1;
                let display_name = directory.resolve(message.user_id()).to_owned();
                *self.user_counts.entry(display_name).or_insert(0) += 1;
            }
            if classification.merged {
                self.merged_count += 1;
            }
            if classification.closed {
                self.closed_count += 1;
            }
            if classification.reflection {
                self.reflection_count += 1;
            }
        }
        self.logs.push(EntryLog {
            entry_name: entry_name.to_owned(),
            messages: raw_messages,
        });
    }

    /// Sum of all per-user tallies.
    #[must_use]
    pub fn user_tally_sum(&self) -> u64 {
        self.user_counts.values().sum()
    }
}

/// Finalized, read-only per-channel record handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelReport {
    pub name: String,
    pub message_count: u64,
    pub user_counts: BTreeMap<String, u64>,
    pub merged_count: u64,
    pub closed_count: u64,
    pub reflection_count: u64,
    /// Percentage grade, already scaled.
    pub grade: f64,
    pub logs: Vec<EntryLog>,
}

/// One aggregation pass over an archive load.
pub struct Aggregator {
    channels: BTreeMap<String, ChannelAccumulator>,
    directory: UserDirectory,
    diagnostics: Diagnostics,
}

impl Aggregator {
    /// Fresh aggregator for one run. The directory is owned for the whole
    /// pass; nothing is shared with prior or concurrent runs.
    #[must_use]
    pub fn new(directory: UserDirectory, diagnostics: Diagnostics) -> Self {
        Self {
            channels: BTreeMap::new(),
            directory,
            diagnostics,
        }
    }

    /// The directory this run resolves names against.
    #[must_use]
    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Number of channels seen so far.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Ingest one decoded entry under its channel, creating the accumulator
    /// on first sight of the channel name.
    pub fn ingest_entry(&mut self, channel: &str, entry_name: &str, raw_messages: Vec<Value>) {
        self.channels
            .entry(channel.to_owned())
            .or_default()
            .ingest(entry_name, raw_messages, &self.directory);
    }

    /// Run the advisory reconciliation check, then finalize every
    /// accumulator into a graded [`ChannelReport`].
    #[must_use]
    pub fn finish(self) -> BTreeMap<String, ChannelReport> {
        for (name, accumulator) in &self.channels {
            reconcile(name, accumulator, &self.diagnostics);
        }
        self.channels
            .into_iter()
            .map(|(name, accumulator)| {
                let report = ChannelReport {
                    grade: grade(
                        accumulator.merged_count,
                        accumulator.closed_count,
                        accumulator.reflection_count,
                    ),
                    name: name.clone(),
                    message_count: accumulator.message_count,
                    user_counts: accumulator.user_counts,
                    merged_count: accumulator.merged_count,
                    closed_count: accumulator.closed_count,
                    reflection_count: accumulator.reflection_count,
                    logs: accumulator.logs,
                };
                (name, report)
            })
            .collect()
    }
}

/// Advisory tally reconciliation for one channel.
///
/// A divergent sum is a data-quality signal, never fatal: under the
/// canonical countability rule it cannot occur, so any hit means the
/// predicates drifted. Each divergent user tally gets its own diagnostic
/// naming the channel and user.
fn reconcile(channel: &str, accumulator: &ChannelAccumulator, diagnostics: &Diagnostics) {
    if accumulator.user_tally_sum() == accumulator.message_count {
        return;
    }
    for (user, tally) in &accumulator.user_counts {
        if *tally != accumulator.message_count {
            diagnostics.emit(
                Diagnostic::new(
                    DiagnosticKind::ReconciliationMismatch,
                    Severity::Warning,
                    format!(
                        "user tally {tally} does not reconcile with channel total {}",
                        accumulator.message_count
                    ),
                )
                .with_channel(channel)
                .with_user(user),
            );
        }
    }
}
