//! Archive ingestion: zip discovery, parallel entry decode, deterministic fold.
//!
//! The zip is read sequentially (I/O), payloads are decoded on a bounded
//! worker pool (CPU), and decoded entries are folded into the aggregator by
//! a single collector after sorting by archive index. Per-channel
//! aggregation is therefore serialized and log retention order matches the
//! archive regardless of worker scheduling.
//!
//! Failure semantics: an entry that cannot be read or decoded is skipped
//! with a diagnostic and never perturbs sibling entries. Only a broken
//! archive (cannot open, corrupt central directory) is fatal.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::thread;

use crossbeam_channel as channel;
use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{Aggregator, ChannelReport};
use crate::core::config::IngestConfig;
use crate::core::errors::{CrgError, Result};
use crate::directory::{UserDirectory, UserRecord};
use crate::logger::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};

/// Channel grouping key for an archive entry: the first `/`-separated path
/// segment. Root-level entries group under their own file name.
#[must_use]
pub fn channel_for_entry(entry_name: &str) -> &str {
    entry_name.split('/').next().unwrap_or(entry_name)
}

/// Counters describing one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Message-log entries considered (suffix match, not the users file).
    pub entries_seen: usize,
    /// Entries decoded and folded into a channel.
    pub entries_decoded: usize,
    /// Entries skipped (oversized, unreadable, or undecodable).
    pub entries_skipped: usize,
    /// Distinct channels discovered.
    pub channels: usize,
    /// Users resolved from the archive's user listing.
    pub known_users: usize,
}

/// Finalized result of one archive load.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    /// Per-channel reports, keyed and ordered by channel name.
    pub channels: BTreeMap<String, ChannelReport>,
    /// Pass counters.
    pub stats: IngestStats,
}

impl IngestOutcome {
    /// Look up a single channel's finalized report by name.
    pub fn channel(&self, name: &str) -> Result<&ChannelReport> {
        self.channels
            .get(name)
            .ok_or_else(|| CrgError::UnknownChannel {
                name: name.to_owned(),
            })
    }
}

struct DecodeJob {
    index: usize,
    name: String,
    bytes: Vec<u8>,
}

struct DecodedEntry {
    index: usize,
    name: String,
    messages: Vec<Value>,
}

/// Ingest one export archive end to end: user directory, entry decode,
/// aggregation, grading.
pub fn ingest_archive(
    path: &Path,
    config: &IngestConfig,
    diagnostics: &Diagnostics,
) -> Result<IngestOutcome> {
    let file = File::open(path).map_err(|source| CrgError::ArchiveOpen {
        path: path.to_path_buf(),
        details: source.to_string(),
    })?;
    let mut archive =
        zip::ZipArchive::new(BufReader::new(file)).map_err(|error| CrgError::ArchiveOpen {
            path: path.to_path_buf(),
            details: error.to_string(),
        })?;

    let directory = build_directory(&mut archive, config, diagnostics);
    let known_users = directory.len();

    let parallelism = config.parallelism.max(1);
    let (job_tx, job_rx) = channel::bounded::<DecodeJob>(parallelism * 2);
    let (out_tx, out_rx) = channel::unbounded::<DecodedEntry>();

    let mut stats = IngestStats {
        known_users,
        ..IngestStats::default()
    };

    let mut decoded = thread::scope(|scope| -> Result<Vec<DecodedEntry>> {
        for _ in 0..parallelism {
            let job_rx = job_rx.clone();
            let out_tx = out_tx.clone();
            let worker_diagnostics = diagnostics.clone();
            scope.spawn(move || {
                for job in &job_rx {
                    if let Some(entry) = decode_entry(&job, &worker_diagnostics)
                        && out_tx.send(entry).is_err()
                    {
                        return;
                    }
                }
            });
        }
        drop(out_tx);
        drop(job_rx);

        for index in 0..archive.len() {
            let mut entry =
                archive
                    .by_index(index)
                    .map_err(|error| CrgError::ArchiveStructure {
                        entry: format!("#{index}"),
                        details: error.to_string(),
                    })?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            if name == config.users_file || !name.ends_with(&config.entry_suffix) {
                continue;
            }
            stats.entries_seen += 1;

            if entry.size() > config.max_entry_bytes {
                diagnostics.emit(
                    Diagnostic::new(
                        DiagnosticKind::OversizedEntry,
                        Severity::Warning,
                        format!(
                            "entry payload is {} bytes, above the {} byte limit",
                            entry.size(),
                            config.max_entry_bytes
                        ),
                    )
                    .with_entry(&name),
                );
                continue;
            }

            let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
            if let Err(error) = entry.read_to_end(&mut bytes) {
                diagnostics.emit(
                    Diagnostic::new(
                        DiagnosticKind::MalformedEntry,
                        Severity::Warning,
                        format!("could not read entry payload: {error}"),
                    )
                    .with_entry(&name),
                );
                continue;
            }

            job_tx
                .send(DecodeJob { index, name, bytes })
                .map_err(|_| CrgError::ChannelClosed {
                    component: "decode pool",
                })?;
        }
        drop(job_tx);

        Ok(out_rx.iter().collect())
    })?;

    // Archive order, not worker completion order.
    decoded.sort_by_key(|entry| entry.index);
    stats.entries_decoded = decoded.len();
    stats.entries_skipped = stats.entries_seen - stats.entries_decoded;

    let mut aggregator = Aggregator::new(directory, diagnostics.clone());
    for entry in decoded {
        let channel = channel_for_entry(&entry.name).to_owned();
        aggregator.ingest_entry(&channel, &entry.name, entry.messages);
    }
    stats.channels = aggregator.channel_count();
    let channels = aggregator.finish();

    diagnostics.emit(Diagnostic::new(
        DiagnosticKind::IngestComplete,
        Severity::Info,
        format!(
            "{} entries decoded, {} skipped, {} channels, {} known users",
            stats.entries_decoded, stats.entries_skipped, stats.channels, stats.known_users
        ),
    ));

    Ok(IngestOutcome { channels, stats })
}

/// Build the user directory from the archive's user listing, if present.
///
/// A missing listing is normal (empty directory, raw ids everywhere); a
/// listing that is present but unreadable or not an array degrades the same
/// way, with a diagnostic.
fn build_directory<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    config: &IngestConfig,
    diagnostics: &Diagnostics,
) -> UserDirectory {
    let mut raw = String::new();
    match archive.by_name(&config.users_file) {
        Ok(mut entry) => {
            if let Err(error) = entry.read_to_string(&mut raw) {
                diagnostics.emit(
                    Diagnostic::new(
                        DiagnosticKind::MalformedUserRecord,
                        Severity::Warning,
                        format!("could not read user listing: {error}"),
                    )
                    .with_entry(&config.users_file),
                );
                return UserDirectory::empty();
            }
        }
        Err(_) => return UserDirectory::empty(),
    }

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(records)) => {
            let records: Vec<UserRecord> =
                records.iter().map(UserRecord::from_entry_value).collect();
            UserDirectory::build(records, diagnostics)
        }
        Ok(_) => {
            diagnostics.emit(
                Diagnostic::new(
                    DiagnosticKind::MalformedUserRecord,
                    Severity::Warning,
                    "user listing is not a JSON array",
                )
                .with_entry(&config.users_file),
            );
            UserDirectory::empty()
        }
        Err(error) => {
            diagnostics.emit(
                Diagnostic::new(
                    DiagnosticKind::MalformedUserRecord,
                    Severity::Warning,
                    format!("user listing is not valid JSON: {error}"),
                )
                .with_entry(&config.users_file),
            );
            UserDirectory::empty()
        }
    }
}

/// Decode one entry payload into its message array, or diagnose and drop it.
fn decode_entry(job: &DecodeJob, diagnostics: &Diagnostics) -> Option<DecodedEntry> {
    match serde_json::from_slice::<Value>(&job.bytes) {
        Ok(Value::Array(messages)) => Some(DecodedEntry {
            index: job.index,
            name: job.name.clone(),
            messages,
        }),
        Ok(_) => {
            diagnostics.emit(
                Diagnostic::new(
                    DiagnosticKind::MalformedEntry,
                    Severity::Warning,
                    "entry content is not a message array",
                )
                .with_entry(&job.name),
            );
            None
        }
        Err(error) => {
            diagnostics.emit(
                Diagnostic::new(
                    DiagnosticKind::MalformedEntry,
                    Severity::Warning,
                    format!("entry is not valid JSON: {error}"),
                )
                .with_entry(&job.name),
            );
            None
        }
    }
}
