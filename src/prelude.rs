//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use channel_reflection_grader::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{CrgError, Result};

// Model
pub use crate::directory::{UserDirectory, UserRecord};
pub use crate::message::Message;

// Classification
pub use crate::classify::{Classification, is_closed, is_countable, is_merged, is_reflection};

// Aggregation
pub use crate::aggregate::{Aggregator, ChannelAccumulator, ChannelReport};
pub use crate::grade::grade;

// Ingestion
pub use crate::ingest::{IngestOutcome, IngestStats, ingest_archive};

// Diagnostics
pub use crate::logger::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
