#![forbid(unsafe_code)]

//! Channel Reflection Grader (crg) — grades chat-channel export archives on
//! PR reflection discipline.
//!
//! One pass over an exported archive: build the user directory, classify
//! every message against fixed content signatures, accumulate per-channel
//! counters, derive a grade, and hand the finalized reports to a renderer
//! (terminal table, JSON, or a self-contained HTML page).
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use channel_reflection_grader::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use channel_reflection_grader::core::config::Config;
//! use channel_reflection_grader::ingest::ingest_archive;
//! ```

pub mod prelude;

pub mod aggregate;
pub mod classify;
pub mod core;
pub mod directory;
pub mod grade;
pub mod ingest;
pub mod logger;
pub mod message;
pub mod report;
