//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{CrgError, Result};

/// Full grader configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub ingest: IngestConfig,
    pub report: ReportConfig,
    pub diagnostics: DiagnosticsConfig,
    pub paths: PathsConfig,
}

/// Archive ingestion knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IngestConfig {
    /// Archive entry holding the user directory.
    pub users_file: String,
    /// Suffix selecting message-log entries.
    pub entry_suffix: String,
    /// Decode worker threads.
    pub parallelism: usize,
    /// Entries larger than this are skipped with a diagnostic.
    pub max_entry_bytes: u64,
}

/// Report rendering knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    /// Title of the HTML report page.
    pub title: String,
    /// Cap on rendered raw-log JSON per archive entry (bytes, 0 = unlimited).
    pub max_log_bytes: u64,
    /// Per-channel user rows shown in the summary table (0 = all).
    pub top_users: usize,
}

/// Diagnostics sink behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Mirror diagnostics to the JSONL log file.
    pub jsonl_enabled: bool,
}

/// Filesystem paths used by crg.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub jsonl_log: PathBuf,
    pub report_file: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            users_file: "users.json".to_string(),
            entry_suffix: ".json".to_string(),
            parallelism: std::thread::available_parallelism()
                .map_or(2, |n| n.get().saturating_div(2).max(1)),
            max_entry_bytes: 64 * 1024 * 1024,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Channel Reflection Report".to_string(),
            max_log_bytes: 1024 * 1024,
            top_users: 0,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[CRG-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir.join(".config").join("crg").join("config.toml");
        let data = home_dir.join(".local").join("share").join("crg");
        Self {
            config_file: cfg,
            jsonl_log: data.join("diagnostics.jsonl"),
            report_file: PathBuf::from("channel-report.html"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path;
    /// defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| CrgError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(CrgError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for logging.
    ///
    /// Uses FNV-1a for cross-process-stable hashing (no `DefaultHasher` whose
    /// seed may vary across Rust releases).
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        // ingest
        if let Some(raw) = env_var("CRG_INGEST_USERS_FILE") {
            self.ingest.users_file = raw;
        }
        if let Some(raw) = env_var("CRG_INGEST_ENTRY_SUFFIX") {
            self.ingest.entry_suffix = raw;
        }
        set_env_usize("CRG_INGEST_PARALLELISM", &mut self.ingest.parallelism)?;
        set_env_u64("CRG_INGEST_MAX_ENTRY_BYTES", &mut self.ingest.max_entry_bytes)?;

        // report
        if let Some(raw) = env_var("CRG_REPORT_TITLE") {
            self.report.title = raw;
        }
        set_env_u64("CRG_REPORT_MAX_LOG_BYTES", &mut self.report.max_log_bytes)?;
        set_env_usize("CRG_REPORT_TOP_USERS", &mut self.report.top_users)?;

        // diagnostics
        set_env_bool(
            "CRG_DIAGNOSTICS_JSONL_ENABLED",
            &mut self.diagnostics.jsonl_enabled,
        )?;
        if let Some(raw) = env_var("CRG_DIAGNOSTICS_JSONL_LOG") {
            self.paths.jsonl_log = PathBuf::from(raw);
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.ingest.parallelism == 0 {
            return Err(CrgError::InvalidConfig {
                details: "ingest.parallelism must be >= 1".to_string(),
            });
        }
        if self.ingest.max_entry_bytes == 0 {
            return Err(CrgError::InvalidConfig {
                details: "ingest.max_entry_bytes must be > 0".to_string(),
            });
        }
        if self.ingest.users_file.trim().is_empty() {
            return Err(CrgError::InvalidConfig {
                details: "ingest.users_file must be non-empty".to_string(),
            });
        }
        if !self.ingest.entry_suffix.starts_with('.') {
            return Err(CrgError::InvalidConfig {
                details: format!(
                    "ingest.entry_suffix must start with '.', got {:?}",
                    self.ingest.entry_suffix
                ),
            });
        }
        if self.report.title.trim().is_empty() {
            return Err(CrgError::InvalidConfig {
                details: "report.title must be non-empty".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_env_u64(name: &str, slot: &mut u64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<u64>().map_err(|error| CrgError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_usize(name: &str, slot: &mut usize) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw
            .parse::<usize>()
            .map_err(|error| CrgError::ConfigParse {
                context: "env",
                details: format!("{name}={raw:?}: {error}"),
            })?;
    }
    Ok(())
}

fn set_env_bool(name: &str, slot: &mut bool) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<bool>().map_err(|error| CrgError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}
