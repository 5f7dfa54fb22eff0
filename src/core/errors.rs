//! CRG-prefixed error types with structured error codes.
//!
//! Only structural failures are errors: a config that does not parse, an
//! archive that cannot be opened, a worker pool that died. Data-quality
//! conditions inside an archive (malformed entries, bad user records) are
//! diagnostics, not errors — see [`crate::logger::diagnostics`].

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, CrgError>;

/// Top-level error type for the channel reflection grader.
#[derive(Debug, Error)]
pub enum CrgError {
    #[error("[CRG-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CRG-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[CRG-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[CRG-2001] cannot open archive {path}: {details}")]
    ArchiveOpen { path: PathBuf, details: String },

    #[error("[CRG-2002] archive structure failure at entry {entry}: {details}")]
    ArchiveStructure { entry: String, details: String },

    #[error("[CRG-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[CRG-3001] unknown channel: {name}")]
    UnknownChannel { name: String },

    #[error("[CRG-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CRG-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[CRG-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl CrgError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "CRG-1001",
            Self::MissingConfig { .. } => "CRG-1002",
            Self::ConfigParse { .. } => "CRG-1003",
            Self::ArchiveOpen { .. } => "CRG-2001",
            Self::ArchiveStructure { .. } => "CRG-2002",
            Self::Serialization { .. } => "CRG-2101",
            Self::UnknownChannel { .. } => "CRG-3001",
            Self::Io { .. } => "CRG-3002",
            Self::ChannelClosed { .. } => "CRG-3003",
            Self::Runtime { .. } => "CRG-3900",
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for CrgError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for CrgError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_errors() -> Vec<CrgError> {
        vec![
            CrgError::InvalidConfig {
                details: String::new(),
            },
            CrgError::MissingConfig {
                path: PathBuf::new(),
            },
            CrgError::ConfigParse {
                context: "",
                details: String::new(),
            },
            CrgError::ArchiveOpen {
                path: PathBuf::new(),
                details: String::new(),
            },
            CrgError::ArchiveStructure {
                entry: String::new(),
                details: String::new(),
            },
            CrgError::Serialization {
                context: "",
                details: String::new(),
            },
            CrgError::UnknownChannel {
                name: String::new(),
            },
            CrgError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            CrgError::ChannelClosed { component: "" },
            CrgError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = sample_errors();
        let codes: Vec<&str> = errors.iter().map(CrgError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_crg_prefix() {
        for err in &sample_errors() {
            assert!(
                err.code().starts_with("CRG-"),
                "code {} must start with CRG-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = CrgError::ArchiveOpen {
            path: PathBuf::from("/tmp/export.zip"),
            details: "not a zip".to_string(),
        };
        let msg = err.to_string();
        assert!(
            msg.contains("CRG-2001"),
            "display should contain error code: {msg}"
        );
        assert!(
            msg.contains("/tmp/export.zip"),
            "display should contain path: {msg}"
        );
    }

    #[test]
    fn io_convenience_constructor() {
        let err = CrgError::io(
            "/tmp/export.zip",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "CRG-3002");
        assert!(err.to_string().contains("/tmp/export.zip"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: CrgError = json_err.into();
        assert_eq!(err.code(), "CRG-2101");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: CrgError = toml_err.into();
        assert_eq!(err.code(), "CRG-1003");
    }
}
