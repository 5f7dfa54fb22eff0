//! User directory: id → display name, built once per ingestion run.
//!
//! The directory is an explicit value passed by reference to every call that
//! needs it. It is never process-wide state; two ingestion runs never share
//! or leak entries.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::logger::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};

/// One record of the archive's user listing. Extra fields (profile, team,
/// flags) are ignored.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl UserRecord {
    /// Lenient per-element decode, mirroring [`crate::message::Message::from_entry_value`].
    #[must_use]
    pub fn from_entry_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };
        Self {
            id: map.get("id").and_then(Value::as_str).map(str::to_owned),
            name: map.get("name").and_then(Value::as_str).map(str::to_owned),
        }
    }
}

/// Read-only id → display-name mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDirectory {
    names: HashMap<String, String>,
}

impl UserDirectory {
    /// Empty directory: every lookup falls back to the raw id.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the directory from user records.
    ///
    /// Records missing an id or a name (or with empty values) are skipped
    /// with a diagnostic; the build never aborts. Duplicate ids resolve
    /// last-write-wins.
    #[must_use]
    pub fn build(records: impl IntoIterator<Item = UserRecord>, diagnostics: &Diagnostics) -> Self {
        let mut names = HashMap::new();
        for record in records {
            match (&record.id, &record.name) {
                (Some(id), Some(name)) if !id.is_empty() && !name.is_empty() => {
                    names.insert(id.clone(), name.clone());
                }
                _ => {
                    let mut diagnostic = Diagnostic::new(
                        DiagnosticKind::MalformedUserRecord,
                        Severity::Warning,
                        "user record missing id or name",
                    );
                    if let Some(id) = record.id.filter(|id| !id.is_empty()) {
                        diagnostic = diagnostic.with_user(id);
                    }
                    diagnostics.emit(diagnostic);
                }
            }
        }
        Self { names }
    }

    /// Resolve an id to its display name, falling back to the id itself.
    /// Total: never fails.
    #[must_use]
    pub fn resolve<'a>(&'a self, user_id: &'a str) -> &'a str {
        self.names.get(user_id).map_or(user_id, String::as_str)
    }

    /// Number of known users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the directory has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: Option<&str>, name: Option<&str>) -> UserRecord {
        UserRecord {
            id: id.map(str::to_owned),
            name: name.map(str::to_owned),
        }
    }

    #[test]
    fn build_maps_well_formed_records() {
        let diagnostics = Diagnostics::new();
        let directory = UserDirectory::build(
            vec![
                record(Some("U1"), Some("Alice")),
                record(Some("U2"), Some("Bob")),
            ],
            &diagnostics,
        );
        assert_eq!(directory.resolve("U1"), "Alice");
        assert_eq!(directory.resolve("U2"), "Bob");
        assert_eq!(directory.len(), 2);
        assert!(diagnostics.snapshot().is_empty());
    }

    #[test]
    fn resolve_falls_back_to_raw_id() {
        let directory = UserDirectory::empty();
        assert_eq!(directory.resolve("U404"), "U404");
        assert_eq!(directory.resolve("unknown"), "unknown");
    }

    #[test]
    fn malformed_records_are_skipped_with_diagnostics() {
        let diagnostics = Diagnostics::new();
        let directory = UserDirectory::build(
            vec![
                record(Some("U1"), Some("Alice")),
                record(None, Some("Ghost")),
                record(Some("U2"), None),
                record(Some(""), Some("Blank")),
                record(Some("U3"), Some("")),
            ],
            &diagnostics,
        );
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.resolve("U1"), "Alice");
        assert_eq!(
            diagnostics.count_of(DiagnosticKind::MalformedUserRecord),
            4,
            "each bad record gets its own diagnostic"
        );
    }

    #[test]
    fn duplicate_ids_resolve_last_write_wins() {
        let diagnostics = Diagnostics::new();
        let directory = UserDirectory::build(
            vec![
                record(Some("U1"), Some("Old Name")),
                record(Some("U1"), Some("New Name")),
            ],
            &diagnostics,
        );
        assert_eq!(directory.resolve("U1"), "New Name");
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn independent_builds_share_nothing() {
        let diagnostics = Diagnostics::new();
        let first = UserDirectory::build(vec![record(Some("U1"), Some("Alice"))], &diagnostics);
        let second = UserDirectory::build(vec![record(Some("U2"), Some("Bob"))], &diagnostics);
        assert_eq!(first.resolve("U2"), "U2");
        assert_eq!(second.resolve("U1"), "U1");
    }

    #[test]
    fn from_entry_value_tolerates_junk() {
        let user = UserRecord::from_entry_value(&json!({"id": "U1", "name": "Alice", "extra": 1}));
        assert_eq!(user.id.as_deref(), Some("U1"));
        assert_eq!(user.name.as_deref(), Some("Alice"));

        let junk = UserRecord::from_entry_value(&json!("not an object"));
        assert!(junk.id.is_none() && junk.name.is_none());
    }
}
