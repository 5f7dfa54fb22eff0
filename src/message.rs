//! Message records decoded from per-channel archive entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback identifier for messages with no user field.
pub const UNKNOWN_USER: &str = "unknown";

/// One chat message as exported in a channel log entry.
///
/// Exports carry many more fields (timestamps, reactions, thread metadata);
/// everything beyond these three is ignored. All fields are optional: system
/// records such as join/leave events have no text, and bot records may have
/// no user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque user identifier (e.g. `U02ABCDEF`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Number of thread replies, when the export includes thread metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_count: Option<u64>,
}

impl Message {
    /// Decode one array element of a channel log entry.
    ///
    /// Lenient by contract: a non-object element (or an object with
    /// wrong-typed fields) degrades to an empty message rather than failing
    /// the whole entry. Only the entry-level shape (must be a JSON array) is
    /// enforced upstream.
    #[must_use]
    pub fn from_entry_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };
        Self {
            user: map.get("user").and_then(Value::as_str).map(str::to_owned),
            text: map.get("text").and_then(Value::as_str).map(str::to_owned),
            reply_count: map.get("reply_count").and_then(Value::as_u64),
        }
    }

    /// The identifier used for per-user tallies: the user field, or
    /// [`UNKNOWN_USER`] when absent.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.user.as_deref().unwrap_or(UNKNOWN_USER)
    }
}
