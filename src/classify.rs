//! Message classification predicates.
//!
//! Four pure, total predicates over a single [`Message`]. All matching is
//! case-insensitive and unanchored (substring semantics); the signatures are
//! compiled once per process and never rebuilt per message, so classifying
//! the same input twice always yields the same answer.
//!
//! Canonical definitions (the tests below are the contract):
//! - countable: the message has non-empty text. Textless records are
//!   join/leave noise and are not tallied.
//! - merged: the text carries a "PR … merged :white_check_mark:" marker.
//! - closed: the text carries the reflection-bot prompt: the bot preamble,
//!   then "PR ...", then either "was merged" or ":x: closed but not merged".
//!   Presence of the prompt only; replies are irrelevant.
//! - reflection: the same prompt signature AND at least one thread reply.

use std::sync::LazyLock;

use regex::Regex;

use crate::message::Message;

/// "PR … merged :white_check_mark:" anywhere in the text.
static MERGED_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)PR\s.*\smerged\s:white_check_mark:").expect("merged signature compiles")
});

/// The reflection-bot prompt: preamble, "PR …", then one of the two outcome
/// phrases. The outcome phrase is part of the prompt the bot posts, so its
/// presence is required for the signature to match.
static PROMPT_SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i):thinking_face: Hello from reflection bot! :thinking_face:\s*PR\s.*?(?:was\s*merged|:x:\s*closed but not merged)",
    )
    .expect("prompt signature compiles")
});

/// True iff the message should be tallied at all: non-empty text.
#[must_use]
pub fn is_countable(message: &Message) -> bool {
    message.text.as_deref().is_some_and(|text| !text.is_empty())
}

/// True iff the message announces a merged pull request.
#[must_use]
pub fn is_merged(message: &Message) -> bool {
    message
        .text
        .as_deref()
        .is_some_and(|text| MERGED_SIGNATURE.is_match(text))
}

/// True iff the message is a reflection-bot prompt, merged or not.
#[must_use]
pub fn is_closed(message: &Message) -> bool {
    message
        .text
        .as_deref()
        .is_some_and(|text| PROMPT_SIGNATURE.is_match(text))
}

/// True iff the message is a reflection-bot prompt that received at least
/// one reply.
#[must_use]
pub fn is_reflection(message: &Message) -> bool {
    is_closed(message) && message.reply_count.is_some_and(|count| count >= 1)
}

/// All four predicate results for one message, evaluated together.
#[allow(clippy::struct_excessive_bools)]
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub countable: bool,
    pub merged: bool,
    pub closed: bool,
    pub reflection: bool,
}

impl Classification {
    /// Evaluate every predicate once. The prompt signature is matched a
    /// single time and shared between `closed` and `reflection`.
    #[must_use]
    pub fn of(message: &Message) -> Self {
        let closed = is_closed(message);
        Self {
            countable: is_countable(message),
            merged: is_merged(message),
            closed,
            reflection: closed && message.reply_count.is_some_and(|count| count >= 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> Message {
        Message {
            user: Some("U1".to_string()),
            text: Some(text.to_string()),
            reply_count: None,
        }
    }

    fn prompt(outcome: &str) -> String {
        format!(":thinking_face: Hello from reflection bot! :thinking_face: PR #42 fix the build {outcome}")
    }

    // ──────────────────── countable ────────────────────

    #[test]
    fn countable_requires_non_empty_text() {
        assert!(is_countable(&message("hello")));
        assert!(!is_countable(&message("")));
        assert!(!is_countable(&Message::default()));
    }

    // ──────────────────── merged ────────────────────

    #[test]
    fn merged_matches_the_checkmark_marker() {
        assert!(is_merged(&message("PR #3 merged :white_check_mark:")));
        assert!(is_merged(&message(
            "heads up: PR improve-logging was merged :white_check_mark: nice work"
        )));
    }

    #[test]
    fn merged_is_case_insensitive() {
        assert!(is_merged(&message("pr #3 MERGED :WHITE_CHECK_MARK:")));
    }

    #[test]
    fn merged_rejects_plain_chatter() {
        assert!(!is_merged(&message("we merged the branches yesterday")));
        assert!(!is_merged(&message("PR #3 merged")));
        assert!(!is_merged(&Message::default()));
    }

    // ──────────────────── closed / reflection ────────────────────

    #[test]
    fn closed_matches_both_outcome_phrases() {
        assert!(is_closed(&message(&prompt("was merged"))));
        assert!(is_closed(&message(&prompt(":x: closed but not merged!"))));
    }

    #[test]
    fn closed_requires_the_bot_preamble() {
        assert!(!is_closed(&message("PR #42 fix the build was merged")));
        assert!(!is_closed(&message("Hello from reflection bot!")));
    }

    #[test]
    fn closed_allows_newline_between_preamble_and_pr() {
        let text =
            ":thinking_face: Hello from reflection bot! :thinking_face:\nPR #7 tidy docs was merged";
        assert!(is_closed(&message(text)));
    }

    #[test]
    fn closed_is_case_insensitive_and_unanchored() {
        let text = format!("fyi -> {}", prompt("WAS MERGED").to_uppercase());
        assert!(is_closed(&message(&text)));
    }

    #[test]
    fn closed_ignores_reply_count() {
        let mut m = message(&prompt("was merged"));
        m.reply_count = Some(0);
        assert!(is_closed(&m));
        m.reply_count = Some(9);
        assert!(is_closed(&m));
    }

    #[test]
    fn reflection_requires_at_least_one_reply() {
        let mut m = message(&prompt("was merged"));
        assert!(!is_reflection(&m), "absent reply_count is not a reply");
        m.reply_count = Some(0);
        assert!(!is_reflection(&m), "zero replies is not a reflection");
        m.reply_count = Some(1);
        assert!(is_reflection(&m));
        m.reply_count = Some(14);
        assert!(is_reflection(&m));
    }

    #[test]
    fn reflection_requires_the_prompt_signature() {
        let mut m = message("great point, thanks!");
        m.reply_count = Some(5);
        assert!(!is_reflection(&m));
    }

    // ──────────────────── combined ────────────────────

    #[test]
    fn classification_agrees_with_individual_predicates() {
        let mut m = message(&prompt(":x: closed but not merged!"));
        m.reply_count = Some(2);
        let c = Classification::of(&m);
        assert_eq!(c.countable, is_countable(&m));
        assert_eq!(c.merged, is_merged(&m));
        assert_eq!(c.closed, is_closed(&m));
        assert_eq!(c.reflection, is_reflection(&m));
        assert!(c.countable && c.closed && c.reflection && !c.merged);
    }

    #[test]
    fn classification_is_deterministic() {
        let m = message(&prompt("was merged"));
        assert_eq!(Classification::of(&m), Classification::of(&m));
    }

    #[test]
    fn predicates_are_independent() {
        // A merged announcement is not a bot prompt.
        let m = message("PR #8 speed up CI merged :white_check_mark:");
        let c = Classification::of(&m);
        assert!(c.merged && !c.closed && !c.reflection);
    }
}
