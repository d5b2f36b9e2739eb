//! In-band tag grammar for generated replies.
//!
//! ```text
//! raw      := [OFF_TOPIC]? reply tags?
//! tags     := "[STATUS:" value "]" ... ("[CATEGORY:" value "]")?
//! ```
//!
//! Parsing is total: missing markers resolve to defaults and unterminated
//! brackets are cut at the next marker or the end of input.

use serde::Serialize;

use crate::db::StudyMode;

pub const STATUS_MARKER: &str = "[STATUS:";
pub const CATEGORY_MARKER: &str = "[CATEGORY:";
pub const OFF_TOPIC_MARKER: &str = "[OFF_TOPIC]";

pub const DEFAULT_STATUS: &str = "general";
pub const DEFAULT_CATEGORY: &str = "general";
/// Category used when a status tag is present but no category tag follows.
pub const UNTAGGED_CATEGORY: &str = "other";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedReply {
    pub reply: String,
    pub status: String,
    pub category: String,
    pub off_topic: bool,
}

/// Splits `raw` into the visible reply and its tags.
///
/// The off-topic flag is only raised in studying mode; in break mode the
/// marker is stripped from the reply and ignored.
pub fn parse_reply(raw: &str, mode: StudyMode) -> ParsedReply {
    let (body, marked_off_topic) = strip_off_topic(raw);

    let Some(status_at) = body.find(STATUS_MARKER) else {
        let reply = if marked_off_topic {
            body.trim().to_string()
        } else {
            body.to_string()
        };
        return ParsedReply {
            reply,
            status: DEFAULT_STATUS.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            off_topic: marked_off_topic && mode == StudyMode::Studying,
        };
    };

    let reply = body[..status_at].trim().to_string();
    let tags = &body[status_at + STATUS_MARKER.len()..];

    let status = tag_value(tags).unwrap_or(DEFAULT_STATUS);
    let category = tags
        .find(CATEGORY_MARKER)
        .and_then(|at| tag_value(&tags[at + CATEGORY_MARKER.len()..]))
        .unwrap_or(UNTAGGED_CATEGORY);

    ParsedReply {
        reply,
        status: status.to_string(),
        category: category.to_string(),
        off_topic: marked_off_topic && mode == StudyMode::Studying,
    }
}

fn strip_off_topic(raw: &str) -> (&str, bool) {
    match raw.trim_start().strip_prefix(OFF_TOPIC_MARKER) {
        Some(rest) => (rest, true),
        None => (raw, false),
    }
}

/// Text up to the closing `]`. An unterminated value stops where the next
/// tag opens, or at the end of input.
fn tag_value(region: &str) -> Option<&str> {
    let end = region
        .find(|c: char| c == ']' || c == '[')
        .unwrap_or(region.len());
    let value = region[..end].trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_tags_are_removed_from_reply() {
        let parsed = parse_reply(
            "Think about what the denominator means.\n[STATUS:🟢 Focused studying] [CATEGORY:study question]",
            StudyMode::Studying,
        );
        assert_eq!(parsed.reply, "Think about what the denominator means.");
        assert_eq!(parsed.status, "🟢 Focused studying");
        assert_eq!(parsed.category, "study question");
        assert!(!parsed.off_topic);
    }

    #[test]
    fn untagged_text_is_returned_whole_with_defaults() {
        let raw = "  Just a plain answer.\n";
        let parsed = parse_reply(raw, StudyMode::Studying);
        assert_eq!(parsed.reply, raw);
        assert_eq!(parsed.status, DEFAULT_STATUS);
        assert_eq!(parsed.category, DEFAULT_CATEGORY);
        assert!(!parsed.off_topic);
    }

    #[test]
    fn missing_category_uses_untagged_label() {
        let parsed = parse_reply("Hi! [STATUS:🟡 General chat]", StudyMode::Studying);
        assert_eq!(parsed.reply, "Hi!");
        assert_eq!(parsed.status, "🟡 General chat");
        assert_eq!(parsed.category, UNTAGGED_CATEGORY);
    }

    #[test]
    fn unterminated_status_stops_at_category_marker() {
        let parsed = parse_reply("Reply [STATUS:focused [CATEGORY:math]", StudyMode::Studying);
        assert_eq!(parsed.reply, "Reply");
        assert_eq!(parsed.status, "focused");
        assert_eq!(parsed.category, "math");
    }

    #[test]
    fn unterminated_category_runs_to_end() {
        let parsed = parse_reply("Reply [STATUS:focused] [CATEGORY:algebra", StudyMode::Studying);
        assert_eq!(parsed.status, "focused");
        assert_eq!(parsed.category, "algebra");
    }

    #[test]
    fn truncated_status_marker_never_panics() {
        let parsed = parse_reply("Reply [STATUS:", StudyMode::Studying);
        assert_eq!(parsed.reply, "Reply");
        assert_eq!(parsed.status, DEFAULT_STATUS);
        assert_eq!(parsed.category, UNTAGGED_CATEGORY);

        let parsed = parse_reply("[STATUS:]", StudyMode::Studying);
        assert_eq!(parsed.reply, "");
        assert_eq!(parsed.status, DEFAULT_STATUS);
    }

    #[test]
    fn only_first_status_marker_splits() {
        let parsed = parse_reply(
            "A [STATUS:one] [CATEGORY:x] [STATUS:two]",
            StudyMode::Studying,
        );
        assert_eq!(parsed.reply, "A");
        assert_eq!(parsed.status, "one");
        assert_eq!(parsed.category, "x");
    }

    #[test]
    fn off_topic_prefix_is_stripped_and_flagged_while_studying() {
        let parsed = parse_reply(
            "[OFF_TOPIC]  Let's get back to fractions. [STATUS:🔴 Off-task warning] [CATEGORY:off-task]",
            StudyMode::Studying,
        );
        assert!(parsed.off_topic);
        assert_eq!(parsed.reply, "Let's get back to fractions.");
        assert_eq!(parsed.status, "🔴 Off-task warning");
    }

    #[test]
    fn off_topic_prefix_without_tags_is_trimmed() {
        let parsed = parse_reply("[OFF_TOPIC] Not now!  ", StudyMode::Studying);
        assert!(parsed.off_topic);
        assert_eq!(parsed.reply, "Not now!");
    }

    #[test]
    fn break_mode_strips_marker_but_never_flags() {
        for raw in ["[OFF_TOPIC] Sure, let's chat about games.", "[OFF_TOPIC]", "  [OFF_TOPIC]x [STATUS:a]"] {
            let parsed = parse_reply(raw, StudyMode::Break);
            assert!(!parsed.off_topic, "flagged in break mode: {raw}");
            assert!(!parsed.reply.contains(OFF_TOPIC_MARKER));
        }
    }

    #[test]
    fn marker_later_in_text_is_not_a_prefix() {
        let parsed = parse_reply("The tag [OFF_TOPIC] appears mid-sentence", StudyMode::Studying);
        assert!(!parsed.off_topic);
        assert_eq!(parsed.reply, "The tag [OFF_TOPIC] appears mid-sentence");
    }

    #[test]
    fn arbitrary_bracket_soup_is_total() {
        let inputs = [
            "",
            "]",
            "[",
            "[STATUS:[CATEGORY:",
            "[CATEGORY:x] [STATUS:y",
            "[OFF_TOPIC][STATUS:]]]][CATEGORY:]",
            "多字节 [STATUS:학습 몰입 중] [CATEGORY:학습 질문]",
        ];
        for raw in inputs {
            let parsed = parse_reply(raw, StudyMode::Studying);
            assert!(!parsed.status.is_empty());
            assert!(!parsed.category.is_empty());
        }
    }

    #[test]
    fn multibyte_status_values_survive() {
        let parsed = parse_reply("설명입니다 [STATUS:🟢 학습 몰입 중] [CATEGORY:학습 질문]", StudyMode::Studying);
        assert_eq!(parsed.reply, "설명입니다");
        assert_eq!(parsed.status, "🟢 학습 몰입 중");
        assert_eq!(parsed.category, "학습 질문");
    }
}
