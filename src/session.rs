//! Transcript bookkeeping for the conversation session.
//!
//! The reactive layer in `state.rs` is the only writer of the transcript;
//! everything it appends or transmits is built here so the round-trip rules
//! stay testable without a browser.

use std::sync::LazyLock;

use regex::Regex;

use crate::api::ApiError;
use crate::models::{HistoryEntry, Message, Role, Source};

/// How many trailing turns accompany each chat request.
pub const HISTORY_WINDOW: usize = 6;

/// Shown when a round-trip fails without a server-supplied detail.
pub const FALLBACK_ANSWER: &str =
    "Sorry, I couldn't process that question. Please try again in a moment.";

/// Some generations still append a textual citation footer to the answer.
/// The structured `sources` field is the only citation source of truth, so
/// everything from the first marker on is dropped from the displayed body.
static SOURCES_FOOTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Sources\s*Used\s*:").expect("sources footer regex"));

/// Displayed body of a raw answer: everything before the first footer
/// marker, trimmed.
pub fn strip_sources_footer(answer: &str) -> &str {
    match SOURCES_FOOTER.find(answer) {
        Some(m) => answer[..m.start()].trim(),
        None => answer.trim(),
    }
}

pub fn user_turn(text: &str, ts: String) -> Message {
    Message {
        role: Role::User,
        content: text.to_string(),
        ts,
        sources: Vec::new(),
    }
}

pub fn assistant_turn(raw_answer: &str, sources: Vec<Source>, ts: String) -> Message {
    Message {
        role: Role::Assistant,
        content: strip_sources_footer(raw_answer).to_string(),
        ts,
        sources,
    }
}

/// Synthetic assistant turn standing in for a failed round-trip.
pub fn error_turn(err: &ApiError, ts: String) -> Message {
    Message {
        role: Role::Assistant,
        content: err
            .detail()
            .map(str::to_string)
            .unwrap_or_else(|| FALLBACK_ANSWER.to_string()),
        ts,
        sources: Vec::new(),
    }
}

/// The last [`HISTORY_WINDOW`] turns of the post-append transcript, oldest
/// first, reduced to role/content pairs.
pub fn history_for_backend(messages: &[Message]) -> Vec<HistoryEntry> {
    let skip = messages.len().saturating_sub(HISTORY_WINDOW);
    messages[skip..]
        .iter()
        .map(|m| HistoryEntry {
            role: m.role,
            content: m.content.clone(),
        })
        .collect()
}

/// Text of the most recent user turn, for regeneration.
pub fn last_user_text(messages: &[Message]) -> Option<String> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> String {
        "10:15:00 AM".to_string()
    }

    #[test]
    fn test_footer_is_stripped_from_displayed_body() {
        let raw = "The rate is 18%.\n\nSources Used:\n1. GST Act";
        assert_eq!(strip_sources_footer(raw), "The rate is 18%.");
    }

    #[test]
    fn test_footer_marker_is_case_insensitive() {
        assert_eq!(strip_sources_footer("Answer.\nSOURCES USED: x"), "Answer.");
        assert_eq!(strip_sources_footer("Answer.\nsources  used : x"), "Answer.");
    }

    #[test]
    fn test_repeated_markers_are_all_discarded() {
        let raw = "Body.\nSources Used: a\nSources Used: b";
        assert_eq!(strip_sources_footer(raw), "Body.");
    }

    #[test]
    fn test_answer_without_footer_is_trimmed_only() {
        assert_eq!(strip_sources_footer("  Plain answer.  "), "Plain answer.");
    }

    #[test]
    fn test_completed_round_trip_appends_two_turns() {
        let mut transcript = Vec::new();
        transcript.push(user_turn("What is the GST rate?", ts()));
        let history = history_for_backend(&transcript);
        assert_eq!(history.len(), 1);
        transcript.push(assistant_turn("The rate is 18%.", Vec::new(), ts()));
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::User);
        assert_eq!(transcript[1].role, Role::Assistant);
    }

    #[test]
    fn test_failed_round_trip_appends_two_turns() {
        let mut transcript = vec![user_turn("hello", ts())];
        let err = ApiError::Server {
            status: 503,
            detail: None,
        };
        transcript.push(error_turn(&err, ts()));
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].content, FALLBACK_ANSWER);
        assert!(transcript[1].sources.is_empty());
    }

    #[test]
    fn test_error_turn_uses_server_detail_when_present() {
        let err = ApiError::Server {
            status: 422,
            detail: Some("Question too long.".to_string()),
        };
        assert_eq!(error_turn(&err, ts()).content, "Question too long.");
    }

    #[test]
    fn test_history_is_capped_at_window() {
        let transcript: Vec<Message> = (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    user_turn(&format!("q{i}"), ts())
                } else {
                    assistant_turn(&format!("a{i}"), Vec::new(), ts())
                }
            })
            .collect();
        let history = history_for_backend(&transcript);
        assert_eq!(history.len(), HISTORY_WINDOW);
        // oldest first, i.e. turns 4..10
        assert_eq!(history[0].content, "q4");
        assert_eq!(history[5].content, "a9");
    }

    #[test]
    fn test_short_transcript_sends_everything() {
        let transcript = vec![user_turn("only one", ts())];
        assert_eq!(history_for_backend(&transcript).len(), 1);
    }

    #[test]
    fn test_last_user_text_skips_assistant_turns() {
        let transcript = vec![
            user_turn("first", ts()),
            assistant_turn("answer", Vec::new(), ts()),
            user_turn("second", ts()),
            assistant_turn("answer", Vec::new(), ts()),
        ];
        assert_eq!(last_user_text(&transcript).as_deref(), Some("second"));
    }

    #[test]
    fn test_last_user_text_empty_transcript() {
        assert_eq!(last_user_text(&[]), None);
    }
}
