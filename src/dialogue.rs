//! Detection and decomposition of two-party discussion answers.
//!
//! In discussion mode the backend formats answers as alternating lines from
//! two labeled speakers ("User A:", "User B:"). Anything else is left alone
//! for verbatim rendering.

use std::sync::LazyLock;

use regex::Regex;

static DETECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|\n)\s*User\s*[AB]\s*:").expect("dialogue detect regex"));
static LINE_A: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*User\s*A\s*:\s*(.*)$").expect("speaker A regex"));
static LINE_B: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*User\s*B\s*:\s*(.*)$").expect("speaker B regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    A,
    B,
}

impl Speaker {
    pub fn label(self) -> &'static str {
        match self {
            Speaker::A => "User A: ",
            Speaker::B => "User B: ",
        }
    }
}

/// One rendered line of a discussion answer. `speaker` is `None` for lines
/// without a recognized prefix (narration, headings).
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueLine {
    pub speaker: Option<Speaker>,
    pub text: String,
}

/// True when the text carries a line-leading speaker token.
pub fn is_dialogue(text: &str) -> bool {
    !text.is_empty() && DETECT.is_match(text)
}

/// Split a discussion answer into trimmed, non-empty lines classified by
/// speaker, with the recognized prefix stripped.
pub fn parse_lines(text: &str) -> Vec<DialogueLine> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if let Some(caps) = LINE_A.captures(line) {
                DialogueLine {
                    speaker: Some(Speaker::A),
                    text: caps[1].trim().to_string(),
                }
            } else if let Some(caps) = LINE_B.captures(line) {
                DialogueLine {
                    speaker: Some(Speaker::B),
                    text: caps[1].trim().to_string(),
                }
            } else {
                DialogueLine {
                    speaker: None,
                    text: line.to_string(),
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_leading_speaker() {
        assert!(is_dialogue("User A: What is depreciation?"));
    }

    #[test]
    fn test_detects_speaker_after_line_break() {
        assert!(is_dialogue("Here is a discussion.\nUser B: Go on."));
    }

    #[test]
    fn test_detection_is_case_insensitive() {
        assert!(is_dialogue("user a: hello"));
        assert!(is_dialogue("USER B : hello"));
    }

    #[test]
    fn test_plain_prose_is_not_dialogue() {
        assert!(!is_dialogue("Depreciation is the allocation of cost."));
        assert!(!is_dialogue(""));
    }

    #[test]
    fn test_mid_line_mention_is_not_dialogue() {
        assert!(!is_dialogue("Ask User A: style questions politely."));
    }

    #[test]
    fn test_parses_two_speakers_and_strips_prefixes() {
        let lines = parse_lines("User A: What is depreciation?\nUser B: It is cost allocation.");
        assert_eq!(
            lines,
            vec![
                DialogueLine {
                    speaker: Some(Speaker::A),
                    text: "What is depreciation?".to_string(),
                },
                DialogueLine {
                    speaker: Some(Speaker::B),
                    text: "It is cost allocation.".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_unprefixed_line_is_neutral() {
        let lines = parse_lines("User A: Start.\n(Short pause)\nUser B: Continue.");
        assert_eq!(lines[1].speaker, None);
        assert_eq!(lines[1].text, "(Short pause)");
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let lines = parse_lines("User A: One.\n\n\nUser B: Two.\n");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_crlf_input() {
        let lines = parse_lines("User A: One.\r\nUser B: Two.");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "Two.");
    }

    #[test]
    fn test_loose_prefix_spacing() {
        let lines = parse_lines("  user  a :   spaced out  ");
        assert_eq!(lines[0].speaker, Some(Speaker::A));
        assert_eq!(lines[0].text, "spaced out");
    }
}
