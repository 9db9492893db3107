//! Human-readable labels for citation records.
//!
//! Each helper returns `None` when the underlying fields are absent so the
//! view can omit the element instead of rendering an empty span.

use crate::models::Source;

/// Display title for a source: document title, then origin label, then a
/// literal fallback.
pub fn title(source: &Source) -> &str {
    source
        .doc_title
        .as_deref()
        .filter(|t| !t.is_empty())
        .or_else(|| source.source.as_deref().filter(|s| !s.is_empty()))
        .unwrap_or("Unknown source")
}

/// Page label. A range collapses to a single page when the end is absent or
/// equal to the start.
pub fn page_label(source: &Source) -> Option<String> {
    let start = source.page_start.as_deref()?;
    match source.page_end.as_deref() {
        Some(end) if end != start => Some(format!("Pages {start}-{end}")),
        _ => Some(format!("Page {start}")),
    }
}

/// Chapter and topic joined into one label; absent fields are omitted.
pub fn chapter_topic(source: &Source) -> Option<String> {
    let parts: Vec<&str> = [source.chapter.as_deref(), source.topic.as_deref()]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" • "))
    }
}

/// Relevance score, informational only.
pub fn score_label(source: &Source) -> Option<String> {
    source.score.map(|s| format!("score {s:.3}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Source {
        Source::default()
    }

    #[test]
    fn test_title_prefers_doc_title() {
        let s = Source {
            doc_title: Some("GST Act".to_string()),
            source: Some("gst.pdf".to_string()),
            ..source()
        };
        assert_eq!(title(&s), "GST Act");
    }

    #[test]
    fn test_title_falls_back_to_origin_label() {
        let s = Source {
            source: Some("gst.pdf".to_string()),
            ..source()
        };
        assert_eq!(title(&s), "gst.pdf");
    }

    #[test]
    fn test_title_falls_back_to_unknown() {
        assert_eq!(title(&source()), "Unknown source");
        let s = Source {
            doc_title: Some(String::new()),
            ..source()
        };
        assert_eq!(title(&s), "Unknown source");
    }

    #[test]
    fn test_single_page_when_range_collapses() {
        let s = Source {
            page_start: Some("12".to_string()),
            page_end: Some("12".to_string()),
            ..source()
        };
        assert_eq!(page_label(&s).as_deref(), Some("Page 12"));
    }

    #[test]
    fn test_page_range() {
        let s = Source {
            page_start: Some("12".to_string()),
            page_end: Some("15".to_string()),
            ..source()
        };
        assert_eq!(page_label(&s).as_deref(), Some("Pages 12-15"));
    }

    #[test]
    fn test_missing_end_page_renders_single_page() {
        let s = Source {
            page_start: Some("7".to_string()),
            ..source()
        };
        assert_eq!(page_label(&s).as_deref(), Some("Page 7"));
    }

    #[test]
    fn test_no_start_page_no_label() {
        let s = Source {
            page_end: Some("15".to_string()),
            ..source()
        };
        assert_eq!(page_label(&s), None);
    }

    #[test]
    fn test_chapter_and_topic_joined() {
        let s = Source {
            chapter: Some("Ch 4".to_string()),
            topic: Some("Input tax credit".to_string()),
            ..source()
        };
        assert_eq!(
            chapter_topic(&s).as_deref(),
            Some("Ch 4 • Input tax credit")
        );
    }

    #[test]
    fn test_chapter_only() {
        let s = Source {
            chapter: Some("Ch 4".to_string()),
            ..source()
        };
        assert_eq!(chapter_topic(&s).as_deref(), Some("Ch 4"));
    }

    #[test]
    fn test_neither_chapter_nor_topic() {
        assert_eq!(chapter_topic(&source()), None);
    }

    #[test]
    fn test_score_formatting() {
        let s = Source {
            score: Some(0.87654),
            ..source()
        };
        assert_eq!(score_label(&s).as_deref(), Some("score 0.877"));
        assert_eq!(score_label(&source()), None);
    }
}
