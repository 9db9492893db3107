use serde::{Deserialize, Deserializer, Serialize};

/// Who produced a turn in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn is_assistant(self) -> bool {
        matches!(self, Role::Assistant)
    }
}

/// One turn in the conversation. `content` is display text, already stripped
/// of any trailing citation footer. Turns are append-only; regeneration
/// appends a new trailing turn instead of editing history.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub ts: String,
    pub sources: Vec<Source>,
}

/// A citation record attached to an assistant turn. Every field is optional;
/// the backend sends whatever the retriever knows about the chunk.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Source {
    pub id: Option<String>,
    pub score: Option<f64>,
    pub source: Option<String>,
    pub doc_title: Option<String>,
    #[serde(default, deserialize_with = "page_number")]
    pub page_start: Option<String>,
    #[serde(default, deserialize_with = "page_number")]
    pub page_end: Option<String>,
    pub chapter: Option<String>,
    pub topic: Option<String>,
    pub note: Option<String>,
    pub table_csv_url: Option<String>,
    pub thumb_url: Option<String>,
}

/// Page numbers arrive as JSON numbers or strings depending on how the
/// document was indexed. Normalize both to a display string.
fn page_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PageValue {
        Num(f64),
        Str(String),
    }

    let value = Option::<PageValue>::deserialize(deserializer)?;
    Ok(value
        .map(|p| match p {
            PageValue::Num(n) if n.fract() == 0.0 => format!("{}", n as i64),
            PageValue::Num(n) => n.to_string(),
            PageValue::Str(s) => s.trim().to_string(),
        })
        .filter(|s| !s.is_empty()))
}

/// How the backend should shape its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    Qa,
    Discussion,
}

/// A transcript turn reduced to what the backend needs for context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Request body for the chat round-trip.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
    pub mode: AnswerMode,
}

/// Successful chat response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
}

/// Login/signup form payload.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Admin,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub role: UserRole,
}

/// An indexed document as listed by the admin endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentInfo {
    #[serde(rename = "_id")]
    pub id: String,
    pub filename: String,
    pub uploaded_by: Option<String>,
    pub uploaded_at: String,
    pub chunks: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub chunks: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_page_numbers_accept_numbers_and_strings() {
        let s: Source =
            serde_json::from_str(r#"{"page_start": 12, "page_end": "15"}"#).unwrap();
        assert_eq!(s.page_start.as_deref(), Some("12"));
        assert_eq!(s.page_end.as_deref(), Some("15"));
    }

    #[test]
    fn test_source_blank_page_string_is_dropped() {
        let s: Source = serde_json::from_str(r#"{"page_start": "  "}"#).unwrap();
        assert_eq!(s.page_start, None);
    }

    #[test]
    fn test_source_all_fields_optional() {
        let s: Source = serde_json::from_str("{}").unwrap();
        assert_eq!(s, Source::default());
    }

    #[test]
    fn test_history_entry_serializes_role_and_content_only() {
        let entry = HistoryEntry {
            role: Role::Assistant,
            content: "Depreciation spreads cost.".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["role"], "assistant");
        assert_eq!(obj["content"], "Depreciation spreads cost.");
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let req = ChatRequest {
            message: "What is GST?".to_string(),
            history: vec![],
            mode: AnswerMode::Discussion,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["mode"], "discussion");
        assert_eq!(json["message"], "What is GST?");
        assert!(json["history"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_document_info_maps_mongo_id() {
        let doc: DocumentInfo = serde_json::from_str(
            r#"{"_id": "abc123", "filename": "gst.pdf", "uploaded_at": "2024-01-01T00:00:00Z", "chunks": 42}"#,
        )
        .unwrap();
        assert_eq!(doc.id, "abc123");
        assert_eq!(doc.uploaded_by, None);
        assert_eq!(doc.chunks, 42);
    }
}
