use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::progress::UploadProgress;

/// Server-assigned session identifier, or a locally generated uuid when the
/// backend could not be reached at startup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Stable message identity, assigned once by the registry. Progress messages
/// are rewritten in place through this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One transcript entry: the user's query (or upload marker) plus the
/// assistant side of the exchange. Append-only once added to a session,
/// except for the progress stage of an upload message.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub query: String,
    pub response: Response,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_file: Option<UploadedFile>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum Response {
    /// Plain text: fallback answers and fixed failure strings.
    Text(String),
    /// A structured answer with confidence and citations.
    Structured(StructuredAnswer),
    /// The in-place rewritten progress record of an upload.
    Progress(UploadProgress),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredAnswer {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Confidence {
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub document_name: String,
    pub confidence: Confidence,
    pub text_snippet: String,
}

/// Record of an uploaded file, owned by a session. Never mutated after the
/// upload succeeds.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub content: FilePreview,
}

/// Materialized preview content, kept for later display.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilePreview {
    /// Base64 data URL for images and PDFs.
    DataUrl(String),
    /// Raw text for everything readable as UTF-8.
    Text(String),
    /// Office formats get a type-specific placeholder viewer instead.
    None,
}

/// Optimistic placeholder for a question that has been submitted but not yet
/// answered. At most one exists at a time; it is converted into a persisted
/// [`Message`] when the answer or error arrives.
#[derive(Debug, Clone, Serialize)]
pub struct PendingMessage {
    pub query: String,
    pub submitted_at: DateTime<Utc>,
}

impl PendingMessage {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            submitted_at: Utc::now(),
        }
    }
}
