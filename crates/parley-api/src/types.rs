//! Wire payloads for the document chat backend.

use parley_core::StructuredAnswer;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListSessionsResponse {
    #[serde(default)]
    pub data: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionRequest<'a> {
    pub session_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ExtractResponse {
    pub structured_data: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct QuestionRequest<'a> {
    pub session_id: &'a str,
    pub text: &'a str,
}

/// A 2xx answer body. The `response` field is optional on the wire; its
/// absence is a degraded-but-successful answer, not an error.
#[derive(Debug, Deserialize)]
pub struct AnswerEnvelope {
    pub response: Option<StructuredAnswer>,
}
