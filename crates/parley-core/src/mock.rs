//! Test-only scripted backend.

use std::sync::{Arc, Mutex};

use crate::backend::{Backend, BackendError};
use crate::model::{SessionId, StructuredAnswer};

/// Scripted [`Backend`] for engine tests: records every call and fails
/// individual operations on demand.
#[derive(Debug, Clone)]
pub struct MockBackend {
    pub session_id: String,
    pub structured_data: serde_json::Value,
    pub answers: Arc<Mutex<Vec<Option<StructuredAnswer>>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_start: bool,
    pub fail_upload: bool,
    /// Fail the upload call for file names containing this substring.
    pub fail_upload_matching: Option<String>,
    pub fail_populate: bool,
    pub fail_extract: bool,
    pub fail_answer: bool,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            session_id: "mock-session".into(),
            structured_data: serde_json::json!({"policy_number": "P-100"}),
            answers: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_start: false,
            fail_upload: false,
            fail_upload_matching: None,
            fail_populate: false,
            fail_extract: false,
            fail_answer: false,
        }
    }
}

impl MockBackend {
    #[must_use]
    pub fn with_answers(answers: Vec<Option<StructuredAnswer>>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers)),
            ..Self::default()
        }
    }

    /// Calls recorded as `"operation name-or-args"` strings, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn err(op: &str) -> BackendError {
        BackendError::Other(format!("mock {op} failure"))
    }
}

impl Backend for MockBackend {
    async fn start_session(&self) -> Result<SessionId, BackendError> {
        self.record("start_session");
        if self.fail_start {
            return Err(Self::err("start_session"));
        }
        Ok(SessionId(self.session_id.clone()))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionId>, BackendError> {
        self.record("list_sessions");
        Ok(vec![SessionId(self.session_id.clone())])
    }

    async fn upload_document(
        &self,
        session: &SessionId,
        file_name: &str,
        _bytes: Vec<u8>,
    ) -> Result<(), BackendError> {
        self.record(format!("upload_document {session} {file_name}"));
        if self.fail_upload {
            return Err(Self::err("upload_document"));
        }
        if let Some(pattern) = &self.fail_upload_matching
            && file_name.contains(pattern.as_str())
        {
            return Err(Self::err("upload_document"));
        }
        Ok(())
    }

    async fn populate_session(&self, session: &SessionId) -> Result<(), BackendError> {
        self.record(format!("populate_session {session}"));
        if self.fail_populate {
            return Err(Self::err("populate_session"));
        }
        Ok(())
    }

    async fn extract_policy_data(
        &self,
        session: &SessionId,
    ) -> Result<serde_json::Value, BackendError> {
        self.record(format!("extract_policy_data {session}"));
        if self.fail_extract {
            return Err(Self::err("extract_policy_data"));
        }
        Ok(self.structured_data.clone())
    }

    async fn fetch_response(
        &self,
        session: &SessionId,
        text: &str,
    ) -> Result<Option<StructuredAnswer>, BackendError> {
        self.record(format!("fetch_response {session} {text}"));
        if self.fail_answer {
            return Err(Self::err("fetch_response"));
        }
        let mut answers = self.answers.lock().unwrap();
        if answers.is_empty() {
            Ok(Some(StructuredAnswer {
                answer: format!("mock answer to: {text}"),
                confidence: None,
                citations: Vec::new(),
            }))
        } else {
            Ok(answers.remove(0))
        }
    }
}
