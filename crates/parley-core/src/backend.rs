use crate::model::{SessionId, StructuredAnswer};

/// Typed error for backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Non-2xx status; body is truncated.
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx body that could not be parsed.
    #[error("response parse failed: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

/// The remote contract this client consumes. Implemented over HTTP by
/// `parley-api`; tests substitute a scripted mock.
pub trait Backend: Send + Sync {
    /// Start a new backend session and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the response is malformed.
    fn start_session(&self) -> impl Future<Output = Result<SessionId, BackendError>> + Send;

    /// List previously created backend session ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the response is malformed.
    fn list_sessions(&self) -> impl Future<Output = Result<Vec<SessionId>, BackendError>> + Send;

    /// Upload one document (multipart) into a session. Success is the
    /// existence of a 2xx response.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    fn upload_document(
        &self,
        session: &SessionId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Populate the session from its uploaded documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    fn populate_session(
        &self,
        session: &SessionId,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Extract structured data from the session's documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the response is malformed.
    fn extract_policy_data(
        &self,
        session: &SessionId,
    ) -> impl Future<Output = Result<serde_json::Value, BackendError>> + Send;

    /// Ask a question against the session. `Ok(None)` means the call
    /// succeeded but the expected answer field was absent; callers degrade
    /// to a fixed fallback string rather than treating it as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails at the transport or status level.
    fn fetch_response(
        &self,
        session: &SessionId,
        text: &str,
    ) -> impl Future<Output = Result<Option<StructuredAnswer>, BackendError>> + Send;
}
