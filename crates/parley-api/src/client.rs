//! HTTP implementation of the core [`Backend`] trait.

use std::time::Duration;

use parley_core::backend::{Backend, BackendError};
use parley_core::{SessionId, StructuredAnswer};

use crate::types::{
    AnswerEnvelope, ExtractResponse, ListSessionsResponse, QuestionRequest, SessionRequest,
    StartSessionResponse,
};

/// Shared HTTP client with standard parley configuration.
///
/// Config: 30s connect timeout, 60s request timeout,
/// `parley/{version}` user-agent, redirect limit 10.
///
/// # Panics
///
/// Panics if the TLS backend cannot be initialized; this is a startup-time
/// environment failure, not a runtime condition.
#[must_use]
pub fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(60))
        .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("default HTTP client construction must not fail")
}

/// Backend client speaking the document chat HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    /// Non-2xx becomes `BackendError::Status` with the body truncated to its
    /// first 500 bytes.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let mut body = resp.text().await.unwrap_or_default();
        body.truncate(500);
        Err(BackendError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn transport(e: &reqwest::Error) -> BackendError {
        BackendError::Http(e.to_string())
    }

    fn parse(e: &reqwest::Error) -> BackendError {
        BackendError::Parse(e.to_string())
    }
}

impl Backend for HttpBackend {
    async fn start_session(&self) -> Result<SessionId, BackendError> {
        let resp = self
            .client
            .post(self.url("startSession"))
            .send()
            .await
            .map_err(|e| Self::transport(&e))?;
        let parsed: StartSessionResponse = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| Self::parse(&e))?;
        Ok(SessionId(parsed.session_id))
    }

    async fn list_sessions(&self) -> Result<Vec<SessionId>, BackendError> {
        let resp = self
            .client
            .get(self.url("listSessions"))
            .send()
            .await
            .map_err(|e| Self::transport(&e))?;
        let parsed: ListSessionsResponse = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| Self::parse(&e))?;
        Ok(parsed.data.into_iter().map(SessionId).collect())
    }

    async fn upload_document(
        &self,
        session: &SessionId,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), BackendError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str("application/octet-stream")
            .map_err(|e| BackendError::Other(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("files", part)
            .text("session_id", session.as_str().to_owned());

        let resp = self
            .client
            .post(self.url("uploadDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::transport(&e))?;
        Self::check(resp).await?;
        tracing::debug!(session = %session, file = file_name, "document uploaded");
        Ok(())
    }

    async fn populate_session(&self, session: &SessionId) -> Result<(), BackendError> {
        let resp = self
            .client
            .post(self.url("populateSession"))
            .json(&SessionRequest {
                session_id: session.as_str(),
            })
            .send()
            .await
            .map_err(|e| Self::transport(&e))?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn extract_policy_data(
        &self,
        session: &SessionId,
    ) -> Result<serde_json::Value, BackendError> {
        let resp = self
            .client
            .post(self.url("extractPolicyData"))
            .json(&SessionRequest {
                session_id: session.as_str(),
            })
            .send()
            .await
            .map_err(|e| Self::transport(&e))?;
        let parsed: ExtractResponse = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| Self::parse(&e))?;
        Ok(parsed.structured_data)
    }

    async fn fetch_response(
        &self,
        session: &SessionId,
        text: &str,
    ) -> Result<Option<StructuredAnswer>, BackendError> {
        let resp = self
            .client
            .post(self.url("fetchResponse"))
            .json(&QuestionRequest {
                session_id: session.as_str(),
                text,
            })
            .send()
            .await
            .map_err(|e| Self::transport(&e))?;
        let parsed: AnswerEnvelope = Self::check(resp)
            .await?
            .json()
            .await
            .map_err(|e| Self::parse(&e))?;
        Ok(parsed.response)
    }
}
