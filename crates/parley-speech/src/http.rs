use std::future::Future;
use std::pin::Pin;

use crate::error::SpeechError;
use crate::recognizer::{SpeechRecognizer, Transcription};

/// [`SpeechRecognizer`] posting audio to a whisper-style transcription
/// endpoint.
pub struct HttpRecognizer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecognizer {
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

impl std::fmt::Debug for HttpRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRecognizer")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
}

impl SpeechRecognizer for HttpRecognizer {
    fn transcribe(
        &self,
        audio: &[u8],
        filename: Option<&str>,
    ) -> Pin<Box<dyn Future<Output = Result<Transcription, SpeechError>> + Send + '_>> {
        let audio = audio.to_vec();
        let fname = filename.unwrap_or("audio.wav").to_string();
        Box::pin(async move {
            let part = reqwest::multipart::Part::bytes(audio)
                .file_name(fname)
                .mime_str("application/octet-stream")
                .map_err(|e| SpeechError::TranscriptionFailed(e.to_string()))?;

            let form = reqwest::multipart::Form::new()
                .text("response_format", "json")
                .part("file", part);

            let resp = self
                .client
                .post(&self.endpoint)
                .multipart(form)
                .send()
                .await?;

            if !resp.status().is_success() {
                let status = resp.status();
                let mut body = resp.text().await.unwrap_or_default();
                body.truncate(500);
                return Err(SpeechError::TranscriptionFailed(format!("{status}: {body}")));
            }

            let parsed: TranscriptionResponse = resp.json().await?;
            Ok(Transcription {
                text: parsed.text,
                language: parsed.language,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn transcribe_parses_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"text": "hello there"})),
            )
            .mount(&server)
            .await;

        let recognizer =
            HttpRecognizer::new(reqwest::Client::new(), format!("{}/transcribe", server.uri()));
        let result = recognizer.transcribe(b"riff", Some("clip.wav")).await.unwrap();
        assert_eq!(result.text, "hello there");
    }

    #[tokio::test]
    async fn non_2xx_is_transcription_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad audio"))
            .mount(&server)
            .await;

        let recognizer =
            HttpRecognizer::new(reqwest::Client::new(), format!("{}/transcribe", server.uri()));
        let err = recognizer.transcribe(b"riff", None).await.unwrap_err();
        assert!(matches!(err, SpeechError::TranscriptionFailed(_)));
    }
}
