use std::future::Future;
use std::pin::Pin;

use crate::error::SpeechError;

#[derive(Debug, Clone)]
pub struct Transcription {
    pub text: String,
    pub language: Option<String>,
}

/// Async trait for speech-to-text backends.
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe audio bytes into text.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::TranscriptionFailed` if the backend rejects the
    /// request.
    fn transcribe(
        &self,
        audio: &[u8],
        filename: Option<&str>,
    ) -> Pin<Box<dyn Future<Output = Result<Transcription, SpeechError>> + Send + '_>>;
}
