use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("speech capture is not available")]
    Unavailable,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
