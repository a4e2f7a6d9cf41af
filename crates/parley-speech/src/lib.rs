//! Speech input for parley: the dictation merge state machine and a
//! whisper-style HTTP transcription client behind the [`SpeechRecognizer`]
//! trait.

pub mod dictation;
pub mod error;
pub mod http;
pub mod recognizer;

pub use dictation::Dictation;
pub use error::SpeechError;
pub use http::HttpRecognizer;
pub use recognizer::{SpeechRecognizer, Transcription};
