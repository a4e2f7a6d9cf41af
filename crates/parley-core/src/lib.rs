//! Session state, upload pipeline, and question-answer orchestration for the
//! parley document chat client.
//!
//! The crate is transport-agnostic: everything network-facing goes through
//! the [`backend::Backend`] trait, so the engine and registry can be tested
//! against a scripted backend without a server.

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;
pub mod persistence;
pub mod preview;
pub mod progress;
pub mod session;

pub use backend::{Backend, BackendError};
pub use config::Config;
pub use engine::{ChatEngine, EngineCommand, Notice, Severity, UiEvent};
pub use error::{CoreError, Result};
pub use model::{
    Citation, Confidence, Message, MessageId, PendingMessage, Response, SessionId,
    StructuredAnswer, UploadedFile,
};
pub use progress::{ProcessingStep, UploadProgress, UploadStage};
pub use session::{Session, SessionRegistry};
