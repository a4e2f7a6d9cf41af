#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown session: {0}")]
    UnknownSession(String),

    #[error("unknown message: {0}")]
    UnknownMessage(String),

    #[error("no active session")]
    NoActiveSession,

    #[error(transparent)]
    Backend(#[from] crate::backend::BackendError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
