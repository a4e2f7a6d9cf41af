/// Errors specific to parley-tui.
#[derive(Debug, thiserror::Error)]
pub enum TuiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("event channel closed")]
    ChannelClosed,
}
