#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("no pending batch found")]
    NotFound(String),

    #[error("tab source error: {0:#}")]
    TabSource(anyhow::Error),

    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),

    #[error("confirmation error: {0:#}")]
    Confirmation(anyhow::Error),

    #[error("invalid pending batch record: {0}")]
    Record(#[from] serde_json::Error),

    #[error("batch aborted after {failed} failed tab(s): {message}")]
    Aborted { failed: usize, message: String },
}

pub type Result<T> = std::result::Result<T, BatchError>;
