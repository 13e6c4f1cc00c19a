#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ticker period must be greater than zero")]
    InvalidPeriod,
    #[error("a ticker must be created from within a tokio runtime")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error("failed to read ticker config")]
    Io(#[from] std::io::Error),
    #[error("failed to parse ticker config")]
    Config(#[from] serde_json::Error),
}
