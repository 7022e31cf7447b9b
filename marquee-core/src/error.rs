use marquee_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Remote call failed or timed out.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote answered with a non-success status.
    #[error("Remote returned {status} for {endpoint}")]
    Remote { status: u16, endpoint: String },

    /// Nothing cached and no connectivity to fetch it.
    #[error("No cached data available while offline")]
    NoDataOffline,

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Failures that stem from connectivity rather than from local state.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SyncError::Network(_)
                | SyncError::Remote { .. }
                | SyncError::NoDataOffline
        )
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Decode(err.to_string())
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(err: tokio::task::JoinError) -> Self {
        SyncError::Internal(format!("background task failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
