use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid username: {reason}")]
    InvalidUsername { reason: String },

    #[error("invalid probe settings for {field}: {reason}")]
    InvalidSettings { field: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
