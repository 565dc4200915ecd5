use std::path::PathBuf;

/// Errors raised by the editor engine.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("No image loaded")]
    NoImage,

    #[error("Preview was superseded by a newer render")]
    PreviewSuperseded,

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while talking to the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Backend responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return ApiError::Status {
                status: status.as_u16(),
                body: error.to_string(),
            };
        }
        if error.is_decode() {
            return ApiError::InvalidResponse(error.to_string());
        }
        ApiError::Transport(error.to_string())
    }
}
