use std::path::PathBuf;

use maskpaint_editor::{ApiError, EditorError};
use maskpaint_shared::DraftError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to parse draft {path}: {source}")]
    Draft {
        path: PathBuf,
        #[source]
        source: DraftError,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: ApiError,
    },
}
