use std::path::PathBuf;

use thiserror::Error;

pub type SwaggerResult<T> = Result<T, SwaggerError>;

/// Failure while assembling the documentation.
///
/// All of these abort startup: a fragment that cannot be read or parsed is a
/// packaging bug, not something to paper over at runtime.
#[derive(Debug, Error)]
pub enum SwaggerError {
    #[error("failed to walk fragment directory {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read fragment {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed fragment {path}: {message}")]
    Parse { path: PathBuf, message: String },
}
