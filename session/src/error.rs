use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to persist the fallback token file.
///
/// Reads never fail: a missing or malformed file simply has no tokens.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to write credential file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode credential file: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure to save the session document.
///
/// Loading never produces this; it degrades to warnings instead.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to write session file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode session document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to persist auth token: {0}")]
    Credential(#[from] CredentialError),
}

impl SessionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SessionError::Io {
            path: path.into(),
            source,
        }
    }
}
