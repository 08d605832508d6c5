//! Owner-only `tokens.json`: a flat JSON object of user id -> token.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chagee_utils::{atomic_write, ensure_secure_dir, recover_bak_file};
use serde_json::Value;
use tracing::debug;

use crate::error::CredentialError;

pub(crate) type TokenMap = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub(crate) struct FallbackTokenFile {
    path: PathBuf,
}

impl FallbackTokenFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Read the mapping. Missing or malformed files read as empty, and entries
    /// that are not non-empty strings are skipped.
    pub(crate) fn load(&self) -> TokenMap {
        recover_bak_file(&self.path);

        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!(path = %self.path.display(), "Failed to read token file: {e}");
                }
                return TokenMap::new();
            }
        };

        let Ok(Value::Object(entries)) = serde_json::from_str::<Value>(&raw) else {
            debug!(path = %self.path.display(), "Token file is not a JSON object; ignoring");
            return TokenMap::new();
        };

        entries
            .into_iter()
            .filter_map(|(user_id, value)| match value {
                Value::String(token) if !token.is_empty() => Some((user_id, token)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn save(&self, map: &TokenMap) -> Result<(), CredentialError> {
        let bytes = serde_json::to_vec_pretty(map)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            ensure_secure_dir(parent).map_err(|source| CredentialError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        atomic_write(&self.path, &bytes).map_err(|source| CredentialError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
