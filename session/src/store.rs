use std::fs;
use std::io;
use std::path::Path;

use chagee_types::{AppState, AuthInfo, PartialAppState};
use chagee_utils::{atomic_write, ensure_secure_dir, recover_bak_file};
use tracing::{debug, info, warn};

use crate::credentials::CredentialStore;
use crate::decode::decode_document;
use crate::document::SessionDocument;
use crate::error::SessionError;
use crate::paths::StoragePaths;

/// Result of [`SessionStore::load`]. `state` is `None` on first run or when the
/// document was unusable; `warnings` explains anything that was dropped.
#[derive(Debug, Default)]
pub struct SessionLoad {
    pub state: Option<PartialAppState>,
    pub warnings: Vec<String>,
}

/// Persists [`AppState`] to `session.json` and the auth token to the
/// [`CredentialStore`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    paths: StoragePaths,
    credentials: CredentialStore,
}

impl SessionStore {
    pub fn new(paths: StoragePaths, credentials: CredentialStore) -> Self {
        Self { paths, credentials }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.paths.session_file()
    }

    #[must_use]
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Load the persisted state. Never fails; problems become warnings.
    pub fn load(&self) -> SessionLoad {
        let path = self.path();
        recover_bak_file(path);

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(path = %path.display(), "Session file unreadable, starting fresh: {e}");
                }
                return SessionLoad::default();
            }
        };

        let mut warnings = Vec::new();
        let state = decode_document(&raw, &mut warnings).map(|decoded| {
            let mut state = decoded.state;
            state.auth = decoded.auth.and_then(|persisted| {
                self.hydrate_auth(persisted.user_id, decoded.inline_token, &mut warnings)
            });
            state
        });

        for warning in &warnings {
            warn!(path = %path.display(), "{warning}");
        }
        SessionLoad { state, warnings }
    }

    fn hydrate_auth(
        &self,
        user_id: String,
        inline_token: Option<String>,
        warnings: &mut Vec<String>,
    ) -> Option<AuthInfo> {
        if let Some(token) = inline_token {
            match self.credentials.save(&user_id, &token) {
                Ok(()) => {
                    info!(user_id = %user_id, "Moved inline auth token to the credential store");
                    warnings.push(format!(
                        "migrated inline auth token for userId={user_id} to the credential store"
                    ));
                }
                Err(e) => warnings.push(format!(
                    "inline auth token for userId={user_id} could not be moved to the \
                     credential store: {e}"
                )),
            }
            return Some(AuthInfo::new(user_id, token));
        }

        if let Some(token) = self.credentials.load(&user_id) {
            return Some(AuthInfo::new(user_id, token));
        }
        warnings.push(format!(
            "auth token missing from secure store for userId={user_id}; clearing auth state; \
             please log in again"
        ));
        None
    }

    /// Persist `state`. The token goes to the credential store first, then the
    /// token-free document is written atomically.
    pub fn save(&self, state: &AppState) -> Result<(), SessionError> {
        if let Some(auth) = &state.auth {
            self.credentials.save(&auth.user_id, &auth.token)?;
        }

        let bytes = serde_json::to_vec_pretty(&SessionDocument::from_state(state))?;
        let path = self.path();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            ensure_secure_dir(parent).map_err(|e| SessionError::io(parent, e))?;
        }
        atomic_write(path, &bytes).map_err(|e| SessionError::io(path, e))?;
        debug!(path = %path.display(), cart_version = state.cart_version, "Session saved");
        Ok(())
    }
}
