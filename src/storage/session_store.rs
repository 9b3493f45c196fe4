use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::utils::errors::{PvwaError, Result};
use crate::utils::paths::CliPaths;
use crate::vault::credentials::LoginProfile;
use crate::vault::session::Session;

/// What is kept between invocations. Never contains a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub session: Session,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<LoginProfile>,
}

/// File-backed slot for the one session the CLI holds
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store in the runtime directory
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(CliPaths::session_file()?))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn load(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let stored: StoredSession = serde_yaml::from_str(&content).map_err(|e| {
            PvwaError::Storage(format!(
                "Corrupt session file {}: {e}. Please login again.",
                self.path.display()
            ))
        })?;

        tracing::trace!("Loaded session for {}", stored.session.username);
        Ok(Some(stored))
    }

    pub fn save(&self, stored: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            CliPaths::ensure_dir_exists(parent)?;
        }

        let content = serde_yaml::to_string(stored)?;
        fs::write(&self.path, content)?;

        // Set restrictive permissions (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        tracing::debug!("Session stored at: {}", self.path.display());
        Ok(())
    }

    /// Remove the stored session; missing file is fine
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            tracing::debug!("Session file removed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::credentials::AuthMechanism;
    use chrono::Utc;

    fn stored() -> StoredSession {
        StoredSession {
            session: Session::new(
                "tok-123".to_string(),
                "https://vault.example.com/".to_string(),
                "operator".to_string(),
                Utc::now(),
            ),
            profile: Some(LoginProfile {
                base_url: "https://vault.example.com".to_string(),
                username: "operator".to_string(),
                auth_mechanism: AuthMechanism::Ldap,
                allow_concurrent_sessions: false,
            }),
        }
    }

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.yaml"));
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.yaml"));
        let original = stored();

        store.save(&original).unwrap();
        assert_eq!(store.load().unwrap(), Some(original));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(store.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.yaml");
        fs::write(&path, "session: [not, a, session]").unwrap();

        let err = SessionStore::new(path).load().unwrap_err();
        assert!(matches!(err, PvwaError::Storage(_)));
    }
}
