use crate::utils::errors::{PvwaError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct CliPaths;
const PROGRAM_NAME: &str = "pvwa-rs";

impl CliPaths {
    /// Get the config directory: ~/.config/pvwa-rs/
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(PROGRAM_NAME))
            .ok_or_else(|| PvwaError::Config("Cannot determine config directory".to_string()))
    }

    /// Get the runtime directory: $XDG_RUNTIME_DIR/pvwa-rs/
    pub fn runtime_dir() -> Result<PathBuf> {
        if let Some(runtime_dir) = std::env::var_os("XDG_RUNTIME_DIR") {
            Ok(PathBuf::from(runtime_dir).join(PROGRAM_NAME))
        } else {
            // Fallback to temp directory with user-specific path
            let user_id = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
            Ok(std::env::temp_dir().join(format!("{PROGRAM_NAME}-{user_id}")))
        }
    }

    /// Get the config file path: ~/.config/pvwa-rs/config.yaml
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.yaml"))
    }

    /// Get the session file path: $XDG_RUNTIME_DIR/pvwa-rs/session.yaml
    pub fn session_file() -> Result<PathBuf> {
        Ok(Self::runtime_dir()?.join("session.yaml"))
    }

    /// Ensure a directory exists with proper permissions
    pub fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;

            // Set restrictive permissions on data directories (700)
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mut perms = fs::metadata(path)?.permissions();
                perms.set_mode(0o700);
                fs::set_permissions(path, perms)?;
            }
        }
        Ok(())
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_dir_exists_is_private() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("a").join("b");
        CliPaths::ensure_dir_exists(&dir).unwrap();
        assert!(dir.is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&dir).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }

        // Second call is a no-op
        CliPaths::ensure_dir_exists(&dir).unwrap();
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/etc/pvwa.yaml"), PathBuf::from("/etc/pvwa.yaml"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x.yaml"), home.join("x.yaml"));
        }
    }
}
