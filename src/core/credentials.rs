//! Bearer token storage
//!
//! Tokens are looked up in order: the `AULA_TOKEN` environment variable,
//! the workspace `.aula/token` file, then the per-user data directory.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::Workspace;

const TOKEN_FILE: &str = "token";

/// Where a token was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    File(PathBuf),
}

/// Errors from reading or writing stored tokens
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no token stored. Run 'aula login --token <TOKEN>' or set AULA_TOKEN")]
    Missing,

    #[error("token must not be empty")]
    Empty,

    #[error("cannot determine a data directory for storing the token")]
    NoDataDir,

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File-backed token store
#[derive(Debug, Clone)]
pub struct TokenStore {
    /// Files checked in priority order; writes go to the first
    paths: Vec<PathBuf>,
    read_env: bool,
}

impl TokenStore {
    /// Store rooted at the workspace when one exists, falling back to the user data dir
    pub fn discover(workspace: Option<&Workspace>) -> Self {
        let mut paths = Vec::new();
        if let Some(ws) = workspace {
            paths.push(ws.aula_dir().join(TOKEN_FILE));
        }
        if let Some(dirs) = directories::ProjectDirs::from("", "", "aula") {
            paths.push(dirs.data_dir().join(TOKEN_FILE));
        }
        Self {
            paths,
            read_env: true,
        }
    }

    /// Store backed by a single file, ignoring the environment
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            read_env: false,
        }
    }

    /// Look up the token and where it came from
    pub fn load_with_source(&self) -> Result<(String, TokenSource), CredentialError> {
        if self.read_env {
            if let Ok(token) = std::env::var("AULA_TOKEN") {
                let token = token.trim().to_string();
                if !token.is_empty() {
                    return Ok((token, TokenSource::Environment));
                }
            }
        }

        for path in &self.paths {
            if !path.exists() {
                continue;
            }
            let token = read(path)?;
            if !token.is_empty() {
                return Ok((token, TokenSource::File(path.clone())));
            }
        }

        Err(CredentialError::Missing)
    }

    /// Look up the token
    pub fn load(&self) -> Result<String, CredentialError> {
        self.load_with_source().map(|(token, _)| token)
    }

    /// Persist a token to the highest-priority file
    pub fn save(&self, token: &str) -> Result<PathBuf, CredentialError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CredentialError::Empty);
        }
        let path = self.paths.first().ok_or(CredentialError::NoDataDir)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CredentialError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, format!("{}\n", token)).map_err(|source| CredentialError::Io {
            path: path.clone(),
            source,
        })?;
        restrict_permissions(path);
        Ok(path.clone())
    }

    /// Remove every stored token file; returns the files removed
    pub fn clear(&self) -> Result<Vec<PathBuf>, CredentialError> {
        let mut removed = Vec::new();
        for path in &self.paths {
            if path.exists() {
                std::fs::remove_file(path).map_err(|source| CredentialError::Io {
                    path: path.clone(),
                    source,
                })?;
                removed.push(path.clone());
            }
        }
        Ok(removed)
    }
}

fn read(path: &Path) -> Result<String, CredentialError> {
    std::fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        tracing::warn!("could not restrict permissions on {}: {}", path.display(), e);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_load() {
        let tmp = tempdir().unwrap();
        let store = TokenStore::at(tmp.path().join("nested/token"));

        store.save("  abc.def  ").unwrap();
        assert_eq!(store.load().unwrap(), "abc.def");
    }

    #[test]
    fn test_missing_token() {
        let tmp = tempdir().unwrap();
        let store = TokenStore::at(tmp.path().join("token"));
        assert!(matches!(store.load(), Err(CredentialError::Missing)));
    }

    #[test]
    fn test_empty_token_rejected() {
        let tmp = tempdir().unwrap();
        let store = TokenStore::at(tmp.path().join("token"));
        assert!(matches!(store.save("   "), Err(CredentialError::Empty)));
    }

    #[test]
    fn test_clear_removes_file() {
        let tmp = tempdir().unwrap();
        let store = TokenStore::at(tmp.path().join("token"));
        store.save("t").unwrap();

        let removed = store.clear().unwrap();
        assert_eq!(removed.len(), 1);
        assert!(matches!(store.load(), Err(CredentialError::Missing)));
    }
}
