//! Workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::{RecordId, RecordPrefix};

/// Directory name that marks a workspace root
pub const WORKSPACE_DIR: &str = ".aula";

/// Represents an aula workspace
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Root directory of the workspace (parent of .aula/)
    root: PathBuf,
}

impl Workspace {
    /// Find workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current =
            std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace structure at the given path
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(WORKSPACE_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }

        Self::create_structure(&root)?;
        Ok(Self { root })
    }

    /// Force initialization even if .aula/ exists; config is rewritten
    pub fn init_force(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create_structure(&root)?;
        Ok(Self { root })
    }

    fn create_structure(root: &Path) -> Result<(), WorkspaceError> {
        let aula_dir = root.join(WORKSPACE_DIR);
        for sub in ["content", "outbox", "sessions"] {
            std::fs::create_dir_all(aula_dir.join(sub))
                .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        }

        std::fs::write(aula_dir.join("config.yaml"), Self::default_config())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        Ok(())
    }

    fn default_config() -> &'static str {
        r#"# Aula workspace configuration

# Base URL of the platform API (evaluations are POSTed to {api_url}/api/evaluation)
# api_url: "http://localhost:5000"

# Request timeout in seconds (minimum 5)
# timeout_seconds: 30

# Class used when --class is not given
# default_class: ""

# Sound effects and narration for mini-games
# sound: true
# speech: false
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .aula configuration directory
    pub fn aula_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    /// Directory whose YAML files override the embedded content pack
    pub fn content_dir(&self) -> PathBuf {
        self.aula_dir().join("content")
    }

    /// Directory where offline evaluations are queued
    pub fn outbox_dir(&self) -> PathBuf {
        self.aula_dir().join("outbox")
    }

    /// Directory where play sessions are recorded
    pub fn sessions_dir(&self) -> PathBuf {
        self.aula_dir().join("sessions")
    }

    /// Get the path for a record file
    pub fn record_path(&self, id: &RecordId) -> PathBuf {
        let dir = match id.prefix() {
            RecordPrefix::Eval => self.outbox_dir(),
            RecordPrefix::Play => self.sessions_dir(),
        };
        dir.join(format!("{}.aula.yaml", id))
    }

    /// Iterate all record files of a given prefix type
    pub fn iter_record_files(&self, prefix: RecordPrefix) -> impl Iterator<Item = PathBuf> {
        let dir = match prefix {
            RecordPrefix::Eval => self.outbox_dir(),
            RecordPrefix::Play => self.sessions_dir(),
        };
        walkdir::WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(move |e| {
                let name = e.file_name().to_string_lossy();
                name.ends_with(".aula.yaml") && RecordPrefix::from_filename(&name) == Some(prefix)
            })
            .map(|e| e.path().to_path_buf())
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not an aula workspace (searched from {searched_from:?}). Run 'aula init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("aula workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_workspace_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();

        assert!(ws.aula_dir().join("config.yaml").exists());
        assert!(ws.content_dir().is_dir());
        assert!(ws.outbox_dir().is_dir());
        assert!(ws.sessions_dir().is_dir());
    }

    #[test]
    fn test_workspace_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path()).unwrap();

        let err = Workspace::init(tmp.path()).unwrap_err();
        assert!(matches!(err, WorkspaceError::AlreadyExists(_)));
        assert!(Workspace::init_force(tmp.path()).is_ok());
    }

    #[test]
    fn test_workspace_discover_from_nested_dir() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path()).unwrap();

        let nested = tmp.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();

        let ws = Workspace::discover_from(&nested).unwrap();
        assert_eq!(
            ws.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_workspace_discover_fails_without_marker() {
        let tmp = tempdir().unwrap();
        let err = Workspace::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound { .. }));
    }

    #[test]
    fn test_iter_record_files_filters_by_prefix() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();

        let play = RecordId::new(RecordPrefix::Play);
        std::fs::write(ws.record_path(&play), "id: x\n").unwrap();
        std::fs::write(ws.sessions_dir().join("notes.txt"), "ignored").unwrap();

        let files: Vec<_> = ws.iter_record_files(RecordPrefix::Play).collect();
        assert_eq!(files.len(), 1);
        assert_eq!(ws.iter_record_files(RecordPrefix::Eval).count(), 0);
    }
}
