//! Play sessions saved in the workspace

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::{RecordId, RecordPrefix, Workspace};
use crate::games::counting::CountingResults;
use crate::games::enigma::EnigmaReport;
use crate::yaml::{parse_yaml, YamlSyntaxError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum PlayOutcome {
    Counting(CountingResults),
    Enigma(EnigmaReport),
}

impl PlayOutcome {
    pub fn game_name(&self) -> &'static str {
        match self {
            PlayOutcome::Counting(_) => "counting",
            PlayOutcome::Enigma(_) => "enigma",
        }
    }

    /// Points earned, as the game counts them
    pub fn score(&self) -> u32 {
        match self {
            PlayOutcome::Counting(r) => r.score,
            PlayOutcome::Enigma(r) => r.metrics.investigation_points,
        }
    }

    /// One-line progress summary
    pub fn summary(&self) -> String {
        match self {
            PlayOutcome::Counting(r) => format!(
                "{}/{} correct, {} stickers",
                r.correct_answers,
                r.total_questions,
                r.stickers.len()
            ),
            PlayOutcome::Enigma(r) => format!(
                "{}/{} enigmas, {} clues",
                r.metrics.enigmas_solved, r.metrics.total_enigmas, r.metrics.clues_discovered
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaySession {
    pub id: RecordId,
    pub player: String,
    pub played_at: DateTime<Utc>,
    pub outcome: PlayOutcome,
}

#[derive(Debug, Error, Diagnostic)]
pub enum RecordError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("cannot write session {path}: {message}")]
    #[diagnostic(code(aula::session::write))]
    Write { path: PathBuf, message: String },

    #[error("cannot read session {path}: {message}")]
    #[diagnostic(code(aula::session::read))]
    Read { path: PathBuf, message: String },
}

impl PlaySession {
    pub fn new(player: impl Into<String>, outcome: PlayOutcome) -> Self {
        Self {
            id: RecordId::new(RecordPrefix::Play),
            player: player.into(),
            played_at: Utc::now(),
            outcome,
        }
    }

    pub fn save(&self, workspace: &Workspace) -> Result<PathBuf, RecordError> {
        let path = workspace.record_path(&self.id);
        let write_err = |message: String| RecordError::Write {
            path: path.clone(),
            message,
        };

        let yaml = serde_yml::to_string(self).map_err(|e| write_err(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        std::fs::write(&path, yaml).map_err(|e| write_err(e.to_string()))?;
        debug!("saved {} to {}", self.id, path.display());
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let text = std::fs::read_to_string(path).map_err(|e| RecordError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(parse_yaml(&text, &path.display().to_string())?)
    }

    /// Every readable session in the workspace, oldest first
    pub fn list(workspace: &Workspace) -> Vec<PlaySession> {
        let mut sessions: Vec<PlaySession> = workspace
            .iter_record_files(RecordPrefix::Play)
            .filter_map(|path| match Self::load(&path) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!("skipping unreadable session {}: {}", path.display(), e);
                    None
                }
            })
            .collect();
        sessions.sort_by(|a, b| a.played_at.cmp(&b.played_at));
        sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentPack;
    use crate::games::counting::CountingGame;
    use crate::games::enigma::EnigmaGame;
    use tempfile::tempdir;

    #[test]
    fn test_sessions_saved_and_listed() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        let pack = ContentPack::embedded().unwrap();

        let mut counting = CountingGame::new(pack.counting_set("oa1-v2").unwrap()).unwrap();
        counting.answer(4).unwrap();
        let first = PlaySession::new("sofia", PlayOutcome::Counting(counting.results()));
        let path = first.save(&ws).unwrap();
        assert!(path.starts_with(ws.sessions_dir()));

        let mut enigma = EnigmaGame::new(pack.enigmas.clone(), pack.tools.clone()).unwrap();
        enigma.formulate_hypothesis("de 1 en 1").unwrap();
        let second = PlaySession::new("sofia", PlayOutcome::Enigma(enigma.report()));
        second.save(&ws).unwrap();

        let sessions = PlaySession::list(&ws);
        assert_eq!(sessions.len(), 2);
        assert!(sessions.contains(&first));
        let saved = sessions.iter().find(|s| s.id == second.id).unwrap();
        assert_eq!(saved.outcome.game_name(), "enigma");
        assert_eq!(saved.outcome.score(), 115);
    }

    #[test]
    fn test_broken_session_skipped() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();
        let id = RecordId::new(RecordPrefix::Play);
        std::fs::write(ws.record_path(&id), "id: [unclosed").unwrap();

        assert!(PlaySession::list(&ws).is_empty());
        assert!(matches!(
            PlaySession::load(&ws.record_path(&id)),
            Err(RecordError::Syntax(_))
        ));
    }
}
