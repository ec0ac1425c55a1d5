//! Shared helper functions for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};
use std::sync::Arc;

use crate::cli::args::{CliDifficulty, CliEvaluationMode, CliEvaluationType};
use crate::cli::GlobalOpts;
use crate::content::{ContentLoader, ContentPack, Difficulty};
use crate::core::{Config, TokenStore, Workspace};
use crate::evaluation::{EvaluationMode, EvaluationType};
use crate::wizard::{FieldErrors, HttpSubmitter, OutboxSubmitter, Submitter};

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Find the workspace named by `--workspace`, or the one enclosing the current directory
pub fn open_workspace(global: &GlobalOpts) -> Result<Workspace> {
    let found = match &global.workspace {
        Some(path) => Workspace::discover_from(path),
        None => Workspace::discover(),
    };
    found.map_err(|e| miette::miette!("{}", e))
}

/// Like [`open_workspace`], but a missing workspace is not an error
pub fn try_workspace(global: &GlobalOpts) -> Option<Workspace> {
    open_workspace(global).ok()
}

pub fn load_config(workspace: Option<&Workspace>) -> Config {
    Config::load_with(Config::global_config_path().as_deref(), workspace)
}

/// Content with the workspace overrides applied
pub fn load_content(workspace: Option<&Workspace>) -> Result<ContentPack> {
    let mut loader = ContentLoader::new();
    if let Some(ws) = workspace {
        loader = loader.with_override_dir(ws.content_dir());
    }
    Ok(loader.load()?)
}

/// Where wizard payloads go: the outbox when offline, the API otherwise
pub fn build_submitter(
    workspace: Option<&Workspace>,
    config: &Config,
    offline: bool,
) -> Result<Arc<dyn Submitter>> {
    if offline {
        let ws = workspace.ok_or_else(|| {
            miette::miette!("--offline needs a workspace to hold the outbox. Run 'aula init' first.")
        })?;
        return Ok(Arc::new(OutboxSubmitter::new(ws.clone(), config.author())));
    }

    let token = TokenStore::discover(workspace)
        .load()
        .map_err(|e| miette::miette!("{}", e))?;
    let http = HttpSubmitter::from_config(config, token).map_err(|e| miette::miette!("{}", e))?;
    Ok(Arc::new(http))
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .into_diagnostic()
}

/// Print field errors under a step heading
pub fn print_field_errors(step: u8, title: &str, errors: &FieldErrors) {
    eprintln!(
        "{} Step {} ({}) has {} problem(s):",
        style("✗").red(),
        step,
        title,
        errors.len()
    );
    for (field, message) in errors.iter() {
        eprintln!("  {} {}", style(format!("{}:", field)).yellow(), message);
    }
}

impl From<CliEvaluationType> for EvaluationType {
    fn from(value: CliEvaluationType) -> Self {
        match value {
            CliEvaluationType::Quiz => EvaluationType::Quiz,
            CliEvaluationType::Exam => EvaluationType::Exam,
            CliEvaluationType::Task => EvaluationType::Task,
        }
    }
}

impl From<CliEvaluationMode> for EvaluationMode {
    fn from(value: CliEvaluationMode) -> Self {
        match value {
            CliEvaluationMode::Manual => EvaluationMode::Manual,
            CliEvaluationMode::Ai => EvaluationMode::Ai,
        }
    }
}

impl From<CliDifficulty> for Difficulty {
    fn from(value: CliDifficulty) -> Self {
        match value {
            CliDifficulty::Easy => Difficulty::Easy,
            CliDifficulty::Medium => Difficulty::Medium,
            CliDifficulty::Hard => Difficulty::Hard,
            CliDifficulty::Expert => Difficulty::Expert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate_str("Evaluación número", 9), "Evalua...");
    }

    #[test]
    fn test_offline_needs_workspace() {
        let err = build_submitter(None, &Config::default(), true).err().unwrap();
        assert!(err.to_string().contains("aula init"));
    }
}
