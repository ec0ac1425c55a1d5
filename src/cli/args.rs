//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    auth::{LoginArgs, LogoutArgs},
    completions::CompletionsArgs,
    config::ConfigCommands,
    content::ContentCommands,
    eval::EvalCommands,
    game::GameCommands,
    init::InitArgs,
    play::PlayCommands,
    sessions::SessionsCommands,
};

#[derive(Parser)]
#[command(name = "aula")]
#[command(author, version, about = "Aula evaluation and classroom game toolkit")]
#[command(long_about = "Create evaluations and gamified evaluations for the Aula platform, and play the classroom mini-games from the terminal.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .aula/)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new Aula workspace
    Init(InitArgs),

    /// Standard evaluations (quiz, exam, task)
    #[command(subcommand)]
    Eval(EvalCommands),

    /// Gamified evaluations
    #[command(subcommand)]
    Game(GameCommands),

    /// Play a classroom mini-game
    #[command(subcommand)]
    Play(PlayCommands),

    /// Inspect and validate content packs
    #[command(subcommand)]
    Content(ContentCommands),

    /// Saved play sessions
    #[command(subcommand)]
    Sessions(SessionsCommands),

    /// Store the API token
    Login(LoginArgs),

    /// Remove stored API tokens
    Logout(LogoutArgs),

    /// View and change configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables and reports
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// JSON format (for programming)
    Json,
    /// Tab-separated values (for piping)
    Tsv,
}

impl OutputFormat {
    pub fn is_structured(&self) -> bool {
        matches!(self, OutputFormat::Yaml | OutputFormat::Json)
    }
}

/// Evaluation type as given on the command line
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CliEvaluationType {
    #[default]
    Quiz,
    Exam,
    Task,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CliEvaluationMode {
    #[default]
    Manual,
    Ai,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CliRubricMode {
    /// Graded from correct answers
    #[default]
    Automatic,
    /// Criteria given with --criterion
    Manual,
    /// Criteria proposed from the selected objectives
    Ai,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CliDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}
