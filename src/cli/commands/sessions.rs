//! `aula sessions` command - Recorded game sessions

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::open_workspace;
use crate::cli::table::{print_list, print_structured, Rows};
use crate::cli::GlobalOpts;
use crate::games::{PlayOutcome, PlaySession, ReportRenderer};

#[derive(Subcommand, Debug)]
pub enum SessionsCommands {
    /// List recorded sessions, oldest first
    List(ListArgs),

    /// Show one session's report
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only sessions of this game (counting, enigma)
    #[arg(long)]
    pub game: Option<String>,

    /// Only sessions of this player
    #[arg(long)]
    pub player: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Session id (PLAY-...), or a unique prefix of it
    pub id: String,
}

pub fn run(cmd: SessionsCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SessionsCommands::List(args) => run_list(args, global),
        SessionsCommands::Show(args) => run_show(args, global),
    }
}

#[derive(Serialize)]
struct SessionRow {
    id: String,
    game: &'static str,
    player: String,
    played_at: String,
    score: u32,
    summary: String,
}

/// Sessions kept by the `--game` and `--player` filters
fn filter_sessions(sessions: Vec<PlaySession>, args: &ListArgs) -> Vec<PlaySession> {
    sessions
        .into_iter()
        .filter(|s| {
            args.game
                .as_deref()
                .map_or(true, |g| s.outcome.game_name().eq_ignore_ascii_case(g))
        })
        .filter(|s| {
            args.player
                .as_deref()
                .map_or(true, |p| s.player.to_lowercase().contains(&p.to_lowercase()))
        })
        .collect()
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let sessions = filter_sessions(PlaySession::list(&workspace), &args);

    let records: Vec<SessionRow> = sessions
        .iter()
        .map(|s| SessionRow {
            id: s.id.to_string(),
            game: s.outcome.game_name(),
            player: s.player.clone(),
            played_at: s.played_at.format("%Y-%m-%d %H:%M").to_string(),
            score: s.outcome.score(),
            summary: s.outcome.summary(),
        })
        .collect();

    let mut rows = Rows::new(["ID", "GAME", "PLAYER", "PLAYED", "SCORE", "SUMMARY"]);
    for r in &records {
        rows.push(vec![
            r.id.clone(),
            r.game.to_string(),
            r.player.clone(),
            r.played_at.clone(),
            r.score.to_string(),
            r.summary.clone(),
        ]);
    }
    print_list(&rows, &records, global.format, "session", global.quiet)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let wanted = args.id.to_uppercase();
    let matches: Vec<PlaySession> = PlaySession::list(&workspace)
        .into_iter()
        .filter(|s| s.id.to_string().starts_with(&wanted))
        .collect();

    let session = match matches.len() {
        0 => return Err(miette::miette!("no session matches '{}'", args.id)),
        1 => &matches[0],
        n => {
            return Err(miette::miette!(
                "'{}' matches {} sessions; use a longer prefix",
                args.id,
                n
            ))
        }
    };

    if global.format.is_structured() {
        return print_structured(session, global.format);
    }

    println!(
        "{} {} · {} · {}",
        style(&session.id).cyan(),
        session.outcome.game_name(),
        session.player,
        session.played_at.format("%Y-%m-%d %H:%M")
    );
    println!();
    let renderer = ReportRenderer::new().into_diagnostic()?;
    let text = match &session.outcome {
        PlayOutcome::Counting(results) => renderer
            .counting(&results.set_id, results, true)
            .into_diagnostic()?,
        PlayOutcome::Enigma(report) => renderer.enigma(report).into_diagnostic()?,
    };
    print!("{}", text);
    Ok(())
}
