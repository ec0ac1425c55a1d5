//! `aula play` command - Classroom mini-games in the terminal

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::cli::helpers::{load_config, load_content, open_workspace, try_workspace};
use crate::cli::prompt::Prompter;
use crate::cli::table::print_structured;
use crate::cli::GlobalOpts;
use crate::core::{Config, Workspace};
use crate::games::{
    Advance, BellBackend, ConsoleNarrator, CountingGame, EnigmaGame, Narrator, PlayOutcome,
    PlaySession, ReportRenderer, SilentNarrator, SolveOutcome, SoundBoard, ToolOutcome,
    VoiceSettings,
};

#[derive(Subcommand, Debug)]
pub enum PlayCommands {
    /// Farm counting game
    Counting(CountingArgs),

    /// Enigma investigation game
    Enigma(EnigmaArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct SessionOpts {
    /// Record the session in the workspace
    #[arg(long)]
    pub save: bool,

    /// Player name stored with the session (default: author from config)
    #[arg(long)]
    pub player: Option<String>,

    /// Turn sound effects off
    #[arg(long)]
    pub mute: bool,

    /// Narrate game text
    #[arg(long)]
    pub speak: bool,
}

#[derive(clap::Args, Debug)]
pub struct CountingArgs {
    /// Question set id (default: first set)
    #[arg(long)]
    pub set: Option<String>,

    /// Answers to play without prompting (comma-separated)
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub answers: Vec<i64>,

    /// Two players taking turns
    #[arg(long)]
    pub coop: bool,

    /// List every answer in the final report
    #[arg(long)]
    pub details: bool,

    #[command(flatten)]
    pub session: SessionOpts,
}

#[derive(clap::Args, Debug)]
pub struct EnigmaArgs {
    /// File of moves to play without prompting, one per line
    #[arg(long)]
    pub script: Option<PathBuf>,

    #[command(flatten)]
    pub session: SessionOpts,
}

pub fn run(cmd: PlayCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        PlayCommands::Counting(args) => run_counting(args, global),
        PlayCommands::Enigma(args) => run_enigma(args, global),
    }
}

fn sound_board(config: &Config, opts: &SessionOpts, scripted: bool) -> SoundBoard {
    let mut board = SoundBoard::new(BellBackend);
    board.set_enabled(config.sound_enabled() && !opts.mute && !scripted);
    board
}

fn narrator(config: &Config, opts: &SessionOpts, voice: VoiceSettings) -> Arc<dyn Narrator> {
    if opts.speak || config.speech_enabled() {
        Arc::new(ConsoleNarrator::new(voice))
    } else {
        Arc::new(SilentNarrator)
    }
}

fn save_session(
    global: &GlobalOpts,
    config: &Config,
    opts: &SessionOpts,
    outcome: PlayOutcome,
) -> Result<()> {
    let workspace: Workspace = open_workspace(global)?;
    let player = opts.player.clone().unwrap_or_else(|| config.author());
    let session = PlaySession::new(player, outcome);
    let path = session.save(&workspace)?;
    if !global.quiet && !global.format.is_structured() {
        println!(
            "{} Session saved as {} ({})",
            style("✓").green(),
            style(&session.id).cyan(),
            style(path.display()).dim()
        );
    }
    Ok(())
}

fn run_counting(args: CountingArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = try_workspace(global);
    let config = load_config(workspace.as_ref());
    let pack = load_content(workspace.as_ref())?;

    let set = match &args.set {
        Some(id) => pack
            .counting_set(id)
            .ok_or_else(|| miette::miette!("unknown question set '{}'", id))?,
        None => pack
            .counting_sets
            .first()
            .ok_or_else(|| miette::miette!("no question sets available"))?,
    };

    let scripted = !args.answers.is_empty();
    let mut game = CountingGame::new(set)
        .into_diagnostic()?
        .cooperative(args.coop)
        .with_sound(sound_board(&config, &args.session, scripted))
        .with_narrator(narrator(&config, &args.session, VoiceSettings::default()));

    let results = if scripted {
        play_counting_scripted(&mut game, &args.answers)?
    } else {
        play_counting_interactive(&mut game, &set.name)?
    };

    if global.format.is_structured() {
        print_structured(&results, global.format)?;
    } else {
        let text = ReportRenderer::new()
            .into_diagnostic()?
            .counting(&set.name, &results, args.details)
            .into_diagnostic()?;
        print!("{}", text);
    }

    if args.session.save {
        save_session(global, &config, &args.session, PlayOutcome::Counting(results))?;
    }
    Ok(())
}

fn play_counting_scripted(
    game: &mut CountingGame,
    answers: &[i64],
) -> Result<crate::games::CountingResults> {
    for &choice in answers {
        game.answer(choice).into_diagnostic()?;
        if let Advance::Finished(results) = game.advance().into_diagnostic()? {
            return Ok(results);
        }
    }
    Err(miette::miette!(
        "{} answer(s) given but the set has {} questions",
        answers.len(),
        game.len()
    ))
}

fn play_counting_interactive(
    game: &mut CountingGame,
    set_name: &str,
) -> Result<crate::games::CountingResults> {
    let prompter = Prompter::new();
    println!("{} {}", style("🚜").bold(), style(set_name).bold());

    loop {
        let Some(question) = game.current_question().cloned() else {
            return Ok(game.results());
        };

        let ladder: Vec<String> = game
            .bloom_ladder()
            .into_iter()
            .map(|rung| {
                if rung.active {
                    style(rung.level.to_string()).bold().green().to_string()
                } else {
                    style(rung.level.to_string()).dim().to_string()
                }
            })
            .collect();
        println!();
        println!(
            "Pregunta {}/{} · {} · Puntaje {}",
            game.index() + 1,
            game.len(),
            ladder.join(" › "),
            game.score()
        );
        if let Some(player) = game.current_player() {
            println!("Turno del jugador {}", style(player).cyan());
        }
        game.read_question();

        let picked = prompter.select(&question.stem, &question.options[..], 0)?;
        let feedback = game.answer(question.options[picked]).into_diagnostic()?;
        if feedback.correct {
            println!("{} {}", style("✓").green(), feedback.explanation);
            if let Some(sticker) = &feedback.sticker {
                println!("  Sticker ganado: {}", sticker);
            }
        } else {
            println!("{} {}", style("✗").red(), feedback.explanation);
        }

        if let Advance::Finished(results) = game.advance().into_diagnostic()? {
            println!();
            return Ok(results);
        }
    }
}

/// A move in the enigma game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnigmaMove {
    /// Clue by 1-based position in the current enigma, or by text
    Clue(String),
    Hypothesis(String),
    Tool(String),
    Collaborate,
    FinishCollaboration,
    Solve(String),
    Report,
}

impl FromStr for EnigmaMove {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim().to_string();
        match verb.to_lowercase().as_str() {
            "clue" | "pista" => Ok(EnigmaMove::Clue(rest)),
            "hypothesis" | "hipotesis" | "hipótesis" => Ok(EnigmaMove::Hypothesis(rest)),
            "tool" | "herramienta" => Ok(EnigmaMove::Tool(rest)),
            "collaborate" | "colaborar" => Ok(EnigmaMove::Collaborate),
            "done" | "terminar" => Ok(EnigmaMove::FinishCollaboration),
            "solve" | "resolver" => Ok(EnigmaMove::Solve(rest)),
            "report" | "reporte" => Ok(EnigmaMove::Report),
            other => Err(format!("unknown move '{}'", other)),
        }
    }
}

/// Script lines that are moves; blank lines and `#` comments are skipped
pub fn parse_script(text: &str) -> Result<Vec<EnigmaMove>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            line.parse()
                .map_err(|e| miette::miette!("line {}: {}", i + 1, e))
        })
        .collect()
}

fn run_enigma(args: EnigmaArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = try_workspace(global);
    let config = load_config(workspace.as_ref());
    let pack = load_content(workspace.as_ref())?;

    let scripted = args.script.is_some();
    let mut game = EnigmaGame::new(pack.enigmas.clone(), pack.tools.clone())
        .into_diagnostic()?
        .with_sound(sound_board(&config, &args.session, scripted))
        .with_narrator(narrator(&config, &args.session, VoiceSettings::calm()));

    let talk = !global.quiet && !global.format.is_structured();
    match &args.script {
        Some(path) => {
            let text = std::fs::read_to_string(path).into_diagnostic()?;
            for step in parse_script(&text)? {
                apply_move(&mut game, step, talk)?;
                if game.is_completed() {
                    break;
                }
            }
        }
        None => play_enigma_interactive(&mut game)?,
    }

    let report = game.report();
    if global.format.is_structured() {
        print_structured(&report, global.format)?;
    } else {
        let text = ReportRenderer::new()
            .into_diagnostic()?
            .enigma(&report)
            .into_diagnostic()?;
        println!();
        print!("{}", text);
    }

    if args.session.save {
        save_session(global, &config, &args.session, PlayOutcome::Enigma(report))?;
    }
    Ok(())
}

fn resolve_clue(game: &EnigmaGame, key: &str) -> Result<String> {
    let enigma = game
        .current_enigma()
        .ok_or_else(|| miette::miette!("every enigma is already solved"))?;
    if let Ok(n) = key.parse::<usize>() {
        return enigma
            .clues
            .get(n.wrapping_sub(1))
            .cloned()
            .ok_or_else(|| miette::miette!("clue {} does not exist", n));
    }
    Ok(key.to_string())
}

/// Play one move; rule violations are reported and the game goes on
fn apply_move(game: &mut EnigmaGame, step: EnigmaMove, talk: bool) -> Result<()> {
    let say = |text: String| {
        if talk {
            println!("{}", text);
        }
    };

    let result = match step {
        EnigmaMove::Clue(key) => {
            let clue = match resolve_clue(game, &key) {
                Ok(clue) => clue,
                Err(e) => {
                    say(format!("{} {}", style("!").yellow(), e));
                    return Ok(());
                }
            };
            game.discover_clue(&clue).map(|new| {
                if new {
                    say(format!("{} Pista: {}", style("🔍").bold(), clue));
                }
            })
        }
        EnigmaMove::Hypothesis(text) => game
            .formulate_hypothesis(&text)
            .map(|_| say(format!("{} Hipótesis registrada", style("💡").bold()))),
        EnigmaMove::Tool(id) => game.use_tool(&id).map(|outcome| match outcome {
            ToolOutcome::Clue(Some(clue)) => {
                say(format!("{} Pista revelada: {}", style("🔍").bold(), clue))
            }
            ToolOutcome::Clue(None) => say("Ya conoces todas las pistas.".to_string()),
            ToolOutcome::CollaborationStarted => say("Colaboración iniciada.".to_string()),
            ToolOutcome::Applied => say(format!("Herramienta {} usada.", id)),
        }),
        EnigmaMove::Collaborate => {
            game.start_collaboration();
            say("Colaboración iniciada.".to_string());
            Ok(())
        }
        EnigmaMove::FinishCollaboration => game
            .complete_collaboration()
            .map(|_| say("¡Excelente trabajo en equipo!".to_string())),
        EnigmaMove::Solve(answer) => game.solve(&answer).map(|outcome| match outcome {
            SolveOutcome::Solved { next, .. } => {
                say(format!("{} ¡Resuelto! Siguiente enigma: {}", style("✓").green(), next))
            }
            SolveOutcome::Completed { .. } => say(format!(
                "{} ¡Has completado todos los enigmas!",
                style("🏆").bold()
            )),
            SolveOutcome::Incorrect { message } => say(format!("{} {}", style("✗").red(), message)),
        }),
        EnigmaMove::Report => {
            let report = game.report();
            say(format!(
                "Puntos: {} · Resueltos: {}/{}",
                report.metrics.investigation_points,
                report.metrics.enigmas_solved,
                report.metrics.total_enigmas
            ));
            Ok(())
        }
    };

    if let Err(e) = result {
        if talk {
            println!("{} {}", style("!").yellow(), e);
        }
    }
    Ok(())
}

fn play_enigma_interactive(game: &mut EnigmaGame) -> Result<()> {
    let prompter = Prompter::new();
    const ACTIONS: [&str; 6] = [
        "Descubrir una pista",
        "Formular una hipótesis",
        "Usar una herramienta",
        "Resolver",
        "Ver progreso",
        "Salir",
    ];

    while let Some(enigma) = game.current_enigma().cloned() {
        println!();
        println!(
            "{} {} · {} puntos",
            style("🕵").bold(),
            style(&enigma.name).bold(),
            game.points()
        );
        println!("  {}", enigma.description);
        for clue in game.discovered_clues() {
            println!("  {} {}", style("•").cyan(), clue);
        }
        game.read_enigma();

        let step = match prompter.select("¿Qué quieres hacer?", &ACTIONS[..], 0)? {
            0 => {
                let picked = prompter.select("Pista", &enigma.clues[..], 0)?;
                EnigmaMove::Clue((picked + 1).to_string())
            }
            1 => EnigmaMove::Hypothesis(prompter.text("Tu hipótesis", "")?),
            2 => {
                let labels: Vec<String> = game
                    .tools()
                    .iter()
                    .map(|t| {
                        let lock = if t.unlocked { "" } else { " 🔒" };
                        format!("{} ({} pts){} · {}", t.name, t.cost, lock, t.effect)
                    })
                    .collect();
                let picked = prompter.select("Herramienta", &labels[..], 0)?;
                EnigmaMove::Tool(game.tools()[picked].id.clone())
            }
            3 => EnigmaMove::Solve(prompter.text("Solución (números separados por coma)", "")?),
            4 => EnigmaMove::Report,
            _ => return Ok(()),
        };
        apply_move(game, step, true)?;
        if game.is_collaborating() && prompter.confirm("¿Terminar la colaboración?", true)? {
            apply_move(game, EnigmaMove::FinishCollaboration, true)?;
        }
    }
    Ok(())
}
