//! `aula game` command - Gamified evaluation wizard

use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::args::CliDifficulty;
use crate::cli::flow::{payload_json, run_interactive, walk_steps};
use crate::cli::helpers::{
    build_submitter, load_config, load_content, runtime, truncate_str, try_workspace,
};
use crate::cli::prompt::Prompter;
use crate::cli::table::{print_list, print_structured, Rows};
use crate::cli::GlobalOpts;
use crate::content::{BloomLevel, ContentPack};
use crate::evaluation::{
    submit_and_start, GameSession, GamifiedEvaluationForm, GamifiedField, GamifiedOutcome,
};
use crate::wizard::{shared, SubmissionHandler, WizardAction, WizardForm, WizardState};

#[derive(Subcommand, Debug)]
pub enum GameCommands {
    /// Create a gamified evaluation and open a game for it
    New(GameNewArgs),

    /// List the game templates and skins available
    Templates,
}

#[derive(clap::Args, Debug)]
pub struct GameNewArgs {
    /// Class the evaluation belongs to (default: default_class from config)
    #[arg(long)]
    pub class: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub subject: Option<String>,

    /// Grade name, e.g. "3º Básico"
    #[arg(long)]
    pub grade: Option<String>,

    #[arg(long, value_enum)]
    pub difficulty: Option<CliDifficulty>,

    /// Number of questions (1-50)
    #[arg(long)]
    pub questions: Option<u32>,

    /// Time limit in minutes (5-180)
    #[arg(long)]
    pub time_limit: Option<u32>,

    /// Learning objective codes (comma-separated)
    #[arg(long = "oa", value_delimiter = ',')]
    pub objectives: Vec<String>,

    /// Bloom levels (comma-separated), e.g. Recordar,Aplicar
    #[arg(long, value_delimiter = ',')]
    pub bloom: Vec<BloomLevel>,

    /// Game template id
    #[arg(long)]
    pub engine: Option<String>,

    /// Skin id
    #[arg(long)]
    pub skin: Option<String>,

    /// Hand-picked question ids (comma-separated)
    #[arg(long = "question-id", value_delimiter = ',')]
    pub question_ids: Vec<String>,

    /// Prompt for each step
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Print the request body instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    /// Queue the evaluation in the workspace outbox
    #[arg(long)]
    pub offline: bool,
}

pub fn run(cmd: GameCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        GameCommands::New(args) => run_new(args, global),
        GameCommands::Templates => run_templates(global),
    }
}

#[derive(Serialize)]
struct Created<'a> {
    evaluation_id: Option<&'a str>,
    game: Option<&'a GameSession>,
}

fn run_new(args: GameNewArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = try_workspace(global);
    let config = load_config(workspace.as_ref());
    let pack = load_content(workspace.as_ref())?;

    let mut form = GamifiedEvaluationForm::with_content(&pack);
    form.class_id = args
        .class
        .clone()
        .or_else(|| config.default_class.clone())
        .unwrap_or_default();
    let state = apply_flags(WizardState::with_initial(form), &args);

    let state = if args.interactive {
        match run_interactive(state, |prompter, state| ask_step(prompter, state, &pack))? {
            Some(state) => state,
            None => {
                println!("{} Cancelled", style("!").yellow());
                return Ok(());
            }
        }
    } else {
        walk_steps(state)?
    };

    if args.dry_run {
        println!("{}", payload_json(&state)?);
        return Ok(());
    }

    let submitter = build_submitter(workspace.as_ref(), &config, args.offline)?;
    let structured = global.format.is_structured();
    let talk = !global.quiet && !structured;

    let wizard = shared(state);
    let handler = SubmissionHandler::new(submitter);
    let rt = runtime()?;
    let outcome = rt
        .block_on(submit_and_start(&handler, &wizard, |outcome| {
            if talk {
                report_outcome(outcome);
            }
        }))
        .map_err(|e| {
            miette::miette!(
                "{}: {}",
                <GamifiedEvaluationForm as WizardForm>::SUBMIT_ERROR_MESSAGE,
                e
            )
        })?;

    if structured {
        return print_structured(
            &Created {
                evaluation_id: outcome.submitted.evaluation_id.as_deref(),
                game: outcome.game.as_ref(),
            },
            global.format,
        );
    }

    Ok(())
}

/// Lobby details when the game opened, the created evaluation otherwise
fn report_outcome(outcome: &GamifiedOutcome) {
    match (&outcome.game, outcome.submitted.evaluation_id.as_deref()) {
        (Some(game), _) => {
            println!(
                "{} Juego abierto. Código de ingreso: {}",
                style("✓").green(),
                style(&game.join_code).bold()
            );
            println!("  {}", style(&game.url).cyan());
        }
        (None, Some(id)) => println!(
            "{} Evaluación gamificada creada: {}, pero el juego no pudo iniciarse",
            style("!").yellow(),
            style(id).cyan()
        ),
        (None, None) => println!(
            "{} Evaluación gamificada creada, pero el juego no pudo iniciarse",
            style("!").yellow()
        ),
    }
}

fn apply_flags(
    state: WizardState<GamifiedEvaluationForm>,
    args: &GameNewArgs,
) -> WizardState<GamifiedEvaluationForm> {
    let mut updates = Vec::new();
    if let Some(v) = &args.title {
        updates.push(GamifiedField::Title(v.clone()));
    }
    if let Some(v) = &args.description {
        updates.push(GamifiedField::Description(v.clone()));
    }
    if let Some(v) = &args.subject {
        updates.push(GamifiedField::Subject(v.clone()));
    }
    if let Some(v) = &args.grade {
        updates.push(GamifiedField::GradeLevel(v.clone()));
    }
    if let Some(v) = args.difficulty {
        updates.push(GamifiedField::Difficulty(v.into()));
    }
    if let Some(v) = args.questions {
        updates.push(GamifiedField::QuestionCount(v));
    }
    if let Some(v) = args.time_limit {
        updates.push(GamifiedField::TimeLimit(v));
    }
    if !args.objectives.is_empty() {
        updates.push(GamifiedField::Objectives(
            args.objectives.iter().map(|o| o.trim().to_string()).collect(),
        ));
    }
    if !args.bloom.is_empty() {
        updates.push(GamifiedField::BloomLevels(args.bloom.clone()));
    }
    if let Some(v) = &args.engine {
        updates.push(GamifiedField::Engine(v.clone()));
    }
    if let Some(v) = &args.skin {
        updates.push(GamifiedField::Skin(v.clone()));
    }
    if !args.question_ids.is_empty() {
        updates.push(GamifiedField::Questions(args.question_ids.clone()));
    }

    updates.into_iter().fold(state, |state, update| {
        state.reduce(WizardAction::SetField(update))
    })
}

fn ask_step(
    prompter: &Prompter,
    state: WizardState<GamifiedEvaluationForm>,
    pack: &ContentPack,
) -> Result<WizardState<GamifiedEvaluationForm>> {
    let form = state.form().clone();
    let mut updates = Vec::new();

    match state.current_step() {
        1 => {
            updates.push(GamifiedField::Title(prompter.text("Título", &form.title)?));
            updates.push(GamifiedField::Description(
                prompter.text("Descripción", &form.description)?,
            ));
            updates.push(GamifiedField::ClassId(prompter.text("Clase", &form.class_id)?));
            let labels: Vec<String> = pack
                .objectives
                .iter()
                .map(|o| format!("{} · {}", o.oa_code, truncate_str(&o.description, 50)))
                .collect();
            let checked: Vec<bool> = pack
                .objectives
                .iter()
                .map(|o| form.oa_codes.contains(&o.oa_code))
                .collect();
            let picked = prompter.multi_select("Objetivos de aprendizaje", &labels, &checked)?;
            updates.push(GamifiedField::Objectives(
                picked
                    .into_iter()
                    .map(|i| pack.objectives[i].oa_code.clone())
                    .collect(),
            ));
        }
        2 => {
            if !pack.templates.is_empty() {
                let labels: Vec<String> = pack
                    .templates
                    .iter()
                    .map(|t| format!("{} · {}", t.name, t.subject))
                    .collect();
                let current = pack
                    .templates
                    .iter()
                    .position(|t| t.id == form.engine_id)
                    .unwrap_or(0);
                let picked = prompter.select("Plantilla de juego", &labels, current)?;
                updates.push(GamifiedField::Engine(pack.templates[picked].id.clone()));
            }
            if !pack.skins.is_empty() {
                let labels: Vec<String> = pack.skins.iter().map(|s| s.name.clone()).collect();
                let current = pack
                    .skins
                    .iter()
                    .position(|s| s.id == form.skin_theme)
                    .unwrap_or(0);
                let picked = prompter.select("Skin", &labels, current)?;
                updates.push(GamifiedField::Skin(pack.skins[picked].id.clone()));
            }
        }
        3 => {
            if !pack.catalog.subjects.is_empty() {
                let current = pack
                    .catalog
                    .subjects
                    .iter()
                    .position(|s| *s == form.subject)
                    .unwrap_or(0);
                let picked = prompter.select("Asignatura", &pack.catalog.subjects, current)?;
                updates.push(GamifiedField::Subject(pack.catalog.subjects[picked].clone()));
            }
            if !pack.catalog.grades.is_empty() {
                let current = pack
                    .catalog
                    .grades
                    .iter()
                    .position(|g| *g == form.grade_level)
                    .unwrap_or(0);
                let picked = prompter.select("Curso", &pack.catalog.grades, current)?;
                updates.push(GamifiedField::GradeLevel(pack.catalog.grades[picked].clone()));
            }
            if !pack.catalog.difficulties.is_empty() {
                let labels: Vec<String> = pack
                    .catalog
                    .difficulties
                    .iter()
                    .map(|d| format!("{} · {}", d.label, d.description))
                    .collect();
                let current = pack
                    .catalog
                    .difficulties
                    .iter()
                    .position(|d| d.value == form.difficulty)
                    .unwrap_or(0);
                let picked = prompter.select("Dificultad", &labels, current)?;
                updates.push(GamifiedField::Difficulty(
                    pack.catalog.difficulties[picked].value,
                ));
            }
            updates.push(GamifiedField::QuestionCount(
                prompter.number("Cantidad de preguntas", form.question_count)?,
            ));
            updates.push(GamifiedField::TimeLimit(
                prompter.number("Tiempo límite (minutos)", form.time_limit)?,
            ));
            let levels = BloomLevel::all();
            let checked: Vec<bool> = levels.iter().map(|l| form.bloom_levels.contains(l)).collect();
            let picked = prompter.multi_select("Niveles de Bloom", levels, &checked)?;
            updates.push(GamifiedField::BloomLevels(
                picked.into_iter().map(|i| levels[i]).collect(),
            ));
        }
        4 => {
            let questions: Vec<_> = pack
                .counting_sets
                .iter()
                .flat_map(|set| set.questions.iter())
                .collect();
            if !questions.is_empty() {
                let labels: Vec<String> = questions
                    .iter()
                    .map(|q| format!("{} · {}", q.bloom_level, truncate_str(&q.stem, 60)))
                    .collect();
                let checked: Vec<bool> = questions
                    .iter()
                    .map(|q| form.selected_question_ids.contains(&q.id))
                    .collect();
                let picked = prompter.multi_select(
                    "Preguntas (opcional; sin selección se eligen automáticamente)",
                    &labels,
                    &checked,
                )?;
                updates.push(GamifiedField::Questions(
                    picked.into_iter().map(|i| questions[i].id.clone()).collect(),
                ));
            }
        }
        _ => {}
    }

    Ok(updates.into_iter().fold(state, |state, update| {
        state.reduce(WizardAction::SetField(update))
    }))
}

fn run_templates(global: &GlobalOpts) -> Result<()> {
    let workspace = try_workspace(global);
    let pack = load_content(workspace.as_ref())?;

    let mut rows = Rows::new(["KIND", "ID", "NAME", "DESCRIPTION"]);
    for t in &pack.templates {
        rows.push(vec![
            "template".into(),
            t.id.clone(),
            t.name.clone(),
            truncate_str(&t.description, 50),
        ]);
    }
    for s in &pack.skins {
        rows.push(vec![
            "skin".into(),
            s.id.clone(),
            s.name.clone(),
            truncate_str(&s.description, 50),
        ]);
    }

    #[derive(Serialize)]
    struct Listing<'a> {
        templates: &'a [crate::content::GameTemplate],
        skins: &'a [crate::content::Skin],
    }
    print_list(
        &rows,
        &Listing {
            templates: &pack.templates,
            skins: &pack.skins,
        },
        global.format,
        "entry",
        global.quiet,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Difficulty;

    #[test]
    fn test_flags_fill_form() {
        let args = GameNewArgs {
            class: None,
            title: Some("Quiz 1".into()),
            description: None,
            subject: None,
            grade: Some("3º Básico".into()),
            difficulty: Some(CliDifficulty::Hard),
            questions: Some(12),
            time_limit: None,
            objectives: vec![" MAT05-OA04".into()],
            bloom: vec![BloomLevel::Aplicar],
            engine: None,
            skin: Some("espacio".into()),
            question_ids: Vec::new(),
            interactive: false,
            dry_run: true,
            offline: false,
        };
        let state = apply_flags(WizardState::new(), &args);
        let form = state.form();

        assert_eq!(form.title, "Quiz 1");
        assert_eq!(form.difficulty, Difficulty::Hard);
        assert_eq!(form.question_count, 12);
        assert_eq!(form.oa_codes, vec!["MAT05-OA04"]);
        assert_eq!(form.bloom_levels, vec![BloomLevel::Aplicar]);
        assert_eq!(form.skin_theme, "espacio");
        assert_eq!(form.payload().engine_config.grade_code, "3B");
    }
}
