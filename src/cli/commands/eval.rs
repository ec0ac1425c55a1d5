//! `aula eval` command - Standard evaluation wizard and outbox

use chrono::{NaiveDate, NaiveDateTime};
use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::args::{CliEvaluationMode, CliEvaluationType, CliRubricMode};
use crate::cli::flow::{payload_json, run_interactive, submit, walk_steps};
use crate::cli::helpers::{
    build_submitter, load_config, load_content, open_workspace, runtime, truncate_str,
    try_workspace,
};
use crate::cli::prompt::Prompter;
use crate::cli::table::{print_list, print_structured, Rows};
use crate::cli::GlobalOpts;
use crate::content::ContentPack;
use crate::evaluation::rubric::{criterion, total_weight};
use crate::evaluation::{
    generate_ai_rubric, EvaluationMode, EvaluationType, RubricMode, StandardEvaluationForm,
    StandardField,
};
use crate::wizard::{
    HttpSubmitter, OutboxSubmitter, SubmitRequest, Submitter, WizardAction, WizardState,
};

#[derive(Subcommand, Debug)]
pub enum EvalCommands {
    /// Create a standard evaluation (quiz, exam or task)
    New(EvalNewArgs),

    /// List evaluations waiting in the offline outbox
    Outbox,

    /// Send outbox evaluations to the API
    Flush(FlushArgs),
}

#[derive(clap::Args, Debug)]
pub struct EvalNewArgs {
    /// Class the evaluation belongs to (default: default_class from config)
    #[arg(long)]
    pub class: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Evaluation type
    #[arg(long = "type", value_enum, default_value_t)]
    pub kind: CliEvaluationType,

    /// How questions are authored
    #[arg(long, value_enum, default_value_t)]
    pub mode: CliEvaluationMode,

    /// Share of the final grade in percent (1-100)
    #[arg(long)]
    pub weight: Option<u32>,

    /// Attempts allowed; -1 for unlimited
    #[arg(long, allow_negative_numbers = true)]
    pub attempts: Option<i32>,

    /// Time limit in minutes
    #[arg(long)]
    pub time_limit: Option<u32>,

    /// Lockdown mode
    #[arg(long)]
    pub serious: bool,

    /// Learning objectives by id or code (comma-separated)
    #[arg(long = "oa", value_delimiter = ',')]
    pub objectives: Vec<String>,

    #[arg(long)]
    pub instructions: Option<String>,

    #[arg(long)]
    pub grading_scale: Option<String>,

    /// How the evaluation is graded
    #[arg(long, value_enum, default_value_t)]
    pub rubric: CliRubricMode,

    /// Rubric criterion as NAME:WEIGHT (repeatable, with --rubric manual)
    #[arg(long)]
    pub criterion: Vec<String>,

    /// Task deadline, "YYYY-MM-DD HH:MM" or "YYYY-MM-DD"
    #[arg(long)]
    pub deadline: Option<String>,

    /// Let students upload files (tasks)
    #[arg(long)]
    pub allow_upload: bool,

    /// Accepted file extensions (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub file_types: Vec<String>,

    /// Maximum upload size in MB
    #[arg(long)]
    pub max_file_size: Option<u32>,

    /// Percent deducted for late delivery
    #[arg(long)]
    pub late_penalty: Option<u32>,

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

#[derive(clap::Args, Debug)]
pub struct FlushArgs {
    /// Keep entries in the outbox after sending
    #[arg(long)]
    pub keep: bool,
}

pub fn run(cmd: EvalCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        EvalCommands::New(args) => run_new(args, global),
        EvalCommands::Outbox => run_outbox(global),
        EvalCommands::Flush(args) => run_flush(args, global),
    }
}

#[derive(Serialize)]
struct Created<'a> {
    evaluation_id: Option<&'a str>,
}

fn run_new(args: EvalNewArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = try_workspace(global);
    let config = load_config(workspace.as_ref());
    let pack = load_content(workspace.as_ref())?;

    let class = args
        .class
        .clone()
        .or_else(|| config.default_class.clone())
        .unwrap_or_default();
    let state = WizardState::with_initial(StandardEvaluationForm::for_class(class));
    let state = apply_flags(state, &args, &pack)?;

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
    let submitted = submit(state, submitter, global.quiet || structured)?;
    if structured {
        print_structured(
            &Created {
                evaluation_id: submitted.evaluation_id.as_deref(),
            },
            global.format,
        )?;
    }
    Ok(())
}

/// Turn command-line flags into form updates
fn apply_flags(
    state: WizardState<StandardEvaluationForm>,
    args: &EvalNewArgs,
    pack: &ContentPack,
) -> Result<WizardState<StandardEvaluationForm>> {
    let mut updates = vec![
        StandardField::Kind(args.kind.into()),
        StandardField::Mode(args.mode.into()),
        StandardField::Serious(args.serious),
        StandardField::AllowFileUpload(args.allow_upload),
    ];
    if let Some(v) = &args.title {
        updates.push(StandardField::Title(v.clone()));
    }
    if let Some(v) = &args.description {
        updates.push(StandardField::Description(v.clone()));
    }
    if let Some(v) = args.weight {
        updates.push(StandardField::Weight(v));
    }
    if let Some(v) = args.attempts {
        updates.push(StandardField::AttemptLimit(v));
    }
    if let Some(v) = args.time_limit {
        updates.push(StandardField::TimeLimit(v));
    }
    if !args.objectives.is_empty() {
        let ids = args
            .objectives
            .iter()
            .map(|o| resolve_objective(pack, o))
            .collect::<Result<Vec<_>>>()?;
        updates.push(StandardField::Objectives(ids));
    }
    if let Some(v) = &args.instructions {
        updates.push(StandardField::Instructions(v.clone()));
    }
    if let Some(v) = &args.grading_scale {
        updates.push(StandardField::GradingScale(v.clone()));
    }
    if let Some(v) = &args.deadline {
        updates.push(StandardField::Deadline(Some(parse_deadline(v)?)));
    }
    if !args.file_types.is_empty() {
        updates.push(StandardField::FileTypes(args.file_types.clone()));
    }
    if let Some(v) = args.max_file_size {
        updates.push(StandardField::MaxFileSize(v));
    }
    if let Some(v) = args.late_penalty {
        updates.push(StandardField::LatePenalty(v));
    }
    match args.rubric {
        CliRubricMode::Automatic => {}
        CliRubricMode::Manual => {
            updates.push(StandardField::RubricMode(RubricMode::Manual));
            let criteria = args
                .criterion
                .iter()
                .enumerate()
                .map(|(i, spec)| parse_criterion(i + 1, spec))
                .collect::<Result<Vec<_>>>()?;
            updates.push(StandardField::Criteria(criteria));
        }
        CliRubricMode::Ai => {}
    }

    let mut state = updates.into_iter().fold(state, |state, update| {
        state.reduce(WizardAction::SetField(update))
    });

    if args.rubric == CliRubricMode::Ai {
        state = generate_ai_rubric(state, &pack.rubric);
        if let Some(message) = state.errors().get("oas") {
            return Err(miette::miette!("{}", message));
        }
    }
    Ok(state)
}

/// Accept an objective id ("1") or code ("MAT05-OA04")
fn resolve_objective(pack: &ContentPack, key: &str) -> Result<String> {
    let key = key.trim();
    pack.objective(key)
        .or_else(|| pack.objective_by_code(key))
        .map(|o| o.oa_id.clone())
        .ok_or_else(|| miette::miette!("unknown learning objective '{}'", key))
}

fn parse_criterion(id: usize, spec: &str) -> Result<crate::content::RubricCriterion> {
    let (name, weight) = spec
        .rsplit_once(':')
        .ok_or_else(|| miette::miette!("criterion '{}' must look like NAME:WEIGHT", spec))?;
    let weight: u32 = weight
        .trim()
        .parse()
        .map_err(|_| miette::miette!("criterion '{}' has an invalid weight", spec))?;
    Ok(criterion(id, name.trim(), "", weight))
}

fn parse_deadline(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(23, 59, 0))
        .ok_or_else(|| miette::miette!("cannot read deadline '{}'; use YYYY-MM-DD HH:MM", text))
}

fn ask_step(
    prompter: &Prompter,
    state: WizardState<StandardEvaluationForm>,
    pack: &ContentPack,
) -> Result<WizardState<StandardEvaluationForm>> {
    let form = state.form().clone();
    let mut updates = Vec::new();

    match state.current_step() {
        1 => {
            updates.push(StandardField::ClassId(prompter.text("Clase", &form.class_id)?));
            updates.push(StandardField::Title(prompter.text("Título", &form.title)?));
            updates.push(StandardField::Description(
                prompter.text("Descripción", &form.description)?,
            ));
            let kinds = [EvaluationType::Quiz, EvaluationType::Exam, EvaluationType::Task];
            let current = kinds.iter().position(|k| *k == form.kind).unwrap_or(0);
            let picked = prompter.select("Tipo", &["Quiz", "Prueba", "Tarea"], current)?;
            updates.push(StandardField::Kind(kinds[picked]));
            let modes = [EvaluationMode::Manual, EvaluationMode::Ai];
            let current = modes.iter().position(|m| *m == form.mode).unwrap_or(0);
            let picked = prompter.select("Modo", &["Manual", "Generada por IA"], current)?;
            updates.push(StandardField::Mode(modes[picked]));
            updates.push(StandardField::Weight(
                prompter.number("Ponderación (%)", form.weight)?,
            ));
            updates.push(StandardField::AttemptLimit(
                prompter.number("Intentos (-1 = ilimitados)", form.attempt_limit)?,
            ));
            updates.push(StandardField::Serious(
                prompter.confirm("¿Modo bloqueo?", form.serious)?,
            ));
        }
        2 => {
            let labels: Vec<String> = pack
                .objectives
                .iter()
                .map(|o| format!("{} · {}", o.oa_code, truncate_str(&o.description, 50)))
                .collect();
            let checked: Vec<bool> = pack
                .objectives
                .iter()
                .map(|o| form.selected_oas.contains(&o.oa_id))
                .collect();
            let picked = prompter.multi_select("Objetivos de aprendizaje", &labels, &checked)?;
            updates.push(StandardField::Objectives(
                picked
                    .into_iter()
                    .map(|i| pack.objectives[i].oa_id.clone())
                    .collect(),
            ));
        }
        3 => {
            updates.push(StandardField::TimeLimit(
                prompter.number("Tiempo límite (minutos)", form.time_limit)?,
            ));
            updates.push(StandardField::Instructions(
                prompter.text("Instrucciones", &form.instructions)?,
            ));
            updates.push(StandardField::GradingScale(
                prompter.text("Escala de notas", &form.grading_scale)?,
            ));
            if form.kind == EvaluationType::Task {
                let current = form
                    .task_settings
                    .deadline
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                let text = prompter.text("Fecha límite (YYYY-MM-DD HH:MM)", &current)?;
                let deadline = if text.trim().is_empty() {
                    None
                } else {
                    Some(parse_deadline(&text)?)
                };
                updates.push(StandardField::Deadline(deadline));
                updates.push(StandardField::AllowFileUpload(prompter.confirm(
                    "¿Permitir subir archivos?",
                    form.task_settings.allow_file_upload,
                )?));
                updates.push(StandardField::LatePenalty(prompter.number(
                    "Descuento por atraso (%)",
                    form.task_settings.late_penalty,
                )?));
            }
        }
        4 => return ask_rubric(prompter, state, pack),
        _ => {}
    }

    Ok(updates.into_iter().fold(state, |state, update| {
        state.reduce(WizardAction::SetField(update))
    }))
}

fn ask_rubric(
    prompter: &Prompter,
    state: WizardState<StandardEvaluationForm>,
    pack: &ContentPack,
) -> Result<WizardState<StandardEvaluationForm>> {
    let modes = [RubricMode::Automatic, RubricMode::Manual, RubricMode::AiGenerated];
    let current = modes
        .iter()
        .position(|m| *m == state.form().rubric_mode)
        .unwrap_or(0);
    let picked = prompter.select(
        "Rúbrica",
        &["Automática", "Manual", "Generada por IA"],
        current,
    )?;

    match modes[picked] {
        RubricMode::AiGenerated => {
            let state = generate_ai_rubric(state, &pack.rubric);
            for c in &state.form().rubric_criteria {
                println!("  {} {} ({}%)", style("•").cyan(), c.name, c.weight);
            }
            Ok(state)
        }
        RubricMode::Manual => {
            let mut state =
                state.reduce(WizardAction::SetField(StandardField::RubricMode(RubricMode::Manual)));
            loop {
                let name = prompter.text("Nombre del criterio (vacío para terminar)", "")?;
                if name.trim().is_empty() {
                    break;
                }
                let remaining = 100u32.saturating_sub(total_weight(&state.form().rubric_criteria));
                let weight = prompter.number("Peso (%)", remaining)?;
                let id = state.form().rubric_criteria.len() + 1;
                state = state.reduce(WizardAction::SetField(StandardField::AddCriterion(
                    criterion(id, name.trim(), "", weight),
                )));
            }
            Ok(state)
        }
        RubricMode::Automatic => Ok(state.reduce(WizardAction::SetField(
            StandardField::RubricMode(RubricMode::Automatic),
        ))),
    }
}

fn run_outbox(global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let config = load_config(Some(&workspace));
    let entries = OutboxSubmitter::new(workspace, config.author()).entries();

    let mut rows = Rows::new(["ID", "ENDPOINT", "TITLE", "CREATED"]);
    for entry in &entries {
        rows.push(vec![
            entry.id.to_string(),
            entry.endpoint.clone(),
            truncate_str(entry.payload["title"].as_str().unwrap_or(""), 40),
            entry.created.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    print_list(&rows, &entries, global.format, "queued evaluation", global.quiet)
}

fn run_flush(args: FlushArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let config = load_config(Some(&workspace));
    let entries = OutboxSubmitter::new(workspace.clone(), config.author()).entries();
    if entries.is_empty() {
        if !global.quiet {
            println!("Outbox is empty.");
        }
        return Ok(());
    }

    let token = crate::core::TokenStore::discover(Some(&workspace))
        .load()
        .map_err(|e| miette::miette!("{}", e))?;
    let http = HttpSubmitter::from_config(&config, token).map_err(|e| miette::miette!("{}", e))?;
    let rt = runtime()?;

    let mut failed = 0;
    for entry in entries {
        let request = SubmitRequest {
            endpoint: entry.endpoint.clone(),
            body: entry.payload.clone(),
        };
        match rt.block_on(http.submit(request)) {
            Ok(response) => {
                let remote = crate::wizard::extract_evaluation_id(&response.body)
                    .unwrap_or_else(|| "?".to_string());
                if !args.keep {
                    let path = workspace.record_path(&entry.id);
                    if let Err(e) = std::fs::remove_file(&path) {
                        tracing::warn!("could not remove {}: {}", path.display(), e);
                    }
                }
                if !global.quiet {
                    println!(
                        "{} {} → {}",
                        style("✓").green(),
                        entry.id,
                        style(remote).cyan()
                    );
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {}", style("✗").red(), entry.id, e);
            }
        }
    }

    if failed > 0 {
        return Err(miette::miette!("{} evaluation(s) could not be sent", failed));
    }
    Ok(())
}
