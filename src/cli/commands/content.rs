//! `aula content` command - Inspect and check content packs

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{load_content, truncate_str, try_workspace};
use crate::cli::table::{print_list, print_structured, Rows};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::content::{ContentError, ContentKind, ContentLoader, ContentPack};

#[derive(Subcommand, Debug)]
pub enum ContentCommands {
    /// List content files, or the entries of one kind
    List(ListArgs),

    /// Show one entry in full
    Show(ShowArgs),

    /// Check content files against their schemas
    Validate(ValidateArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Content kind (objectives, catalog, templates, skins, counting, enigmas, tools, rubric)
    pub kind: Option<ContentKind>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    pub kind: ContentKind,

    /// Entry id (OA id or code for objectives, criterion id for rubric)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Directory to check (default: the workspace content directory)
    pub dir: Option<PathBuf>,
}

pub fn run(cmd: ContentCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ContentCommands::List(args) => run_list(args, global),
        ContentCommands::Show(args) => run_show(args, global),
        ContentCommands::Validate(args) => run_validate(args, global),
    }
}

#[derive(Serialize)]
struct KindSummary {
    kind: String,
    entries: usize,
    source: String,
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = try_workspace(global);
    let pack = load_content(workspace.as_ref())?;

    let Some(kind) = args.kind else {
        let summaries: Vec<KindSummary> = pack
            .origins()
            .iter()
            .map(|(kind, origin)| KindSummary {
                kind: kind.to_string(),
                entries: pack.ids(*kind).len(),
                source: origin.to_string(),
            })
            .collect();
        let mut rows = Rows::new(["KIND", "ENTRIES", "SOURCE"]);
        for s in &summaries {
            rows.push(vec![s.kind.clone(), s.entries.to_string(), s.source.clone()]);
        }
        return print_list(&rows, &summaries, global.format, "content file", global.quiet);
    };

    let rows = entry_rows(&pack, kind);
    match global.format {
        OutputFormat::Json | OutputFormat::Yaml => print_entries(&pack, kind, global.format),
        _ => print_list(&rows, &(), global.format, kind.as_str(), global.quiet),
    }
}

fn entry_rows(pack: &ContentPack, kind: ContentKind) -> Rows {
    match kind {
        ContentKind::Objectives => {
            let mut rows = Rows::new(["ID", "CODE", "BLOOM", "GRADE", "DESCRIPTION"]);
            for o in &pack.objectives {
                rows.push(vec![
                    o.oa_id.clone(),
                    o.oa_code.clone(),
                    o.bloom_level.to_string(),
                    o.grade_code.clone(),
                    truncate_str(&o.description, 50),
                ]);
            }
            rows
        }
        ContentKind::Catalog => {
            let mut rows = Rows::new(["GROUP", "VALUE", "LABEL"]);
            for subject in &pack.catalog.subjects {
                rows.push(vec!["subject".into(), subject.clone(), String::new()]);
            }
            for grade in &pack.catalog.grades {
                rows.push(vec!["grade".into(), grade.clone(), String::new()]);
            }
            for d in &pack.catalog.difficulties {
                rows.push(vec!["difficulty".into(), d.value.to_string(), d.label.clone()]);
            }
            rows
        }
        ContentKind::Templates => {
            let mut rows = Rows::new(["ID", "NAME", "SUBJECT"]);
            for t in &pack.templates {
                rows.push(vec![t.id.clone(), t.name.clone(), t.subject.clone()]);
            }
            rows
        }
        ContentKind::Skins => {
            let mut rows = Rows::new(["ID", "NAME", "DESCRIPTION"]);
            for s in &pack.skins {
                rows.push(vec![s.id.clone(), s.name.clone(), truncate_str(&s.description, 50)]);
            }
            rows
        }
        ContentKind::Counting => {
            let mut rows = Rows::new(["ID", "NAME", "QUESTIONS"]);
            for s in &pack.counting_sets {
                rows.push(vec![s.id.clone(), s.name.clone(), s.questions.len().to_string()]);
            }
            rows
        }
        ContentKind::Enigmas => {
            let mut rows = Rows::new(["ID", "NAME", "DIFFICULTY", "POINTS"]);
            for e in &pack.enigmas {
                rows.push(vec![
                    e.id.clone(),
                    e.name.clone(),
                    e.difficulty.to_string(),
                    e.points.to_string(),
                ]);
            }
            rows
        }
        ContentKind::Tools => {
            let mut rows = Rows::new(["ID", "NAME", "COST", "UNLOCKED"]);
            for t in &pack.tools {
                rows.push(vec![
                    t.id.clone(),
                    t.name.clone(),
                    t.cost.to_string(),
                    if t.unlocked { "yes" } else { "no" }.into(),
                ]);
            }
            rows
        }
        ContentKind::Rubric => {
            let mut rows = Rows::new(["ID", "NAME", "WEIGHT", "LEVELS"]);
            for c in &pack.rubric.criteria {
                rows.push(vec![
                    c.criterion_id.clone(),
                    c.name.clone(),
                    format!("{}%", c.weight),
                    c.levels.len().to_string(),
                ]);
            }
            rows
        }
    }
}

fn print_entries(pack: &ContentPack, kind: ContentKind, format: OutputFormat) -> Result<()> {
    match kind {
        ContentKind::Objectives => print_structured(&pack.objectives, format),
        ContentKind::Catalog => print_structured(&pack.catalog, format),
        ContentKind::Templates => print_structured(&pack.templates, format),
        ContentKind::Skins => print_structured(&pack.skins, format),
        ContentKind::Counting => print_structured(&pack.counting_sets, format),
        ContentKind::Enigmas => print_structured(&pack.enigmas, format),
        ContentKind::Tools => print_structured(&pack.tools, format),
        ContentKind::Rubric => print_structured(&pack.rubric, format),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = try_workspace(global);
    let pack = load_content(workspace.as_ref())?;
    let format = match global.format {
        OutputFormat::Json => OutputFormat::Json,
        _ => OutputFormat::Yaml,
    };
    let id = args.id.as_str();
    let not_found = || ContentError::NotFound {
        kind: args.kind,
        id: id.to_string(),
    };

    match args.kind {
        ContentKind::Objectives => {
            let objective = pack
                .objective(id)
                .or_else(|| pack.objective_by_code(id))
                .ok_or_else(not_found)?;
            print_structured(objective, format)
        }
        ContentKind::Catalog => print_structured(&pack.catalog, format),
        ContentKind::Templates => print_structured(pack.template(id).ok_or_else(not_found)?, format),
        ContentKind::Skins => print_structured(pack.skin(id).ok_or_else(not_found)?, format),
        ContentKind::Counting => {
            print_structured(pack.counting_set(id).ok_or_else(not_found)?, format)
        }
        ContentKind::Enigmas => print_structured(pack.enigma(id).ok_or_else(not_found)?, format),
        ContentKind::Tools => print_structured(pack.tool(id).ok_or_else(not_found)?, format),
        ContentKind::Rubric => {
            let criterion = pack
                .rubric
                .criteria
                .iter()
                .find(|c| c.criterion_id == id)
                .ok_or_else(not_found)?;
            print_structured(criterion, format)
        }
    }
}

fn run_validate(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let dir = match args.dir {
        Some(dir) => dir,
        None => try_workspace(global)
            .map(|ws| ws.content_dir())
            .ok_or_else(|| miette::miette!("not in an Aula workspace; pass a directory"))?,
    };
    if !dir.is_dir() {
        return Err(miette::miette!("{} is not a directory", dir.display()));
    }

    let loader = ContentLoader::new();
    let mut checked = 0usize;
    let mut failed = 0usize;

    let mut entries: Vec<PathBuf> = std::fs::read_dir(&dir)
        .into_diagnostic()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    for path in entries {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(kind) = ContentKind::from_file_name(name) else {
            tracing::debug!("ignoring {}", path.display());
            continue;
        };

        checked += 1;
        let text = std::fs::read_to_string(&path).into_diagnostic()?;
        match loader.check_text(kind, &text, &path.display().to_string()) {
            Ok(()) => {
                if !global.quiet {
                    println!("{} {}", style("✓").green(), name);
                }
            }
            Err(e) => {
                failed += 1;
                println!("{} {}", style("✗").red(), name);
                println!("{:?}", miette::Report::new(e));
            }
        }
    }

    if checked == 0 {
        println!("{} No content files in {}", style("!").yellow(), dir.display());
        return Ok(());
    }
    if failed > 0 {
        return Err(miette::miette!(
            "{} of {} content file(s) failed validation",
            failed,
            checked
        ));
    }
    if !global.quiet {
        println!(
            "{}",
            style(format!("{} content file(s) valid", checked)).dim()
        );
    }
    Ok(())
}
