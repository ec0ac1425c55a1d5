//! Content packs
//!
//! Everything the wizards and games offer for selection lives in YAML
//! files: learning objectives, option catalogs, game templates, skins,
//! counting questions, enigmas, investigation tools and the rubric
//! template. Defaults are compiled in; a workspace `content/` directory
//! replaces any of them file by file.

pub mod model;
pub mod schema;

pub use model::*;
pub use schema::{SchemaError, SchemaSet};

use miette::Diagnostic;
use rust_embed::Embed;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

use crate::yaml::{parse_to_json, YamlSyntaxError};

#[derive(Embed)]
#[folder = "content/"]
struct EmbeddedContent;

/// The files making up a content pack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentKind {
    Objectives,
    Catalog,
    Templates,
    Skins,
    Counting,
    Enigmas,
    Tools,
    Rubric,
}

impl ContentKind {
    pub fn all() -> &'static [ContentKind] {
        &[
            ContentKind::Objectives,
            ContentKind::Catalog,
            ContentKind::Templates,
            ContentKind::Skins,
            ContentKind::Counting,
            ContentKind::Enigmas,
            ContentKind::Tools,
            ContentKind::Rubric,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Objectives => "objectives",
            ContentKind::Catalog => "catalog",
            ContentKind::Templates => "templates",
            ContentKind::Skins => "skins",
            ContentKind::Counting => "counting",
            ContentKind::Enigmas => "enigmas",
            ContentKind::Tools => "tools",
            ContentKind::Rubric => "rubric",
        }
    }

    /// File name inside a content directory
    pub fn file_name(&self) -> &'static str {
        match self {
            ContentKind::Objectives => "objectives.yaml",
            ContentKind::Catalog => "catalog.yaml",
            ContentKind::Templates => "templates.yaml",
            ContentKind::Skins => "skins.yaml",
            ContentKind::Counting => "counting.yaml",
            ContentKind::Enigmas => "enigmas.yaml",
            ContentKind::Tools => "tools.yaml",
            ContentKind::Rubric => "rubric.yaml",
        }
    }

    pub fn schema_name(&self) -> &'static str {
        match self {
            ContentKind::Objectives => "objectives.schema.json",
            ContentKind::Catalog => "catalog.schema.json",
            ContentKind::Templates => "templates.schema.json",
            ContentKind::Skins => "skins.schema.json",
            ContentKind::Counting => "counting.schema.json",
            ContentKind::Enigmas => "enigmas.schema.json",
            ContentKind::Tools => "tools.schema.json",
            ContentKind::Rubric => "rubric.schema.json",
        }
    }

    /// Kind for a file name, if it is a content file
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.file_name() == name)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ContentError::UnknownKind(s.to_string()))
    }
}

/// Where a content file was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentOrigin {
    Embedded,
    Override(PathBuf),
}

impl fmt::Display for ContentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentOrigin::Embedded => write!(f, "built-in"),
            ContentOrigin::Override(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Errors from loading content
#[derive(Debug, Error, Diagnostic)]
pub enum ContentError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error("cannot read {file}: {message}")]
    #[diagnostic(code(aula::content::decode))]
    Decode { file: String, message: String },

    #[error("{file}: {message}")]
    #[diagnostic(code(aula::content::inconsistent))]
    Inconsistent { file: String, message: String },

    #[error("built-in content file {0} is missing")]
    #[diagnostic(code(aula::content::missing))]
    Missing(String),

    #[error("IO error on {path}: {message}")]
    #[diagnostic(code(aula::content::io))]
    Io { path: PathBuf, message: String },

    #[error("unknown content kind '{0}' (valid: objectives, catalog, templates, skins, counting, enigmas, tools, rubric)")]
    #[diagnostic(code(aula::content::kind))]
    UnknownKind(String),

    #[error("no {kind} entry with id '{id}'")]
    #[diagnostic(code(aula::content::not_found))]
    NotFound { kind: ContentKind, id: String },
}

#[derive(Deserialize)]
struct ObjectivesFile {
    objectives: Vec<LearningObjective>,
}

#[derive(Deserialize)]
struct TemplatesFile {
    templates: Vec<GameTemplate>,
}

#[derive(Deserialize)]
struct SkinsFile {
    skins: Vec<Skin>,
}

#[derive(Deserialize)]
struct CountingFile {
    sets: Vec<CountingSet>,
}

#[derive(Deserialize)]
struct EnigmasFile {
    enigmas: Vec<Enigma>,
}

#[derive(Deserialize)]
struct ToolsFile {
    tools: Vec<InvestigationTool>,
}

/// Fully loaded and checked content
#[derive(Debug, Clone)]
pub struct ContentPack {
    pub objectives: Vec<LearningObjective>,
    pub catalog: Catalog,
    pub templates: Vec<GameTemplate>,
    pub skins: Vec<Skin>,
    pub counting_sets: Vec<CountingSet>,
    pub enigmas: Vec<Enigma>,
    pub tools: Vec<InvestigationTool>,
    pub rubric: RubricTemplate,
    origins: Vec<(ContentKind, ContentOrigin)>,
}

impl ContentPack {
    /// Built-in content only
    pub fn embedded() -> Result<Self, ContentError> {
        ContentLoader::new().load()
    }

    /// Built-in content with a workspace override directory
    pub fn load_from(dir: &Path) -> Result<Self, ContentError> {
        ContentLoader::new().with_override_dir(dir).load()
    }

    /// Where each file came from
    pub fn origins(&self) -> &[(ContentKind, ContentOrigin)] {
        &self.origins
    }

    pub fn objective(&self, oa_id: &str) -> Option<&LearningObjective> {
        self.objectives.iter().find(|o| o.oa_id == oa_id)
    }

    pub fn objective_by_code(&self, oa_code: &str) -> Option<&LearningObjective> {
        self.objectives
            .iter()
            .find(|o| o.oa_code.eq_ignore_ascii_case(oa_code))
    }

    pub fn template(&self, id: &str) -> Option<&GameTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn skin(&self, id: &str) -> Option<&Skin> {
        self.skins.iter().find(|s| s.id == id)
    }

    pub fn counting_set(&self, id: &str) -> Option<&CountingSet> {
        self.counting_sets.iter().find(|s| s.id == id)
    }

    pub fn enigma(&self, id: &str) -> Option<&Enigma> {
        self.enigmas.iter().find(|e| e.id == id)
    }

    pub fn tool(&self, id: &str) -> Option<&InvestigationTool> {
        self.tools.iter().find(|t| t.id == id)
    }

    /// Identifiers of every entry of a kind, in file order
    pub fn ids(&self, kind: ContentKind) -> Vec<String> {
        match kind {
            ContentKind::Objectives => self.objectives.iter().map(|o| o.oa_code.clone()).collect(),
            ContentKind::Catalog => self.catalog.subjects.clone(),
            ContentKind::Templates => self.templates.iter().map(|t| t.id.clone()).collect(),
            ContentKind::Skins => self.skins.iter().map(|s| s.id.clone()).collect(),
            ContentKind::Counting => self.counting_sets.iter().map(|s| s.id.clone()).collect(),
            ContentKind::Enigmas => self.enigmas.iter().map(|e| e.id.clone()).collect(),
            ContentKind::Tools => self.tools.iter().map(|t| t.id.clone()).collect(),
            ContentKind::Rubric => self
                .rubric
                .criteria
                .iter()
                .map(|c| c.criterion_id.clone())
                .collect(),
        }
    }
}

/// Reads content files, applying overrides and checks
pub struct ContentLoader {
    override_dir: Option<PathBuf>,
    schemas: SchemaSet,
}

impl Default for ContentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentLoader {
    pub fn new() -> Self {
        Self {
            override_dir: None,
            schemas: SchemaSet::embedded(),
        }
    }

    pub fn with_override_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.override_dir = Some(dir.into());
        self
    }

    /// Load every kind into a pack
    pub fn load(&self) -> Result<ContentPack, ContentError> {
        let mut origins = Vec::new();
        let mut read = |kind: ContentKind| -> Result<(String, String), ContentError> {
            let (text, origin) = self.source(kind)?;
            let name = match &origin {
                ContentOrigin::Embedded => kind.file_name().to_string(),
                ContentOrigin::Override(path) => path.display().to_string(),
            };
            origins.push((kind, origin));
            Ok((text, name))
        };

        let (text, file) = read(ContentKind::Objectives)?;
        let objectives = self.decode::<ObjectivesFile>(ContentKind::Objectives, &text, &file)?;
        let (text, file) = read(ContentKind::Catalog)?;
        let catalog = self.decode::<Catalog>(ContentKind::Catalog, &text, &file)?;
        let (text, file) = read(ContentKind::Templates)?;
        let templates = self.decode::<TemplatesFile>(ContentKind::Templates, &text, &file)?;
        let (text, file) = read(ContentKind::Skins)?;
        let skins = self.decode::<SkinsFile>(ContentKind::Skins, &text, &file)?;
        let (text, counting_file) = read(ContentKind::Counting)?;
        let counting = self.decode::<CountingFile>(ContentKind::Counting, &text, &counting_file)?;
        let (text, enigma_file) = read(ContentKind::Enigmas)?;
        let enigmas = self.decode::<EnigmasFile>(ContentKind::Enigmas, &text, &enigma_file)?;
        let (text, file) = read(ContentKind::Tools)?;
        let tools = self.decode::<ToolsFile>(ContentKind::Tools, &text, &file)?;
        let (text, file) = read(ContentKind::Rubric)?;
        let rubric = self.decode::<RubricTemplate>(ContentKind::Rubric, &text, &file)?;

        check_counting(&counting.sets, &counting_file)?;
        check_enigmas(&enigmas.enigmas, &enigma_file)?;

        Ok(ContentPack {
            objectives: objectives.objectives,
            catalog,
            templates: templates.templates,
            skins: skins.skins,
            counting_sets: counting.sets,
            enigmas: enigmas.enigmas,
            tools: tools.tools,
            rubric,
            origins,
        })
    }

    /// Check a single file's text without building a pack
    pub fn check_text(&self, kind: ContentKind, text: &str, file: &str) -> Result<(), ContentError> {
        match kind {
            ContentKind::Objectives => self.decode::<ObjectivesFile>(kind, text, file).map(|_| ()),
            ContentKind::Catalog => self.decode::<Catalog>(kind, text, file).map(|_| ()),
            ContentKind::Templates => self.decode::<TemplatesFile>(kind, text, file).map(|_| ()),
            ContentKind::Skins => self.decode::<SkinsFile>(kind, text, file).map(|_| ()),
            ContentKind::Counting => {
                let parsed = self.decode::<CountingFile>(kind, text, file)?;
                check_counting(&parsed.sets, file)
            }
            ContentKind::Enigmas => {
                let parsed = self.decode::<EnigmasFile>(kind, text, file)?;
                check_enigmas(&parsed.enigmas, file)
            }
            ContentKind::Tools => self.decode::<ToolsFile>(kind, text, file).map(|_| ()),
            ContentKind::Rubric => self.decode::<RubricTemplate>(kind, text, file).map(|_| ()),
        }
    }

    fn source(&self, kind: ContentKind) -> Result<(String, ContentOrigin), ContentError> {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(kind.file_name());
            if path.is_file() {
                info!("using {} from {}", kind, path.display());
                let text = std::fs::read_to_string(&path).map_err(|e| ContentError::Io {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                return Ok((text, ContentOrigin::Override(path)));
            }
        }

        let file = EmbeddedContent::get(kind.file_name())
            .ok_or_else(|| ContentError::Missing(kind.file_name().to_string()))?;
        let text = String::from_utf8(file.data.into_owned()).map_err(|e| ContentError::Decode {
            file: kind.file_name().to_string(),
            message: e.to_string(),
        })?;
        debug!("using built-in {}", kind);
        Ok((text, ContentOrigin::Embedded))
    }

    fn decode<T: DeserializeOwned>(
        &self,
        kind: ContentKind,
        text: &str,
        file: &str,
    ) -> Result<T, ContentError> {
        let document = parse_to_json(text, file)?;
        self.schemas.check(kind, &document, text, file)?;
        serde_json::from_value(document).map_err(|e| ContentError::Decode {
            file: file.to_string(),
            message: e.to_string(),
        })
    }
}

fn check_counting(sets: &[CountingSet], file: &str) -> Result<(), ContentError> {
    let inconsistent = |message: String| ContentError::Inconsistent {
        file: file.to_string(),
        message,
    };

    for set in sets {
        if set.questions.is_empty() {
            return Err(inconsistent(format!("set '{}' has no questions", set.id)));
        }
        for question in &set.questions {
            if !question.options.contains(&question.correct_answer) {
                return Err(inconsistent(format!(
                    "question '{}' answer {} is not among its options",
                    question.id, question.correct_answer
                )));
            }
        }
    }
    Ok(())
}

fn check_enigmas(enigmas: &[Enigma], file: &str) -> Result<(), ContentError> {
    for enigma in enigmas {
        let empty = match &enigma.solution {
            Solution::Sequence(values) => values.is_empty(),
            Solution::Text(text) => text.trim().is_empty(),
            Solution::Number(_) => false,
        };
        if empty {
            return Err(ContentError::Inconsistent {
                file: file.to_string(),
                message: format!("enigma '{}' has an empty solution", enigma.id),
            });
        }
    }
    Ok(())
}
