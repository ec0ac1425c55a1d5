//! Gamified evaluation wizard
//!
//! Four steps: basics, game template and skin, game settings, optional
//! manual question selection. After creation the server is asked to open
//! a game session for the new evaluation.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::content::{BloomLevel, ContentPack, Difficulty};
use crate::wizard::{
    FieldErrors, SharedWizard, SubmissionHandler, SubmitError, SubmitRequest, Submitted,
    Submitter, WizardForm,
};

pub const DEFAULT_ENGINE: &str = "FarmCountingGameOA1Analyze";
pub const DEFAULT_SKIN: &str = "granja";
pub const QUESTION_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=50;
pub const TIME_LIMIT_RANGE: std::ops::RangeInclusive<u32> = 5..=180;

/// Everything the gamified wizard collects
#[derive(Debug, Clone, PartialEq)]
pub struct GamifiedEvaluationForm {
    pub title: String,
    pub description: String,
    pub class_id: String,
    pub subject: String,
    pub grade_level: String,
    pub difficulty: Difficulty,
    pub question_count: u32,
    /// Minutes
    pub time_limit: u32,
    pub oa_codes: Vec<String>,
    pub bloom_levels: Vec<BloomLevel>,
    pub engine_id: String,
    pub skin_theme: String,
    pub selected_question_ids: Vec<String>,
    /// Template ids accepted in step 2; empty accepts any
    known_engines: Vec<String>,
    /// Skin ids accepted in step 2; empty accepts any
    known_skins: Vec<String>,
}

impl Default for GamifiedEvaluationForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            class_id: String::new(),
            subject: "Matemáticas".to_string(),
            grade_level: "1º Básico".to_string(),
            difficulty: Difficulty::Medium,
            question_count: 10,
            time_limit: 30,
            oa_codes: Vec::new(),
            bloom_levels: vec![BloomLevel::Comprender],
            engine_id: DEFAULT_ENGINE.to_string(),
            skin_theme: DEFAULT_SKIN.to_string(),
            selected_question_ids: Vec::new(),
            known_engines: Vec::new(),
            known_skins: Vec::new(),
        }
    }
}

impl GamifiedEvaluationForm {
    /// Form whose template and skin choices are checked against a content pack
    pub fn with_content(content: &ContentPack) -> Self {
        let mut form = Self {
            known_engines: content.templates.iter().map(|t| t.id.clone()).collect(),
            known_skins: content.skins.iter().map(|s| s.id.clone()).collect(),
            ..Self::default()
        };
        if let Some(first) = content.templates.first() {
            form.engine_id = first.id.clone();
        }
        if let Some(subject) = content.catalog.subjects.first() {
            if !content.catalog.subjects.contains(&form.subject) {
                form.subject = subject.clone();
            }
        }
        form
    }
}

/// A single change to the gamified form
#[derive(Debug, Clone)]
pub enum GamifiedField {
    Title(String),
    Description(String),
    ClassId(String),
    Subject(String),
    GradeLevel(String),
    Difficulty(Difficulty),
    QuestionCount(u32),
    TimeLimit(u32),
    ToggleObjective(String),
    Objectives(Vec<String>),
    ToggleBloom(BloomLevel),
    BloomLevels(Vec<BloomLevel>),
    Engine(String),
    Skin(String),
    ToggleQuestion(String),
    Questions(Vec<String>),
}

/// Engine settings derived from the form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineConfig {
    pub subject: String,
    pub grade_level: String,
    /// Short grade code such as `3B` or `2M`
    pub grade_code: String,
    pub difficulty: Difficulty,
}

/// Body of `POST /api/evaluation/gamified`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GamifiedPayload {
    pub title: String,
    pub description: String,
    pub class_id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub game_format: String,
    pub engine_id: String,
    pub skin_theme: String,
    pub oa_codes: Vec<String>,
    pub bloom_levels: Vec<BloomLevel>,
    pub question_count: u32,
    pub time_limit_minutes: u32,
    pub difficulty: Difficulty,
    pub engine_config: EngineConfig,
    pub manual_question_ids: Vec<String>,
}

fn toggle<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if let Some(pos) = items.iter().position(|i| *i == item) {
        items.remove(pos);
    } else {
        items.push(item);
    }
}

impl WizardForm for GamifiedEvaluationForm {
    const TOTAL_STEPS: u8 = 4;
    const ENDPOINT: &'static str = "/api/evaluation/gamified";
    const SUBMIT_ERROR_MESSAGE: &'static str = "Error al crear la evaluación gamificada";

    type Update = GamifiedField;
    type Payload = GamifiedPayload;

    fn step_title(step: u8) -> &'static str {
        match step {
            1 => "Información básica",
            2 => "Plantilla y skin",
            3 => "Configuración del juego",
            4 => "Selección de preguntas",
            _ => "",
        }
    }

    fn validate(&self, step: u8) -> FieldErrors {
        let mut errors = FieldErrors::new();

        match step {
            1 => {
                if self.title.trim().is_empty() {
                    errors.insert("title", "El título es requerido");
                }
                if self.class_id.trim().is_empty() {
                    errors.insert("class_id", "Debe seleccionar una clase");
                }
                if self.oa_codes.is_empty() {
                    errors.insert("oa_codes", "Debe seleccionar al menos un OA");
                }
            }
            2 => {
                if self.engine_id.trim().is_empty() {
                    errors.insert("engine_id", "Debe seleccionar una plantilla de juego");
                } else if !self.known_engines.is_empty() && !self.known_engines.contains(&self.engine_id) {
                    errors.insert(
                        "engine_id",
                        format!("Plantilla de juego desconocida: {}", self.engine_id),
                    );
                }
                if self.skin_theme.trim().is_empty() {
                    errors.insert("skin_theme", "Debe seleccionar un skin");
                } else if !self.known_skins.is_empty() && !self.known_skins.contains(&self.skin_theme) {
                    errors.insert("skin_theme", format!("Skin desconocido: {}", self.skin_theme));
                }
            }
            3 => {
                if !QUESTION_COUNT_RANGE.contains(&self.question_count) {
                    errors.insert(
                        "question_count",
                        "La cantidad de preguntas debe estar entre 1 y 50",
                    );
                }
                if !TIME_LIMIT_RANGE.contains(&self.time_limit) {
                    errors.insert(
                        "time_limit",
                        "El tiempo límite debe estar entre 5 y 180 minutos",
                    );
                }
            }
            _ => {}
        }

        errors
    }

    fn apply(&mut self, update: GamifiedField) {
        match update {
            GamifiedField::Title(v) => self.title = v,
            GamifiedField::Description(v) => self.description = v,
            GamifiedField::ClassId(v) => self.class_id = v,
            GamifiedField::Subject(v) => self.subject = v,
            GamifiedField::GradeLevel(v) => self.grade_level = v,
            GamifiedField::Difficulty(v) => self.difficulty = v,
            GamifiedField::QuestionCount(v) => self.question_count = v,
            GamifiedField::TimeLimit(v) => self.time_limit = v,
            GamifiedField::ToggleObjective(v) => toggle(&mut self.oa_codes, v),
            GamifiedField::Objectives(v) => self.oa_codes = v,
            GamifiedField::ToggleBloom(v) => toggle(&mut self.bloom_levels, v),
            GamifiedField::BloomLevels(v) => self.bloom_levels = v,
            GamifiedField::Engine(v) => self.engine_id = v,
            GamifiedField::Skin(v) => self.skin_theme = v,
            GamifiedField::ToggleQuestion(v) => toggle(&mut self.selected_question_ids, v),
            GamifiedField::Questions(v) => self.selected_question_ids = v,
        }
    }

    fn payload(&self) -> GamifiedPayload {
        GamifiedPayload {
            title: self.title.clone(),
            description: self.description.clone(),
            class_id: self.class_id.clone(),
            kind: "gamified",
            game_format: self.engine_id.clone(),
            engine_id: self.engine_id.clone(),
            skin_theme: self.skin_theme.clone(),
            oa_codes: self.oa_codes.clone(),
            bloom_levels: self.bloom_levels.clone(),
            question_count: self.question_count,
            time_limit_minutes: self.time_limit,
            difficulty: self.difficulty,
            engine_config: EngineConfig {
                subject: self.subject.clone(),
                grade_level: self.grade_level.clone(),
                grade_code: grade_code(&self.grade_level),
                difficulty: self.difficulty,
            },
            manual_question_ids: self.selected_question_ids.clone(),
        }
    }
}

/// Short code for a grade name: "3º Básico" is `3B`, "2º Medio" is `2M`
pub fn grade_code(grade_level: &str) -> String {
    let digits: String = grade_level.chars().filter(char::is_ascii_digit).collect();
    if grade_level.contains("Básico") {
        format!("{}B", digits)
    } else if grade_level.contains("Medio") {
        format!("{}M", digits)
    } else if digits.is_empty() {
        grade_level.trim().to_string()
    } else {
        digits
    }
}

/// Live game opened for a gamified evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub session_id: String,
    pub join_code: String,
    pub url: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// API path that opens a game for an evaluation
pub fn start_game_endpoint(evaluation_id: &str) -> String {
    format!("/api/evaluation/gamified/{}/start-game", evaluation_id)
}

/// Ask the server to open a game session for a created evaluation
pub async fn start_game<S: Submitter + ?Sized>(
    submitter: &S,
    evaluation_id: &str,
) -> Result<GameSession, SubmitError> {
    let response = submitter
        .submit(SubmitRequest {
            endpoint: start_game_endpoint(evaluation_id),
            body: serde_json::json!({}),
        })
        .await?;

    let session = response
        .body
        .get("gameSession")
        .cloned()
        .ok_or_else(|| SubmitError::InvalidResponse("no gameSession in response".to_string()))?;
    serde_json::from_value(session).map_err(|e| SubmitError::InvalidResponse(e.to_string()))
}

/// Outcome of creating a gamified evaluation
#[derive(Debug)]
pub struct GamifiedOutcome {
    pub submitted: Submitted,
    /// Game opened for the evaluation; `None` when the follow-up failed or
    /// the server named no evaluation id
    pub game: Option<GameSession>,
}

/// Submit the wizard, then try to open a game for the new evaluation
///
/// Failing to open the game is logged and reported as `game: None`; the
/// evaluation itself was still created. `on_done` runs once, after the
/// game request, so callers can route to the lobby or fall back to the
/// evaluation.
pub async fn submit_and_start<S: Submitter>(
    handler: &SubmissionHandler<S>,
    wizard: &SharedWizard<GamifiedEvaluationForm>,
    on_done: impl FnOnce(&GamifiedOutcome),
) -> Result<GamifiedOutcome, SubmitError> {
    let submitted = handler.submit(wizard, |_| {}).await?;

    let game = match submitted.evaluation_id.as_deref() {
        None => {
            warn!("evaluation created without an id; no game was opened");
            None
        }
        Some(evaluation_id) => match start_game(handler.submitter(), evaluation_id).await {
            Ok(game) => {
                info!("game {} open with join code {}", game.session_id, game.join_code);
                Some(game)
            }
            Err(e) => {
                warn!(
                    "evaluation {} created but the game could not be opened: {}",
                    evaluation_id, e
                );
                None
            }
        },
    };

    let outcome = GamifiedOutcome { submitted, game };
    on_done(&outcome);
    Ok(outcome)
}
