//! Standard evaluation wizard (quiz, exam or task)
//!
//! Four steps: basics, learning objectives, settings, rubric.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::content::RubricCriterion;
use crate::wizard::{FieldErrors, WizardForm};

/// Default share of the final grade, in percent
pub const DEFAULT_WEIGHT: u32 = 20;

/// Minimum duration of an exam, in minutes
pub const MIN_EXAM_MINUTES: u32 = 30;

/// `attempt_limit` value meaning "no limit"
pub const UNLIMITED_ATTEMPTS: i32 = -1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationType {
    #[default]
    Quiz,
    Exam,
    Task,
}

impl fmt::Display for EvaluationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationType::Quiz => write!(f, "quiz"),
            EvaluationType::Exam => write!(f, "exam"),
            EvaluationType::Task => write!(f, "task"),
        }
    }
}

/// Whether questions are authored by hand or generated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationMode {
    #[default]
    Manual,
    Ai,
}

/// How the evaluation is graded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricMode {
    /// Scored from correct answers; no criteria needed
    #[default]
    Automatic,
    Manual,
    AiGenerated,
}

/// Settings that only apply to tasks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSettings {
    pub allow_file_upload: bool,
    pub file_types: Vec<String>,
    /// Megabytes
    pub max_file_size: u32,
    /// Percent deducted for late delivery
    pub late_penalty: u32,
    pub deadline: Option<NaiveDateTime>,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            allow_file_upload: false,
            file_types: vec!["pdf".into(), "doc".into(), "docx".into()],
            max_file_size: 5,
            late_penalty: 10,
            deadline: None,
        }
    }
}

/// Everything the standard wizard collects
#[derive(Debug, Clone, PartialEq)]
pub struct StandardEvaluationForm {
    pub class_id: String,
    pub title: String,
    pub description: String,
    pub kind: EvaluationType,
    pub mode: EvaluationMode,
    pub weight: u32,
    pub attempt_limit: i32,
    pub time_limit: u32,
    /// Lockdown mode
    pub serious: bool,
    /// Selected objective ids
    pub selected_oas: Vec<String>,
    pub instructions: String,
    pub grading_scale: String,
    pub rubric_mode: RubricMode,
    pub rubric_criteria: Vec<RubricCriterion>,
    pub task_settings: TaskSettings,
}

impl Default for StandardEvaluationForm {
    fn default() -> Self {
        Self {
            class_id: String::new(),
            title: String::new(),
            description: String::new(),
            kind: EvaluationType::Quiz,
            mode: EvaluationMode::Manual,
            weight: DEFAULT_WEIGHT,
            attempt_limit: 1,
            time_limit: 60,
            serious: false,
            selected_oas: Vec::new(),
            instructions: String::new(),
            grading_scale: "chilean_1_7".to_string(),
            rubric_mode: RubricMode::Automatic,
            rubric_criteria: Vec::new(),
            task_settings: TaskSettings::default(),
        }
    }
}

impl StandardEvaluationForm {
    /// Empty form for a class
    pub fn for_class(class_id: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            ..Self::default()
        }
    }
}

/// A single change to the standard form
#[derive(Debug, Clone)]
pub enum StandardField {
    ClassId(String),
    Title(String),
    Description(String),
    Kind(EvaluationType),
    Mode(EvaluationMode),
    Weight(u32),
    AttemptLimit(i32),
    TimeLimit(u32),
    Serious(bool),
    /// Select the objective if absent, deselect it otherwise
    ToggleObjective(String),
    Objectives(Vec<String>),
    Instructions(String),
    GradingScale(String),
    RubricMode(RubricMode),
    AddCriterion(RubricCriterion),
    Criteria(Vec<RubricCriterion>),
    Deadline(Option<NaiveDateTime>),
    AllowFileUpload(bool),
    FileTypes(Vec<String>),
    MaxFileSize(u32),
    LatePenalty(u32),
}

/// Integrity flags sent alongside the evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compliance {
    pub lockdown_capable: bool,
    pub ai_rubric_generated: bool,
    pub oa_alignment_verified: bool,
    pub weight_within_limits: bool,
}

/// Body of `POST /api/evaluation`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardPayload {
    pub class_id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: EvaluationType,
    pub mode: EvaluationMode,
    pub weight: u32,
    pub attempt_limit: i32,
    pub time_limit: u32,
    pub serious: bool,
    pub grading_scale: String,
    pub rubric_json: Vec<RubricCriterion>,
    pub oa_ids: Vec<String>,
    pub instructions: String,
    pub task_settings: Option<TaskSettings>,
    #[serde(rename = "p1_compliance")]
    pub compliance: Compliance,
}

impl WizardForm for StandardEvaluationForm {
    const TOTAL_STEPS: u8 = 4;
    const ENDPOINT: &'static str = "/api/evaluation";
    const SUBMIT_ERROR_MESSAGE: &'static str = "Error al crear la evaluación";

    type Update = StandardField;
    type Payload = StandardPayload;

    fn step_title(step: u8) -> &'static str {
        match step {
            1 => "Información básica",
            2 => "Objetivos de aprendizaje",
            3 => "Configuración",
            4 => "Rúbrica",
            _ => "",
        }
    }

    fn validate(&self, step: u8) -> FieldErrors {
        let mut errors = FieldErrors::new();

        match step {
            1 => {
                if self.class_id.trim().is_empty() {
                    errors.insert("class_id", "Debe seleccionar una clase");
                }
                if self.title.trim().is_empty() {
                    errors.insert("title", "El título es obligatorio");
                }
                if !(1..=100).contains(&self.weight) {
                    errors.insert("weight", "El peso debe estar entre 1 y 100%");
                }
            }
            2 => {
                if self.selected_oas.is_empty() {
                    errors.insert("oas", "Selecciona al menos un Objetivo de Aprendizaje");
                }
            }
            3 => {
                if self.kind == EvaluationType::Task && self.task_settings.deadline.is_none() {
                    errors.insert("deadline", "La fecha límite es obligatoria para tareas");
                }
                if self.kind == EvaluationType::Exam && self.time_limit < MIN_EXAM_MINUTES {
                    errors.insert("time_limit", "Los exámenes deben tener al menos 30 minutos");
                }
            }
            4 => {
                if self.rubric_mode != RubricMode::Automatic && self.rubric_criteria.is_empty() {
                    errors.insert("rubric", "Define al menos un criterio de evaluación");
                }
            }
            _ => {}
        }

        errors
    }

    fn apply(&mut self, update: StandardField) {
        match update {
            StandardField::ClassId(v) => self.class_id = v,
            StandardField::Title(v) => self.title = v,
            StandardField::Description(v) => self.description = v,
            StandardField::Kind(v) => self.kind = v,
            StandardField::Mode(v) => self.mode = v,
            StandardField::Weight(v) => self.weight = v,
            StandardField::AttemptLimit(v) => self.attempt_limit = v,
            StandardField::TimeLimit(v) => self.time_limit = v,
            StandardField::Serious(v) => self.serious = v,
            StandardField::ToggleObjective(id) => {
                if let Some(pos) = self.selected_oas.iter().position(|o| *o == id) {
                    self.selected_oas.remove(pos);
                } else {
                    self.selected_oas.push(id);
                }
            }
            StandardField::Objectives(v) => self.selected_oas = v,
            StandardField::Instructions(v) => self.instructions = v,
            StandardField::GradingScale(v) => self.grading_scale = v,
            StandardField::RubricMode(v) => self.rubric_mode = v,
            StandardField::AddCriterion(v) => self.rubric_criteria.push(v),
            StandardField::Criteria(v) => self.rubric_criteria = v,
            StandardField::Deadline(v) => self.task_settings.deadline = v,
            StandardField::AllowFileUpload(v) => self.task_settings.allow_file_upload = v,
            StandardField::FileTypes(v) => self.task_settings.file_types = v,
            StandardField::MaxFileSize(v) => self.task_settings.max_file_size = v,
            StandardField::LatePenalty(v) => self.task_settings.late_penalty = v,
        }
    }

    fn payload(&self) -> StandardPayload {
        StandardPayload {
            class_id: self.class_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            kind: self.kind,
            mode: self.mode,
            weight: self.weight,
            attempt_limit: self.attempt_limit,
            time_limit: self.time_limit,
            serious: self.serious,
            grading_scale: self.grading_scale.clone(),
            rubric_json: self.rubric_criteria.clone(),
            oa_ids: self.selected_oas.clone(),
            instructions: self.instructions.clone(),
            task_settings: (self.kind == EvaluationType::Task).then(|| self.task_settings.clone()),
            compliance: Compliance {
                lockdown_capable: self.serious,
                ai_rubric_generated: self.rubric_mode == RubricMode::AiGenerated,
                oa_alignment_verified: true,
                weight_within_limits: (1..=100).contains(&self.weight),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::{WizardAction, WizardState};
    use chrono::NaiveDate;

    fn set(state: WizardState<StandardEvaluationForm>, field: StandardField) -> WizardState<StandardEvaluationForm> {
        state.reduce(WizardAction::SetField(field))
    }

    #[test]
    fn test_defaults() {
        let form = StandardEvaluationForm::default();
        assert_eq!(form.weight, 20);
        assert_eq!(form.attempt_limit, 1);
        assert_eq!(form.time_limit, 60);
        assert_eq!(form.grading_scale, "chilean_1_7");
        assert_eq!(form.task_settings.file_types, vec!["pdf", "doc", "docx"]);
    }

    #[test]
    fn test_step1_requires_class_title_and_weight() {
        let mut form = StandardEvaluationForm::default();
        form.weight = 0;
        let errors = form.validate(1);
        assert_eq!(errors.get("class_id"), Some("Debe seleccionar una clase"));
        assert_eq!(errors.get("title"), Some("El título es obligatorio"));
        assert_eq!(errors.get("weight"), Some("El peso debe estar entre 1 y 100%"));

        form.class_id = "c1".into();
        form.title = "Prueba".into();
        form.weight = 100;
        assert!(form.validate(1).is_empty());
    }

    #[test]
    fn test_step3_rules_depend_on_type() {
        let mut form = StandardEvaluationForm::default();
        form.kind = EvaluationType::Task;
        assert!(form.validate(3).contains("deadline"));

        form.task_settings.deadline = NaiveDate::from_ymd_opt(2026, 11, 30)
            .and_then(|d| d.and_hms_opt(23, 59, 0));
        assert!(form.validate(3).is_empty());

        form.kind = EvaluationType::Exam;
        form.time_limit = 29;
        assert_eq!(
            form.validate(3).get("time_limit"),
            Some("Los exámenes deben tener al menos 30 minutos")
        );
        form.time_limit = 30;
        assert!(form.validate(3).is_empty());
    }

    #[test]
    fn test_step4_manual_rubric_needs_criteria() {
        let mut form = StandardEvaluationForm::default();
        assert!(form.validate(4).is_empty());
        form.rubric_mode = RubricMode::Manual;
        assert!(form.validate(4).contains("rubric"));
    }

    #[test]
    fn test_walkthrough_and_payload() {
        let mut state = WizardState::with_initial(StandardEvaluationForm::for_class("c1"));
        state = set(state, StandardField::Title("Fracciones".into()));
        state = state.reduce(WizardAction::NextStep);
        assert_eq!(state.current_step(), 2);

        state = state.reduce(WizardAction::NextStep);
        assert_eq!(state.current_step(), 2);
        assert!(state.errors().contains("oas"));

        state = set(state, StandardField::ToggleObjective("1".into()));
        state = state.reduce(WizardAction::NextStep).reduce(WizardAction::NextStep);
        assert_eq!(state.current_step(), 4);

        let payload = serde_json::to_value(state.form().payload()).unwrap();
        assert_eq!(payload["class_id"], "c1");
        assert_eq!(payload["type"], "quiz");
        assert_eq!(payload["oa_ids"], serde_json::json!(["1"]));
        assert!(payload["task_settings"].is_null());
        assert!(payload.get("compliance").is_none());
        assert_eq!(payload["p1_compliance"]["oa_alignment_verified"], true);
        assert_eq!(payload["p1_compliance"]["weight_within_limits"], true);
    }

    #[test]
    fn test_blank_class_blocks_first_step() {
        let state = WizardState::with_initial(StandardEvaluationForm::for_class("  "));
        let state = set(state, StandardField::Title("Fracciones".into()))
            .reduce(WizardAction::NextStep);
        assert_eq!(state.current_step(), 1);
        assert_eq!(state.errors().get("class_id"), Some("Debe seleccionar una clase"));

        let state = set(state, StandardField::ClassId("c1".into())).reduce(WizardAction::NextStep);
        assert_eq!(state.current_step(), 2);
    }

    #[test]
    fn test_toggle_objective_deselects() {
        let mut form = StandardEvaluationForm::default();
        form.apply(StandardField::ToggleObjective("2".into()));
        form.apply(StandardField::ToggleObjective("2".into()));
        assert!(form.selected_oas.is_empty());
    }

    #[test]
    fn test_task_payload_carries_settings() {
        let mut form = StandardEvaluationForm::default();
        form.kind = EvaluationType::Task;
        let payload = serde_json::to_value(form.payload()).unwrap();
        assert_eq!(payload["task_settings"]["late_penalty"], 10);
        assert_eq!(payload["task_settings"]["max_file_size"], 5);
    }
}
