//! Evaluation wizards

pub mod gamified;
pub mod rubric;
pub mod standard;

pub use gamified::{
    grade_code, start_game, submit_and_start, GameSession, GamifiedEvaluationForm, GamifiedField,
    GamifiedOutcome, GamifiedPayload,
};
pub use rubric::generate_ai_rubric;
pub use standard::{
    EvaluationMode, EvaluationType, RubricMode, StandardEvaluationForm, StandardField,
    StandardPayload, TaskSettings,
};
