//! Content records: objectives, catalogs, game data and rubric templates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bloom's taxonomy levels, named as the curriculum names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BloomLevel {
    Recordar,
    Comprender,
    Aplicar,
    Analizar,
    Evaluar,
    Crear,
}

impl BloomLevel {
    pub fn all() -> &'static [BloomLevel] {
        &[
            BloomLevel::Recordar,
            BloomLevel::Comprender,
            BloomLevel::Aplicar,
            BloomLevel::Analizar,
            BloomLevel::Evaluar,
            BloomLevel::Crear,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BloomLevel::Recordar => "Recordar",
            BloomLevel::Comprender => "Comprender",
            BloomLevel::Aplicar => "Aplicar",
            BloomLevel::Analizar => "Analizar",
            BloomLevel::Evaluar => "Evaluar",
            BloomLevel::Crear => "Crear",
        }
    }
}

impl fmt::Display for BloomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BloomLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BloomLevel::all()
            .iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("unknown Bloom level: {}", s))
    }
}

/// Difficulty of a question, enigma or gamified evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
            Difficulty::Expert => write!(f, "expert"),
        }
    }
}

/// A curricular learning objective (OA)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningObjective {
    pub oa_id: String,
    pub oa_code: String,
    pub description: String,
    pub bloom_level: BloomLevel,
    pub grade_code: String,
    pub subject: String,
}

/// A selectable difficulty with its display label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyOption {
    pub value: Difficulty,
    pub label: String,
    pub description: String,
}

/// Option lists offered by the gamified wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub subjects: Vec<String>,
    pub grades: Vec<String>,
    pub difficulties: Vec<DifficultyOption>,
}

/// A game template a gamified evaluation can be built on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub subject: String,
}

/// Visual theme applied to a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skin {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// One multiple-choice counting question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountingQuestion {
    pub id: String,
    pub order: u32,
    pub stem: String,
    pub options: Vec<i64>,
    pub correct_answer: i64,
    pub explanation: String,
    pub points: u32,
    pub difficulty: Difficulty,
    pub bloom_level: BloomLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elo_adjustment: Option<i32>,
}

/// An ordered question set for the counting game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountingSet {
    pub id: String,
    pub name: String,
    /// Curricular goal the set practises
    pub objective: String,
    pub questions: Vec<CountingQuestion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnigmaKind {
    Counting,
    Patterns,
    Logic,
}

/// Expected answer of an enigma
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Solution {
    Sequence(Vec<i64>),
    Number(i64),
    Text(String),
}

/// A puzzle in the enigma game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enigma {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: EnigmaKind,
    pub difficulty: Difficulty,
    pub clues: Vec<String>,
    pub solution: Solution,
    #[serde(default)]
    pub hints: Vec<String>,
    pub points: u32,
}

/// Side effect of spending points on a tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolAction {
    #[default]
    None,
    RevealClue,
    Collaborate,
}

/// An investigation tool in the enigma game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationTool {
    pub id: String,
    pub name: String,
    pub description: String,
    pub effect: String,
    pub cost: u32,
    pub unlocked: bool,
    #[serde(default)]
    pub action: ToolAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricLevel {
    pub level_id: String,
    pub name: String,
    pub description: String,
    pub points: u32,
}

/// A weighted rubric criterion with its performance levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricCriterion {
    pub criterion_id: String,
    pub name: String,
    pub description: String,
    pub weight: u32,
    pub levels: Vec<RubricLevel>,
}

/// Criteria proposed when a rubric is generated from the selected objectives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricTemplate {
    pub criteria: Vec<RubricCriterion>,
}
