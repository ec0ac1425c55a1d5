//! Enigma investigation game
//!
//! The player works through the enigmas in order: discovering clues and
//! formulating hypotheses earn investigation points, tools spend them, and
//! a correct solution moves on to the next enigma.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::content::{Enigma, InvestigationTool, Solution, ToolAction};
use crate::games::audio::{SoundBoard, SoundEffect};
use crate::games::error::GameError;
use crate::games::speech::{Narrator, SilentNarrator};

pub const STARTING_POINTS: u32 = 100;
pub const CLUE_POINTS: u32 = 10;
pub const HYPOTHESIS_POINTS: u32 = 15;

pub const WRONG_SOLUTION_MESSAGE: &str = "Intenta de nuevo. Revisa tu respuesta.";

/// Whether `answer` solves an enigma with the given solution
///
/// Sequences are compared element by element after splitting the answer on
/// commas; pieces that are not integers are dropped.
pub fn matches_solution(solution: &Solution, answer: &str) -> bool {
    let answer = answer.trim();
    match solution {
        Solution::Sequence(expected) => {
            let given: Vec<i64> = answer
                .split(',')
                .filter_map(|part| part.trim().parse().ok())
                .collect();
            &given == expected
        }
        Solution::Number(n) => answer == n.to_string(),
        Solution::Text(text) => answer == text.trim(),
    }
}

/// Result of spending points on a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// A clue was revealed, or `None` when every clue was already known
    Clue(Option<String>),
    CollaborationStarted,
    Applied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved { enigma_id: String, next: String },
    /// The last enigma was solved
    Completed { enigma_id: String },
    Incorrect { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetrics {
    pub enigmas_solved: usize,
    pub total_enigmas: usize,
    pub clues_discovered: usize,
    pub hypotheses: usize,
    pub investigation_points: u32,
    pub actions: u32,
    pub patterns_discovered: u32,
    pub tools_used: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnigmaProgress {
    pub id: String,
    pub name: String,
    pub solved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub earned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnigmaReport {
    pub completed: bool,
    pub metrics: ReportMetrics,
    pub progress: Vec<EnigmaProgress>,
    pub achievements: Vec<Achievement>,
}

pub struct EnigmaGame {
    enigmas: Vec<Enigma>,
    tools: Vec<InvestigationTool>,
    current: usize,
    discovered_clues: Vec<String>,
    hypotheses: Vec<String>,
    total_clues: usize,
    total_hypotheses: usize,
    points: u32,
    tools_used: Vec<String>,
    collaboration_active: bool,
    actions: u32,
    patterns_discovered: u32,
    solved: Vec<String>,
    completed: bool,
    sound: SoundBoard,
    narrator: Box<dyn Narrator>,
}

impl EnigmaGame {
    pub fn new(enigmas: Vec<Enigma>, tools: Vec<InvestigationTool>) -> Result<Self, GameError> {
        if enigmas.is_empty() {
            return Err(GameError::NoEnigmas);
        }
        Ok(Self {
            enigmas,
            tools,
            current: 0,
            discovered_clues: Vec::new(),
            hypotheses: Vec::new(),
            total_clues: 0,
            total_hypotheses: 0,
            points: STARTING_POINTS,
            tools_used: Vec::new(),
            collaboration_active: false,
            actions: 0,
            patterns_discovered: 0,
            solved: Vec::new(),
            completed: false,
            sound: SoundBoard::silent(),
            narrator: Box::new(SilentNarrator),
        })
    }

    pub fn with_sound(mut self, sound: SoundBoard) -> Self {
        self.sound = sound;
        self
    }

    pub fn with_narrator(mut self, narrator: impl Narrator + 'static) -> Self {
        self.narrator = Box::new(narrator);
        self
    }

    pub fn current_enigma(&self) -> Option<&Enigma> {
        if self.completed {
            None
        } else {
            self.enigmas.get(self.current)
        }
    }

    pub fn enigmas(&self) -> &[Enigma] {
        &self.enigmas
    }

    pub fn tools(&self) -> &[InvestigationTool] {
        &self.tools
    }

    pub fn discovered_clues(&self) -> &[String] {
        &self.discovered_clues
    }

    pub fn hypotheses(&self) -> &[String] {
        &self.hypotheses
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn actions(&self) -> u32 {
        self.actions
    }

    pub fn is_collaborating(&self) -> bool {
        self.collaboration_active
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Narrate the current enigma's description
    pub fn read_enigma(&self) {
        if let Some(enigma) = self.current_enigma() {
            self.narrator
                .speak(&format!("{}. {}", enigma.name, enigma.description));
        }
    }

    /// Mark a clue of the current enigma as discovered
    ///
    /// Returns `false` when the clue was already known; nothing changes then.
    pub fn discover_clue(&mut self, clue: &str) -> Result<bool, GameError> {
        let enigma = self.current_enigma().ok_or(GameError::Finished)?;
        if !enigma.clues.iter().any(|c| c == clue) {
            return Err(GameError::UnknownClue(clue.to_string()));
        }
        if self.discovered_clues.iter().any(|c| c == clue) {
            return Ok(false);
        }

        self.discovered_clues.push(clue.to_string());
        self.total_clues += 1;
        self.points += CLUE_POINTS;
        self.actions += 1;
        self.sound.play(SoundEffect::Success);
        self.narrator
            .speak(&format!("¡Excelente! Has descubierto una pista: {}", clue));
        debug!(clue, points = self.points, "clue discovered");
        Ok(true)
    }

    pub fn formulate_hypothesis(&mut self, hypothesis: &str) -> Result<(), GameError> {
        if self.completed {
            return Err(GameError::Finished);
        }
        let hypothesis = hypothesis.trim();
        if hypothesis.is_empty() {
            return Err(GameError::BlankHypothesis);
        }

        self.hypotheses.push(hypothesis.to_string());
        self.total_hypotheses += 1;
        self.points += HYPOTHESIS_POINTS;
        self.actions += 1;
        self.sound.play(SoundEffect::Success);
        self.narrator.speak("¡Buena hipótesis! Sigue investigando.");
        Ok(())
    }

    pub fn use_tool(&mut self, tool_id: &str) -> Result<ToolOutcome, GameError> {
        if self.completed {
            return Err(GameError::Finished);
        }
        let tool = self
            .tools
            .iter()
            .find(|t| t.id == tool_id)
            .ok_or_else(|| GameError::UnknownTool(tool_id.to_string()))?;
        if !tool.unlocked {
            return Err(GameError::ToolLocked(tool.id.clone()));
        }
        if self.points < tool.cost {
            return Err(GameError::NotEnoughPoints {
                tool: tool.id.clone(),
                cost: tool.cost,
                available: self.points,
            });
        }

        let action = tool.action;
        self.points -= tool.cost;
        self.tools_used.push(tool.id.clone());
        debug!(tool = tool_id, points = self.points, "tool used");

        match action {
            ToolAction::RevealClue => {
                let hidden = self.current_enigma().and_then(|e| {
                    e.clues
                        .iter()
                        .find(|c| !self.discovered_clues.contains(*c))
                        .cloned()
                });
                if let Some(clue) = &hidden {
                    self.discover_clue(clue)?;
                }
                Ok(ToolOutcome::Clue(hidden))
            }
            ToolAction::Collaborate => {
                self.start_collaboration();
                Ok(ToolOutcome::CollaborationStarted)
            }
            ToolAction::None => Ok(ToolOutcome::Applied),
        }
    }

    pub fn start_collaboration(&mut self) {
        self.collaboration_active = true;
        self.narrator
            .speak("Has iniciado una sesión de colaboración. ¡Trabaja en equipo!");
    }

    pub fn complete_collaboration(&mut self) -> Result<(), GameError> {
        if !self.collaboration_active {
            return Err(GameError::NotCollaborating);
        }
        self.collaboration_active = false;
        self.actions += 1;
        self.sound.play(SoundEffect::Success);
        self.narrator.speak("¡Excelente trabajo en equipo!");
        Ok(())
    }

    pub fn solve(&mut self, answer: &str) -> Result<SolveOutcome, GameError> {
        if answer.trim().is_empty() {
            return Err(GameError::BlankSolution);
        }
        let enigma = self.current_enigma().ok_or(GameError::Finished)?.clone();

        if !matches_solution(&enigma.solution, answer) {
            self.sound.play(SoundEffect::Error);
            self.narrator
                .speak("Esa no es la respuesta correcta. Sigue investigando.");
            return Ok(SolveOutcome::Incorrect {
                message: WRONG_SOLUTION_MESSAGE.to_string(),
            });
        }

        self.sound.play(SoundEffect::Achievement);
        self.narrator.speak(&format!(
            "¡Felicitaciones! Has resuelto el enigma: {}",
            enigma.name
        ));
        self.actions += 1;
        self.patterns_discovered += 1;
        self.points += enigma.points;
        self.solved.push(enigma.id.clone());
        info!(enigma = %enigma.id, points = self.points, "enigma solved");

        match self.enigmas.get(self.current + 1) {
            Some(next) => {
                let next_name = next.name.clone();
                self.current += 1;
                self.discovered_clues.clear();
                self.hypotheses.clear();
                self.narrator.speak(&format!(
                    "¡Excelente! Ahora vamos con el siguiente enigma: {}",
                    next_name
                ));
                Ok(SolveOutcome::Solved {
                    enigma_id: enigma.id,
                    next: next_name,
                })
            }
            None => {
                self.completed = true;
                self.narrator
                    .speak("¡Has completado todos los enigmas! ¡Eres un investigador experto!");
                Ok(SolveOutcome::Completed {
                    enigma_id: enigma.id,
                })
            }
        }
    }

    pub fn report(&self) -> EnigmaReport {
        let achievement = |id: &str, title: &str, earned: bool| Achievement {
            id: id.to_string(),
            title: title.to_string(),
            earned,
        };

        EnigmaReport {
            completed: self.completed,
            metrics: ReportMetrics {
                enigmas_solved: self.solved.len(),
                total_enigmas: self.enigmas.len(),
                clues_discovered: self.total_clues,
                hypotheses: self.total_hypotheses,
                investigation_points: self.points,
                actions: self.actions,
                patterns_discovered: self.patterns_discovered,
                tools_used: self.tools_used.clone(),
            },
            progress: self
                .enigmas
                .iter()
                .map(|e| EnigmaProgress {
                    id: e.id.clone(),
                    name: e.name.clone(),
                    solved: self.solved.contains(&e.id),
                })
                .collect(),
            achievements: vec![
                achievement("first-clue", "Primera Pista", self.total_clues > 0),
                achievement(
                    "first-hypothesis",
                    "Primera Hipótesis",
                    self.total_hypotheses > 0,
                ),
                achievement("first-enigma", "Primer Enigma", !self.solved.is_empty()),
            ],
        }
    }
}

impl std::fmt::Debug for EnigmaGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnigmaGame")
            .field("current", &self.current)
            .field("points", &self.points)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}
