//! Farm counting game
//!
//! A question set is played in `order`. Each question is answered once,
//! then [`CountingGame::advance`] moves on or produces the final results.
//! In cooperative mode two players take turns, switching after every answer.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::content::{BloomLevel, CountingQuestion, CountingSet};
use crate::games::audio::{SoundBoard, SoundEffect};
use crate::games::error::GameError;
use crate::games::speech::{Narrator, SilentNarrator};

pub const STARTING_ELO: i32 = 1200;

/// Elo gain for a correct answer when the question sets none
pub const DEFAULT_ELO_ADJUSTMENT: i32 = 10;

const WRONG_PREFIX: &str = "No es correcto. ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Player {
    A,
    B,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::A => write!(f, "A"),
            Player::B => write!(f, "B"),
        }
    }
}

/// One rung of the Bloom ladder shown beside the question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BloomRung {
    pub level: BloomLevel,
    pub active: bool,
}

/// Outcome of answering a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub correct: bool,
    pub explanation: String,
    pub points_awarded: u32,
    pub sticker: Option<String>,
    pub elo_rating: i32,
    /// Player whose turn comes next, in cooperative mode
    pub next_player: Option<Player>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub chosen: i64,
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<Player>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountingResults {
    pub set_id: String,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub score: u32,
    pub stickers: Vec<String>,
    pub elo_rating: i32,
    pub answers: Vec<AnswerRecord>,
}

/// What [`CountingGame::advance`] moved to
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Next { index: usize },
    Finished(CountingResults),
}

pub struct CountingGame {
    set_id: String,
    questions: Vec<CountingQuestion>,
    index: usize,
    score: u32,
    stickers: Vec<String>,
    elo_rating: i32,
    player: Option<Player>,
    pending: Option<Feedback>,
    answers: Vec<AnswerRecord>,
    finished: bool,
    sound: SoundBoard,
    narrator: Box<dyn Narrator>,
}

impl CountingGame {
    pub fn new(set: &CountingSet) -> Result<Self, GameError> {
        if set.questions.is_empty() {
            return Err(GameError::NoQuestions(set.id.clone()));
        }
        let mut questions = set.questions.clone();
        questions.sort_by_key(|q| q.order);

        Ok(Self {
            set_id: set.id.clone(),
            questions,
            index: 0,
            score: 0,
            stickers: Vec::new(),
            elo_rating: STARTING_ELO,
            player: None,
            pending: None,
            answers: Vec::new(),
            finished: false,
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

    /// Play in turns, starting with player A
    pub fn cooperative(mut self, enabled: bool) -> Self {
        self.player = enabled.then_some(Player::A);
        self
    }

    pub fn current_question(&self) -> Option<&CountingQuestion> {
        if self.finished {
            None
        } else {
            self.questions.get(self.index)
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn elo_rating(&self) -> i32 {
        self.elo_rating
    }

    pub fn stickers(&self) -> &[String] {
        &self.stickers
    }

    pub fn current_player(&self) -> Option<Player> {
        self.player
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feedback for the current question, once answered
    pub fn pending_feedback(&self) -> Option<&Feedback> {
        self.pending.as_ref()
    }

    /// Levels covered by the set, with the current question's level active
    pub fn bloom_ladder(&self) -> Vec<BloomRung> {
        let mut levels: Vec<BloomLevel> = self.questions.iter().map(|q| q.bloom_level).collect();
        levels.sort();
        levels.dedup();

        let active = self.current_question().map(|q| q.bloom_level);
        levels
            .into_iter()
            .map(|level| BloomRung {
                level,
                active: Some(level) == active,
            })
            .collect()
    }

    /// Narrate the current question
    pub fn read_question(&self) {
        if let Some(q) = self.current_question() {
            self.narrator.speak(&q.stem);
        }
    }

    pub fn answer(&mut self, choice: i64) -> Result<Feedback, GameError> {
        if self.finished {
            return Err(GameError::Finished);
        }
        if self.pending.is_some() {
            return Err(GameError::AlreadyAnswered);
        }
        let question = self.questions.get(self.index).ok_or(GameError::Finished)?;
        if !question.options.contains(&choice) {
            return Err(GameError::InvalidChoice {
                choice,
                options: question.options.clone(),
            });
        }

        self.narrator.stop();
        let correct = choice == question.correct_answer;
        self.sound.play(if correct {
            SoundEffect::Correct
        } else {
            SoundEffect::Incorrect
        });

        let mut points_awarded = 0;
        let mut sticker = None;
        if correct {
            points_awarded = question.points;
            self.score += question.points;
            if let Some(s) = &question.sticker {
                self.stickers.push(s.clone());
                sticker = Some(s.clone());
            }
            self.elo_rating += question
                .elo_adjustment
                .unwrap_or(DEFAULT_ELO_ADJUSTMENT);
        }

        let explanation = if correct {
            question.explanation.clone()
        } else {
            format!("{}{}", WRONG_PREFIX, question.explanation)
        };

        self.answers.push(AnswerRecord {
            question_id: question.id.clone(),
            chosen: choice,
            correct,
            player: self.player,
        });
        debug!(question = %question.id, choice, correct, "answered");

        self.player = self.player.map(Player::other);

        let feedback = Feedback {
            correct,
            explanation,
            points_awarded,
            sticker,
            elo_rating: self.elo_rating,
            next_player: self.player,
        };
        self.pending = Some(feedback.clone());
        Ok(feedback)
    }

    pub fn advance(&mut self) -> Result<Advance, GameError> {
        if self.finished {
            return Err(GameError::Finished);
        }
        if self.pending.take().is_none() {
            return Err(GameError::NotAnswered);
        }

        if self.index + 1 < self.questions.len() {
            self.index += 1;
            Ok(Advance::Next { index: self.index })
        } else {
            self.finished = true;
            let results = self.results();
            info!(
                set = %self.set_id,
                score = results.score,
                correct = results.correct_answers,
                "counting game finished"
            );
            Ok(Advance::Finished(results))
        }
    }

    pub fn results(&self) -> CountingResults {
        CountingResults {
            set_id: self.set_id.clone(),
            total_questions: self.questions.len(),
            correct_answers: self.answers.iter().filter(|a| a.correct).count(),
            score: self.score,
            stickers: self.stickers.clone(),
            elo_rating: self.elo_rating,
            answers: self.answers.clone(),
        }
    }
}

impl std::fmt::Debug for CountingGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountingGame")
            .field("set_id", &self.set_id)
            .field("index", &self.index)
            .field("score", &self.score)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
