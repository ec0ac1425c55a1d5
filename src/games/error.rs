use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("question set '{0}' has no questions")]
    NoQuestions(String),

    #[error("the current question was already answered")]
    AlreadyAnswered,

    #[error("answer the current question before moving on")]
    NotAnswered,

    #[error("the game is over")]
    Finished,

    #[error("{choice} is not one of the options {options:?}")]
    InvalidChoice { choice: i64, options: Vec<i64> },

    #[error("there are no enigmas to play")]
    NoEnigmas,

    #[error("Por favor, escribe una solución.")]
    BlankSolution,

    #[error("a hypothesis cannot be empty")]
    BlankHypothesis,

    #[error("'{0}' is not a clue of the current enigma")]
    UnknownClue(String),

    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("tool '{0}' is locked")]
    ToolLocked(String),

    #[error("tool '{tool}' costs {cost} points, only {available} available")]
    NotEnoughPoints {
        tool: String,
        cost: u32,
        available: u32,
    },

    #[error("no collaboration session is active")]
    NotCollaborating,
}
