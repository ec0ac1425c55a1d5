//! Classroom mini-games
//!
//! The engines are plain state machines. Sound and narration are injected
//! through [`audio::AudioBackend`] and [`speech::Narrator`] so the same engine
//! runs in a terminal, in tests, or behind another front end.

pub mod audio;
pub mod counting;
pub mod enigma;
pub mod error;
pub mod record;
pub mod report;
pub mod speech;

pub use audio::{
    AudioBackend, BellBackend, RecordingBackend, SilentBackend, SoundBoard, SoundEffect, Tone,
    Waveform,
};
pub use counting::{
    Advance, AnswerRecord, BloomRung, CountingGame, CountingResults, Feedback, Player,
};
pub use enigma::{
    matches_solution, Achievement, EnigmaGame, EnigmaProgress, EnigmaReport, ReportMetrics,
    SolveOutcome, ToolOutcome,
};
pub use error::GameError;
pub use record::{PlayOutcome, PlaySession, RecordError};
pub use report::{ReportError, ReportRenderer};
pub use speech::{
    ConsoleNarrator, Narrator, NarratorEvent, RecordingNarrator, SilentNarrator, VoiceSettings,
};
