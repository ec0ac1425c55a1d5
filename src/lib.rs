//! Aula: evaluation wizards and classroom mini-games
//!
//! The wizards collect a standard or gamified evaluation step by step and
//! submit it to the platform API. The games run the counting and enigma
//! activities against content packs that ship with the binary.

pub mod cli;
pub mod content;
pub mod core;
pub mod evaluation;
pub mod games;
pub mod wizard;
pub mod yaml;
