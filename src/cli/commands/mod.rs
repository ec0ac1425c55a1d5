//! CLI command implementations

pub mod auth;
pub mod completions;
pub mod config;
pub mod content;
pub mod eval;
pub mod game;
pub mod init;
pub mod play;
pub mod sessions;
