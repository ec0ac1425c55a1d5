//! Core module - configuration, workspace layout, identities and credentials

pub mod config;
pub mod credentials;
pub mod identity;
pub mod workspace;

pub use config::Config;
pub use credentials::{CredentialError, TokenSource, TokenStore};
pub use identity::{IdParseError, RecordId, RecordPrefix};
pub use workspace::{Workspace, WorkspaceError};
