//! `aula config` command - Configuration management
//!
//! Values live in the global `~/.config/aula/config.yaml` and the workspace
//! `.aula/config.yaml`; the workspace file wins.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{load_config, open_workspace, try_workspace};
use crate::cli::GlobalOpts;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Remove a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., api_url, default_class)
    pub key: String,

    pub value: String,

    /// Write the global (user) config instead of the workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    pub key: String,

    /// Edit the global (user) config instead of the workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(Clone, Copy)]
enum ValueKind {
    Text,
    Number,
    Flag,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, ValueKind, &str)] = &[
    ("api_url", ValueKind::Text, "Base URL of the platform API (AULA_API_URL)"),
    ("timeout_seconds", ValueKind::Number, "Submission timeout, at least 5 (AULA_TIMEOUT)"),
    ("default_class", ValueKind::Text, "Class used when --class is not given (AULA_CLASS)"),
    ("author", ValueKind::Text, "Name stored on play sessions and outbox entries"),
    ("sound", ValueKind::Flag, "Sound effects in mini-games (true/false)"),
    ("speech", ValueKind::Flag, "Narration in mini-games (true/false)"),
];

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args, global),
        ConfigCommands::Unset(args) => run_unset(args, global),
        ConfigCommands::Path => run_path(global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "api_url" => config.api_url(),
        "timeout_seconds" => Some(config.timeout_seconds().to_string()),
        "default_class" => config.default_class.clone(),
        "author" => Some(config.author()),
        "sound" => Some(config.sound_enabled().to_string()),
        "speech" => Some(config.speech_enabled().to_string()),
        _ => None,
    }
}

fn value_kind(key: &str) -> Result<ValueKind> {
    VALID_KEYS
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, kind, _)| *kind)
        .ok_or_else(|| {
            miette::miette!(
                "unknown key '{}'. Run 'aula config keys' for the list",
                key
            )
        })
}

/// Typed YAML value for a key
fn parse_value(key: &str, raw: &str) -> Result<serde_yml::Value> {
    match value_kind(key)? {
        ValueKind::Text => Ok(serde_yml::Value::String(raw.to_string())),
        ValueKind::Number => raw
            .trim()
            .parse::<u64>()
            .map(|n| serde_yml::Value::Number(n.into()))
            .map_err(|_| miette::miette!("{} expects a whole number, got '{}'", key, raw)),
        ValueKind::Flag => match raw.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(serde_yml::Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(serde_yml::Value::Bool(false)),
            _ => Err(miette::miette!("{} expects true or false, got '{}'", key, raw)),
        },
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = try_workspace(global);
    let config = load_config(workspace.as_ref());

    if let Some(key) = &args.key {
        value_kind(key)?;
        return match config_value(&config, key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _, _) in VALID_KEYS {
        match config_value(&config, key) {
            Some(v) => println!("  {}: {}", style(key).cyan(), style(v).yellow()),
            None => println!("  {}: {}", style(key).cyan(), style("(not set)").dim()),
        }
    }
    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Environment variables (AULA_API_URL, AULA_TIMEOUT, AULA_CLASS)");
    println!("  2. Workspace config (.aula/config.yaml)");
    println!("  3. Global config (~/.config/aula/config.yaml)");
    Ok(())
}

fn target_path(global_scope: bool, global: &GlobalOpts) -> Result<PathBuf> {
    if global_scope {
        Config::global_config_path()
            .ok_or_else(|| miette::miette!("Could not determine global config directory"))
    } else {
        Ok(open_workspace(global)?.aula_dir().join("config.yaml"))
    }
}

fn read_mapping(path: &Path) -> Result<serde_yml::Mapping> {
    if !path.exists() {
        return Ok(serde_yml::Mapping::new());
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    match serde_yml::from_str::<serde_yml::Value>(&content).into_diagnostic()? {
        serde_yml::Value::Mapping(map) => Ok(map),
        serde_yml::Value::Null => Ok(serde_yml::Mapping::new()),
        _ => Err(miette::miette!("{} is not a YAML mapping", path.display())),
    }
}

fn write_mapping(path: &Path, map: serde_yml::Mapping) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(&serde_yml::Value::Mapping(map)).into_diagnostic()?;
    fs::write(path, yaml).into_diagnostic()
}

fn scope_name(global_scope: bool) -> &'static str {
    if global_scope {
        "global"
    } else {
        "workspace"
    }
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let value = parse_value(&args.key, &args.value)?;
    let path = target_path(args.global, global)?;

    let mut map = read_mapping(&path)?;
    map.insert(serde_yml::Value::String(args.key.clone()), value);
    write_mapping(&path, map)?;

    if !global.quiet {
        println!(
            "{} Set {} {} {} in {} config",
            style("✓").green(),
            style(&args.key).cyan(),
            style("→").dim(),
            style(&args.value).yellow(),
            scope_name(args.global)
        );
    }
    Ok(())
}

fn run_unset(args: UnsetArgs, global: &GlobalOpts) -> Result<()> {
    value_kind(&args.key)?;
    let path = target_path(args.global, global)?;
    if !path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            path.display()
        ));
    }

    let mut map = read_mapping(&path)?;
    if map
        .remove(serde_yml::Value::String(args.key.clone()))
        .is_none()
    {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }
    write_mapping(&path, map)?;

    if !global.quiet {
        println!(
            "{} Removed {} from {} config",
            style("✓").green(),
            style(&args.key).cyan(),
            scope_name(args.global)
        );
    }
    Ok(())
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    let exists = |path: &PathBuf| {
        if path.exists() {
            style("(exists)").green().to_string()
        } else {
            style("(not created)").dim().to_string()
        }
    };

    println!("{}", style("Configuration file paths:").bold());
    println!();
    match Config::global_config_path() {
        Some(path) => println!("  {} {} {}", style("Global:").cyan(), path.display(), exists(&path)),
        None => println!("  {} {}", style("Global:").cyan(), style("(unavailable)").dim()),
    }
    match try_workspace(global) {
        Some(ws) => {
            let path = ws.aula_dir().join("config.yaml");
            println!("  {} {} {}", style("Workspace:").cyan(), path.display(), exists(&path));
        }
        None => println!(
            "  {} {}",
            style("Workspace:").cyan(),
            style("(not in an Aula workspace)").dim()
        ),
    }
    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();
    for (key, _, description) in VALID_KEYS {
        println!("  {:<20} {}", style(key).cyan(), style(description).dim());
    }
    println!();
    println!(
        "{}",
        style("Use 'aula config set <key> <value>' to set a value.").dim()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_typed() {
        assert_eq!(
            parse_value("sound", "off").unwrap(),
            serde_yml::Value::Bool(false)
        );
        assert_eq!(
            parse_value("timeout_seconds", "45").unwrap(),
            serde_yml::Value::Number(45u64.into())
        );
        assert!(parse_value("timeout_seconds", "soon").is_err());
        assert!(parse_value("editor", "vim").is_err());
    }

    #[test]
    fn test_written_file_loads_as_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");

        let mut map = read_mapping(&path).unwrap();
        map.insert("speech".into(), parse_value("speech", "yes").unwrap());
        map.insert("default_class".into(), parse_value("default_class", "5B").unwrap());
        write_mapping(&path, map).unwrap();

        let config: Config = serde_yml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(config.speech_enabled());
        assert_eq!(config.default_class.as_deref(), Some("5B"));
    }
}
