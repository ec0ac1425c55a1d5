//! `aula login` / `aula logout` - bearer token storage

use console::style;
use miette::Result;

use crate::cli::helpers::try_workspace;
use crate::cli::GlobalOpts;
use crate::core::{CredentialError, TokenSource, TokenStore};

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// API token issued by the platform
    #[arg(long, conflicts_with = "status")]
    pub token: Option<String>,

    /// Report where the current token comes from
    #[arg(long)]
    pub status: bool,
}

#[derive(clap::Args, Debug)]
pub struct LogoutArgs {}

pub fn run_login(args: LoginArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = try_workspace(global);
    let store = TokenStore::discover(workspace.as_ref());

    if args.status || args.token.is_none() {
        return match store.load_with_source() {
            Ok((_, source)) => {
                let origin = match source {
                    TokenSource::Environment => "AULA_TOKEN".to_string(),
                    TokenSource::File(path) => path.display().to_string(),
                };
                println!("{} Logged in (token from {})", style("✓").green(), origin);
                Ok(())
            }
            Err(CredentialError::Missing) => {
                println!("{} Not logged in", style("!").yellow());
                Ok(())
            }
            Err(e) => Err(miette::miette!("{}", e)),
        };
    }

    let token = args.token.unwrap_or_default();
    let path = store.save(&token).map_err(|e| miette::miette!("{}", e))?;
    if !global.quiet {
        println!(
            "{} Token saved to {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }
    Ok(())
}

pub fn run_logout(_args: LogoutArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = try_workspace(global);
    let removed = TokenStore::discover(workspace.as_ref())
        .clear()
        .map_err(|e| miette::miette!("{}", e))?;

    if global.quiet {
        return Ok(());
    }
    if removed.is_empty() {
        println!("{} No stored token", style("!").yellow());
    } else {
        for path in removed {
            println!("{} Removed {}", style("✓").green(), style(path.display()).dim());
        }
    }
    Ok(())
}
