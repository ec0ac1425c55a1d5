use aula::cli::commands::{auth, completions, config, content, eval, game, init, play, sessions};
use aula::cli::{Cli, Commands, GlobalOpts};
use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` or `grep -q` exits quietly.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(&global);

    match cli.command {
        Commands::Init(args) => init::run(args),
        Commands::Eval(cmd) => eval::run(cmd, &global),
        Commands::Game(cmd) => game::run(cmd, &global),
        Commands::Play(cmd) => play::run(cmd, &global),
        Commands::Content(cmd) => content::run(cmd, &global),
        Commands::Sessions(cmd) => sessions::run(cmd, &global),
        Commands::Login(args) => auth::run_login(args, &global),
        Commands::Logout(args) => auth::run_logout(args, &global),
        Commands::Config(cmd) => config::run(cmd, &global),
        Commands::Completions(args) => completions::run(args),
    }
}

/// Logs go to stderr; `AULA_LOG` takes precedence over `-v`/`-q`
fn init_tracing(global: &GlobalOpts) {
    let default = if global.verbose {
        "aula=debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("AULA_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
