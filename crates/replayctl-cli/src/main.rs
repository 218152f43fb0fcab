//! CLI entry point - the composition root.
//!
//! Command dispatch routes to handlers, which receive the composed
//! `CliContext`.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use replayctl_cli::handlers::start::StartMode;
use replayctl_cli::logging::init_tracing;
use replayctl_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};
use replayctl_core::ResolvedPaths;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbosity());

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(err.downcast_ref::<CliError>().map_or(1, CliError::exit_code))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = CliConfig::from_cli(&cli);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    if matches!(command, Commands::Paths) {
        let paths = ResolvedPaths::resolve(config.data_dir.as_deref()).map_err(CliError::from)?;
        handlers::paths::execute(&paths);
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = bootstrap(config)?;

    match command {
        Commands::Start(args) => {
            handlers::start::execute(&ctx, &args, StartMode::Guarded).await?;
        }
        Commands::FastStart(args) => {
            handlers::start::execute(&ctx, &args, StartMode::Fast).await?;
        }
        Commands::Stop { signal } => {
            if !handlers::stop::execute(&ctx, signal)?.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Status { json } => handlers::status::execute(&ctx, json)?,
        Commands::Stage => handlers::stage::execute(&ctx)?,
        Commands::Paths => handlers::paths::execute(&ctx.paths),
    }

    Ok(ExitCode::SUCCESS)
}
