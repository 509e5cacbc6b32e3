//! CLI entry point - the composition root.
//!
//! Parses arguments, sets up logging, wires yt-dlp into the download
//! manager and dispatches to a handler.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use yoink_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .ok();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let max_concurrent = match &cli.command {
        Commands::Get(args) => args.jobs,
        Commands::Serve { jobs } => *jobs,
        Commands::Info { .. } => yoink_core::DEFAULT_CONCURRENT,
    };
    let ctx = bootstrap(CliConfig {
        ytdlp: cli.ytdlp,
        max_concurrent,
    })?;

    match cli.command {
        Commands::Info { url } => handlers::info::execute(&ctx, &url).await,
        Commands::Get(args) => handlers::get::execute(&ctx, &args).await,
        Commands::Serve { .. } => handlers::serve::execute(&ctx).await,
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start the async runtime")?;
    let result = runtime.block_on(dispatch(cli));
    // Dropping the runtime first lets in-flight children be reaped.
    drop(runtime);

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
    Ok(())
}
