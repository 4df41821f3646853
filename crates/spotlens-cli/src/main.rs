use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use spotlens_cli::cli::{Cli, Commands};
use spotlens_cli::commands::{
    Context, cmd_cache, cmd_config, cmd_fetch, cmd_normalize, cmd_spots,
};
use spotlens_cli::config::{Config, default_config_path};
use spotlens_cli::format::FormatOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "spotlens", &mut io::stdout());
        return Ok(());
    }

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = Config::resolve(cli.config.as_deref())?;
    let ctx = Context {
        config,
        config_path: cli.config.clone().unwrap_or_else(default_config_path),
        format: cli.output_format(),
        opts: FormatOptions::new(cli.no_color),
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Normalize { identifiers } => cmd_normalize(&identifiers, &ctx)?,
        Commands::Fetch {
            identifier,
            size,
            output,
        } => cmd_fetch(&identifier, size.target(), output.as_deref(), &ctx).await?,
        Commands::Cache { action } => cmd_cache(action, &ctx).await?,
        Commands::Spots { action } => cmd_spots(action, &ctx)?,
        Commands::Config { action } => cmd_config(action, &ctx)?,
        Commands::Completions { .. } => unreachable!("handled before tracing init"),
    }

    Ok(())
}
