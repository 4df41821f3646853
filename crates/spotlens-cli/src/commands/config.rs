//! Config command - show and initialize the configuration file.

use anyhow::{Context as _, Result, bail};

use super::Context;
use crate::cli::ConfigAction;
use crate::config::Config;

pub fn cmd_config(action: ConfigAction, ctx: &Context) -> Result<()> {
    print!("{}", run(action, ctx)?);
    Ok(())
}

fn run(action: ConfigAction, ctx: &Context) -> Result<String> {
    match action {
        ConfigAction::Show => {
            if ctx.is_json() {
                ctx.opts.as_json(&ctx.config)
            } else {
                toml::to_string_pretty(&ctx.config).context("Failed to serialize config")
            }
        }
        ConfigAction::Path => Ok(format!("{}\n", ctx.config_path.display())),
        ConfigAction::Init { force } => {
            let path = &ctx.config_path;
            if path.exists() && !force {
                bail!(
                    "Config file already exists: {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(path)?;
            Ok(format!("Wrote default configuration to {}\n", path.display()))
        }
    }
}
