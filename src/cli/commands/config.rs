//! Config command implementation.
//!
//! Show the effective configuration, print where it lives, or write a file
//! with default values.

use std::path::PathBuf;

use crate::cli::{Cli, ConfigAction, ConfigArgs, OutputFormat};
use crate::config::{default_config_path, Config};
use crate::error::{PlaystatError, Result};

use super::print_json;

/// Run the config command.
pub fn run(cli: &Cli, config: &Config, args: &ConfigArgs) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli, config),
        ConfigAction::Path => {
            println!("{}", config_path(cli)?.display());
            Ok(())
        }
        ConfigAction::Init { force } => init_config(cli, *force),
    }
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => default_config_path(),
    }
}

/// Show the effective configuration.
fn show_config(cli: &Cli, config: &Config) -> Result<()> {
    match cli.effective_output() {
        OutputFormat::Json => print_json(config),
        OutputFormat::Text => {
            let content = toml::to_string_pretty(config).map_err(|e| PlaystatError::InvalidConfig {
                message: format!("Failed to serialize config: {e}"),
            })?;
            print!("{content}");
            Ok(())
        }
    }
}

/// Write a default configuration file.
fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let path = config_path(cli)?;
    if path.exists() && !force {
        return Err(PlaystatError::invalid_argument(
            "force",
            format!("{} already exists (use --force to overwrite)", path.display()),
        ));
    }

    Config::default().save_to(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
