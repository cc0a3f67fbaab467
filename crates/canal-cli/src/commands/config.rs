//! canal config command - show the effective configuration.

use anyhow::Result;
use canal_profile::ServiceConfig;

use crate::{Cli, OutputFormat, output};

pub fn run(defaults: bool, cli: &Cli) -> Result<()> {
    // Loading validates, so a bad file fails here
    let config = if defaults {
        ServiceConfig::default()
    } else {
        cli.load_config()?
    };

    match cli.format {
        OutputFormat::Json => output::print(&config, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                print!("{}", config.to_toml()?);
            }
        }
    }

    Ok(())
}
