//! canal compare command - bilateral analysis of two scans.

use std::path::Path;

use anyhow::{Context, Result};
use canal_profile::{AnalysisService, AnalyzeRequest, MeshUpload};
use colored::Colorize;

use crate::commands::analyze::print_result;
use crate::{AnalysisOverrides, Cli, OutputFormat, output};

fn upload(path: &Path) -> Result<MeshUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(MeshUpload::new(filename, bytes))
}

pub fn run(right: &Path, left: &Path, overrides: &AnalysisOverrides, cli: &Cli) -> Result<()> {
    let config = overrides.apply(cli.load_config()?)?;
    let service = AnalysisService::from_config(config)?;

    output::info("Analysing right and left scans...", cli.format, cli.quiet);

    let request = AnalyzeRequest::new(upload(right)?, upload(left)?);
    let response = service.handle(&request)?;

    match cli.format {
        OutputFormat::Json => output::print(&response, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Right Ear".bold().underline());
                println!("  {}: {}", "File".cyan(), right.display());
                print_result(&response.right);

                println!("\n{}", "Left Ear".bold().underline());
                println!("  {}: {}", "File".cyan(), left.display());
                print_result(&response.left);

                let c = &response.comparison;
                println!("\n{}", "Left vs Right".bold().underline());
                println!(
                    "  {}: {}",
                    "Total volume".cyan(),
                    output::percent(c.total_volume_diff_percent)
                );
                println!(
                    "  {}: {}",
                    "Cartilaginous".cyan(),
                    output::percent(c.cartilaginous_volume_diff_percent)
                );
                println!(
                    "  {}: {}",
                    "Bony".cyan(),
                    output::percent(c.bony_volume_diff_percent)
                );
                println!(
                    "  {}: {:+.2} mm (norm {})",
                    "Isthmus shift".cyan(),
                    c.isthmus_shift_mm,
                    c.isthmus_shift_norm
                        .map(|v| format!("{:+.3}", v))
                        .unwrap_or_else(|| "n/a".to_string())
                );
                println!(
                    "  {}: {:+.2} mm",
                    "Canal length".cyan(),
                    c.canal_length_diff_mm
                );
            }
        }
    }

    Ok(())
}
