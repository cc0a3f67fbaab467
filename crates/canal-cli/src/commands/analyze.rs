//! canal analyze command - profile a single ear.

use std::path::Path;

use anyhow::Result;
use canal_profile::{EarAnalysisResult, EarAnalyzer};
use colored::Colorize;

use crate::{AnalysisOverrides, Cli, OutputFormat, output};

use super::load_prepared;

pub fn run(input: &Path, overrides: &AnalysisOverrides, cli: &Cli) -> Result<()> {
    let config = overrides.apply(cli.load_config()?)?;
    let mesh = load_prepared(input, &config, cli)?;

    output::info(
        &format!("Analysing {} ({} faces)...", input.display(), mesh.face_count()),
        cli.format,
        cli.quiet,
    );

    let analyzer = EarAnalyzer::new(config.analysis)?;
    let result = analyzer.analyze(&mesh)?;

    match cli.format {
        OutputFormat::Json => output::print(&result, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Ear Analysis".bold().underline());
                println!("  {}: {}", "File".cyan(), input.display());
                print_result(&result);
            }
        }
    }

    Ok(())
}

/// Text rendering of one ear, shared with `compare`.
pub fn print_result(result: &EarAnalysisResult) {
    println!("  {}: {}", "Total volume".cyan(), output::volume(result.volume_total_mm3));
    println!(
        "  {}: {}",
        "Cartilaginous".cyan(),
        output::volume(result.volume_cartilaginous_mm3)
    );
    println!("  {}: {}", "Bony".cyan(), output::volume(result.volume_bony_mm3));
    println!("  {}: {:.2} mm", "Canal length".cyan(), result.canal_length_mm);
    println!(
        "  {}: {:.2} mm (norm {})",
        "Isthmus".cyan(),
        result.isthmus_position_mm,
        output::norm(result.isthmus_position_norm)
    );
    println!("  {}: {}", "Sections used".cyan(), result.sections_used);
    match (result.convergence_error_mm3, result.relative_error_percent) {
        (Some(err), rel) => println!(
            "  {}: {} ({})",
            "Convergence".cyan(),
            output::volume(err),
            output::percent(rel)
        ),
        (None, _) => println!("  {}: n/a", "Convergence".cyan()),
    }
}
