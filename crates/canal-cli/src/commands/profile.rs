//! canal profile command - export the area profile of a scan.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use canal_profile::{ConvergenceReport, EarAnalysisResult, build_profile};
use colored::Colorize;
use serde::Serialize;

use crate::{AnalysisOverrides, Cli, OutputFormat, output};

use super::load_prepared;

#[derive(Serialize)]
struct ProfileRow {
    s_mm: f64,
    area_mm2: f64,
    s_norm: f64,
    a_norm: f64,
}

#[derive(Serialize)]
struct ProfileInfo {
    path: String,
    canal_length_mm: f64,
    volume_total_mm3: f64,
    sections_used: usize,
    rows: Vec<ProfileRow>,
}

fn rows(result: &EarAnalysisResult) -> Vec<ProfileRow> {
    result
        .samples
        .iter()
        .zip(result.s_norm.iter().zip(&result.a_norm))
        .map(|(sample, (&s_norm, &a_norm))| ProfileRow {
            s_mm: sample.s,
            area_mm2: sample.area,
            s_norm,
            a_norm,
        })
        .collect()
}

fn to_csv(rows: &[ProfileRow]) -> String {
    let mut out = String::from("s_mm,area_mm2,s_norm,a_norm\n");
    for r in rows {
        let _ = writeln!(out, "{},{},{},{}", r.s_mm, r.area_mm2, r.s_norm, r.a_norm);
    }
    out
}

pub fn run(input: &Path, csv: Option<&Path>, overrides: &AnalysisOverrides, cli: &Cli) -> Result<()> {
    let config = overrides.apply(cli.load_config()?)?;
    let mesh = load_prepared(input, &config, cli)?;

    // A single resolution; convergence is not needed for the curve
    let profile = build_profile(&mesh, &config.analysis, config.analysis.n_sections)?;
    let result = EarAnalysisResult::from_profile(
        profile,
        config.analysis.split_percentile,
        ConvergenceReport::default(),
    );

    let info = ProfileInfo {
        path: input.display().to_string(),
        canal_length_mm: result.canal_length_mm,
        volume_total_mm3: result.volume_total_mm3,
        sections_used: result.sections_used,
        rows: rows(&result),
    };

    if let Some(path) = csv {
        std::fs::write(path, to_csv(&info.rows))
            .with_context(|| format!("Failed to write profile to {:?}", path))?;
        output::success(
            &format!("Profile written to {}", path.display()),
            cli.format,
            cli.quiet,
        );
    }

    match cli.format {
        OutputFormat::Json => output::print(&info, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet && csv.is_none() {
                println!("{}", "Area Profile".bold().underline());
                println!("  {}: {}", "File".cyan(), input.display());
                println!("  {}: {:.2} mm", "Canal length".cyan(), info.canal_length_mm);
                println!("  {}: {}", "Volume".cyan(), output::volume(info.volume_total_mm3));
                println!();
                println!("  {:>9}  {:>10}  {:>6}  {:>6}", "s (mm)", "area (mm²)", "s_norm", "a_norm");
                for r in &info.rows {
                    println!(
                        "  {:>9.2}  {:>10.2}  {:>6.3}  {:>6.3}",
                        r.s_mm, r.area_mm2, r.s_norm, r.a_norm
                    );
                }
            }
        }
    }

    Ok(())
}
