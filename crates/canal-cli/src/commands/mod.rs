//! Subcommand implementations.

pub mod analyze;
pub mod compare;
pub mod config;
pub mod profile;

use std::path::Path;

use anyhow::{Context, Result};
use canal_profile::{DecodingMeshSource, Mesh, ServiceConfig, SimplifyOutcome, SurfaceMeshSource, load_mesh};

use crate::{Cli, output};

/// Load a scan and apply the configured simplification.
pub fn load_prepared(input: &Path, config: &ServiceConfig, cli: &Cli) -> Result<Mesh> {
    let mesh = load_mesh(input).with_context(|| format!("Failed to load mesh from {:?}", input))?;

    let source = DecodingMeshSource::new(config.simplify.clone());
    let outcome = source.simplify(&mesh);
    match &outcome {
        SimplifyOutcome::Simplified {
            original_faces,
            final_faces,
            ..
        } => output::info(
            &format!("Simplified {original_faces} → {final_faces} faces"),
            cli.format,
            cli.quiet,
        ),
        SimplifyOutcome::Failed { error } => output::warning(
            &format!("Simplification failed, using the full mesh: {error}"),
            cli.format,
            cli.quiet,
        ),
        SimplifyOutcome::Skipped { .. } => {}
    }
    Ok(outcome.into_mesh(mesh))
}
