//! canal: command-line front end for ear canal volume profiling.
//!
//! Analyses single scans, compares a right and a left scan, and exports
//! area profiles, suitable for scripting and batch runs.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=canal_profile=info` - Basic operation logging
//! - `RUST_LOG=canal_profile=debug` - Detailed progress logging
//! - `RUST_LOG=canal_profile::timing=debug` - Performance timing
//!
//! # Example
//!
//! ```bash
//! # Compare two scans with info logging
//! RUST_LOG=canal_profile=info canal compare --right r.stl --left l.stl
//!
//! # Machine-readable single-ear analysis
//! canal --format json analyze right.stl
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use canal_profile::{AnalysisError, ConfigError, MeshError, PlaneProjection, RequestError, ServiceConfig};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{analyze, compare, config, profile};

/// canal - Ear canal volume profiling from surface scans.
///
/// Estimates canal volume, isthmus position and regional volumes from
/// STL, OBJ or PLY meshes, and compares left and right ears.
#[derive(Parser)]
#[command(name = "canal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML configuration file (defaults are used otherwise)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a single ear scan
    Analyze {
        /// Input mesh file
        input: PathBuf,

        #[command(flatten)]
        overrides: AnalysisOverrides,
    },

    /// Analyse a right and a left scan and compare them
    Compare {
        /// Right ear mesh (the reference side)
        #[arg(long)]
        right: PathBuf,

        /// Left ear mesh
        #[arg(long)]
        left: PathBuf,

        #[command(flatten)]
        overrides: AnalysisOverrides,
    },

    /// Print the area profile of a scan
    Profile {
        /// Input mesh file
        input: PathBuf,

        /// Write the profile as CSV to this path
        #[arg(long)]
        csv: Option<PathBuf>,

        #[command(flatten)]
        overrides: AnalysisOverrides,
    },

    /// Show or check the effective configuration
    Config {
        /// Print the default configuration instead of the loaded one
        #[arg(long)]
        defaults: bool,
    },
}

/// Command-line overrides applied on top of the configuration file.
#[derive(clap::Args, Clone)]
pub struct AnalysisOverrides {
    /// Number of section planes
    #[arg(long)]
    sections: Option<usize>,

    /// Percentile separating cartilaginous and bony volumes
    #[arg(long)]
    split_percentile: Option<f64>,

    /// How section points are mapped to 2D
    #[arg(long)]
    projection: Option<ProjectionArg>,

    /// Skip decimation of dense meshes
    #[arg(long)]
    no_simplify: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProjectionArg {
    /// Drop the z coordinate
    Xy,
    /// Project into the section plane
    Axis,
}

impl From<ProjectionArg> for PlaneProjection {
    fn from(arg: ProjectionArg) -> Self {
        match arg {
            ProjectionArg::Xy => PlaneProjection::CoordinateXY,
            ProjectionArg::Axis => PlaneProjection::AxisFrame,
        }
    }
}

impl AnalysisOverrides {
    /// Apply the overrides and re-check the result.
    pub fn apply(&self, mut config: ServiceConfig) -> Result<ServiceConfig, ConfigError> {
        if let Some(n) = self.sections {
            config.analysis = config.analysis.with_sections(n);
        }
        if let Some(p) = self.split_percentile {
            config.analysis = config.analysis.with_split_percentile(p);
        }
        if let Some(projection) = self.projection {
            config.analysis = config.analysis.with_projection(projection.into());
        }
        if self.no_simplify {
            config.simplify.enabled = false;
        }
        config.validate()?;
        Ok(config)
    }
}

impl Cli {
    /// The configuration file if given, otherwise the defaults.
    pub fn load_config(&self) -> Result<ServiceConfig> {
        match &self.config {
            Some(path) => ServiceConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load configuration from {:?}", path)),
            None => Ok(ServiceConfig::default()),
        }
    }
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "canal_profile=info,canal=info",
            2 => "canal_profile=debug,canal=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn report_error(e: &anyhow::Error) {
    if let Some(mesh_err) = e.downcast_ref::<MeshError>() {
        eprintln!("{}: {}", "Error".red().bold(), mesh_err);
        eprintln!("  {}: {}", "Code".cyan(), mesh_err.code());
        eprintln!(
            "  {}: {}",
            "Suggestion".green(),
            mesh_err.recovery_suggestion()
        );
    } else if let Some(analysis_err) = e.downcast_ref::<AnalysisError>() {
        eprintln!("{}: {}", "Error".red().bold(), analysis_err);
        eprintln!("  {}: {}", "Code".cyan(), analysis_err.code());
    } else if let Some(request_err) = e.downcast_ref::<RequestError>() {
        eprintln!("{}: {}", "Error".red().bold(), request_err);
        // The decode message already embeds its cause
        if let RequestError::AnalysisFailed { side, source } = request_err {
            eprintln!("  {}: {} ear: {}", "Caused by".yellow(), side, source);
            eprintln!("  {}: {}", "Code".cyan(), source.code());
        }
    } else {
        eprintln!("{}: {}", "Error".red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("  {}: {}", "Caused by".yellow(), cause);
        }
    }
}

fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Analyze { input, overrides } => analyze::run(input, overrides, &cli),
        Commands::Compare {
            right,
            left,
            overrides,
        } => compare::run(right, left, overrides, &cli),
        Commands::Profile {
            input,
            csv,
            overrides,
        } => profile::run(input, csv.as_deref(), overrides, &cli),
        Commands::Config { defaults } => config::run(*defaults, &cli),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            report_error(e);
        }
        std::process::exit(1);
    }

    Ok(())
}
