//! Analysis and service configuration.
//!
//! All tunables of the pipeline live here with their documented defaults;
//! nothing is read from global state. A [`ServiceConfig`] can be loaded
//! from TOML:
//!
//! ```toml
//! parallel_sides = true
//!
//! [analysis]
//! n_sections = 80
//! split_percentile = 65.0
//! isthmus_window = [10.0, 90.0]
//! projection = "coordinate_xy"
//!
//! [simplify]
//! enabled = true
//! ratio = 0.05
//! min_target_faces = 5000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::simplify::SimplifyPolicy;

/// How cross-section boundary points are mapped to 2D before hull area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaneProjection {
    /// Drop the world z coordinate. Exact only when the axis is parallel to
    /// z; kept as the default so areas match historical results.
    #[default]
    #[serde(rename = "coordinate_xy")]
    CoordinateXY,
    /// Project onto an orthonormal basis of the section plane.
    AxisFrame,
}

/// Parameters of a single-specimen analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Number of evenly spaced section planes. Default: 80
    pub n_sections: usize,
    /// Percentile of valid positions separating the cartilaginous (outer)
    /// and bony (inner) volumes. Default: 65.0
    pub split_percentile: f64,
    /// Exclusive percentile window searched for the isthmus. Default: (10, 90)
    pub isthmus_window: (f64, f64),
    /// Minimum distinct boundary points for a section to count. Default: 10
    pub min_boundary_points: usize,
    /// Minimum valid sections for a profile to exist. Default: 10
    pub min_valid_sections: usize,
    /// Coarse and fine resolutions of the convergence check. Default: (80, 120)
    pub convergence_sections: (usize, usize),
    /// 2D mapping used for section areas.
    pub projection: PlaneProjection,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            n_sections: 80,
            split_percentile: 65.0,
            isthmus_window: (10.0, 90.0),
            min_boundary_points: 10,
            min_valid_sections: 10,
            convergence_sections: (80, 120),
            projection: PlaneProjection::CoordinateXY,
        }
    }
}

impl AnalysisParams {
    /// Set the number of section planes.
    pub fn with_sections(mut self, n_sections: usize) -> Self {
        self.n_sections = n_sections;
        self
    }

    /// Set the regional split percentile.
    pub fn with_split_percentile(mut self, percentile: f64) -> Self {
        self.split_percentile = percentile;
        self
    }

    /// Set the isthmus search window.
    pub fn with_isthmus_window(mut self, low: f64, high: f64) -> Self {
        self.isthmus_window = (low, high);
        self
    }

    /// Set the convergence resolutions.
    pub fn with_convergence_sections(mut self, coarse: usize, fine: usize) -> Self {
        self.convergence_sections = (coarse, fine);
        self
    }

    /// Set the section projection.
    pub fn with_projection(mut self, projection: PlaneProjection) -> Self {
        self.projection = projection;
        self
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_sections < 2 {
            return Err(ConfigError::invalid("n_sections", "must be at least 2"));
        }
        check_percentile("split_percentile", self.split_percentile)?;

        let (low, high) = self.isthmus_window;
        check_percentile("isthmus_window", low)?;
        check_percentile("isthmus_window", high)?;
        if low >= high {
            return Err(ConfigError::invalid(
                "isthmus_window",
                format!("lower bound {low} must be below upper bound {high}"),
            ));
        }

        if self.min_valid_sections < 2 {
            return Err(ConfigError::invalid("min_valid_sections", "must be at least 2"));
        }
        if self.min_boundary_points < 3 {
            return Err(ConfigError::invalid("min_boundary_points", "must be at least 3"));
        }

        let (coarse, fine) = self.convergence_sections;
        if coarse < 2 || fine < 2 {
            return Err(ConfigError::invalid(
                "convergence_sections",
                "both resolutions must be at least 2",
            ));
        }
        if coarse == fine {
            return Err(ConfigError::invalid(
                "convergence_sections",
                "resolutions must differ",
            ));
        }
        Ok(())
    }
}

fn check_percentile(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            name,
            format!("{value} is outside [0, 100]"),
        ))
    }
}

/// Configuration handed to the request handler at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Analyse right and left concurrently.
    pub parallel_sides: bool,
    /// Per-specimen analysis parameters.
    pub analysis: AnalysisParams,
    /// Pre-analysis simplification.
    pub simplify: SimplifyPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            parallel_sides: true,
            analysis: AnalysisParams::default(),
            simplify: SimplifyPolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate analysis and simplification settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analysis.validate()?;
        self.simplify.validate()
    }
}
