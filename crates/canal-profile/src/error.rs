//! Error types for mesh decoding and profile analysis.
//!
//! Errors fall into three groups:
//! - [`MeshError`]: the input could not be turned into a usable mesh
//!   (I/O, parsing, unsupported format, invalid data, failed decimation).
//! - [`AnalysisError`]: the mesh decoded fine but no volume profile could
//!   be built from it. This is the single failure path of the analysis.
//! - [`ConfigError`]: analysis or service configuration is invalid.
//!
//! Per-field numeric edge cases (zero canal length, zero reference volume)
//! are not errors; they surface as NaN or `None` on the affected field.
//!
//! # Error Codes
//!
//! Each error has a code in the format `CANAL-XXXX`:
//! - `CANAL-1xxx`: I/O and parse errors
//! - `CANAL-2xxx`: mesh data validation errors
//! - `CANAL-3xxx`: processing errors (simplification)
//! - `CANAL-4xxx`: format errors
//! - `CANAL-5xxx`: analysis errors

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Result type alias for profile analysis.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// CANAL-1001: Failed to read file
    IoRead = 1001,
    /// CANAL-1003: Failed to parse file format
    ParseError = 1003,
    /// CANAL-2001: Face references invalid vertex index
    InvalidVertexIndex = 2001,
    /// CANAL-2002: Vertex has NaN or Infinity coordinate
    InvalidCoordinate = 2002,
    /// CANAL-2003: Mesh has no vertices or faces
    EmptyMesh = 2003,
    /// CANAL-3004: Decimation failed
    DecimationFailed = 3004,
    /// CANAL-4001: Unsupported file format
    UnsupportedFormat = 4001,
    /// CANAL-5001: Too few valid cross-sections
    InsufficientSections = 5001,
    /// CANAL-5002: Point cloud has no dominant direction
    DegenerateGeometry = 5002,
    /// CANAL-5003: Mesh handed to the analysis failed validation
    InvalidMeshData = 5003,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `CANAL-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IoRead => "CANAL-1001",
            ErrorCode::ParseError => "CANAL-1003",
            ErrorCode::InvalidVertexIndex => "CANAL-2001",
            ErrorCode::InvalidCoordinate => "CANAL-2002",
            ErrorCode::EmptyMesh => "CANAL-2003",
            ErrorCode::DecimationFailed => "CANAL-3004",
            ErrorCode::UnsupportedFormat => "CANAL-4001",
            ErrorCode::InsufficientSections => "CANAL-5001",
            ErrorCode::DegenerateGeometry => "CANAL-5002",
            ErrorCode::InvalidMeshData => "CANAL-5003",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the operator can do about a [`MeshError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Export the scan again, optionally in a named format.
    ReexportScan { format: Option<String> },
    /// Convert the scan to one of the decodable formats.
    SupportedFormats { formats: Vec<String> },
    /// Inspect the scan or its file for the listed problems.
    InspectScan { checks: Vec<String> },
    /// Raise a configuration value.
    RaiseSetting { key: String, hint: String },
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::ReexportScan { format: Some(format) } => {
                write!(f, "Export the scan again as {format}")
            }
            RecoverySuggestion::ReexportScan { format: None } => {
                write!(f, "Export the scan again")
            }
            RecoverySuggestion::SupportedFormats { formats } => {
                write!(f, "Convert the scan to {}", formats.join(" or "))
            }
            RecoverySuggestion::InspectScan { checks } => {
                write!(f, "Inspect the scan: {}", checks.join("; "))
            }
            RecoverySuggestion::RaiseSetting { key, hint } => {
                write!(f, "Raise `{key}` ({hint})")
            }
        }
    }
}

/// Errors that can occur while reading, validating or simplifying a mesh.
#[derive(Debug, Error, Diagnostic)]
pub enum MeshError {
    /// Error reading from a file.
    #[error("failed to read mesh from {path}")]
    #[diagnostic(
        code(canal::io::read),
        help("Check that the file exists and is readable. Try: ls -la {}", path.display())
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing mesh data.
    #[error("failed to parse {format} mesh: {details}")]
    #[diagnostic(
        code(canal::parse::error),
        help(
            "The file may be corrupted or in an unsupported format variant. Try re-exporting from the original software."
        )
    )]
    ParseError {
        format: &'static str,
        details: String,
    },

    /// Unsupported file format.
    #[error("unsupported mesh format: {extension:?}")]
    #[diagnostic(code(canal::format::unsupported), help("Supported formats: STL, OBJ, PLY"))]
    UnsupportedFormat { extension: Option<String> },

    /// Empty mesh (no vertices or faces).
    #[error("mesh is empty: {details}")]
    #[diagnostic(
        code(canal::validation::empty),
        help("The mesh must have at least one vertex and one face.")
    )]
    EmptyMesh { details: String },

    /// Invalid vertex index in face data.
    #[error(
        "invalid vertex index: face {face_index} references vertex {vertex_index}, but mesh only has {vertex_count} vertices"
    )]
    #[diagnostic(
        code(canal::validation::vertex_index),
        help("Check the mesh export settings.")
    )]
    InvalidVertexIndex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },

    /// Invalid coordinate value (NaN or Infinity).
    #[error("invalid coordinate at vertex {vertex_index}: {coordinate} is {value}")]
    #[diagnostic(
        code(canal::validation::coordinate),
        help("Check for numerical issues in the source data.")
    )]
    InvalidCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },

    /// Decimation failed.
    #[error("decimation failed: {details}")]
    #[diagnostic(
        code(canal::decimate::failed),
        help("The unsimplified mesh is used instead; try a higher simplification ratio.")
    )]
    DecimationFailed { details: String },
}

impl MeshError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MeshError::IoRead { .. } => ErrorCode::IoRead,
            MeshError::ParseError { .. } => ErrorCode::ParseError,
            MeshError::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            MeshError::EmptyMesh { .. } => ErrorCode::EmptyMesh,
            MeshError::InvalidVertexIndex { .. } => ErrorCode::InvalidVertexIndex,
            MeshError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
            MeshError::DecimationFailed { .. } => ErrorCode::DecimationFailed,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            MeshError::IoRead { path, .. } => RecoverySuggestion::InspectScan {
                checks: vec![format!("{} exists and is readable", path.display())],
            },
            MeshError::ParseError { .. } => RecoverySuggestion::ReexportScan {
                format: Some("binary STL".into()),
            },
            MeshError::UnsupportedFormat { .. } => RecoverySuggestion::SupportedFormats {
                formats: vec!["STL".into(), "OBJ".into(), "PLY".into()],
            },
            MeshError::EmptyMesh { .. } => RecoverySuggestion::ReexportScan { format: None },
            MeshError::InvalidVertexIndex { .. } | MeshError::InvalidCoordinate { .. } => {
                RecoverySuggestion::InspectScan {
                    checks: vec!["face indices in range".into(), "finite coordinates".into()],
                }
            }
            MeshError::DecimationFailed { .. } => RecoverySuggestion::RaiseSetting {
                key: "simplify.ratio".into(),
                hint: "keep more faces".into(),
            },
        }
    }

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeshError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create a ParseError.
    pub fn parse_error(format: &'static str, details: impl Into<String>) -> Self {
        MeshError::ParseError {
            format,
            details: details.into(),
        }
    }

    /// Create an EmptyMesh error.
    pub fn empty_mesh(details: impl Into<String>) -> Self {
        MeshError::EmptyMesh {
            details: details.into(),
        }
    }

    /// Create a DecimationFailed error.
    pub fn decimation_failed(details: impl Into<String>) -> Self {
        MeshError::DecimationFailed {
            details: details.into(),
        }
    }
}

/// Reasons no volume profile could be produced for a mesh.
///
/// A specimen that fails with one of these has no result at all; callers
/// must not substitute zeros or attempt a partial comparison.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq)]
pub enum AnalysisError {
    /// Fewer valid cross-sections survived filtering than required.
    #[error("too few valid cross-sections: {found} found, {required} required")]
    #[diagnostic(
        code(canal::analysis::insufficient_sections),
        help("Try less decimation or a different mesh.")
    )]
    InsufficientSections { found: usize, required: usize },

    /// The vertex cloud has no direction of maximal variance.
    #[error("degenerate geometry: {details}")]
    #[diagnostic(
        code(canal::analysis::degenerate),
        help("The mesh must span a non-zero extent in at least one direction.")
    )]
    DegenerateGeometry { details: String },

    /// The mesh was not validated before analysis and is unusable.
    #[error("invalid mesh: {details}")]
    #[diagnostic(
        code(canal::analysis::invalid_mesh),
        help("Decode meshes through the loaders, or run validate_mesh_data first.")
    )]
    InvalidMesh { details: String },
}

impl AnalysisError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            AnalysisError::InsufficientSections { .. } => ErrorCode::InsufficientSections,
            AnalysisError::DegenerateGeometry { .. } => ErrorCode::DegenerateGeometry,
            AnalysisError::InvalidMesh { .. } => ErrorCode::InvalidMeshData,
        }
    }

    /// Wrap a validation failure of a mesh that bypassed the loaders.
    pub fn invalid_mesh(source: &MeshError) -> Self {
        AnalysisError::InvalidMesh {
            details: source.to_string(),
        }
    }

    /// Create a DegenerateGeometry error.
    pub fn degenerate(details: impl Into<String>) -> Self {
        AnalysisError::DegenerateGeometry {
            details: details.into(),
        }
    }
}

/// Errors in analysis or service configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A parameter is outside its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    #[diagnostic(code(canal::config::invalid))]
    InvalidParameter { name: &'static str, reason: String },

    /// Configuration file could not be read.
    #[error("failed to read configuration")]
    #[diagnostic(code(canal::config::io))]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("invalid TOML configuration: {0}")]
    #[diagnostic(code(canal::config::toml))]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize configuration: {0}")]
    #[diagnostic(code(canal::config::toml))]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON parsing or serialization error.
    #[error("invalid JSON configuration: {0}")]
    #[diagnostic(code(canal::config::json))]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create an InvalidParameter error.
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
