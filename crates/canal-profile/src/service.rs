//! Stateless request handling for a bilateral analysis.
//!
//! Transport is left to the caller: an HTTP adapter maps an upload form to
//! an [`AnalyzeRequest`], calls [`AnalysisService::handle`], and sends either
//! the serialized [`AnalyzeResponse`] or [`RequestError::body`] with
//! [`RequestError::status_code`].

use std::fmt;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::analyze::{EarAnalysisResult, EarAnalyzer};
use crate::compare::{ComparisonResult, compare};
use crate::config::ServiceConfig;
use crate::error::{AnalysisError, AnalysisResult, ConfigError, MeshError};
use crate::io::MeshFormat;
use crate::simplify::{DecodingMeshSource, SurfaceMeshSource};
use crate::tracing_ext::OperationTimer;

/// Which ear an upload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Right,
    Left,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Right => write!(f, "right"),
            Side::Left => write!(f, "left"),
        }
    }
}

/// One uploaded mesh file.
#[derive(Debug, Clone)]
pub struct MeshUpload {
    /// Client-side file name; its extension selects the decoder.
    pub filename: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl MeshUpload {
    /// Create an upload.
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// A request carrying the `right` and `left` uploads.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeRequest {
    pub right: Option<MeshUpload>,
    pub left: Option<MeshUpload>,
}

impl AnalyzeRequest {
    /// A request with both sides present.
    pub fn new(right: MeshUpload, left: MeshUpload) -> Self {
        Self {
            right: Some(right),
            left: Some(left),
        }
    }
}

/// Successful analysis payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub right: EarAnalysisResult,
    pub left: EarAnalysisResult,
    pub comparison: ComparisonResult,
}

/// Client-facing request failures.
#[derive(Debug, Error, Diagnostic)]
pub enum RequestError {
    /// One or both uploads are absent.
    #[error("Upload both right and left files (form fields: right, left).")]
    #[diagnostic(code(canal::request::missing_upload))]
    MissingUpload,

    /// An upload could not be decoded into a mesh.
    #[error("Could not read {side} mesh: {source}")]
    #[diagnostic(code(canal::request::invalid_mesh))]
    InvalidMesh {
        side: Side,
        #[source]
        source: MeshError,
    },

    /// A side produced too few valid sections for a profile.
    #[error(
        "Could not compute profiles (too few valid sections). Try less decimation or different mesh."
    )]
    #[diagnostic(code(canal::request::analysis_failed))]
    AnalysisFailed {
        side: Side,
        #[source]
        source: AnalysisError,
    },
}

/// JSON body of an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl RequestError {
    /// HTTP status an adapter should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            RequestError::MissingUpload
            | RequestError::InvalidMesh { .. }
            | RequestError::AnalysisFailed { .. } => 400,
        }
    }

    /// Response body for this error.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }
}

/// Handles bilateral analysis requests with a fixed configuration.
#[derive(Debug, Clone)]
pub struct AnalysisService<S = DecodingMeshSource> {
    config: ServiceConfig,
    analyzer: EarAnalyzer,
    source: S,
}

impl AnalysisService<DecodingMeshSource> {
    /// A service using the built-in decoders and the configured
    /// simplification policy.
    pub fn from_config(config: ServiceConfig) -> Result<Self, ConfigError> {
        let source = DecodingMeshSource::new(config.simplify.clone());
        Self::new(config, source)
    }
}

impl<S: SurfaceMeshSource> AnalysisService<S> {
    /// Create a service with a custom mesh source.
    pub fn new(config: ServiceConfig, source: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let analyzer = EarAnalyzer::new(config.analysis.clone())?;
        Ok(Self {
            config,
            analyzer,
            source,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Analyse both ears and compare them.
    ///
    /// # Errors
    /// [`RequestError::MissingUpload`] before any work if a side is absent;
    /// otherwise the first side (right, then left) that failed to decode or
    /// to produce a profile.
    pub fn handle(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, RequestError> {
        let (Some(right), Some(left)) = (present(&request.right), present(&request.left)) else {
            return Err(RequestError::MissingUpload);
        };

        let _timer = OperationTimer::new("handle_request");

        let (right_result, left_result) = if self.config.parallel_sides {
            rayon::join(
                || self.analyze_side(Side::Right, right),
                || self.analyze_side(Side::Left, left),
            )
        } else {
            (
                self.analyze_side(Side::Right, right),
                self.analyze_side(Side::Left, left),
            )
        };

        let right_analysis = right_result?;
        let left_analysis = left_result?;

        let right = right_analysis.map_err(|source| analysis_failed(Side::Right, source))?;
        let left = left_analysis.map_err(|source| analysis_failed(Side::Left, source))?;

        let comparison = compare(&right, &left);
        info!(
            total_volume_diff_percent = ?comparison.total_volume_diff_percent,
            "Bilateral comparison complete"
        );

        Ok(AnalyzeResponse {
            right,
            left,
            comparison,
        })
    }

    /// Decode and analyse one side. The outer error is a decoding failure,
    /// the inner one an analysis failure.
    fn analyze_side(
        &self,
        side: Side,
        upload: &MeshUpload,
    ) -> Result<AnalysisResult<EarAnalysisResult>, RequestError> {
        let invalid = |source| RequestError::InvalidMesh { side, source };

        let format = MeshFormat::from_filename(&upload.filename).map_err(invalid)?;
        let mesh = self.source.load(&upload.bytes, format).map_err(invalid)?;

        info!(
            "Analysing {} ear: {} vertices, {} faces",
            side,
            mesh.vertex_count(),
            mesh.face_count()
        );
        Ok(self.analyzer.analyze(&mesh))
    }
}

fn present(upload: &Option<MeshUpload>) -> Option<&MeshUpload> {
    upload.as_ref().filter(|u| !u.filename.is_empty())
}

fn analysis_failed(side: Side, source: AnalysisError) -> RequestError {
    warn!("No profile for {} ear: {}", side, source);
    RequestError::AnalysisFailed { side, source }
}
