// Allow unused_assignments lint for error struct fields that are used in thiserror Display macros
// but appear as "never read" to the compiler.
#![allow(unused_assignments)]

//! Error types for contour extraction with rich diagnostics.
//!
//! Every error carries a machine-readable code, a recovery suggestion and a
//! miette help message. Only conditions detected before the first contour
//! value is processed are errors; per-cell irregularities (unsupported
//! shapes, degenerate edges) are handled inside the extractors.

use miette::Diagnostic;
use thiserror::Error;

use crate::array::ScalarType;

/// Result type alias for contour operations.
pub type ContourResult<T> = Result<T, ContourError>;

/// Machine-readable error codes for contour operations.
///
/// Codes follow the pattern `CONTOUR-XXXX` where:
/// - 1xxx = Input validation errors
/// - 2xxx = Execution errors
/// - 3xxx = Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContourErrorCode {
    /// CONTOUR-1001: No scalar array to contour
    MissingScalars = 1001,
    /// CONTOUR-1002: Point coordinates are neither f32 nor f64
    UnsupportedPointPrecision = 1002,
    /// CONTOUR-1003: Scalar array has an unsupported element type
    UnsupportedScalarType = 1003,
    /// CONTOUR-1004: Scalar array shape does not match the mesh
    ScalarShapeMismatch = 1004,
    /// CONTOUR-1005: Mesh arrays are inconsistent
    InvalidMesh = 1005,

    /// CONTOUR-2001: Worker pool could not be created
    ThreadPool = 2001,
    /// CONTOUR-2002: Scalar tree could not be built
    ScalarTree = 2002,

    /// CONTOUR-3001: Invalid parameters
    InvalidParams = 3001,
    /// CONTOUR-3002: Configuration could not be parsed
    ConfigParse = 3002,
}

impl ContourErrorCode {
    /// Returns the error code as a string in the format `CONTOUR-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContourErrorCode::MissingScalars => "CONTOUR-1001",
            ContourErrorCode::UnsupportedPointPrecision => "CONTOUR-1002",
            ContourErrorCode::UnsupportedScalarType => "CONTOUR-1003",
            ContourErrorCode::ScalarShapeMismatch => "CONTOUR-1004",
            ContourErrorCode::InvalidMesh => "CONTOUR-1005",
            ContourErrorCode::ThreadPool => "CONTOUR-2001",
            ContourErrorCode::ScalarTree => "CONTOUR-2002",
            ContourErrorCode::InvalidParams => "CONTOUR-3001",
            ContourErrorCode::ConfigParse => "CONTOUR-3002",
        }
    }
}

impl std::fmt::Display for ContourErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for contour errors.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoverySuggestion {
    /// Attach or activate a point scalar array.
    ProvideScalars,
    /// Convert an array to a supported element type.
    ConvertArray { name: String, to: ScalarType },
    /// Rebuild the mesh from consistent arrays.
    RebuildMesh,
    /// Lower the requested worker count.
    ReduceThreads,
    /// Disable the scalar tree for this call.
    DisableScalarTree,
    /// No specific suggestion.
    None,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::ProvideScalars => {
                write!(
                    f,
                    "Add a one-component point array and select it with `scalar_array` or mark it active"
                )
            }
            RecoverySuggestion::ConvertArray { name, to } => {
                write!(f, "Convert array '{}' to {}", name, to)
            }
            RecoverySuggestion::RebuildMesh => {
                write!(f, "Rebuild the mesh so cells, types and point arrays agree")
            }
            RecoverySuggestion::ReduceThreads => {
                write!(f, "Request fewer worker threads or leave `num_threads` unset")
            }
            RecoverySuggestion::DisableScalarTree => {
                write!(f, "Disable `use_scalar_tree` and contour with a full cell scan")
            }
            RecoverySuggestion::None => {
                write!(f, "No specific suggestion available")
            }
        }
    }
}

/// Errors that can occur during contour extraction.
#[derive(Debug, Error, Diagnostic)]
pub enum ContourError {
    /// No scalar array was found.
    #[error("no point scalars to contour{}", .requested.as_ref().map(|n| format!(" (requested '{}')", n)).unwrap_or_default())]
    #[diagnostic(
        code(contour::input::missing_scalars),
        help(
            "Select a point array by name or mark one as the active scalars before contouring."
        )
    )]
    MissingScalars { requested: Option<String> },

    /// Point coordinates use an unsupported precision.
    #[error("point coordinates must be f32 or f64, found {found}")]
    #[diagnostic(
        code(contour::input::point_precision),
        help("Convert the point array to single or double precision floating point.")
    )]
    UnsupportedPointPrecision { found: ScalarType },

    /// Scalar array has an unsupported element type.
    #[error("scalar array '{name}' has unsupported type {found}")]
    #[diagnostic(
        code(contour::input::scalar_type),
        help("Contour scalars must be u32, i32, f32 or f64.")
    )]
    UnsupportedScalarType { name: String, found: ScalarType },

    /// Scalar array does not have one value per point.
    #[error(
        "scalar array '{name}' has {tuples} tuples of {components} components, expected {expected} tuples of 1 component"
    )]
    #[diagnostic(
        code(contour::input::scalar_shape),
        help("The contour array must hold exactly one value per mesh point.")
    )]
    ScalarShapeMismatch {
        name: String,
        tuples: usize,
        components: usize,
        expected: usize,
    },

    /// Mesh arrays are inconsistent.
    #[error("invalid mesh: {details}")]
    #[diagnostic(
        code(contour::input::invalid_mesh),
        help("Check that every cell has a type and every connectivity entry names an existing point.")
    )]
    InvalidMesh { details: String },

    /// Worker pool construction failed.
    #[error("failed to create worker pool: {details}")]
    #[diagnostic(
        code(contour::exec::thread_pool),
        help("Lower `num_threads` or use the global pool by leaving it unset.")
    )]
    ThreadPool { details: String },

    /// Scalar tree construction failed.
    #[error("scalar tree build failed: {details}")]
    #[diagnostic(
        code(contour::exec::scalar_tree),
        help("Disable `use_scalar_tree` to fall back to a full cell scan.")
    )]
    ScalarTree { details: String },

    /// Invalid parameters.
    #[error("invalid contour parameters: {details}")]
    #[diagnostic(
        code(contour::params::invalid),
        help("Check parameter values: num_threads > 0, generated value count > 0, finite ranges.")
    )]
    InvalidParams {
        details: String,
        param_name: Option<String>,
    },

    /// Configuration text could not be parsed.
    #[error("failed to parse contour configuration: {details}")]
    #[diagnostic(
        code(contour::config::parse),
        help("Configuration must be valid TOML or JSON with the ContourParams field names.")
    )]
    ConfigParse { details: String },
}

impl ContourError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ContourErrorCode {
        match self {
            ContourError::MissingScalars { .. } => ContourErrorCode::MissingScalars,
            ContourError::UnsupportedPointPrecision { .. } => {
                ContourErrorCode::UnsupportedPointPrecision
            }
            ContourError::UnsupportedScalarType { .. } => ContourErrorCode::UnsupportedScalarType,
            ContourError::ScalarShapeMismatch { .. } => ContourErrorCode::ScalarShapeMismatch,
            ContourError::InvalidMesh { .. } => ContourErrorCode::InvalidMesh,
            ContourError::ThreadPool { .. } => ContourErrorCode::ThreadPool,
            ContourError::ScalarTree { .. } => ContourErrorCode::ScalarTree,
            ContourError::InvalidParams { .. } => ContourErrorCode::InvalidParams,
            ContourError::ConfigParse { .. } => ContourErrorCode::ConfigParse,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            ContourError::MissingScalars { .. } => RecoverySuggestion::ProvideScalars,
            ContourError::UnsupportedPointPrecision { .. } => RecoverySuggestion::ConvertArray {
                name: "points".to_string(),
                to: ScalarType::F32,
            },
            ContourError::UnsupportedScalarType { name, .. } => RecoverySuggestion::ConvertArray {
                name: name.clone(),
                to: ScalarType::F32,
            },
            ContourError::ScalarShapeMismatch { .. } => RecoverySuggestion::ProvideScalars,
            ContourError::InvalidMesh { .. } => RecoverySuggestion::RebuildMesh,
            ContourError::ThreadPool { .. } => RecoverySuggestion::ReduceThreads,
            ContourError::ScalarTree { .. } => RecoverySuggestion::DisableScalarTree,
            ContourError::InvalidParams { .. } | ContourError::ConfigParse { .. } => {
                RecoverySuggestion::None
            }
        }
    }

    // Constructor helpers

    /// Create a missing scalars error.
    pub fn missing_scalars(requested: Option<&str>) -> Self {
        ContourError::MissingScalars {
            requested: requested.map(str::to_string),
        }
    }

    /// Create an invalid mesh error.
    pub fn invalid_mesh(details: impl Into<String>) -> Self {
        ContourError::InvalidMesh {
            details: details.into(),
        }
    }

    /// Create an invalid params error.
    pub fn invalid_params(details: impl Into<String>) -> Self {
        ContourError::InvalidParams {
            details: details.into(),
            param_name: None,
        }
    }

    /// Create an invalid params error naming the offending parameter.
    pub fn invalid_param(name: impl Into<String>, details: impl Into<String>) -> Self {
        ContourError::InvalidParams {
            details: details.into(),
            param_name: Some(name.into()),
        }
    }

    /// Create a scalar tree error.
    pub fn scalar_tree(details: impl Into<String>) -> Self {
        ContourError::ScalarTree {
            details: details.into(),
        }
    }

    /// Create a configuration parse error.
    pub fn config_parse(details: impl Into<String>) -> Self {
        ContourError::ConfigParse {
            details: details.into(),
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for ContourError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        ContourError::ThreadPool {
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ContourErrorCode::MissingScalars.as_str(),
            "CONTOUR-1001"
        );
        assert_eq!(
            ContourErrorCode::UnsupportedPointPrecision.as_str(),
            "CONTOUR-1002"
        );
        assert_eq!(ContourErrorCode::ThreadPool.as_str(), "CONTOUR-2001");
        assert_eq!(ContourErrorCode::ConfigParse.to_string(), "CONTOUR-3002");
    }

    #[test]
    fn test_error_code_mapping() {
        let err = ContourError::missing_scalars(Some("pressure"));
        assert_eq!(err.code(), ContourErrorCode::MissingScalars);

        let err = ContourError::UnsupportedPointPrecision {
            found: ScalarType::I32,
        };
        assert_eq!(err.code(), ContourErrorCode::UnsupportedPointPrecision);

        let err = ContourError::invalid_param("num_threads", "must be positive");
        assert_eq!(err.code(), ContourErrorCode::InvalidParams);
    }

    #[test]
    fn test_error_display() {
        let err = ContourError::missing_scalars(Some("pressure"));
        assert_eq!(
            err.to_string(),
            "no point scalars to contour (requested 'pressure')"
        );

        let err = ContourError::missing_scalars(None);
        assert_eq!(err.to_string(), "no point scalars to contour");

        let err = ContourError::UnsupportedScalarType {
            name: "flags".to_string(),
            found: ScalarType::U8,
        };
        assert!(err.to_string().contains("flags"));
        assert!(err.to_string().contains("u8"));
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = ContourError::UnsupportedScalarType {
            name: "flags".to_string(),
            found: ScalarType::I64,
        };
        assert_eq!(
            err.recovery_suggestion(),
            RecoverySuggestion::ConvertArray {
                name: "flags".to_string(),
                to: ScalarType::F32,
            }
        );

        let err = ContourError::scalar_tree("empty bins");
        assert_eq!(
            err.recovery_suggestion(),
            RecoverySuggestion::DisableScalarTree
        );
        assert!(err.recovery_suggestion().to_string().contains("full cell scan"));
    }
}
