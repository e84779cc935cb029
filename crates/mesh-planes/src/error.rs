//! Error types for plane detection with rich diagnostics.
//!
//! Each error carries:
//! - A machine-readable error code
//! - Optional location information (file, vertex, face)
//! - A recovery suggestion
//! - Terminal-friendly display via miette
//!
//! # Error Codes
//!
//! Codes have the form `PLANE-XXXX`:
//! - `PLANE-1xxx`: I/O errors (reading, parsing, unsupported formats)
//! - `PLANE-2xxx`: Configuration errors
//! - `PLANE-3xxx`: Mesh data errors (empty fragments, bad indices, NaN coordinates)
//! - `PLANE-4xxx`: Analysis errors
//!
//! # Example
//!
//! ```
//! use mesh_planes::{ErrorCode, PlaneError};
//!
//! let err = PlaneError::invalid_config("target_plane_count", 0, "must be at least 1");
//! assert_eq!(err.code(), ErrorCode::InvalidConfig);
//! assert_eq!(err.code().as_str(), "PLANE-2001");
//! ```

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for plane detection operations.
pub type PlaneResult<T> = Result<T, PlaneError>;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // I/O errors (1xxx)
    /// PLANE-1001: Failed to read file
    IoRead = 1001,
    /// PLANE-1002: Failed to parse file
    ParseError = 1002,
    /// PLANE-1003: Unsupported file format
    UnsupportedFormat = 1003,

    // Configuration errors (2xxx)
    /// PLANE-2001: Configuration value out of range
    InvalidConfig = 2001,

    // Mesh data errors (3xxx)
    /// PLANE-3001: Fragment has no vertices
    EmptyMesh = 3001,
    /// PLANE-3002: Face references a vertex that does not exist
    InvalidVertexIndex = 3002,
    /// PLANE-3003: Vertex has a NaN or infinite coordinate
    InvalidCoordinate = 3003,
    /// PLANE-3004: Vertex count exceeds the 32-bit index range
    MeshTooLarge = 3004,

    // Analysis errors (4xxx)
    /// PLANE-4001: Analysis cancelled by a progress callback
    Cancelled = 4001,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `PLANE-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IoRead => "PLANE-1001",
            ErrorCode::ParseError => "PLANE-1002",
            ErrorCode::UnsupportedFormat => "PLANE-1003",
            ErrorCode::InvalidConfig => "PLANE-2001",
            ErrorCode::EmptyMesh => "PLANE-3001",
            ErrorCode::InvalidVertexIndex => "PLANE-3002",
            ErrorCode::InvalidCoordinate => "PLANE-3003",
            ErrorCode::MeshTooLarge => "PLANE-3004",
            ErrorCode::Cancelled => "PLANE-4001",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for plane detection errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Re-export the scan from the capture software.
    ReexportFile { format: Option<String> },
    /// Use a different file format.
    UseDifferentFormat { suggested: Vec<String> },
    /// Check the source mesh for issues.
    CheckSourceMesh { checks: Vec<String> },
    /// Adjust configuration parameters.
    AdjustParameters { parameters: Vec<(String, String)> },
    /// No automatic recovery available.
    None,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::ReexportFile { format } => {
                if let Some(fmt) = format {
                    write!(f, "Try re-exporting the scan as {}", fmt)
                } else {
                    write!(f, "Try re-exporting the scan from the capture software")
                }
            }
            RecoverySuggestion::UseDifferentFormat { suggested } => {
                write!(f, "Try using a different format: {}", suggested.join(", "))
            }
            RecoverySuggestion::CheckSourceMesh { checks } => {
                write!(f, "Check the source mesh for: {}", checks.join(", "))
            }
            RecoverySuggestion::AdjustParameters { parameters } => {
                let params: Vec<String> = parameters
                    .iter()
                    .map(|(k, v)| format!("{} = {}", k, v))
                    .collect();
                write!(f, "Try adjusting: {}", params.join(", "))
            }
            RecoverySuggestion::None => {
                write!(f, "No automatic recovery available")
            }
        }
    }
}

/// Location information for errors.
#[derive(Debug, Clone)]
pub enum ErrorLocation {
    /// Error at a specific vertex of a fragment.
    Vertex { index: usize },
    /// Error at a specific face of a fragment.
    Face { index: usize },
    /// Error in a file.
    File { path: PathBuf },
}

impl std::fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorLocation::Vertex { index } => write!(f, "vertex {}", index),
            ErrorLocation::Face { index } => write!(f, "face {}", index),
            ErrorLocation::File { path } => write!(f, "{}", path.display()),
        }
    }
}

/// Errors that can occur while loading scans or detecting planes.
#[derive(Debug, Error, Diagnostic)]
pub enum PlaneError {
    /// Error reading from a file.
    #[error("failed to read mesh from {path}")]
    #[diagnostic(
        code(planes::io::read),
        help("Check that the file exists and is readable")
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing a mesh file.
    #[error("failed to parse mesh from {path}: {details}")]
    #[diagnostic(
        code(planes::parse::error),
        help("The file may be corrupted. Try re-exporting the scan.")
    )]
    ParseError { path: PathBuf, details: String },

    /// Unsupported file format.
    #[error("unsupported mesh format: {extension:?}")]
    #[diagnostic(code(planes::format::unsupported), help("Supported formats: OBJ"))]
    UnsupportedFormat { extension: Option<String> },

    /// Configuration value rejected at load time.
    #[error("invalid configuration: {parameter} = {value} ({reason})")]
    #[diagnostic(
        code(planes::config::invalid),
        help("Tolerances must be finite and non-negative, angles within [0, 90] degrees")
    )]
    InvalidConfig {
        parameter: &'static str,
        value: String,
        reason: String,
    },

    /// Fragment without geometry.
    #[error("mesh is empty: {details}")]
    #[diagnostic(code(planes::mesh::empty))]
    EmptyMesh { details: String },

    /// Face references a vertex that does not exist.
    #[error(
        "invalid vertex index: face {face_index} references vertex {vertex_index}, but fragment only has {vertex_count} vertices"
    )]
    #[diagnostic(code(planes::mesh::vertex_index))]
    InvalidVertexIndex {
        face_index: usize,
        vertex_index: u32,
        vertex_count: usize,
    },

    /// Vertex coordinate is NaN or infinite.
    #[error("invalid coordinate at vertex {vertex_index}: {coordinate} is {value}")]
    #[diagnostic(code(planes::mesh::coordinate))]
    InvalidCoordinate {
        vertex_index: usize,
        coordinate: &'static str,
        value: f64,
    },

    /// Merged geometry cannot be addressed with 32-bit indices.
    #[error("mesh too large: {vertex_count} vertices exceed the 32-bit index range")]
    #[diagnostic(
        code(planes::mesh::too_large),
        help("Analyze the file's objects as separate fragments instead of merging them")
    )]
    MeshTooLarge { vertex_count: usize },

    /// A progress callback asked to stop.
    #[error("analysis cancelled during {stage}")]
    #[diagnostic(code(planes::analysis::cancelled))]
    Cancelled { stage: String },
}

impl PlaneError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            PlaneError::IoRead { .. } => ErrorCode::IoRead,
            PlaneError::ParseError { .. } => ErrorCode::ParseError,
            PlaneError::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            PlaneError::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            PlaneError::EmptyMesh { .. } => ErrorCode::EmptyMesh,
            PlaneError::InvalidVertexIndex { .. } => ErrorCode::InvalidVertexIndex,
            PlaneError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
            PlaneError::MeshTooLarge { .. } => ErrorCode::MeshTooLarge,
            PlaneError::Cancelled { .. } => ErrorCode::Cancelled,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            PlaneError::IoRead { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["file exists".into(), "file permissions".into()],
            },
            PlaneError::ParseError { .. } => RecoverySuggestion::ReexportFile {
                format: Some("OBJ".into()),
            },
            PlaneError::UnsupportedFormat { .. } => RecoverySuggestion::UseDifferentFormat {
                suggested: vec!["OBJ".into()],
            },
            PlaneError::InvalidConfig { parameter, .. } => RecoverySuggestion::AdjustParameters {
                parameters: vec![((*parameter).into(), "use a value within range".into())],
            },
            PlaneError::EmptyMesh { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["scan has geometry".into(), "export settings".into()],
            },
            PlaneError::InvalidVertexIndex { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["triangle indices".into()],
            },
            PlaneError::InvalidCoordinate { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["coordinate values".into(), "export precision".into()],
            },
            PlaneError::MeshTooLarge { .. } => RecoverySuggestion::CheckSourceMesh {
                checks: vec!["object count".into(), "scan resolution".into()],
            },
            PlaneError::Cancelled { .. } => RecoverySuggestion::None,
        }
    }

    /// Returns location information if available.
    pub fn location(&self) -> Option<ErrorLocation> {
        match self {
            PlaneError::IoRead { path, .. } | PlaneError::ParseError { path, .. } => {
                Some(ErrorLocation::File { path: path.clone() })
            }
            PlaneError::InvalidVertexIndex { face_index, .. } => {
                Some(ErrorLocation::Face { index: *face_index })
            }
            PlaneError::InvalidCoordinate { vertex_index, .. } => Some(ErrorLocation::Vertex {
                index: *vertex_index,
            }),
            _ => None,
        }
    }

    /// Create an IoRead error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlaneError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create a ParseError.
    pub fn parse_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        PlaneError::ParseError {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(
        parameter: &'static str,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        PlaneError::InvalidConfig {
            parameter,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an EmptyMesh error.
    pub fn empty_mesh(details: impl Into<String>) -> Self {
        PlaneError::EmptyMesh {
            details: details.into(),
        }
    }

    /// Create an InvalidVertexIndex error.
    pub fn invalid_vertex_index(face_index: usize, vertex_index: u32, vertex_count: usize) -> Self {
        PlaneError::InvalidVertexIndex {
            face_index,
            vertex_index,
            vertex_count,
        }
    }

    /// Create an InvalidCoordinate error.
    pub fn invalid_coordinate(vertex_index: usize, coordinate: &'static str, value: f64) -> Self {
        PlaneError::InvalidCoordinate {
            vertex_index,
            coordinate,
            value,
        }
    }
}
