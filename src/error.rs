//! Error types for texelgrid.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type is
//! [`MeshError`]. Stitching rejections have their own [`StitchingError`] so the
//! orchestrator can tell an expected geometric mismatch apart from a real failure.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while building, validating or unwrapping a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has fewer than three corners, repeats a vertex, or has no
    /// measurable edge.
    #[error("face {face} is degenerate")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// Two distinct vertices share the exact same position.
    #[error("vertices {first} and {second} share position {position:?}; merge duplicates first")]
    DuplicateVertex {
        /// The vertex seen first.
        first: usize,
        /// The vertex that duplicates it.
        second: usize,
        /// The shared position.
        position: [f64; 3],
    },

    /// A face lists an aligned edge for which no correction direction exists.
    #[error("face {face} reports aligned edge {edge} but it has no usable extent along its axis")]
    AlignmentInvariant {
        /// The face index.
        face: usize,
        /// The edge (starting corner) index.
        edge: usize,
    },

    /// A stitch attempt was rejected.
    #[error("stitching failed: {0}")]
    Stitching(#[from] StitchingError),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Configuration could not be parsed or written.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid mesh state for the requested operation.
    #[error("invalid mesh state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}

/// Reasons a face could not be stitched onto a solved neighbor.
///
/// These are expected during a run: the orchestrator falls back to the next
/// neighbor, to vertex stitching, or to a new island.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StitchingError {
    /// The faces share no edge.
    #[error("faces {face} and {neighbor} have no common edge")]
    NoCommonEdge {
        /// The face being placed.
        face: usize,
        /// The solved neighbor.
        neighbor: usize,
    },

    /// Vertex stitching was requested for faces that share an edge.
    #[error("faces {face} and {neighbor} share an edge and must be stitched by edge")]
    SharesEdge {
        /// The face being placed.
        face: usize,
        /// The solved neighbor.
        neighbor: usize,
    },

    /// The faces share no vertex.
    #[error("faces {face} and {neighbor} have no common vertex")]
    NoCommonVertex {
        /// The face being placed.
        face: usize,
        /// The solved neighbor.
        neighbor: usize,
    },

    /// The shared edge has a different UV length on each face.
    #[error("shared edge is {length} long on face {face} but {neighbor_length} on its neighbor")]
    EdgeLengthMismatch {
        /// The face being placed.
        face: usize,
        /// UV length on the face being placed.
        length: f64,
        /// UV length on the neighbor.
        neighbor_length: f64,
    },

    /// No multiple of 90° aligns the two UV edges.
    #[error("no quarter turn aligns the shared UV edge of face {face}")]
    NoAlignedRotation {
        /// The face being placed.
        face: usize,
    },

    /// After the transform the far corner of the shared edge does not meet the neighbor.
    #[error("shared edge of face {face} does not line up with face {neighbor}")]
    SharedEdgeMisaligned {
        /// The face being placed.
        face: usize,
        /// The solved neighbor.
        neighbor: usize,
    },

    /// The transformed face would overlap a face already in the island.
    #[error("face {face} would overlap face {other} in UV space")]
    Overlap {
        /// The face being placed.
        face: usize,
        /// The island face it collides with.
        other: usize,
    },
}
