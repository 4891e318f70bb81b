//! Error types for mesh construction and simplification.

use thiserror::Error;

/// Errors that can occur while building or simplifying a mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    FaceIndexOutOfRange {
        /// Offending face.
        face: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A vertex has a NaN or infinite coordinate.
    #[error("vertex {index} has a non-finite coordinate")]
    NonFiniteVertex {
        /// Offending vertex.
        index: usize,
    },

    /// A flat buffer did not hold whole triples.
    #[error("flat buffer length {0} is not a multiple of 3")]
    RaggedBuffer(usize),

    /// Invalid simplification settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Decimation produced an unusable mesh.
    #[error("decimation failed: {0}")]
    DecimationFailed(String),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
