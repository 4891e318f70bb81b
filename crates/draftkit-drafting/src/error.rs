//! Error types for drawing generation.

use draftkit_mesh::MeshError;
use thiserror::Error;

use crate::pipeline::Stage;

/// Errors that can occur while generating a drawing.
///
/// Cancellation is not an error; see [`crate::Outcome`].
#[derive(Error, Debug)]
pub enum DraftingError {
    /// The input failed validation at a pipeline stage.
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// Stage that rejected the input.
        stage: Stage,
        /// Underlying mesh error.
        #[source]
        source: MeshError,
    },

    /// Configuration values out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file is not valid TOML for [`crate::DraftingConfig`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A view name that does not match any orientation.
    #[error("unknown view '{0}'")]
    UnknownView(String),

    /// The background worker panicked.
    #[error("drawing worker panicked")]
    WorkerPanicked,
}

impl DraftingError {
    /// Stage name for fatal input errors, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DraftingError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type for drafting operations.
pub type Result<T> = std::result::Result<T, DraftingError>;
