#![warn(missing_docs)]

//! Multi-view technical drawings from triangle meshes.
//!
//! This crate turns a mesh into six orthographic views plus an isometric
//! one, including:
//!
//! - **Projection**: feature edges mapped into each view with visible/hidden
//!   and silhouette flags
//! - **Arc fitting**: circles and arcs recovered from chains of projected edges
//! - **Dimensioning**: overall sizes and circle callouts, stacked in layers so
//!   they do not collide
//! - **Pipeline**: all of the above in one call, with progress checkpoints and
//!   cooperative cancellation
//!
//! # Example
//!
//! ```
//! use draftkit_drafting::{generate_drawing, DraftingConfig, NoProgress, ViewOrientation};
//! use draftkit_mesh::primitives;
//!
//! let mesh = primitives::cube(10.0);
//! let drawing = generate_drawing(&mesh, &DraftingConfig::default(), &NoProgress)
//!     .unwrap()
//!     .completed()
//!     .unwrap();
//!
//! let (front, dims) = drawing.view(ViewOrientation::Front).unwrap();
//! assert_eq!(front.visible_edges().filter(|e| e.silhouette).count(), 4);
//! assert_eq!(dims.len(), 2);
//! ```

pub mod arc_fit;
pub mod chain;
mod config;
pub mod dimension;
mod error;
pub mod features;
pub mod hidden_line;
mod pipeline;
pub mod placement;
pub mod projection;
pub mod types;

pub use arc_fit::{ArcFitSettings, ArcFitter};
pub use config::DraftingConfig;
pub use dimension::{Dimension, DimensionKind, LabelFormat};
pub use error::{DraftingError, Result};
pub use features::{detect_features, dimension_view, DetectedFeatures};
pub use hidden_line::{ProjectionEngine, ProjectionSettings};
pub use pipeline::{
    generate_drawing, generate_drawing_with_extents, generate_drawing_with_simplifier,
    join_drawing, spawn_drawing, CancelFlag, Drawing, DrawingStats, NoProgress, Outcome,
    ProgressSink, Simplifier, Stage,
};
pub use placement::{angle_between, view_extents, DimensionPlacer, DimensionStyle};
pub use projection::{Mirror, ViewMatrix};
pub use types::{
    BoundingBox2D, Circle2D, Point2D, ProjectedEdge, ProjectedView, Segment2D, ViewOrientation,
    Visibility,
};
