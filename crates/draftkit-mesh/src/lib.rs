#![warn(missing_docs)]

//! Triangle meshes for the draftkit drawing generator.
//!
//! This crate owns everything that happens before projection:
//!
//! - [`Mesh`]: validated vertex and face buffers
//! - [`MeshTopology`]: face normals, areas and the edge-to-face index
//! - [`extract_feature_edges`]: boundary and crease edges worth drawing
//! - [`decimate`]: quadric edge-collapse simplification
//! - [`primitives`]: sample solids
//!
//! # Example
//!
//! ```
//! use draftkit_mesh::{extract_feature_edges, primitives, FeatureEdgeSettings, MeshTopology};
//!
//! let mesh = primitives::cube(10.0);
//! let topology = MeshTopology::build(&mesh).unwrap();
//! let edges = extract_feature_edges(&mesh, &topology, &FeatureEdgeSettings::default());
//! assert_eq!(edges.len(), 12);
//! ```

mod decimate;
mod error;
mod features;
mod mesh;
pub mod primitives;
mod topology;

pub use decimate::{decimate, DecimationSettings};
pub use error::{MeshError, Result};
pub use features::{extract_feature_edges, FeatureEdge, FeatureEdgeSettings, FeatureKind};
pub use mesh::{face_edges, EdgeKey, Mesh, RealExtents};
pub use topology::{EdgeKind, MeshTopology};
