//! Projection of feature edges with visibility classification.
//!
//! Visibility comes from face orientation alone: a face is front-facing when
//! its rotated normal points toward the viewer. An edge inherits visibility
//! from its adjacent faces, and lies on the silhouette when those faces
//! disagree. No ray casting is done, so an edge behind another part of a
//! non-convex solid can still be reported visible.

use std::collections::BTreeMap;

use draftkit_math::{pack_points, pack_vectors, Points3};
use draftkit_mesh::{EdgeKey, Mesh, MeshTopology};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::projection::{Mirror, ViewMatrix};
use crate::types::{ProjectedEdge, ProjectedView, ViewOrientation, Visibility};

/// Projection tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionSettings {
    /// Edges shorter than this after projection are dropped.
    pub degenerate_epsilon: f64,
    /// Drawing-wide mirroring.
    pub mirror: Mirror,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            degenerate_epsilon: 1e-3,
            mirror: Mirror::default(),
        }
    }
}

/// Projects a mesh's feature edges into any standard view.
///
/// Vertex positions and face normals are packed once at construction; each
/// view then costs one 3x3 by 3xN multiply per block plus a pass over the
/// retained edges.
pub struct ProjectionEngine<'a> {
    topology: &'a MeshTopology,
    edges: Vec<EdgeKey>,
    positions: Points3,
    normals: Points3,
    settings: ProjectionSettings,
}

impl<'a> ProjectionEngine<'a> {
    /// Engine drawing `edges` of `mesh`.
    ///
    /// Keys naming a vertex outside `mesh` are dropped with a warning.
    pub fn new(mesh: &Mesh, topology: &'a MeshTopology, mut edges: Vec<EdgeKey>) -> Self {
        let n = mesh.num_vertices();
        let before = edges.len();
        edges.retain(|e| (e.v0() as usize) < n && (e.v1() as usize) < n);
        if edges.len() < before {
            warn!(dropped = before - edges.len(), vertices = n, "edge keys out of range");
        }
        Self {
            topology,
            edges,
            positions: pack_points(mesh.vertices()),
            normals: pack_vectors(topology.face_normals()),
            settings: ProjectionSettings::default(),
        }
    }

    /// Replace the projection settings.
    pub fn with_settings(mut self, settings: ProjectionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Number of edges considered per view.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Project every retained edge into `orientation`.
    pub fn project_view(&self, orientation: ViewOrientation) -> ProjectedView {
        let basis = ViewMatrix::with_mirror(orientation, self.settings.mirror);
        let positions = basis.rotate(&self.positions);
        let normals = basis.rotate(&self.normals);
        let front_facing: Vec<bool> = normals.row(2).iter().map(|&z| z > 0.0).collect();

        let mut view = ProjectedView::new(orientation);
        let mut dropped = 0usize;
        for &edge in &self.edges {
            let (visible, silhouette) = classify(self.topology.adjacent_faces(edge), &front_facing);

            let a = positions.column(edge.v0() as usize);
            let b = positions.column(edge.v1() as usize);
            let projected = ProjectedEdge {
                start: basis.to_view_plane(a[0], a[1]),
                end: basis.to_view_plane(b[0], b[1]),
                visibility: if visible {
                    Visibility::Visible
                } else {
                    Visibility::Hidden
                },
                silhouette,
                depth: (a[2] + b[2]) / 2.0,
                edge,
            };
            if projected.is_degenerate(self.settings.degenerate_epsilon) {
                dropped += 1;
                continue;
            }
            view.add_edge(projected);
        }

        debug!(
            view = %orientation,
            edges = view.edges.len(),
            visible = view.num_visible(),
            dropped,
            "projected view"
        );
        view
    }

    /// Project all seven views in parallel.
    pub fn project_all_views(&self) -> BTreeMap<ViewOrientation, ProjectedView> {
        ViewOrientation::ALL[..]
            .par_iter()
            .map(|&v| (v, self.project_view(v)))
            .collect()
    }
}

/// `(visible, silhouette)` for an edge with the given adjacent faces.
fn classify(faces: &[u32], front_facing: &[bool]) -> (bool, bool) {
    match faces {
        [] => (false, false),
        [f] => (front_facing[*f as usize], true),
        _ => {
            let front = faces.iter().filter(|&&f| front_facing[f as usize]).count();
            (front > 0, front > 0 && front < faces.len())
        }
    }
}
