//! Mesh topology queries.
//!
//! Builds the per-face geometry (unit normal, area, centroid) and the
//! edge-to-face index that every later stage queries: feature-edge
//! extraction reads dihedral angles from it, and the projection engine
//! uses it to classify edge visibility.

use draftkit_math::{Point3, Vec3};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::Result;
use crate::mesh::{face_edges, EdgeKey, Mesh};

/// Cross products shorter than this are treated as zero-area faces.
const DEGENERATE_AREA: f64 = 1e-14;

/// How many faces share an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Exactly one adjacent face.
    Boundary,
    /// Exactly two adjacent faces.
    Manifold,
    /// Three or more adjacent faces. Treated as interior everywhere.
    NonManifold,
}

/// Precomputed topology and face geometry for a [`Mesh`].
///
/// Built once per mesh and shared by reference; nothing downstream mutates it.
#[derive(Debug, Clone)]
pub struct MeshTopology {
    face_normals: Vec<Vec3>,
    face_areas: Vec<f64>,
    face_centroids: Vec<Point3>,
    /// Edge -> adjacent faces, in order of first appearance.
    edge_faces: IndexMap<EdgeKey, Vec<u32>>,
}

impl MeshTopology {
    /// Build topology for `mesh` in a single pass over its faces.
    ///
    /// The mesh is re-validated first; an out-of-range index is a fatal error.
    pub fn build(mesh: &Mesh) -> Result<Self> {
        mesh.validate()?;

        let n = mesh.num_faces();
        let mut face_normals = Vec::with_capacity(n);
        let mut face_areas = Vec::with_capacity(n);
        let mut face_centroids = Vec::with_capacity(n);
        let mut edge_faces: IndexMap<EdgeKey, Vec<u32>> = IndexMap::with_capacity(n * 3 / 2);

        for (f, face) in mesh.faces().iter().enumerate() {
            let [v0, v1, v2] = mesh.triangle(f);
            let cross = (v1 - v0).cross(&(v2 - v0));
            let len = cross.norm();
            if len > DEGENERATE_AREA {
                face_normals.push(cross / len);
            } else {
                face_normals.push(Vec3::zeros());
            }
            face_areas.push(len / 2.0);
            face_centroids.push(Point3::from((v0.coords + v1.coords + v2.coords) / 3.0));

            for e in face_edges(face) {
                edge_faces.entry(e).or_default().push(f as u32);
            }
        }

        let topo = Self {
            face_normals,
            face_areas,
            face_centroids,
            edge_faces,
        };
        debug!(
            faces = n,
            edges = topo.num_edges(),
            boundary = topo.num_boundary_edges(),
            non_manifold = topo.num_non_manifold_edges(),
            "built mesh topology"
        );
        Ok(topo)
    }

    /// Number of faces.
    pub fn num_faces(&self) -> usize {
        self.face_normals.len()
    }

    /// Number of distinct edges.
    pub fn num_edges(&self) -> usize {
        self.edge_faces.len()
    }

    /// Unit normals, one per face. Degenerate faces have a zero vector.
    pub fn face_normals(&self) -> &[Vec3] {
        &self.face_normals
    }

    /// Unit normal of face `f`.
    pub fn face_normal(&self, f: usize) -> Vec3 {
        self.face_normals[f]
    }

    /// Area of face `f`.
    pub fn face_area(&self, f: usize) -> f64 {
        self.face_areas[f]
    }

    /// Centroid of face `f`.
    pub fn face_centroid(&self, f: usize) -> Point3 {
        self.face_centroids[f]
    }

    /// Sum of all face areas.
    pub fn surface_area(&self) -> f64 {
        self.face_areas.iter().sum()
    }

    /// Faces adjacent to `edge`. Empty if the edge is not part of the mesh.
    pub fn adjacent_faces(&self, edge: EdgeKey) -> &[u32] {
        self.edge_faces.get(&edge).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Classify an edge by its face count. `None` if the edge is not in the mesh.
    pub fn edge_kind(&self, edge: EdgeKey) -> Option<EdgeKind> {
        match self.adjacent_faces(edge).len() {
            0 => None,
            1 => Some(EdgeKind::Boundary),
            2 => Some(EdgeKind::Manifold),
            _ => Some(EdgeKind::NonManifold),
        }
    }

    /// Iterate over every edge and its adjacent faces.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeKey, &[u32])> {
        self.edge_faces.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Edges with exactly one adjacent face.
    pub fn boundary_edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edges()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(e, _)| e)
    }

    /// Number of boundary edges.
    pub fn num_boundary_edges(&self) -> usize {
        self.boundary_edges().count()
    }

    /// Number of edges shared by more than two faces.
    pub fn num_non_manifold_edges(&self) -> usize {
        self.edge_faces.values().filter(|f| f.len() > 2).count()
    }

    /// Closed two-manifold: every edge has exactly two faces.
    pub fn is_watertight(&self) -> bool {
        !self.edge_faces.is_empty() && self.edge_faces.values().all(|f| f.len() == 2)
    }

    /// Largest angle in radians between the normals of faces sharing `edge`.
    ///
    /// `None` for boundary edges and edges not in the mesh. Non-manifold
    /// edges report the widest pair.
    pub fn dihedral_angle(&self, edge: EdgeKey) -> Option<f64> {
        let faces = self.adjacent_faces(edge);
        if faces.len() < 2 {
            return None;
        }
        let mut widest: f64 = 0.0;
        for (i, &a) in faces.iter().enumerate() {
            for &b in &faces[i + 1..] {
                widest = widest.max(self.normal_angle(a as usize, b as usize));
            }
        }
        Some(widest)
    }

    /// Angle in radians between the normals of two faces.
    pub fn normal_angle(&self, a: usize, b: usize) -> f64 {
        self.face_normals[a]
            .dot(&self.face_normals[b])
            .clamp(-1.0, 1.0)
            .acos()
    }

    /// Faces sharing at least one edge with face `f`, excluding `f`, sorted.
    pub fn face_adjacency(&self, mesh: &Mesh, f: usize) -> Vec<u32> {
        let mut adjacent: Vec<u32> = face_edges(&mesh.faces()[f])
            .iter()
            .flat_map(|e| self.adjacent_faces(*e).iter().copied())
            .filter(|&g| g as usize != f)
            .collect();
        adjacent.sort_unstable();
        adjacent.dedup();
        adjacent
    }
}
