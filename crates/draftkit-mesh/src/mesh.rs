//! Indexed triangle mesh and edge keys.

use draftkit_math::{Point3, Vec3};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};

/// An undirected mesh edge, stored with the smaller vertex index first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey(pub u32, pub u32);

impl EdgeKey {
    /// Create a canonical edge key from two vertex indices in any order.
    pub fn new(a: u32, b: u32) -> Self {
        if a < b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// Smaller vertex index.
    pub fn v0(&self) -> u32 {
        self.0
    }

    /// Larger vertex index.
    pub fn v1(&self) -> u32 {
        self.1
    }
}

/// The three edges of a face, in winding order.
pub fn face_edges(face: &[u32; 3]) -> [EdgeKey; 3] {
    [
        EdgeKey::new(face[0], face[1]),
        EdgeKey::new(face[1], face[2]),
        EdgeKey::new(face[2], face[0]),
    ]
}

/// Real-world size of the part along each model axis.
///
/// `width` is the X span, `height` the Y span and `depth` the Z span.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RealExtents {
    /// Span along X.
    pub width: f64,
    /// Span along Y.
    pub height: f64,
    /// Span along Z.
    pub depth: f64,
}

impl RealExtents {
    /// Create extents from explicit spans.
    pub fn new(width: f64, height: f64, depth: f64) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }
}

/// A triangle mesh: vertex positions plus CCW-wound index triples.
///
/// Construction through [`Mesh::new`] or [`Mesh::from_flat`] validates that
/// every face index is in range and every coordinate is finite. Degenerate
/// (zero-area) faces are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Point3>,
    faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create a validated mesh.
    pub fn new(vertices: Vec<Point3>, faces: Vec<[u32; 3]>) -> Result<Self> {
        let mesh = Self { vertices, faces };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Create a validated mesh from flat `[x, y, z, ...]` and `[i0, i1, i2, ...]` buffers.
    pub fn from_flat(positions: &[f32], indices: &[u32]) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(MeshError::RaggedBuffer(positions.len()));
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::RaggedBuffer(indices.len()));
        }
        let vertices = positions
            .chunks_exact(3)
            .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
            .collect();
        let faces = indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect();
        Self::new(vertices, faces)
    }

    /// Assemble a mesh whose indices are valid by construction.
    pub(crate) fn from_parts(vertices: Vec<Point3>, faces: Vec<[u32; 3]>) -> Self {
        let mesh = Self { vertices, faces };
        debug_assert!(mesh.validate().is_ok());
        mesh
    }

    /// An empty mesh.
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Check index ranges and coordinate finiteness.
    pub fn validate(&self) -> Result<()> {
        if let Some(index) = self
            .vertices
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(MeshError::NonFiniteVertex { index });
        }
        let vertex_count = self.vertices.len();
        for (face, tri) in self.faces.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(MeshError::FaceIndexOutOfRange {
                    face,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Vertex positions.
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Face index triples.
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Whether the mesh has no faces.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Position of vertex `i`.
    pub fn vertex(&self, i: u32) -> Point3 {
        self.vertices[i as usize]
    }

    /// Corner positions of face `f`.
    pub fn triangle(&self, f: usize) -> [Point3; 3] {
        let [a, b, c] = self.faces[f];
        [self.vertex(a), self.vertex(b), self.vertex(c)]
    }

    /// Length of an edge in model space.
    pub fn edge_length(&self, edge: EdgeKey) -> f64 {
        (self.vertex(edge.1) - self.vertex(edge.0)).norm()
    }

    /// Every distinct edge, in order of first appearance while walking the faces.
    pub fn unique_edges(&self) -> Vec<EdgeKey> {
        let mut set = IndexSet::with_capacity(self.faces.len() * 3 / 2);
        for face in &self.faces {
            for e in face_edges(face) {
                set.insert(e);
            }
        }
        set.into_iter().collect()
    }

    /// Axis-aligned bounds `(min, max)`, or `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<(Point3, Point3)> {
        let first = *self.vertices.first()?;
        let (min, max) = self
            .vertices
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.inf(p), hi.sup(p)));
        Some((min, max))
    }

    /// Bounding-box spans along X, Y and Z.
    pub fn extents(&self) -> RealExtents {
        match self.bounds() {
            Some((min, max)) => {
                let d: Vec3 = max - min;
                RealExtents::new(d.x, d.y, d.z)
            }
            None => RealExtents::default(),
        }
    }
}
