//! Quadric error metric edge-collapse decimation.
//!
//! Dense scans carry far more triangles than a drawing needs. Collapsing the
//! cheapest edges first (cost measured by the summed squared distance to the
//! planes of the original faces around each vertex) flattens noise on smooth
//! regions while sharp creases, whose quadrics disagree, survive.
//!
//! Boundary vertices are pinned so open outlines keep their shape.

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};

use draftkit_math::{Mat3, Point3, Vec3};
use nalgebra::{Matrix4, Vector4};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MeshError, Result};
use crate::mesh::{face_edges, EdgeKey, Mesh};
use crate::topology::MeshTopology;

/// Determinants below this are treated as singular when solving for the
/// optimal collapse position.
const SINGULAR_DET: f64 = 1e-10;

/// How far a decimation pass should go.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecimationSettings {
    /// Fraction of triangles to keep, in `(0, 1]`.
    pub target_ratio: f64,
    /// Never reduce below this many triangles.
    pub min_triangles: usize,
}

impl Default for DecimationSettings {
    fn default() -> Self {
        Self {
            target_ratio: 0.3,
            min_triangles: 100,
        }
    }
}

impl DecimationSettings {
    /// Reject ratios outside `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !(self.target_ratio > 0.0 && self.target_ratio <= 1.0) {
            return Err(MeshError::InvalidSettings(format!(
                "decimation target_ratio must be in (0, 1], got {}",
                self.target_ratio
            )));
        }
        Ok(())
    }

    /// Triangle count a mesh with `faces` triangles is reduced to.
    pub fn target_for(&self, faces: usize) -> usize {
        let scaled = (faces as f64 * self.target_ratio) as usize;
        self.min_triangles.max(scaled)
    }
}

/// Symmetric 4x4 plane quadric.
#[derive(Debug, Clone, Copy)]
struct Quadric(Matrix4<f64>);

impl Quadric {
    fn zero() -> Self {
        Self(Matrix4::zeros())
    }

    /// Quadric of the plane through `point` with unit `normal`.
    fn from_plane(normal: &Vec3, point: &Point3) -> Self {
        let p = Vector4::new(normal.x, normal.y, normal.z, -normal.dot(&point.coords));
        Self(p * p.transpose())
    }

    fn add(&mut self, other: &Self) {
        self.0 += other.0;
    }

    fn evaluate(&self, p: &Point3) -> f64 {
        let v = Vector4::new(p.x, p.y, p.z, 1.0);
        (v.transpose() * self.0 * v)[(0, 0)]
    }

    /// Point minimizing the error, if the 3x3 block is well conditioned.
    fn optimal_point(&self) -> Option<Point3> {
        let a: Mat3 = self.0.fixed_view::<3, 3>(0, 0).into_owned();
        if a.determinant().abs() < SINGULAR_DET {
            return None;
        }
        let b = -self.0.fixed_view::<3, 1>(0, 3).into_owned();
        let inv = a.try_inverse()?;
        Some(Point3::from(inv * b))
    }
}

/// A collapse candidate. Stamps detect entries made stale by later collapses.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    cost: f64,
    edge: EdgeKey,
    target: Point3,
    stamps: (u32, u32),
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; ties broken by edge for deterministic output.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.edge.cmp(&self.edge))
    }
}

struct Collapser {
    positions: Vec<Point3>,
    faces: Vec<[u32; 3]>,
    face_alive: Vec<bool>,
    vertex_faces: Vec<Vec<u32>>,
    vertex_alive: Vec<bool>,
    pinned: Vec<bool>,
    quadrics: Vec<Quadric>,
    stamps: Vec<u32>,
    active_faces: usize,
}

impl Collapser {
    fn new(mesh: &Mesh, topology: &MeshTopology) -> Self {
        let n = mesh.num_vertices();
        let mut vertex_faces = vec![Vec::new(); n];
        let mut quadrics = vec![Quadric::zero(); n];
        for (f, face) in mesh.faces().iter().enumerate() {
            let normal = topology.face_normal(f);
            let plane = Quadric::from_plane(&normal, &mesh.vertex(face[0]));
            for &v in face {
                vertex_faces[v as usize].push(f as u32);
                quadrics[v as usize].add(&plane);
            }
        }

        let mut pinned = vec![false; n];
        for edge in topology.boundary_edges() {
            pinned[edge.v0() as usize] = true;
            pinned[edge.v1() as usize] = true;
        }

        Self {
            positions: mesh.vertices().to_vec(),
            faces: mesh.faces().to_vec(),
            face_alive: vec![true; mesh.num_faces()],
            vertex_faces,
            vertex_alive: vec![true; n],
            pinned,
            quadrics,
            stamps: vec![0; n],
            active_faces: mesh.num_faces(),
        }
    }

    fn candidate(&self, edge: EdgeKey) -> Option<Candidate> {
        let (a, b) = (edge.v0() as usize, edge.v1() as usize);
        if self.pinned[a] || self.pinned[b] {
            return None;
        }
        let mut q = self.quadrics[a];
        q.add(&self.quadrics[b]);
        let midpoint = Point3::from((self.positions[a].coords + self.positions[b].coords) / 2.0);
        let target = q.optimal_point().unwrap_or(midpoint);
        Some(Candidate {
            cost: q.evaluate(&target),
            edge,
            target,
            stamps: (self.stamps[a], self.stamps[b]),
        })
    }

    fn is_stale(&self, c: &Candidate) -> bool {
        let (a, b) = (c.edge.v0() as usize, c.edge.v1() as usize);
        !self.vertex_alive[a]
            || !self.vertex_alive[b]
            || self.stamps[a] != c.stamps.0
            || self.stamps[b] != c.stamps.1
    }

    fn neighbors(&self, v: u32) -> BTreeSet<u32> {
        self.vertex_faces[v as usize]
            .iter()
            .filter(|&&f| self.face_alive[f as usize])
            .flat_map(|&f| self.faces[f as usize])
            .filter(|&u| u != v)
            .collect()
    }

    /// A collapse is rejected if it would pinch the surface (more than two
    /// shared neighbors) or flip any surviving face.
    fn is_valid(&self, a: u32, b: u32, target: &Point3) -> bool {
        let shared = self.neighbors(a).intersection(&self.neighbors(b)).count();
        if shared > 2 {
            return false;
        }

        for &v in &[a, b] {
            for &f in &self.vertex_faces[v as usize] {
                if !self.face_alive[f as usize] {
                    continue;
                }
                let face = self.faces[f as usize];
                if face.contains(&a) && face.contains(&b) {
                    continue;
                }
                let before = face.map(|i| self.positions[i as usize]);
                let after = face.map(|i| {
                    if i == a || i == b {
                        *target
                    } else {
                        self.positions[i as usize]
                    }
                });
                let n0 = (before[1] - before[0]).cross(&(before[2] - before[0]));
                let n1 = (after[1] - after[0]).cross(&(after[2] - after[0]));
                if n0.dot(&n1) <= 0.0 {
                    return false;
                }
            }
        }
        true
    }

    /// Merge `b` into `a` at `target`.
    fn collapse(&mut self, a: u32, b: u32, target: Point3) {
        let (ai, bi) = (a as usize, b as usize);
        self.positions[ai] = target;
        let qb = self.quadrics[bi];
        self.quadrics[ai].add(&qb);

        let moved = std::mem::take(&mut self.vertex_faces[bi]);
        for f in moved {
            let fi = f as usize;
            if !self.face_alive[fi] {
                continue;
            }
            let face = &mut self.faces[fi];
            for idx in face.iter_mut() {
                if *idx == b {
                    *idx = a;
                }
            }
            if face[0] == face[1] || face[1] == face[2] || face[2] == face[0] {
                self.face_alive[fi] = false;
                self.active_faces -= 1;
            } else {
                self.vertex_faces[ai].push(f);
            }
        }

        let alive = &self.face_alive;
        self.vertex_faces[ai].retain(|&f| alive[f as usize]);
        self.vertex_faces[ai].sort_unstable();
        self.vertex_faces[ai].dedup();

        self.vertex_alive[bi] = false;
        self.stamps[ai] += 1;
        self.stamps[bi] += 1;
    }

    fn into_mesh(self) -> Mesh {
        let mut remap = vec![u32::MAX; self.positions.len()];
        let mut vertices = Vec::new();
        let mut faces = Vec::with_capacity(self.active_faces);
        for (face, _) in self
            .faces
            .iter()
            .zip(&self.face_alive)
            .filter(|(_, &alive)| alive)
        {
            let mapped = face.map(|v| {
                let slot = &mut remap[v as usize];
                if *slot == u32::MAX {
                    *slot = vertices.len() as u32;
                    vertices.push(self.positions[v as usize]);
                }
                *slot
            });
            faces.push(mapped);
        }
        Mesh::from_parts(vertices, faces)
    }
}

/// Reduce `mesh` to roughly [`DecimationSettings::target_for`] triangles.
///
/// Meshes already at or below the target are returned unchanged. An empty or
/// invalid result is reported as [`MeshError::DecimationFailed`]; callers are
/// expected to fall back to the input mesh.
pub fn decimate(mesh: &Mesh, settings: &DecimationSettings) -> Result<Mesh> {
    settings.validate()?;
    let original = mesh.num_faces();
    let target = settings.target_for(original);
    if original <= target {
        debug!(faces = original, target, "mesh already below decimation target");
        return Ok(mesh.clone());
    }

    info!(original, target, "starting mesh decimation");

    let topology = MeshTopology::build(mesh)?;
    let mut state = Collapser::new(mesh, &topology);

    let mut heap: BinaryHeap<Candidate> = mesh
        .unique_edges()
        .into_iter()
        .filter_map(|e| state.candidate(e))
        .collect();

    let mut collapses = 0usize;
    let mut rejected = 0usize;
    while state.active_faces > target {
        let Some(c) = heap.pop() else {
            break;
        };
        if state.is_stale(&c) {
            continue;
        }
        let (a, b) = (c.edge.v0(), c.edge.v1());
        if !state.is_valid(a, b, &c.target) {
            rejected += 1;
            continue;
        }
        state.collapse(a, b, c.target);
        collapses += 1;

        for n in state.neighbors(a) {
            if let Some(next) = state.candidate(EdgeKey::new(a, n)) {
                heap.push(next);
            }
        }
    }

    let result = state.into_mesh();
    if result.is_empty() {
        return Err(MeshError::DecimationFailed(
            "every triangle collapsed".to_string(),
        ));
    }
    result
        .validate()
        .map_err(|e| MeshError::DecimationFailed(e.to_string()))?;
    if result
        .faces()
        .iter()
        .flat_map(face_edges)
        .any(|e| e.v0() == e.v1())
    {
        return Err(MeshError::DecimationFailed(
            "degenerate triangle survived".to_string(),
        ));
    }

    info!(
        final_triangles = result.num_faces(),
        collapses, rejected, "decimation complete"
    );
    Ok(result)
}
