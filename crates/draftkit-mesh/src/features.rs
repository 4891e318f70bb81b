//! Feature-edge extraction.
//!
//! Reduces a dense triangulation to the edges a drawing needs: open
//! boundaries and creases whose dihedral angle exceeds a threshold.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MeshError, Result};
use crate::mesh::{EdgeKey, Mesh};
use crate::topology::MeshTopology;

/// Tuning for [`extract_feature_edges`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureEdgeSettings {
    /// Interior edges whose face normals differ by more than this are kept.
    pub dihedral_threshold_deg: f64,
    /// Edges shorter than this in model space are dropped. `0` keeps all.
    pub min_edge_length: f64,
}

impl Default for FeatureEdgeSettings {
    fn default() -> Self {
        Self {
            dihedral_threshold_deg: 20.0,
            min_edge_length: 0.0,
        }
    }
}

impl FeatureEdgeSettings {
    /// Threshold must lie in `[0, 180]` degrees and the length filter must be
    /// non-negative.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=180.0).contains(&self.dihedral_threshold_deg) {
            return Err(MeshError::InvalidSettings(format!(
                "dihedral threshold must be within [0, 180] degrees, got {}",
                self.dihedral_threshold_deg
            )));
        }
        if !(self.min_edge_length >= 0.0) {
            return Err(MeshError::InvalidSettings(format!(
                "min_edge_length must be non-negative, got {}",
                self.min_edge_length
            )));
        }
        Ok(())
    }
}

/// Why an edge was retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Exactly one adjacent face.
    Boundary,
    /// Adjacent normals differ by more than the threshold.
    Sharp,
}

/// An edge retained for drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureEdge {
    /// The mesh edge.
    pub edge: EdgeKey,
    /// Reason it was kept.
    pub kind: FeatureKind,
    /// Dihedral angle in radians. Zero for boundary edges.
    pub dihedral: f64,
}

/// Select boundary and sharp edges of `mesh`.
///
/// If no interior edge clears the threshold the result holds the boundary
/// edges only, so an open mesh never yields an empty wireframe. Output order
/// follows first appearance of each edge in the face list.
pub fn extract_feature_edges(
    mesh: &Mesh,
    topology: &MeshTopology,
    settings: &FeatureEdgeSettings,
) -> Vec<FeatureEdge> {
    let threshold = settings.dihedral_threshold_deg.to_radians();

    let mut features = Vec::new();
    let mut sharp = 0usize;
    for (edge, faces) in topology.edges() {
        let feature = match faces.len() {
            0 => continue,
            1 => FeatureEdge {
                edge,
                kind: FeatureKind::Boundary,
                dihedral: 0.0,
            },
            _ => {
                let dihedral = topology.dihedral_angle(edge).unwrap_or(0.0);
                if dihedral <= threshold {
                    continue;
                }
                sharp += 1;
                FeatureEdge {
                    edge,
                    kind: FeatureKind::Sharp,
                    dihedral,
                }
            }
        };
        if settings.min_edge_length > 0.0 && mesh.edge_length(edge) < settings.min_edge_length {
            continue;
        }
        features.push(feature);
    }

    if sharp == 0 {
        features.retain(|f| f.kind == FeatureKind::Boundary);
    }

    debug!(
        edges = topology.num_edges(),
        features = features.len(),
        sharp,
        threshold_deg = settings.dihedral_threshold_deg,
        "extracted feature edges"
    );
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;
    use draftkit_math::Point3;
    use std::f64::consts::FRAC_PI_2;

    fn features_of(mesh: &Mesh) -> Vec<FeatureEdge> {
        let topo = MeshTopology::build(mesh).unwrap();
        extract_feature_edges(mesh, &topo, &FeatureEdgeSettings::default())
    }

    #[test]
    fn test_cube_keeps_the_twelve_box_edges() {
        let features = features_of(&primitives::cube(1.0));
        // Face diagonals are flat (0 degrees) and dropped.
        assert_eq!(features.len(), 12);
        for f in &features {
            assert_eq!(f.kind, FeatureKind::Sharp);
            assert!((f.dihedral - FRAC_PI_2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cylinder_keeps_only_the_rims() {
        let segments = 32;
        let features = features_of(&primitives::cylinder(10.0, 20.0, segments));
        // Side facets meet at 11.25 degrees, cap fans at 0.
        assert_eq!(features.len(), 2 * segments as usize);
    }

    #[test]
    fn test_flat_patch_falls_back_to_boundary() {
        let mesh = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap();
        let features = features_of(&mesh);
        assert_eq!(features.len(), 4);
        assert!(features.iter().all(|f| f.kind == FeatureKind::Boundary));
        assert!(!features.iter().any(|f| f.edge == EdgeKey::new(0, 2)));
    }

    #[test]
    fn test_threshold_controls_retention() {
        let mesh = primitives::cylinder(10.0, 20.0, 32);
        let topo = MeshTopology::build(&mesh).unwrap();
        let loose = FeatureEdgeSettings {
            dihedral_threshold_deg: 10.0,
            ..Default::default()
        };
        let features = extract_feature_edges(&mesh, &topo, &loose);
        // Rims plus the 32 vertical side seams.
        assert_eq!(features.len(), 3 * 32);
    }

    #[test]
    fn test_min_edge_length_filter() {
        let mesh = primitives::box_mesh(10.0, 10.0, 0.5);
        let topo = MeshTopology::build(&mesh).unwrap();
        let settings = FeatureEdgeSettings {
            min_edge_length: 1.0,
            ..Default::default()
        };
        let features = extract_feature_edges(&mesh, &topo, &settings);
        // The four 0.5-long depth edges go.
        assert_eq!(features.len(), 8);
    }

    #[test]
    fn test_empty_mesh() {
        assert!(features_of(&Mesh::empty()).is_empty());
    }

    #[test]
    fn test_settings_validation() {
        let bad = FeatureEdgeSettings {
            dihedral_threshold_deg: 200.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        assert!(FeatureEdgeSettings::default().validate().is_ok());
    }
}
