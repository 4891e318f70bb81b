//! Per-view feature annotation: circles, dimensions and outline bounds.

use draftkit_mesh::RealExtents;
use serde::{Deserialize, Serialize};

use crate::arc_fit::ArcFitter;
use crate::dimension::Dimension;
use crate::placement::{DimensionPlacer, DimensionStyle};
use crate::types::{BoundingBox2D, Circle2D, ProjectedView, ViewOrientation};

/// Everything annotated on one view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectedFeatures {
    /// Circles and arcs recovered from the view's edges.
    pub circles: Vec<Circle2D>,
    /// Overall dimensions, plus diameter and radius callouts.
    pub dimensions: Vec<Dimension>,
    /// Outline of the view.
    pub bounding_box: BoundingBox2D,
}

/// Dimension a view whose circles are already known.
///
/// Overall width and height come first. Orthographic views then get a
/// diameter callout per full circle and a radius callout per arc when
/// `style.annotate_circles` is set.
pub fn dimension_view(view: &ProjectedView, real: &RealExtents, style: &DimensionStyle) -> Vec<Dimension> {
    let mut placer = DimensionPlacer::new(style.clone());
    placer.auto_dimension_view(view, real);
    if style.annotate_circles && ViewOrientation::ORTHOGRAPHIC.contains(&view.orientation) {
        placer.dimension_circles(&view.circles);
    }
    placer.into_dimensions()
}

/// Detect circles in `view` and dimension it.
pub fn detect_features(
    view: &ProjectedView,
    real: &RealExtents,
    fitter: &ArcFitter,
    style: &DimensionStyle,
) -> DetectedFeatures {
    let circles = fitter.detect_circles(&view.edges);
    let annotated = view.clone().with_circles(circles);
    DetectedFeatures {
        dimensions: dimension_view(&annotated, real, style),
        bounding_box: annotated.bounds,
        circles: annotated.circles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arc_fit::ArcFitSettings;
    use crate::dimension::DimensionKind;
    use crate::hidden_line::ProjectionEngine;
    use draftkit_mesh::{extract_feature_edges, primitives, FeatureEdgeSettings, MeshTopology};

    fn cylinder_view(orientation: ViewOrientation) -> (ProjectedView, RealExtents) {
        let mesh = primitives::cylinder(10.0, 20.0, 48);
        let topo = MeshTopology::build(&mesh).unwrap();
        let edges = extract_feature_edges(&mesh, &topo, &FeatureEdgeSettings::default())
            .into_iter()
            .map(|f| f.edge)
            .collect();
        let engine = ProjectionEngine::new(&mesh, &topo, edges);
        (engine.project_view(orientation), mesh.extents())
    }

    #[test]
    fn test_cylinder_top_gets_diameter() {
        let (view, real) = cylinder_view(ViewOrientation::Top);
        let fitter = ArcFitter::new(ArcFitSettings::default());
        let features = detect_features(&view, &real, &fitter, &DimensionStyle::default());

        assert_eq!(features.circles.len(), 1);
        assert!(features.circles[0].is_full_circle);
        let kinds: Vec<_> = features.dimensions.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DimensionKind::Horizontal, DimensionKind::Vertical, DimensionKind::Diameter]
        );
        let dia = &features.dimensions[2];
        assert!((dia.value - 20.0).abs() < 1.0);
        assert_eq!(features.bounding_box, view.bounds);
    }

    #[test]
    fn test_circle_annotation_can_be_disabled() {
        let (view, real) = cylinder_view(ViewOrientation::Top);
        let fitter = ArcFitter::new(ArcFitSettings::default());
        let style = DimensionStyle {
            annotate_circles: false,
            ..Default::default()
        };
        let features = detect_features(&view, &real, &fitter, &style);
        assert_eq!(features.circles.len(), 1);
        assert_eq!(features.dimensions.len(), 2);
    }

    #[test]
    fn test_isometric_has_no_dimensions() {
        let (view, real) = cylinder_view(ViewOrientation::Isometric);
        let fitter = ArcFitter::new(ArcFitSettings::default());
        let features = detect_features(&view, &real, &fitter, &DimensionStyle::default());
        assert!(features.dimensions.is_empty());
    }

    #[test]
    fn test_empty_view() {
        let view = ProjectedView::new(ViewOrientation::Front);
        let fitter = ArcFitter::new(ArcFitSettings::default());
        let features = detect_features(
            &view,
            &RealExtents::new(1.0, 1.0, 1.0),
            &fitter,
            &DimensionStyle::default(),
        );
        assert_eq!(features, DetectedFeatures::default());
    }
}
