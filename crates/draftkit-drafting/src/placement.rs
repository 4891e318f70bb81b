//! Dimension placement with collision avoidance.
//!
//! Linear dimensions are stacked outward in layers. Before a horizontal,
//! vertical or aligned dimension is placed, its footprint at each candidate
//! layer is tested against the footprints already placed in the view; the
//! first free layer wins. Horizontal and vertical dimensions run on different
//! sides of the geometry and never block each other. When every layer is
//! taken the last one is used anyway, so dimensions are never dropped.

use draftkit_mesh::RealExtents;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dimension::{Dimension, DimensionKind, LabelFormat};
use crate::error::{DraftingError, Result};
use crate::types::{BoundingBox2D, Circle2D, Point2D, ProjectedView, Segment2D, ViewOrientation};

/// Geometry and formatting of dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionStyle {
    /// Extra distance per layer.
    pub layer_stride: f64,
    /// Number of layers tried before giving up on avoiding overlap.
    pub max_layers: u32,
    /// Half-width of a dimension line's footprint.
    pub clearance: f64,
    /// Gap between the geometry and the start of an extension line.
    pub extension_gap: f64,
    /// How far extension lines run past the dimension line.
    pub extension_overshoot: f64,
    /// Gap between a line and its label.
    pub text_gap: f64,
    /// Leader angle for diameter and radius dimensions, in degrees.
    pub leader_angle_deg: f64,
    /// Radius of the bisector line for angle dimensions.
    pub angle_arc_radius: f64,
    /// Automatic dimension offset as a fraction of the larger view span.
    pub auto_offset_ratio: f64,
    /// Digits after the decimal point.
    pub decimal_places: usize,
    /// Unit suffix.
    pub unit: String,
    /// Append the unit to labels.
    pub show_unit: bool,
    /// Add diameter and radius dimensions for detected circles.
    pub annotate_circles: bool,
}

impl Default for DimensionStyle {
    fn default() -> Self {
        Self {
            layer_stride: 8.0,
            max_layers: 5,
            clearance: 3.5,
            extension_gap: 1.5,
            extension_overshoot: 2.0,
            text_gap: 1.5,
            leader_angle_deg: 45.0,
            angle_arc_radius: 15.0,
            auto_offset_ratio: 0.08,
            decimal_places: 2,
            unit: "mm".to_string(),
            show_unit: false,
            annotate_circles: true,
        }
    }
}

impl DimensionStyle {
    /// Check that spacing values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_layers == 0 {
            return Err(DraftingError::InvalidConfig(
                "max_layers must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("layer_stride", self.layer_stride),
            ("clearance", self.clearance),
            ("angle_arc_radius", self.angle_arc_radius),
            ("auto_offset_ratio", self.auto_offset_ratio),
        ] {
            if !(value > 0.0) {
                return Err(DraftingError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("extension_gap", self.extension_gap),
            ("extension_overshoot", self.extension_overshoot),
            ("text_gap", self.text_gap),
        ] {
            if !(value >= 0.0) {
                return Err(DraftingError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Label formatting part of the style.
    pub fn label_format(&self) -> LabelFormat {
        LabelFormat {
            decimal_places: self.decimal_places,
            unit: self.unit.clone(),
            show_unit: self.show_unit,
        }
    }
}

/// Real-world `(horizontal, vertical)` spans shown by a view.
///
/// Front and back show width and height, top and bottom width and depth,
/// left and right depth and height. The isometric view has none.
pub fn view_extents(orientation: ViewOrientation, real: &RealExtents) -> Option<(f64, f64)> {
    match orientation {
        ViewOrientation::Front | ViewOrientation::Back => Some((real.width, real.height)),
        ViewOrientation::Top | ViewOrientation::Bottom => Some((real.width, real.depth)),
        ViewOrientation::Left | ViewOrientation::Right => Some((real.depth, real.height)),
        ViewOrientation::Isometric => None,
    }
}

/// Angle between two ray directions in degrees, wrapped into `[0, 180]`.
pub fn angle_between(angle1: f64, angle2: f64) -> f64 {
    let diff = (angle2 - angle1).abs() % 360.0;
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Signed shortest turn from `angle1` to `angle2`, in `[-180, 180)`.
fn signed_turn(angle1: f64, angle2: f64) -> f64 {
    (angle2 - angle1 + 180.0).rem_euclid(360.0) - 180.0
}

/// Whether a placed footprint of kind `placed` rules out a candidate of kind `kind`.
fn blocks(kind: DimensionKind, placed: DimensionKind) -> bool {
    !matches!(
        (kind, placed),
        (DimensionKind::Horizontal, DimensionKind::Vertical)
            | (DimensionKind::Vertical, DimensionKind::Horizontal)
    )
}

/// Places dimensions for one view, remembering what space is taken.
#[derive(Debug, Clone, Default)]
pub struct DimensionPlacer {
    style: DimensionStyle,
    occupied: Vec<(DimensionKind, BoundingBox2D)>,
    dimensions: Vec<Dimension>,
}

impl DimensionPlacer {
    /// Empty placer.
    pub fn new(style: DimensionStyle) -> Self {
        Self {
            style,
            occupied: Vec::new(),
            dimensions: Vec::new(),
        }
    }

    /// Forget all placed dimensions and occupied space.
    pub fn clear(&mut self) {
        self.occupied.clear();
        self.dimensions.clear();
    }

    /// Footprints of the linear dimensions placed so far.
    pub fn occupied(&self) -> &[(DimensionKind, BoundingBox2D)] {
        &self.occupied
    }

    /// Dimensions placed so far.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Consume the placer, returning its dimensions.
    pub fn into_dimensions(self) -> Vec<Dimension> {
        self.dimensions
    }

    fn free_layer(&self, kind: DimensionKind, footprint: impl Fn(u32) -> BoundingBox2D) -> u32 {
        let last = self.style.max_layers.saturating_sub(1);
        (0..self.style.max_layers)
            .find(|&layer| {
                let candidate = footprint(layer);
                !self
                    .occupied
                    .iter()
                    .any(|(other, r)| blocks(kind, *other) && r.intersects(&candidate))
            })
            .unwrap_or(last)
    }

    fn layer_distance(&self, offset: f64, layer: u32) -> f64 {
        offset + f64::from(layer) * self.style.layer_stride
    }

    fn push(&mut self, dimension: Dimension, footprint: Option<BoundingBox2D>) -> Dimension {
        if let Some(fp) = footprint.filter(|_| dimension.kind.is_linear()) {
            self.occupied.push((dimension.kind, fp));
        }
        self.dimensions.push(dimension.clone());
        dimension
    }

    /// Horizontal dimension below the lower of `p1` and `p2`.
    pub fn horizontal(&mut self, p1: Point2D, p2: Point2D, value: f64, offset: f64) -> Dimension {
        let (a, b) = if p1.x <= p2.x { (p1, p2) } else { (p2, p1) };
        let base = a.y.min(b.y);
        let clearance = self.style.clearance;
        let line_y = |layer: u32| base - self.layer_distance(offset, layer);
        let footprint = |layer: u32| {
            let y = line_y(layer);
            BoundingBox2D::from_corners(Point2D::new(a.x, y - clearance), Point2D::new(b.x, y + clearance))
        };
        let layer = self.free_layer(DimensionKind::Horizontal, footprint);
        let y = line_y(layer);
        let s = &self.style;

        let dimension = Dimension {
            kind: DimensionKind::Horizontal,
            value,
            p1: a,
            p2: b,
            dim_line: Segment2D::new(Point2D::new(a.x, y), Point2D::new(b.x, y)),
            extension_lines: vec![
                Segment2D::new(
                    Point2D::new(a.x, a.y - s.extension_gap),
                    Point2D::new(a.x, y - s.extension_overshoot),
                ),
                Segment2D::new(
                    Point2D::new(b.x, b.y - s.extension_gap),
                    Point2D::new(b.x, y - s.extension_overshoot),
                ),
            ],
            text_position: Point2D::new((a.x + b.x) / 2.0, y - s.text_gap),
            text_rotation: 0.0,
            layer,
            format: s.label_format(),
        };
        let fp = footprint(layer);
        self.push(dimension, Some(fp))
    }

    /// Vertical dimension to the right of `p1` and `p2`.
    pub fn vertical(&mut self, p1: Point2D, p2: Point2D, value: f64, offset: f64) -> Dimension {
        let (a, b) = if p1.y <= p2.y { (p1, p2) } else { (p2, p1) };
        let base = a.x.max(b.x);
        let clearance = self.style.clearance;
        let line_x = |layer: u32| base + self.layer_distance(offset, layer);
        let footprint = |layer: u32| {
            let x = line_x(layer);
            BoundingBox2D::from_corners(Point2D::new(x - clearance, a.y), Point2D::new(x + clearance, b.y))
        };
        let layer = self.free_layer(DimensionKind::Vertical, footprint);
        let x = line_x(layer);
        let s = &self.style;

        let dimension = Dimension {
            kind: DimensionKind::Vertical,
            value,
            p1: a,
            p2: b,
            dim_line: Segment2D::new(Point2D::new(x, a.y), Point2D::new(x, b.y)),
            extension_lines: vec![
                Segment2D::new(
                    Point2D::new(a.x + s.extension_gap, a.y),
                    Point2D::new(x + s.extension_overshoot, a.y),
                ),
                Segment2D::new(
                    Point2D::new(b.x + s.extension_gap, b.y),
                    Point2D::new(x + s.extension_overshoot, b.y),
                ),
            ],
            text_position: Point2D::new(x + s.text_gap, (a.y + b.y) / 2.0),
            text_rotation: 90.0,
            layer,
            format: s.label_format(),
        };
        let fp = footprint(layer);
        self.push(dimension, Some(fp))
    }

    /// Dimension parallel to `p1 -> p2`, offset to the left of that direction.
    pub fn aligned(&mut self, p1: Point2D, p2: Point2D, value: f64, offset: f64) -> Dimension {
        let len = p1.distance(&p2);
        let (dx, dy) = if len > 0.0 {
            ((p2.x - p1.x) / len, (p2.y - p1.y) / len)
        } else {
            (1.0, 0.0)
        };
        let (nx, ny) = (-dy, dx);
        let shift = |p: Point2D, d: f64| Point2D::new(p.x + nx * d, p.y + ny * d);
        let clearance = self.style.clearance;
        let footprint = |layer: u32| {
            let d = self.layer_distance(offset, layer);
            BoundingBox2D::from_corners(shift(p1, d), shift(p2, d)).expanded(clearance)
        };
        let layer = self.free_layer(DimensionKind::Aligned, footprint);
        let d = self.layer_distance(offset, layer);
        let s = &self.style;

        // Keep the label upright.
        let mut rotation = dy.atan2(dx).to_degrees();
        if rotation > 90.0 {
            rotation -= 180.0;
        } else if rotation <= -90.0 {
            rotation += 180.0;
        }

        let start = shift(p1, d);
        let end = shift(p2, d);
        let dimension = Dimension {
            kind: DimensionKind::Aligned,
            value,
            p1,
            p2,
            dim_line: Segment2D::new(start, end),
            extension_lines: vec![
                Segment2D::new(shift(p1, s.extension_gap), shift(p1, d + s.extension_overshoot)),
                Segment2D::new(shift(p2, s.extension_gap), shift(p2, d + s.extension_overshoot)),
            ],
            text_position: shift(start.midpoint(&end), s.text_gap),
            text_rotation: rotation,
            layer,
            format: s.label_format(),
        };
        let fp = footprint(layer);
        self.push(dimension, Some(fp))
    }

    /// Diameter across a circle at the leader angle.
    pub fn diameter(&mut self, center: Point2D, radius: f64) -> Dimension {
        let s = &self.style;
        let angle = s.leader_angle_deg.to_radians();
        let p1 = center.polar_offset(-radius, angle);
        let p2 = center.polar_offset(radius, angle);
        let dimension = Dimension {
            kind: DimensionKind::Diameter,
            value: 2.0 * radius,
            p1,
            p2,
            dim_line: Segment2D::new(p1, p2),
            extension_lines: Vec::new(),
            text_position: center.polar_offset(radius + 2.0 * s.text_gap, angle),
            text_rotation: 0.0,
            layer: 0,
            format: s.label_format(),
        };
        self.push(dimension, None)
    }

    /// Radius from a circle's center out to the rim at the leader angle.
    pub fn radius(&mut self, center: Point2D, radius: f64) -> Dimension {
        let s = &self.style;
        let angle = s.leader_angle_deg.to_radians();
        let rim = center.polar_offset(radius, angle);
        let dimension = Dimension {
            kind: DimensionKind::Radius,
            value: radius,
            p1: center,
            p2: rim,
            dim_line: Segment2D::new(center, rim),
            extension_lines: Vec::new(),
            text_position: center.polar_offset(radius + s.text_gap, angle),
            text_rotation: 0.0,
            layer: 0,
            format: s.label_format(),
        };
        self.push(dimension, None)
    }

    /// Angle between rays at `angle1` and `angle2` degrees from `vertex`.
    ///
    /// The value is the smaller angle between the rays, and the line runs
    /// along its bisector.
    pub fn angle(&mut self, vertex: Point2D, angle1: f64, angle2: f64) -> Dimension {
        let s = &self.style;
        let bisector = (angle1 + signed_turn(angle1, angle2) / 2.0).to_radians();
        let end = vertex.polar_offset(s.angle_arc_radius, bisector);
        let dimension = Dimension {
            kind: DimensionKind::Angle,
            value: angle_between(angle1, angle2),
            p1: vertex,
            p2: end,
            dim_line: Segment2D::new(vertex, end),
            extension_lines: Vec::new(),
            text_position: vertex.polar_offset(s.angle_arc_radius + s.text_gap, bisector),
            text_rotation: 0.0,
            layer: 0,
            format: s.label_format(),
        };
        self.push(dimension, None)
    }

    /// Diameter dimensions for full circles, radius dimensions for arcs.
    pub fn dimension_circles(&mut self, circles: &[Circle2D]) -> Vec<Dimension> {
        circles
            .iter()
            .map(|c| {
                if c.is_full_circle {
                    self.diameter(c.center, c.radius)
                } else {
                    self.radius(c.center, c.radius)
                }
            })
            .collect()
    }

    /// Overall width and height dimensions for a view.
    ///
    /// Clears the placer first. Empty and isometric views get no
    /// dimensions. A view seen edge-on (zero span along one axis) keeps the
    /// dimension along its other axis.
    pub fn auto_dimension_view(&mut self, view: &ProjectedView, real: &RealExtents) -> Vec<Dimension> {
        self.clear();
        let Some((h_value, v_value)) = view_extents(view.orientation, real) else {
            return Vec::new();
        };
        let bb = view.bounds;
        let span = bb.width().max(bb.height());
        if view.is_empty() || !(span > 0.0) {
            return Vec::new();
        }

        let offset = span * self.style.auto_offset_ratio;
        if bb.width() > 0.0 {
            self.horizontal(
                Point2D::new(bb.min_x, bb.min_y),
                Point2D::new(bb.max_x, bb.min_y),
                h_value,
                offset,
            );
        }
        if bb.height() > 0.0 {
            self.vertical(
                Point2D::new(bb.max_x, bb.min_y),
                Point2D::new(bb.max_x, bb.max_y),
                v_value,
                offset,
            );
        }
        debug!(view = %view.orientation, width = h_value, height = v_value, "auto-dimensioned view");
        self.dimensions.clone()
    }
}
