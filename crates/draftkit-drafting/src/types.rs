//! Core types for projected views.

use std::fmt;
use std::str::FromStr;

use draftkit_mesh::EdgeKey;
use serde::{Deserialize, Serialize};

use crate::error::DraftingError;

/// A point in a view's drawing plane.
///
/// Kept separate from the nalgebra point so drawings serialize without
/// nalgebra's serde feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// Horizontal drawing coordinate.
    pub x: f64,
    /// Vertical drawing coordinate.
    pub y: f64,
}

impl Point2D {
    /// Point at `(x, y)`.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// `(0, 0)`.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Euclidean distance.
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Point halfway to `other`.
    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Point at `distance` from this one in direction `angle` (radians).
    pub fn polar_offset(&self, distance: f64, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(self.x + distance * c, self.y + distance * s)
    }
}

impl Default for Point2D {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl From<draftkit_math::Point2> for Point2D {
    fn from(p: draftkit_math::Point2) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Point2D> for draftkit_math::Point2 {
    fn from(p: Point2D) -> Self {
        draftkit_math::Point2::new(p.x, p.y)
    }
}

/// A straight 2D line segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment2D {
    /// First endpoint.
    pub start: Point2D,
    /// Second endpoint.
    pub end: Point2D,
}

impl Segment2D {
    /// Create a segment.
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    /// Length of the segment.
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }
}

/// Standard drawing views.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ViewOrientation {
    /// Looking at the part from +Z.
    #[default]
    Front,
    /// Looking from -Z.
    Back,
    /// Looking down from +Y.
    Top,
    /// Looking up from -Y.
    Bottom,
    /// Looking from -X.
    Left,
    /// Looking from +X.
    Right,
    /// Isometric view showing the top, front and left faces.
    Isometric,
}

impl ViewOrientation {
    /// Every view in a drawing sheet.
    pub const ALL: [Self; 7] = [
        Self::Front,
        Self::Back,
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
        Self::Isometric,
    ];

    /// The six axis-aligned views.
    pub const ORTHOGRAPHIC: [Self; 6] = [
        Self::Front,
        Self::Back,
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
    ];

    /// Upper-case title used on drawings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Front => "FRONT",
            Self::Back => "BACK",
            Self::Top => "TOP",
            Self::Bottom => "BOTTOM",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Isometric => "ISOMETRIC",
        }
    }

    /// Whether this is the isometric view.
    pub fn is_isometric(&self) -> bool {
        matches!(self, Self::Isometric)
    }
}

impl fmt::Display for ViewOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ViewOrientation {
    type Err = DraftingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DraftingError::UnknownView(s.to_string()))
    }
}

/// How an edge is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// Edge is visible (drawn solid).
    Visible,
    /// Edge is hidden (drawn dashed).
    Hidden,
}

/// One feature edge after projection into a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedEdge {
    /// First endpoint.
    pub start: Point2D,
    /// Second endpoint.
    pub end: Point2D,
    /// Solid or dashed.
    pub visibility: Visibility,
    /// Lies on the outline between front- and back-facing surface.
    pub silhouette: bool,
    /// Depth of the edge midpoint toward the viewer.
    pub depth: f64,
    /// Source mesh edge.
    pub edge: EdgeKey,
}

impl ProjectedEdge {
    /// Projected length.
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// Check if the edge is degenerate (shorter than `tolerance`).
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        self.length() < tolerance
    }

    /// Whether the edge is drawn solid.
    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    /// The edge as a plain segment.
    pub fn segment(&self) -> Segment2D {
        Segment2D::new(self.start, self.end)
    }
}

/// Axis-aligned rectangle in a view plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    /// Left edge.
    pub min_x: f64,
    /// Bottom edge.
    pub min_y: f64,
    /// Right edge.
    pub max_x: f64,
    /// Top edge.
    pub max_y: f64,
}

impl BoundingBox2D {
    /// Zero-extent box at the origin.
    pub const ZERO: Self = Self {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 0.0,
        max_y: 0.0,
    };

    /// Box spanning two corners given in any order.
    pub fn from_corners(a: Point2D, b: Point2D) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Smallest box around `points`, or [`Self::ZERO`] if there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2D>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::ZERO;
        };
        let mut bb = Self::from_corners(*first, *first);
        for p in iter {
            bb.include_point(*p);
        }
        bb
    }

    /// Grow to cover `p`.
    pub fn include_point(&mut self, p: Point2D) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Copy grown by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// Whether the two boxes overlap. Touching edges count.
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.max_x < other.min_x
            || self.min_x > other.max_x
            || self.max_y < other.min_y
            || self.min_y > other.max_y)
    }

    /// Horizontal span.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Vertical span.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Midpoint.
    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

impl Default for BoundingBox2D {
    fn default() -> Self {
        Self::ZERO
    }
}

/// A circle or arc recovered from a chain of projected edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle2D {
    /// Fitted center.
    pub center: Point2D,
    /// Fitted radius.
    pub radius: f64,
    /// The chain wraps (nearly) all the way around.
    pub is_full_circle: bool,
    /// Visibility of the originating chain.
    pub visibility: Visibility,
    /// Arc start in degrees, counter-clockwise from +X. `0` for full circles.
    pub start_angle: f64,
    /// Arc end in degrees. `360` for full circles.
    pub end_angle: f64,
}

impl Circle2D {
    /// Twice the radius.
    pub fn diameter(&self) -> f64 {
        2.0 * self.radius
    }

    /// Swept angle in degrees.
    pub fn sweep(&self) -> f64 {
        if self.is_full_circle {
            360.0
        } else {
            (self.end_angle - self.start_angle).rem_euclid(360.0)
        }
    }
}

/// A complete projected view.
///
/// `bounds` always covers every edge endpoint and is [`BoundingBox2D::ZERO`]
/// while the view has no edges.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectedView {
    /// Which view this is.
    pub orientation: ViewOrientation,
    /// Projected edges, in source edge order.
    pub edges: Vec<ProjectedEdge>,
    /// Circles detected from the edges.
    pub circles: Vec<Circle2D>,
    /// 2D bounding box of all edge endpoints.
    pub bounds: BoundingBox2D,
}

impl ProjectedView {
    /// View with no edges yet.
    pub fn new(orientation: ViewOrientation) -> Self {
        Self {
            orientation,
            edges: Vec::new(),
            circles: Vec::new(),
            bounds: BoundingBox2D::ZERO,
        }
    }

    /// Append an edge, growing the bounds.
    pub fn add_edge(&mut self, edge: ProjectedEdge) {
        if self.edges.is_empty() {
            self.bounds = BoundingBox2D::from_corners(edge.start, edge.start);
        }
        self.bounds.include_point(edge.start);
        self.bounds.include_point(edge.end);
        self.edges.push(edge);
    }

    /// Replace the detected circles.
    pub fn with_circles(mut self, circles: Vec<Circle2D>) -> Self {
        self.circles = circles;
        self
    }

    /// Whether the view has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edges drawn solid.
    pub fn visible_edges(&self) -> impl Iterator<Item = &ProjectedEdge> {
        self.edges.iter().filter(|e| e.is_visible())
    }

    /// Edges drawn dashed.
    pub fn hidden_edges(&self) -> impl Iterator<Item = &ProjectedEdge> {
        self.edges.iter().filter(|e| !e.is_visible())
    }

    /// Edges on the outline.
    pub fn silhouette_edges(&self) -> impl Iterator<Item = &ProjectedEdge> {
        self.edges.iter().filter(|e| e.silhouette)
    }

    /// Count of solid edges.
    pub fn num_visible(&self) -> usize {
        self.visible_edges().count()
    }

    /// Count of dashed edges.
    pub fn num_hidden(&self) -> usize {
        self.hidden_edges().count()
    }

    /// Width of the bounds.
    pub fn width(&self) -> f64 {
        self.bounds.width()
    }

    /// Height of the bounds.
    pub fn height(&self) -> f64 {
        self.bounds.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(x0: f64, y0: f64, x1: f64, y1: f64) -> ProjectedEdge {
        ProjectedEdge {
            start: Point2D::new(x0, y0),
            end: Point2D::new(x1, y1),
            visibility: Visibility::Visible,
            silhouette: false,
            depth: 0.0,
            edge: EdgeKey::new(0, 1),
        }
    }

    #[test]
    fn test_bounding_box() {
        let bb = BoundingBox2D::from_points(&[Point2D::new(0.0, 0.0), Point2D::new(10.0, 5.0)]);
        assert!((bb.width() - 10.0).abs() < 1e-10);
        assert!((bb.height() - 5.0).abs() < 1e-10);
        assert_eq!(bb.center(), Point2D::new(5.0, 2.5));
        assert_eq!(BoundingBox2D::from_points(&[]), BoundingBox2D::ZERO);
    }

    #[test]
    fn test_bounding_box_intersects() {
        let a = BoundingBox2D::from_corners(Point2D::new(0.0, 0.0), Point2D::new(2.0, 2.0));
        let b = BoundingBox2D::from_corners(Point2D::new(2.0, 1.0), Point2D::new(3.0, 3.0));
        let c = BoundingBox2D::from_corners(Point2D::new(2.5, 0.0), Point2D::new(3.0, 0.5));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.expanded(0.5).intersects(&c));
    }

    #[test]
    fn test_projected_edge_length() {
        let e = edge(0.0, 0.0, 3.0, 4.0);
        assert!((e.length() - 5.0).abs() < 1e-10);
        assert!(!e.is_degenerate(1e-3));
        assert!(edge(1.0, 1.0, 1.0, 1.0).is_degenerate(1e-3));
    }

    #[test]
    fn test_view_bounds_track_edges() {
        let mut view = ProjectedView::new(ViewOrientation::Front);
        assert_eq!(view.bounds, BoundingBox2D::ZERO);

        view.add_edge(edge(5.0, 5.0, 6.0, 8.0));
        assert_eq!(view.bounds.min_x, 5.0);
        assert_eq!(view.bounds.min_y, 5.0);
        view.add_edge(edge(-1.0, 6.0, 2.0, 6.0));
        assert_eq!(view.bounds.min_x, -1.0);
        assert_eq!(view.bounds.max_y, 8.0);
        assert_eq!(view.width(), 7.0);
    }

    #[test]
    fn test_orientation_parse() {
        assert_eq!("top".parse::<ViewOrientation>().unwrap(), ViewOrientation::Top);
        assert_eq!(
            " Isometric ".parse::<ViewOrientation>().unwrap(),
            ViewOrientation::Isometric
        );
        assert!("side".parse::<ViewOrientation>().is_err());
        assert_eq!(ViewOrientation::Right.to_string(), "RIGHT");
    }

    #[test]
    fn test_arc_sweep() {
        let arc = Circle2D {
            center: Point2D::ORIGIN,
            radius: 2.0,
            is_full_circle: false,
            visibility: Visibility::Visible,
            start_angle: 300.0,
            end_angle: 30.0,
        };
        assert!((arc.sweep() - 90.0).abs() < 1e-10);
        assert_eq!(arc.diameter(), 4.0);
    }
}
