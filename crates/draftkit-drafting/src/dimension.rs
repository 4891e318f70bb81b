//! Dimension records and label formatting.

use serde::{Deserialize, Serialize};

use crate::types::{Point2D, Segment2D};

/// What a dimension measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionKind {
    /// Horizontal distance, drawn below the view.
    Horizontal,
    /// Vertical distance, drawn to the right of the view.
    Vertical,
    /// True distance between two points, drawn parallel to them.
    Aligned,
    /// Diameter of a full circle.
    Diameter,
    /// Radius of an arc.
    Radius,
    /// Angle between two rays.
    Angle,
}

impl DimensionKind {
    /// Linear kinds take a layer and a unit suffix.
    pub fn is_linear(&self) -> bool {
        matches!(self, Self::Horizontal | Self::Vertical | Self::Aligned)
    }
}

/// How values are printed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelFormat {
    /// Digits after the decimal point.
    pub decimal_places: usize,
    /// Unit suffix, e.g. `mm`.
    pub unit: String,
    /// Append the unit to non-angular labels.
    pub show_unit: bool,
}

impl Default for LabelFormat {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            unit: "mm".to_string(),
            show_unit: false,
        }
    }
}

/// A placed dimension annotation.
///
/// Coordinates are in the view plane of the view the dimension belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// What is measured.
    pub kind: DimensionKind,
    /// Measured value: model units, or degrees for angles.
    pub value: f64,
    /// First defining point. Circle center for radius dimensions, vertex
    /// for angles.
    pub p1: Point2D,
    /// Second defining point.
    pub p2: Point2D,
    /// The dimension line.
    pub dim_line: Segment2D,
    /// Extension lines from the geometry to the dimension line.
    pub extension_lines: Vec<Segment2D>,
    /// Where the label is anchored.
    pub text_position: Point2D,
    /// Label rotation in degrees, counter-clockwise.
    pub text_rotation: f64,
    /// Stacking index away from the geometry.
    pub layer: u32,
    /// Label formatting.
    pub format: LabelFormat,
}

impl Dimension {
    /// Formatted label, e.g. `⌀20.00`, `R5.00`, `45.00°` or `120.00 mm`.
    pub fn label(&self) -> String {
        let digits = self.format.decimal_places;
        let number = format!("{:.*}", digits, self.value);
        let mut text = match self.kind {
            DimensionKind::Diameter => format!("⌀{number}"),
            DimensionKind::Radius => format!("R{number}"),
            DimensionKind::Angle => format!("{number}°"),
            _ => number,
        };
        if self.format.show_unit && self.kind != DimensionKind::Angle {
            text.push(' ');
            text.push_str(&self.format.unit);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(kind: DimensionKind, value: f64, format: LabelFormat) -> Dimension {
        Dimension {
            kind,
            value,
            p1: Point2D::ORIGIN,
            p2: Point2D::ORIGIN,
            dim_line: Segment2D::new(Point2D::ORIGIN, Point2D::ORIGIN),
            extension_lines: Vec::new(),
            text_position: Point2D::ORIGIN,
            text_rotation: 0.0,
            layer: 0,
            format,
        }
    }

    #[test]
    fn test_labels() {
        let f = LabelFormat::default();
        assert_eq!(dim(DimensionKind::Diameter, 20.0, f.clone()).label(), "⌀20.00");
        assert_eq!(dim(DimensionKind::Radius, 5.0, f.clone()).label(), "R5.00");
        assert_eq!(dim(DimensionKind::Angle, 20.0, f.clone()).label(), "20.00°");
        assert_eq!(dim(DimensionKind::Horizontal, 120.456, f).label(), "120.46");
    }

    #[test]
    fn test_unit_suffix_skips_angles() {
        let f = LabelFormat {
            decimal_places: 1,
            unit: "mm".into(),
            show_unit: true,
        };
        assert_eq!(dim(DimensionKind::Vertical, 43.0, f.clone()).label(), "43.0 mm");
        assert_eq!(dim(DimensionKind::Radius, 2.26, f.clone()).label(), "R2.3 mm");
        assert_eq!(dim(DimensionKind::Angle, 90.0, f).label(), "90.0°");
    }

    #[test]
    fn test_zero_decimals() {
        let f = LabelFormat {
            decimal_places: 0,
            ..Default::default()
        };
        assert_eq!(dim(DimensionKind::Aligned, 9.6, f).label(), "10");
    }
}
