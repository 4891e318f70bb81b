//! Linking 2D segments into polylines.

use std::collections::HashMap;

use crate::types::{Point2D, Segment2D};

/// A connected run of segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    /// Polyline vertices. A closed chain does not repeat its first point.
    pub points: Vec<Point2D>,
    /// The last point meets the first.
    pub closed: bool,
}

impl Chain {
    /// Number of segments in the chain.
    pub fn num_segments(&self) -> usize {
        if self.closed {
            self.points.len()
        } else {
            self.points.len().saturating_sub(1)
        }
    }
}

/// Grid cell of a point. Neighbouring cells are searched too, so points within
/// `tolerance` of each other always meet even across a cell border.
fn point_key(p: &Point2D, tolerance: f64) -> (i64, i64) {
    (
        (p.x / tolerance).floor() as i64,
        (p.y / tolerance).floor() as i64,
    )
}

struct EndpointIndex<'a> {
    segments: &'a [Segment2D],
    cells: HashMap<(i64, i64), Vec<(usize, bool)>>,
    tolerance: f64,
}

impl<'a> EndpointIndex<'a> {
    fn new(segments: &'a [Segment2D], tolerance: f64) -> Self {
        let mut cells: HashMap<(i64, i64), Vec<(usize, bool)>> = HashMap::new();
        for (i, s) in segments.iter().enumerate() {
            cells
                .entry(point_key(&s.start, tolerance))
                .or_default()
                .push((i, false));
            cells
                .entry(point_key(&s.end, tolerance))
                .or_default()
                .push((i, true));
        }
        Self {
            segments,
            cells,
            tolerance,
        }
    }

    /// First unused segment with an endpoint within tolerance of `p`, and the
    /// point at its other end.
    fn next_from(&self, p: &Point2D, used: &[bool]) -> Option<(usize, Point2D)> {
        let (cx, cy) = point_key(p, self.tolerance);
        let mut best: Option<(usize, bool)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(candidates) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &(i, at_end) in candidates {
                    if used[i] {
                        continue;
                    }
                    let s = &self.segments[i];
                    let q = if at_end { &s.end } else { &s.start };
                    if q.distance(p) >= self.tolerance {
                        continue;
                    }
                    // Lowest index wins so the result does not depend on hash order.
                    if best.map_or(true, |(j, _)| i < j) {
                        best = Some((i, at_end));
                    }
                }
            }
        }
        best.map(|(i, at_end)| {
            let s = &self.segments[i];
            // Matched at the end: walk the segment in reverse.
            (i, if at_end { s.start } else { s.end })
        })
    }
}

/// Greedily link segments whose endpoints meet within `tolerance`.
///
/// Each chain starts from the lowest-index unused segment and is extended
/// forward from its end, then backward from its start. Segments may be
/// traversed in reverse.
pub fn chain_segments(segments: &[Segment2D], tolerance: f64) -> Vec<Chain> {
    if segments.is_empty() {
        return Vec::new();
    }

    let index = EndpointIndex::new(segments, tolerance);
    let mut used = vec![false; segments.len()];
    let mut chains = Vec::new();

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;
        let first = segments[start_idx];
        let mut forward = vec![first.start, first.end];

        let mut current = first.end;
        while let Some((i, next)) = index.next_from(&current, &used) {
            used[i] = true;
            forward.push(next);
            current = next;
        }

        let mut backward = Vec::new();
        let mut current = first.start;
        while let Some((i, next)) = index.next_from(&current, &used) {
            used[i] = true;
            backward.push(next);
            current = next;
        }

        backward.reverse();
        backward.extend(forward);
        let mut points = backward;

        let closed = points.len() >= 4
            && points
                .first()
                .zip(points.last())
                .is_some_and(|(a, b)| a.distance(b) < tolerance);
        if closed {
            points.pop();
        }
        chains.push(Chain { points, closed });
    }

    chains
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment2D {
        Segment2D::new(Point2D::new(x0, y0), Point2D::new(x1, y1))
    }

    #[test]
    fn test_square_closes() {
        let segs = [
            seg(0.0, 0.0, 1.0, 0.0),
            seg(1.0, 1.0, 1.0, 0.0), // reversed
            seg(1.0, 1.0, 0.0, 1.0),
            seg(0.0, 0.0, 0.0, 1.0), // reversed
        ];
        let chains = chain_segments(&segs, 0.01);
        assert_eq!(chains.len(), 1);
        assert!(chains[0].closed);
        assert_eq!(chains[0].points.len(), 4);
        assert_eq!(chains[0].num_segments(), 4);
    }

    #[test]
    fn test_backward_extension() {
        // Start segment sits in the middle of the run.
        let segs = [
            seg(1.0, 0.0, 2.0, 0.0),
            seg(2.0, 0.0, 3.0, 0.0),
            seg(0.0, 0.0, 1.0, 0.0),
        ];
        let chains = chain_segments(&segs, 0.01);
        assert_eq!(chains.len(), 1);
        assert!(!chains[0].closed);
        assert_eq!(chains[0].points.first(), Some(&Point2D::new(0.0, 0.0)));
        assert_eq!(chains[0].points.last(), Some(&Point2D::new(3.0, 0.0)));
        assert_eq!(chains[0].num_segments(), 3);
    }

    #[test]
    fn test_tolerance_across_cell_border() {
        // 0.0999 and 0.1001 land in different 0.01 cells.
        let segs = [seg(0.0, 0.0, 0.0999, 0.0), seg(0.1001, 0.0, 0.2, 0.0)];
        let chains = chain_segments(&segs, 0.01);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].points.len(), 3);
    }

    #[test]
    fn test_disjoint_segments() {
        let segs = [seg(0.0, 0.0, 1.0, 0.0), seg(5.0, 5.0, 6.0, 5.0)];
        let chains = chain_segments(&segs, 0.01);
        assert_eq!(chains.len(), 2);
        assert!(chain_segments(&[], 0.01).is_empty());
    }
}
