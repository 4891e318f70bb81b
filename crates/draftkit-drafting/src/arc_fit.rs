//! Circle and arc detection in projected views.
//!
//! Edges of one visibility class are linked into chains, and every chain
//! long enough to be a tessellated circle is fitted with a
//! Levenberg-Marquardt least-squares circle. Fits with a large residual
//! spread are rejected; solver failures only skip the chain.

use std::f64::consts::TAU;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::chain::{chain_segments, Chain};
use crate::types::{Circle2D, Point2D, ProjectedEdge, Segment2D, Visibility};

/// Smallest radius the solver may move to.
const MIN_RADIUS: f64 = 1e-3;
/// Damping bounds for the solver.
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e12;

/// Tuning for [`ArcFitter`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcFitSettings {
    /// Endpoints closer than this are joined when chaining.
    pub chain_tolerance: f64,
    /// Chains with fewer segments are never fitted.
    pub min_segments: usize,
    /// Residual standard deviation must stay below this fraction of the
    /// seed radius.
    pub relative_tolerance: f64,
    /// Angular coverage in radians above which an arc counts as a full circle.
    pub full_circle_span: f64,
    /// Solver iteration cap.
    pub max_iterations: usize,
}

impl Default for ArcFitSettings {
    fn default() -> Self {
        Self {
            chain_tolerance: 0.01,
            min_segments: 8,
            relative_tolerance: 0.01,
            full_circle_span: 5.5,
            max_iterations: 100,
        }
    }
}

/// Why a single chain could not be fitted.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
enum FitError {
    #[error("normal equations are singular")]
    Singular,
    #[error("no convergence after {0} iterations")]
    NotConverged(usize),
    #[error("solver produced a non-finite estimate")]
    NonFinite,
}

/// Center and radius of a fitted circle.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CircleFit {
    cx: f64,
    cy: f64,
    r: f64,
}

impl CircleFit {
    fn residuals(&self, points: &[Point2D]) -> Vec<f64> {
        points
            .iter()
            .map(|p| (p.x - self.cx).hypot(p.y - self.cy) - self.r)
            .collect()
    }

    fn cost(&self, points: &[Point2D]) -> f64 {
        self.residuals(points).iter().map(|r| r * r).sum()
    }
}

/// Seed from the centroid and the mean distance to it.
fn seed(points: &[Point2D]) -> CircleFit {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;
    let r = points.iter().map(|p| (p.x - cx).hypot(p.y - cy)).sum::<f64>() / n;
    CircleFit {
        cx,
        cy,
        r: r.max(MIN_RADIUS),
    }
}

/// Minimize `sum((|p - c| - r)^2)` with Levenberg-Marquardt.
fn fit_circle(
    points: &[Point2D],
    start: CircleFit,
    max_iterations: usize,
) -> Result<CircleFit, FitError> {
    let mut fit = start;
    let mut cost = fit.cost(points);
    let mut lambda = LAMBDA_INIT;

    for _ in 0..max_iterations {
        let mut jtj = Matrix3::<f64>::zeros();
        let mut jtr = Vector3::<f64>::zeros();
        for p in points {
            let (dx, dy) = (p.x - fit.cx, p.y - fit.cy);
            let d = dx.hypot(dy).max(f64::EPSILON);
            let row = Vector3::new(-dx / d, -dy / d, -1.0);
            let residual = d - fit.r;
            jtj += row * row.transpose();
            jtr += row * residual;
        }

        let mut damped = jtj;
        for i in 0..3 {
            damped[(i, i)] += lambda * jtj[(i, i)].max(f64::EPSILON);
        }
        let step = damped.lu().solve(&(-jtr)).ok_or(FitError::Singular)?;

        let trial = CircleFit {
            cx: fit.cx + step.x,
            cy: fit.cy + step.y,
            r: (fit.r + step.z).max(MIN_RADIUS),
        };
        if !(trial.cx.is_finite() && trial.cy.is_finite() && trial.r.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let trial_cost = trial.cost(points);
        if trial_cost < cost {
            let scale = 1.0 + fit.cx.abs() + fit.cy.abs() + fit.r;
            let converged = step.norm() < 1e-12 * scale || cost - trial_cost < 1e-15 * cost;
            fit = trial;
            cost = trial_cost;
            lambda = (lambda / 10.0).max(f64::EPSILON);
            if converged {
                return Ok(fit);
            }
        } else {
            lambda *= 10.0;
            // No step improves on the current estimate.
            if lambda > LAMBDA_MAX {
                return Ok(fit);
            }
        }
    }
    Err(FitError::NotConverged(max_iterations))
}

/// Angular coverage of `points` around `(cx, cy)`, as
/// `(coverage, start, end)` in radians.
///
/// Coverage is the full turn minus the widest gap between consecutive
/// point angles, so arcs that cross the -pi/pi seam are measured correctly.
/// The arc runs counter-clockwise from `start` to `end`.
fn angular_coverage(points: &[Point2D], cx: f64, cy: f64) -> (f64, f64, f64) {
    let mut angles: Vec<f64> = points
        .iter()
        .map(|p| (p.y - cy).atan2(p.x - cx).rem_euclid(TAU))
        .collect();
    angles.sort_by(f64::total_cmp);

    let (Some(&first), Some(&last)) = (angles.first(), angles.last()) else {
        return (0.0, 0.0, 0.0);
    };
    // Gap wrapping from the last angle back to the first.
    let mut widest = (TAU - last + first, last, first);
    for w in angles.windows(2) {
        let gap = w[1] - w[0];
        if gap > widest.0 {
            widest = (gap, w[0], w[1]);
        }
    }
    let (gap, gap_start, gap_end) = widest;
    (TAU - gap, gap_end, gap_start)
}

/// Detects circles and arcs among a view's edges.
#[derive(Debug, Clone, Default)]
pub struct ArcFitter {
    settings: ArcFitSettings,
}

impl ArcFitter {
    /// Fitter with the given settings.
    pub fn new(settings: ArcFitSettings) -> Self {
        Self { settings }
    }

    /// Link edges into chains, one visibility class at a time.
    ///
    /// Chains shorter than three segments are discarded.
    pub fn chains(&self, edges: &[ProjectedEdge]) -> Vec<(Visibility, Chain)> {
        let mut out = Vec::new();
        for visibility in [Visibility::Visible, Visibility::Hidden] {
            let segments: Vec<Segment2D> = edges
                .iter()
                .filter(|e| e.visibility == visibility)
                .map(ProjectedEdge::segment)
                .collect();
            out.extend(
                chain_segments(&segments, self.settings.chain_tolerance)
                    .into_iter()
                    .filter(|c| c.num_segments() >= 3)
                    .map(|c| (visibility, c)),
            );
        }
        out
    }

    /// Fit one chain. `None` if it is too short, fits poorly or the solver fails.
    pub fn fit_chain(&self, chain: &Chain, visibility: Visibility) -> Option<Circle2D> {
        if chain.num_segments() < self.settings.min_segments {
            return None;
        }
        let points = &chain.points;
        let start = seed(points);
        let fit = match fit_circle(points, start, self.settings.max_iterations) {
            Ok(fit) => fit,
            Err(e) => {
                trace!(points = points.len(), error = %e, "circle fit failed");
                return None;
            }
        };

        let residuals = fit.residuals(points);
        let n = residuals.len() as f64;
        let mean = residuals.iter().sum::<f64>() / n;
        let std = (residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();
        if std >= self.settings.relative_tolerance * start.r {
            trace!(std, seed_radius = start.r, "circle fit rejected");
            return None;
        }

        let (coverage, start_angle, end_angle) = angular_coverage(points, fit.cx, fit.cy);
        let is_full_circle = coverage > self.settings.full_circle_span;
        let (start_angle, end_angle) = if is_full_circle {
            (0.0, 360.0)
        } else {
            (start_angle.to_degrees(), end_angle.to_degrees())
        };
        Some(Circle2D {
            center: Point2D::new(fit.cx, fit.cy),
            radius: fit.r,
            is_full_circle,
            visibility,
            start_angle,
            end_angle,
        })
    }

    /// Detect circles among `edges`.
    ///
    /// A circle or arc coinciding with one already found (center and radius
    /// within 1% of the radius) is reported once; visible chains are fitted
    /// first so the visible copy wins. A full circle replaces a coinciding
    /// partial arc.
    pub fn detect_circles(&self, edges: &[ProjectedEdge]) -> Vec<Circle2D> {
        let chains = self.chains(edges);
        let mut circles: Vec<Circle2D> = Vec::new();
        for (visibility, chain) in &chains {
            let Some(circle) = self.fit_chain(chain, *visibility) else {
                continue;
            };
            let same = circles.iter_mut().find(|c| {
                let tol = 0.01 * c.radius.max(circle.radius);
                c.center.distance(&circle.center) < tol && (c.radius - circle.radius).abs() < tol
            });
            match same {
                Some(c) if circle.is_full_circle && !c.is_full_circle => *c = circle,
                Some(_) => {}
                None => circles.push(circle),
            }
        }
        debug!(
            edges = edges.len(),
            chains = chains.len(),
            circles = circles.len(),
            "detected circles"
        );
        circles
    }
}
