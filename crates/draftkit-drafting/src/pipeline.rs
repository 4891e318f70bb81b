//! End-to-end drawing generation with progress reporting and cancellation.
//!
//! The pipeline runs six named stages in order. Between stages it reports a
//! progress checkpoint and polls the sink for cancellation; a cancelled run
//! returns [`Outcome::Cancelled`] and publishes nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use draftkit_mesh::{
    decimate, extract_feature_edges, DecimationSettings, Mesh, MeshError, MeshTopology,
    RealExtents,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::arc_fit::ArcFitter;
use crate::config::DraftingConfig;
use crate::dimension::Dimension;
use crate::error::{DraftingError, Result};
use crate::features::dimension_view;
use crate::hidden_line::ProjectionEngine;
use crate::types::{ProjectedView, ViewOrientation};

/// Receives progress checkpoints and answers cancellation polls.
pub trait ProgressSink {
    /// A checkpoint was reached.
    fn report(&self, current: u32, total: u32, message: &str);

    /// Whether the run should stop before the next stage.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Mesh reduction run by the simplify stage.
///
/// An error is not fatal: the pipeline logs it and keeps the input mesh.
pub trait Simplifier {
    /// Produce a reduced copy of `mesh`.
    fn simplify(&self, mesh: &Mesh) -> std::result::Result<Mesh, MeshError>;
}

impl Simplifier for DecimationSettings {
    fn simplify(&self, mesh: &Mesh) -> std::result::Result<Mesh, MeshError> {
        decimate(mesh, self)
    }
}

/// Sink that ignores progress and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _current: u32, _total: u32, _message: &str) {}
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// New, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl ProgressSink for CancelFlag {
    fn report(&self, _current: u32, _total: u32, _message: &str) {}

    fn is_cancelled(&self) -> bool {
        self.is_set()
    }
}

/// Result of a run that may be cancelled.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The run finished.
    Completed(T),
    /// The run stopped at a stage boundary.
    Cancelled,
}

impl<T> Outcome<T> {
    /// The completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(v) => Some(v),
            Outcome::Cancelled => None,
        }
    }

    /// Whether the run was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }
}

/// Named pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Face normals and edge adjacency.
    Topology,
    /// Optional decimation.
    Simplify,
    /// Boundary and crease edge selection.
    FeatureEdges,
    /// Projection into all views.
    Projection,
    /// Circle and arc detection.
    ArcFitting,
    /// Dimension placement.
    Dimensioning,
}

impl Stage {
    /// Progress percentage reported when the stage completes.
    pub fn checkpoint(&self) -> u32 {
        match self {
            Stage::Topology => 15,
            Stage::Simplify => 35,
            Stage::FeatureEdges => 45,
            Stage::Projection => 80,
            Stage::ArcFitting => 90,
            Stage::Dimensioning => 100,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Stage::Topology => "topology",
            Stage::Simplify => "simplify",
            Stage::FeatureEdges => "feature-edges",
            Stage::Projection => "projection",
            Stage::ArcFitting => "arc-fitting",
            Stage::Dimensioning => "dimensioning",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Counts gathered while generating a drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DrawingStats {
    /// Triangles in the input mesh.
    pub input_faces: usize,
    /// Triangles after simplification. Equal to `input_faces` when skipped.
    pub simplified_faces: usize,
    /// Feature edges projected into each view.
    pub feature_edges: usize,
    /// Circles and arcs over all views.
    pub circles: usize,
    /// Dimensions over all views.
    pub dimensions: usize,
}

/// A complete multi-view drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    /// All seven views, with detected circles.
    pub views: BTreeMap<ViewOrientation, ProjectedView>,
    /// Dimensions per view.
    pub dimensions: BTreeMap<ViewOrientation, Vec<Dimension>>,
    /// Real-world size used for the overall dimensions.
    pub extents: RealExtents,
    /// Run statistics.
    pub stats: DrawingStats,
}

impl Drawing {
    /// A single view and its dimensions.
    pub fn view(&self, orientation: ViewOrientation) -> Option<(&ProjectedView, &[Dimension])> {
        let view = self.views.get(&orientation)?;
        let dims = self
            .dimensions
            .get(&orientation)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Some((view, dims))
    }
}

struct Run<'s> {
    sink: &'s dyn ProgressSink,
}

impl Run<'_> {
    /// `true` when the run should continue.
    fn proceed(&self, next: Stage) -> bool {
        if self.sink.is_cancelled() {
            info!(stage = %next, "drawing cancelled");
            return false;
        }
        true
    }

    fn done(&self, stage: Stage) {
        debug!(%stage, progress = stage.checkpoint(), "stage complete");
        self.sink.report(stage.checkpoint(), 100, &format!("{stage} done"));
    }
}

fn at(stage: Stage) -> impl FnOnce(MeshError) -> DraftingError {
    move |source| DraftingError::Stage { stage, source }
}

/// Generate a drawing sized from the mesh's own bounding box.
pub fn generate_drawing(
    mesh: &Mesh,
    config: &DraftingConfig,
    sink: &dyn ProgressSink,
) -> Result<Outcome<Drawing>> {
    generate_drawing_with_extents(mesh, &mesh.extents(), config, sink)
}

/// Generate a drawing whose overall dimensions show `extents`.
///
/// Invalid meshes fail with [`DraftingError::Stage`]. A failed decimation
/// only logs a warning; the original mesh is used instead.
pub fn generate_drawing_with_extents(
    mesh: &Mesh,
    extents: &RealExtents,
    config: &DraftingConfig,
    sink: &dyn ProgressSink,
) -> Result<Outcome<Drawing>> {
    let simplifier = config.decimation.as_ref().map(|s| s as &dyn Simplifier);
    generate_drawing_with_simplifier(mesh, extents, config, simplifier, sink)
}

/// Like [`generate_drawing_with_extents`], with `simplifier` running the
/// simplify stage in place of `config.decimation`. `None` skips it.
pub fn generate_drawing_with_simplifier(
    mesh: &Mesh,
    extents: &RealExtents,
    config: &DraftingConfig,
    simplifier: Option<&dyn Simplifier>,
    sink: &dyn ProgressSink,
) -> Result<Outcome<Drawing>> {
    config.validate()?;
    let run = Run { sink };
    sink.report(5, 100, "starting");

    if !run.proceed(Stage::Topology) {
        return Ok(Outcome::Cancelled);
    }
    let topology = MeshTopology::build(mesh).map_err(at(Stage::Topology))?;
    run.done(Stage::Topology);

    if !run.proceed(Stage::Simplify) {
        return Ok(Outcome::Cancelled);
    }
    let input_faces = mesh.num_faces();
    let simplified = match simplifier {
        Some(simplifier) => match simplifier.simplify(mesh) {
            Ok(reduced) => {
                let topo = MeshTopology::build(&reduced).map_err(at(Stage::Simplify))?;
                Some((reduced, topo))
            }
            Err(err) => {
                warn!(error = %err, "decimation failed, using original mesh");
                None
            }
        },
        None => None,
    };
    let (mesh, topology) = match &simplified {
        Some((m, t)) => (m, t),
        None => (mesh, &topology),
    };
    run.done(Stage::Simplify);

    if !run.proceed(Stage::FeatureEdges) {
        return Ok(Outcome::Cancelled);
    }
    let edges: Vec<_> = extract_feature_edges(mesh, topology, &config.features)
        .into_iter()
        .map(|f| f.edge)
        .collect();
    run.done(Stage::FeatureEdges);

    if !run.proceed(Stage::Projection) {
        return Ok(Outcome::Cancelled);
    }
    let feature_edges = edges.len();
    let engine = ProjectionEngine::new(mesh, topology, edges).with_settings(config.projection);
    let views = engine.project_all_views();
    run.done(Stage::Projection);

    if !run.proceed(Stage::ArcFitting) {
        return Ok(Outcome::Cancelled);
    }
    let fitter = ArcFitter::new(config.arcs);
    let views: BTreeMap<ViewOrientation, ProjectedView> = views
        .into_par_iter()
        .map(|(orientation, view)| {
            let circles = fitter.detect_circles(&view.edges);
            (orientation, view.with_circles(circles))
        })
        .collect();
    run.done(Stage::ArcFitting);

    if !run.proceed(Stage::Dimensioning) {
        return Ok(Outcome::Cancelled);
    }
    let dimensions: BTreeMap<ViewOrientation, Vec<Dimension>> = views
        .iter()
        .map(|(&orientation, view)| (orientation, dimension_view(view, extents, &config.dimensions)))
        .collect();
    run.done(Stage::Dimensioning);

    let stats = DrawingStats {
        input_faces,
        simplified_faces: mesh.num_faces(),
        feature_edges,
        circles: views.values().map(|v| v.circles.len()).sum(),
        dimensions: dimensions.values().map(Vec::len).sum(),
    };
    info!(
        faces = stats.simplified_faces,
        edges = stats.feature_edges,
        circles = stats.circles,
        dimensions = stats.dimensions,
        "drawing generated"
    );

    Ok(Outcome::Completed(Drawing {
        views,
        dimensions,
        extents: *extents,
        stats,
    }))
}

/// Run the pipeline on a dedicated worker thread.
///
/// Cancel through the sink, e.g. a [`CancelFlag`] clone kept by the caller.
/// Join the handle with [`join_drawing`].
pub fn spawn_drawing<S>(
    mesh: Mesh,
    extents: RealExtents,
    config: DraftingConfig,
    sink: S,
) -> Result<JoinHandle<Result<Outcome<Drawing>>>>
where
    S: ProgressSink + Send + 'static,
{
    let handle = std::thread::Builder::new()
        .name("draftkit-drawing".into())
        .spawn(move || generate_drawing_with_extents(&mesh, &extents, &config, &sink))?;
    Ok(handle)
}

/// Wait for a worker started by [`spawn_drawing`].
pub fn join_drawing(handle: JoinHandle<Result<Outcome<Drawing>>>) -> Result<Outcome<Drawing>> {
    handle.join().map_err(|_| DraftingError::WorkerPanicked)?
}
