//! End-to-end drawing properties.

use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use draftkit_drafting::{
    generate_drawing, generate_drawing_with_extents, generate_drawing_with_simplifier,
    join_drawing, spawn_drawing, ArcFitSettings, ArcFitter, CancelFlag, DimensionKind,
    DimensionPlacer, DraftingConfig, NoProgress, Outcome, Point2D, ProgressSink, ProjectedView,
    ProjectionEngine, Simplifier, ViewOrientation,
};
use draftkit_mesh::{
    extract_feature_edges, primitives, DecimationSettings, FeatureEdgeSettings, Mesh, MeshError,
    MeshTopology, RealExtents,
};

fn engine_edges(mesh: &Mesh, topo: &MeshTopology) -> Vec<draftkit_mesh::EdgeKey> {
    extract_feature_edges(mesh, topo, &FeatureEdgeSettings::default())
        .into_iter()
        .map(|f| f.edge)
        .collect()
}

/// Records checkpoints and cancels once `cancel_at` has been reported.
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<u32>>,
    cancel_at: Option<u32>,
}

impl ProgressSink for Recorder {
    fn report(&self, current: u32, total: u32, _message: &str) {
        assert_eq!(total, 100);
        self.seen.lock().unwrap().push(current);
    }

    fn is_cancelled(&self) -> bool {
        match self.cancel_at {
            Some(limit) => self.seen.lock().unwrap().iter().any(|&p| p >= limit),
            None => false,
        }
    }
}

#[test]
fn face_normals_are_unit_length() {
    for mesh in [primitives::cube(3.0), primitives::cylinder(5.0, 2.0, 40), primitives::l_bracket()] {
        let topo = MeshTopology::build(&mesh).unwrap();
        for n in topo.face_normals() {
            assert_relative_eq!(n.dot(n), 1.0, epsilon = 1e-12);
        }
    }
}

#[test]
fn cube_front_view_outline() {
    let drawing = generate_drawing(&primitives::cube(1.0), &DraftingConfig::default(), &NoProgress)
        .unwrap()
        .completed()
        .unwrap();
    let (front, dims) = drawing.view(ViewOrientation::Front).unwrap();

    assert_relative_eq!(front.width(), 1.0, epsilon = 1e-12);
    assert_relative_eq!(front.height(), 1.0, epsilon = 1e-12);
    assert_eq!(front.silhouette_edges().filter(|e| e.is_visible()).count(), 4);
    assert_eq!(dims.len(), 2);
    assert_eq!(dims[0].value, 1.0);
    // Both overall dimensions sit on the first layer, 8% of the span out.
    assert_eq!((dims[0].layer, dims[1].layer), (0, 0));
    assert_relative_eq!(dims[0].dim_line.start.y, front.bounds.min_y - 0.08, epsilon = 1e-12);
    assert_relative_eq!(dims[1].dim_line.start.x, front.bounds.max_x + 0.08, epsilon = 1e-12);
}

#[test]
fn flat_plate_seen_edge_on_keeps_its_length() {
    // 10 x 5 quad in the XY plane.
    let positions = [0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 10.0, 5.0, 0.0, 0.0, 5.0, 0.0];
    let mesh = Mesh::from_flat(&positions, &[0, 1, 2, 0, 2, 3]).unwrap();
    let drawing = generate_drawing(&mesh, &DraftingConfig::default(), &NoProgress)
        .unwrap()
        .completed()
        .unwrap();

    let (top, dims) = drawing.view(ViewOrientation::Top).unwrap();
    assert!(!top.is_empty());
    assert_eq!(top.height(), 0.0);
    assert_eq!(dims.len(), 1);
    assert_eq!(dims[0].kind, DimensionKind::Horizontal);
    assert_relative_eq!(dims[0].value, 10.0, epsilon = 1e-6);

    let (_, dims) = drawing.view(ViewOrientation::Left).unwrap();
    assert_eq!(dims.len(), 1);
    assert_eq!(dims[0].kind, DimensionKind::Vertical);
    assert_relative_eq!(dims[0].value, 5.0, epsilon = 1e-6);

    let (_, dims) = drawing.view(ViewOrientation::Front).unwrap();
    assert_eq!(dims.len(), 2);
}

#[test]
fn cylinder_top_view_has_circle() {
    let radius = 12.5;
    let mesh = primitives::cylinder(radius, 30.0, 32);
    let topo = MeshTopology::build(&mesh).unwrap();
    let engine = ProjectionEngine::new(&mesh, &topo, engine_edges(&mesh, &topo));
    let top = engine.project_view(ViewOrientation::Top);

    let circles = ArcFitter::new(ArcFitSettings::default()).detect_circles(&top.edges);
    assert!(circles
        .iter()
        .any(|c| c.is_full_circle && (c.radius - radius).abs() / radius < 0.05));
}

#[test]
fn boundary_edges_are_always_silhouettes() {
    // Open box: drop the last two triangles.
    let closed = primitives::box_mesh(2.0, 1.0, 3.0);
    let mut faces = closed.faces().to_vec();
    faces.truncate(faces.len() - 2);
    let mesh = Mesh::new(closed.vertices().to_vec(), faces).unwrap();
    let topo = MeshTopology::build(&mesh).unwrap();
    assert!(topo.num_boundary_edges() > 0);

    let engine = ProjectionEngine::new(&mesh, &topo, mesh.unique_edges());
    for (orientation, view) in engine.project_all_views() {
        for e in &view.edges {
            if topo.adjacent_faces(e.edge).len() == 1 {
                assert!(e.silhouette, "{orientation}: boundary edge not on silhouette");
            }
        }
    }
}

#[test]
fn projection_is_repeatable() {
    let mesh = primitives::l_bracket();
    let topo = MeshTopology::build(&mesh).unwrap();
    let engine = ProjectionEngine::new(&mesh, &topo, engine_edges(&mesh, &topo));
    for orientation in ViewOrientation::ALL {
        assert_eq!(engine.project_view(orientation), engine.project_view(orientation));
    }

    let config = DraftingConfig::default();
    let a = generate_drawing(&mesh, &config, &NoProgress).unwrap();
    let b = generate_drawing(&mesh, &config, &NoProgress).unwrap();
    assert_eq!(a, b);
}

#[test]
fn empty_view_gets_no_dimensions() {
    let view = ProjectedView::new(ViewOrientation::Front);
    let dims = DimensionPlacer::default().auto_dimension_view(&view, &RealExtents::new(1.0, 2.0, 3.0));
    assert!(dims.is_empty());
}

#[test]
fn overlapping_dimensions_stack_in_layers() {
    let mut placer = DimensionPlacer::default();
    let layers: Vec<u32> = (0..8)
        .map(|i| {
            let x = f64::from(i);
            placer
                .horizontal(Point2D::new(x, 0.0), Point2D::new(x + 40.0, 0.0), 40.0, 10.0)
                .layer
        })
        .collect();
    assert_eq!(layers, vec![0, 1, 2, 3, 4, 4, 4, 4]);
    assert!(layers.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn angle_wraps_through_zero() {
    let mut placer = DimensionPlacer::default();
    let dim = placer.angle(Point2D::ORIGIN, 10.0, 350.0);
    assert_eq!(dim.kind, DimensionKind::Angle);
    assert_relative_eq!(dim.value, 20.0);
}

#[test]
fn views_use_matching_extents() {
    let mesh = primitives::box_mesh(2.0, 1.0, 3.0);
    let drawing = generate_drawing(&mesh, &DraftingConfig::default(), &NoProgress)
        .unwrap()
        .completed()
        .unwrap();

    let expect = [
        (ViewOrientation::Front, (2.0, 1.0)),
        (ViewOrientation::Back, (2.0, 1.0)),
        (ViewOrientation::Top, (2.0, 3.0)),
        (ViewOrientation::Bottom, (2.0, 3.0)),
        (ViewOrientation::Left, (3.0, 1.0)),
        (ViewOrientation::Right, (3.0, 1.0)),
    ];
    for (orientation, (w, h)) in expect {
        let (view, dims) = drawing.view(orientation).unwrap();
        assert_relative_eq!(view.width(), w, epsilon = 1e-12);
        assert_relative_eq!(view.height(), h, epsilon = 1e-12);
        assert_eq!(dims.len(), 2, "{orientation}");
        assert_eq!(dims[0].kind, DimensionKind::Horizontal);
        assert_relative_eq!(dims[0].value, w, epsilon = 1e-12);
        assert_eq!(dims[1].kind, DimensionKind::Vertical);
        assert_relative_eq!(dims[1].value, h, epsilon = 1e-12);
    }
    let (iso, iso_dims) = drawing.view(ViewOrientation::Isometric).unwrap();
    assert!(!iso.is_empty());
    assert!(iso_dims.is_empty());
}

#[test]
fn caller_extents_label_the_drawing() {
    let mesh = primitives::cube(1.0);
    let real = RealExtents::new(25.0, 40.0, 10.0);
    let drawing = generate_drawing_with_extents(&mesh, &real, &DraftingConfig::default(), &NoProgress)
        .unwrap()
        .completed()
        .unwrap();
    let (_, dims) = drawing.view(ViewOrientation::Top).unwrap();
    assert_eq!((dims[0].value, dims[1].value), (25.0, 10.0));
    assert_eq!(drawing.extents, real);
}

#[test]
fn progress_checkpoints_in_order() {
    let sink = Recorder::default();
    let outcome = generate_drawing(&primitives::cube(1.0), &DraftingConfig::default(), &sink).unwrap();
    assert!(!outcome.is_cancelled());
    assert_eq!(*sink.seen.lock().unwrap(), vec![5, 15, 35, 45, 80, 90, 100]);
}

#[test]
fn cancellation_stops_between_stages() {
    let flag = CancelFlag::new();
    flag.cancel();
    let outcome = generate_drawing(&primitives::cube(1.0), &DraftingConfig::default(), &flag).unwrap();
    assert_eq!(outcome, Outcome::Cancelled);

    let sink = Recorder {
        cancel_at: Some(45),
        ..Default::default()
    };
    let outcome = generate_drawing(&primitives::cube(1.0), &DraftingConfig::default(), &sink).unwrap();
    assert!(outcome.is_cancelled());
    assert_eq!(*sink.seen.lock().unwrap(), vec![5, 15, 35, 45]);
}

#[test]
fn decimation_keeps_small_meshes() {
    let mesh = primitives::cylinder(5.0, 10.0, 24);
    let config = DraftingConfig {
        decimation: Some(DecimationSettings::default()),
        ..Default::default()
    };
    let drawing = generate_drawing(&mesh, &config, &NoProgress)
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(drawing.stats.input_faces, mesh.num_faces());
    assert_eq!(drawing.stats.simplified_faces, mesh.num_faces());
    assert!(drawing.stats.circles >= 1);
}

/// Simplifier that always fails.
struct Broken;

impl Simplifier for Broken {
    fn simplify(&self, _mesh: &Mesh) -> Result<Mesh, MeshError> {
        Err(MeshError::DecimationFailed("every triangle collapsed".to_string()))
    }
}

#[test]
fn failed_decimation_falls_back_to_input() {
    let mesh = primitives::cylinder(5.0, 10.0, 24);
    let sink = Recorder::default();
    let drawing = generate_drawing_with_simplifier(
        &mesh,
        &mesh.extents(),
        &DraftingConfig::default(),
        Some(&Broken),
        &sink,
    )
    .unwrap()
    .completed()
    .unwrap();

    assert_eq!(drawing.stats.simplified_faces, drawing.stats.input_faces);
    assert_eq!(drawing.stats.input_faces, mesh.num_faces());
    assert_eq!(drawing.views.len(), 7);
    assert_eq!(*sink.seen.lock().unwrap(), vec![5, 15, 35, 45, 80, 90, 100]);

    let plain = generate_drawing(&mesh, &DraftingConfig::default(), &NoProgress).unwrap();
    assert_eq!(Outcome::Completed(drawing), plain);
}

#[test]
fn worker_thread_runs_pipeline() {
    let flag = CancelFlag::new();
    let handle = spawn_drawing(
        primitives::l_bracket(),
        RealExtents::new(40.0, 43.0, 30.0),
        DraftingConfig::default(),
        flag.clone(),
    )
    .unwrap();
    let drawing = join_drawing(handle).unwrap().completed().unwrap();
    assert_eq!(drawing.views.len(), 7);
    assert_eq!(drawing.dimensions[&ViewOrientation::Front][0].value, 40.0);

    let shared = Arc::new(Recorder {
        cancel_at: Some(5),
        ..Default::default()
    });
    struct Shared(Arc<Recorder>);
    impl ProgressSink for Shared {
        fn report(&self, current: u32, total: u32, message: &str) {
            self.0.report(current, total, message);
        }
        fn is_cancelled(&self) -> bool {
            self.0.is_cancelled()
        }
    }
    let handle = spawn_drawing(
        primitives::cube(1.0),
        RealExtents::new(1.0, 1.0, 1.0),
        DraftingConfig::default(),
        Shared(shared.clone()),
    )
    .unwrap();
    assert!(join_drawing(handle).unwrap().is_cancelled());
    assert_eq!(*shared.seen.lock().unwrap(), vec![5]);
}

#[test]
fn drawing_serializes_to_json() {
    let drawing = generate_drawing(&primitives::l_bracket(), &DraftingConfig::default(), &NoProgress)
        .unwrap()
        .completed()
        .unwrap();
    let json = serde_json::to_value(&drawing).unwrap();
    assert!(json["views"]["front"]["edges"].as_array().is_some_and(|e| !e.is_empty()));
    assert_eq!(json["dimensions"]["isometric"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["stats"]["input_faces"], drawing.stats.input_faces);
}

#[test]
fn config_from_toml() {
    let config = DraftingConfig::from_toml_str(
        r#"
        [arcs]
        min_segments = 12

        [dimensions]
        layer_stride = 6.0
        unit = "in"
        "#,
    )
    .unwrap();
    assert_eq!(config.arcs.min_segments, 12);
    assert_eq!(config.dimensions.layer_stride, 6.0);
    assert_eq!(config.dimensions.unit, "in");
    assert_eq!(config.features, FeatureEdgeSettings::default());
}
