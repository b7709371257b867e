use crate::geom::{Frame, Point3, Tolerance, Vec3};
use crate::road::{
    ControlPoint, GroundHit, GroundProbe, MorphOutcome, PathTracer, RoadConfig, RoadError,
    RoadMeshGen, TerrainGrid, UpdateMode, no_progress,
};

fn straight(config: RoadConfig) -> RoadMeshGen {
    let points = vec![
        ControlPoint::new(Point3::ORIGIN),
        ControlPoint::new(Point3::new(10.0, 0.0, 0.0)),
    ];
    RoadMeshGen::with_points(config, points).expect("generator")
}

#[test]
fn new_generator_starts_with_one_point() {
    let generator = RoadMeshGen::new(RoadConfig::default()).expect("generator");

    assert_eq!(generator.point_count(), 1);
    assert_eq!(generator.revision(), 1);
    assert_eq!(generator.meshes().ribbon.vertex_count(), 2);
    assert_eq!(generator.meshes().ribbon.triangle_count(), 0);
    assert!(generator.meshes().borders.is_none());

    let query = Point3::new(4.0, 2.0, -3.0);
    assert_eq!(generator.closest_point_on_path(query), Point3::ORIGIN);
}

#[test]
fn create_point_appends_one_width_ahead() {
    let mut generator = RoadMeshGen::new(RoadConfig::default()).expect("generator");

    let index = generator.create_point(None).expect("create");
    assert_eq!(index, 1);
    let created = generator.points()[1].position;
    assert!(Tolerance::LOOSE.approx_eq_point3(created, Point3::new(0.0, 0.0, 1.2)));

    let ribbon = &generator.meshes().ribbon;
    assert_eq!(ribbon.vertex_count(), 4);
    assert_eq!(ribbon.indices.len(), 6);
}

#[test]
fn create_point_inserts_after_its_anchor() {
    let mut generator = straight(RoadConfig::default());

    let index = generator.create_point(Some(0)).expect("create");
    assert_eq!(index, 1);
    assert_eq!(generator.point_count(), 3);
    assert!(Tolerance::LOOSE.approx_eq_point3(generator.points()[1].position, Point3::new(1.2, 0.0, 0.0)));
    assert_eq!(generator.points()[2].position, Point3::new(10.0, 0.0, 0.0));
}

#[test]
fn snapped_anchor_refuses_new_points() {
    let mut generator = straight(RoadConfig::default());
    let frame = generator.points()[0].frame;
    generator.snap_point(0, Point3::new(0.0, 1.0, 0.0), frame).expect("snap");

    assert_eq!(generator.create_point(Some(0)), Err(RoadError::SnappedAnchor(0)));
    assert_eq!(generator.point_count(), 2);

    generator.unsnap_point(0).expect("unsnap");
    assert!(generator.create_point(Some(0)).is_ok());
}

#[test]
fn delete_point_keeps_at_least_one() {
    let mut generator = straight(RoadConfig::default());

    assert_eq!(
        generator.delete_point(Some(5)),
        Err(RoadError::IndexOutOfRange { index: 5, len: 2 })
    );

    let removed = generator.delete_point(None).expect("delete");
    assert_eq!(removed.position, Point3::new(10.0, 0.0, 0.0));
    assert_eq!(generator.point_count(), 1);
    assert_eq!(generator.delete_point(None), Err(RoadError::EmptyPath));
}

#[test]
fn reset_returns_to_a_single_origin_point() {
    let config = RoadConfig {
        origin: Point3::new(1.0, 0.0, 1.0),
        ..RoadConfig::default()
    };
    let mut generator = straight(config);
    generator.reset().expect("reset");

    assert_eq!(generator.point_count(), 1);
    assert_eq!(generator.points()[0].position, Point3::new(1.0, 0.0, 1.0));
}

#[test]
fn invalid_config_keeps_previous_state() {
    let mut generator = straight(RoadConfig::default());
    let revision = generator.revision();
    let meshes = generator.meshes().clone();

    let bad = RoadConfig {
        width: -1.0,
        ..RoadConfig::default()
    };
    assert_eq!(generator.set_config(bad).err(), Some(RoadError::InvalidWidth(-1.0)));
    assert_eq!(generator.revision(), revision);
    assert_eq!(generator.meshes(), &meshes);
    assert_eq!(generator.config(), &RoadConfig::default());
}

#[test]
fn borders_follow_the_config() {
    let mut generator = straight(RoadConfig::default());
    let config = RoadConfig {
        borders_enabled: true,
        ..RoadConfig::default()
    };
    let meshes = generator.set_config(config).expect("config");

    let borders = meshes.borders.as_ref().expect("borders");
    assert_eq!(borders.left.vertex_count(), 6);
    assert_eq!(borders.right.vertex_count(), 6);
    assert_eq!(meshes.diagnostics.triangle_count, 2 + 4 + 4);
}

#[test]
fn tick_only_regenerates_in_realtime_mode() {
    let mut generator = straight(RoadConfig::default());
    let revision = generator.revision();

    assert_eq!(generator.tick(), Ok(false));
    assert_eq!(generator.revision(), revision);

    let realtime = RoadConfig {
        update_mode: UpdateMode::Realtime,
        ..RoadConfig::default()
    };
    generator.set_config(realtime).expect("config");
    let revision = generator.revision();
    assert_eq!(generator.tick(), Ok(true));
    assert_eq!(generator.revision(), revision + 1);
}

#[test]
fn locked_width_survives_a_wider_road() {
    let mut generator = straight(RoadConfig::default());
    generator.lock_width(1, true).expect("lock");

    let wider = RoadConfig {
        width: 2.4,
        ..RoadConfig::default()
    };
    let meshes = generator.set_config(wider).expect("config");
    let p = &meshes.ribbon.positions;

    let start = Point3::from(p[0]).distance_to(Point3::from(p[1]));
    let end = Point3::from(p[2]).distance_to(Point3::from(p[3]));
    assert!((start - 2.4).abs() < 1e-9);
    assert!((end - 1.2).abs() < 1e-9);
}

#[test]
fn non_finite_edits_are_rejected() {
    let mut generator = straight(RoadConfig::default());
    let frame = generator.points()[0].frame;

    assert_eq!(
        generator.set_point_transform(0, Point3::new(f64::NAN, 0.0, 0.0), frame),
        Err(RoadError::NonFinitePoint(0))
    );
    assert_eq!(
        generator.set_point_scale(1, Vec3::new(1.0, f64::INFINITY, 1.0)),
        Err(RoadError::NonFinitePoint(1))
    );
    assert_eq!(generator.set_points(Vec::new()), Err(RoadError::EmptyPath));
    assert_eq!(generator.points()[0].position, Point3::ORIGIN);
}

struct RaisedGround;

impl GroundProbe for RaisedGround {
    fn cast_down(&self, origin: Point3) -> Option<GroundHit> {
        Some(GroundHit {
            point: Point3::new(origin.x, 2.0, origin.z),
            normal: Vec3::Y,
            terrain: None,
        })
    }
}

#[test]
fn ground_points_drop_onto_the_probe() {
    let mut generator = straight(RoadConfig::default());
    let grounded = generator.ground_points(&RaisedGround, 0.5).expect("ground");

    assert_eq!(grounded, 2);
    for point in generator.points() {
        assert!((point.position.y - 2.5).abs() < 1e-12);
        assert!(Tolerance::LOOSE.approx_eq_vec3(point.up(), Vec3::Y));
        assert!(Tolerance::LOOSE.approx_eq_vec3(point.forward(), Vec3::X));
    }
}

#[test]
fn tracer_notices_regenerated_paths() {
    let mut generator = straight(RoadConfig::default());
    let mut tracer = PathTracer::new();
    tracer.trace_path(0, &generator, 0.0, 0.0).expect("trace");
    assert!((tracer.total_length(0).expect("length") - 10.0).abs() < 1e-9);

    let frame = generator.points()[1].frame;
    generator
        .set_point_transform(1, Point3::new(20.0, 0.0, 0.0), frame)
        .expect("move");
    generator.regenerate().expect("regenerate");

    assert!(tracer.is_stale(0, &generator));
    assert_eq!(tracer.refresh_stale(&generator), 1);
    assert!((tracer.total_length(0).expect("length") - 20.0).abs() < 1e-9);
}

#[test]
fn queries_describe_the_last_regeneration() {
    let positions = [[0.0, 0.0, 0.0], [10.0, 0.0, 3.0], [20.0, 0.0, 0.0]];
    let points: Vec<ControlPoint> = positions
        .iter()
        .map(|&p| ControlPoint::new(Point3::from_array(p)))
        .collect();
    let config = RoadConfig {
        subdivision: 4,
        ..RoadConfig::default()
    };
    let mut generator = RoadMeshGen::with_points(config, points.clone()).expect("generator");
    let mut tracer = PathTracer::new();
    tracer.trace_path(0, &generator, 0.0, 0.0).expect("trace");
    let before = generator.oriented_samples_at(0.0, 0.0);

    // Unoriented points are pending until the next regeneration.
    generator.set_points(points).expect("points");
    assert_eq!(generator.revision(), 1);
    assert_eq!(generator.oriented_samples_at(0.0, 0.0), before);
    assert!(!tracer.is_stale(0, &generator));

    let ribbon = &generator.meshes().ribbon.positions;
    assert_eq!(ribbon.len(), 2 * before.len());
    for (row, sample) in before.iter().enumerate() {
        let centre = Point3::from(ribbon[2 * row]).lerp(Point3::from(ribbon[2 * row + 1]), 0.5);
        assert!(Tolerance::LOOSE.approx_eq_point3(centre, sample.position), "row {row}");
        let projected = generator.closest_point_on_path(sample.position);
        assert!(Tolerance::LOOSE.approx_eq_point3(projected, sample.position), "row {row}");
    }

    generator.regenerate().expect("regenerate");
    assert_eq!(generator.revision(), 2);
    for (a, b) in generator.oriented_samples_at(0.0, 0.0).iter().zip(&before) {
        assert!(Tolerance::LOOSE.approx_eq_point3(a.position, b.position));
    }
}

#[test]
fn failed_insert_leaves_the_path_alone() {
    let config = RoadConfig {
        width: 1e308,
        ..RoadConfig::default()
    };
    let frame = Frame::look_rotation(Vec3::X, Vec3::Y).expect("frame");
    let anchor = ControlPoint::with_frame(Point3::new(1e308, 0.0, 0.0), frame);
    let mut generator = RoadMeshGen::with_points(config, vec![anchor]).expect("generator");
    let meshes = generator.meshes().clone();

    // One road width ahead of the anchor overflows to infinity.
    assert_eq!(generator.create_point(None), Err(RoadError::NonFinitePoint(1)));
    assert_eq!(generator.point_count(), 1);
    assert_eq!(generator.revision(), 1);
    assert_eq!(generator.meshes(), &meshes);
    assert!(generator.regenerate().is_ok());
}

#[test]
fn generator_morphs_terrain_with_its_config() {
    let config = RoadConfig {
        width: 4.0,
        terrain_smoothing: 1.0,
        ground_offset: 0.1,
        ..RoadConfig::default()
    };
    let points = vec![
        ControlPoint::new(Point3::new(0.0, 7.0, 25.0)),
        ControlPoint::new(Point3::new(50.0, 7.0, 25.0)),
    ];
    let mut generator = RoadMeshGen::with_points(config, points).expect("generator");
    let mut grid = TerrainGrid::flat(Point3::ORIGIN, Vec3::new(50.0, 10.0, 50.0), 100, 0.5);

    let outcome = generator.morph_terrain(&mut grid, &mut no_progress).expect("morph");

    assert!(matches!(outcome, MorphOutcome::Applied(_)));
    assert!((grid.height_at(10, 50).expect("texel") - 0.69).abs() < 1e-9);
    assert_eq!(grid.height_at(10, 10), Some(0.5));
}

#[test]
fn finalize_hands_out_the_last_meshes() {
    let generator = straight(RoadConfig::default());
    let meshes = generator.meshes().clone();

    let finalized = generator.finalize(false);
    assert!(finalized.clear_dependents);
    assert_eq!(finalized.meshes, meshes);

    let finalized = straight(RoadConfig::default()).finalize(true);
    assert!(!finalized.clear_dependents);
}
