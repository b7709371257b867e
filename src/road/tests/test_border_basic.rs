use crate::geom::{Point3, Vec3};
use crate::road::{
    BorderOptions, BorderUvMode, ControlPoint, CrossSectionCurve, CurveKey, PointControl,
    Subdivision, build_borders, orient_points, subdivide,
};

fn straight_path(subdivision: usize) -> Subdivision {
    let points = vec![
        ControlPoint::new(Point3::ORIGIN),
        ControlPoint::new(Point3::new(10.0, 0.0, 0.0)),
    ];
    let oriented = orient_points(&points, PointControl::Automatic, Vec3::Y);
    subdivide(&oriented, subdivision, 2.0).expect("subdivide")
}

fn options() -> BorderOptions {
    BorderOptions {
        width: 2.0,
        curve: CrossSectionCurve::default(),
        uv_scale: 1.0,
        uv_mode: BorderUvMode::StraightUnwrap,
        origin: Point3::ORIGIN,
    }
}

#[test]
fn border_counts_follow_rows_and_keys() {
    let path = straight_path(2);
    let (borders, diag) = build_borders(&path, &options()).expect("borders");

    for sheet in [&borders.left, &borders.right] {
        assert_eq!(sheet.vertex_count(), 3 * 3);
        assert_eq!(sheet.indices.len(), 2 * 2 * 6);
        assert!(sheet.validate().is_ok());
    }
    assert_eq!(diag.triangle_count, 16);
    assert_eq!(diag.degenerate_triangle_count, 0);
}

#[test]
fn border_sheets_sit_outside_the_ribbon_and_follow_the_profile() {
    let path = straight_path(1);
    let (borders, _) = build_borders(&path, &options()).expect("borders");

    let keys = CrossSectionCurve::default();
    for (i, position) in borders.left.positions.iter().enumerate() {
        let key = keys.keys()[i % keys.len()];
        assert!((position[2] - (1.0 + key.x)).abs() < 1e-9, "left vertex {i}: {position:?}");
        assert!((position[1] - key.y).abs() < 1e-9);
    }
    for (i, position) in borders.right.positions.iter().enumerate() {
        let key = keys.keys()[i % keys.len()];
        assert!((position[2] + 1.0 + key.x).abs() < 1e-9, "right vertex {i}: {position:?}");
    }
}

#[test]
fn both_sheets_face_up() {
    let path = straight_path(3);
    let (borders, _) = build_borders(&path, &options()).expect("borders");

    for sheet in [&borders.left, &borders.right] {
        for tri in 0..sheet.triangle_count() {
            let normal = sheet.face_normal(tri).expect("normal");
            assert!(normal[1] > 0.0, "triangle {tri} faces down: {normal:?}");
        }
    }
}

#[test]
fn straight_unwrap_uses_key_distance_and_arc_length() {
    let path = straight_path(1);
    let opts = BorderOptions {
        uv_scale: 2.0,
        ..options()
    };
    let (borders, _) = build_borders(&path, &opts).expect("borders");
    let uvs = borders.left.uvs.expect("uvs");

    let key = CurveKey::new(0.3, 0.6);
    assert!((uvs[1][0] - key.distance_from_origin() * 2.0).abs() < 1e-12);
    assert_eq!(uvs[1][1], 0.0);
    // Closing row: arc length 10 scaled by 2.
    assert!((uvs[4][1] - 20.0).abs() < 1e-9);
}

#[test]
fn top_project_uses_world_xz() {
    let path = straight_path(1);
    let opts = BorderOptions {
        uv_mode: BorderUvMode::TopProject,
        uv_scale: 0.5,
        ..options()
    };
    let (borders, _) = build_borders(&path, &opts).expect("borders");
    let positions = &borders.right.positions;
    let uvs = borders.right.uvs.as_ref().expect("uvs");

    for (p, uv) in positions.iter().zip(uvs) {
        assert!((uv[0] - p[0] * 0.5).abs() < 1e-12);
        assert!((uv[1] - p[2] * 0.5).abs() < 1e-12);
    }
}

#[test]
fn empty_profile_or_single_point_yields_empty_sheets() {
    let path = straight_path(1);
    let opts = BorderOptions {
        curve: CrossSectionCurve::empty(),
        ..options()
    };
    let (borders, diag) = build_borders(&path, &opts).expect("borders");
    assert!(borders.is_empty());
    assert!(diag.has_warnings());

    let single = subdivide(&[ControlPoint::new(Point3::ORIGIN)], 1, 2.0).expect("subdivide");
    let (borders, diag) = build_borders(&single, &options()).expect("borders");
    assert!(borders.is_empty());
    assert!(diag.has_warnings());
}
