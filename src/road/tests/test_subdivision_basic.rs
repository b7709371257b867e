use crate::geom::{Point3, Tolerance, Vec3};
use crate::road::{ControlPoint, PointControl, RoadError, orient_points, subdivide};

fn oriented(positions: &[[f64; 3]]) -> Vec<ControlPoint> {
    let points: Vec<ControlPoint> = positions
        .iter()
        .map(|&p| ControlPoint::new(Point3::from_array(p)))
        .collect();
    orient_points(&points, PointControl::Automatic, Vec3::Y)
}

#[test]
fn sample_count_is_segments_times_subdivision() {
    let points = oriented(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 0.0, 10.0]]);
    let path = subdivide(&points, 4, 1.2).expect("subdivide");

    assert_eq!(path.sample_count(), 8);
    assert_eq!(path.row_count(), 9);
    assert_eq!(path.rows().count(), 9);
}

#[test]
fn segments_start_on_their_control_points() {
    let points = oriented(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 0.0, 10.0]]);
    let path = subdivide(&points, 4, 1.2).expect("subdivide");

    let tol = Tolerance::default_geom();
    assert!(tol.approx_eq_point3(path.samples[0].position, points[0].position));
    assert!(tol.approx_eq_point3(path.samples[4].position, points[1].position));
    assert!(tol.approx_eq_point3(path.end.position, points[2].position));
}

#[test]
fn straight_path_stays_on_the_line() {
    let points = oriented(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]]);
    let path = subdivide(&points, 8, 1.2).expect("subdivide");

    let tol = Tolerance::LOOSE;
    let mut previous_x = f64::NEG_INFINITY;
    for sample in path.rows() {
        assert!(sample.position.y.abs() < 1e-9);
        assert!(sample.position.z.abs() < 1e-9);
        assert!(sample.position.x > previous_x);
        previous_x = sample.position.x;

        assert!(tol.approx_eq_vec3(sample.tangent, Vec3::X));
        assert!(tol.approx_eq_vec3(sample.normal, Vec3::Y));
        assert!(tol.approx_eq_vec3(sample.binormal, Vec3::new(0.0, 0.0, -1.0)));
    }

    let distances = path.row_distances();
    assert_eq!(distances.len(), path.row_count());
    assert!((distances[distances.len() - 1] - 10.0).abs() < 1e-9);
}

#[test]
fn frames_stay_orthonormal_through_a_bend() {
    let points = oriented(&[[0.0, 0.0, 0.0], [10.0, 2.0, 0.0], [10.0, 0.0, 10.0], [0.0, 1.0, 12.0]]);
    let path = subdivide(&points, 6, 1.2).expect("subdivide");

    for sample in path.rows() {
        assert!((sample.tangent.length() - 1.0).abs() < 1e-6);
        assert!((sample.binormal.length() - 1.0).abs() < 1e-6);
        assert!((sample.normal.length() - 1.0).abs() < 1e-6);
        assert!(sample.tangent.dot(sample.binormal).abs() < 1e-6);
        assert!(sample.normal.y > 0.0, "road surface must face up: {:?}", sample.normal);
    }
}

#[test]
fn single_point_has_no_samples() {
    let points = oriented(&[[1.0, 2.0, 3.0]]);
    let path = subdivide(&points, 4, 1.2).expect("subdivide");

    assert_eq!(path.sample_count(), 0);
    assert_eq!(path.row_count(), 1);
    assert_eq!(path.end.position, Point3::new(1.0, 2.0, 3.0));
}

#[test]
fn zero_subdivision_is_treated_as_one() {
    let points = oriented(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]]);
    let path = subdivide(&points, 0, 1.2).expect("subdivide");
    assert_eq!(path.sample_count(), 1);
    assert_eq!(path.subdivision, 1);
}

#[test]
fn empty_path_is_an_error() {
    assert_eq!(subdivide(&[], 2, 1.2), Err(RoadError::EmptyPath));
}

#[test]
fn width_scale_interpolates_between_points() {
    let mut points = oriented(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]]);
    points[1].scale.x = 3.0;
    let path = subdivide(&points, 2, 1.2).expect("subdivide");

    assert!((path.samples[0].width_scale - 1.0).abs() < 1e-12);
    assert!((path.samples[1].width_scale - 2.0).abs() < 1e-12);
    assert!((path.end.width_scale - 3.0).abs() < 1e-12);
}

#[test]
fn control_positions_recover_the_points() {
    let positions = [[0.0, 0.0, 0.0], [10.0, 1.0, 4.0], [20.0, 0.0, 0.0]];
    let path = subdivide(&oriented(&positions), 4, 1.2).expect("subdivide");

    let recovered = path.control_positions();
    assert_eq!(recovered.len(), 3);
    for (got, want) in recovered.iter().zip(positions) {
        assert!(Tolerance::LOOSE.approx_eq_point3(*got, Point3::from_array(want)), "{got:?}");
    }
}
