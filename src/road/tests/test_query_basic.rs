use crate::geom::{Point3, Tolerance, Vec3};
use crate::road::{
    ControlPoint, OrientedSample, PointControl, closest_point_on_path, orient_points,
    oriented_samples_at, subdivide,
};
use crate::road::query::closest_point_within_path;

fn samples_for(positions: &[[f64; 3]], subdivision: usize) -> Vec<OrientedSample> {
    let points: Vec<ControlPoint> = positions
        .iter()
        .map(|&p| ControlPoint::new(Point3::from_array(p)))
        .collect();
    let oriented = orient_points(&points, PointControl::Automatic, Vec3::Y);
    let path = subdivide(&oriented, subdivision, 1.2).expect("subdivide");
    oriented_samples_at(&path, 0.0, 0.0)
}

#[test]
fn closest_point_on_an_l_shaped_path() {
    let samples = samples_for(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 0.0, 10.0]], 1);
    assert_eq!(samples.len(), 3);

    let projected = closest_point_on_path(Point3::new(8.0, 0.0, 2.0), &samples);
    assert!(
        Tolerance::LOOSE.approx_eq_point3(projected, Point3::new(8.0, 0.0, 0.0)),
        "got {projected:?}"
    );
}

#[test]
fn offsets_move_along_binormal_and_normal() {
    let points: Vec<ControlPoint> = [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]]
        .iter()
        .map(|&p| ControlPoint::new(Point3::from_array(p)))
        .collect();
    let oriented = orient_points(&points, PointControl::Automatic, Vec3::Y);
    let path = subdivide(&oriented, 2, 1.2).expect("subdivide");

    let centre = oriented_samples_at(&path, 0.0, 0.0);
    let shifted = oriented_samples_at(&path, 1.0, 0.5);
    assert_eq!(centre.len(), 3);
    assert_eq!(shifted.len(), 3);

    for (c, s) in centre.iter().zip(&shifted) {
        let delta = s.position - c.position;
        assert!(Tolerance::LOOSE.approx_eq_vec3(delta, Vec3::new(0.0, 0.5, -1.0)), "delta {delta:?}");
        assert_eq!(c.tangent, s.tangent);
    }
}

#[test]
fn empty_and_single_sample_paths() {
    let point = Point3::new(1.0, 2.0, 3.0);
    assert_eq!(closest_point_on_path(point, &[]), point);

    let only = OrientedSample {
        position: Point3::new(5.0, 0.0, 5.0),
        tangent: Vec3::X,
        binormal: Vec3::new(0.0, 0.0, -1.0),
        normal: Vec3::Y,
    };
    assert_eq!(closest_point_on_path(point, &[only]), only.position);
}

#[test]
fn end_projection_is_not_clamped() {
    let samples = samples_for(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]], 2);

    let before_start = closest_point_on_path(Point3::new(-5.0, 0.0, 1.0), &samples);
    assert!(Tolerance::LOOSE.approx_eq_point3(before_start, Point3::new(-5.0, 0.0, 0.0)));

    let past_end = closest_point_on_path(Point3::new(14.0, 3.0, -2.0), &samples);
    assert!(Tolerance::LOOSE.approx_eq_point3(past_end, Point3::new(14.0, 0.0, 0.0)));
}

#[test]
fn brush_projection_stops_at_the_path_ends() {
    let samples = samples_for(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]], 2);

    let before_start = closest_point_within_path(Point3::new(-5.0, 0.0, 1.0), &samples);
    assert!(Tolerance::LOOSE.approx_eq_point3(before_start, Point3::ORIGIN), "got {before_start:?}");

    let past_end = closest_point_within_path(Point3::new(14.0, 3.0, -2.0), &samples);
    assert!(Tolerance::LOOSE.approx_eq_point3(past_end, Point3::new(10.0, 0.0, 0.0)), "got {past_end:?}");

    // Inside the path both projections agree.
    let query = Point3::new(3.5, 1.0, 2.0);
    assert!(Tolerance::LOOSE.approx_eq_point3(
        closest_point_within_path(query, &samples),
        closest_point_on_path(query, &samples)
    ));
}

#[test]
fn projection_keeps_points_already_on_the_path() {
    let samples = samples_for(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [20.0, 0.0, 0.0]], 4);

    for query in [Point3::new(3.0, 1.0, 2.0), Point3::new(12.5, -1.0, -0.5)] {
        let once = closest_point_on_path(query, &samples);
        let twice = closest_point_on_path(once, &samples);
        assert!(Tolerance::LOOSE.approx_eq_point3(once, twice), "{once:?} vs {twice:?}");
        assert!(once.z.abs() < 1e-9 && once.y.abs() < 1e-9);
    }
}

#[test]
fn short_segment_next_to_a_long_one() {
    let sample = |x: f64, z: f64| OrientedSample {
        position: Point3::new(x, 0.0, z),
        tangent: Vec3::X,
        binormal: Vec3::new(0.0, 0.0, -1.0),
        normal: Vec3::Y,
    };
    let samples = [sample(0.0, 0.0), sample(1.0, 0.0), sample(1.0, 10.0)];

    // Projection onto the short segment overshoots it, so the long one wins.
    let projected = closest_point_on_path(Point3::new(2.0, 0.0, 3.0), &samples);
    assert!(Tolerance::LOOSE.approx_eq_point3(projected, Point3::new(1.0, 0.0, 3.0)));

    // Within the short segment the previous projection is kept.
    let projected = closest_point_on_path(Point3::new(0.6, 0.0, -0.2), &samples);
    assert!(Tolerance::LOOSE.approx_eq_point3(projected, Point3::new(0.6, 0.0, 0.0)));
}
