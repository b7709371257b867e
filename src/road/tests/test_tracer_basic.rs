use crate::geom::{Point3, Tolerance, Vec3};
use crate::road::{OrientedSample, PathSource, PathTracer, TraceError, TracedPath};

struct StraightSource {
    length: f64,
    samples: usize,
    revision: u64,
}

impl PathSource for StraightSource {
    fn oriented_samples_at(&self, horizontal: f64, vertical: f64) -> Vec<OrientedSample> {
        (0..self.samples)
            .map(|i| {
                let x = self.length * i as f64 / (self.samples - 1).max(1) as f64;
                OrientedSample {
                    position: Point3::new(x, vertical, -horizontal),
                    tangent: Vec3::X,
                    binormal: Vec3::new(0.0, 0.0, -1.0),
                    normal: Vec3::Y,
                }
            })
            .collect()
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

fn source(samples: usize) -> StraightSource {
    StraightSource {
        length: 20.0,
        samples,
        revision: 1,
    }
}

#[test]
fn distances_accumulate_along_the_samples() {
    let src = source(3);
    let traced = TracedPath::new(src.oriented_samples_at(0.0, 0.0), 0.0, 0.0, 1);

    let distances: Vec<f64> = traced.samples.iter().map(|s| s.distance).collect();
    assert_eq!(distances, vec![0.0, 10.0, 20.0]);
    assert!((traced.total_length() - 20.0).abs() < 1e-12);
}

#[test]
fn distance_at_hits_ends_and_interpolates() {
    let src = source(3);
    let traced = TracedPath::new(src.oriented_samples_at(0.0, 0.0), 0.0, 0.0, 1);
    let tol = Tolerance::default_geom();

    let start = traced.distance_at(0.0).expect("sample");
    assert!(tol.approx_eq_point3(start.position, Point3::new(0.0, 0.0, 0.0)));

    let end = traced.distance_at(20.0).expect("sample");
    assert!(tol.approx_eq_point3(end.position, Point3::new(20.0, 0.0, 0.0)));

    let mid = traced.distance_at(15.0).expect("sample");
    assert!(tol.approx_eq_point3(mid.position, Point3::new(15.0, 0.0, 0.0)));
    assert!(tol.approx_eq_vec3(mid.normal, Vec3::Y));
}

#[test]
fn distance_at_clamps_outside_the_path() {
    let src = source(3);
    let traced = TracedPath::new(src.oriented_samples_at(0.0, 0.0), 0.0, 0.0, 1);
    let tol = Tolerance::default_geom();

    let before = traced.distance_at(-5.0).expect("sample");
    assert!(tol.approx_eq_point3(before.position, Point3::ORIGIN));

    let after = traced.distance_at(25.0).expect("sample");
    assert!(tol.approx_eq_point3(after.position, Point3::new(20.0, 0.0, 0.0)));
}

#[test]
fn distance_at_is_monotonic_along_a_straight_path() {
    let src = source(9);
    let traced = TracedPath::new(src.oriented_samples_at(0.0, 0.0), 0.0, 0.0, 1);

    let mut previous = f64::NEG_INFINITY;
    for step in 0..=40 {
        let d = step as f64 * 0.5;
        let sample = traced.distance_at(d).expect("sample");
        assert!(sample.position.x >= previous);
        assert!((sample.position.x - d).abs() < 1e-9);
        previous = sample.position.x;
    }
}

#[test]
fn evaluate_points_tangent_at_the_lookahead() {
    let src = source(3);
    let traced = TracedPath::new(src.oriented_samples_at(0.0, 0.0), 0.0, 0.0, 1);

    let sample = traced.evaluate(5.0, 1.0).expect("sample");
    assert!(Tolerance::LOOSE.approx_eq_vec3(sample.tangent, Vec3::X));
    assert!(Tolerance::LOOSE.approx_eq_point3(sample.position, Point3::new(5.0, 0.0, 0.0)));
}

#[test]
fn evaluate_single_sample_walks_its_tangent() {
    let src = source(1);
    let traced = TracedPath::new(src.oriented_samples_at(0.0, 0.0), 0.0, 0.0, 1);

    let sample = traced.evaluate(3.0, 1.0).expect("sample");
    assert!(Tolerance::LOOSE.approx_eq_point3(sample.position, Point3::new(3.0, 0.0, 0.0)));
    assert_eq!(sample.tangent, traced.samples[0].sample.tangent);
    assert_eq!(sample.binormal, traced.samples[0].sample.binormal);
    assert!(traced.distance_at(3.0).is_some());
}

#[test]
fn tracer_keeps_paths_per_index_with_their_offsets() {
    let src = source(3);
    let mut tracer = PathTracer::new();

    assert_eq!(tracer.distance_at(0, 1.0), Err(TraceError::NotTraced(0)));

    tracer.trace_path(2, &src, 1.5, 0.25).expect("trace");
    assert_eq!(tracer.traced_count(), 1);
    assert!(matches!(tracer.path(0), Err(TraceError::NotTraced(0))));

    let sample = tracer.distance_at(2, 10.0).expect("sample");
    assert!(Tolerance::LOOSE.approx_eq_point3(sample.position, Point3::new(10.0, 0.25, -1.5)));
    assert!((tracer.total_length(2).expect("length") - 20.0).abs() < 1e-12);
    assert!((tracer.distance_record() - 20.0).abs() < 1e-12);
}

#[test]
fn stale_paths_are_retraced() {
    let mut src = source(3);
    let mut tracer = PathTracer::new();
    tracer.trace_path(0, &src, 0.0, 0.0).expect("trace");
    assert!(!tracer.is_stale(0, &src));

    src.length = 40.0;
    src.revision = 2;
    assert!(tracer.is_stale(0, &src));
    assert_eq!(tracer.refresh_stale(&src), 1);
    assert!(!tracer.is_stale(0, &src));
    assert!((tracer.total_length(0).expect("length") - 40.0).abs() < 1e-12);
}

#[test]
fn tracing_an_empty_source_fails() {
    let src = StraightSource {
        length: 0.0,
        samples: 0,
        revision: 1,
    };
    let mut tracer = PathTracer::new();
    assert!(matches!(tracer.trace_path(0, &src, 0.0, 0.0), Err(TraceError::EmptyPath(0))));
}
