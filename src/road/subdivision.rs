//! Cubic subdivision of the control point path into oriented samples.

use crate::geom::{Point3, Vec3};

use super::config::RoadError;
use super::control_point::ControlPoint;

/// One interpolated point of the path with its local frame.
///
/// `binormal` points to the right of travel and `normal` is
/// `tangent × binormal`, the local up of the road surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub position: Point3,
    pub tangent: Vec3,
    pub binormal: Vec3,
    pub normal: Vec3,
    /// Effective lateral scale, interpolated between the segment ends.
    pub width_scale: f64,
}

impl PathSample {
    fn at_control_point(point: &ControlPoint, width: f64) -> Self {
        let tangent = point.forward();
        let binormal = point.right();
        Self {
            position: point.position,
            tangent,
            binormal,
            normal: tangent.cross(binormal).normalized_or(point.up()),
            width_scale: point.effective_scale(width).x,
        }
    }
}

/// Samples of one regeneration pass.
///
/// `samples` holds `(points - 1) * subdivision` entries, the first slice of
/// every segment sitting on its control point. `end` is the last control
/// point with its own frame; mesh builders emit it as the closing row.
#[derive(Debug, Clone, PartialEq)]
pub struct Subdivision {
    pub samples: Vec<PathSample>,
    pub end: PathSample,
    pub subdivision: usize,
}

impl Subdivision {
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Number of mesh rows: every sample plus the closing control point.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.samples.len() + 1
    }

    /// Samples followed by the closing row.
    pub fn rows(&self) -> impl Iterator<Item = &PathSample> + '_ {
        self.samples.iter().chain(std::iter::once(&self.end))
    }

    /// Positions of the control points the path was built from.
    #[must_use]
    pub fn control_positions(&self) -> Vec<Point3> {
        self.samples
            .iter()
            .step_by(self.subdivision.max(1))
            .chain(std::iter::once(&self.end))
            .map(|s| s.position)
            .collect()
    }

    /// Cumulative distance per row: straight-line distance between
    /// consecutive samples, with the closing row measured from the last
    /// sample to the final control point.
    #[must_use]
    pub fn row_distances(&self) -> Vec<f64> {
        let mut distances = Vec::with_capacity(self.row_count());
        let mut total = 0.0;
        let mut previous: Option<Point3> = None;
        for row in self.rows() {
            if let Some(prev) = previous {
                total += prev.distance_to(row.position);
            }
            distances.push(total);
            previous = Some(row.position);
        }
        distances
    }
}

/// Subdivides `points` into `(points.len() - 1) * subdivision` samples.
///
/// Each segment `(a, a + 1)` is a cubic Bezier with handles
/// `P_a + forward_a * z_a` and `P_{a+1} - forward_{a+1} * z_{a+1}`, evaluated
/// by three levels of linear interpolation. The tangent is the direction
/// between the last two intermediate points, the up vector is slerped between
/// the end frames. `subdivision` below one is treated as one.
pub fn subdivide(
    points: &[ControlPoint],
    subdivision: usize,
    width: f64,
) -> Result<Subdivision, RoadError> {
    let last = points.last().ok_or(RoadError::EmptyPath)?;
    let subdivision = subdivision.max(1);

    let mut samples = Vec::with_capacity((points.len() - 1) * subdivision);
    for pair in points.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        for step in 0..subdivision {
            let t = step as f64 / subdivision as f64;
            samples.push(segment_sample(a, b, t, width));
        }
    }

    Ok(Subdivision {
        samples,
        end: PathSample::at_control_point(last, width),
        subdivision,
    })
}

fn segment_sample(a: &ControlPoint, b: &ControlPoint, t: f64, width: f64) -> PathSample {
    let handle_a = a.position + a.forward() * a.scale.z;
    let handle_b = b.position - b.forward() * b.scale.z;

    let ap = a.position.lerp(handle_a, t);
    let bp = handle_a.lerp(handle_b, t);
    let cp = handle_b.lerp(b.position, t);
    let d = ap.lerp(bp, t);
    let e = bp.lerp(cp, t);
    let position = d.lerp(e, t);

    let tangent = (e - d)
        .normalized()
        .or_else(|| (b.position - a.position).normalized())
        .unwrap_or_else(|| a.forward());

    let up = a.up().slerp(b.up(), t);
    let binormal = up
        .cross(tangent)
        .normalized()
        .or_else(|| a.right().lerp(b.right(), t).normalized())
        .unwrap_or_else(|| tangent.any_perpendicular());
    let normal = tangent.cross(binormal);

    let scale_a = a.effective_scale(width).x;
    let scale_b = b.effective_scale(width).x;

    PathSample {
        position,
        tangent,
        binormal,
        normal,
        width_scale: scale_a + (scale_b - scale_a) * t,
    }
}
