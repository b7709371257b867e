//! Offset samples and nearest-point projection over the subdivided path.

use serde::{Deserialize, Serialize};

use crate::geom::{Point3, Tolerance, Vec3};

use super::subdivision::Subdivision;

/// Public query result: a path position with its local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedSample {
    pub position: Point3,
    pub tangent: Vec3,
    pub binormal: Vec3,
    pub normal: Vec3,
}

/// One sample per subdivision slice plus the final control point, each moved
/// `horizontal` along its binormal and `vertical` along its normal.
#[must_use]
pub fn oriented_samples_at(path: &Subdivision, horizontal: f64, vertical: f64) -> Vec<OrientedSample> {
    path.rows()
        .map(|row| OrientedSample {
            position: row.position + row.normal * vertical + row.binormal * horizontal,
            tangent: row.tangent,
            binormal: row.binormal,
            normal: row.normal,
        })
        .collect()
}

/// Projects `point` onto the sampled path.
///
/// The nearest sample (first wins on ties) picks the segment: at an end the
/// point is projected onto the line through the single neighbour without
/// clamping; in the middle the projection onto the next segment is used only
/// when it stays within that segment while the previous projection
/// overshoots its own, otherwise the previous projection is returned. This is
/// a local heuristic, not a global nearest-point search.
#[must_use]
pub fn closest_point_on_path(point: Point3, samples: &[OrientedSample]) -> Point3 {
    project_onto_path(point, samples, false)
}

/// [`closest_point_on_path`] with the result held on the chosen segment, so
/// it is always a point of the sampled polyline. Used by the terrain brush,
/// where an extrapolated projection past a path end would flatten ground the
/// road never reaches.
#[must_use]
pub(crate) fn closest_point_within_path(point: Point3, samples: &[OrientedSample]) -> Point3 {
    project_onto_path(point, samples, true)
}

fn project_onto_path(point: Point3, samples: &[OrientedSample], clamp: bool) -> Point3 {
    match samples {
        [] => return point,
        [only] => return only.position,
        _ => {}
    }

    let mut closest = 0;
    let mut closest_distance = f64::MAX;
    for (i, sample) in samples.iter().enumerate() {
        let distance = point.distance_to(sample.position);
        if distance < closest_distance {
            closest = i;
            closest_distance = distance;
        }
    }

    let anchor = samples[closest].position;
    let offset = point - anchor;
    let last = samples.len() - 1;

    if closest == 0 || closest == last {
        let neighbour = if closest == 0 { samples[1].position } else { samples[last - 1].position };
        let direction = neighbour - anchor;
        if Tolerance::ZERO_LENGTH.is_zero_length(direction.length()) {
            return anchor;
        }
        return project_segment(anchor, offset, neighbour, clamp);
    }

    let prev_position = samples[closest - 1].position;
    let next_position = samples[closest + 1].position;
    let to_next = next_position - anchor;
    let to_prev = prev_position - anchor;

    let projected_next = anchor + offset.project_onto(to_next);
    let projected_prev = anchor + offset.project_onto(to_prev);

    let prev_overshoots = to_prev.length() < projected_prev.distance_to(prev_position);
    let next_within = projected_next.distance_to(next_position) < to_next.length();

    match (prev_overshoots && next_within, clamp) {
        (true, false) => projected_next,
        (false, false) => projected_prev,
        (true, true) => project_segment(anchor, offset, next_position, true),
        (false, true) => project_segment(anchor, offset, prev_position, true),
    }
}

/// Projection of `anchor + offset` onto the line from `anchor` toward
/// `towards`, optionally limited to the segment between them.
fn project_segment(anchor: Point3, offset: Vec3, towards: Point3, clamp: bool) -> Point3 {
    let direction = towards - anchor;
    if !clamp {
        return anchor + offset.project_onto(direction);
    }
    let length_squared = direction.length_squared();
    if !length_squared.is_finite() || length_squared <= Tolerance::ZERO_LENGTH.eps_squared() {
        return anchor;
    }
    anchor + direction * (offset.dot(direction) / length_squared).clamp(0.0, 1.0)
}
