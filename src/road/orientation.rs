//! Automatic control point orientation and curvature scale.
//!
//! The pass is a pure function of the input path: it returns a new point list
//! and never mutates its input. Points are visited in order and the handle of
//! the previous point is read from the already-oriented output, so a point's
//! frame depends on its freshly computed predecessor exactly as a sequential
//! in-place pass would.

use crate::geom::{Frame, Vec3};

use super::config::PointControl;
use super::control_point::ControlPoint;

/// Divisor applied to neighbour distances to derive the handle length.
pub const CURVATURE_SCALE_DIVISOR: f64 = 2.5;
/// Floor for the handle length of interior points.
pub const MIN_CURVATURE_SCALE: f64 = 0.5;
/// Floor for the handle length of the two path ends.
pub const MIN_END_CURVATURE_SCALE: f64 = 1.0;

/// Returns `points` with clamped scales and, under [`PointControl::Automatic`],
/// recomputed frames and curvature (z) scales.
///
/// Snapped points keep their frame but still get a new curvature scale.
#[must_use]
pub fn orient_points(points: &[ControlPoint], control: PointControl, up: Vec3) -> Vec<ControlPoint> {
    let mut out: Vec<ControlPoint> = points
        .iter()
        .map(|p| ControlPoint {
            scale: p.clamped_scale(),
            ..*p
        })
        .collect();

    if control == PointControl::Manual || out.is_empty() {
        return out;
    }

    let last = out.len() - 1;
    for current in 0..out.len() {
        let previous = current.saturating_sub(1);
        let previous_prim = previous.saturating_sub(1);
        let next = (current + 1).min(last);

        let cur_pos = out[current].position;
        let prev_pos = out[previous].position;
        let prev_prim_pos = out[previous_prim].position;
        let next_pos = out[next].position;

        let dist_prev = cur_pos.distance_to(prev_pos);
        let dist_next = cur_pos.distance_to(next_pos);

        if !out[current].snapped {
            let forward = if previous == current {
                next_pos - cur_pos
            } else if next == current {
                cur_pos - prev_pos
            } else {
                let z_prev = (prev_pos.distance_to(prev_prim_pos).min(dist_prev)
                    / CURVATURE_SCALE_DIVISOR)
                    .max(MIN_CURVATURE_SCALE);
                let handle = prev_pos + out[previous].forward() * z_prev;
                let prev_bias = (cur_pos - handle).normalized_or(Vec3::ZERO);
                let next_bias = (next_pos - cur_pos).normalized_or(Vec3::ZERO);
                let span = dist_prev + dist_next;
                let t = if span > 0.0 { dist_prev / span } else { 0.0 };
                prev_bias.slerp(next_bias, t)
            };

            // Coincident neighbours leave no direction to look along.
            if let Some(frame) = Frame::look_rotation(forward, up) {
                out[current].frame = frame;
            }
        }

        let z_scale = if previous == current && next != current {
            (dist_next / 2.0).max(MIN_END_CURVATURE_SCALE)
        } else if next == current && previous != current {
            (dist_prev / 2.0).max(MIN_END_CURVATURE_SCALE)
        } else {
            (dist_prev.min(dist_next) / CURVATURE_SCALE_DIVISOR).max(MIN_CURVATURE_SCALE)
        };
        out[current].scale.z = z_scale;
    }

    out
}
