use serde::{Deserialize, Serialize};

use crate::geom::{Frame, Point3, Vec3};

/// Lower bound applied to every scale component on each regeneration.
pub const MIN_POINT_SCALE: f64 = 0.001;

/// A user-placed anchor of the road path.
///
/// `scale.x` multiplies the road width at this point and `scale.z` is the
/// handle length used by the cubic interpolation. A snapped point is driven by
/// an external collaborator: automatic orientation leaves its frame alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPoint {
    pub position: Point3,
    pub frame: Frame,
    pub scale: Vec3,
    pub width_locked: bool,
    pub locked_width: f64,
    pub snapped: bool,
}

impl ControlPoint {
    #[must_use]
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_frame(position: Point3, frame: Frame) -> Self {
        Self {
            position,
            frame,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.frame.forward
    }

    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.frame.up
    }

    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.frame.right
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.frame.is_finite()
            && self.scale.is_finite()
            && self.locked_width.is_finite()
    }

    /// Scale with every component raised to [`MIN_POINT_SCALE`].
    #[must_use]
    pub fn clamped_scale(&self) -> Vec3 {
        self.scale.max_scalar(MIN_POINT_SCALE)
    }

    /// Scale as seen by the mesh builders for a road of `width`.
    ///
    /// A locked point keeps its captured width: the lateral multiplier becomes
    /// `(x * width - width + locked_width) / width`.
    #[must_use]
    pub fn effective_scale(&self, width: f64) -> Vec3 {
        if self.width_locked && width > 0.0 {
            Vec3::new(
                (self.scale.x * width - width + self.locked_width) / width,
                self.scale.y,
                self.scale.z,
            )
        } else {
            self.scale
        }
    }
}

impl Default for ControlPoint {
    fn default() -> Self {
        Self {
            position: Point3::ORIGIN,
            frame: Frame::IDENTITY,
            scale: Vec3::new(1.0, 1.0, 1.0),
            width_locked: false,
            locked_width: 0.0,
            snapped: false,
        }
    }
}
