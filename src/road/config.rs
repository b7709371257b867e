//! Road configuration and the configuration error type.

use serde::{Deserialize, Serialize};

use crate::geom::{Point3, Vec3};

use super::section::CrossSectionCurve;

pub const DEFAULT_ROAD_WIDTH: f64 = 1.2;
pub const DEFAULT_GROUND_OFFSET: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoadError {
    #[error("path must contain at least one control point")]
    EmptyPath,
    #[error("road width must be finite and > 0 (got {0})")]
    InvalidWidth(f64),
    #[error("config value `{0}` must be finite")]
    NonFiniteConfig(&'static str),
    #[error("up vector must be finite and non-zero")]
    InvalidUp,
    #[error("control point {0} has non-finite position, orientation or scale")]
    NonFinitePoint(usize),
    #[error("control point index {index} out of range for a path of {len} points")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("control point {0} is snapped; unsnap it before inserting after it")]
    SnappedAnchor(usize),
}

/// Texture unwrap strategy for the ribbon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UvMode {
    /// V advances by `uv_scale` per vertex row.
    PerSegment,
    /// UV is the local XZ position times `uv_scale`.
    TopProject,
    /// V follows arc length divided by the road width.
    #[default]
    MatchWidth,
    /// V spans `[0, uv_scale]` over the whole ribbon.
    StretchSingleTexture,
}

/// Texture unwrap strategy for the border sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BorderUvMode {
    #[default]
    StraightUnwrap,
    TopProject,
}

/// Who owns control point orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointControl {
    /// Frames are left exactly as the host set them.
    Manual,
    /// Frames and curvature scales are recomputed on every regeneration.
    #[default]
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpdateMode {
    /// Regenerate only when asked.
    #[default]
    Manual,
    /// Regenerate on every `tick`.
    Realtime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    /// Slices per segment between consecutive control points, clamped to >= 1.
    pub subdivision: usize,
    /// Ribbon width in world units.
    pub width: f64,
    pub uv_scale: f64,
    pub uv_mode: UvMode,
    pub borders_enabled: bool,
    pub border_curve: CrossSectionCurve,
    pub border_uv_scale: f64,
    pub border_uv_mode: BorderUvMode,
    /// How far below the road surface the terrain is flattened.
    pub ground_offset: f64,
    /// Width of the falloff band beyond the flat half-width.
    pub terrain_smoothing: f64,
    pub point_control: PointControl,
    pub update_mode: UpdateMode,
    /// Owner position. Mesh vertices are emitted relative to it.
    pub origin: Point3,
    /// Owner up vector used by automatic orientation.
    pub up: Vec3,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            subdivision: 1,
            width: DEFAULT_ROAD_WIDTH,
            uv_scale: 1.0,
            uv_mode: UvMode::default(),
            borders_enabled: false,
            border_curve: CrossSectionCurve::default(),
            border_uv_scale: 1.0,
            border_uv_mode: BorderUvMode::default(),
            ground_offset: DEFAULT_GROUND_OFFSET,
            terrain_smoothing: 1.0,
            point_control: PointControl::default(),
            update_mode: UpdateMode::default(),
            origin: Point3::ORIGIN,
            up: Vec3::Y,
        }
    }
}

impl RoadConfig {
    /// Subdivision clamped to at least one slice per segment.
    #[must_use]
    pub fn subdivision(&self) -> usize {
        self.subdivision.max(1)
    }

    /// Owner up vector, normalized.
    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.up.normalized_or(Vec3::Y)
    }

    /// Half the road width: the flat part of the terrain brush.
    #[must_use]
    pub fn flat_radius(&self) -> f64 {
        self.width / 2.0
    }

    #[must_use]
    pub fn smooth_radius(&self) -> f64 {
        self.terrain_smoothing.max(0.0)
    }

    pub fn validate(&self) -> Result<(), RoadError> {
        if !self.width.is_finite() || self.width <= 0.0 {
            return Err(RoadError::InvalidWidth(self.width));
        }
        let scalars = [
            ("uv_scale", self.uv_scale),
            ("border_uv_scale", self.border_uv_scale),
            ("ground_offset", self.ground_offset),
            ("terrain_smoothing", self.terrain_smoothing),
        ];
        if let Some((name, _)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(RoadError::NonFiniteConfig(*name));
        }
        if !self.origin.is_finite() {
            return Err(RoadError::NonFiniteConfig("origin"));
        }
        if !self.up.is_finite() || self.up.normalized().is_none() {
            return Err(RoadError::InvalidUp);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RoadConfig::default();
        assert_eq!(config.subdivision(), 1);
        assert!((config.width - 1.2).abs() < 1e-12);
        assert_eq!(config.uv_mode, UvMode::MatchWidth);
        assert_eq!(config.border_curve.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_subdivision_is_clamped() {
        let config = RoadConfig {
            subdivision: 0,
            ..RoadConfig::default()
        };
        assert_eq!(config.subdivision(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_width() {
        let config = RoadConfig {
            width: 0.0,
            ..RoadConfig::default()
        };
        assert_eq!(config.validate(), Err(RoadError::InvalidWidth(0.0)));

        let config = RoadConfig {
            uv_scale: f64::NAN,
            ..RoadConfig::default()
        };
        assert_eq!(config.validate(), Err(RoadError::NonFiniteConfig("uv_scale")));

        let config = RoadConfig {
            up: Vec3::ZERO,
            ..RoadConfig::default()
        };
        assert_eq!(config.validate(), Err(RoadError::InvalidUp));
    }
}
