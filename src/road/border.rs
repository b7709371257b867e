//! Left and right border sheets swept along the ribbon edges.

use crate::geom::{GeomMesh, GeomMeshDiagnostics, Point3, Tolerance};

use super::config::{BorderUvMode, RoadConfig, RoadError};
use super::section::CrossSectionCurve;
use super::subdivision::Subdivision;

#[derive(Debug, Clone, PartialEq)]
pub struct BorderOptions {
    pub width: f64,
    pub curve: CrossSectionCurve,
    pub uv_scale: f64,
    pub uv_mode: BorderUvMode,
    pub origin: Point3,
}

impl Default for BorderOptions {
    fn default() -> Self {
        Self::from_config(&RoadConfig::default())
    }
}

impl BorderOptions {
    #[must_use]
    pub fn from_config(config: &RoadConfig) -> Self {
        Self {
            width: config.width,
            curve: config.border_curve.clone(),
            uv_scale: config.border_uv_scale,
            uv_mode: config.border_uv_mode,
            origin: config.origin,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BorderMeshes {
    pub left: GeomMesh,
    pub right: GeomMesh,
}

impl BorderMeshes {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn sign(self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }

    /// Quad pattern for `keys` profile keys, offset by `keys * row + key`.
    /// Mirrored between sides so both sheets face up and outward.
    fn quad_pattern(self, keys: u32) -> [u32; 6] {
        match self {
            Side::Left => [1, keys + 1, 0, keys, 0, keys + 1],
            Side::Right => [0, keys + 1, 1, keys + 1, 0, keys],
        }
    }
}

/// Builds both border sheets.
///
/// Each sheet has `(samples + 1) * keys` vertices and
/// `samples * (keys - 1) * 6` indices. A path without segments or an empty
/// profile yields empty sheets and a warning.
pub fn build_borders(
    path: &Subdivision,
    options: &BorderOptions,
) -> Result<(BorderMeshes, GeomMeshDiagnostics), RoadError> {
    if !options.width.is_finite() || options.width <= 0.0 {
        return Err(RoadError::InvalidWidth(options.width));
    }
    if !options.uv_scale.is_finite() {
        return Err(RoadError::NonFiniteConfig("border_uv_scale"));
    }

    if path.sample_count() == 0 || options.curve.is_empty() {
        let mut diagnostics = GeomMeshDiagnostics::new();
        diagnostics.add_warning(if options.curve.is_empty() {
            "cross-section curve has no keys; borders skipped"
        } else {
            "path has a single control point; borders skipped"
        });
        log::debug!("borders skipped: {}", diagnostics.warnings.join("; "));
        return Ok((BorderMeshes::default(), diagnostics));
    }

    let (left, mut diagnostics) = build_sheet(path, options, Side::Left);
    let (right, right_diagnostics) = build_sheet(path, options, Side::Right);
    diagnostics.merge(&right_diagnostics);
    log::debug!("borders built: {}", diagnostics.summary());

    Ok((BorderMeshes { left, right }, diagnostics))
}

fn build_sheet(
    path: &Subdivision,
    options: &BorderOptions,
    side: Side,
) -> (GeomMesh, GeomMeshDiagnostics) {
    let keys = options.curve.keys();
    let key_count = keys.len();
    let half_width = options.width / 2.0;
    let origin = options.origin.to_vec3();
    let sign = side.sign();

    let mut points = Vec::with_capacity(path.row_count() * key_count);
    for row in path.rows() {
        let edge = half_width * row.width_scale;
        for key in keys {
            let lateral = row.binormal * (sign * (edge + key.x));
            points.push(row.position + lateral + row.normal * key.y - origin);
        }
    }

    let uvs = match options.uv_mode {
        BorderUvMode::TopProject => points
            .iter()
            .map(|p| [p.x * options.uv_scale, p.z * options.uv_scale])
            .collect(),
        BorderUvMode::StraightUnwrap => {
            let distances = path.row_distances();
            distances
                .iter()
                .flat_map(|&d| {
                    keys.iter().map(move |key| {
                        [key.distance_from_origin() * options.uv_scale, d * options.uv_scale]
                    })
                })
                .collect()
        }
    };

    let pattern = side.quad_pattern(key_count as u32);
    let segment_count = path.sample_count();
    let mut indices = Vec::with_capacity(segment_count * key_count.saturating_sub(1) * 6);
    for row in 0..segment_count {
        for key in 0..key_count.saturating_sub(1) {
            let base = (row * key_count + key) as u32;
            indices.extend(pattern.iter().map(|&i| i + base));
        }
    }

    crate::geom::finalize_road_mesh(points, uvs, indices, segment_count, Tolerance::default_geom())
}
