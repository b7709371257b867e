//! Main road surface: a quad strip with two vertices per path row.

use crate::geom::{GeomMesh, GeomMeshDiagnostics, Point3, Tolerance};

use super::config::{RoadConfig, RoadError, UvMode};
use super::subdivision::Subdivision;

/// Index pattern of one quad, offset by `2 * row`. Vertex `2r` is the left
/// edge and `2r + 1` the right edge of row `r`; the winding faces up.
const QUAD_PATTERN: [u32; 6] = [2, 1, 0, 2, 3, 1];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonOptions {
    pub width: f64,
    pub uv_scale: f64,
    pub uv_mode: UvMode,
    /// Subtracted from every vertex.
    pub origin: Point3,
}

impl Default for RibbonOptions {
    fn default() -> Self {
        Self::from_config(&RoadConfig::default())
    }
}

impl RibbonOptions {
    #[must_use]
    pub fn from_config(config: &RoadConfig) -> Self {
        Self {
            width: config.width,
            uv_scale: config.uv_scale,
            uv_mode: config.uv_mode,
            origin: config.origin,
        }
    }
}

/// Builds the ribbon mesh.
///
/// Produces `2 * (samples + 1)` vertices and `6 * samples` indices. A path
/// without segments yields its two end vertices and no triangles.
pub fn build_ribbon(
    path: &Subdivision,
    options: RibbonOptions,
) -> Result<(GeomMesh, GeomMeshDiagnostics), RoadError> {
    if !options.width.is_finite() || options.width <= 0.0 {
        return Err(RoadError::InvalidWidth(options.width));
    }
    if !options.uv_scale.is_finite() {
        return Err(RoadError::NonFiniteConfig("uv_scale"));
    }

    let rows = path.row_count();
    let half_width = options.width / 2.0;
    let origin = options.origin.to_vec3();

    let mut points = Vec::with_capacity(rows * 2);
    for row in path.rows() {
        let offset = row.binormal * (half_width * row.width_scale);
        points.push(row.position - offset - origin);
        points.push(row.position + offset - origin);
    }

    let uvs = ribbon_uvs(path, &points, options);

    let segment_count = path.sample_count();
    let mut indices = Vec::with_capacity(segment_count * QUAD_PATTERN.len());
    for quad in 0..segment_count {
        let base = (quad * 2) as u32;
        indices.extend(QUAD_PATTERN.iter().map(|&i| i + base));
    }

    let (mesh, mut diagnostics) =
        crate::geom::finalize_road_mesh(points, uvs, indices, segment_count, Tolerance::default_geom());
    if segment_count == 0 {
        diagnostics.add_warning("path has a single control point; ribbon has no triangles");
    }
    log::debug!("ribbon built: {}", diagnostics.summary());

    Ok((mesh, diagnostics))
}

fn ribbon_uvs(path: &Subdivision, points: &[Point3], options: RibbonOptions) -> Vec<[f64; 2]> {
    let scale = options.uv_scale;
    let samples = path.sample_count();

    match options.uv_mode {
        UvMode::TopProject => points.iter().map(|p| [p.x * scale, p.z * scale]).collect(),
        UvMode::PerSegment => per_row(path.row_count(), scale, |row| row as f64 * scale),
        UvMode::MatchWidth => {
            let distances = path.row_distances();
            per_row(path.row_count(), scale, |row| distances[row] * scale / options.width)
        }
        UvMode::StretchSingleTexture => per_row(path.row_count(), scale, |row| {
            if samples == 0 {
                0.0
            } else {
                row as f64 / samples as f64 * scale
            }
        }),
    }
}

/// Two UVs per row: `U` is 0 on the left edge and `u_scale` on the right.
fn per_row(rows: usize, u_scale: f64, v_at: impl Fn(usize) -> f64) -> Vec<[f64; 2]> {
    (0..rows)
        .flat_map(|row| {
            let v = v_at(row);
            [[0.0, v], [u_scale, v]]
        })
        .collect()
}
