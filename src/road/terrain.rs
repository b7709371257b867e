//! Heightmap flattening along the road.
//!
//! The morph walks the oriented path samples, drops brush strokes between
//! them and marks every heightmap texel inside a stroke window. Each marked
//! texel is then blended toward the road height as a function of its own
//! original height and the cached path only, so the result is independent of
//! stroke order and repeated strokes over a texel are harmless.

use std::collections::BTreeSet;
use std::ops::ControlFlow;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::geom::{Point3, Vec3};

use super::query::{OrientedSample, closest_point_within_path};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TerrainError {
    #[error("terrain size must be finite and > 0 on every axis (got {0:?})")]
    InvalidSize(Vec3),
    #[error("heightmap resolution must be at least 1x1 (got {0}x{1})")]
    InvalidResolution(usize, usize),
    #[error("heightmap returned {actual} heights, expected {expected}")]
    ResolutionMismatch { expected: usize, actual: usize },
    #[error("brush radii must be finite with a positive flat radius")]
    InvalidBrush,
}

/// Rectangular region of the heightmap in texel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl HeightRect {
    #[must_use]
    pub const fn full(width: usize, height: usize) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.width * self.height
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Heightmap collaborator.
///
/// Heights are normalised to `[0, 1]` of `size().y` above `position().y` and
/// stored row-major: index `y * width + x`, with `x` along world X and `y`
/// along world Z.
pub trait HeightmapAccess {
    /// World position of the heightmap corner at texel (0, 0).
    fn position(&self) -> Point3;

    /// World extent: X and Z span the grid, Y is the height range.
    fn size(&self) -> Vec3;

    /// Texel count along X and Z.
    fn resolution(&self) -> (usize, usize);

    fn get_heights(&self, rect: HeightRect) -> Vec<f64>;

    fn set_heights(&mut self, rect: HeightRect, heights: &[f64]);

    fn detail_layer_count(&self) -> usize {
        0
    }

    fn get_detail_layer(&self, _layer: usize) -> Vec<u32> {
        Vec::new()
    }

    fn set_detail_layer(&mut self, _layer: usize, _values: &[u32]) {}
}

/// In-memory heightmap with optional detail layers.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainGrid {
    pub position: Point3,
    pub size: Vec3,
    pub width: usize,
    pub height: usize,
    pub heights: Vec<f64>,
    pub detail_layers: Vec<Vec<u32>>,
}

impl TerrainGrid {
    /// Flat terrain at normalised height `level`.
    #[must_use]
    pub fn flat(position: Point3, size: Vec3, resolution: usize, level: f64) -> Self {
        Self {
            position,
            size,
            width: resolution,
            height: resolution,
            heights: vec![level; resolution * resolution],
            detail_layers: Vec::new(),
        }
    }

    #[must_use]
    pub fn height_at(&self, x: usize, y: usize) -> Option<f64> {
        (x < self.width && y < self.height).then(|| self.heights[y * self.width + x])
    }

    /// World-space height of a texel.
    #[must_use]
    pub fn world_height_at(&self, x: usize, y: usize) -> Option<f64> {
        self.height_at(x, y).map(|h| self.position.y + h * self.size.y)
    }
}

impl HeightmapAccess for TerrainGrid {
    fn position(&self) -> Point3 {
        self.position
    }

    fn size(&self) -> Vec3 {
        self.size
    }

    fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn get_heights(&self, rect: HeightRect) -> Vec<f64> {
        let mut out = Vec::with_capacity(rect.len());
        for y in rect.y..(rect.y + rect.height).min(self.height) {
            let start = y * self.width + rect.x.min(self.width);
            let end = y * self.width + (rect.x + rect.width).min(self.width);
            out.extend_from_slice(&self.heights[start..end]);
        }
        out
    }

    fn set_heights(&mut self, rect: HeightRect, heights: &[f64]) {
        for (row, y) in (rect.y..(rect.y + rect.height).min(self.height)).enumerate() {
            for (col, x) in (rect.x..(rect.x + rect.width).min(self.width)).enumerate() {
                if let Some(&h) = heights.get(row * rect.width + col) {
                    self.heights[y * self.width + x] = h;
                }
            }
        }
    }

    fn detail_layer_count(&self) -> usize {
        self.detail_layers.len()
    }

    fn get_detail_layer(&self, layer: usize) -> Vec<u32> {
        self.detail_layers.get(layer).cloned().unwrap_or_default()
    }

    fn set_detail_layer(&mut self, layer: usize, values: &[u32]) {
        if let Some(target) = self.detail_layers.get_mut(layer) {
            target.clear();
            target.extend_from_slice(values);
        }
    }
}

/// Result of a downward ground probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    pub point: Point3,
    pub normal: Vec3,
    /// Index of the terrain that was hit, if the surface is a terrain.
    pub terrain: Option<usize>,
}

/// Ground-projection collaborator (typically a downward raycast).
pub trait GroundProbe {
    fn cast_down(&self, origin: Point3) -> Option<GroundHit>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MorphOptions {
    /// Texels this close (horizontally) to the path are flattened completely.
    pub flat_radius: f64,
    /// Width of the linear falloff band beyond `flat_radius`.
    pub smooth_radius: f64,
    /// Terrain ends up this far below the path.
    pub ground_offset: f64,
}

impl MorphOptions {
    #[must_use]
    pub fn total_radius(&self) -> f64 {
        self.flat_radius + self.smooth_radius
    }

    fn validate(&self) -> Result<(), TerrainError> {
        let finite = self.flat_radius.is_finite()
            && self.smooth_radius.is_finite()
            && self.ground_offset.is_finite();
        if !finite || self.flat_radius <= 0.0 {
            return Err(TerrainError::InvalidBrush);
        }
        Ok(())
    }
}

/// Progress reported once per path segment while strokes are laid down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MorphProgress {
    pub segment: usize,
    pub segment_count: usize,
}

impl MorphProgress {
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.segment_count == 0 {
            1.0
        } else {
            self.segment as f64 / self.segment_count as f64
        }
    }
}

/// Progress hook. Returning `ControlFlow::Break` cancels the morph before
/// anything is written.
pub type ProgressFn<'a> = dyn FnMut(MorphProgress) -> ControlFlow<()> + 'a;

/// Progress hook that never cancels.
pub fn no_progress(_: MorphProgress) -> ControlFlow<()> {
    ControlFlow::Continue(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MorphStats {
    pub terrains: usize,
    pub strokes: usize,
    pub texels_covered: usize,
    pub texels_written: usize,
}

impl MorphStats {
    fn accumulate(&mut self, other: MorphStats) {
        self.terrains += other.terrains;
        self.strokes += other.strokes;
        self.texels_covered += other.texels_covered;
        self.texels_written += other.texels_written;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphOutcome {
    Applied(MorphStats),
    /// The path produced no samples; the terrain was not touched.
    NoPathSamples,
    /// No terrain was found under the path.
    NoTerrainFound,
    /// The progress hook asked to stop; the terrain was not touched.
    Cancelled,
}

/// Per-invocation brush context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainStroke {
    pub terrain_position: Point3,
    pub terrain_size: Vec3,
    pub resolution_x: usize,
    pub resolution_y: usize,
    /// World units per texel along X and Z.
    pub texel_distance_x: f64,
    pub texel_distance_y: f64,
    pub radius_flat: f64,
    pub radius_smooth: f64,
    pub radius_total: f64,
    /// Half-extent of the brush window in texels.
    pub brush_samples_x: i64,
    pub brush_samples_y: i64,
    pub ground_offset: f64,
}

impl TerrainStroke {
    pub fn new(terrain: &impl HeightmapAccess, options: MorphOptions) -> Result<Self, TerrainError> {
        options.validate()?;

        let size = terrain.size();
        if !size.is_finite() || size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
            return Err(TerrainError::InvalidSize(size));
        }
        let (resolution_x, resolution_y) = terrain.resolution();
        if resolution_x == 0 || resolution_y == 0 {
            return Err(TerrainError::InvalidResolution(resolution_x, resolution_y));
        }

        let texel_distance_x = size.x / resolution_x as f64;
        let texel_distance_y = size.z / resolution_y as f64;
        let radius_total = options.total_radius();

        Ok(Self {
            terrain_position: terrain.position(),
            terrain_size: size,
            resolution_x,
            resolution_y,
            texel_distance_x,
            texel_distance_y,
            radius_flat: options.flat_radius,
            radius_smooth: options.smooth_radius,
            radius_total,
            brush_samples_x: (radius_total / texel_distance_x).ceil() as i64,
            brush_samples_y: (radius_total / texel_distance_y).ceil() as i64,
            ground_offset: options.ground_offset,
        })
    }

    /// Marks the brush window around `stroke`: `[-n, 2n)` texels on each
    /// axis around the texel containing it, clipped to the grid.
    fn mark_window(&self, stroke: Point3, mask: &mut [bool]) -> usize {
        let center_x = ((stroke.x - self.terrain_position.x) / self.texel_distance_x).floor() as i64;
        let center_y = ((stroke.z - self.terrain_position.z) / self.texel_distance_y).floor() as i64;

        // Tiny texels or far-off strokes saturate the casts above.
        let x_lo = center_x.saturating_sub(self.brush_samples_x).max(0);
        let x_hi = center_x
            .saturating_add(self.brush_samples_x.saturating_mul(2))
            .min(self.resolution_x as i64);
        let y_lo = center_y.saturating_sub(self.brush_samples_y).max(0);
        let y_hi = center_y
            .saturating_add(self.brush_samples_y.saturating_mul(2))
            .min(self.resolution_y as i64);

        let mut newly = 0;
        for y in y_lo..y_hi {
            for x in x_lo..x_hi {
                let cell = &mut mask[y as usize * self.resolution_x + x as usize];
                if !*cell {
                    *cell = true;
                    newly += 1;
                }
            }
        }
        newly
    }

    /// New normalised height for a texel, or `None` when it lies beyond the
    /// brush falloff and must stay untouched. Distance is measured to the
    /// sampled path itself, never to its extension past either end.
    fn blend_texel(&self, x: usize, y: usize, height: f64, samples: &[OrientedSample]) -> Option<f64> {
        let world_height = self.terrain_position.y + height * self.terrain_size.y;
        let texel = Point3::new(
            self.terrain_position.x + x as f64 * self.texel_distance_x,
            world_height,
            self.terrain_position.z + y as f64 * self.texel_distance_y,
        );

        let projected = closest_point_within_path(texel, samples);
        let horizontal = texel.horizontal_distance_to(projected);
        let smooth = if self.radius_smooth != 0.0 { self.radius_smooth } else { 1.0 };
        let t = (horizontal - self.radius_flat).max(0.0) / smooth;
        if t >= 1.0 {
            return None;
        }

        let road_height = projected.y - self.ground_offset;
        let blended = road_height + (world_height - road_height) * t;
        Some((blended - self.terrain_position.y) / self.terrain_size.y)
    }
}

/// Flattens `terrain` under the path described by `samples`.
///
/// Heights are read once, modified in memory and written back in one call;
/// detail layers are read and written back unchanged. Cancelling through
/// `progress` leaves the terrain untouched.
pub fn morph_terrain(
    samples: &[OrientedSample],
    terrain: &mut impl HeightmapAccess,
    options: MorphOptions,
    progress: &mut ProgressFn<'_>,
) -> Result<MorphOutcome, TerrainError> {
    if samples.is_empty() {
        log::warn!("terrain morph skipped: path has no samples");
        return Ok(MorphOutcome::NoPathSamples);
    }

    let stroke = TerrainStroke::new(terrain, options)?;
    let rect = HeightRect::full(stroke.resolution_x, stroke.resolution_y);
    let mut heights = terrain.get_heights(rect);
    if heights.len() != rect.len() {
        return Err(TerrainError::ResolutionMismatch {
            expected: rect.len(),
            actual: heights.len(),
        });
    }

    let mut mask = vec![false; rect.len()];
    let mut stats = MorphStats {
        terrains: 1,
        ..MorphStats::default()
    };

    let segment_count = samples.len() - 1;
    let mut last_stroke_index = 0;
    for i in 0..segment_count {
        if progress(MorphProgress { segment: i, segment_count }).is_break() {
            log::debug!("terrain morph cancelled at segment {i}/{segment_count}");
            return Ok(MorphOutcome::Cancelled);
        }

        let a = samples[i].position;
        let b = samples[i + 1].position;

        // Thin out strokes on finely subdivided, nearly straight stretches.
        let last = samples[last_stroke_index].position;
        if last_stroke_index != i
            && last.distance_to(a) < stroke.radius_flat
            && b.distance_to(a) < stroke.radius_flat * 2.0
        {
            continue;
        }
        last_stroke_index = i;

        let count = (a.distance_to(b) / stroke.radius_flat).ceil() as usize;
        for p in 0..count {
            let position = a.lerp(b, p as f64 / count as f64);
            stats.texels_covered += stroke.mark_window(position, &mut mask);
            stats.strokes += 1;
        }
    }

    stats.texels_written = blend_heights(&stroke, &mut heights, &mask, samples);

    let details: Vec<Vec<u32>> = (0..terrain.detail_layer_count())
        .map(|layer| terrain.get_detail_layer(layer))
        .collect();
    terrain.set_heights(rect, &heights);
    for (layer, values) in details.iter().enumerate() {
        terrain.set_detail_layer(layer, values);
    }

    log::debug!(
        "terrain morph: {} strokes, {} texels covered, {} written",
        stats.strokes,
        stats.texels_covered,
        stats.texels_written
    );
    Ok(MorphOutcome::Applied(stats))
}

/// Morphs every terrain hit by a downward probe from any control point.
///
/// Terrains are processed in index order. Returns
/// [`MorphOutcome::NoTerrainFound`] when no probe hit a terrain.
pub fn morph_underlying_terrains<T: HeightmapAccess>(
    probe_origins: &[Point3],
    samples: &[OrientedSample],
    probe: &impl GroundProbe,
    terrains: &mut [T],
    options: MorphOptions,
    progress: &mut ProgressFn<'_>,
) -> Result<MorphOutcome, TerrainError> {
    let hit: BTreeSet<usize> = probe_origins
        .iter()
        .filter_map(|&origin| probe.cast_down(origin))
        .filter_map(|hit| hit.terrain)
        .filter(|&index| index < terrains.len())
        .collect();

    if hit.is_empty() {
        log::warn!("terrain morph failed: could not find any underlying terrain");
        return Ok(MorphOutcome::NoTerrainFound);
    }

    let mut total = MorphStats::default();
    for (n, index) in hit.iter().enumerate() {
        log::debug!("processing terrain {}/{}", n + 1, hit.len());
        match morph_terrain(samples, &mut terrains[*index], options, &mut *progress)? {
            MorphOutcome::Applied(stats) => total.accumulate(stats),
            other => return Ok(other),
        }
    }

    Ok(MorphOutcome::Applied(total))
}

#[cfg(feature = "parallel")]
fn blend_heights(
    stroke: &TerrainStroke,
    heights: &mut [f64],
    mask: &[bool],
    samples: &[OrientedSample],
) -> usize {
    heights
        .par_chunks_mut(stroke.resolution_x)
        .zip(mask.par_chunks(stroke.resolution_x))
        .enumerate()
        .map(|(y, (row, covered))| blend_row(stroke, y, row, covered, samples))
        .sum()
}

#[cfg(not(feature = "parallel"))]
fn blend_heights(
    stroke: &TerrainStroke,
    heights: &mut [f64],
    mask: &[bool],
    samples: &[OrientedSample],
) -> usize {
    heights
        .chunks_mut(stroke.resolution_x)
        .zip(mask.chunks(stroke.resolution_x))
        .enumerate()
        .map(|(y, (row, covered))| blend_row(stroke, y, row, covered, samples))
        .sum()
}

fn blend_row(
    stroke: &TerrainStroke,
    y: usize,
    row: &mut [f64],
    covered: &[bool],
    samples: &[OrientedSample],
) -> usize {
    let mut written = 0;
    for (x, (height, &is_covered)) in row.iter_mut().zip(covered).enumerate() {
        if !is_covered {
            continue;
        }
        if let Some(value) = stroke.blend_texel(x, y, *height, samples) {
            *height = value;
            written += 1;
        }
    }
    written
}
