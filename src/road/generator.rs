//! The road generator: owns the control points and the latest meshes.

use crate::geom::{Frame, GeomMesh, GeomMeshDiagnostics, GeomMetrics, Point3, TimingBucket, Vec3};

use super::border::{BorderMeshes, BorderOptions, build_borders};
use super::config::{RoadConfig, RoadError, UpdateMode};
use super::control_point::ControlPoint;
use super::orientation::orient_points;
use super::query::{OrientedSample, closest_point_on_path, oriented_samples_at};
use super::ribbon::{RibbonOptions, build_ribbon};
use super::subdivision::{Subdivision, subdivide};
use super::terrain::{
    GroundProbe, HeightmapAccess, MorphOptions, MorphOutcome, ProgressFn, TerrainError,
    morph_terrain, morph_underlying_terrains,
};
use super::tracer::PathSource;

/// Render buffers of one regeneration pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoadMeshes {
    pub ribbon: GeomMesh,
    /// Present only when borders are enabled.
    pub borders: Option<BorderMeshes>,
    pub diagnostics: GeomMeshDiagnostics,
}

/// What is left after [`RoadMeshGen::finalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedRoad {
    pub meshes: RoadMeshes,
    /// Whether dependent collaborators should clear their own state.
    pub clear_dependents: bool,
}

/// Output of one successful regeneration, committed as a whole.
#[derive(Debug)]
struct Pass {
    points: Vec<ControlPoint>,
    path: Subdivision,
    meshes: RoadMeshes,
}

/// Owns the control points and the result of the last regeneration.
///
/// Point edits are pending until the next regeneration. Queries, terrain
/// morphs and [`revision`](Self::revision) always describe the last
/// regenerated path, the same one the meshes were built from.
#[derive(Debug)]
pub struct RoadMeshGen {
    config: RoadConfig,
    points: Vec<ControlPoint>,
    path: Subdivision,
    meshes: RoadMeshes,
    revision: u64,
    metrics: GeomMetrics,
}

impl RoadMeshGen {
    /// New generator with a single control point at the config origin.
    pub fn new(config: RoadConfig) -> Result<Self, RoadError> {
        let origin = config.origin;
        Self::with_points(config, vec![ControlPoint::new(origin)])
    }

    pub fn with_points(config: RoadConfig, points: Vec<ControlPoint>) -> Result<Self, RoadError> {
        let mut metrics = GeomMetrics::default();
        let pass = build_pass(&config, &points, &mut metrics)?;
        Ok(Self {
            config,
            points: pass.points,
            path: pass.path,
            meshes: pass.meshes,
            revision: 1,
            metrics,
        })
    }

    #[must_use]
    pub fn config(&self) -> &RoadConfig {
        &self.config
    }

    /// Replaces the configuration and regenerates. An invalid config is
    /// rejected and the previous one kept.
    pub fn set_config(&mut self, config: RoadConfig) -> Result<&RoadMeshes, RoadError> {
        let pass = build_pass(&config, &self.points, &mut self.metrics)?;
        self.config = config;
        self.points = pass.points;
        self.path = pass.path;
        self.meshes = pass.meshes;
        self.revision += 1;
        Ok(&self.meshes)
    }

    #[must_use]
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Result<&ControlPoint, RoadError> {
        self.points.get(index).ok_or(RoadError::IndexOutOfRange {
            index,
            len: self.points.len(),
        })
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Replaces the whole path. Takes effect on the next regeneration.
    pub fn set_points(&mut self, points: Vec<ControlPoint>) -> Result<(), RoadError> {
        validate_points(&points)?;
        self.points = points;
        Ok(())
    }

    /// Moves a control point. Takes effect on the next regeneration.
    pub fn set_point_transform(&mut self, index: usize, position: Point3, frame: Frame) -> Result<(), RoadError> {
        let point = self.point_mut(index)?;
        let moved = ControlPoint {
            position,
            frame: frame.orthonormalized(),
            ..*point
        };
        if !moved.is_finite() {
            return Err(RoadError::NonFinitePoint(index));
        }
        *point = moved;
        Ok(())
    }

    pub fn set_point_scale(&mut self, index: usize, scale: Vec3) -> Result<(), RoadError> {
        if !scale.is_finite() {
            return Err(RoadError::NonFinitePoint(index));
        }
        self.point_mut(index)?.scale = scale;
        Ok(())
    }

    #[must_use]
    pub fn meshes(&self) -> &RoadMeshes {
        &self.meshes
    }

    /// Bumped on every successful regeneration.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ─── Regeneration ───────────────────────────────────────────────────────

    /// Re-orients the control points and rebuilds every mesh.
    ///
    /// Nothing is stored until every stage succeeded, so a failed pass leaves
    /// points and meshes as they were.
    pub fn regenerate(&mut self) -> Result<&RoadMeshes, RoadError> {
        let points = self.points.clone();
        self.commit(points)
    }

    /// Regenerates from `points` and stores the result only on success.
    fn commit(&mut self, points: Vec<ControlPoint>) -> Result<&RoadMeshes, RoadError> {
        let pass = build_pass(&self.config, &points, &mut self.metrics)?;
        self.points = pass.points;
        self.path = pass.path;
        self.meshes = pass.meshes;
        self.revision += 1;
        Ok(&self.meshes)
    }

    /// Regenerates in [`UpdateMode::Realtime`]; does nothing otherwise.
    /// Returns whether a regeneration happened.
    pub fn tick(&mut self) -> Result<bool, RoadError> {
        if self.config.update_mode != UpdateMode::Realtime {
            return Ok(false);
        }
        self.regenerate()?;
        Ok(true)
    }

    // ─── Control point editing ──────────────────────────────────────────────

    /// Adds a control point after `insert_after`, or at the end when `None`.
    ///
    /// The new point sits one road width ahead of its anchor and copies the
    /// anchor's orientation. Inserting after a snapped point is refused.
    /// Returns the new point's index.
    pub fn create_point(&mut self, insert_after: Option<usize>) -> Result<usize, RoadError> {
        let anchor_index = match insert_after {
            Some(index) => {
                let anchor = self.point(index)?;
                if anchor.snapped {
                    log::warn!("control point {index} is snapped; unsnap it to add new points");
                    return Err(RoadError::SnappedAnchor(index));
                }
                Some(index)
            }
            None => self.points.len().checked_sub(1),
        };

        let point = match anchor_index {
            Some(index) => {
                let anchor = &self.points[index];
                ControlPoint::with_frame(anchor.position + anchor.forward() * self.config.width, anchor.frame)
            }
            None => ControlPoint::new(self.config.origin),
        };

        let mut points = self.points.clone();
        let index = match insert_after {
            Some(after) => {
                points.insert(after + 1, point);
                after + 1
            }
            None => {
                points.push(point);
                points.len() - 1
            }
        };

        self.commit(points)?;
        Ok(index)
    }

    /// Removes the point at `index`, or the last one when `None`. The path
    /// always keeps at least one point.
    pub fn delete_point(&mut self, index: Option<usize>) -> Result<ControlPoint, RoadError> {
        let index = index.unwrap_or(self.points.len().saturating_sub(1));
        self.point(index)?;
        if self.points.len() == 1 {
            return Err(RoadError::EmptyPath);
        }
        let mut points = self.points.clone();
        let removed = points.remove(index);
        self.commit(points)?;
        Ok(removed)
    }

    /// Clears the path back to a single point at the origin.
    pub fn reset(&mut self) -> Result<&RoadMeshes, RoadError> {
        self.commit(vec![ControlPoint::new(self.config.origin)])
    }

    /// Locks or unlocks the width of a point. Locking captures the current
    /// road width.
    pub fn lock_width(&mut self, index: usize, locked: bool) -> Result<(), RoadError> {
        let width = self.config.width;
        let point = self.point_mut(index)?;
        point.width_locked = locked;
        if locked {
            point.locked_width = width;
        }
        Ok(())
    }

    /// Hands a point over to an external snapping collaborator, which pushes
    /// the given transform in. Automatic orientation leaves it alone until
    /// [`unsnap_point`](Self::unsnap_point).
    pub fn snap_point(&mut self, index: usize, position: Point3, frame: Frame) -> Result<(), RoadError> {
        self.set_point_transform(index, position, frame)?;
        self.point_mut(index)?.snapped = true;
        Ok(())
    }

    pub fn unsnap_point(&mut self, index: usize) -> Result<(), RoadError> {
        self.point_mut(index)?.snapped = false;
        Ok(())
    }

    /// Drops every point onto the ground below it, `offset` along the hit
    /// normal. Unsnapped points are tilted so their up follows the ground
    /// while keeping their heading. Returns the number of grounded points.
    pub fn ground_points(&mut self, probe: &impl GroundProbe, offset: f64) -> Result<usize, RoadError> {
        let mut points = self.points.clone();
        let mut grounded = 0;

        for point in &mut points {
            let Some(hit) = probe.cast_down(point.position) else {
                continue;
            };
            let normal = hit.normal.normalized_or(Vec3::Y);
            point.position = hit.point + normal * offset;
            if !point.snapped {
                let heading = point.forward().reject_from(normal);
                if let Some(frame) = Frame::look_rotation(heading, normal) {
                    point.frame = frame;
                }
            }
            grounded += 1;
        }

        self.commit(points)?;
        Ok(grounded)
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    /// Subdivision the current meshes were built from.
    #[must_use]
    pub fn subdivision(&self) -> &Subdivision {
        &self.path
    }

    #[must_use]
    pub fn oriented_samples_at(&self, horizontal: f64, vertical: f64) -> Vec<OrientedSample> {
        oriented_samples_at(&self.path, horizontal, vertical)
    }

    #[must_use]
    pub fn closest_point_on_path(&self, point: Point3) -> Point3 {
        closest_point_on_path(point, &self.oriented_samples_at(0.0, 0.0))
    }

    // ─── Terrain ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn morph_options(&self) -> MorphOptions {
        MorphOptions {
            flat_radius: self.config.flat_radius(),
            smooth_radius: self.config.smooth_radius(),
            ground_offset: self.config.ground_offset,
        }
    }

    pub fn morph_terrain(
        &mut self,
        terrain: &mut impl HeightmapAccess,
        progress: &mut ProgressFn<'_>,
    ) -> Result<MorphOutcome, TerrainError> {
        let samples = self.oriented_samples_at(0.0, 0.0);
        let options = self.morph_options();
        self.metrics.begin();
        let outcome = self
            .metrics
            .time(TimingBucket::TerrainMorph, || morph_terrain(&samples, terrain, options, progress));
        if let Some(timing) = self.metrics.end() {
            log::debug!("terrain morph took {:.3} ms", timing.total_ms());
        }
        outcome
    }

    /// Probes under every control point and morphs each terrain that was hit.
    pub fn morph_underlying_terrains<T: HeightmapAccess>(
        &mut self,
        probe: &impl GroundProbe,
        terrains: &mut [T],
        progress: &mut ProgressFn<'_>,
    ) -> Result<MorphOutcome, TerrainError> {
        let origins = self.path.control_positions();
        let samples = self.oriented_samples_at(0.0, 0.0);
        let options = self.morph_options();
        morph_underlying_terrains(&origins, &samples, probe, terrains, options, progress)
    }

    // ─── Teardown ───────────────────────────────────────────────────────────

    /// Consumes the generator and hands out its last meshes.
    ///
    /// `teardown` tells whether the road is being destroyed as a whole, in
    /// which case dependents should keep their state.
    #[must_use]
    pub fn finalize(self, teardown: bool) -> FinalizedRoad {
        FinalizedRoad {
            meshes: self.meshes,
            clear_dependents: !teardown,
        }
    }

    fn point_mut(&mut self, index: usize) -> Result<&mut ControlPoint, RoadError> {
        let len = self.points.len();
        self.points
            .get_mut(index)
            .ok_or(RoadError::IndexOutOfRange { index, len })
    }
}

impl PathSource for RoadMeshGen {
    fn oriented_samples_at(&self, horizontal: f64, vertical: f64) -> Vec<OrientedSample> {
        RoadMeshGen::oriented_samples_at(self, horizontal, vertical)
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

fn build_pass(
    config: &RoadConfig,
    points: &[ControlPoint],
    metrics: &mut GeomMetrics,
) -> Result<Pass, RoadError> {
    config.validate()?;
    validate_points(points)?;
    metrics.begin();

    let points = metrics.time(TimingBucket::Orientation, || orient_points(points, config.point_control, config.up()));
    validate_points(&points)?;
    let path = metrics.time(TimingBucket::Subdivision, || subdivide(&points, config.subdivision(), config.width))?;

    let (ribbon, mut diagnostics) =
        metrics.time(TimingBucket::Ribbon, || build_ribbon(&path, RibbonOptions::from_config(config)))?;

    let borders = if config.borders_enabled {
        let (borders, border_diagnostics) =
            metrics.time(TimingBucket::Border, || build_borders(&path, &BorderOptions::from_config(config)))?;
        diagnostics.merge(&border_diagnostics);
        Some(borders)
    } else {
        None
    };
    diagnostics.timing = metrics.end();

    log::debug!(
        "regenerated road: {} points, {} samples, {}",
        points.len(),
        path.sample_count(),
        diagnostics.summary()
    );

    Ok(Pass {
        points,
        path,
        meshes: RoadMeshes {
            ribbon,
            borders,
            diagnostics,
        },
    })
}

fn validate_points(points: &[ControlPoint]) -> Result<(), RoadError> {
    if points.is_empty() {
        return Err(RoadError::EmptyPath);
    }
    match points.iter().position(|p| !p.is_finite()) {
        Some(index) => Err(RoadError::NonFinitePoint(index)),
        None => Ok(()),
    }
}
