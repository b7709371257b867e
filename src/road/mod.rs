//! Road path, mesh generation and terrain morphing.
//!
//! The pipeline runs bottom-up: control points are oriented
//! ([`orient_points`]), subdivided into oriented samples ([`subdivide`]), and
//! swept into the ribbon ([`build_ribbon`]) and border sheets
//! ([`build_borders`]). [`RoadMeshGen`] owns the control points and drives the
//! whole pass; [`PathTracer`] and [`morph_terrain`] consume its samples.

#[cfg(test)]
mod tests;
mod border;
mod config;
mod control_point;
mod generator;
mod orientation;
mod query;
mod ribbon;
mod section;
mod subdivision;
mod terrain;
mod tracer;

pub use border::{BorderMeshes, BorderOptions, build_borders};
pub use config::{
    BorderUvMode, DEFAULT_GROUND_OFFSET, DEFAULT_ROAD_WIDTH, PointControl, RoadConfig, RoadError,
    UpdateMode, UvMode,
};
pub use control_point::{ControlPoint, MIN_POINT_SCALE};
pub use generator::{FinalizedRoad, RoadMeshGen, RoadMeshes};
pub use orientation::{
    CURVATURE_SCALE_DIVISOR, MIN_CURVATURE_SCALE, MIN_END_CURVATURE_SCALE, orient_points,
};
pub use query::{OrientedSample, closest_point_on_path, oriented_samples_at};
pub use ribbon::{RibbonOptions, build_ribbon};
pub use section::{CrossSectionCurve, CurveKey};
pub use subdivision::{PathSample, Subdivision, subdivide};
pub use terrain::{
    GroundHit, GroundProbe, HeightRect, HeightmapAccess, MorphOptions, MorphOutcome,
    MorphProgress, MorphStats, ProgressFn, TerrainError, TerrainGrid, TerrainStroke,
    morph_terrain, morph_underlying_terrains, no_progress,
};
pub use tracer::{DistanceSample, PathSource, PathTracer, TraceError, TracedPath};
