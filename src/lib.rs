#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;
pub mod road;

use std::fmt;

use geom::{GeomMesh, GeomMeshDiagnostics, Point3, Vec3};
use road::{
    ControlPoint, OrientedSample, PathTracer, RoadConfig, RoadMeshGen, RoadMeshes, TerrainGrid,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), wasm_bindgen::JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| wasm_bindgen::JsError::new(&format!("could not initialise the rayon thread pool: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

#[derive(Debug, Serialize, PartialEq)]
struct MeshExport<'a> {
    positions: &'a [f64],
    indices: &'a [u32],
    #[serde(skip_serializing_if = "Option::is_none")]
    uvs: Option<&'a [f64]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    normals: Option<&'a [f64]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tangents: Option<&'a [f64]>,
}

impl<'a> From<&'a GeomMesh> for MeshExport<'a> {
    fn from(mesh: &'a GeomMesh) -> Self {
        Self {
            positions: mesh.positions_flat(),
            indices: &mesh.indices,
            uvs: mesh.uvs_flat(),
            normals: mesh.normals_flat(),
            tangents: mesh.tangents_flat(),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct DiagnosticsExport<'a> {
    vertex_count: usize,
    triangle_count: usize,
    sample_count: usize,
    degenerate_triangle_count: usize,
    open_edge_count: usize,
    warnings: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    timing_ms: Option<f64>,
}

impl<'a> From<&'a GeomMeshDiagnostics> for DiagnosticsExport<'a> {
    fn from(diag: &'a GeomMeshDiagnostics) -> Self {
        Self {
            vertex_count: diag.vertex_count,
            triangle_count: diag.triangle_count,
            sample_count: diag.sample_count,
            degenerate_triangle_count: diag.degenerate_triangle_count,
            open_edge_count: diag.open_edge_count,
            warnings: &diag.warnings,
            timing_ms: diag.timing.as_ref().map(|t| t.total_ms()),
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct RoadMeshesExport<'a> {
    revision: u64,
    ribbon: MeshExport<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    left_border: Option<MeshExport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    right_border: Option<MeshExport<'a>>,
    diagnostics: DiagnosticsExport<'a>,
}

impl<'a> RoadMeshesExport<'a> {
    fn new(meshes: &'a RoadMeshes, revision: u64) -> Self {
        Self {
            revision,
            ribbon: MeshExport::from(&meshes.ribbon),
            left_border: meshes.borders.as_ref().map(|b| MeshExport::from(&b.left)),
            right_border: meshes.borders.as_ref().map(|b| MeshExport::from(&b.right)),
            diagnostics: DiagnosticsExport::from(&meshes.diagnostics),
        }
    }
}

/// Public entry point for JS hosts.
#[wasm_bindgen]
pub struct RoadEngine {
    generator: RoadMeshGen,
    tracer: PathTracer,
}

#[wasm_bindgen]
impl RoadEngine {
    /// Engine with the default configuration and a single point at the origin.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<RoadEngine, JsValue> {
        let generator = RoadMeshGen::new(RoadConfig::default()).map_err(to_js_error)?;
        Ok(RoadEngine {
            generator,
            tracer: PathTracer::new(),
        })
    }

    /// Replaces the configuration; missing fields take their defaults.
    #[wasm_bindgen]
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: RoadConfig = serde_wasm_bindgen::from_value(config).map_err(to_js_error)?;
        self.generator.set_config(config).map_err(to_js_error)?;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn get_config(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.generator.config()).map_err(to_js_error)
    }

    /// Replaces every control point. Call [`regenerate`](Self::regenerate)
    /// afterwards.
    #[wasm_bindgen]
    pub fn set_points(&mut self, points: JsValue) -> Result<(), JsValue> {
        let points: Vec<ControlPoint> = serde_wasm_bindgen::from_value(points).map_err(to_js_error)?;
        self.generator.set_points(points).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn get_points(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.generator.points()).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn create_point(&mut self, insert_after: Option<u32>) -> Result<u32, JsValue> {
        let index = self
            .generator
            .create_point(insert_after.map(|i| i as usize))
            .map_err(to_js_error)?;
        u32::try_from(index).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn delete_point(&mut self, index: Option<u32>) -> Result<(), JsValue> {
        self.generator
            .delete_point(index.map(|i| i as usize))
            .map(|_| ())
            .map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.generator.reset().map(|_| ()).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn lock_width(&mut self, index: u32, locked: bool) -> Result<(), JsValue> {
        self.generator.lock_width(index as usize, locked).map_err(to_js_error)
    }

    /// Rebuilds every mesh and returns the packed buffers.
    #[wasm_bindgen]
    pub fn regenerate(&mut self) -> Result<JsValue, JsValue> {
        self.generator.regenerate().map_err(to_js_error)?;
        debug_log!("road regenerated at revision {}", self.generator.revision());
        self.get_meshes()
    }

    /// Regenerates in realtime mode; returns whether anything changed.
    #[wasm_bindgen]
    pub fn tick(&mut self) -> Result<bool, JsValue> {
        self.generator.tick().map_err(to_js_error)
    }

    /// Packed buffers of the last regeneration.
    #[wasm_bindgen]
    pub fn get_meshes(&self) -> Result<JsValue, JsValue> {
        let export = RoadMeshesExport::new(self.generator.meshes(), self.generator.revision());
        serde_wasm_bindgen::to_value(&export).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn oriented_samples_at(&self, horizontal: f64, vertical: f64) -> Result<JsValue, JsValue> {
        let samples = self.generator.oriented_samples_at(horizontal, vertical);
        serde_wasm_bindgen::to_value(&samples).map_err(to_js_error)
    }

    /// Projects `(x, y, z)` onto the path; returns `[x, y, z]`.
    #[wasm_bindgen]
    pub fn closest_point_on_path(&self, x: f64, y: f64, z: f64) -> Vec<f64> {
        self.generator
            .closest_point_on_path(Point3::new(x, y, z))
            .to_array()
            .to_vec()
    }

    /// Snapshots the path with the given offsets into slot `path_index`.
    /// Returns the traced length.
    #[wasm_bindgen]
    pub fn trace_path(&mut self, path_index: u32, horizontal: f64, vertical: f64) -> Result<f64, JsValue> {
        self.tracer
            .trace_path(path_index as usize, &self.generator, horizontal, vertical)
            .map(road::TracedPath::total_length)
            .map_err(to_js_error)
    }

    /// Sample `distance` along traced path `path_index`, re-tracing it first
    /// if the road changed since.
    #[wasm_bindgen]
    pub fn evaluate(&mut self, path_index: u32, distance: f64, lookahead: f64) -> Result<JsValue, JsValue> {
        self.tracer.refresh_stale(&self.generator);
        let sample: OrientedSample = self
            .tracer
            .evaluate(path_index as usize, distance, lookahead)
            .map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&sample).map_err(to_js_error)
    }

    /// Flattens a square heightmap under the road and returns the new
    /// heights. `heights` is row-major with `resolution * resolution`
    /// normalised values.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn morph_heightmap(
        &mut self,
        heights: Vec<f64>,
        resolution: u32,
        position_x: f64,
        position_y: f64,
        position_z: f64,
        size_x: f64,
        size_y: f64,
        size_z: f64,
    ) -> Result<Vec<f64>, JsValue> {
        let resolution = resolution as usize;
        let mut grid = TerrainGrid::flat(
            Point3::new(position_x, position_y, position_z),
            Vec3::new(size_x, size_y, size_z),
            resolution,
            0.0,
        );
        if heights.len() != grid.heights.len() {
            return Err(js_error(&format!(
                "expected {} heights for a {resolution}x{resolution} heightmap, got {}",
                grid.heights.len(),
                heights.len()
            )));
        }
        grid.heights = heights;

        let outcome = self
            .generator
            .morph_terrain(&mut grid, &mut road::no_progress)
            .map_err(to_js_error)?;
        log::debug!("heightmap morph outcome: {outcome:?}");
        Ok(grid.heights)
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen::JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::{MeshExport, RoadMeshesExport};
    use crate::geom::Point3;
    use crate::road::{ControlPoint, RoadConfig, RoadMeshGen};

    #[test]
    fn export_packs_flat_buffers() {
        let points = vec![
            ControlPoint::new(Point3::ORIGIN),
            ControlPoint::new(Point3::new(10.0, 0.0, 0.0)),
        ];
        let generator = RoadMeshGen::with_points(RoadConfig::default(), points).expect("generator");
        let meshes = generator.meshes();

        let export = RoadMeshesExport::new(meshes, generator.revision());
        assert_eq!(export.ribbon.positions.len(), 4 * 3);
        assert_eq!(export.ribbon.indices.len(), 6);
        assert_eq!(export.ribbon.uvs.map(<[f64]>::len), Some(4 * 2));
        assert!(export.left_border.is_none());
        assert_eq!(export.diagnostics.triangle_count, 2);
        assert_eq!(export.revision, 1);
    }

    #[test]
    fn export_includes_borders_when_enabled() {
        let config = RoadConfig {
            borders_enabled: true,
            ..RoadConfig::default()
        };
        let points = vec![
            ControlPoint::new(Point3::ORIGIN),
            ControlPoint::new(Point3::new(0.0, 0.0, 5.0)),
        ];
        let generator = RoadMeshGen::with_points(config, points).expect("generator");

        let export = RoadMeshesExport::new(generator.meshes(), generator.revision());
        let left = export.left_border.expect("left border");
        assert_eq!(left, MeshExport::from(&generator.meshes().borders.as_ref().expect("borders").left));
        assert_eq!(left.positions.len(), 6 * 3);
    }
}
