mod core;
mod diagnostics;
mod mesh;
mod metrics;

pub use core::{BBox, Frame, Point3, Tolerance, Vec3};
pub use diagnostics::GeomMeshDiagnostics;
pub use metrics::{GeomMetrics, GeomTimingReport, TimingBucket};
pub use mesh::GeomMesh;

pub(crate) use mesh::finalize_road_mesh;
