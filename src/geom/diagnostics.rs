//! Mesh diagnostics for generated road geometry.
//!
//! Road ribbons and border sheets are open surfaces by construction, so open
//! edges are reported but never treated as a defect. Degenerate triangles and
//! non-manifold edges are.
//!
//! ```ignore
//! use roadmesh_engine::road::{build_ribbon, RibbonOptions};
//!
//! let (mesh, diagnostics) = build_ribbon(&path, RibbonOptions::from_config(&config))?;
//! if !diagnostics.is_clean() {
//!     log::warn!("{}", diagnostics.summary());
//! }
//! ```

use std::fmt;

/// Diagnostics returned alongside every generated mesh.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeomMeshDiagnostics {
    /// Total number of vertices in the final mesh.
    pub vertex_count: usize,

    /// Total number of triangles in the final mesh.
    pub triangle_count: usize,

    /// Number of path samples the mesh was built from.
    pub sample_count: usize,

    /// Number of zero-area triangles.
    ///
    /// They are kept in the index buffer so vertex and index counts stay
    /// predictable, typically coincident control points or a zero width.
    pub degenerate_triangle_count: usize,

    /// Number of boundary edges (one adjacent triangle).
    pub open_edge_count: usize,

    /// Number of edges shared by more than two triangles.
    pub non_manifold_edge_count: usize,

    /// Optional timing breakdown, populated with the `engine_metrics` feature.
    pub timing: Option<super::metrics::GeomTimingReport>,

    /// Human-readable warnings about the generated mesh.
    pub warnings: Vec<String>,
}

impl GeomMeshDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the mesh is manifold (no non-manifold edges).
    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    /// Returns `true` when no degenerate triangles, non-manifold edges or
    /// warnings were recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.degenerate_triangle_count == 0
            && self.non_manifold_edge_count == 0
            && self.warnings.is_empty()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Merges another diagnostics struct into this one.
    ///
    /// Counts are summed and warnings appended. `timing` from `other` is
    /// ignored; a parent `GeomMetrics` tracks timing across operations.
    pub fn merge(&mut self, other: &GeomMeshDiagnostics) {
        self.vertex_count += other.vertex_count;
        self.triangle_count += other.triangle_count;
        self.sample_count = self.sample_count.max(other.sample_count);
        self.degenerate_triangle_count += other.degenerate_triangle_count;
        self.open_edge_count += other.open_edge_count;
        self.non_manifold_edge_count += other.non_manifold_edge_count;
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Returns a short summary string suitable for logging.
    ///
    /// Format: `"V:{vertices} T:{triangles} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("V:{} T:{}", self.vertex_count, self.triangle_count)];

        if self.sample_count > 0 {
            parts.push(format!("samples:{}", self.sample_count));
        }
        if self.degenerate_triangle_count > 0 {
            parts.push(format!("degenerate:{}", self.degenerate_triangle_count));
        }
        if self.open_edge_count > 0 {
            parts.push(format!("open:{}", self.open_edge_count));
        }
        if self.non_manifold_edge_count > 0 {
            parts.push(format!("non-manifold:{}", self.non_manifold_edge_count));
        }

        parts.join(" ")
    }
}

impl fmt::Display for GeomMeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Diagnostics:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;
        writeln!(f, "  Samples: {}", self.sample_count)?;
        writeln!(f, "  Open edges: {}", self.open_edge_count)?;

        if self.degenerate_triangle_count > 0 || self.non_manifold_edge_count > 0 {
            writeln!(f, "  Issues:")?;
            if self.degenerate_triangle_count > 0 {
                writeln!(f, "    - Degenerate triangles: {}", self.degenerate_triangle_count)?;
            }
            if self.non_manifold_edge_count > 0 {
                writeln!(f, "    - Non-manifold edges: {}", self.non_manifold_edge_count)?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {}", warning)?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        let status = if self.is_clean() { "CLEAN" } else { "ISSUES DETECTED" };
        writeln!(f, "  Status: {}", status)?;

        Ok(())
    }
}
