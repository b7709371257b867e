//! Opt-in timing hooks for the road pipeline.
//!
//! Timing is only collected when the `engine_metrics` feature is enabled and
//! the target is not WASM (`std::time::Instant` is unavailable there). In every
//! other configuration the calls compile down to plain closure invocations.
//!
//! ```ignore
//! use roadmesh_engine::geom::{GeomMetrics, TimingBucket};
//!
//! let mut metrics = GeomMetrics::default();
//! metrics.begin();
//! let samples = metrics.time(TimingBucket::Subdivision, || subdivide(&points, 8, 1.2));
//! if let Some(report) = metrics.end() {
//!     println!("subdivision: {} ns", report.subdivision_ns);
//! }
//! ```

/// Pipeline stages that accumulate elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Automatic control point orientation.
    Orientation,
    /// Cubic interpolation of the control points into samples.
    Subdivision,
    /// Ribbon vertex, UV and index generation.
    Ribbon,
    /// Border sheet generation.
    Border,
    /// Heightmap flattening along the road.
    TerrainMorph,
}

/// Cumulative nanoseconds per bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeomTimingReport {
    pub orientation_ns: u64,
    pub subdivision_ns: u64,
    pub ribbon_ns: u64,
    pub border_ns: u64,
    pub terrain_morph_ns: u64,
}

impl GeomTimingReport {
    /// Returns the total time across all buckets in nanoseconds.
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.orientation_ns
            .saturating_add(self.subdivision_ns)
            .saturating_add(self.ribbon_ns)
            .saturating_add(self.border_ns)
            .saturating_add(self.terrain_morph_ns)
    }

    /// Returns the total time in milliseconds (for display purposes).
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for timing pipeline stages.
///
/// Call [`begin`](Self::begin) to reset, wrap work with [`time`](Self::time),
/// and call [`end`](Self::end) to retrieve the report.
#[derive(Debug, Default)]
pub struct GeomMetrics {
    #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
    report: GeomTimingReport,
}

impl GeomMetrics {
    pub fn begin(&mut self) {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            self.report = GeomTimingReport::default();
        }
    }

    /// Returns the accumulated timing report, or `None` if metrics are disabled.
    #[must_use]
    pub fn end(&self) -> Option<GeomTimingReport> {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "engine_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Times the execution of `f` and accumulates the elapsed time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let elapsed = start.elapsed();
            let nanos_u64 = elapsed.as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos_u64);
            result
        }

        #[cfg(not(all(feature = "engine_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::Orientation => &mut self.report.orientation_ns,
            TimingBucket::Subdivision => &mut self.report.subdivision_ns,
            TimingBucket::Ribbon => &mut self.report.ribbon_ns,
            TimingBucket::Border => &mut self.report.border_ns,
            TimingBucket::TerrainMorph => &mut self.report.terrain_morph_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}
