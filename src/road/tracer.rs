//! Arc-length parameterised access to traced paths.
//!
//! A [`PathTracer`] snapshots offset samples from a [`PathSource`] into
//! numbered slots, accumulates distances once, and then answers
//! distance-based queries without touching the source again. Slots remember
//! the source revision they were traced at so callers can detect staleness.

use crate::geom::Point3;

use super::query::OrientedSample;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TraceError {
    #[error("no traced path at index {0}; trace the path first")]
    NotTraced(usize),
    #[error("path source produced no samples for path {0}")]
    EmptyPath(usize),
}

/// Anything that can hand out offset path samples.
pub trait PathSource {
    fn oriented_samples_at(&self, horizontal: f64, vertical: f64) -> Vec<OrientedSample>;

    /// Monotonic counter bumped whenever the path geometry changes.
    fn revision(&self) -> u64;
}

/// An oriented sample with its cumulative distance from the path start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSample {
    pub sample: OrientedSample,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TracedPath {
    pub samples: Vec<DistanceSample>,
    pub horizontal_offset: f64,
    pub vertical_offset: f64,
    pub revision: u64,
}

impl TracedPath {
    #[must_use]
    pub fn new(samples: Vec<OrientedSample>, horizontal_offset: f64, vertical_offset: f64, revision: u64) -> Self {
        let mut total = 0.0;
        let mut previous: Option<Point3> = None;
        let samples = samples
            .into_iter()
            .map(|sample| {
                if let Some(prev) = previous {
                    total += prev.distance_to(sample.position);
                }
                previous = Some(sample.position);
                DistanceSample { sample, distance: total }
            })
            .collect();

        Self {
            samples,
            horizontal_offset,
            vertical_offset,
            revision,
        }
    }

    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.distance)
    }

    /// Sample at arc length `distance`.
    ///
    /// The bracketing interval starts at the last sample whose distance is
    /// strictly below `distance`. Position and binormal/normal are
    /// interpolated; the tangent comes from the interval start. Distances
    /// outside the path clamp to its ends.
    #[must_use]
    pub fn distance_at(&self, distance: f64) -> Option<OrientedSample> {
        let (first, rest) = self.samples.split_first()?;
        if rest.is_empty() {
            return Some(first.sample);
        }

        let mut index = 0;
        for (i, s) in self.samples[..self.samples.len() - 1].iter().enumerate() {
            if s.distance < distance {
                index = i;
            } else {
                break;
            }
        }

        let a = &self.samples[index];
        let b = &self.samples[index + 1];
        let interval = (b.distance - a.distance).abs();
        let t = if interval > f64::EPSILON {
            ((distance - a.distance) / interval).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Some(OrientedSample {
            position: a.sample.position.lerp(b.sample.position, t),
            tangent: a.sample.tangent,
            binormal: a
                .sample
                .binormal
                .lerp(b.sample.binormal, t)
                .normalized_or(a.sample.binormal),
            normal: a.sample.normal.lerp(b.sample.normal, t).normalized_or(a.sample.normal),
        })
    }

    /// Sample at `distance` whose tangent points toward the sample
    /// `lookahead` further along. A single-sample path walks along its own
    /// tangent.
    #[must_use]
    pub fn evaluate(&self, distance: f64, lookahead: f64) -> Option<OrientedSample> {
        match self.samples.as_slice() {
            [] => None,
            [only] => Some(OrientedSample {
                position: only.sample.position + only.sample.tangent * distance,
                ..only.sample
            }),
            _ => {
                let a = self.distance_at(distance)?;
                let b = self.distance_at(distance + lookahead)?;
                Some(OrientedSample {
                    tangent: (b.position - a.position).normalized_or(a.tangent),
                    ..a
                })
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathTracer {
    paths: Vec<Option<TracedPath>>,
    distance_record: f64,
}

impl PathTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots `source` at the given offsets into slot `path_index`,
    /// growing the slot list as needed.
    pub fn trace_path(
        &mut self,
        path_index: usize,
        source: &impl PathSource,
        horizontal_offset: f64,
        vertical_offset: f64,
    ) -> Result<&TracedPath, TraceError> {
        let samples = source.oriented_samples_at(horizontal_offset, vertical_offset);
        if samples.is_empty() {
            return Err(TraceError::EmptyPath(path_index));
        }

        let traced = TracedPath::new(samples, horizontal_offset, vertical_offset, source.revision());
        self.distance_record = traced.total_length();
        log::debug!(
            "traced path {path_index}: {} samples, length {:.3}",
            traced.samples.len(),
            self.distance_record
        );

        if self.paths.len() <= path_index {
            self.paths.resize(path_index + 1, None);
        }
        Ok(&*self.paths[path_index].insert(traced))
    }

    /// Re-traces every slot whose revision differs from the source's.
    /// Returns the number of refreshed slots.
    pub fn refresh_stale(&mut self, source: &impl PathSource) -> usize {
        let revision = source.revision();
        let stale: Vec<(usize, f64, f64)> = self
            .paths
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.as_ref().map(|p| (i, p)))
            .filter(|(_, p)| p.revision != revision)
            .map(|(i, p)| (i, p.horizontal_offset, p.vertical_offset))
            .collect();

        stale
            .into_iter()
            .filter(|&(i, h, v)| self.trace_path(i, source, h, v).is_ok())
            .count()
    }

    pub fn path(&self, path_index: usize) -> Result<&TracedPath, TraceError> {
        self.paths
            .get(path_index)
            .and_then(Option::as_ref)
            .ok_or(TraceError::NotTraced(path_index))
    }

    #[must_use]
    pub fn is_stale(&self, path_index: usize, source: &impl PathSource) -> bool {
        self.path(path_index).map_or(true, |p| p.revision != source.revision())
    }

    pub fn distance_at(&self, path_index: usize, distance: f64) -> Result<OrientedSample, TraceError> {
        self.path(path_index)?
            .distance_at(distance)
            .ok_or(TraceError::EmptyPath(path_index))
    }

    pub fn evaluate(
        &self,
        path_index: usize,
        distance: f64,
        lookahead: f64,
    ) -> Result<OrientedSample, TraceError> {
        self.path(path_index)?
            .evaluate(distance, lookahead)
            .ok_or(TraceError::EmptyPath(path_index))
    }

    pub fn total_length(&self, path_index: usize) -> Result<f64, TraceError> {
        Ok(self.path(path_index)?.total_length())
    }

    /// Length of the most recently traced path.
    #[must_use]
    pub fn distance_record(&self) -> f64 {
        self.distance_record
    }

    #[must_use]
    pub fn traced_count(&self) -> usize {
        self.paths.iter().filter(|p| p.is_some()).count()
    }
}
