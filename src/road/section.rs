//! Cross-section curve used to shape the border strips.

use serde::{Deserialize, Serialize};

/// One profile key: `x` is the lateral offset from the ribbon edge, `y` the
/// vertical offset along the sample's up-normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub x: f64,
    pub y: f64,
}

impl CurveKey {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance of the key from the profile origin.
    #[must_use]
    pub fn distance_from_origin(self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Ordered list of profile keys, evaluated piecewise linearly.
///
/// Keys are kept sorted by `x` on every write and non-finite keys are dropped,
/// so deserialized curves obey the same invariant as constructed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct CrossSectionCurve {
    keys: Vec<CurveKey>,
}

impl CrossSectionCurve {
    #[must_use]
    pub fn new(keys: impl IntoIterator<Item = CurveKey>) -> Self {
        let mut keys: Vec<CurveKey> = keys
            .into_iter()
            .filter(|k| k.x.is_finite() && k.y.is_finite())
            .collect();
        keys.sort_by(|a, b| a.x.total_cmp(&b.x));
        Self { keys }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self { keys: Vec::new() }
    }

    #[must_use]
    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Inserts a key at its sorted position. Returns the index it landed at,
    /// or `None` if the key was not finite.
    pub fn insert_key(&mut self, key: CurveKey) -> Option<usize> {
        if !key.x.is_finite() || !key.y.is_finite() {
            return None;
        }
        let index = self.keys.partition_point(|k| k.x <= key.x);
        self.keys.insert(index, key);
        Some(index)
    }

    pub fn remove_key(&mut self, index: usize) -> Option<CurveKey> {
        (index < self.keys.len()).then(|| self.keys.remove(index))
    }

    /// Vertical offset at lateral offset `x`, held constant outside the key range.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if x <= first.x {
            return first.y;
        }
        if x >= last.x {
            return last.y;
        }

        let upper = self.keys.partition_point(|k| k.x <= x);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.x - a.x;
        if span <= 0.0 {
            return b.y;
        }
        a.y + (b.y - a.y) * ((x - a.x) / span)
    }
}

impl Default for CrossSectionCurve {
    fn default() -> Self {
        Self::new([
            CurveKey::new(0.0, 0.0),
            CurveKey::new(0.3, 0.6),
            CurveKey::new(1.0, 0.6),
        ])
    }
}

impl From<Vec<CurveKey>> for CrossSectionCurve {
    fn from(keys: Vec<CurveKey>) -> Self {
        Self::new(keys)
    }
}

impl From<CrossSectionCurve> for Vec<CurveKey> {
    fn from(curve: CrossSectionCurve) -> Self {
        curve.keys
    }
}
