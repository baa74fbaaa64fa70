use serde::{Deserialize, Serialize};

/// A closed range `[min, max]` on the real line.
///
/// Used for the per-axis extents of an [`Aabb`](crate::Aabb) and for the
/// clamping ranges of the orbital camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    /// Create a new interval given min and max values.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns the size of the interval (max - min).
    pub fn size(&self) -> f64 {
        self.max - self.min
    }

    /// Midpoint of the interval.
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) * 0.5
    }

    /// Returns true if x is within the interval [min, max] (inclusive).
    pub fn contains(&self, x: f64) -> bool {
        self.min <= x && x <= self.max
    }

    /// Returns true if the two closed intervals share at least one point.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    /// Clamps x to be within the interval [min, max].
    ///
    /// Unlike `f64::clamp` this never panics; an inverted interval yields `max`.
    pub fn clamp(&self, x: f64) -> f64 {
        x.max(self.min).min(self.max)
    }

    /// Expands the interval by delta/2 on each side.
    pub fn expand(&self, delta: f64) -> Interval {
        let padding = delta / 2.0;
        Interval::new(self.min - padding, self.max + padding)
    }

    /// Splits the interval at its midpoint into lower and upper halves.
    pub fn split(&self) -> (Interval, Interval) {
        let mid = self.midpoint();
        (Interval::new(self.min, mid), Interval::new(mid, self.max))
    }
}
