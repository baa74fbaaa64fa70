use crate::{Interval, Ray};
use glam::DVec3;

/// Slack applied to face containment checks so that a ray grazing a box
/// edge is not lost to rounding.
const FACE_TOLERANCE: f64 = 1e-9;

/// Axis-Aligned Bounding Box for the octree.
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB from two corner points.
    pub fn from_points(a: DVec3, b: DVec3) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(
            Interval::new(min.x, max.x),
            Interval::new(min.y, max.y),
            Interval::new(min.z, max.z),
        )
    }

    /// Smallest box enclosing every point, or `None` for an empty iterator.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = DVec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self::from_points(min, max))
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn min(&self) -> DVec3 {
        DVec3::new(self.x.min, self.y.min, self.z.min)
    }

    pub fn max(&self) -> DVec3 {
        DVec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Inclusive point containment.
    pub fn contains_point(&self, p: DVec3) -> bool {
        self.x.contains(p.x) && self.y.contains(p.y) && self.z.contains(p.z)
    }

    /// True if at least one of the triangle's vertices lies inside the box.
    pub fn contains_any_vertex_of(&self, vertices: &[DVec3; 3]) -> bool {
        vertices.iter().any(|v| self.contains_point(*v))
    }

    /// True if the two closed boxes intersect (touching counts).
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x.overlaps(&other.x) && self.y.overlaps(&other.y) && self.z.overlaps(&other.z)
    }

    /// Split the box at its midpoints into eight equal octants.
    ///
    /// Octant `i` takes the upper half of X when bit 0 is set, of Y when
    /// bit 1 is set and of Z when bit 2 is set.
    pub fn octants(&self) -> [Aabb; 8] {
        let (x_lo, x_hi) = self.x.split();
        let (y_lo, y_hi) = self.y.split();
        let (z_lo, z_hi) = self.z.split();

        std::array::from_fn(|i| Aabb {
            x: if i & 1 == 0 { x_lo } else { x_hi },
            y: if i & 2 == 0 { y_lo } else { y_hi },
            z: if i & 4 == 0 { z_lo } else { z_hi },
        })
    }

    /// Test whether a ray meets this box ahead of its origin.
    ///
    /// For each axis the ray is not parallel to, the two face planes are
    /// intersected and the hit point is checked against the extents of
    /// the other two axes. The box is hit if any face is reached at a
    /// positive parameter. A ray starting inside the box always reports
    /// a hit through its exit face.
    pub fn hit(&self, ray: &Ray) -> bool {
        (0..3).any(|axis| {
            let d = ray.direction[axis];
            if d == 0.0 {
                return false;
            }

            let extent = self.axis_interval(axis);
            let u = self.axis_interval((axis + 1) % 3).expand(FACE_TOLERANCE);
            let v = self.axis_interval((axis + 2) % 3).expand(FACE_TOLERANCE);

            [extent.min, extent.max].into_iter().any(|plane| {
                let t = (plane - ray.origin[axis]) / d;
                if t <= 0.0 {
                    return false;
                }
                let p = ray.at(t);
                u.contains(p[(axis + 1) % 3]) && v.contains(p[(axis + 2) % 3])
            })
        })
    }

    /// Pad intervals to avoid zero-width AABBs (degenerate cases).
    fn pad_to_minimums(&mut self) {
        let delta = 0.0001;
        if self.x.size() < delta {
            self.x = self.x.expand(delta);
        }
        if self.y.size() < delta {
            self.y = self.y.expand(delta);
        }
        if self.z.size() < delta {
            self.z = self.z.expand(delta);
        }
    }
}
