//! A solid: its triangles plus the octree built over them.

use octray_core::{GeometrySource, Material, Placement, Triangle};
use octray_math::{Aabb, Ray};

use crate::intersect::{intersect_triangle, TriangleHit};
use crate::octree::{Octree, OctreeConfig};
use crate::scene::SceneError;

/// The nearest triangle an object reports for a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectHit {
    pub triangle_id: usize,
    pub hit: TriangleHit,
}

/// An immutable triangle set with its acceleration structure.
#[derive(Debug, Clone)]
pub struct Object {
    triangles: Vec<Triangle>,
    octree: Octree,
    bounds: Aabb,
}

impl Object {
    /// Build an object and its octree.
    ///
    /// Each triangle's `id` must equal its position in `triangles`.
    pub fn new(triangles: Vec<Triangle>, config: &OctreeConfig) -> Result<Self, SceneError> {
        if let Some((index, tri)) = triangles.iter().enumerate().find(|(i, t)| t.id != *i) {
            return Err(SceneError::TriangleIdMismatch {
                index,
                id: tri.id,
            });
        }

        let bounds = Aabb::enclosing(triangles.iter().flat_map(|t| t.positions()))
            .ok_or(SceneError::EmptyObject)?;

        let octree = Octree::build(bounds, &triangles, config);

        let stats = octree.stats();
        log::debug!(
            "Octree: {} triangles, {} nodes, {} leaves, depth {}, {} leaf entries",
            triangles.len(),
            stats.node_count,
            stats.leaf_count,
            stats.max_depth,
            stats.leaf_entries
        );

        Ok(Self {
            triangles,
            octree,
            bounds,
        })
    }

    /// Load a named mesh through `source` and build an object from it.
    pub fn load(
        source: &dyn GeometrySource,
        name: &str,
        placement: Placement,
        material: &Material,
        config: &OctreeConfig,
    ) -> Result<Self, SceneError> {
        let triangles = source.load(name, placement, material)?;
        Self::new(triangles, config)
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle(&self, id: usize) -> Option<&Triangle> {
        self.triangles.get(id)
    }

    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Nearest triangle hit beyond `t_min`, using the octree to pick candidates.
    pub fn nearest_hit(&self, ray: &Ray, t_min: f64) -> Option<ObjectHit> {
        let mut best = None;
        self.octree.visit_leaves(ray, &mut |ids: &[usize]| {
            for &triangle_id in ids {
                self.consider(ray, t_min, triangle_id, &mut best);
            }
        });
        best
    }

    /// Nearest triangle hit beyond `t_min`, testing every triangle.
    pub fn nearest_hit_exhaustive(&self, ray: &Ray, t_min: f64) -> Option<ObjectHit> {
        let mut best = None;
        for triangle_id in 0..self.triangles.len() {
            self.consider(ray, t_min, triangle_id, &mut best);
        }
        best
    }

    fn consider(&self, ray: &Ray, t_min: f64, triangle_id: usize, best: &mut Option<ObjectHit>) {
        let Some(triangle) = self.triangles.get(triangle_id) else {
            return;
        };
        let Some(hit) = intersect_triangle(ray, &triangle.positions(), t_min) else {
            return;
        };

        // Ties go to the lower id so the result does not depend on candidate order
        let closer = match best {
            None => true,
            Some(b) => hit.t < b.hit.t || (hit.t == b.hit.t && triangle_id < b.triangle_id),
        };
        if closer {
            *best = Some(ObjectHit { triangle_id, hit });
        }
    }
}
