//! The set of objects a frame is rendered from.

use octray_core::{GeometryError, Light, Triangle};
use octray_math::{DVec3, Ray};
use thiserror::Error;

use crate::object::{Object, ObjectHit};

/// Errors raised while assembling a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Object has no triangles")]
    EmptyObject,

    #[error("Triangle at index {index} has id {id}")]
    TriangleIdMismatch { index: usize, id: usize },

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

/// Nearest intersection of a ray with the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    pub object_id: usize,
    pub triangle_id: usize,
    pub t: f64,
    pub barycentric: DVec3,
}

/// Ordered objects (index = object id) and the light illuminating them.
///
/// Immutable once rendering starts; the camera is supplied per frame.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<Object>,
    pub light: Light,
}

impl Scene {
    pub fn new(light: Light) -> Self {
        Self {
            objects: Vec::new(),
            light,
        }
    }

    /// Add an object and return its id.
    pub fn add(&mut self, object: Object) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn with_object(mut self, object: Object) -> Self {
        self.add(object);
        self
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn object(&self, id: usize) -> Option<&Object> {
        self.objects.get(id)
    }

    pub fn triangle_count(&self) -> usize {
        self.objects.iter().map(|o| o.triangles().len()).sum()
    }

    /// The triangle a hit refers to.
    pub fn triangle(&self, hit: &SceneHit) -> Option<&Triangle> {
        self.object(hit.object_id)?.triangle(hit.triangle_id)
    }

    /// Nearest hit beyond `t_min`, skipping `ray.excluded_object`.
    pub fn nearest_hit(&self, ray: &Ray, t_min: f64) -> Option<SceneHit> {
        self.nearest_by(ray, |object| object.nearest_hit(ray, t_min))
    }

    /// Same as [`Scene::nearest_hit`] but tests every triangle of every object.
    pub fn nearest_hit_exhaustive(&self, ray: &Ray, t_min: f64) -> Option<SceneHit> {
        self.nearest_by(ray, |object| object.nearest_hit_exhaustive(ray, t_min))
    }

    fn nearest_by<F>(&self, ray: &Ray, mut hit_object: F) -> Option<SceneHit>
    where
        F: FnMut(&Object) -> Option<ObjectHit>,
    {
        let mut best: Option<SceneHit> = None;

        for (object_id, object) in self.objects.iter().enumerate() {
            if ray.excluded_object == Some(object_id) {
                continue;
            }
            let Some(ObjectHit { triangle_id, hit }) = hit_object(object) else {
                continue;
            };

            let closer = match &best {
                None => true,
                Some(b) => hit.t < b.t,
            };
            if closer {
                best = Some(SceneHit {
                    object_id,
                    triangle_id,
                    t: hit.t,
                    barycentric: hit.barycentric,
                });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersect::DEFAULT_HIT_EPSILON;
    use crate::octree::OctreeConfig;
    use octray_core::{Material, Mesh};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn cube(center: DVec3, half_size: f64) -> Object {
        let triangles = Mesh::cube(center, half_size)
            .to_triangles(&Material::default())
            .unwrap();
        Object::new(triangles, &OctreeConfig::default()).unwrap()
    }

    fn two_cubes() -> Scene {
        Scene::default()
            .with_object(cube(DVec3::new(0.0, 0.0, 0.0), 1.0))
            .with_object(cube(DVec3::new(0.0, 0.0, 5.0), 1.0))
    }

    #[test]
    fn test_nearest_object_wins() {
        let scene = two_cubes();
        let ray = Ray::new(DVec3::new(0.1, 0.2, -5.0), DVec3::Z);

        let hit = scene.nearest_hit(&ray, DEFAULT_HIT_EPSILON).unwrap();
        assert_eq!(hit.object_id, 0);
        assert!((hit.t - 4.0).abs() < 1e-12);
        assert!((hit.barycentric.element_sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_excluded_object_is_skipped() {
        let scene = two_cubes();
        let ray = Ray::new(DVec3::new(0.1, 0.2, -5.0), DVec3::Z).excluding(0);

        let hit = scene.nearest_hit(&ray, DEFAULT_HIT_EPSILON).unwrap();
        assert_eq!(hit.object_id, 1);
        assert!((hit.t - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_miss() {
        let scene = two_cubes();
        let ray = Ray::new(DVec3::new(0.0, 3.0, 0.0), DVec3::X);
        assert!(scene.nearest_hit(&ray, DEFAULT_HIT_EPSILON).is_none());
        assert!(Scene::default().nearest_hit(&ray, DEFAULT_HIT_EPSILON).is_none());
    }

    fn random_unit(rng: &mut StdRng) -> DVec3 {
        loop {
            let v = DVec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if v.length_squared() > 1e-4 && v.length_squared() <= 1.0 {
                return v.normalize();
            }
        }
    }

    fn random_object(rng: &mut StdRng, count: usize, config: &OctreeConfig) -> Object {
        let center = DVec3::new(
            rng.gen_range(-4.0..4.0),
            rng.gen_range(-4.0..4.0),
            rng.gen_range(-4.0..4.0),
        );
        let mut positions = Vec::with_capacity(count * 3);
        for _ in 0..count {
            let anchor = center + random_unit(rng) * rng.gen_range(0.0..3.0);
            for _ in 0..3 {
                positions.push(anchor + random_unit(rng) * rng.gen_range(0.05..1.5));
            }
        }
        let indices = (0..positions.len() as u32).collect();
        let triangles = Mesh::new(positions, indices, None)
            .to_triangles(&Material::default())
            .unwrap();
        Object::new(triangles, config).unwrap()
    }

    #[test]
    fn test_octree_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(7);
        let configs = [
            OctreeConfig::default(),
            OctreeConfig {
                max_depth: 1,
                min_leaf_size: 5,
            },
            OctreeConfig {
                max_depth: 6,
                min_leaf_size: 0,
            },
            OctreeConfig {
                max_depth: 3,
                min_leaf_size: 20,
            },
        ];

        let mut hits = 0;
        for config in &configs {
            for &count in &[1usize, 4, 30, 200] {
                let mut scene = Scene::default();
                for _ in 0..3 {
                    scene.add(random_object(&mut rng, count, config));
                }

                for _ in 0..200 {
                    let origin = DVec3::new(
                        rng.gen_range(-10.0..10.0),
                        rng.gen_range(-10.0..10.0),
                        rng.gen_range(-10.0..10.0),
                    );
                    // Aim roughly at the scene so most rays hit something
                    let target = random_unit(&mut rng) * rng.gen_range(0.0..5.0);
                    let mut ray = Ray::new(origin, target - origin);
                    if rng.gen_bool(0.2) {
                        ray = ray.excluding(rng.gen_range(0..3));
                    }

                    let fast = scene.nearest_hit(&ray, DEFAULT_HIT_EPSILON);
                    let slow = scene.nearest_hit_exhaustive(&ray, DEFAULT_HIT_EPSILON);
                    assert_eq!(fast, slow, "config {:?}, {} triangles", config, count);
                    if fast.is_some() {
                        hits += 1;
                    }
                }
            }
        }

        assert!(hits > 100);
    }
}
