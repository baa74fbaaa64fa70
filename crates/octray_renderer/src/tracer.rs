//! Recursive Whitted-style light transport.
//!
//! Every hit spawns up to three child rays: a shadow ray towards the light
//! (traced at the same depth), a mirror reflection and a Snell refraction
//! (each one level deeper and attenuated by the surface's coefficient).

use std::ops::{Add, AddAssign};

use octray_core::Triangle;
use octray_math::{DVec3, Ray, RayKind};
use serde::{Deserialize, Serialize};

use crate::intersect::DEFAULT_HIT_EPSILON;
use crate::scene::{Scene, SceneHit};
use crate::shading::{phong, ShadingConfig, ShadowMode};

/// Recursion limits and shading options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Rays deeper than this return black (primary rays have depth 1)
    pub max_depth: u32,
    /// Rays carrying this intensity or less return black
    pub intensity_threshold: f64,
    /// Minimum hit distance along a ray
    pub hit_epsilon: f64,
    /// Refractive index of the space between objects
    pub ambient_refraction_index: f64,
    pub shading: ShadingConfig,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            intensity_threshold: 0.01,
            hit_epsilon: DEFAULT_HIT_EPSILON,
            ambient_refraction_index: 1.0,
            shading: ShadingConfig::default(),
        }
    }
}

/// Counts of rays that passed the termination checks and were intersected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceStats {
    pub primary: u64,
    pub shadow: u64,
    pub reflection: u64,
    pub refraction: u64,
    /// Refraction branches turned into mirror rays
    pub total_internal_reflections: u64,
    /// Deepest recursion level at which a ray was intersected
    pub max_depth_reached: u32,
}

impl TraceStats {
    pub fn total_rays(&self) -> u64 {
        self.primary + self.shadow + self.reflection + self.refraction
    }

    fn record(&mut self, ray: &Ray, depth: u32) {
        match ray.kind {
            RayKind::Primary => self.primary += 1,
            RayKind::Shadow => self.shadow += 1,
            RayKind::Reflection => self.reflection += 1,
            RayKind::Refraction => self.refraction += 1,
        }
        self.max_depth_reached = self.max_depth_reached.max(depth);
    }
}

impl AddAssign for TraceStats {
    fn add_assign(&mut self, other: Self) {
        self.primary += other.primary;
        self.shadow += other.shadow;
        self.reflection += other.reflection;
        self.refraction += other.refraction;
        self.total_internal_reflections += other.total_internal_reflections;
        self.max_depth_reached = self.max_depth_reached.max(other.max_depth_reached);
    }
}

impl Add for TraceStats {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

/// The child rays spawned at a hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondaryRays {
    pub shadow: Ray,
    pub reflection: Ray,
    /// A mirror ray instead when total internal reflection occurs
    pub refraction: Ray,
    pub total_internal_reflection: bool,
}

/// Traces rays through an immutable scene.
pub struct Tracer<'a> {
    scene: &'a Scene,
    config: &'a TraceConfig,
}

impl<'a> Tracer<'a> {
    pub fn new(scene: &'a Scene, config: &'a TraceConfig) -> Self {
        Self { scene, config }
    }

    /// Trace a camera ray, starting it in the ambient medium at depth 1.
    pub fn trace_primary(&self, ray: Ray, stats: &mut TraceStats) -> DVec3 {
        let ray = ray.in_medium(self.config.ambient_refraction_index, false);
        self.trace(&ray, 1, stats)
    }

    /// Color carried back along `ray`.
    ///
    /// Shadow rays answer white when nothing blocks them and black otherwise.
    pub fn trace(&self, ray: &Ray, depth: u32, stats: &mut TraceStats) -> DVec3 {
        if depth > self.config.max_depth || ray.intensity <= self.config.intensity_threshold {
            return DVec3::ZERO;
        }
        stats.record(ray, depth);

        let hit = self.scene.nearest_hit(ray, self.config.hit_epsilon);

        if ray.kind == RayKind::Shadow {
            return if hit.is_some() { DVec3::ZERO } else { DVec3::ONE };
        }

        let Some(hit) = hit else {
            return DVec3::ZERO;
        };
        let Some(triangle) = self.scene.triangle(&hit) else {
            return DVec3::ZERO;
        };

        let local = phong(
            &self.scene.light,
            ray,
            triangle,
            hit.barycentric,
            &self.config.shading,
        );

        let rays = self.secondary_rays(ray, &hit, triangle);
        if rays.total_internal_reflection {
            stats.total_internal_reflections += 1;
        }

        let visibility = self.trace(&rays.shadow, depth, stats);
        let reflected = self.trace(&rays.reflection, depth + 1, stats);
        let refracted = self.trace(&rays.refraction, depth + 1, stats);

        match self.config.shading.shadows {
            ShadowMode::LocalOnly => local * visibility + reflected + refracted,
            ShadowMode::AllBranches => (local + reflected + refracted) * visibility,
        }
    }

    /// Build the shadow, reflection and refraction rays for a hit.
    ///
    /// All three start at the hit point and skip the hit object.
    pub fn secondary_rays(&self, ray: &Ray, hit: &SceneHit, triangle: &Triangle) -> SecondaryRays {
        let point = ray.at(hit.t);
        let normal = triangle.face_normal;

        let shadow = ray
            .spawn(RayKind::Shadow, point, self.scene.light.to_light())
            .excluding(hit.object_id);

        let reflection = ray
            .spawn(RayKind::Reflection, point, reflect(ray.direction, normal))
            .attenuated(triangle.reflection_coefficient)
            .excluding(hit.object_id);

        // Snell's law needs the normal on the incident side
        let facing = if ray.direction.dot(normal) > 0.0 {
            -normal
        } else {
            normal
        };
        let (n2, inside) = if ray.inside {
            (self.config.ambient_refraction_index, false)
        } else {
            (triangle.refraction_index, true)
        };
        let eta = ray.refraction_index / n2;

        let (refraction, total_internal_reflection) = match refract(ray.direction, facing, eta) {
            Some(direction) => (
                ray.spawn(RayKind::Refraction, point, direction)
                    .attenuated(triangle.refraction_coefficient)
                    .in_medium(n2, inside)
                    .excluding(hit.object_id),
                false,
            ),
            None => (
                ray.spawn(RayKind::Reflection, point, reflect(ray.direction, facing))
                    .attenuated(triangle.refraction_coefficient)
                    .excluding(hit.object_id),
                true,
            ),
        };

        SecondaryRays {
            shadow,
            reflection,
            refraction,
            total_internal_reflection,
        }
    }
}

/// Mirror `direction` about `normal`.
pub fn reflect(direction: DVec3, normal: DVec3) -> DVec3 {
    direction - normal * (2.0 * direction.dot(normal))
}

/// Bend `direction` through a surface with relative index `eta = n1 / n2`.
///
/// `normal` must face against `direction`. Returns `None` on total
/// internal reflection.
pub fn refract(direction: DVec3, normal: DVec3, eta: f64) -> Option<DVec3> {
    let cos_i = -direction.dot(normal);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return None;
    }
    Some(direction * eta + normal * (eta * cos_i - k.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;
    use crate::octree::OctreeConfig;
    use octray_core::{Light, Material, Mesh};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn object(mesh: Mesh, material: Material) -> Object {
        let triangles = mesh.to_triangles(&material).unwrap();
        Object::new(triangles, &OctreeConfig::default()).unwrap()
    }

    /// Horizontal quad at height `y`, facing up or down.
    fn plane(y: f64, half_size: f64, facing_up: bool) -> Mesh {
        let s = half_size;
        let corners = if facing_up {
            [
                DVec3::new(-s, y, s),
                DVec3::new(s, y, s),
                DVec3::new(s, y, -s),
                DVec3::new(-s, y, -s),
            ]
        } else {
            [
                DVec3::new(-s, y, -s),
                DVec3::new(s, y, -s),
                DVec3::new(s, y, s),
                DVec3::new(-s, y, s),
            ]
        };
        Mesh::quad(corners)
    }

    /// Vertical quad at depth `z`, facing -Z.
    fn wall(z: f64, half_size: f64) -> Mesh {
        let s = half_size;
        Mesh::quad([
            DVec3::new(-s, -s, z),
            DVec3::new(-s, s, z),
            DVec3::new(s, s, z),
            DVec3::new(s, -s, z),
        ])
    }

    fn mirror() -> Material {
        Material::default().with_reflection(1.0)
    }

    #[test]
    fn test_reflect() {
        let d = DVec3::new(1.0, -1.0, 0.0).normalize();
        let r = reflect(d, DVec3::Y);
        assert!((r - DVec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-12);
    }

    #[test]
    fn test_refract_snell() {
        // Normal incidence passes straight through
        let straight = refract(DVec3::NEG_Y, DVec3::Y, 1.0 / 1.5).unwrap();
        assert!((straight - DVec3::NEG_Y).length() < 1e-12);

        let d = DVec3::new(1.0, -1.0, 0.0).normalize();
        let eta = 1.0 / 1.5;
        let t = refract(d, DVec3::Y, eta).unwrap();
        assert!((t.length() - 1.0).abs() < 1e-12);

        // n1 sin(i) == n2 sin(t)
        let sin_i = d.x;
        let sin_t = t.x;
        assert!((sin_i - 1.5 * sin_t).abs() < 1e-12);
        assert!(t.y < 0.0);
    }

    #[test]
    fn test_refract_total_internal_reflection() {
        let d = DVec3::new(1.0, -0.2, 0.0).normalize();
        assert!(refract(d, DVec3::Y, 1.5).is_none());
    }

    #[test]
    fn test_terminal_conditions() {
        let scene = Scene::default().with_object(object(plane(0.0, 10.0, true), Material::default()));
        let config = TraceConfig::default();
        let tracer = Tracer::new(&scene, &config);
        let mut stats = TraceStats::default();

        let ray = Ray::new(DVec3::new(0.5, 5.0, 0.5), DVec3::NEG_Y);
        assert_ne!(tracer.trace(&ray, 1, &mut stats), DVec3::ZERO);

        // Too deep
        assert_eq!(tracer.trace(&ray, 4, &mut stats), DVec3::ZERO);
        // Too faint
        assert_eq!(tracer.trace(&ray.attenuated(0.01), 1, &mut stats), DVec3::ZERO);

        // Escaping rays are black, unblocked shadow rays white
        let up = Ray::new(DVec3::new(0.5, 5.0, 0.5), DVec3::Y);
        assert_eq!(tracer.trace(&up, 1, &mut stats), DVec3::ZERO);
        let shadow = up.spawn(RayKind::Shadow, up.origin, DVec3::Y);
        assert_eq!(tracer.trace(&shadow, 1, &mut stats), DVec3::ONE);
        let blocked = up.spawn(RayKind::Shadow, up.origin, DVec3::NEG_Y);
        assert_eq!(tracer.trace(&blocked, 1, &mut stats), DVec3::ZERO);
    }

    #[test]
    fn test_flat_mirror_reflection_escapes() {
        let scene = Scene::new(Light::default()).with_object(object(plane(0.0, 10.0, true), mirror()));
        let config = TraceConfig::default();
        let tracer = Tracer::new(&scene, &config);
        let mut stats = TraceStats::default();

        let ray = Ray::new(DVec3::new(0.5, 5.0, -5.0), DVec3::new(0.0, -1.0, 1.0));
        let color = tracer.trace_primary(ray, &mut stats);

        // Local color only: ambient 0.6, diffuse 0.2, specular 0.2 * (1/sqrt 2)^10
        assert!((color - DVec3::splat(0.80625)).length() < 1e-9);
        assert_eq!(stats.primary, 1);
        assert_eq!(stats.shadow, 1);
        assert_eq!(stats.reflection, 1);
        assert_eq!(stats.refraction, 0);
        assert_eq!(stats.max_depth_reached, 2);
    }

    #[test]
    fn test_flat_mirror_shows_reflected_object() {
        let scene = Scene::new(Light::default())
            .with_object(object(plane(0.0, 10.0, true), mirror()))
            .with_object(object(wall(5.0, 10.0), Material::default()));
        let config = TraceConfig::default();
        let tracer = Tracer::new(&scene, &config);
        let mut stats = TraceStats::default();

        let ray = Ray::new(DVec3::new(0.5, 5.0, -5.0), DVec3::new(0.0, -1.0, 1.0));
        let color = tracer.trace_primary(ray, &mut stats);

        // Floor 0.80625 plus the wall seen at full intensity:
        // ambient 0.6, no diffuse, specular 0.2 / 32
        assert!((color - DVec3::splat(0.80625 + 0.60625)).length() < 1e-9);
    }

    #[test]
    fn test_parallel_planes_shadow() {
        let scene = Scene::new(Light::default())
            .with_object(object(plane(0.0, 20.0, true), Material::default()))
            .with_object(object(plane(2.0, 20.0, false), Material::default()));
        let config = TraceConfig::default();
        let tracer = Tracer::new(&scene, &config);
        let mut stats = TraceStats::default();

        let ray = Ray::new(DVec3::new(0.5, 1.0, -5.0), DVec3::new(0.0, -1.0, 5.0));
        let color = tracer.trace_primary(ray, &mut stats);

        // The floor's only light is blocked by the ceiling and nothing bounces
        assert_eq!(color, DVec3::ZERO);
        assert_eq!(stats.primary, 1);
        assert_eq!(stats.shadow, 1);
        assert_eq!(stats.reflection + stats.refraction, 0);
        assert_eq!(stats.max_depth_reached, 1);
    }

    #[test]
    fn test_shadow_mode_all_branches() {
        let scene = Scene::new(Light::default())
            .with_object(object(
                plane(0.0, 20.0, true),
                Material::default().with_reflection(0.5),
            ))
            .with_object(object(plane(2.0, 20.0, false), Material::default()));
        let ray = Ray::new(DVec3::new(0.5, 1.0, -5.0), DVec3::new(0.0, -1.0, 5.0));

        // The mirrored ray sees the lit underside of the ceiling at half intensity
        let local_only = TraceConfig::default();
        let color = Tracer::new(&scene, &local_only).trace_primary(ray, &mut TraceStats::default());
        assert!((color - DVec3::splat(0.3)).length() < 1e-9);

        let all_branches = TraceConfig {
            shading: ShadingConfig {
                shadows: ShadowMode::AllBranches,
                ..Default::default()
            },
            ..Default::default()
        };
        let color = Tracer::new(&scene, &all_branches).trace_primary(ray, &mut TraceStats::default());
        assert_eq!(color, DVec3::ZERO);
    }

    #[test]
    fn test_refraction_enters_and_leaves_medium() {
        let glass = Material::default().with_refraction(0.8, 1.5);
        let scene = Scene::default().with_object(object(plane(0.0, 10.0, true), glass));
        let config = TraceConfig::default();
        let tracer = Tracer::new(&scene, &config);

        let ray = Ray::new(DVec3::new(0.5, 5.0, 0.5), DVec3::new(1.0, -1.0, 0.0));
        let hit = scene.nearest_hit(&ray, config.hit_epsilon).unwrap();
        let rays = tracer.secondary_rays(&ray, &hit, scene.triangle(&hit).unwrap());

        assert!(!rays.total_internal_reflection);
        assert_eq!(rays.refraction.kind, RayKind::Refraction);
        assert!(rays.refraction.inside);
        assert_eq!(rays.refraction.refraction_index, 1.5);
        assert!((rays.refraction.intensity - 0.8).abs() < 1e-12);
        assert_eq!(rays.refraction.excluded_object, Some(0));
        assert!(rays.refraction.direction.y < 0.0);

        assert_eq!(rays.reflection.intensity, 0.0);
        assert_eq!(rays.shadow.kind, RayKind::Shadow);
        assert_eq!(rays.shadow.direction, DVec3::Y);
        assert_eq!(rays.shadow.intensity, 1.0);

        // Leaving at a steep angle from inside the glass totally reflects
        let inside = Ray::new(DVec3::new(0.5, -0.2, 0.5), DVec3::new(1.0, 0.2, 0.0))
            .in_medium(1.5, true);
        let hit = scene.nearest_hit(&inside, config.hit_epsilon).unwrap();
        let rays = tracer.secondary_rays(&inside, &hit, scene.triangle(&hit).unwrap());

        assert!(rays.total_internal_reflection);
        assert_eq!(rays.refraction.kind, RayKind::Reflection);
        assert_eq!(rays.refraction.refraction_index, 1.5);
        assert!(rays.refraction.inside);
        assert!(rays.refraction.direction.y < 0.0);

        // Leaving steeply escapes back into the ambient medium
        let inside = Ray::new(DVec3::new(0.5, -1.0, 0.5), DVec3::new(0.1, 1.0, 0.0))
            .in_medium(1.5, true);
        let hit = scene.nearest_hit(&inside, config.hit_epsilon).unwrap();
        let rays = tracer.secondary_rays(&inside, &hit, scene.triangle(&hit).unwrap());
        assert!(!rays.total_internal_reflection);
        assert!(!rays.refraction.inside);
        assert_eq!(rays.refraction.refraction_index, 1.0);
        assert!(rays.refraction.direction.y > 0.0);
    }

    fn random_scene(rng: &mut StdRng) -> Scene {
        let mut scene = Scene::new(Light::white(DVec3::new(
            rng.gen_range(-1.0..1.0),
            -1.0,
            rng.gen_range(-1.0..1.0),
        )));
        for _ in 0..4 {
            let center = DVec3::new(
                rng.gen_range(-3.0..3.0),
                rng.gen_range(-3.0..3.0),
                rng.gen_range(-3.0..3.0),
            );
            let mesh = if rng.gen_bool(0.5) {
                Mesh::cube(center, rng.gen_range(0.3..1.5))
            } else {
                Mesh::uv_sphere(center, rng.gen_range(0.3..1.5), 12, 6)
            };
            let material = Material::default()
                .with_reflection(rng.gen_range(0.0..=1.0))
                .with_refraction(rng.gen_range(0.0..=1.0), rng.gen_range(1.0..2.5));
            scene.add(object(mesh, material));
        }
        scene
    }

    /// Walk the ray tree the way `trace` does, checking every parent/child pair.
    fn walk(
        tracer: &Tracer,
        scene: &Scene,
        config: &TraceConfig,
        ray: &Ray,
        depth: u32,
        nodes: &mut usize,
    ) {
        assert!((ray.direction.length() - 1.0).abs() < 1e-9);
        if depth > config.max_depth || ray.intensity <= config.intensity_threshold {
            return;
        }
        assert!(depth <= config.max_depth);
        *nodes += 1;

        let Some(hit) = scene.nearest_hit(ray, config.hit_epsilon) else {
            return;
        };
        let rays = tracer.secondary_rays(ray, &hit, scene.triangle(&hit).unwrap());

        assert_eq!(rays.shadow.intensity, ray.intensity);
        for child in [&rays.reflection, &rays.refraction] {
            assert!(child.intensity <= ray.intensity);
            walk(tracer, scene, config, child, depth + 1, nodes);
        }
    }

    #[test]
    fn test_energy_monotonicity() {
        let mut rng = StdRng::seed_from_u64(11);
        let config = TraceConfig {
            max_depth: 6,
            ..Default::default()
        };

        for _ in 0..10 {
            let scene = random_scene(&mut rng);
            let tracer = Tracer::new(&scene, &config);

            for _ in 0..50 {
                let origin = DVec3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    -10.0,
                );
                let ray = Ray::new(origin, -origin)
                    .in_medium(config.ambient_refraction_index, false);

                let mut nodes = 0;
                walk(&tracer, &scene, &config, &ray, 1, &mut nodes);
                // A binary tree of at most max_depth levels
                assert!(nodes < 1 << config.max_depth);

                let mut stats = TraceStats::default();
                let color = tracer.trace(&ray, 1, &mut stats);
                assert!(color.is_finite());
                assert!(color.min_element() >= 0.0);
                assert!(stats.max_depth_reached <= config.max_depth);
                assert_eq!(
                    (stats.primary + stats.reflection + stats.refraction) as usize,
                    nodes
                );
            }
        }
    }
}
