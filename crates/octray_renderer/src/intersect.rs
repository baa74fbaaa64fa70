//! Exact ray-triangle intersection.
//!
//! Uses the Möller-Trumbore algorithm.

use octray_math::{DVec3, Ray};

/// Default minimum hit distance; rejects re-hits of the surface a ray starts on.
pub const DEFAULT_HIT_EPSILON: f64 = 1e-6;

/// Where a ray meets a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the (unit) ray direction
    pub t: f64,
    /// Weights `(b0, b1, b2)` of the three vertices, summing to 1
    pub barycentric: DVec3,
}

/// Intersect `ray` with the triangle `positions`.
///
/// Returns `None` when the ray is parallel to the triangle plane, passes
/// outside the triangle, or meets it at `t <= t_min`.
pub fn intersect_triangle(ray: &Ray, positions: &[DVec3; 3], t_min: f64) -> Option<TriangleHit> {
    let [p0, p1, p2] = *positions;
    let e1 = p1 - p0;
    let e2 = p2 - p0;
    let s = ray.origin - p0;
    let s1 = ray.direction.cross(e2);
    let s2 = s.cross(e1);

    let denom = s1.dot(e1);
    if denom == 0.0 {
        return None;
    }

    let t = s2.dot(e2) / denom;
    let b1 = s1.dot(s) / denom;
    let b2 = s2.dot(ray.direction) / denom;
    let b0 = 1.0 - b1 - b2;

    // NaN fails every comparison below, so a near-zero denom cannot slip through
    if !(t > t_min) {
        return None;
    }

    let in_range = |b: f64| (0.0..=1.0).contains(&b);
    if !(in_range(b0) && in_range(b1) && in_range(b2)) {
        return None;
    }

    Some(TriangleHit {
        t,
        barycentric: DVec3::new(b0, b1, b2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn unit_triangle() -> [DVec3; 3] {
        [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_hit_center() {
        let ray = Ray::new(DVec3::new(0.25, 0.25, 2.0), -DVec3::Z);
        let hit = intersect_triangle(&ray, &unit_triangle(), DEFAULT_HIT_EPSILON).unwrap();

        assert!((hit.t - 2.0).abs() < 1e-12);
        assert!((hit.barycentric - DVec3::new(0.5, 0.25, 0.25)).length() < 1e-12);
    }

    #[test]
    fn test_miss_outside() {
        let ray = Ray::new(DVec3::new(1.0, 1.0, 2.0), -DVec3::Z);
        assert!(intersect_triangle(&ray, &unit_triangle(), DEFAULT_HIT_EPSILON).is_none());
    }

    #[test]
    fn test_parallel_ray() {
        let ray = Ray::new(DVec3::new(-1.0, 0.25, 0.0), DVec3::X);
        assert!(intersect_triangle(&ray, &unit_triangle(), DEFAULT_HIT_EPSILON).is_none());
    }

    #[test]
    fn test_behind_origin() {
        let ray = Ray::new(DVec3::new(0.25, 0.25, 2.0), DVec3::Z);
        assert!(intersect_triangle(&ray, &unit_triangle(), DEFAULT_HIT_EPSILON).is_none());
    }

    #[test]
    fn test_origin_on_surface_rejected() {
        let ray = Ray::new(DVec3::new(0.25, 0.25, 0.0), DVec3::new(0.3, 0.1, 1.0));
        assert!(intersect_triangle(&ray, &unit_triangle(), DEFAULT_HIT_EPSILON).is_none());
    }

    #[test]
    fn test_degenerate_triangle() {
        let positions = [DVec3::ZERO, DVec3::X, DVec3::X * 2.0];
        let ray = Ray::new(DVec3::new(0.5, 0.0, 1.0), -DVec3::Z);
        assert!(intersect_triangle(&ray, &positions, DEFAULT_HIT_EPSILON).is_none());
    }

    fn random_point(rng: &mut StdRng) -> DVec3 {
        DVec3::new(
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
            rng.gen_range(-5.0..5.0),
        )
    }

    #[test]
    fn test_intersection_round_trip() {
        let mut rng = StdRng::seed_from_u64(42);

        let mut checked = 0;
        for _ in 0..1000 {
            let positions = [random_point(&mut rng), random_point(&mut rng), random_point(&mut rng)];
            let [p0, p1, p2] = positions;
            let normal = (p1 - p0).cross(p2 - p0);
            if normal.length() < 1e-3 {
                continue;
            }
            let normal = normal.normalize();

            // Interior weights, each at least 0.05
            let w1: f64 = rng.gen_range(0.05..0.9);
            let w2: f64 = rng.gen_range(0.05..(0.95 - w1).max(0.051));
            let w0 = 1.0 - w1 - w2;
            if w0 <= 0.0 {
                continue;
            }
            let target = p0 * w0 + p1 * w1 + p2 * w2;

            // Approach from a random direction on either side of the plane
            let mut direction = random_point(&mut rng).normalize();
            if direction.dot(normal).abs() < 0.2 {
                direction = normal;
            }
            let distance = rng.gen_range(0.5..20.0);
            let ray = Ray::new(target - direction * distance, direction);

            let hit = intersect_triangle(&ray, &positions, DEFAULT_HIT_EPSILON)
                .expect("ray through an interior point must hit");
            assert!((hit.t - distance).abs() < 1e-8, "t {} vs {}", hit.t, distance);
            assert!((hit.barycentric - DVec3::new(w0, w1, w2)).length() < 1e-8);
            checked += 1;
        }

        assert!(checked > 500);
    }
}
