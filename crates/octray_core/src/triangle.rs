//! Shading-ready vertices and triangles.

use octray_math::{Aabb, DVec3};

use crate::material::{Material, Reflectance};

const CANCELLED_NORMAL_EPSILON: f64 = 1e-12;

/// A vertex with a unit normal and Phong reflectance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: DVec3,
    /// Always unit length
    pub normal: DVec3,
    pub reflectance: Reflectance,
}

impl Vertex {
    /// Create a vertex, normalizing `normal`.
    ///
    /// A zero or non-finite normal falls back to +Y.
    pub fn new(position: DVec3, normal: DVec3, reflectance: Reflectance) -> Self {
        Self {
            position,
            normal: normal.try_normalize().unwrap_or(DVec3::Y),
            reflectance,
        }
    }
}

/// A triangle with resolved vertices and its object's material coefficients.
#[derive(Clone, Debug, PartialEq)]
pub struct Triangle {
    /// Position of this triangle within its object's triangle list
    pub id: usize,
    pub vertices: [Vertex; 3],
    /// Normalized mean of the vertex normals
    pub face_normal: DVec3,
    pub reflection_coefficient: f64,
    pub refraction_coefficient: f64,
    pub refraction_index: f64,
}

impl Triangle {
    /// Build a triangle, deriving the face normal from the vertex normals.
    ///
    /// If the vertex normals cancel out, the geometric normal of the
    /// winding (v0, v1, v2) is used instead.
    pub fn new(id: usize, vertices: [Vertex; 3], material: &Material) -> Self {
        let mean = (vertices[0].normal + vertices[1].normal + vertices[2].normal) / 3.0;
        let face_normal = if mean.length_squared() > CANCELLED_NORMAL_EPSILON {
            mean.normalize()
        } else {
            let [p0, p1, p2] = vertices.map(|v| v.position);
            (p1 - p0).cross(p2 - p0).try_normalize().unwrap_or(DVec3::Y)
        };

        Self {
            id,
            vertices,
            face_normal,
            reflection_coefficient: material.reflection,
            refraction_coefficient: material.refraction,
            refraction_index: material.refraction_index,
        }
    }

    /// Vertex positions in winding order.
    pub fn positions(&self) -> [DVec3; 3] {
        self.vertices.map(|v| v.position)
    }

    /// Bounding box of the three vertices.
    pub fn bounds(&self) -> Aabb {
        let [p0, p1, p2] = self.positions();
        Aabb::from_points(p0.min(p1).min(p2), p0.max(p1).max(p2))
    }

    /// Surface area; zero for degenerate triangles.
    pub fn area(&self) -> f64 {
        let [p0, p1, p2] = self.positions();
        0.5 * (p1 - p0).cross(p2 - p0).length()
    }
}
