//! Mesh geometry handed to the renderer by a geometry loader.
//!
//! A [`Mesh`] is an indexed vertex soup with optional normals, colors and
//! texture coordinates. File formats are parsed elsewhere; this module only
//! validates, places and resolves a mesh into shading-ready [`Triangle`]s.

use std::f64::consts::PI;
use std::sync::Arc;

use octray_math::{Aabb, DVec2, DVec3};
use thiserror::Error;

use crate::material::Material;
use crate::texture::{Texture, TextureSampler};
use crate::triangle::{Triangle, Vertex};

/// Errors raised while turning loader output into triangles.
///
/// These surface before any object or octree is built, so the renderer
/// never sees partially constructed geometry.
#[derive(Error, Debug, PartialEq)]
pub enum GeometryError {
    #[error("Mesh has no vertices or no faces")]
    EmptyMesh,

    #[error("Index count {0} is not a multiple of 3")]
    IncompleteFace(usize),

    #[error("Vertex index {index} out of range (vertex count {vertex_count})")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("Mesh has {actual} {attribute}, expected one per vertex ({expected})")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Vertex {0} has a zero-length normal")]
    ZeroNormal(usize),

    #[error("Textured mesh has no texture coordinates")]
    MissingUvs,

    #[error("Cannot rescale a mesh whose vertices all coincide")]
    DegenerateScale,

    #[error("Material {name} coefficient {value} is outside [0, 1]")]
    InvalidCoefficient { name: &'static str, value: f64 },

    #[error("Refraction index must be positive and finite, got {0}")]
    InvalidRefractionIndex(f64),

    #[error("Unknown mesh: {0}")]
    UnknownMesh(String),
}

pub type GeometryResult<T> = Result<T, GeometryError>;

/// A mesh consisting of vertex positions, optional attributes, and triangle indices.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    /// Vertex positions (one DVec3 per vertex)
    pub positions: Vec<DVec3>,

    /// Vertex normals (computed from faces if absent)
    pub normals: Option<Vec<DVec3>>,

    /// Per-vertex base colors (white if absent)
    pub colors: Option<Vec<DVec3>>,

    /// Texture coordinates, one per vertex
    pub uvs: Option<Vec<DVec2>>,

    /// Texture sampled at each vertex's UV to obtain its base color
    pub texture: Option<Arc<Texture>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    pub fn new(positions: Vec<DVec3>, indices: Vec<u32>, normals: Option<Vec<DVec3>>) -> Self {
        Self {
            positions,
            normals,
            indices,
            ..Default::default()
        }
    }

    /// Attach per-vertex base colors.
    pub fn with_colors(mut self, colors: Vec<DVec3>) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Attach texture coordinates and the texture they index.
    pub fn with_texture(mut self, uvs: Vec<DVec2>, texture: Arc<Texture>) -> Self {
        self.uvs = Some(uvs);
        self.texture = Some(texture);
        self
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Axis-aligned bounds of all vertices.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::enclosing(self.positions.iter().copied())
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Faces are wound counter-clockwise when seen from the side the
    /// normal points to.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![DVec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(DVec3::Y);
        }

        self.normals = Some(normals);
    }

    /// Recenter and rescale the mesh.
    ///
    /// Vertices are shifted so their mean sits at the origin, divided by
    /// the root of their summed squared distances from the mean, multiplied
    /// by `size` and moved to `center`. The spread is not averaged over the
    /// vertex count, so denser meshes come out smaller for the same `size`.
    /// Normals are unaffected.
    pub fn normalized(mut self, size: f64, center: DVec3) -> GeometryResult<Self> {
        if self.positions.is_empty() {
            return Err(GeometryError::EmptyMesh);
        }

        let n = self.positions.len() as f64;
        let mean = self.positions.iter().copied().sum::<DVec3>() / n;
        let spread = self
            .positions
            .iter()
            .map(|p| p.distance_squared(mean))
            .sum::<f64>()
            .sqrt();

        if spread <= f64::EPSILON {
            return Err(GeometryError::DegenerateScale);
        }

        for p in &mut self.positions {
            *p = (*p - mean) / spread * size + center;
        }

        Ok(self)
    }

    /// Validate the mesh and resolve it into triangles carrying `material`.
    ///
    /// Triangle ids follow face order, so `triangles[i].id == i`.
    pub fn to_triangles(&self, material: &Material) -> GeometryResult<Vec<Triangle>> {
        material.validate()?;
        self.validate()?;

        let normals = match &self.normals {
            Some(normals) => normals.clone(),
            None => {
                let mut mesh = self.clone();
                mesh.compute_normals();
                mesh.normals.unwrap_or_default()
            }
        };

        if let Some(i) = normals.iter().position(|n| n.length_squared() == 0.0) {
            return Err(GeometryError::ZeroNormal(i));
        }

        let vertices: Vec<Vertex> = (0..self.vertex_count())
            .map(|i| {
                let base = self.base_color(i);
                Vertex::new(
                    self.positions[i],
                    normals[i],
                    material.reflectance.tinted(base),
                )
            })
            .collect();

        let mut degenerate = 0usize;
        let triangles: Vec<Triangle> = self
            .indices
            .chunks_exact(3)
            .enumerate()
            .map(|(id, face)| {
                let corners = [
                    vertices[face[0] as usize],
                    vertices[face[1] as usize],
                    vertices[face[2] as usize],
                ];
                let triangle = Triangle::new(id, corners, material);
                if triangle.area() == 0.0 {
                    degenerate += 1;
                }
                triangle
            })
            .collect();

        if degenerate > 0 {
            log::warn!(
                "{} of {} triangles are degenerate and can never be hit",
                degenerate,
                triangles.len()
            );
        }

        log::debug!(
            "Resolved mesh: {} vertices, {} triangles",
            self.vertex_count(),
            triangles.len()
        );

        Ok(triangles)
    }

    fn validate(&self) -> GeometryResult<()> {
        let vertex_count = self.vertex_count();
        if vertex_count == 0 || self.indices.is_empty() {
            return Err(GeometryError::EmptyMesh);
        }

        if self.indices.len() % 3 != 0 {
            return Err(GeometryError::IncompleteFace(self.indices.len()));
        }

        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        check_len("normals", self.normals.as_ref().map(Vec::len), vertex_count)?;
        check_len("colors", self.colors.as_ref().map(Vec::len), vertex_count)?;
        check_len("uvs", self.uvs.as_ref().map(Vec::len), vertex_count)?;

        if self.texture.is_some() && self.uvs.is_none() {
            return Err(GeometryError::MissingUvs);
        }

        Ok(())
    }

    /// Base color of vertex `i`: texture sample, then vertex color, then white.
    fn base_color(&self, i: usize) -> DVec3 {
        if let (Some(texture), Some(uvs)) = (&self.texture, &self.uvs) {
            return texture.sample(uvs[i]);
        }

        self.colors
            .as_ref()
            .map(|colors| colors[i])
            .unwrap_or(DVec3::ONE)
    }

    /// A planar quad from four corners in counter-clockwise order.
    pub fn quad(corners: [DVec3; 4]) -> Self {
        let normal = (corners[1] - corners[0])
            .cross(corners[3] - corners[0])
            .normalize();

        let uvs = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ];

        Self {
            positions: corners.to_vec(),
            normals: Some(vec![normal; 4]),
            uvs: Some(uvs),
            indices: vec![0, 1, 2, 0, 2, 3],
            ..Default::default()
        }
    }

    /// An axis-aligned cube with flat-shaded faces (split vertices).
    pub fn cube(center: DVec3, half_size: f64) -> Self {
        // (normal, u, v) with u x v == normal, so corners wind outward
        let faces = [
            (DVec3::X, DVec3::Y, DVec3::Z),
            (DVec3::NEG_X, DVec3::Z, DVec3::Y),
            (DVec3::Y, DVec3::Z, DVec3::X),
            (DVec3::NEG_Y, DVec3::X, DVec3::Z),
            (DVec3::Z, DVec3::X, DVec3::Y),
            (DVec3::NEG_Z, DVec3::Y, DVec3::X),
        ];

        let mut mesh = Self::default();
        let mut normals = Vec::with_capacity(24);

        for (normal, u, v) in faces {
            let base = mesh.positions.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                mesh.positions
                    .push(center + (normal + u * su + v * sv) * half_size);
                normals.push(normal);
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh.normals = Some(normals);
        mesh
    }

    /// A latitude/longitude sphere with smooth normals and UVs.
    pub fn uv_sphere(center: DVec3, radius: f64, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();

        for i in 0..=rings {
            let theta = PI * i as f64 / rings as f64;
            for j in 0..=segments {
                let phi = 2.0 * PI * j as f64 / segments as f64;
                let normal = DVec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                positions.push(center + normal * radius);
                normals.push(normal);
                uvs.push(DVec2::new(
                    j as f64 / segments as f64,
                    1.0 - i as f64 / rings as f64,
                ));
            }
        }

        let mut indices = Vec::new();
        let stride = segments + 1;
        for i in 0..rings {
            for j in 0..segments {
                let a = i * stride + j;
                let b = a + stride;
                // Skip the zero-area halves of the pole quads
                if i != 0 {
                    indices.extend_from_slice(&[a, a + 1, b]);
                }
                if i != rings - 1 {
                    indices.extend_from_slice(&[a + 1, b + 1, b]);
                }
            }
        }

        Self {
            positions,
            normals: Some(normals),
            uvs: Some(uvs),
            indices,
            ..Default::default()
        }
    }
}

fn check_len(attribute: &'static str, actual: Option<usize>, expected: usize) -> GeometryResult<()> {
    match actual {
        Some(actual) if actual != expected => Err(GeometryError::AttributeLength {
            attribute,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}
