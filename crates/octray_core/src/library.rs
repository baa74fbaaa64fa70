//! Named geometry lookup.
//!
//! The renderer never parses files itself. Whatever loads meshes (a PLY
//! reader, a procedural generator, a test fixture) implements
//! [`GeometrySource`] and hands back triangles already placed in the scene.

use std::collections::HashMap;
use std::sync::Arc;

use octray_math::DVec3;
use serde::{Deserialize, Serialize};

use crate::material::Material;
use crate::mesh::{GeometryError, GeometryResult, Mesh};
use crate::triangle::Triangle;

/// Where and how large a loaded mesh should appear.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// RMS radius of the vertex cloud after rescaling
    pub size: f64,
    pub center: DVec3,
}

impl Placement {
    pub fn new(size: f64, center: DVec3) -> Self {
        Self { size, center }
    }
}

/// Produces triangle lists by mesh identifier.
pub trait GeometrySource {
    /// Load `name`, rescale it by `placement` and resolve it with `material`.
    fn load(
        &self,
        name: &str,
        placement: Placement,
        material: &Material,
    ) -> GeometryResult<Vec<Triangle>>;
}

/// An in-memory [`GeometrySource`] keyed by name.
#[derive(Clone, Debug, Default)]
pub struct MeshLibrary {
    meshes: HashMap<String, Arc<Mesh>>,
}

impl MeshLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh, replacing any previous mesh with the same name.
    pub fn insert(&mut self, name: impl Into<String>, mesh: Mesh) {
        self.meshes.insert(name.into(), Arc::new(mesh));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Mesh>> {
        self.meshes.get(name)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl GeometrySource for MeshLibrary {
    fn load(
        &self,
        name: &str,
        placement: Placement,
        material: &Material,
    ) -> GeometryResult<Vec<Triangle>> {
        let mesh = self
            .get(name)
            .ok_or_else(|| GeometryError::UnknownMesh(name.to_string()))?;

        let mesh = Mesh::clone(mesh).normalized(placement.size, placement.center)?;
        let triangles = mesh.to_triangles(material)?;

        log::debug!(
            "Loaded '{}': {} triangles around {:?}",
            name,
            triangles.len(),
            placement.center
        );

        Ok(triangles)
    }
}
