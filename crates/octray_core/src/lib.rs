//! Octray Core - Scene data for the octree ray tracer.
//!
//! This crate provides:
//!
//! - **Geometry**: `Vertex`, `Triangle`, and the loader-facing `Mesh`
//! - **Appearance**: `Material`, `Reflectance`, `Texture`
//! - **Lighting**: a single directional `Light`
//! - **Lookup**: the `GeometrySource` trait and an in-memory `MeshLibrary`
//!
//! # Example
//!
//! ```ignore
//! use octray_core::{GeometrySource, Material, Mesh, MeshLibrary, Placement};
//! use octray_math::DVec3;
//!
//! let mut library = MeshLibrary::new();
//! library.insert("ball", Mesh::uv_sphere(DVec3::ZERO, 1.0, 32, 16));
//!
//! let triangles = library.load("ball", Placement::new(3.0, DVec3::ZERO), &Material::default())?;
//! ```

pub mod library;
pub mod light;
pub mod material;
pub mod mesh;
pub mod texture;
pub mod triangle;

// Re-export commonly used types
pub use library::{GeometrySource, MeshLibrary, Placement};
pub use light::Light;
pub use material::{Material, Reflectance};
pub use mesh::{GeometryError, GeometryResult, Mesh};
pub use texture::{Texture, TextureError, TextureResult, TextureSampler};
pub use triangle::{Triangle, Vertex};
