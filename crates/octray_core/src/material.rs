//! Surface material definitions.

use octray_math::DVec3;
use serde::{Deserialize, Serialize};

use crate::mesh::{GeometryError, GeometryResult};

/// Per-vertex Phong reflectance weights.
///
/// Each term is an RGB triple multiplied component-wise with the matching
/// light intensity during shading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reflectance {
    pub ambient: DVec3,
    pub diffuse: DVec3,
    pub specular: DVec3,
}

impl Reflectance {
    pub fn new(ambient: DVec3, diffuse: DVec3, specular: DVec3) -> Self {
        Self {
            ambient,
            diffuse,
            specular,
        }
    }

    /// The same color for all three terms.
    pub fn uniform(color: DVec3) -> Self {
        Self::new(color, color, color)
    }

    /// Scalar weights for each term, tinted by `color`.
    ///
    /// This is how a mesh with a single base color (or texture sample)
    /// turns into per-term reflectance.
    pub fn weighted(color: DVec3, ambient: f64, diffuse: f64, specular: f64) -> Self {
        Self::new(color * ambient, color * diffuse, color * specular)
    }

    /// Multiply every term component-wise by `color`.
    pub fn tinted(&self, color: DVec3) -> Self {
        Self::new(self.ambient * color, self.diffuse * color, self.specular * color)
    }
}

impl Default for Reflectance {
    fn default() -> Self {
        // Reference weights: mostly ambient with a little diffuse and specular
        Self::weighted(DVec3::ONE, 0.6, 0.2, 0.2)
    }
}

/// Material coefficients shared by every triangle of an object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Reflectance weights applied to each vertex's base color
    pub reflectance: Reflectance,

    /// Fraction of intensity carried by the mirror ray, in [0, 1]
    pub reflection: f64,

    /// Fraction of intensity carried by the refracted ray, in [0, 1]
    pub refraction: f64,

    /// Refractive index of the object's interior
    pub refraction_index: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            reflectance: Reflectance::default(),
            reflection: 0.0,
            refraction: 0.0,
            refraction_index: 1.0,
        }
    }
}

impl Material {
    /// An opaque material with only local shading.
    pub fn opaque(reflectance: Reflectance) -> Self {
        Self {
            reflectance,
            ..Default::default()
        }
    }

    pub fn with_reflection(mut self, reflection: f64) -> Self {
        self.reflection = reflection;
        self
    }

    pub fn with_refraction(mut self, refraction: f64, refraction_index: f64) -> Self {
        self.refraction = refraction;
        self.refraction_index = refraction_index;
        self
    }

    /// Check that coefficients lie in [0, 1] and the index is positive.
    pub fn validate(&self) -> GeometryResult<()> {
        for (name, value) in [("reflection", self.reflection), ("refraction", self.refraction)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GeometryError::InvalidCoefficient { name, value });
            }
        }

        if !(self.refraction_index.is_finite() && self.refraction_index > 0.0) {
            return Err(GeometryError::InvalidRefractionIndex(self.refraction_index));
        }

        Ok(())
    }
}
