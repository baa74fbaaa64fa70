//! Phong local illumination.

use octray_core::{Light, Reflectance, Triangle, Vertex};
use octray_math::{DVec3, Ray};
use serde::{Deserialize, Serialize};

/// Which vertex reflectance feeds the three Phong terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectanceMode {
    /// Ambient, diffuse and specular each use their own reflectance
    #[default]
    PerTerm,
    /// The diffuse reflectance is used as a single color for all three terms
    Uniform,
}

/// Which parts of a hit's color a blocked shadow ray darkens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowMode {
    /// Only the local Phong color
    #[default]
    LocalOnly,
    /// Local color plus the reflected and refracted contributions
    AllBranches,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingConfig {
    pub reflectance: ReflectanceMode,
    pub shadows: ShadowMode,
    /// Specular exponent
    pub shininess: f64,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            reflectance: ReflectanceMode::PerTerm,
            shadows: ShadowMode::LocalOnly,
            shininess: 10.0,
        }
    }
}

/// Local Phong color of `triangle` at `barycentric`, as seen along `ray`.
///
/// Each vertex is lit with its own normal and reflectance, the three
/// results are blended by the barycentric weights, and the total is scaled
/// by the ray's remaining intensity.
pub fn phong(
    light: &Light,
    ray: &Ray,
    triangle: &Triangle,
    barycentric: DVec3,
    config: &ShadingConfig,
) -> DVec3 {
    let view = -ray.direction;

    let color = triangle
        .vertices
        .iter()
        .zip(barycentric.to_array())
        .map(|(vertex, weight)| shade_vertex(light, vertex, view, config) * weight)
        .sum::<DVec3>();

    color * ray.intensity
}

fn shade_vertex(light: &Light, vertex: &Vertex, view: DVec3, config: &ShadingConfig) -> DVec3 {
    let reflectance = match config.reflectance {
        ReflectanceMode::PerTerm => vertex.reflectance,
        ReflectanceMode::Uniform => Reflectance::uniform(vertex.reflectance.diffuse),
    };

    let n = vertex.normal;
    let l = light.direction;
    let n_dot_l = n.dot(l);

    let ambient = reflectance.ambient * light.ambient;
    let diffuse = reflectance.diffuse * light.diffuse * (-n_dot_l).max(0.0);

    let reflected = l - n * (2.0 * n_dot_l);
    let specular_weight = reflected.dot(view).max(0.0).powf(config.shininess);
    let specular = reflectance.specular * light.specular * specular_weight;

    ambient + diffuse + specular
}
