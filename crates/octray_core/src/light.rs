use octray_math::DVec3;
use serde::{Deserialize, Serialize};

/// A directional light with separate Phong intensities.
///
/// Deserialization goes through [`Light::new`], so a configured direction
/// is normalized like any other.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "LightConfig")]
pub struct Light {
    /// Direction the light travels (unit length)
    pub direction: DVec3,
    pub ambient: DVec3,
    pub diffuse: DVec3,
    pub specular: DVec3,
}

impl Light {
    /// Create a light, normalizing `direction`.
    pub fn new(direction: DVec3, ambient: DVec3, diffuse: DVec3, specular: DVec3) -> Self {
        Self {
            direction: direction.try_normalize().unwrap_or(DVec3::NEG_Y),
            ambient,
            diffuse,
            specular,
        }
    }

    /// A white light shining along `direction`.
    pub fn white(direction: DVec3) -> Self {
        Self::new(direction, DVec3::ONE, DVec3::ONE, DVec3::ONE)
    }

    /// Direction from a surface towards the light.
    pub fn to_light(&self) -> DVec3 {
        -self.direction
    }
}

impl Default for Light {
    /// Straight down, white.
    fn default() -> Self {
        Self::white(DVec3::NEG_Y)
    }
}

/// Serialized form of [`Light`], with any direction length.
#[derive(Deserialize)]
#[serde(default)]
struct LightConfig {
    direction: DVec3,
    ambient: DVec3,
    diffuse: DVec3,
    specular: DVec3,
}

impl Default for LightConfig {
    fn default() -> Self {
        let light = Light::default();
        Self {
            direction: light.direction,
            ambient: light.ambient,
            diffuse: light.diffuse,
            specular: light.specular,
        }
    }
}

impl From<LightConfig> for Light {
    fn from(config: LightConfig) -> Self {
        Light::new(
            config.direction,
            config.ambient,
            config.diffuse,
            config.specular,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_direction_normalized() {
        let light = Light::white(DVec3::new(0.0, -3.0, 4.0));
        assert!((light.direction.length() - 1.0).abs() < 1e-12);
        assert!((light.to_light() - DVec3::new(0.0, 0.6, -0.8)).length() < 1e-12);
    }

    #[test]
    fn test_default_light() {
        let light = Light::default();
        assert_eq!(light.direction, DVec3::NEG_Y);
        assert_eq!(light.specular, DVec3::ONE);
    }

    #[test]
    fn test_deserialize_partial() {
        let light: Light = serde_json::from_str(r#"{"ambient": [0.5, 0.5, 0.5]}"#).unwrap();
        assert_eq!(light.ambient, DVec3::splat(0.5));
        assert_eq!(light.direction, DVec3::NEG_Y);
    }

    #[test]
    fn test_deserialize_normalizes_direction() {
        let light: Light = serde_json::from_str(r#"{"direction": [0, -3, 0]}"#).unwrap();
        assert_eq!(light.direction, DVec3::NEG_Y);

        let light: Light = serde_json::from_str(r#"{"direction": [0, 0, 0]}"#).unwrap();
        assert_eq!(light.direction, DVec3::NEG_Y);
    }

    #[test]
    fn test_serialize_round_trip() {
        let light = Light::white(DVec3::new(1.0, -1.0, 0.0));
        let json = serde_json::to_string(&light).unwrap();
        let back: Light = serde_json::from_str(&json).unwrap();
        assert!((back.direction - light.direction).length() < 1e-12);
        assert_eq!(back.diffuse, light.diffuse);
    }
}
