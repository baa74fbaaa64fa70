use glam::DVec3;

/// Refractive index of the medium primary rays start in.
pub const VACUUM_REFRACTION_INDEX: f64 = 1.0;

/// The role a ray plays in the ray tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RayKind {
    /// Emitted by the camera, one per pixel.
    Primary,
    /// Occlusion test from a hit point towards the light.
    Shadow,
    /// Mirror bounce off a surface.
    Reflection,
    /// Transmission through a surface (Snell's law).
    Refraction,
}

/// A ray in 3D space together with its light-transport lineage.
///
/// `direction` is always unit length; every constructor normalizes it.
/// `intensity` is the fraction of the primary contribution still carried
/// by this ray and never grows along a traced path.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
    /// Remaining contribution weight in `(0, 1]`.
    pub intensity: f64,
    /// Refractive index of the medium the ray currently travels through.
    pub refraction_index: f64,
    /// Whether the ray is travelling inside a refracting object.
    pub inside: bool,
    pub kind: RayKind,
    /// The object this ray just left; it is skipped during intersection.
    pub excluded_object: Option<usize>,
}

impl Ray {
    /// Create a primary ray at full intensity in vacuum.
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            intensity: 1.0,
            refraction_index: VACUUM_REFRACTION_INDEX,
            inside: false,
            kind: RayKind::Primary,
            excluded_object: None,
        }
    }

    /// Spawn a child ray that inherits intensity and medium from `self`.
    pub fn spawn(&self, kind: RayKind, origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            intensity: self.intensity,
            refraction_index: self.refraction_index,
            inside: self.inside,
            kind,
            excluded_object: None,
        }
    }

    /// Scale the carried intensity by `factor`.
    pub fn attenuated(mut self, factor: f64) -> Self {
        self.intensity *= factor;
        self
    }

    /// Place the ray in a medium with the given refractive index.
    pub fn in_medium(mut self, refraction_index: f64, inside: bool) -> Self {
        self.refraction_index = refraction_index;
        self.inside = inside;
        self
    }

    /// Mark `object` as the surface this ray is leaving.
    pub fn excluding(mut self, object: usize) -> Self {
        self.excluded_object = Some(object);
        self
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }
}
