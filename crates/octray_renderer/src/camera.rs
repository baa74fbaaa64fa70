//! Orbital camera for ray generation.
//!
//! The camera sits on a sphere of radius `r` around an orbit centre and
//! always looks at that centre. `theta` is the elevation above the XZ plane
//! and `phi` the azimuth. Panning moves the orbit centre.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_6, SQRT_2, TAU};

use octray_math::{DMat3, DVec2, DVec3, Interval, Ray};
use serde::{Deserialize, Serialize};

/// Initial orbit, limits, navigation speeds and intrinsics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub r: f64,
    /// Elevation in radians
    pub theta: f64,
    /// Azimuth in radians
    pub phi: f64,
    pub r_range: Interval,
    pub theta_range: Interval,
    /// Azimuth change per pixel of horizontal drag
    pub speed_phi: f64,
    /// Elevation change per pixel of vertical drag
    pub speed_theta: f64,
    /// Radius change per unit of zoom delta
    pub zoom_speed: f64,
    /// World distance moved per pan event
    pub pan_step: f64,
    pub width: u32,
    pub height: u32,
    /// Principal point; defaults to the image centre
    pub cx: Option<f64>,
    pub cy: Option<f64>,
    /// Focal lengths in pixels; default to the image width
    pub fx: Option<f64>,
    pub fy: Option<f64>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let limit = 85f64.to_radians();
        Self {
            r: 10.0 * SQRT_2,
            theta: FRAC_PI_6,
            phi: FRAC_PI_2,
            r_range: Interval::new(1.0, 100.0),
            theta_range: Interval::new(-limit, limit),
            speed_phi: 0.01,
            speed_theta: 0.01,
            zoom_speed: 0.01,
            pan_step: 0.5,
            width: 300,
            height: 300,
            cx: None,
            cy: None,
            fx: None,
            fy: None,
        }
    }
}

/// A discrete navigation input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavigationEvent {
    BeginDrag { x: f64, y: f64 },
    DragTo { x: f64, y: f64 },
    EndDrag,
    /// Positive deltas move the camera closer
    Zoom(f64),
    /// Direction in camera space (x right, y down, z forward)
    Pan(DVec3),
}

/// Orbital pinhole camera.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub width: u32,
    pub height: u32,
    pub cx: f64,
    pub cy: f64,
    pub fx: f64,
    pub fy: f64,

    r: f64,
    theta: f64,
    phi: f64,
    r_range: Interval,
    theta_range: Interval,
    speed_phi: f64,
    speed_theta: f64,
    zoom_speed: f64,
    pan_step: f64,

    /// Accumulated pan offset of the orbit centre
    translation: DVec3,
    drag_anchor: Option<DVec2>,

    // Derived by update()
    position: DVec3,
    rotation: DMat3,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

/// A configured focal length if it is finite and positive, else the image width.
fn focal_length(name: &str, configured: Option<f64>, width: f64) -> f64 {
    let fallback = width.max(1.0);
    match configured {
        None => fallback,
        Some(f) if f.is_finite() && f > 0.0 => f,
        Some(f) => {
            log::warn!("Ignoring focal length {} = {}, using {}", name, f, fallback);
            fallback
        }
    }
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        let width = config.width as f64;
        let height = config.height as f64;

        let mut camera = Self {
            width: config.width,
            height: config.height,
            cx: config.cx.unwrap_or(width / 2.0),
            cy: config.cy.unwrap_or(height / 2.0),
            fx: focal_length("fx", config.fx, width),
            fy: focal_length("fy", config.fy, width),
            r: config.r,
            theta: config.theta,
            phi: config.phi,
            r_range: config.r_range,
            theta_range: config.theta_range,
            speed_phi: config.speed_phi,
            speed_theta: config.speed_theta,
            zoom_speed: config.zoom_speed,
            pan_step: config.pan_step,
            translation: DVec3::ZERO,
            drag_anchor: None,
            position: DVec3::ZERO,
            rotation: DMat3::IDENTITY,
        };
        camera.update();
        camera
    }

    pub fn r(&self) -> f64 {
        self.r
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Columns are the camera's x (right), y (down) and z (forward) axes in world space.
    pub fn rotation(&self) -> DMat3 {
        self.rotation
    }

    pub fn translation(&self) -> DVec3 {
        self.translation
    }

    pub fn forward(&self) -> DVec3 {
        self.rotation.z_axis
    }

    /// Primary ray through pixel `(u, v)`.
    pub fn generate_pixel_ray(&self, u: f64, v: f64) -> Ray {
        let local = DVec3::new((u - self.cx) / self.fx, (v - self.cy) / self.fy, 1.0);
        Ray::new(self.position, self.rotation * local.normalize())
    }

    pub fn begin_drag(&mut self, x: f64, y: f64) {
        self.drag_anchor = Some(DVec2::new(x, y));
    }

    /// Orbit by the motion since the last drag position.
    ///
    /// Ignored unless a drag is in progress.
    pub fn drag_to(&mut self, x: f64, y: f64) {
        let Some(anchor) = self.drag_anchor else {
            return;
        };
        let current = DVec2::new(x, y);
        let delta = current - anchor;

        self.phi += delta.x * self.speed_phi;
        self.theta -= delta.y * self.speed_theta;
        self.drag_anchor = Some(current);
        self.update();
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    pub fn zoom(&mut self, delta: f64) {
        self.r -= delta * self.zoom_speed;
        self.update();
    }

    /// Move the orbit centre along a camera-space direction.
    pub fn pan(&mut self, direction: DVec3) {
        self.translation += self.rotation * direction * self.pan_step;
        self.update();
    }

    /// Dispatch a navigation event to the matching operation.
    pub fn apply(&mut self, event: NavigationEvent) {
        match event {
            NavigationEvent::BeginDrag { x, y } => self.begin_drag(x, y),
            NavigationEvent::DragTo { x, y } => self.drag_to(x, y),
            NavigationEvent::EndDrag => self.end_drag(),
            NavigationEvent::Zoom(delta) => self.zoom(delta),
            NavigationEvent::Pan(direction) => self.pan(direction),
        }
    }

    /// Clamp the orbit parameters and re-derive position and rotation.
    fn update(&mut self) {
        self.r = self.r_range.clamp(self.r);
        self.theta = self.theta_range.clamp(self.theta);
        self.phi = self.phi.rem_euclid(TAU);
        // rem_euclid can round a tiny negative up to exactly TAU
        if self.phi >= TAU {
            self.phi = 0.0;
        }

        let (sin_theta, cos_theta) = self.theta.sin_cos();
        let (sin_phi, cos_phi) = self.phi.sin_cos();

        let offset = DVec3::new(cos_theta * cos_phi, sin_theta, cos_theta * sin_phi);
        self.position = offset * self.r + self.translation;

        let z = -offset;
        let x = DVec3::new(sin_phi, 0.0, -cos_phi);
        let y = z.cross(x);
        self.rotation = DMat3::from_cols(x, y, z);
    }
}
