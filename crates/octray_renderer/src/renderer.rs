//! Frame rendering.
//!
//! Every pixel gets one primary ray through its integer coordinate. Pixels
//! are independent, so buckets of them are rendered in parallel with rayon
//! against the immutable scene and a snapshot of the camera.

use std::time::Instant;

use octray_math::DVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::camera::Camera;
use crate::frame::FrameTicket;
use crate::scene::Scene;
use crate::tracer::{TraceConfig, TraceStats, Tracer};

/// Errors that end a frame early.
#[derive(Error, Debug, PartialEq)]
pub enum RenderError {
    #[error("Frame {generation} superseded by frame {current}")]
    Superseded { generation: u64, current: u64 },

    #[error("Invalid image size {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Render configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub trace: TraceConfig,
    /// Edge length of a bucket in pixels
    pub bucket_size: u32,
    /// Render buckets on the rayon thread pool
    pub parallel: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            trace: TraceConfig::default(),
            bucket_size: DEFAULT_BUCKET_SIZE,
            parallel: true,
        }
    }
}

/// Everything a frame reads: the scene and a camera snapshot.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub scene: &'a Scene,
    pub camera: Camera,
}

impl<'a> RenderContext<'a> {
    pub fn new(scene: &'a Scene, camera: Camera) -> Self {
        Self { scene, camera }
    }
}

/// Unclamped linear RGB framebuffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    /// Pixel `(u, v)` lives at `v * width + u`
    pub pixels: Vec<DVec3>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![DVec3::ZERO; width as usize * height as usize],
        }
    }

    fn index(&self, u: u32, v: u32) -> usize {
        v as usize * self.width as usize + u as usize
    }

    /// Get the pixel at (u, v).
    pub fn get(&self, u: u32, v: u32) -> DVec3 {
        self.pixels[self.index(u, v)]
    }

    /// Set the pixel at (u, v).
    pub fn set(&mut self, u: u32, v: u32, color: DVec3) {
        let index = self.index(u, v);
        self.pixels[index] = color;
    }

    /// Copy a rendered bucket into place.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        let bucket = &result.bucket;
        for (i, color) in result.pixels.iter().enumerate() {
            let u = bucket.x + i as u32 % bucket.width;
            let v = bucket.y + i as u32 / bucket.width;
            self.set(u, v, *color);
        }
    }

    /// Convert to packed 8-bit RGB.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|c| color_to_rgb8(*c))
            .collect()
    }

    /// Convert to an `image` crate buffer for display or saving.
    pub fn to_rgb_image(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width, self.height, |u, v| {
            image::Rgb(color_to_rgb8(self.get(u, v)))
        })
    }
}

/// Scale each channel to 0..=255, clamping out-of-range values.
pub fn color_to_rgb8(color: DVec3) -> [u8; 3] {
    color.to_array().map(|c| (c * 256.0).floor().clamp(0.0, 255.0) as u8)
}

/// Trace the primary ray of pixel `(u, v)`.
pub fn render_pixel(
    tracer: &Tracer,
    camera: &Camera,
    u: u32,
    v: u32,
    stats: &mut TraceStats,
) -> DVec3 {
    let ray = camera.generate_pixel_ray(u as f64, v as f64);
    tracer.trace_primary(ray, stats)
}

/// A finished frame.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub image: ImageBuffer,
    pub stats: TraceStats,
}

/// Render a full frame.
pub fn render(context: &RenderContext, config: &RenderConfig) -> Result<RenderOutput, RenderError> {
    render_buckets(context, config, None)
}

/// Render a frame that is abandoned as soon as `ticket` goes stale.
///
/// The ticket is checked before each bucket and once more at the end, so
/// a frame that finishes after a newer one began is discarded too.
pub fn render_frame(
    context: &RenderContext,
    config: &RenderConfig,
    ticket: &FrameTicket,
) -> Result<RenderOutput, RenderError> {
    let output = render_buckets(context, config, Some(ticket))?;
    ticket.check()?;
    Ok(output)
}

fn render_buckets(
    context: &RenderContext,
    config: &RenderConfig,
    ticket: Option<&FrameTicket>,
) -> Result<RenderOutput, RenderError> {
    let camera = &context.camera;
    let (width, height) = (camera.width, camera.height);
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions { width, height });
    }

    let start = Instant::now();
    let tracer = Tracer::new(context.scene, &config.trace);
    let buckets = generate_buckets(width, height, config.bucket_size);

    let render_one = |bucket: &Bucket| -> Result<BucketResult, RenderError> {
        if let Some(ticket) = ticket {
            ticket.check()?;
        }
        Ok(render_bucket(bucket, &tracer, camera))
    };

    let results: Result<Vec<BucketResult>, RenderError> = if config.parallel {
        buckets.par_iter().map(render_one).collect()
    } else {
        buckets.iter().map(render_one).collect()
    };
    let results = match results {
        Ok(results) => results,
        Err(err) => {
            log::warn!("Frame abandoned: {}", err);
            return Err(err);
        }
    };

    let mut image = ImageBuffer::new(width, height);
    let mut stats = TraceStats::default();
    for result in &results {
        image.write_bucket(result);
        stats += result.stats;
    }

    log::info!(
        "Rendered {}x{} in {:.2?}: {} rays ({} primary, {} shadow, {} reflection, {} refraction), depth {}",
        width,
        height,
        start.elapsed(),
        stats.total_rays(),
        stats.primary,
        stats.shadow,
        stats.reflection,
        stats.refraction,
        stats.max_depth_reached
    );

    Ok(RenderOutput { image, stats })
}
