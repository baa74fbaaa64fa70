//! Octray Renderer - octree-accelerated recursive ray tracing.
//!
//! One primary ray per pixel is traced through a scene of triangulated
//! solids. Each solid owns an octree that narrows the triangles tested
//! exactly with Möller-Trumbore. Hits are lit with Phong shading, a hard
//! shadow ray, a mirror reflection and a Snell refraction, recursively up
//! to a depth and intensity limit.

mod bucket;
mod camera;
mod frame;
mod intersect;
mod object;
mod octree;
mod renderer;
mod scene;
mod session;
mod shading;
mod tracer;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use camera::{Camera, CameraConfig, NavigationEvent};
pub use frame::{FrameCounter, FrameTicket};
pub use intersect::{intersect_triangle, TriangleHit, DEFAULT_HIT_EPSILON};
pub use object::{Object, ObjectHit};
pub use octree::{NodeId, NodeKind, Octree, OctreeConfig, OctreeNode, OctreeStats};
pub use renderer::{
    color_to_rgb8, render, render_frame, render_pixel, ImageBuffer, RenderConfig, RenderContext,
    RenderError, RenderOutput,
};
pub use scene::{Scene, SceneError, SceneHit};
pub use session::Session;
pub use shading::{phong, ReflectanceMode, ShadingConfig, ShadowMode};
pub use tracer::{reflect, refract, SecondaryRays, TraceConfig, TraceStats, Tracer};

/// Re-export common math types from octray_math
pub use octray_math::{Aabb, DVec3, Interval, Ray, RayKind};
