//! Example: render a procedural scene and save it as an image.
//!
//! Run with: cargo run --example render_scene -- [config.json] [output.png]
//!
//! The optional JSON file overrides any field of `SceneConfig`, e.g.
//! `{"camera": {"width": 640, "height": 480}, "render": {"trace": {"max_depth": 5}}}`.

use std::env;
use std::fs;
use std::time::Instant;

use anyhow::{Context, Result};
use octray_core::{Light, Material, Mesh, MeshLibrary, Placement, Reflectance};
use octray_math::DVec3;
use octray_renderer::{
    Camera, CameraConfig, NavigationEvent, Object, OctreeConfig, RenderConfig, Scene, Session,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SceneConfig {
    camera: CameraConfig,
    octree: OctreeConfig,
    render: RenderConfig,
    light: Light,
    /// Azimuth steps (in drag pixels) to render after the first frame
    orbit_steps: Vec<f64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();

    let config = match args.get(1) {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path))?
        }
        None => SceneConfig::default(),
    };
    let output = args.get(2).map(String::as_str).unwrap_or("render.png");

    let start = Instant::now();
    let scene = build_scene(&config)?;
    log::info!(
        "Scene built in {:.2?}: {} objects, {} triangles",
        start.elapsed(),
        scene.objects().len(),
        scene.triangle_count()
    );

    let mut session = Session::new(scene, Camera::new(&config.camera), config.render);

    let frame = session.render()?;
    frame
        .image
        .to_rgb_image()
        .save(output)
        .with_context(|| format!("saving {}", output))?;
    log::info!("Saved {}", output);

    for (i, step) in config.orbit_steps.iter().enumerate() {
        session.apply(NavigationEvent::BeginDrag { x: 0.0, y: 0.0 });
        session.apply(NavigationEvent::DragTo { x: *step, y: 0.0 });
        session.apply(NavigationEvent::EndDrag);

        let path = format!("{}.orbit{}.png", output.trim_end_matches(".png"), i);
        session.render()?.image.to_rgb_image().save(&path)?;
        log::info!("Saved {}", path);
    }

    Ok(())
}

/// A mirror floor, a glass ball and a matte cube.
fn build_scene(config: &SceneConfig) -> Result<Scene> {
    let mut library = MeshLibrary::new();
    library.insert(
        "floor",
        Mesh::quad([
            DVec3::new(-1.0, 0.0, 1.0),
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::new(1.0, 0.0, -1.0),
            DVec3::new(-1.0, 0.0, -1.0),
        ]),
    );
    library.insert("ball", Mesh::uv_sphere(DVec3::ZERO, 1.0, 48, 24));
    library.insert(
        "box",
        Mesh::cube(DVec3::ZERO, 1.0).with_colors(vec![DVec3::new(0.9, 0.4, 0.2); 24]),
    );

    let floor = Material::opaque(Reflectance::weighted(DVec3::splat(0.8), 0.4, 0.4, 0.2))
        .with_reflection(0.5);
    let glass = Material::opaque(Reflectance::weighted(DVec3::new(0.7, 0.85, 1.0), 0.2, 0.2, 0.6))
        .with_reflection(0.1)
        .with_refraction(0.8, 1.5);
    let matte = Material::default();

    // Normalisation divides by the root of the summed squared spread, so
    // scale by sqrt(vertex count) to get a size in RMS units
    let objects = [
        ("floor", 8.0, DVec3::new(0.0, -2.0, 0.0), floor),
        ("ball", 2.0, DVec3::new(-1.5, 0.0, 0.0), glass),
        ("box", 1.5, DVec3::new(2.5, -0.5, -1.0), matte),
    ];

    let mut scene = Scene::new(config.light);
    for (name, size, center, material) in objects {
        let vertices = library.get(name).map_or(1, |mesh| mesh.vertex_count());
        let placement = Placement::new(size * (vertices as f64).sqrt(), center);
        let object = Object::load(&library, name, placement, &material, &config.octree)
            .with_context(|| format!("building {}", name))?;
        scene.add(object);
    }

    Ok(scene)
}
