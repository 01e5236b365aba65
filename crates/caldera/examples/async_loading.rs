//! Async asset loading example.
//!
//! Writes a texture and a model into a tempdir, then streams them in
//! while the "frame loop" keeps running against placeholder content.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use caldera::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    caldera::core::logging::init();

    // Stand-in asset files.
    let temp_dir = tempfile::tempdir()?;
    let brick_path = temp_dir.path().join("brick.png");
    let hero_path = temp_dir.path().join("hero.obj");
    create_test_assets(&brick_path, &hero_path)?;

    let mut engine = Engine::builder()
        .worker_threads(2)
        .build(Arc::new(HeadlessDevice::new()))?;

    let brick = engine
        .assets()
        .load_texture(brick_path.to_str().unwrap(), Priority::Normal)
        .expect("non-empty path");
    let hero = engine
        .assets()
        .load_model(hero_path.to_str().unwrap(), Priority::High)
        .expect("non-empty path");

    let placeholder = engine.assets().placeholder_texture().resource;
    println!(
        "frame 0: brick renders as {:?} (placeholder), hero has {} nodes",
        brick.resource(),
        hero.node_count()
    );

    let mut hero_instance = ModelInstance::new(Arc::clone(&hero));

    // The frame loop never waits for assets; it just keeps pumping.
    for frame in 1.. {
        engine.update();

        // Derived working copies resync themselves when a hot swap
        // changed the node table under them.
        hero_instance.sync();

        let brick_ready = brick.resource() != placeholder;
        let hero_ready = hero.has_content();
        if brick_ready && hero_ready {
            let (w, h) = brick.size();
            println!(
                "frame {}: brick is {}x{} as {:?}, hero has {} nodes / {} meshes",
                frame,
                w,
                h,
                brick.resource(),
                hero_instance.nodes().len(),
                hero.read().meshes.len()
            );
            break;
        }

        thread::sleep(Duration::from_millis(5));
    }

    engine.shutdown();
    Ok(())
}

fn create_test_assets(
    brick: &std::path::Path,
    hero: &std::path::Path,
) -> std::io::Result<()> {
    let pixels = image::RgbaImage::from_pixel(8, 8, image::Rgba([180, 80, 50, 255]));
    pixels
        .save(brick)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(
        hero,
        "\
o hero
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vn 0.0 0.0 1.0
f 1//1 2//1 3//1
",
    )
}
