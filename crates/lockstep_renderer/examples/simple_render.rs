//! Simple batched render example.
//!
//! Builds a small room in code, renders it through the emulated raycast
//! device and saves a PNG next to the working directory.

use lockstep_renderer::{
    BatchScheduler, Camera, EmulatedRaycaster, HardwareBackend, RenderConfig, Scene, Shape, Vec3,
};

fn main() {
    println!("Lockstep Path Tracer - Simple Example");
    println!("=====================================");

    let scene = build_scene();
    println!("Scene '{}' has {} shapes", scene.name, scene.len());

    let camera = Camera::new()
        .with_resolution(120, 160)
        .with_position(Vec3::new(-1.0, 0.0, 0.5))
        .with_orientation(-5.0, 0.0)
        .with_fov(75.0);

    let config = RenderConfig {
        rays_per_pixel: 16,
        max_depth: 4,
        ..Default::default()
    };

    println!(
        "Rendering {}x{} @ {} rays/pixel...",
        camera.cols, camera.rows, config.rays_per_pixel
    );

    let backend = HardwareBackend::new(EmulatedRaycaster::new(), config.batch_width);
    let mut scheduler =
        BatchScheduler::new(&scene, &camera, config, backend).expect("Failed to prepare backend");
    let (image, stats) = scheduler.render().expect("Render failed");

    println!(
        "Rendered in {:?}: {} batches, {} rays",
        stats.elapsed, stats.totals.batches, stats.totals.records
    );

    let filename = "simple_render.png";
    image.save(filename).expect("Failed to save image");
    println!("Saved to {}", filename);
}

fn build_scene() -> Scene {
    let mut scene = Scene::new("simple_room");

    // Floor and ceiling light
    scene.add_shape(
        Shape::plane(Vec3::new(0.0, 0.0, -1.0), Vec3::Z).with_color(Vec3::splat(200.0)),
    );
    scene.add_shape(
        Shape::plane(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z)
            .with_color(Vec3::splat(255.0))
            .with_emittance(2.0),
    );

    // Back and side walls
    scene.add_shape(
        Shape::plane(Vec3::new(8.0, 0.0, 0.0), Vec3::NEG_X).with_color(Vec3::splat(180.0)),
    );
    scene.add_shape(
        Shape::plane(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y)
            .with_color(Vec3::new(200.0, 40.0, 40.0)),
    );
    scene.add_shape(
        Shape::plane(Vec3::new(0.0, -3.0, 0.0), Vec3::Y).with_color(Vec3::new(40.0, 200.0, 40.0)),
    );

    // Objects
    scene.add_shape(
        Shape::sphere(Vec3::new(5.0, 1.0, 0.0), 1.0).with_color(Vec3::new(90.0, 90.0, 220.0)),
    );
    scene.add_shape(
        Shape::triangle(
            Vec3::new(5.5, -2.0, -1.0),
            Vec3::new(5.5, 0.0, -1.0),
            Vec3::new(5.5, -1.0, 1.5),
        )
        .with_color(Vec3::new(220.0, 220.0, 60.0)),
    );

    scene
}
