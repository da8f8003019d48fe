use std::env;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use log::info;

use prism_runtime::{Camera, Config, DataModel, PointLight, Renderer, Scene, SceneObject};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let config = match options.config.as_deref() {
        Some(path) => Config::read_config(path)?,
        None => Config::default(),
    };

    let xml = std::fs::read_to_string(&options.scene)
        .with_context(|| format!("failed to read scene {}", options.scene))?;
    let scene = Scene::from_xml(&xml).context("failed to parse scene XML")?;

    println!(
        "Loaded scene with {} objects ({} lights)",
        scene.objects.len(),
        scene.lights.len()
    );
    for object in &scene.objects {
        println!(" - {} ({})", object.name, object.object_type);
    }

    let model = DataModel::from_objects(scene.objects.clone());
    let camera = camera_from_objects(&scene.objects);
    let asset_root = Path::new(&options.scene)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut renderer = Renderer::new(&config, asset_root);

    for frame in 0..options.frames {
        if frame > 0 {
            model.advance_animations();
        }
        let objects = model.all_objects();
        let lights = lights_from_objects(&objects);
        renderer.render(&objects, &lights, &camera);
        info!("rendered frame {}/{}", frame + 1, options.frames);
    }

    if !options.summary_only {
        renderer
            .presented()
            .save_png(&options.output)
            .with_context(|| format!("failed to write {}", options.output))?;
        println!("Wrote {}", options.output);
    }

    print_final_state(&model);
    Ok(())
}

/// Builds the camera from the scene's camera object, if any.
fn camera_from_objects(objects: &[SceneObject]) -> Camera {
    let mut camera = Camera::new(Vec3::new(0.0, 0.0, 6.0));
    if let Some(object) = objects.iter().find(|o| o.object_type == "camera") {
        camera.set_position(object.position);
        camera.set_euler_rotation(object.rotation);
    }
    camera
}

/// Collects the current point lights from an object snapshot, so animated
/// lights shine from their animated positions.
fn lights_from_objects(objects: &[SceneObject]) -> Vec<PointLight> {
    objects
        .iter()
        .filter(|o| o.object_type == "light")
        .map(|o| PointLight {
            position: o.position,
            color: o.color,
            radius: o.radius,
        })
        .collect()
}

fn print_final_state(model: &DataModel) {
    println!("Final object states:");
    for object in model.all_objects() {
        println!(
            " - {} pos=({:.2}, {:.2}, {:.2}) rot=({:.1}, {:.1}, {:.1})",
            object.name,
            object.position.x,
            object.position.y,
            object.position.z,
            object.rotation.x,
            object.rotation.y,
            object.rotation.z
        );
    }
}

struct CliOptions {
    scene: String,
    config: Option<String>,
    output: String,
    frames: u32,
    summary_only: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(scene) = args.next() else {
            return Err(anyhow!(
                "Usage: prism-runtime <scene.xml> [--config <options.json>] \
                 [--output <out.png>] [--frames <n>] [--summary-only]"
            ));
        };
        let mut config = None;
        let mut output = "frame.png".to_string();
        let mut frames = 1;
        let mut summary_only = false;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    config = Some(
                        args.next()
                            .ok_or_else(|| anyhow!("--config requires a path"))?,
                    );
                }
                "--output" => {
                    output = args
                        .next()
                        .ok_or_else(|| anyhow!("--output requires a path"))?;
                }
                "--frames" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--frames requires a count"))?;
                    frames = value
                        .parse()
                        .with_context(|| format!("invalid frame count {value}"))?;
                    if frames == 0 {
                        return Err(anyhow!("--frames must be at least 1"));
                    }
                }
                "--summary-only" => summary_only = true,
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --config, --output, \
                         --frames or --summary-only"
                    ));
                }
            }
        }
        Ok(Self {
            scene,
            config,
            output,
            frames,
            summary_only,
        })
    }
}
