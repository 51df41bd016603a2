use anyhow::Context;
use clap::{Parser, Subcommand};
use lanescape_common::Category;
use lanescape_input::slot_at;
use lanescape_render::{CameraRig, DebugTextRenderer, Renderer, frame_views, layout};
use lanescape_world::{SceneConfig, World, scene_meshes};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lanescape-cli", about = "Inspect the lanescape road scene without a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding the .glb models
    #[arg(long, default_value = "./assets", global = true)]
    assets: PathBuf,

    /// Scene config (YAML). Built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the scene layout, meshes and cameras
    Info,
    /// Print the effective scene config as YAML
    Config,
    /// Advance the scene a number of frames and report recycling
    Simulate {
        /// Number of frames to step
        #[arg(short, long, default_value = "600")]
        frames: u64,
        /// Seconds per frame
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
    },
    /// Print the viewport rectangles for a surface size
    Layout {
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
    },
    /// Report which camera a click at `x` selects
    Pick {
        #[arg(long)]
        x: f32,
        #[arg(long, default_value = "1280")]
        width: f32,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let config = load_config(cli.config.as_ref())?;
            let assets = scene_meshes(&config, &cli.assets);
            let world = World::build(config)?;
            let rig = CameraRig::new();

            println!("lanescape-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("Meshes: {} distinct", assets.len());
            for category in Category::ALL {
                let Some(mesh) = assets.mesh_for(category).and_then(|id| assets.get(id)) else {
                    continue;
                };
                let size = mesh.extent();
                println!(
                    "  {category:<14} {:<20} tris={:<6} size=({:.2}, {:.2}, {:.2})",
                    mesh.name,
                    mesh.triangle_count(),
                    size.x,
                    size.y,
                    size.z
                );
            }
            print!("{}", DebugTextRenderer::new().render(&world, &frame_views(&rig, 1280, 720)));
        }
        Commands::Config => {
            let config = load_config(cli.config.as_ref())?;
            print!("{}", config.to_yaml()?);
        }
        Commands::Simulate { frames, dt } => {
            let config = load_config(cli.config.as_ref())?;
            let mut world = World::build(config)?;
            let mut recycled = 0usize;
            for _ in 0..frames {
                recycled += world.update(dt).recycled;
            }
            println!(
                "Simulated {frames} frames of {dt}s: travelled {:.2}, recycled {recycled} instances",
                world.travelled()
            );
            print!("{}", DebugTextRenderer::new().render(&world, &[]));
        }
        Commands::Layout { width, height } => {
            let views = layout(width, height);
            if views.is_empty() {
                println!("{width}x{height}: surface too small for any viewport");
            }
            for v in views {
                println!(
                    "{:<6} x={:.1} y={:.1} size={:.1}",
                    v.slot.to_string(),
                    v.x,
                    v.y,
                    v.width
                );
            }
        }
        Commands::Pick { x, width } => {
            let slot = slot_at(x, width);
            let rig = CameraRig::new();
            let p = rig.camera(slot).position;
            println!("x={x} of {width}: {slot} camera at ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z);
        }
    }

    Ok(())
}
