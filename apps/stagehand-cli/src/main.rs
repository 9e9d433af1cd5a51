use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use glam::{Quat, Vec3};
use stagehand_common::Transform;
use stagehand_ecs::{BoxCollider, Camera, Light, Rigidbody};
use stagehand_engine::{EngineConfig, EngineContext};
use stagehand_persist::{PACK_EXTENSION, read_level, resolve_level_path, write_packed};
use stagehand_render::RecordingBackend;
use stagehand_tools::SceneInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stagehand-cli", about = "Headless driver for stagehand levels")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and defaults
    Info,
    /// Print a level's summary and node tree
    Inspect {
        /// Level name or file
        level: String,
        /// Project root used to resolve level names
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
        /// Slash-separated path of a node to describe
        #[arg(short, long)]
        node: Option<String>,
    },
    /// Drive a level for a number of frames against a recording backend
    Run {
        /// Level name or file
        level: String,
        #[arg(short, long, default_value = "60")]
        frames: u64,
        /// Enter play mode before running
        #[arg(long, conflicts_with = "runtime")]
        play: bool,
        /// Run as a standalone game, without the editor
        #[arg(long)]
        runtime: bool,
        /// Engine configuration file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Print the recorded render commands of the last frame
        #[arg(long)]
        dump: bool,
    },
    /// Write a level in the packed runtime format
    Pack {
        /// Level file to pack
        input: PathBuf,
        /// Output file; defaults to the input with the pack extension
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Create a starter level with a camera, a light and a falling box
    Scaffold {
        /// Level file to create
        path: PathBuf,
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let config = EngineConfig::default();
            println!("stagehand-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "timestep={:.4}s gravity={} shadow map={}",
                config.timestep, config.gravity, config.render.shadow_map_resolution
            );
        }
        Commands::Inspect { level, root, node } => inspect(&root, &level, node.as_deref())?,
        Commands::Run {
            level,
            frames,
            play,
            runtime,
            config,
            root,
            dump,
        } => {
            let mut config = match config {
                Some(path) => EngineConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => EngineConfig::default(),
            };
            if let Some(root) = root {
                config.project_root = root;
            }
            if runtime {
                config.editor = false;
            }
            run(config, &level, frames, play, dump)?;
        }
        Commands::Pack { input, output } => {
            let level = read_level(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let output = output.unwrap_or_else(|| input.with_extension(PACK_EXTENSION));
            let digest = write_packed(&level, &output)?;
            println!("Packed {} -> {}", level.name(), output.display());
            println!("sha256: {digest}");
        }
        Commands::Scaffold { path, root } => scaffold(root, &path)?,
    }

    Ok(())
}

fn inspect(root: &Path, identifier: &str, node: Option<&str>) -> anyhow::Result<()> {
    let path = resolve_level_path(root, identifier)?;
    let level = read_level(&path).with_context(|| format!("reading {}", path.display()))?;
    println!("{}", SceneInspector::summary(&level));
    print!("{}", SceneInspector::tree_dump(level.tree()));

    if let Some(node_path) = node {
        let id = level
            .tree()
            .find_path(node_path)
            .with_context(|| format!("no node at {node_path}"))?;
        if let Some(info) = SceneInspector::inspect_node(level.tree(), id) {
            println!("{info}");
        }
    }
    Ok(())
}

fn run(config: EngineConfig, identifier: &str, frames: u64, play: bool, dump: bool) -> anyhow::Result<()> {
    let dt = config.timestep;
    let mut ctx = EngineContext::new(config);
    ctx.open_level(identifier)?;
    if play {
        ctx.toggle_play_mode()?;
    }

    let mut backend = RecordingBackend::new();
    let mut faults = 0;
    for _ in 0..frames {
        backend.take();
        let report = ctx.frame(dt, &mut backend);
        if let Some(reason) = report.skipped {
            tracing::warn!(frame = report.index, ?reason, "frame skipped");
        }
        faults += report.script_faults;
    }

    println!("{}", SceneInspector::engine(&ctx));
    if let Some(level) = ctx.active_level() {
        println!("{}", SceneInspector::summary(level));
    }
    println!("draws (last frame): {}, script faults: {faults}", backend.draws().count());
    if dump {
        print!("{}", backend.to_text());
    }

    ctx.shutdown();
    Ok(())
}

fn scaffold(root: PathBuf, path: &Path) -> anyhow::Result<()> {
    let mut ctx = EngineContext::new(EngineConfig {
        project_root: root,
        ..EngineConfig::default()
    });
    let index = ctx.create_level(path)?;
    let scene_root = ctx
        .active_level()
        .map(|level| level.tree().root())
        .context("created level is not active")?;

    let camera = ctx.add_node(
        scene_root,
        "Camera",
        Transform::from_position(Vec3::new(0.0, 3.0, 10.0)),
    )?;
    ctx.add_component(camera, Box::new(Camera::default()))?;

    let sun = ctx.add_node(
        scene_root,
        "sun",
        Transform {
            position: Vec3::new(0.0, 10.0, 0.0),
            rotation: Quat::from_rotation_x(-std::f32::consts::FRAC_PI_3),
            scale: Vec3::ONE,
        },
    )?;
    let mut light = Light::default();
    light.params.shadows = true;
    ctx.add_component(sun, Box::new(light))?;

    let ball = ctx.add_node(
        scene_root,
        "ball",
        Transform::from_position(Vec3::new(0.0, 5.0, 0.0)),
    )?;
    ctx.add_component(ball, Box::new(BoxCollider::default()))?;
    ctx.add_component(ball, Box::new(Rigidbody::default()))?;

    let saved = ctx.save_level(index)?;
    println!("Created {}", saved.display());
    ctx.shutdown();
    Ok(())
}
