use std::path::PathBuf;

use anyhow::{bail, ensure, Context};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use nalgebra::Point3;

use indoor::{CompileOptions, LoadedWorld, World, DEFAULT_PLANE_EXTENT};
use indoor_demo::Scene;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliScene {
    #[value(name = "closed-room")]
    ClosedRoom,
    #[value(name = "open-box")]
    OpenBox,
    #[value(name = "pillar")]
    Pillar,
}

impl From<CliScene> for Scene {
    fn from(value: CliScene) -> Self {
        match value {
            CliScene::ClosedRoom => Scene::ClosedRoom,
            CliScene::OpenBox => Scene::OpenBox,
            CliScene::Pillar => Scene::Pillar,
        }
    }
}

/// indoor-demo - compile a sample level, save it and read it back
#[derive(Parser, Debug)]
#[command(name = "indoor-demo", version, about)]
struct Cli {
    /// Sample level to compile
    #[arg(long, value_enum, default_value_t = CliScene::Pillar)]
    scene: CliScene,

    /// Where to write the compiled level
    #[arg(long, value_name = "FILE", default_value = "level.bin")]
    output: PathBuf,

    /// Probe point as x,y,z. Defaults to the scene's spawn point.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    probe: Option<Vec<f64>>,

    /// Half-size of the quads laid on partition and hull planes
    #[arg(long, default_value_t = DEFAULT_PLANE_EXTENT)]
    extent: f64,

    /// Print every status message, including partition routing
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let scene = Scene::from(cli.scene);
    let probe = match cli.probe.as_deref() {
        None => scene.spawn(),
        Some(&[x, y, z]) => Point3::new(x, y, z),
        Some(other) => bail!("--probe takes three coordinates, got {}", other.len()),
    };

    let polygons = scene.polygons();
    let options = CompileOptions::new()
        .with_plane_extent(cli.extent)
        .with_entities([probe]);

    let verbose = cli.verbose;
    let mut sink = |message: &str| {
        if verbose || !is_routing(message) {
            println!("{message}");
        }
    };

    debug!("compiling {scene:?}: {} polygons, probe {probe:?}", polygons.len());
    let start = std::time::Instant::now();
    let world = World::compile_with(&polygons, &options, Some(&mut sink))
        .with_context(|| format!("compiling {scene:?}"))?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!("compiled {scene:?} in {elapsed_ms:.1}ms");
    println!("Compiled in {elapsed_ms:.1}ms");

    println!(
        "{} polygons -> {} leaves, depth {}, {} triangles, {} leaked",
        polygons.len(),
        world.leaves().count(),
        world.depth(),
        world.triangle_count(),
        world.leaked_leaves()
    );
    let polygon_stats = world.polygon_stats();
    let portal_stats = world.portal_stats();
    println!(
        "pools: {} polygons live (peak {}), {} portals live (peak {})",
        polygon_stats.live, polygon_stats.high_water, portal_stats.live, portal_stats.high_water
    );
    for report in world.entity_reports() {
        println!("probe {:?}: {:?}", report.position, report.contents);
    }

    world
        .save(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    let loaded = LoadedWorld::load(&cli.output)
        .with_context(|| format!("reading {}", cli.output.display()))?;

    ensure!(
        loaded.triangle_count() == world.triangle_count(),
        "reloaded level has {} triangles, expected {}",
        loaded.triangle_count(),
        world.triangle_count()
    );
    println!(
        "Reloaded {}: {} triangles, depth {}",
        cli.output.display(),
        loaded.triangle_count(),
        loaded.depth()
    );

    info!("wrote and reloaded {}", cli.output.display());

    if world.has_leak() {
        warn!("{} leaves reachable from outside", world.leaked_leaves());
        println!("Level leaks: the probe point is reachable from outside");
    }

    Ok(())
}

fn is_routing(message: &str) -> bool {
    matches!(message, "leaf" | "front" | "back" | "in" | "across") || message.starts_with("partition (")
}
