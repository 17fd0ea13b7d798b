//! # engine_app: Host
//!
//! Runs the demo particle simulation on a [`SystemsPipeline`].
//!
//! ## Startup Sequence
//!
//! 1. Load the JSON config (`--config`), if given, apply CLI overrides
//!    (`--world-config` replaces the `world` section), and validate.
//! 2. Build the default world and register the demo systems.
//! 3. Run the tick loop: init, ticks, destroy.

mod config;
mod demo;
mod tick;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_ecs::{World, WorldConfig};
use engine_system::SystemsPipeline;

use config::AppConfig;
use tick::TickLoop;

#[derive(Parser)]
#[command(name = "engine_app", about = "ECS demo host")]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a JSON world config file, replacing the `world` section
    #[arg(short, long)]
    world_config: Option<PathBuf>,

    /// Number of ticks to run (0 = unlimited)
    #[arg(short = 'n', long)]
    ticks: Option<u64>,

    /// Target ticks per second
    #[arg(short, long)]
    tick_rate: Option<f64>,

    /// Run ticks back to back instead of in real time
    #[arg(long)]
    simulated: bool,
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    if let Some(path) = &args.world_config {
        config.world = WorldConfig::from_path(path)?;
    }
    if let Some(ticks) = args.ticks {
        config.tick.max_ticks = ticks;
    }
    if let Some(rate) = args.tick_rate {
        config.tick.tick_rate = rate;
    }
    if args.simulated {
        config.tick.realtime = false;
    }
    config.validate()?;

    info!(
        config = %serde_json::to_string(&config)?,
        "engine host starting"
    );

    let mut pipeline = SystemsPipeline::new(World::new(config.world));
    demo::install(&mut pipeline, &config.demo);

    let mut tick_loop = TickLoop::new(config.tick, pipeline);
    tick_loop.run()?;

    info!(
        ticks = tick_loop.tick_id(),
        fixed_steps = tick_loop.fixed_steps(),
        entities = tick_loop.pipeline().world().entity_count(),
        "engine host shut down"
    );
    Ok(())
}
