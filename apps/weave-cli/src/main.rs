use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use glam::Vec3;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use weave_crowd::{Crowd, ScenarioConfig, populate};
use weave_kernel::{Agent, PopulationSummary, SimEvent};
use weave_render::{AssetLoader, DebugTextRenderer, InMemoryAssets, Light, Renderer, default_lights};
use weave_scene::{Camera, MaterialHandle, MeshHandle, OrbitController, Projection};

#[derive(Parser)]
#[command(name = "weave-cli", about = "Headless driver for weave crowd simulations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run a headless crowd simulation
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Log a population summary every N ticks (0 disables)
        #[arg(long, default_value = "60")]
        report_every: u64,
        /// Write the final agent states as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a simulation, then print one debug text frame
    Render {
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Orbit the camera around the origin by this many radians
        #[arg(long, default_value = "0.0")]
        orbit: f32,
        /// Add a directional light shining down and forward
        #[arg(long)]
        sun: bool,
    },
}

#[derive(Args)]
struct ScenarioArgs {
    /// Scenario file (YAML, or JSON by extension)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of ticks to simulate
    #[arg(short, long, default_value = "600")]
    ticks: u64,
    /// Timestep in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,
    /// Override the number of agents
    #[arg(short, long)]
    agents: Option<usize>,
    /// Override the number of initially infected agents
    #[arg(short, long)]
    infected: Option<usize>,
    /// Override the population seed
    #[arg(short, long)]
    seed: Option<u64>,
    /// Override the half-width of the spawn square
    #[arg(long)]
    extent: Option<f32>,
}

impl ScenarioArgs {
    fn scenario(&self) -> anyhow::Result<ScenarioConfig> {
        let mut config = match &self.config {
            Some(path) => ScenarioConfig::load(path)
                .with_context(|| format!("loading scenario {}", path.display()))?,
            None => ScenarioConfig::default(),
        };
        if let Some(agents) = self.agents {
            config.population.count = agents;
        }
        if let Some(infected) = self.infected {
            config.population.initial_infected = infected;
        }
        if let Some(seed) = self.seed {
            config.population.seed = seed;
        }
        if let Some(extent) = self.extent {
            config.population.extent = extent;
        }
        config.validate().context("invalid scenario")?;
        Ok(config)
    }
}

/// Final state written by `run --output`.
#[derive(Serialize)]
struct RunOutput<'a> {
    summary: PopulationSummary,
    agents: &'a [Agent],
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Info => {
            println!("weave-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", weave_common::crate_info());
            println!("scene: {}", weave_scene::crate_info());
            println!("kernel: {}", weave_kernel::crate_info());
            println!("render: {}", weave_render::crate_info());
            println!("crowd: {}", weave_crowd::crate_info());
        }
        Commands::Run {
            scenario,
            report_every,
            output,
        } => {
            let (mut crowd, _) = build_crowd(&scenario)?;
            simulate(&mut crowd, &scenario, report_every)?;
            println!("{}", crowd.summary());
            if let Some(path) = output {
                write_output(&crowd, &path)?;
            }
        }
        Commands::Render {
            scenario,
            orbit,
            sun,
        } => {
            let (mut crowd, config) = build_crowd(&scenario)?;
            simulate(&mut crowd, &scenario, 0)?;

            let extent = config.population.extent;
            let camera = Camera::spawn(
                crowd.graph_mut(),
                Vec3::new(0.0, extent, extent * 1.5),
                Vec3::ZERO,
                Projection::default(),
            )?;
            if orbit != 0.0 {
                let mut controller =
                    OrbitController::from_camera(&camera, crowd.graph(), Vec3::ZERO)?;
                controller.rotate(orbit / controller.rotate_speed, 0.0);
                controller.apply(&camera, crowd.graph_mut())?;
            }

            let mut lights: Vec<Light> = default_lights();
            if sun {
                lights.push(Light::directional(Vec3::new(0.0, -1.0, -1.0), Vec3::ONE, 0.8));
            }
            let frame = crowd.frame(&camera, &lights)?;
            let mut renderer = DebugTextRenderer::new();
            print!("{}", renderer.render(&frame, crowd.materials()));
            println!("{}", crowd.summary());
        }
    }

    Ok(())
}

/// Crowd with the configured population, each pedestrian drawn as one cube.
fn build_crowd(args: &ScenarioArgs) -> anyhow::Result<(Crowd, ScenarioConfig)> {
    let config = args.scenario()?;
    let mut crowd = Crowd::new(config.sim.clone());
    let mut assets = InMemoryAssets::with_primitives();
    let mesh: MeshHandle = assets.load_mesh("cube")?;
    let material: MaterialHandle = assets.load_material("default", crowd.materials_mut())?;
    populate(&mut crowd, &config.population, &[(mesh, material)])?;
    Ok((crowd, config))
}

fn simulate(crowd: &mut Crowd, args: &ScenarioArgs, report_every: u64) -> anyhow::Result<()> {
    let _span = tracing::info_span!("simulate", ticks = args.ticks, dt = args.dt).entered();
    for _ in 0..args.ticks {
        let report = crowd.tick(args.dt)?;
        for event in crowd.world_mut().drain_events() {
            match event {
                SimEvent::Infected { id, tick } => tracing::debug!(?id, tick, "infected"),
                SimEvent::Recovered { id, tick } => tracing::debug!(?id, tick, "recovered"),
                SimEvent::Stopped { id, tick } => tracing::warn!(?id, tick, "agent stopped"),
                _ => {}
            }
        }
        if report_every > 0 && report.tick % report_every == 0 {
            tracing::info!("{}", crowd.summary());
        }
    }
    Ok(())
}

fn write_output(crowd: &Crowd, path: &Path) -> anyhow::Result<()> {
    let output = RunOutput {
        summary: crowd.summary(),
        agents: crowd.world().agents(),
    };
    let json = serde_json::to_string_pretty(&output)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), agents = output.agents.len(), "final state written");
    Ok(())
}
