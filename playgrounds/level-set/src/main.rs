//! Headless level-set playground.
//!
//! Seeds a surface, evolves it for a simulated-time budget and logs what
//! every frame did. Settings come from an optional TOML file, then flags.

use anyhow::Context;
use bevy::math::Vec3;
use clap::{Parser, ValueEnum};
use engine::grid::{DenseGrid, Extents};
use engine::sdf::{GridFrame, Noisy, SphereSdf, Union};
use engine::{EvolutionConfig, LevelSet, Simulation};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Seed {
	/// One sphere in the middle of the grid
	Sphere,
	/// Two overlapping spheres
	Dumbbell,
	/// A noise-displaced sphere
	Blob,
	/// Two labeled spheres in a background region
	Regions,
}

#[derive(Parser, Debug)]
#[command(name = "level-set")]
#[command(about = "Evolve a seeded surface on a narrow-band level set", long_about = None)]
struct Cli {
	/// Grid points along each axis
	#[arg(short, long, default_value = "48")]
	resolution: usize,
	/// Initial surface
	#[arg(short, long, value_enum, default_value = "dumbbell")]
	seed: Seed,
	/// Simulated time to run for
	#[arg(short, long, default_value = "5.0")]
	duration: f32,
	/// TOML file with evolution settings and force inputs
	#[arg(short, long)]
	config: Option<PathBuf>,
	/// Overrides the configured upper bound on the time step
	#[arg(long)]
	max_step: Option<f32>,
	/// Clamp speeds to [-1, 1] and always take the full step
	#[arg(long)]
	clamp_speed: bool,
	/// Seed for the blob's noise
	#[arg(long, default_value = "7")]
	noise_seed: u32,
	/// Frames kept in the in-memory cache
	#[arg(long, default_value = "16")]
	cache_frames: usize,
}

/// Contents of the `--config` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PlaygroundFile {
	evolution: EvolutionConfig,
	/// Uniform pressure over the grid.
	pressure: Option<f32>,
	/// Uniform velocity over the grid.
	velocity: Option<[f32; 3]>,
}

fn load(path: Option<&Path>) -> anyhow::Result<PlaygroundFile> {
	let Some(path) = path else {
		return Ok(PlaygroundFile::default());
	};
	let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
	toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn seed(cli: &Cli, config: EvolutionConfig) -> anyhow::Result<LevelSet> {
	let n = cli.resolution;
	let extents = Extents::cube(n);
	let frame = GridFrame::unit();
	// off-grid centers keep the surface away from grid points
	let center = Vec3::splat(n as f32 * 0.5 - 0.37);
	let radius = n as f32 * 0.2;

	let level_set = match cli.seed {
		Seed::Sphere => LevelSet::from_sdf(&SphereSdf::new(center, radius), extents, frame, config)?,
		Seed::Dumbbell => {
			let offset = Vec3::X * radius * 0.8;
			let dumbbell = Union::new(SphereSdf::new(center - offset, radius), SphereSdf::new(center + offset, radius));
			LevelSet::from_sdf(&dumbbell, extents, frame, config)?
		}
		Seed::Blob => {
			let blob = Noisy::new(SphereSdf::new(center, radius), cli.noise_seed)
				.with_frequency(0.15)
				.with_amplitude(radius * 0.25)
				.with_octaves(3);
			LevelSet::from_sdf(&blob, extents, frame, config)?
		}
		Seed::Regions => {
			let offset = Vec3::X * radius * 0.9;
			let regions =
				[(1u8, SphereSdf::new(center - offset, radius)), (2u8, SphereSdf::new(center + offset, radius))];
			LevelSet::from_regions(&regions, extents, frame, config)?
		}
	};
	Ok(level_set)
}

fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let cli = Cli::parse();
	let file = load(cli.config.as_deref())?;
	let mut config = file.evolution;
	if let Some(max_step) = cli.max_step {
		config.step.max_step = max_step;
	}
	config.step.clamp_speed |= cli.clamp_speed;

	let mut level_set = seed(&cli, config).context("seeding the level set")?;
	let extents = level_set.extents();
	if let Some(pressure) = file.pressure {
		level_set.set_pressure(Some(DenseGrid::new(extents, pressure)?))?;
	}
	if let Some(velocity) = file.velocity {
		level_set.set_velocity(Some(DenseGrid::new(extents, Vec3::from_array(velocity))?))?;
	}
	tracing::info!(
		"Seeded {:?} on {:?}: {} active cells, multi-phase {}",
		cli.seed,
		extents,
		level_set.active_cells().len(),
		level_set.is_multi_phase()
	);

	let mut simulation = Simulation::in_memory(level_set, cli.duration, cli.cache_frames)?;
	let mesh = simulation.shared_mesh();
	let start_time = std::time::Instant::now();
	let mut plugged = 0;
	while let Some(report) = simulation.advance()? {
		plugged += report.plugged;
		tracing::debug!("{:?}", report);
	}

	let last = mesh.snapshot();
	tracing::info!(
		"Ran {} frames to t={:.3} in {:?}: {} triangles, {} cells plugged, volume {:.1}",
		simulation.frame(),
		simulation.time(),
		start_time.elapsed(),
		last.triangle_count(),
		plugged,
		last.signed_volume()
	);
	Ok(())
}
