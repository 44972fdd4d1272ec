use crate::error::Result;
use crate::level_set::{LevelSet, StepReport};
use render_item::{FrameCache, FrameSnapshot, LruFrameCache, SharedMesh};
use std::sync::Arc;

/// Steps a [`LevelSet`] frame by frame until a simulated-time budget runs
/// out, publishing a mesh for every frame.
///
/// Frame 0 is the initial surface and is emitted on construction.
pub struct Simulation {
	level_set: LevelSet,
	frame: u64,
	duration: f32,
	shared: SharedMesh,
	cache: Arc<dyn FrameCache>,
}

impl Simulation {
	pub fn new(level_set: LevelSet, duration: f32, cache: Arc<dyn FrameCache>) -> Result<Self> {
		let simulation = Self { level_set, frame: 0, duration, shared: SharedMesh::new(), cache };
		simulation.emit()?;
		Ok(simulation)
	}

	/// Keeps frames in an in-memory [`LruFrameCache`].
	pub fn in_memory(level_set: LevelSet, duration: f32, capacity: usize) -> Result<Self> {
		Self::new(level_set, duration, Arc::new(LruFrameCache::new(capacity)))
	}

	pub fn level_set(&self) -> &LevelSet {
		&self.level_set
	}

	/// For changing weights or force inputs between frames.
	pub fn level_set_mut(&mut self) -> &mut LevelSet {
		&mut self.level_set
	}

	pub fn frame(&self) -> u64 {
		self.frame
	}

	pub fn time(&self) -> f32 {
		self.level_set.time()
	}

	pub fn duration(&self) -> f32 {
		self.duration
	}

	pub fn is_finished(&self) -> bool {
		self.time() >= self.duration
	}

	/// Handle on the latest mesh, for readers on other threads.
	pub fn shared_mesh(&self) -> SharedMesh {
		self.shared.clone()
	}

	pub fn cache(&self) -> Arc<dyn FrameCache> {
		Arc::clone(&self.cache)
	}

	/// Runs one frame. Returns `None` once the budget is spent.
	pub fn advance(&mut self) -> Result<Option<StepReport>> {
		if self.is_finished() {
			return Ok(None);
		}

		let every = self.level_set.config().step.reinitialize_every;
		if every > 0 && self.frame > 0 && self.frame % every == 0 {
			if let Some(stats) = self.level_set.reinitialize() {
				log::debug!("Reinitialized at frame {}: {:?}", self.frame, stats);
			}
		}

		let report = self.level_set.step();
		self.frame += 1;
		self.emit()?;
		log::info!(
			"Frame {} at t={:.3}: dt {:.4}, {} active, {} plugged",
			self.frame,
			self.time(),
			report.dt,
			report.active,
			report.plugged
		);
		Ok(Some(report))
	}

	/// Advances until simulated time reaches `time` or the budget, whichever
	/// is first. Returns the number of frames run.
	pub fn run_until(&mut self, time: f32) -> Result<usize> {
		let target = time.min(self.duration);
		let mut frames = 0;
		while self.time() < target {
			let Some(report) = self.advance()? else {
				break;
			};
			frames += 1;
			if report.dt <= 0.0 {
				log::warn!("Step size collapsed at frame {}, stopping", self.frame);
				break;
			}
		}
		Ok(frames)
	}

	/// Spends the whole budget.
	pub fn run(&mut self) -> Result<usize> {
		self.run_until(self.duration)
	}

	fn emit(&self) -> Result<()> {
		let mesh = Arc::new(self.level_set.polygonize()?);
		self.shared.publish(Arc::clone(&mesh));
		self.cache.set(self.frame, Arc::new(FrameSnapshot::new(self.frame, mesh)));
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::EvolutionConfig;
	use bevy::math::Vec3;
	use grid::Extents;
	use sdf::{GridFrame, SphereSdf};

	fn shrinking_sphere() -> Result<LevelSet> {
		let mut config = EvolutionConfig::default();
		config.step.max_step = 0.125;
		config.step.reinitialize_every = 2;
		LevelSet::from_sdf(&SphereSdf::new(Vec3::new(9.6, 9.3, 9.7), 5.0), Extents::cube(20), GridFrame::unit(), config)
	}

	#[test]
	fn test_initial_frame_is_emitted() -> Result<()> {
		let simulation = Simulation::in_memory(shrinking_sphere()?, 1.0, 8)?;
		assert_eq!(simulation.frame(), 0);
		let Some(first) = simulation.cache().get(0) else {
			panic!("frame 0 was not cached");
		};
		assert_eq!(first.frame, 0);
		assert!(first.triangle_count() > 0);
		assert_eq!(simulation.shared_mesh().snapshot().triangle_count(), first.triangle_count());
		Ok(())
	}

	#[test]
	fn test_run_spends_the_budget() -> Result<()> {
		let mut simulation = Simulation::in_memory(shrinking_sphere()?, 0.5, 8)?;
		let frames = simulation.run()?;
		assert_eq!(frames, 4);
		assert_eq!(simulation.frame(), 4);
		assert!(simulation.is_finished());
		assert!(simulation.advance()?.is_none());

		let cache = simulation.cache();
		for frame in 0..=4 {
			assert_eq!(cache.get(frame).map(|s| s.frame), Some(frame));
		}
		let last = cache.get(4).map(|s| s.mesh.signed_volume()).unwrap_or_default();
		let first = cache.get(0).map(|s| s.mesh.signed_volume()).unwrap_or_default();
		assert!(last < first);
		Ok(())
	}

	#[test]
	fn test_run_until_stops_early() -> Result<()> {
		let mut simulation = Simulation::in_memory(shrinking_sphere()?, 10.0, 2)?;
		assert_eq!(simulation.run_until(0.25)?, 2);
		assert!(!simulation.is_finished());
		assert!(simulation.cache().get(0).is_none());
		Ok(())
	}
}
