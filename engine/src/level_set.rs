use crate::band::{ActiveList, BandManager, Regions};
use crate::config::{validate_step, EvolutionConfig, ForceWeights};
use crate::error::{EngineError, Result};
use crate::forces::{self, Candidates, ForceInputs, VectorField};
use crate::integrator::{self, Phase};
use fast_march::{RedistanceStats, Redistancer};
use grid::{Cell, Extents, LabelField, ScalarField};
use polygonize::{Mesh, Polygonizer, Region};
use sdf::{sample_field, sample_regions, GridFrame, Sdf};
use std::collections::BTreeMap;
use std::time::Instant;

/// What one call to [`LevelSet::step`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
	pub dt: f32,
	pub max_delta: f32,
	/// Cells that left the band.
	pub removed: usize,
	/// Cells that joined the band.
	pub added: usize,
	pub plugged: usize,
	/// Band size after the step.
	pub active: usize,
	/// Phases in the order they ran.
	pub phases: Vec<Phase>,
}

/// Single- or multi-phase state, with the speeds of the current step.
#[derive(Debug, Clone)]
enum Mode {
	Single { deltas: Vec<f32> },
	Multi { labels: LabelField, weights: BTreeMap<u8, ForceWeights>, deltas: Vec<Candidates> },
}

impl Mode {
	fn regions(&self) -> Regions<'_> {
		match self {
			Mode::Single { .. } => Regions::Signed,
			Mode::Multi { labels, .. } => Regions::Labeled(labels),
		}
	}

	/// Keeps the delta buffer one entry per active cell.
	fn resize(&mut self, len: usize) {
		match self {
			Mode::Single { deltas } => deltas.resize(len, 0.0),
			Mode::Multi { deltas, .. } => deltas.resize(len, Candidates::default()),
		}
	}
}

/// A narrow-band level set.
///
/// Single-phase sets hold a signed field, negative inside. Multi-phase sets
/// hold a label per cell and the unsigned distance to the boundary of that
/// cell's region.
#[derive(Debug, Clone)]
pub struct LevelSet {
	field: ScalarField,
	mode: Mode,
	weights: ForceWeights,
	inputs: ForceInputs,
	active: ActiveList,
	band: BandManager,
	config: EvolutionConfig,
	phase: Phase,
	time: f32,
}

impl LevelSet {
	/// Creates a single-phase level set from a signed field.
	///
	/// The field is redistanced and its band built before returning.
	pub fn new(mut field: ScalarField, config: EvolutionConfig) -> Result<Self> {
		config.validate()?;
		let band = BandManager::new(config.band.half_width);
		let stats = Redistancer::new(band.far_value()).redistance(&mut field);
		log::debug!("Initial redistance: {:?}", stats);

		let mut level_set = Self {
			field,
			mode: Mode::Single { deltas: Vec::new() },
			weights: config.weights,
			inputs: ForceInputs::default(),
			active: ActiveList::default(),
			band,
			config,
			phase: Phase::Idle,
			time: 0.0,
		};
		level_set.rebuild();
		Ok(level_set)
	}

	/// Seeds a single-phase level set from a distance function.
	pub fn from_sdf<S: Sdf>(sdf: &S, extents: Extents, frame: GridFrame, config: EvolutionConfig) -> Result<Self> {
		Self::new(sample_field(sdf, extents, frame)?, config)
	}

	/// Creates a multi-phase level set. Every label present gets the default
	/// weights from `config`.
	pub fn multi_phase(field: ScalarField, labels: LabelField, config: EvolutionConfig) -> Result<Self> {
		config.validate()?;
		if field.extents() != labels.extents() {
			return Err(EngineError::ExtentsMismatch {
				field: "labels",
				expected: field.extents(),
				actual: labels.extents(),
			});
		}
		let weights: BTreeMap<u8, ForceWeights> = labels.as_slice().iter().map(|l| (*l, config.weights)).collect();
		log::debug!("Multi-phase level set with labels {:?}", weights.keys().collect::<Vec<_>>());

		let mut level_set = Self {
			field: field.map(f32::abs),
			mode: Mode::Multi { labels, weights, deltas: Vec::new() },
			weights: config.weights,
			inputs: ForceInputs::default(),
			active: ActiveList::default(),
			band: BandManager::new(config.band.half_width),
			config,
			phase: Phase::Idle,
			time: 0.0,
		};
		level_set.rebuild();
		Ok(level_set)
	}

	/// Seeds a multi-phase level set from labeled distance functions; the
	/// first region containing a point owns it.
	pub fn from_regions<S: Sdf>(
		regions: &[(u8, S)],
		extents: Extents,
		frame: GridFrame,
		config: EvolutionConfig,
	) -> Result<Self> {
		let (field, labels) = sample_regions(regions, extents, frame)?;
		Self::multi_phase(field, labels, config)
	}

	pub fn field(&self) -> &ScalarField {
		&self.field
	}

	pub fn labels(&self) -> Option<&LabelField> {
		match &self.mode {
			Mode::Single { .. } => None,
			Mode::Multi { labels, .. } => Some(labels),
		}
	}

	pub fn is_multi_phase(&self) -> bool {
		matches!(self.mode, Mode::Multi { .. })
	}

	pub fn extents(&self) -> Extents {
		self.field.extents()
	}

	pub fn active_cells(&self) -> &[Cell] {
		self.active.cells()
	}

	pub fn config(&self) -> &EvolutionConfig {
		&self.config
	}

	pub fn weights(&self) -> &ForceWeights {
		&self.weights
	}

	/// Weights of `label`, `None` if it does not compete.
	pub fn label_weights(&self, label: u8) -> Option<&ForceWeights> {
		match &self.mode {
			Mode::Single { .. } => None,
			Mode::Multi { weights, .. } => weights.get(&label),
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Simulated time elapsed, the sum of every step's `dt`.
	pub fn time(&self) -> f32 {
		self.time
	}

	/// Whether the active list is exactly the set of in-band cells.
	pub fn band_is_complete(&self) -> bool {
		self.band.is_complete(&self.field, &self.active)
	}

	/// Replaces the weights. In multi-phase mode every competing label gets
	/// them too.
	pub fn set_weights(&mut self, weights: ForceWeights) {
		self.weights = weights;
		if let Mode::Multi { weights: per_label, .. } = &mut self.mode {
			per_label.values_mut().for_each(|w| *w = weights);
		}
	}

	/// Sets the weights of one label; `None` makes the label non-competing.
	pub fn set_label_weights(&mut self, label: u8, weights: Option<ForceWeights>) -> Result<()> {
		let Mode::Multi { weights: per_label, .. } = &mut self.mode else {
			return Err(EngineError::NotMultiPhase);
		};
		match weights {
			Some(w) => per_label.insert(label, w),
			None => per_label.remove(&label),
		};
		Ok(())
	}

	pub fn set_clamp_speed(&mut self, clamp_speed: bool) {
		self.config.step.clamp_speed = clamp_speed;
	}

	pub fn set_max_step(&mut self, max_step: f32) -> Result<()> {
		validate_step(max_step)?;
		self.config.step.max_step = max_step;
		Ok(())
	}

	pub fn set_pressure(&mut self, pressure: Option<ScalarField>) -> Result<()> {
		self.inputs.set_pressure(self.field.extents(), pressure)
	}

	pub fn set_velocity(&mut self, velocity: Option<VectorField>) -> Result<()> {
		self.inputs.set_velocity(self.field.extents(), velocity)
	}

	/// Advances the surface by one time step.
	pub fn step(&mut self) -> StepReport {
		let start_time = Instant::now();
		let mut phases = Vec::with_capacity(7 + self.config.band.max_layers);
		let Self { field, mode, weights, inputs, active, band, config, phase, time } = self;
		let cells = active.cells();

		// ---------- speeds ----------------------------------------------------
		enter(phase, &mut phases, Phase::ForceEval);
		match mode {
			Mode::Single { deltas } => forces::evaluate_single(field, cells, weights, inputs, deltas),
			Mode::Multi { labels, weights, deltas } => {
				forces::evaluate_multi(field, labels, cells, weights, inputs, deltas);
			}
		}

		enter(phase, &mut phases, Phase::StepSizeSelect);
		let size = match mode {
			Mode::Single { deltas } => integrator::select_step(deltas.iter_mut(), &config.step),
			Mode::Multi { deltas, .. } => integrator::select_step(
				deltas
					.iter_mut()
					.flat_map(|c| c.as_mut_slice().iter_mut())
					.filter(|c| c.competes())
					.map(|c| &mut c.delta),
				&config.step,
			),
		};

		// ---------- update ----------------------------------------------------
		enter(phase, &mut phases, Phase::Apply);
		match mode {
			Mode::Single { deltas } => integrator::apply_single(field, cells, deltas, size.dt),
			Mode::Multi { labels, deltas, .. } => integrator::apply_multi(field, labels, cells, deltas, size.dt),
		}

		// ---------- redistance ------------------------------------------------
		let far = band.far_value();
		let seeds = integrator::interface_seeds(field, mode.regions(), cells);
		for layer in 0..config.band.max_layers {
			enter(phase, &mut phases, Phase::Redistance(layer));
			integrator::redistance_layer(field, mode.regions(), cells, &seeds, far);
		}

		enter(phase, &mut phases, Phase::Plug);
		let plugged = match mode {
			Mode::Single { .. } => integrator::plug_signed(field, cells),
			Mode::Multi { labels, .. } => integrator::plug_labeled(field, labels, cells),
		};

		// ---------- band ------------------------------------------------------
		enter(phase, &mut phases, Phase::BandUpdate);
		let removed = band.delete_stale(field, mode.regions(), active);
		let added = band.add_fresh(field, mode.regions(), active);
		mode.resize(active.len());

		enter(phase, &mut phases, Phase::Idle);
		*time += size.dt;

		log::debug!(
			"Step dt {:.4} (max speed {:.3}): -{} +{} cells, {} plugged, {} active in {:?}",
			size.dt,
			size.max_delta,
			removed,
			added,
			plugged,
			active.len(),
			start_time.elapsed()
		);
		StepReport { dt: size.dt, max_delta: size.max_delta, removed, added, plugged, active: active.len(), phases }
	}

	/// Restores the distance property across the band.
	///
	/// Single-phase sets are fast-marched from the interface first; both
	/// modes then rebuild the band. Returns the marching stats when run.
	pub fn reinitialize(&mut self) -> Option<RedistanceStats> {
		let stats = match self.mode {
			Mode::Single { .. } => Some(Redistancer::new(self.band.far_value()).redistance(&mut self.field)),
			Mode::Multi { .. } => None,
		};
		self.rebuild();
		stats
	}

	/// Triangulates the zero level set near the band.
	///
	/// Multi-phase sets yield one labeled surface per non-background label.
	/// Planar grids yield an empty mesh.
	pub fn polygonize(&self) -> Result<Mesh> {
		if self.field.extents().dimensions() < 3 {
			log::warn!("Cannot polygonize a planar grid {:?}", self.field.extents());
			return Ok(Mesh::default());
		}
		let start_time = Instant::now();
		let polygonizer = Polygonizer::new(self.config.polygonizer);
		let region = Region::Near(self.active.cells());
		let mesh = match &self.mode {
			Mode::Single { .. } => polygonizer.polygonize(&self.field, region),
			Mode::Multi { labels, .. } => polygonizer.polygonize_labels(&self.field, labels, region)?,
		};
		log::debug!("Polygonized {} triangles in {:?}", mesh.triangle_count(), start_time.elapsed());
		Ok(mesh)
	}

	fn rebuild(&mut self) {
		let Self { field, mode, active, band, .. } = self;
		band.rebuild(field, mode.regions(), active);
		mode.resize(active.len());
	}
}

fn enter(phase: &mut Phase, trace: &mut Vec<Phase>, next: Phase) {
	*phase = next;
	trace.push(next);
}

#[cfg(test)]
mod tests {
	use super::*;
	use bevy::math::Vec3;
	use grid::{is_inside, DenseGrid};
	use sdf::{BoxSdf, Shape, SphereSdf, Union};

	fn sphere(n: usize, center: Vec3, radius: f32, config: EvolutionConfig) -> Result<LevelSet> {
		LevelSet::from_sdf(&SphereSdf::new(center, radius), Extents::cube(n), GridFrame::unit(), config)
	}

	fn inside_count(level_set: &LevelSet) -> usize {
		level_set.field().as_slice().iter().filter(|v| is_inside(**v)).count()
	}

	fn inside_centroid(level_set: &LevelSet) -> Vec3 {
		let extents = level_set.extents();
		let (sum, count) = extents
			.cells()
			.filter(|c| is_inside(level_set.field()[*c]))
			.fold((Vec3::ZERO, 0.0), |(sum, n), c| (sum + Vec3::new(c.x as f32, c.y as f32, c.z as f32), n + 1.0));
		sum / count
	}

	#[test]
	fn test_new_builds_complete_band() -> Result<()> {
		let level_set = sphere(20, Vec3::splat(9.3), 5.0, EvolutionConfig::default())?;
		assert!(level_set.band_is_complete());
		assert!(!level_set.active_cells().is_empty());
		assert_eq!(level_set.phase(), Phase::Idle);
		assert!(!level_set.is_multi_phase());
		Ok(())
	}

	#[test]
	fn test_step_runs_phases_in_order() -> Result<()> {
		let mut level_set = sphere(16, Vec3::splat(7.4), 4.0, EvolutionConfig::default())?;
		let report = level_set.step();
		assert_eq!(
			report.phases,
			vec![
				Phase::ForceEval,
				Phase::StepSizeSelect,
				Phase::Apply,
				Phase::Redistance(0),
				Phase::Redistance(1),
				Phase::Plug,
				Phase::BandUpdate,
				Phase::Idle,
			]
		);
		assert_eq!(level_set.phase(), Phase::Idle);
		assert_eq!(report.active, level_set.active_cells().len());
		assert!(level_set.band_is_complete());
		Ok(())
	}

	#[test]
	fn test_curvature_flow_shrinks_a_dumbbell() -> Result<()> {
		let mut config = EvolutionConfig::default();
		config.step.max_step = 0.12;
		let dumbbell = Union::new(
			SphereSdf::new(Vec3::new(12.2, 16.1, 15.8), 5.0),
			SphereSdf::new(Vec3::new(20.2, 16.1, 15.8), 5.0),
		);
		let mut level_set = LevelSet::from_sdf(&dumbbell, Extents::cube(32), GridFrame::unit(), config)?;

		let initial = (inside_count(&level_set), level_set.active_cells().len());
		let mut previous = initial;
		for _ in 0..25 {
			let report = level_set.step();
			assert!(report.dt <= 0.12);
			let count = (inside_count(&level_set), report.active);
			assert!(count.0 as f32 <= previous.0 as f32 * 1.02, "inside grew from {} to {}", previous.0, count.0);
			assert!(count.1 <= previous.1, "band grew from {} to {}", previous.1, count.1);
			previous = count;
			assert!(level_set.band_is_complete());
		}
		assert!((previous.0 as f32) <= initial.0 as f32 * 0.9, "{} of {}", previous.0, initial.0);
		assert!(previous.1 < initial.1);
		Ok(())
	}

	#[test]
	fn test_large_speeds_shrink_the_step() -> Result<()> {
		let mut config = EvolutionConfig::default();
		config.weights = ForceWeights { curvature: 0.0, advection: 0.0, pressure: 1.0, target_pressure: 0.0 };
		let mut level_set = sphere(24, Vec3::splat(11.6), 6.0, config)?;
		level_set.set_pressure(Some(DenseGrid::new(level_set.extents(), 10.0)?))?;

		let report = level_set.step();
		assert!(report.dt < config.step.max_step);
		assert!((report.dt * report.max_delta - integrator::MAX_DISPLACEMENT).abs() < 1e-4);

		level_set.set_clamp_speed(true);
		let report = level_set.step();
		assert_eq!(report.dt, config.step.max_step);
		assert_eq!(report.max_delta, 1.0);
		Ok(())
	}

	#[test]
	fn test_advection_moves_the_surface() -> Result<()> {
		let mut config = EvolutionConfig::default();
		config.weights = ForceWeights { curvature: 0.0, advection: 1.0, pressure: 0.0, target_pressure: 0.0 };
		let mut level_set = sphere(28, Vec3::new(10.3, 13.7, 13.4), 5.0, config)?;
		level_set.set_velocity(Some(DenseGrid::new(level_set.extents(), Vec3::X)?))?;

		let before = inside_centroid(&level_set);
		for _ in 0..6 {
			level_set.step();
		}
		let shift = inside_centroid(&level_set) - before;
		let time = level_set.time();
		assert!(time > 2.0);
		assert!((shift.x - time).abs() < 0.75, "moved {} in {}", shift.x, time);
		assert!(shift.y.abs() < 0.25 && shift.z.abs() < 0.25);
		Ok(())
	}

	#[test]
	fn test_isolated_cell_is_plugged() -> Result<()> {
		let extents = Extents::cube(9);
		let seed = Cell::new(4, 4, 4);
		let field = DenseGrid::from_fn(extents, |c| if c == seed { -0.5 } else { 2.0 })?;
		let mut config = EvolutionConfig::default();
		config.weights = ForceWeights::none();
		let mut level_set = LevelSet::new(field, config)?;
		assert!(is_inside(level_set.field()[seed]));

		let report = level_set.step();
		assert_eq!(report.plugged, 1);
		assert!(!is_inside(level_set.field()[seed]));
		Ok(())
	}

	#[test]
	fn test_flat_multi_phase_interface_is_stationary() -> Result<()> {
		let regions = [
			(1u8, Shape::from(BoxSdf::from_corners(Vec3::splat(-1.0), Vec3::new(7.5, 16.0, 16.0)))),
			(2u8, Shape::from(BoxSdf::from_corners(Vec3::new(7.5, -1.0, -1.0), Vec3::splat(16.0)))),
		];
		let mut level_set =
			LevelSet::from_regions(&regions, Extents::cube(16), GridFrame::unit(), EvolutionConfig::default())?;
		assert!(level_set.is_multi_phase());
		let field = level_set.field().clone();
		let labels = level_set.labels().cloned();

		for _ in 0..5 {
			let report = level_set.step();
			assert_eq!(report.plugged, 0);
		}
		assert_eq!(level_set.labels().cloned(), labels);
		for (after, before) in level_set.field().as_slice().iter().zip(field.as_slice()) {
			assert!((after - before).abs() < 1e-5, "{} became {}", before, after);
		}
		assert_eq!(level_set.field()[Cell::new(7, 3, 3)], 0.5);
		assert_eq!(level_set.field()[Cell::new(5, 3, 3)], 2.5);
		Ok(())
	}

	#[test]
	fn test_pressured_label_takes_cells() -> Result<()> {
		let regions = [
			(1u8, Shape::from(BoxSdf::from_corners(Vec3::splat(-1.0), Vec3::new(7.5, 16.0, 16.0)))),
			(2u8, Shape::from(BoxSdf::from_corners(Vec3::new(7.5, -1.0, -1.0), Vec3::splat(16.0)))),
		];
		let mut level_set =
			LevelSet::from_regions(&regions, Extents::cube(16), GridFrame::unit(), EvolutionConfig::default())?;
		level_set.set_label_weights(1, Some(ForceWeights { curvature: 0.0, advection: 0.0, pressure: 1.0, target_pressure: 0.0 }))?;
		level_set.set_label_weights(2, Some(ForceWeights::none()))?;
		level_set.set_pressure(Some(DenseGrid::new(level_set.extents(), 1.0)?))?;

		let owned = |ls: &LevelSet| ls.labels().map_or(0, |l| l.as_slice().iter().filter(|v| **v == 1).count());
		let before = owned(&level_set);
		for _ in 0..6 {
			level_set.step();
		}
		assert!(owned(&level_set) > before);
		assert!(level_set.band_is_complete());
		Ok(())
	}

	#[test]
	fn test_non_competing_labels_keep_interior_cells() -> Result<()> {
		let regions = [(3u8, Shape::from(SphereSdf::new(Vec3::splat(7.6), 4.0)))];
		let mut level_set =
			LevelSet::from_regions(&regions, Extents::cube(16), GridFrame::unit(), EvolutionConfig::default())?;
		level_set.set_label_weights(3, None)?;
		assert_eq!(level_set.label_weights(3), None);

		let center = Cell::new(8, 8, 8);
		level_set.step();
		assert_eq!(level_set.labels().map(|l| l[center]), Some(3));
		Ok(())
	}

	#[test]
	fn test_single_phase_rejects_label_weights() -> Result<()> {
		let mut level_set = sphere(12, Vec3::splat(5.5), 3.0, EvolutionConfig::default())?;
		assert!(matches!(level_set.set_label_weights(1, None), Err(EngineError::NotMultiPhase)));
		assert!(matches!(level_set.set_max_step(0.0), Err(EngineError::InvalidStep(_))));
		assert!(matches!(
			level_set.set_pressure(Some(DenseGrid::new(Extents::cube(4), 0.0)?)),
			Err(EngineError::ExtentsMismatch { field: "pressure", .. })
		));
		Ok(())
	}

	#[test]
	fn test_polygonize_encloses_the_sphere() -> Result<()> {
		let mut level_set = sphere(20, Vec3::new(9.4, 9.7, 9.2), 5.0, EvolutionConfig::default())?;
		let mesh = level_set.polygonize()?;
		let expected = 4.0 / 3.0 * std::f32::consts::PI * 125.0;
		assert!((mesh.signed_volume() - expected).abs() / expected < 0.1);

		level_set.step();
		assert!(level_set.reinitialize().is_some());
		assert!(level_set.band_is_complete());
		assert!(!level_set.polygonize()?.is_empty());
		Ok(())
	}

	#[test]
	fn test_multi_phase_meshes_each_label() -> Result<()> {
		let regions = [
			(1u8, SphereSdf::new(Vec3::new(6.3, 9.6, 9.4), 3.5)),
			(2u8, SphereSdf::new(Vec3::new(13.6, 9.6, 9.4), 3.5)),
		];
		let level_set =
			LevelSet::from_regions(&regions, Extents::cube(20), GridFrame::unit(), EvolutionConfig::default())?;
		let mesh = level_set.polygonize()?;
		assert_eq!(mesh.labels.iter().map(|r| r.label).collect::<Vec<_>>(), vec![1, 2]);
		assert!(mesh.signed_volume() > 0.0);
		Ok(())
	}

	#[test]
	fn test_planar_grid_gives_empty_mesh() -> Result<()> {
		let field = DenseGrid::from_fn(Extents::planar(12, 12), |c| c.x as f32 - 5.5)?;
		let mut level_set = LevelSet::new(field, EvolutionConfig::default())?;
		level_set.step();
		assert!(level_set.polygonize()?.is_empty());
		Ok(())
	}
}
