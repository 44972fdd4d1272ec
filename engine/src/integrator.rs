use crate::band::Regions;
use crate::config::StepConfig;
use crate::forces::Candidates;
use grid::{is_inside, Cell, LabelField, ScalarField};
use rayon::prelude::*;

/// Largest displacement, in cells, that one step may apply.
pub const MAX_DISPLACEMENT: f32 = 0.999;

/// Magnitude written into plugged cells.
pub const PLUG_MAGNITUDE: f32 = 0.5;

/// Where a level set is within its step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
	#[default]
	Idle,
	ForceEval,
	StepSizeSelect,
	Apply,
	/// One ring pass, counted from zero.
	Redistance(usize),
	Plug,
	BandUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSize {
	pub dt: f32,
	/// Largest speed magnitude after any clamping.
	pub max_delta: f32,
}

/// Chooses the time step for this frame.
///
/// With `clamp_speed` every delta is clamped to `[-1, 1]` in place and the
/// step is `max_step`. Otherwise the step shrinks so no cell moves more than
/// [`MAX_DISPLACEMENT`].
pub fn select_step<'a>(deltas: impl Iterator<Item = &'a mut f32>, config: &StepConfig) -> StepSize {
	let mut max_delta = 0.0f32;
	if config.clamp_speed {
		for delta in deltas {
			*delta = delta.clamp(-1.0, 1.0);
			max_delta = max_delta.max(delta.abs());
		}
		return StepSize { dt: config.max_step, max_delta };
	}

	for delta in deltas {
		max_delta = max_delta.max(delta.abs());
	}
	let dt = if max_delta * config.max_step > MAX_DISPLACEMENT { MAX_DISPLACEMENT / max_delta } else { config.max_step };
	StepSize { dt, max_delta }
}

/// `φ += dt · δ` over the active cells.
pub fn apply_single(field: &mut ScalarField, cells: &[Cell], deltas: &[f32], dt: f32) {
	let snapshot: &ScalarField = field;
	let updated: Vec<f32> = cells.par_iter().zip(deltas.par_iter()).map(|(cell, delta)| snapshot[*cell] + dt * delta).collect();
	for (cell, value) in cells.iter().zip(updated) {
		field[*cell] = value;
	}
}

/// Resolves the competition at one cell.
///
/// Returns the winning label and the unsigned magnitude to store, or `None`
/// when no candidate competes. Ties go to the lower label.
pub fn resolve(candidates: &Candidates, dt: f32) -> Option<(u8, f32)> {
	let mut best: Option<(u8, f32)> = None;
	let mut second: Option<f32> = None;
	for candidate in candidates.as_slice().iter().filter(|c| c.competes()) {
		let value = candidate.value + dt * candidate.delta;
		match best {
			Some((_, lowest)) if value >= lowest => {
				second = Some(second.map_or(value, |s| s.min(value)));
			}
			Some((_, lowest)) => {
				second = Some(lowest);
				best = Some((candidate.label, value));
			}
			None => best = Some((candidate.label, value)),
		}
	}

	let (label, lowest) = best?;
	// halfway between the two lowest views places the interface between them
	let magnitude = match second {
		Some(next) => (next - lowest) * 0.5,
		None => lowest.abs(),
	};
	Some((label, magnitude))
}

/// Applies every cell's competition result.
pub fn apply_multi(field: &mut ScalarField, labels: &mut LabelField, cells: &[Cell], candidates: &[Candidates], dt: f32) {
	let resolved: Vec<Option<(u8, f32)>> = candidates.par_iter().map(|c| resolve(c, dt)).collect();
	for (cell, outcome) in cells.iter().zip(resolved) {
		if let Some((label, magnitude)) = outcome {
			labels[*cell] = label;
			field[*cell] = magnitude;
		}
	}
}

/// Sub-cell interface distances of the active cells, taken once per step
/// right after the update.
pub fn interface_seeds(field: &ScalarField, regions: Regions<'_>, cells: &[Cell]) -> Vec<Option<f32>> {
	cells.par_iter().map(|cell| regions.interface_distance(field, *cell)).collect()
}

/// One Jacobi ring pass over the active cells.
///
/// Interface cells take their seed; the rest take `min |same-region
/// neighbor| + 1`, capped at `far`. Cells with no same-region neighbor are
/// left for [`plug_signed`] and [`plug_labeled`].
pub fn redistance_layer(field: &mut ScalarField, regions: Regions<'_>, cells: &[Cell], seeds: &[Option<f32>], far: f32) {
	let extents = field.extents();
	let snapshot: &ScalarField = field;
	let updated: Vec<f32> = cells
		.par_iter()
		.zip(seeds.par_iter())
		.map(|(cell, seed)| {
			let old = snapshot[*cell];
			let magnitude = match seed {
				Some(distance) => *distance,
				None => extents
					.neighbors(*cell)
					.filter(|n| regions.same(snapshot, *cell, *n))
					.map(|n| snapshot[n].abs() + 1.0)
					.fold(f32::INFINITY, f32::min),
			};
			if magnitude.is_finite() {
				regions.signed(old, magnitude.min(far))
			} else {
				old
			}
		})
		.collect();
	for (cell, value) in cells.iter().zip(updated) {
		field[*cell] = value;
	}
}

/// Flips single-phase cells that share a region with none of their
/// neighbors. Returns the number plugged.
pub fn plug_signed(field: &mut ScalarField, cells: &[Cell]) -> usize {
	let extents = field.extents();
	let snapshot: &ScalarField = field;
	let isolated: Vec<Cell> = cells
		.par_iter()
		.copied()
		.filter(|cell| {
			let inside = is_inside(snapshot[*cell]);
			extents.neighbors(*cell).count() > 0 && extents.neighbors(*cell).all(|n| is_inside(snapshot[n]) != inside)
		})
		.collect();
	for cell in isolated.iter() {
		field[*cell] = if is_inside(field[*cell]) { PLUG_MAGNITUDE } else { -PLUG_MAGNITUDE };
	}
	isolated.len()
}

/// Hands multi-phase cells with no same-label neighbor to their most common
/// neighbor label. Returns the number plugged.
pub fn plug_labeled(field: &mut ScalarField, labels: &mut LabelField, cells: &[Cell]) -> usize {
	let extents = field.extents();
	let snapshot: &LabelField = labels;
	let isolated: Vec<(Cell, u8)> = cells
		.par_iter()
		.filter_map(|cell| {
			let own = snapshot[*cell];
			let mut nearby: Vec<u8> = extents.neighbors(*cell).map(|n| snapshot[n]).collect();
			if nearby.is_empty() || nearby.contains(&own) {
				return None;
			}
			nearby.sort_unstable();
			Some((*cell, most_common(&nearby)))
		})
		.collect();
	for (cell, label) in isolated.iter() {
		labels[*cell] = *label;
		field[*cell] = PLUG_MAGNITUDE;
	}
	isolated.len()
}

/// Most frequent value of a sorted, non-empty slice; the lower value on ties.
fn most_common(sorted: &[u8]) -> u8 {
	let mut best = (sorted[0], 0usize);
	let mut run = (sorted[0], 0usize);
	for value in sorted.iter().copied() {
		if value == run.0 {
			run.1 += 1;
		} else {
			run = (value, 1);
		}
		if run.1 > best.1 {
			best = run;
		}
	}
	best.0
}
