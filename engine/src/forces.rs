use crate::config::ForceWeights;
use crate::error::{EngineError, Result};
use bevy::math::Vec3;
use grid::{sign, Cell, DenseGrid, Extents, LabelField, ScalarField};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// One velocity per grid point.
pub type VectorField = DenseGrid<Vec3>;

/// Delta given to labels without weights. Such labels never win a cell.
pub const NON_COMPETING: f32 = f32::MAX;

/// Bound on the curvature speed, in grid units.
pub const MAX_CURVATURE: f32 = 4.0;

/// Below this squared gradient the curvature denominator is degenerate.
const DEGENERATE_GRADIENT: f32 = 1.0e-5;
const DEGENERATE_SCALE: f32 = 1.0e5;

/// External force fields, sampled at each active cell. Absent fields zero
/// their term.
#[derive(Debug, Clone, Default)]
pub struct ForceInputs {
	pressure: Option<ScalarField>,
	velocity: Option<VectorField>,
}

impl ForceInputs {
	pub fn pressure(&self) -> Option<&ScalarField> {
		self.pressure.as_ref()
	}

	pub fn velocity(&self) -> Option<&VectorField> {
		self.velocity.as_ref()
	}

	pub fn set_pressure(&mut self, extents: Extents, pressure: Option<ScalarField>) -> Result<()> {
		if let Some(field) = &pressure {
			ensure_extents("pressure", extents, field.extents())?;
		}
		self.pressure = pressure;
		Ok(())
	}

	pub fn set_velocity(&mut self, extents: Extents, velocity: Option<VectorField>) -> Result<()> {
		if let Some(field) = &velocity {
			ensure_extents("velocity", extents, field.extents())?;
		}
		self.velocity = velocity;
		Ok(())
	}
}

fn ensure_extents(field: &'static str, expected: Extents, actual: Extents) -> Result<()> {
	if expected != actual {
		return Err(EngineError::ExtentsMismatch { field, expected, actual });
	}
	Ok(())
}

/// Finite differences of a field around one cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stencil {
	/// `φ(x+1) - φ(x)` per axis.
	pub forward: Vec3,
	/// `φ(x) - φ(x-1)` per axis.
	pub backward: Vec3,
	/// Central first derivatives.
	pub gradient: Vec3,
	/// `φxx`, `φyy`, `φzz`.
	pub second: Vec3,
	/// `φxy`, `φxz`, `φyz`.
	pub mixed: Vec3,
}

impl Stencil {
	/// Samples `phi` around `cell`, clamping neighbors into the grid. On a
	/// planar grid every z difference is zero.
	pub fn sample<F: Fn(Cell) -> f32>(extents: Extents, cell: Cell, phi: F) -> Self {
		let at = |dx: i32, dy: i32, dz: i32| phi(extents.clamp(cell + Cell::new(dx, dy, dz)));
		let center = at(0, 0, 0);
		let plus = Vec3::new(at(1, 0, 0), at(0, 1, 0), at(0, 0, 1));
		let minus = Vec3::new(at(-1, 0, 0), at(0, -1, 0), at(0, 0, -1));

		let forward = plus - Vec3::splat(center);
		let backward = Vec3::splat(center) - minus;
		let mixed = Vec3::new(
			(at(1, 1, 0) - at(1, -1, 0) - at(-1, 1, 0) + at(-1, -1, 0)) * 0.25,
			(at(1, 0, 1) - at(1, 0, -1) - at(-1, 0, 1) + at(-1, 0, -1)) * 0.25,
			(at(0, 1, 1) - at(0, 1, -1) - at(0, -1, 1) + at(0, -1, -1)) * 0.25,
		);
		Self { forward, backward, gradient: (forward + backward) * 0.5, second: forward - backward, mixed }
	}

	/// Mean-curvature speed `κ|∇φ|`, positive where the surface is convex.
	pub fn curvature(&self) -> f32 {
		let g = self.gradient;
		let s = self.second;
		let m = self.mixed;
		let numerator = g.x * g.x * (s.y + s.z) + g.y * g.y * (s.x + s.z) + g.z * g.z * (s.x + s.y)
			- 2.0 * (g.x * g.y * m.x + g.x * g.z * m.y + g.y * g.z * m.z);
		let denominator = g.length_squared();
		let speed = if denominator < DEGENERATE_GRADIENT {
			numerator * sign(denominator) * DEGENERATE_SCALE
		} else {
			numerator / denominator
		};
		speed.clamp(-MAX_CURVATURE, MAX_CURVATURE)
	}

	/// Upwind advection speed `-(V·∇φ)`.
	pub fn advection(&self, velocity: Vec3) -> f32 {
		let mut transport = 0.0;
		for axis in 0..3 {
			let v = velocity[axis];
			let slope = if v > 0.0 { self.backward[axis] } else { self.forward[axis] };
			transport += v * slope;
		}
		-transport
	}

	/// Balloon speed `-F|∇φ|`, with the Osher-Sethian upwind gradient
	/// magnitude chosen by the sign of `force`. Positive force expands.
	pub fn pressure(&self, force: f32) -> f32 {
		let (b, f) = (self.backward, self.forward);
		let magnitude_sq: f32 = if force > 0.0 {
			(0..3).map(|a| b[a].max(0.0).powi(2) + f[a].min(0.0).powi(2)).sum()
		} else {
			(0..3).map(|a| b[a].min(0.0).powi(2) + f[a].max(0.0).powi(2)).sum()
		};
		-force * magnitude_sq.sqrt()
	}
}

/// Weighted sum of the speed terms at `cell`.
pub fn cell_speed<F: Fn(Cell) -> f32>(
	extents: Extents,
	cell: Cell,
	phi: F,
	weights: &ForceWeights,
	inputs: &ForceInputs,
) -> f32 {
	let stencil = Stencil::sample(extents, cell, phi);
	let mut speed = 0.0;
	if weights.curvature != 0.0 {
		speed += weights.curvature * stencil.curvature();
	}
	if let (true, Some(velocity)) = (weights.advection != 0.0, inputs.velocity()) {
		speed += weights.advection * stencil.advection(velocity[cell]);
	}
	if let (true, Some(pressure)) = (weights.pressure != 0.0, inputs.pressure()) {
		speed += weights.pressure * stencil.pressure(pressure[cell] - weights.target_pressure);
	}
	speed
}

/// Recomputes one delta per active cell from the current field.
pub fn evaluate_single(
	field: &ScalarField,
	cells: &[Cell],
	weights: &ForceWeights,
	inputs: &ForceInputs,
	deltas: &mut Vec<f32>,
) {
	let start_time = std::time::Instant::now();
	let extents = field.extents();
	deltas.resize(cells.len(), 0.0);
	deltas
		.par_iter_mut()
		.zip(cells.par_iter())
		.for_each(|(delta, cell)| *delta = cell_speed(extents, *cell, |c| field[c], weights, inputs));
	log::debug!("Evaluated {} speeds in {:?}", cells.len(), start_time.elapsed());
}

/// A label's bid for one cell: its view value there and its speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelCandidate {
	pub label: u8,
	pub value: f32,
	pub delta: f32,
}

impl LabelCandidate {
	pub fn competes(&self) -> bool {
		self.delta != NON_COMPETING
	}
}

/// The labels bidding for one cell (its own and its axis neighbors'), in
/// ascending label order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidates {
	items: [LabelCandidate; 7],
	len: usize,
}

impl Default for Candidates {
	fn default() -> Self {
		let empty = LabelCandidate { label: 0, value: 0.0, delta: NON_COMPETING };
		Self { items: [empty; 7], len: 0 }
	}
}

impl Candidates {
	/// Ignored once seven candidates are held.
	pub fn push(&mut self, candidate: LabelCandidate) {
		if self.len < self.items.len() {
			self.items[self.len] = candidate;
			self.len += 1;
		}
	}

	pub fn as_slice(&self) -> &[LabelCandidate] {
		&self.items[..self.len]
	}

	pub fn as_mut_slice(&mut self) -> &mut [LabelCandidate] {
		&mut self.items[..self.len]
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}
}

/// Recomputes the candidates of every active cell.
///
/// Each label is evaluated on its own view of the field: `-|φ|` where the
/// label owns the cell and `+|φ|` elsewhere.
pub fn evaluate_multi(
	field: &ScalarField,
	labels: &LabelField,
	cells: &[Cell],
	weights: &BTreeMap<u8, ForceWeights>,
	inputs: &ForceInputs,
	deltas: &mut Vec<Candidates>,
) {
	let start_time = std::time::Instant::now();
	let extents = field.extents();
	deltas.resize(cells.len(), Candidates::default());
	deltas.par_iter_mut().zip(cells.par_iter()).for_each(|(candidates, cell)| {
		let mut nearby = [labels[*cell]; 7];
		let mut count = 1;
		for neighbor in extents.neighbors(*cell) {
			nearby[count] = labels[neighbor];
			count += 1;
		}
		let nearby = &mut nearby[..count];
		nearby.sort_unstable();

		*candidates = Candidates::default();
		let mut previous = None;
		for label in nearby.iter().copied() {
			if previous == Some(label) {
				continue;
			}
			previous = Some(label);

			let view = |c: Cell| if labels[c] == label { -field[c].abs() } else { field[c].abs() };
			let delta = match weights.get(&label) {
				Some(w) => cell_speed(extents, *cell, view, w, inputs),
				None => NON_COMPETING,
			};
			candidates.push(LabelCandidate { label, value: view(*cell), delta });
		}
	});
	log::debug!("Evaluated candidates for {} cells in {:?}", cells.len(), start_time.elapsed());
}
