use fast_march::interface_distance_with;
use grid::{is_inside, Cell, LabelField, ScalarField};
use rayon::prelude::*;

/// Written into cells found by `add_fresh` until they are promoted. Never a
/// band value, so a tagged cell is not picked up twice.
const FRESH_TAG: f32 = f32::MAX;

/// How grid cells are grouped into regions.
#[derive(Debug, Clone, Copy)]
pub enum Regions<'a> {
	/// Single-phase: inside where the value is negative.
	Signed,
	/// Multi-phase: by label. Values are unsigned distances to the boundary
	/// of the cell's own region.
	Labeled(&'a LabelField),
}

impl Regions<'_> {
	pub fn same(&self, field: &ScalarField, a: Cell, b: Cell) -> bool {
		match self {
			Regions::Signed => is_inside(field[a]) == is_inside(field[b]),
			Regions::Labeled(labels) => labels[a] == labels[b],
		}
	}

	/// Value at `at` in the signed view around `center`. Single-phase fields
	/// are already signed; multi-phase views are negative inside the label of
	/// `center`.
	pub fn view(&self, field: &ScalarField, center: Cell, at: Cell) -> f32 {
		match self {
			Regions::Signed => field[at],
			Regions::Labeled(labels) => {
				if labels[at] == labels[center] {
					-field[at].abs()
				} else {
					field[at].abs()
				}
			}
		}
	}

	/// `magnitude` with the sign convention of the region `old` belongs to.
	pub fn signed(&self, old: f32, magnitude: f32) -> f32 {
		match self {
			Regions::Signed if is_inside(old) => -magnitude,
			_ => magnitude,
		}
	}

	/// Sub-cell distance to the interface for cells with a neighbor in
	/// another region.
	pub fn interface_distance(&self, field: &ScalarField, cell: Cell) -> Option<f32> {
		let extents = field.extents();
		if extents.neighbors(cell).all(|n| self.same(field, cell, n)) {
			return None;
		}
		let distance = interface_distance_with(extents, cell, |c| self.view(field, cell, c));
		Some(distance.map_or(0.5, |d| d.min(1.0)))
	}
}

/// The cells currently in the narrow band, in no particular order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveList {
	cells: Vec<Cell>,
}

impl ActiveList {
	pub fn cells(&self) -> &[Cell] {
		&self.cells
	}

	pub fn len(&self) -> usize {
		self.cells.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cells.is_empty()
	}
}

/// Keeps an [`ActiveList`] equal to `{c : |field(c)| <= half_width}`.
///
/// Cells outside the band always hold the signed far value
/// `±(half_width + 0.5)`, so membership can be read back from the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandManager {
	half_width: f32,
}

impl BandManager {
	pub fn new(half_width: f32) -> Self {
		Self { half_width }
	}

	pub fn half_width(&self) -> f32 {
		self.half_width
	}

	pub fn far_value(&self) -> f32 {
		self.half_width + 0.5
	}

	pub fn in_band(&self, value: f32) -> bool {
		value.abs() <= self.half_width
	}

	/// Rebuilds the band from scratch with one full scan.
	///
	/// Interface cells take their sub-cell distance, then `ceil(half_width)`
	/// rings propagate `min |same-region neighbor| + 1` outward. Every other
	/// cell is clamped to the far value.
	pub fn rebuild(&self, field: &mut ScalarField, regions: Regions<'_>, active: &mut ActiveList) {
		let start_time = std::time::Instant::now();
		let extents = field.extents();
		let snapshot: &ScalarField = field;

		// ---------- interface seeds ----------------------------------------------
		let mut magnitude: Vec<f32> = (0..extents.len())
			.into_par_iter()
			.map(|i| regions.interface_distance(snapshot, extents.cell(i)).unwrap_or(f32::INFINITY))
			.collect();

		// ---------- ring propagation (Jacobi) ------------------------------------
		let rings = self.half_width.ceil() as usize;
		for _ in 0..rings {
			magnitude = (0..extents.len())
				.into_par_iter()
				.map(|i| {
					let cell = extents.cell(i);
					extents
						.neighbors(cell)
						.filter(|n| regions.same(snapshot, cell, *n))
						.map(|n| magnitude[extents.index(n)] + 1.0)
						.fold(magnitude[i], f32::min)
				})
				.collect();
		}

		// ---------- collect ------------------------------------------------------
		let far = self.far_value();
		let values: Vec<f32> = (0..extents.len())
			.into_par_iter()
			.map(|i| {
				let m = if magnitude[i] <= self.half_width { magnitude[i] } else { far };
				regions.signed(snapshot[i], m)
			})
			.collect();
		active.cells = (0..extents.len())
			.filter(|i| magnitude[*i] <= self.half_width)
			.map(|i| extents.cell(i))
			.collect();
		field.as_mut_slice().copy_from_slice(&values);

		log::debug!(
			"Rebuilt band of {} cells over {:?} in {:?}",
			active.len(),
			extents,
			start_time.elapsed()
		);
		if active.is_empty() {
			log::warn!("Band is empty: the field has no interface");
		}
	}

	/// Drops active cells that left the band and clamps them to the far value.
	/// Returns the number removed.
	pub fn delete_stale(&self, field: &mut ScalarField, regions: Regions<'_>, active: &mut ActiveList) -> usize {
		let far = self.far_value();
		let before = active.len();
		let mut kept = Vec::with_capacity(before);
		for cell in std::mem::take(&mut active.cells) {
			let value = field[cell];
			if self.in_band(value) {
				kept.push(cell);
			} else {
				field[cell] = regions.signed(value, far);
			}
		}
		active.cells = kept;
		before - active.len()
	}

	/// Adds the cells one step outside the band that now belong in it.
	/// Returns the number added.
	///
	/// Candidates are gathered one axis offset at a time and tagged in the
	/// field, then promoted to `min |active neighbor| + 1` with the sign of
	/// the region they were in.
	pub fn add_fresh(&self, field: &mut ScalarField, regions: Regions<'_>, active: &mut ActiveList) -> usize {
		let extents = field.extents();
		let mut member = vec![false; extents.len()];
		for cell in active.cells.iter() {
			member[extents.index(*cell)] = true;
		}

		// ---------- tag ----------------------------------------------------------
		let mut fresh: Vec<(Cell, f32)> = Vec::new();
		for offset in extents.axis_offsets() {
			for cell in active.cells.iter() {
				let neighbor = *cell + *offset;
				let Some(index) = extents.checked_index(neighbor) else {
					continue;
				};
				if member[index] || field[index] == FRESH_TAG {
					continue;
				}
				if field[*cell].abs() + 1.0 <= self.half_width {
					fresh.push((neighbor, field[index]));
					field[index] = FRESH_TAG;
				}
			}
		}

		// ---------- promote ------------------------------------------------------
		let promoted: Vec<f32> = fresh
			.iter()
			.map(|(cell, old)| {
				let nearest = extents
					.neighbors(*cell)
					.filter(|n| member[extents.index(*n)])
					.map(|n| field[n].abs())
					.fold(f32::INFINITY, f32::min);
				regions.signed(*old, nearest + 1.0)
			})
			.collect();
		for ((cell, _), value) in fresh.iter().zip(promoted) {
			field[*cell] = value;
			active.cells.push(*cell);
		}
		fresh.len()
	}

	/// Whether `active` is exactly the in-band cells, without duplicates.
	pub fn is_complete(&self, field: &ScalarField, active: &ActiveList) -> bool {
		let extents = field.extents();
		let mut seen = vec![false; extents.len()];
		for cell in active.cells.iter() {
			let Some(index) = extents.checked_index(*cell) else {
				return false;
			};
			if seen[index] {
				return false;
			}
			seen[index] = true;
		}
		(0..extents.len()).all(|i| seen[i] == self.in_band(field[i]))
	}
}
