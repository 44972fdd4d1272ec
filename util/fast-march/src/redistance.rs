use crate::heap::MarchQueue;
use crate::quadratic::solve_upwind;
use grid::{sign, Cell, Extents, GridAccess};
use std::collections::{BTreeSet, HashMap};

/// Per-cell state during one redistancing call. Cells with no entry are `Far`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarchTag {
	/// Final distance known.
	Alive(f32),
	/// In the queue with this tentative distance.
	NarrowBand(f32),
	Far,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedistanceStats {
	/// Cells adjacent to a sign change.
	pub seeds: usize,
	/// Cells finalized by the march, seeds included.
	pub alive: usize,
	/// Whether the march stopped at the radius with cells still queued.
	pub truncated: bool,
}

/// Sub-cell distance from `cell` to the interface, if it borders a sign change.
///
/// Each axis with a sign change contributes the fraction of a cell to the
/// nearest crossing, `v / (v - v_neighbor)`; the per-axis fractions combine as
/// `1 / sqrt(Σ 1/d²)`, which is exact for a planar interface. A cell holding
/// exactly zero is on the interface.
pub fn interface_distance<G: GridAccess + ?Sized>(field: &G, cell: Cell) -> Option<f32> {
	interface_distance_with(field.extents(), cell, |c| field.value(c))
}

/// [`interface_distance`] over values produced by `value`, for callers that
/// evaluate a derived view of a field rather than the stored values.
pub fn interface_distance_with<F: Fn(Cell) -> f32>(extents: Extents, cell: Cell, value: F) -> Option<f32> {
	let here = value(cell);
	if here == 0.0 {
		return Some(0.0);
	}

	let mut inverse_sq = 0.0f32;
	let mut crossed = false;
	for axis in 0..extents.dimensions() {
		let mut nearest: Option<f32> = None;
		for offset in [-1, 1] {
			let mut neighbor = cell;
			match axis {
				0 => neighbor.x += offset,
				1 => neighbor.y += offset,
				_ => neighbor.z += offset,
			}
			if !extents.contains(neighbor) {
				continue;
			}
			let there = value(neighbor);
			if sign(there) == sign(here) {
				continue;
			}
			let fraction = here / (here - there);
			nearest = Some(nearest.map_or(fraction, |n: f32| n.min(fraction)));
		}
		if let Some(d) = nearest {
			inverse_sq += 1.0 / (d * d);
			crossed = true;
		}
	}

	if crossed {
		Some(1.0 / inverse_sq.sqrt())
	} else {
		None
	}
}

/// Fast-marching Eikonal solver with a distance cutoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Redistancer {
	pub max_radius: f32,
}

impl Redistancer {
	pub fn new(max_radius: f32) -> Self {
		Self { max_radius }
	}

	/// Rewrites `field` as a signed distance field.
	///
	/// The sign of every cell is preserved (zero stays zero). Cells farther
	/// than `max_radius` from the interface hold `±max_radius`, and a sparse
	/// field's background is reset to the same capped value.
	pub fn redistance<G: GridAccess + ?Sized>(&self, field: &mut G) -> RedistanceStats {
		let start_time = std::time::Instant::now();
		let extents = field.extents();
		let candidates = field.stored_cells();

		// ---------- seed pass ----------------------------------------------------
		let mut seeds = BTreeSet::new();
		for cell in candidates.iter() {
			let here = sign(field.value(*cell));
			for neighbor in extents.neighbors(*cell) {
				if sign(field.value(neighbor)) != here {
					seeds.insert(extents.index(*cell));
					seeds.insert(extents.index(neighbor));
				}
			}
		}

		let mut tags: HashMap<usize, MarchTag> = HashMap::with_capacity(seeds.len() * 4);
		for index in seeds.iter() {
			let cell = extents.cell(*index);
			let distance = interface_distance(&*field, cell).unwrap_or(0.0);
			tags.insert(*index, MarchTag::Alive(distance));
		}

		// ---------- march pass ---------------------------------------------------
		let mut queue = MarchQueue::new();
		for index in seeds.iter() {
			self.update_neighbors(extents, extents.cell(*index), &mut tags, &mut queue);
		}

		// ---------- pop loop -----------------------------------------------------
		let mut alive = seeds.len();
		let mut truncated = false;
		while let Some(entry) = queue.pop() {
			match tags.get(&entry.index) {
				Some(MarchTag::NarrowBand(d)) if *d == entry.distance => {}
				_ => continue,
			}
			if entry.distance > self.max_radius {
				truncated = true;
				break;
			}
			tags.insert(entry.index, MarchTag::Alive(entry.distance));
			alive += 1;
			self.update_neighbors(extents, extents.cell(entry.index), &mut tags, &mut queue);
		}

		// ---------- sign restore -------------------------------------------------
		let mut touched: Vec<usize> = tags.keys().copied().collect();
		touched.extend(candidates.iter().map(|c| extents.index(*c)));
		touched.sort_unstable();
		touched.dedup();
		let restored: Vec<(Cell, f32)> = touched
			.into_iter()
			.map(|index| {
				let cell = extents.cell(index);
				let magnitude = match tags.get(&index) {
					Some(MarchTag::Alive(d)) => d.min(self.max_radius),
					_ => self.max_radius,
				};
				(cell, sign(field.value(cell)) * magnitude)
			})
			.collect();
		// capped first: tiles allocated by the writes below start from it
		if let Some(background) = field.background() {
			field.set_background(sign(background) * self.max_radius);
		}
		for (cell, value) in restored {
			field.set_value(cell, value);
		}

		let stats = RedistanceStats { seeds: seeds.len(), alive, truncated };
		log::debug!("Redistanced {:?} in {:?}: {:?}", extents, start_time.elapsed(), stats);
		stats
	}

	/// Recomputes the tentative distance of every non-Alive neighbor of `cell`.
	fn update_neighbors(
		&self,
		extents: Extents,
		cell: Cell,
		tags: &mut HashMap<usize, MarchTag>,
		queue: &mut MarchQueue,
	) {
		for neighbor in extents.neighbors(cell) {
			let index = extents.index(neighbor);
			let current = match tags.get(&index).copied().unwrap_or(MarchTag::Far) {
				MarchTag::Alive(_) => continue,
				MarchTag::NarrowBand(d) => d,
				MarchTag::Far => f32::INFINITY,
			};
			let trial = trial_distance(extents, neighbor, tags);
			if trial < current {
				tags.insert(index, MarchTag::NarrowBand(trial));
				queue.push(index, trial);
			}
		}
	}
}

/// Upwind distance at `cell` from its Alive axis neighbors.
fn trial_distance(extents: Extents, cell: Cell, tags: &HashMap<usize, MarchTag>) -> f32 {
	let mut axis_values = [0.0f32; 3];
	let mut count = 0;
	for axis in 0..extents.dimensions() {
		let mut best: Option<f32> = None;
		for offset in [-1, 1] {
			let mut neighbor = cell;
			match axis {
				0 => neighbor.x += offset,
				1 => neighbor.y += offset,
				_ => neighbor.z += offset,
			}
			let Some(index) = extents.checked_index(neighbor) else {
				continue;
			};
			if let Some(MarchTag::Alive(d)) = tags.get(&index) {
				best = Some(best.map_or(*d, |b: f32| b.min(*d)));
			}
		}
		if let Some(d) = best {
			axis_values[count] = d;
			count += 1;
		}
	}
	solve_upwind(&axis_values[..count])
}

#[cfg(test)]
mod tests {
	use super::*;
	use grid::{DenseGrid, ScalarField, SparseGrid};

	fn quadric_sphere(n: usize, center: f32, radius: f32) -> ScalarField {
		DenseGrid::from_fn(Extents::cube(n), |c| {
			let dx = c.x as f32 - center;
			let dy = c.y as f32 - center;
			let dz = c.z as f32 - center;
			dx * dx + dy * dy + dz * dz - radius * radius
		})
		.unwrap()
	}

	fn distance_sphere(n: usize, center: f32, radius: f32) -> ScalarField {
		DenseGrid::from_fn(Extents::cube(n), |c| {
			let dx = c.x as f32 - center;
			let dy = c.y as f32 - center;
			let dz = c.z as f32 - center;
			(dx * dx + dy * dy + dz * dz).sqrt() - radius
		})
		.unwrap()
	}

	#[test]
	fn test_quadric_sphere_scenario() {
		let mut field = quadric_sphere(32, 16.0, 10.0);
		let stats = Redistancer::new(5.0).redistance(&mut field);
		assert!(stats.seeds > 0);
		assert!(stats.truncated);

		// center is 10 cells deep, capped at the radius
		assert_eq!(field[Cell::new(16, 16, 16)], -5.0);
		assert!(field[Cell::new(26, 16, 16)].abs() <= 1.0);
		// a cell two steps outside along an axis
		assert!((field[Cell::new(28, 16, 16)] - 2.0).abs() < 0.25);
	}

	#[test]
	fn test_sign_preserved_within_radius() {
		let input = quadric_sphere(24, 11.5, 7.0);
		let mut field = input.clone();
		Redistancer::new(4.0).redistance(&mut field);
		for (before, after) in input.as_slice().iter().zip(field.as_slice()) {
			if *before != 0.0 {
				assert_eq!(sign(*before), sign(*after));
			}
			assert!(after.abs() <= 4.0);
		}
	}

	#[test]
	fn test_redistance_is_idempotent() {
		let mut once = distance_sphere(24, 11.3, 6.2);
		let redistancer = Redistancer::new(4.0);
		redistancer.redistance(&mut once);
		let mut twice = once.clone();
		redistancer.redistance(&mut twice);

		let worst = once
			.as_slice()
			.iter()
			.zip(twice.as_slice())
			.map(|(a, b)| (a - b).abs())
			.fold(0.0f32, f32::max);
		assert!(worst < 0.1, "second pass moved a value by {}", worst);
	}

	#[test]
	fn test_distance_field_stays_close_to_truth() {
		let truth = distance_sphere(24, 11.3, 6.2);
		let mut field = truth.clone();
		Redistancer::new(3.0).redistance(&mut field);

		let errors: Vec<f32> = truth
			.as_slice()
			.iter()
			.zip(field.as_slice())
			.filter(|(t, _)| t.abs() < 2.5)
			.map(|(t, f)| (t - f).abs())
			.collect();
		let mean = errors.iter().sum::<f32>() / errors.len() as f32;
		assert!(mean < 0.15, "mean error {}", mean);
	}

	#[test]
	fn test_dense_and_sparse_agree() -> Result<(), String> {
		let dense_input = distance_sphere(24, 10.6, 5.3).map(|v| if v > 3.0 { 50.0 } else { v });
		let mut sparse =
			SparseGrid::from_dense(&dense_input, 50.0).map_err(|e| e.to_string())?;
		let mut dense = dense_input.clone();

		let redistancer = Redistancer::new(2.5);
		let dense_stats = redistancer.redistance(&mut dense);
		let sparse_stats = redistancer.redistance(&mut sparse);
		assert_eq!(dense_stats, sparse_stats);

		let sparse_out = sparse.to_dense().map_err(|e| e.to_string())?;
		assert_eq!(dense.as_slice(), sparse_out.as_slice());
		Ok(())
	}

	#[test]
	fn test_sparse_march_into_unallocated_tile() -> Result<(), String> {
		// the band crosses from the allocated tile at x < 8 into an empty one
		let dense_input = DenseGrid::from_fn(Extents::planar(16, 8), |c| if c.x < 8 { c.x as f32 - 6.5 } else { 50.0 })
			.map_err(|e| e.to_string())?;
		let mut sparse = SparseGrid::from_dense(&dense_input, 50.0).map_err(|e| e.to_string())?;
		assert_eq!(sparse.tile_count(), 1);
		let mut dense = dense_input.clone();

		let redistancer = Redistancer::new(2.5);
		redistancer.redistance(&mut dense);
		redistancer.redistance(&mut sparse);

		let sparse_out = sparse.to_dense().map_err(|e| e.to_string())?;
		assert_eq!(dense.as_slice(), sparse_out.as_slice());
		assert_eq!(sparse_out[Cell::planar(12, 3)], 2.5);
		assert!(sparse_out.as_slice().iter().all(|v| v.abs() <= 2.5));
		Ok(())
	}

	#[test]
	fn test_planar_field() {
		let mut field = DenseGrid::from_fn(Extents::planar(16, 16), |c| c.x as f32 - 7.5).unwrap();
		Redistancer::new(3.0).redistance(&mut field);
		assert!((field[Cell::planar(7, 4)] + 0.5).abs() < 1e-6);
		assert!((field[Cell::planar(9, 4)] - 1.5).abs() < 1e-6);
		assert_eq!(field[Cell::planar(0, 4)], -3.0);
		assert_eq!(field[Cell::planar(15, 4)], 3.0);
	}

	#[test]
	fn test_uniform_field_has_no_seeds() {
		let mut field = DenseGrid::new(Extents::cube(4), 2.0f32).unwrap();
		let stats = Redistancer::new(1.5).redistance(&mut field);
		assert_eq!(stats, RedistanceStats::default());
		assert!(field.as_slice().iter().all(|v| *v == 1.5));
	}
}
