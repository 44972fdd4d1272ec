use crate::Sdf;
use bevy::math::Vec3;
use grid::{Cell, DenseGrid, Extents, LabelField, ScalarField, BACKGROUND_LABEL};

/// Distance reported for background cells when no region is given.
const UNBOUNDED: f32 = 1.0e6;

/// Placement of a grid in world space.
///
/// Sampled distances are divided by `spacing`, so fields are always in grid
/// units regardless of the world scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFrame {
	pub origin: Vec3,
	pub spacing: f32,
}

impl GridFrame {
	pub fn new(origin: Vec3, spacing: f32) -> Self {
		Self { origin, spacing }
	}

	/// Grid point `(i, j, k)` sits at world `(i, j, k)`.
	pub fn unit() -> Self {
		Self { origin: Vec3::ZERO, spacing: 1.0 }
	}

	pub fn point(&self, cell: Cell) -> Vec3 {
		self.origin + Vec3::new(cell.x as f32, cell.y as f32, cell.z as f32) * self.spacing
	}

	pub fn to_grid_units(&self, distance: f32) -> f32 {
		distance / self.spacing
	}
}

impl Default for GridFrame {
	fn default() -> Self {
		Self::unit()
	}
}

/// Samples `sdf` at every grid point (in parallel), in grid units.
pub fn sample_field<S: Sdf>(sdf: &S, extents: Extents, frame: GridFrame) -> grid::Result<ScalarField> {
	let start_time = std::time::Instant::now();
	let field = DenseGrid::from_fn(extents, |c| frame.to_grid_units(sdf.distance(frame.point(c))))?;
	log::debug!("Sampled {:?} in {:?}", extents, start_time.elapsed());
	Ok(field)
}

/// Samples labeled regions for multi-phase evolution.
///
/// Each grid point is owned by the first region containing it (or the
/// background) and stores its unsigned distance to the boundary of its
/// owner; background points store the distance to the nearest region.
pub fn sample_regions<S: Sdf>(
	regions: &[(u8, S)],
	extents: Extents,
	frame: GridFrame,
) -> grid::Result<(ScalarField, LabelField)> {
	let start_time = std::time::Instant::now();
	let samples = DenseGrid::from_fn(extents, |c| {
		let p = frame.point(c);
		let mut nearest = UNBOUNDED;
		for (label, sdf) in regions {
			let d = frame.to_grid_units(sdf.distance(p));
			if d < 0.0 {
				return (*label, -d);
			}
			nearest = nearest.min(d);
		}
		(BACKGROUND_LABEL, nearest)
	})?;
	let field = samples.map(|(_, d)| d);
	let labels = samples.map(|(l, _)| l);
	log::debug!("Sampled {} regions over {:?} in {:?}", regions.len(), extents, start_time.elapsed());
	Ok((field, labels))
}
