use crate::tables::CUBE_CORNERS;
use bevy::math::Vec3;
use grid::{Cell, ScalarField, AXIS_OFFSETS};

/// Gradient at a grid point: central differences inside, one-sided at the
/// border, zero along degenerate axes.
pub fn gradient_at(field: &ScalarField, cell: Cell) -> Vec3 {
	let extents = field.extents();
	let mut gradient = [0.0f32; 3];
	for (axis, component) in gradient.iter_mut().enumerate() {
		if extents.axis_len(axis) < 2 {
			continue;
		}
		let hi = extents.clamp(cell + AXIS_OFFSETS[axis * 2]);
		let lo = extents.clamp(cell + AXIS_OFFSETS[axis * 2 + 1]);
		let span = (hi.axis(axis) - lo.axis(axis)) as f32;
		*component = (field[hi] - field[lo]) / span;
	}
	Vec3::from_array(gradient)
}

/// Unit normal at `p` (grid units) from trilinearly blended grid-point
/// gradients. Falls back to +Y where the gradient vanishes.
pub fn normal_at(field: &ScalarField, p: Vec3) -> Vec3 {
	let extents = field.extents();
	let upper = Vec3::new(
		(extents.nx - 1) as f32,
		(extents.ny - 1) as f32,
		(extents.nz - 1) as f32,
	);
	let p = p.clamp(Vec3::ZERO, upper);
	let base = p.floor().min(upper - Vec3::ONE).max(Vec3::ZERO);
	let t = p - base;
	let origin = Cell::new(base.x as i32, base.y as i32, base.z as i32);

	let mut gradient = Vec3::ZERO;
	for corner in CUBE_CORNERS.iter() {
		let weight = (0..3)
			.map(|axis| if corner[axis] == 1 { t[axis] } else { 1.0 - t[axis] })
			.product::<f32>();
		if weight == 0.0 {
			continue;
		}
		let cell = extents.clamp(origin + Cell::from(*corner));
		gradient += gradient_at(field, cell) * weight;
	}
	gradient.try_normalize().unwrap_or(Vec3::Y)
}

#[cfg(test)]
mod tests {
	use super::*;
	use grid::{DenseGrid, Extents};

	#[test]
	fn test_gradient_of_linear_field() -> Result<(), String> {
		let field = DenseGrid::from_fn(Extents::cube(5), |c| 2.0 * c.x as f32 - c.z as f32)
			.map_err(|e| e.to_string())?;

		assert_eq!(gradient_at(&field, Cell::new(2, 2, 2)), Vec3::new(2.0, 0.0, -1.0));
		// one-sided at the border gives the same slope
		assert_eq!(gradient_at(&field, Cell::new(0, 4, 4)), Vec3::new(2.0, 0.0, -1.0));
		Ok(())
	}

	#[test]
	fn test_normal_points_away_from_sphere() -> Result<(), String> {
		let center = Vec3::splat(5.5);
		let field = DenseGrid::from_fn(Extents::cube(12), |c| {
			(Vec3::new(c.x as f32, c.y as f32, c.z as f32) - center).length() - 3.0
		})
		.map_err(|e| e.to_string())?;

		let p = Vec3::new(8.5, 5.5, 5.5);
		let normal = normal_at(&field, p);
		assert!(normal.dot(Vec3::X) > 0.99, "normal {:?}", normal);
		Ok(())
	}

	#[test]
	fn test_flat_field_falls_back() -> Result<(), String> {
		let field = DenseGrid::new(Extents::cube(3), 1.0f32).map_err(|e| e.to_string())?;
		assert_eq!(normal_at(&field, Vec3::splat(1.0)), Vec3::Y);
		Ok(())
	}
}
