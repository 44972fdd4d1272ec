use crate::Sdf;
use bevy::math::Vec3;

/// Axis-aligned ellipsoid.
///
/// Uses the gradient-normalized bound `k0 (k0 - 1) / k1`, where `k0` is the
/// radius-scaled distance and `k1` the radius-squared-scaled one. Exact on
/// the axes and close elsewhere, which keeps the redistancer's seeds sane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipsoidSdf {
	pub center: Vec3,
	pub radii: Vec3,
}

impl EllipsoidSdf {
	pub fn new(center: Vec3, radii: Vec3) -> Self {
		Self { center, radii }
	}
}

impl Sdf for EllipsoidSdf {
	fn distance(&self, p: Vec3) -> f32 {
		let offset = p - self.center;
		let k0 = (offset / self.radii).length();
		let k1 = (offset / (self.radii * self.radii)).length();
		if k1 == 0.0 {
			return -self.radii.min_element();
		}
		k0 * (k0 - 1.0) / k1
	}

	fn inside(&self, p: Vec3) -> bool {
		((p - self.center) / self.radii).length_squared() < 1.0
	}
}
