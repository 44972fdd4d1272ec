use crate::Sdf;
use bevy::math::Vec3;

/// An axis-aligned box SDF, exact inside and out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSdf {
	pub center: Vec3,
	pub half_extents: Vec3,
}

impl BoxSdf {
	pub fn new(center: Vec3, half_extents: Vec3) -> Self {
		Self { center, half_extents }
	}

	pub fn from_corners(min: Vec3, max: Vec3) -> Self {
		Self { center: (min + max) * 0.5, half_extents: (max - min) * 0.5 }
	}
}

impl Sdf for BoxSdf {
	fn distance(&self, p: Vec3) -> f32 {
		let q = (p - self.center).abs() - self.half_extents;
		q.max(Vec3::ZERO).length() + q.max_element().min(0.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_box_faces_and_corners() {
		let b = BoxSdf::from_corners(Vec3::ZERO, Vec3::splat(2.0));
		assert_eq!(b.distance(Vec3::splat(1.0)), -1.0);
		assert_eq!(b.distance(Vec3::new(3.0, 1.0, 1.0)), 1.0);
		assert!((b.distance(Vec3::new(3.0, 3.0, 1.0)) - 2.0f32.sqrt()).abs() < 1e-6);
	}
}
