use crate::Sdf;
use bevy::math::Vec3;

/// A sphere SDF
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereSdf {
	pub center: Vec3,
	pub radius: f32,
}

impl SphereSdf {
	pub fn new(center: Vec3, radius: f32) -> Self {
		Self { center, radius }
	}
}

impl Sdf for SphereSdf {
	fn distance(&self, p: Vec3) -> f32 {
		(p - self.center).length() - self.radius
	}

	fn inside(&self, p: Vec3) -> bool {
		(p - self.center).length_squared() < self.radius * self.radius
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_sphere_distance_and_inside() {
		let sphere = SphereSdf::new(Vec3::new(1.0, 0.0, 0.0), 2.0);
		assert_eq!(sphere.distance(Vec3::new(4.0, 0.0, 0.0)), 1.0);
		assert!(sphere.inside(Vec3::new(2.0, 0.0, 0.0)));
		assert!(!sphere.inside(Vec3::new(3.0, 0.0, 0.0)));
		assert!(sphere.inside_shell(Vec3::new(2.5, 0.0, 0.0), 1.0));
		assert!(!sphere.inside_shell(Vec3::new(1.0, 0.0, 0.0), 1.0));
	}
}
