use crate::Sdf;
use bevy::math::Vec3;

/// Union of two SDFs (min distance)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Union<A: Sdf, B: Sdf> {
	pub a: A,
	pub b: B,
}

impl<A: Sdf, B: Sdf> Union<A, B> {
	pub fn new(a: A, b: B) -> Self {
		Self { a, b }
	}
}

impl<A: Sdf, B: Sdf> Sdf for Union<A, B> {
	fn distance(&self, p: Vec3) -> f32 {
		self.a.distance(p).min(self.b.distance(p))
	}
}

/// Carves `b` out of `a`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Difference<A: Sdf, B: Sdf> {
	pub a: A,
	pub b: B,
}

impl<A: Sdf, B: Sdf> Difference<A, B> {
	pub fn new(a: A, b: B) -> Self {
		Self { a, b }
	}
}

impl<A: Sdf, B: Sdf> Sdf for Difference<A, B> {
	fn distance(&self, p: Vec3) -> f32 {
		self.a.distance(p).max(-self.b.distance(p))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::SphereSdf;

	#[test]
	fn test_union_and_difference() {
		let a = SphereSdf::new(Vec3::ZERO, 2.0);
		let b = SphereSdf::new(Vec3::new(3.0, 0.0, 0.0), 2.0);

		let union = Union::new(a, b);
		assert!(union.inside(Vec3::new(4.0, 0.0, 0.0)));
		assert!(union.inside(Vec3::new(-1.0, 0.0, 0.0)));

		let difference = Difference::new(a, b);
		assert!(!difference.inside(Vec3::new(1.5, 0.0, 0.0)));
		assert!(difference.inside(Vec3::new(-1.5, 0.0, 0.0)));
	}
}
