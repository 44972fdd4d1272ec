use crate::Sdf;
use bevy::math::Vec3;

/// Points within `radius` of the segment `start..end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleSdf {
	pub start: Vec3,
	pub end: Vec3,
	pub radius: f32,
}

impl CapsuleSdf {
	pub fn new(start: Vec3, end: Vec3, radius: f32) -> Self {
		Self { start, end, radius }
	}

	/// Capsule standing on `base` along +y, `height` tall including its caps.
	pub fn upright(base: Vec3, height: f32, radius: f32) -> Self {
		let length = (height - 2.0 * radius).max(0.0);
		let start = base + Vec3::Y * radius;
		Self { start, end: start + Vec3::Y * length, radius }
	}

	/// Closest point to `p` on the core segment. A degenerate segment is a
	/// sphere around `start`.
	pub fn segment_point(&self, p: Vec3) -> Vec3 {
		let axis = self.end - self.start;
		let length_sq = axis.length_squared();
		if length_sq == 0.0 {
			return self.start;
		}
		let t = ((p - self.start).dot(axis) / length_sq).clamp(0.0, 1.0);
		self.start + axis * t
	}
}

impl Sdf for CapsuleSdf {
	fn distance(&self, p: Vec3) -> f32 {
		p.distance(self.segment_point(p)) - self.radius
	}
}
