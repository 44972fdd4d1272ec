pub mod boxed;
pub mod capsule;
pub mod combinators;
pub mod ellipsoid;
pub mod noisy;
pub mod sampling;
pub mod shape;
pub mod sphere;
pub mod tetradhedron;

pub use boxed::BoxSdf;
pub use capsule::CapsuleSdf;
pub use combinators::{Difference, Union};
pub use ellipsoid::EllipsoidSdf;
pub use noisy::Noisy;
pub use sampling::{sample_field, sample_regions, GridFrame};
pub use shape::Shape;
pub use sphere::SphereSdf;
pub use tetradhedron::TetrahedronSdf;

use bevy::math::Vec3;

/// Trait for Signed Distance Fields used to seed a level set.
/// Returns the signed distance from a point to the surface:
/// - Negative: inside the shape
/// - Zero: on the surface
/// - Positive: outside the shape
pub trait Sdf: Send + Sync {
	fn distance(&self, p: Vec3) -> f32;

	/// Whether `p` is strictly inside the shape.
	fn inside(&self, p: Vec3) -> bool {
		self.distance(p) < 0.0
	}

	/// Whether `p` lies in the hollow shell of the given thickness just
	/// inside the surface.
	fn inside_shell(&self, p: Vec3, thickness: f32) -> bool {
		let d = self.distance(p);
		d < 0.0 && d > -thickness
	}
}

impl<S: Sdf + ?Sized> Sdf for &S {
	fn distance(&self, p: Vec3) -> f32 {
		(**self).distance(p)
	}
}

impl<S: Sdf + ?Sized> Sdf for Box<S> {
	fn distance(&self, p: Vec3) -> f32 {
		(**self).distance(p)
	}
}
