use crate::{BoxSdf, CapsuleSdf, EllipsoidSdf, Sdf, SphereSdf, TetrahedronSdf};
use bevy::math::Vec3;

/// Closed set of primitive seed shapes.
///
/// Lets callers mix primitives in one collection while the sampling loop
/// stays monomorphic over `Shape`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
	Sphere(SphereSdf),
	Ellipsoid(EllipsoidSdf),
	Capsule(CapsuleSdf),
	Box(BoxSdf),
	Tetrahedron(TetrahedronSdf),
}

impl Sdf for Shape {
	fn distance(&self, p: Vec3) -> f32 {
		match self {
			Shape::Sphere(s) => s.distance(p),
			Shape::Ellipsoid(s) => s.distance(p),
			Shape::Capsule(s) => s.distance(p),
			Shape::Box(s) => s.distance(p),
			Shape::Tetrahedron(s) => s.distance(p),
		}
	}
}

impl From<SphereSdf> for Shape {
	fn from(s: SphereSdf) -> Self {
		Shape::Sphere(s)
	}
}

impl From<EllipsoidSdf> for Shape {
	fn from(s: EllipsoidSdf) -> Self {
		Shape::Ellipsoid(s)
	}
}

impl From<CapsuleSdf> for Shape {
	fn from(s: CapsuleSdf) -> Self {
		Shape::Capsule(s)
	}
}

impl From<BoxSdf> for Shape {
	fn from(s: BoxSdf) -> Self {
		Shape::Box(s)
	}
}

impl From<TetrahedronSdf> for Shape {
	fn from(s: TetrahedronSdf) -> Self {
		Shape::Tetrahedron(s)
	}
}
