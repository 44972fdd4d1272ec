use serde::{Deserialize, Serialize};

/// Cell decomposition used to triangulate the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Method {
	#[default]
	MarchingCubes,
	/// Six tetrahedra per cube. No ambiguous cases, more triangles.
	MarchingTetrahedra,
}

/// Triangle winding as seen from outside the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Winding {
	/// Outward normals by the right-hand rule.
	#[default]
	CounterClockwise,
	Clockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonizerConfig {
	/// Values strictly below `iso` are inside.
	pub iso: f32,
	pub method: Method,
	pub winding: Winding,
}

impl Default for PolygonizerConfig {
	fn default() -> Self {
		Self { iso: 0.0, method: Method::default(), winding: Winding::default() }
	}
}

impl PolygonizerConfig {
	pub fn with_method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn with_winding(mut self, winding: Winding) -> Self {
		self.winding = winding;
		self
	}

	pub fn with_iso(mut self, iso: f32) -> Self {
		self.iso = iso;
		self
	}
}
