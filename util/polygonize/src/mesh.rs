use bevy::math::Vec3;
use std::ops::Range;

/// The part of a mesh that bounds one labeled region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRange {
	pub label: u8,
	pub vertices: Range<u32>,
	pub triangles: Range<u32>,
}

/// An indexed triangle mesh in grid units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
	pub positions: Vec<[f32; 3]>,
	/// One per position.
	pub normals: Vec<[f32; 3]>,
	/// Three per triangle.
	pub indices: Vec<u32>,
	/// Empty unless the mesh was built per label.
	pub labels: Vec<LabelRange>,
}

impl Mesh {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn vertex_count(&self) -> usize {
		self.positions.len()
	}

	pub fn triangle_count(&self) -> usize {
		self.indices.len() / 3
	}

	pub fn is_empty(&self) -> bool {
		self.indices.is_empty()
	}

	pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
		self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
	}

	pub fn label_range(&self, label: u8) -> Option<&LabelRange> {
		self.labels.iter().find(|r| r.label == label)
	}

	/// Appends `other` and records its vertices and triangles under `label`.
	pub fn append_labeled(&mut self, label: u8, other: Mesh) {
		let vertex_start = self.positions.len() as u32;
		let triangle_start = self.triangle_count() as u32;
		self.indices.extend(other.indices.iter().map(|i| i + vertex_start));
		self.positions.extend(other.positions);
		self.normals.extend(other.normals);
		self.labels.push(LabelRange {
			label,
			vertices: vertex_start..self.positions.len() as u32,
			triangles: triangle_start..self.triangle_count() as u32,
		});
	}

	/// Reverses the winding of every triangle.
	pub fn flip_winding(&mut self) {
		for triangle in self.indices.chunks_exact_mut(3) {
			triangle.swap(1, 2);
		}
	}

	/// Volume enclosed by a closed mesh. Positive when triangles wind
	/// counter-clockwise seen from outside.
	pub fn signed_volume(&self) -> f32 {
		self.triangles()
			.map(|[a, b, c]| {
				let a = Vec3::from_array(self.positions[a as usize]);
				let b = Vec3::from_array(self.positions[b as usize]);
				let c = Vec3::from_array(self.positions[c as usize]);
				a.dot(b.cross(c)) / 6.0
			})
			.sum()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn unit_tetrahedron() -> Mesh {
		Mesh {
			positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
			normals: vec![[0.0, 1.0, 0.0]; 4],
			indices: vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
			labels: Vec::new(),
		}
	}

	#[test]
	fn test_signed_volume_follows_winding() {
		let mut mesh = unit_tetrahedron();
		assert!((mesh.signed_volume() - 1.0 / 6.0).abs() < 1e-6);
		mesh.flip_winding();
		assert!((mesh.signed_volume() + 1.0 / 6.0).abs() < 1e-6);
	}

	#[test]
	fn test_append_labeled_offsets_indices() {
		let mut mesh = Mesh::new();
		mesh.append_labeled(3, unit_tetrahedron());
		mesh.append_labeled(5, unit_tetrahedron());

		assert_eq!(mesh.vertex_count(), 8);
		assert_eq!(mesh.triangle_count(), 8);
		assert_eq!(&mesh.indices[12..15], &[4, 6, 5]);
		assert_eq!(mesh.label_range(5).map(|r| r.vertices.clone()), Some(4..8));
		assert_eq!(mesh.label_range(3).map(|r| r.triangles.clone()), Some(0..4));
		assert!(mesh.label_range(1).is_none());
	}
}
