use crate::Sdf;
use bevy::math::Vec3;

/// A tetrahedron bounded by the planes of its four faces.
///
/// Face normals are oriented away from the opposite vertex, so vertex order
/// does not matter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TetrahedronSdf {
	pub vertices: [Vec3; 4],
}

impl Sdf for TetrahedronSdf {
	fn distance(&self, p: Vec3) -> f32 {
		// Signed distances to the 4 faces
		let mut max_dist = -f32::INFINITY;
		let v = &self.vertices;

		for (i0, i1, i2, opposite) in [(0, 1, 2, 3), (0, 1, 3, 2), (0, 2, 3, 1), (1, 2, 3, 0)] {
			let mut n = (v[i1] - v[i0]).cross(v[i2] - v[i0]).normalize();
			if (v[opposite] - v[i0]).dot(n) > 0.0 {
				n = -n;
			}
			let d = (p - v[i0]).dot(n);
			max_dist = max_dist.max(d);
		}

		max_dist
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_centroid_is_inside_regardless_of_order() {
		let a = [Vec3::ZERO, Vec3::X * 4.0, Vec3::Y * 4.0, Vec3::Z * 4.0];
		let b = [a[1], a[0], a[2], a[3]];
		for vertices in [a, b] {
			let tet = TetrahedronSdf { vertices };
			assert!(tet.inside(Vec3::splat(0.5)));
			assert!(!tet.inside(Vec3::splat(3.0)));
		}
	}
}
