use std::collections::HashMap;

/// An undirected grid edge, keyed by the linear indices of its two grid
/// points with the smaller index first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(usize, usize);

impl EdgeKey {
	pub fn new(a: usize, b: usize) -> Self {
		if a <= b {
			Self(a, b)
		} else {
			Self(b, a)
		}
	}

	pub fn points(&self) -> (usize, usize) {
		(self.0, self.1)
	}
}

/// Assigns one vertex per crossed edge while cube results are merged.
#[derive(Debug, Default)]
pub struct EdgeSplitTable {
	vertices: HashMap<EdgeKey, u32>,
	positions: Vec<[f32; 3]>,
}

impl EdgeSplitTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Vertex index for `key`, inserting `position` on first sight.
	pub fn vertex(&mut self, key: EdgeKey, position: [f32; 3]) -> u32 {
		if let Some(index) = self.vertices.get(&key) {
			return *index;
		}
		let index = self.positions.len() as u32;
		self.positions.push(position);
		self.vertices.insert(key, index);
		index
	}

	pub fn len(&self) -> usize {
		self.positions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.positions.is_empty()
	}

	/// Vertex positions in insertion order.
	pub fn into_positions(self) -> Vec<[f32; 3]> {
		self.positions
	}
}
