use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// An integer grid coordinate. Planar grids keep `z == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Cell {
	pub x: i32,
	pub y: i32,
	pub z: i32,
}

impl Cell {
	pub const ZERO: Cell = Cell { x: 0, y: 0, z: 0 };

	pub const fn new(x: i32, y: i32, z: i32) -> Self {
		Self { x, y, z }
	}

	pub const fn planar(x: i32, y: i32) -> Self {
		Self { x, y, z: 0 }
	}

	/// Component along `axis` (0 = x, 1 = y, 2 = z).
	pub fn axis(&self, axis: usize) -> i32 {
		match axis {
			0 => self.x,
			1 => self.y,
			_ => self.z,
		}
	}
}

impl Add for Cell {
	type Output = Cell;

	fn add(self, rhs: Cell) -> Cell {
		Cell::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
	}
}

impl Sub for Cell {
	type Output = Cell;

	fn sub(self, rhs: Cell) -> Cell {
		Cell::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
	}
}

impl From<[i32; 3]> for Cell {
	fn from(c: [i32; 3]) -> Self {
		Cell::new(c[0], c[1], c[2])
	}
}

/// The six axis-aligned unit offsets, ordered `+x, -x, +y, -y, +z, -z`.
///
/// Planar grids use the first four.
pub const AXIS_OFFSETS: [Cell; 6] = [
	Cell::new(1, 0, 0),
	Cell::new(-1, 0, 0),
	Cell::new(0, 1, 0),
	Cell::new(0, -1, 0),
	Cell::new(0, 0, 1),
	Cell::new(0, 0, -1),
];

/// Fixed extents of a rectilinear grid of sample points.
///
/// Linear indices run x fastest, then y, then z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extents {
	pub nx: usize,
	pub ny: usize,
	pub nz: usize,
}

impl Extents {
	pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
		Self { nx, ny, nz }
	}

	/// A single-layer grid, evolved with the 4-connected stencil.
	pub const fn planar(nx: usize, ny: usize) -> Self {
		Self { nx, ny, nz: 1 }
	}

	pub const fn cube(n: usize) -> Self {
		Self { nx: n, ny: n, nz: n }
	}

	pub fn len(&self) -> usize {
		self.nx * self.ny * self.nz
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// 2 for planar grids, 3 otherwise.
	pub fn dimensions(&self) -> usize {
		if self.nz == 1 {
			2
		} else {
			3
		}
	}

	/// The 4- or 6-connected stencil matching this grid's dimensionality.
	pub fn axis_offsets(&self) -> &'static [Cell] {
		&AXIS_OFFSETS[..self.dimensions() * 2]
	}

	/// Number of points along `axis`.
	pub fn axis_len(&self, axis: usize) -> usize {
		match axis {
			0 => self.nx,
			1 => self.ny,
			_ => self.nz,
		}
	}

	pub fn contains(&self, cell: Cell) -> bool {
		cell.x >= 0
			&& cell.y >= 0
			&& cell.z >= 0
			&& (cell.x as usize) < self.nx
			&& (cell.y as usize) < self.ny
			&& (cell.z as usize) < self.nz
	}

	/// Linear index of an in-bounds cell. Out-of-range input yields garbage.
	pub fn index(&self, cell: Cell) -> usize {
		(cell.z as usize * self.ny + cell.y as usize) * self.nx + cell.x as usize
	}

	/// Linear index if the cell is in bounds.
	pub fn checked_index(&self, cell: Cell) -> Option<usize> {
		if self.contains(cell) {
			Some(self.index(cell))
		} else {
			None
		}
	}

	pub fn cell(&self, index: usize) -> Cell {
		let x = index % self.nx;
		let y = (index / self.nx) % self.ny;
		let z = index / (self.nx * self.ny);
		Cell::new(x as i32, y as i32, z as i32)
	}

	/// Clamps each component into the grid.
	pub fn clamp(&self, cell: Cell) -> Cell {
		Cell::new(
			cell.x.clamp(0, self.nx as i32 - 1),
			cell.y.clamp(0, self.ny as i32 - 1),
			cell.z.clamp(0, self.nz as i32 - 1),
		)
	}

	/// In-bounds axis neighbors of `cell`.
	pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
		self.axis_offsets().iter().map(move |o| cell + *o).filter(move |c| self.contains(*c))
	}

	/// Every cell of the grid in linear-index order.
	pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
		(0..self.len()).map(move |i| self.cell(i))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_index_round_trip_corners() {
		let extents = Extents::new(4, 5, 6);
		for cell in [Cell::new(0, 0, 0), Cell::new(3, 4, 5), Cell::new(1, 2, 3)] {
			assert_eq!(extents.cell(extents.index(cell)), cell);
		}
		assert_eq!(extents.index(Cell::new(1, 0, 0)), 1);
		assert_eq!(extents.index(Cell::new(0, 1, 0)), 4);
		assert_eq!(extents.index(Cell::new(0, 0, 1)), 20);
	}

	#[test]
	fn test_planar_uses_four_neighbors() {
		let extents = Extents::planar(8, 8);
		assert_eq!(extents.dimensions(), 2);
		assert_eq!(extents.neighbors(Cell::planar(3, 3)).count(), 4);
		assert_eq!(extents.neighbors(Cell::planar(0, 0)).count(), 2);
	}

	#[test]
	fn test_clamp_and_contains() {
		let extents = Extents::cube(4);
		assert!(!extents.contains(Cell::new(-1, 0, 0)));
		assert!(!extents.contains(Cell::new(0, 4, 0)));
		assert_eq!(extents.clamp(Cell::new(-3, 9, 2)), Cell::new(0, 3, 2));
		assert_eq!(extents.checked_index(Cell::new(4, 0, 0)), None);
	}
}
