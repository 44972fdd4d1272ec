use crate::cell::{Cell, Extents};
use crate::error::{GridError, Result};
use rayon::prelude::*;
use std::ops::{Index, IndexMut};

/// A fixed-extent dense grid of values.
///
/// `Index<Cell>` is the unchecked path (panics out of range); `get` is the
/// bounds-checked one.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseGrid<T> {
	extents: Extents,
	data: Vec<T>,
}

impl<T: Copy + Send + Sync> DenseGrid<T> {
	pub fn new(extents: Extents, fill: T) -> Result<Self> {
		if extents.is_empty() {
			return Err(GridError::EmptyExtents(extents));
		}
		Ok(Self { extents, data: vec![fill; extents.len()] })
	}

	pub fn from_vec(extents: Extents, data: Vec<T>) -> Result<Self> {
		if extents.is_empty() {
			return Err(GridError::EmptyExtents(extents));
		}
		if data.len() != extents.len() {
			return Err(GridError::LengthMismatch { expected: extents.len(), actual: data.len() });
		}
		Ok(Self { extents, data })
	}

	/// Builds a grid by evaluating `f` at every cell, in parallel.
	pub fn from_fn<F>(extents: Extents, f: F) -> Result<Self>
	where
		F: Fn(Cell) -> T + Sync,
	{
		if extents.is_empty() {
			return Err(GridError::EmptyExtents(extents));
		}
		let data = (0..extents.len()).into_par_iter().map(|i| f(extents.cell(i))).collect();
		Ok(Self { extents, data })
	}

	pub fn extents(&self) -> Extents {
		self.extents
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	pub fn get(&self, cell: Cell) -> Option<T> {
		self.extents.checked_index(cell).map(|i| self.data[i])
	}

	/// Value at `cell` with each coordinate clamped into the grid.
	pub fn get_clamped(&self, cell: Cell) -> T {
		self.data[self.extents.index(self.extents.clamp(cell))]
	}

	/// Writes `value` if `cell` is in bounds. Returns whether it was written.
	pub fn set(&mut self, cell: Cell, value: T) -> bool {
		match self.extents.checked_index(cell) {
			Some(i) => {
				self.data[i] = value;
				true
			}
			None => false,
		}
	}

	pub fn fill(&mut self, value: T) {
		self.data.fill(value);
	}

	/// Replaces the extents and reinitializes every value to `fill`.
	pub fn resize(&mut self, extents: Extents, fill: T) -> Result<()> {
		if extents.is_empty() {
			return Err(GridError::EmptyExtents(extents));
		}
		log::debug!("Resizing grid {:?} to {:?}", self.extents, extents);
		self.extents = extents;
		self.data.clear();
		self.data.resize(extents.len(), fill);
		Ok(())
	}

	pub fn as_slice(&self) -> &[T] {
		&self.data
	}

	pub fn as_mut_slice(&mut self) -> &mut [T] {
		&mut self.data
	}

	pub fn map<U, F>(&self, f: F) -> DenseGrid<U>
	where
		U: Copy + Send + Sync,
		F: Fn(T) -> U + Sync,
	{
		DenseGrid { extents: self.extents, data: self.data.par_iter().map(|v| f(*v)).collect() }
	}

	/// Fails unless `other` has the same extents as `self`.
	pub fn ensure_same_extents(&self, other: Extents) -> Result<()> {
		if self.extents != other {
			return Err(GridError::ExtentsMismatch { expected: self.extents, actual: other });
		}
		Ok(())
	}
}

impl<T> Index<Cell> for DenseGrid<T> {
	type Output = T;

	fn index(&self, cell: Cell) -> &T {
		assert!(self.extents.contains(cell), "cell {:?} outside {:?}", cell, self.extents);
		&self.data[self.extents.index(cell)]
	}
}

impl<T> IndexMut<Cell> for DenseGrid<T> {
	fn index_mut(&mut self, cell: Cell) -> &mut T {
		assert!(self.extents.contains(cell), "cell {:?} outside {:?}", cell, self.extents);
		let i = self.extents.index(cell);
		&mut self.data[i]
	}
}

impl<T> Index<usize> for DenseGrid<T> {
	type Output = T;

	fn index(&self, index: usize) -> &T {
		&self.data[index]
	}
}

impl<T> IndexMut<usize> for DenseGrid<T> {
	fn index_mut(&mut self, index: usize) -> &mut T {
		&mut self.data[index]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rejects_empty_extents() {
		assert_eq!(
			DenseGrid::new(Extents::new(0, 4, 4), 0.0f32),
			Err(GridError::EmptyExtents(Extents::new(0, 4, 4)))
		);
	}

	#[test]
	fn test_from_fn_matches_index() -> Result<()> {
		let grid = DenseGrid::from_fn(Extents::new(3, 4, 5), |c| (c.x + 10 * c.y + 100 * c.z) as f32)?;
		assert_eq!(grid[Cell::new(2, 3, 4)], 432.0);
		assert_eq!(grid.get(Cell::new(3, 0, 0)), None);
		assert_eq!(grid.get_clamped(Cell::new(9, -1, 0)), 2.0);
		Ok(())
	}

	#[test]
	fn test_set_out_of_range_is_ignored() -> Result<()> {
		let mut grid = DenseGrid::new(Extents::cube(2), 1u8)?;
		assert!(!grid.set(Cell::new(2, 0, 0), 7));
		assert!(grid.set(Cell::new(1, 1, 1), 7));
		assert_eq!(grid.as_slice().iter().filter(|v| **v == 7).count(), 1);
		Ok(())
	}

	#[test]
	fn test_resize_reinitializes() -> Result<()> {
		let mut grid = DenseGrid::new(Extents::cube(2), 1.0f32)?;
		grid.resize(Extents::planar(3, 3), -2.0)?;
		assert_eq!(grid.len(), 9);
		assert!(grid.as_slice().iter().all(|v| *v == -2.0));
		Ok(())
	}

	#[test]
	fn test_length_mismatch() {
		let err = DenseGrid::from_vec(Extents::cube(2), vec![0.0f32; 7]);
		assert_eq!(err, Err(GridError::LengthMismatch { expected: 8, actual: 7 }));
	}
}
