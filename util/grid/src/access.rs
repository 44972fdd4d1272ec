use crate::cell::{Cell, Extents};
use crate::dense::DenseGrid;

/// Get/set-by-coordinate access to a scalar field, independent of storage.
///
/// Algorithms written against this trait (the Eikonal redistancer in
/// particular) run unchanged on dense and sparse fields.
pub trait GridAccess {
	fn extents(&self) -> Extents;

	/// Value at an in-bounds cell.
	fn value(&self, cell: Cell) -> f32;

	/// Writes an in-bounds cell.
	fn set_value(&mut self, cell: Cell, value: f32);

	/// Cells whose value may differ from the background, in ascending linear
	/// index order. Dense storage reports every cell.
	fn stored_cells(&self) -> Vec<Cell>;

	/// Value reported for cells that were never written, if the storage has one.
	fn background(&self) -> Option<f32> {
		None
	}

	fn set_background(&mut self, _value: f32) {}
}

impl GridAccess for DenseGrid<f32> {
	fn extents(&self) -> Extents {
		DenseGrid::extents(self)
	}

	fn value(&self, cell: Cell) -> f32 {
		self[cell]
	}

	fn set_value(&mut self, cell: Cell, value: f32) {
		self[cell] = value;
	}

	fn stored_cells(&self) -> Vec<Cell> {
		let extents = DenseGrid::extents(self);
		extents.cells().collect()
	}
}
