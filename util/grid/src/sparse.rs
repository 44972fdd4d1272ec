use crate::access::GridAccess;
use crate::cell::{Cell, Extents};
use crate::dense::DenseGrid;
use crate::error::{GridError, Result};
use std::collections::HashMap;

/// Edge length of a tile along each axis (planar grids use single-layer tiles).
pub const TILE: usize = 8;

/// A tiled scalar field that only allocates tiles that have been written
/// with something other than the background value.
///
/// Changing the background only affects unallocated tiles; allocated tiles
/// keep whatever was written to them.
#[derive(Debug, Clone)]
pub struct SparseGrid {
	extents: Extents,
	background: f32,
	tile_dims: [usize; 3],
	tiles: HashMap<Cell, Box<[f32]>>,
}

impl SparseGrid {
	pub fn new(extents: Extents, background: f32) -> Result<Self> {
		if extents.is_empty() {
			return Err(GridError::EmptyExtents(extents));
		}
		let tile_z = if extents.dimensions() == 2 { 1 } else { TILE };
		Ok(Self { extents, background, tile_dims: [TILE, TILE, tile_z], tiles: HashMap::new() })
	}

	/// Copies a dense field, allocating only tiles holding a non-background value.
	pub fn from_dense(grid: &DenseGrid<f32>, background: f32) -> Result<Self> {
		let start_time = std::time::Instant::now();
		let mut sparse = Self::new(grid.extents(), background)?;
		for (i, value) in grid.as_slice().iter().enumerate() {
			if *value != background {
				sparse.set_value(grid.extents().cell(i), *value);
			}
		}
		log::debug!(
			"Tiled {:?} into {} tiles in {:?}",
			grid.extents(),
			sparse.tile_count(),
			start_time.elapsed()
		);
		Ok(sparse)
	}

	pub fn to_dense(&self) -> Result<DenseGrid<f32>> {
		DenseGrid::from_fn(self.extents, |c| self.value(c))
	}

	pub fn tile_count(&self) -> usize {
		self.tiles.len()
	}

	fn tile_volume(&self) -> usize {
		self.tile_dims[0] * self.tile_dims[1] * self.tile_dims[2]
	}

	fn locate(&self, cell: Cell) -> (Cell, usize) {
		let [tx, ty, tz] = self.tile_dims;
		let tile = Cell::new(
			cell.x / tx as i32,
			cell.y / ty as i32,
			cell.z / tz as i32,
		);
		let lx = cell.x as usize % tx;
		let ly = cell.y as usize % ty;
		let lz = cell.z as usize % tz;
		(tile, (lz * ty + ly) * tx + lx)
	}
}

impl GridAccess for SparseGrid {
	fn extents(&self) -> Extents {
		self.extents
	}

	fn value(&self, cell: Cell) -> f32 {
		let (tile, local) = self.locate(cell);
		self.tiles.get(&tile).map_or(self.background, |t| t[local])
	}

	fn set_value(&mut self, cell: Cell, value: f32) {
		let (tile, local) = self.locate(cell);
		if let Some(t) = self.tiles.get_mut(&tile) {
			t[local] = value;
			return;
		}
		if value == self.background {
			return;
		}
		let mut t = vec![self.background; self.tile_volume()].into_boxed_slice();
		t[local] = value;
		self.tiles.insert(tile, t);
	}

	fn stored_cells(&self) -> Vec<Cell> {
		let [tx, ty, tz] = self.tile_dims;
		let mut cells = Vec::with_capacity(self.tiles.len() * self.tile_volume());
		for tile in self.tiles.keys() {
			for lz in 0..tz {
				for ly in 0..ty {
					for lx in 0..tx {
						let cell = Cell::new(
							tile.x * tx as i32 + lx as i32,
							tile.y * ty as i32 + ly as i32,
							tile.z * tz as i32 + lz as i32,
						);
						if self.extents.contains(cell) {
							cells.push(cell);
						}
					}
				}
			}
		}
		cells.sort_by_key(|c| self.extents.index(*c));
		cells
	}

	fn background(&self) -> Option<f32> {
		Some(self.background)
	}

	fn set_background(&mut self, value: f32) {
		self.background = value;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_background_writes_do_not_allocate() -> Result<()> {
		let mut grid = SparseGrid::new(Extents::cube(32), 5.0)?;
		grid.set_value(Cell::new(3, 3, 3), 5.0);
		assert_eq!(grid.tile_count(), 0);
		grid.set_value(Cell::new(3, 3, 3), -1.0);
		assert_eq!(grid.tile_count(), 1);
		assert_eq!(grid.value(Cell::new(3, 3, 3)), -1.0);
		assert_eq!(grid.value(Cell::new(4, 3, 3)), 5.0);
		assert_eq!(grid.value(Cell::new(20, 20, 20)), 5.0);
		Ok(())
	}

	#[test]
	fn test_dense_round_trip_keeps_values() -> Result<()> {
		let dense = DenseGrid::from_fn(Extents::new(10, 9, 3), |c| {
			if c.x < 2 {
				(c.x + c.y + c.z) as f32
			} else {
				100.0
			}
		})?;
		let sparse = SparseGrid::from_dense(&dense, 100.0)?;
		assert_eq!(sparse.tile_count(), 2);
		assert_eq!(sparse.to_dense()?, dense);
		Ok(())
	}

	#[test]
	fn test_stored_cells_sorted_and_clipped() -> Result<()> {
		let mut grid = SparseGrid::new(Extents::planar(10, 10), 1.0)?;
		grid.set_value(Cell::planar(9, 9), 0.0);
		grid.set_value(Cell::planar(0, 0), 0.0);
		let cells = grid.stored_cells();
		// Two tiles: 8x8 at the origin and 2x2 clipped at the corner.
		assert_eq!(cells.len(), 64 + 4);
		assert!(cells.windows(2).all(|w| grid.extents().index(w[0]) < grid.extents().index(w[1])));
		Ok(())
	}
}
