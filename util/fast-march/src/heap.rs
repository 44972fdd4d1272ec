use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A tentative distance for one grid cell, keyed by its linear index.
#[derive(Debug, Clone, Copy)]
pub struct HeapEntry {
	pub index: usize,
	pub distance: f32,
}

impl PartialEq for HeapEntry {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for HeapEntry {
	// distance first, then index so equal distances pop in a fixed order
	fn cmp(&self, other: &Self) -> Ordering {
		self.distance.total_cmp(&other.distance).then_with(|| self.index.cmp(&other.index))
	}
}

/// Binary min-heap of narrow-band cells.
///
/// Updates push a fresh entry; the caller discards stale entries on pop by
/// checking them against its own record of the cell's current distance.
#[derive(Debug, Default)]
pub struct MarchQueue {
	heap: BinaryHeap<Reverse<HeapEntry>>,
}

impl MarchQueue {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, index: usize, distance: f32) {
		self.heap.push(Reverse(HeapEntry { index, distance }));
	}

	pub fn pop(&mut self) -> Option<HeapEntry> {
		self.heap.pop().map(|Reverse(entry)| entry)
	}

	pub fn len(&self) -> usize {
		self.heap.len()
	}

	pub fn is_empty(&self) -> bool {
		self.heap.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_pops_in_distance_then_index_order() {
		let mut queue = MarchQueue::new();
		queue.push(7, 2.0);
		queue.push(3, 1.0);
		queue.push(1, 2.0);
		queue.push(9, 0.5);

		let order: Vec<usize> = std::iter::from_fn(|| queue.pop()).map(|e| e.index).collect();
		assert_eq!(order, vec![9, 3, 1, 7]);
		assert!(queue.is_empty());
	}
}
