use crate::cache::FrameCache;
use crate::snapshot::FrameSnapshot;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct LruState {
	entries: HashMap<u64, Arc<FrameSnapshot>>,
	/// Least recently used at the front.
	order: VecDeque<u64>,
}

impl LruState {
	fn touch(&mut self, index: u64) {
		if let Some(position) = self.order.iter().position(|i| *i == index) {
			self.order.remove(position);
		}
		self.order.push_back(index);
	}
}

/// In-memory [`FrameCache`] holding at most `capacity` frames, evicting the
/// least recently stored or fetched one.
#[derive(Debug, Clone)]
pub struct LruFrameCache {
	capacity: usize,
	state: Arc<Mutex<LruState>>,
}

impl LruFrameCache {
	/// A zero capacity is raised to one.
	pub fn new(capacity: usize) -> Self {
		Self { capacity: capacity.max(1), state: Arc::new(Mutex::new(LruState::default())) }
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn len(&self) -> usize {
		self.lock().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Cached frame indices, least recently used first.
	pub fn frames(&self) -> Vec<u64> {
		self.lock().order.iter().copied().collect()
	}

	fn lock(&self) -> MutexGuard<'_, LruState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

impl Default for LruFrameCache {
	fn default() -> Self {
		Self::new(DEFAULT_CAPACITY)
	}
}

impl FrameCache for LruFrameCache {
	fn set(&self, index: u64, snapshot: Arc<FrameSnapshot>) {
		let mut state = self.lock();
		state.entries.insert(index, snapshot);
		state.touch(index);
		while state.entries.len() > self.capacity {
			let Some(evicted) = state.order.pop_front() else {
				break;
			};
			state.entries.remove(&evicted);
			log::debug!("Evicted frame {} from cache", evicted);
		}
	}

	fn get(&self, index: u64) -> Option<Arc<FrameSnapshot>> {
		let mut state = self.lock();
		let snapshot = state.entries.get(&index).cloned()?;
		state.touch(index);
		Some(snapshot)
	}
}
