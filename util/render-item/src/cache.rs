pub mod lru;

use crate::snapshot::FrameSnapshot;
use std::sync::Arc;

/// A store of frame snapshots keyed by frame index.
///
/// Implementations may drop frames (eviction, disk quota); `get` on a dropped
/// frame returns `None`.
pub trait FrameCache: Send + Sync {
	/// Stores a snapshot, replacing any previous one for `index`.
	fn set(&self, index: u64, snapshot: Arc<FrameSnapshot>);

	/// Fetches a snapshot from the cache.
	fn get(&self, index: u64) -> Option<Arc<FrameSnapshot>>;
}

impl<C: FrameCache + ?Sized> FrameCache for Arc<C> {
	fn set(&self, index: u64, snapshot: Arc<FrameSnapshot>) {
		(**self).set(index, snapshot);
	}

	fn get(&self, index: u64) -> Option<Arc<FrameSnapshot>> {
		(**self).get(index)
	}
}
