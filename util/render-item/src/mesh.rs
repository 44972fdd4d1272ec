use polygonize::Mesh;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The most recently published mesh, shared between the stepping thread and
/// readers.
///
/// Readers take an `Arc` under the lock and release it immediately, so a
/// publish never waits on a slow reader.
#[derive(Debug, Clone, Default)]
pub struct SharedMesh {
	current: Arc<Mutex<Arc<Mesh>>>,
}

impl SharedMesh {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn publish(&self, mesh: Arc<Mesh>) {
		*self.lock() = mesh;
	}

	pub fn snapshot(&self) -> Arc<Mesh> {
		Arc::clone(&self.lock())
	}

	fn lock(&self) -> MutexGuard<'_, Arc<Mesh>> {
		// a panicking writer leaves a whole Arc behind, never a torn mesh
		self.current.lock().unwrap_or_else(PoisonError::into_inner)
	}
}
