use chrono::{DateTime, Utc};
use polygonize::{LabelRange, Mesh};
use std::sync::Arc;

/// One frame's surface as handed to a [`crate::FrameCache`]. Never mutated
/// after creation.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
	pub frame: u64,
	pub mesh: Arc<Mesh>,
	pub created_at: DateTime<Utc>,
}

impl FrameSnapshot {
	pub fn new(frame: u64, mesh: Arc<Mesh>) -> Self {
		Self { frame, mesh, created_at: Utc::now() }
	}

	/// Per-label vertex and triangle ranges; empty for single-phase meshes.
	pub fn label_ranges(&self) -> &[LabelRange] {
		&self.mesh.labels
	}

	pub fn triangle_count(&self) -> usize {
		self.mesh.triangle_count()
	}
}
