//! Hand-off of evolved surfaces to whatever consumes them.
//!
//! The engine publishes each frame's mesh into a [`SharedMesh`] for live
//! readers and emits an immutable [`FrameSnapshot`] into a [`FrameCache`].

pub mod cache;
pub mod mesh;
pub mod snapshot;

pub use cache::{lru::LruFrameCache, FrameCache};
pub use mesh::SharedMesh;
pub use snapshot::FrameSnapshot;
