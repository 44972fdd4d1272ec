//! Extracts a triangle mesh from the zero level of a scalar field.
//!
//! Both marching cubes and marching tetrahedra share one pipeline: cubes are
//! triangulated in parallel, then merged sequentially so that every crossed
//! grid edge yields exactly one vertex.

pub mod config;
pub mod edge;
pub mod mesh;
pub mod normals;
pub mod polygonizer;
pub mod tables;

pub use config::{Method, PolygonizerConfig, Winding};
pub use edge::{EdgeKey, EdgeSplitTable};
pub use mesh::{LabelRange, Mesh};
pub use polygonizer::{Polygonizer, Region};
pub use tables::{CaseTables, STANDARD_TABLES};
