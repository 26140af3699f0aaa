//! Double precision geometry used by the visibility compiler.
//!
//! All types follow the same conventions: a plane satisfies
//! `normal.dot(x) == dist`, polygons lie on the front of their own plane and
//! their vertices run clockwise when seen from the front.

mod bounding_box;
mod plane;
mod polygon;

pub use bounding_box::*;
pub use plane::*;
pub use polygon::*;

pub use glam::DVec3;

/// Default "thickness" of planes and edges, in level units.
pub const ROUND_EPSILON: f64 = 2.0;

/// Minimum distance two vertices of a valid polygon must keep.
pub const MIN_VERTEX_DIST: f64 = 10.0;
