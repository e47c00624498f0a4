//! BEX math types.
//!
//! Re-exports glam and adds the few helpers the exporter needs to describe
//! object placement and geometry extents.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use transform::Transform;
