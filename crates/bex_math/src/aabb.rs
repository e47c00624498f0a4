use crate::{Interval, Vec3};

/// Axis-aligned bounding box.
///
/// Defined by three intervals (one per axis). Exported meshes carry their
/// box so that viewers can cull them before the geometry is loaded.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create an empty AABB (contains nothing).
    pub fn empty() -> Self {
        Self {
            x: Interval::EMPTY,
            y: Interval::EMPTY,
            z: Interval::EMPTY,
        }
    }

    /// Compute the box of a flat `[x, y, z, x, y, z, ...]` position array.
    ///
    /// A trailing partial triplet is ignored.
    pub fn from_flat_positions(positions: &[f32]) -> Self {
        let mut aabb = Self::empty();
        for p in positions.chunks_exact(3) {
            aabb.include_point(Vec3::new(p[0], p[1], p[2]));
        }
        aabb
    }

    /// Grow the box so that it contains `point`.
    pub fn include_point(&mut self, point: Vec3) {
        self.x.include(point.x);
        self.y.include(point.y);
        self.z.include(point.z);
    }

    /// Returns true if no point has been included.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Size along each axis (zero for an empty box).
    pub fn extent(&self) -> Vec3 {
        Vec3::new(self.x.size(), self.y.size(), self.z.size())
    }
}
