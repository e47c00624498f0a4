//! Object placement as exported to the scene document.

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Transform components as the authoring tool reports them.
///
/// Rotation is stored as XYZ euler angles in radians, which is what the
/// scene document expects for `rotation`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Translation
    pub translation: Vec3,

    /// Euler rotation (XYZ order, radians)
    pub rotation: Vec3,

    /// Scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Rotation as a quaternion.
    pub fn quaternion(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quaternion(), self.translation)
    }

    /// World-space point one unit along the local -Z axis.
    ///
    /// Used as a look-at target for cameras that don't specify one.
    pub fn forward_target(&self) -> Vec3 {
        self.to_matrix().transform_point3(Vec3::NEG_Z)
    }
}
