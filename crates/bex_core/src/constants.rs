//! Numeric codes used by the scene document format.

// Animation data types
pub const ANIMATION_TYPE_FLOAT: u32 = 0;
pub const ANIMATION_TYPE_VECTOR3: u32 = 1;
pub const ANIMATION_TYPE_QUATERNION: u32 = 2;
pub const ANIMATION_TYPE_MATRIX: u32 = 3;

// Animation loop modes
pub const ANIMATION_LOOP_RELATIVE: u32 = 0;
pub const ANIMATION_LOOP_CYCLE: u32 = 1;
pub const ANIMATION_LOOP_CONSTANT: u32 = 2;

// Binary attribute element types
pub const BINARY_DATA_INT: u32 = 0;
pub const BINARY_DATA_FLOAT: u32 = 1;

// Light types
pub const LIGHT_TYPE_POINT: u32 = 0;
pub const LIGHT_TYPE_DIRECTIONAL: u32 = 1;
pub const LIGHT_TYPE_SPOT: u32 = 2;
pub const LIGHT_TYPE_HEMISPHERIC: u32 = 3;
