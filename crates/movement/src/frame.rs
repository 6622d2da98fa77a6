//! Orientation helpers.
//!
//! World is Y-up. A body's local X axis is forward, Y is up and Z is
//! right, so yaw `θ` faces `(cos θ, 0, sin θ)`.

use glam::{Mat3, Quat, Vec3};

/// Drop the vertical component.
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Look direction for a yaw in degrees.
pub fn yaw_forward(yaw_degrees: f32) -> Vec3 {
    let (sin, cos) = yaw_degrees.to_radians().sin_cos();
    Vec3::new(cos, 0.0, sin)
}

/// Right vector for a yaw in degrees.
pub fn yaw_right(yaw_degrees: f32) -> Vec3 {
    let (sin, cos) = yaw_degrees.to_radians().sin_cos();
    Vec3::new(-sin, 0.0, cos)
}

/// Upright body rotation facing a yaw in degrees.
pub fn yaw_rotation(yaw_degrees: f32) -> Quat {
    Quat::from_rotation_y(-yaw_degrees.to_radians())
}

/// Forward axis of a body rotation.
#[inline]
pub fn body_forward(rotation: Quat) -> Vec3 {
    rotation * Vec3::X
}

/// Right axis of a body rotation.
#[inline]
pub fn body_right(rotation: Quat) -> Vec3 {
    rotation * Vec3::Z
}

/// Rotation whose forward axis is exactly `forward` and whose up axis is
/// `up` made perpendicular to it.
///
/// Returns `None` when `forward` is zero or parallel to `up`.
pub fn rotation_from_forward_up(forward: Vec3, up: Vec3) -> Option<Quat> {
    let x = forward.try_normalize()?;
    let y = (up - x * up.dot(x)).try_normalize()?;
    let z = x.cross(y);
    Some(Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize())
}
