//! Critically damped velocity smoothing.
//!
//! The horizontal velocity never snaps to its target; it approaches it
//! through a critically damped spring parameterized by a time constant.
//! Critical damping guarantees no overshoot, which keeps ground movement
//! from oscillating around the target speed.

use bevy::prelude::*;

/// Smooth `current` toward `target` over roughly `smooth_time` seconds.
///
/// `velocity` is the smoothing state and must be carried between calls.
/// The result never overshoots the target.
pub fn smooth_damp(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    // Zero smooth time means instantaneous completion, not a division fault.
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;

    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    // Clamp at the target if the damped step carried past it.
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }

    output
}

/// Component-wise [`smooth_damp`] for vectors.
pub fn smooth_damp_vec3(
    current: Vec3,
    target: Vec3,
    velocity: &mut Vec3,
    smooth_time: f32,
    dt: f32,
) -> Vec3 {
    Vec3::new(
        smooth_damp(current.x, target.x, &mut velocity.x, smooth_time, dt),
        smooth_damp(current.y, target.y, &mut velocity.y, smooth_time, dt),
        smooth_damp(current.z, target.z, &mut velocity.z, smooth_time, dt),
    )
}
