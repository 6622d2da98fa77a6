//! Friction and braking velocity integrator.
//!
//! Shared by every movement mode: walking uses ground friction and walking
//! braking, sliding passes its own friction and braking constants.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Ticks shorter than this are skipped (seconds).
pub const MIN_TICK_TIME: f32 = 1e-6;

/// Longest braking sub-step (seconds).
const BRAKING_SUB_STEP: f32 = 1.0 / 33.0;

/// Below this speed braking snaps velocity to zero (cm/s).
const BRAKE_TO_STOP_VELOCITY: f32 = 10.0;

/// Friction and speed limits for one velocity integration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityParams {
    /// Friction coefficient.
    pub friction: f32,
    /// Constant deceleration applied when braking (cm/s²).
    pub braking_deceleration: f32,
    /// Speed cap (cm/s).
    pub max_speed: f32,
}

/// Integrate velocity for one tick.
///
/// With no input, or when above `max_speed`, the velocity brakes. With
/// input, friction steers velocity towards the acceleration direction
/// before the acceleration is added and the result is capped.
pub fn calc_velocity(
    velocity: Vec3,
    acceleration: Vec3,
    delta_time: f32,
    params: &VelocityParams,
) -> Vec3 {
    if delta_time < MIN_TICK_TIME {
        return velocity;
    }

    let friction = params.friction.max(0.0);
    let max_speed = params.max_speed.max(0.0);
    let zero_acceleration = acceleration.length_squared() < 1e-8;
    let exceeding_max_speed = velocity.length_squared() > max_speed * max_speed;

    let mut velocity = velocity;

    if zero_acceleration || exceeding_max_speed {
        let old_velocity = velocity;
        velocity = apply_braking(velocity, delta_time, friction, params.braking_deceleration);

        // Don't brake below max speed while still pushing forward
        if exceeding_max_speed
            && velocity.length_squared() < max_speed * max_speed
            && acceleration.dot(old_velocity) > 0.0
        {
            velocity = old_velocity.normalize_or_zero() * max_speed;
        }
    } else {
        let acceleration_dir = acceleration.normalize_or_zero();
        let speed = velocity.length();
        velocity -= (velocity - acceleration_dir * speed) * (delta_time * friction).min(1.0);
    }

    if !zero_acceleration {
        let limit = if exceeding_max_speed {
            velocity.length()
        } else {
            max_speed
        };
        velocity = (velocity + acceleration * delta_time).clamp_length_max(limit);
    }

    velocity
}

/// Slow `velocity` down by friction and a constant braking deceleration.
///
/// Sub-steps long ticks so high friction cannot reverse the direction of
/// travel; reversing or crawling velocities snap to zero.
pub fn apply_braking(
    velocity: Vec3,
    delta_time: f32,
    friction: f32,
    braking_deceleration: f32,
) -> Vec3 {
    if velocity.length_squared() < 1e-8 || delta_time < MIN_TICK_TIME {
        return velocity;
    }

    let friction = friction.max(0.0);
    let braking_deceleration = braking_deceleration.max(0.0);
    if friction == 0.0 && braking_deceleration == 0.0 {
        return velocity;
    }

    let old_velocity = velocity;
    let reverse_acceleration = -braking_deceleration * velocity.normalize_or_zero();
    let mut velocity = velocity;
    let mut remaining = delta_time;

    while remaining >= MIN_TICK_TIME {
        let step = if remaining > BRAKING_SUB_STEP && friction > 0.0 {
            BRAKING_SUB_STEP.min(remaining * 0.5)
        } else {
            remaining
        };
        remaining -= step;

        velocity += (-friction * velocity + reverse_acceleration) * step;

        if velocity.dot(old_velocity) <= 0.0 {
            return Vec3::ZERO;
        }
    }

    let speed_squared = velocity.length_squared();
    if speed_squared <= 1e-4
        || (braking_deceleration > 0.0
            && speed_squared <= BRAKE_TO_STOP_VELOCITY * BRAKE_TO_STOP_VELOCITY)
    {
        return Vec3::ZERO;
    }

    velocity
}
