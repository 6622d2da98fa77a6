//! Dash: a short directional impulse that launches the character into the
//! air.
//!
//! The dash direction follows the input acceleration (or the body's facing
//! when there is none) with a small upward lift. The impulse magnitude is
//! picked per discretized direction of travel relative to the look yaw.

use glam::Vec3;
use slipstride_physics::{IgnoreSet, LocomotionEngine};

use crate::character::CharacterHooks;
use crate::config::DashImpulses;
use crate::events::{DashDirection, MovementEvents};
use crate::frame::{body_forward, horizontal, rotation_from_forward_up, yaw_forward, yaw_right};
use crate::machine::{set_mode, TickContext};
use crate::mode::MovementMode;
use crate::state::MovementState;

/// Past this angle (degrees, either side) a dash counts as backward.
const BACKWARD_ANGLE: f32 = 150.0;

/// Within this angle (degrees, either side) a dash counts as forward.
const FORWARD_ANGLE: f32 = 50.0;

/// Signed angle in degrees between the look direction and the horizontal
/// velocity. Negative to the left, positive to the right.
///
/// Zero horizontal velocity reads as straight ahead.
pub fn direction_angle(control_yaw: f32, velocity: Vec3) -> f32 {
    let Some(travel) = horizontal(velocity).try_normalize() else {
        return 0.0;
    };

    let angle = yaw_forward(control_yaw).dot(travel).clamp(-1.0, 1.0).acos().to_degrees();
    if yaw_right(control_yaw).dot(travel) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Bucket a signed angle into a dash direction.
pub fn discretize(angle: f32) -> DashDirection {
    if angle.abs() >= BACKWARD_ANGLE {
        DashDirection::Backward
    } else if angle.abs() <= FORWARD_ANGLE {
        DashDirection::Forward
    } else if angle < 0.0 {
        DashDirection::Left
    } else {
        DashDirection::Right
    }
}

/// Direction of travel relative to the look yaw.
pub fn dash_direction(control_yaw: f32, velocity: Vec3) -> DashDirection {
    discretize(direction_angle(control_yaw, velocity))
}

impl DashImpulses {
    /// Impulse for a direction.
    pub fn for_direction(&self, direction: DashDirection) -> f32 {
        match direction {
            DashDirection::Forward => self.forward,
            DashDirection::Backward => self.backward,
            DashDirection::Left => self.left,
            DashDirection::Right => self.right,
        }
    }
}

/// Whether the character may dash right now.
pub fn can_dash(state: &MovementState, hooks: &dyn CharacterHooks) -> bool {
    state.is_walking()
        && !state.is_sprinting()
        && !state.is_sliding()
        && !state.crouched
        && !state.is_falling()
        && hooks.can_dash()
}

/// Launch the dash.
///
/// Starts the cooldown, replaces velocity with the impulse, turns the body
/// to face the dash and leaves the character falling.
pub(crate) fn perform_dash<E, V>(
    ctx: &TickContext<'_>,
    state: &mut MovementState,
    acceleration: Vec3,
    engine: &E,
    ignore: &IgnoreSet,
    events: &mut V,
) where
    E: LocomotionEngine + ?Sized,
    V: MovementEvents + ?Sized,
{
    let config = ctx.config;
    state.dash_cooldown.trigger(ctx.now);

    let heading = if acceleration.length_squared() < 1e-8 {
        body_forward(state.body.rotation)
    } else {
        acceleration
    };
    let dash_dir = horizontal(heading).normalize_or_zero() + Vec3::Y * config.dash_up_bias;

    let direction = dash_direction(state.control_yaw, state.velocity());
    let impulse = config.dash_impulse.for_direction(direction);
    state.body.velocity = dash_dir * impulse;

    let rotation = rotation_from_forward_up(dash_dir, Vec3::Y).unwrap_or(state.body.rotation);
    engine.sweep_move(&mut state.body, Vec3::ZERO, rotation, config.capsule, ignore);

    log::debug!(
        "character {} dashed {direction:?} at {impulse} cm/s",
        ctx.character
    );

    set_mode(ctx, state, MovementMode::Falling, engine, ignore, events);
    events.dash_started(direction);
}
