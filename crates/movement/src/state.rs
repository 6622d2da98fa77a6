//! Movement state of one character.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use slipstride_physics::{FloorHit, Kinematics};

use crate::mode::MovementMode;

/// Last trigger time and duration of a guarded action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CooldownTimer {
    /// When the action last executed. `None` if it never has.
    pub last_trigger: Option<f64>,
    /// Cooldown length (seconds).
    pub duration: f32,
}

impl CooldownTimer {
    /// A timer that has never fired.
    pub fn new(duration: f32) -> Self {
        Self {
            last_trigger: None,
            duration,
        }
    }

    /// Seconds since the last trigger, or `None` if it never fired.
    pub fn elapsed(&self, now: f64) -> Option<f64> {
        self.last_trigger.map(|last| now - last)
    }

    /// Whether at least `duration` has passed since the last trigger.
    pub fn is_ready(&self, now: f64) -> bool {
        self.elapsed(now)
            .map_or(true, |elapsed| elapsed >= f64::from(self.duration))
    }

    /// Seconds left until ready. Zero when ready.
    pub fn remaining(&self, now: f64) -> f64 {
        self.elapsed(now)
            .map_or(0.0, |elapsed| (f64::from(self.duration) - elapsed).max(0.0))
    }

    /// Record a trigger at `now`.
    pub fn trigger(&mut self, now: f64) {
        self.last_trigger = Some(now);
    }
}

/// Root-motion contribution supplied by the animation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RootMotion {
    /// Velocity the animation adds on top of simulated velocity.
    pub additive_velocity: Vec3,
    /// Velocity that replaces simulated velocity while an animation drives
    /// the character.
    pub override_velocity: Option<Vec3>,
    /// Additive velocity applied last tick, removed before re-simulating.
    pub applied_additive: Vec3,
}

impl RootMotion {
    /// Whether animation currently drives velocity.
    #[inline]
    pub fn is_animation_driven(&self) -> bool {
        self.override_velocity.is_some()
    }

    /// Whether any additive contribution is active.
    #[inline]
    pub fn has_additive(&self) -> bool {
        self.additive_velocity.length_squared() > 0.0
    }

    /// Whether root motion, of any kind, owns velocity this tick.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_animation_driven() || self.has_additive()
    }

    /// Take last tick's additive contribution back out of `velocity`.
    pub fn restore_pre_additive(&mut self, velocity: &mut Vec3) {
        *velocity -= self.applied_additive;
        self.applied_additive = Vec3::ZERO;
    }

    /// Fold this tick's root motion into `velocity`.
    pub fn apply(&mut self, velocity: &mut Vec3) {
        if let Some(override_velocity) = self.override_velocity {
            *velocity = override_velocity;
        } else if self.has_additive() {
            *velocity += self.additive_velocity;
            self.applied_additive = self.additive_velocity;
        }
    }
}

/// Complete movement state of one character.
///
/// The `wants_*` fields are the committed ("safe") view of intent, changed
/// only by input handlers, the intent decoder and the state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementState {
    /// Current mode.
    pub mode: MovementMode,

    /// Position, rotation and velocity.
    pub body: Kinematics,

    /// Look yaw in degrees, from the controller.
    pub control_yaw: f32,

    pub wants_sprint: bool,
    pub wants_slide: bool,
    pub wants_dash: bool,
    pub wants_crouch: bool,

    /// `wants_crouch` as it was at the end of the previous tick.
    pub prev_wants_crouch: bool,

    /// Whether the character is actually crouched.
    pub crouched: bool,

    /// Dash cooldown.
    pub dash_cooldown: CooldownTimer,

    /// Flipped on every dash so observers can detect it.
    pub dash_toggle: bool,

    /// Root motion from the animation layer.
    pub root_motion: RootMotion,

    /// Floor found by the last slide floor query.
    pub floor: Option<FloorHit>,

    /// Set when the host teleports the character; cleared after the tick.
    pub teleported: bool,
}

impl MovementState {
    /// Standing state at `position`.
    pub fn new(position: Vec3, dash_cooldown: f32) -> Self {
        Self {
            mode: MovementMode::Ground,
            body: Kinematics {
                position,
                rotation: Quat::IDENTITY,
                velocity: Vec3::ZERO,
            },
            control_yaw: 0.0,
            wants_sprint: false,
            wants_slide: false,
            wants_dash: false,
            wants_crouch: false,
            prev_wants_crouch: false,
            crouched: false,
            dash_cooldown: CooldownTimer::new(dash_cooldown),
            dash_toggle: false,
            root_motion: RootMotion::default(),
            floor: None,
            teleported: false,
        }
    }

    /// Move the character without simulating the path.
    pub fn teleport(&mut self, position: Vec3) {
        self.body.position = position;
        self.teleported = true;
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.body.velocity
    }

    #[inline]
    pub fn is_walking(&self) -> bool {
        self.mode == MovementMode::Ground
    }

    #[inline]
    pub fn is_falling(&self) -> bool {
        self.mode == MovementMode::Falling
    }

    #[inline]
    pub fn is_sliding(&self) -> bool {
        self.mode == MovementMode::Slide
    }

    #[inline]
    pub fn is_moving_on_ground(&self) -> bool {
        self.mode.is_moving_on_ground()
    }

    /// Whether the committed sprint flag is set.
    #[inline]
    pub fn is_sprinting(&self) -> bool {
        self.wants_sprint
    }
}
