//! Per-character movement component.
//!
//! Owns the configuration, the committed state and the look limiter of one
//! character, and turns raw button edges into committed "wants" flags.
//! Input handlers never touch physics; the flags take effect on the next
//! tick.

use glam::Vec3;
use slipstride_physics::LocomotionEngine;

use crate::character::{CharacterBody, CharacterHooks, CharacterId, Role};
use crate::config::{ConfigError, MovementConfig};
use crate::events::{DashDirection, MovementEvent, MovementEvents};
use crate::look::LookLimiter;
use crate::machine::{is_sprinting_allowed, simulate_tick, TickContext, TickInput};
use crate::mode::MovementMode;
use crate::retry::DashRetryScheduler;
use crate::state::MovementState;

/// Movement of one character.
#[derive(Debug, Clone)]
pub struct MovementComponent<H = CharacterBody> {
    id: CharacterId,
    pub config: MovementConfig,
    pub hooks: H,
    pub state: MovementState,
    pub look: LookLimiter,
}

impl<H: CharacterHooks> MovementComponent<H> {
    /// Standing character at `position`.
    pub fn new(
        id: CharacterId,
        config: MovementConfig,
        hooks: H,
        position: Vec3,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = MovementState::new(position, config.dash_cooldown);
        let look = LookLimiter::new(config.slide_yaw_deviation);
        Ok(Self {
            id,
            config,
            hooks,
            state,
            look,
        })
    }

    pub fn id(&self) -> CharacterId {
        self.id
    }

    /// Tick context for this character, alongside the parts a tick
    /// mutates.
    pub fn split_mut(&mut self, role: Role, now: f64) -> (TickContext<'_>, &mut MovementState, &mut LookLimiter) {
        let ctx = TickContext {
            character: self.id,
            config: &self.config,
            hooks: &self.hooks,
            role,
            now,
        };
        (ctx, &mut self.state, &mut self.look)
    }

    // ========================================================================
    // Input
    // ========================================================================

    pub fn on_sprint_pressed(&mut self) {
        if is_sprinting_allowed(&self.config, &self.state, &self.hooks) {
            self.state.wants_sprint = true;
        }
    }

    pub fn on_sprint_released(&mut self) {
        self.state.wants_sprint = false;
    }

    /// Crouch is a toggle.
    pub fn on_crouch_pressed(&mut self) {
        self.state.wants_crouch = !self.state.wants_crouch;
    }

    pub fn on_crouch_released(&mut self) {}

    pub fn on_slide_pressed(&mut self) {
        self.state.wants_slide = true;
    }

    pub fn on_slide_released(&mut self) {
        self.state.wants_slide = false;
    }

    /// Request a dash, or arm a retry for when the cooldown runs out.
    pub fn on_dash_pressed(&mut self, now: f64, retries: &mut DashRetryScheduler) {
        let cooldown = &self.state.dash_cooldown;
        if cooldown.is_ready(now) {
            self.state.wants_dash = true;
        } else {
            retries.schedule(self.id, now + cooldown.remaining(now));
        }
    }

    /// Cancel a pending retry. A dash already requested stays requested.
    pub fn on_dash_released(&mut self, retries: &mut DashRetryScheduler) {
        if retries.cancel(self.id) {
            log::trace!("dash retry for character {} cancelled", self.id);
        }
    }

    /// The armed retry fired.
    pub fn on_dash_retry(&mut self) {
        self.state.wants_dash = true;
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Clamp a look yaw to the current limits.
    pub fn limit_yaw(&self, yaw: f32) -> f32 {
        self.look.limits.clamp_yaw(yaw)
    }

    /// Simulate one tick with the committed flags as they are.
    pub fn tick<E, V>(&mut self, role: Role, now: f64, input: &TickInput, engine: &E, events: &mut V)
    where
        E: LocomotionEngine + ?Sized,
        V: MovementEvents + ?Sized,
    {
        let (ctx, state, look) = self.split_mut(role, now);
        let mut sink = LookTee {
            look,
            control_yaw: input.control_yaw,
            inner: events,
        };
        simulate_tick(&ctx, state, input, engine, &mut sink);
    }

    /// Bring the look limits back in line with the mode after a rewind.
    pub fn sync_look(&mut self) {
        let sliding = self.state.mode == MovementMode::Slide;
        if sliding == self.look.limits.is_full() {
            let event = if sliding {
                MovementEvent::EnteredSlide {
                    previous: MovementMode::Ground,
                }
            } else {
                MovementEvent::LeftSlide {
                    previous: MovementMode::Slide,
                }
            };
            self.look.on_event(&event, self.state.control_yaw);
        }
    }
}

/// Forwards events while keeping the look limiter current.
struct LookTee<'a, V: ?Sized> {
    look: &'a mut LookLimiter,
    control_yaw: f32,
    inner: &'a mut V,
}

impl<V: MovementEvents + ?Sized> MovementEvents for LookTee<'_, V> {
    fn entered_slide(&mut self, previous: MovementMode) {
        self.look
            .on_event(&MovementEvent::EnteredSlide { previous }, self.control_yaw);
        self.inner.entered_slide(previous);
    }

    fn left_slide(&mut self, previous: MovementMode) {
        self.look
            .on_event(&MovementEvent::LeftSlide { previous }, self.control_yaw);
        self.inner.left_slide(previous);
    }

    fn dash_started(&mut self, direction: DashDirection) {
        self.inner.dash_started(direction);
    }
}
