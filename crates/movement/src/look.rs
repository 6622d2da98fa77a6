//! Look-angle limits.
//!
//! While sliding, the controllable yaw is frozen to a window centered on
//! the yaw at slide entry. Leaving the slide restores the full circle.

use serde::{Deserialize, Serialize};

use crate::events::MovementEvent;

/// Upper end of the unrestricted yaw range (degrees).
pub const FULL_YAW_MAX: f32 = 359.99;

/// Pitch limit in either direction (degrees).
pub const PITCH_LIMIT: f32 = 89.9;

/// Yaw window `(min, max)` of half width `deviation` around `yaw`.
///
/// Both ends are in `[0, 360)`. When the window crosses north, `min` is
/// greater than `max`.
pub fn yaw_freeze(yaw: f32, deviation: f32) -> (f32, f32) {
    let yaw = yaw.rem_euclid(360.0);
    (
        (yaw - deviation + 360.0).rem_euclid(360.0),
        (yaw + deviation).rem_euclid(360.0),
    )
}

/// Clamp pitch to the allowed range.
pub fn clamp_pitch(pitch: f32) -> f32 {
    pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT)
}

/// Allowed look angles, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LookLimits {
    pub yaw_min: f32,
    pub yaw_max: f32,
}

impl Default for LookLimits {
    fn default() -> Self {
        Self::full()
    }
}

impl LookLimits {
    /// Unrestricted yaw.
    pub const fn full() -> Self {
        Self {
            yaw_min: 0.0,
            yaw_max: FULL_YAW_MAX,
        }
    }

    /// Window of half width `deviation` around `yaw`.
    pub fn frozen_around(yaw: f32, deviation: f32) -> Self {
        let (yaw_min, yaw_max) = yaw_freeze(yaw, deviation);
        Self { yaw_min, yaw_max }
    }

    pub fn is_full(&self) -> bool {
        *self == Self::full()
    }

    /// Whether `yaw` lies inside the window.
    pub fn contains_yaw(&self, yaw: f32) -> bool {
        if self.is_full() {
            return true;
        }
        let yaw = yaw.rem_euclid(360.0);
        if self.yaw_min <= self.yaw_max {
            (self.yaw_min..=self.yaw_max).contains(&yaw)
        } else {
            yaw >= self.yaw_min || yaw <= self.yaw_max
        }
    }

    /// Clamp `yaw` to the nearest edge of the window.
    pub fn clamp_yaw(&self, yaw: f32) -> f32 {
        let wrapped = yaw.rem_euclid(360.0);
        if self.contains_yaw(wrapped) {
            return wrapped;
        }
        if angular_distance(wrapped, self.yaw_min) <= angular_distance(wrapped, self.yaw_max) {
            self.yaw_min
        } else {
            self.yaw_max
        }
    }
}

fn angular_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Tracks look limits from slide events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LookLimiter {
    pub limits: LookLimits,
    /// Half width of the slide window (degrees).
    pub deviation: f32,
}

impl LookLimiter {
    pub fn new(deviation: f32) -> Self {
        Self {
            limits: LookLimits::full(),
            deviation,
        }
    }

    /// React to a movement event. `control_yaw` is the look yaw when it fired.
    pub fn on_event(&mut self, event: &MovementEvent, control_yaw: f32) {
        match event {
            MovementEvent::EnteredSlide { .. } => {
                self.limits = LookLimits::frozen_around(control_yaw, self.deviation);
            }
            MovementEvent::LeftSlide { .. } => self.limits = LookLimits::full(),
            MovementEvent::DashStarted { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::MovementMode;

    #[test]
    fn test_yaw_freeze_window() {
        assert_eq!(yaw_freeze(90.0, 20.0), (70.0, 110.0));
    }

    #[test]
    fn test_yaw_freeze_wraps_north() {
        let (min, max) = yaw_freeze(10.0, 20.0);
        assert_eq!(min, 350.0);
        assert_eq!(max, 30.0);

        let limits = LookLimits::frozen_around(10.0, 20.0);
        assert!(limits.contains_yaw(355.0));
        assert!(limits.contains_yaw(-5.0));
        assert!(!limits.contains_yaw(180.0));
    }

    #[test]
    fn test_clamp_yaw_to_nearest_edge() {
        let limits = LookLimits::frozen_around(90.0, 20.0);
        assert_eq!(limits.clamp_yaw(100.0), 100.0);
        assert_eq!(limits.clamp_yaw(130.0), 110.0);
        assert_eq!(limits.clamp_yaw(40.0), 70.0);
    }

    #[test]
    fn test_clamp_pitch() {
        assert_eq!(clamp_pitch(120.0), PITCH_LIMIT);
        assert_eq!(clamp_pitch(-120.0), -PITCH_LIMIT);
        assert_eq!(clamp_pitch(10.0), 10.0);
    }

    #[test]
    fn test_limiter_follows_slide_events() {
        let mut limiter = LookLimiter::new(20.0);
        assert!(limiter.limits.is_full());

        limiter.on_event(
            &MovementEvent::EnteredSlide {
                previous: MovementMode::Ground,
            },
            45.0,
        );
        assert_eq!(limiter.limits, LookLimits::frozen_around(45.0, 20.0));

        limiter.on_event(
            &MovementEvent::LeftSlide {
                previous: MovementMode::Slide,
            },
            45.0,
        );
        assert!(limiter.limits.is_full());
    }
}
