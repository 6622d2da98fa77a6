//! Reference [`LocomotionEngine`] over a [`CollisionWorld`].

use glam::{Quat, Vec3};

use super::config::EngineConfig;
use super::slide_move::{slide_move, step_slide_move};
use super::velocity::{VelocityParams, MIN_TICK_TIME};
use super::{Capsule, FloorHit, Kinematics, LocomotionEngine, StepOutcome, SurfaceHit, SweepHit};
use crate::actor::IgnoreSet;
use crate::collision::{CollisionWorld, ContentFlags};

/// Locomotion services backed by a static collision world.
///
/// Borrowing the world keeps the engine cheap to build per tick and lets
/// any number of characters share it.
#[derive(Debug, Clone)]
pub struct WorldEngine<'w> {
    world: &'w CollisionWorld,
    config: EngineConfig,
}

impl<'w> WorldEngine<'w> {
    /// Create an engine over `world`.
    pub fn new(world: &'w CollisionWorld, config: EngineConfig) -> Self {
        Self { world, config }
    }

    /// The engine tuning.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The collision world.
    pub fn world(&self) -> &'w CollisionWorld {
        self.world
    }

    fn snap_to_floor(&self, body: &mut Kinematics, floor: &FloorHit) {
        let config = &self.config;
        if floor.floor_distance < config.min_floor_distance
            || floor.floor_distance > config.max_floor_distance
        {
            body.position.y += config.target_floor_distance() - floor.floor_distance;
        }
    }

    fn land_on_floor(
        &self,
        body: &mut Kinematics,
        capsule: Capsule,
        ignore: &IgnoreSet,
        max_gap: f32,
    ) -> StepOutcome {
        match self.find_floor(body.position, capsule, ignore) {
            Some(floor) if floor.walkable && floor.floor_distance <= max_gap => {
                self.snap_to_floor(body, &floor);
                body.velocity.y = 0.0;
                StepOutcome::Grounded
            }
            _ => StepOutcome::Airborne,
        }
    }
}

impl LocomotionEngine for WorldEngine<'_> {
    fn probe_down(&self, origin: Vec3, max_distance: f32, ignore: &IgnoreSet) -> Option<SurfaceHit> {
        let trace = self.world.raycast(
            origin,
            -Vec3::Y,
            max_distance,
            ContentFlags::MASK_BLOCK_ALL,
            ignore,
        );

        trace.hit_something().then(|| SurfaceHit {
            point: trace.end_position,
            normal: trace.normal_or_up(),
            distance: trace.fraction * max_distance,
            actor: trace.hit_actor,
        })
    }

    fn find_floor(&self, position: Vec3, capsule: Capsule, ignore: &IgnoreSet) -> Option<FloorHit> {
        let reach = capsule.half_height + self.config.max_step_height;
        let surface = self.probe_down(position, reach, ignore)?;

        // Where the rounded bottom rests on a sloped surface
        let bottom_offset = if surface.normal.y > 0.01 {
            (capsule.half_height - capsule.radius) + capsule.radius / surface.normal.y
        } else {
            capsule.half_height
        };

        Some(FloorHit {
            surface,
            floor_distance: surface.distance - bottom_offset,
            walkable: surface.normal.y >= self.config.walkable_floor_y,
        })
    }

    fn sweep_move(
        &self,
        body: &mut Kinematics,
        delta: Vec3,
        rotation: Quat,
        capsule: Capsule,
        ignore: &IgnoreSet,
    ) -> Option<SweepHit> {
        body.rotation = rotation;
        if delta.length_squared() < 1e-8 {
            return None;
        }

        let shape = capsule.shape();
        let trace = self.world.trace(
            body.position,
            body.position + delta,
            shape,
            ContentFlags::MASK_CHARACTER_SOLID,
            ignore,
        );

        if trace.all_solid {
            let resolved = self.world.resolve_penetration(
                body.position,
                shape,
                ContentFlags::MASK_CHARACTER_SOLID,
                ignore,
            );
            log::debug!(
                "sweep started in solid at {:?}, pushed out to {:?}",
                body.position,
                resolved
            );
            body.position = resolved;
            return Some(SweepHit {
                time: 0.0,
                normal: trace.normal_or_up(),
                started_penetrating: true,
                actor: trace.hit_actor,
            });
        }

        body.position = trace.end_position;
        trace.hit_something().then(|| SweepHit {
            time: trace.fraction,
            normal: trace.normal_or_up(),
            started_penetrating: trace.started_in_solid,
            actor: trace.hit_actor,
        })
    }

    fn slide_along_surface(
        &self,
        body: &mut Kinematics,
        delta: Vec3,
        time: f32,
        normal: Vec3,
        capsule: Capsule,
        ignore: &IgnoreSet,
    ) -> f32 {
        let slide_delta = (delta - normal * delta.dot(normal)) * time;
        if slide_delta.length_squared() < 1e-8 || slide_delta.dot(delta) <= 0.0 {
            return 0.0;
        }

        let rotation = body.rotation;
        let Some(hit) = self.sweep_move(body, slide_delta, rotation, capsule, ignore) else {
            return time;
        };
        self.handle_impact(&hit);

        let mut applied = time * hit.time;

        // Second surface: run along the crease between both
        let crease = normal.cross(hit.normal).normalize_or_zero();
        let crease_delta = crease * (slide_delta * (1.0 - hit.time)).dot(crease);
        if crease_delta.length_squared() > 1e-6 && crease_delta.dot(delta) > 0.0 {
            let second = self.sweep_move(body, crease_delta, rotation, capsule, ignore);
            applied += time * (1.0 - hit.time) * second.map_or(1.0, |h| h.time);
        }

        applied
    }

    fn step_walking(
        &self,
        body: &mut Kinematics,
        acceleration: Vec3,
        delta_time: f32,
        params: &VelocityParams,
        capsule: Capsule,
        ignore: &IgnoreSet,
    ) -> StepOutcome {
        if delta_time < MIN_TICK_TIME {
            return StepOutcome::Grounded;
        }

        let acceleration = horizontal(acceleration);
        let mut velocity = self.calc_velocity(horizontal(body.velocity), acceleration, delta_time, params);
        let mut position = body.position;

        step_slide_move(
            self.world,
            &mut position,
            &mut velocity,
            capsule.shape(),
            delta_time,
            &self.config,
            ignore,
        );

        body.position = position;
        body.velocity = horizontal(velocity);

        let max_gap = self.config.max_step_height;
        self.land_on_floor(body, capsule, ignore, max_gap)
    }

    fn step_falling(
        &self,
        body: &mut Kinematics,
        acceleration: Vec3,
        delta_time: f32,
        params: &VelocityParams,
        capsule: Capsule,
        ignore: &IgnoreSet,
    ) -> StepOutcome {
        if delta_time < MIN_TICK_TIME {
            return StepOutcome::Airborne;
        }

        let air_acceleration = horizontal(acceleration) * self.config.air_control;
        let lateral_params = VelocityParams {
            friction: self.config.falling_lateral_friction,
            ..*params
        };
        let lateral = self.calc_velocity(
            horizontal(body.velocity),
            air_acceleration,
            delta_time,
            &lateral_params,
        );

        let mut velocity = Vec3::new(
            lateral.x,
            body.velocity.y - self.config.gravity * delta_time,
            lateral.z,
        );
        let mut position = body.position;

        let result = slide_move(
            self.world,
            &mut position,
            &mut velocity,
            capsule.shape(),
            delta_time,
            &self.config,
            ignore,
        );

        body.position = position;
        body.velocity = velocity;

        let touched_floor = result
            .first_normal
            .is_some_and(|normal| normal.y >= self.config.walkable_floor_y);
        if velocity.y > 0.0 && !touched_floor {
            return StepOutcome::Airborne;
        }

        let max_gap = self.config.max_floor_distance;
        self.land_on_floor(body, capsule, ignore, max_gap)
    }
}

fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
