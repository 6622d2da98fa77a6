//! Slide move collision response.
//!
//! Traces the capsule along its velocity and, on each impact, clips the
//! velocity against every plane touched so far so the body glides along
//! walls and into corners instead of stopping dead.

use glam::Vec3;

use crate::actor::IgnoreSet;
use crate::collision::{CollisionWorld, ContentFlags, TraceShape};

use super::config::EngineConfig;

/// Hard cap on tracked collision planes.
const MAX_CLIP_PLANES: usize = 5;

/// Clip velocity against a surface normal.
///
/// Removes the component of velocity going into the surface, scaled by
/// `overbounce` so the body does not stick to it.
pub fn clip_velocity(velocity: Vec3, normal: Vec3, overbounce: f32) -> Vec3 {
    let backoff = velocity.dot(normal);

    let adjusted_backoff = if backoff < 0.0 {
        backoff * overbounce
    } else {
        backoff / overbounce
    };

    velocity - normal * adjusted_backoff
}

/// Outcome of a [`slide_move`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideResult {
    /// Whether the body traveled the whole way without touching anything.
    pub unobstructed: bool,
    /// Normal of the first plane touched, if any.
    pub first_normal: Option<Vec3>,
}

/// Move `position` along `velocity` for `delta_time`, sliding along
/// whatever gets in the way. `velocity` is clipped in place.
pub fn slide_move(
    world: &CollisionWorld,
    position: &mut Vec3,
    velocity: &mut Vec3,
    shape: TraceShape,
    delta_time: f32,
    config: &EngineConfig,
    ignore: &IgnoreSet,
) -> SlideResult {
    let mut time_remaining = delta_time;
    let original_velocity = *velocity;
    let mut planes = [Vec3::ZERO; MAX_CLIP_PLANES];
    let mut num_planes = 0;
    let mut first_normal = None;

    for _ in 0..config.max_clip_planes.min(MAX_CLIP_PLANES) {
        if velocity.length_squared() < 0.0001 || time_remaining <= 0.0 {
            return SlideResult {
                unobstructed: num_planes == 0,
                first_normal,
            };
        }

        let target = *position + *velocity * time_remaining;
        let trace = world.trace(
            *position,
            target,
            shape,
            ContentFlags::MASK_CHARACTER_SOLID,
            ignore,
        );

        if trace.fraction >= 1.0 {
            *position = trace.end_position;
            return SlideResult {
                unobstructed: num_planes == 0,
                first_normal,
            };
        }

        if trace.fraction > 0.0 {
            *position = trace.end_position;
        }
        time_remaining *= 1.0 - trace.fraction;

        let Some(normal) = trace.hit_normal else {
            continue;
        };

        if trace.all_solid {
            *velocity = Vec3::ZERO;
            break;
        }

        first_normal.get_or_insert(normal);
        if num_planes < MAX_CLIP_PLANES {
            planes[num_planes] = normal;
            num_planes += 1;
        }

        // Find a clip that does not push into any other touched plane
        let mut clipped = *velocity;
        let mut found_valid = false;
        for i in 0..num_planes {
            clipped = clip_velocity(clipped, planes[i], config.overbounce);

            let valid = (0..num_planes)
                .filter(|&j| j != i)
                .all(|j| clipped.dot(planes[j]) >= -0.01);

            if valid {
                *velocity = clipped;
                found_valid = true;
                break;
            }
        }

        if found_valid {
            continue;
        }

        if num_planes >= 2 {
            // Slide along the crease between the first two planes
            let crease = planes[0].cross(planes[1]).normalize_or_zero();
            *velocity = crease * original_velocity.dot(crease);

            if velocity.dot(planes[0]) < -0.01 || velocity.dot(planes[1]) < -0.01 {
                *velocity = Vec3::ZERO;
                break;
            }
        } else {
            *velocity = Vec3::ZERO;
            break;
        }
    }

    SlideResult {
        unobstructed: false,
        first_normal,
    }
}

/// Slide move that also tries stepping up over low obstacles.
///
/// Keeps whichever of the plain and stepped attempts got further
/// horizontally.
pub fn step_slide_move(
    world: &CollisionWorld,
    position: &mut Vec3,
    velocity: &mut Vec3,
    shape: TraceShape,
    delta_time: f32,
    config: &EngineConfig,
    ignore: &IgnoreSet,
) -> SlideResult {
    let start_position = *position;
    let start_velocity = *velocity;

    let plain = slide_move(world, position, velocity, shape, delta_time, config, ignore);
    if plain.unobstructed {
        return plain;
    }

    let plain_distance = horizontal(*position - start_position).length_squared();

    let up = world.trace(
        start_position,
        start_position + Vec3::Y * config.max_step_height,
        shape,
        ContentFlags::MASK_CHARACTER_SOLID,
        ignore,
    );
    if up.all_solid {
        return plain;
    }

    let mut stepped_position = up.end_position;
    let mut stepped_velocity = start_velocity;
    slide_move(
        world,
        &mut stepped_position,
        &mut stepped_velocity,
        shape,
        delta_time,
        config,
        ignore,
    );

    let down = world.trace(
        stepped_position,
        stepped_position - Vec3::Y * (config.max_step_height + 0.01),
        shape,
        ContentFlags::MASK_CHARACTER_SOLID,
        ignore,
    );
    if down.all_solid {
        return plain;
    }
    stepped_position = down.end_position;

    // Stepping only counts when it lands on something walkable
    let landed = down
        .hit_normal
        .is_some_and(|normal| normal.y >= config.walkable_floor_y);

    let stepped_distance = horizontal(stepped_position - start_position).length_squared();
    if landed && stepped_distance > plain_distance {
        *position = stepped_position;
        stepped_velocity.y = 0.0;
        *velocity = stepped_velocity;
        return SlideResult {
            unobstructed: false,
            first_normal: plain.first_normal,
        };
    }

    plain
}

fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
