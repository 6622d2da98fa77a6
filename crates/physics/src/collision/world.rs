//! Collision world containing all static and actor-owned geometry.
//!
//! The collision world stores all collidable geometry and provides trace
//! queries through it. Every query takes an [`IgnoreSet`] so a character can
//! look through its own body and attached props.

use glam::{Quat, Vec3};
use parry3d::math::{Isometry, Point, Real, Vector};
use parry3d::na::{Quaternion, Translation3, UnitQuaternion};
use parry3d::query::{contact, Ray, RayCast};
use parry3d::shape::SharedShape;

use super::flags::ContentFlags;
use super::trace::{TraceResult, TraceShape};
use crate::actor::{ActorId, IgnoreSet};

/// Binary search iterations for swept traces (~0.025% precision).
const TRACE_SEARCH_ITERATIONS: usize = 12;

/// A piece of collision geometry in the world.
#[derive(Debug, Clone)]
pub struct CollisionBrush {
    /// Unique identifier for this brush.
    pub id: u32,
    /// The collision shape.
    pub shape: SharedShape,
    /// Position and orientation in world space.
    pub transform: Isometry<Real>,
    /// Content flags used for query filtering.
    pub contents: ContentFlags,
    /// Actor owning this brush. `None` for level geometry.
    pub owner: Option<ActorId>,
}

/// The collision world containing all geometry.
///
/// The world is immutable during a simulation tick and can be shared by
/// reference between every character simulated in that tick.
#[derive(Debug, Default)]
pub struct CollisionWorld {
    brushes: Vec<CollisionBrush>,
    next_id: u32,
}

impl CollisionWorld {
    /// Create an empty collision world.
    pub fn new() -> Self {
        Self {
            brushes: Vec::new(),
            next_id: 0,
        }
    }

    /// Add an axis-aligned box of level geometry.
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3, contents: ContentFlags) -> u32 {
        self.add_oriented_box(center, half_extents, Quat::IDENTITY, contents, None)
    }

    /// Add an axis-aligned box owned by an actor (a prop, a shield, a body).
    pub fn add_actor_box(
        &mut self,
        owner: ActorId,
        center: Vec3,
        half_extents: Vec3,
        contents: ContentFlags,
    ) -> u32 {
        self.add_oriented_box(center, half_extents, Quat::IDENTITY, contents, Some(owner))
    }

    /// Add a rotated box. Ramps are boxes rotated about a horizontal axis.
    pub fn add_oriented_box(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        contents: ContentFlags,
        owner: Option<ActorId>,
    ) -> u32 {
        let id = self.next_id;
        self.next_id += 1;

        let shape = SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z);
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(
            rotation.w, rotation.x, rotation.y, rotation.z,
        ));
        let transform =
            Isometry::from_parts(Translation3::new(center.x, center.y, center.z), rotation);

        self.brushes.push(CollisionBrush {
            id,
            shape,
            transform,
            contents,
            owner,
        });

        id
    }

    /// Remove every brush owned by an actor.
    pub fn remove_actor(&mut self, owner: ActorId) {
        self.brushes.retain(|brush| brush.owner != Some(owner));
    }

    /// Get the number of collision brushes.
    pub fn brush_count(&self) -> usize {
        self.brushes.len()
    }

    /// Sweep a shape through the world.
    ///
    /// `start` and `end` are shape centers. Brushes whose content does not
    /// intersect `mask`, or whose owner is in `ignore`, are skipped.
    pub fn trace(
        &self,
        start: Vec3,
        end: Vec3,
        shape: TraceShape,
        mask: ContentFlags,
        ignore: &IgnoreSet,
    ) -> TraceResult {
        let delta = end - start;
        let distance = delta.length();

        // No movement - just check if position is valid
        if distance < 0.0001 {
            return match self.blocking_brush(start, shape, mask, ignore) {
                Some(brush) => TraceResult {
                    fraction: 0.0,
                    end_position: start,
                    hit_normal: Some(Vec3::Y),
                    hit_contents: brush.contents,
                    started_in_solid: true,
                    all_solid: true,
                    hit_actor: brush.owner,
                },
                None => TraceResult::no_hit(start),
            };
        }

        let direction = delta / distance;
        self.trace_binary_search(start, end, shape, mask, ignore, direction)
    }

    /// Cast a ray through the world.
    ///
    /// `direction` is normalized internally; a zero direction never hits.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: ContentFlags,
        ignore: &IgnoreSet,
    ) -> TraceResult {
        let dir = direction.normalize_or_zero();
        if dir.length_squared() < 0.5 {
            return TraceResult::no_hit(origin);
        }

        let ray = Ray::new(
            Point::new(origin.x, origin.y, origin.z),
            Vector::new(dir.x, dir.y, dir.z),
        );

        let mut closest_hit: Option<(f32, Vec3, &CollisionBrush)> = None;

        for brush in self.candidates(mask, ignore) {
            let Some(intersection) =
                brush
                    .shape
                    .cast_ray_and_get_normal(&brush.transform, &ray, max_distance, true)
            else {
                continue;
            };

            let toi = intersection.time_of_impact;
            let is_closer = closest_hit
                .as_ref()
                .map_or(true, |(dist, _, _)| toi < *dist);

            if is_closer {
                let normal = Vec3::new(
                    intersection.normal.x,
                    intersection.normal.y,
                    intersection.normal.z,
                );
                closest_hit = Some((toi, normal, brush));
            }
        }

        match closest_hit {
            Some((distance, normal, brush)) => TraceResult {
                fraction: distance / max_distance,
                end_position: origin + dir * distance,
                hit_normal: Some(normal.normalize_or_zero()),
                hit_contents: brush.contents,
                started_in_solid: distance <= 0.0,
                all_solid: false,
                hit_actor: brush.owner,
            },
            None => TraceResult::no_hit(origin + dir * max_distance),
        }
    }

    /// Check if a shape centered at `position` overlaps solid geometry.
    pub fn point_in_solid(
        &self,
        position: Vec3,
        shape: TraceShape,
        mask: ContentFlags,
        ignore: &IgnoreSet,
    ) -> bool {
        self.blocking_brush(position, shape, mask, ignore).is_some()
    }

    /// Push a shape out of any geometry it penetrates.
    ///
    /// Returns the corrected position.
    pub fn resolve_penetration(
        &self,
        position: Vec3,
        shape: TraceShape,
        mask: ContentFlags,
        ignore: &IgnoreSet,
    ) -> Vec3 {
        let test_shape = Self::parry_shape(shape);
        let test_transform = Self::shape_transform(position);

        let mut correction = Vec3::ZERO;

        for brush in self.candidates(mask, ignore) {
            if let Ok(Some(contact_result)) = contact(
                &test_transform,
                test_shape.as_ref(),
                &brush.transform,
                brush.shape.as_ref(),
                0.0,
            ) {
                // normal2 points out of the brush, towards the shape
                let normal = Vec3::new(
                    contact_result.normal2.x,
                    contact_result.normal2.y,
                    contact_result.normal2.z,
                );
                let depth = -contact_result.dist;
                if depth > 0.0 {
                    correction += normal * (depth + 0.001);
                }
            }
        }

        position + correction
    }

    // ========================================================================
    // Private helpers
    // ========================================================================

    fn candidates<'a>(
        &'a self,
        mask: ContentFlags,
        ignore: &'a IgnoreSet,
    ) -> impl Iterator<Item = &'a CollisionBrush> + 'a {
        self.brushes
            .iter()
            .filter(move |brush| mask.intersects(brush.contents) && !ignore.ignores(brush.owner))
    }

    fn blocking_brush<'a>(
        &'a self,
        position: Vec3,
        shape: TraceShape,
        mask: ContentFlags,
        ignore: &'a IgnoreSet,
    ) -> Option<&'a CollisionBrush> {
        let test_shape = Self::parry_shape(shape);
        let test_transform = Self::shape_transform(position);

        self.candidates(mask, ignore).find(|brush| {
            matches!(
                contact(
                    &test_transform,
                    test_shape.as_ref(),
                    &brush.transform,
                    brush.shape.as_ref(),
                    0.0,
                ),
                Ok(Some(_))
            )
        })
    }

    /// Binary search trace for accurate collision detection.
    fn trace_binary_search(
        &self,
        start: Vec3,
        end: Vec3,
        shape: TraceShape,
        mask: ContentFlags,
        ignore: &IgnoreSet,
        direction: Vec3,
    ) -> TraceResult {
        let start_in_solid = self.point_in_solid(start, shape, mask, ignore);

        if self.blocking_brush(end, shape, mask, ignore).is_none() {
            return TraceResult {
                started_in_solid: start_in_solid,
                ..TraceResult::no_hit(end)
            };
        }

        let mut lo = 0.0_f32;
        let mut hi = 1.0_f32;

        for _ in 0..TRACE_SEARCH_ITERATIONS {
            let mid = (lo + hi) * 0.5;
            let test_pos = start + (end - start) * mid;

            if self.point_in_solid(test_pos, shape, mask, ignore) {
                hi = mid;
            } else {
                lo = mid;
            }
        }

        let fraction = lo;
        let end_position = start + (end - start) * fraction;

        // Normal from the contacts at the first blocked position
        let penetration_test = start + (end - start) * hi;
        let blocker = self.blocking_brush(penetration_test, shape, mask, ignore);
        let hit_normal = self
            .contact_normal(penetration_test, shape, mask, ignore)
            .unwrap_or_else(|| {
                // No contact to read: reverse of the horizontal travel
                let horizontal = Vec3::new(-direction.x, 0.0, -direction.z);
                if horizontal.length_squared() > 0.1 {
                    horizontal.normalize()
                } else {
                    Vec3::Y
                }
            });

        TraceResult {
            fraction,
            end_position,
            hit_normal: Some(hit_normal),
            hit_contents: blocker.map_or(ContentFlags::SOLID, |brush| brush.contents),
            started_in_solid: start_in_solid,
            all_solid: start_in_solid && fraction < 0.001,
            hit_actor: blocker.and_then(|brush| brush.owner),
        }
    }

    /// Sum of the outward contact normals of every brush touching the
    /// shape, normalized. `None` without contact.
    fn contact_normal(
        &self,
        position: Vec3,
        shape: TraceShape,
        mask: ContentFlags,
        ignore: &IgnoreSet,
    ) -> Option<Vec3> {
        let test_shape = Self::parry_shape(shape);
        let test_transform = Self::shape_transform(position);

        let normal = self
            .candidates(mask, ignore)
            .filter_map(|brush| {
                contact(
                    &test_transform,
                    test_shape.as_ref(),
                    &brush.transform,
                    brush.shape.as_ref(),
                    0.0,
                )
                .ok()
                .flatten()
            })
            .fold(Vec3::ZERO, |sum, contact_result| {
                // normal2 points out of the brush, towards the shape
                sum + Vec3::new(
                    contact_result.normal2.x,
                    contact_result.normal2.y,
                    contact_result.normal2.z,
                )
            });

        normal.try_normalize()
    }

    fn parry_shape(shape: TraceShape) -> SharedShape {
        match shape {
            TraceShape::Capsule { radius, half_height } => {
                // Parry capsules are defined by the half height of the cylinder part
                let cylinder_half_height = (half_height - radius).max(0.0);
                SharedShape::capsule_y(cylinder_half_height, radius)
            }
            TraceShape::Point => SharedShape::ball(0.001),
        }
    }

    fn shape_transform(position: Vec3) -> Isometry<Real> {
        Isometry::translation(position.x, position.y, position.z)
    }
}

// ============================================================================
// Tests
// ============================================================================
