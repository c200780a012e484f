/*!
Hit filters for sweep and ray queries.

A query walks its candidate objects and asks the filter twice:
- `needs_collision` before any narrow-phase work, with only the object's
  registration data (handle, group/mask, contact response)
- `accept_hit` once a hit has been computed, with the hit geometry

The query keeps the closest hit that passes both checks.
*/

use rapier3d::geometry::Group;

use super::types::{ObjectHandle, SweepHit, Vec3};

/// Collision group membership and mask of an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionFilter {
    pub group: Group,
    pub mask: Group,
}

impl CollisionFilter {
    pub const fn new(group: Group, mask: Group) -> Self {
        Self { group, mask }
    }

    /// Both objects must list each other's group in their mask.
    #[inline]
    pub fn test(&self, other: &CollisionFilter) -> bool {
        self.group.intersects(other.mask) && other.group.intersects(self.mask)
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::new(Group::ALL, Group::ALL)
    }
}

/// Registration data of a candidate object, as seen by a filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectInfo {
    pub handle: ObjectHandle,
    pub filter: CollisionFilter,
    pub has_contact_response: bool,
}

/// Decides which objects and hits a query may report.
pub trait HitFilter {
    /// Broad rejection before the narrow phase runs.
    fn needs_collision(&self, _object: &ObjectInfo) -> bool {
        true
    }

    /// Final acceptance of a computed hit.
    fn accept_hit(&self, hit: &SweepHit, object: &ObjectInfo) -> bool;
}

impl<F> HitFilter for F
where
    F: Fn(&SweepHit, &ObjectInfo) -> bool,
{
    fn accept_hit(&self, hit: &SweepHit, object: &ObjectInfo) -> bool {
        self(hit, object)
    }
}

/// Ray filter that ignores the querying object.
#[derive(Clone, Copy, Debug)]
pub struct ClosestNotMeRayFilter {
    pub me: ObjectHandle,
    pub filter: CollisionFilter,
}

impl ClosestNotMeRayFilter {
    pub fn new(me: ObjectHandle, filter: CollisionFilter) -> Self {
        Self { me, filter }
    }
}

impl HitFilter for ClosestNotMeRayFilter {
    fn needs_collision(&self, object: &ObjectInfo) -> bool {
        object.handle != self.me && self.filter.test(&object.filter)
    }

    fn accept_hit(&self, _hit: &SweepHit, object: &ObjectInfo) -> bool {
        object.handle != self.me
    }
}

/// Sweep filter that ignores the querying object, objects without contact
/// response, and hits whose normal lies outside a cone around `up`.
///
/// A hit is kept only when `up · normal > min_slope_dot`. With `up` set to the
/// reversed motion direction and a zero threshold this keeps surfaces that
/// face against the motion.
#[derive(Clone, Copy, Debug)]
pub struct ClosestNotMeConvexFilter {
    pub me: ObjectHandle,
    pub up: Vec3,
    pub min_slope_dot: f32,
    pub filter: CollisionFilter,
}

impl ClosestNotMeConvexFilter {
    pub fn new(me: ObjectHandle, up: Vec3, min_slope_dot: f32, filter: CollisionFilter) -> Self {
        Self {
            me,
            up,
            min_slope_dot,
            filter,
        }
    }
}

impl HitFilter for ClosestNotMeConvexFilter {
    fn needs_collision(&self, object: &ObjectInfo) -> bool {
        object.handle != self.me
            && object.has_contact_response
            && self.filter.test(&object.filter)
    }

    fn accept_hit(&self, hit: &SweepHit, object: &ObjectInfo) -> bool {
        if object.handle == self.me || !object.has_contact_response {
            return false;
        }
        self.up.dot(&hit.normal) > self.min_slope_dot
    }
}
