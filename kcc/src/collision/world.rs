use rapier3d::parry::bounding_volume::Aabb;

use super::{
    filter::HitFilter,
    ghost::GhostObject,
    settings::{DEFAULT_ALLOWED_CCD_PENETRATION, DEFAULT_CONTACT_BREAKING_THRESHOLD},
    shape::ConvexShape,
    types::{Iso, ObjectHandle, Point3, RayResult, SweepResult},
};

/// World-wide tolerances used by queries and contact generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DispatchInfo {
    /// Penetration a sweep tolerates at its start before reporting a hit.
    pub allowed_ccd_penetration: f32,
    /// Separation below which a pair still produces contact points.
    pub contact_breaking_threshold: f32,
}

impl Default for DispatchInfo {
    fn default() -> Self {
        Self {
            allowed_ccd_penetration: DEFAULT_ALLOWED_CCD_PENETRATION,
            contact_breaking_threshold: DEFAULT_CONTACT_BREAKING_THRESHOLD,
        }
    }
}

/// Collision services the character controller relies on.
///
/// Implementations own broad phase, narrow phase and contact generation. The
/// controller only ever sees its own [`GhostObject`] and the hits reported
/// through [`HitFilter`]s.
pub trait CollisionWorld {
    fn dispatch_info(&self) -> &DispatchInfo;

    /// Synchronise the ghost's broadphase bounds and refresh its overlapping
    /// pair cache from them.
    fn set_aabb(&mut self, ghost: &mut GhostObject, aabb: Aabb);

    /// Regenerate the contact manifold of every pair in the ghost's cache.
    fn dispatch_all_collision_pairs(&mut self, ghost: &mut GhostObject);

    /// Drop a pair from the ghost's cache.
    fn remove_overlapping_pair(
        &mut self,
        ghost: &mut GhostObject,
        proxy0: ObjectHandle,
        proxy1: ObjectHandle,
    ) {
        ghost.pair_cache_mut().remove_pair(proxy0, proxy1);
    }

    /// Whether the object takes part in contact response. Unknown objects do not.
    fn has_contact_response(&self, object: ObjectHandle) -> bool;

    /// Sweep `shape` from `from` to `to` against every object in the world and
    /// return the closest hit accepted by `filter`.
    fn convex_sweep_test(
        &self,
        shape: &ConvexShape,
        from: &Iso,
        to: &Iso,
        filter: &dyn HitFilter,
        allowed_penetration: f32,
    ) -> SweepResult;

    /// Like [`convex_sweep_test`](Self::convex_sweep_test), restricted to the
    /// objects overlapping `ghost`.
    fn ghost_convex_sweep_test(
        &self,
        ghost: &GhostObject,
        shape: &ConvexShape,
        from: &Iso,
        to: &Iso,
        filter: &dyn HitFilter,
        allowed_penetration: f32,
    ) -> SweepResult;

    /// Cast a ray from `from` to `to` and return the closest hit accepted by `filter`.
    fn ray_test(&self, from: &Point3, to: &Point3, filter: &dyn HitFilter) -> RayResult;
}
