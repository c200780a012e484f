/*!
Collision root module.

Everything the character controller needs from a collision engine, plus one
concrete engine (`QueryWorld`) built on parry3d queries. The code is split for
clarity:

- types:        shared data types (handles, up axis, sweep results)
- settings:     algorithm constants and tolerances
- shape:        the controller's convex shape and its scoped margin guard
- filter:       hit filters (self exclusion, group/mask, slope cone)
- ghost:        kinematic proxy with its overlapping pair cache and manifolds
- world:        the `CollisionWorld` trait and dispatch tolerances
- broad:        broad-phase helpers (swept AABBs, candidate scans)
- narrow_phase: thin wrappers over parry3d queries (casts, contacts, rays)
- query_world:  `QueryWorld`, the parry-backed `CollisionWorld`
*/

pub mod broad;
pub mod filter;
pub mod ghost;
pub mod narrow_phase;
pub mod query_world;
pub mod settings;
pub mod shape;
pub mod types;
pub mod world;

// Re-export commonly used types.
pub use filter::{
    ClosestNotMeConvexFilter, ClosestNotMeRayFilter, CollisionFilter, HitFilter, ObjectInfo,
};
pub use ghost::{BroadphasePair, GhostObject, ManifoldPoint, OverlappingPairCache, PersistentManifold};
pub use query_world::{CollisionObject, QueryWorld};
pub use shape::{ConvexKind, ConvexShape, MarginGuard};
pub use types::{Iso, ObjectHandle, Point3, Quat, RayResult, SweepHit, SweepResult, UpAxis, Vec3};
pub use world::{CollisionWorld, DispatchInfo};
