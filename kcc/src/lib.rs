pub mod character;
pub mod collision;
pub mod config;
pub mod error;
pub mod rapier;

pub use character::{
    ActionInterface, CharacterController, ControllerState, KinematicCharacterController,
};
pub use collision::{
    ClosestNotMeConvexFilter, ClosestNotMeRayFilter, CollisionFilter, CollisionObject,
    CollisionWorld, ConvexShape, DispatchInfo, GhostObject, HitFilter, MarginGuard, ObjectHandle,
    QueryWorld, SweepHit, SweepResult, UpAxis,
};
pub use config::ControllerSettings;
pub use error::WorldError;
pub use rapier::{ColliderShapeDef, WorldObjectDef, collision_object_from_def};
