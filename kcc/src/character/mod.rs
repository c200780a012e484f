/*!
Kinematic character controller.

The controller moves a [`GhostObject`](crate::collision::GhostObject) through a
[`CollisionWorld`] once per tick:

1. `pre_step`: push the proxy out of anything it overlaps (bounded passes)
2. `player_step`: integrate vertical velocity, then
   - step up by the step height
   - step forward along the walk move, sliding along obstacles
   - step down by the step height plus the fall distance, landing or falling
3. commit the final position to the proxy

The controller never applies forces and is invisible to rigid-body dynamics;
other objects only see its proxy as an obstacle.
*/

mod controller;
mod geometry;
mod penetration;
mod step;

pub use controller::{ControllerState, KinematicCharacterController};
pub use geometry::{
    normalized_or_zero, parallel_component, perpendicular_component, reflection_direction,
};

use crate::collision::{CollisionWorld, Vec3};

/// A per-tick action driven by the host simulation loop.
pub trait ActionInterface {
    fn update_action(&mut self, world: &mut dyn CollisionWorld, dt: f32);
}

/// Control surface of a character controller.
pub trait CharacterController: ActionInterface {
    /// Walk by `walk_direction` every tick until told otherwise.
    fn set_walk_direction(&mut self, walk_direction: Vec3);

    /// Move with `velocity` for `time_interval` seconds, then stop.
    fn set_velocity_for_time_interval(&mut self, velocity: Vec3, time_interval: f32);

    /// Clear velocities, hysteresis flags, walk input and the proxy's overlap cache.
    fn reset(&mut self, world: &mut dyn CollisionWorld);

    /// Teleport the proxy, bypassing collision.
    fn warp(&mut self, origin: Vec3);

    fn pre_step(&mut self, world: &mut dyn CollisionWorld);

    fn player_step(&mut self, world: &dyn CollisionWorld, dt: f32);

    fn can_jump(&self) -> bool;

    fn jump(&mut self);

    /// Same as [`jump`](Self::jump); the direction does not change take-off.
    fn jump_towards(&mut self, direction: Vec3);

    fn on_ground(&self) -> bool;

    fn set_up_interpolate(&mut self, interpolate: bool);
}
