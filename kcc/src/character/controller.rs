use crate::collision::{
    ClosestNotMeRayFilter, CollisionWorld, ConvexShape, GhostObject, HitFilter, Iso, Point3,
    RayResult, SweepResult, UpAxis, Vec3,
    settings::MAX_PENETRATION_LOOPS,
};
use crate::config::ControllerSettings;

use super::{ActionInterface, CharacterController, geometry::normalized_or_zero};

/// Mutable per-actor kinematic state, owned and mutated by the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControllerState {
    /// Scratch position the step phases move; committed to the proxy at the end of a tick.
    pub current_position: Vec3,
    pub target_position: Vec3,

    /// Walk move per tick, or velocity in timed-velocity mode.
    pub walk_direction: Vec3,
    pub normalized_direction: Vec3,
    pub use_walk_direction: bool,
    pub velocity_time_interval: f32,

    /// How far the last step up actually rose.
    pub current_step_offset: f32,
    pub vertical_velocity: f32,
    pub vertical_offset: f32,

    /// Whether the last `pre_step` found penetration, and the deepest normal
    /// (pointing from the proxy into the obstacle).
    pub touching_contact: bool,
    pub touching_normal: Vec3,

    pub was_on_ground: bool,
    pub was_jumping: bool,
    pub full_drop: bool,
}

/// Kinematic character controller driving a ghost proxy.
#[derive(Clone, Debug)]
pub struct KinematicCharacterController {
    pub(super) ghost: GhostObject,
    pub(super) shape: ConvexShape,
    pub(super) settings: ControllerSettings,
    pub(super) max_slope_cosine: f32,
    pub(super) state: ControllerState,
}

impl KinematicCharacterController {
    /// Controller with default settings and the given step height.
    pub fn new(ghost: GhostObject, shape: ConvexShape, step_height: f32) -> Self {
        Self::with_settings(ghost, shape, ControllerSettings::with_step_height(step_height))
    }

    pub fn with_settings(
        ghost: GhostObject,
        shape: ConvexShape,
        settings: ControllerSettings,
    ) -> Self {
        let position = ghost.translation();
        Self {
            ghost,
            shape,
            max_slope_cosine: settings.max_slope_radians.cos(),
            settings,
            state: ControllerState {
                current_position: position,
                target_position: position,
                use_walk_direction: true,
                ..Default::default()
            },
        }
    }

    #[inline]
    pub fn ghost(&self) -> &GhostObject {
        &self.ghost
    }

    #[inline]
    pub fn ghost_mut(&mut self) -> &mut GhostObject {
        &mut self.ghost
    }

    #[inline]
    pub fn shape(&self) -> &ConvexShape {
        &self.shape
    }

    #[inline]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    #[inline]
    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Replace every tuning value at once.
    pub fn set_settings(&mut self, settings: ControllerSettings) {
        self.max_slope_cosine = settings.max_slope_radians.cos();
        self.settings = settings;
    }

    /// Committed world position of the proxy.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.ghost.translation()
    }

    #[inline]
    pub fn up(&self) -> Vec3 {
        self.settings.up_axis.direction()
    }

    pub fn gravity(&self) -> f32 {
        self.settings.gravity
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.settings.gravity = gravity;
    }

    pub fn fall_speed(&self) -> f32 {
        self.settings.fall_speed
    }

    pub fn set_fall_speed(&mut self, fall_speed: f32) {
        self.settings.fall_speed = fall_speed;
    }

    pub fn jump_speed(&self) -> f32 {
        self.settings.jump_speed
    }

    pub fn set_jump_speed(&mut self, jump_speed: f32) {
        self.settings.jump_speed = jump_speed;
    }

    pub fn step_height(&self) -> f32 {
        self.settings.step_height
    }

    pub fn set_step_height(&mut self, step_height: f32) {
        self.settings.step_height = step_height;
    }

    /// Steepest walkable slope, in radians.
    pub fn max_slope(&self) -> f32 {
        self.settings.max_slope_radians
    }

    pub fn set_max_slope(&mut self, radians: f32) {
        self.settings.max_slope_radians = radians;
        self.max_slope_cosine = radians.cos();
    }

    #[inline]
    pub fn max_slope_cosine(&self) -> f32 {
        self.max_slope_cosine
    }

    pub fn up_axis(&self) -> UpAxis {
        self.settings.up_axis
    }

    pub fn set_up_axis(&mut self, axis: UpAxis) {
        self.settings.up_axis = axis;
    }

    pub fn set_use_ghost_sweep_test(&mut self, use_ghost_sweep_test: bool) {
        self.settings.use_ghost_sweep_test = use_ghost_sweep_test;
    }

    pub fn set_bounce_fix(&mut self, bounce_fix: bool) {
        self.settings.bounce_fix = bounce_fix;
    }

    /// Cast a ray straight down from the proxy, ignoring the proxy itself.
    ///
    /// The ray spans `max_distance` from the proxy's origin; the hit fraction
    /// is relative to that span.
    pub fn ground_probe(&self, world: &dyn CollisionWorld, max_distance: f32) -> RayResult {
        let from = Point3::from(self.position());
        let to = from - self.up() * max_distance;
        let filter = ClosestNotMeRayFilter::new(self.ghost.handle(), *self.ghost.filter());
        world.ray_test(&from, &to, &filter)
    }
}

/// Sweep against the whole world or only the ghost's overlapping pairs.
pub(super) fn sweep(
    world: &dyn CollisionWorld,
    ghost: &GhostObject,
    use_ghost_sweep_test: bool,
    shape: &ConvexShape,
    from: &Vec3,
    to: &Vec3,
    filter: &dyn HitFilter,
) -> SweepResult {
    let allowed_penetration = world.dispatch_info().allowed_ccd_penetration;
    let from = Iso::translation(from.x, from.y, from.z);
    let to = Iso::translation(to.x, to.y, to.z);
    if use_ghost_sweep_test {
        world.ghost_convex_sweep_test(ghost, shape, &from, &to, filter, allowed_penetration)
    } else {
        world.convex_sweep_test(shape, &from, &to, filter, allowed_penetration)
    }
}

impl ActionInterface for KinematicCharacterController {
    fn update_action(&mut self, world: &mut dyn CollisionWorld, dt: f32) {
        self.pre_step(world);
        self.player_step(world, dt);
    }
}

impl CharacterController for KinematicCharacterController {
    fn set_walk_direction(&mut self, walk_direction: Vec3) {
        self.state.use_walk_direction = true;
        self.state.walk_direction = walk_direction;
        self.state.normalized_direction = normalized_or_zero(&walk_direction);
    }

    fn set_velocity_for_time_interval(&mut self, velocity: Vec3, time_interval: f32) {
        self.state.use_walk_direction = false;
        self.state.walk_direction = velocity;
        self.state.normalized_direction = normalized_or_zero(&velocity);
        self.state.velocity_time_interval = time_interval;
    }

    fn reset(&mut self, world: &mut dyn CollisionWorld) {
        let state = &mut self.state;
        state.vertical_velocity = 0.0;
        state.vertical_offset = 0.0;
        state.was_on_ground = false;
        state.was_jumping = false;
        state.walk_direction = Vec3::zeros();
        state.normalized_direction = Vec3::zeros();
        state.velocity_time_interval = 0.0;

        while let Some(pair) = self.ghost.pair_cache().pairs().first() {
            let (proxy0, proxy1) = (pair.proxy0, pair.proxy1);
            let before = self.ghost.num_overlapping_objects();
            world.remove_overlapping_pair(&mut self.ghost, proxy0, proxy1);
            if self.ghost.num_overlapping_objects() == before {
                // The world refused to drop the pair; clear locally instead of spinning.
                self.ghost.pair_cache_mut().remove_pair(proxy0, proxy1);
            }
        }
    }

    fn warp(&mut self, origin: Vec3) {
        self.ghost.set_translation(origin);
    }

    fn pre_step(&mut self, world: &mut dyn CollisionWorld) {
        self.state.touching_contact = false;
        let mut passes = 0;
        while self.recover_from_penetration(world) {
            passes += 1;
            self.state.touching_contact = true;
            if passes >= MAX_PENETRATION_LOOPS {
                log::debug!(
                    "kcc {}: penetration not resolved after {passes} passes",
                    self.ghost.handle()
                );
                break;
            }
        }

        self.state.current_position = self.ghost.translation();
        self.state.target_position = self.state.current_position;
    }

    fn player_step(&mut self, world: &dyn CollisionWorld, dt: f32) {
        if !self.state.use_walk_direction && self.state.velocity_time_interval <= 0.0 {
            return;
        }

        self.state.was_on_ground = self.on_ground();

        let settings = self.settings;
        let state = &mut self.state;
        state.vertical_velocity -= settings.gravity * dt;
        if state.vertical_velocity > 0.0 && state.vertical_velocity > settings.jump_speed {
            state.vertical_velocity = settings.jump_speed;
        }
        if state.vertical_velocity < 0.0 && state.vertical_velocity.abs() > settings.fall_speed.abs()
        {
            state.vertical_velocity = -settings.fall_speed.abs();
        }
        state.vertical_offset = state.vertical_velocity * dt;

        self.step_up(world);

        let walk_move = if self.state.use_walk_direction {
            self.state.walk_direction
        } else {
            let dt_moving = dt.min(self.state.velocity_time_interval);
            self.state.velocity_time_interval -= dt;
            self.state.walk_direction * dt_moving
        };
        self.step_forward_and_strafe(world, walk_move);

        self.step_down(world, dt);

        self.ghost.set_translation(self.state.current_position);
        log::trace!(
            "kcc {}: committed {:?}, vertical velocity {}",
            self.ghost.handle(),
            self.state.current_position,
            self.state.vertical_velocity
        );
    }

    fn can_jump(&self) -> bool {
        self.on_ground()
    }

    fn jump(&mut self) {
        if self.can_jump() {
            self.state.vertical_velocity = self.settings.jump_speed;
            self.state.was_jumping = true;
        }
    }

    fn jump_towards(&mut self, _direction: Vec3) {
        self.jump();
    }

    fn on_ground(&self) -> bool {
        self.state.vertical_velocity == 0.0 && self.state.vertical_offset == 0.0
    }

    fn set_up_interpolate(&mut self, interpolate: bool) {
        self.settings.interpolate_up = interpolate;
    }
}
