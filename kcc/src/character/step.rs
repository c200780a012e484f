use crate::collision::{
    ClosestNotMeConvexFilter, CollisionWorld, MarginGuard, Vec3,
    settings::{MAX_STRAFE_ITERATIONS, MIN_STRAFE_FRACTION, SIMD_EPSILON, STEP_UP_SLOPE_DOT},
};

use super::{
    KinematicCharacterController,
    controller::sweep,
    geometry::{perpendicular_component, reflection_direction},
};

impl KinematicCharacterController {
    /// Rise by the step height plus any pending upward offset, stopping early
    /// at a walkable surface overhead.
    pub(super) fn step_up(&mut self, world: &dyn CollisionWorld) {
        let up = self.up();
        let step_height = self.settings.step_height;
        let state = &mut self.state;

        state.target_position =
            state.current_position + up * (step_height + state.vertical_offset.max(0.0));
        let start = state.current_position + up * (self.shape.margin() + self.settings.added_margin);

        let filter = ClosestNotMeConvexFilter::new(
            self.ghost.handle(),
            up,
            STEP_UP_SLOPE_DOT,
            *self.ghost.filter(),
        );
        let result = sweep(
            world,
            &self.ghost,
            self.settings.use_ghost_sweep_test,
            &self.shape,
            &start,
            &state.target_position,
            &filter,
        );

        match result.hit {
            Some(hit) => {
                state.current_step_offset = step_height * hit.fraction;
                state.current_position = if self.settings.interpolate_up {
                    state.current_position.lerp(&state.target_position, hit.fraction)
                } else {
                    state.target_position
                };
                state.vertical_velocity = 0.0;
                state.vertical_offset = 0.0;
                log::trace!("kcc step up: blocked at fraction {}", hit.fraction);
            }
            None => {
                state.current_step_offset = step_height;
                state.current_position = state.target_position;
            }
        }
    }

    /// Retarget along the obstacle surface after a hit: keep only the part of
    /// the reflected direction that is tangent to `hit_normal`.
    fn update_target_position_based_on_collision(&mut self, hit_normal: &Vec3) {
        let state = &mut self.state;
        let movement = state.target_position - state.current_position;
        let movement_length = movement.norm();
        if movement_length <= SIMD_EPSILON {
            return;
        }
        let movement_direction = movement / movement_length;

        let reflect_dir = reflection_direction(&movement_direction, hit_normal);
        let reflect_len = reflect_dir.norm();
        if reflect_len <= SIMD_EPSILON {
            state.target_position = state.current_position;
            return;
        }
        let reflect_dir = reflect_dir / reflect_len;

        let perpendicular_dir = perpendicular_component(&reflect_dir, hit_normal);
        state.target_position = state.current_position + perpendicular_dir * movement_length;
    }

    /// Move by `walk_move`, sliding along obstacles for a bounded number of
    /// iterations.
    pub(super) fn step_forward_and_strafe(&mut self, world: &dyn CollisionWorld, walk_move: Vec3) {
        self.state.target_position = self.state.current_position + walk_move;
        if walk_move.norm() < SIMD_EPSILON {
            return;
        }

        if self.settings.deflect_touching_contact
            && self.state.touching_contact
            && self.state.normalized_direction.dot(&self.state.touching_normal) > 0.0
        {
            let touching_normal = self.state.touching_normal;
            self.update_target_position_based_on_collision(&touching_normal);
        }

        let mut fraction = 1.0f32;
        let mut iterations = MAX_STRAFE_ITERATIONS;
        while fraction > MIN_STRAFE_FRACTION && iterations > 0 {
            iterations -= 1;

            let current = self.state.current_position;
            let target = self.state.target_position;
            let sweep_dir_negative = current - target;
            let filter = ClosestNotMeConvexFilter::new(
                self.ghost.handle(),
                sweep_dir_negative,
                0.0,
                *self.ghost.filter(),
            );

            let result = {
                let shape = MarginGuard::expand(&mut self.shape, self.settings.added_margin);
                sweep(
                    world,
                    &self.ghost,
                    self.settings.use_ghost_sweep_test,
                    &shape,
                    &current,
                    &target,
                    &filter,
                )
            };

            fraction -= result.closest_hit_fraction();

            let Some(hit) = result.hit else {
                self.state.current_position = target;
                break;
            };

            log::trace!(
                "kcc step forward: hit {} at fraction {}, normal {:?}",
                hit.object,
                hit.fraction,
                hit.normal
            );
            self.update_target_position_based_on_collision(&hit.normal);

            let current_dir = self.state.target_position - self.state.current_position;
            if current_dir.norm_squared() <= SIMD_EPSILON {
                break;
            }
            // Reversing against the requested direction only oscillates in corners.
            if current_dir.normalize().dot(&self.state.normalized_direction) <= 0.0 {
                break;
            }
        }
    }

    /// Apply the tick's downward displacement: land on walkable ground within
    /// reach, otherwise fall by the full drop.
    pub(super) fn step_down(&mut self, world: &dyn CollisionWorld, dt: f32) {
        let up = self.up();
        let settings = self.settings;
        let grounded_or_not_jumping = self.state.was_on_ground || !self.state.was_jumping;

        let mut down_velocity = (-self.state.vertical_velocity).max(0.0) * dt;
        if down_velocity > settings.fall_speed && grounded_or_not_jumping {
            down_velocity = settings.fall_speed;
        }

        let start = self.state.current_position;
        let mut step_drop = up * (self.state.current_step_offset + down_velocity);
        let filter = ClosestNotMeConvexFilter::new(
            self.ghost.handle(),
            up,
            self.max_slope_cosine,
            *self.ghost.filter(),
        );

        let mut ran_once = false;
        let (primary, target) = loop {
            let target = start - step_drop;
            let primary = sweep(
                world,
                &self.ghost,
                settings.use_ghost_sweep_test,
                &self.shape,
                &start,
                &target,
                &filter,
            );
            // Probe twice as far to tell a small drop from a long fall.
            let secondary_hit = !primary.has_hit()
                && sweep(
                    world,
                    &self.ghost,
                    settings.use_ghost_sweep_test,
                    &self.shape,
                    &start,
                    &(target - step_drop),
                    &filter,
                )
                .has_hit();

            let has_hit = if settings.bounce_fix {
                primary.has_hit() || secondary_hit
            } else {
                secondary_hit
            };

            let fall_distance = (-self.state.vertical_velocity).max(0.0) * dt;
            if fall_distance > 0.0
                && fall_distance < settings.step_height
                && has_hit
                && !ran_once
                && grounded_or_not_jumping
            {
                // Small drop: retry with a full step so stairs are followed down.
                step_drop = up * (self.state.current_step_offset + settings.step_height);
                ran_once = true;
                continue;
            }
            break (primary, target);
        };

        let state = &mut self.state;
        state.target_position = target;

        if primary.has_hit() || ran_once {
            let mut fraction = primary.closest_hit_fraction();
            if settings.bounce_fix && !state.full_drop {
                if let Some(point) = primary.hit_point() {
                    let drop = (start - target).dot(&up);
                    if drop > SIMD_EPSILON {
                        let bottom = start.dot(&up) - self.shape.extent_along(settings.up_axis);
                        fraction = ((bottom - point.coords.dot(&up)) / drop).clamp(0.0, 1.0);
                    }
                }
            }
            state.current_position = start.lerp(&target, fraction);
            state.full_drop = false;
            state.vertical_velocity = 0.0;
            state.vertical_offset = 0.0;
            state.was_jumping = false;
            log::trace!("kcc step down: landed at fraction {fraction}");
        } else {
            state.full_drop = true;
            if settings.bounce_fix {
                let speed_drop = (-state.vertical_velocity).max(0.0) * dt;
                if speed_drop > settings.fall_speed && grounded_or_not_jumping {
                    state.target_position =
                        start - up * (state.current_step_offset + settings.fall_speed);
                }
            }
            state.current_position = state.target_position;
        }
    }
}
