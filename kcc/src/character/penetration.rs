use rapier3d::parry::bounding_volume::BoundingVolume;
use smallvec::SmallVec;

use crate::collision::{
    CollisionWorld, PersistentManifold, settings::PENETRATION_RECOVERY_FACTOR,
};

use super::KinematicCharacterController;

impl KinematicCharacterController {
    /// One penetration-recovery pass.
    ///
    /// Refreshes the proxy's pairs and contacts, moves the proxy a fraction of
    /// the way out of every penetrating contact and commits the result.
    /// Returns whether any penetration was found.
    pub(super) fn recover_from_penetration(&mut self, world: &mut dyn CollisionWorld) -> bool {
        let aabb = self
            .shape
            .aabb(self.ghost.world_transform())
            .loosened(world.dispatch_info().contact_breaking_threshold);
        world.set_aabb(&mut self.ghost, aabb);
        world.dispatch_all_collision_pairs(&mut self.ghost);

        let me = self.ghost.handle();
        let mut position = self.ghost.translation();
        let mut max_penetration = 0.0f32;
        let mut penetration = false;

        {
            let mut manifolds: SmallVec<[&PersistentManifold; 4]> = SmallVec::new();
            for pair in self.ghost.pair_cache().pairs() {
                manifolds.clear();

                if !world.has_contact_response(pair.proxy0)
                    || !world.has_contact_response(pair.proxy1)
                {
                    continue;
                }

                pair.contact_manifolds(&mut manifolds);
                for manifold in &manifolds {
                    let direction_sign = if manifold.body0 == me { -1.0 } else { 1.0 };
                    for point in &manifold.points {
                        let dist = point.distance;
                        if dist >= 0.0 {
                            continue;
                        }
                        if dist < max_penetration {
                            max_penetration = dist;
                            self.state.touching_normal = point.normal_world_on_b * direction_sign;
                        }
                        position += point.normal_world_on_b
                            * (direction_sign * dist * PENETRATION_RECOVERY_FACTOR);
                        penetration = true;
                    }
                }
            }
        }

        if penetration {
            log::trace!(
                "kcc {me}: recovering from penetration {max_penetration}, normal {:?}",
                self.state.touching_normal
            );
        }

        self.state.current_position = position;
        self.ghost.set_translation(position);
        penetration
    }
}
