/*!
`QueryWorld`: a small [`CollisionWorld`] backed by parry queries.

Objects live in a slab indexed by [`ObjectHandle`]; slots are never reused.
The broad phase is a linear scan over cached world-space AABBs, with planes
treated as overlapping everything. There is no dynamics and no persistent
contact graph: contacts are regenerated on demand for a ghost's pairs.
*/

use rapier3d::parry::{
    bounding_volume::Aabb,
    shape::{ShapeType, SharedShape},
};

use super::{
    broad::{self, ProxyBounds},
    filter::{CollisionFilter, HitFilter, ObjectInfo},
    ghost::{GhostObject, ManifoldPoint, PersistentManifold},
    narrow_phase,
    shape::ConvexShape,
    types::{Iso, ObjectHandle, Point3, RayResult, SweepHit, SweepResult},
    world::{CollisionWorld, DispatchInfo},
};
use crate::error::WorldError;

/// Description of an object to insert into a [`QueryWorld`].
#[derive(Clone)]
pub struct CollisionObject {
    pub shape: SharedShape,
    pub position: Iso,
    pub filter: CollisionFilter,
    /// Objects without contact response are ignored by the controller's
    /// sweeps and penetration recovery (triggers, sensors).
    pub contact_response: bool,
}

impl CollisionObject {
    pub fn new(shape: SharedShape, position: Iso) -> Self {
        Self {
            shape,
            position,
            filter: CollisionFilter::default(),
            contact_response: true,
        }
    }

    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_contact_response(mut self, contact_response: bool) -> Self {
        self.contact_response = contact_response;
        self
    }
}

struct WorldObject {
    shape: SharedShape,
    position: Iso,
    filter: CollisionFilter,
    contact_response: bool,
    bounds: ProxyBounds,
}

impl WorldObject {
    fn info(&self, handle: ObjectHandle) -> ObjectInfo {
        ObjectInfo {
            handle,
            filter: self.filter,
            has_contact_response: self.contact_response,
        }
    }

    fn refresh_bounds(&mut self) {
        let aabb = self.shape.compute_aabb(&self.position);
        self.bounds = if self.shape.shape_type() == ShapeType::HalfSpace {
            ProxyBounds::unbounded(aabb)
        } else {
            ProxyBounds::bounded(aabb)
        };
    }
}

#[derive(Default)]
pub struct QueryWorld {
    objects: Vec<Option<WorldObject>>,
    dispatch_info: DispatchInfo,
}

fn is_finite_pose(pos: &Iso) -> bool {
    pos.translation.vector.iter().all(|c| c.is_finite())
        && pos.rotation.coords.iter().all(|c| c.is_finite())
}

impl QueryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dispatch_info(dispatch_info: DispatchInfo) -> Self {
        Self {
            objects: Vec::new(),
            dispatch_info,
        }
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert_object(&mut self, object: CollisionObject) -> Result<ObjectHandle, WorldError> {
        if !is_finite_pose(&object.position) {
            return Err(WorldError::NonFinitePosition);
        }
        let handle = ObjectHandle(self.objects.len() as u32);
        let mut entry = WorldObject {
            shape: object.shape,
            position: object.position,
            filter: object.filter,
            contact_response: object.contact_response,
            bounds: ProxyBounds::bounded(Aabb::new_invalid()),
        };
        entry.refresh_bounds();
        log::debug!(
            "query world: inserted object {handle} ({:?})",
            entry.shape.shape_type()
        );
        self.objects.push(Some(entry));
        Ok(handle)
    }

    /// Register a controller proxy with the given shape and return its ghost.
    ///
    /// The ghost is also an ordinary object of the world, so other queries
    /// see it as an obstacle.
    pub fn add_ghost(
        &mut self,
        shape: &ConvexShape,
        transform: Iso,
        filter: CollisionFilter,
    ) -> Result<GhostObject, WorldError> {
        let handle = self.insert_object(
            CollisionObject::new(shape.to_shared_shape(), transform).with_filter(filter),
        )?;
        Ok(GhostObject::new(handle, transform, filter))
    }

    pub fn set_object_position(
        &mut self,
        handle: ObjectHandle,
        position: Iso,
    ) -> Result<(), WorldError> {
        if !is_finite_pose(&position) {
            return Err(WorldError::NonFinitePosition);
        }
        let object = self
            .object_mut(handle)
            .ok_or(WorldError::UnknownObject(handle))?;
        object.position = position;
        object.refresh_bounds();
        Ok(())
    }

    pub fn remove_object(&mut self, handle: ObjectHandle) -> Result<(), WorldError> {
        match self.objects.get_mut(handle.index()) {
            Some(slot @ Some(_)) => {
                *slot = None;
                log::debug!("query world: removed object {handle}");
                Ok(())
            }
            _ => Err(WorldError::UnknownObject(handle)),
        }
    }

    pub fn object_position(&self, handle: ObjectHandle) -> Option<Iso> {
        self.object(handle).map(|o| o.position)
    }

    pub fn object_info(&self, handle: ObjectHandle) -> Option<ObjectInfo> {
        self.object(handle).map(|o| o.info(handle))
    }

    fn object(&self, handle: ObjectHandle) -> Option<&WorldObject> {
        self.objects.get(handle.index()).and_then(Option::as_ref)
    }

    fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut WorldObject> {
        self.objects.get_mut(handle.index()).and_then(Option::as_mut)
    }

    fn sweep_candidates(
        &self,
        candidates: impl IntoIterator<Item = usize>,
        shape: &ConvexShape,
        from: &Iso,
        to: &Iso,
        filter: &dyn HitFilter,
        allowed_penetration: f32,
    ) -> SweepResult {
        let motion = to.translation.vector - from.translation.vector;
        let stop_at_penetration = allowed_penetration <= 0.0;
        let mut best: Option<SweepHit> = None;

        shape.with_parry_shape(|cast_shape| {
            for index in candidates {
                let handle = ObjectHandle(index as u32);
                let Some(object) = self.object(handle) else {
                    continue;
                };
                let info = object.info(handle);
                if !filter.needs_collision(&info) {
                    continue;
                }
                let Some(hit) = narrow_phase::cast_shape_against_object(
                    cast_shape,
                    from,
                    &motion,
                    object.shape.as_ref(),
                    &object.position,
                    stop_at_penetration,
                ) else {
                    continue;
                };
                let hit = SweepHit {
                    fraction: hit.fraction,
                    point: hit.point,
                    normal: hit.normal,
                    object: handle,
                };
                if best.is_some_and(|b| b.fraction <= hit.fraction) {
                    continue;
                }
                if filter.accept_hit(&hit, &info) {
                    best = Some(hit);
                }
            }
        });

        best.into()
    }
}

impl CollisionWorld for QueryWorld {
    fn dispatch_info(&self) -> &DispatchInfo {
        &self.dispatch_info
    }

    fn set_aabb(&mut self, ghost: &mut GhostObject, aabb: Aabb) {
        let me = ghost.handle();
        match self.object_mut(me) {
            Some(object) => {
                object.position = *ghost.world_transform();
                object.bounds = ProxyBounds::bounded(aabb);
            }
            None => {
                log::warn!("query world: set_aabb on unknown ghost {me}");
                return;
            }
        }

        let ghost_filter = *ghost.filter();
        let overlapping: Vec<ObjectHandle> =
            broad::query_candidates(&self.objects, |o| &o.bounds, &aabb)
                .into_iter()
                .map(|i| ObjectHandle(i as u32))
                .filter(|&h| h != me)
                .filter(|&h| {
                    self.object(h)
                        .is_some_and(|o| ghost_filter.test(&o.filter))
                })
                .collect();

        let cache = ghost.pair_cache_mut();
        cache.retain(|pair| overlapping.contains(&pair.other(me)));
        for other in overlapping {
            cache.add_pair(me, other);
        }
    }

    fn dispatch_all_collision_pairs(&mut self, ghost: &mut GhostObject) {
        let me = ghost.handle();
        let ghost_pos = *ghost.world_transform();
        let prediction = self.dispatch_info.contact_breaking_threshold;
        let Some(ghost_object) = self.object(me) else {
            log::warn!("query world: dispatch on unknown ghost {me}");
            return;
        };

        for pair in ghost.pair_cache_mut().pairs_mut() {
            let Some(other) = self.object(pair.other(me)) else {
                pair.manifold = None;
                continue;
            };

            // Body 0 of the manifold is always the lower handle of the pair.
            let (pos0, shape0, pos1, shape1) = if pair.proxy0 == me {
                (&ghost_pos, &ghost_object.shape, &other.position, &other.shape)
            } else {
                (&other.position, &other.shape, &ghost_pos, &ghost_object.shape)
            };

            let mut manifold = PersistentManifold::new(pair.proxy0, pair.proxy1);
            if let Some(contact) = narrow_phase::contact_between(
                pos0,
                shape0.as_ref(),
                pos1,
                shape1.as_ref(),
                prediction,
            ) {
                manifold.points.push(ManifoldPoint {
                    distance: contact.distance,
                    normal_world_on_b: contact.normal2,
                    position_world_on_a: contact.point1,
                    position_world_on_b: contact.point2,
                });
            }
            pair.manifold = Some(manifold);
        }
    }

    fn has_contact_response(&self, object: ObjectHandle) -> bool {
        self.object(object).is_some_and(|o| o.contact_response)
    }

    fn convex_sweep_test(
        &self,
        shape: &ConvexShape,
        from: &Iso,
        to: &Iso,
        filter: &dyn HitFilter,
        allowed_penetration: f32,
    ) -> SweepResult {
        let swept = broad::swept_aabb(
            shape,
            from,
            to,
            self.dispatch_info.contact_breaking_threshold,
        );
        let candidates = broad::query_candidates(&self.objects, |o| &o.bounds, &swept);
        self.sweep_candidates(candidates, shape, from, to, filter, allowed_penetration)
    }

    fn ghost_convex_sweep_test(
        &self,
        ghost: &GhostObject,
        shape: &ConvexShape,
        from: &Iso,
        to: &Iso,
        filter: &dyn HitFilter,
        allowed_penetration: f32,
    ) -> SweepResult {
        let swept = broad::swept_aabb(
            shape,
            from,
            to,
            self.dispatch_info.contact_breaking_threshold,
        );
        let candidates: Vec<usize> = ghost
            .overlapping_objects()
            .filter(|&h| self.object(h).is_some_and(|o| o.bounds.overlaps(&swept)))
            .map(ObjectHandle::index)
            .collect();
        self.sweep_candidates(candidates, shape, from, to, filter, allowed_penetration)
    }

    fn ray_test(&self, from: &Point3, to: &Point3, filter: &dyn HitFilter) -> RayResult {
        let segment = broad::segment_aabb(from, to);
        let mut best: Option<SweepHit> = None;

        for index in broad::query_candidates(&self.objects, |o| &o.bounds, &segment) {
            let handle = ObjectHandle(index as u32);
            let Some(object) = self.object(handle) else {
                continue;
            };
            let info = object.info(handle);
            if !filter.needs_collision(&info) {
                continue;
            }
            let Some(hit) = narrow_phase::cast_ray_against_object(
                from,
                to,
                object.shape.as_ref(),
                &object.position,
            ) else {
                continue;
            };
            let hit = SweepHit {
                fraction: hit.fraction,
                point: hit.point,
                normal: hit.normal,
                object: handle,
            };
            if best.is_some_and(|b| b.fraction <= hit.fraction) {
                continue;
            }
            if filter.accept_hit(&hit, &info) {
                best = Some(hit);
            }
        }

        best.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{filter::ClosestNotMeRayFilter, types::Vec3};
    use approx::assert_relative_eq;
    use rapier3d::{geometry::Group, parry::bounding_volume::BoundingVolume};

    fn ground() -> CollisionObject {
        CollisionObject::new(
            SharedShape::cuboid(20.0, 0.5, 20.0),
            Iso::translation(0.0, -0.5, 0.0),
        )
    }

    #[test]
    fn insert_rejects_non_finite_pose() {
        let mut world = QueryWorld::new();
        let bad = CollisionObject::new(SharedShape::ball(1.0), Iso::translation(f32::NAN, 0.0, 0.0));
        assert_eq!(world.insert_object(bad).err(), Some(WorldError::NonFinitePosition));
        assert!(world.is_empty());
    }

    #[test]
    fn removed_handles_are_not_reused() {
        let mut world = QueryWorld::new();
        let a = world.insert_object(ground()).unwrap();
        world.remove_object(a).unwrap();
        assert_eq!(world.remove_object(a), Err(WorldError::UnknownObject(a)));
        assert_eq!(
            world.set_object_position(a, Iso::identity()),
            Err(WorldError::UnknownObject(a))
        );
        let b = world.insert_object(ground()).unwrap();
        assert_ne!(a, b);
        assert_eq!(world.len(), 1);
        assert_eq!(world.object_position(a), None);
    }

    #[test]
    fn moved_object_is_found_at_its_new_pose() {
        let mut world = QueryWorld::new();
        let block = world
            .insert_object(CollisionObject::new(
                SharedShape::cuboid(0.5, 0.5, 0.5),
                Iso::translation(0.0, 0.0, 0.0),
            ))
            .unwrap();
        let moved = Iso::translation(0.0, 0.0, 5.0);
        world.set_object_position(block, moved).unwrap();
        assert_eq!(world.object_position(block), Some(moved));
        assert_eq!(
            world.set_object_position(block, Iso::translation(0.0, f32::INFINITY, 0.0)),
            Err(WorldError::NonFinitePosition)
        );

        let filter = ClosestNotMeRayFilter::new(ObjectHandle(u32::MAX), Default::default());
        let result = world.ray_test(
            &Point3::new(0.0, 0.0, 10.0),
            &Point3::new(0.0, 0.0, 0.0),
            &filter,
        );
        assert_eq!(result.hit.map(|hit| hit.object), Some(block));
        assert_relative_eq!(result.closest_hit_fraction(), 0.45, epsilon = 1.0e-4);
    }

    #[test]
    fn contact_breaking_threshold_controls_separated_contacts() {
        let shape = ConvexShape::capsule_y(0.5, 0.4);
        // Capsule bottom hovers 0.05 above the floor.
        let start = Iso::translation(0.0, 0.95, 0.0);

        let mut near = QueryWorld::new();
        near.insert_object(ground()).unwrap();
        let mut ghost = near.add_ghost(&shape, start, Default::default()).unwrap();
        near.set_aabb(&mut ghost, shape.aabb(&start).loosened(0.1));
        near.dispatch_all_collision_pairs(&mut ghost);
        let manifold = ghost.pair_cache().pairs()[0].manifold.as_ref().unwrap();
        assert_eq!(manifold.num_contacts(), 0);

        let mut far = QueryWorld::with_dispatch_info(DispatchInfo {
            contact_breaking_threshold: 0.1,
            ..Default::default()
        });
        assert_relative_eq!(far.dispatch_info().contact_breaking_threshold, 0.1);
        far.insert_object(ground()).unwrap();
        let mut ghost = far.add_ghost(&shape, start, Default::default()).unwrap();
        far.set_aabb(&mut ghost, shape.aabb(&start).loosened(0.1));
        far.dispatch_all_collision_pairs(&mut ghost);
        let manifold = ghost.pair_cache().pairs()[0].manifold.as_ref().unwrap();
        assert_eq!(manifold.num_contacts(), 1);
        assert_relative_eq!(manifold.points[0].distance, 0.05, epsilon = 1.0e-4);
    }

    #[test]
    fn sweep_keeps_closest_accepted_hit() {
        let mut world = QueryWorld::new();
        let near = world
            .insert_object(CollisionObject::new(
                SharedShape::cuboid(0.5, 2.0, 2.0),
                Iso::translation(2.0, 0.0, 0.0),
            ))
            .unwrap();
        let far = world
            .insert_object(CollisionObject::new(
                SharedShape::cuboid(0.5, 2.0, 2.0),
                Iso::translation(5.0, 0.0, 0.0),
            ))
            .unwrap();

        let ball = ConvexShape::ball(0.5);
        let from = Iso::identity();
        let to = Iso::translation(8.0, 0.0, 0.0);
        let accept_all = |_: &SweepHit, _: &ObjectInfo| true;
        let result = world.convex_sweep_test(&ball, &from, &to, &accept_all, 0.0);
        let hit = result.hit.unwrap();
        assert_eq!(hit.object, near);
        assert_relative_eq!(hit.fraction, 1.0 / 8.0, epsilon = 1.0e-4);
        assert_relative_eq!(hit.normal, -Vec3::x(), epsilon = 1.0e-4);

        let skip_near = move |_: &SweepHit, o: &ObjectInfo| o.handle != near;
        let result = world.convex_sweep_test(&ball, &from, &to, &skip_near, 0.0);
        assert_eq!(result.hit.unwrap().object, far);
    }

    #[test]
    fn set_aabb_tracks_overlaps_and_respects_masks() {
        let mut world = QueryWorld::new();
        let floor = world.insert_object(ground()).unwrap();
        let ignored = world
            .insert_object(
                CollisionObject::new(SharedShape::ball(0.5), Iso::translation(0.0, 1.0, 0.0))
                    .with_filter(CollisionFilter::new(Group::GROUP_2, Group::GROUP_2)),
            )
            .unwrap();

        let shape = ConvexShape::capsule_y(0.5, 0.4);
        let filter = CollisionFilter::new(Group::GROUP_1, Group::GROUP_1);
        let mut ghost = world
            .add_ghost(&shape, Iso::translation(0.0, 0.9, 0.0), filter)
            .unwrap();
        let aabb = shape.aabb(ghost.world_transform()).loosened(0.02);
        world.set_aabb(&mut ghost, aabb);
        let others: Vec<_> = ghost.overlapping_objects().collect();
        assert_eq!(others, vec![floor]);
        assert!(!others.contains(&ignored));

        ghost.set_translation(Vec3::new(0.0, 10.0, 0.0));
        let aabb = shape.aabb(ghost.world_transform());
        world.set_aabb(&mut ghost, aabb);
        assert_eq!(ghost.num_overlapping_objects(), 0);
    }

    #[test]
    fn dispatch_orders_manifold_bodies_by_handle() {
        let shape = ConvexShape::capsule_y(0.5, 0.4);
        let mut world = QueryWorld::new();
        let mut ghost = world
            .add_ghost(&shape, Iso::translation(0.0, 0.8, 0.0), Default::default())
            .unwrap();
        let floor = world.insert_object(ground()).unwrap();

        let aabb = shape.aabb(ghost.world_transform());
        world.set_aabb(&mut ghost, aabb);
        world.dispatch_all_collision_pairs(&mut ghost);

        let manifold = ghost.pair_cache().pairs()[0].manifold.as_ref().unwrap();
        assert_eq!(manifold.body0, ghost.handle());
        assert_eq!(manifold.body1, floor);
        let point = manifold.points[0];
        assert_relative_eq!(point.distance, -0.1, epsilon = 1.0e-4);
        // Floor normal pointing towards the ghost.
        assert_relative_eq!(point.normal_world_on_b, Vec3::y(), epsilon = 1.0e-4);
    }

    #[test]
    fn ray_test_skips_the_caster() {
        let shape = ConvexShape::capsule_y(0.5, 0.4);
        let mut world = QueryWorld::new();
        world.insert_object(ground()).unwrap();
        let ghost = world
            .add_ghost(&shape, Iso::translation(0.0, 0.9, 0.0), Default::default())
            .unwrap();

        let filter = ClosestNotMeRayFilter::new(ghost.handle(), *ghost.filter());
        let result = world.ray_test(
            &Point3::new(0.0, 0.9, 0.0),
            &Point3::new(0.0, -1.1, 0.0),
            &filter,
        );
        let hit = result.hit.unwrap();
        assert_relative_eq!(hit.fraction, 0.45, epsilon = 1.0e-4);
        assert_relative_eq!(hit.normal, Vec3::y(), epsilon = 1.0e-4);
    }
}
