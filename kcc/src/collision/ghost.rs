/*!
Kinematic proxy registered in a collision world.

A [`GhostObject`] has a world transform, a broadphase handle and a collision
filter, but no mass or velocity. The world keeps its overlapping pair cache
current (`CollisionWorld::set_aabb`) and fills per-pair contact manifolds
(`CollisionWorld::dispatch_all_collision_pairs`).
*/

use smallvec::SmallVec;

use super::{
    filter::CollisionFilter,
    types::{Iso, ObjectHandle, Point3, Vec3},
};

/// One contact point between the two bodies of a manifold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ManifoldPoint {
    /// Signed separation; negative when the bodies overlap.
    pub distance: f32,
    /// Contact normal in world space, pointing from body 1 towards body 0.
    pub normal_world_on_b: Vec3,
    pub position_world_on_a: Point3,
    pub position_world_on_b: Point3,
}

/// Contact points between two objects.
#[derive(Clone, Debug, PartialEq)]
pub struct PersistentManifold {
    pub body0: ObjectHandle,
    pub body1: ObjectHandle,
    pub points: SmallVec<[ManifoldPoint; 4]>,
}

impl PersistentManifold {
    pub fn new(body0: ObjectHandle, body1: ObjectHandle) -> Self {
        Self {
            body0,
            body1,
            points: SmallVec::new(),
        }
    }

    #[inline]
    pub fn num_contacts(&self) -> usize {
        self.points.len()
    }
}

/// An overlapping pair of broadphase proxies, stored with `proxy0 < proxy1`.
#[derive(Clone, Debug, PartialEq)]
pub struct BroadphasePair {
    pub proxy0: ObjectHandle,
    pub proxy1: ObjectHandle,
    /// Filled by contact dispatch; `None` until the pair has been dispatched.
    pub manifold: Option<PersistentManifold>,
}

impl BroadphasePair {
    pub fn new(a: ObjectHandle, b: ObjectHandle) -> Self {
        Self {
            proxy0: a.min(b),
            proxy1: a.max(b),
            manifold: None,
        }
    }

    /// The proxy on the other side of the pair from `handle`.
    #[inline]
    pub fn other(&self, handle: ObjectHandle) -> ObjectHandle {
        if self.proxy0 == handle {
            self.proxy1
        } else {
            self.proxy0
        }
    }

    /// Append this pair's manifolds to `out`.
    pub fn contact_manifolds<'a>(&'a self, out: &mut SmallVec<[&'a PersistentManifold; 4]>) {
        if let Some(manifold) = &self.manifold {
            out.push(manifold);
        }
    }
}

/// Overlapping pairs of a single ghost.
#[derive(Clone, Debug, Default)]
pub struct OverlappingPairCache {
    pairs: Vec<BroadphasePair>,
}

impl OverlappingPairCache {
    /// Add a pair unless it is already present. Returns whether it was added.
    pub fn add_pair(&mut self, a: ObjectHandle, b: ObjectHandle) -> bool {
        let pair = BroadphasePair::new(a, b);
        if self.find(pair.proxy0, pair.proxy1).is_some() {
            return false;
        }
        self.pairs.push(pair);
        true
    }

    /// Remove a pair. Returns whether it was present.
    pub fn remove_pair(&mut self, a: ObjectHandle, b: ObjectHandle) -> bool {
        let (lo, hi) = (a.min(b), a.max(b));
        match self.find(lo, hi) {
            Some(index) => {
                self.pairs.swap_remove(index);
                true
            }
            None => false,
        }
    }

    pub fn retain(&mut self, f: impl FnMut(&BroadphasePair) -> bool) {
        self.pairs.retain(f);
    }

    #[inline]
    pub fn pairs(&self) -> &[BroadphasePair] {
        &self.pairs
    }

    #[inline]
    pub fn pairs_mut(&mut self) -> &mut [BroadphasePair] {
        &mut self.pairs
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn find(&self, lo: ObjectHandle, hi: ObjectHandle) -> Option<usize> {
        self.pairs
            .iter()
            .position(|p| p.proxy0 == lo && p.proxy1 == hi)
    }
}

/// Kinematic proxy moved by the character controller.
#[derive(Clone, Debug)]
pub struct GhostObject {
    handle: ObjectHandle,
    transform: Iso,
    filter: CollisionFilter,
    pair_cache: OverlappingPairCache,
}

impl GhostObject {
    pub fn new(handle: ObjectHandle, transform: Iso, filter: CollisionFilter) -> Self {
        Self {
            handle,
            transform,
            filter,
            pair_cache: OverlappingPairCache::default(),
        }
    }

    #[inline]
    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    #[inline]
    pub fn world_transform(&self) -> &Iso {
        &self.transform
    }

    #[inline]
    pub fn set_world_transform(&mut self, transform: Iso) {
        self.transform = transform;
    }

    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.transform.translation.vector
    }

    /// Move the proxy, keeping its rotation.
    #[inline]
    pub fn set_translation(&mut self, translation: Vec3) {
        self.transform.translation.vector = translation;
    }

    #[inline]
    pub fn filter(&self) -> &CollisionFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: CollisionFilter) {
        self.filter = filter;
    }

    #[inline]
    pub fn pair_cache(&self) -> &OverlappingPairCache {
        &self.pair_cache
    }

    #[inline]
    pub fn pair_cache_mut(&mut self) -> &mut OverlappingPairCache {
        &mut self.pair_cache
    }

    #[inline]
    pub fn num_overlapping_objects(&self) -> usize {
        self.pair_cache.len()
    }

    /// Handles of every object currently overlapping this proxy.
    pub fn overlapping_objects(&self) -> impl Iterator<Item = ObjectHandle> + '_ {
        let me = self.handle;
        self.pair_cache.pairs().iter().map(move |p| p.other(me))
    }
}
