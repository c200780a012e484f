use rapier3d::parry::bounding_volume::{Aabb, BoundingVolume};

use super::{
    shape::ConvexShape,
    types::{Iso, Point3},
};

/// Broad-phase bounds of a registered object.
///
/// Infinite shapes (planes) have no meaningful AABB and are flagged
/// `unbounded`; they overlap every query.
#[derive(Clone, Copy, Debug)]
pub struct ProxyBounds {
    pub aabb: Aabb,
    pub unbounded: bool,
}

impl ProxyBounds {
    pub fn bounded(aabb: Aabb) -> Self {
        Self {
            aabb,
            unbounded: false,
        }
    }

    pub fn unbounded(aabb: Aabb) -> Self {
        Self {
            aabb,
            unbounded: true,
        }
    }

    #[inline]
    pub fn overlaps(&self, query: &Aabb) -> bool {
        self.unbounded || self.aabb.intersects(query)
    }
}

/// AABB covering `shape` over its whole motion from `from` to `to`.
///
/// The result is inflated by `skin` to conservatively include near misses.
pub fn swept_aabb(shape: &ConvexShape, from: &Iso, to: &Iso, skin: f32) -> Aabb {
    let swept = shape.aabb(from).merged(&shape.aabb(to));
    if skin > 0.0 {
        swept.loosened(skin)
    } else {
        swept
    }
}

/// AABB covering the segment from `from` to `to`.
pub fn segment_aabb(from: &Point3, to: &Point3) -> Aabb {
    Aabb::new(from.inf(to), from.sup(to))
}

/// Indices of the entries whose bounds overlap `query`. Empty slots are skipped.
pub fn query_candidates<'a, T: 'a>(
    entries: impl IntoIterator<Item = &'a Option<T>>,
    bounds: impl Fn(&T) -> &ProxyBounds,
    query: &Aabb,
) -> Vec<usize> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            entry
                .as_ref()
                .filter(|e| bounds(e).overlaps(query))
                .map(|_| i)
        })
        .collect()
}
