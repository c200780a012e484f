/*!
Core collision types and math aliases shared by the collision submodules.

This module intentionally contains no algorithms. It defines the data types
exchanged between:
- the collision world (broad phase, narrow phase, query backends)
- result filters (which hits a query is allowed to report)
- the kinematic character controller

Query results are transient: a `SweepResult` is produced by one query, consumed
by the caller and dropped. Nothing here holds a reference back into a world.
*/

use std::fmt;

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// Stable identifier of a collision object registered in a collision world.
///
/// Handles are never reused by [`QueryWorld`](super::QueryWorld), so a stale
/// handle resolves to "no object" rather than to a different one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub u32);

impl ObjectHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One of the three principal axes, used as the controller's "up".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UpAxis {
    X,
    #[default]
    Y,
    Z,
}

impl UpAxis {
    /// Map an axis index to an axis, clamping out-of-range values to `0..=2`.
    pub fn from_index(index: i32) -> Self {
        match index.clamp(0, 2) {
            0 => Self::X,
            1 => Self::Y,
            _ => Self::Z,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Unit vector pointing along the positive axis.
    #[inline]
    pub fn direction(self) -> Vec3 {
        match self {
            Self::X => Vec3::x(),
            Self::Y => Vec3::y(),
            Self::Z => Vec3::z(),
        }
    }
}

/// A single accepted hit reported by a sweep or ray query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepHit {
    /// Fraction (0..1) of the tested motion where the hit occurred.
    pub fraction: f32,
    /// World-space contact point on the hit object.
    pub point: Point3,
    /// World-space surface normal of the hit object at `point`.
    pub normal: Vec3,
    /// The object that was hit.
    pub object: ObjectHandle,
}

/// Outcome of a sweep or ray query: the closest hit accepted by the query's filter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SweepResult {
    pub hit: Option<SweepHit>,
}

/// Ray queries report the same data as sweeps.
pub type RayResult = SweepResult;

impl SweepResult {
    #[inline]
    pub fn no_hit() -> Self {
        Self { hit: None }
    }

    #[inline]
    pub fn has_hit(&self) -> bool {
        self.hit.is_some()
    }

    /// Fraction of the motion that was free; 1.0 when nothing was hit.
    #[inline]
    pub fn closest_hit_fraction(&self) -> f32 {
        self.hit.map_or(1.0, |hit| hit.fraction)
    }

    /// World-space hit normal, if any.
    #[inline]
    pub fn hit_normal(&self) -> Option<Vec3> {
        self.hit.map(|hit| hit.normal)
    }

    /// World-space hit point, if any.
    #[inline]
    pub fn hit_point(&self) -> Option<Point3> {
        self.hit.map(|hit| hit.point)
    }
}

impl From<Option<SweepHit>> for SweepResult {
    fn from(hit: Option<SweepHit>) -> Self {
        Self { hit }
    }
}
