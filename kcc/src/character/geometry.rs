use crate::collision::{Vec3, settings::SIMD_EPSILON};

/// Mirror `direction` about the plane with unit `normal`.
#[inline]
pub fn reflection_direction(direction: &Vec3, normal: &Vec3) -> Vec3 {
    direction - normal * (2.0 * direction.dot(normal))
}

/// Component of `direction` along unit `normal`.
#[inline]
pub fn parallel_component(direction: &Vec3, normal: &Vec3) -> Vec3 {
    normal * direction.dot(normal)
}

/// Component of `direction` orthogonal to unit `normal`.
#[inline]
pub fn perpendicular_component(direction: &Vec3, normal: &Vec3) -> Vec3 {
    direction - parallel_component(direction, normal)
}

/// Unit vector along `v`, or zero when `v` is too short to normalize.
#[inline]
pub fn normalized_or_zero(v: &Vec3) -> Vec3 {
    if v.norm() < SIMD_EPSILON {
        Vec3::zeros()
    } else {
        v.normalize()
    }
}
