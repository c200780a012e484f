use rapier3d::parry::{
    query::{self, Ray, RayCast, ShapeCastOptions},
    shape::Shape,
};

use super::types::{Iso, Point3, Vec3};

/// Raw narrow-phase hit against one object, before filtering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectHit {
    /// Fraction (0..1) of the motion where the hit occurred.
    pub fraction: f32,
    /// World-space point on the object's surface.
    pub point: Point3,
    /// World-space outward normal of the object at `point`.
    pub normal: Vec3,
}

/// Raw contact between two shapes, in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectContact {
    /// Signed separation; negative when the shapes overlap.
    pub distance: f32,
    pub point1: Point3,
    pub point2: Point3,
    /// Outward normal of the second shape, pointing towards the first.
    pub normal2: Vec3,
}

/// Cast `shape` along `motion` from `from` against a static object.
///
/// `motion` is the full translation of the sweep, so the returned fraction is
/// directly the fraction of that translation. With `stop_at_penetration` off,
/// initially overlapping shapes whose motion does not deepen the overlap are
/// not reported.
pub fn cast_shape_against_object(
    shape: &dyn Shape,
    from: &Iso,
    motion: &Vec3,
    object_shape: &dyn Shape,
    object_pos: &Iso,
    stop_at_penetration: bool,
) -> Option<ObjectHit> {
    let mut opts = ShapeCastOptions::with_max_time_of_impact(1.0);
    opts.stop_at_penetration = stop_at_penetration;

    match query::cast_shapes(
        from,
        motion,
        shape,
        object_pos,
        &Vec3::zeros(),
        object_shape,
        opts,
    ) {
        Ok(Some(hit)) => Some(ObjectHit {
            fraction: hit.time_of_impact.clamp(0.0, 1.0),
            point: object_pos * hit.witness2,
            normal: object_pos.rotation * hit.normal2.into_inner(),
        }),
        Ok(None) => None,
        Err(_) => {
            log::warn!("shape cast: unsupported shape pair, treating as a miss");
            None
        }
    }
}

/// Closest contact between two shapes, if they are closer than `prediction`.
pub fn contact_between(
    pos1: &Iso,
    shape1: &dyn Shape,
    pos2: &Iso,
    shape2: &dyn Shape,
    prediction: f32,
) -> Option<ObjectContact> {
    match query::contact(pos1, shape1, pos2, shape2, prediction) {
        Ok(Some(contact)) => Some(ObjectContact {
            distance: contact.dist,
            point1: contact.point1,
            point2: contact.point2,
            normal2: contact.normal2.into_inner(),
        }),
        Ok(None) => None,
        Err(_) => {
            log::warn!("contact: unsupported shape pair, treating as separated");
            None
        }
    }
}

/// Cast the segment `from -> to` against an object.
pub fn cast_ray_against_object(
    from: &Point3,
    to: &Point3,
    object_shape: &dyn Shape,
    object_pos: &Iso,
) -> Option<ObjectHit> {
    let dir = to - from;
    let ray = Ray::new(*from, dir);
    object_shape
        .cast_ray_and_get_normal(object_pos, &ray, 1.0, true)
        .map(|hit| ObjectHit {
            fraction: hit.time_of_impact,
            point: ray.point_at(hit.time_of_impact),
            normal: hit.normal,
        })
}
