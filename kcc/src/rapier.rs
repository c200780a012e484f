use rapier3d::{
    na::UnitQuaternion,
    parry::shape::{HalfSpace, SharedShape},
    prelude::{UnitVector, Vector},
};

use crate::collision::{CollisionFilter, CollisionObject, Iso, ObjectHandle, QueryWorld};
use crate::error::WorldError;

/// Canonical, schema-agnostic definition of a world collision object.
#[derive(Clone, Debug)]
pub struct WorldObjectDef {
    pub id: u32,
    /// Placement of the object's origin.
    pub translation: Vector<f32>,
    /// Orientation; for planes this tilts the +Y normal.
    pub rotation: UnitQuaternion<f32>,
    /// Collision shape parameters.
    pub shape: ColliderShapeDef,
}

/// Supported world shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Unbounded half-space whose solid side lies below the plane.
    ///
    /// The plane normal is derived from the pose as `rotation * +Y`; the plane
    /// passes through the pose translation shifted by `offset_along_normal`.
    Plane {
        /// Extra shift of the plane along its own normal.
        offset_along_normal: f32,
    },

    /// Box, given by half-extents.
    Cuboid { half_extents: Vector<f32> },

    /// Ball.
    Sphere { radius: f32 },

    /// Capsule along local Y.
    CapsuleY { radius: f32, half_height: f32 },

    /// Cylinder along local Y.
    CylinderY { radius: f32, half_height: f32 },

    /// Box dilated by `border_radius`.
    RoundCuboid {
        half_extents: Vector<f32>,
        border_radius: f32,
    },
}

/// Build a collision object from a `WorldObjectDef`.
///
/// Planes are placed at `n * dist` with identity rotation, every other shape
/// uses the definition's pose directly.
pub fn collision_object_from_def(def: &WorldObjectDef) -> CollisionObject {
    let pose = Iso::from_parts(def.translation.into(), def.rotation);
    let (shape, position) = match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            // n ⋅ x = dist, where x is any point on the plane.
            let n = def.rotation * Vector::y();
            let dist = n.dot(&def.translation) + *offset_along_normal;
            let unit_n = UnitVector::new_normalize(n);
            (
                SharedShape::new(HalfSpace::new(unit_n)),
                Iso::translation(n.x * dist, n.y * dist, n.z * dist),
            )
        }

        ColliderShapeDef::Cuboid { half_extents } => (
            SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z),
            pose,
        ),

        ColliderShapeDef::Sphere { radius } => (SharedShape::ball(*radius), pose),

        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => (SharedShape::capsule_y(*half_height, *radius), pose),

        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => (SharedShape::cylinder(*half_height, *radius), pose),

        ColliderShapeDef::RoundCuboid {
            half_extents,
            border_radius,
        } => (
            SharedShape::round_cuboid(
                half_extents.x,
                half_extents.y,
                half_extents.z,
                *border_radius,
            ),
            pose,
        ),
    };
    CollisionObject::new(shape, position)
}

impl QueryWorld {
    /// Build a world from definitions, inserted in ascending `id` order.
    ///
    /// Every object gets `filter`. Returns the world with the handle assigned
    /// to each definition, in the same ascending order.
    pub fn from_defs(
        defs: &[WorldObjectDef],
        filter: CollisionFilter,
    ) -> Result<(Self, Vec<(u32, ObjectHandle)>), WorldError> {
        let mut sorted: Vec<&WorldObjectDef> = defs.iter().collect();
        sorted.sort_by_key(|def| def.id);

        let mut world = QueryWorld::new();
        let mut handles = Vec::with_capacity(sorted.len());
        for def in sorted {
            let handle = world.insert_object(collision_object_from_def(def).with_filter(filter))?;
            handles.push((def.id, handle));
        }
        log::debug!("query world: built {} objects from definitions", handles.len());
        Ok((world, handles))
    }
}
