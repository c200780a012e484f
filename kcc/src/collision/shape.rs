use std::ops::Deref;

use rapier3d::parry::{
    bounding_volume::Aabb,
    shape::{Ball, Capsule, Cuboid, RoundShape, Shape, SharedShape},
};

use super::{
    settings::DEFAULT_COLLISION_MARGIN,
    types::{Iso, UpAxis, Vec3},
};

/// Core geometry of a controller shape, before the margin is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConvexKind {
    Ball {
        radius: f32,
    },
    /// Capsule whose segment is aligned with `axis`.
    ///
    /// `half_height` is the half-length of the cylinder section, so the total
    /// length along the axis is `2 * half_height + 2 * radius`.
    Capsule {
        axis: UpAxis,
        half_height: f32,
        radius: f32,
    },
    Cuboid {
        half_extents: Vec3,
    },
}

/// Convex shape swept by the character controller.
///
/// The margin is a dilation applied uniformly on top of the core geometry:
/// balls and capsules grow their radius, cuboids get rounded edges. Sweeps
/// enlarge it temporarily through [`MarginGuard`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvexShape {
    kind: ConvexKind,
    margin: f32,
}

impl ConvexShape {
    pub fn new(kind: ConvexKind) -> Self {
        Self {
            kind,
            margin: DEFAULT_COLLISION_MARGIN,
        }
    }

    pub fn ball(radius: f32) -> Self {
        Self::new(ConvexKind::Ball { radius })
    }

    /// Capsule aligned with the given axis.
    pub fn capsule(axis: UpAxis, half_height: f32, radius: f32) -> Self {
        Self::new(ConvexKind::Capsule {
            axis,
            half_height,
            radius,
        })
    }

    /// Y-aligned capsule, the usual standing character.
    pub fn capsule_y(half_height: f32, radius: f32) -> Self {
        Self::capsule(UpAxis::Y, half_height, radius)
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::new(ConvexKind::Cuboid { half_extents })
    }

    #[inline]
    pub fn kind(&self) -> ConvexKind {
        self.kind
    }

    #[inline]
    pub fn margin(&self) -> f32 {
        self.margin
    }

    #[inline]
    pub fn set_margin(&mut self, margin: f32) {
        self.margin = margin;
    }

    /// Run `f` with a parry shape matching this shape and its current margin.
    ///
    /// The parry shape lives on the stack for the duration of the call, so
    /// queries do not allocate.
    pub fn with_parry_shape<R>(&self, f: impl FnOnce(&dyn Shape) -> R) -> R {
        let margin = self.margin.max(0.0);
        match self.kind {
            ConvexKind::Ball { radius } => f(&Ball::new(radius + margin)),
            ConvexKind::Capsule {
                axis,
                half_height,
                radius,
            } => {
                let radius = radius + margin;
                let capsule = match axis {
                    UpAxis::X => Capsule::new_x(half_height, radius),
                    UpAxis::Y => Capsule::new_y(half_height, radius),
                    UpAxis::Z => Capsule::new_z(half_height, radius),
                };
                f(&capsule)
            }
            ConvexKind::Cuboid { half_extents } => {
                if margin > 0.0 {
                    f(&RoundShape {
                        inner_shape: Cuboid::new(half_extents),
                        border_radius: margin,
                    })
                } else {
                    f(&Cuboid::new(half_extents))
                }
            }
        }
    }

    /// Build a shared parry shape for registering this shape in a world.
    pub fn to_shared_shape(&self) -> SharedShape {
        let margin = self.margin.max(0.0);
        match self.kind {
            ConvexKind::Ball { radius } => SharedShape::ball(radius + margin),
            ConvexKind::Capsule {
                axis,
                half_height,
                radius,
            } => {
                let radius = radius + margin;
                match axis {
                    UpAxis::X => SharedShape::capsule_x(half_height, radius),
                    UpAxis::Y => SharedShape::capsule_y(half_height, radius),
                    UpAxis::Z => SharedShape::capsule_z(half_height, radius),
                }
            }
            ConvexKind::Cuboid { half_extents } => {
                if margin > 0.0 {
                    SharedShape::round_cuboid(
                        half_extents.x,
                        half_extents.y,
                        half_extents.z,
                        margin,
                    )
                } else {
                    SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
                }
            }
        }
    }

    /// World-space AABB of the shape (margin included) at `pos`.
    pub fn aabb(&self, pos: &Iso) -> Aabb {
        self.with_parry_shape(|shape| shape.compute_aabb(pos))
    }

    /// Distance from the shape's origin to its surface along a principal axis,
    /// margin included. Assumes the shape is not rotated.
    pub fn extent_along(&self, axis: UpAxis) -> f32 {
        let core = match self.kind {
            ConvexKind::Ball { radius } => radius,
            ConvexKind::Capsule {
                axis: capsule_axis,
                half_height,
                radius,
            } => {
                if capsule_axis == axis {
                    half_height + radius
                } else {
                    radius
                }
            }
            ConvexKind::Cuboid { half_extents } => half_extents[axis.index()],
        };
        core + self.margin.max(0.0)
    }
}

/// Scoped margin enlargement.
///
/// The shape's margin is increased on construction and restored when the
/// guard is dropped, on every exit path of the enclosing scope.
pub struct MarginGuard<'a> {
    shape: &'a mut ConvexShape,
    restore: f32,
}

impl<'a> MarginGuard<'a> {
    pub fn expand(shape: &'a mut ConvexShape, extra: f32) -> Self {
        let restore = shape.margin;
        shape.margin = restore + extra;
        Self { shape, restore }
    }
}

impl Deref for MarginGuard<'_> {
    type Target = ConvexShape;

    fn deref(&self) -> &ConvexShape {
        self.shape
    }
}

impl Drop for MarginGuard<'_> {
    fn drop(&mut self) {
        self.shape.margin = self.restore;
    }
}
