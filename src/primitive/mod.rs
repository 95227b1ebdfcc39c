//! Acceleration node layout and the hit record the intersector produces.

use crate::math::*;
use crate::scene::{LightId, MaterialId, NodeId, ShapeId};

mod bvh;

pub use bvh::{BVH_STACK_SIZE, TRANSFORM_STACK_SIZE};

/// A surface hit in world space.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub p: Point3f,
    /// Shading normal
    pub n: Normal3f,
    /// Geometric normal, used for ray offsets
    pub n_geo: Normal3f,
    pub tangent: Vec3f,
    pub t: Float,
    pub uv: Point2f,
    pub material: MaterialId,
    pub light: LightId,
}

/// A BVH node. `flags == 0` marks a leaf whose `far` is the single child
/// object. Inner nodes store `1 << axis`; their near child sits in the next
/// array slot and `far` is the other child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhNode {
    pub min: Point3f,
    pub max: Point3f,
    pub flags: u32,
    pub far: NodeId,
}

impl BvhNode {
    #[inline]
    pub fn bounds(&self) -> Bounds3f {
        Bounds3f { min: self.min, max: self.max }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.flags == 0
    }

    #[inline]
    pub fn axis(&self) -> usize {
        self.flags.trailing_zeros() as usize
    }
}

/// An instance: `object` lives in the space `transform` maps to world.
#[derive(Debug, Clone, Copy)]
pub struct TransformNode {
    pub transform: Transform,
    pub object: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveNode {
    pub shape: ShapeId,
    pub material: MaterialId,
    pub light: LightId,
}
