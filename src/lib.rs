//! Light transport core of a spectral path tracer: a two-level BVH over
//! flat scene arrays, spectral BSDFs, light sampling, and path integrators
//! including one guided by an online-learned spatial-directional tree.

#[macro_use]
mod macros;

pub mod bsdf;
pub mod bxdf;
pub mod camera;
pub mod color;
pub mod error;
pub mod guiding;
pub mod integrator;
pub mod light;
pub mod material;
pub mod math;
pub mod options;
pub mod primitive;
pub mod render;
pub mod sampler;
pub mod scene;
pub mod shape;
pub mod texture;

pub use math::*;
