use crate::math::*;
use crate::scene::{ShapeId, ShapeType};

pub mod sphere;
pub mod triangle;

pub use sphere::Sphere;
pub use triangle::{TriVertex, Triangle, TriangleRef};

/// Geometric queries every shape answers in its own object space.
pub trait AbstractShape {
    /// Spatial extent of the shape
    fn bounds(&self) -> Bounds3f;

    /// Surface area of the shape
    fn area(&self) -> Float;

    /// Closest intersection with `t` in `(0, t_max)`, or [`None`].
    fn raycast(&self, ray: &Ray, t_max: Float) -> Option<ShapeIntersection>;

    /// Samples a point on the surface as seen from `p_ref`. The returned
    /// density is with respect to surface area.
    fn sample(&self, p_ref: Point3f, u: Point2f) -> Option<ShapeSample>;

    /// Area density of [`AbstractShape::sample`] producing `p`.
    fn pdf(&self, p_ref: Point3f, p: Point3f) -> Float;
}

#[derive(Debug, Clone, Copy)]
pub struct ShapeIntersection {
    pub t: Float,
    pub p: Point3f,
    pub n_geo: Normal3f,
    pub n: Normal3f,
    pub tangent: Vec3f,
    pub uv: Point2f,
}

#[derive(Debug, Clone, Copy)]
pub struct ShapeSample {
    pub p: Point3f,
    pub n: Normal3f,
    pub uv: Point2f,
    pub pdf: Float,
}

/// A borrowed view of one shape, resolved from its handle.
#[derive(Debug, Clone, Copy)]
pub enum Shape<'a> {
    Sphere(&'a Sphere),
    Triangle(TriangleRef<'a>),
}

impl AbstractShape for Shape<'_> {
    fn bounds(&self) -> Bounds3f {
        match self {
            Shape::Sphere(s) => s.bounds(),
            Shape::Triangle(s) => s.bounds(),
        }
    }

    fn area(&self) -> Float {
        match self {
            Shape::Sphere(s) => s.area(),
            Shape::Triangle(s) => s.area(),
        }
    }

    fn raycast(&self, ray: &Ray, t_max: Float) -> Option<ShapeIntersection> {
        match self {
            Shape::Sphere(s) => s.raycast(ray, t_max),
            Shape::Triangle(s) => s.raycast(ray, t_max),
        }
    }

    fn sample(&self, p_ref: Point3f, u: Point2f) -> Option<ShapeSample> {
        match self {
            Shape::Sphere(s) => s.sample(p_ref, u),
            Shape::Triangle(s) => s.sample(p_ref, u),
        }
    }

    fn pdf(&self, p_ref: Point3f, p: Point3f) -> Float {
        match self {
            Shape::Sphere(s) => s.pdf(p_ref, p),
            Shape::Triangle(s) => s.pdf(p_ref, p),
        }
    }
}

/// Dense per-variant shape storage. Triangles index into a shared vertex
/// array.
#[derive(Debug, Clone, Default)]
pub struct Shapes {
    spheres: Vec<Sphere>,
    triangles: Vec<Triangle>,
    vertices: Vec<TriVertex>,
}

impl Shapes {
    pub fn add_sphere(&mut self, sphere: Sphere) -> ShapeId {
        let id = ShapeId::new(ShapeType::Sphere, self.spheres.len());
        self.spheres.push(sphere);
        id
    }

    /// Appends a triangle mesh. `tris` indexes into `verts`.
    pub fn add_triangles(&mut self, verts: &[TriVertex], tris: &[[u32; 3]]) -> Vec<ShapeId> {
        let base_vertex = self.vertices.len() as u32;
        self.vertices.extend_from_slice(verts);

        let base = self.triangles.len();
        self.triangles.extend(tris.iter().map(|idx| Triangle {
            vertices: idx.map(|i| i + base_vertex),
        }));

        (base..self.triangles.len())
            .map(|idx| ShapeId::new(ShapeType::Triangle, idx))
            .collect()
    }

    pub fn contains(&self, shape: ShapeId) -> bool {
        match shape.ty() {
            ShapeType::Sphere => shape.idx() < self.spheres.len(),
            ShapeType::Triangle => self.triangles.get(shape.idx()).is_some_and(|t| {
                t.vertices.iter().all(|&v| (v as usize) < self.vertices.len())
            }),
        }
    }

    #[inline]
    pub fn get(&self, shape: ShapeId) -> Shape<'_> {
        match shape.ty() {
            ShapeType::Sphere => Shape::Sphere(&self.spheres[shape.idx()]),
            ShapeType::Triangle => {
                let tri = &self.triangles[shape.idx()];
                Shape::Triangle(TriangleRef {
                    v: tri.vertices.map(|i| &self.vertices[i as usize]),
                })
            }
        }
    }
}
