use crate::math::*;
use crate::shape::{AbstractShape, ShapeIntersection, ShapeSample};

/// The unit sphere at the origin, clipped to `z` in `[z_min, z_max]`.
/// Placement and size come from the enclosing transform node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub z_min: Float,
    pub z_max: Float,
    /// Points the normal inwards, for spheres seen from inside.
    pub flip_normal: bool,
}

impl Sphere {
    pub const FULL: Sphere = Sphere { z_min: -1.0, z_max: 1.0, flip_normal: false };

    pub fn new(z_min: Float, z_max: Float, flip_normal: bool) -> Sphere {
        let (z_min, z_max) = (z_min.min(z_max).clamp(-1.0, 1.0), z_min.max(z_max).clamp(-1.0, 1.0));
        Sphere { z_min, z_max, flip_normal }
    }

    #[inline]
    fn normal_at(&self, p: Point3f) -> Normal3f {
        let n = Normal3f::new(p.x, p.y, p.z);
        if self.flip_normal { -n } else { n }
    }

    #[inline]
    fn in_range(&self, p: Point3f) -> bool {
        (self.z_min <= -1.0 || p.z >= self.z_min) && (self.z_max >= 1.0 || p.z <= self.z_max)
    }

    fn hit_point(ray: &Ray, t: Float) -> Point3f {
        let p = ray.at(t);
        // Reproject onto the surface to cancel the error in `t`.
        let mut p = p * (1.0 / Vec3f::from(p).length());
        if p.x == 0.0 && p.y == 0.0 {
            p.x = 1e-5;
        }
        p
    }

    fn uv_at(&self, p: Point3f) -> Point2f {
        let mut phi = p.y.atan2(p.x);
        if phi < 0.0 {
            phi += TAU;
        }
        let v = if self.z_max > self.z_min { (p.z - self.z_min) / (self.z_max - self.z_min) } else { 0.0 };
        Point2f::new(phi / TAU, v)
    }
}

impl AbstractShape for Sphere {
    fn bounds(&self) -> Bounds3f {
        Bounds3f::new(Point3f::new(-1.0, -1.0, self.z_min), Point3f::new(1.0, 1.0, self.z_max))
    }

    fn area(&self) -> Float {
        TAU * (self.z_max - self.z_min)
    }

    fn raycast(&self, ray: &Ray, t_max: Float) -> Option<ShapeIntersection> {
        let o = Vec3f::from(ray.origin);
        let d = ray.direction;

        let a = d.length_squared();
        let b = 2.0 * d.dot(o);
        let c = o.length_squared() - 1.0;

        // The discriminant written as `4a (1 - |v|^2)`, with `v` the vector
        // from the center to the closest point on the ray line, loses far
        // less precision than `b^2 - 4ac`.
        let v = o - d * (b / (2.0 * a));
        let len = v.length();
        let discrim = 4.0 * a * (1.0 + len) * (1.0 - len);
        if discrim < 0.0 {
            return None;
        }

        let root_discrim = discrim.sqrt();
        let q = if b < 0.0 { -0.5 * (b - root_discrim) } else { -0.5 * (b + root_discrim) };
        let (t0, t1) = {
            let (t0, t1) = (q / a, c / q);
            if t0 > t1 { (t1, t0) } else { (t0, t1) }
        };

        if t0 >= t_max || t1 <= 0.0 {
            return None;
        }

        let mut t = t0;
        if t <= 0.0 {
            t = t1;
            if t >= t_max {
                return None;
            }
        }

        let mut p = Self::hit_point(ray, t);
        if !self.in_range(p) {
            if t == t1 || t1 >= t_max {
                return None;
            }
            t = t1;
            p = Self::hit_point(ray, t);
            if !self.in_range(p) {
                return None;
            }
        }

        let n = self.normal_at(p);
        Some(ShapeIntersection {
            t,
            p,
            n_geo: n,
            n,
            tangent: Vec3f::new(-p.y, p.x, 0.0),
            uv: self.uv_at(p),
        })
    }

    fn sample(&self, _p_ref: Point3f, u: Point2f) -> Option<ShapeSample> {
        let z = lerp(self.z_min, self.z_max, u[0]);
        let r = safe::sqrt(1.0 - z * z);
        let phi = TAU * u[1];
        let p = Point3f::new(r * phi.cos(), r * phi.sin(), z);
        let area = self.area();
        if area == 0.0 {
            return None;
        }

        Some(ShapeSample {
            p,
            n: self.normal_at(p),
            uv: self.uv_at(p),
            pdf: 1.0 / area,
        })
    }

    fn pdf(&self, _p_ref: Point3f, _p: Point3f) -> Float {
        1.0 / self.area()
    }
}
