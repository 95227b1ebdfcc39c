use crate::math::*;

/// A ray with an unnormalized direction. Directions are not renormalized
/// when a ray enters an instance, so `t` is the same in every space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ray {
    pub origin: Point3f,
    pub direction: Vec3f,
    /// Carried through instances unchanged
    pub time: Float,
}

impl Ray {
    #[inline]
    pub const fn new(origin: Point3f, direction: Vec3f) -> Self {
        Self { origin, direction, time: 0.0 }
    }

    #[inline]
    pub const fn with_time(self, time: Float) -> Self {
        Self { time, ..self }
    }

    #[inline]
    pub fn at(&self, t: Float) -> Point3f {
        self.origin + self.direction * t
    }
}

/// Relative scale of the self-intersection offset.
pub const RAY_EPSILON: Float = 1e-4;

/// Pushes `p` off its surface along the geometric normal `n`, towards the
/// side `w` points to. The offset grows with the magnitude of `p`.
#[inline]
pub fn offset_ray_origin(p: Point3f, n: Normal3f, w: Vec3f) -> Point3f {
    let scale = RAY_EPSILON * (1.0 + Vec3f::from(p).abs().max_element());
    let offset = Vec3f::from(n) * scale;
    if w.dot(n) < 0.0 { p - offset } else { p + offset }
}

#[inline]
pub fn spawn_ray(p: Point3f, n: Normal3f, w: Vec3f) -> Ray {
    Ray::new(offset_ray_origin(p, n, w), w)
}

/// A shadow ray from `p` towards `p_to`, parameterized so the target sits
/// at `t = 1`. Both endpoints are offset off their surfaces.
#[inline]
pub fn spawn_ray_to(p: Point3f, n: Normal3f, p_to: Point3f, n_to: Option<Normal3f>) -> Ray {
    let origin = offset_ray_origin(p, n, p_to - p);
    let target = match n_to {
        Some(n_to) => offset_ray_origin(p_to, n_to, origin - p_to),
        None => p_to,
    };
    Ray::new(origin, target - origin)
}
