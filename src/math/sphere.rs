// Spherical geometry in the local shading frame, where +z is the normal.

use crate::math::*;

#[inline]
pub fn cos_theta(w: Vec3f) -> Float {
    w.z
}

#[inline]
pub fn cos_2_theta(w: Vec3f) -> Float {
    w.z * w.z
}

#[inline]
pub fn abs_cos_theta(w: Vec3f) -> Float {
    w.z.abs()
}

#[inline]
pub fn sin_2_theta(w: Vec3f) -> Float {
    Float::max(0.0, 1.0 - cos_2_theta(w))
}

#[inline]
pub fn sin_theta(w: Vec3f) -> Float {
    sin_2_theta(w).sqrt()
}

#[inline]
pub fn tan_2_theta(w: Vec3f) -> Float {
    sin_2_theta(w) / cos_2_theta(w)
}

#[inline]
pub fn cos_phi(w: Vec3f) -> Float {
    let sin_theta = sin_theta(w);
    if sin_theta == 0.0 { 1.0 } else { (w.x / sin_theta).clamp(-1.0, 1.0) }
}

#[inline]
pub fn sin_phi(w: Vec3f) -> Float {
    let sin_theta = sin_theta(w);
    if sin_theta == 0.0 { 0.0 } else { (w.y / sin_theta).clamp(-1.0, 1.0) }
}

#[inline]
pub fn same_hemisphere(w: Vec3f, wp: Vec3f) -> bool {
    w.z * wp.z > 0.0
}

/// Clarberg's equal-area mapping from `[0,1]^2` onto the unit sphere. The
/// square is folded as an octahedron: the inner diamond covers `z > 0`.
pub fn equal_area_square_to_sphere(p: Point2f) -> Vec3f {
    let u = 2.0 * p.x - 1.0;
    let v = 2.0 * p.y - 1.0;
    let up = u.abs();
    let vp = v.abs();

    let signed_distance = 1.0 - (up + vp);
    let d = signed_distance.abs();
    let r = 1.0 - d;

    let phi = if r == 0.0 { 1.0 } else { ((vp - up) / r + 1.0) * FRAC_PI_4 };
    let z = (1.0 - r * r).copysign(signed_distance);

    let cos_phi = phi.cos().copysign(u);
    let sin_phi = phi.sin().copysign(v);

    let s = r * safe::sqrt(2.0 - r * r);
    Vec3f::new(cos_phi * s, sin_phi * s, z)
}

/// Inverse of [`equal_area_square_to_sphere`].
pub fn equal_area_sphere_to_square(d: Vec3f) -> Point2f {
    let x = d.x.abs();
    let y = d.y.abs();
    let z = d.z.abs();

    let r = safe::sqrt(1.0 - z);

    let a = x.max(y);
    let b = x.min(y);
    let b = if a == 0.0 { 0.0 } else { b / a };

    let mut phi = b.atan() * 2.0 * FRAC_1_PI;
    if x < y {
        phi = 1.0 - phi;
    }

    let mut v = phi * r;
    let mut u = r - v;

    if d.z < 0.0 {
        std::mem::swap(&mut u, &mut v);
        u = 1.0 - u;
        v = 1.0 - v;
    }

    u = u.copysign(d.x);
    v = v.copysign(d.y);

    Point2f::new(
        (0.5 * (u + 1.0)).clamp(0.0, 1.0),
        (0.5 * (v + 1.0)).clamp(0.0, 1.0),
    )
}
