use std::ops::Mul;

use crate::math::*;

/// Row-major 4x4 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [[Float; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    #[inline]
    pub const fn new(m: [[Float; 4]; 4]) -> Self {
        Self { m }
    }

    pub fn transpose(&self) -> Self {
        let mut r = [[0.0; 4]; 4];
        for (i, row) in r.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = self.m[j][i];
            }
        }
        Self { m: r }
    }

    /// Gauss-Jordan elimination with full pivoting, in f64. `None` for
    /// singular matrices.
    pub fn inverse(&self) -> Option<Self> {
        let mut a = [[0.0f64; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                a[i][j] = self.m[i][j] as f64;
            }
        }

        let mut indxc = [0usize; 4];
        let mut indxr = [0usize; 4];
        let mut ipiv = [0i32; 4];

        for i in 0..4 {
            let mut irow = 0;
            let mut icol = 0;
            let mut big = 0.0f64;
            for j in 0..4 {
                if ipiv[j] != 1 {
                    for k in 0..4 {
                        if ipiv[k] == 0 {
                            if a[j][k].abs() >= big {
                                big = a[j][k].abs();
                                irow = j;
                                icol = k;
                            }
                        } else if ipiv[k] > 1 {
                            return None;
                        }
                    }
                }
            }
            ipiv[icol] += 1;

            if irow != icol {
                a.swap(irow, icol);
            }
            indxr[i] = irow;
            indxc[i] = icol;
            if a[icol][icol] == 0.0 {
                return None;
            }

            let pivinv = 1.0 / a[icol][icol];
            a[icol][icol] = 1.0;
            for j in 0..4 {
                a[icol][j] *= pivinv;
            }

            for j in 0..4 {
                if j != icol {
                    let save = a[j][icol];
                    a[j][icol] = 0.0;
                    for k in 0..4 {
                        a[j][k] -= a[icol][k] * save;
                    }
                }
            }
        }

        for j in (0..4).rev() {
            if indxr[j] != indxc[j] {
                for row in a.iter_mut() {
                    row.swap(indxr[j], indxc[j]);
                }
            }
        }

        let mut r = [[0.0; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                r[i][j] = a[i][j] as Float;
            }
        }
        Some(Self { m: r })
    }

    /// Determinant of the upper-left 3x3 block.
    pub fn determinant_3x3(&self) -> Float {
        let m = &self.m;
        m[0][0] * difference_of_products(m[1][1], m[2][2], m[1][2], m[2][1])
            - m[0][1] * difference_of_products(m[1][0], m[2][2], m[1][2], m[2][0])
            + m[0][2] * difference_of_products(m[1][0], m[2][1], m[1][1], m[2][0])
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut r = [[0.0; 4]; 4];
        for (i, row) in r.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = (0..4).map(|k| self.m[i][k] * rhs.m[k][j]).sum();
            }
        }
        Mat4 { m: r }
    }
}

/// An affine transform stored with its inverse, so instance traversal never
/// inverts a matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub m: Mat4,
    pub m_inv: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self { m: Mat4::IDENTITY, m_inv: Mat4::IDENTITY }
    }
}

impl Transform {
    #[inline]
    pub fn new(m: Mat4, m_inv: Mat4) -> Self {
        Self { m, m_inv }
    }

    pub fn from_translation(delta: Vec3f) -> Self {
        let t = |d: Vec3f| Mat4::new([
            [1.0, 0.0, 0.0, d.x],
            [0.0, 1.0, 0.0, d.y],
            [0.0, 0.0, 1.0, d.z],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        Self { m: t(delta), m_inv: t(-delta) }
    }

    pub fn from_scale(s: Vec3f) -> Self {
        let t = |s: Vec3f| Mat4::new([
            [s.x, 0.0, 0.0, 0.0],
            [0.0, s.y, 0.0, 0.0],
            [0.0, 0.0, s.z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        Self { m: t(s), m_inv: t(Vec3f::new(1.0 / s.x, 1.0 / s.y, 1.0 / s.z)) }
    }

    /// Rotation by `theta` radians about the normalized `axis`.
    pub fn from_rotation(theta: Float, axis: Vec3f) -> Self {
        let a = axis.normalize();
        let (sin_theta, cos_theta) = theta.sin_cos();
        let mut m = Mat4::IDENTITY;

        m.m[0][0] = a.x * a.x + (1.0 - a.x * a.x) * cos_theta;
        m.m[0][1] = a.x * a.y * (1.0 - cos_theta) - a.z * sin_theta;
        m.m[0][2] = a.x * a.z * (1.0 - cos_theta) + a.y * sin_theta;
        m.m[1][0] = a.x * a.y * (1.0 - cos_theta) + a.z * sin_theta;
        m.m[1][1] = a.y * a.y + (1.0 - a.y * a.y) * cos_theta;
        m.m[1][2] = a.y * a.z * (1.0 - cos_theta) - a.x * sin_theta;
        m.m[2][0] = a.x * a.z * (1.0 - cos_theta) - a.y * sin_theta;
        m.m[2][1] = a.y * a.z * (1.0 - cos_theta) + a.x * sin_theta;
        m.m[2][2] = a.z * a.z + (1.0 - a.z * a.z) * cos_theta;

        Self { m, m_inv: m.transpose() }
    }

    #[inline]
    pub fn inverse(&self) -> Self {
        Self { m: self.m_inv, m_inv: self.m }
    }

    #[inline]
    pub fn apply_point(&self, p: Point3f) -> Point3f {
        transform_point(&self.m, p)
    }

    #[inline]
    pub fn apply_inverse_point(&self, p: Point3f) -> Point3f {
        transform_point(&self.m_inv, p)
    }

    #[inline]
    pub fn apply_vector(&self, v: Vec3f) -> Vec3f {
        transform_vector(&self.m, v)
    }

    #[inline]
    pub fn apply_inverse_vector(&self, v: Vec3f) -> Vec3f {
        transform_vector(&self.m_inv, v)
    }

    /// Normals transform by the inverse transpose. The result is not
    /// renormalized.
    #[inline]
    pub fn apply_normal(&self, n: Normal3f) -> Normal3f {
        let m = &self.m_inv.m;
        Normal3f::new(
            m[0][0] * n.x + m[1][0] * n.y + m[2][0] * n.z,
            m[0][1] * n.x + m[1][1] * n.y + m[2][1] * n.z,
            m[0][2] * n.x + m[1][2] * n.y + m[2][2] * n.z,
        )
    }

    #[inline]
    pub fn apply_inverse_ray(&self, ray: &Ray) -> Ray {
        Ray::new(self.apply_inverse_point(ray.origin), self.apply_inverse_vector(ray.direction)).with_time(ray.time)
    }

    pub fn apply_bounds(&self, b: &Bounds3f) -> Bounds3f {
        Bounds3f::from_points((0..8).map(|i| self.apply_point(b.corner(i))))
    }

    /// Ratio of world to object surface area at a point whose object-space
    /// unit normal is `n`.
    #[inline]
    pub fn area_scale(&self, n: Normal3f) -> Float {
        self.m.determinant_3x3().abs() * self.apply_normal(n).length()
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        Transform { m: self.m * rhs.m, m_inv: rhs.m_inv * self.m_inv }
    }
}

#[inline]
fn transform_point(m: &Mat4, p: Point3f) -> Point3f {
    let m = &m.m;
    let x = m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3];
    let y = m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3];
    let z = m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3];
    let w = m[3][0] * p.x + m[3][1] * p.y + m[3][2] * p.z + m[3][3];
    if w == 1.0 { Point3f::new(x, y, z) } else { Point3f::new(x, y, z) / w }
}

#[inline]
fn transform_vector(m: &Mat4, v: Vec3f) -> Vec3f {
    let m = &m.m;
    Vec3f::new(
        m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
        m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
        m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
    )
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn scale_normal() {
        let n = Normal3f::new(1.0, 2.0, 3.0);
        let scale = Transform::from_scale(Vec3f::new(2.0, 3.0, 4.0));
        assert_abs_diff_eq!(scale.apply_normal(n), Normal3f::new(0.5, 2.0 / 3.0, 0.75), epsilon = 1e-6);
    }

    #[test]
    fn inverse_roundtrip() {
        let t = Transform::from_translation(Vec3f::new(1.0, -2.0, 3.0))
            * Transform::from_rotation(0.7, Vec3f::new(1.0, 1.0, 0.0))
            * Transform::from_scale(Vec3f::new(2.0, 0.5, 1.5));
        let m_inv = t.m.inverse().unwrap();
        let p = Point3f::new(0.3, 0.2, -0.9);
        assert_abs_diff_eq!(t.apply_inverse_point(t.apply_point(p)), p, epsilon = 1e-5);
        assert_abs_diff_eq!(transform_point(&m_inv, t.apply_point(p)), p, epsilon = 1e-5);
    }

    #[test]
    fn uniform_scale_area() {
        let t = Transform::from_scale(Vec3f::splat(2.0));
        assert_abs_diff_eq!(t.area_scale(Normal3f::new(0.0, 0.0, 1.0)), 4.0, epsilon = 1e-5);
    }

    #[test]
    fn inverse_ray_keeps_time() {
        let t = Transform::from_translation(Vec3f::new(0.0, 0.0, 5.0)) * Transform::from_scale(Vec3f::splat(2.0));
        let ray = Ray::new(Point3f::new(0.0, 0.0, 1.0), Vec3f::new(0.0, 0.0, 4.0)).with_time(0.25);
        let local = t.apply_inverse_ray(&ray);
        assert_eq!(local.time, 0.25);
        assert_abs_diff_eq!(local.origin, Point3f::new(0.0, 0.0, -2.0), epsilon = 1e-6);
        assert_abs_diff_eq!(local.direction, Vec3f::new(0.0, 0.0, 2.0), epsilon = 1e-6);
    }
}
