use crate::math::*;

/// An orthonormal basis. `localize` maps world vectors into the frame,
/// `globalize` maps them back.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub x: Vec3f,
    pub y: Vec3f,
    pub z: Vec3f,
}

impl Frame {
    #[inline]
    pub fn new(x: Vec3f, y: Vec3f, z: Vec3f) -> Self {
        math_assert!(x.is_normalized());
        math_assert!(y.is_normalized());
        math_assert!(z.is_normalized());

        Self { x, y, z }
    }

    #[inline]
    pub fn from_xz(x: Vec3f, z: Vec3f) -> Self {
        Self::new(x, z.cross(x), z)
    }

    #[inline]
    pub fn from_z(z: Vec3f) -> Self {
        let (x, y) = z.local_basis();
        Self::new(x, y, z)
    }

    /// Shading frame around `n` with `x` along the part of `tangent`
    /// orthogonal to `n`. A tangent that vanishes after the projection
    /// falls back to an arbitrary perpendicular vector.
    pub fn from_shading(n: Normal3f, tangent: Vec3f) -> Self {
        let z = Vec3f::from(n);
        let t = tangent - z * z.dot(tangent);
        if t.length_squared() < 1e-10 || t.is_nan() {
            return Self::from_z(z);
        }
        Self::from_xz(t.normalize(), z)
    }

    #[inline]
    pub fn localize(&self, v: Vec3f) -> Vec3f {
        Vec3f::new(v.dot(self.x), v.dot(self.y), v.dot(self.z))
    }

    #[inline]
    pub fn globalize(&self, v: Vec3f) -> Vec3f {
        self.x * v.x + self.y * v.y + self.z * v.z
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn degenerate_tangent_falls_back() {
        let n = Normal3f::new(0.0, 0.0, 1.0);
        let frame = Frame::from_shading(n, Vec3f::new(0.0, 0.0, 2.0));
        assert_abs_diff_eq!(frame.x.dot(frame.z), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(frame.x.length(), 1.0, epsilon = 1e-6);

        let v = Vec3f::new(0.3, -0.4, 0.5);
        assert_abs_diff_eq!(frame.globalize(frame.localize(v)), v, epsilon = 1e-6);
    }

    #[test]
    fn tangent_is_projected() {
        let n = Normal3f::new(0.0, 1.0, 0.0);
        let frame = Frame::from_shading(n, Vec3f::new(1.0, 1.0, 0.0));
        assert_abs_diff_eq!(frame.x, Vec3f::new(1.0, 0.0, 0.0), epsilon = 1e-6);
        assert_abs_diff_eq!(frame.localize(Vec3f::new(0.0, 1.0, 0.0)), Vec3f::new(0.0, 0.0, 1.0), epsilon = 1e-6);
    }
}
