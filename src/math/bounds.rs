use crate::math::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3f {
    pub min: Point3f,
    pub max: Point3f,
}

impl Default for Bounds3f {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds3f {
    pub const EMPTY: Self = Self {
        min: Point3f::splat(Float::INFINITY),
        max: Point3f::splat(Float::NEG_INFINITY),
    };

    #[inline]
    pub fn new(a: Point3f, b: Point3f) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point3f>) -> Self {
        points.into_iter().fold(Self::EMPTY, |b, p| b.union_point(p))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    #[inline]
    pub fn union(self, rhs: Self) -> Self {
        Self { min: self.min.min(rhs.min), max: self.max.max(rhs.max) }
    }

    #[inline]
    pub fn union_point(self, p: Point3f) -> Self {
        Self { min: self.min.min(p), max: self.max.max(p) }
    }

    #[inline]
    pub fn diagonal(&self) -> Vec3f {
        self.max - self.min
    }

    #[inline]
    pub fn centroid(&self) -> Point3f {
        self.min + self.diagonal() * 0.5
    }

    pub fn surface_area(&self) -> Float {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    #[inline]
    pub fn max_dimension(&self) -> usize {
        self.diagonal().max_element_index()
    }

    /// Position of `p` relative to the box, `0` at `min` and `1` at `max`.
    #[inline]
    pub fn offset(&self, p: Point3f) -> Vec3f {
        let mut o = p - self.min;
        let d = self.diagonal();
        for i in 0..3 {
            if d[i] > 0.0 {
                o[i] /= d[i];
            }
        }
        o
    }

    pub fn corner(&self, i: usize) -> Point3f {
        Point3f::new(
            if i & 1 != 0 { self.max.x } else { self.min.x },
            if i & 2 != 0 { self.max.y } else { self.min.y },
            if i & 4 != 0 { self.max.z } else { self.min.z },
        )
    }

    /// Slab test. Returns the entry distance if the ray overlaps the box
    /// within `[0, t_max]`. Zero direction components give infinite
    /// reciprocals; the NaN produced when an origin lies exactly on a slab
    /// plane is discarded by `min`/`max`.
    #[inline]
    pub fn intersect_p(&self, origin: Point3f, inv_dir: Vec3f, t_max: Float) -> Option<Float> {
        let mut t0: Float = 0.0;
        let mut t1 = t_max;
        for i in 0..3 {
            let t_near = (self.min[i] - origin[i]) * inv_dir[i];
            let t_far = (self.max[i] - origin[i]) * inv_dir[i];
            let (t_near, t_far) = if t_near > t_far { (t_far, t_near) } else { (t_near, t_far) };
            let t_far = t_far * (1.0 + 2.0 * gamma(3));
            t0 = t0.max(t_near);
            t1 = t1.min(t_far);
        }
        if t0 > t1 { None } else { Some(t0) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Bounds3f {
        Bounds3f::new(Point3f::ZERO, Point3f::ONE)
    }

    fn inv(d: Vec3f) -> Vec3f {
        Vec3f::new(1.0 / d.x, 1.0 / d.y, 1.0 / d.z)
    }

    #[test]
    fn slab_hit_and_miss() {
        let o = Point3f::new(0.5, 0.5, -1.0);
        let d = Vec3f::new(0.0, 0.0, 1.0);
        assert_eq!(unit().intersect_p(o, inv(d), Float::INFINITY), Some(1.0));
        assert_eq!(unit().intersect_p(o, inv(d), 0.5), None);
        assert_eq!(unit().intersect_p(o, inv(-d), Float::INFINITY), None);
    }

    #[test]
    fn zero_direction_components_reject_outside_slab() {
        let d = Vec3f::new(0.0, 0.0, 1.0);
        let outside = Point3f::new(2.0, 0.5, -1.0);
        assert_eq!(unit().intersect_p(outside, inv(d), Float::INFINITY), None);

        let on_plane = Point3f::new(1.0, 0.5, -1.0);
        assert!(unit().intersect_p(on_plane, inv(d), Float::INFINITY).is_some());
    }

    #[test]
    fn inside_origin_enters_at_zero() {
        let o = Point3f::new(0.5, 0.5, 0.5);
        let d = Vec3f::new(1.0, -1.0, 0.3);
        assert_eq!(unit().intersect_p(o, inv(d), Float::INFINITY), Some(0.0));
    }
}
