use crate::math::sampling::sample_uniform_triangle;
use crate::math::*;
use crate::shape::{AbstractShape, ShapeIntersection, ShapeSample};

/// One mesh vertex. A zero normal means the mesh carries no shading
/// normals and the geometric normal is used instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriVertex {
    pub p: Point3f,
    pub n: Normal3f,
    pub uv: Point2f,
}

impl TriVertex {
    pub fn new(p: Point3f) -> TriVertex {
        TriVertex { p, n: Normal3f::ZERO, uv: Point2f::ZERO }
    }

    pub fn with_normal(mut self, n: Normal3f) -> TriVertex {
        self.n = n;
        self
    }

    pub fn with_uv(mut self, uv: Point2f) -> TriVertex {
        self.uv = uv;
        self
    }
}

/// Indices into [`Shapes`](crate::shape::Shapes)' vertex array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub vertices: [u32; 3],
}

/// A triangle with its vertices resolved.
#[derive(Debug, Clone, Copy)]
pub struct TriangleRef<'a> {
    pub v: [&'a TriVertex; 3],
}

struct Barycentrics {
    b: [Float; 3],
    t: Float,
}

/// Watertight ray/triangle test (Woop et al. 2013). Edge functions that
/// evaluate to exactly zero are recomputed in double precision so rays
/// through shared edges and vertices are never lost.
fn intersect_triangle(ray: &Ray, t_max: Float, p0: Point3f, p1: Point3f, p2: Point3f) -> Option<Barycentrics> {
    if (p2 - p0).cross(p1 - p0).length_squared() == 0.0 {
        return None;
    }

    let kz = ray.direction.abs().max_element_index();
    let kx = (kz + 1) % 3;
    let ky = (kx + 1) % 3;
    let perm = [kx, ky, kz];

    let d = ray.direction.permute(perm);
    let mut pt = [p0, p1, p2].map(|p| (p - ray.origin).permute(perm));

    let sx = -d.x / d.z;
    let sy = -d.y / d.z;
    let sz = 1.0 / d.z;
    for p in pt.iter_mut() {
        p.x += sx * p.z;
        p.y += sy * p.z;
    }
    let [p0t, p1t, p2t] = pt;

    let mut e = [
        difference_of_products(p1t.x, p2t.y, p1t.y, p2t.x),
        difference_of_products(p2t.x, p0t.y, p2t.y, p0t.x),
        difference_of_products(p0t.x, p1t.y, p0t.y, p1t.x),
    ];

    if e.iter().any(|&e| e == 0.0) {
        let edge = |a: Vec3f, b: Vec3f| (a.x as f64 * b.y as f64 - a.y as f64 * b.x as f64) as Float;
        e = [edge(p1t, p2t), edge(p2t, p0t), edge(p0t, p1t)];
    }

    if e.iter().any(|&e| e < 0.0) && e.iter().any(|&e| e > 0.0) {
        return None;
    }
    let det = e[0] + e[1] + e[2];
    if det == 0.0 {
        return None;
    }

    let z = [p0t.z * sz, p1t.z * sz, p2t.z * sz];
    let t_scaled = e[0] * z[0] + e[1] * z[1] + e[2] * z[2];
    if det < 0.0 && (t_scaled >= 0.0 || t_scaled < t_max * det) {
        return None;
    }
    if det > 0.0 && (t_scaled <= 0.0 || t_scaled > t_max * det) {
        return None;
    }

    let inv_det = 1.0 / det;
    let t = t_scaled * inv_det;
    debug_assert!(!t.is_nan());

    // Conservative bound on the error of `t`; anything closer is treated
    // as a self-intersection.
    let max_zt = Vec3f::new(z[0], z[1], z[2]).abs().max_element();
    let max_xt = Vec3f::new(p0t.x, p1t.x, p2t.x).abs().max_element();
    let max_yt = Vec3f::new(p0t.y, p1t.y, p2t.y).abs().max_element();
    let delta_z = gamma(3) * max_zt;
    let delta_x = gamma(5) * (max_xt + max_zt);
    let delta_y = gamma(5) * (max_yt + max_zt);
    let delta_e = 2.0 * (gamma(2) * max_xt * max_yt + delta_y * max_xt + delta_x * max_yt);
    let max_e = Vec3f::new(e[0], e[1], e[2]).abs().max_element();
    let delta_t = 3.0 * (gamma(3) * max_e * max_zt + delta_e * max_zt + delta_z * max_e) * inv_det.abs();
    if t <= delta_t {
        return None;
    }

    Some(Barycentrics { b: e.map(|e| e * inv_det), t })
}

impl TriangleRef<'_> {
    #[inline]
    fn points(&self) -> [Point3f; 3] {
        self.v.map(|v| v.p)
    }

    fn has_shading_normals(&self) -> bool {
        self.v.iter().all(|v| v.n != Normal3f::ZERO)
    }

    /// Interpolated surface attributes at barycentrics `b`.
    fn surface(&self, b: [Float; 3]) -> (Point3f, Normal3f, Normal3f, Vec3f, Point2f) {
        let [p0, p1, p2] = self.points();
        let [uv0, uv1, uv2] = self.v.map(|v| Vec2f::from(v.uv));

        let p = Point3f::from(Vec3f::from(p0) * b[0] + Vec3f::from(p1) * b[1] + Vec3f::from(p2) * b[2]);
        let uv = Point2f::from(uv0 * b[0] + uv1 * b[1] + uv2 * b[2]);

        let mut n_geo = Normal3f::from((p1 - p0).cross(p2 - p0).normalize());
        let n = if self.has_shading_normals() {
            let [n0, n1, n2] = self.v.map(|v| Vec3f::from(v.n));
            let ns = n0 * b[0] + n1 * b[1] + n2 * b[2];
            if ns.length_squared() > 0.0 {
                let ns = Normal3f::from(ns.normalize());
                n_geo = n_geo.facing(Vec3f::from(ns));
                ns
            } else {
                n_geo
            }
        } else {
            n_geo
        };

        // dp/du from the uv parameterization, else the first edge.
        let duv02 = uv0 - uv2;
        let duv12 = uv1 - uv2;
        let det = difference_of_products(duv02.x, duv12.y, duv02.y, duv12.x);
        let tangent = if det.abs() > 1e-9 {
            let dp02 = p0 - p2;
            let dp12 = p1 - p2;
            (dp02 * duv12.y - dp12 * duv02.y) * (1.0 / det)
        } else {
            p1 - p0
        };
        let tangent = if tangent.length_squared() > 0.0 && tangent.is_finite() { tangent } else { p1 - p0 };

        (p, n_geo, n, tangent, uv)
    }
}

impl AbstractShape for TriangleRef<'_> {
    fn bounds(&self) -> Bounds3f {
        Bounds3f::from_points(self.points())
    }

    fn area(&self) -> Float {
        let [p0, p1, p2] = self.points();
        0.5 * (p1 - p0).cross(p2 - p0).length()
    }

    fn raycast(&self, ray: &Ray, t_max: Float) -> Option<ShapeIntersection> {
        let [p0, p1, p2] = self.points();
        let hit = intersect_triangle(ray, t_max, p0, p1, p2)?;
        let (p, n_geo, n, tangent, uv) = self.surface(hit.b);
        Some(ShapeIntersection { t: hit.t, p, n_geo, n, tangent, uv })
    }

    fn sample(&self, _p_ref: Point3f, u: Point2f) -> Option<ShapeSample> {
        let area = self.area();
        if area == 0.0 {
            return None;
        }
        let (p, n, _, _, uv) = self.surface(sample_uniform_triangle(u));
        Some(ShapeSample { p, n, uv, pdf: 1.0 / area })
    }

    fn pdf(&self, _p_ref: Point3f, _p: Point3f) -> Float {
        1.0 / self.area()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn verts() -> [TriVertex; 3] {
        [
            TriVertex::new(Point3f::new(0.0, 0.0, 0.0)).with_uv(Point2f::new(0.0, 0.0)),
            TriVertex::new(Point3f::new(1.0, 0.0, 0.0)).with_uv(Point2f::new(1.0, 0.0)),
            TriVertex::new(Point3f::new(0.0, 1.0, 0.0)).with_uv(Point2f::new(0.0, 1.0)),
        ]
    }

    fn tri(v: &[TriVertex; 3]) -> TriangleRef<'_> {
        TriangleRef { v: [&v[0], &v[1], &v[2]] }
    }

    #[test]
    fn hits_at_analytic_distance() {
        let v = verts();
        let ray = Ray::new(Point3f::new(0.25, 0.25, 3.0), Vec3f::new(0.0, 0.0, -1.0));
        let hit = tri(&v).raycast(&ray, Float::INFINITY).unwrap();
        assert_abs_diff_eq!(hit.t, 3.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hit.p, Point3f::new(0.25, 0.25, 0.0), epsilon = 1e-5);
        assert_abs_diff_eq!(hit.uv, Point2f::new(0.25, 0.25), epsilon = 1e-5);
        assert_abs_diff_eq!(hit.tangent.normalize(), Vec3f::new(1.0, 0.0, 0.0), epsilon = 1e-5);

        let slanted = Ray::new(Point3f::new(0.0, 0.0, 1.0), Vec3f::new(0.2, 0.2, -1.0));
        let hit = tri(&v).raycast(&slanted, Float::INFINITY).unwrap();
        assert_abs_diff_eq!(hit.t, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn misses_and_limits() {
        let v = verts();
        let outside = Ray::new(Point3f::new(0.75, 0.75, 1.0), Vec3f::new(0.0, 0.0, -1.0));
        assert!(tri(&v).raycast(&outside, Float::INFINITY).is_none());

        let away = Ray::new(Point3f::new(0.25, 0.25, 1.0), Vec3f::new(0.0, 0.0, 1.0));
        assert!(tri(&v).raycast(&away, Float::INFINITY).is_none());

        let short = Ray::new(Point3f::new(0.25, 0.25, 1.0), Vec3f::new(0.0, 0.0, -1.0));
        assert!(tri(&v).raycast(&short, 0.5).is_none());

        let parallel = Ray::new(Point3f::new(-1.0, 0.25, 0.0), Vec3f::new(1.0, 0.0, 0.0));
        assert!(tri(&v).raycast(&parallel, Float::INFINITY).is_none());
    }

    #[test]
    fn shared_edge_is_watertight() {
        let v = [
            TriVertex::new(Point3f::new(0.0, 0.0, 0.0)),
            TriVertex::new(Point3f::new(1.0, 0.0, 0.0)),
            TriVertex::new(Point3f::new(1.0, 1.0, 0.0)),
            TriVertex::new(Point3f::new(0.0, 1.0, 0.0)),
        ];
        let a = TriangleRef { v: [&v[0], &v[1], &v[2]] };
        let b = TriangleRef { v: [&v[0], &v[2], &v[3]] };

        for i in 0..64 {
            let s = (i as Float + 0.5) / 64.0;
            let ray = Ray::new(Point3f::new(s, s, 1.0), Vec3f::new(0.0, 0.0, -1.0));
            let hits = a.raycast(&ray, Float::INFINITY).is_some() as u32
                + b.raycast(&ray, Float::INFINITY).is_some() as u32;
            assert!(hits >= 1, "ray through diagonal at {s} leaked");
        }
    }

    #[test]
    fn shading_normal_orients_geometric() {
        let n = Normal3f::new(0.0, 0.0, -1.0);
        let v = verts().map(|v| v.with_normal(n));
        let ray = Ray::new(Point3f::new(0.2, 0.2, 1.0), Vec3f::new(0.0, 0.0, -1.0));
        let hit = tri(&v).raycast(&ray, Float::INFINITY).unwrap();
        assert_abs_diff_eq!(hit.n, n, epsilon = 1e-5);
        assert!(hit.n_geo.dot(hit.n) > 0.0);
    }

    #[test]
    fn samples_are_inside_with_area_pdf() {
        let v = verts();
        let t = tri(&v);
        assert_abs_diff_eq!(t.area(), 0.5, epsilon = 1e-6);
        for i in 0..16 {
            let u = Point2f::new((i as Float + 0.5) / 16.0, ((i * 5) % 16) as Float / 16.0);
            let s = t.sample(Point3f::ZERO, u).unwrap();
            assert!(s.p.x >= -1e-6 && s.p.y >= -1e-6 && s.p.x + s.p.y <= 1.0 + 1e-6);
            assert_abs_diff_eq!(s.pdf, 2.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn samples_carry_the_geometric_normal() {
        let tilted = Normal3f::new(0.6, 0.0, 0.8);
        let v = verts().map(|v| v.with_normal(tilted));
        let t = tri(&v);
        let s = t.sample(Point3f::ZERO, Point2f::new(0.3, 0.6)).unwrap();
        assert_abs_diff_eq!(s.n, Normal3f::new(0.0, 0.0, 1.0), epsilon = 1e-5);

        // The same normal a ray hitting the sampled point reports.
        let ray = Ray::new(s.p + Vec3f::new(0.0, 0.0, 1.0), Vec3f::new(0.0, 0.0, -1.0));
        let hit = t.raycast(&ray, Float::INFINITY).unwrap();
        assert_abs_diff_eq!(s.n, hit.n_geo, epsilon = 1e-5);
        assert_abs_diff_eq!(hit.n, tilted, epsilon = 1e-5);
    }
}
