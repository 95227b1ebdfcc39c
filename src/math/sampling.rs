use crate::math::*;

/// Tabulated 1D distribution over `[0, 1]`.
#[derive(Debug, Clone, Default)]
pub struct PiecewiseConstant1D {
    f: Vec<Float>,
    cdf: Vec<Float>,
    f_int: Float,
}

impl PiecewiseConstant1D {
    pub fn new(f: &[Float]) -> PiecewiseConstant1D {
        assert!(!f.is_empty());

        let func: Vec<_> = f.iter().map(|v| v.abs()).collect();
        let n = func.len();
        let mut cdf = vec![0.0; n + 1];

        for i in 1..=n {
            cdf[i] = cdf[i - 1] + func[i - 1] / n as Float;
        }

        let f_int = cdf[n];
        if f_int == 0.0 {
            for (i, c) in cdf.iter_mut().enumerate().skip(1) {
                *c = i as Float / n as Float;
            }
        } else {
            for c in cdf.iter_mut().skip(1) {
                *c /= f_int;
            }
        }

        PiecewiseConstant1D { f: func, cdf, f_int }
    }

    pub fn integral(&self) -> Float { self.f_int }

    pub fn size(&self) -> usize { self.f.len() }

    /// Returns (value, pdf, offset)
    pub fn sample(&self, u: Float) -> (Float, Float, usize) {
        let offset = find_interval(self.cdf.len(), |i| self.cdf[i] <= u);

        let mut du = u - self.cdf[offset];
        if self.cdf[offset + 1] - self.cdf[offset] > 0.0 {
            du /= self.cdf[offset + 1] - self.cdf[offset];
        }

        let pdf = if self.f_int > 0.0 {
            self.f[offset] / self.f_int
        } else {
            1.0
        };

        let value = ((offset as Float + du) / self.size() as Float).min(ONE_MINUS_EPSILON);

        (value, pdf, offset)
    }

    pub fn pdf(&self, x: Float) -> Float {
        if self.f_int == 0.0 {
            return 1.0;
        }
        let i = ((x * self.size() as Float) as usize).min(self.size() - 1);
        self.f[i] / self.f_int
    }
}

/// Tabulated 2D distribution over the unit square: one conditional per row
/// plus a marginal over rows.
#[derive(Debug, Clone, Default)]
pub struct PiecewiseConstant2D {
    conditional_v: Vec<PiecewiseConstant1D>,
    marginal: PiecewiseConstant1D,
}

impl PiecewiseConstant2D {
    pub fn new(f: &[Float], nu: usize, nv: usize) -> PiecewiseConstant2D {
        assert_eq!(f.len(), nu * nv);

        let conditional_v: Vec<_> = f.chunks_exact(nu).map(PiecewiseConstant1D::new).collect();
        let marginal_func: Vec<_> = conditional_v.iter().map(|c| c.integral()).collect();
        let marginal = PiecewiseConstant1D::new(&marginal_func);

        PiecewiseConstant2D { conditional_v, marginal }
    }

    pub fn integral(&self) -> Float { self.marginal.integral() }

    pub fn resolution(&self) -> (usize, usize) {
        (self.conditional_v[0].size(), self.marginal.size())
    }

    /// Returns (sampled value, PDF)
    pub fn sample(&self, u: Point2f) -> (Point2f, Float) {
        let (d1, pdf1, v) = self.marginal.sample(u[1]);
        let (d0, pdf0, _) = self.conditional_v[v].sample(u[0]);
        (Point2f::new(d0, d1), pdf0 * pdf1)
    }

    pub fn pdf(&self, p: Point2f) -> Float {
        let (nu, nv) = self.resolution();
        let iu = ((p[0] * nu as Float) as usize).min(nu - 1);
        let iv = ((p[1] * nv as Float) as usize).min(nv - 1);
        if self.integral() == 0.0 {
            return 1.0;
        }
        self.conditional_v[iv].f[iu] / self.integral()
    }
}

pub const ONE_MINUS_EPSILON: Float = 1.0 - Float::EPSILON * 0.5;

pub fn sample_uniform_disk_concentric(u: Point2f) -> Point2f {
    let u_offset = u * 2.0 - Vec2f::new(1.0, 1.0);
    if u_offset.x == 0.0 && u_offset.y == 0.0 {
        return Point2f::new(0.0, 0.0);
    }

    let (r, theta) = if u_offset.x.abs() > u_offset.y.abs() {
        (u_offset.x, FRAC_PI_4 * (u_offset.y / u_offset.x))
    } else {
        (u_offset.y, FRAC_PI_2 - FRAC_PI_4 * (u_offset.x / u_offset.y))
    };

    Point2f::new(theta.cos(), theta.sin()) * r
}

pub fn sample_uniform_disk_polar(u: Point2f) -> Point2f {
    let r = u[0].sqrt();
    let theta = TAU * u[1];
    Point2f::new(r * theta.cos(), r * theta.sin())
}

pub fn sample_cosine_hemisphere(u: Point2f) -> Vec3f {
    let d = sample_uniform_disk_concentric(u);
    let z = safe::sqrt(1.0 - d.x * d.x - d.y * d.y);
    Vec3f::new(d.x, d.y, z)
}

#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * FRAC_1_PI
}

pub fn sample_uniform_sphere(u: Point2f) -> Vec3f {
    let z = 1.0 - 2.0 * u[0];
    let r = safe::sqrt(1.0 - z * z);
    let phi = TAU * u[1];
    Vec3f::new(r * phi.cos(), r * phi.sin(), z)
}

#[inline]
pub fn uniform_sphere_pdf() -> Float {
    FRAC_1_4PI
}

/// Uniform barycentrics over a triangle.
pub fn sample_uniform_triangle(u: Point2f) -> [Float; 3] {
    let (b0, b1) = if u[0] < u[1] {
        let b0 = u[0] / 2.0;
        (b0, u[1] - b0)
    } else {
        let b1 = u[1] / 2.0;
        (u[0] - b1, b1)
    };
    [b0, b1, 1.0 - b0 - b1]
}

/// Balance heuristic for one sample from each of two strategies.
#[inline]
pub fn balance_heuristic(pdf_f: Float, pdf_g: Float) -> Float {
    if pdf_f == 0.0 { 0.0 } else { pdf_f / (pdf_f + pdf_g) }
}
