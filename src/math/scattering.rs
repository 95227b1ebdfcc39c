use num::Complex;

use crate::color::{SampledSpectrum, NUM_SPECTRUM_SAMPLES};
use crate::math::sampling::sample_uniform_disk_polar;
use crate::math::*;

#[inline]
pub fn reflect(wo: Vec3f, n: Vec3f) -> Vec3f {
    -wo + n * (2.0 * wo.dot(n))
}

/// Refracts `wi` through the interface with normal `n` and relative IOR
/// `eta` (inside over outside). Returns the transmitted direction and the
/// effective relative IOR along the path, or `None` on total internal
/// reflection.
pub fn refract(wi: Vec3f, mut n: Vec3f, mut eta: Float) -> Option<(Vec3f, Float)> {
    let mut cos_theta_i = n.dot(wi);
    if cos_theta_i < 0.0 {
        eta = 1.0 / eta;
        cos_theta_i = -cos_theta_i;
        n = -n;
    }

    let sin2_theta_i = Float::max(0.0, 1.0 - sqr(cos_theta_i));
    let sin2_theta_t = sin2_theta_i / sqr(eta);
    if sin2_theta_t >= 1.0 {
        return None;
    }

    let cos_theta_t = safe::sqrt(1.0 - sin2_theta_t);
    let wt = -wi / eta + n * (cos_theta_i / eta - cos_theta_t);
    Some((wt, eta))
}

/// Unpolarized Fresnel reflectance of a dielectric interface. Total
/// internal reflection yields 1.
pub fn fr_dielectric(cos_theta_i: Float, mut eta: Float) -> Float {
    let mut cos_theta_i = cos_theta_i.clamp(-1.0, 1.0);
    if cos_theta_i < 0.0 {
        eta = 1.0 / eta;
        cos_theta_i = -cos_theta_i;
    }

    let sin2_theta_i = 1.0 - sqr(cos_theta_i);
    let sin2_theta_t = sin2_theta_i / sqr(eta);
    if sin2_theta_t >= 1.0 {
        return 1.0;
    }
    let cos_theta_t = safe::sqrt(1.0 - sin2_theta_t);

    let r_parl = (eta * cos_theta_i - cos_theta_t) / (eta * cos_theta_i + cos_theta_t);
    let r_perp = (cos_theta_i - eta * cos_theta_t) / (cos_theta_i + eta * cos_theta_t);
    (sqr(r_parl) + sqr(r_perp)) / 2.0
}

#[inline]
pub fn fresnel_complex(cos_theta_i: Float, eta: Complex<Float>) -> Float {
    let cos_theta_i = cos_theta_i.clamp(0.0, 1.0);

    let sin2_theta_i = 1.0 - sqr(cos_theta_i);
    let sin2_theta_t = sin2_theta_i / (eta * eta);
    let cos_theta_t = (1.0 - sin2_theta_t).sqrt();

    let r_parl = (eta * cos_theta_i - cos_theta_t) / (eta * cos_theta_i + cos_theta_t);
    let r_perp = (cos_theta_i - eta * cos_theta_t) / (cos_theta_i + eta * cos_theta_t);

    (r_parl.norm_sqr() + r_perp.norm_sqr()) / 2.0
}

pub fn fresnel_complex_spectral(cos_theta_i: Float, eta: SampledSpectrum, k: SampledSpectrum) -> SampledSpectrum {
    let mut s = [0.0; NUM_SPECTRUM_SAMPLES];
    for (i, v) in s.iter_mut().enumerate() {
        *v = fresnel_complex(cos_theta_i, Complex::new(eta[i], k[i]));
    }
    SampledSpectrum::new(s)
}

/// Schlick's approximation around the normal-incidence reflectance `f0`.
pub fn fresnel_schlick(cos_theta_i: Float, f0: SampledSpectrum) -> SampledSpectrum {
    let m = (1.0 - cos_theta_i.clamp(0.0, 1.0)).powi(5);
    f0 + (SampledSpectrum::from_const(1.0) - f0) * m
}

/// Anisotropic GGX microfacet distribution with height-correlated Smith
/// masking.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrowbridgeReitzDistribution {
    alpha_x: Float,
    alpha_y: Float,
}

impl TrowbridgeReitzDistribution {
    pub fn new(ax: Float, ay: Float) -> Self {
        let d = Self { alpha_x: ax, alpha_y: ay };
        if d.effectively_smooth() {
            d
        } else {
            Self { alpha_x: ax.max(1e-4), alpha_y: ay.max(1e-4) }
        }
    }

    #[inline]
    pub fn effectively_smooth(&self) -> bool {
        self.alpha_x.max(self.alpha_y) < 1e-3
    }

    pub fn d(&self, wm: Vec3f) -> Float {
        let tan2_theta = tan_2_theta(wm);
        if tan2_theta.is_infinite() || tan2_theta.is_nan() {
            return 0.0;
        }

        let cos4_theta = sqr(cos_2_theta(wm));
        if cos4_theta < 1e-16 {
            return 0.0;
        }

        let e = tan2_theta * (sqr(cos_phi(wm) / self.alpha_x) + sqr(sin_phi(wm) / self.alpha_y));
        1.0 / (PI * self.alpha_x * self.alpha_y * cos4_theta * sqr(1.0 + e))
    }

    pub fn lambda(&self, w: Vec3f) -> Float {
        let tan2_theta = tan_2_theta(w);
        if tan2_theta.is_infinite() || tan2_theta.is_nan() {
            return 0.0;
        }

        let alpha2 = sqr(cos_phi(w) * self.alpha_x) + sqr(sin_phi(w) * self.alpha_y);
        (-1.0 + Float::sqrt(1.0 + alpha2 * tan2_theta)) / 2.0
    }

    #[inline]
    pub fn g1(&self, w: Vec3f) -> Float {
        1.0 / (1.0 + self.lambda(w))
    }

    #[inline]
    pub fn g(&self, wo: Vec3f, wi: Vec3f) -> Float {
        1.0 / (1.0 + self.lambda(wo) + self.lambda(wi))
    }

    /// Distribution of visible normals as seen from `w`.
    pub fn d_w(&self, w: Vec3f, wm: Vec3f) -> Float {
        let cos_theta = abs_cos_theta(w);
        if cos_theta == 0.0 {
            return 0.0;
        }
        self.g1(w) / cos_theta * self.d(wm) * w.dot(wm).abs()
    }

    #[inline]
    pub fn pdf(&self, w: Vec3f, wm: Vec3f) -> Float {
        self.d_w(w, wm)
    }

    /// Samples a visible microfacet normal for `w`.
    pub fn sample_wm(&self, w: Vec3f, u: Point2f) -> Vec3f {
        let mut wh = Vec3f::new(self.alpha_x * w.x, self.alpha_y * w.y, w.z).normalize();
        if wh.z < 0.0 {
            wh = -wh;
        }

        let t1 = if wh.z < 0.99999 {
            Vec3f::new(0.0, 0.0, 1.0).cross(wh).normalize()
        } else {
            Vec3f::new(1.0, 0.0, 0.0)
        };
        let t2 = wh.cross(t1);

        let mut p = sample_uniform_disk_polar(u);
        let h = safe::sqrt(1.0 - sqr(p.x));
        p.y = lerp(h, p.y, (1.0 + wh.z) / 2.0);

        let pz = safe::sqrt(1.0 - p.x * p.x - p.y * p.y);
        let nh = t1 * p.x + t2 * p.y + wh * pz;
        Vec3f::new(self.alpha_x * nh.x, self.alpha_y * nh.y, nh.z.max(1e-6)).normalize()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::math::sampling::{sample_uniform_sphere, uniform_sphere_pdf};

    #[test]
    fn dielectric_fresnel() {
        assert_abs_diff_eq!(fr_dielectric(1.0, 1.5), 0.04, epsilon = 1e-4);
        assert_abs_diff_eq!(fr_dielectric(1.0, 1.0), 0.0, epsilon = 1e-6);
        // Grazing from inside a dense medium is totally reflected.
        assert_eq!(fr_dielectric(-0.1, 1.5), 1.0);
    }

    #[test]
    fn complex_fresnel_reduces_to_real() {
        for &c in &[0.2, 0.5, 0.9] {
            assert_abs_diff_eq!(fresnel_complex(c, Complex::new(1.5, 0.0)), fr_dielectric(c, 1.5), epsilon = 1e-5);
        }
    }

    #[test]
    fn refraction_obeys_snell() {
        let n = Vec3f::new(0.0, 0.0, 1.0);
        let wi = Vec3f::new(0.6, 0.0, 0.8);
        let (wt, etap) = refract(wi, n, 1.5).unwrap();
        assert_abs_diff_eq!(etap, 1.5);
        assert_abs_diff_eq!(wt.length(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(sin_theta(wt) * 1.5, sin_theta(wi), epsilon = 1e-5);
        assert!(wt.z < 0.0);

        assert!(refract(Vec3f::new(0.9, 0.0, -(1.0f32 - 0.81).sqrt()), n, 1.5).is_none());
    }

    #[test]
    fn ggx_normalization() {
        // The projected microfacet area integrates to 1 over the hemisphere.
        let distrib = TrowbridgeReitzDistribution::new(0.3, 0.5);
        let n = 512;
        let mut sum = 0.0;
        for i in 0..n {
            for j in 0..n {
                let u = Point2f::new((i as Float + 0.5) / n as Float, (j as Float + 0.5) / n as Float);
                let wm = sample_uniform_sphere(u);
                if wm.z > 0.0 {
                    sum += distrib.d(wm) * wm.z / uniform_sphere_pdf();
                }
            }
        }
        assert_abs_diff_eq!(sum / (n * n) as Float, 1.0, epsilon = 2e-2);
    }

    #[test]
    fn visible_normals_are_upper_hemisphere() {
        let distrib = TrowbridgeReitzDistribution::new(0.4, 0.4);
        let w = Vec3f::new(0.3, -0.2, 0.9).normalize();
        for i in 0..16 {
            let u = Point2f::new((i as Float + 0.5) / 16.0, 0.37);
            let wm = distrib.sample_wm(w, u);
            assert!(wm.z > 0.0);
            assert!(distrib.pdf(w, wm) > 0.0);
        }
    }
}
