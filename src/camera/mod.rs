use crate::math::*;

pub mod film;

pub use film::{AbstractFilm, EstimateFilm, FilmStats};

/// Maps film positions to primary rays.
pub trait AbstractCamera {
    /// World-space ray with a normalized direction through `p_film`, given
    /// in `[0, 1)^2` with `y` pointing down the image.
    fn generate_ray(&self, p_film: Point2f) -> Ray;
}

/// A pinhole camera looking along `z` of its frame.
#[derive(Debug, Clone, Copy)]
pub struct PinholeCamera {
    origin: Point3f,
    frame: Frame,
    tan_half_fov: Float,
    aspect: Float,
}

impl PinholeCamera {
    /// `fov` is the vertical field of view in degrees, `aspect` is
    /// width over height.
    pub fn look_at(eye: Point3f, target: Point3f, up: Vec3f, fov: Float, aspect: Float) -> PinholeCamera {
        let forward = (target - eye).normalize();
        let right = up.cross(forward).normalize();
        PinholeCamera {
            origin: eye,
            frame: Frame::from_xz(right, forward),
            tan_half_fov: (0.5 * fov.to_radians()).tan(),
            aspect,
        }
    }
}

impl AbstractCamera for PinholeCamera {
    fn generate_ray(&self, p_film: Point2f) -> Ray {
        let x = (2.0 * p_film.x - 1.0) * self.tan_half_fov * self.aspect;
        let y = (1.0 - 2.0 * p_film.y) * self.tan_half_fov;
        Ray::new(self.origin, self.frame.globalize(Vec3f::new(x, y, 1.0)).normalize())
    }
}
