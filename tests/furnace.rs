use approx::assert_abs_diff_eq;
use indicatif::ProgressBar;
use prism::{
    camera::{EstimateFilm, PinholeCamera},
    color::SampledWavelengths,
    integrator::{AbstractRayIntegrator, RandomWalkIntegrator, RayIntegrator, SimplePathIntegrator},
    material::DiffuseMaterial,
    math::{Float, Point3f, Ray, Vec3f},
    options::{IntegratorKind, Options},
    render::render,
    sampler::{AbstractSampler, IndependentSampler},
    scene::{LightSamplerType, Scene, SceneBuilder},
    shape::Sphere,
};

/// A Lambertian unit sphere of albedo 0.5 under a uniform sky of radiance
/// 1. The sphere is convex, so every reflected direction sees the sky and
/// the radiance leaving it is exactly the albedo.
fn furnace(light_sampler: LightSamplerType) -> Scene {
    let mut b = SceneBuilder::new();
    let half = b.spectra.add_constant(0.5);
    let one = b.spectra.add_constant(1.0);
    let reflectance = b.textures.add_constant(half);
    let material = b.materials.add_diffuse(DiffuseMaterial { reflectance });
    let sphere = b.shapes.add_sphere(Sphere::FULL);
    let root = b.add_primitive(sphere, material);
    b.add_uniform_light(one);
    b.build(root, light_sampler).unwrap()
}

fn mean_estimate<I: AbstractRayIntegrator>(scene: &Scene, integrator: &I, n: u64) -> Float {
    let mut sampler = IndependentSampler::new(17);
    let mut sum = 0.0f64;
    for i in 0..n {
        sampler.start_sample(0, i);
        let mut lambda = SampledWavelengths::sample_visible(sampler.get_1d());
        let ray = Ray::new(Point3f::new(0.3, -0.2, -4.0), Vec3f::new(0.0, 0.0, 1.0));
        sum += integrator.li(scene, ray, &mut lambda, &mut sampler).average() as f64;
    }
    (sum / n as f64) as Float
}

#[test]
fn simple_path_converges_to_albedo() {
    for light_sampler in [LightSamplerType::Uniform, LightSamplerType::Power] {
        let scene = furnace(light_sampler);
        let integrator = SimplePathIntegrator { max_depth: 8, rr_min_depth: 3 };
        assert_abs_diff_eq!(mean_estimate(&scene, &integrator, 40_000), 0.5, epsilon = 0.01);
    }
}

#[test]
fn random_walk_is_exact_on_a_convex_furnace() {
    let scene = furnace(LightSamplerType::Power);
    let integrator = RandomWalkIntegrator { max_depth: 8 };
    assert_abs_diff_eq!(mean_estimate(&scene, &integrator, 256), 0.5, epsilon = 1e-4);
}

#[test]
fn escaped_rays_see_the_sky() {
    let scene = furnace(LightSamplerType::Power);
    let integrator = SimplePathIntegrator { max_depth: 8, rr_min_depth: 3 };
    let mut sampler = IndependentSampler::new(0);
    sampler.start_sample(0, 0);
    let mut lambda = SampledWavelengths::sample_visible(0.5);
    let ray = Ray::new(Point3f::new(3.0, 0.0, -4.0), Vec3f::new(0.0, 0.0, 1.0));
    let l = integrator.li(&scene, ray, &mut lambda, &mut sampler);
    assert_abs_diff_eq!(l.average(), 1.0, epsilon = 1e-6);
}

#[test]
fn guided_render_converges_to_albedo() {
    let scene = furnace(LightSamplerType::Power);
    let options = Options {
        integrator: IntegratorKind::Guided,
        spp: 128,
        width: 4,
        height: 4,
        ..Default::default()
    };
    options.validate().unwrap();

    // A narrow view so every pixel sees the sphere.
    let camera = PinholeCamera::look_at(
        Point3f::new(0.0, 0.0, -4.0),
        Point3f::new(0.0, 0.0, 0.0),
        Vec3f::new(0.0, 1.0, 0.0),
        10.0,
        1.0,
    );
    let mut film = EstimateFilm::new(4, 4);
    let mut integrator = RayIntegrator::new(&options, &scene);
    let report = render(&scene, &camera, &mut integrator, &mut film, &options, &ProgressBar::hidden());

    // 128 * 0.15 leaves room for refinements before samples 4 and 12.
    assert_eq!(report.guide_iterations, 2);
    assert_eq!(report.samples, 128 - 12);
    assert_eq!(film.count(0), 128 - 12);
    assert_abs_diff_eq!(film.stats().mean, 0.5, epsilon = 0.03);
}
