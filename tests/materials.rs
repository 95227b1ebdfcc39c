use approx::assert_abs_diff_eq;
use prism::{
    color::SampledWavelengths,
    guiding::SdTree,
    integrator::{AbstractRayIntegrator, GuidedPathIntegrator, RandomWalkIntegrator, SimplePathIntegrator},
    material::{ConductorMaterial, DielectricMaterial, MetallicWorkflowMaterial},
    math::{Float, Point3f, Ray, Vec3f},
    sampler::{AbstractSampler, IndependentSampler},
    scene::{LightSamplerType, MaterialId, Scene, SceneBuilder},
    shape::Sphere,
};

/// A unit sphere of the material `make` registers, under a uniform sky of
/// radiance 1.
fn sky_sphere(make: impl FnOnce(&mut SceneBuilder) -> MaterialId) -> Scene {
    let mut b = SceneBuilder::new();
    let one = b.spectra.add_constant(1.0);
    let material = make(&mut b);
    let sphere = b.shapes.add_sphere(Sphere::FULL);
    let root = b.add_primitive(sphere, material);
    b.add_uniform_light(one);
    b.build(root, LightSamplerType::Power).unwrap()
}

fn glass(b: &mut SceneBuilder, dispersive: bool, roughness: Float) -> MaterialId {
    let ior = if dispersive { b.spectra.add_cauchy(1.5046, 0.0042) } else { b.spectra.add_constant(1.5) };
    let r = b.spectra.add_constant(roughness);
    let r = b.textures.add_constant(r);
    b.materials.add_dielectric(DielectricMaterial { ior, u_roughness: r, v_roughness: r })
}

fn rough_conductor(b: &mut SceneBuilder) -> MaterialId {
    let re = b.spectra.add_constant(0.2);
    let im = b.spectra.add_constant(3.9);
    let r = b.spectra.add_constant(0.3);
    let ior_re = b.textures.add_constant(re);
    let ior_im = b.textures.add_constant(im);
    let r = b.textures.add_constant(r);
    b.materials.add_conductor(ConductorMaterial { ior_re, ior_im, u_roughness: r, v_roughness: r })
}

/// Full metal with a white base and no roughness: a perfect mirror.
fn white_metal(b: &mut SceneBuilder) -> MaterialId {
    let zero = b.spectra.add_constant(0.0);
    let one = b.spectra.add_constant(1.0);
    let smooth = b.textures.add_constant(zero);
    let white = b.textures.add_constant(one);
    b.materials.add_metallic_workflow(MetallicWorkflowMaterial {
        base_color: white,
        metallic: white,
        u_roughness: smooth,
        v_roughness: smooth,
    })
}

fn mean_estimate<I: AbstractRayIntegrator>(scene: &Scene, integrator: &I, seed: u64, n: u64) -> Float {
    let mut sampler = IndependentSampler::new(seed);
    let mut sum = 0.0f64;
    for i in 0..n {
        sampler.start_sample(0, i);
        let mut lambda = SampledWavelengths::sample_visible(sampler.get_1d());
        let ray = Ray::new(Point3f::new(0.3, -0.2, -4.0), Vec3f::new(0.0, 0.0, 1.0));
        sum += integrator.li(scene, ray, &mut lambda, &mut sampler).average() as f64;
    }
    (sum / n as f64) as Float
}

/// Trains a guide for one pass over the scene, then measures with it frozen.
fn guided_estimate(scene: &Scene, max_depth: u32, n: u64) -> Float {
    let mut integrator = GuidedPathIntegrator::new(max_depth, 3, 0.5, SdTree::new(scene.bounds()));
    mean_estimate(scene, &integrator, 1, n / 4);
    integrator.tree.refine();
    integrator.learning = false;
    mean_estimate(scene, &integrator, 2, n)
}

#[test]
fn smooth_glass_conserves_energy() {
    // Chords through a sphere never reach total internal reflection, so
    // every path escapes to the sky carrying exactly its radiance.
    for dispersive in [false, true] {
        let scene = sky_sphere(|b| glass(b, dispersive, 0.0));
        let walk = RandomWalkIntegrator { max_depth: 32 };
        assert_abs_diff_eq!(mean_estimate(&scene, &walk, 5, 4000), 1.0, epsilon = 0.01);
        let simple = SimplePathIntegrator { max_depth: 32, rr_min_depth: 32 };
        assert_abs_diff_eq!(mean_estimate(&scene, &simple, 5, 4000), 1.0, epsilon = 0.01);
    }
}

#[test]
fn dispersion_keeps_the_mean_of_plain_glass() {
    let plain = sky_sphere(|b| glass(b, false, 0.0));
    let dispersive = sky_sphere(|b| glass(b, true, 0.0));
    let integrator = SimplePathIntegrator { max_depth: 32, rr_min_depth: 3 };
    let a = mean_estimate(&plain, &integrator, 9, 20_000);
    let b = mean_estimate(&dispersive, &integrator, 9, 20_000);
    assert_abs_diff_eq!(a, b, epsilon = 0.02);
}

#[test]
fn guided_mirror_keeps_delta_reflection() {
    let scene = sky_sphere(white_metal);
    let simple = SimplePathIntegrator { max_depth: 8, rr_min_depth: 3 };
    assert_abs_diff_eq!(mean_estimate(&scene, &simple, 3, 4000), 1.0, epsilon = 1e-3);
    assert_abs_diff_eq!(guided_estimate(&scene, 8, 20_000), 1.0, epsilon = 0.03);
}

#[test]
fn guided_agrees_with_simple_on_glossy_materials() {
    let scenes = [
        ("conductor", sky_sphere(rough_conductor)),
        ("dielectric", sky_sphere(|b| glass(b, false, 0.3))),
        ("metallic", sky_sphere(white_metal)),
    ];
    for (name, scene) in &scenes {
        let simple = SimplePathIntegrator { max_depth: 10, rr_min_depth: 3 };
        let expected = mean_estimate(scene, &simple, 4, 20_000);
        let guided = guided_estimate(scene, 10, 20_000);
        assert!((guided - expected).abs() < 0.03, "{name}: guided {guided} vs simple {expected}");
    }
}
