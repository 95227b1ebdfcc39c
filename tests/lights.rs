use approx::assert_relative_eq;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use prism::{
    color::SampledWavelengths,
    light::{sampler::AbstractLightSampler, AbstractLight},
    material::DiffuseMaterial,
    math::{Dot, Float, Mat4, Normal3f, Point2f, Point3f, Ray, Transform, Vec3f},
    scene::{LightId, LightSamplerType, NodeId, Scene, SceneBuilder},
    shape::{Sphere, TriVertex},
    texture::Image,
};

/// Emissive spheres of different sizes, a scaled emissive quad, a one sided
/// triangle whose shading normals lean away from its plane and an
/// environment map.
fn lit_scene(light_sampler: LightSamplerType) -> (Scene, Vec<LightId>, LightId) {
    let mut b = SceneBuilder::new();
    let half = b.spectra.add_constant(0.5);
    let reflectance = b.textures.add_constant(half);
    let material = b.materials.add_diffuse(DiffuseMaterial { reflectance });
    let sphere = b.shapes.add_sphere(Sphere::FULL);

    let mut nodes: Vec<NodeId> = Vec::new();
    let mut area = Vec::new();
    for (i, (radius, radiance)) in [(0.25, 4.0), (0.5, 2.0), (1.0, 2.0)].into_iter().enumerate() {
        let radiance = b.spectra.add_constant(radiance);
        let (prim, light) = b.add_emissive_primitive(sphere, material, radiance, false);
        let place = Transform::from_translation(Vec3f::new(3.0 * i as Float - 3.0, 2.0, 6.0))
            * Transform::from_scale(Vec3f::splat(radius));
        nodes.push(b.add_transform(place, prim).unwrap());
        area.push(light);
    }

    // A two sided unit quad in the z = 0 plane, stretched and pushed away.
    let verts = [
        TriVertex::new(Point3f::new(-0.5, -0.5, 0.0)),
        TriVertex::new(Point3f::new(0.5, -0.5, 0.0)),
        TriVertex::new(Point3f::new(0.5, 0.5, 0.0)),
        TriVertex::new(Point3f::new(-0.5, 0.5, 0.0)),
    ];
    let glow = b.spectra.add_constant(3.0);
    let quad: Vec<NodeId> = b
        .shapes
        .add_triangles(&verts, &[[0, 1, 2], [0, 2, 3]])
        .into_iter()
        .map(|tri| {
            let (prim, light) = b.add_emissive_primitive(tri, material, glow, true);
            area.push(light);
            prim
        })
        .collect();
    let quad = b.add_bvh(&quad).unwrap();
    let place = Transform::from_translation(Vec3f::new(0.0, -1.0, 4.0)) * Transform::from_scale(Vec3f::new(3.0, 1.5, 1.0));
    nodes.push(b.add_transform(place, quad).unwrap());

    let tilted = Normal3f::new(0.6, 0.0, 0.8);
    let verts = [
        TriVertex::new(Point3f::new(-1.0, -1.0, 0.0)).with_normal(tilted),
        TriVertex::new(Point3f::new(1.0, -1.0, 0.0)).with_normal(tilted),
        TriVertex::new(Point3f::new(0.0, 1.0, 0.0)).with_normal(tilted),
    ];
    let tri = b.shapes.add_triangles(&verts, &[[0, 1, 2]])[0];
    let (prim, light) = b.add_emissive_primitive(tri, material, glow, false);
    area.push(light);
    nodes.push(b.add_transform(Transform::from_translation(Vec3f::new(0.0, 0.0, -3.0)), prim).unwrap());

    let mut data = vec![0.2; 16 * 16];
    data[3 * 16 + 5] = 50.0;
    data[10 * 16 + 12] = 8.0;
    let one = b.spectra.add_constant(1.0);
    let rotate = Transform::from_rotation(0.7, Vec3f::new(0.0, 1.0, 0.0));
    let sky = b.add_image_light(Image::new(16, 16, data).unwrap(), one, 1.0, rotate).unwrap();

    let root = b.add_bvh(&nodes).unwrap();
    (b.build(root, light_sampler).unwrap(), area, sky)
}

#[test]
fn light_pmfs_sum_to_one() {
    for ty in [LightSamplerType::Uniform, LightSamplerType::Power] {
        let (scene, _, _) = lit_scene(ty);
        let sampler = scene.light_samplers.get(scene.light_sampler);
        let total: Float = scene.lights.all().iter().map(|&l| sampler.pmf(&scene.lights, l)).sum();
        assert_relative_eq!(total, 1.0, max_relative = 1e-4);
    }
}

#[test]
fn sampled_probability_matches_pmf() {
    let (scene, _, _) = lit_scene(LightSamplerType::Power);
    let sampler = scene.light_samplers.get(scene.light_sampler);
    let mut counts = vec![0usize; scene.lights.len()];
    let n = 200_000;
    let mut rng = SmallRng::seed_from_u64(7);
    for _ in 0..n {
        let sampled = sampler.sample(rng.gen()).unwrap();
        assert_relative_eq!(sampled.p, sampler.pmf(&scene.lights, sampled.light), max_relative = 1e-5);
        let slot = scene.lights.all().iter().position(|&l| l == sampled.light).unwrap();
        counts[slot] += 1;
    }
    for (slot, &light) in scene.lights.all().iter().enumerate() {
        let expected = sampler.pmf(&scene.lights, light);
        approx::assert_abs_diff_eq!(counts[slot] as Float / n as Float, expected, epsilon = 5e-3);
    }
    // Unregistered handles are never chosen.
    assert_eq!(sampler.pmf(&scene.lights, LightId::NONE), 0.0);
}

#[test]
fn brighter_and_larger_lights_are_favored() {
    let (scene, area, _) = lit_scene(LightSamplerType::Power);
    let sampler = scene.light_samplers.get(scene.light_sampler);
    let pmf = |l: LightId| sampler.pmf(&scene.lights, l);
    // Power goes with radiance times area: 4 * 0.25^2 < 2 * 0.5^2 < 2 * 1^2.
    assert!(pmf(area[0]) < pmf(area[1]));
    assert!(pmf(area[1]) < pmf(area[2]));
    assert_relative_eq!(pmf(area[2]) / pmf(area[0]), 8.0, max_relative = 1e-3);
}

#[test]
fn area_sample_pdf_matches_traced_pdf() {
    let (scene, area, _) = lit_scene(LightSamplerType::Power);
    let lambda = SampledWavelengths::sample_visible(0.5);
    let p_ref = Point3f::new(0.2, 0.1, -1.0);
    let surfaces = &area[3..];

    let mut rng = SmallRng::seed_from_u64(3);
    let mut checked = [0; 3];
    for _ in 0..3000 {
        let slot = rng.gen_range(0..surfaces.len());
        let light = surfaces[slot];
        let Some(ls) = scene.lights.get(light).sample_li(&scene, p_ref, Point2f::new(rng.gen(), rng.gen()), &lambda)
        else {
            continue;
        };
        let Some(hit) = scene.intersect(&Ray::new(p_ref, ls.wi), Float::INFINITY) else {
            continue;
        };
        if hit.light != light {
            continue;
        }
        approx::assert_abs_diff_eq!(hit.p, ls.p_light, epsilon = 1e-3);
        let n_light = ls.n_light.unwrap();
        assert!(n_light.dot(hit.n_geo).abs() > 0.9999, "{n_light:?} vs {:?}", hit.n_geo);
        let pdf = scene.lights.get(light).pdf_li(&scene, p_ref, ls.wi, Some(&hit));
        assert_relative_eq!(pdf, ls.pdf, max_relative = 2e-3);
        checked[slot] += 1;
    }
    assert!(checked.iter().all(|&c| c > 500), "{checked:?}");
}

#[test]
fn image_sample_pdf_matches_lookup() {
    let (scene, _, sky) = lit_scene(LightSamplerType::Power);
    let lambda = SampledWavelengths::sample_visible(0.5);
    let light = scene.lights.get(sky);
    let p_ref = Point3f::new(0.0, 0.0, 0.0);

    let mut rng = SmallRng::seed_from_u64(11);
    for _ in 0..2000 {
        let ls = light.sample_li(&scene, p_ref, Point2f::new(rng.gen(), rng.gen()), &lambda).unwrap();
        assert!(ls.n_light.is_none());
        assert_relative_eq!(ls.wi.length(), 1.0, max_relative = 1e-4);
        let pdf = light.pdf_li(&scene, p_ref, ls.wi, None);
        assert_relative_eq!(pdf, ls.pdf, max_relative = 1e-3);

        // The escaped ray sees the radiance the sample carried.
        let seen = light.emission(&scene, &Ray::new(p_ref, ls.wi), None, &lambda);
        assert_relative_eq!(seen.average(), ls.l.average(), max_relative = 1e-3);
    }
}

#[test]
fn identity_image_light_is_brightest_at_the_hot_texel() {
    let mut b = SceneBuilder::new();
    let one = b.spectra.add_constant(1.0);
    let mut data = vec![0.01; 8 * 8];
    data[2 * 8 + 6] = 100.0;
    let sky = b
        .add_image_light(Image::new(8, 8, data).unwrap(), one, 1.0, Transform::new(Mat4::IDENTITY, Mat4::IDENTITY))
        .unwrap();
    let sphere = b.shapes.add_sphere(Sphere::FULL);
    let half = b.spectra.add_constant(0.5);
    let reflectance = b.textures.add_constant(half);
    let material = b.materials.add_diffuse(DiffuseMaterial { reflectance });
    let root = b.add_primitive(sphere, material);
    let scene = b.build(root, LightSamplerType::Power).unwrap();

    let lambda = SampledWavelengths::sample_visible(0.5);
    let light = scene.lights.get(sky);
    let mut rng = SmallRng::seed_from_u64(5);
    let hot = (0..1000)
        .filter_map(|_| light.sample_li(&scene, Point3f::new(0.0, 0.0, 0.0), Point2f::new(rng.gen(), rng.gen()), &lambda))
        .filter(|ls| ls.l.average() > 50.0)
        .count();
    // The hot texel holds nearly all of the map's energy.
    assert!(hot > 900, "{hot}");
}
