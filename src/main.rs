use std::process::ExitCode;

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use prism::{
    camera::{EstimateFilm, PinholeCamera},
    error::{SceneError, SceneResult},
    integrator::RayIntegrator,
    material::{ConductorMaterial, DielectricMaterial, DiffuseMaterial},
    math::{Float, Mat4, Point2f, Point3f, Transform, Vec3f},
    options::{IntegratorKind, LightSamplerKind, Options},
    render::render,
    scene::{LightSamplerType, MaterialId, NodeId, Scene, SceneBuilder},
    shape::{Sphere, TriVertex},
    texture::Image,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum SceneKind {
    /// Lambertian sphere of albedo 0.5 under a uniform white sky.
    Furnace,
    /// Smooth conductor sphere over a checkerboard floor.
    Mirror,
    /// Dispersive glass sphere under an environment map with a sun.
    Glass,
}

#[derive(clap::Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Built-in scene to render.
    #[arg(long, value_enum, default_value = "furnace")]
    scene: SceneKind,

    /// Light transport algorithm.
    #[arg(short, long, value_enum, default_value = "simple-path")]
    integrator: IntegratorKind,

    /// How lights are picked for next event estimation.
    #[arg(long, value_enum, default_value = "power")]
    light_sampler: LightSamplerKind,

    /// Samples per pixel.
    #[arg(short, long, default_value = "64")]
    spp: u32,

    /// Maximum number of bounces.
    #[arg(long, default_value = "8")]
    max_depth: u32,

    /// Bounces before Russian roulette starts.
    #[arg(long, default_value = "3")]
    rr_min_depth: u32,

    /// Set the seed of the random number generator.
    #[arg(long, default_value = "0")]
    seed: u64,

    #[arg(long, default_value = "64")]
    width: u32,

    #[arg(long, default_value = "64")]
    height: u32,

    /// Chance of sampling the learned guide at diffuse and glossy vertices.
    #[arg(long, default_value = "0.5")]
    guiding_probability: Float,

    /// Share of the samples spent learning the guide.
    #[arg(long, default_value = "0.15")]
    training_fraction: Float,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Args::parse();
    let options = Options {
        integrator: cli.integrator,
        light_sampler: cli.light_sampler,
        max_depth: cli.max_depth,
        rr_min_depth: cli.rr_min_depth,
        spp: cli.spp,
        seed: cli.seed,
        width: cli.width,
        height: cli.height,
        guiding_probability: cli.guiding_probability,
        training_fraction: cli.training_fraction,
    };
    if let Err(e) = options.validate() {
        error!("invalid options: {e}");
        return ExitCode::FAILURE;
    }

    println!("{} Building scene...", style("[1/2]").bold().dim());
    let scene = match build_scene(cli.scene, options.light_sampler.into()) {
        Ok(scene) => scene,
        Err(e) => {
            error!("failed to build scene: {e}");
            return ExitCode::FAILURE;
        }
    };

    let camera = PinholeCamera::look_at(
        Point3f::new(0.0, 0.5, -4.0),
        Point3f::new(0.0, 0.0, 0.0),
        Vec3f::new(0.0, 1.0, 0.0),
        40.0,
        options.width as Float / options.height as Float,
    );
    let mut film = EstimateFilm::new(options.width as usize, options.height as usize);
    let mut integrator = RayIntegrator::new(&options, &scene);

    println!("{} Rendering...", style("[2/2]").bold().dim());
    let progress = ProgressBar::new(options.spp as u64 * options.width as u64 * options.height as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} samples [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let report = render(&scene, &camera, &mut integrator, &mut film, &options, &progress);
    progress.finish_and_clear();

    let stats = film.stats();
    let time_per_sample = report.time_per_sample();
    println!(
        "Took {:.2} seconds ({:.3?} / sample) over the final {} samples",
        report.elapsed.as_secs_f64(),
        std::time::Duration::from_secs_f64(time_per_sample),
        report.samples,
    );
    if report.guide_iterations > 0 {
        println!("Guide refined {} times", report.guide_iterations);
    }
    println!("Mean estimate: {}", stats.mean);
    println!("Average relative variance: {}", stats.relative_variance);
    println!("Average relative error: {}", stats.relative_error);
    println!("Efficiency: {}", 1.0 / (stats.relative_variance * time_per_sample));

    ExitCode::SUCCESS
}

fn build_scene(kind: SceneKind, light_sampler: LightSamplerType) -> SceneResult<Scene> {
    let mut b = SceneBuilder::new();
    let sphere = b.shapes.add_sphere(Sphere::FULL);

    let root = match kind {
        SceneKind::Furnace => {
            let half = b.spectra.add_constant(0.5);
            let reflectance = b.textures.add_constant(half);
            let material = b.materials.add_diffuse(DiffuseMaterial { reflectance });
            let one = b.spectra.add_constant(1.0);
            b.add_uniform_light(one);
            b.add_primitive(sphere, material)
        }
        SceneKind::Mirror => {
            let zero = b.spectra.add_constant(0.0);
            let smooth = b.textures.add_constant(zero);
            let re = b.spectra.add_constant(0.2);
            let im = b.spectra.add_constant(3.9);
            let material = b.materials.add_conductor(ConductorMaterial {
                ior_re: b.textures.add_constant(re),
                ior_im: b.textures.add_constant(im),
                u_roughness: smooth,
                v_roughness: smooth,
            });
            let one = b.spectra.add_constant(1.0);
            b.add_uniform_light(one);
            let ball = b.add_primitive(sphere, material);
            let floor = floor(&mut b)?;
            b.add_bvh(&[ball, floor])?
        }
        SceneKind::Glass => {
            let zero = b.spectra.add_constant(0.0);
            let smooth = b.textures.add_constant(zero);
            let ior = b.spectra.add_cauchy(1.5046, 0.0042);
            let material = b.materials.add_dielectric(DielectricMaterial {
                ior,
                u_roughness: smooth,
                v_roughness: smooth,
            });
            let one = b.spectra.add_constant(1.0);
            b.add_image_light(sky()?, one, 1.0, Transform::new(Mat4::IDENTITY, Mat4::IDENTITY))?;
            let ball = b.add_primitive(sphere, material);
            let floor = floor(&mut b)?;
            b.add_bvh(&[ball, floor])?
        }
    };

    b.build(root, light_sampler)
}

/// A checkerboard quad at `y = -1`.
fn floor(b: &mut SceneBuilder) -> SceneResult<NodeId> {
    let dark = b.spectra.add_constant(0.2);
    let light = b.spectra.add_constant(0.8);
    let even = b.textures.add_constant(dark);
    let odd = b.textures.add_constant(light);
    let checker = b.textures.add_checkerboard(even, odd);
    let material: MaterialId = b.materials.add_diffuse(DiffuseMaterial { reflectance: checker });

    let s = 8.0;
    let corner = |x: Float, z: Float, u: Float, v: Float| {
        TriVertex::new(Point3f::new(x, -1.0, z)).with_uv(Point2f::new(u, v))
    };
    let verts = [
        corner(-s, -s, 0.0, 0.0),
        corner(s, -s, 8.0, 0.0),
        corner(s, s, 8.0, 8.0),
        corner(-s, s, 0.0, 8.0),
    ];
    let tris = b.shapes.add_triangles(&verts, &[[0, 2, 1], [0, 3, 2]]);
    let nodes: Vec<NodeId> = tris.into_iter().map(|t| b.add_primitive(t, material)).collect();
    b.add_bvh(&nodes)
}

/// A dim sky with a small, bright sun, over the equal-area square.
fn sky() -> SceneResult<Image> {
    const N: usize = 32;
    let mut data = vec![0.3; N * N];
    data[6 * N + 9] = 400.0;
    Image::new(N, N, data).ok_or(SceneError::InvalidEnvironmentImage(N, N))
}
