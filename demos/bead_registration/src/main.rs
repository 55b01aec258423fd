use argh::FromArgs;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;

use beadreg::{
    beads::{link_beads, merge_corresponding_beads, MergedLandmark, ViewBeads, ViewId},
    icp::{refine, Icp, IcpConvergenceCriteria, NearestNeighborIdentification},
    k3d::{
        model::{Model, RigidModel3D, TranslationModel3D},
        point::Point,
    },
};

#[derive(FromArgs)]
/// Register a synthetic view against beads merged from registered views
struct Args {
    /// number of beads in the sample
    #[argh(option, default = "200")]
    num_beads: usize,

    /// number of already registered views
    #[argh(option, default = "3")]
    num_views: usize,

    /// seed of the random generator
    #[argh(option, default = "0")]
    seed: u64,

    /// localization noise of the detections
    #[argh(option, default = "0.2")]
    noise: f64,

    /// maximum distance between corresponding beads
    #[argh(option, default = "10.0")]
    max_distance: f64,

    /// path to a JSON file with the convergence criteria
    #[argh(option)]
    criteria_path: Option<PathBuf>,

    /// path to write the registration report as JSON
    #[argh(option)]
    output_path: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report {
    num_iterations: usize,
    average_error: f64,
    max_error: f64,
    num_matches: usize,
    rotation: [[f64; 3]; 3],
    translation: [f64; 3],
    landmarks: Vec<MergedLandmark>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let criteria = match &args.criteria_path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => IcpConvergenceCriteria::default(),
    };
    log::info!("Convergence criteria: {:?}", criteria);

    let mut rng = StdRng::seed_from_u64(args.seed);

    let sample = (0..args.num_beads)
        .map(|_| {
            [
                rng.random_range(0.0..500.0),
                rng.random_range(0.0..500.0),
                rng.random_range(0.0..200.0),
            ]
        })
        .collect::<Vec<_>>();

    // every registered view detects every bead, up to noise
    let mut views = Vec::with_capacity(args.num_views);
    let mut detections = Vec::with_capacity(args.num_views);
    for v in 0..args.num_views {
        let offset = [
            rng.random_range(-50.0..50.0),
            rng.random_range(-50.0..50.0),
            rng.random_range(-20.0..20.0),
        ];
        let mut view = ViewBeads::new(ViewId(v as u32), TranslationModel3D::new(offset));
        let ids = sample
            .iter()
            .map(|p| {
                view.add_bead(std::array::from_fn(|i| {
                    p[i] - offset[i] + rng.random_range(-args.noise..=args.noise)
                }))
            })
            .collect::<Vec<_>>();
        views.push(view);
        detections.push(ids);
    }
    for pair in detections.windows(2) {
        for (a, b) in pair[0].iter().zip(pair[1].iter()) {
            link_beads(&mut views, *a, *b);
        }
    }

    let landmarks = merge_corresponding_beads(&views, ViewId(args.num_views as u32));
    println!(
        "Merged #{} beads of #{} views into #{} landmarks",
        args.num_beads,
        args.num_views,
        landmarks.len()
    );

    // the new view sees the sample through an unknown rigid transform
    let (s, c) = 0.01f64.sin_cos();
    let truth = RigidModel3D::new(
        [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
        [2.0, -1.5, 0.5],
    );
    let r = truth.rotation();
    let t = truth.translation();
    let target = sample
        .iter()
        .map(|p| {
            let d = [p[0] - t[0], p[1] - t[1], p[2] - t[2]];
            Point::new(std::array::from_fn(|i| {
                r[0][i] * d[0] + r[1][i] * d[1] + r[2][i] * d[2]
                    + rng.random_range(-args.noise..=args.noise)
            }))
        })
        .collect::<Vec<_>>();
    let reference = landmarks
        .iter()
        .map(MergedLandmark::to_point)
        .collect::<Vec<_>>();

    let mut icp = Icp::with_identification(
        target,
        reference,
        NearestNeighborIdentification::with_max_distance(args.max_distance),
    );
    let mut model = RigidModel3D::default();
    let result = refine(&mut icp, &mut model, &criteria)?;

    let Some(stats) = result.statistics else {
        println!("No ICP iteration was run");
        return Ok(());
    };
    println!(
        "ICP finished after #{} iterations: {:?}",
        result.num_iterations, stats
    );
    println!(
        "Estimated rotation: {:?} translation: {:?}",
        model.rotation(),
        model.translation()
    );
    println!(
        "Expected rotation: {:?} translation: {:?}",
        truth.rotation(),
        truth.translation()
    );
    println!(
        "Bead at origin maps to {:?}",
        model.apply(&[0.0, 0.0, 0.0])
    );

    if let Some(path) = args.output_path {
        let report = Report {
            num_iterations: result.num_iterations,
            average_error: stats.average_error,
            max_error: stats.max_error,
            num_matches: stats.num_matches,
            rotation: model.rotation(),
            translation: model.translation(),
            landmarks,
        };
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}
