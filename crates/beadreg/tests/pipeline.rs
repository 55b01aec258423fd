use approx::assert_relative_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};

use beadreg::{
    beads::{link_beads, merge_corresponding_beads, ViewBeads, ViewId},
    icp::{refine, Icp, IcpConvergenceCriteria, IcpError, NearestNeighborIdentification},
    k3d::{
        model::{Model, RigidModel3D, TranslationModel3D},
        point::{Point, PointId, PointMatch},
    },
};

#[test]
fn test_merge_then_register() -> Result<(), IcpError> {
    let mut rng = StdRng::seed_from_u64(1234);

    // bead detections of the view to register, in its local frame
    let locals = (0..4)
        .flat_map(|i| (0..4).flat_map(move |j| (0..3).map(move |k| (i, j, k))))
        .map(|(i, j, k)| {
            [
                i as f64 * 25.0 + rng.random_range(-3.0..3.0),
                j as f64 * 25.0 + rng.random_range(-3.0..3.0),
                k as f64 * 25.0 + rng.random_range(-3.0..3.0),
            ]
        })
        .collect::<Vec<_>>();

    let (s, c) = 0.08f64.sin_cos();
    let truth = RigidModel3D::new(
        [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
        [3.0, -2.0, 1.0],
    );
    let world = locals.iter().map(|p| truth.apply(p)).collect::<Vec<_>>();

    // three already registered views see every bead
    let offsets = [[0.0, 0.0, 0.0], [10.0, -4.0, 2.0], [-7.0, 3.0, 0.5]];
    let mut views = offsets
        .iter()
        .enumerate()
        .map(|(i, t)| ViewBeads::new(ViewId(i as u32), TranslationModel3D::new(*t)))
        .collect::<Vec<_>>();
    let mut ids = vec![Vec::new(); views.len()];
    for p in world.iter() {
        for (v, t) in offsets.iter().enumerate() {
            ids[v].push(views[v].add_bead([p[0] - t[0], p[1] - t[1], p[2] - t[2]]));
        }
    }
    for i in 0..world.len() {
        assert!(link_beads(&mut views, ids[0][i], ids[1][i]));
        assert!(link_beads(&mut views, ids[1][i], ids[2][i]));
    }
    // a lonely detection without any correspondence
    views[2].add_bead([500.0, 500.0, 500.0]);

    let landmarks = merge_corresponding_beads(&views, ViewId(99));
    assert_eq!(landmarks.len(), world.len());
    for (landmark, expected) in landmarks.iter().zip(world.iter()) {
        assert_eq!(landmark.members.len(), 3);
        for i in 0..3 {
            assert_relative_eq!(landmark.position[i], expected[i], epsilon = 1e-9);
        }
    }

    let target = locals.iter().map(|p| Point::new(*p)).collect::<Vec<_>>();
    let reference = landmarks.iter().map(|l| l.to_point()).collect::<Vec<_>>();
    let mut icp = Icp::with_identification(
        target,
        reference,
        NearestNeighborIdentification::with_max_distance(5.0),
    );

    // a rough first guess from a handful of known pairs
    let mut matches = (0..4)
        .map(|i| PointMatch::new(PointId(i), PointId(i)))
        .collect::<Vec<_>>();
    matches.push(PointMatch::new(PointId(0), PointId(0)));
    let mut model = RigidModel3D::default();
    let initial = icp.estimate_initial_model(&mut matches, &mut model)?;
    assert_eq!(initial.num_matches, 4);
    assert_eq!(icp.ambiguous_matches().len(), 1);

    let criteria = IcpConvergenceCriteria {
        max_iterations: 50,
        max_plateau_width: 3,
        max_allowed_error: 1e-3,
    };
    let result = refine(&mut icp, &mut model, &criteria)?;
    assert!(result.num_iterations < criteria.max_iterations);

    let stats = result.statistics.unwrap();
    assert_eq!(stats.num_matches, world.len());
    assert!(stats.max_error < 1e-6);

    let t = model.translation();
    assert_relative_eq!(t[0], 3.0, epsilon = 1e-6);
    assert_relative_eq!(t[1], -2.0, epsilon = 1e-6);
    assert_relative_eq!(t[2], 1.0, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_single_bead_scenario() -> Result<(), IcpError> {
    let mut icp = Icp::with_identification(
        vec![Point::new([0.0, 0.0, 0.0])],
        vec![Point::new([0.1, 0.0, 0.0])],
        NearestNeighborIdentification::with_max_distance(0.5),
    );

    let mut model = TranslationModel3D::default();
    let stats = icp.run_iteration_in_place(&mut model)?;

    assert_eq!(stats.num_matches, 1);
    assert_relative_eq!(model.translation()[0], 0.1, epsilon = 1e-12);
    assert_relative_eq!(stats.average_error, 0.0, epsilon = 1e-12);
    assert_relative_eq!(stats.max_error, 0.0, epsilon = 1e-12);
    Ok(())
}
