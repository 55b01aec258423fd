use kiddo::immutable::float::kdtree::ImmutableKdTree;

use beadreg_3d::point::{Point, PointId, PointMatch};

/// Strategy proposing candidate correspondences between two point sets.
///
/// Both sets are expected to be in a common frame already, the world
/// coordinates of the points are used.
pub trait PointMatchIdentification {
    /// Propose matches `(target point, reference point)`.
    ///
    /// The source of every returned match indexes `target`, the destination
    /// indexes `reference`.
    fn find_correspondences(&self, target: &[Point], reference: &[Point]) -> Vec<PointMatch>;
}

/// Match every reference point to its nearest target point.
///
/// Candidates farther away than `max_distance` are dropped. Ties between
/// exactly equidistant target points are broken by the kd-tree and are not
/// specified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestNeighborIdentification {
    max_distance: f64,
}

impl Default for NearestNeighborIdentification {
    fn default() -> Self {
        Self {
            max_distance: f64::INFINITY,
        }
    }
}

impl NearestNeighborIdentification {
    /// Create the strategy without a distance threshold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the strategy with an inclusive distance threshold.
    pub fn with_max_distance(max_distance: f64) -> Self {
        Self { max_distance }
    }

    /// The inclusive distance threshold.
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }
}

impl PointMatchIdentification for NearestNeighborIdentification {
    fn find_correspondences(&self, target: &[Point], reference: &[Point]) -> Vec<PointMatch> {
        if target.is_empty() || reference.is_empty() {
            return Vec::new();
        }

        // build kdtree for target points to speed up the nearest neighbor search
        let target_world = target.iter().map(|p| *p.world()).collect::<Vec<_>>();
        let kdtree: ImmutableKdTree<f64, u32, 3, 32> =
            ImmutableKdTree::new_from_slice(&target_world);

        reference
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let nn = kdtree.nearest_one::<kiddo::SquaredEuclidean>(p.world());
                let distance = nn.distance.sqrt();
                (distance <= self.max_distance)
                    .then(|| PointMatch::new(PointId(nn.item as usize), PointId(i)))
            })
            .collect()
    }
}
