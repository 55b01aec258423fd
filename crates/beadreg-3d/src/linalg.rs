use glam::DVec3;

use crate::point::PointPair;

/// Convert a point from [f64; 3] to DVec3.
#[inline]
pub fn to_dvec3(point: &[f64; 3]) -> DVec3 {
    DVec3::from_array(*point)
}

/// Squared euclidean distance between two points.
#[inline]
pub fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    to_dvec3(a).distance_squared(to_dvec3(b))
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    to_dvec3(a).distance(to_dvec3(b))
}

/// Compute the component-wise arithmetic mean of a set of points.
///
/// Returns `None` if `points` is empty.
pub fn mean_point(points: &[[f64; 3]]) -> Option<[f64; 3]> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(DVec3::ZERO, |acc, p| acc + to_dvec3(p));
    Some((sum / points.len() as f64).to_array())
}

/// Compute the weighted centroids of two paired point sets.
///
/// Returns the centroids and the total weight. The caller is responsible for
/// checking that the total weight is strictly positive.
pub(crate) fn weighted_centroids(pairs: &[PointPair]) -> (DVec3, DVec3, f64) {
    let (mut src, mut dst, mut ws) = (DVec3::ZERO, DVec3::ZERO, 0.0);
    for pair in pairs {
        src += to_dvec3(&pair.source) * pair.weight;
        dst += to_dvec3(&pair.destination) * pair.weight;
        ws += pair.weight;
    }
    if ws > 0.0 {
        src /= ws;
        dst /= ws;
    }
    (src, dst, ws)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 6.0, 3.0];
        assert_relative_eq!(distance(&a, &b), 5.0, epsilon = 1e-12);
        assert_relative_eq!(squared_distance(&a, &b), 25.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mean_point() {
        let points = vec![[0.0, 0.0, 0.0], [2.0, 4.0, 6.0], [1.0, -1.0, 3.0]];
        let mean = mean_point(&points).unwrap();
        assert_relative_eq!(mean[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(mean[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(mean[2], 3.0, epsilon = 1e-12);
        assert!(mean_point(&[]).is_none());
    }
}
