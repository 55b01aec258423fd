use glam::{DMat3, DVec3};

use super::{check_num_matches, Model, ModelError};
use crate::{linalg, point::PointPair};

// relative size of the second singular value below which the cross-covariance
// is considered rank deficient (collinear or coincident points)
const RANK_TOLERANCE: f64 = 1e-10;

/// A 3d rigid transformation: rotation followed by translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidModel3D {
    rotation: DMat3,
    translation: DVec3,
}

impl Default for RigidModel3D {
    fn default() -> Self {
        Self {
            rotation: DMat3::IDENTITY,
            translation: DVec3::ZERO,
        }
    }
}

impl RigidModel3D {
    /// Create a rigid model from a row-major rotation matrix and a translation.
    pub fn new(rotation: [[f64; 3]; 3], translation: [f64; 3]) -> Self {
        Self {
            rotation: DMat3::from_cols_array_2d(&rotation).transpose(),
            translation: DVec3::from_array(translation),
        }
    }

    /// The rotation matrix in row-major order.
    pub fn rotation(&self) -> [[f64; 3]; 3] {
        [
            self.rotation.row(0).to_array(),
            self.rotation.row(1).to_array(),
            self.rotation.row(2).to_array(),
        ]
    }

    /// The translation vector.
    pub fn translation(&self) -> [f64; 3] {
        self.translation.to_array()
    }
}

fn to_dmat3(m: faer::MatRef<'_, f64>) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(m.read(0, 0), m.read(1, 0), m.read(2, 0)),
        DVec3::new(m.read(0, 1), m.read(1, 1), m.read(2, 1)),
        DVec3::new(m.read(0, 2), m.read(1, 2), m.read(2, 2)),
    )
}

impl Model for RigidModel3D {
    fn min_num_matches(&self) -> usize {
        3
    }

    /// Weighted Kabsch fit.
    ///
    /// For more details, see: Arun, K., Huang, T. S., and Blostein, S. D.
    /// "Least-squares fitting of two 3-D point sets." IEEE PAMI, 1987.
    fn fit(&mut self, pairs: &[PointPair]) -> Result<(), ModelError> {
        check_num_matches(self.min_num_matches(), pairs.len())?;

        let (src_centroid, dst_centroid, ws) = linalg::weighted_centroids(pairs);
        if ws <= 0.0 {
            return Err(ModelError::IllDefinedDataPoints(
                "sum of weights is not positive".to_string(),
            ));
        }

        // cross-covariance matrix H = Σ w * (src - src_mean) * (dst - dst_mean)^T
        let mut h = [[0.0f64; 3]; 3];
        for pair in pairs {
            let src_centered = linalg::to_dvec3(&pair.source) - src_centroid;
            let dst_centered = linalg::to_dvec3(&pair.destination) - dst_centroid;
            for (r, row) in h.iter_mut().enumerate() {
                for (c, val) in row.iter_mut().enumerate() {
                    *val += pair.weight * src_centered[r] * dst_centered[c];
                }
            }
        }

        let mat_h = faer::Mat::<f64>::from_fn(3, 3, |i, j| h[i][j]);
        let svd = mat_h.svd();
        let s = svd.s_diagonal();

        if s.read(1) <= RANK_TOLERANCE * s.read(0) {
            return Err(ModelError::IllDefinedDataPoints(
                "points are collinear or coincident".to_string(),
            ));
        }

        let u = to_dmat3(svd.u());
        let v = to_dmat3(svd.v());

        // R = V * U^T, flip the axis of the smallest singular value on reflections
        let mut r = v * u.transpose();
        if r.determinant() < 0.0 {
            let v_corrected = DMat3::from_cols(v.x_axis, v.y_axis, -v.z_axis);
            r = v_corrected * u.transpose();
        }

        self.rotation = r;
        self.translation = dst_centroid - r * src_centroid;

        Ok(())
    }

    fn apply(&self, point: &[f64; 3]) -> [f64; 3] {
        (self.rotation * linalg::to_dvec3(point) + self.translation).to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_utils::pairs_from;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn assert_model_eq(model: &RigidModel3D, rotation: &DMat3, translation: &DVec3) {
        let r = model.rotation();
        for (i, row) in r.iter().enumerate() {
            for (j, val) in row.iter().enumerate() {
                assert_relative_eq!(*val, rotation.row(i)[j], epsilon = 1e-9);
            }
        }
        let t = model.translation();
        for i in 0..3 {
            assert_relative_eq!(t[i], translation[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rigid_identity() -> Result<(), ModelError> {
        let src = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let pairs = pairs_from(&src, |p| *p);

        let mut model = RigidModel3D::new([[0.0; 3]; 3], [1.0, 1.0, 1.0]);
        model.fit(&pairs)?;
        assert_model_eq(&model, &DMat3::IDENTITY, &DVec3::ZERO);
        Ok(())
    }

    #[test]
    fn test_rigid_combined_transform() -> Result<(), ModelError> {
        // 90° rotation around Z + translation (5, 3, 2)
        let rotation = DMat3::from_rotation_z(std::f64::consts::FRAC_PI_2);
        let translation = DVec3::new(5.0, 3.0, 2.0);
        let src = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let pairs = pairs_from(&src, |p| (rotation * DVec3::from_array(*p) + translation).to_array());

        let mut model = RigidModel3D::default();
        model.fit(&pairs)?;
        assert_model_eq(&model, &rotation, &translation);

        let q = model.apply(&[1.0, 0.0, 0.0]);
        assert_relative_eq!(q[0], 5.0, epsilon = 1e-9);
        assert_relative_eq!(q[1], 4.0, epsilon = 1e-9);
        assert_relative_eq!(q[2], 2.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_rigid_random_transform() -> Result<(), ModelError> {
        let mut rng = StdRng::seed_from_u64(42);
        let src = (0..50)
            .map(|_| {
                [
                    rng.random_range(-10.0..10.0),
                    rng.random_range(-10.0..10.0),
                    rng.random_range(-10.0..10.0),
                ]
            })
            .collect::<Vec<[f64; 3]>>();

        let axis = DVec3::new(0.3, -0.5, 0.8).normalize();
        let rotation = DMat3::from_axis_angle(axis, 0.7);
        let translation = DVec3::new(-1.5, 0.25, 12.0);
        let pairs = pairs_from(&src, |p| (rotation * DVec3::from_array(*p) + translation).to_array());

        let mut model = RigidModel3D::default();
        model.fit(&pairs)?;
        assert_model_eq(&model, &rotation, &translation);
        Ok(())
    }

    #[test]
    fn test_rigid_planar_points() -> Result<(), ModelError> {
        let rotation = DMat3::from_rotation_x(0.3);
        let translation = DVec3::new(0.0, 1.0, 0.0);
        let src = [
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 3.0, 0.0],
            [1.0, 1.0, 0.0],
        ];
        let pairs = pairs_from(&src, |p| (rotation * DVec3::from_array(*p) + translation).to_array());

        let mut model = RigidModel3D::default();
        model.fit(&pairs)?;
        assert_model_eq(&model, &rotation, &translation);
        Ok(())
    }

    #[test]
    fn test_rigid_collinear_points() {
        let src = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        let pairs = pairs_from(&src, |p| [p[0], p[1] + 1.0, p[2]]);

        let mut model = RigidModel3D::default();
        let err = model.fit(&pairs).unwrap_err();
        assert!(matches!(err, ModelError::IllDefinedDataPoints(_)));
        assert_eq!(model, RigidModel3D::default());
    }

    #[test]
    fn test_rigid_not_enough_data() {
        let pairs = pairs_from(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]], |p| *p);
        let mut model = RigidModel3D::default();
        let err = model.fit(&pairs).unwrap_err();
        assert_eq!(
            err,
            ModelError::NotEnoughDataPoints {
                required: 3,
                actual: 2
            }
        );
    }
}
