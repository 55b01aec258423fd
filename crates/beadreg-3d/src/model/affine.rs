use glam::{DMat3, DVec3};

use super::{check_num_matches, Model, ModelError};
use crate::{linalg, point::PointPair};

const SINGULAR_TOLERANCE: f64 = 1e-12;

/// A 3d affine transformation `x' = A * x + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineModel3D {
    linear: DMat3,
    translation: DVec3,
}

impl Default for AffineModel3D {
    fn default() -> Self {
        Self {
            linear: DMat3::IDENTITY,
            translation: DVec3::ZERO,
        }
    }
}

impl AffineModel3D {
    /// Create an affine model from a row-major 3x4 matrix `[A | t]`.
    pub fn new(matrix: [[f64; 4]; 3]) -> Self {
        let rows = matrix.map(|row| [row[0], row[1], row[2]]);
        Self {
            linear: DMat3::from_cols_array_2d(&rows).transpose(),
            translation: DVec3::new(matrix[0][3], matrix[1][3], matrix[2][3]),
        }
    }

    /// The transform as a row-major 3x4 matrix `[A | t]`.
    pub fn matrix(&self) -> [[f64; 4]; 3] {
        let mut out = [[0.0; 4]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            let r = self.linear.row(i);
            *row = [r.x, r.y, r.z, self.translation[i]];
        }
        out
    }
}

fn outer(a: DVec3, b: DVec3) -> DMat3 {
    DMat3::from_cols(a * b.x, a * b.y, a * b.z)
}

impl Model for AffineModel3D {
    fn min_num_matches(&self) -> usize {
        4
    }

    /// Weighted least squares fit on centred coordinates.
    ///
    /// With `P = Σ w p p^T` and `Q = Σ w q p^T` the linear part is `Q * P^-1`.
    fn fit(&mut self, pairs: &[PointPair]) -> Result<(), ModelError> {
        check_num_matches(self.min_num_matches(), pairs.len())?;

        let (src_centroid, dst_centroid, ws) = linalg::weighted_centroids(pairs);
        if ws <= 0.0 {
            return Err(ModelError::IllDefinedDataPoints(
                "sum of weights is not positive".to_string(),
            ));
        }

        let mut mat_p = DMat3::ZERO;
        let mut mat_q = DMat3::ZERO;
        for pair in pairs {
            let p = linalg::to_dvec3(&pair.source) - src_centroid;
            let q = linalg::to_dvec3(&pair.destination) - dst_centroid;
            mat_p += outer(p, p) * pair.weight;
            mat_q += outer(q, p) * pair.weight;
        }

        let trace = mat_p.x_axis.x + mat_p.y_axis.y + mat_p.z_axis.z;
        let det = mat_p.determinant();
        if trace <= 0.0 || det.abs() <= SINGULAR_TOLERANCE * (trace / 3.0).powi(3) {
            return Err(ModelError::IllDefinedDataPoints(
                "points are coplanar, collinear or coincident".to_string(),
            ));
        }

        let linear = mat_q * mat_p.inverse();
        self.translation = dst_centroid - linear * src_centroid;
        self.linear = linear;

        Ok(())
    }

    fn apply(&self, point: &[f64; 3]) -> [f64; 3] {
        (self.linear * linalg::to_dvec3(point) + self.translation).to_array()
    }
}
