//! # Transformation models
//!
//! A model maps local coordinates into the world frame and can be re-estimated
//! from a list of [`PointPair`]s.
//!
//! - [`TranslationModel3D`]: translation only (3 DOF)
//! - [`RigidModel3D`]: rotation and translation (6 DOF)
//! - [`AffineModel3D`]: general affine transform (12 DOF)

use crate::point::PointPair;

mod affine;
pub use affine::*;

mod rigid;
pub use rigid::*;

mod translation;
pub use translation::*;

/// Error types for model estimation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Fewer correspondences than the degrees of freedom of the model require.
    #[error("Model requires at least {required} point matches, got {actual}")]
    NotEnoughDataPoints {
        /// Minimum number of matches required by the model.
        required: usize,
        /// Number of matches provided.
        actual: usize,
    },

    /// The correspondences are numerically singular for the model.
    #[error("Ill-defined data points: {0}")]
    IllDefinedDataPoints(String),
}

/// A fittable transformation from local coordinates to world coordinates.
///
/// `fit` mutates the model in place. On error the model keeps its previous
/// transform.
pub trait Model {
    /// Minimum number of point matches required by [`Model::fit`].
    fn min_num_matches(&self) -> usize;

    /// Estimate the transform that maps every `pair.source` onto
    /// `pair.destination` in the weighted least squares sense.
    fn fit(&mut self, pairs: &[PointPair]) -> Result<(), ModelError>;

    /// Transform a single point.
    fn apply(&self, point: &[f64; 3]) -> [f64; 3];
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn min_num_matches(&self) -> usize {
        (**self).min_num_matches()
    }

    fn fit(&mut self, pairs: &[PointPair]) -> Result<(), ModelError> {
        (**self).fit(pairs)
    }

    fn apply(&self, point: &[f64; 3]) -> [f64; 3] {
        (**self).apply(point)
    }
}

/// Check that enough pairs were given to fit a model.
pub(crate) fn check_num_matches(required: usize, actual: usize) -> Result<(), ModelError> {
    if actual < required {
        return Err(ModelError::NotEnoughDataPoints { required, actual });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_utils {
    use crate::point::PointPair;

    pub fn pairs_from(src: &[[f64; 3]], f: impl Fn(&[f64; 3]) -> [f64; 3]) -> Vec<PointPair> {
        src.iter()
            .map(|p| PointPair {
                source: *p,
                destination: f(p),
                weight: 1.0,
            })
            .collect()
    }
}
