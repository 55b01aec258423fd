use glam::DVec3;

use super::{check_num_matches, Model, ModelError};
use crate::{linalg, point::PointPair};

/// A pure 3d translation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TranslationModel3D {
    translation: DVec3,
}

impl TranslationModel3D {
    /// Create a translation model.
    pub fn new(translation: [f64; 3]) -> Self {
        Self {
            translation: DVec3::from_array(translation),
        }
    }

    /// The translation vector.
    pub fn translation(&self) -> [f64; 3] {
        self.translation.to_array()
    }
}

impl Model for TranslationModel3D {
    fn min_num_matches(&self) -> usize {
        1
    }

    fn fit(&mut self, pairs: &[PointPair]) -> Result<(), ModelError> {
        check_num_matches(self.min_num_matches(), pairs.len())?;

        let (src_centroid, dst_centroid, ws) = linalg::weighted_centroids(pairs);
        if ws <= 0.0 {
            return Err(ModelError::IllDefinedDataPoints(
                "sum of weights is not positive".to_string(),
            ));
        }

        self.translation = dst_centroid - src_centroid;
        Ok(())
    }

    fn apply(&self, point: &[f64; 3]) -> [f64; 3] {
        (linalg::to_dvec3(point) + self.translation).to_array()
    }
}
