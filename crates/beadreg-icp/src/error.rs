use beadreg_3d::{model::ModelError, point::PointOutOfRange};

/// Error types for the ICP engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IcpError {
    /// The model could not be fitted to the surviving matches.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// No correspondence was found within the distance threshold.
    #[error("No suitable correspondence candidates found")]
    NoSuitableCandidates,

    /// A match refers to a point that is not part of the point sets.
    #[error(transparent)]
    PointOutOfRange(#[from] PointOutOfRange),
}
