use beadreg_3d::{
    model::Model,
    point::{self, Point, PointMatch},
};

use crate::{
    ambiguity::remove_ambiguous_matches,
    error::IcpError,
    identification::{NearestNeighborIdentification, PointMatchIdentification},
};

/// Residual statistics over the surviving matches of the last call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IcpStatistics {
    /// Mean distance between matched points after the fit.
    pub average_error: f64,
    /// Maximum distance between matched points after the fit.
    pub max_error: f64,
    /// Number of matches that survived ambiguity resolution.
    pub num_matches: usize,
}

/// Iterative Closest Point engine aligning a target point set to a reference.
///
/// The engine owns both point sets. Every call applies a model to the target
/// points, updating their world coordinates, while the reference points are
/// left untouched. Matches produced by the engine have the target point as
/// source and the reference point as destination.
///
/// There is no internal stopping criterion: the caller decides how often
/// [`Icp::run_iteration`] is invoked, see [`crate::refine`] for a ready made
/// policy.
pub struct Icp<I = NearestNeighborIdentification> {
    target: Vec<Point>,
    reference: Vec<Point>,
    identification: I,
    point_matches: Vec<PointMatch>,
    ambiguous_matches: Vec<PointMatch>,
    statistics: Option<IcpStatistics>,
}

impl Icp<NearestNeighborIdentification> {
    /// Create an engine that matches nearest neighbors without a distance threshold.
    pub fn new(target: Vec<Point>, reference: Vec<Point>) -> Self {
        Self::with_identification(target, reference, NearestNeighborIdentification::new())
    }
}

impl<I: PointMatchIdentification> Icp<I> {
    /// Create an engine with a custom correspondence strategy.
    pub fn with_identification(target: Vec<Point>, reference: Vec<Point>, identification: I) -> Self {
        Self {
            target,
            reference,
            identification,
            point_matches: Vec::new(),
            ambiguous_matches: Vec::new(),
            statistics: None,
        }
    }

    /// Estimate a first model from externally supplied matches.
    ///
    /// Ambiguous matches are removed from `matches` in place, `model` is
    /// fitted to the remaining ones and applied to the target points.
    ///
    /// On error the target points keep their world coordinates; `matches`
    /// has already been cleaned.
    pub fn estimate_initial_model<M: Model + ?Sized>(
        &mut self,
        matches: &mut Vec<PointMatch>,
        model: &mut M,
    ) -> Result<IcpStatistics, IcpError> {
        self.ambiguous_matches = remove_ambiguous_matches(matches);

        let pairs = point::point_pairs(matches, &self.target, &self.reference)?;
        model.fit(&pairs)?;
        point::apply_model(&mut self.target, &*model);

        self.point_matches = matches.clone();
        self.update_statistics()
    }

    /// Run one ICP iteration.
    ///
    /// `last_model` brings the target into the reference frame for matching,
    /// `new_model` is fitted to the de-ambiguated matches and applied again to
    /// compute the post-fit residuals.
    ///
    /// On error the target points hold the world coordinates given by
    /// `last_model`.
    pub fn run_iteration<L, M>(
        &mut self,
        last_model: &L,
        new_model: &mut M,
    ) -> Result<IcpStatistics, IcpError>
    where
        L: Model + ?Sized,
        M: Model + ?Sized,
    {
        point::apply_model(&mut self.target, last_model);
        self.match_and_fit(new_model)
    }

    /// Run one ICP iteration using the same model for matching and fitting.
    ///
    /// Equivalent to `run_iteration(model, model)`: the model is applied
    /// before matching, re-fitted, then applied again with its new transform.
    pub fn run_iteration_in_place<M: Model + ?Sized>(
        &mut self,
        model: &mut M,
    ) -> Result<IcpStatistics, IcpError> {
        point::apply_model(&mut self.target, &*model);
        self.match_and_fit(model)
    }

    fn match_and_fit<M: Model + ?Sized>(&mut self, model: &mut M) -> Result<IcpStatistics, IcpError> {
        let mut matches = self
            .identification
            .find_correspondences(&self.target, &self.reference);
        if matches.is_empty() {
            return Err(IcpError::NoSuitableCandidates);
        }

        self.ambiguous_matches = remove_ambiguous_matches(&mut matches);

        let pairs = point::point_pairs(&matches, &self.target, &self.reference)?;
        model.fit(&pairs)?;
        point::apply_model(&mut self.target, &*model);

        self.point_matches = matches;
        self.update_statistics()
    }

    fn update_statistics(&mut self) -> Result<IcpStatistics, IcpError> {
        let (matches, target, reference) = (&self.point_matches, &self.target, &self.reference);
        let statistics = IcpStatistics {
            average_error: point::mean_distance(matches, target, reference)?,
            max_error: point::max_distance(matches, target, reference)?,
            num_matches: matches.len(),
        };

        log::debug!(
            "Num matches: {} ({} ambiguous removed), error avg: {:.6} max: {:.6}",
            statistics.num_matches,
            self.ambiguous_matches.len(),
            statistics.average_error,
            statistics.max_error
        );

        self.statistics = Some(statistics);
        Ok(statistics)
    }

    /// The target point set.
    pub fn target(&self) -> &[Point] {
        &self.target
    }

    /// The reference point set.
    pub fn reference(&self) -> &[Point] {
        &self.reference
    }

    /// The correspondence strategy.
    pub fn identification(&self) -> &I {
        &self.identification
    }

    /// The matches that survived ambiguity resolution in the last successful call.
    pub fn point_matches(&self) -> &[PointMatch] {
        &self.point_matches
    }

    /// The matches removed as ambiguous in the last call.
    pub fn ambiguous_matches(&self) -> &[PointMatch] {
        &self.ambiguous_matches
    }

    /// Statistics of the last successful call, `None` before the first one.
    pub fn statistics(&self) -> Option<&IcpStatistics> {
        self.statistics.as_ref()
    }

    /// Mean residual of the last successful call, `-1.0` before the first one.
    pub fn average_error(&self) -> f64 {
        self.statistics.map_or(-1.0, |s| s.average_error)
    }

    /// Maximum residual of the last successful call, `-1.0` before the first one.
    pub fn max_error(&self) -> f64 {
        self.statistics.map_or(-1.0, |s| s.max_error)
    }

    /// Number of surviving matches of the last successful call.
    pub fn num_point_matches(&self) -> usize {
        self.statistics.map_or(0, |s| s.num_matches)
    }

    /// Consume the engine and return the target and reference point sets.
    pub fn into_parts(self) -> (Vec<Point>, Vec<Point>) {
        (self.target, self.reference)
    }
}
