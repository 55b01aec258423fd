use std::collections::VecDeque;

use beadreg_3d::model::Model;
use serde::{Deserialize, Serialize};

use crate::{
    error::IcpError,
    icp::{Icp, IcpStatistics},
    identification::PointMatchIdentification,
};

/// Absolute slope of the error curve below which it is considered flat.
pub const PLATEAU_SLOPE: f64 = 1e-4;

/// Bounded history of error values.
#[derive(Debug, Clone)]
pub struct ErrorStatistic {
    capacity: usize,
    values: VecDeque<f64>,
}

impl ErrorStatistic {
    /// Create a history keeping the last `capacity` values (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a value, dropping the oldest one when full.
    pub fn add(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Number of values kept.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value was added yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The most recent value.
    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Mean of the kept values.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Median of the kept values.
    pub fn median(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let mut sorted = self.values.iter().copied().collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }

    /// Smallest kept value.
    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    /// Largest kept value.
    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Average slope between the last value and the value `width` steps earlier.
    ///
    /// Returns `None` if `width` is zero or not enough values are kept.
    pub fn wide_slope(&self, width: usize) -> Option<f64> {
        if width == 0 || width >= self.values.len() {
            return None;
        }
        let last = self.values.len() - 1;
        Some((self.values[last] - self.values[last - width]) / width as f64)
    }
}

/// Stopping policy for [`refine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IcpConvergenceCriteria {
    /// Maximum number of iterations to perform.
    pub max_iterations: usize,
    /// Number of iterations over which the error curve must be flat.
    pub max_plateau_width: usize,
    /// Do not accept convergence while the mean error is above this value.
    pub max_allowed_error: f64,
}

impl Default for IcpConvergenceCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_plateau_width: 10,
            max_allowed_error: f64::MAX,
        }
    }
}

/// Outcome of [`refine`].
#[derive(Debug, Clone, PartialEq)]
pub struct IcpRefinement {
    /// The total number of iterations performed.
    pub num_iterations: usize,
    /// Statistics of the last iteration, `None` if no iteration ran.
    pub statistics: Option<IcpStatistics>,
}

/// Repeatedly run [`Icp::run_iteration_in_place`] until the error plateaus.
///
/// Convergence is reached once more than `max_plateau_width` iterations ran,
/// the mean error is not above `max_allowed_error` and the absolute slope of
/// the error curve over `max_plateau_width` iterations, and over each
/// successive halving of that width, is at most [`PLATEAU_SLOPE`]. The loop
/// always stops after `max_iterations`.
///
/// Errors of the engine are propagated as is; no retry is attempted.
pub fn refine<I, M>(
    icp: &mut Icp<I>,
    model: &mut M,
    criteria: &IcpConvergenceCriteria,
) -> Result<IcpRefinement, IcpError>
where
    I: PointMatchIdentification,
    M: Model + ?Sized,
{
    let mut observer = ErrorStatistic::new(criteria.max_plateau_width + 1);
    let mut statistics = None;

    let mut i = 0;
    let mut proceed = i < criteria.max_iterations;

    while proceed {
        let stats = icp.run_iteration_in_place(model)?;
        observer.add(stats.average_error);
        statistics = Some(stats);

        if i > criteria.max_plateau_width {
            proceed = stats.average_error > criteria.max_allowed_error;

            let mut width = criteria.max_plateau_width;
            while !proceed && width >= 1 {
                if let Some(slope) = observer.wide_slope(width) {
                    proceed |= slope.abs() > PLATEAU_SLOPE;
                }
                width /= 2;
            }
        }

        i += 1;
        proceed &= i < criteria.max_iterations;
    }

    log::debug!("ICP stopped after {} iterations: {:?}", i, statistics);

    Ok(IcpRefinement {
        num_iterations: i,
        statistics,
    })
}
