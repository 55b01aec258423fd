use crate::{linalg, model::Model};

/// Handle of a point inside the set that owns it.
///
/// Two points are the same entity if and only if they have the same handle in
/// the same set. Coordinates never take part in the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(pub usize);

impl PointId {
    /// The index of the point in its owning set.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Error returned when a [`PointMatch`] refers to a point that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Point {id} is out of range for a set of {len} points")]
pub struct PointOutOfRange {
    /// The offending handle.
    pub id: PointId,
    /// Number of points in the set that was indexed.
    pub len: usize,
}

/// A detected point with its local coordinate and its world coordinate.
///
/// The world coordinate is the local coordinate after the last applied model.
/// A fresh point has its world coordinate equal to its local one.
///
/// `Point` does not implement `PartialEq`: points are entities,
/// refer to them through their [`PointId`].
#[derive(Debug, Clone)]
pub struct Point {
    local: [f64; 3],
    world: [f64; 3],
}

impl Point {
    /// Create a new point from its local coordinate.
    pub fn new(local: [f64; 3]) -> Self {
        Self {
            local,
            world: local,
        }
    }

    /// The coordinate as detected.
    #[inline]
    pub fn local(&self) -> &[f64; 3] {
        &self.local
    }

    /// The coordinate after the last applied model.
    #[inline]
    pub fn world(&self) -> &[f64; 3] {
        &self.world
    }

    /// Update the world coordinate by applying `model` to the local coordinate.
    #[inline]
    pub fn apply<M: Model + ?Sized>(&mut self, model: &M) {
        self.world = model.apply(&self.local);
    }

    /// Euclidean distance between the world coordinates of two points.
    #[inline]
    pub fn distance(&self, other: &Point) -> f64 {
        linalg::distance(&self.world, &other.world)
    }
}

/// Apply `model` to every point of the set.
pub fn apply_model<M: Model + ?Sized>(points: &mut [Point], model: &M) {
    for point in points.iter_mut() {
        point.apply(model);
    }
}

/// An ordered correspondence between a point of the source set and a point of
/// the destination set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMatch {
    source: PointId,
    destination: PointId,
    weight: f64,
}

impl PointMatch {
    /// Create a match with unit weight.
    pub fn new(source: PointId, destination: PointId) -> Self {
        Self::with_weight(source, destination, 1.0)
    }

    /// Create a weighted match.
    pub fn with_weight(source: PointId, destination: PointId, weight: f64) -> Self {
        Self {
            source,
            destination,
            weight,
        }
    }

    /// The handle of the source point.
    #[inline]
    pub fn source(&self) -> PointId {
        self.source
    }

    /// The handle of the destination point.
    #[inline]
    pub fn destination(&self) -> PointId {
        self.destination
    }

    /// The weight of the match.
    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Whether both matches connect the same two points.
    #[inline]
    pub fn same_pair(&self, other: &PointMatch) -> bool {
        self.source == other.source && self.destination == other.destination
    }

    /// Distance between the world coordinates of the matched points.
    pub fn distance(
        &self,
        sources: &[Point],
        destinations: &[Point],
    ) -> Result<f64, PointOutOfRange> {
        let (p1, p2) = self.resolve(sources, destinations)?;
        Ok(p1.distance(p2))
    }

    fn resolve<'a>(
        &self,
        sources: &'a [Point],
        destinations: &'a [Point],
    ) -> Result<(&'a Point, &'a Point), PointOutOfRange> {
        let p1 = sources.get(self.source.0).ok_or(PointOutOfRange {
            id: self.source,
            len: sources.len(),
        })?;
        let p2 = destinations.get(self.destination.0).ok_or(PointOutOfRange {
            id: self.destination,
            len: destinations.len(),
        })?;
        Ok((p1, p2))
    }
}

/// The coordinates a model is fitted to: the local coordinate of the source
/// point and the world coordinate of the destination point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPair {
    /// Local coordinate of the source point.
    pub source: [f64; 3],
    /// World coordinate of the destination point.
    pub destination: [f64; 3],
    /// Weight of the correspondence.
    pub weight: f64,
}

/// Resolve a list of matches into the coordinate pairs used for fitting.
pub fn point_pairs(
    matches: &[PointMatch],
    sources: &[Point],
    destinations: &[Point],
) -> Result<Vec<PointPair>, PointOutOfRange> {
    matches
        .iter()
        .map(|m| {
            let (p1, p2) = m.resolve(sources, destinations)?;
            Ok(PointPair {
                source: p1.local,
                destination: p2.world,
                weight: m.weight,
            })
        })
        .collect()
}

/// Distances between the world coordinates of all matched points.
pub fn match_distances(
    matches: &[PointMatch],
    sources: &[Point],
    destinations: &[Point],
) -> Result<Vec<f64>, PointOutOfRange> {
    matches
        .iter()
        .map(|m| m.distance(sources, destinations))
        .collect()
}

/// Mean distance over all matches, `0.0` for an empty list.
pub fn mean_distance(
    matches: &[PointMatch],
    sources: &[Point],
    destinations: &[Point],
) -> Result<f64, PointOutOfRange> {
    if matches.is_empty() {
        return Ok(0.0);
    }
    let sum = match_distances(matches, sources, destinations)?
        .iter()
        .sum::<f64>();
    Ok(sum / matches.len() as f64)
}

/// Maximum distance over all matches, `0.0` for an empty list.
pub fn max_distance(
    matches: &[PointMatch],
    sources: &[Point],
    destinations: &[Point],
) -> Result<f64, PointOutOfRange> {
    Ok(match_distances(matches, sources, destinations)?
        .into_iter()
        .fold(0.0, f64::max))
}
