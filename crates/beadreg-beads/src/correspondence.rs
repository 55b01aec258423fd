use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use beadreg_3d::{linalg, model::Model, point::Point};

use crate::bead::{BeadIdentification, ViewBeads, ViewId};

/// A landmark obtained by averaging the world coordinates of a group of
/// mutually corresponding beads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedLandmark {
    /// Sequential id of the landmark inside the merged view.
    pub id: usize,
    /// The view the landmark belongs to.
    pub view_id: ViewId,
    /// Mean world coordinate of the members.
    pub position: [f64; 3],
    /// The beads the landmark was merged from, in traversal order.
    pub members: Vec<BeadIdentification>,
}

impl MergedLandmark {
    /// Convert the landmark to a point usable for registration.
    pub fn to_point(&self) -> Point {
        Point::new(self.position)
    }
}

/// Merge every connected group of corresponding beads into one averaged landmark.
///
/// The correspondence lists of all beads form an implicit graph. Each connected
/// component with at least two beads yields one [`MergedLandmark`] tagged with
/// `merged_view_id`; isolated beads yield nothing. A bead belongs to exactly
/// one component even if the correspondences are not symmetric.
///
/// Correspondences that refer to an unknown view or bead are skipped.
///
/// The traversal keeps its visited set to itself, so the views are not
/// modified and merging is repeatable.
pub fn merge_corresponding_beads<M: Model>(
    views: &[ViewBeads<M>],
    merged_view_id: ViewId,
) -> Vec<MergedLandmark> {
    // (view index, bead index) of every bead
    let mut lookup = HashMap::new();
    for (vi, view) in views.iter().enumerate() {
        for (bi, bead) in view.beads().iter().enumerate() {
            let key = BeadIdentification::new(view.id(), bead.id());
            if lookup.insert(key, (vi, bi)).is_some() {
                log::warn!("Duplicate bead {} in {}", bead.id(), view.id());
            }
        }
    }

    let mut visited = HashSet::with_capacity(lookup.len());
    let mut landmarks = Vec::new();

    for (vi, view) in views.iter().enumerate() {
        for (bi, bead) in view.beads().iter().enumerate() {
            if !visited.insert(BeadIdentification::new(view.id(), bead.id())) {
                continue;
            }

            let mut component = vec![(vi, bi)];
            let mut stack = vec![(vi, bi)];

            while let Some((v, b)) = stack.pop() {
                for other in views[v].beads()[b].correspondences() {
                    let Some(&(ov, ob)) = lookup.get(other) else {
                        log::warn!(
                            "Bead {} in {} refers to missing bead {} in {}",
                            views[v].beads()[b].id(),
                            views[v].id(),
                            other.bead_id,
                            other.view_id
                        );
                        continue;
                    };

                    if visited.insert(*other) {
                        component.push((ov, ob));
                        stack.push((ov, ob));
                    }
                }
            }

            if component.len() < 2 {
                continue;
            }

            let positions = component
                .iter()
                .map(|&(v, b)| views[v].beads()[b].world(views[v].model()))
                .collect::<Vec<_>>();
            let Some(position) = linalg::mean_point(&positions) else {
                continue;
            };

            let members = component
                .iter()
                .map(|&(v, b)| BeadIdentification::new(views[v].id(), views[v].beads()[b].id()))
                .collect::<Vec<_>>();

            log::trace!(
                "Merged {} beads into landmark {} at {:?}",
                members.len(),
                landmarks.len(),
                position
            );

            landmarks.push(MergedLandmark {
                id: landmarks.len(),
                view_id: merged_view_id,
                position,
                members,
            });
        }
    }

    log::debug!(
        "Merged {} beads of {} views into {} landmarks",
        lookup.len(),
        views.len(),
        landmarks.len()
    );

    landmarks
}
