use serde::{Deserialize, Serialize};

use beadreg_3d::model::Model;

/// Identifier of a view (one angle or timepoint of the acquisition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(pub u32);

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "view {}", self.0)
    }
}

/// Reference to a bead of a given view.
///
/// Only used to look the bead up, it does not own it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeadIdentification {
    /// The view the bead was detected in.
    pub view_id: ViewId,
    /// The id of the bead inside its view.
    pub bead_id: usize,
}

impl BeadIdentification {
    /// Create a new bead reference.
    pub fn new(view_id: ViewId, bead_id: usize) -> Self {
        Self { view_id, bead_id }
    }
}

/// A bead detected in one view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bead {
    id: usize,
    local: [f64; 3],
    correspondences: Vec<BeadIdentification>,
}

impl Bead {
    /// Create a bead without correspondences.
    pub fn new(id: usize, local: [f64; 3]) -> Self {
        Self {
            id,
            local,
            correspondences: Vec::new(),
        }
    }

    /// The id of the bead inside its view.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The detected coordinate in the view's local frame.
    #[inline]
    pub fn local(&self) -> &[f64; 3] {
        &self.local
    }

    /// The vetted correspondences of this bead in other views.
    #[inline]
    pub fn correspondences(&self) -> &[BeadIdentification] {
        &self.correspondences
    }

    /// Record a correspondence with a bead of another view.
    pub fn add_correspondence(&mut self, other: BeadIdentification) {
        self.correspondences.push(other);
    }

    /// The bead coordinate after applying the view's model.
    pub fn world<M: Model + ?Sized>(&self, model: &M) -> [f64; 3] {
        model.apply(&self.local)
    }
}

/// All beads detected in one view, together with the view's registration model.
#[derive(Debug, Clone)]
pub struct ViewBeads<M> {
    id: ViewId,
    model: M,
    beads: Vec<Bead>,
}

impl<M: Model> ViewBeads<M> {
    /// Create a view without beads.
    pub fn new(id: ViewId, model: M) -> Self {
        Self {
            id,
            model,
            beads: Vec::new(),
        }
    }

    /// Add a bead at `local`, returning its reference. Ids are assigned in
    /// insertion order.
    pub fn add_bead(&mut self, local: [f64; 3]) -> BeadIdentification {
        let bead_id = self.beads.len();
        self.beads.push(Bead::new(bead_id, local));
        BeadIdentification::new(self.id, bead_id)
    }

    /// The view identifier.
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// The view's registration model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutable access to the view's registration model.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// The beads of this view.
    pub fn beads(&self) -> &[Bead] {
        &self.beads
    }

    /// Look a bead up by its id.
    pub fn bead(&self, bead_id: usize) -> Option<&Bead> {
        self.beads.iter().find(|b| b.id == bead_id)
    }

    /// Mutable access to a bead by its id.
    pub fn bead_mut(&mut self, bead_id: usize) -> Option<&mut Bead> {
        self.beads.iter_mut().find(|b| b.id == bead_id)
    }
}

/// Record a symmetric correspondence between two beads.
///
/// Returns `false` if either bead could not be found, in which case nothing is
/// recorded.
pub fn link_beads<M: Model>(
    views: &mut [ViewBeads<M>],
    a: BeadIdentification,
    b: BeadIdentification,
) -> bool {
    let found = |views: &[ViewBeads<M>], r: BeadIdentification| {
        views
            .iter()
            .any(|v| v.id == r.view_id && v.bead(r.bead_id).is_some())
    };
    if !found(&*views, a) || !found(&*views, b) {
        return false;
    }

    for (from, to) in [(a, b), (b, a)] {
        if let Some(bead) = views
            .iter_mut()
            .filter(|v| v.id == from.view_id)
            .find_map(|v| v.bead_mut(from.bead_id))
        {
            bead.add_correspondence(to);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use beadreg_3d::model::TranslationModel3D;

    #[test]
    fn test_view_beads() {
        let mut view = ViewBeads::new(ViewId(3), TranslationModel3D::new([1.0, 0.0, 0.0]));
        let r0 = view.add_bead([0.0, 0.0, 0.0]);
        let r1 = view.add_bead([1.0, 2.0, 3.0]);

        assert_eq!(r0, BeadIdentification::new(ViewId(3), 0));
        assert_eq!(r1, BeadIdentification::new(ViewId(3), 1));
        assert_eq!(view.beads().len(), 2);

        let bead = view.bead(1).unwrap();
        assert_eq!(bead.local(), &[1.0, 2.0, 3.0]);
        assert_eq!(bead.world(view.model()), [2.0, 2.0, 3.0]);
        assert!(view.bead(2).is_none());
    }

    #[test]
    fn test_link_beads() {
        let mut views = vec![
            ViewBeads::new(ViewId(0), TranslationModel3D::default()),
            ViewBeads::new(ViewId(1), TranslationModel3D::default()),
        ];
        let a = views[0].add_bead([0.0, 0.0, 0.0]);
        let b = views[1].add_bead([0.0, 0.0, 0.0]);

        assert!(link_beads(&mut views, a, b));
        assert_eq!(views[0].beads()[0].correspondences(), &[b]);
        assert_eq!(views[1].beads()[0].correspondences(), &[a]);

        let missing = BeadIdentification::new(ViewId(7), 0);
        assert!(!link_beads(&mut views, a, missing));
        assert_eq!(views[0].beads()[0].correspondences().len(), 1);
    }
}
