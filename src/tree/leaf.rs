use std::collections::BTreeMap;
use std::ops::Bound;

use super::{ChunkId, PathCode, StepKind};
use crate::ir::{PartialDate, PersonId};

/// Addressable display node.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub code: PathCode,
    pub person_id: PersonId,
    pub degree: usize,
    pub chunk: ChunkId,
    /// Root id followed by the person visited after each step; ends with `person_id`.
    pub lineage: Vec<PersonId>,
    /// Other parent recorded for a leaf reached by a child step.
    pub co_parent_id: Option<PersonId>,
    pub father_id: Option<PersonId>,
    pub mother_id: Option<PersonId>,
    pub birth_date: Option<PartialDate>,
    /// Top-left corner of the footprint box, present once laid out.
    pub x: Option<f32>,
    pub y: Option<f32>,
}

impl Leaf {
    pub fn position(&self) -> Option<(f32, f32)> {
        Some((self.x?, self.y?))
    }

    pub fn full_code(&self) -> String {
        self.code.full_form(&self.lineage)
    }

    pub fn has_parents(&self, father: &PersonId, mother: &PersonId) -> bool {
        let pair = (self.father_id.as_ref(), self.mother_id.as_ref());
        pair == (Some(father), Some(mother)) || pair == (Some(mother), Some(father))
    }
}

#[derive(Debug, Clone, Default)]
pub struct LeafCollection {
    leaves: BTreeMap<PathCode, Leaf>,
}

impl LeafCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &PathCode) -> Option<&Leaf> {
        self.leaves.get(code)
    }

    pub fn get_mut(&mut self, code: &PathCode) -> Option<&mut Leaf> {
        self.leaves.get_mut(code)
    }

    pub fn contains(&self, code: &PathCode) -> bool {
        self.leaves.contains_key(code)
    }

    pub fn insert(&mut self, leaf: Leaf) {
        self.leaves.insert(leaf.code.clone(), leaf);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Leaf> {
        self.leaves.values()
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn clear(&mut self) {
        self.leaves.clear();
    }

    /// Every leaf strictly below `prefix`.
    pub fn descendants_of<'a>(&'a self, prefix: &PathCode) -> impl Iterator<Item = &'a Leaf> + use<'a> {
        let prefix = prefix.clone();
        self.leaves
            .range((Bound::Excluded(prefix.clone()), Bound::Unbounded))
            .take_while(move |(code, _)| code.starts_with(&prefix))
            .map(|(_, leaf)| leaf)
    }

    /// Leaves exactly one step of `kind` below `code`, in step order.
    pub fn extensions<'a>(
        &'a self,
        code: &PathCode,
        kind: StepKind,
    ) -> impl Iterator<Item = &'a Leaf> + use<'a> {
        let depth = code.degree() + 1;
        self.descendants_of(code).filter(move |leaf| {
            leaf.code.degree() == depth
                && leaf.code.last_step().map(|step| step.kind()) == Some(kind)
        })
    }

    pub fn clear_positions(&mut self) {
        for leaf in self.leaves.values_mut() {
            leaf.x = None;
            leaf.y = None;
        }
    }

    /// Moves `prefix` and every positioned leaf below it.
    pub fn translate_prefixed(&mut self, prefix: &PathCode, dx: f32, dy: f32) {
        let range = self
            .leaves
            .range_mut((Bound::Included(prefix.clone()), Bound::Unbounded))
            .take_while(|(code, _)| code.starts_with(prefix));
        for (_, leaf) in range {
            if let (Some(x), Some(y)) = (leaf.x, leaf.y) {
                leaf.x = Some(x + dx);
                leaf.y = Some(y + dy);
            }
        }
    }
}
