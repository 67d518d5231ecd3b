use std::collections::HashSet;

use tracing::{debug, trace};

use super::order::{child_order, partner_order, sibling_order};
use super::{ChunkId, ChunkPolicy, Leaf, ParentSide, PathCode, Step};
use crate::config::LayoutConfig;
use crate::context::{DepthSettings, LayoutContext};
use crate::ir::{Person, PersonGraph, PersonId};

pub type IdSet = HashSet<PersonId>;

/// Hard stop for any path, independent of the generation counters.
pub const MAX_PATH_DEGREE: usize = 24;
/// Partner indices are written with a single digit.
const MAX_PARTNERS: usize = 9;
/// Child and sibling indices are written with two digits.
const MAX_LISTED: usize = 99;

/// How a leaf was reached, which decides what it may expand into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    Root,
    /// Direct ancestor `n` generations up.
    Ancestor(u8),
    /// Extra partner of a generation-`n` ancestor.
    AncestorPartner(u8),
    /// Reached by a sibling or child step.
    Relative,
    /// Partner of the root or of a relative.
    Partner,
    /// Parent of a partner.
    InLaw,
}

#[derive(Debug, Clone)]
pub struct LeafDescriptor {
    pub code: PathCode,
    pub person_id: PersonId,
    pub chunk: ChunkId,
    /// Ids visited from the root, ending with `person_id`.
    pub lineage: Vec<PersonId>,
    pub co_parent_id: Option<PersonId>,
    pub reach: Reach,
}

impl LeafDescriptor {
    pub fn root(person_id: PersonId) -> Self {
        Self {
            code: PathCode::root(),
            lineage: vec![person_id.clone()],
            person_id,
            chunk: ChunkId::Root,
            co_parent_id: None,
            reach: Reach::Root,
        }
    }

    fn extend(&self, step: Step, person_id: &PersonId, chunk: ChunkId, reach: Reach) -> Self {
        let mut lineage = self.lineage.clone();
        lineage.push(person_id.clone());
        Self {
            code: self.code.child(step),
            person_id: person_id.clone(),
            chunk,
            lineage,
            co_parent_id: None,
            reach,
        }
    }

    fn on_path(&self, id: &PersonId) -> bool {
        self.lineage.contains(id)
    }
}

/// Unrolls the person graph into path-coded leaves grouped into chunks.
pub struct PathCodeGraphBuilder<'a> {
    graph: &'a PersonGraph,
    ctx: &'a mut LayoutContext,
    settings: DepthSettings,
    policy: ChunkPolicy,
}

impl<'a> PathCodeGraphBuilder<'a> {
    pub fn new(graph: &'a PersonGraph, ctx: &'a mut LayoutContext, config: &LayoutConfig) -> Self {
        let settings = ctx.settings.clamped(config.max_generations);
        Self {
            graph,
            ctx,
            settings,
            policy: config.chunk_policy,
        }
    }

    /// Walks from the root with the context's current depth settings and
    /// returns how many leaves were added.
    pub fn expand(&mut self) -> usize {
        let before = self.ctx.leaves.len();
        let root = self.ctx.root().clone();
        if !self.graph.contains(&root) {
            debug!(root = %root, "root person is not loaded");
            return 0;
        }
        self.add_leaf(LeafDescriptor::root(root), &IdSet::new());
        let added = self.ctx.leaves.len() - before;
        debug!(
            added,
            total = self.ctx.leaves.len(),
            chunks = self.ctx.chunks.len(),
            "expanded path-code graph"
        );
        added
    }

    /// Registers `leaf` (or re-buckets it if its chunk changed) and expands
    /// its relatives. Calling it again with the same descriptor leaves the
    /// collections untouched.
    pub fn add_leaf(&mut self, leaf: LeafDescriptor, exclude: &IdSet) {
        if leaf.code.degree() > MAX_PATH_DEGREE {
            trace!(code = %leaf.code, "path degree limit reached");
            return;
        }
        let visited = &leaf.lineage[..leaf.lineage.len().saturating_sub(1)];
        if visited.contains(&leaf.person_id) {
            trace!(code = %leaf.code, person = %leaf.person_id, "cycle guard");
            return;
        }
        let graph = self.graph;
        let Some(person) = graph.get(&leaf.person_id) else {
            trace!(code = %leaf.code, person = %leaf.person_id, "person record missing");
            return;
        };

        match self.ctx.leaves.get_mut(&leaf.code) {
            Some(existing) => {
                if existing.chunk != leaf.chunk {
                    let old = std::mem::replace(&mut existing.chunk, leaf.chunk.clone());
                    self.ctx.chunks.remove_code(&old, &leaf.code);
                    self.ctx.chunks.append(&leaf.chunk, &leaf.code);
                }
            }
            None => {
                self.ctx.chunks.append(&leaf.chunk, &leaf.code);
                self.ctx.leaves.insert(Leaf {
                    code: leaf.code.clone(),
                    person_id: leaf.person_id.clone(),
                    degree: leaf.code.degree(),
                    chunk: leaf.chunk.clone(),
                    lineage: leaf.lineage.clone(),
                    co_parent_id: leaf.co_parent_id.clone(),
                    father_id: person.father.clone(),
                    mother_id: person.mother.clone(),
                    birth_date: person.birth_date,
                    x: None,
                    y: None,
                });
            }
        }

        self.expand_relatives(&leaf, person, exclude);
    }

    fn expand_relatives(&mut self, leaf: &LeafDescriptor, person: &Person, exclude: &IdSet) {
        match leaf.reach {
            Reach::Root => {
                self.expand_parents(leaf, person, ChunkId::Ancestors(1), Some(1));
                self.expand_family(leaf, person, ChunkId::Descendants(1), exclude);
                self.expand_siblings(leaf, person, ChunkId::Siblings);
            }
            Reach::Ancestor(generation) => {
                let up = generation.saturating_add(1);
                self.expand_parents(leaf, person, ChunkId::Ancestors(up), Some(up));
                let chunk = self.policy.ancestor_partner_chunk(generation);
                self.expand_ancestor_partners(leaf, person, chunk, generation, exclude);
                self.expand_siblings(
                    leaf,
                    person,
                    ChunkId::AncestorCousins {
                        generation,
                        depth: 0,
                    },
                );
            }
            Reach::Relative => {
                if let Some(next) = leaf.chunk.next_band() {
                    self.expand_family(leaf, person, next, exclude);
                }
            }
            Reach::Partner | Reach::AncestorPartner(_) => {
                self.expand_parents(leaf, person, leaf.chunk.in_laws(), None);
            }
            Reach::InLaw => {}
        }
    }

    /// Father then mother. `generation` is `Some` for the direct line and
    /// `None` for in-laws.
    fn expand_parents(
        &mut self,
        leaf: &LeafDescriptor,
        person: &Person,
        chunk: ChunkId,
        generation: Option<u8>,
    ) {
        if !chunk.is_visible(&self.settings) {
            return;
        }
        let reach = generation.map(Reach::Ancestor).unwrap_or(Reach::InLaw);
        let (father, mother) = person.parents();
        let parents = [
            (ParentSide::Father, father, mother),
            (ParentSide::Mother, mother, father),
        ];
        for (side, parent, other) in parents {
            let Some(parent) = parent else {
                continue;
            };
            if leaf.on_path(parent) {
                continue;
            }
            // The other parent is shown as its own ancestor, not as a partner.
            let exclude: IdSet = other.into_iter().cloned().collect();
            let next = leaf.extend(Step::Parent(side), parent, chunk.clone(), reach);
            self.add_leaf(next, &exclude);
        }
    }

    /// Partners and children of a root / relative leaf, all into `chunk`.
    fn expand_family(
        &mut self,
        leaf: &LeafDescriptor,
        person: &Person,
        chunk: ChunkId,
        exclude: &IdSet,
    ) {
        if !chunk.is_visible(&self.settings) {
            return;
        }
        let partners = partner_order(person, self.graph);
        let own_family = family_exclusion(person);

        let mut index = 0usize;
        for spouse in &partners {
            if exclude.contains(&spouse.id) || leaf.on_path(&spouse.id) {
                continue;
            }
            if index == MAX_PARTNERS {
                trace!(code = %leaf.code, "partner limit reached");
                break;
            }
            index += 1;
            let next = leaf.extend(
                Step::Partner(index as u8),
                &spouse.id,
                chunk.clone(),
                Reach::Partner,
            );
            self.add_leaf(next, &own_family);
        }

        let children = child_order(person, &partners, self.graph);
        for (pos, child) in children.iter().enumerate().take(MAX_LISTED) {
            if exclude.contains(&child.id) || leaf.on_path(&child.id) {
                continue;
            }
            // Shared children are reached through the other parent's branch.
            if child
                .co_parent_id
                .as_ref()
                .is_some_and(|co_parent| leaf.on_path(co_parent))
            {
                continue;
            }
            let mut next = leaf.extend(
                Step::Child(pos as u16 + 1),
                &child.id,
                chunk.clone(),
                Reach::Relative,
            );
            next.co_parent_id = child.co_parent_id.clone();
            self.add_leaf(next, &own_family);
        }
    }

    fn expand_ancestor_partners(
        &mut self,
        leaf: &LeafDescriptor,
        person: &Person,
        chunk: ChunkId,
        generation: u8,
        exclude: &IdSet,
    ) {
        if !chunk.is_visible(&self.settings) {
            return;
        }
        let own_family = family_exclusion(person);
        let mut index = 0usize;
        for spouse in partner_order(person, self.graph) {
            if exclude.contains(&spouse.id) || leaf.on_path(&spouse.id) {
                continue;
            }
            if index == MAX_PARTNERS {
                break;
            }
            index += 1;
            let next = leaf.extend(
                Step::Partner(index as u8),
                &spouse.id,
                chunk.clone(),
                Reach::AncestorPartner(generation),
            );
            self.add_leaf(next, &own_family);
        }
    }

    fn expand_siblings(&mut self, leaf: &LeafDescriptor, person: &Person, chunk: ChunkId) {
        if !chunk.is_visible(&self.settings) {
            return;
        }
        let anchor: IdSet = std::iter::once(person.id.clone()).collect();
        for (pos, sibling) in sibling_order(person, self.graph)
            .into_iter()
            .enumerate()
            .take(MAX_LISTED)
        {
            if leaf.on_path(&sibling.id) {
                continue;
            }
            let next = leaf.extend(
                Step::Sibling(pos as u16 + 1),
                &sibling.id,
                chunk.clone(),
                Reach::Relative,
            );
            self.add_leaf(next, &anchor);
        }
    }
}

/// The person and their children: never valid partners or step-children
/// of someone reached from them.
fn family_exclusion(person: &Person) -> IdSet {
    std::iter::once(person.id.clone())
        .chain(person.children.iter().map(|child| child.id.clone()))
        .collect()
}

/// Expands `ctx` against `graph` with its current settings.
pub fn build_leaves(graph: &PersonGraph, ctx: &mut LayoutContext, config: &LayoutConfig) -> usize {
    PathCodeGraphBuilder::new(graph, ctx, config).expand()
}
