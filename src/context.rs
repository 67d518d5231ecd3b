use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ir::PersonId;
use crate::tree::{ChunkCollection, ChunkId, Leaf, LeafCollection, PathCode};

/// Generation counters bound to the ancestor / descendant / cousin steppers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DepthSettings {
    pub ancestors: u8,
    pub descendants: u8,
    pub cousins: u8,
    pub in_laws: bool,
}

impl DepthSettings {
    pub fn clamped(self, max_generations: u8) -> Self {
        Self {
            ancestors: self.ancestors.min(max_generations),
            descendants: self.descendants.min(max_generations),
            cousins: self.cousins.min(max_generations),
            in_laws: self.in_laws,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LevelKind {
    Ancestors,
    Descendants,
    Cousins,
}

/// One generation band the data-loading side fetches as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Level {
    pub kind: LevelKind,
    pub generation: u8,
}

impl Level {
    pub fn new(kind: LevelKind, generation: u8) -> Self {
        Self { kind, generation }
    }
}

/// Everything derived from one root-person load.
///
/// Built fresh per root and passed explicitly to the builder, the layout
/// engine and the connector router.
#[derive(Debug, Clone)]
pub struct LayoutContext {
    root: PersonId,
    pub settings: DepthSettings,
    pub leaves: LeafCollection,
    pub chunks: ChunkCollection,
    loaded: BTreeSet<Level>,
}

impl LayoutContext {
    pub fn new(root: PersonId) -> Self {
        Self {
            root,
            settings: DepthSettings::default(),
            leaves: LeafCollection::new(),
            chunks: ChunkCollection::new(),
            loaded: BTreeSet::new(),
        }
    }

    pub fn with_settings(root: PersonId, settings: DepthSettings) -> Self {
        let mut ctx = Self::new(root);
        ctx.settings = settings;
        ctx
    }

    pub fn root(&self) -> &PersonId {
        &self.root
    }

    /// Discards every leaf, chunk and loaded level for a new root.
    pub fn reset_root(&mut self, root: PersonId) {
        self.root = root;
        self.leaves.clear();
        self.chunks.clear();
        self.loaded.clear();
    }

    pub fn is_chunk_visible(&self, chunk: &ChunkId) -> bool {
        chunk.is_visible(&self.settings)
    }

    /// A leaf is shown when its chunk is, and the ancestor generation its
    /// branch hangs from is still requested.
    pub fn is_visible(&self, leaf: &Leaf) -> bool {
        self.is_chunk_visible(&leaf.chunk)
            && leaf.code.ancestor_generation() <= usize::from(self.settings.ancestors)
    }

    pub fn is_leaf_visible(&self, code: &PathCode) -> bool {
        self.leaves
            .get(code)
            .is_some_and(|leaf| self.is_visible(leaf))
    }

    pub fn visible_leaves(&self) -> impl Iterator<Item = &Leaf> {
        self.leaves.iter().filter(|leaf| self.is_visible(leaf))
    }

    pub fn is_generation_loaded(&self, level: Level) -> bool {
        self.loaded.contains(&level)
    }

    pub fn mark_generation_loaded(&mut self, level: Level) {
        self.loaded.insert(level);
    }

    /// Levels the current settings ask for that the data side has not
    /// reported as loaded, nearest generation first.
    pub fn pending_levels(&self) -> Vec<Level> {
        let mut pending = Vec::new();
        let requested = [
            (LevelKind::Ancestors, self.settings.ancestors),
            (LevelKind::Descendants, self.settings.descendants),
            (LevelKind::Cousins, self.settings.cousins),
        ];
        for (kind, depth) in requested {
            for generation in 1..=depth {
                let level = Level::new(kind, generation);
                if !self.loaded.contains(&level) {
                    pending.push(level);
                }
            }
        }
        pending.sort_by_key(|level| (level.generation, level.kind));
        pending
    }
}
