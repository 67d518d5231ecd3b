use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use super::PathCode;
use crate::context::DepthSettings;

/// Visibility group. Members are shown or hidden together when a depth
/// counter changes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChunkId {
    /// `A0`
    Root,
    /// `A{g}`: direct ancestors `g` generations up.
    Ancestors(u8),
    /// `A{g}C{m}`: siblings of generation-`g` ancestors (`m = 0`) and the
    /// families `m` generations below them.
    AncestorCousins { generation: u8, depth: u8 },
    /// `S0`: the root's siblings.
    Siblings,
    /// `S0D{m}`
    SiblingDescendants(u8),
    /// `D{m}`: the root's partners and descendants.
    Descendants(u8),
    /// `{inner}IL`: parents of the partners in `inner`.
    InLaws(Box<ChunkId>),
}

impl ChunkId {
    pub fn in_laws(&self) -> ChunkId {
        ChunkId::InLaws(Box::new(self.clone()))
    }

    /// Chunk receiving the partners and children of a member of this chunk.
    pub fn next_band(&self) -> Option<ChunkId> {
        match self {
            ChunkId::Root => Some(ChunkId::Descendants(1)),
            ChunkId::Descendants(m) => Some(ChunkId::Descendants(m.saturating_add(1))),
            ChunkId::Siblings => Some(ChunkId::SiblingDescendants(1)),
            ChunkId::SiblingDescendants(m) => Some(ChunkId::SiblingDescendants(m.saturating_add(1))),
            ChunkId::AncestorCousins { generation, depth } => Some(ChunkId::AncestorCousins {
                generation: *generation,
                depth: depth.saturating_add(1),
            }),
            ChunkId::Ancestors(_) | ChunkId::InLaws(_) => None,
        }
    }

    pub fn is_visible(&self, settings: &DepthSettings) -> bool {
        match self {
            ChunkId::Root => true,
            ChunkId::Ancestors(g) => settings.ancestors >= *g,
            ChunkId::AncestorCousins { generation, depth } => {
                settings.ancestors >= *generation && u16::from(settings.cousins) > u16::from(*depth)
            }
            ChunkId::Siblings => settings.cousins >= 1,
            ChunkId::SiblingDescendants(m) => settings.cousins >= 1 && settings.descendants >= *m,
            ChunkId::Descendants(m) => settings.descendants >= *m,
            ChunkId::InLaws(inner) => settings.in_laws && inner.is_visible(settings),
        }
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkId::Root => f.write_str("A0"),
            ChunkId::Ancestors(g) => write!(f, "A{g}"),
            ChunkId::AncestorCousins { generation, depth } => write!(f, "A{generation}C{depth}"),
            ChunkId::Siblings => f.write_str("S0"),
            ChunkId::SiblingDescendants(m) => write!(f, "S0D{m}"),
            ChunkId::Descendants(m) => write!(f, "D{m}"),
            ChunkId::InLaws(inner) => write!(f, "{inner}IL"),
        }
    }
}

impl Serialize for ChunkId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Where the extra partners of the root's parents (step-parents) are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParentPartnerChunk {
    /// Fold them into `S0` with the root's siblings.
    #[default]
    Siblings,
    /// Keep them in `A1C0` like every other generation does.
    AncestorCousins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPolicy {
    pub parent_partners: ParentPartnerChunk,
}

impl ChunkPolicy {
    /// Chunk for the extra partners of a generation-`generation` ancestor.
    pub fn ancestor_partner_chunk(&self, generation: u8) -> ChunkId {
        if generation == 1 && self.parent_partners == ParentPartnerChunk::Siblings {
            ChunkId::Siblings
        } else {
            ChunkId::AncestorCousins {
                generation,
                depth: 0,
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: ChunkId,
    pub codes: Vec<PathCode>,
}

#[derive(Debug, Clone, Default)]
pub struct ChunkCollection {
    chunks: BTreeMap<ChunkId, Chunk>,
}

impl ChunkCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `code` to the chunk, creating the chunk on first use. A code
    /// already in the chunk keeps its position.
    pub fn append(&mut self, id: &ChunkId, code: &PathCode) {
        let chunk = self.chunks.entry(id.clone()).or_insert_with(|| Chunk {
            id: id.clone(),
            codes: Vec::new(),
        });
        if !chunk.codes.contains(code) {
            chunk.codes.push(code.clone());
        }
    }

    pub fn remove_code(&mut self, id: &ChunkId, code: &PathCode) {
        if let Some(chunk) = self.chunks.get_mut(id) {
            chunk.codes.retain(|c| c != code);
        }
    }

    pub fn get(&self, id: &ChunkId) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}
