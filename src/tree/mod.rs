//! Path-coded unrolling of the person graph.

mod builder;
mod chunk;
mod code;
mod leaf;
mod order;

pub use builder::{IdSet, LeafDescriptor, MAX_PATH_DEGREE, PathCodeGraphBuilder, Reach, build_leaves};
pub use chunk::{Chunk, ChunkCollection, ChunkId, ChunkPolicy, ParentPartnerChunk};
pub use code::{CodeParseError, ParentSide, PathCode, Step, StepKind};
pub use leaf::{Leaf, LeafCollection};
pub use order::{child_order, partner_order, sibling_order};
