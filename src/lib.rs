#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod context;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod tree;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use context::{DepthSettings, LayoutContext, Level, LevelKind};
pub use ir::{Person, PersonGraph, PersonId};
pub use layout::{Connector, LayoutSummary, compute_layout, route_connectors};
pub use parser::{parse_person_batch, parse_person_graph};
pub use tree::{PathCode, build_leaves};

/// Positions and connectors produced for one context.
#[derive(Debug, Clone)]
pub struct TreeLayout {
    pub summary: LayoutSummary,
    pub connectors: Vec<Connector>,
}

/// Expands `ctx` against `graph`, lays it out and routes its connectors.
pub fn layout_tree(graph: &PersonGraph, ctx: &mut LayoutContext, config: &LayoutConfig) -> TreeLayout {
    build_leaves(graph, ctx, config);
    let summary = compute_layout(ctx, config);
    let connectors = route_connectors(ctx, config);
    TreeLayout { summary, connectors }
}
