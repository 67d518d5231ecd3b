mod ancestors;
mod descendants;
mod packing;
mod routing;
mod siblings;
pub(crate) mod types;
pub use routing::{Connector, ConnectorKind, ConnectorRouter, FamilyUnit, route_connectors};
pub use types::*;
use packing::*;

use crate::config::LayoutConfig;
use crate::context::LayoutContext;
use crate::tree::{PathCode, Step, StepKind};
use tracing::debug;

/// Positions the visible leaves of one [`LayoutContext`].
///
/// Coordinates are the top-left corner of each leaf's footprint box. The
/// root is centred on `x = 0` and rows grow downward.
pub struct LayoutEngine<'a> {
    ctx: &'a mut LayoutContext,
    config: &'a LayoutConfig,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(ctx: &'a mut LayoutContext, config: &'a LayoutConfig) -> Self {
        Self { ctx, config }
    }

    /// Clears every position, lays out the root cluster, then each requested
    /// ancestor generation in turn.
    pub fn run(&mut self) -> LayoutSummary {
        self.ctx.leaves.clear_positions();
        let root = PathCode::root();
        if self.is_visible(&root) {
            self.layout_siblings_and_descendants(&root, 0.0, 0.0, Alignment::Center);
            let generations = self.ctx.settings.ancestors.min(self.config.max_generations);
            for generation in 1..=generations {
                self.layout_ancestor_generation(generation);
            }
        }
        let summary = self.summary();
        debug!(
            placed = summary.placed,
            width = summary.width(),
            height = summary.height(),
            "layout complete"
        );
        summary
    }

    fn is_visible(&self, code: &PathCode) -> bool {
        self.ctx.is_leaf_visible(code)
    }

    /// Visible codes exactly one `kind` step below `code`, in step order.
    fn visible_extensions(&self, code: &PathCode, kind: StepKind) -> Vec<PathCode> {
        self.ctx
            .leaves
            .extensions(code, kind)
            .filter(|leaf| self.ctx.is_visible(leaf))
            .map(|leaf| leaf.code.clone())
            .collect()
    }

    fn place(&mut self, code: &PathCode, left: f32, y: f32) {
        if let Some(leaf) = self.ctx.leaves.get_mut(code) {
            leaf.x = Some(left);
            leaf.y = Some(y);
        }
    }

    fn position(&self, code: &PathCode) -> Option<(f32, f32)> {
        self.ctx.leaves.get(code).and_then(|leaf| leaf.position())
    }

    fn footprint(&self, code: &PathCode) -> Option<Rect> {
        let (x, y) = self.position(code)?;
        Some(Rect {
            x,
            y,
            width: self.config.box_width,
            height: self.config.box_height,
        })
    }

    /// Moves `code` and every positioned leaf below it.
    pub fn reposition_persons_cluster(&mut self, code: &PathCode, dx: f32, dy: f32) {
        if dx != 0.0 || dy != 0.0 {
            self.ctx.leaves.translate_prefixed(code, dx, dy);
        }
    }

    fn summary(&self) -> LayoutSummary {
        let mut placed = 0;
        let mut summary = LayoutSummary {
            min_x: f32::MAX,
            max_x: f32::MIN,
            min_y: f32::MAX,
            max_y: f32::MIN,
            placed: 0,
        };
        for leaf in self.ctx.visible_leaves() {
            let Some((x, y)) = leaf.position() else {
                continue;
            };
            placed += 1;
            summary.min_x = summary.min_x.min(x);
            summary.max_x = summary.max_x.max(x + self.config.box_width);
            summary.min_y = summary.min_y.min(y);
            summary.max_y = summary.max_y.max(y + self.config.box_height);
        }
        if placed == 0 {
            return LayoutSummary::default();
        }
        summary.placed = placed;
        summary
    }
}

pub fn compute_layout(ctx: &mut LayoutContext, config: &LayoutConfig) -> LayoutSummary {
    LayoutEngine::new(ctx, config).run()
}
