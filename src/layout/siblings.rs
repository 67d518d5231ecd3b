use super::*;
use crate::ir::date_sort_key;

impl LayoutEngine<'_> {
    /// Lays out the anchor at `code` and then its visible siblings beside it.
    ///
    /// A direct ancestor anchor is drawn as its own box plus any extra
    /// partners on the outer side; every other anchor brings its descendants.
    pub fn layout_siblings_and_descendants(
        &mut self,
        code: &PathCode,
        x: f32,
        y: f32,
        alignment: Alignment,
    ) -> Dims {
        let mut dims = if code.is_direct_line() && !code.is_root() {
            self.layout_ancestor_anchor(code, x, y, alignment)
        } else {
            self.layout_person_and_descendants(code, x, y)
        };

        let siblings = self.visible_extensions(code, StepKind::Sibling);
        if siblings.is_empty() {
            return dims;
        }

        let (left, right): (Vec<PathCode>, Vec<PathCode>) = match alignment {
            Alignment::Center => {
                let anchor_born = self.birth_key(code);
                siblings
                    .into_iter()
                    .partition(|sibling| self.birth_key(sibling) < anchor_born)
            }
            Alignment::Left => (siblings, Vec::new()),
            Alignment::Right => (Vec::new(), siblings),
        };

        let margin = self.config.sibling_margin;
        let mut left_edge = dims.min_x;
        let mut right_edge = dims.max_x;
        // Nearest sibling first on both sides.
        for sibling in left.iter().rev() {
            let placed = self.layout_person_and_descendants(sibling, 0.0, y);
            let dx = left_edge - margin - placed.max_x;
            self.reposition_persons_cluster(sibling, dx, 0.0);
            let placed = placed.translated(dx);
            left_edge = placed.min_x;
            dims = dims.union(placed);
        }
        for sibling in &right {
            let placed = self.layout_person_and_descendants(sibling, 0.0, y);
            let dx = right_edge + margin - placed.min_x;
            self.reposition_persons_cluster(sibling, dx, 0.0);
            let placed = placed.translated(dx);
            right_edge = placed.max_x;
            dims = dims.union(placed);
        }
        dims
    }

    fn birth_key(&self, code: &PathCode) -> (bool, crate::ir::PartialDate) {
        date_sort_key(self.ctx.leaves.get(code).and_then(|leaf| leaf.birth_date))
    }

    /// An ancestor's own box with its extra partners (and their parents)
    /// stacked away from the couple it belongs to.
    fn layout_ancestor_anchor(&mut self, code: &PathCode, x: f32, y: f32, alignment: Alignment) -> Dims {
        let config = self.config;
        let width = config.box_width;
        let own_left = x - width / 2.0;
        self.place(code, own_left, y);
        let mut dims = Dims::single(own_left, config);

        let outward_right = alignment == Alignment::Right;
        let side = if outward_right { Push::Right } else { Push::Left };
        let mut edge = if outward_right { own_left + width } else { own_left };
        let mut in_law_edge = None;
        for partner in self.visible_extensions(code, StepKind::Partner) {
            let left = if outward_right {
                edge + config.partner_margin
            } else {
                edge - config.partner_margin - width
            };
            edge = if outward_right { left + width } else { left };
            self.place(&partner, left, y);
            dims = dims.union(Dims::single(left, config));
            if let Some((_, in_laws)) = self.place_in_laws_beside(&partner, left, y, in_law_edge, side) {
                in_law_edge = Some(if outward_right {
                    in_laws.max_x + config.cluster_gap
                } else {
                    in_laws.min_x - config.cluster_gap
                });
                dims = dims.union(in_laws);
            }
        }
        dims
    }
}
