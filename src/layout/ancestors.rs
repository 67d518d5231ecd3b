use super::*;

impl LayoutEngine<'_> {
    /// Lays out the cluster of the ancestor with Ahnentafel number `ahnen`
    /// one row above its child. Fathers (even numbers) take their siblings
    /// to the left, mothers to the right, and the couple's gap is centred
    /// over the child's box.
    pub fn layout_ancestor_cluster_and_siblings_family(&mut self, ahnen: u64) -> Option<Dims> {
        let code = PathCode::from_ahnentafel(ahnen)?;
        if code.is_root() || !self.is_visible(&code) {
            return None;
        }
        let child = code.parent()?;
        let (child_left, child_y) = self.position(&child)?;

        let config = self.config;
        let child_center = child_left + config.box_width / 2.0;
        let offset = (config.box_width + config.partner_margin) / 2.0;
        let (x, alignment) = if ahnen % 2 == 0 {
            (child_center - offset, Alignment::Left)
        } else {
            (child_center + offset, Alignment::Right)
        };
        let y = child_y - config.row_step();
        Some(self.layout_siblings_and_descendants(&code, x, y, alignment))
    }

    /// Places and packs every ancestor cluster of `generation`.
    pub(super) fn layout_ancestor_generation(&mut self, generation: u8) {
        if generation == 1 {
            self.layout_parents_of_root();
            return;
        }

        // Couples are keyed by their child, one generation down.
        let below = usize::from(generation - 1);
        let mut children: Vec<(u64, bool)> = self
            .ctx
            .visible_leaves()
            .filter(|leaf| leaf.code.degree() == below && leaf.code.is_direct_line())
            .filter(|leaf| leaf.position().is_some())
            .filter_map(|leaf| {
                let paternal = leaf.code.steps().first() == Some(&Step::father());
                leaf.code.ahnentafel().map(|ahnen| (ahnen, paternal))
            })
            .collect();
        children.sort_unstable();

        // Axis outward: the paternal half right to left, the maternal half left to right.
        let (paternal, maternal): (Vec<_>, Vec<_>) = children.into_iter().partition(|(_, paternal)| *paternal);
        for (child, _) in paternal.into_iter().rev() {
            self.layout_couple(child, Push::Left);
        }
        for (child, _) in maternal {
            self.layout_couple(child, Push::Right);
        }
    }

    fn layout_parents_of_root(&mut self) {
        let gap = self.config.cluster_gap;
        if self.layout_ancestor_cluster_and_siblings_family(2).is_some() {
            let father = self.cluster_codes(&PathCode::root().child(Step::father()));
            let obstacles = self.obstacles_except(&father, gap);
            self.push_clear(&father, Push::Left, &obstacles);
        }
        if self.layout_ancestor_cluster_and_siblings_family(3).is_some() {
            let mother = self.cluster_codes(&PathCode::root().child(Step::mother()));
            let father = self.cluster_codes(&PathCode::root().child(Step::father()));
            let mut obstacles = self.obstacles_of(&father, self.config.partner_margin);
            let mut skip = mother.clone();
            skip.extend(father);
            obstacles.extend(self.obstacles_except(&skip, gap));
            self.push_clear(&mother, Push::Right, &obstacles);
        }
    }

    /// Both parents of the ancestor `child`: the wife is pushed off the
    /// husband first, then the pair moves away from the root axis as one.
    fn layout_couple(&mut self, child: u64, direction: Push) {
        let Some(husband_ahnen) = child.checked_mul(2) else {
            return;
        };
        let wife_ahnen = husband_ahnen + 1;
        let husband = self
            .layout_ancestor_cluster_and_siblings_family(husband_ahnen)
            .and_then(|_| PathCode::from_ahnentafel(husband_ahnen))
            .map(|code| self.cluster_codes(&code))
            .unwrap_or_default();
        let wife = self
            .layout_ancestor_cluster_and_siblings_family(wife_ahnen)
            .and_then(|_| PathCode::from_ahnentafel(wife_ahnen))
            .map(|code| self.cluster_codes(&code))
            .unwrap_or_default();

        if !husband.is_empty() && !wife.is_empty() {
            let obstacles = self.obstacles_of(&husband, self.config.partner_margin);
            self.push_clear(&wife, Push::Right, &obstacles);
        }

        let mut unit = husband;
        unit.extend(wife);
        if unit.is_empty() {
            return;
        }
        let obstacles = self.obstacles_except(&unit, self.config.cluster_gap);
        self.push_clear(&unit, direction, &obstacles);
    }
}
