use super::*;

impl LayoutEngine<'_> {
    /// Lays out `code` with its partners, their parents and every visible
    /// descendant. `x` is the centre of the person's box and `y` its row.
    pub fn layout_person_and_descendants(&mut self, code: &PathCode, x: f32, y: f32) -> Dims {
        let config = self.config;
        let width = config.box_width;
        let partners = self.visible_extensions(code, StepKind::Partner);
        let children = self.visible_extensions(code, StepKind::Child);

        if partners.is_empty() && children.is_empty() {
            self.place(code, x - width / 2.0, y);
            return Dims::single(x - width / 2.0, config);
        }

        // Children left to right from zero; the whole family is moved at the end.
        let child_y = y + config.row_step();
        let mut span: Option<Dims> = None;
        let mut cursor = 0.0;
        for child in &children {
            let dims = self.layout_person_and_descendants(child, 0.0, child_y);
            let dx = cursor - dims.min_x;
            self.reposition_persons_cluster(child, dx, 0.0);
            let placed = dims.translated(dx);
            cursor = placed.max_x + config.child_margin;
            span = Some(span.map_or(placed, |span| span.union(placed)));
        }

        let unit_width = (partners.len() + 1) as f32 * width
            + partners.len() as f32 * config.partner_margin;
        let mut unit_left = 0.0;
        if let Some(children_span) = span {
            if unit_width >= children_span.width {
                let shift = unit_width / 2.0 - children_span.center();
                for child in &children {
                    self.reposition_persons_cluster(child, shift, 0.0);
                }
                span = Some(children_span.translated(shift));
            } else {
                unit_left = children_span.center() - unit_width / 2.0;
            }
        }

        self.place(code, unit_left, y);
        let mut unit = vec![code.clone()];
        let mut in_law_edge = None;
        for (index, partner) in partners.iter().enumerate() {
            let left = unit_left + (index + 1) as f32 * (width + config.partner_margin);
            self.place(partner, left, y);
            unit.push(partner.clone());
            if let Some((parents, in_laws)) = self.place_in_laws_beside(partner, left, y, in_law_edge, Push::Right) {
                in_law_edge = Some(in_laws.max_x + config.cluster_gap);
                unit.extend(parents);
            }
        }

        // The children's in-laws may reach up into this row.
        if !children.is_empty() {
            let below: Vec<PathCode> = children.iter().flat_map(|child| self.cluster_codes(child)).collect();
            let obstacles = self.obstacles_of(&below, config.child_margin);
            self.push_nearest_clear(&unit, &obstacles);
        }

        let mut footprint = self
            .rects_of(&unit)
            .into_iter()
            .map(|rect| Dims::single(rect.x, config))
            .reduce(Dims::union)
            .unwrap_or_else(|| Dims::single(unit_left, config));

        let mut height = config.box_height;
        if let Some(children_span) = span {
            footprint = footprint.union(children_span);
            height = config.row_step() + children_span.height;
        }

        let person_left = self.position(code).map_or(unit_left, |(left, _)| left);
        let dx = x - (person_left + width / 2.0);
        self.reposition_persons_cluster(code, dx, 0.0);
        Dims {
            height,
            ..footprint.translated(dx)
        }
    }

    /// Places the parents of `partner` above it, then slides them toward
    /// `side` so they start past `edge`, the far side of the in-law couple
    /// placed before them. Returns the placed codes and their extent.
    pub(super) fn place_in_laws_beside(
        &mut self,
        partner: &PathCode,
        left: f32,
        y: f32,
        edge: Option<f32>,
        side: Push,
    ) -> Option<(Vec<PathCode>, Dims)> {
        let dims = self.reposition_spouses_family(partner, left, y)?;
        let parents: Vec<PathCode> = [Step::father(), Step::mother()]
            .into_iter()
            .map(|step| partner.child(step))
            .filter(|code| self.is_visible(code))
            .collect();
        let dx = match (edge, side) {
            (Some(edge), Push::Right) => (edge - dims.min_x).max(0.0),
            (Some(edge), Push::Left) => (edge - dims.max_x).min(0.0),
            (None, _) => 0.0,
        };
        if dx != 0.0 {
            self.translate_codes(&parents, dx);
        }
        Some((parents, dims.translated(dx)))
    }

    /// Places the visible parents of `partner` directly above it, one
    /// `in_law_offset` up. Returns their footprint.
    pub fn reposition_spouses_family(&mut self, partner: &PathCode, left: f32, y: f32) -> Option<Dims> {
        let config = self.config;
        let width = config.box_width;
        let center = left + width / 2.0;
        let row = y - config.in_law_offset;
        let parents: Vec<PathCode> = [Step::father(), Step::mother()]
            .into_iter()
            .map(|step| partner.child(step))
            .filter(|code| self.is_visible(code))
            .collect();

        let first_left = match parents.len() {
            0 => return None,
            1 => center - width / 2.0,
            _ => center - width,
        };
        let mut dims: Option<Dims> = None;
        for (index, parent) in parents.iter().enumerate() {
            let parent_left = first_left + index as f32 * width;
            self.place(parent, parent_left, row);
            let single = Dims::single(parent_left, config);
            dims = Some(dims.map_or(single, |dims| dims.union(single)));
        }
        dims
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::*;
    use super::*;
    use crate::ir::{Gender, Person, PersonGraph};

    fn parent_of(children: &[&str]) -> PersonGraph {
        let mut graph = PersonGraph::new();
        let mut root = Person::new("a0", Gender::Female);
        root.spouses = vec![spouse("h")];
        root.children = children
            .iter()
            .enumerate()
            .map(|(i, name)| child(name, Some("h"), 1990 + i as i32))
            .collect();
        graph.insert(root);
        graph.insert(Person::new("h", Gender::Male));
        for name in children {
            graph.insert(Person::new(*name, Gender::Unknown));
        }
        graph
    }

    #[test]
    fn childless_leaf_is_one_box_wherever_it_starts() {
        let mut graph = PersonGraph::new();
        graph.insert(Person::new("a0", Gender::Male));
        let config = LayoutConfig::default();
        let mut ctx = context(&graph, depth(0, 2, 0));
        let mut engine = LayoutEngine::new(&mut ctx, &config);
        for x in [-500.0, 0.0, 1234.5] {
            let dims = engine.layout_person_and_descendants(&PathCode::root(), x, 0.0);
            assert_eq!(dims.width, config.box_width);
            assert_eq!(dims.height, config.box_height);
            assert_eq!(dims.min_x, x - config.box_width / 2.0);
        }
    }

    #[test]
    fn wide_children_span_sets_the_family_width() {
        let graph = parent_of(&["k1", "k2", "k3"]);
        let mut config = LayoutConfig::default();
        config.child_margin = 10.0;
        let mut ctx = context(&graph, depth(0, 1, 0));
        let dims = LayoutEngine::new(&mut ctx, &config)
            .layout_person_and_descendants(&PathCode::root(), 0.0, 0.0);

        assert_eq!(dims.width, 3.0 * 180.0 + 2.0 * 10.0);
        assert_eq!(dims.height, config.row_step() + config.box_height);
        let (root_x, _) = ctx.leaves.get(&PathCode::root()).unwrap().position().unwrap();
        assert_eq!(root_x, -90.0);
        // The couple is centred over the children.
        let (first_x, first_y) = ctx.leaves.get(&code("A0K01")).unwrap().position().unwrap();
        let (last_x, _) = ctx.leaves.get(&code("A0K03")).unwrap().position().unwrap();
        assert_eq!(first_y, config.row_step());
        assert_eq!((first_x + last_x + 180.0) / 2.0, 90.0);
    }

    #[test]
    fn single_child_sits_under_the_wider_couple() {
        let graph = parent_of(&["k1"]);
        let config = LayoutConfig::default();
        let mut ctx = context(&graph, depth(0, 1, 0));
        let dims = LayoutEngine::new(&mut ctx, &config)
            .layout_person_and_descendants(&PathCode::root(), 0.0, 0.0);
        assert_eq!(dims.width, 360.0);
        assert_eq!((dims.min_x, dims.max_x), (-90.0, 270.0));
        let (kx, _) = ctx.leaves.get(&code("A0K01")).unwrap().position().unwrap();
        assert_eq!(kx, 0.0);
        let (hx, _) = ctx.leaves.get(&code("A0P1")).unwrap().position().unwrap();
        assert_eq!(hx, 90.0);
    }

    #[test]
    fn partner_parents_sit_above_the_partner() {
        let mut graph = parent_of(&[]);
        let mut husband = Person::new("h", Gender::Male);
        husband.father = Some(id("hf"));
        husband.mother = Some(id("hm"));
        graph.merge([
            husband,
            Person::new("hf", Gender::Male),
            Person::new("hm", Gender::Female),
        ]);
        let config = LayoutConfig::default();
        let mut settings = depth(0, 1, 0);
        settings.in_laws = true;
        let mut ctx = context(&graph, settings);
        let dims = LayoutEngine::new(&mut ctx, &config)
            .layout_person_and_descendants(&PathCode::root(), 0.0, 0.0);

        let (hx, _) = ctx.leaves.get(&code("A0P1")).unwrap().position().unwrap();
        let (fx, fy) = ctx.leaves.get(&code("A0P1RF")).unwrap().position().unwrap();
        let (mx, _) = ctx.leaves.get(&code("A0P1RM")).unwrap().position().unwrap();
        assert_eq!(fy, -config.in_law_offset);
        assert_eq!(fx, hx + 90.0 - 180.0);
        assert_eq!(mx, hx + 90.0);
        assert_eq!(dims.max_x, mx + 180.0);
    }

    #[test]
    fn couple_steps_aside_for_the_child_in_laws_in_its_row() {
        let mut graph = PersonGraph::new();
        let mut root = Person::new("a0", Gender::Female);
        root.spouses = vec![spouse("p")];
        root.children = vec![child("k", Some("p"), 1990)];
        let mut son = Person::new("k", Gender::Male);
        son.spouses = vec![spouse("q")];
        let mut daughter_in_law = Person::new("q", Gender::Female);
        daughter_in_law.father = Some(id("qf"));
        daughter_in_law.mother = Some(id("qm"));
        graph.merge([
            root,
            son,
            daughter_in_law,
            Person::new("p", Gender::Male),
            Person::new("qf", Gender::Male),
            Person::new("qm", Gender::Female),
        ]);
        let config = LayoutConfig::default();
        let mut settings = depth(0, 2, 0);
        settings.in_laws = true;
        let mut ctx = context(&graph, settings);
        let dims = LayoutEngine::new(&mut ctx, &config)
            .layout_person_and_descendants(&PathCode::root(), 0.0, 0.0);

        let at = |raw: &str| ctx.leaves.get(&code(raw)).unwrap().position().unwrap();
        assert_eq!(at("A0"), (-90.0, 0.0));
        assert_eq!(at("A0P1"), (90.0, 0.0));
        assert_eq!(at("A0K01P1RF"), (270.0, 0.0));
        assert_eq!(at("A0K01P1RM"), (450.0, 0.0));
        assert_eq!(at("A0K01").0, 180.0);
        assert_eq!((dims.min_x, dims.max_x), (-90.0, 630.0));

        let boxes: Vec<(f32, f32)> = ctx.leaves.iter().filter_map(|leaf| leaf.position()).collect();
        assert_eq!(boxes.len(), 6);
        for (i, a) in boxes.iter().enumerate() {
            for b in &boxes[i + 1..] {
                let apart_x = a.0 + config.box_width <= b.0 || b.0 + config.box_width <= a.0;
                let apart_y = a.1 + config.box_height <= b.1 || b.1 + config.box_height <= a.1;
                assert!(apart_x || apart_y, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn in_law_couples_of_two_partners_stay_apart() {
        let mut graph = PersonGraph::new();
        let mut root = Person::new("a0", Gender::Male);
        root.spouses = vec![spouse("w1"), spouse("w2")];
        graph.insert(root);
        for wife in ["w1", "w2"] {
            let mut record = Person::new(wife, Gender::Female);
            record.father = Some(id(&format!("{wife}f")));
            record.mother = Some(id(&format!("{wife}m")));
            graph.insert(record);
            graph.insert(Person::new(format!("{wife}f"), Gender::Male));
            graph.insert(Person::new(format!("{wife}m"), Gender::Female));
        }
        let config = LayoutConfig::default();
        let mut settings = depth(0, 1, 0);
        settings.in_laws = true;
        let mut ctx = context(&graph, settings);
        LayoutEngine::new(&mut ctx, &config).layout_person_and_descendants(&PathCode::root(), 0.0, 0.0);

        let x = |raw: &str| ctx.leaves.get(&code(raw)).unwrap().position().unwrap().0;
        assert_eq!(x("A0P1RM"), x("A0P1") + 90.0);
        assert_eq!(x("A0P2RF"), x("A0P1RM") + config.box_width + config.cluster_gap);
    }
}
