use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::context::LayoutContext;
use crate::tree::{Leaf, PathCode, Step, StepKind};

// ── Crossbar registry ───────────────────────────────────────────────
/// Crossbar rows closer than this share one registry slot.
const ROW_QUANTUM: f32 = 0.5;
/// Crossbar points closer than this are merged.
const POINT_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectorKind {
    MarriageBar,
    Stem,
    Crossbar,
    Drop,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum Connector {
    Segment {
        kind: ConnectorKind,
        from: (f32, f32),
        to: (f32, f32),
    },
    Polyline {
        kind: ConnectorKind,
        points: Vec<(f32, f32)>,
    },
}

impl Connector {
    pub fn kind(&self) -> ConnectorKind {
        match self {
            Connector::Segment { kind, .. } | Connector::Polyline { kind, .. } => *kind,
        }
    }
}

/// A couple and the visible children drawn under them.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyUnit {
    pub owner: PathCode,
    pub partner: PathCode,
    /// Partner rank of the owner, from 1. Stacks the marriage bars.
    pub index: u8,
    pub children: Vec<PathCode>,
}

#[derive(Debug, Clone, Default)]
struct CrossbarRegistry {
    rows: BTreeMap<i64, Vec<(f32, f32)>>,
}

impl CrossbarRegistry {
    fn key(y: f32) -> i64 {
        (y / ROW_QUANTUM).round() as i64
    }

    /// Touching intervals count as overlapping.
    fn is_free(&self, y: f32, min_x: f32, max_x: f32) -> bool {
        self.rows
            .get(&Self::key(y))
            .is_none_or(|spans| spans.iter().all(|&(lo, hi)| max_x < lo || hi < min_x))
    }

    fn register(&mut self, y: f32, min_x: f32, max_x: f32) {
        self.rows.entry(Self::key(y)).or_default().push((min_x, max_x));
    }
}

/// Draws the family connectors for one laid-out context. Every router owns
/// its own crossbar registry.
pub struct ConnectorRouter<'a> {
    ctx: &'a LayoutContext,
    config: &'a LayoutConfig,
    registry: CrossbarRegistry,
}

impl<'a> ConnectorRouter<'a> {
    pub fn new(ctx: &'a LayoutContext, config: &'a LayoutConfig) -> Self {
        Self {
            ctx,
            config,
            registry: CrossbarRegistry::default(),
        }
    }

    pub fn route(&mut self) -> Vec<Connector> {
        let units = self.family_units();
        let mut connectors = Vec::new();
        for unit in &units {
            connectors.extend(self.route_unit(unit));
        }
        debug!(
            units = units.len(),
            connectors = connectors.len(),
            "routed family connectors"
        );
        connectors
    }

    fn positioned(&self, code: &PathCode) -> Option<&'a Leaf> {
        let ctx = self.ctx;
        ctx.leaves
            .get(code)
            .filter(|leaf| ctx.is_visible(leaf) && leaf.position().is_some())
    }

    fn positioned_extensions(&self, code: &PathCode, kind: StepKind) -> Vec<&'a Leaf> {
        let ctx = self.ctx;
        ctx.leaves
            .extensions(code, kind)
            .filter(|leaf| ctx.is_visible(leaf) && leaf.position().is_some())
            .collect()
    }

    /// Every couple with both boxes on screen, in code order.
    pub fn family_units(&self) -> Vec<FamilyUnit> {
        let mut units = Vec::new();
        for leaf in self.ctx.leaves.iter() {
            if self.positioned(&leaf.code).is_none() {
                continue;
            }
            let ancestor = leaf.code.is_direct_line() && !leaf.code.is_root();

            for partner in self.positioned_extensions(&leaf.code, StepKind::Partner) {
                let Some(Step::Partner(index)) = partner.code.last_step() else {
                    continue;
                };
                let children = if ancestor {
                    self.half_siblings(leaf, partner)
                } else {
                    self.positioned_extensions(&leaf.code, StepKind::Child)
                        .into_iter()
                        .filter(|child| child.co_parent_id.as_ref() == Some(&partner.person_id))
                        .map(|child| child.code.clone())
                        .collect()
                };
                units.push(FamilyUnit {
                    owner: leaf.code.clone(),
                    partner: partner.code.clone(),
                    index,
                    children,
                });
            }

            let father = leaf.code.child(Step::father());
            let mother = leaf.code.child(Step::mother());
            if let (Some(f), Some(m)) = (self.positioned(&father), self.positioned(&mother)) {
                let mut children = vec![leaf.code.clone()];
                children.extend(
                    self.positioned_extensions(&leaf.code, StepKind::Sibling)
                        .into_iter()
                        .filter(|sibling| sibling.has_parents(&f.person_id, &m.person_id))
                        .map(|sibling| sibling.code.clone()),
                );
                units.push(FamilyUnit {
                    owner: father,
                    partner: mother,
                    index: 1,
                    children,
                });
            }
        }
        units
    }

    /// Children of an ancestor and one of its extra partners: they sit among
    /// the siblings of the ancestor's own child.
    fn half_siblings(&self, ancestor: &Leaf, partner: &Leaf) -> Vec<PathCode> {
        let Some(child) = ancestor.code.parent() else {
            return Vec::new();
        };
        self.positioned_extensions(&child, StepKind::Sibling)
            .into_iter()
            .filter(|sibling| sibling.has_parents(&ancestor.person_id, &partner.person_id))
            .map(|sibling| sibling.code.clone())
            .collect()
    }

    pub fn route_unit(&mut self, unit: &FamilyUnit) -> Vec<Connector> {
        let (Some(owner), Some(partner)) = (self.positioned(&unit.owner), self.positioned(&unit.partner)) else {
            return Vec::new();
        };
        let (Some((owner_x, owner_y)), Some((partner_x, _))) = (owner.position(), partner.position()) else {
            return Vec::new();
        };
        let config = self.config;
        let width = config.box_width;
        let inset = config.box_inset;

        let (left, right) = if owner_x <= partner_x {
            (owner_x, partner_x)
        } else {
            (partner_x, owner_x)
        };
        let bar_from = left + width - inset;
        let bar_to = right + inset;
        let gap = config.marriage_bar_gap;
        let stack = f32::from(unit.index.saturating_sub(1)) * config.marriage_bar_stack_step;
        let upper = owner_y + config.box_height / 2.0 - gap / 2.0 + stack;
        let lower = upper + gap;

        let mut stem_x = (bar_from + bar_to) / 2.0;
        let mut connectors = if self.boxes_between(left, right, owner_y) {
            // Hop over the boxes in between through the inset band above
            // them. The lower bar nests inside the upper one.
            let lift = f32::from(unit.index.saturating_sub(2)) * (gap + config.marriage_bar_stack_step);
            let channel = owner_y + inset / 2.0 - gap / 2.0 - lift;
            let out = left + width + config.partner_margin / 2.0 - gap / 2.0;
            let back = right - config.partner_margin / 2.0 + gap / 2.0;
            stem_x = back - gap;
            vec![
                Self::hop_bar(bar_from, bar_to, upper, channel, out, back),
                Self::hop_bar(bar_from, bar_to, lower, channel + gap, out + gap, back - gap),
            ]
        } else {
            vec![
                Connector::Segment {
                    kind: ConnectorKind::MarriageBar,
                    from: (bar_from, upper),
                    to: (bar_to, upper),
                },
                Connector::Segment {
                    kind: ConnectorKind::MarriageBar,
                    from: (bar_from, lower),
                    to: (bar_to, lower),
                },
            ]
        };

        let children: Vec<(f32, f32)> = unit
            .children
            .iter()
            .filter_map(|code| self.positioned(code))
            .filter_map(|leaf| leaf.position())
            .map(|(x, y)| (x + width / 2.0, y))
            .collect();
        if children.is_empty() {
            return connectors;
        }

        let child_top = children.iter().map(|&(_, y)| y).fold(f32::MAX, f32::min);
        let mut xs: Vec<f32> = children.iter().map(|&(x, _)| x).collect();
        xs.push(stem_x);
        xs.sort_by(f32::total_cmp);
        xs.dedup_by(|a, b| (*a - *b).abs() < POINT_EPSILON);
        let min_x = xs.first().copied().unwrap_or(stem_x);
        let max_x = xs.last().copied().unwrap_or(stem_x);

        let bar_y = self.resolve_crossbar_y(child_top - config.generation_gap / 2.0, min_x, max_x);
        connectors.push(Connector::Segment {
            kind: ConnectorKind::Stem,
            from: (stem_x, lower),
            to: (stem_x, bar_y),
        });
        connectors.push(Connector::Polyline {
            kind: ConnectorKind::Crossbar,
            points: xs.iter().map(|&x| (x, bar_y)).collect(),
        });
        for (x, y) in children {
            connectors.push(Connector::Segment {
                kind: ConnectorKind::Drop,
                from: (x, bar_y),
                to: (x, y + inset),
            });
        }
        connectors
    }

    /// A visible box in the owner's row strictly between the two partners.
    fn boxes_between(&self, left: f32, right: f32, y: f32) -> bool {
        let height = self.config.box_height;
        self.ctx.visible_leaves().any(|leaf| {
            leaf.position().is_some_and(|(x, leaf_y)| {
                (leaf_y - y).abs() < height && x > left + POINT_EPSILON && x < right - POINT_EPSILON
            })
        })
    }

    fn hop_bar(from: f32, to: f32, y: f32, channel: f32, out: f32, back: f32) -> Connector {
        Connector::Polyline {
            kind: ConnectorKind::MarriageBar,
            points: vec![
                (from, y),
                (out, y),
                (out, channel),
                (back, channel),
                (back, y),
                (to, y),
            ],
        }
    }

    /// First free row at or above `candidate` for a crossbar spanning
    /// `min_x..=max_x`. The chosen row is registered; when every attempt is
    /// taken the last one tried is returned unregistered.
    pub fn resolve_crossbar_y(&mut self, candidate: f32, min_x: f32, max_x: f32) -> f32 {
        let attempts = self.config.atc_max_attempts;
        let mut y = candidate;
        for attempt in 0..=attempts {
            if self.registry.is_free(y, min_x, max_x) {
                self.registry.register(y, min_x, max_x);
                return y;
            }
            if attempt < attempts {
                y -= self.config.atc_step;
            }
        }
        warn!(candidate, y, min_x, max_x, "no free crossbar row, overlapping");
        y
    }
}

pub fn route_connectors(ctx: &LayoutContext, config: &LayoutConfig) -> Vec<Connector> {
    ConnectorRouter::new(ctx, config).route()
}

#[cfg(test)]
mod tests {
    use super::super::tests::*;
    use super::super::compute_layout;
    use super::*;
    use crate::ir::{Gender, Person, PersonGraph};

    fn crossbars(connectors: &[Connector]) -> Vec<(f32, f32, f32)> {
        connectors
            .iter()
            .filter_map(|connector| match connector {
                Connector::Polyline {
                    kind: ConnectorKind::Crossbar,
                    points,
                } => {
                    let y = points.first()?.1;
                    let lo = points.iter().map(|p| p.0).fold(f32::MAX, f32::min);
                    let hi = points.iter().map(|p| p.0).fold(f32::MIN, f32::max);
                    Some((y, lo, hi))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn crossbar_moves_up_until_free() {
        let ctx = LayoutContext::new(id("a0"));
        let config = LayoutConfig::default();
        let mut router = ConnectorRouter::new(&ctx, &config);
        assert_eq!(router.resolve_crossbar_y(100.0, 0.0, 50.0), 100.0);
        // Touching the first interval still counts.
        assert_eq!(router.resolve_crossbar_y(100.0, 50.0, 80.0), 94.0);
        assert_eq!(router.resolve_crossbar_y(100.0, 40.0, 70.0), 88.0);
        // Disjoint intervals share the row.
        assert_eq!(router.resolve_crossbar_y(100.0, 81.0, 120.0), 100.0);
    }

    #[test]
    fn exhausted_attempts_return_the_last_row_unregistered() {
        let ctx = LayoutContext::new(id("a0"));
        let config = LayoutConfig::default();
        let mut router = ConnectorRouter::new(&ctx, &config);
        for i in 0..=config.atc_max_attempts {
            router.registry.register(100.0 - i as f32 * config.atc_step, 0.0, 100.0);
        }
        let last = 100.0 - config.atc_max_attempts as f32 * config.atc_step;
        assert_eq!(router.resolve_crossbar_y(100.0, 50.0, 150.0), last);
        let spans = &router.registry.rows[&CrossbarRegistry::key(last)];
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn couple_with_children_gets_bars_stem_crossbar_and_drops() {
        let mut graph = PersonGraph::new();
        let mut root = Person::new("a0", Gender::Female);
        root.spouses = vec![spouse("h")];
        root.children = vec![child("k1", Some("h"), 1990), child("k2", Some("h"), 1992)];
        graph.merge([
            root,
            Person::new("h", Gender::Male),
            Person::new("k1", Gender::Male),
            Person::new("k2", Gender::Female),
        ]);
        let config = LayoutConfig::default();
        let mut ctx = context(&graph, depth(0, 1, 0));
        compute_layout(&mut ctx, &config);
        let connectors = route_connectors(&ctx, &config);

        let count = |kind| connectors.iter().filter(|c| c.kind() == kind).count();
        assert_eq!(count(ConnectorKind::MarriageBar), 2);
        assert_eq!(count(ConnectorKind::Stem), 1);
        assert_eq!(count(ConnectorKind::Crossbar), 1);
        assert_eq!(count(ConnectorKind::Drop), 2);

        let bars = crossbars(&connectors);
        assert_eq!(bars[0].0, config.row_step() - config.generation_gap / 2.0);
        for connector in &connectors {
            if let Connector::Segment {
                kind: ConnectorKind::Drop,
                to,
                ..
            } = connector
            {
                assert_eq!(to.1, config.row_step() + config.box_inset);
            }
        }
    }

    #[test]
    fn parents_and_in_laws_share_a_row_without_overlap() {
        let mut graph = PersonGraph::new();
        let mut root = born(Person::new("a0", Gender::Male), 1950);
        root.father = Some(id("f"));
        root.mother = Some(id("m"));
        root.spouses = vec![spouse("w")];
        root.siblings = vec![sibling("b")];
        let mut wife = Person::new("w", Gender::Female);
        wife.father = Some(id("wf"));
        wife.mother = Some(id("wm"));
        let mut brother = born(Person::new("b", Gender::Male), 1955);
        brother.father = Some(id("f"));
        brother.mother = Some(id("m"));
        graph.merge([
            root,
            wife,
            brother,
            Person::new("f", Gender::Male),
            Person::new("m", Gender::Female),
            Person::new("wf", Gender::Male),
            Person::new("wm", Gender::Female),
        ]);
        let config = LayoutConfig::default();
        let mut settings = depth(1, 1, 1);
        settings.in_laws = true;
        let mut ctx = context(&graph, settings);
        compute_layout(&mut ctx, &config);

        let router = ConnectorRouter::new(&ctx, &config);
        let units = router.family_units();
        let parents = units.iter().find(|unit| unit.owner == code("A0RF")).unwrap();
        assert_eq!(parents.children, vec![code("A0"), code("A0S01")]);
        assert!(units.iter().any(|unit| unit.owner == code("A0P1RF")));

        let connectors = route_connectors(&ctx, &config);
        let bars = crossbars(&connectors);
        assert_eq!(bars.len(), 2);
        let candidate = -config.generation_gap / 2.0;
        assert_eq!(bars[0].0, candidate);
        assert_eq!(bars[1].0, candidate - config.atc_step);
        for (i, a) in bars.iter().enumerate() {
            for b in &bars[i + 1..] {
                if a.0 == b.0 {
                    assert!(a.2 < b.1 || b.2 < a.1);
                }
            }
        }
    }

    #[test]
    fn second_marriage_bar_hops_over_the_first_partner() {
        let mut graph = PersonGraph::new();
        let mut root = Person::new("a0", Gender::Male);
        root.spouses = vec![spouse("w1"), spouse("w2")];
        graph.merge([
            root,
            Person::new("w1", Gender::Female),
            Person::new("w2", Gender::Female),
        ]);
        let config = LayoutConfig::default();
        let mut ctx = context(&graph, depth(0, 1, 0));
        compute_layout(&mut ctx, &config);
        let connectors = route_connectors(&ctx, &config);

        let hops: Vec<&Vec<(f32, f32)>> = connectors
            .iter()
            .filter_map(|connector| match connector {
                Connector::Polyline {
                    kind: ConnectorKind::MarriageBar,
                    points,
                } => Some(points),
                _ => None,
            })
            .collect();
        assert_eq!(hops.len(), 2);
        assert_eq!(connectors.iter().filter(|c| c.kind() == ConnectorKind::MarriageBar).count(), 4);

        let (bx, by) = ctx.leaves.get(&code("A0P1")).unwrap().position().unwrap();
        let inset = config.box_inset;
        let drawn_x = (bx + inset, bx + config.box_width - inset);
        let drawn_y = (by + inset, by + config.box_height - inset);
        for points in hops {
            for pair in points.windows(2) {
                let (lo, hi) = (pair[0].0.min(pair[1].0), pair[0].0.max(pair[1].0));
                let (top, bottom) = (pair[0].1.min(pair[1].1), pair[0].1.max(pair[1].1));
                let crosses_x = lo < drawn_x.1 && drawn_x.0 < hi;
                let crosses_y = top < drawn_y.1 && drawn_y.0 < bottom;
                assert!(!(crosses_x && crosses_y), "bar segment {pair:?} runs through the first partner");
            }
        }
    }
}
