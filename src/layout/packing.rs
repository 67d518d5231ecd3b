use std::collections::BTreeSet;

use tracing::trace;

use super::*;

/// Bound on push rounds for one cluster.
const MAX_PUSH_ITERATIONS: usize = 64;
/// Shifts below this are treated as already clear.
const PUSH_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Push {
    Left,
    Right,
}

/// A placed footprint and the clearance a pushed cluster must keep from it.
#[derive(Debug, Clone, Copy)]
pub(super) struct Obstacle {
    pub rect: Rect,
    pub gap: f32,
}

impl LayoutEngine<'_> {
    /// The ancestor at `code` with everything that moves with it: partners,
    /// siblings and their families. Its own parents' line is excluded.
    pub(super) fn cluster_codes(&self, code: &PathCode) -> Vec<PathCode> {
        let depth = code.degree();
        let mut codes = Vec::new();
        if self.position(code).is_some() {
            codes.push(code.clone());
        }
        for leaf in self.ctx.leaves.descendants_of(code) {
            if leaf.position().is_none() {
                continue;
            }
            if matches!(leaf.code.steps().get(depth), Some(Step::Parent(_))) {
                continue;
            }
            codes.push(leaf.code.clone());
        }
        codes
    }

    pub(super) fn rects_of(&self, codes: &[PathCode]) -> Vec<Rect> {
        codes.iter().filter_map(|code| self.footprint(code)).collect()
    }

    pub(super) fn obstacles_of(&self, codes: &[PathCode], gap: f32) -> Vec<Obstacle> {
        self.rects_of(codes)
            .into_iter()
            .map(|rect| Obstacle { rect, gap })
            .collect()
    }

    /// Every positioned box outside `cluster`.
    pub(super) fn obstacles_except(&self, cluster: &[PathCode], gap: f32) -> Vec<Obstacle> {
        let skip: BTreeSet<&PathCode> = cluster.iter().collect();
        self.ctx
            .leaves
            .iter()
            .filter(|leaf| !skip.contains(&leaf.code))
            .filter_map(|leaf| self.footprint(&leaf.code))
            .map(|rect| Obstacle { rect, gap })
            .collect()
    }

    /// Moves `cluster` horizontally in `direction` until none of its boxes
    /// crowds an obstacle. Returns the total shift.
    pub(super) fn push_clear(&mut self, cluster: &[PathCode], direction: Push, obstacles: &[Obstacle]) -> f32 {
        let dx = self.clearance(cluster, direction, obstacles);
        if dx != 0.0 {
            self.translate_codes(cluster, dx);
        }
        dx
    }

    /// Moves `cluster` by whichever of the left or right clearances is
    /// shorter. Ties go right.
    pub(super) fn push_nearest_clear(&mut self, cluster: &[PathCode], obstacles: &[Obstacle]) -> f32 {
        let left = self.clearance(cluster, Push::Left, obstacles);
        let right = self.clearance(cluster, Push::Right, obstacles);
        let dx = if left.abs() < right.abs() { left } else { right };
        if dx != 0.0 {
            self.translate_codes(cluster, dx);
        }
        dx
    }

    /// Signed shift in `direction` that leaves every box of `cluster` clear
    /// of `obstacles`. Nothing is moved.
    fn clearance(&self, cluster: &[PathCode], direction: Push, obstacles: &[Obstacle]) -> f32 {
        let mut rects = self.rects_of(cluster);
        let mut moved = 0.0;
        if rects.is_empty() || obstacles.is_empty() {
            return moved;
        }
        for _ in 0..MAX_PUSH_ITERATIONS {
            let mut shift = 0.0f32;
            for rect in &rects {
                for obstacle in obstacles {
                    if !rect.crowds(&obstacle.rect, obstacle.gap) {
                        continue;
                    }
                    let needed = match direction {
                        Push::Left => rect.right() + obstacle.gap - obstacle.rect.x,
                        Push::Right => obstacle.rect.right() + obstacle.gap - rect.x,
                    };
                    shift = shift.max(needed);
                }
            }
            if shift <= PUSH_EPSILON {
                return moved;
            }
            let dx = match direction {
                Push::Left => -shift,
                Push::Right => shift,
            };
            for rect in &mut rects {
                rect.x += dx;
            }
            moved += dx;
        }
        trace!(boxes = rects.len(), "push iteration limit reached");
        moved
    }

    pub(super) fn translate_codes(&mut self, codes: &[PathCode], dx: f32) {
        for code in codes {
            if let Some(leaf) = self.ctx.leaves.get_mut(code) {
                leaf.x = leaf.x.map(|x| x + dx);
            }
        }
    }
}
