use serde::Serialize;

use crate::config::LayoutConfig;

/// Horizontal extent and downward height of a laid-out family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dims {
    pub width: f32,
    pub height: f32,
    pub min_x: f32,
    pub max_x: f32,
}

impl Dims {
    /// One footprint box whose left edge is `left`.
    pub fn single(left: f32, config: &LayoutConfig) -> Self {
        Self {
            width: config.box_width,
            height: config.box_height,
            min_x: left,
            max_x: left + config.box_width,
        }
    }

    pub fn union(self, other: Dims) -> Self {
        let min_x = self.min_x.min(other.min_x);
        let max_x = self.max_x.max(other.max_x);
        Self {
            width: max_x - min_x,
            height: self.height.max(other.height),
            min_x,
            max_x,
        }
    }

    pub fn translated(self, dx: f32) -> Self {
        Self {
            min_x: self.min_x + dx,
            max_x: self.max_x + dx,
            ..self
        }
    }

    pub fn center(&self) -> f32 {
        (self.min_x + self.max_x) / 2.0
    }
}

/// Where a sibling group sits relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    /// Older siblings to the left, younger to the right.
    Center,
    /// Every sibling left of the anchor.
    Left,
    /// Every sibling right of the anchor.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Rows overlap and the horizontal distance is below `gap`.
    pub fn crowds(&self, other: &Rect, gap: f32) -> bool {
        self.y < other.bottom()
            && other.y < self.bottom()
            && self.x < other.right() + gap
            && other.x < self.right() + gap
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSummary {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub placed: usize,
}

impl LayoutSummary {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}
