use crate::context::DepthSettings;
use crate::tree::{ChunkPolicy, ParentPartnerChunk};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Footprint of one person box, including its inset.
    pub box_width: f32,
    pub box_height: f32,
    /// Blank border inside the footprint; connectors attach to the drawn box.
    pub box_inset: f32,
    /// Vertical space between two rows of footprints.
    pub generation_gap: f32,
    pub partner_margin: f32,
    pub sibling_margin: f32,
    pub child_margin: f32,
    /// Minimum horizontal clearance between packed ancestor clusters.
    pub cluster_gap: f32,
    /// How far above a partner its parents are drawn.
    pub in_law_offset: f32,
    pub marriage_bar_gap: f32,
    pub marriage_bar_stack_step: f32,
    pub atc_step: f32,
    pub atc_max_attempts: usize,
    /// Upper bound applied to every depth counter.
    pub max_generations: u8,
    pub chunk_policy: ChunkPolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let box_height = 70.0;
        let generation_gap = 60.0;
        Self {
            box_width: 180.0,
            box_height,
            box_inset: 10.0,
            generation_gap,
            partner_margin: 0.0,
            sibling_margin: 0.0,
            child_margin: 0.0,
            cluster_gap: 20.0,
            in_law_offset: box_height + generation_gap,
            marriage_bar_gap: 6.0,
            marriage_bar_stack_step: 4.0,
            atc_step: 6.0,
            atc_max_attempts: 5,
            max_generations: 7,
            chunk_policy: ChunkPolicy::default(),
        }
    }
}

impl LayoutConfig {
    pub fn row_step(&self) -> f32 {
        self.box_height + self.generation_gap
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub depth: DepthSettings,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    box_width: Option<f32>,
    box_height: Option<f32>,
    box_inset: Option<f32>,
    generation_gap: Option<f32>,
    partner_margin: Option<f32>,
    sibling_margin: Option<f32>,
    child_margin: Option<f32>,
    cluster_gap: Option<f32>,
    in_law_offset: Option<f32>,
    marriage_bar_gap: Option<f32>,
    marriage_bar_stack_step: Option<f32>,
    atc_step: Option<f32>,
    atc_max_attempts: Option<usize>,
    max_generations: Option<u8>,
    parent_partner_chunk: Option<ParentPartnerChunk>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct DepthConfigFile {
    ancestors: Option<u8>,
    descendants: Option<u8>,
    cousins: Option<u8>,
    in_laws: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    layout: Option<LayoutConfigFile>,
    depth: Option<DepthConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(layout) = parsed.layout {
        let row_step_changed = layout.box_height.is_some() || layout.generation_gap.is_some();
        let target = &mut config.layout;
        if let Some(v) = layout.box_width {
            target.box_width = v;
        }
        if let Some(v) = layout.box_height {
            target.box_height = v;
        }
        if let Some(v) = layout.box_inset {
            target.box_inset = v;
        }
        if let Some(v) = layout.generation_gap {
            target.generation_gap = v;
        }
        if let Some(v) = layout.partner_margin {
            target.partner_margin = v;
        }
        if let Some(v) = layout.sibling_margin {
            target.sibling_margin = v;
        }
        if let Some(v) = layout.child_margin {
            target.child_margin = v;
        }
        if let Some(v) = layout.cluster_gap {
            target.cluster_gap = v;
        }
        match layout.in_law_offset {
            Some(v) => target.in_law_offset = v,
            // Keep in-laws one row up when only the row geometry changed.
            None if row_step_changed => target.in_law_offset = target.row_step(),
            None => {}
        }
        if let Some(v) = layout.marriage_bar_gap {
            target.marriage_bar_gap = v;
        }
        if let Some(v) = layout.marriage_bar_stack_step {
            target.marriage_bar_stack_step = v;
        }
        if let Some(v) = layout.atc_step {
            target.atc_step = v;
        }
        if let Some(v) = layout.atc_max_attempts {
            target.atc_max_attempts = v;
        }
        if let Some(v) = layout.max_generations {
            target.max_generations = v;
        }
        if let Some(v) = layout.parent_partner_chunk {
            target.chunk_policy.parent_partners = v;
        }
    }

    if let Some(depth) = parsed.depth {
        if let Some(v) = depth.ancestors {
            config.depth.ancestors = v;
        }
        if let Some(v) = depth.descendants {
            config.depth.descendants = v;
        }
        if let Some(v) = depth.cousins {
            config.depth.cousins = v;
        }
        if let Some(v) = depth.in_laws {
            config.depth.in_laws = v;
        }
    }
    config.depth = config.depth.clamped(config.layout.max_generations);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_in_laws_one_row_up() {
        let config = LayoutConfig::default();
        assert_eq!(config.row_step(), 130.0);
        assert_eq!(config.in_law_offset, config.row_step());
    }

    #[test]
    fn file_fields_override_defaults() {
        let config = parse_config(
            r#"{
                "layout": { "boxWidth": 120, "generationGap": 40, "parentPartnerChunk": "ancestorCousins" },
                "depth": { "ancestors": 3, "inLaws": true }
            }"#,
        )
        .unwrap();
        assert_eq!(config.layout.box_width, 120.0);
        assert_eq!(config.layout.box_height, 70.0);
        assert_eq!(config.layout.in_law_offset, 110.0);
        assert_eq!(
            config.layout.chunk_policy.parent_partners,
            ParentPartnerChunk::AncestorCousins
        );
        assert_eq!(config.depth.ancestors, 3);
        assert_eq!(config.depth.descendants, 0);
        assert!(config.depth.in_laws);
    }

    #[test]
    fn depth_is_clamped_to_max_generations() {
        let config =
            parse_config(r#"{ "layout": { "maxGenerations": 4 }, "depth": { "cousins": 9 } }"#)
                .unwrap();
        assert_eq!(config.depth.cousins, 4);
    }

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.atc_max_attempts, 5);
        assert_eq!(config.depth, DepthSettings::default());
    }
}
