use crate::context::{DepthSettings, LayoutContext};
use crate::ir::PersonId;
use crate::layout::{Connector, LayoutSummary};
use crate::TreeLayout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub root: PersonId,
    pub settings: DepthSettings,
    pub bounds: LayoutSummary,
    pub leaves: Vec<LeafDump>,
    pub chunks: Vec<ChunkDump>,
    pub connectors: Vec<Connector>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafDump {
    pub code: String,
    pub full_code: String,
    pub person_id: PersonId,
    pub chunk: String,
    pub degree: usize,
    pub visible: bool,
    pub co_parent_id: Option<PersonId>,
    pub x: Option<f32>,
    pub y: Option<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkDump {
    pub id: String,
    pub visible: bool,
    pub codes: Vec<String>,
}

impl LayoutDump {
    pub fn from_layout(ctx: &LayoutContext, layout: &TreeLayout) -> Self {
        let leaves = ctx
            .leaves
            .iter()
            .map(|leaf| LeafDump {
                code: leaf.code.to_string(),
                full_code: leaf.full_code(),
                person_id: leaf.person_id.clone(),
                chunk: leaf.chunk.to_string(),
                degree: leaf.degree,
                visible: ctx.is_visible(leaf),
                co_parent_id: leaf.co_parent_id.clone(),
                x: leaf.x,
                y: leaf.y,
            })
            .collect();

        let chunks = ctx
            .chunks
            .iter()
            .filter(|chunk| !chunk.codes.is_empty())
            .map(|chunk| ChunkDump {
                id: chunk.id.to_string(),
                visible: ctx.is_chunk_visible(&chunk.id),
                codes: chunk.codes.iter().map(|code| code.to_string()).collect(),
            })
            .collect();

        LayoutDump {
            root: ctx.root().clone(),
            settings: ctx.settings,
            bounds: layout.summary,
            leaves,
            chunks,
            connectors: layout.connectors.clone(),
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn write_layout_dump(path: &Path, ctx: &LayoutContext, layout: &TreeLayout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(ctx, layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
