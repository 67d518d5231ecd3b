use kintree::config::parse_config;
use kintree::layout_dump::LayoutDump;
use kintree::{Config, LayoutContext, PersonId, layout_tree, parse_person_graph};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeLayoutOptions {
    ancestors: Option<u8>,
    descendants: Option<u8>,
    cousins: Option<u8>,
    in_laws: Option<bool>,
    /// Same shape as the CLI config file.
    config: Option<serde_json::Value>,
}

fn build_config(options: &TreeLayoutOptions) -> Result<Config, String> {
    let mut config = match &options.config {
        Some(raw) => parse_config(&raw.to_string()).map_err(|error| error.to_string())?,
        None => Config::default(),
    };
    if let Some(v) = options.ancestors {
        config.depth.ancestors = v;
    }
    if let Some(v) = options.descendants {
        config.depth.descendants = v;
    }
    if let Some(v) = options.cousins {
        config.depth.cousins = v;
    }
    if let Some(v) = options.in_laws {
        config.depth.in_laws = v;
    }
    Ok(config)
}

fn layout_to_json(people_json: &str, root: &str, options: TreeLayoutOptions) -> Result<String, String> {
    let config = build_config(&options)?;
    let graph = parse_person_graph(people_json).map_err(|error| error.to_string())?;
    let root = PersonId::new(root);
    if !graph.contains(&root) {
        return Err(format!("root person {root} not found"));
    }
    let settings = config.depth.clamped(config.layout.max_generations);
    let mut ctx = LayoutContext::with_settings(root, settings);
    let layout = layout_tree(&graph, &mut ctx, &config.layout);
    LayoutDump::from_layout(&ctx, &layout)
        .to_json()
        .map_err(|error| error.to_string())
}

#[wasm_bindgen]
pub fn layout_family_tree(people_json: &str, root: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<TreeLayoutOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        TreeLayoutOptions::default()
    };
    layout_to_json(people_json, root, options).map_err(|error| JsValue::from_str(&error))
}

#[cfg(test)]
mod tests {
    use crate::{TreeLayoutOptions, layout_to_json};

    #[test]
    fn lays_out_parents_from_json() {
        let people = r#"[
            { "id": 1, "gender": "male", "father": 2, "mother": 3 },
            { "id": 2, "gender": "male" },
            { "id": 3, "gender": "female" }
        ]"#;
        let options = TreeLayoutOptions {
            ancestors: Some(1),
            ..Default::default()
        };
        let json = layout_to_json(people, "1", options).expect("small pedigree should lay out");
        let dump: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(dump["leaves"].as_array().unwrap().len(), 3);
        assert!(json.contains("\"A0RF\""));
    }

    #[test]
    fn unknown_root_is_an_error() {
        let err = layout_to_json("[]", "9", TreeLayoutOptions::default()).unwrap_err();
        assert!(err.contains("not found"));
    }
}
