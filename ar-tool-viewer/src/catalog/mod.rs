//! Tool catalog supplied to the viewer as a static JSON asset.
//!
//! The catalog is read-only to the rest of the crate: selection, loading and
//! the RPC bridge only look records up by id or position.

use std::collections::HashSet;
use std::fmt;

use bevy::asset::LoadState as AssetLoadState;
use bevy::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::selection::{SelectionSource, ToolSelectionEvent};
use crate::engine::core::config::ViewerConfig;
use crate::errors::CatalogError;

/// Catalog identifier, stored stringified so `1` and `"1"` address the same tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ToolId(String);

impl ToolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ToolId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(number) => ToolId(number_text(&number)),
            RawId::Text(text) => ToolId(text),
        })
    }
}

/// Renders a JSON number the way a browser prints it, so `1.0` and `1`
/// address the same tool.
fn number_text(number: &serde_json::Number) -> String {
    match number.as_f64() {
        Some(value) if number.is_f64() && value == 0.0 => "0".to_owned(),
        Some(value) if number.is_f64() => value.to_string(),
        _ => number.to_string(),
    }
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRecord {
    pub id: ToolId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
}

impl ToolRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, model_path: Option<&str>) -> Self {
        Self {
            id: ToolId::new(id),
            title: title.into(),
            model_path: model_path.map(str::to_owned),
        }
    }

    /// Configured model path. Blank paths count as "no asset configured".
    pub fn model_path(&self) -> Option<&str> {
        self.model_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }
}

/// Ordered tool list, loaded from `data/tools.catalog.json`.
#[derive(Asset, TypePath, Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCatalog {
    pub tools: Vec<ToolRecord>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<ToolRecord>) -> Self {
        Self { tools }
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(json).map_err(|e| CatalogError::Malformed(e.to_string()))
    }

    pub fn tools(&self) -> &[ToolRecord] {
        &self.tools
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn first(&self) -> Option<&ToolRecord> {
        self.tools.first()
    }

    pub fn nth(&self, index: usize) -> Option<&ToolRecord> {
        self.tools.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&ToolRecord> {
        self.tools.iter().find(|tool| tool.id.as_str() == id)
    }

    /// Resolve an id coming from the presentation layer.
    pub fn resolve(&self, id: &str) -> Result<&ToolRecord, CatalogError> {
        self.find(id)
            .ok_or_else(|| CatalogError::UnknownTool(id.to_owned()))
    }

    /// Ids are trusted to be unique; this only reports the first violation.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.id.as_str()) {
                return Err(CatalogError::DuplicateId(tool.id.to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Resource, Default)]
pub struct CatalogLoader {
    handle: Option<Handle<ToolCatalog>>,
    resolved: bool,
}

impl CatalogLoader {
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

pub fn start_catalog_load(
    mut loader: ResMut<CatalogLoader>,
    asset_server: Res<AssetServer>,
    config: Res<ViewerConfig>,
) {
    info!(path = %config.catalog_path, "Loading tool catalog");
    loader.handle = Some(asset_server.load(config.catalog_path.clone()));
}

/// Promote the loaded catalog asset to a resource and make the initial selection.
pub fn load_catalog_system(
    mut loader: ResMut<CatalogLoader>,
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    catalogs: Res<Assets<ToolCatalog>>,
    config: Res<ViewerConfig>,
    mut selections: EventWriter<ToolSelectionEvent>,
) {
    if loader.resolved {
        return;
    }
    let Some(handle) = loader.handle.clone() else {
        return;
    };

    let catalog = match asset_server.get_load_state(&handle) {
        Some(AssetLoadState::Loaded) => match catalogs.get(&handle) {
            Some(catalog) => catalog.clone(),
            None => return,
        },
        Some(AssetLoadState::Failed(err)) => {
            error!(path = %config.catalog_path, "Tool catalog failed to load: {err}");
            ToolCatalog::default()
        }
        _ => return,
    };

    loader.resolved = true;
    if let Err(err) = catalog.validate() {
        error!("{err}");
    }
    info!(tools = catalog.tools().len(), "Tool catalog ready");

    if config.auto_select_first {
        if let Some(first) = catalog.first() {
            selections.write(ToolSelectionEvent {
                tool: first.clone(),
                source: SelectionSource::Startup,
            });
        }
    }
    commands.insert_resource(catalog);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "tools": [
            { "id": 1, "title": "Hammer", "modelPath": "models/hammer.glb" },
            { "id": "2", "title": "Wrench" },
            { "id": 3, "title": "Chisel", "modelPath": "  " }
        ]
    }"#;

    #[test]
    fn numeric_and_string_ids_are_stringified() {
        let catalog = ToolCatalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(catalog.find("1").unwrap().title, "Hammer");
        assert_eq!(catalog.find("2").unwrap().title, "Wrench");
        assert!(catalog.find("4").is_none());
    }

    #[test]
    fn integral_float_ids_match_their_integer_form() {
        let id = |json: &str| serde_json::from_str::<ToolId>(json).unwrap();
        assert_eq!(id("1.0"), ToolId::new("1"));
        assert_eq!(id("-0.0"), ToolId::new("0"));
        assert_eq!(id("2.5"), ToolId::new("2.5"));
        assert_eq!(id("12"), ToolId::new("12"));

        let catalog =
            ToolCatalog::from_json_str(r#"{ "tools": [{ "id": 1.0, "title": "Hammer" }] }"#)
                .unwrap();
        assert_eq!(catalog.find("1").unwrap().title, "Hammer");
    }

    #[test]
    fn missing_and_blank_model_paths_are_absent() {
        let catalog = ToolCatalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(catalog.nth(0).unwrap().model_path(), Some("models/hammer.glb"));
        assert_eq!(catalog.nth(1).unwrap().model_path(), None);
        assert_eq!(catalog.nth(2).unwrap().model_path(), None);
    }

    #[test]
    fn resolve_rejects_unknown_ids() {
        let catalog = ToolCatalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(
            catalog.resolve("99").unwrap_err(),
            CatalogError::UnknownTool("99".into())
        );
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let catalog = ToolCatalog::new(vec![
            ToolRecord::new("1", "Hammer", None),
            ToolRecord::new("1", "Mallet", None),
        ]);
        assert_eq!(
            catalog.validate().unwrap_err(),
            CatalogError::DuplicateId("1".into())
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            ToolCatalog::from_json_str("{ \"tools\": 3 }"),
            Err(CatalogError::Malformed(_))
        ));
    }
}
