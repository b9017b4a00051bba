use foundation::GeoBox;
use serde::{Deserialize, Serialize};
use tree::CascadeConfig;
use viewport::ValueFormat;

use crate::coordinator::CheckMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "explorer config parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Map viewport and base map image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Viewport size in pixels.
    pub viewport_height: f64,
    pub viewport_width: f64,
    /// Initial view box; widened to the viewport aspect ratio.
    pub view: GeoBox,
    pub image_url: String,
    /// Geographic extent of the base map image.
    pub image_bounds: GeoBox,
    /// Base map image size in pixels.
    pub image_height: f64,
    pub image_width: f64,
    /// Initial selection rectangle.
    pub selection: GeoBox,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            viewport_height: 160.0,
            viewport_width: 245.0,
            view: GeoBox::new(37.445, -123.046, 36.006, -121.267),
            image_url: "classes/gifs/monterey_big.jpg".to_string(),
            image_bounds: GeoBox::new(38.0, -125.5, 35.0, -119.5),
            image_height: 751.0,
            image_width: 1501.0,
            selection: GeoBox::new(36.989, -122.174, 36.526, -121.762),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderConfig {
    pub min: f64,
    pub max: f64,
    /// Rail width in pixels, handles included.
    pub width: f64,
    pub handle_width: f64,
    /// Page x coordinate of the rail's left edge.
    pub offset: f64,
    #[serde(default)]
    pub format: ValueFormat,
}

impl SliderConfig {
    /// August 2003, UTC.
    pub fn time() -> Self {
        Self {
            min: 1_059_696_000_000.0,
            max: 1_062_374_400_000.0,
            width: 233.0,
            handle_width: 9.0,
            offset: 744.0,
            format: ValueFormat::Timestamp { utc_offset_ms: 0.0 },
        }
    }

    /// 0 to 1000 m.
    pub fn depth() -> Self {
        Self {
            min: 0.0,
            max: 1000.0,
            width: 233.0,
            handle_width: 9.0,
            offset: 991.0,
            format: ValueFormat::Decimal { places: 1 },
        }
    }
}

/// Explorer configuration. Missing fields fall back to the Monterey Bay
/// deployment defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub map: MapConfig,
    pub time_slider: SliderConfig,
    pub depth_slider: SliderConfig,
    /// Tree names prefix element ids and state keys.
    pub variable_tree_name: String,
    pub dataset_tree_name: String,
    pub check_mode: CheckMode,
    pub cascade: CascadeConfig,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            time_slider: SliderConfig::time(),
            depth_slider: SliderConfig::depth(),
            variable_tree_name: "variableTree".to_string(),
            dataset_tree_name: "datasetTree".to_string(),
            check_mode: CheckMode::Any,
            cascade: CascadeConfig::default(),
        }
    }
}

impl ExplorerConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(ExplorerConfig::from_json("{}").unwrap(), ExplorerConfig::default());
    }

    #[test]
    fn partial_override() {
        let cfg = ExplorerConfig::from_json(
            r#"{"check_mode": "all",
                "map": {"viewport_height": 320},
                "depth_slider": {"min": 0, "max": 50, "width": 200, "handle_width": 8, "offset": 0}}"#,
        )
        .unwrap();
        assert_eq!(cfg.check_mode, CheckMode::All);
        assert_eq!(cfg.map.viewport_height, 320.0);
        assert_eq!(cfg.map.viewport_width, 245.0);
        assert_eq!(cfg.depth_slider.max, 50.0);
        assert_eq!(cfg.depth_slider.format, ValueFormat::Decimal { places: 1 });
        assert_eq!(cfg.time_slider, SliderConfig::time());
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(ExplorerConfig::from_json(r#"{"check_mode": "most"}"#).is_err());
    }
}
