//! Serializable read models for renderers and tooling.

use foundation::{GeoBox, NodeId};
use serde::Serialize;
use tree::{CheckState, DisplayState, ElementKind, Tree};
use viewport::{DualSlider, ImagePlacement, MapView, SelectionPixels};

use crate::coordinator::CheckMode;
use crate::timeline::TimelineBar;
use crate::views::ViewOption;

/// Everything a renderer needs to redraw the explorer from scratch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExplorerSnapshot {
    pub enabled: bool,
    pub check_mode: CheckMode,
    pub variables: TreeSnapshot,
    pub datasets: TreeSnapshot,
    pub map: MapSnapshot,
    pub time: SliderSnapshot,
    pub depth: SliderSnapshot,
    pub time_bars: Vec<TimelineBar>,
    pub depth_bars: Vec<TimelineBar>,
    pub view_options: Vec<ViewOption>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeRow {
    pub id: NodeId,
    pub name: String,
    pub depth: usize,
    pub title_element: String,
    pub has_checkbox: bool,
    pub check: CheckState,
    pub grayed: bool,
    pub underlined: bool,
    pub highlighted: bool,
    pub selected: bool,
    pub display: DisplayState,
    pub leaf: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeSnapshot {
    pub name: String,
    pub rows: Vec<NodeRow>,
}

impl TreeSnapshot {
    /// Every non-root node in registry order.
    pub fn of(tree: &Tree) -> Self {
        let selected = tree.selected().map(|n| n.id().clone());
        let rows = tree
            .iter()
            .map(|(idx, n)| {
                let mut depth = 0;
                let mut cur = tree.node(idx).parent();
                while let Some(p) = cur {
                    depth += 1;
                    cur = tree.node(p).parent();
                }
                NodeRow {
                    id: n.id().clone(),
                    name: n.name().to_string(),
                    depth,
                    title_element: tree.element_id(ElementKind::Title, n.id()),
                    has_checkbox: n.has_checkbox(),
                    check: n.check(),
                    grayed: n.is_grayed(),
                    underlined: n.is_underlined(),
                    highlighted: n.is_highlighted(),
                    selected: selected.as_ref() == Some(n.id()),
                    display: n.display(),
                    leaf: n.is_leaf(),
                }
            })
            .collect();
        Self {
            name: tree.name().to_string(),
            rows,
        }
    }

    /// Indented outline, one node per line:
    /// `[x]` checked, `[-]` partial, `[ ]` unchecked; `~` grayed, `_`
    /// underlined, `*` highlighted.
    pub fn to_outline(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let box_ = match (row.has_checkbox, row.check) {
                (false, _) => "   ",
                (true, CheckState::Checked) => "[x]",
                (true, CheckState::Indeterminate) => "[-]",
                (true, CheckState::Unchecked) => "[ ]",
            };
            let marks: String = [(row.grayed, '~'), (row.underlined, '_'), (row.highlighted, '*')]
                .iter()
                .filter(|(on, _)| *on)
                .map(|(_, c)| *c)
                .collect();
            out.push_str(&format!(
                "{:indent$}{box_} {} ({}) {marks}\n",
                "",
                row.name,
                row.id,
                indent = (row.depth - 1) * 2
            ));
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapSnapshot {
    pub viewport_height: f64,
    pub viewport_width: f64,
    pub view: Option<GeoBox>,
    pub selection: Option<GeoBox>,
    pub selection_text: Option<GeoBox>,
    pub map: Option<ImagePlacement>,
    pub overlay: ImagePlacement,
    pub overlay_busy: bool,
    pub selection_pixels: Option<SelectionPixels>,
}

impl MapSnapshot {
    pub fn of(map: &MapView) -> Self {
        let (viewport_height, viewport_width) = map.viewport_size();
        Self {
            viewport_height,
            viewport_width,
            view: map.view(),
            selection: map.selection(),
            selection_text: map.selection_text(),
            map: map.map_placement(),
            overlay: map.overlay_placement(),
            overlay_busy: map.overlay_busy(),
            selection_pixels: map.selection_pixels(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SliderSnapshot {
    pub min: f64,
    pub max: f64,
    pub start: f64,
    pub end: f64,
    pub left: f64,
    pub right: f64,
    pub min_text: String,
    pub max_text: String,
    pub start_text: String,
    pub end_text: String,
}

impl SliderSnapshot {
    pub fn of(slider: &DualSlider) -> Self {
        let (left, right) = slider.handles();
        Self {
            min: slider.min(),
            max: slider.max(),
            start: slider.start(),
            end: slider.end(),
            left,
            right,
            min_text: slider.min_text(),
            max_text: slider.max_text(),
            start_text: slider.start_text(),
            end_text: slider.end_text(),
        }
    }
}
