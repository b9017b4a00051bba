use std::collections::BTreeSet;

use foundation::NodeId;
use persist::{StateStore, state_key};
use runtime::{Event, EventBus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tree::{Tree, TreeError, TreeSpec};
use viewport::{
    DualSlider, ImagePlacement, MapDragSource, MapError, MapView, SliderCommit, SliderHandle,
};

use crate::config::{ConfigError, ExplorerConfig, SliderConfig};
use crate::coordinator::{CheckMode, Coordinator, TreeSide};
use crate::filter::RangeQuery;
use crate::links::LinkTable;
use crate::overlay::OverlayRequest;
use crate::snapshot::{ExplorerSnapshot, MapSnapshot, SliderSnapshot, TreeSnapshot};
use crate::timeline::{Axis, TimelineBar, timeline_bars};
use crate::views::{ViewOption, ViewsQuery, parse_views_response};

#[derive(Debug)]
pub enum ExplorerError {
    Tree(TreeError),
    Map(MapError),
    Config(ConfigError),
}

impl std::fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExplorerError::Tree(e) => write!(f, "tree: {e}"),
            ExplorerError::Map(e) => write!(f, "map: {e}"),
            ExplorerError::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for ExplorerError {}

impl From<TreeError> for ExplorerError {
    fn from(e: TreeError) -> Self {
        ExplorerError::Tree(e)
    }
}

impl From<MapError> for ExplorerError {
    fn from(e: MapError) -> Self {
        ExplorerError::Map(e)
    }
}

impl From<ConfigError> for ExplorerError {
    fn from(e: ConfigError) -> Self {
        ExplorerError::Config(e)
    }
}

/// User and collaborator inputs, dispatched run-to-completion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    ToggleCheck { side: TreeSide, id: NodeId },
    SelectNode { side: TreeSide, id: NodeId },
    ToggleOpen { side: TreeSide, id: NodeId },
    MapPointerDown { source: MapDragSource, x: f64, y: f64 },
    MapPointerMove { x: f64, y: f64 },
    MapPointerUp,
    ZoomInMap,
    ZoomOutMap,
    SetSelection { north: f64, west: f64, south: f64, east: f64 },
    SliderPointerDown { slider: Axis, handle: SliderHandle, x: f64 },
    SliderPointerMove { slider: Axis, x: f64 },
    SliderPointerUp { slider: Axis },
    RailClick { slider: Axis, x: f64 },
    SetSliderStart { slider: Axis, value: f64 },
    SetSliderEnd { slider: Axis, value: f64 },
    SetSliderStartText { slider: Axis, text: String },
    SetSliderEndText { slider: Axis, text: String },
    SetSliderLimits { slider: Axis, min: f64, max: f64 },
    ZoomInSlider { slider: Axis },
    ZoomOutSlider { slider: Axis },
    SetCheckMode { mode: CheckMode },
    /// The overlay image finished loading or failed.
    OverlayLoaded,
    /// Body of a views query answer, verbatim.
    ViewsResponse { text: String },
}

/// Outputs for the renderer and the network glue.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExplorerEvent {
    TreeChanged { side: TreeSide },
    MapChanged,
    OverlayRefresh(OverlayRequest),
    OverlayPlaced { placement: ImagePlacement },
    SliderMoved { slider: Axis },
    SliderChanged { slider: Axis, commit: SliderCommit },
    TimelinesChanged { axis: Axis },
    ViewsQuery(ViewsQuery),
    DataSliceCleared,
    ViewOptions { options: Vec<ViewOption> },
}

/// Application context: both trees, the map, the sliders and the
/// coordinator that keeps them consistent.
pub struct Explorer {
    config: ExplorerConfig,
    variables: Tree,
    datasets: Tree,
    coordinator: Coordinator,
    map: MapView,
    time: DualSlider,
    depth: DualSlider,
    store: Box<dyn StateStore>,
    page: String,
    events: EventBus<ExplorerEvent>,
    overlay_nonce: u64,
    time_bars: Vec<TimelineBar>,
    depth_bars: Vec<TimelineBar>,
    view_options: Vec<ViewOption>,
}

fn slider(cfg: &SliderConfig) -> DualSlider {
    DualSlider::new(cfg.min, cfg.max, cfg.width, cfg.handle_width, cfg.offset, cfg.format)
}

impl Explorer {
    /// Builds both trees, places the map and restores persisted tree state
    /// for `page`. Coordination stays off until [`Explorer::enable`].
    pub fn new(
        config: ExplorerConfig,
        variable_spec: &TreeSpec,
        dataset_spec: &TreeSpec,
        store: Box<dyn StateStore>,
        page: impl Into<String>,
    ) -> Result<Self, ExplorerError> {
        let variables = Tree::build(config.variable_tree_name.clone(), variable_spec, config.cascade)?;
        let datasets = Tree::build(config.dataset_tree_name.clone(), dataset_spec, config.cascade)?;
        let coordinator = Coordinator::new(LinkTable::build(&variables, &datasets), config.check_mode);

        let m = &config.map;
        let mut map = MapView::new(m.viewport_height, m.viewport_width);
        map.set_view(m.view.north, m.view.west, m.view.south, m.view.east);
        let b = m.image_bounds;
        map.set_map(m.image_url.clone(), b.north, b.west, b.south, b.east, m.image_height, m.image_width)?;
        let s = m.selection;
        map.set_selection(s.north, s.west, s.south, s.east)?;

        let time = slider(&config.time_slider);
        let depth = slider(&config.depth_slider);
        let mut explorer = Explorer {
            config,
            variables,
            datasets,
            coordinator,
            map,
            time,
            depth,
            store,
            page: page.into(),
            events: EventBus::new(),
            overlay_nonce: 0,
            time_bars: Vec::new(),
            depth_bars: Vec::new(),
            view_options: Vec::new(),
        };
        explorer.restore(TreeSide::Variables);
        explorer.restore(TreeSide::Datasets);
        explorer.time_bars = timeline_bars(&explorer.datasets, Axis::Time, &explorer.time);
        explorer.depth_bars = timeline_bars(&explorer.datasets, Axis::Depth, &explorer.depth);
        info!(
            variables = explorer.variables.len(),
            datasets = explorer.datasets.len(),
            links = explorer.coordinator.links().len(),
            "explorer ready"
        );
        Ok(explorer)
    }

    /// Turns coordination on and brings both trees and the overlay in line
    /// with the restored state.
    pub fn enable(&mut self) {
        if self.coordinator.is_enabled() {
            return;
        }
        self.coordinator.enable();
        self.resync_gray();
        self.range_check(true);
        self.update_data_slice();
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn tree(&self, side: TreeSide) -> &Tree {
        match side {
            TreeSide::Variables => &self.variables,
            TreeSide::Datasets => &self.datasets,
        }
    }

    fn tree_mut(&mut self, side: TreeSide) -> &mut Tree {
        match side {
            TreeSide::Variables => &mut self.variables,
            TreeSide::Datasets => &mut self.datasets,
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn map(&self) -> &MapView {
        &self.map
    }

    pub fn slider(&self, axis: Axis) -> &DualSlider {
        match axis {
            Axis::Time => &self.time,
            Axis::Depth => &self.depth,
        }
    }

    fn slider_mut(&mut self, axis: Axis) -> &mut DualSlider {
        match axis {
            Axis::Time => &mut self.time,
            Axis::Depth => &mut self.depth,
        }
    }

    pub fn timeline_bars(&self, axis: Axis) -> &[TimelineBar] {
        match axis {
            Axis::Time => &self.time_bars,
            Axis::Depth => &self.depth_bars,
        }
    }

    pub fn view_options(&self) -> &[ViewOption] {
        &self.view_options
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    pub fn events(&self) -> &[Event<ExplorerEvent>] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event<ExplorerEvent>> {
        self.events.drain()
    }

    pub fn snapshot(&self) -> ExplorerSnapshot {
        ExplorerSnapshot {
            enabled: self.coordinator.is_enabled(),
            check_mode: self.coordinator.mode(),
            variables: TreeSnapshot::of(&self.variables),
            datasets: TreeSnapshot::of(&self.datasets),
            map: MapSnapshot::of(&self.map),
            time: SliderSnapshot::of(&self.time),
            depth: SliderSnapshot::of(&self.depth),
            time_bars: self.time_bars.clone(),
            depth_bars: self.depth_bars.clone(),
            view_options: self.view_options.clone(),
        }
    }

    // ── Dispatch ────────────────────────────────────────────────────────

    pub fn dispatch(&mut self, input: Input) {
        debug!(?input, "dispatch");
        match input {
            Input::ToggleCheck { side, id } => self.toggle_check(side, &id),
            Input::SelectNode { side, id } => self.select_node(side, &id),
            Input::ToggleOpen { side, id } => {
                if self.tree_mut(side).toggle_open(&id).is_some() {
                    self.persist(side);
                    self.events.emit(ExplorerEvent::TreeChanged { side });
                }
            }
            Input::MapPointerDown { source, x, y } => {
                self.map.pointer_down(source, [x, y]);
            }
            Input::MapPointerMove { x, y } => {
                if self.map.pointer_move([x, y]) {
                    self.events.emit(ExplorerEvent::MapChanged);
                }
            }
            Input::MapPointerUp => {
                if let Some(release) = self.map.pointer_up() {
                    self.events.emit(ExplorerEvent::MapChanged);
                    self.range_check(release.was_view);
                }
            }
            Input::ZoomInMap => self.zoom_map(true),
            Input::ZoomOutMap => self.zoom_map(false),
            Input::SetSelection {
                north,
                west,
                south,
                east,
            } => match self.map.set_selection(north, west, south, east) {
                Ok(_) => {
                    self.events.emit(ExplorerEvent::MapChanged);
                    self.range_check(false);
                }
                Err(e) => debug!(error = %e, "selection ignored"),
            },
            Input::SliderPointerDown { slider, handle, x } => {
                self.slider_mut(slider).pointer_down(handle, x);
            }
            Input::SliderPointerMove { slider, x } => {
                if self.slider_mut(slider).pointer_move(x) {
                    self.events.emit(ExplorerEvent::SliderMoved { slider });
                }
            }
            Input::SliderPointerUp { slider } => {
                if let Some(commit) = self.slider_mut(slider).pointer_up() {
                    self.slider_committed(slider, commit);
                }
            }
            Input::RailClick { slider, x } => {
                let commit = self.slider_mut(slider).rail_click(x);
                self.slider_committed(slider, commit);
            }
            Input::SetSliderStart { slider, value } => {
                let commit = self.slider_mut(slider).set_start(value);
                self.slider_committed(slider, commit);
            }
            Input::SetSliderEnd { slider, value } => {
                let commit = self.slider_mut(slider).set_end(value);
                self.slider_committed(slider, commit);
            }
            Input::SetSliderStartText { slider, text } => {
                match self.slider_mut(slider).set_start_text(&text) {
                    Some(commit) => self.slider_committed(slider, commit),
                    None => debug!(?slider, %text, "unparsable slider start"),
                }
            }
            Input::SetSliderEndText { slider, text } => {
                match self.slider_mut(slider).set_end_text(&text) {
                    Some(commit) => self.slider_committed(slider, commit),
                    None => debug!(?slider, %text, "unparsable slider end"),
                }
            }
            Input::SetSliderLimits { slider, min, max } => {
                let commit = self.slider_mut(slider).set_limits(min, max);
                self.slider_committed(slider, commit);
            }
            Input::ZoomInSlider { slider } => {
                let commit = self.slider_mut(slider).zoom_in();
                self.slider_committed(slider, commit);
            }
            Input::ZoomOutSlider { slider } => {
                let commit = self.slider_mut(slider).zoom_out();
                self.slider_committed(slider, commit);
            }
            Input::SetCheckMode { mode } => {
                self.coordinator.set_mode(mode);
                if self.coordinator.is_enabled() {
                    self.resync_gray();
                }
            }
            Input::OverlayLoaded => {
                let placement = self.map.overlay_loaded();
                self.events.emit(ExplorerEvent::OverlayPlaced { placement });
            }
            Input::ViewsResponse { text } => self.apply_views_response(&text),
        }
    }

    /// Replaces the data-slice options with the answer to a views query.
    /// Malformed answers clear them.
    pub fn apply_views_response(&mut self, text: &str) {
        self.view_options = parse_views_response(text);
        self.events.emit(ExplorerEvent::ViewOptions {
            options: self.view_options.clone(),
        });
    }

    // ── Handlers ────────────────────────────────────────────────────────

    fn toggle_check(&mut self, side: TreeSide, id: &NodeId) {
        if self.tree_mut(side).toggle_check(id).is_none() {
            return;
        }
        self.persist(side);
        self.events.emit(ExplorerEvent::TreeChanged { side });
        if !self.coordinator.is_enabled() {
            return;
        }
        self.update_data_slice();
        self.sync_gray(side);
        if side == TreeSide::Datasets {
            self.refresh_overlay();
        }
    }

    fn select_node(&mut self, side: TreeSide, id: &NodeId) {
        if !self.tree_mut(side).select(id) {
            return;
        }
        self.events.emit(ExplorerEvent::TreeChanged { side });
        if !self.coordinator.is_enabled() {
            return;
        }
        let (source, partner) = match side {
            TreeSide::Variables => (&mut self.variables, &mut self.datasets),
            TreeSide::Datasets => (&mut self.datasets, &mut self.variables),
        };
        self.coordinator.highlight_partners(side, id, source, partner);
        self.events.emit(ExplorerEvent::TreeChanged { side: side.partner() });
        if side == TreeSide::Datasets {
            self.refresh_overlay();
        }
    }

    /// Grays the partner of `side` from the checked nodes of `side`.
    fn sync_gray(&mut self, side: TreeSide) {
        let (source, partner) = match side {
            TreeSide::Variables => (&self.variables, &mut self.datasets),
            TreeSide::Datasets => (&self.datasets, &mut self.variables),
        };
        self.coordinator.sync_gray(side, source, partner);
        self.events.emit(ExplorerEvent::TreeChanged { side: side.partner() });
    }

    // A side with nothing checked leaves its partner alone.
    fn resync_gray(&mut self) {
        for side in [TreeSide::Variables, TreeSide::Datasets] {
            if !self.tree(side).checked_ids().is_empty() {
                self.sync_gray(side);
            }
        }
    }

    fn zoom_map(&mut self, zoom_in: bool) {
        let zoomed = if zoom_in {
            self.map.zoom_in()
        } else {
            self.map.zoom_out()
        };
        match zoomed {
            Ok(_) => {
                self.events.emit(ExplorerEvent::MapChanged);
                self.events.emit(ExplorerEvent::OverlayPlaced {
                    placement: self.map.overlay_placement(),
                });
                self.range_check(true);
            }
            Err(e) => debug!(error = %e, "zoom ignored"),
        }
    }

    fn slider_committed(&mut self, slider: Axis, commit: SliderCommit) {
        self.events.emit(ExplorerEvent::SliderChanged { slider, commit });
        if commit.limits_changed {
            let bars = timeline_bars(&self.datasets, slider, self.slider(slider));
            match slider {
                Axis::Time => self.time_bars = bars,
                Axis::Depth => self.depth_bars = bars,
            }
            self.events.emit(ExplorerEvent::TimelinesChanged { axis: slider });
        }
        self.range_check(true);
    }

    /// Re-underlines both trees against the view box and the slider
    /// ranges.
    fn range_check(&mut self, refresh_overlay: bool) {
        if !self.coordinator.is_enabled() {
            return;
        }
        let Some(area) = self.map.view() else {
            return;
        };
        let query = RangeQuery {
            area,
            time: self.time.selection(),
            depth: self.depth.selection(),
        };
        self.coordinator
            .sync_underline(&mut self.variables, &mut self.datasets, &query);
        self.events.emit(ExplorerEvent::TreeChanged {
            side: TreeSide::Variables,
        });
        self.events.emit(ExplorerEvent::TreeChanged {
            side: TreeSide::Datasets,
        });
        if refresh_overlay {
            self.refresh_overlay();
        }
    }

    fn refresh_overlay(&mut self) {
        let Some(view) = self.map.view() else {
            return;
        };
        self.overlay_nonce += 1;
        let datasets = self
            .datasets
            .iter()
            .filter(|(_, n)| n.has_checkbox() && n.check().is_checked())
            .filter_map(|(_, n)| n.catalog_key().map(str::to_string))
            .collect();
        let highlight = self
            .datasets
            .selected()
            .and_then(|n| n.catalog_key())
            .map(str::to_string)
            .into_iter()
            .collect();
        let (height, width) = self.map.viewport_size();
        let request = OverlayRequest {
            datasets,
            highlight,
            time: self.time.selection(),
            depth: self.depth.selection(),
            view,
            height,
            width,
            nonce: self.overlay_nonce,
        };
        self.map.overlay_requested();
        self.events.emit(ExplorerEvent::OverlayRefresh(request));
    }

    /// Asks for data-slice options when every checked pair belongs to one
    /// dataset; clears them otherwise.
    fn update_data_slice(&mut self) {
        let pairs = self.coordinator.checked_pairs(&self.variables, &self.datasets);
        let datasets: BTreeSet<&NodeId> = pairs.iter().map(|p| &p.dataset).collect();
        if datasets.len() == 1 {
            let ids = pairs.iter().map(|p| p.query_id.to_string()).collect();
            self.events.emit(ExplorerEvent::ViewsQuery(ViewsQuery::new(ids)));
        } else {
            self.view_options.clear();
            self.events.emit(ExplorerEvent::DataSliceCleared);
        }
    }

    // ── Persistence ─────────────────────────────────────────────────────

    fn state_key(&self, side: TreeSide) -> String {
        state_key(self.tree(side).name(), &self.page)
    }

    fn restore(&mut self, side: TreeSide) {
        let key = self.state_key(side);
        let text = match self.store.load(&key) {
            Ok(Some(text)) => text,
            Ok(None) => return,
            Err(e) => {
                warn!(%key, error = %e, "tree state unavailable");
                return;
            }
        };
        match self.tree_mut(side).restore_state(&text) {
            Ok(applied) => debug!(%key, applied, "tree state restored"),
            Err(e) => warn!(%key, error = %e, "discarding unreadable tree state"),
        }
    }

    fn persist(&mut self, side: TreeSide) {
        let key = self.state_key(side);
        let blob = match self.tree(side).serialize_state() {
            Ok(blob) => blob,
            Err(e) => {
                warn!(%key, error = %e, "tree state not serializable");
                return;
            }
        };
        if let Err(e) = self.store.save(&key, &blob) {
            warn!(%key, error = %e, "tree state not saved");
        }
    }
}
