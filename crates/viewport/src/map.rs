//! Geographic map viewport.
//!
//! Converts between a geographic view box, a north-up base map image and
//! viewport pixels. North is pixel row 0 growing downward; west is pixel
//! column 0 growing rightward. Every conversion is a single-axis affine map;
//! only the scaled image size is rounded.

use foundation::GeoBox;
use runtime::DragSession;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Width of the frame drawn around the viewport, in pixels.
pub const BORDER_PX: f64 = 1.0;

/// Smallest span, in degrees, a view box is widened to.
pub const MIN_SPAN_DEG: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    ViewNotSet,
    MapNotSet,
    SelectionNotSet,
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::ViewNotSet => write!(f, "map view has not been set"),
            MapError::MapNotSet => write!(f, "base map image has not been set"),
            MapError::SelectionNotSet => write!(f, "selection has not been set"),
        }
    }
}

impl std::error::Error for MapError {}

/// CSS `rect(top, right, bottom, left)` clip, in element-local pixels.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Clip {
    /// Clip that shows only the part of an element at `(top, left)` lying
    /// inside a `height x width` viewport framed by the border.
    pub fn to_viewport(top: f64, left: f64, height: f64, width: f64) -> Self {
        Clip {
            top: -top + BORDER_PX,
            right: width - left + BORDER_PX,
            bottom: height - top + BORDER_PX,
            left: -left + BORDER_PX,
        }
    }
}

/// Position, size and clip of an image layer (base map or overlay).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImagePlacement {
    pub top: f64,
    pub left: f64,
    pub height: f64,
    pub width: f64,
    pub clip: Clip,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapImage {
    pub url: String,
    pub bounds: GeoBox,
    pub height: f64,
    pub width: f64,
}

/// One edge bar of the selection rectangle.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub top: f64,
    pub left: f64,
    pub clip: Clip,
}

/// Selection rectangle in viewport pixels.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionPixels {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl SelectionPixels {
    /// Edge bars in north, west, south, east order.
    pub fn bars(&self) -> [Bar; 4] {
        let horizontal = Clip {
            top: 0.0,
            right: self.right - self.left,
            bottom: 2.0,
            left: 0.0,
        };
        let vertical = Clip {
            top: 0.0,
            right: 2.0,
            bottom: self.bottom - self.top,
            left: 0.0,
        };
        [
            Bar {
                top: self.top,
                left: self.left,
                clip: horizontal,
            },
            Bar {
                top: self.top,
                left: self.left,
                clip: vertical,
            },
            Bar {
                top: self.bottom,
                left: self.left,
                clip: horizontal,
            },
            Bar {
                top: self.top,
                left: self.right,
                clip: vertical,
            },
        ]
    }

    /// Corner handle `(top, left)` positions: NW, NE, SW, SE.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.top - 1.0, self.left - 1.0),
            (self.top - 1.0, self.right - 3.0),
            (self.bottom - 3.0, self.left - 1.0),
            (self.bottom - 3.0, self.right - 3.0),
        ]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionHandle {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl SelectionHandle {
    fn moves_top(self) -> bool {
        matches!(
            self,
            SelectionHandle::North | SelectionHandle::NorthEast | SelectionHandle::NorthWest
        )
    }

    fn moves_right(self) -> bool {
        matches!(
            self,
            SelectionHandle::East | SelectionHandle::NorthEast | SelectionHandle::SouthEast
        )
    }

    fn moves_bottom(self) -> bool {
        matches!(
            self,
            SelectionHandle::South | SelectionHandle::SouthEast | SelectionHandle::SouthWest
        )
    }

    fn moves_left(self) -> bool {
        matches!(
            self,
            SelectionHandle::West | SelectionHandle::SouthWest | SelectionHandle::NorthWest
        )
    }
}

/// What the pointer grabbed on the map.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapDragSource {
    /// Base map, overlay or the transparent view pane: pans the view.
    Pan,
    Handle(SelectionHandle),
}

/// Result of releasing a map drag.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapRelease {
    pub was_view: bool,
    pub view: GeoBox,
    pub selection: GeoBox,
}

/// Map viewport state: pixel size, view box, base map, selection and overlay
/// placement.
///
/// Call order is `set_view`, `set_map`, `set_selection`; later calls to any of
/// them keep the derived placements current.
#[derive(Debug, Clone)]
pub struct MapView {
    height: f64,
    width: f64,
    view: Option<GeoBox>,
    map: Option<MapImage>,
    placement: Option<ImagePlacement>,
    overlay: ImagePlacement,
    overlay_busy: bool,
    selection: Option<GeoBox>,
    sel_px: Option<SelectionPixels>,
    drag: DragSession<MapDragSource>,
}

impl MapView {
    pub fn new(height: f64, width: f64) -> Self {
        let height = height.max(1.0);
        let width = width.max(1.0);
        MapView {
            height,
            width,
            view: None,
            map: None,
            placement: None,
            overlay: resting_overlay(height, width),
            overlay_busy: false,
            selection: None,
            sel_px: None,
            drag: DragSession::new(),
        }
    }

    pub fn viewport_size(&self) -> (f64, f64) {
        (self.height, self.width)
    }

    pub fn view(&self) -> Option<GeoBox> {
        self.view
    }

    pub fn map(&self) -> Option<&MapImage> {
        self.map.as_ref()
    }

    pub fn map_placement(&self) -> Option<ImagePlacement> {
        self.placement
    }

    pub fn overlay_placement(&self) -> ImagePlacement {
        self.overlay
    }

    /// `true` between an overlay refresh request and the matching
    /// [`MapView::overlay_loaded`].
    pub fn overlay_busy(&self) -> bool {
        self.overlay_busy
    }

    pub fn selection(&self) -> Option<GeoBox> {
        self.selection
    }

    pub fn selection_pixels(&self) -> Option<SelectionPixels> {
        self.sel_px
    }

    /// Selection bounds rounded to three decimals for the coordinate inputs.
    pub fn selection_text(&self) -> Option<GeoBox> {
        self.selection.map(|s| {
            GeoBox::new(round3(s.north), round3(s.west), round3(s.south), round3(s.east))
        })
    }

    /// Changes the pixel size. An existing view is re-derived for the new
    /// aspect ratio and the overlay is re-placed to cover it.
    pub fn set_viewport_size(&mut self, height: f64, width: f64) {
        self.height = height.max(1.0);
        self.width = width.max(1.0);
        self.overlay = resting_overlay(self.height, self.width);
        if let Some(v) = self.view {
            self.set_view(v.north, v.west, v.south, v.east);
        }
    }

    /// Sets the view box, widening the narrower axis so the box has the
    /// viewport's aspect ratio. Inverted corners are swapped; a zero span is
    /// widened to [`MIN_SPAN_DEG`].
    pub fn set_view(&mut self, north: f64, west: f64, south: f64, east: f64) -> GeoBox {
        let b = GeoBox::new(north, west, south, east).normalized();
        let (mut n, mut w, mut s, mut e) = (b.north, b.west, b.south, b.east);
        if n - s < MIN_SPAN_DEG {
            let c = (n + s) / 2.0;
            n = c + MIN_SPAN_DEG / 2.0;
            s = c - MIN_SPAN_DEG / 2.0;
        }
        if e - w < MIN_SPAN_DEG {
            let c = (e + w) / 2.0;
            e = c + MIN_SPAN_DEG / 2.0;
            w = c - MIN_SPAN_DEG / 2.0;
        }

        let view_aspect = self.width / self.height;
        let aspect = (e - w) / (n - s);
        if aspect > view_aspect {
            let ns = (e - w) / view_aspect;
            n = (n + s + ns) / 2.0;
            s = n - ns;
        } else if aspect < view_aspect {
            let ew = (n - s) * view_aspect;
            e = (e + w + ew) / 2.0;
            w = e - ew;
        }

        let view = GeoBox::new(n, w, s, e);
        self.view = Some(view);
        self.overlay.top = BORDER_PX;
        self.overlay.left = BORDER_PX;
        if self.map.is_some() {
            self.place_map();
        }
        if self.selection.is_some() && self.placement.is_some() {
            self.project_selection();
        }
        view
    }

    /// Sets the base map image and its geographic bounds, and places it under
    /// the current view.
    pub fn set_map(
        &mut self,
        url: impl Into<String>,
        north: f64,
        west: f64,
        south: f64,
        east: f64,
        image_height: f64,
        image_width: f64,
    ) -> Result<ImagePlacement, MapError> {
        if self.view.is_none() {
            return Err(MapError::ViewNotSet);
        }
        let mut bounds = GeoBox::new(north, west, south, east).normalized();
        if bounds.ns_span() <= 0.0 {
            bounds.north = bounds.south + MIN_SPAN_DEG;
        }
        if bounds.ew_span() <= 0.0 {
            bounds.east = bounds.west + MIN_SPAN_DEG;
        }
        self.map = Some(MapImage {
            url: url.into(),
            bounds,
            height: image_height.max(1.0),
            width: image_width.max(1.0),
        });
        let placement = self.place_map().ok_or(MapError::MapNotSet)?;
        if self.selection.is_some() {
            self.project_selection();
        }
        Ok(placement)
    }

    fn place_map(&mut self) -> Option<ImagePlacement> {
        let view = self.view?;
        let map = self.map.as_ref()?;
        let mb = map.bounds;
        let view_resolution = self.height / view.ns_span();
        let map_resolution = map.height / mb.ns_span();
        let zoom = view_resolution / map_resolution;
        let height = (map.height * zoom).round().max(1.0);
        let width = (map.width * zoom).round().max(1.0);
        let top = (view.north - mb.north) / mb.ns_span() * height;
        let left = (mb.west - view.west) / mb.ew_span() * width;
        let placement = ImagePlacement {
            top,
            left,
            height,
            width,
            clip: Clip::to_viewport(top, left, self.height, self.width),
        };
        self.placement = Some(placement);
        Some(placement)
    }

    /// Sets the selection rectangle and projects it onto the viewport.
    pub fn set_selection(
        &mut self,
        north: f64,
        west: f64,
        south: f64,
        east: f64,
    ) -> Result<SelectionPixels, MapError> {
        if self.placement.is_none() {
            return Err(MapError::MapNotSet);
        }
        self.selection = Some(GeoBox::new(north, west, south, east).normalized());
        self.project_selection().ok_or(MapError::MapNotSet)
    }

    fn project_selection(&mut self) -> Option<SelectionPixels> {
        let view = self.view?;
        let sel = self.selection?;
        let p = self.placement?;
        let mb = self.map.as_ref()?.bounds;
        let px = SelectionPixels {
            top: (view.north - sel.north) / mb.ns_span() * p.height,
            right: (sel.east - view.west) / mb.ew_span() * p.width,
            bottom: (view.north - sel.south) / mb.ns_span() * p.height,
            left: (sel.west - view.west) / mb.ew_span() * p.width,
        };
        self.sel_px = Some(px);
        Some(px)
    }

    /// Zooms the view to the selection. The overlay is re-scaled from the
    /// previous view until a fresh overlay arrives.
    pub fn zoom_in(&mut self) -> Result<GeoBox, MapError> {
        let sel = self.selection.ok_or(MapError::SelectionNotSet)?;
        self.zoom_to(sel)
    }

    /// Triples both spans of the view around its center.
    pub fn zoom_out(&mut self) -> Result<GeoBox, MapError> {
        let view = self.view.ok_or(MapError::ViewNotSet)?;
        self.zoom_to(view.tripled())
    }

    fn zoom_to(&mut self, target: GeoBox) -> Result<GeoBox, MapError> {
        let old = self.view.ok_or(MapError::ViewNotSet)?;
        if self.map.is_none() {
            return Err(MapError::MapNotSet);
        }
        let view = self.set_view(target.north, target.west, target.south, target.east);

        let view_resolution = self.height / view.ns_span();
        let overlay_resolution = self.height / old.ns_span();
        let zoom = view_resolution / overlay_resolution;
        let height = (self.height * zoom).round();
        let width = (self.width * zoom).round();
        let top = (view.north - old.north) / old.ns_span() * height;
        let left = (old.west - view.west) / old.ew_span() * width;
        self.overlay = ImagePlacement {
            top,
            left,
            height,
            width,
            clip: Clip::to_viewport(top, left, self.height, self.width),
        };
        debug!(?view, "map zoomed");
        Ok(view)
    }

    /// Marks an overlay refresh as in flight.
    pub fn overlay_requested(&mut self) {
        self.overlay_busy = true;
    }

    /// A new overlay image finished loading (or failed): it covers the
    /// current view exactly.
    pub fn overlay_loaded(&mut self) -> ImagePlacement {
        self.overlay = resting_overlay(self.height, self.width);
        self.overlay_busy = false;
        self.overlay
    }

    // ── Pointer interaction ─────────────────────────────────────────────

    /// Starts a drag at pointer position `[x, y]`. Ignored until the map and
    /// selection are placed.
    pub fn pointer_down(&mut self, source: MapDragSource, pos: [f64; 2]) -> bool {
        if self.placement.is_none() || self.sel_px.is_none() {
            return false;
        }
        self.drag.begin(source, pos);
        true
    }

    /// Applies pointer movement to the active drag. Returns `true` when
    /// anything moved.
    pub fn pointer_move(&mut self, pos: [f64; 2]) -> bool {
        let (Some(source), Some([dx, dy])) = (self.drag.source(), self.drag.delta(pos)) else {
            return false;
        };
        match source {
            MapDragSource::Pan => {
                let Some(p) = self.placement.as_mut() else {
                    return false;
                };
                p.top += dy;
                p.left += dx;
                p.clip = Clip::to_viewport(p.top, p.left, self.height, self.width);
                let o = &mut self.overlay;
                o.top += dy;
                o.left += dx;
                o.clip = Clip::to_viewport(o.top, o.left, self.height, self.width);
                self.drag.advance(pos);
                true
            }
            MapDragSource::Handle(handle) => {
                let Some(old) = self.sel_px else {
                    return false;
                };
                let mut px = old;
                if handle.moves_top() {
                    px.top = (px.top + dy).max(0.0).min(self.height);
                }
                if handle.moves_right() {
                    px.right = (px.right + dx).min(self.width).max(0.0);
                }
                if handle.moves_bottom() {
                    px.bottom = (px.bottom + dy).min(self.height).max(0.0);
                }
                if handle.moves_left() {
                    px.left = (px.left + dx).max(0.0).min(self.width);
                }
                if px.left > px.right {
                    std::mem::swap(&mut px.left, &mut px.right);
                }
                if px.top > px.bottom {
                    std::mem::swap(&mut px.top, &mut px.bottom);
                }
                self.sel_px = Some(px);
                // Clamped movement accumulates until it takes effect.
                if px != old {
                    self.drag.advance(pos);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Ends the drag and projects the dragged pixels back to geographic view
    /// and selection boxes.
    pub fn pointer_up(&mut self) -> Option<MapRelease> {
        let source = self.drag.finish()?;
        let p = self.placement?;
        let px = self.sel_px?;
        let mb = self.map.as_ref()?.bounds;
        let ns = mb.ns_span();
        let ew = mb.ew_span();

        let north = mb.north + ns * p.top / p.height;
        let west = mb.west - ew * p.left / p.width;
        let east = west + ew * self.width / p.width;
        let south = north - ns * self.height / p.height;
        let view = GeoBox::new(north, west, south, east);

        let selection = GeoBox::new(
            north - ns * px.top / p.height,
            west + ew * px.left / p.width,
            north - ns * px.bottom / p.height,
            west + ew * px.right / p.width,
        );
        self.view = Some(view);
        self.selection = Some(selection);
        Some(MapRelease {
            was_view: source == MapDragSource::Pan,
            view,
            selection,
        })
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }
}

fn resting_overlay(height: f64, width: f64) -> ImagePlacement {
    ImagePlacement {
        top: BORDER_PX,
        left: BORDER_PX,
        height,
        width,
        clip: Clip::to_viewport(BORDER_PX, BORDER_PX, height, width),
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VIEW: (f64, f64, f64, f64) = (37.445, -123.046, 36.006, -121.267);
    const SEL: (f64, f64, f64, f64) = (36.989, -122.174, 36.526, -121.762);

    fn monterey() -> MapView {
        let mut map = MapView::new(160.0, 245.0);
        map.set_view(VIEW.0, VIEW.1, VIEW.2, VIEW.3);
        map.set_map("monterey_big.jpg", 38.0, -125.5, 35.0, -119.5, 751.0, 1501.0)
            .unwrap();
        map.set_selection(SEL.0, SEL.1, SEL.2, SEL.3).unwrap();
        map
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn view_matches_viewport_aspect() {
        let map = monterey();
        let v = map.view().unwrap();
        assert!(close(v.ew_span() / v.ns_span(), 245.0 / 160.0));
        // Narrow axis widened around the requested center.
        let (lat, lon) = v.center();
        assert!(close(lat, (VIEW.0 + VIEW.2) / 2.0));
        assert!(close(lon, (VIEW.1 + VIEW.3) / 2.0));
    }

    #[test]
    fn inverted_and_degenerate_views_are_repaired() {
        let mut map = MapView::new(100.0, 100.0);
        let v = map.set_view(36.0, -121.0, 37.0, -122.0);
        assert_eq!(v, GeoBox::new(37.0, -122.0, 36.0, -121.0));

        let v = map.set_view(36.5, -121.5, 36.5, -121.5);
        assert!(v.ns_span() > 0.0 && v.ew_span() > 0.0);
    }

    #[test]
    fn map_requires_view() {
        let mut map = MapView::new(160.0, 245.0);
        assert_eq!(
            map.set_map("m.jpg", 38.0, -125.5, 35.0, -119.5, 751.0, 1501.0),
            Err(MapError::ViewNotSet)
        );
        assert_eq!(
            map.set_selection(1.0, 0.0, 0.0, 1.0),
            Err(MapError::MapNotSet)
        );
    }

    #[test]
    fn map_placement_follows_view() {
        let map = monterey();
        let v = map.view().unwrap();
        let p = map.map_placement().unwrap();
        let zoom = (160.0 / v.ns_span()) / (751.0 / 3.0);
        assert_eq!(p.height, (751.0 * zoom).round());
        assert_eq!(p.width, (1501.0 * zoom).round());
        assert!(close(p.top, (v.north - 38.0) / 3.0 * p.height));
        assert!(close(p.left, (-125.5 - v.west) / 6.0 * p.width));
        assert_eq!(p.clip, Clip::to_viewport(p.top, p.left, 160.0, 245.0));
        assert!(p.top < 0.0 && p.left < 0.0);
    }

    #[test]
    fn selection_geometry() {
        let map = monterey();
        let px = map.selection_pixels().unwrap();
        assert!(px.top < px.bottom && px.left < px.right);
        let corners = px.corners();
        assert_eq!(corners[0], (px.top - 1.0, px.left - 1.0));
        assert_eq!(corners[3], (px.bottom - 3.0, px.right - 3.0));
        let bars = px.bars();
        assert_eq!(bars[2].top, px.bottom);
        assert_eq!(bars[3].left, px.right);
        assert_eq!(bars[1].clip.bottom, px.bottom - px.top);
        assert_eq!(map.selection_text().unwrap(), GeoBox::new(SEL.0, SEL.1, SEL.2, SEL.3));
    }

    #[test]
    fn zoom_round_trip_contains_selection() {
        let mut map = monterey();
        let original = map.view().unwrap();
        let sel = map.selection().unwrap();

        let zoomed = map.zoom_in().unwrap();
        assert!(zoomed.contains_box(&sel));
        let back = map.zoom_out().unwrap();
        assert!(back.contains_box(&sel));

        let (lat, lon) = back.center();
        let (slat, slon) = sel.center();
        assert!((lat - slat).abs() < 1e-9 && (lon - slon).abs() < 1e-9);
        assert!(back.ns_span() < original.ns_span() * 3.0);
    }

    #[test]
    fn zoom_rescales_overlay_from_previous_view() {
        let mut map = monterey();
        let old = map.view().unwrap();
        map.zoom_in().unwrap();
        let o = map.overlay_placement();
        let v = map.view().unwrap();
        assert_eq!(o.height, (160.0 * old.ns_span() / v.ns_span()).round());
        assert!(o.top < 0.0);

        assert_eq!(map.overlay_loaded().top, BORDER_PX);
        assert_eq!(map.overlay_placement().height, 160.0);
    }

    #[test]
    fn pan_release_shifts_view() {
        let mut map = monterey();
        let before = map.view().unwrap();
        assert!(map.pointer_down(MapDragSource::Pan, [100.0, 100.0]));
        assert!(map.pointer_move([110.0, 90.0]));
        let release = map.pointer_up().unwrap();
        assert!(release.was_view);
        // Dragging the image right and up moves the view west and south.
        assert!(release.view.west < before.west);
        assert!(release.view.north < before.north);
        assert!(release.view.south < before.south);
        assert!(!map.is_dragging());
    }

    #[test]
    fn selection_drag_clamps_and_swaps() {
        let mut map = monterey();
        let start = map.selection_pixels().unwrap();
        map.pointer_down(MapDragSource::Handle(SelectionHandle::North), [0.0, 0.0]);
        map.pointer_move([0.0, -1000.0]);
        assert_eq!(map.selection_pixels().unwrap().top, 0.0);

        // Drag past the south edge: edges swap.
        map.pointer_move([0.0, 1000.0]);
        let px = map.selection_pixels().unwrap();
        assert_eq!(px.bottom, 160.0);
        assert_eq!(px.top, start.bottom);

        let release = map.pointer_up().unwrap();
        assert!(!release.was_view);
        assert!(release.selection.north >= release.selection.south);
    }

    #[test]
    fn resize_replaces_overlay() {
        let mut map = monterey();
        map.zoom_in().unwrap();
        map.overlay_requested();
        map.set_viewport_size(200.0, 300.0);
        let o = map.overlay_placement();
        assert_eq!((o.top, o.left), (BORDER_PX, BORDER_PX));
        assert_eq!((o.height, o.width), (200.0, 300.0));
        assert_eq!(o.clip, Clip::to_viewport(BORDER_PX, BORDER_PX, 200.0, 300.0));
        assert!(map.overlay_busy());
        let v = map.view().unwrap();
        assert!(close(v.ew_span() / v.ns_span(), 300.0 / 200.0));
    }

    #[test]
    fn clamped_motion_keeps_anchor() {
        let mut map = monterey();
        map.pointer_down(MapDragSource::Handle(SelectionHandle::West), [0.0, 0.0]);
        assert!(map.pointer_move([-1000.0, 0.0]));
        assert!(!map.pointer_move([-1001.0, 0.0]));
        // Moving back from the clamped position is measured from the last
        // effective anchor.
        assert!(map.pointer_move([-990.0, 0.0]));
        assert_eq!(map.selection_pixels().unwrap().left, 10.0);
    }
}
