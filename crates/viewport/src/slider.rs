//! Dual-handle range slider.
//!
//! The selection `[start, end]` inside the domain `[min, max]` maps linearly
//! onto a track of `width - 2 * handle_width` pixels. The left handle's left
//! edge marks `start`; the right handle sits one handle width further along
//! so the two never overlap.

use foundation::{Interval, format_timestamp_ms, parse_timestamp_ms};
use runtime::DragSession;
use serde::{Deserialize, Serialize};

/// How slider values render in the start/end text fields.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueFormat {
    Decimal { places: u32 },
    /// Epoch milliseconds shown as `YYYY-MM-DD[ HH:MM:SS]`, shifted by
    /// `utc_offset_ms` before formatting.
    Timestamp { utc_offset_ms: f64 },
}

impl Default for ValueFormat {
    fn default() -> Self {
        ValueFormat::Decimal { places: 1 }
    }
}

impl ValueFormat {
    pub fn format(&self, value: f64) -> String {
        match *self {
            ValueFormat::Decimal { places } => {
                let scale = 10f64.powi(places as i32);
                let rounded = (value * scale).round() / scale;
                format!("{rounded}")
            }
            ValueFormat::Timestamp { utc_offset_ms } => {
                format_timestamp_ms(value + utc_offset_ms, true)
            }
        }
    }

    pub fn parse(&self, text: &str) -> Option<f64> {
        match *self {
            ValueFormat::Decimal { .. } => text.trim().parse().ok(),
            ValueFormat::Timestamp { utc_offset_ms } => {
                parse_timestamp_ms(text).map(|v| v - utc_offset_ms)
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SliderHandle {
    Left,
    Right,
}

/// A committed selection change.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliderCommit {
    pub start: f64,
    pub end: f64,
    /// The domain changed; indicators drawn against it need regenerating.
    pub limits_changed: bool,
}

#[derive(Debug, Clone)]
pub struct DualSlider {
    min: f64,
    max: f64,
    width: f64,
    handle_width: f64,
    offset: f64,
    format: ValueFormat,
    /// Domain span at construction; zooming out of a collapsed domain
    /// restores this much.
    initial_span: f64,
    start: f64,
    end: f64,
    left: f64,
    right: f64,
    drag: DragSession<SliderHandle>,
}

impl DualSlider {
    /// `offset` is the page x coordinate of the rail's left edge.
    pub fn new(
        min: f64,
        max: f64,
        width: f64,
        handle_width: f64,
        offset: f64,
        format: ValueFormat,
    ) -> Self {
        let domain = Interval::new(min, max).normalized();
        let handle_width = handle_width.max(0.0);
        let width = width.max(handle_width * 2.0);
        DualSlider {
            min: domain.lo,
            max: domain.hi,
            width,
            handle_width,
            offset,
            format,
            initial_span: domain.hi - domain.lo,
            start: domain.lo,
            end: domain.hi,
            left: 0.0,
            right: width - handle_width,
            drag: DragSession::new(),
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn domain(&self) -> Interval {
        Interval::new(self.min, self.max)
    }

    pub fn selection(&self) -> Interval {
        Interval::new(self.start, self.end)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn handle_width(&self) -> f64 {
        self.handle_width
    }

    pub fn format(&self) -> ValueFormat {
        self.format
    }

    /// Pixel positions `(left, right)` of the two handles.
    pub fn handles(&self) -> (f64, f64) {
        (self.left, self.right)
    }

    pub fn start_text(&self) -> String {
        self.format.format(self.start)
    }

    pub fn end_text(&self) -> String {
        self.format.format(self.end)
    }

    pub fn min_text(&self) -> String {
        self.format.format(self.min)
    }

    pub fn max_text(&self) -> String {
        self.format.format(self.max)
    }

    fn track(&self) -> f64 {
        self.width - self.handle_width * 2.0
    }

    /// Moves the start; a start past the end drags the end along.
    pub fn set_start(&mut self, value: f64) -> SliderCommit {
        if value <= self.end {
            self.set_position(value, self.end)
        } else {
            self.set_position(value, value)
        }
    }

    pub fn set_end(&mut self, value: f64) -> SliderCommit {
        if value >= self.start {
            self.set_position(self.start, value)
        } else {
            self.set_position(value, value)
        }
    }

    /// Parses typed text with the slider's format. `None` leaves the slider
    /// unchanged.
    pub fn set_start_text(&mut self, text: &str) -> Option<SliderCommit> {
        let value = self.format.parse(text)?;
        Some(self.set_start(value))
    }

    pub fn set_end_text(&mut self, text: &str) -> Option<SliderCommit> {
        let value = self.format.parse(text)?;
        Some(self.set_end(value))
    }

    /// Clamps both values into the domain, orders them and places the
    /// handles.
    pub fn set_position(&mut self, start: f64, end: f64) -> SliderCommit {
        let domain = self.domain();
        let sel = Interval::new(domain.clamp(start), domain.clamp(end)).normalized();
        self.start = sel.lo;
        self.end = sel.hi;
        self.place_handles();
        self.commit(false)
    }

    fn place_handles(&mut self) {
        let span = self.max - self.min;
        if span <= 0.0 {
            self.left = 0.0;
            self.right = self.handle_width;
            return;
        }
        let track = self.track();
        self.left = (self.start - self.min) / span * track;
        self.right = (self.end - self.min) / span * track + self.handle_width;
    }

    /// Replaces the domain. The selection is clamped into it before the
    /// handles are re-placed.
    pub fn set_limits(&mut self, min: f64, max: f64) -> SliderCommit {
        let domain = Interval::new(min, max).normalized();
        self.min = domain.lo;
        self.max = domain.hi;
        self.start = domain.clamp(self.start);
        self.end = domain.clamp(self.end);
        let commit = self.set_position(self.start, self.end);
        SliderCommit {
            limits_changed: true,
            ..commit
        }
    }

    /// Domain becomes the current selection.
    pub fn zoom_in(&mut self) -> SliderCommit {
        self.set_limits(self.start, self.end)
    }

    /// Domain triples around its center. A collapsed domain is widened to
    /// the initial span instead.
    pub fn zoom_out(&mut self) -> SliderCommit {
        let domain = self.domain();
        let wider = if domain.hi > domain.lo {
            domain.tripled()
        } else {
            let half = if self.initial_span > 0.0 {
                self.initial_span / 2.0
            } else {
                0.5
            };
            Interval::new(domain.lo - half, domain.hi + half)
        };
        self.set_limits(wider.lo, wider.hi)
    }

    // ── Pointer interaction ─────────────────────────────────────────────

    pub fn pointer_down(&mut self, handle: SliderHandle, x: f64) {
        self.drag.begin(handle, [x, 0.0]);
    }

    /// Moves the dragged handle, keeping `left + handle_width <= right`.
    /// Returns `true` when a handle moved.
    pub fn pointer_move(&mut self, x: f64) -> bool {
        let (Some(handle), Some([dx, _])) = (self.drag.source(), self.drag.delta([x, 0.0])) else {
            return false;
        };
        let (old_left, old_right) = (self.left, self.right);
        match handle {
            SliderHandle::Right => {
                self.right = (self.right + dx)
                    .min(self.width - self.handle_width)
                    .max(self.left + self.handle_width);
            }
            SliderHandle::Left => {
                self.left = (self.left + dx)
                    .min(self.right - self.handle_width)
                    .max(0.0);
            }
        }
        let moved = self.left != old_left || self.right != old_right;
        if moved {
            self.drag.advance([x, 0.0]);
        }
        moved
    }

    /// Ends a handle drag and commits the handle positions.
    pub fn pointer_up(&mut self) -> Option<SliderCommit> {
        self.drag.finish()?;
        Some(self.commit_pixels())
    }

    /// Click on the rail at page x coordinate `x`: the nearer handle jumps to
    /// the click and the result is committed.
    pub fn rail_click(&mut self, x: f64) -> SliderCommit {
        let track = self.track().max(0.0);
        let u = (x - self.offset - self.handle_width * 2.0).max(0.0).min(track);
        let to_left = (u - self.left).abs();
        let to_right = (u - (self.right - self.handle_width)).abs();
        if to_left <= to_right {
            self.left = u.min(self.right - self.handle_width).max(0.0);
        } else {
            self.right = (u + self.handle_width).max(self.left + self.handle_width);
        }
        self.commit_pixels()
    }

    fn commit_pixels(&mut self) -> SliderCommit {
        let track = self.track();
        if track > 0.0 {
            let span = self.max - self.min;
            self.start = self.min + span * self.left / track;
            self.end = self.min + span * (self.right - self.handle_width) / track;
        }
        self.commit(false)
    }

    fn commit(&self, limits_changed: bool) -> SliderCommit {
        SliderCommit {
            start: self.start,
            end: self.end,
            limits_changed,
        }
    }
}
