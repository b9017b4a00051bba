use tracing::debug;

#[derive(Debug, Copy, Clone, PartialEq)]
struct ActiveDrag<S> {
    source: S,
    anchor: [f64; 2],
}

/// Pointer capture for a single in-flight drag.
///
/// Between `begin` and `finish` the owner receives every pointer move,
/// regardless of what lies under the pointer. At most one drag is active:
/// `begin` clears any previous source before installing the new one.
///
/// The anchor is the last pointer position the owner has consumed. Owners
/// call [`DragSession::advance`] only when a move produced a visible change,
/// so clamped movement accumulates until it can take effect.
#[derive(Debug, Clone)]
pub struct DragSession<S> {
    active: Option<ActiveDrag<S>>,
}

impl<S> Default for DragSession<S> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<S: Copy + std::fmt::Debug> DragSession<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a drag from `source` at pointer position `pos`.
    ///
    /// Returns the source of a drag that was still active and has been
    /// abandoned.
    pub fn begin(&mut self, source: S, pos: [f64; 2]) -> Option<S> {
        let abandoned = self.active.take().map(|d| d.source);
        if let Some(prev) = abandoned {
            debug!(?prev, "abandoning active drag");
        }
        self.active = Some(ActiveDrag {
            source,
            anchor: pos,
        });
        abandoned
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn source(&self) -> Option<S> {
        self.active.map(|d| d.source)
    }

    /// Pointer movement since the anchor, or `None` without an active drag.
    pub fn delta(&self, pos: [f64; 2]) -> Option<[f64; 2]> {
        self.active
            .map(|d| [pos[0] - d.anchor[0], pos[1] - d.anchor[1]])
    }

    pub fn advance(&mut self, pos: [f64; 2]) {
        if let Some(d) = self.active.as_mut() {
            d.anchor = pos;
        }
    }

    /// Releases the capture and returns the source that was dragging.
    pub fn finish(&mut self) -> Option<S> {
        self.active.take().map(|d| d.source)
    }
}
