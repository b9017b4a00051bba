use std::cell::Cell;

/// Boolean guard against re-entering a routine that is already running on the
/// current call stack.
///
/// `try_enter` hands out a guard while the latch is free; the latch reopens
/// when the guard drops.
#[derive(Debug, Default)]
pub struct ReentryLatch {
    busy: Cell<bool>,
}

impl ReentryLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    pub fn try_enter(&self) -> Option<LatchGuard<'_>> {
        if self.busy.replace(true) {
            return None;
        }
        Some(LatchGuard { latch: self })
    }
}

#[derive(Debug)]
pub struct LatchGuard<'a> {
    latch: &'a ReentryLatch,
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.latch.busy.set(false);
    }
}
