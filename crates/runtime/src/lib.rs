pub mod drag;
pub mod event_bus;
pub mod latch;

pub use drag::*;
pub use event_bus::*;
pub use latch::*;
