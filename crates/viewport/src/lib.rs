pub mod map;
pub mod slider;

pub use map::*;
pub use slider::*;
