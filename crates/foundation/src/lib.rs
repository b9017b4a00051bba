pub mod arena;
pub mod bounds;
pub mod ids;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use arena::*;
pub use bounds::*;
pub use ids::*;
pub use time::*;
