pub mod error;
pub mod node;
pub mod spec;
pub mod tree;

pub use error::TreeError;
pub use node::*;
pub use spec::*;
pub use tree::*;
