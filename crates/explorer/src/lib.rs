//! Cross-tree coordination and the application context of the catalog
//! explorer.

pub mod config;
pub mod context;
pub mod coordinator;
pub mod filter;
pub mod links;
pub mod overlay;
pub mod snapshot;
pub mod timeline;
pub mod views;

pub use config::{ConfigError, ExplorerConfig, MapConfig, SliderConfig};
pub use context::{Explorer, ExplorerError, ExplorerEvent, Input};
pub use coordinator::{CheckMode, CheckedPair, Coordinator, TreeSide, unique_sort};
pub use filter::RangeQuery;
pub use links::{Link, LinkTable};
pub use overlay::OverlayRequest;
pub use snapshot::{ExplorerSnapshot, MapSnapshot, NodeRow, SliderSnapshot, TreeSnapshot};
pub use timeline::{Axis, TimelineBar, bar_extent, timeline_bars};
pub use views::{ViewOption, ViewsQuery, parse_views_response};
