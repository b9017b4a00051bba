use foundation::{GeoBox, Interval};
use tree::{Limits, TreeNode};

/// User-selected ranges that dataset nodes are underlined against.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RangeQuery {
    pub area: GeoBox,
    pub time: Interval,
    pub depth: Interval,
}

impl RangeQuery {
    /// Only nodes carrying spatial limits take part in range filtering;
    /// folders pick up their underline from the cascade.
    pub fn evaluates(node: &TreeNode) -> bool {
        node.limits().has_spatial()
    }

    /// Closed-interval overlap on every axis the node declares. Missing axes
    /// pass.
    pub fn passes(&self, limits: &Limits) -> bool {
        fn axis(node: Option<Interval>, user: Interval) -> bool {
            node.is_none_or(|n| user.overlaps(&n))
        }
        axis(limits.y, self.area.lat())
            && axis(limits.x, self.area.lon())
            && axis(limits.t, self.time)
            && axis(limits.z, self.depth)
    }
}
