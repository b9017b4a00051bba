use foundation::{GeoBox, Interval};
use serde::Serialize;

/// Parameters of one trajectory overlay image request.
///
/// Requests are fire-and-forget; `nonce` increases with every request so the
/// image service never answers from a cache.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverlayRequest {
    /// Catalog keys of the checked datasets.
    pub datasets: Vec<String>,
    /// Catalog key of the selected dataset, drawn emphasized.
    pub highlight: Vec<String>,
    pub time: Interval,
    pub depth: Interval,
    pub view: GeoBox,
    pub height: f64,
    pub width: f64,
    pub nonce: u64,
}

impl OverlayRequest {
    pub fn to_query(&self) -> String {
        format!(
            "get=trajectory&contentType=image/gif&datasets={}&highlight={}\
             &tlo={}&thi={}&zlo={}&zhi={}&ylo={}&yhi={}&xlo={}&xhi={}\
             &height={}&width={}&random={}",
            self.datasets.join(","),
            self.highlight.join(","),
            self.time.lo,
            self.time.hi,
            self.depth.lo,
            self.depth.hi,
            self.view.south,
            self.view.north,
            self.view.west,
            self.view.east,
            self.height,
            self.width,
            self.nonce,
        )
    }
}
