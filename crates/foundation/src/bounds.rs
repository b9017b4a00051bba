use serde::{Deserialize, Serialize};

/// Closed interval `[lo, hi]` on a single axis (time, depth, latitude, longitude).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    pub fn new(lo: f64, hi: f64) -> Self {
        Interval { lo, hi }
    }

    /// Returns the interval with `lo <= hi`, swapping the ends if needed.
    pub fn normalized(self) -> Self {
        if self.lo > self.hi {
            Interval::new(self.hi, self.lo)
        } else {
            self
        }
    }

    pub fn span(&self) -> f64 {
        self.hi - self.lo
    }

    pub fn center(&self) -> f64 {
        (self.lo + self.hi) / 2.0
    }

    /// Closed-interval overlap: touching end points count as overlapping.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.lo <= other.hi && self.hi >= other.lo
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lo && v <= self.hi
    }

    pub fn clamp(&self, v: f64) -> f64 {
        v.max(self.lo).min(self.hi)
    }

    /// Same center, three times the span.
    pub fn tripled(&self) -> Self {
        Interval::new(
            (self.lo * 3.0 - self.hi) / 2.0,
            (self.hi * 3.0 - self.lo) / 2.0,
        )
    }
}

/// Geographic bounding box in decimal degrees.
///
/// Field order follows the catalog convention `north, west, south, east`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBox {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
}

impl GeoBox {
    pub fn new(north: f64, west: f64, south: f64, east: f64) -> Self {
        GeoBox {
            north,
            west,
            south,
            east,
        }
    }

    /// Returns the box with `north >= south` and `east >= west`.
    pub fn normalized(self) -> Self {
        GeoBox {
            north: self.north.max(self.south),
            south: self.north.min(self.south),
            east: self.east.max(self.west),
            west: self.east.min(self.west),
        }
    }

    pub fn ns_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn ew_span(&self) -> f64 {
        self.east - self.west
    }

    /// `(lat, lon)` of the box center.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    pub fn lat(&self) -> Interval {
        Interval::new(self.south, self.north)
    }

    pub fn lon(&self) -> Interval {
        Interval::new(self.west, self.east)
    }

    /// Same center, three times the span on both axes.
    pub fn tripled(&self) -> Self {
        GeoBox::new(
            (self.north * 3.0 - self.south) / 2.0,
            (self.west * 3.0 - self.east) / 2.0,
            (self.south * 3.0 - self.north) / 2.0,
            (self.east * 3.0 - self.west) / 2.0,
        )
    }

    pub fn contains_box(&self, other: &GeoBox) -> bool {
        other.north <= self.north
            && other.south >= self.south
            && other.west >= self.west
            && other.east <= self.east
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoBox, Interval};

    #[test]
    fn touching_intervals_overlap() {
        let node = Interval::new(100.0, 200.0);
        assert!(Interval::new(50.0, 100.0).overlaps(&node));
        assert!(Interval::new(200.0, 300.0).overlaps(&node));
        assert!(!Interval::new(50.0, 99.999).overlaps(&node));
        assert!(!Interval::new(200.001, 300.0).overlaps(&node));
    }

    #[test]
    fn tripled_keeps_center() {
        let i = Interval::new(0.0, 1000.0).tripled();
        assert_eq!(i, Interval::new(-1000.0, 2000.0));
        assert_eq!(i.center(), 500.0);
    }

    #[test]
    fn normalized_swaps_inverted_corners() {
        let b = GeoBox::new(35.0, -120.0, 36.0, -121.0).normalized();
        assert_eq!(b, GeoBox::new(36.0, -121.0, 35.0, -120.0));
    }

    #[test]
    fn tripled_box_contains_original() {
        let b = GeoBox::new(37.0, -123.0, 36.0, -122.0);
        let t = b.tripled();
        assert!(t.contains_box(&b));
        assert_eq!(t.center(), b.center());
        assert!((t.ns_span() - 3.0).abs() < 1e-12);
    }
}
