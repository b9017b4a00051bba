use foundation::{Interval, NodeId};
use serde::{Deserialize, Serialize};
use tree::Tree;
use viewport::DualSlider;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Time,
    Depth,
}

impl Axis {
    fn prefix(self) -> &'static str {
        match self {
            Axis::Time => "time",
            Axis::Depth => "depth",
        }
    }
}

/// Horizontal bar showing a dataset's time or depth extent against a
/// slider's domain. Hidden bars carry zero left and width.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimelineBar {
    pub node: NodeId,
    pub axis: Axis,
    pub element_id: String,
    pub left: f64,
    pub width: f64,
    pub visible: bool,
}

/// `(left, width)` in rail pixels of `range` over `domain`, or `None` when
/// the bar falls outside the rail.
pub fn bar_extent(
    range: Interval,
    domain: Interval,
    handle_width: f64,
    full_width: f64,
) -> Option<(f64, f64)> {
    let width = full_width - handle_width - 3.0;
    if width <= 0.0 || domain.span() <= 0.0 {
        return None;
    }
    let per_px = domain.span() / width;
    let left_px = ((range.lo - domain.lo) / per_px).floor().max(-handle_width);
    let right_px = ((range.hi - domain.lo) / per_px).ceil().min(width);
    if right_px >= 0.0 && left_px <= width && right_px > left_px {
        Some((handle_width + left_px, right_px - left_px + 1.0))
    } else {
        None
    }
}

/// One bar per node of `datasets` that carries limits on `axis`, in registry
/// order.
pub fn timeline_bars(datasets: &Tree, axis: Axis, slider: &DualSlider) -> Vec<TimelineBar> {
    datasets
        .iter()
        .filter_map(|(_, n)| {
            let range = match axis {
                Axis::Time => n.limits().t,
                Axis::Depth => n.limits().z,
            }?;
            let extent = bar_extent(range, slider.domain(), slider.handle_width(), slider.width());
            let (left, width) = extent.unwrap_or((0.0, 0.0));
            Some(TimelineBar {
                node: n.id().clone(),
                axis,
                element_id: format!("{}{}", axis.prefix(), n.id()),
                left,
                width,
                visible: extent.is_some(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree::{CascadeConfig, TreeSpec};
    use viewport::ValueFormat;

    const HW: f64 = 9.0;
    const FULL: f64 = 112.0;

    fn domain() -> Interval {
        Interval::new(0.0, 100.0)
    }

    #[test]
    fn bar_inside_domain() {
        // 100 px of rail for 100 units.
        assert_eq!(bar_extent(Interval::new(10.0, 20.0), domain(), HW, FULL), Some((19.0, 11.0)));
        assert_eq!(bar_extent(Interval::new(10.2, 19.5), domain(), HW, FULL), Some((19.0, 11.0)));
    }

    #[test]
    fn bar_is_clamped_to_rail() {
        assert_eq!(bar_extent(Interval::new(-50.0, 150.0), domain(), HW, FULL), Some((0.0, 110.0)));
    }

    #[test]
    fn bar_outside_is_hidden() {
        assert_eq!(bar_extent(Interval::new(120.0, 150.0), domain(), HW, FULL), None);
        assert_eq!(bar_extent(Interval::new(-30.0, -20.0), domain(), HW, FULL), None);
        assert_eq!(bar_extent(Interval::new(10.0, 20.0), Interval::new(5.0, 5.0), HW, FULL), None);
    }

    #[test]
    fn bars_follow_aggregated_limits() {
        let spec = TreeSpec::from_json(
            r#"{"id": 10, "name": "Datasets", "children": [
                {"id": 20, "name": "Moorings", "children": [
                    {"id": 11, "name": "M1", "tLo": 10, "tHi": 20},
                    {"id": 12, "name": "M2", "tLo": 30, "tHi": 40, "zLo": 0, "zHi": 5}
                ]}
            ]}"#,
        )
        .unwrap();
        let tree = Tree::build("datasetTree", &spec, CascadeConfig::default()).unwrap();
        let slider = DualSlider::new(0.0, 100.0, FULL, HW, 0.0, ValueFormat::default());

        let bars = timeline_bars(&tree, Axis::Time, &slider);
        let ids: Vec<_> = bars.iter().map(|b| b.element_id.as_str()).collect();
        assert_eq!(ids, vec!["time20", "time11", "time12"]);
        assert_eq!((bars[0].left, bars[0].width), (19.0, 31.0));

        let depth = timeline_bars(&tree, Axis::Depth, &slider);
        assert_eq!(depth.len(), 2);
        assert!(depth.iter().all(|b| b.visible));
    }
}
