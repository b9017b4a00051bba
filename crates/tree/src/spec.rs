use foundation::{Interval, NodeId};
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::node::{CrossRef, Limits};

/// Static node description as served by the catalog.
///
/// Variable trees carry `varName` and a `datasets` list; dataset trees carry
/// `dsetName`, bounding ranges and a `variables` list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSpec {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub var_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_lo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_hi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_lo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_hi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_lo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_hi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_lo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_hi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasets: Option<Vec<DatasetRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<VariableRef>>,
    /// Non-root nodes carry a checkbox unless this is `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkbox: Option<bool>,
}

/// Entry of a variable node's `datasets` list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRef {
    pub id: NodeId,
}

/// Entry of a dataset node's `variables` list: `varId` names the variable tree
/// node, `id` is the variable's id within this dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableRef {
    pub id: NodeId,
    pub var_id: NodeId,
}

impl TreeSpec {
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        TreeSpec {
            id: id.into(),
            name: name.into(),
            children: Vec::new(),
            error: None,
            var_name: None,
            dset_name: None,
            t_lo: None,
            t_hi: None,
            z_lo: None,
            z_hi: None,
            y_lo: None,
            y_hi: None,
            x_lo: None,
            x_hi: None,
            datasets: None,
            variables: None,
            checkbox: None,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, TreeError> {
        serde_json::from_str(text).map_err(|e| TreeError::Parse(e.to_string()))
    }

    pub fn with_child(mut self, child: TreeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub(crate) fn limits(&self) -> Limits {
        Limits {
            t: pair(self.t_lo, self.t_hi),
            z: pair(self.z_lo, self.z_hi),
            y: pair(self.y_lo, self.y_hi),
            x: pair(self.x_lo, self.x_hi),
        }
    }

    pub(crate) fn catalog_key(&self) -> Option<String> {
        self.var_name.clone().or_else(|| self.dset_name.clone())
    }

    pub(crate) fn cross_refs(&self) -> Option<Vec<CrossRef>> {
        match (&self.datasets, &self.variables) {
            (None, None) => None,
            (datasets, variables) => {
                let mut refs = Vec::new();
                for d in datasets.iter().flatten() {
                    refs.push(CrossRef {
                        target: d.id.clone(),
                        local_id: None,
                    });
                }
                for v in variables.iter().flatten() {
                    refs.push(CrossRef {
                        target: v.var_id.clone(),
                        local_id: Some(v.id.clone()),
                    });
                }
                Some(refs)
            }
        }
    }
}

// A range needs both ends.
fn pair(lo: Option<f64>, hi: Option<f64>) -> Option<Interval> {
    match (lo, hi) {
        (Some(lo), Some(hi)) => Some(Interval::new(lo, hi)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::TreeSpec;
    use foundation::{Interval, NodeId};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_dataset_node() {
        let spec = TreeSpec::from_json(
            r#"{"id": 3, "name": "M1 mooring", "dsetName": "m1",
                "tLo": 10, "tHi": 20, "yLo": 36.7, "yHi": 36.8, "xLo": -122.1,
                "variables": [{"id": 31, "varId": 7}]}"#,
        )
        .unwrap();
        assert_eq!(spec.id, NodeId::from("3"));
        assert_eq!(spec.catalog_key().as_deref(), Some("m1"));
        let limits = spec.limits();
        assert_eq!(limits.t, Some(Interval::new(10.0, 20.0)));
        assert_eq!(limits.x, None);
        let refs = spec.cross_refs().unwrap();
        assert_eq!(refs[0].target, NodeId::from("7"));
        assert_eq!(refs[0].local_id, Some(NodeId::from("31")));
    }

    #[test]
    fn node_without_lists_declares_no_refs() {
        let spec = TreeSpec::new("1", "Temperature");
        assert_eq!(spec.cross_refs(), None);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(TreeSpec::from_json("{\"name\": \"no id\"}").is_err());
    }
}
