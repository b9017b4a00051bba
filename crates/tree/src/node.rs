use foundation::{Interval, NodeId, NodeIndex};
use serde::{Deserialize, Serialize};

/// Tri-state checkbox value. The numeric form (`0/1/2`) is what persisted
/// state records carry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CheckState {
    #[default]
    Unchecked,
    Checked,
    Indeterminate,
}

impl CheckState {
    /// Value after a user click: checked goes to unchecked, anything else to
    /// checked.
    pub fn next_on_click(self) -> Self {
        match self {
            CheckState::Checked => CheckState::Unchecked,
            CheckState::Unchecked | CheckState::Indeterminate => CheckState::Checked,
        }
    }

    pub fn from_bool(checked: bool) -> Self {
        if checked {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    }

    pub fn is_checked(self) -> bool {
        self == CheckState::Checked
    }
}

impl From<CheckState> for u8 {
    fn from(s: CheckState) -> u8 {
        match s {
            CheckState::Unchecked => 0,
            CheckState::Checked => 1,
            CheckState::Indeterminate => 2,
        }
    }
}

impl TryFrom<u8> for CheckState {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(CheckState::Unchecked),
            1 => Ok(CheckState::Checked),
            2 => Ok(CheckState::Indeterminate),
            other => Err(format!("invalid check state {other}")),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayState {
    Open,
    #[default]
    Closed,
}

/// Optional bounding ranges: time (ms), depth, latitude, longitude.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub t: Option<Interval>,
    pub z: Option<Interval>,
    pub y: Option<Interval>,
    pub x: Option<Interval>,
}

impl Limits {
    pub fn is_empty(&self) -> bool {
        self.t.is_none() && self.z.is_none() && self.y.is_none() && self.x.is_none()
    }

    pub fn has_spatial(&self) -> bool {
        self.y.is_some() || self.x.is_some()
    }
}

/// Reference from a node to a node of the partner tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossRef {
    pub target: NodeId,
    /// Dataset-specific variable id, when the catalog supplies one.
    pub local_id: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub struct TreeNode {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) children: Vec<NodeIndex>,
    pub(crate) checkbox: bool,
    pub(crate) check: CheckState,
    pub(crate) grayed: bool,
    pub(crate) underlined: bool,
    pub(crate) highlighted: bool,
    pub(crate) display: DisplayState,
    pub(crate) limits: Limits,
    pub(crate) cross_refs: Option<Vec<CrossRef>>,
    pub(crate) catalog_key: Option<String>,
}

impl TreeNode {
    pub(crate) fn new(id: NodeId, name: String) -> Self {
        TreeNode {
            id,
            name,
            parent: None,
            children: Vec::new(),
            checkbox: false,
            check: CheckState::Unchecked,
            grayed: false,
            underlined: false,
            highlighted: false,
            display: DisplayState::Closed,
            limits: Limits::default(),
            cross_refs: None,
            catalog_key: None,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn has_checkbox(&self) -> bool {
        self.checkbox
    }

    pub fn check(&self) -> CheckState {
        self.check
    }

    pub fn is_grayed(&self) -> bool {
        self.grayed
    }

    pub fn is_underlined(&self) -> bool {
        self.underlined
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn display(&self) -> DisplayState {
        self.display
    }

    pub fn is_open(&self) -> bool {
        self.display == DisplayState::Open
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// `None` when the node declares no cross-reference list at all; an empty
    /// slice when it declares an empty one.
    pub fn cross_refs(&self) -> Option<&[CrossRef]> {
        self.cross_refs.as_deref()
    }

    /// Catalog key (`varName` / `dsetName`) used in overlay and views queries.
    pub fn catalog_key(&self) -> Option<&str> {
        self.catalog_key.as_deref()
    }
}
