use std::collections::{BTreeMap, HashMap};

use foundation::{Arena, Interval, NodeId, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TreeError;
use crate::node::{CheckState, DisplayState, TreeNode};
use crate::spec::TreeSpec;

/// Direction switches for every cascade (check, gray, underline, highlight).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    pub down: bool,
    pub up: bool,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            down: true,
            up: true,
        }
    }
}

/// Persisted per-node state. `None` fields leave the live node untouched on
/// restore.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub id: NodeId,
    #[serde(default)]
    pub open: Option<DisplayState>,
    #[serde(default)]
    pub check: Option<CheckState>,
}

/// DOM element roles a renderer attaches to a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Title,
    Submenu,
    Handler,
    Checkbox,
}

pub fn element_id(tree: &str, kind: ElementKind, id: &NodeId) -> String {
    match kind {
        ElementKind::Title => format!("{tree}Title{id}"),
        ElementKind::Submenu => format!("{tree}Node{id}sub"),
        ElementKind::Handler => format!("{tree}Handler{id}"),
        ElementKind::Checkbox => format!("{tree}checkbox{id}"),
    }
}

#[derive(Copy, Clone, Debug)]
enum Overlay {
    Grayed,
    Underlined,
}

impl Overlay {
    fn get(self, node: &TreeNode) -> bool {
        match self {
            Overlay::Grayed => node.grayed,
            Overlay::Underlined => node.underlined,
        }
    }

    fn set(self, node: &mut TreeNode, value: bool) {
        match self {
            Overlay::Grayed => node.grayed = value,
            Overlay::Underlined => node.underlined = value,
        }
    }

    // Interior value: grayed when every child is grayed, underlined when any is.
    fn reduce(self, mut children: impl Iterator<Item = bool>) -> bool {
        match self {
            Overlay::Grayed => children.all(|v| v),
            Overlay::Underlined => children.any(|v| v),
        }
    }
}

/// Hierarchical checkbox tree.
///
/// Nodes live in an arena and are addressed by [`NodeIndex`]; the public API
/// takes catalog ids and treats unknown ids as no-ops.
#[derive(Debug, Clone)]
pub struct Tree {
    name: String,
    nodes: Arena<TreeNode>,
    root: NodeIndex,
    registry: Vec<NodeIndex>,
    by_id: HashMap<NodeId, NodeIndex>,
    records: BTreeMap<NodeId, StateRecord>,
    selected: Option<NodeIndex>,
    config: CascadeConfig,
}

impl Tree {
    /// Builds the tree depth-first from `spec`.
    ///
    /// Non-root nodes are registered parents-first in document order. Any
    /// `error` entry aborts the build.
    pub fn build(
        name: impl Into<String>,
        spec: &TreeSpec,
        config: CascadeConfig,
    ) -> Result<Self, TreeError> {
        let mut tree = Tree {
            name: name.into(),
            nodes: Arena::new(),
            root: NodeIndex::new(0),
            registry: Vec::new(),
            by_id: HashMap::new(),
            records: BTreeMap::new(),
            selected: None,
            config,
        };
        tree.root = tree.alloc_node(spec, None)?;
        tree.build_children(spec, tree.root)?;
        info!(tree = %tree.name, nodes = tree.nodes.len(), "tree built");
        Ok(tree)
    }

    fn alloc_node(
        &mut self,
        spec: &TreeSpec,
        parent: Option<NodeIndex>,
    ) -> Result<NodeIndex, TreeError> {
        if let Some(message) = &spec.error {
            return Err(TreeError::Spec {
                node: spec.id.clone(),
                message: message.clone(),
            });
        }
        if self.by_id.contains_key(&spec.id) {
            return Err(TreeError::DuplicateId(spec.id.clone()));
        }
        let mut node = TreeNode::new(spec.id.clone(), spec.name.clone());
        node.parent = parent;
        node.checkbox = parent.is_some() && spec.checkbox.unwrap_or(true);
        node.limits = spec.limits();
        node.cross_refs = spec.cross_refs();
        node.catalog_key = spec.catalog_key();
        let idx = self.nodes.alloc(node);
        self.by_id.insert(spec.id.clone(), idx);
        Ok(idx)
    }

    fn build_children(&mut self, spec: &TreeSpec, parent: NodeIndex) -> Result<(), TreeError> {
        for child in &spec.children {
            let idx = self.alloc_node(child, Some(parent))?;
            self.registry.push(idx);
            self.nodes[parent].children.push(idx);
            self.build_children(child, idx)?;
        }
        self.aggregate_limits(parent);
        Ok(())
    }

    // Interior nodes without their own time/depth range inherit the hull of
    // their children's ranges.
    fn aggregate_limits(&mut self, idx: NodeIndex) {
        let children = &self.nodes[idx].children;
        if children.is_empty() {
            return;
        }
        let t = hull(children.iter().filter_map(|c| self.nodes[*c].limits.t));
        let z = hull(children.iter().filter_map(|c| self.nodes[*c].limits.z));
        let limits = &mut self.nodes[idx].limits;
        if limits.t.is_none() {
            limits.t = t;
        }
        if limits.z.is_none() {
            limits.z = z;
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> CascadeConfig {
        self.config
    }

    pub fn set_config(&mut self, config: CascadeConfig) {
        self.config = config;
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn root_id(&self) -> &NodeId {
        &self.nodes[self.root].id
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Non-root nodes in construction order.
    pub fn registry(&self) -> &[NodeIndex] {
        &self.registry
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &TreeNode)> + '_ {
        self.registry.iter().map(|idx| (*idx, &self.nodes[*idx]))
    }

    pub fn node(&self, idx: NodeIndex) -> &TreeNode {
        &self.nodes[idx]
    }

    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, id: &NodeId) -> Option<&TreeNode> {
        self.index_of(id).map(|idx| &self.nodes[idx])
    }

    pub fn element_id(&self, kind: ElementKind, id: &NodeId) -> String {
        element_id(&self.name, kind, id)
    }

    fn lookup(&self, id: &NodeId) -> Option<NodeIndex> {
        let idx = self.index_of(id);
        if idx.is_none() {
            debug!(tree = %self.name, %id, "ignoring unknown node id");
        }
        idx
    }

    fn checkable(&self, id: &NodeId) -> Option<NodeIndex> {
        let idx = self.lookup(id)?;
        let node = &self.nodes[idx];
        if node.is_root() || !node.checkbox {
            debug!(tree = %self.name, %id, "node has no checkbox");
            return None;
        }
        Some(idx)
    }

    // ── Check state ─────────────────────────────────────────────────────

    /// User click on a checkbox. Returns the node's new state, or `None` when
    /// the id is unknown or the node has no checkbox.
    pub fn toggle_check(&mut self, id: &NodeId) -> Option<CheckState> {
        let idx = self.checkable(id)?;
        let next = self.nodes[idx].check.next_on_click();
        self.apply_check(idx, next);
        Some(next)
    }

    pub fn set_check(&mut self, id: &NodeId, checked: bool) -> Option<CheckState> {
        let idx = self.checkable(id)?;
        let state = CheckState::from_bool(checked);
        self.apply_check(idx, state);
        Some(state)
    }

    fn apply_check(&mut self, idx: NodeIndex, state: CheckState) {
        self.nodes[idx].check = state;
        if self.config.down {
            self.cascade_check_down(idx, state);
        }
        if self.config.up {
            self.cascade_check_up(idx);
        }
    }

    // Non-checkbox nodes are passed through, not written.
    fn cascade_check_down(&mut self, idx: NodeIndex, state: CheckState) {
        let mut stack = self.nodes[idx].children.clone();
        while let Some(c) = stack.pop() {
            let node = &mut self.nodes[c];
            if node.checkbox {
                node.check = state;
            }
            stack.extend_from_slice(&node.children);
        }
    }

    fn cascade_check_up(&mut self, idx: NodeIndex) {
        let mut cur = self.nodes[idx].parent;
        while let Some(p) = cur {
            if self.nodes[p].is_root() {
                break;
            }
            if self.nodes[p].checkbox {
                if let Some(state) = self.reduce_children(p) {
                    self.nodes[p].check = state;
                }
            }
            cur = self.nodes[p].parent;
        }
    }

    /// Check value implied by the children of `idx`, or `None` when no
    /// checkable node sits below it. Non-checkbox children contribute the
    /// value implied by their own subtree.
    fn reduce_children(&self, idx: NodeIndex) -> Option<CheckState> {
        let mut seen = false;
        let mut all_checked = true;
        let mut any_set = false;
        for c in &self.nodes[idx].children {
            let child = &self.nodes[*c];
            let state = if child.checkbox {
                Some(child.check)
            } else {
                self.reduce_children(*c)
            };
            let Some(state) = state else { continue };
            seen = true;
            all_checked &= state == CheckState::Checked;
            any_set |= state != CheckState::Unchecked;
        }
        if !seen {
            None
        } else if all_checked {
            Some(CheckState::Checked)
        } else if any_set {
            Some(CheckState::Indeterminate)
        } else {
            Some(CheckState::Unchecked)
        }
    }

    /// Ids of checked checkbox nodes, in registry order.
    pub fn checked_ids(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, n)| n.checkbox && n.check.is_checked())
            .map(|(_, n)| n.id.clone())
            .collect()
    }

    pub fn checked_leaf_ids(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, n)| n.checkbox && n.check.is_checked() && n.is_leaf())
            .map(|(_, n)| n.id.clone())
            .collect()
    }

    /// Non-root nodes satisfying `pred`, in registry order.
    pub fn nodes_matching<F>(&self, pred: F) -> Vec<NodeIndex>
    where
        F: Fn(&TreeNode) -> bool,
    {
        self.iter()
            .filter(|(_, n)| pred(n))
            .map(|(idx, _)| idx)
            .collect()
    }

    // ── Gray / underline ────────────────────────────────────────────────

    /// Returns `false` when the id is unknown.
    pub fn set_grayed(&mut self, id: &NodeId, value: bool) -> bool {
        self.set_overlay(id, Overlay::Grayed, value)
    }

    pub fn set_underlined(&mut self, id: &NodeId, value: bool) -> bool {
        self.set_overlay(id, Overlay::Underlined, value)
    }

    fn set_overlay(&mut self, id: &NodeId, overlay: Overlay, value: bool) -> bool {
        let Some(idx) = self.lookup(id) else {
            return false;
        };
        overlay.set(&mut self.nodes[idx], value);
        if self.config.down {
            let mut stack = self.nodes[idx].children.clone();
            while let Some(c) = stack.pop() {
                overlay.set(&mut self.nodes[c], value);
                stack.extend_from_slice(&self.nodes[c].children);
            }
        }
        if self.config.up {
            let mut cur = self.nodes[idx].parent;
            while let Some(p) = cur {
                let node = &self.nodes[p];
                let next = overlay.reduce(node.children.iter().map(|c| overlay.get(&self.nodes[*c])));
                if next == overlay.get(node) {
                    break;
                }
                overlay.set(&mut self.nodes[p], next);
                cur = self.nodes[p].parent;
            }
        }
        true
    }

    // ── Display and selection ───────────────────────────────────────────

    pub fn open(&mut self, id: &NodeId) -> Option<DisplayState> {
        self.set_display(id, DisplayState::Open)
    }

    pub fn close(&mut self, id: &NodeId) -> Option<DisplayState> {
        self.set_display(id, DisplayState::Closed)
    }

    pub fn toggle_open(&mut self, id: &NodeId) -> Option<DisplayState> {
        let idx = self.lookup(id)?;
        let next = match self.nodes[idx].display {
            DisplayState::Open => DisplayState::Closed,
            DisplayState::Closed => DisplayState::Open,
        };
        self.nodes[idx].display = next;
        Some(next)
    }

    fn set_display(&mut self, id: &NodeId, state: DisplayState) -> Option<DisplayState> {
        let idx = self.lookup(id)?;
        self.nodes[idx].display = state;
        Some(state)
    }

    pub fn select(&mut self, id: &NodeId) -> bool {
        let Some(idx) = self.lookup(id) else {
            return false;
        };
        self.selected = Some(idx);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&TreeNode> {
        self.selected.map(|idx| &self.nodes[idx])
    }

    /// Highlights `id` and, with upward cascading, its non-root ancestors.
    /// Stops at the first node that is already highlighted.
    pub fn highlight(&mut self, id: &NodeId) -> bool {
        let Some(idx) = self.lookup(id) else {
            return false;
        };
        let up = self.config.up;
        let mut cur = Some(idx);
        while let Some(i) = cur {
            let node = &mut self.nodes[i];
            if node.is_root() || node.highlighted {
                break;
            }
            node.highlighted = true;
            cur = if up { node.parent } else { None };
        }
        true
    }

    pub fn unhighlight_all(&mut self) {
        for idx in &self.registry {
            self.nodes[*idx].highlighted = false;
        }
    }

    pub fn highlighted_ids(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, n)| n.highlighted)
            .map(|(_, n)| n.id.clone())
            .collect()
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Records currently held for ids that match no live node.
    pub fn dormant_records(&self) -> Vec<&StateRecord> {
        self.records
            .values()
            .filter(|r| !self.by_id.contains_key(&r.id))
            .collect()
    }

    /// JSON list of `{id, open, check}` records: live nodes with non-default
    /// state plus retained records for unknown ids.
    pub fn serialize_state(&self) -> Result<String, TreeError> {
        let mut records = self.records.clone();
        for (_, node) in self.nodes.iter() {
            records.remove(&node.id);
            let open = node.is_open().then_some(DisplayState::Open);
            let check = (node.checkbox && node.check != CheckState::Unchecked).then_some(node.check);
            if open.is_some() || check.is_some() {
                records.insert(
                    node.id.clone(),
                    StateRecord {
                        id: node.id.clone(),
                        open,
                        check,
                    },
                );
            }
        }
        let list: Vec<StateRecord> = records.into_values().collect();
        serde_json::to_string(&list).map_err(|e| TreeError::State(e.to_string()))
    }

    /// Replaces the held records with `text` and applies those that match
    /// live nodes. Check values are written without cascading.
    ///
    /// Returns the number of records applied to live nodes.
    pub fn restore_state(&mut self, text: &str) -> Result<usize, TreeError> {
        let list: Vec<StateRecord> = if text.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(text).map_err(|e| TreeError::State(e.to_string()))?
        };
        self.records = list.into_iter().map(|r| (r.id.clone(), r)).collect();

        let mut applied = 0;
        for record in self.records.values() {
            let Some(idx) = self.by_id.get(&record.id).copied() else {
                continue;
            };
            let node = &mut self.nodes[idx];
            if let Some(check) = record.check {
                if node.checkbox {
                    node.check = check;
                }
            }
            if let Some(open) = record.open {
                node.display = open;
            }
            applied += 1;
        }
        debug!(tree = %self.name, applied, held = self.records.len(), "state restored");
        Ok(applied)
    }
}

// Hull of the given ranges, kept only when it has positive span.
fn hull(ranges: impl Iterator<Item = Interval>) -> Option<Interval> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for r in ranges {
        lo = lo.min(r.lo);
        hi = hi.max(r.hi);
    }
    (lo < hi).then(|| Interval::new(lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn variables() -> Tree {
        let spec = TreeSpec::from_json(
            r#"{"id": 0, "name": "Variables", "children": [
                {"id": 1, "name": "Physical", "children": [
                    {"id": 11, "name": "Temperature", "varName": "temp", "datasets": [{"id": 101}]},
                    {"id": 12, "name": "Salinity", "varName": "sal", "datasets": [{"id": 101}, {"id": 102}]}
                ]},
                {"id": 2, "name": "Chlorophyll", "varName": "chl", "datasets": [{"id": 102}]}
            ]}"#,
        )
        .unwrap();
        Tree::build("variableTree", &spec, CascadeConfig::default()).unwrap()
    }

    fn state(tree: &Tree, s: &str) -> CheckState {
        tree.get(&id(s)).unwrap().check()
    }

    #[test]
    fn registry_is_depth_first_document_order() {
        let tree = variables();
        let ids: Vec<&str> = tree.iter().map(|(_, n)| n.id().as_str()).collect();
        assert_eq!(ids, vec!["1", "11", "12", "2"]);
        assert_eq!(tree.len(), 5);
        assert!(!tree.node(tree.root()).has_checkbox());
    }

    #[test]
    fn error_entry_aborts_build() {
        let spec = TreeSpec::from_json(
            r#"{"id": 0, "children": [{"id": 1, "children": [{"id": 2, "error": "catalog offline"}]}]}"#,
        )
        .unwrap();
        let err = Tree::build("t", &spec, CascadeConfig::default()).unwrap_err();
        assert_eq!(
            err,
            TreeError::Spec {
                node: id("2"),
                message: "catalog offline".to_string()
            }
        );
    }

    #[test]
    fn duplicate_ids_abort_build() {
        let spec = TreeSpec::new("0", "root")
            .with_child(TreeSpec::new("1", "a"))
            .with_child(TreeSpec::new(1u64, "b"));
        let err = Tree::build("t", &spec, CascadeConfig::default()).unwrap_err();
        assert_eq!(err, TreeError::DuplicateId(id("1")));
    }

    #[test]
    fn check_cascades_both_ways() {
        let mut tree = variables();
        assert_eq!(tree.toggle_check(&id("11")), Some(CheckState::Checked));
        assert_eq!(state(&tree, "1"), CheckState::Indeterminate);

        tree.toggle_check(&id("12"));
        assert_eq!(state(&tree, "1"), CheckState::Checked);

        assert_eq!(tree.toggle_check(&id("1")), Some(CheckState::Unchecked));
        assert_eq!(state(&tree, "11"), CheckState::Unchecked);
        assert_eq!(state(&tree, "12"), CheckState::Unchecked);
    }

    #[test]
    fn indeterminate_parent_click_checks_subtree() {
        let mut tree = variables();
        tree.toggle_check(&id("11"));
        assert_eq!(tree.toggle_check(&id("1")), Some(CheckState::Checked));
        assert_eq!(tree.checked_leaf_ids(), vec![id("11"), id("12")]);
        assert_eq!(tree.checked_ids(), vec![id("1"), id("11"), id("12")]);
    }

    #[test]
    fn root_and_unknown_ids_are_ignored() {
        let mut tree = variables();
        assert_eq!(tree.toggle_check(&id("0")), None);
        assert_eq!(tree.toggle_check(&id("999")), None);
        assert!(!tree.set_grayed(&id("999"), true));
        assert!(tree.checked_ids().is_empty());
    }

    #[test]
    fn cascade_passes_through_non_checkbox_nodes() {
        let spec = TreeSpec::from_json(
            r#"{"id": 0, "children": [{"id": 1, "children": [
                {"id": 2, "checkbox": false, "children": [{"id": 3}, {"id": 4}]}
            ]}]}"#,
        )
        .unwrap();
        let mut tree = Tree::build("t", &spec, CascadeConfig::default()).unwrap();
        tree.toggle_check(&id("1"));
        assert_eq!(state(&tree, "3"), CheckState::Checked);
        assert_eq!(state(&tree, "4"), CheckState::Checked);
        assert_eq!(state(&tree, "2"), CheckState::Unchecked);

        tree.toggle_check(&id("3"));
        assert_eq!(state(&tree, "1"), CheckState::Indeterminate);
    }

    #[test]
    fn node_without_checkable_children_keeps_own_state() {
        let spec = TreeSpec::from_json(
            r#"{"id": 0, "children": [{"id": 1, "children": [{"id": 2, "checkbox": false}]}]}"#,
        )
        .unwrap();
        let mut tree = Tree::build("t", &spec, CascadeConfig::default()).unwrap();
        assert_eq!(tree.toggle_check(&id("1")), Some(CheckState::Checked));
        assert_eq!(state(&tree, "1"), CheckState::Checked);
        assert_eq!(tree.toggle_check(&id("2")), None);
    }

    #[test]
    fn upward_cascade_can_be_disabled() {
        let mut tree = variables();
        tree.set_config(CascadeConfig {
            down: true,
            up: false,
        });
        tree.toggle_check(&id("11"));
        assert_eq!(state(&tree, "1"), CheckState::Unchecked);
    }

    #[test]
    fn gray_root_then_ungray_one_leaf() {
        let mut tree = variables();
        tree.set_grayed(&id("0"), true);
        assert!(tree.iter().all(|(_, n)| n.is_grayed()));

        tree.set_grayed(&id("12"), false);
        let grayed = |s: &str| tree.get(&id(s)).unwrap().is_grayed();
        assert!(!grayed("12"));
        assert!(!grayed("1"));
        assert!(!grayed("0"));
        assert!(grayed("11"));
        assert!(grayed("2"));
    }

    #[test]
    fn underline_is_any_of_children() {
        let mut tree = variables();
        tree.set_underlined(&id("11"), true);
        let underlined = |t: &Tree, s: &str| t.get(&id(s)).unwrap().is_underlined();
        assert!(underlined(&tree, "1"));
        assert!(underlined(&tree, "0"));
        assert!(!underlined(&tree, "2"));

        tree.set_underlined(&id("0"), false);
        assert!(tree.iter().all(|(_, n)| !n.is_underlined()));
    }

    #[test]
    fn highlight_marks_ancestors_but_not_root() {
        let mut tree = variables();
        tree.select(&id("11"));
        tree.highlight(&id("12"));
        assert_eq!(tree.highlighted_ids(), vec![id("1"), id("12")]);
        assert!(!tree.node(tree.root()).is_highlighted());

        tree.unhighlight_all();
        assert!(tree.highlighted_ids().is_empty());
        assert_eq!(tree.selected().map(|n| n.id().clone()), Some(id("11")));
    }

    #[test]
    fn state_round_trip() {
        let mut tree = variables();
        tree.toggle_check(&id("11"));
        tree.open(&id("1"));
        let blob = tree.serialize_state().unwrap();

        let mut fresh = variables();
        assert_eq!(fresh.restore_state(&blob).unwrap(), 2);
        for (_, n) in tree.iter() {
            let other = fresh.get(n.id()).unwrap();
            assert_eq!(other.check(), n.check(), "node {}", n.id());
            assert_eq!(other.display(), n.display(), "node {}", n.id());
        }
    }

    #[test]
    fn unmatched_records_stay_dormant() {
        let mut tree = variables();
        tree.restore_state(r#"[{"id": "77", "open": "open", "check": 1}, {"id": 2, "check": 1}]"#)
            .unwrap();
        assert_eq!(state(&tree, "2"), CheckState::Checked);
        assert_eq!(tree.dormant_records().len(), 1);

        tree.toggle_check(&id("2"));
        let blob = tree.serialize_state().unwrap();
        let records: Vec<StateRecord> = serde_json::from_str(&blob).unwrap();
        assert_eq!(
            records,
            vec![StateRecord {
                id: id("77"),
                open: Some(DisplayState::Open),
                check: Some(CheckState::Checked),
            }]
        );
    }

    #[test]
    fn restore_does_not_cascade() {
        let mut tree = variables();
        tree.restore_state(r#"[{"id": 11, "check": 1}]"#).unwrap();
        assert_eq!(state(&tree, "11"), CheckState::Checked);
        assert_eq!(state(&tree, "1"), CheckState::Unchecked);
    }

    #[test]
    fn restore_rejects_garbage() {
        let mut tree = variables();
        assert!(matches!(tree.restore_state("not json"), Err(TreeError::State(_))));
        assert_eq!(tree.restore_state("  ").unwrap(), 0);
    }

    #[test]
    fn interior_limits_are_aggregated() {
        let spec = TreeSpec::from_json(
            r#"{"id": 0, "children": [{"id": 1, "children": [
                {"id": 2, "tLo": 100, "tHi": 200, "zLo": 5, "zHi": 5},
                {"id": 3, "tLo": 150, "tHi": 400}
            ]}]}"#,
        )
        .unwrap();
        let tree = Tree::build("datasetTree", &spec, CascadeConfig::default()).unwrap();
        let folder = tree.get(&id("1")).unwrap();
        assert_eq!(folder.limits().t, Some(Interval::new(100.0, 400.0)));
        // Degenerate hull is dropped.
        assert_eq!(folder.limits().z, None);
    }

    #[test]
    fn element_ids_follow_tree_name() {
        let tree = variables();
        assert_eq!(tree.element_id(ElementKind::Title, &id("11")), "variableTreeTitle11");
        assert_eq!(tree.element_id(ElementKind::Submenu, &id("1")), "variableTreeNode1sub");
        assert_eq!(tree.element_id(ElementKind::Handler, &id("1")), "variableTreeHandler1");
        assert_eq!(tree.element_id(ElementKind::Checkbox, &id("2")), "variableTreecheckbox2");
    }
}
