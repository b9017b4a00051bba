use foundation::NodeId;
use serde::{Deserialize, Serialize};
use tracing::debug;
use tree::Tree;

use crate::filter::RangeQuery;
use crate::links::LinkTable;

/// How several checked source nodes combine when graying the partner tree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    /// A partner node stays live when any source links to it.
    #[default]
    Any,
    /// A partner node stays live only when every source links to it.
    All,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeSide {
    Variables,
    Datasets,
}

impl TreeSide {
    pub fn partner(self) -> Self {
        match self {
            TreeSide::Variables => TreeSide::Datasets,
            TreeSide::Datasets => TreeSide::Variables,
        }
    }
}

/// A linked variable/dataset pair with both sides checked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckedPair {
    pub variable: NodeId,
    pub dataset: NodeId,
    /// Dataset-specific variable id, falling back to the variable id.
    pub query_id: NodeId,
}

/// Sorts `ids` and returns each id whose run of equal values reaches
/// `multiplicity`. A multiplicity of zero selects nothing.
pub fn unique_sort(mut ids: Vec<NodeId>, multiplicity: usize) -> Vec<NodeId> {
    ids.sort();
    let mut out = Vec::new();
    let mut run = 0;
    for i in 0..ids.len() {
        run = if i > 0 && ids[i] == ids[i - 1] { run + 1 } else { 1 };
        if run == multiplicity {
            out.push(ids[i].clone());
        }
    }
    out
}

/// Keeps the variable and dataset trees' overlays in step with each other
/// and with the user's ranges.
#[derive(Debug)]
pub struct Coordinator {
    links: LinkTable,
    mode: CheckMode,
    enabled: bool,
}

impl Coordinator {
    pub fn new(links: LinkTable, mode: CheckMode) -> Self {
        Self {
            links,
            mode,
            enabled: false,
        }
    }

    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    pub fn mode(&self) -> CheckMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CheckMode) {
        self.mode = mode;
    }

    /// Handlers stay inert until the host finishes restoring state.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Grays the whole partner tree, then ungrays every partner node linked
    /// from the checked sources of `source` with the multiplicity the check
    /// mode requires. Returns the ungrayed ids.
    pub fn sync_gray(&self, side: TreeSide, source: &Tree, partner: &mut Tree) -> Vec<NodeId> {
        let sources: Vec<&NodeId> = source
            .iter()
            .filter(|(_, n)| n.has_checkbox() && n.check().is_checked() && n.cross_refs().is_some())
            .map(|(_, n)| n.id())
            .collect();
        let multiplicity = match self.mode {
            CheckMode::Any => 1,
            CheckMode::All => sources.len(),
        };
        let candidates = sources
            .iter()
            .flat_map(|id| self.links.partners(side, id))
            .collect();
        let live = unique_sort(candidates, multiplicity);

        let root = partner.root_id().clone();
        partner.set_grayed(&root, true);
        for id in &live {
            partner.set_grayed(id, false);
        }
        debug!(
            tree = partner.name(),
            sources = sources.len(),
            live = live.len(),
            mode = ?self.mode,
            "partner gray synced"
        );
        live
    }

    /// Clears underlines on both trees, then underlines every dataset whose
    /// limits meet `query` together with the variables linked to it. Returns
    /// the passing dataset ids.
    pub fn sync_underline(
        &self,
        variables: &mut Tree,
        datasets: &mut Tree,
        query: &RangeQuery,
    ) -> Vec<NodeId> {
        let root = variables.root_id().clone();
        variables.set_underlined(&root, false);
        let root = datasets.root_id().clone();
        datasets.set_underlined(&root, false);

        let passing: Vec<NodeId> = datasets
            .iter()
            .filter(|(_, n)| RangeQuery::evaluates(n) && query.passes(n.limits()))
            .map(|(_, n)| n.id().clone())
            .collect();
        for id in &passing {
            datasets.set_underlined(id, true);
            for link in self.links.variables_of(id) {
                variables.set_underlined(&link.variable, true);
            }
        }
        debug!(passing = passing.len(), "underline synced");
        passing
    }

    /// Clears highlights on both trees and highlights every partner node
    /// linked from the subtree of `id`. The source tree's selection is kept;
    /// the partner tree's selection is dropped.
    pub fn highlight_partners(
        &self,
        side: TreeSide,
        id: &NodeId,
        source: &mut Tree,
        partner: &mut Tree,
    ) -> usize {
        source.unhighlight_all();
        partner.unhighlight_all();
        partner.clear_selection();
        let Some(start) = source.index_of(id) else {
            return 0;
        };
        let mut count = 0;
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            let node = source.node(idx);
            for target in self.links.partners(side, node.id()) {
                if partner.highlight(&target) {
                    count += 1;
                }
            }
            stack.extend(node.children().iter().rev().copied());
        }
        count
    }

    /// Linked pairs whose variable and dataset are both checked, in link
    /// order.
    pub fn checked_pairs(&self, variables: &Tree, datasets: &Tree) -> Vec<CheckedPair> {
        let checked = |tree: &Tree, id: &NodeId| {
            tree.get(id)
                .is_some_and(|n| n.has_checkbox() && n.check().is_checked())
        };
        self.links
            .links()
            .iter()
            .filter(|l| checked(variables, &l.variable) && checked(datasets, &l.dataset))
            .map(|l| CheckedPair {
                variable: l.variable.clone(),
                dataset: l.dataset.clone(),
                query_id: l.local_var_id.clone().unwrap_or_else(|| l.variable.clone()),
            })
            .collect()
    }
}
