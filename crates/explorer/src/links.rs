use std::collections::BTreeMap;

use foundation::NodeId;
use tracing::debug;
use tree::Tree;

use crate::coordinator::TreeSide;

/// Variable/dataset association. `local_var_id` is the dataset's own id for
/// the variable, when the catalog supplies one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub variable: NodeId,
    pub dataset: NodeId,
    pub local_var_id: Option<NodeId>,
}

/// Symmetric link table built once from both trees' cross-references.
#[derive(Clone, Debug, Default)]
pub struct LinkTable {
    links: Vec<Link>,
    by_pair: BTreeMap<(NodeId, NodeId), usize>,
    by_variable: BTreeMap<NodeId, Vec<usize>>,
    by_dataset: BTreeMap<NodeId, Vec<usize>>,
}

impl LinkTable {
    /// A pair is linked when either side references the other and both ids
    /// exist. References to unknown ids are dropped.
    pub fn build(variables: &Tree, datasets: &Tree) -> Self {
        let mut table = LinkTable::default();
        for (_, node) in variables.iter() {
            for r in node.cross_refs().unwrap_or_default() {
                if datasets.get(&r.target).is_none() {
                    debug!(variable = %node.id(), dataset = %r.target, "dropping link to unknown dataset");
                    continue;
                }
                table.insert(node.id().clone(), r.target.clone(), r.local_id.clone());
            }
        }
        for (_, node) in datasets.iter() {
            for r in node.cross_refs().unwrap_or_default() {
                if variables.get(&r.target).is_none() {
                    debug!(dataset = %node.id(), variable = %r.target, "dropping link to unknown variable");
                    continue;
                }
                table.insert(r.target.clone(), node.id().clone(), r.local_id.clone());
            }
        }
        debug!(links = table.links.len(), "link table built");
        table
    }

    fn insert(&mut self, variable: NodeId, dataset: NodeId, local_var_id: Option<NodeId>) {
        let key = (variable.clone(), dataset.clone());
        if let Some(&i) = self.by_pair.get(&key) {
            let link = &mut self.links[i];
            if link.local_var_id.is_none() {
                link.local_var_id = local_var_id;
            }
            return;
        }
        let i = self.links.len();
        self.by_pair.insert(key, i);
        self.by_variable.entry(variable.clone()).or_default().push(i);
        self.by_dataset.entry(dataset.clone()).or_default().push(i);
        self.links.push(Link {
            variable,
            dataset,
            local_var_id,
        });
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, variable: &NodeId, dataset: &NodeId) -> Option<&Link> {
        self.by_pair
            .get(&(variable.clone(), dataset.clone()))
            .map(|&i| &self.links[i])
    }

    pub fn datasets_of(&self, variable: &NodeId) -> impl Iterator<Item = &Link> + '_ {
        self.by_variable
            .get(variable)
            .into_iter()
            .flatten()
            .map(|&i| &self.links[i])
    }

    pub fn variables_of(&self, dataset: &NodeId) -> impl Iterator<Item = &Link> + '_ {
        self.by_dataset
            .get(dataset)
            .into_iter()
            .flatten()
            .map(|&i| &self.links[i])
    }

    /// Partner-tree ids linked to `id`, which lives in the `side` tree.
    pub fn partners(&self, side: TreeSide, id: &NodeId) -> Vec<NodeId> {
        match side {
            TreeSide::Variables => self.datasets_of(id).map(|l| l.dataset.clone()).collect(),
            TreeSide::Datasets => self.variables_of(id).map(|l| l.variable.clone()).collect(),
        }
    }
}
