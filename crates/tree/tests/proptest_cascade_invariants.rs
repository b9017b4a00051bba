//! Property tests for tree cascades.
//!
//! 1. After any sequence of clicks, every checkbox node with checkable nodes
//!    below it agrees with the state its children imply.
//! 2. After any sequence of gray/underline writes, interior nodes hold the
//!    AND (gray) / OR (underline) of their children.
//! 3. Gray/underline writes are idempotent.
//! 4. Serialized state restores to identical check/display values.

use foundation::{NodeId, NodeIndex};
use proptest::prelude::*;
use tree::{CascadeConfig, CheckState, Tree, TreeSpec};

// ── Helpers ─────────────────────────────────────────────────────────────

/// Random tree as a parent vector (node `i` hangs below some `j < i`) plus
/// per-node checkbox flags.
fn shape_strategy() -> impl Strategy<Value = (Vec<usize>, Vec<bool>)> {
    (2usize..24).prop_flat_map(|n| {
        let parents: Vec<_> = (1..n).map(|i| 0..i).collect();
        (parents, prop::collection::vec(prop::bool::weighted(0.8), n))
    })
}

fn build((parents, checkbox): &(Vec<usize>, Vec<bool>)) -> Tree {
    let n = checkbox.len();
    let mut specs: Vec<Option<TreeSpec>> = (0..n)
        .map(|i| {
            let mut s = TreeSpec::new(i as u64, format!("node {i}"));
            s.checkbox = Some(checkbox[i]);
            Some(s)
        })
        .collect();
    for i in (1..n).rev() {
        let child = specs[i].take().unwrap();
        specs[parents[i - 1]].as_mut().unwrap().children.insert(0, child);
    }
    let root = specs[0].take().unwrap();
    Tree::build("t", &root, CascadeConfig::default()).unwrap()
}

fn implied(tree: &Tree, idx: NodeIndex) -> Option<CheckState> {
    let mut seen = false;
    let mut all = true;
    let mut any = false;
    for c in tree.node(idx).children() {
        let child = tree.node(*c);
        let s = if child.has_checkbox() {
            Some(child.check())
        } else {
            implied(tree, *c)
        };
        let Some(s) = s else { continue };
        seen = true;
        all &= s == CheckState::Checked;
        any |= s != CheckState::Unchecked;
    }
    match (seen, all, any) {
        (false, _, _) => None,
        (true, true, _) => Some(CheckState::Checked),
        (true, false, true) => Some(CheckState::Indeterminate),
        (true, false, false) => Some(CheckState::Unchecked),
    }
}

fn id(i: usize) -> NodeId {
    NodeId::from(i as u64)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Tri-state soundness
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn check_states_agree_with_children(
        shape in shape_strategy(),
        clicks in prop::collection::vec(0usize..24, 0..40),
    ) {
        let mut tree = build(&shape);
        for c in clicks {
            tree.toggle_check(&id(c));
        }
        for (idx, node) in tree.iter() {
            if !node.has_checkbox() {
                continue;
            }
            if let Some(expected) = implied(&tree, idx) {
                prop_assert_eq!(node.check(), expected, "node {}", node.id());
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Gray / underline dominance
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn overlays_reduce_over_children(
        shape in shape_strategy(),
        writes in prop::collection::vec((0usize..24, any::<bool>(), any::<bool>()), 0..40),
    ) {
        let mut tree = build(&shape);
        for (node, gray, value) in writes {
            if gray {
                tree.set_grayed(&id(node), value);
            } else {
                tree.set_underlined(&id(node), value);
            }
        }
        let root = tree.root();
        let interior = tree
            .registry()
            .iter()
            .copied()
            .chain(std::iter::once(root))
            .filter(|idx| !tree.node(*idx).is_leaf());
        for idx in interior {
            let node = tree.node(idx);
            let kids = node.children();
            prop_assert_eq!(node.is_grayed(), kids.iter().all(|c| tree.node(*c).is_grayed()));
            prop_assert_eq!(node.is_underlined(), kids.iter().any(|c| tree.node(*c).is_underlined()));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn repeated_gray_write_changes_nothing(shape in shape_strategy(), target in 0usize..24) {
        let mut tree = build(&shape);
        tree.set_grayed(&id(target), true);
        let once: Vec<bool> = tree.iter().map(|(_, n)| n.is_grayed()).collect();
        tree.set_grayed(&id(target), true);
        let twice: Vec<bool> = tree.iter().map(|(_, n)| n.is_grayed()).collect();
        prop_assert_eq!(once, twice);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Persistence round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn state_survives_round_trip(
        shape in shape_strategy(),
        clicks in prop::collection::vec(0usize..24, 0..20),
        opens in prop::collection::vec(0usize..24, 0..10),
    ) {
        let mut tree = build(&shape);
        for c in clicks {
            tree.toggle_check(&id(c));
        }
        for o in opens {
            tree.toggle_open(&id(o));
        }
        let blob = tree.serialize_state().unwrap();
        let mut fresh = build(&shape);
        fresh.restore_state(&blob).unwrap();
        for (_, node) in tree.iter() {
            let other = fresh.get(node.id()).unwrap();
            prop_assert_eq!(other.check(), node.check());
            prop_assert_eq!(other.display(), node.display());
        }
    }
}
