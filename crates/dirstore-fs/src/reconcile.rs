//! Set reconciliation of collection membership.

use std::collections::BTreeSet;

/// One member of a collection as seen by reconciliation.
///
/// Members are ordered by name, ties broken by id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Member {
    pub name: String,
    pub id: String,
}

impl Member {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Outcome of a reconciliation: what was linked and what was unlinked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<Member>,
    pub removed: Vec<Member>,
}

impl ReconcileReport {
    /// Returns `true` if nothing had to change.
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compute the changes turning `current` into `target`.
///
/// Members present in both sets, or in neither, are never part of the plan.
pub fn plan(current: &BTreeSet<Member>, target: &BTreeSet<Member>) -> ReconcileReport {
    ReconcileReport {
        added: target.difference(current).cloned().collect(),
        removed: current.difference(target).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(names: &[&str]) -> BTreeSet<Member> {
        names.iter().map(|n| Member::new(*n, format!("id-{n}"))).collect()
    }

    #[test]
    fn swap_one_member() {
        let report = plan(&set(&["a", "b", "c"]), &set(&["b", "c", "d"]));
        assert_eq!(report.added, vec![Member::new("d", "id-d")]);
        assert_eq!(report.removed, vec![Member::new("a", "id-a")]);
    }

    #[test]
    fn same_name_different_id_is_replaced() {
        let current: BTreeSet<_> = [Member::new("x", "1")].into();
        let target: BTreeSet<_> = [Member::new("x", "2")].into();
        let report = plan(&current, &target);
        assert_eq!(report.added, vec![Member::new("x", "2")]);
        assert_eq!(report.removed, vec![Member::new("x", "1")]);
    }

    #[test]
    fn empty_target_removes_everything() {
        let report = plan(&set(&["a", "b"]), &BTreeSet::new());
        assert!(report.added.is_empty());
        assert_eq!(report.removed.len(), 2);
    }

    fn members() -> impl Strategy<Value = BTreeSet<Member>> {
        proptest::collection::btree_set(("[a-e]", "[0-3]").prop_map(|(n, i)| Member::new(n, i)), 0..8)
    }

    proptest! {
        #[test]
        fn applying_plan_reaches_target(current in members(), target in members()) {
            let report = plan(&current, &target);
            let mut result = current.clone();
            for m in &report.removed {
                prop_assert!(result.remove(m));
            }
            for m in &report.added {
                prop_assert!(result.insert(m.clone()));
            }
            prop_assert_eq!(&result, &target);
            prop_assert!(plan(&result, &target).is_unchanged());
        }
    }
}
