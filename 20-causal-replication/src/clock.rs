//! Vector clock algebra.
//!
//! A [`VectorClock`] maps node identifiers to logical counters. Missing
//! entries count as zero, so `{A:1}` and `{A:1, B:0}` describe the same
//! causal history. The two primitives every other module builds on are
//! [`VectorClock::merged`] (the semilattice join) and
//! [`VectorClock::dominates_or_equal`] (the partial order).
//!
//! The free functions [`merge`] and [`dominates_or_equal`] accept optional
//! clocks for call sites where the caller may not have one yet, e.g. a
//! client that has never read anything.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// How one clock relates to another under causal dominance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CausalOrder {
    /// Both clocks describe the same history.
    Equal,
    /// `self` is strictly dominated by `other`.
    Before,
    /// `self` strictly dominates `other`.
    After,
    /// Neither dominates: a true conflict.
    Concurrent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorClock {
    versions: BTreeMap<String, u64>,
}

impl VectorClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter contributed by `node`, zero when absent.
    pub fn get(&self, node: &str) -> u64 {
        self.versions.get(node).copied().unwrap_or(0)
    }

    /// Bumps `node`'s counter by exactly one and returns the new value.
    ///
    /// Returns `None` and leaves the clock untouched when the counter is
    /// already at `u64::MAX`.
    pub fn increment(&mut self, node: &str) -> Option<u64> {
        let counter = self.versions.entry(node.to_string()).or_insert(0);
        *counter = counter.checked_add(1)?;
        Some(*counter)
    }

    /// Folds `other` into `self`, keeping the component-wise maximum.
    pub fn merge(&mut self, other: &VectorClock) {
        for (node, &counter) in &other.versions {
            let entry = self.versions.entry(node.clone()).or_insert(0);
            *entry = (*entry).max(counter);
        }
    }

    pub fn merged(&self, other: &VectorClock) -> VectorClock {
        let mut joined = self.clone();
        joined.merge(other);
        joined
    }

    /// True when every counter in `other` is at most the matching counter in `self`.
    pub fn dominates_or_equal(&self, other: &VectorClock) -> bool {
        other
            .versions
            .iter()
            .all(|(node, &counter)| self.get(node) >= counter)
    }

    pub fn compare(&self, other: &VectorClock) -> CausalOrder {
        match (self.dominates_or_equal(other), other.dominates_or_equal(self)) {
            (true, true) => CausalOrder::Equal,
            (true, false) => CausalOrder::After,
            (false, true) => CausalOrder::Before,
            (false, false) => CausalOrder::Concurrent,
        }
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for VectorClock {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self {
            versions: iter
                .into_iter()
                .map(|(node, counter)| (node.into(), counter))
                .collect(),
        }
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (node, counter)) in self.versions.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{node}:{counter}")?;
        }
        f.write_str("}")
    }
}

/// Join of two possibly-missing clocks; a missing clock acts as the empty one.
pub fn merge(a: Option<&VectorClock>, b: Option<&VectorClock>) -> VectorClock {
    let mut joined = a.cloned().unwrap_or_default();
    if let Some(b) = b {
        joined.merge(b);
    }
    joined
}

/// Dominance over possibly-missing clocks.
///
/// A missing `b` is trivially dominated. A missing `a` dominates nothing
/// that is present, not even an empty clock.
pub fn dominates_or_equal(a: Option<&VectorClock>, b: Option<&VectorClock>) -> bool {
    match (a, b) {
        (_, None) => true,
        (None, Some(_)) => false,
        (Some(a), Some(b)) => a.dominates_or_equal(b),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn clock(entries: &[(&str, u64)]) -> VectorClock {
        entries.iter().map(|&(node, counter)| (node, counter)).collect()
    }

    fn arb_clock() -> impl Strategy<Value = VectorClock> {
        prop::collection::btree_map(prop::sample::select(vec!["A", "B", "C", "D"]), 0u64..6, 0..4)
            .prop_map(|versions| versions.into_iter().collect())
    }

    proptest! {
        #[test]
        fn merge_is_commutative(a in arb_clock(), b in arb_clock()) {
            prop_assert!(a.merged(&b).compare(&b.merged(&a)) == CausalOrder::Equal);
        }

        #[test]
        fn merge_is_associative(a in arb_clock(), b in arb_clock(), c in arb_clock()) {
            let left = a.merged(&b).merged(&c);
            let right = a.merged(&b.merged(&c));
            prop_assert_eq!(left.compare(&right), CausalOrder::Equal);
        }

        #[test]
        fn merge_is_idempotent(a in arb_clock()) {
            prop_assert_eq!(a.merged(&a), a);
        }

        #[test]
        fn merge_dominates_both_inputs(a in arb_clock(), b in arb_clock()) {
            let joined = a.merged(&b);
            prop_assert!(joined.dominates_or_equal(&a));
            prop_assert!(joined.dominates_or_equal(&b));
        }

        #[test]
        fn anything_dominates_empty_or_missing(a in arb_clock()) {
            prop_assert!(a.dominates_or_equal(&VectorClock::new()));
            prop_assert!(dominates_or_equal(Some(&a), None));
        }

        #[test]
        fn optional_merge_matches_method(a in arb_clock(), b in arb_clock()) {
            prop_assert_eq!(merge(Some(&a), Some(&b)), a.merged(&b));
            prop_assert_eq!(merge(None, Some(&b)), b.clone());
            prop_assert_eq!(merge(Some(&a), None), a.clone());
        }
    }

    #[test]
    fn missing_clock_dominates_nothing_present() {
        assert!(!dominates_or_equal(None, Some(&clock(&[("A", 1)]))));
        assert!(!dominates_or_equal(None, Some(&VectorClock::new())));
        assert!(dominates_or_equal(None, None));
    }

    #[test]
    fn absent_keys_count_as_zero() {
        let a = clock(&[("A", 1)]);
        let b = clock(&[("A", 1), ("B", 0)]);
        assert_eq!(a.compare(&b), CausalOrder::Equal);
        assert_eq!(a.get("Z"), 0);
    }

    #[test]
    fn compare_classifies_all_orders() {
        let a1 = clock(&[("A", 1)]);
        let a2 = clock(&[("A", 2)]);
        let b1 = clock(&[("B", 1)]);

        assert_eq!(a2.compare(&a1), CausalOrder::After);
        assert_eq!(a1.compare(&a2), CausalOrder::Before);
        assert_eq!(a1.compare(&b1), CausalOrder::Concurrent);
        assert_eq!(a1.compare(&a1.clone()), CausalOrder::Equal);
    }

    #[test]
    fn increment_bumps_single_counter() {
        let mut c = VectorClock::new();
        c.increment("A");
        assert_eq!(c, clock(&[("A", 1)]));
        c.increment("A");
        c.increment("B");
        assert_eq!(c, clock(&[("A", 2), ("B", 1)]));
    }

    #[test]
    fn increment_refuses_to_wrap() {
        let mut c = clock(&[("A", u64::MAX), ("B", 1)]);
        assert_eq!(c.increment("A"), None);
        assert_eq!(c, clock(&[("A", u64::MAX), ("B", 1)]));
        assert_eq!(c.increment("B"), Some(2));
    }

    #[test]
    fn display_lists_sorted_entries() {
        assert_eq!(clock(&[("B", 1), ("A", 3)]).to_string(), "{A:3, B:1}");
        assert_eq!(VectorClock::new().to_string(), "{}");
    }
}
