//! Per-department tallies and the merge reducer
//!
//! `merge` is a key-wise sum, so it is associative and commutative and
//! partial results can be combined in whatever order workers finish.

use std::collections::BTreeMap;

/// Order counts for one department
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepartmentTally {
    pub orders: u64,
    /// Orders whose reorder flag was 0; never exceeds `orders`
    pub first_orders: u64,
}

impl DepartmentTally {
    pub fn combine(self, other: Self) -> Self {
        Self {
            orders: self.orders.saturating_add(other.orders),
            first_orders: self.first_orders.saturating_add(other.first_orders),
        }
    }
}

/// Department id to tally, iterated in ascending department order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentCounts {
    tallies: BTreeMap<u64, DepartmentTally>,
}

impl DepartmentCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one resolved order row
    pub fn record(&mut self, department: u64, first_order: bool) {
        let tally = self.tallies.entry(department).or_default();
        tally.orders = tally.orders.saturating_add(1);
        if first_order {
            tally.first_orders = tally.first_orders.saturating_add(1);
        }
    }

    pub fn get(&self, department: u64) -> Option<DepartmentTally> {
        self.tallies.get(&department).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, DepartmentTally)> + '_ {
        self.tallies.iter().map(|(dept, tally)| (*dept, *tally))
    }

    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// Sum of all departments
    pub fn totals(&self) -> DepartmentTally {
        self.tallies
            .values()
            .fold(DepartmentTally::default(), |acc, tally| acc.combine(*tally))
    }

    /// Key-wise sum of two partial results
    pub fn merge(mut self, other: Self) -> Self {
        for (department, tally) in other.tallies {
            let entry = self.tallies.entry(department).or_default();
            *entry = entry.combine(tally);
        }
        self
    }
}

/// Combine any number of partial results into one
pub fn merge_all<I>(partials: I) -> DepartmentCounts
where
    I: IntoIterator<Item = DepartmentCounts>,
{
    partials
        .into_iter()
        .fold(DepartmentCounts::new(), DepartmentCounts::merge)
}

impl FromIterator<(u64, DepartmentTally)> for DepartmentCounts {
    fn from_iter<T: IntoIterator<Item = (u64, DepartmentTally)>>(iter: T) -> Self {
        let mut counts = Self::new();
        for (department, tally) in iter {
            let entry = counts.tallies.entry(department).or_default();
            *entry = entry.combine(tally);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tally(orders: u64, first_orders: u64) -> DepartmentTally {
        DepartmentTally {
            orders,
            first_orders,
        }
    }

    #[test]
    fn test_record_saturates_like_merge() {
        let full = DepartmentTally {
            orders: u64::MAX,
            first_orders: u64::MAX,
        };
        let mut counts: DepartmentCounts = [(4, full)].into_iter().collect();

        counts.record(4, true);
        counts.record(4, false);

        assert_eq!(counts.get(4), Some(full));
    }

    #[test]
    fn test_record_counts_orders_and_first_orders() {
        let mut counts = DepartmentCounts::new();
        counts.record(10, true);
        counts.record(10, false);
        counts.record(20, true);

        assert_eq!(counts.get(10), Some(tally(2, 1)));
        assert_eq!(counts.get(20), Some(tally(1, 1)));
        assert_eq!(counts.get(30), None);
        assert_eq!(counts.totals(), tally(3, 2));
    }

    #[test]
    fn test_merge_absent_departments_contribute_zero() {
        let a: DepartmentCounts = [(1, tally(3, 1))].into_iter().collect();
        let b: DepartmentCounts = [(2, tally(4, 4))].into_iter().collect();

        let merged = a.merge(b);
        assert_eq!(merged.get(1), Some(tally(3, 1)));
        assert_eq!(merged.get(2), Some(tally(4, 4)));
    }

    #[test]
    fn test_merge_sums_shared_departments() {
        let a: DepartmentCounts = [(5, tally(3, 1)), (6, tally(1, 0))].into_iter().collect();
        let b: DepartmentCounts = [(5, tally(2, 2))].into_iter().collect();

        let merged = merge_all(vec![a, b]);
        assert_eq!(merged.get(5), Some(tally(5, 3)));
        assert_eq!(merged.get(6), Some(tally(1, 0)));
    }

    #[test]
    fn test_merge_all_empty_is_identity() {
        assert!(merge_all(Vec::new()).is_empty());
    }

    #[test]
    fn test_iteration_is_ascending() {
        let counts: DepartmentCounts = [(21, tally(1, 1)), (3, tally(1, 0)), (10, tally(2, 1))]
            .into_iter()
            .collect();
        let departments: Vec<u64> = counts.iter().map(|(d, _)| d).collect();
        assert_eq!(departments, vec![3, 10, 21]);
    }

    fn arb_counts() -> impl Strategy<Value = DepartmentCounts> {
        prop::collection::vec((0u64..8, 0u64..1000, 0u64..1000), 0..8).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(dept, a, b)| (dept, tally(a.max(b), a.min(b))))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn test_merge_associativity(a in arb_counts(), b in arb_counts(), c in arb_counts()) {
            let left = a.clone().merge(b.clone()).merge(c.clone());
            let right = a.merge(b.merge(c));
            prop_assert_eq!(left, right);
        }

        #[test]
        fn test_merge_is_order_independent(
            (partials, shuffled) in prop::collection::vec(arb_counts(), 0..6)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        ) {
            prop_assert_eq!(merge_all(shuffled), merge_all(partials));
        }

        #[test]
        fn test_merge_preserves_first_order_bound(a in arb_counts(), b in arb_counts()) {
            let merged = a.merge(b);
            for (_, t) in merged.iter() {
                prop_assert!(t.first_orders <= t.orders);
            }
        }
    }
}
