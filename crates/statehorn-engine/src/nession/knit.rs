//! The knit pattern: grouping transfer rules with disjoint cell footprints
//! so the elaborator can admit each group independently instead of
//! multiplying out every interleaving (`spec.md` §4.4, §9 design notes).
//!
//! Two candidate transfer rules that never mention the same cell can never
//! interact — admitting them in either order, or "simultaneously," produces
//! the same resulting state. Grouping them lets the elaborator treat a
//! knit group as a single admission step instead of exploring every
//! permutation of its members.

use std::collections::BTreeSet;
use std::rc::Rc;

/// Something the elaborator can group: a rule candidate plus the set of
/// cell names it reads or writes.
pub trait Footprint {
    fn footprint(&self) -> &BTreeSet<Rc<str>>;
}

/// Partitions `items` into groups such that any two items in different
/// groups have disjoint footprints, and any two items in the same group are
/// connected by a chain of overlapping footprints. Returns groups as index
/// lists into `items`, in first-occurrence order.
pub fn disjoint_groups<T: Footprint>(items: &[T]) -> Vec<Vec<usize>> {
    let n = items.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], x: usize) -> usize {
        if parent[x] != x {
            parent[x] = find(parent, parent[x]);
        }
        parent[x]
    }

    fn union(parent: &mut [usize], a: usize, b: usize) {
        let ra = find(parent, a);
        let rb = find(parent, b);
        if ra != rb {
            parent[ra] = rb;
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if !items[i].footprint().is_disjoint(items[j].footprint()) {
                union(&mut parent, i, j);
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of: std::collections::BTreeMap<usize, usize> = std::collections::BTreeMap::new();
    for i in 0..n {
        let root = find(&mut parent, i);
        let group_index = *group_of.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group_index].push(i);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rule(BTreeSet<Rc<str>>);

    impl Footprint for Rule {
        fn footprint(&self) -> &BTreeSet<Rc<str>> {
            &self.0
        }
    }

    fn cells(names: &[&str]) -> BTreeSet<Rc<str>> {
        names.iter().map(|s| Rc::from(*s)).collect()
    }

    #[test]
    fn fully_disjoint_rules_form_singleton_groups() {
        let rules = vec![Rule(cells(&["a"])), Rule(cells(&["b"])), Rule(cells(&["c"]))];
        let groups = disjoint_groups(&rules);
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.len() == 1));
    }

    #[test]
    fn overlapping_rules_join_one_group() {
        let rules = vec![Rule(cells(&["a", "b"])), Rule(cells(&["b", "c"])), Rule(cells(&["d"]))];
        let groups = disjoint_groups(&rules);
        assert_eq!(groups.len(), 2);
        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        assert!(sizes.contains(&2));
        assert!(sizes.contains(&1));
    }

    #[test]
    fn transitive_overlap_joins_a_chain_into_one_group() {
        let rules = vec![
            Rule(cells(&["a", "b"])),
            Rule(cells(&["b", "c"])),
            Rule(cells(&["c", "d"])),
        ];
        let groups = disjoint_groups(&rules);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn empty_input_produces_no_groups() {
        let rules: Vec<Rule> = vec![];
        assert!(disjoint_groups(&rules).is_empty());
    }
}
