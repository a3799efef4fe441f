//! The snapshot tree: an arena of [`Snapshot`]s forming a forest of state
//! histories (`spec.md` §4.3).
//!
//! New snapshots may only link to handles already present in the arena, so
//! the prior-link graph can never contain a cycle — there is no operation
//! that produces a handle to a not-yet-inserted node.

use crate::message::Message;
use crate::snapshot::{PriorKind, PriorLink, Snapshot, SnapshotHandle};
use crate::substitution::Substitution;

/// An arena of [`Snapshot`] nodes, possibly holding several independent root
/// chains (a forest).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotTree {
    nodes: Vec<Snapshot>,
    roots: Vec<SnapshotHandle>,
}

impl SnapshotTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, handle: SnapshotHandle) -> &Snapshot {
        &self.nodes[handle.index()]
    }

    pub fn roots(&self) -> &[SnapshotHandle] {
        &self.roots
    }

    /// The handles of every snapshot that is not itself a prior of some
    /// other snapshot in this tree — the most-recent node of each trace,
    /// i.e. a rule's trace heads (`spec.md` §4.2, §4.4 step 4).
    pub fn leaves(&self) -> Vec<SnapshotHandle> {
        let mut referenced = vec![false; self.nodes.len()];
        for node in &self.nodes {
            if let Some(link) = node.prior {
                referenced[link.handle.index()] = true;
            }
        }
        (0..self.nodes.len())
            .filter(|&i| !referenced[i])
            .map(SnapshotHandle)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Inserts a new root snapshot (no prior), returning its handle.
    pub fn insert_root(&mut self, snapshot: Snapshot) -> SnapshotHandle {
        debug_assert!(snapshot.prior.is_none());
        let handle = SnapshotHandle(self.nodes.len());
        self.nodes.push(snapshot);
        self.roots.push(handle);
        handle
    }

    /// Inserts a snapshot immediately following `prior` in its chain.
    ///
    /// # Panics
    ///
    /// Panics if `prior` does not already exist in this arena.
    pub fn insert_after(
        &mut self,
        prior: SnapshotHandle,
        kind: PriorKind,
        mut snapshot: Snapshot,
    ) -> SnapshotHandle {
        assert!(prior.index() < self.nodes.len(), "prior handle out of range");
        snapshot.prior = Some(PriorLink { handle: prior, kind });
        let handle = SnapshotHandle(self.nodes.len());
        self.nodes.push(snapshot);
        handle
    }

    /// Records that `from` transfers its state onward to `to`.
    ///
    /// # Panics
    ///
    /// Panics if either handle does not exist in this arena.
    pub fn set_transfers_to(&mut self, from: SnapshotHandle, to: SnapshotHandle) {
        assert!(to.index() < self.nodes.len(), "transfer target out of range");
        self.nodes[from.index()].transfers_to = Some(to);
    }

    /// `a ⇒ b`: whether `b`'s condition is implied by having reached `a` —
    /// true when `b` is `a` itself or an ancestor of `a` in its prior chain.
    pub fn implies(&self, a: SnapshotHandle, b: SnapshotHandle) -> bool {
        if a == b {
            return true;
        }
        let mut current = a;
        while let Some(link) = self.node(current).prior {
            if link.handle == b {
                return true;
            }
            current = link.handle;
        }
        false
    }

    /// The full ancestor chain of `handle`, nearest-first, including
    /// `handle` itself.
    pub fn chain(&self, handle: SnapshotHandle) -> Vec<SnapshotHandle> {
        let mut out = vec![handle];
        let mut current = handle;
        while let Some(link) = self.node(current).prior {
            out.push(link.handle);
            current = link.handle;
        }
        out
    }

    /// Merges `other` into `self`, structurally deduplicating any common
    /// suffix the two forests share (two chains that forked from the same
    /// ancestor point). Returns a table mapping each handle in `other` to
    /// its handle in the merged tree.
    pub fn merge(&mut self, other: &SnapshotTree) -> Vec<SnapshotHandle> {
        let mut mapping: Vec<Option<SnapshotHandle>> = vec![None; other.len()];
        for i in 0..other.len() {
            let handle = SnapshotHandle(i);
            let node = other.node(handle);
            let remapped_prior = node.prior.map(|link| PriorLink {
                handle: mapping[link.handle.index()].expect("prior already remapped"),
                kind: link.kind,
            });
            let remapped_transfer = node
                .transfers_to
                .map(|target| mapping[target.index()].expect("transfer target already remapped"));

            let existing = self.nodes.iter().enumerate().find(|(_, existing)| {
                existing.condition == node.condition
                    && existing.premises == node.premises
                    && existing.prior == remapped_prior
                    && existing.transfers_to == remapped_transfer
            });

            let new_handle = if let Some((idx, _)) = existing {
                SnapshotHandle(idx)
            } else {
                let new_handle = SnapshotHandle(self.nodes.len());
                self.nodes.push(Snapshot {
                    condition: node.condition.clone(),
                    prior: remapped_prior,
                    transfers_to: remapped_transfer,
                    premises: node.premises.clone(),
                });
                if remapped_prior.is_none() {
                    self.roots.push(new_handle);
                }
                new_handle
            };
            mapping[i] = Some(new_handle);
        }
        mapping.into_iter().map(|m| m.expect("every node remapped")).collect()
    }

    /// Rewrites every snapshot's condition value and premise messages
    /// through `substitution`, preserving the tree's link structure exactly.
    pub fn substitute(&self, substitution: &Substitution) -> SnapshotTree {
        let nodes = self
            .nodes
            .iter()
            .map(|node| Snapshot {
                condition: node.condition.map_value(|m| substitution.apply(m)),
                prior: node.prior,
                transfers_to: node.transfers_to,
                premises: node
                    .premises
                    .iter()
                    .map(|ev| ev.map_messages(|m| substitution.apply(m)))
                    .collect(),
            })
            .collect();
        SnapshotTree {
            nodes,
            roots: self.roots.clone(),
        }
    }

    /// Rewrites every snapshot's condition value and premise messages
    /// through the arbitrary rewrite `f`, preserving the tree's link
    /// structure exactly. Unlike [`SnapshotTree::substitute`], `f` need not
    /// come from a [`Substitution`] lookup — used to v-number-freshen a
    /// rule's snapshot tree the same way its premises are freshened
    /// (`spec.md` §4.4 step 2).
    pub fn map_messages(&self, mut f: impl FnMut(&Message) -> Message) -> SnapshotTree {
        let nodes = self
            .nodes
            .iter()
            .map(|node| Snapshot {
                condition: node.condition.map_value(|m| f(m)),
                prior: node.prior,
                transfers_to: node.transfers_to,
                premises: node.premises.iter().map(|ev| ev.map_messages(|m| f(m))).collect(),
            })
            .collect();
        SnapshotTree {
            nodes,
            roots: self.roots.clone(),
        }
    }
}
