//! Snapshots: a single recorded point in a state cell's history
//! (`spec.md` §3, §4.3, §9 design notes).
//!
//! A snapshot is never constructed in isolation; it always belongs to a
//! [`crate::snapshot_tree::SnapshotTree`] arena, which is the only thing
//! that can hand out a [`SnapshotHandle`]. Because a handle can only ever
//! reference a node already present in the arena, the prior-link graph is
//! acyclic by construction — there is no way to build a cycle without first
//! obtaining a handle to a node that doesn't exist yet.

use crate::event::Event;
use crate::state::State;

/// An opaque reference to a node inside a particular [`SnapshotTree`] arena.
///
/// [`SnapshotTree`]: crate::snapshot_tree::SnapshotTree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotHandle(pub(crate) usize);

impl SnapshotHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// How a snapshot relates to the prior one in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorKind {
    /// `≤` — this snapshot's condition holds no earlier than the prior one;
    /// other snapshots may have intervened.
    Before,
    /// `⋖` — this snapshot immediately follows the prior one with nothing
    /// in between.
    Immediate,
}

/// A link from a snapshot to the one immediately preceding it in the same
/// cell's chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorLink {
    pub handle: SnapshotHandle,
    pub kind: PriorKind,
}

/// A single point in a nession's state history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// The state condition holding at this point.
    pub condition: State,
    /// The prior snapshot in this cell's own chain, if any.
    pub prior: Option<PriorLink>,
    /// If this snapshot hands control to a snapshot in a different cell's
    /// chain (a role transferring its state onward), the target.
    pub transfers_to: Option<SnapshotHandle>,
    /// The events that must have occurred for this snapshot to be valid.
    pub premises: Vec<Event>,
}

impl Snapshot {
    pub fn root(condition: State, premises: Vec<Event>) -> Self {
        Self {
            condition,
            prior: None,
            transfers_to: None,
            premises,
        }
    }
}
