//! Nessions: an ordered frame sequence tracking how a system's state
//! evolves under a particular interleaving of rule firings (`spec.md` §4.3,
//! §4.4 glossary: nession).

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use statehorn_kernel::{Event, Guard, Rank, Snapshot, SnapshotHandle, SnapshotTree, Substitution};

pub mod knit;

/// A single level of elaboration: the rule(s) admitted at this level, the
/// v-number-freshened substitution used to admit them, and the facts they
/// contribute (`spec.md` §3 nession frame).
///
/// Several state-consistent ("system") rules may be admitted into the same
/// frame without advancing rank; `applied_rule` instead names the single
/// *transfer* rule that produced this frame, if the frame was produced by
/// one (the initial frame, and any frame built purely from system rules
/// pushed directly, have none).
#[derive(Debug, Clone)]
pub struct Frame {
    /// The rank this frame occupies in its nession.
    pub rank: Rank,
    /// The id of the transfer rule that produced this frame, if any.
    pub applied_rule: Option<Rc<str>>,
    /// Every rule (transfer or state-consistent) admitted at this frame.
    pub admitted_rules: BTreeSet<Rc<str>>,
    /// The freshening substitution applied when this frame's rule(s) were
    /// admitted, unioned across every rule admitted here.
    pub substitution: Substitution,
    /// The events this frame contributes to the system's knowledge.
    pub events: Vec<Event>,
    /// The guard accumulated from every rule admitted at this frame.
    pub guard: Guard,
}

impl Frame {
    pub fn initial() -> Self {
        Self {
            rank: Rank::at(0),
            applied_rule: None,
            admitted_rules: BTreeSet::new(),
            substitution: Substitution::empty(),
            events: Vec::new(),
            guard: Guard::new(),
        }
    }

    pub fn new(rank: Rank, applied_rule: Rc<str>, substitution: Substitution, events: Vec<Event>) -> Self {
        Self {
            rank,
            applied_rule: Some(applied_rule.clone()),
            admitted_rules: BTreeSet::from([applied_rule]),
            substitution,
            events,
            guard: Guard::new(),
        }
    }

    /// Admits an additional state-consistent rule into this frame in place,
    /// without advancing rank — multiple state-consistent rules may share a
    /// frame (`spec.md` §4.4).
    pub fn admit_system_rule(
        &mut self,
        rule_id: Rc<str>,
        substitution: &Substitution,
        guard: &Guard,
        events: impl IntoIterator<Item = Event>,
    ) {
        self.admitted_rules.insert(rule_id);
        self.substitution = self.substitution.union(substitution);
        self.guard.union(guard);
        self.events.extend(events);
    }
}

/// A single branch of system evolution: a frame sequence plus the shared
/// state-cell history those frames wrote into.
#[derive(Debug, Clone)]
pub struct Nession {
    pub frames: Vec<Frame>,
    pub tree: SnapshotTree,
    /// The most recent snapshot recorded for each named cell.
    pub heads: BTreeMap<Rc<str>, SnapshotHandle>,
}

impl Nession {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::initial()],
            tree: SnapshotTree::new(),
            heads: BTreeMap::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The highest rank reached so far.
    pub fn current_rank(&self) -> Rank {
        self.frames.last().map(|f| f.rank).unwrap_or(Rank::at(0))
    }

    /// Every event contributed across all frames, in frame order.
    pub fn all_events(&self) -> Vec<&Event> {
        self.frames.iter().flat_map(|f| f.events.iter()).collect()
    }

    /// Records that `cell`'s current head is `handle`, replacing any prior
    /// head for that cell (a cell has exactly one live snapshot at a time).
    pub fn set_head(&mut self, cell: Rc<str>, handle: SnapshotHandle) {
        self.heads.insert(cell, handle);
    }

    pub fn head(&self, cell: &str) -> Option<SnapshotHandle> {
        self.heads.get(cell).copied()
    }

    /// Extends this nession with a new frame, appending its events and
    /// advancing the rank.
    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Inserts a new snapshot for `cell`, linking it after the cell's
    /// current head (if any) and advancing the head.
    pub fn record_snapshot(
        &mut self,
        cell: Rc<str>,
        snapshot: Snapshot,
        kind: statehorn_kernel::PriorKind,
    ) -> SnapshotHandle {
        let handle = match self.heads.get(cell.as_ref()) {
            Some(&prior) => self.tree.insert_after(prior, kind, snapshot),
            None => self.tree.insert_root(snapshot),
        };
        self.set_head(cell, handle);
        handle
    }

    /// `true` iff this nession's frame sequence is a strict prefix of
    /// `other`'s — used to prune branches that add nothing a sibling branch
    /// doesn't already cover (`spec.md` §4.4 prefix pruning).
    pub fn is_prefix_of(&self, other: &Nession) -> bool {
        if self.frames.len() >= other.frames.len() {
            return false;
        }
        self.frames
            .iter()
            .zip(other.frames.iter())
            .all(|(a, b)| a.applied_rule == b.applied_rule && a.events == b.events)
    }
}

impl Default for Nession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statehorn_kernel::Message;

    #[test]
    fn new_nession_has_a_single_initial_frame() {
        let n = Nession::new();
        assert_eq!(n.depth(), 1);
        assert!(n.frames[0].applied_rule.is_none());
    }

    #[test]
    fn admit_system_rule_extends_the_tail_frame_in_place() {
        let mut frame = Frame::new(
            Rank::at(1),
            Rc::from("r1"),
            Substitution::empty(),
            vec![Event::Know(Message::name("a"))],
        );
        let mut sub = Substitution::empty();
        sub.bind(Message::variable("x"), Message::name("b"));
        frame.admit_system_rule(
            Rc::from("r2"),
            &sub,
            &Guard::new(),
            vec![Event::Know(Message::name("b"))],
        );
        assert_eq!(frame.admitted_rules, BTreeSet::from([Rc::from("r1"), Rc::from("r2")]));
        assert_eq!(
            frame.events,
            vec![Event::Know(Message::name("a")), Event::Know(Message::name("b"))]
        );
        assert_eq!(frame.substitution.apply(&Message::variable("x")), Message::name("b"));
    }

    #[test]
    fn push_frame_extends_depth() {
        let mut n = Nession::new();
        n.push_frame(Frame::new(
            Rank::at(1),
            Rc::from("r1"),
            Substitution::empty(),
            vec![Event::Know(Message::name("a"))],
        ));
        assert_eq!(n.depth(), 2);
        assert_eq!(n.current_rank(), Rank::at(1));
    }

    #[test]
    fn all_events_flattens_across_frames() {
        let mut n = Nession::new();
        n.push_frame(Frame::new(
            Rank::at(1),
            Rc::from("r1"),
            Substitution::empty(),
            vec![Event::Know(Message::name("a"))],
        ));
        assert_eq!(n.all_events(), vec![&Event::Know(Message::name("a"))]);
    }

    #[test]
    fn prefix_detection_compares_rule_and_event_sequence() {
        let mut a = Nession::new();
        let mut b = Nession::new();
        b.push_frame(Frame::new(
            Rank::at(1),
            Rc::from("r1"),
            Substitution::empty(),
            vec![Event::Know(Message::name("a"))],
        ));
        assert!(a.is_prefix_of(&b));
        a.push_frame(Frame::new(
            Rank::at(1),
            Rc::from("r2"),
            Substitution::empty(),
            vec![Event::Know(Message::name("z"))],
        ));
        assert!(!a.is_prefix_of(&b));
    }

    #[test]
    fn record_snapshot_chains_onto_prior_head() {
        use statehorn_kernel::{PriorKind, State};
        let mut n = Nession::new();
        let root = Snapshot::root(State::new("c", Message::name("a")), vec![]);
        let h1 = n.record_snapshot(Rc::from("c"), root, PriorKind::Immediate);
        assert_eq!(n.head("c"), Some(h1));

        let next = Snapshot {
            condition: State::new("c", Message::name("b")),
            prior: None,
            transfers_to: None,
            premises: vec![],
        };
        let h2 = n.record_snapshot(Rc::from("c"), next, PriorKind::Immediate);
        assert_eq!(n.head("c"), Some(h2));
        assert!(n.tree.implies(h2, h1));
    }
}
