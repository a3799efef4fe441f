//! Rules: the user-facing unit of protocol behavior (`spec.md` §4.2, §6.1).
//!
//! A rule fires when its premises hold, producing either a bare event (a
//! stateless derivation, e.g. an attacker composing two known messages into
//! a new one) or a change to a state cell. State-changing rules are further
//! split into those that keep writing to the same cell's identity
//! (`Consistent`) and those that hand the cell off to a new identity
//! (`Transferring`) — `spec.md` §4.2's distinction between in-place state
//! update and role transition.

use std::rc::Rc;

use crate::event::Event;
use crate::guard::Guard;
use crate::snapshot_tree::SnapshotTree;
use crate::state::State;

/// What a rule concludes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleResult {
    /// A pure event, with no state cell involved.
    Event(Event),
    /// The named cell is rewritten, remaining the same logical identity.
    Consistent(State),
    /// The named cell transitions to a new identity, as when a role
    /// transfers its local state forward to a successor role.
    Transferring(State),
}

impl RuleResult {
    pub fn state(&self) -> Option<&State> {
        match self {
            RuleResult::Event(_) => None,
            RuleResult::Consistent(state) | RuleResult::Transferring(state) => Some(state),
        }
    }
}

/// A single protocol rule: premises imply a result, subject to a guard and
/// a snapshot tree describing what must have happened to which cells, in
/// what order, for the rule to be admissible (`spec.md` §3, §4.2). A rule
/// with no state preconditions carries an empty tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub id: Rc<str>,
    pub premises: Vec<Event>,
    pub result: RuleResult,
    pub guard: Guard,
    pub snapshot_tree: SnapshotTree,
}

impl Rule {
    pub fn new(
        id: impl Into<Rc<str>>,
        premises: Vec<Event>,
        result: RuleResult,
        guard: Guard,
        snapshot_tree: SnapshotTree,
    ) -> Self {
        Self {
            id: id.into(),
            premises,
            result,
            guard,
            snapshot_tree,
        }
    }

    /// `true` iff this rule never touches state — a pure knowledge
    /// derivation rule.
    pub fn is_stateless(&self) -> bool {
        matches!(self.result, RuleResult::Event(_))
    }

    /// `true` iff this rule transfers its target cell to a new identity.
    pub fn is_transferring(&self) -> bool {
        matches!(self.result, RuleResult::Transferring(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn event_result_is_stateless() {
        let rule = Rule::new(
            "r1",
            vec![],
            RuleResult::Event(Event::Know(Message::name("a"))),
            Guard::new(),
            SnapshotTree::new(),
        );
        assert!(rule.is_stateless());
        assert!(!rule.is_transferring());
    }

    #[test]
    fn consistent_result_is_not_stateless_or_transferring() {
        let rule = Rule::new(
            "r2",
            vec![],
            RuleResult::Consistent(State::new("c", Message::name("a"))),
            Guard::new(),
            SnapshotTree::new(),
        );
        assert!(!rule.is_stateless());
        assert!(!rule.is_transferring());
        assert_eq!(rule.result.state().unwrap().name.as_ref(), "c");
    }

    #[test]
    fn transferring_result_is_detected() {
        let rule = Rule::new(
            "r3",
            vec![],
            RuleResult::Transferring(State::new("c", Message::name("b"))),
            Guard::new(),
            SnapshotTree::new(),
        );
        assert!(rule.is_transferring());
        assert!(!rule.is_stateless());
    }
}
