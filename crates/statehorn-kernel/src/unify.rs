//! Convenience entry points over [`SigmaFactory`] (`spec.md` §4.1).

use crate::guard::Guard;
use crate::message::Message;
use crate::sigma_factory::{Mode, SigmaFactory};
use crate::substitution::Substitution;

/// Attempts to unify `left` against `right` with only the left side
/// permitted to bind, returning the resulting forward substitution on
/// success.
pub fn unify_to(left: &Message, right: &Message, guard: &Guard) -> Option<Substitution> {
    let mut sigma = SigmaFactory::new(Mode::OneWay);
    if sigma.unify(left, right, guard) {
        Some(sigma.into_forward_substitution())
    } else {
        None
    }
}

/// `true` iff `left` and `right` are unifiable one-way under `guard`,
/// discarding the substitution.
pub fn unifiable(left: &Message, right: &Message, guard: &Guard) -> bool {
    unify_to(left, right, guard).is_some()
}

/// Checks whether every corresponding pair in `left` and `right` can be
/// unified one-way, sharing a single settlement state across the whole list
/// (`spec.md` §4.1 `CanUnifyMessagesOneWay`). After each pair, the guard
/// used for the remaining pairs is refreshed with the partial substitution
/// discovered so far, so a trailing guard sees variables already bound by
/// an earlier pair.
pub fn can_unify_messages_one_way(left: &[Message], right: &[Message], guard: &Guard) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut sigma = SigmaFactory::new(Mode::OneWay);
    let mut guard = guard.clone();
    for (l, r) in left.iter().zip(right.iter()) {
        if !sigma.unify(l, r, &guard) {
            return false;
        }
        guard = guard.substitute(|m| sigma.resolve_forward(m));
    }
    true
}

/// As [`can_unify_messages_one_way`] but both sides may bind
/// (`CanUnifyMessagesBothWays`), used when composing two clauses that each
/// still carry free variables. The guard is refreshed after each pair with
/// both the forward and backward bindings settled so far.
pub fn can_unify_messages_both_ways(left: &[Message], right: &[Message], guard: &Guard) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut sigma = SigmaFactory::new(Mode::TwoWay);
    let mut guard = guard.clone();
    for (l, r) in left.iter().zip(right.iter()) {
        if !sigma.unify(l, r, &guard) {
            return false;
        }
        guard = guard.substitute(|m| sigma.resolve_backward(&sigma.resolve_forward(m)));
    }
    true
}

/// Unifies both-ways and returns the forward substitution (the bindings
/// discovered for `left`'s variables) on success.
pub fn unify_both_ways_to(left: &Message, right: &Message, guard: &Guard) -> Option<Substitution> {
    let mut sigma = SigmaFactory::new(Mode::TwoWay);
    if sigma.unify(left, right, guard) {
        Some(sigma.into_forward_substitution())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unify_to_returns_substitution_on_match() {
        let guard = Guard::new();
        let sub = unify_to(&Message::variable("x"), &Message::name("a"), &guard).unwrap();
        assert_eq!(sub.apply(&Message::variable("x")), Message::name("a"));
    }

    #[test]
    fn unify_to_fails_on_mismatch() {
        let guard = Guard::new();
        assert!(unify_to(&Message::name("a"), &Message::name("b"), &guard).is_none());
    }

    #[test]
    fn unifiable_is_a_boolean_view_of_unify_to() {
        let guard = Guard::new();
        assert!(unifiable(&Message::variable("x"), &Message::name("a"), &guard));
        assert!(!unifiable(&Message::name("a"), &Message::name("b"), &guard));
    }

    #[test]
    fn can_unify_messages_one_way_shares_settlement_across_pairs() {
        let guard = Guard::new();
        let left = vec![Message::variable("x"), Message::variable("x")];
        let right = vec![Message::name("a"), Message::name("a")];
        assert!(can_unify_messages_one_way(&left, &right, &guard));

        let right_conflicting = vec![Message::name("a"), Message::name("b")];
        assert!(!can_unify_messages_one_way(&left, &right_conflicting, &guard));
    }

    #[test]
    fn can_unify_messages_one_way_rejects_length_mismatch() {
        let guard = Guard::new();
        let left = vec![Message::variable("x")];
        let right = vec![Message::name("a"), Message::name("b")];
        assert!(!can_unify_messages_one_way(&left, &right, &guard));
    }

    #[test]
    fn can_unify_messages_both_ways_allows_right_side_variables() {
        let guard = Guard::new();
        let left = vec![Message::name("a")];
        let right = vec![Message::variable("y")];
        assert!(can_unify_messages_both_ways(&left, &right, &guard));
    }

    #[test]
    fn both_ways_respects_guard_on_right_side_binding() {
        let mut guard = Guard::new();
        guard.forbid(Message::variable("y"), Message::name("a"));
        let left = vec![Message::name("a")];
        let right = vec![Message::variable("y")];
        assert!(!can_unify_messages_both_ways(&left, &right, &guard));
    }
}
