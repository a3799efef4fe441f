//! Inequality guards (`spec.md` §3, §4.2).
//!
//! A [`Guard`] records, per variable, the set of messages that variable is
//! forbidden from unifying with. Guards accumulate as rules compose and are
//! checked whenever a substitution is about to bind a guarded variable.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::message::Message;

/// A set of per-variable inequality constraints.
///
/// Only [`Message::Variable`] keys are meaningful; inserting a constraint
/// against a non-variable is a caller error and is simply ignored, matching
/// the "guards only ever mention variables" invariant from `spec.md` §4.2.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guard {
    forbidden: BTreeMap<Message, BTreeSet<Message>>,
}

impl Guard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.forbidden.values().all(BTreeSet::is_empty)
    }

    /// Forbids `variable` from ever unifying with `value`.
    pub fn forbid(&mut self, variable: Message, value: Message) {
        if !matches!(variable, Message::Variable { .. }) {
            return;
        }
        self.forbidden.entry(variable).or_default().insert(value);
    }

    /// The set of values forbidden for `variable`, if any.
    pub fn forbidden_for(&self, variable: &Message) -> Option<&BTreeSet<Message>> {
        self.forbidden.get(variable)
    }

    /// `true` iff binding `variable` to `value` would violate this guard.
    pub fn violates(&self, variable: &Message, value: &Message) -> bool {
        self.forbidden
            .get(variable)
            .map(|set| set.contains(value))
            .unwrap_or(false)
    }

    /// Merges another guard's constraints into this one.
    pub fn union(&mut self, other: &Guard) {
        for (var, values) in &other.forbidden {
            self.forbidden
                .entry(var.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }

    /// Returns the union of two guards without mutating either.
    pub fn union_of(a: &Guard, b: &Guard) -> Guard {
        let mut out = a.clone();
        out.union(b);
        out
    }

    /// Keeps only constraints whose variable satisfies `keep`. Used when a
    /// rule's guard is restricted to the variables still free after
    /// composition.
    pub fn filter(&self, mut keep: impl FnMut(&Message) -> bool) -> Guard {
        Guard {
            forbidden: self
                .forbidden
                .iter()
                .filter(|(var, _)| keep(var))
                .map(|(var, values)| (var.clone(), values.clone()))
                .collect(),
        }
    }

    /// Rewrites every variable and forbidden value through `map`. Used when a
    /// substitution is applied to a rule that carries a guard (the
    /// guard-substitution law, `spec.md` §4.2): a bound variable's
    /// constraints move onto the value it was bound to.
    pub fn substitute(&self, mut map: impl FnMut(&Message) -> Message) -> Guard {
        let mut out = Guard::new();
        for (var, values) in &self.forbidden {
            let mapped_var = map(var);
            for value in values {
                let mapped_value = map(value);
                if let Message::Variable { .. } = mapped_var {
                    out.forbid(mapped_var.clone(), mapped_value);
                }
                // If substitution grounds the variable, the constraint is
                // checked once, at substitution time, by the caller rather
                // than retained here.
            }
        }
        out
    }

    /// Checks whether every pair in `bindings` (variable, candidate value)
    /// can be simultaneously unified without violating this guard, applying
    /// `sigma` to each forbidden element first so that a forbidden value
    /// expressed in terms of other, now-bound variables is compared against
    /// its current, substituted form (`spec.md` §3, §4.1 cross-reference
    /// check: "no element of G(x) becomes equal to v after σ itself is
    /// applied to that element").
    pub fn can_unify_all_messages<'a>(
        &self,
        bindings: impl IntoIterator<Item = (&'a Message, &'a Message)>,
        mut sigma: impl FnMut(&Message) -> Message,
    ) -> bool {
        bindings
            .into_iter()
            .all(|(var, value)| !self.violates_substituted(var, value, &mut sigma))
    }

    /// As [`Guard::violates`], but each element of `variable`'s forbidden
    /// set is rewritten through `sigma` before comparing against `value`.
    fn violates_substituted(&self, variable: &Message, value: &Message, sigma: &mut impl FnMut(&Message) -> Message) -> bool {
        self.forbidden
            .get(variable)
            .map(|set| set.iter().any(|forbidden| &sigma(forbidden) == value))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Message, &BTreeSet<Message>)> {
        self.forbidden.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_guard_violates_nothing() {
        let g = Guard::new();
        assert!(!g.violates(&Message::variable("x"), &Message::name("a")));
    }

    #[test]
    fn forbid_then_violates() {
        let mut g = Guard::new();
        g.forbid(Message::variable("x"), Message::name("a"));
        assert!(g.violates(&Message::variable("x"), &Message::name("a")));
        assert!(!g.violates(&Message::variable("x"), &Message::name("b")));
    }

    #[test]
    fn forbid_ignores_non_variable_keys() {
        let mut g = Guard::new();
        g.forbid(Message::name("c"), Message::name("a"));
        assert!(g.is_empty());
    }

    #[test]
    fn union_merges_constraints_from_both_sides() {
        let mut a = Guard::new();
        a.forbid(Message::variable("x"), Message::name("a"));
        let mut b = Guard::new();
        b.forbid(Message::variable("x"), Message::name("b"));
        b.forbid(Message::variable("y"), Message::name("c"));

        let u = Guard::union_of(&a, &b);
        assert!(u.violates(&Message::variable("x"), &Message::name("a")));
        assert!(u.violates(&Message::variable("x"), &Message::name("b")));
        assert!(u.violates(&Message::variable("y"), &Message::name("c")));
    }

    #[test]
    fn filter_drops_constraints_for_excluded_variables() {
        let mut g = Guard::new();
        g.forbid(Message::variable("x"), Message::name("a"));
        g.forbid(Message::variable("y"), Message::name("b"));

        let kept = g.filter(|v| v == &Message::variable("x"));
        assert!(kept.violates(&Message::variable("x"), &Message::name("a")));
        assert!(!kept.violates(&Message::variable("y"), &Message::name("b")));
    }

    #[test]
    fn substitute_moves_constraints_onto_bound_values() {
        let mut g = Guard::new();
        g.forbid(Message::variable("x"), Message::name("a"));

        let substituted = g.substitute(|m| match m {
            Message::Variable { name, .. } if &**name == "x" => Message::variable("y"),
            other => other.clone(),
        });
        assert!(substituted.violates(&Message::variable("y"), &Message::name("a")));
        assert!(!substituted.violates(&Message::variable("x"), &Message::name("a")));
    }

    #[test]
    fn can_unify_all_messages_rejects_any_violation() {
        let mut g = Guard::new();
        g.forbid(Message::variable("x"), Message::name("a"));
        let pairs = vec![
            (Message::variable("x"), Message::name("a")),
            (Message::variable("y"), Message::name("b")),
        ];
        let refs: Vec<(&Message, &Message)> = pairs.iter().map(|(a, b)| (a, b)).collect();
        assert!(!g.can_unify_all_messages(refs, |m| m.clone()));
    }

    #[test]
    fn can_unify_all_messages_accepts_when_no_violation() {
        let mut g = Guard::new();
        g.forbid(Message::variable("x"), Message::name("a"));
        let pairs = vec![(Message::variable("x"), Message::name("z"))];
        let refs: Vec<(&Message, &Message)> = pairs.iter().map(|(a, b)| (a, b)).collect();
        assert!(g.can_unify_all_messages(refs, |m| m.clone()));
    }

    #[test]
    fn can_unify_all_messages_checks_forbidden_elements_after_substitution() {
        // x is forbidden from equalling whatever `y` currently resolves to;
        // sigma resolves `y` to `a[]`, so binding x to a[] must be rejected
        // even though the guard's literal forbidden entry is the variable y.
        let mut g = Guard::new();
        g.forbid(Message::variable("x"), Message::variable("y"));
        let pairs = vec![(Message::variable("x"), Message::name("a"))];
        let refs: Vec<(&Message, &Message)> = pairs.iter().map(|(a, b)| (a, b)).collect();
        assert!(!g.can_unify_all_messages(refs, |m| match m {
            Message::Variable { name, .. } if &**name == "y" => Message::name("a"),
            other => other.clone(),
        }));
    }
}
