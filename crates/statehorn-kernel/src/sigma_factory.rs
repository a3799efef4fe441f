//! Two-sided unification bookkeeping (`spec.md` §4.1, §9 design notes).
//!
//! Ordinary unification binds variables on one side of an equation to terms
//! on the other. Composing two Horn clauses needs more: both the clause
//! supplying a premise and the clause consuming it may carry their own free
//! variables, and a binding discovered while matching one pair of messages
//! must be honored by every later pair in the same composition. A
//! [`SigmaFactory`] is the mutable unification state threaded through that
//! whole process.
//!
//! Bindings are *settled on write*: the first time a variable is bound, that
//! binding is authoritative for the rest of the unification. A later attempt
//! to rebind the same variable must agree with the settled value or the
//! unification fails — it never silently overwrites.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::rc::Rc;

use crate::guard::Guard;
use crate::message::Message;
use crate::substitution::Substitution;

/// Which sides of a unification are allowed to bind variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Only the left-hand (forward) side may bind; the right-hand side must
    /// already be ground or match structurally. Used when unifying a
    /// concrete query against a candidate clause.
    OneWay,
    /// Both sides may bind each other's variables. Used when composing two
    /// Horn clauses, each of which may still carry free variables.
    TwoWay,
}

/// Two-sided unification state: a forward map (left-side variables to
/// right-side messages) and a backward map (right-side variables to
/// left-side messages), plus the mode governing which map accepts writes.
#[derive(Debug, Clone)]
pub struct SigmaFactory {
    forward: Substitution,
    backward: Substitution,
    mode: Mode,
    /// A dictionary from state-variable (cell) name to the value committed
    /// to it so far, or unset — the substrate for cross-option consistency
    /// checking during query resolution (`spec.md` §4.1, §4.6).
    state_commitments: BTreeMap<Rc<str>, Message>,
}

impl SigmaFactory {
    pub fn new(mode: Mode) -> Self {
        Self {
            forward: Substitution::empty(),
            backward: Substitution::empty(),
            mode,
            state_commitments: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn forward(&self) -> &Substitution {
        &self.forward
    }

    pub fn backward(&self) -> &Substitution {
        &self.backward
    }

    /// Attempts to bind a left-side variable to a right-side message,
    /// settling on the first write. Returns `false` if the variable is
    /// already settled to a different message, or if the mode forbids this
    /// side from writing.
    pub fn bind_forward(&mut self, variable: Message, value: Message) -> bool {
        if let Some(existing) = self.forward.lookup(&variable) {
            return existing == &value;
        }
        self.forward.bind(variable, value);
        true
    }

    /// As [`SigmaFactory::bind_forward`] but for the right-side map; only
    /// permitted in [`Mode::TwoWay`].
    pub fn bind_backward(&mut self, variable: Message, value: Message) -> bool {
        if self.mode == Mode::OneWay {
            return false;
        }
        if let Some(existing) = self.backward.lookup(&variable) {
            return existing == &value;
        }
        self.backward.bind(variable, value);
        true
    }

    /// Resolves a left-side message through the settled forward bindings.
    pub fn resolve_forward(&self, message: &Message) -> Message {
        self.forward.apply(message)
    }

    /// Resolves a right-side message through the settled backward bindings.
    pub fn resolve_backward(&self, message: &Message) -> Message {
        self.backward.apply(message)
    }

    /// Attempts to unify a left-side message against a right-side message,
    /// settling bindings as needed and checking `guard` before any
    /// new binding is made. Returns `false` on mismatch or guard violation.
    pub fn unify(&mut self, left: &Message, right: &Message, guard: &Guard) -> bool {
        let left = self.resolve_forward(left);
        let right = match self.mode {
            Mode::TwoWay => self.resolve_backward(right),
            Mode::OneWay => right.clone(),
        };

        match (&left, &right) {
            (Message::Variable { .. }, _) if !matches!(right, Message::Variable { .. }) => {
                if guard.violates(&left, &right) {
                    return false;
                }
                self.bind_forward(left, right)
            }
            (_, Message::Variable { .. }) if self.mode == Mode::TwoWay => {
                if guard.violates(&right, &left) {
                    return false;
                }
                self.bind_backward(right, left)
            }
            (Message::Variable { .. }, Message::Variable { .. }) => {
                if left == right {
                    true
                } else {
                    self.bind_forward(left, right)
                }
            }
            (Message::Name(a), Message::Name(b)) => a == b,
            (Message::Nonce(a), Message::Nonce(b)) => a == b,
            (Message::Tuple(a), Message::Tuple(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(x, y)| self.unify(x, y, guard))
            }
            (
                Message::Function { name: n1, args: a1 },
                Message::Function { name: n2, args: a2 },
            ) => {
                n1 == n2
                    && a1.len() == a2.len()
                    && a1.iter()
                        .zip(a2.iter())
                        .all(|(x, y)| self.unify(x, y, guard))
            }
            _ => false,
        }
    }

    /// Converts the settled forward bindings into a plain [`Substitution`].
    pub fn into_forward_substitution(self) -> Substitution {
        self.forward
    }

    /// The value committed to state-variable `cell` so far, if any.
    pub fn committed_state(&self, cell: &str) -> Option<&Message> {
        self.state_commitments.get(cell)
    }

    /// Commits `cell` to `value`. Returns `true` if `cell` had no prior
    /// commitment or was already committed to the same value, `false` if
    /// this would contradict an earlier commitment made elsewhere in the
    /// same derivation (`spec.md` §4.6 cross-option consistency).
    pub fn commit_state(&mut self, cell: impl Into<Rc<str>>, value: Message) -> bool {
        match self.state_commitments.entry(cell.into()) {
            Entry::Occupied(slot) => slot.get() == &value,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_way_binds_only_the_left_side() {
        let mut sigma = SigmaFactory::new(Mode::OneWay);
        let guard = Guard::new();
        assert!(sigma.unify(&Message::variable("x"), &Message::name("a"), &guard));
        assert_eq!(sigma.resolve_forward(&Message::variable("x")), Message::name("a"));
    }

    #[test]
    fn one_way_rejects_right_side_variable_binding() {
        let mut sigma = SigmaFactory::new(Mode::OneWay);
        let guard = Guard::new();
        assert!(!sigma.unify(&Message::name("a"), &Message::variable("y"), &guard));
    }

    #[test]
    fn two_way_binds_either_side() {
        let mut sigma = SigmaFactory::new(Mode::TwoWay);
        let guard = Guard::new();
        assert!(sigma.unify(&Message::name("a"), &Message::variable("y"), &guard));
        assert_eq!(sigma.resolve_backward(&Message::variable("y")), Message::name("a"));
    }

    #[test]
    fn settling_rejects_conflicting_rebind() {
        let mut sigma = SigmaFactory::new(Mode::OneWay);
        let guard = Guard::new();
        assert!(sigma.unify(&Message::variable("x"), &Message::name("a"), &guard));
        assert!(!sigma.unify(&Message::variable("x"), &Message::name("b"), &guard));
    }

    #[test]
    fn settling_accepts_repeated_consistent_bind() {
        let mut sigma = SigmaFactory::new(Mode::OneWay);
        let guard = Guard::new();
        assert!(sigma.unify(&Message::variable("x"), &Message::name("a"), &guard));
        assert!(sigma.unify(&Message::variable("x"), &Message::name("a"), &guard));
    }

    #[test]
    fn guard_blocks_forbidden_binding() {
        let mut guard = Guard::new();
        guard.forbid(Message::variable("x"), Message::name("a"));
        let mut sigma = SigmaFactory::new(Mode::OneWay);
        assert!(!sigma.unify(&Message::variable("x"), &Message::name("a"), &guard));
    }

    #[test]
    fn structural_mismatch_fails() {
        let mut sigma = SigmaFactory::new(Mode::OneWay);
        let guard = Guard::new();
        assert!(!sigma.unify(&Message::name("a"), &Message::name("b"), &guard));
    }

    #[test]
    fn tuples_unify_elementwise() {
        let mut sigma = SigmaFactory::new(Mode::OneWay);
        let guard = Guard::new();
        let left = Message::tuple(vec![Message::variable("x"), Message::name("b")]);
        let right = Message::tuple(vec![Message::name("a"), Message::name("b")]);
        assert!(sigma.unify(&left, &right, &guard));
        assert_eq!(sigma.resolve_forward(&Message::variable("x")), Message::name("a"));
    }

    #[test]
    fn functions_of_different_arity_fail() {
        let mut sigma = SigmaFactory::new(Mode::OneWay);
        let guard = Guard::new();
        let left = Message::function("f", vec![Message::name("a")]);
        let right = Message::function("f", vec![Message::name("a"), Message::name("b")]);
        assert!(!sigma.unify(&left, &right, &guard));
    }

    #[test]
    fn same_variable_on_both_sides_is_trivially_consistent() {
        let mut sigma = SigmaFactory::new(Mode::TwoWay);
        let guard = Guard::new();
        assert!(sigma.unify(&Message::variable("x"), &Message::variable("x"), &guard));
    }

    #[test]
    fn commit_state_accepts_first_commitment() {
        let mut sigma = SigmaFactory::new(Mode::OneWay);
        assert!(sigma.commit_state("sd", Message::name("init")));
        assert_eq!(sigma.committed_state("sd"), Some(&Message::name("init")));
    }

    #[test]
    fn commit_state_is_idempotent_for_the_same_value() {
        let mut sigma = SigmaFactory::new(Mode::OneWay);
        assert!(sigma.commit_state("sd", Message::name("init")));
        assert!(sigma.commit_state("sd", Message::name("init")));
    }

    #[test]
    fn commit_state_flags_a_contradiction() {
        let mut sigma = SigmaFactory::new(Mode::OneWay);
        assert!(sigma.commit_state("sd", Message::name("init")));
        assert!(!sigma.commit_state("sd", Message::name("other")));
        assert_eq!(sigma.committed_state("sd"), Some(&Message::name("init")));
    }

    #[test]
    fn uncommitted_state_variable_is_null() {
        let sigma = SigmaFactory::new(Mode::OneWay);
        assert_eq!(sigma.committed_state("sd"), None);
    }
}
