//! Substitutions: ordered variable-to-message bindings (`spec.md` §3).
//!
//! A [`Substitution`] is kept as an ordered association list rather than a
//! hash map. Bindings are applied in insertion order and later bindings may
//! refer to variables introduced by earlier ones, so order is observable —
//! `spec.md` §4.1 requires a deterministic application order for
//! reproducible attack traces.

use crate::message::Message;

/// An ordered list of variable-to-message bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    bindings: Vec<(Message, Message)>,
}

impl Substitution {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Appends a binding. Does not check for prior bindings of the same
    /// variable; the substitution is applied in order, so a later binding
    /// shadows an earlier one during lookup but both remain in `bindings`.
    pub fn bind(&mut self, variable: Message, value: Message) {
        debug_assert!(matches!(variable, Message::Variable { .. }));
        self.bindings.push((variable, value));
    }

    /// Builds a substitution from an explicit ordered list of bindings.
    pub fn from_bindings(bindings: Vec<(Message, Message)>) -> Self {
        Self { bindings }
    }

    /// The most recently bound value for `variable`, if any.
    pub fn lookup(&self, variable: &Message) -> Option<&Message> {
        self.bindings
            .iter()
            .rev()
            .find(|(var, _)| var == variable)
            .map(|(_, value)| value)
    }

    /// Applies this substitution to a message, recursively, most-recent
    /// binding wins, and repeats until no further rewriting is possible
    /// (a bound variable may itself appear in the value of a later binding).
    pub fn apply(&self, message: &Message) -> Message {
        match message {
            Message::Variable { .. } => {
                if let Some(value) = self.lookup(message) {
                    if value == message {
                        value.clone()
                    } else {
                        self.apply(value)
                    }
                } else {
                    message.clone()
                }
            }
            Message::Name(_) | Message::Nonce(_) => message.clone(),
            Message::Tuple(items) => {
                Message::tuple(items.iter().map(|m| self.apply(m)).collect::<Vec<_>>())
            }
            Message::Function { name, args } => Message::function(
                name.clone(),
                args.iter().map(|m| self.apply(m)).collect::<Vec<_>>(),
            ),
        }
    }

    /// Returns the union of two substitutions, `other`'s bindings appended
    /// after `self`'s so that `other` takes precedence on lookup.
    pub fn union(&self, other: &Substitution) -> Substitution {
        let mut bindings = self.bindings.clone();
        bindings.extend(other.bindings.iter().cloned());
        Substitution { bindings }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Message, Message)> {
        self.bindings.iter()
    }
}
