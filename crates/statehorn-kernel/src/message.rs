//! The message algebra (`spec.md` §3, `IMessage`).
//!
//! Every symbolic value exchanged between a state cell, a rule premise, or
//! the attacker's knowledge set is a [`Message`]: a variable, a ground name
//! or nonce, a tuple, or a function application. There is no algebraic
//! simplification here (`spec.md` Non-goals) — equality is purely
//! structural.

use std::fmt;
use std::rc::Rc;

/// A message in the term algebra.
///
/// Cloning a `Message` is cheap: names, variables, and argument lists are
/// reference-counted, matching the teacher's preference for owned,
/// `Clone`-friendly term representations rather than arena-borrowed ones
/// once a value crosses an API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Message {
    /// A variable, identified by name plus the v-number generation that
    /// freshened it (`spec.md` glossary: v-number).
    Variable { name: Rc<str>, vnum: u32 },
    /// A ground atomic constant, written `foo[]`.
    Name(Rc<str>),
    /// A ground atomic constant distinguished from names: a freshly
    /// generated value with generation-site identity.
    Nonce(Rc<str>),
    /// An ordered sequence of sub-messages.
    Tuple(Rc<[Message]>),
    /// A function symbol applied to an ordered sequence of arguments.
    Function { name: Rc<str>, args: Rc<[Message]> },
}

impl Message {
    /// Constructs a fresh (v-number 0) variable. Use
    /// [`Message::variable_gen`] when freshening for admission.
    pub fn variable(name: impl Into<Rc<str>>) -> Message {
        Message::Variable {
            name: name.into(),
            vnum: 0,
        }
    }

    /// Constructs a variable freshened at the given v-number generation.
    pub fn variable_gen(name: impl Into<Rc<str>>, vnum: u32) -> Message {
        Message::Variable {
            name: name.into(),
            vnum,
        }
    }

    pub fn name(name: impl Into<Rc<str>>) -> Message {
        Message::Name(name.into())
    }

    pub fn nonce(name: impl Into<Rc<str>>) -> Message {
        Message::Nonce(name.into())
    }

    pub fn tuple(items: impl Into<Rc<[Message]>>) -> Message {
        Message::Tuple(items.into())
    }

    pub fn function(name: impl Into<Rc<str>>, args: impl Into<Rc<[Message]>>) -> Message {
        Message::Function {
            name: name.into(),
            args: args.into(),
        }
    }

    /// `true` iff any leaf of this message is a [`Message::Variable`].
    pub fn contains_variables(&self) -> bool {
        match self {
            Message::Variable { .. } => true,
            Message::Name(_) | Message::Nonce(_) => false,
            Message::Tuple(items) => items.iter().any(Message::contains_variables),
            Message::Function { args, .. } => args.iter().any(Message::contains_variables),
        }
    }

    /// A message is ground iff it contains no variables.
    pub fn is_ground(&self) -> bool {
        !self.contains_variables()
    }

    /// The longest nesting depth of this message. A leaf (variable, name, or
    /// nonce) has depth 1.
    pub fn find_maximum_depth(&self) -> usize {
        match self {
            Message::Variable { .. } | Message::Name(_) | Message::Nonce(_) => 1,
            Message::Tuple(items) => {
                1 + items.iter().map(Message::find_maximum_depth).max().unwrap_or(0)
            }
            Message::Function { args, .. } => {
                1 + args.iter().map(Message::find_maximum_depth).max().unwrap_or(0)
            }
        }
    }

    /// Collects every distinct variable occurring in this message, in
    /// first-occurrence order.
    pub fn variables(&self) -> Vec<Message> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<Message>) {
        match self {
            Message::Variable { .. } => {
                if !out.contains(self) {
                    out.push(self.clone());
                }
            }
            Message::Name(_) | Message::Nonce(_) => {}
            Message::Tuple(items) => {
                for item in items.iter() {
                    item.collect_variables(out);
                }
            }
            Message::Function { args, .. } => {
                for arg in args.iter() {
                    arg.collect_variables(out);
                }
            }
        }
    }

    /// `true` if this message is a [`Message::Function`] or
    /// [`Message::Tuple`] — used to decide whether a Horn clause has a
    /// "complex result" (`spec.md` §4.3).
    pub fn is_complex(&self) -> bool {
        matches!(self, Message::Function { .. } | Message::Tuple(_))
    }

    /// The tuple members if this message is a tuple, else `None`.
    pub fn as_tuple(&self) -> Option<&[Message]> {
        match self {
            Message::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Variable { name, vnum } => {
                if *vnum == 0 {
                    write!(f, "{}", name)
                } else {
                    write!(f, "{}${}", name, vnum)
                }
            }
            Message::Name(name) => write!(f, "{}[]", name),
            Message::Nonce(name) => write!(f, "[{}]", name),
            Message::Tuple(items) => {
                write!(f, "<")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ">")
            }
            Message::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_constants_contain_no_variables() {
        assert!(!Message::name("a").contains_variables());
        assert!(!Message::nonce("n").contains_variables());
    }

    #[test]
    fn variable_contains_variables() {
        assert!(Message::variable("x").contains_variables());
    }

    #[test]
    fn nested_variable_is_detected() {
        let m = Message::function("f", vec![Message::name("a"), Message::variable("x")]);
        assert!(m.contains_variables());
        assert!(!m.is_ground());
    }

    #[test]
    fn ground_tuple_is_ground() {
        let m = Message::tuple(vec![Message::name("a"), Message::nonce("n")]);
        assert!(m.is_ground());
    }

    #[test]
    fn depth_of_leaf_is_one() {
        assert_eq!(Message::name("a").find_maximum_depth(), 1);
    }

    #[test]
    fn depth_counts_nesting() {
        let inner = Message::function("f", vec![Message::name("a")]);
        let outer = Message::function("g", vec![inner]);
        assert_eq!(outer.find_maximum_depth(), 3);
    }

    #[test]
    fn depth_of_tuple_is_max_of_members_plus_one() {
        let m = Message::tuple(vec![
            Message::name("a"),
            Message::function("f", vec![Message::name("b")]),
        ]);
        assert_eq!(m.find_maximum_depth(), 3);
    }

    #[test]
    fn structural_equality_ignores_identity() {
        let a = Message::function("f", vec![Message::name("a")]);
        let b = Message::function("f", vec![Message::name("a")]);
        assert_eq!(a, b);
    }

    #[test]
    fn variables_collected_in_first_occurrence_order_and_deduped() {
        let m = Message::tuple(vec![
            Message::variable("y"),
            Message::variable("x"),
            Message::variable("y"),
        ]);
        let vars = m.variables();
        assert_eq!(vars, vec![Message::variable("y"), Message::variable("x")]);
    }

    #[test]
    fn different_v_numbers_are_different_variables() {
        assert_ne!(Message::variable("x"), Message::variable_gen("x", 1));
    }

    #[test]
    fn display_matches_source_grammar() {
        assert_eq!(Message::name("a").to_string(), "a[]");
        assert_eq!(Message::nonce("n").to_string(), "[n]");
        assert_eq!(
            Message::function("enc", vec![Message::name("a"), Message::name("b")]).to_string(),
            "enc(a[], b[])"
        );
        assert_eq!(
            Message::tuple(vec![Message::name("a"), Message::name("b")]).to_string(),
            "<a[], b[]>"
        );
    }

    #[test]
    fn is_complex_distinguishes_atomic_from_structured() {
        assert!(!Message::name("a").is_complex());
        assert!(!Message::variable("x").is_complex());
        assert!(Message::function("f", vec![]).is_complex());
        assert!(Message::tuple(vec![]).is_complex());
    }
}
