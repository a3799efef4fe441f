//! Events: the atomic actions a rule's premises and result describe
//! (`spec.md` §3, §4.2).

use std::fmt;

use crate::message::Message;

/// A single tagged action.
///
/// - `Know` — the attacker possesses a message (an attacker-knowledge fact).
/// - `New` — a nonce is freshly generated at this point.
/// - `Init` — a state cell is initialized to a value.
/// - `Accept` — a role completes, accepting the given value.
/// - `Leak` — the value is exposed to the attacker (a query target).
/// - `Make` — a state cell is written to a new value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Event {
    Know(Message),
    New(Message),
    Init(Message),
    Accept(Message),
    Leak(Message),
    Make { cell: Message, value: Message },
}

impl Event {
    /// The textual tag used in the source grammar (`spec.md` §6.1).
    pub fn tag(&self) -> &'static str {
        match self {
            Event::Know(_) => "know",
            Event::New(_) => "new",
            Event::Init(_) => "init",
            Event::Accept(_) => "accept",
            Event::Leak(_) => "leak",
            Event::Make { .. } => "make",
        }
    }

    /// Every message this event mentions, in display order.
    pub fn messages(&self) -> Vec<&Message> {
        match self {
            Event::Know(m) | Event::New(m) | Event::Init(m) | Event::Accept(m) | Event::Leak(m) => {
                vec![m]
            }
            Event::Make { cell, value } => vec![cell, value],
        }
    }

    /// Rewrites every message this event mentions through `f`.
    pub fn map_messages(&self, mut f: impl FnMut(&Message) -> Message) -> Event {
        match self {
            Event::Know(m) => Event::Know(f(m)),
            Event::New(m) => Event::New(f(m)),
            Event::Init(m) => Event::Init(f(m)),
            Event::Accept(m) => Event::Accept(f(m)),
            Event::Leak(m) => Event::Leak(f(m)),
            Event::Make { cell, value } => Event::Make {
                cell: f(cell),
                value: f(value),
            },
        }
    }

    /// `true` for events that introduce a fresh identity into scope
    /// (`New`), relevant to nonce-validity checks during elaboration.
    pub fn is_fresh_generation(&self) -> bool {
        matches!(self, Event::New(_))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Know(m) => write!(f, "know {}", m),
            Event::New(m) => write!(f, "new {}", m),
            Event::Init(m) => write!(f, "init {}", m),
            Event::Accept(m) => write!(f, "accept {}", m),
            Event::Leak(m) => write!(f, "leak {}", m),
            Event::Make { cell, value } => write!(f, "make {} = {}", cell, value),
        }
    }
}
