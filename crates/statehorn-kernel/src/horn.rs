//! Stateful Horn clauses: the unit the resolver chains together
//! (`spec.md` §4.2, §4.5).
//!
//! A [`HornClause`] is a rule instance flattened into premises implying a
//! single result event, carrying a [`Rank`] (which frame of its owning
//! nession it is anchored to) and a [`Provenance`] trail back to the source
//! rules it was built from.

use std::rc::Rc;

use crate::event::Event;
use crate::guard::Guard;
use crate::message::Message;
use crate::sigma_factory::{Mode, SigmaFactory};
use crate::substitution::Substitution;

/// A clause's position among a nession's frames. `-1` means the clause
/// holds at every frame (an unbounded, frame-independent fact — e.g. a pure
/// Dolev-Yao composition rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(pub i64);

impl Rank {
    pub const UNBOUNDED: Rank = Rank(-1);

    pub fn at(frame: i64) -> Rank {
        Rank(frame)
    }

    pub fn is_unbounded(self) -> bool {
        self.0 == -1
    }

    /// `true` iff a fact ranked `self` may be used to justify a premise
    /// ranked `other` — i.e. `self` is not anchored strictly later than
    /// `other`. Unbounded ranks are compatible with anything.
    pub fn before_rank(self, other: Rank) -> bool {
        self.is_unbounded() || other.is_unbounded() || self.0 <= other.0
    }

    /// Advances a rank to account for a newly composed dependency: the
    /// tighter (later) of the two finite ranks, or unbounded if either side
    /// is unbounded.
    pub fn ratchet_rank(self, other: Rank) -> Rank {
        if self.is_unbounded() || other.is_unbounded() {
            Rank::UNBOUNDED
        } else {
            Rank(self.0.max(other.0))
        }
    }
}

/// The chain of source rule ids a clause was built from, most recent last.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Provenance(pub Vec<Rc<str>>);

impl Provenance {
    pub fn axiom(rule_id: Rc<str>) -> Provenance {
        Provenance(vec![rule_id])
    }

    pub fn compose(&self, other: &Provenance) -> Provenance {
        let mut trail = self.0.clone();
        trail.extend(other.0.iter().cloned());
        Provenance(trail)
    }
}

/// A stateful Horn clause: `premises, guard -[rank]-> result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HornClause {
    pub premises: Vec<Event>,
    pub result: Event,
    pub guard: Guard,
    pub rank: Rank,
    pub provenance: Provenance,
}

impl HornClause {
    pub fn new(
        premises: Vec<Event>,
        result: Event,
        guard: Guard,
        rank: Rank,
        provenance: Provenance,
    ) -> Self {
        Self {
            premises,
            result,
            guard,
            rank,
            provenance,
        }
    }

    pub fn fact(result: Event, rank: Rank, provenance: Provenance) -> Self {
        Self::new(vec![], result, Guard::new(), rank, provenance)
    }

    /// The premises of this clause with any tuple-valued `know` premise
    /// expanded into its component `know` facts (`spec.md` §4.2
    /// detupling — an attacker who knows a pair knows each element).
    pub fn detupled_premises(&self) -> Vec<Event> {
        self.premises.iter().flat_map(detuple).collect()
    }

    /// Attempts to *compose* this clause with `other` by matching this
    /// clause's premise at `premise_index` against `other`'s result
    /// (`spec.md` §4.3). Composition is reserved for genuine clause
    /// combination — `other` must have a complex (function or tuple)
    /// result; atomic knowledge is resolved directly by the query engine's
    /// basic/compound partition (`spec.md` §4.6) via
    /// [`HornClause::resolve_basic_upon`] instead. Returns `None` if `other`'s
    /// result is atomic or a bare variable.
    pub fn compose_upon(&self, premise_index: usize, other: &HornClause) -> Option<HornClause> {
        if !other.result.messages().iter().any(Message::is_complex) {
            return None;
        }
        self.resolve_upon(premise_index, other)
    }

    /// Resolves this clause's premise at `premise_index` directly against a
    /// basic fact or rule (atomic or variable result), without the
    /// complex-result requirement [`HornClause::compose_upon`] enforces
    /// (`spec.md` §4.6: basic clauses are handled by the resolver directly
    /// rather than through the composition machinery).
    pub fn resolve_basic_upon(&self, premise_index: usize, other: &HornClause) -> Option<HornClause> {
        self.resolve_upon(premise_index, other)
    }

    /// Shared matching logic for [`HornClause::compose_upon`] and
    /// [`HornClause::resolve_basic_upon`].
    ///
    /// Conditions that must all hold:
    /// 1. the two events have the same tag (`know` only matches `know`, etc);
    /// 2. their messages two-way unify without violating either guard;
    /// 3. `other`'s rank is not anchored strictly later than this premise's
    ///    rank (a later fact cannot justify an earlier premise);
    /// 4. the composed clause's guard, restricted to its remaining free
    ///    variables, is still internally consistent (no variable is ground
    ///    to a value it itself forbids);
    /// 5. the composed result does not itself occur among the composed
    ///    premises (a rule may not justify itself).
    fn resolve_upon(&self, premise_index: usize, other: &HornClause) -> Option<HornClause> {
        let premise = self.premises.get(premise_index)?;
        if premise.tag() != other.result.tag() {
            return None;
        }
        if !other.rank.before_rank(self.rank) {
            return None;
        }

        let combined_guard = Guard::union_of(&self.guard, &other.guard);
        let mut sigma = SigmaFactory::new(Mode::TwoWay);
        for (a, b) in premise.messages().iter().zip(other.result.messages().iter()) {
            if !sigma.unify(a, b, &combined_guard) {
                return None;
            }
        }

        let forward = sigma.forward().clone();
        let backward = sigma.backward().clone();
        let apply = |m: &Message| backward.apply(&forward.apply(m));

        let mut new_premises: Vec<Event> = self
            .premises
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != premise_index)
            .map(|(_, ev)| ev.map_messages(apply))
            .collect();
        new_premises.extend(other.premises.iter().map(|ev| ev.map_messages(apply)));

        let new_result = self.result.map_messages(apply);
        if new_premises.contains(&new_result) {
            return None;
        }

        let remaining_vars: Vec<Message> = new_premises
            .iter()
            .chain(std::iter::once(&new_result))
            .flat_map(|ev| ev.messages().into_iter().cloned())
            .flat_map(|m| m.variables())
            .collect();
        let new_guard = combined_guard
            .substitute(apply)
            .filter(|var| remaining_vars.contains(var));

        for (var, values) in new_guard.iter() {
            if values.contains(var) {
                return None;
            }
        }

        Some(HornClause {
            premises: new_premises,
            result: new_result,
            guard: new_guard,
            rank: self.rank.ratchet_rank(other.rank),
            provenance: self.provenance.compose(&other.provenance),
        })
    }
}

/// Expands a tuple-valued `know` event into one `know` fact per component,
/// matching the Dolev-Yao "pairing" deconstruction rule. Non-tuple, non-know
/// events pass through unchanged.
pub fn detuple(event: &Event) -> Vec<Event> {
    match event {
        Event::Know(Message::Tuple(items)) => items.iter().map(|m| Event::Know(m.clone())).collect(),
        other => vec![other.clone()],
    }
}
