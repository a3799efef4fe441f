//! Building a rank-indexed Horn clause set from an elaborated nession
//! (`spec.md` §4.5).
//!
//! Two kinds of clauses feed the resolver: the ground facts a nession's
//! frames actually produced, anchored to the rank they were admitted at,
//! and the stateless rules of the protocol itself (Dolev-Yao-style
//! composition/decomposition rules), which hold at every rank since they
//! never depend on which frame the system happens to be in.

use statehorn_kernel::{Event, HornClause, Message, Provenance, Rank, Rule, RuleResult};

use crate::nession::Nession;

/// Builds the clause set a query against `nession` should resolve over.
///
/// `when`, if given, names a state cell and a value the query should assume
/// for it regardless of what (if anything) the nession's own frames wrote
/// there — a hypothetical fact seeded as an unbounded axiom so a query can
/// ask "what if this cell held that value" rather than only what the
/// nession actually reached (`spec.md` §4.6 goal reformulation).
pub fn clause_set(nession: &Nession, rules: &[Rule], when: Option<(&str, &Message)>) -> Vec<HornClause> {
    let mut clauses = Vec::new();

    for frame in &nession.frames {
        let provenance = match &frame.applied_rule {
            Some(rule_id) => Provenance::axiom(rule_id.clone()),
            None => Provenance::axiom(std::rc::Rc::from("init")),
        };
        for event in &frame.events {
            clauses.push(HornClause::fact(event.clone(), frame.rank, provenance.clone()));
        }
    }

    for rule in rules {
        if !rule.is_stateless() {
            continue;
        }
        if let RuleResult::Event(result) = &rule.result {
            clauses.push(HornClause::new(
                rule.premises.clone(),
                result.clone(),
                rule.guard.clone(),
                Rank::UNBOUNDED,
                Provenance::axiom(rule.id.clone()),
            ));
        }
    }

    if let Some((cell, value)) = when {
        clauses.push(HornClause::fact(
            Event::Make {
                cell: Message::name(cell),
                value: value.clone(),
            },
            Rank::UNBOUNDED,
            Provenance::axiom(std::rc::Rc::from("when")),
        ));
    }

    clauses
}
