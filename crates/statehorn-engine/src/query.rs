//! The backward-chaining query engine (`spec.md` §4.6).
//!
//! Given a goal event (typically a `leak` query target) and a clause set
//! built by [`crate::clauses::clause_set`], repeatedly resolves the goal's
//! leftmost outstanding premise against candidate clauses until every
//! premise is discharged or the search is exhausted. Rank ordering is
//! enforced by [`statehorn_kernel::HornClause::compose_upon`]/
//! [`statehorn_kernel::HornClause::resolve_basic_upon`] themselves; this
//! module picks which of the two applies per candidate (the basic/compound
//! partition of §4.6), tracks cross-option state consistency, and adds depth
//! and breadth bounds plus cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::trace;
use statehorn_kernel::sigma_factory::{Mode, SigmaFactory};
use statehorn_kernel::{Event, Guard, HornClause, Message, Provenance, Rank};

/// Search bounds for a single query.
#[derive(Debug, Clone, Copy)]
pub struct QueryConfig {
    /// Maximum resolution depth (number of clause compositions) attempted
    /// along any single derivation path.
    pub max_depth: usize,
    /// Maximum number of candidate clauses tried per outstanding premise.
    pub max_breadth: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_breadth: 32,
        }
    }
}

/// The result of resolving a query.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// The goal was proved; `clause` is the closed (premise-free) clause
    /// whose provenance trail names the rules used, in application order.
    Proved(HornClause),
    /// The search exhausted its depth/breadth bounds, or was cancelled,
    /// without finding a proof.
    Failed,
}

/// Attempts to prove `goal` is derivable from `clauses`, returning the
/// closed clause on success. `cancel`, if set, causes the search to abandon
/// at the next opportunity (`spec.md` §5 cooperative cancellation). `when`,
/// if given, names a state cell and the value the proof must stay
/// consistent with: any `make` fact used along the derivation path that
/// names the same cell with a different value is rejected, preventing a
/// single proof from straddling two incompatible state options
/// (`spec.md` §4.6 cross-option consistency).
pub fn query(
    goal: Event,
    clauses: &[HornClause],
    config: QueryConfig,
    cancel: Option<&Arc<AtomicBool>>,
    when: Option<(&str, &Message)>,
) -> QueryOutcome {
    let start = HornClause::new(vec![goal.clone()], goal, Guard::new(), Rank::UNBOUNDED, Provenance::default());
    let mut commitments = SigmaFactory::new(Mode::OneWay);
    if let Some((cell, value)) = when {
        if !commitments.commit_state(cell.to_string(), value.clone()) {
            return QueryOutcome::Failed;
        }
    }
    match prove(&start, clauses, 0, &config, cancel, &commitments) {
        Some(closed) => QueryOutcome::Proved(closed),
        None => QueryOutcome::Failed,
    }
}

fn prove(
    goal: &HornClause,
    clauses: &[HornClause],
    depth: usize,
    config: &QueryConfig,
    cancel: Option<&Arc<AtomicBool>>,
    commitments: &SigmaFactory,
) -> Option<HornClause> {
    if goal.premises.is_empty() {
        return Some(goal.clone());
    }
    if depth >= config.max_depth {
        return None;
    }
    if let Some(flag) = cancel {
        if flag.load(Ordering::Relaxed) {
            trace!("query cancelled at depth {depth}");
            return None;
        }
    }

    let target_tag = goal.premises[0].tag();
    let mut tried = 0;
    for clause in clauses {
        if tried >= config.max_breadth {
            break;
        }
        if clause.result.tag() != target_tag {
            continue;
        }
        tried += 1;

        let mut next_commitments = commitments.clone();
        if let Event::Make { cell: Message::Name(name), value } = &clause.result {
            if !next_commitments.commit_state(name.clone(), value.clone()) {
                continue;
            }
        }

        let is_basic = !clause.result.messages().iter().any(Message::is_complex);
        let composed = if is_basic {
            goal.resolve_basic_upon(0, clause)
        } else {
            goal.compose_upon(0, clause)
        };
        if let Some(composed) = composed {
            if let Some(proof) = prove(&composed, clauses, depth + 1, config, cancel, &next_commitments) {
                return Some(proof);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use statehorn_kernel::Message;
    use std::rc::Rc;

    fn fact(event: Event, rank: Rank, id: &str) -> HornClause {
        HornClause::fact(event, rank, Provenance::axiom(Rc::from(id)))
    }

    #[test]
    fn a_know_fact_alone_cannot_prove_a_leak_goal() {
        let clauses = vec![fact(Event::Know(Message::name("a")), Rank::at(1), "know_a")];
        let outcome = query(Event::Leak(Message::name("a")), &clauses, QueryConfig::default(), None, None);
        assert!(matches!(outcome, QueryOutcome::Failed));
    }

    #[test]
    fn a_closed_goal_is_proved_with_no_clauses() {
        let outcome = query(Event::Know(Message::name("a")), &[], QueryConfig::default(), None, None);
        assert!(matches!(outcome, QueryOutcome::Failed));
    }

    #[test]
    fn chained_derivation_is_found() {
        let clauses = vec![
            fact(Event::Know(Message::name("a")), Rank::at(1), "know_a"),
            HornClause::new(
                vec![Event::Know(Message::variable("x"))],
                Event::Leak(Message::variable("x")),
                Guard::new(),
                Rank::UNBOUNDED,
                Provenance::axiom(Rc::from("reveal")),
            ),
        ];
        let outcome = query(Event::Leak(Message::name("a")), &clauses, QueryConfig::default(), None, None);
        match outcome {
            QueryOutcome::Proved(clause) => {
                assert!(clause.premises.is_empty());
                assert_eq!(clause.provenance.0, vec![Rc::from("reveal"), Rc::from("know_a")]);
            }
            QueryOutcome::Failed => panic!("expected a proof"),
        }
    }

    #[test]
    fn unreachable_goal_fails() {
        let clauses = vec![fact(Event::Know(Message::name("b")), Rank::at(1), "know_b")];
        let outcome = query(Event::Leak(Message::name("a")), &clauses, QueryConfig::default(), None, None);
        assert!(matches!(outcome, QueryOutcome::Failed));
    }

    #[test]
    fn cancellation_flag_aborts_the_search() {
        let clauses = vec![
            fact(Event::Know(Message::name("a")), Rank::at(1), "know_a"),
            HornClause::new(
                vec![Event::Know(Message::variable("x"))],
                Event::Leak(Message::variable("x")),
                Guard::new(),
                Rank::UNBOUNDED,
                Provenance::axiom(Rc::from("reveal")),
            ),
        ];
        let cancel = Arc::new(AtomicBool::new(true));
        let outcome = query(
            Event::Leak(Message::name("a")),
            &clauses,
            QueryConfig::default(),
            Some(&cancel),
            None,
        );
        assert!(matches!(outcome, QueryOutcome::Failed));
    }

    #[test]
    fn depth_bound_of_zero_only_accepts_an_already_closed_goal() {
        let clauses = vec![fact(Event::Know(Message::name("a")), Rank::at(1), "know_a")];
        let config = QueryConfig { max_depth: 0, max_breadth: 32 };
        let outcome = query(Event::Leak(Message::name("a")), &clauses, config, None, None);
        assert!(matches!(outcome, QueryOutcome::Failed));
    }

    #[test]
    fn when_rejects_a_proof_that_contradicts_the_assumed_cell_value() {
        let clauses = vec![
            HornClause::fact(
                Event::Make { cell: Message::name("sd"), value: Message::name("test1") },
                Rank::at(1),
                Provenance::axiom(Rc::from("set_sd")),
            ),
            HornClause::new(
                vec![Event::Make { cell: Message::variable("c"), value: Message::variable("v") }],
                Event::Leak(Message::variable("v")),
                Guard::new(),
                Rank::UNBOUNDED,
                Provenance::axiom(Rc::from("reveal")),
            ),
        ];
        let assumed = Message::name("test2");
        let outcome = query(
            Event::Leak(Message::name("test1")),
            &clauses,
            QueryConfig::default(),
            None,
            Some(("sd", &assumed)),
        );
        assert!(matches!(outcome, QueryOutcome::Failed));
    }

    #[test]
    fn when_permits_a_proof_consistent_with_the_assumed_cell_value() {
        let clauses = vec![
            HornClause::fact(
                Event::Make { cell: Message::name("sd"), value: Message::name("test2") },
                Rank::UNBOUNDED,
                Provenance::axiom(Rc::from("when")),
            ),
            HornClause::new(
                vec![Event::Make { cell: Message::variable("c"), value: Message::variable("v") }],
                Event::Leak(Message::variable("v")),
                Guard::new(),
                Rank::UNBOUNDED,
                Provenance::axiom(Rc::from("reveal")),
            ),
        ];
        let assumed = Message::name("test2");
        let outcome = query(
            Event::Leak(Message::name("test2")),
            &clauses,
            QueryConfig::default(),
            None,
            Some(("sd", &assumed)),
        );
        assert!(matches!(outcome, QueryOutcome::Proved(_)));
    }
}
