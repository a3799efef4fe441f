//! The nession elaborator: forward symbolic execution over state
//! (`spec.md` §4.4).
//!
//! Starting from the empty nession, the elaborator repeatedly admits rules
//! level by level: first rules whose result keeps a cell's identity
//! consistent ("system rules"), then rules that transfer a cell to a new
//! identity, grouped by the [`knit`](crate::nession::knit) pattern so that
//! transfer rules touching disjoint cells are admitted together rather than
//! in every possible order. Freshly introduced nonces are checked for
//! uniqueness, every admitted rule's variables are freshened with a new
//! v-number generation, and nessions that are a strict prefix of a sibling
//! are pruned before the next level begins.

use std::collections::BTreeSet;
use std::rc::Rc;

use log::{debug, trace};
use statehorn_base::VNumberSource;
use statehorn_kernel::{
    Event, Guard, Message, PriorKind, Rank, Rule, RuleResult, Snapshot, SnapshotTree, State, Substitution,
};

use crate::nession::knit::{disjoint_groups, Footprint};
use crate::nession::{Frame, Nession};

/// Bounds on how far the elaborator is willing to search.
#[derive(Debug, Clone, Copy)]
pub struct ElaboratorConfig {
    pub max_depth: usize,
}

impl Default for ElaboratorConfig {
    fn default() -> Self {
        Self { max_depth: 16 }
    }
}

/// Drives level-by-level nession construction over a fixed rule set.
pub struct Elaborator<'a> {
    rules: &'a [Rule],
    config: ElaboratorConfig,
}

struct Candidate<'a> {
    rule: &'a Rule,
    substitution: Substitution,
    fresh_guard: Guard,
    fresh_result: Event,
    fresh_premises: Vec<Event>,
    footprint: BTreeSet<Rc<str>>,
}

impl<'a> Footprint for Candidate<'a> {
    fn footprint(&self) -> &BTreeSet<Rc<str>> {
        &self.footprint
    }
}

impl<'a> Elaborator<'a> {
    pub fn new(rules: &'a [Rule], config: ElaboratorConfig) -> Self {
        Self { rules, config }
    }

    /// Runs elaboration from an empty nession, returning every distinct
    /// branch reached (after prefix pruning) up to `max_depth`.
    pub fn elaborate(&self, vnum: &mut VNumberSource) -> Vec<Nession> {
        self.elaborate_from(Vec::new(), vnum)
    }

    /// Runs elaboration starting from a nession whose initial frame already
    /// carries `initial_events` (`spec.md` §6.1 `init` directive), otherwise
    /// identical to [`Elaborator::elaborate`]. Any `make` event among
    /// `initial_events` also seeds that cell's snapshot-tree head, so a
    /// state-gated rule can match the nession's starting condition at the
    /// very first level rather than only after a later transfer.
    pub fn elaborate_from(&self, initial_events: Vec<Event>, vnum: &mut VNumberSource) -> Vec<Nession> {
        let mut start = Nession::new();
        for event in &initial_events {
            if let Event::Make { cell: Message::Name(name), value } = event {
                let snapshot = Snapshot::root(State::new(name.clone(), value.clone()), vec![]);
                start.record_snapshot(name.clone(), snapshot, PriorKind::Immediate);
            }
        }
        start.frames[0].events = initial_events;
        let mut frontier = vec![start];

        for level in 0..self.config.max_depth {
            trace!("elaboration level {level}, frontier size {}", frontier.len());
            let mut next_frontier = Vec::new();

            for nession in &frontier {
                let system_candidates = self.candidates(nession, vnum, false);
                if system_candidates.is_empty() {
                    let transfer_candidates = self.candidates(nession, vnum, true);
                    if transfer_candidates.is_empty() {
                        next_frontier.push(nession.clone());
                        continue;
                    }
                    for group in disjoint_groups(&transfer_candidates) {
                        let mut branch = nession.clone();
                        for idx in group {
                            self.admit(&mut branch, &transfer_candidates[idx]);
                        }
                        next_frontier.push(branch);
                    }
                } else {
                    for candidate in &system_candidates {
                        let mut branch = nession.clone();
                        self.admit(&mut branch, candidate);
                        next_frontier.push(branch);
                    }
                }
            }

            frontier = prune_prefixes(next_frontier);
            if frontier.is_empty() {
                break;
            }
        }

        debug!("elaboration finished with {} branches", frontier.len());
        frontier
    }

    /// Finds every rule admissible against `nession`'s current knowledge,
    /// restricted to transferring rules if `transferring` is set.
    fn candidates(&self, nession: &Nession, vnum: &mut VNumberSource, transferring: bool) -> Vec<Candidate<'a>> {
        let mut out = Vec::new();
        for rule in self.rules {
            if rule.is_transferring() != transferring {
                continue;
            }
            if let Some(candidate) = self.try_admit(rule, nession, vnum) {
                out.push(candidate);
            }
        }
        out
    }

    /// Attempts to match `rule`'s premises against the facts already known
    /// in `nession`, freshening the rule's variables with a new v-number
    /// generation first.
    fn try_admit(&self, rule: &Rule, nession: &Nession, vnum: &mut VNumberSource) -> Option<Candidate<'a>> {
        let generation = vnum.next();
        let freshen = |m: &Message| freshen_message(m, generation);

        let fresh_premises: Vec<Event> = rule.premises.iter().map(|ev| ev.map_messages(freshen)).collect();
        let fresh_result_event = match &rule.result {
            RuleResult::Event(ev) => ev.clone(),
            RuleResult::Consistent(state) | RuleResult::Transferring(state) => {
                Event::Make { cell: Message::name(state.name.clone()), value: state.value.clone() }
            }
        }
        .map_messages(freshen);
        let fresh_guard = rule.guard.substitute(freshen);

        let known: Vec<&Event> = nession.all_events();
        let mut substitution = Substitution::empty();

        for premise in &fresh_premises {
            if premise.is_fresh_generation() {
                // `new` premises introduce an identity rather than match one.
                continue;
            }
            let mut matched_fact: Option<&Event> = None;
            for fact in known.iter().copied() {
                if fact.tag() != premise.tag() {
                    continue;
                }
                let probe = substitution.apply(&premise_signature(premise));
                if statehorn_kernel::unifiable(&probe, &premise_signature(fact), &fresh_guard) {
                    matched_fact = Some(fact);
                    break;
                }
            }
            let fact = matched_fact?;
            let sub = statehorn_kernel::unify_to(&premise_signature(premise), &premise_signature(fact), &fresh_guard)?;
            substitution = substitution.union(&sub);
        }

        // Nonce validity: a `new` event must introduce an identity not
        // already present among known facts, under the substitution found
        // so far.
        for premise in &fresh_premises {
            if let Event::New(m) = premise {
                let resolved = substitution.apply(m);
                let already_known = known
                    .iter()
                    .copied()
                    .any(|fact| matches!(fact, Event::Know(k) if *k == resolved));
                if already_known {
                    return None;
                }
            }
        }

        // Tree-implication check: the rule's own snapshot tree (freshened
        // along with its premises) must be implied by the state cells the
        // nession has actually reached so far (`spec.md` §4.2, §4.4 step 4).
        let fresh_tree = rule.snapshot_tree.map_messages(freshen);
        if !tree_is_implied(&fresh_tree, nession, &fresh_guard) {
            return None;
        }

        let footprint = rule_footprint(rule);

        Some(Candidate {
            rule,
            substitution: substitution.clone(),
            fresh_guard: fresh_guard.substitute(|m| substitution.apply(m)),
            fresh_result: fresh_result_event.map_messages(|m| substitution.apply(m)),
            fresh_premises: fresh_premises
                .into_iter()
                .map(|ev| ev.map_messages(|m| substitution.apply(m)))
                .collect(),
            footprint,
        })
    }

    fn admit(&self, nession: &mut Nession, candidate: &Candidate<'_>) {
        let events: Vec<Event> = candidate
            .fresh_premises
            .iter()
            .cloned()
            .chain(std::iter::once(candidate.fresh_result.clone()))
            .collect();

        if candidate.rule.is_transferring() {
            let next_rank = Rank::at(nession.current_rank().0 + 1);
            nession.push_frame(Frame::new(next_rank, candidate.rule.id.clone(), candidate.substitution.clone(), events));
            // A transfer always lands in a fresh frame immediately following
            // the cell's prior snapshot, so the new snapshot links back with
            // `PriorKind::Immediate` (`spec.md` §4.2).
            if let Event::Make { cell: Message::Name(name), value } = &candidate.fresh_result {
                let snapshot = statehorn_kernel::Snapshot::root(
                    statehorn_kernel::State::new(name.clone(), value.clone()),
                    candidate.fresh_premises.clone(),
                );
                nession.record_snapshot(name.clone(), snapshot, PriorKind::Immediate);
            }
        } else {
            let tail = nession.frames.last_mut().expect("a nession always has at least the initial frame");
            tail.admit_system_rule(candidate.rule.id.clone(), &candidate.substitution, &candidate.fresh_guard, events);
        }
    }
}

/// Checks that `rule_tree` is implied by `nession`'s current state-cell
/// history (`spec.md` §4.2, §4.4 step 4): for each trace head in
/// `rule_tree`, a same-named cell must already have a live head in
/// `nession`, whose value unifies with the rule's under `guard`; walking
/// backwards through both chains, each prior link must agree —
/// `PriorKind::Immediate` on the rule side demands an `Immediate` link on
/// the nession side too, while `PriorKind::Before` tolerates either. A rule
/// with no snapshot tree is trivially implied.
fn tree_is_implied(rule_tree: &SnapshotTree, nession: &Nession, guard: &Guard) -> bool {
    rule_tree.leaves().into_iter().all(|leaf| {
        let chain = rule_tree.chain(leaf);
        let cell_name = rule_tree.node(leaf).condition.name.clone();
        let Some(mut nession_handle) = nession.head(&cell_name) else {
            return false;
        };

        for rule_handle in chain {
            let rule_node = rule_tree.node(rule_handle);
            let nession_node = nession.tree.node(nession_handle);
            if rule_node.condition.name != nession_node.condition.name {
                return false;
            }
            if !statehorn_kernel::unifiable(&rule_node.condition.value, &nession_node.condition.value, guard) {
                return false;
            }
            match rule_node.prior {
                None => break,
                Some(rule_link) => match nession_node.prior {
                    None => return false,
                    Some(nession_link) => {
                        if rule_link.kind == PriorKind::Immediate && nession_link.kind != PriorKind::Immediate {
                            return false;
                        }
                        nession_handle = nession_link.handle;
                    }
                },
            }
        }
        true
    })
}

/// A single message standing in for an event's full signature, used to
/// drive unification uniformly across event shapes.
fn premise_signature(event: &Event) -> Message {
    let parts: Vec<Message> = event.messages().into_iter().cloned().collect();
    if parts.len() == 1 {
        parts.into_iter().next().unwrap()
    } else {
        Message::tuple(parts)
    }
}

fn freshen_message(m: &Message, generation: u32) -> Message {
    match m {
        Message::Variable { name, .. } => Message::variable_gen(name.clone(), generation),
        Message::Name(_) | Message::Nonce(_) => m.clone(),
        Message::Tuple(items) => Message::tuple(items.iter().map(|x| freshen_message(x, generation)).collect::<Vec<_>>()),
        Message::Function { name, args } => Message::function(
            name.clone(),
            args.iter().map(|x| freshen_message(x, generation)).collect::<Vec<_>>(),
        ),
    }
}

fn rule_footprint(rule: &Rule) -> BTreeSet<Rc<str>> {
    let mut footprint = BTreeSet::new();
    if let Some(state) = rule.result.state() {
        footprint.insert(state.name.clone());
    }
    for premise in &rule.premises {
        if let Event::Make { cell, .. } = premise {
            if let Message::Name(name) = cell {
                footprint.insert(name.clone());
            }
        }
    }
    footprint
}

fn prune_prefixes(nessions: Vec<Nession>) -> Vec<Nession> {
    let mut kept: Vec<Nession> = Vec::new();
    'outer: for candidate in nessions {
        for existing in &kept {
            if candidate.is_prefix_of(existing) {
                continue 'outer;
            }
        }
        kept.retain(|existing| !existing.is_prefix_of(&candidate));
        kept.push(candidate);
    }
    kept
}
