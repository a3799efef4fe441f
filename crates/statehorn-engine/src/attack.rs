//! Attack records: turning a successful query proof into the textual
//! attack description external callers see (`spec.md` §6.3).

use std::fmt::Write as _;

use statehorn_kernel::{Event, HornClause};

/// A found attack: the original goal plus the ordered trail of rule ids
/// that derive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attack {
    pub goal: Event,
    pub rule_trail: Vec<String>,
}

impl Attack {
    /// Builds an attack record from a closed (premise-free) proof clause.
    pub fn from_proof(goal: Event, proof: &HornClause) -> Attack {
        Attack {
            goal,
            rule_trail: proof.provenance.0.iter().map(|id| id.to_string()).collect(),
        }
    }

    /// Renders this attack as the line-oriented description format of
    /// `spec.md` §6.3: a header naming the goal, followed by one indented
    /// line per rule in the derivation, in application order.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "attack: {}", self.goal);
        for (step, rule_id) in self.rule_trail.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", step + 1, rule_id);
        }
        out
    }
}
