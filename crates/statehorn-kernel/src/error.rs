//! Error types for rule construction and structural validation.
//!
//! Matches the rest of the workspace's hand-rolled `Display` + `Error`
//! style rather than pulling in a derive macro crate — these enums are
//! small and stable enough that it buys little.

use std::fmt;

/// A rule could not be built or admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// A guard mentioned a variable that never appears in the rule's
    /// premises or result.
    UnboundGuardVariable { rule_id: String, variable: String },
    /// A rule's result referenced a cell its premises never conditioned on,
    /// violating the "every write reads its own prior" shape rules must take.
    MissingPriorCondition { rule_id: String, cell: String },
    /// Two premises of the same rule disagree about a cell's prior value.
    ConflictingPriorCondition { rule_id: String, cell: String },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::UnboundGuardVariable { rule_id, variable } => write!(
                f,
                "rule `{}` guards variable `{}` which never occurs in its premises or result",
                rule_id, variable
            ),
            RuleError::MissingPriorCondition { rule_id, cell } => write!(
                f,
                "rule `{}` writes cell `{}` without conditioning on its prior value",
                rule_id, cell
            ),
            RuleError::ConflictingPriorCondition { rule_id, cell } => write!(
                f,
                "rule `{}` has conflicting premises over cell `{}`'s prior value",
                rule_id, cell
            ),
        }
    }
}

impl std::error::Error for RuleError {}

/// The static data model (snapshot tree, rule set) failed a well-formedness
/// check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// A snapshot handle referenced a node outside its arena.
    DanglingSnapshotHandle { handle: usize },
    /// A snapshot's prior chain contained a duplicate handle, which should
    /// be structurally unreachable but is checked defensively at
    /// construction boundaries.
    CyclicPriorChain { handle: usize },
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralError::DanglingSnapshotHandle { handle } => {
                write!(f, "snapshot handle {} does not exist in this arena", handle)
            }
            StructuralError::CyclicPriorChain { handle } => {
                write!(f, "snapshot {} has a cyclic prior chain", handle)
            }
        }
    }
}

impl std::error::Error for StructuralError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_error_display_names_the_rule() {
        let err = RuleError::UnboundGuardVariable {
            rule_id: "r1".into(),
            variable: "x".into(),
        };
        assert!(err.to_string().contains("r1"));
        assert!(err.to_string().contains('x'));
    }

    #[test]
    fn structural_error_display_names_the_handle() {
        let err = StructuralError::DanglingSnapshotHandle { handle: 3 };
        assert!(err.to_string().contains('3'));
    }
}
