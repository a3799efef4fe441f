#![cfg_attr(docsrs, feature(doc_cfg))]

//! # statehorn-engine
//!
//! Forward symbolic execution over state ([`elaborator`]) and backward
//! ranked Horn-clause resolution ([`query`]) built on top of
//! `statehorn-kernel`'s term algebra and static data model.
//!
//! - [`nession`] — the frame sequence and snapshot history a single branch
//!   of system evolution accumulates
//! - [`elaborator`] — drives level-by-level rule admission, producing the
//!   set of reachable nessions for a rule set
//! - [`clauses`] — flattens an elaborated nession into a rank-indexed Horn
//!   clause database
//! - [`query`] — backward-chains a goal event against a clause database
//! - [`attack`] — renders a successful proof as a textual attack trace
//! - [`callbacks`] — progress hooks and cooperative cancellation for a run
//!
//! # Design Principles
//!
//! The elaborator and resolver are both pure functions of their inputs:
//! given the same rule set and the same starting v-number generation, they
//! always explore branches in the same order, so two runs over the same
//! input produce byte-identical attack traces.

pub mod attack;
pub mod callbacks;
pub mod clauses;
pub mod elaborator;
pub mod nession;
pub mod query;

pub use attack::Attack;
pub use callbacks::ExecutionCallbacks;
pub use clauses::clause_set;
pub use elaborator::{Elaborator, ElaboratorConfig};
pub use nession::{Frame, Nession};
pub use query::{query, QueryConfig, QueryOutcome};
