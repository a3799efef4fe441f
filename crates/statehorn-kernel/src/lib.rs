#![cfg_attr(docsrs, feature(doc_cfg))]

//! # statehorn-kernel
//!
//! The term algebra and static data model statehorn's elaborator and
//! resolver are built on:
//!
//! - [`Message`] — the term algebra: variables, names, nonces, tuples,
//!   function applications
//! - [`Guard`] — per-variable inequality constraints
//! - [`Substitution`] and [`sigma_factory`] — ordered bindings and two-sided
//!   unification
//! - [`Event`] — the tagged actions (`know`, `new`, `init`, `accept`,
//!   `leak`, `make`) rules reason about
//! - [`State`] — named state cells
//! - [`snapshot`]/[`snapshot_tree`] — a cell's history as a handle-indexed,
//!   acyclic-by-construction forest
//! - [`Rule`]/[`RuleResult`] — the user-facing protocol rule shape
//! - [`HornClause`] — the flattened, composable unit the resolver chains
//!
//! # Design Principles
//!
//! Nothing in this crate knows about frames, nessions, or search strategy —
//! that belongs to `statehorn-engine`. This crate only has to answer "is
//! this term algebra value well-formed" and "can these two things unify,"
//! deterministically and without search.

mod error;
mod event;
mod guard;
mod horn;
mod message;
mod rule;
pub mod sigma_factory;
mod snapshot;
mod snapshot_tree;
mod state;
mod substitution;
mod unify;

pub use error::{RuleError, StructuralError};
pub use event::Event;
pub use guard::Guard;
pub use horn::{detuple, HornClause, Provenance, Rank};
pub use message::Message;
pub use rule::{Rule, RuleResult};
pub use snapshot::{PriorKind, PriorLink, Snapshot, SnapshotHandle};
pub use snapshot_tree::SnapshotTree;
pub use state::State;
pub use substitution::Substitution;
pub use unify::{
    can_unify_messages_both_ways, can_unify_messages_one_way, unifiable, unify_both_ways_to,
    unify_to,
};
