#![cfg_attr(docsrs, feature(doc_cfg))]

//! # statehorn-base
//!
//! Pure structural atoms shared across the statehorn workspace:
//!
//! - [`Interner`]/[`Symbol`] — string interning for O(1) equality
//! - [`VNumberSource`] — monotonic freshening counters for rule admission
//!
//! # Design Principles
//!
//! This crate has no knowledge of messages, rules, or the resolver. It
//! provides only generic, reusable infrastructure the higher-level crates
//! build upon.

mod intern;
mod vnum;

pub use intern::{Interner, Symbol};
pub use vnum::VNumberSource;
