#![cfg_attr(docsrs, feature(doc_cfg))]

//! # statehorn-cli
//!
//! Command-line interface for the statehorn protocol verifier (`spec.md`
//! §6.2). Parses a textual protocol description with `statehorn-compile`,
//! elaborates it with `statehorn-engine`, and reports whether the protocol's
//! `query leak` goal is reachable.

pub mod cli;

pub use cli::run_cli;
