//! Command-line argument parsing and dispatch for `horn`.
//!
//! The CLI is built on [`clap`] derive macros. Each command variant in
//! [`Commands`] maps to a handler function that drives the
//! `statehorn-compile` / `statehorn-engine` pipeline.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use statehorn_base::VNumberSource;
use statehorn_compile::compile;
use statehorn_engine::{clause_set, query, Attack, Elaborator, ElaboratorConfig, QueryConfig, QueryOutcome};

/// Command-line interface for the statehorn protocol verifier.
#[derive(Parser)]
#[command(name = "horn")]
#[command(about = "Symbolic verifier for stateful Horn-clause protocol models", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Elaborate a protocol description and search for an attack on its
    /// `query leak` goal.
    ///
    /// # Example
    ///
    /// ```bash
    /// horn check protocol.horn
    /// horn check protocol.horn --json
    /// ```
    Check {
        /// Path to the protocol description source file.
        file: PathBuf,

        /// Emit the result as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,

        /// Maximum elaboration depth (overrides `limit` in the source file).
        #[arg(long)]
        max_depth: Option<usize>,

        /// Maximum number of candidate clauses tried per outstanding goal
        /// premise during resolution.
        #[arg(long, default_value_t = 32)]
        max_breadth: usize,
    },

    /// Parse a protocol description and print a summary of its directives
    /// and rules without running verification.
    ///
    /// # Example
    ///
    /// ```bash
    /// horn describe protocol.horn
    /// ```
    Describe {
        /// Path to the protocol description source file.
        file: PathBuf,
    },
}

/// Parses CLI arguments and executes the corresponding command.
///
/// Returns `Ok(true)` if an attack was found (`check` only), `Ok(false)`
/// otherwise, so [`main`](crate) can map a found attack to a non-zero exit
/// code without treating it as an error.
pub fn run_cli() -> Result<bool, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { file, json, max_depth, max_breadth } => cmd_check(&file, json, max_depth, max_breadth),
        Commands::Describe { file } => cmd_describe(&file).map(|()| false),
    }
}

#[derive(Serialize)]
struct CheckReport {
    file: String,
    proved: bool,
    attack: Option<AttackReport>,
    parse_errors: Vec<String>,
}

#[derive(Serialize)]
struct AttackReport {
    goal: String,
    rule_trail: Vec<String>,
}

fn cmd_check(
    file: &PathBuf,
    json: bool,
    max_depth_override: Option<usize>,
    max_breadth: usize,
) -> Result<bool, Box<dyn std::error::Error>> {
    let source = fs::read_to_string(file)?;
    let (program, errors) = compile(&source);

    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        if json {
            let report = CheckReport {
                file: file.display().to_string(),
                proved: false,
                attack: None,
                parse_errors: messages,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            for message in &messages {
                eprintln!("{}", message);
            }
        }
        return Err("failed to parse protocol description".into());
    }

    let goal = program
        .query
        .clone()
        .ok_or("protocol description has no `query leak` directive")?;

    let max_depth = max_depth_override
        .or_else(|| program.limit.map(|n| n.max(0) as usize))
        .unwrap_or(ElaboratorConfig::default().max_depth);

    let elaborator = Elaborator::new(&program.rules, ElaboratorConfig { max_depth });
    let mut vnum = VNumberSource::new();
    let branches = elaborator.elaborate_from(program.initial_events.clone(), &mut vnum);

    let query_config = QueryConfig { max_depth: max_depth.max(1) * 4, max_breadth };

    let mut found: Option<Attack> = None;
    for nession in &branches {
        let clauses = clause_set(nession, &program.rules, None);
        if let QueryOutcome::Proved(proof) = query(goal.clone(), &clauses, query_config, None, None) {
            found = Some(Attack::from_proof(goal.clone(), &proof));
            break;
        }
    }

    let proved = found.is_some();

    if json {
        let report = CheckReport {
            file: file.display().to_string(),
            proved,
            attack: found.as_ref().map(|a| AttackReport {
                goal: a.goal.to_string(),
                rule_trail: a.rule_trail.clone(),
            }),
            parse_errors: vec![],
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match &found {
            Some(attack) => print!("{}", attack.describe()),
            None => println!("no attack found within the search bounds for: {}", goal),
        }
    }

    Ok(proved)
}

fn cmd_describe(file: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(file)?;
    let (program, errors) = compile(&source);

    for error in &errors {
        eprintln!("{}", error);
    }

    println!("limit: {}", program.limit.map(|n| n.to_string()).unwrap_or_else(|| "(default)".to_string()));
    println!("initial events: {}", program.initial_events.len());
    for event in &program.initial_events {
        println!("  {}", event);
    }
    match &program.query {
        Some(goal) => println!("query: {}", goal),
        None => println!("query: (none)"),
    }
    println!("rules: {}", program.rules.len());
    for rule in &program.rules {
        println!("  {}", rule.id);
    }

    if !errors.is_empty() {
        return Err("protocol description contains parse errors".into());
    }
    Ok(())
}
