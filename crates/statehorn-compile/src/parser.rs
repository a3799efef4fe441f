//! Recursive-descent parser for the textual protocol-description format
//! (`spec.md` §6.1).
//!
//! A parse error does not abort the whole run: the parser records the
//! diagnostic and skips forward to the next likely statement boundary
//! (`limit`, `init`, `query`, or `rule`), so a single typo reports once
//! instead of cascading into dozens of confusing follow-on errors.

use std::collections::BTreeMap;

use statehorn_kernel::{Event, Guard, Message, PriorKind, Rule, RuleResult, Snapshot, SnapshotHandle, SnapshotTree, State};

use crate::error::ParseError;
use crate::lexer::{Keyword, Lexer, Spanned, Token};

/// The fully parsed contents of a protocol-description source file.
#[derive(Debug, Clone, Default)]
pub struct CompiledProgram {
    pub limit: Option<i64>,
    pub initial_events: Vec<Event>,
    pub query: Option<Event>,
    pub rules: Vec<Rule>,
}

/// Parses `source`, returning both whatever was successfully recovered and
/// every diagnostic encountered along the way.
pub fn compile(source: &str) -> (CompiledProgram, Vec<ParseError>) {
    let tokens = Lexer::new(source).tokenize();
    let mut parser = Parser { tokens, pos: 0, errors: Vec::new() };
    let program = parser.parse_program();
    (program, parser.errors)
}

struct Parser {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].value
    }

    fn peek_spanned(&self) -> &Spanned<Token> {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Spanned<Token> {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn error_here(&mut self, message: impl Into<String>) -> ParseError {
        let here = self.peek_spanned();
        ParseError::new(here.line, here.column, message)
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseError> {
        if self.peek() == expected {
            self.bump();
            Ok(())
        } else {
            let got = self.peek().clone();
            Err(self.error_here(format!("expected {:?}, found {:?}", expected, got)))
        }
    }

    fn is_statement_boundary(&self) -> bool {
        matches!(
            self.peek(),
            Token::Keyword(Keyword::Limit)
                | Token::Keyword(Keyword::Init)
                | Token::Keyword(Keyword::Query)
                | Token::Keyword(Keyword::Rule)
                | Token::Eof
        )
    }

    fn recover(&mut self) {
        while !self.is_statement_boundary() {
            self.bump();
        }
    }

    fn parse_program(&mut self) -> CompiledProgram {
        let mut program = CompiledProgram::default();
        loop {
            match self.peek().clone() {
                Token::Eof => break,
                Token::Keyword(Keyword::Limit) => match self.parse_limit() {
                    Ok(n) => program.limit = Some(n),
                    Err(e) => {
                        self.errors.push(e);
                        self.recover();
                    }
                },
                Token::Keyword(Keyword::Init) => match self.parse_init() {
                    Ok(mut events) => program.initial_events.append(&mut events),
                    Err(e) => {
                        self.errors.push(e);
                        self.recover();
                    }
                },
                Token::Keyword(Keyword::Query) => match self.parse_query() {
                    Ok(goal) => program.query = Some(goal),
                    Err(e) => {
                        self.errors.push(e);
                        self.recover();
                    }
                },
                Token::Keyword(Keyword::Rule) => match self.parse_rule() {
                    Ok(rule) => program.rules.push(rule),
                    Err(e) => {
                        self.errors.push(e);
                        self.recover();
                    }
                },
                _ => {
                    let e = self.error_here("expected a directive or rule declaration");
                    self.errors.push(e);
                    self.recover();
                }
            }
        }
        program
    }

    fn parse_limit(&mut self) -> Result<i64, ParseError> {
        self.expect(&Token::Keyword(Keyword::Limit))?;
        match self.peek().clone() {
            Token::Number(n) => {
                self.bump();
                Ok(n)
            }
            other => Err(self.error_here(format!("expected a number after `limit`, found {:?}", other))),
        }
    }

    fn parse_init(&mut self) -> Result<Vec<Event>, ParseError> {
        self.expect(&Token::Keyword(Keyword::Init))?;
        self.parse_event_list()
    }

    fn parse_query(&mut self) -> Result<Event, ParseError> {
        self.expect(&Token::Keyword(Keyword::Query))?;
        self.expect(&Token::Keyword(Keyword::Leak))?;
        let m = self.parse_message()?;
        Ok(Event::Leak(m))
    }

    fn parse_rule(&mut self) -> Result<Rule, ParseError> {
        self.expect(&Token::Keyword(Keyword::Rule))?;
        let id = match self.peek().clone() {
            Token::Ident(name) => {
                self.bump();
                name
            }
            other => return Err(self.error_here(format!("expected a rule name, found {:?}", other))),
        };

        let mut guard = Guard::new();
        if self.peek() == &Token::Keyword(Keyword::Guard) {
            self.bump();
            loop {
                let var = self.parse_message()?;
                self.expect(&Token::NotEquals)?;
                let forbidden = self.parse_message()?;
                guard.forbid(var, forbidden);
                if self.peek() == &Token::Comma {
                    self.bump();
                } else {
                    break;
                }
            }
        }

        self.expect(&Token::Colon)?;
        let premises = self.parse_premises()?;
        let snapshot_tree = if self.peek() == &Token::SnapshotOpen {
            self.parse_snapshot_relations()?
        } else {
            SnapshotTree::new()
        };
        self.expect(&Token::Arrow)?;
        let result = self.parse_result()?;

        Ok(Rule::new(id, premises, result, guard, snapshot_tree))
    }

    /// Parses a rule's snapshot-relations section: `-[ (cell(value), label),
    /// label1 < label2, label1 <= label2, … ]`, pairing a cell's required
    /// value with a label and relating labels by strict (`<`, immediate) or
    /// non-strict (`<=`, before) precedence (`spec.md` §6.1
    /// snapshot-relations, adapted to this grammar's `<`/`<=` spelling of
    /// `⋖`/`≤`).
    fn parse_snapshot_relations(&mut self) -> Result<SnapshotTree, ParseError> {
        self.expect(&Token::SnapshotOpen)?;
        let mut bindings: Vec<(String, String, Message)> = Vec::new();
        let mut orderings: Vec<(String, String, PriorKind)> = Vec::new();

        loop {
            match self.peek().clone() {
                Token::LParen => {
                    self.bump();
                    let cell = match self.peek().clone() {
                        Token::Ident(name) => {
                            self.bump();
                            name
                        }
                        other => return Err(self.error_here(format!("expected a cell name, found {:?}", other))),
                    };
                    self.expect(&Token::LParen)?;
                    let value = self.parse_message()?;
                    self.expect(&Token::RParen)?;
                    self.expect(&Token::Comma)?;
                    let label = match self.peek().clone() {
                        Token::Ident(name) => {
                            self.bump();
                            name
                        }
                        other => return Err(self.error_here(format!("expected a snapshot label, found {:?}", other))),
                    };
                    self.expect(&Token::RParen)?;
                    bindings.push((label, cell, value));
                }
                Token::Ident(first) => {
                    self.bump();
                    self.expect(&Token::LAngle)?;
                    let kind = if self.peek() == &Token::Equals {
                        self.bump();
                        PriorKind::Before
                    } else {
                        PriorKind::Immediate
                    };
                    let second = match self.peek().clone() {
                        Token::Ident(name) => {
                            self.bump();
                            name
                        }
                        other => return Err(self.error_here(format!("expected a snapshot label, found {:?}", other))),
                    };
                    orderings.push((first, second, kind));
                }
                other => return Err(self.error_here(format!("expected a snapshot relation, found {:?}", other))),
            }
            if self.peek() == &Token::Comma {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(&Token::RBracket)?;

        build_snapshot_tree(bindings, orderings).map_err(|message| self.error_here(message))
    }

    /// A rule's premise list, which — unlike an `init` event list — may be
    /// empty: a rule with no premises fires unconditionally.
    fn parse_premises(&mut self) -> Result<Vec<Event>, ParseError> {
        if self.peek() == &Token::SnapshotOpen || self.peek() == &Token::Arrow {
            return Ok(Vec::new());
        }
        self.parse_event_list()
    }

    /// An event list mixes bare premise events (`know x`) and state
    /// conditions (`cell = value`), separated by commas.
    fn parse_event_list(&mut self) -> Result<Vec<Event>, ParseError> {
        let mut events = vec![self.parse_event()?];
        while self.peek() == &Token::Comma {
            self.bump();
            events.push(self.parse_event()?);
        }
        Ok(events)
    }

    fn parse_event(&mut self) -> Result<Event, ParseError> {
        match self.peek().clone() {
            Token::Keyword(Keyword::Know) => {
                self.bump();
                Ok(Event::Know(self.parse_message()?))
            }
            Token::Keyword(Keyword::New) => {
                self.bump();
                Ok(Event::New(self.parse_message()?))
            }
            Token::Keyword(Keyword::Accept) => {
                self.bump();
                Ok(Event::Accept(self.parse_message()?))
            }
            Token::Keyword(Keyword::Leak) => {
                self.bump();
                Ok(Event::Leak(self.parse_message()?))
            }
            Token::Ident(cell) => {
                self.bump();
                self.expect(&Token::Equals)?;
                let value = self.parse_message()?;
                Ok(Event::Make { cell: Message::name(cell), value })
            }
            other => Err(self.error_here(format!("expected an event, found {:?}", other))),
        }
    }

    fn parse_result(&mut self) -> Result<RuleResult, ParseError> {
        match self.peek().clone() {
            Token::Keyword(Keyword::Know) => {
                self.bump();
                Ok(RuleResult::Event(Event::Know(self.parse_message()?)))
            }
            Token::Keyword(Keyword::New) => {
                self.bump();
                Ok(RuleResult::Event(Event::New(self.parse_message()?)))
            }
            Token::Keyword(Keyword::Accept) => {
                self.bump();
                Ok(RuleResult::Event(Event::Accept(self.parse_message()?)))
            }
            Token::Keyword(Keyword::Leak) => {
                self.bump();
                Ok(RuleResult::Event(Event::Leak(self.parse_message()?)))
            }
            Token::Ident(cell) => {
                self.bump();
                match self.peek().clone() {
                    Token::Equals => {
                        self.bump();
                        let value = self.parse_message()?;
                        Ok(RuleResult::Consistent(State::new(cell, value)))
                    }
                    Token::Keyword(Keyword::To) => {
                        self.bump();
                        let value = self.parse_message()?;
                        Ok(RuleResult::Transferring(State::new(cell, value)))
                    }
                    other => Err(self.error_here(format!("expected `=` or `to` after cell name, found {:?}", other))),
                }
            }
            other => Err(self.error_here(format!("expected a rule result, found {:?}", other))),
        }
    }

    fn parse_message(&mut self) -> Result<Message, ParseError> {
        match self.peek().clone() {
            Token::Bracketed(name) => {
                self.bump();
                Ok(Message::nonce(name))
            }
            Token::LAngle => {
                self.bump();
                let mut items = Vec::new();
                if self.peek() != &Token::RAngle {
                    items.push(self.parse_message()?);
                    while self.peek() == &Token::Comma {
                        self.bump();
                        items.push(self.parse_message()?);
                    }
                }
                self.expect(&Token::RAngle)?;
                Ok(Message::tuple(items))
            }
            Token::Ident(name) => {
                self.bump();
                match self.peek().clone() {
                    Token::LParen => {
                        self.bump();
                        let mut args = Vec::new();
                        if self.peek() != &Token::RParen {
                            args.push(self.parse_message()?);
                            while self.peek() == &Token::Comma {
                                self.bump();
                                args.push(self.parse_message()?);
                            }
                        }
                        self.expect(&Token::RParen)?;
                        Ok(Message::function(name, args))
                    }
                    Token::Bracketed(empty) if empty.is_empty() => {
                        self.bump();
                        Ok(Message::name(name))
                    }
                    _ => Ok(Message::variable(name)),
                }
            }
            other => Err(self.error_here(format!("expected a message, found {:?}", other))),
        }
    }
}

/// Assembles a [`SnapshotTree`] from a flat list of `(label, cell, value)`
/// bindings and `(from_label, to_label, kind)` orderings, inserting each
/// binding once its ordering predecessor (if any) has already been placed.
///
/// Labels with no incoming ordering become roots; a label may be the "to"
/// side of at most one ordering, matching a single prior link per snapshot.
fn build_snapshot_tree(
    bindings: Vec<(String, String, Message)>,
    orderings: Vec<(String, String, PriorKind)>,
) -> Result<SnapshotTree, String> {
    let mut tree = SnapshotTree::new();
    let mut placed: BTreeMap<String, SnapshotHandle> = BTreeMap::new();
    let mut remaining = bindings;

    loop {
        let before = remaining.len();
        remaining.retain(|(label, cell, value)| {
            let predecessor = orderings.iter().find(|(_, to, _)| to == label);
            let ready = match predecessor {
                None => true,
                Some((from, _, _)) => placed.contains_key(from),
            };
            if !ready {
                return true;
            }
            let snapshot = Snapshot::root(State::new(cell.clone(), value.clone()), vec![]);
            let handle = match predecessor {
                None => tree.insert_root(snapshot),
                Some((from, _, kind)) => tree.insert_after(placed[from], *kind, snapshot),
            };
            placed.insert(label.clone(), handle);
            false
        });
        if remaining.is_empty() {
            break;
        }
        if remaining.len() == before {
            let stuck: Vec<_> = remaining.iter().map(|(label, ..)| label.clone()).collect();
            return Err(format!("unresolvable snapshot ordering involving label(s): {}", stuck.join(", ")));
        }
    }

    for (from, to, _) in &orderings {
        if !placed.contains_key(from) {
            return Err(format!("snapshot ordering references unknown label `{from}`"));
        }
        if !placed.contains_key(to) {
            return Err(format!("snapshot ordering references unknown label `{to}`"));
        }
    }

    Ok(tree)
}
