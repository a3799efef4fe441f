//! Tokenizer for the textual protocol-description format (`spec.md` §6.1).
//!
//! Hand-written rather than built on a parser-combinator crate: the grammar
//! is small and line-oriented, and a direct lexer keeps error locations
//! (line, column) exact without fighting a combinator library's own error
//! type.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Ident(String),
    Number(i64),
    /// `[` ... `]` wrapped in the source, yielded without the brackets:
    /// `[n]` becomes `Token::Bracketed("n")`.
    Bracketed(String),
    LParen,
    RParen,
    LAngle,
    RAngle,
    Comma,
    Colon,
    Equals,
    Arrow,
    NotEquals,
    /// `-[`, opening a rule's snapshot-relations section. Distinguished from
    /// a bare `[` (which starts a [`Token::Bracketed`] nonce) by requiring
    /// the preceding `-`.
    SnapshotOpen,
    /// The closing `]` of a snapshot-relations section.
    RBracket,
    Keyword(Keyword),
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Limit,
    Init,
    Query,
    Leak,
    Rule,
    Guard,
    Know,
    New,
    Accept,
    To,
}

impl Keyword {
    fn from_ident(s: &str) -> Option<Keyword> {
        Some(match s {
            "limit" => Keyword::Limit,
            "init" => Keyword::Init,
            "query" => Keyword::Query,
            "leak" => Keyword::Leak,
            "rule" => Keyword::Rule,
            "guard" => Keyword::Guard,
            "know" => Keyword::Know,
            "new" => Keyword::New,
            "accept" => Keyword::Accept,
            "to" => Keyword::To,
            _ => return None,
        })
    }
}

/// A token plus its 1-indexed source position, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<T> {
    pub value: T,
    pub line: usize,
    pub column: usize,
}

impl<T> fmt::Display for Spanned<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}:{}", self.value, self.line, self.column)
    }
}

pub struct Lexer<'a> {
    /// The source with comments stripped and line continuations joined,
    /// as (char, original_line, original_column) triples.
    chars: Vec<(char, usize, usize)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let joined = join_continuations(source);
        let mut chars = Vec::new();
        for (line_idx, line) in joined.iter().enumerate() {
            let content = strip_comment(line);
            for (col_idx, ch) in content.chars().enumerate() {
                chars.push((ch, line_idx + 1, col_idx + 1));
            }
            chars.push(('\n', line_idx + 1, content.chars().count() + 1));
        }
        Self { chars, pos: 0 }
    }

    fn peek(&self) -> Option<(char, usize, usize)> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<(char, usize, usize)> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Tokenizes the entire input, returning one token stream ending in
    /// `Token::Eof`.
    pub fn tokenize(mut self) -> Vec<Spanned<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let Some((ch, line, column)) = self.peek() else {
                tokens.push(Spanned { value: Token::Eof, line: 0, column: 0 });
                break;
            };

            let token = match ch {
                '(' => { self.bump(); Token::LParen }
                ')' => { self.bump(); Token::RParen }
                '<' => { self.bump(); Token::LAngle }
                '>' => { self.bump(); Token::RAngle }
                ',' => { self.bump(); Token::Comma }
                ':' => { self.bump(); Token::Colon }
                '=' => {
                    self.bump();
                    if self.peek().map(|(c, ..)| c) == Some('>') {
                        self.bump();
                        Token::Arrow
                    } else {
                        Token::Equals
                    }
                }
                '!' => {
                    self.bump();
                    if self.peek().map(|(c, ..)| c) == Some('=') {
                        self.bump();
                        Token::NotEquals
                    } else {
                        Token::Eof // unrecognized; caller reports via position
                    }
                }
                '[' => {
                    self.bump();
                    let mut name = String::new();
                    while let Some((c, ..)) = self.peek() {
                        if c == ']' {
                            break;
                        }
                        name.push(c);
                        self.bump();
                    }
                    self.bump(); // consume ']'
                    Token::Bracketed(name)
                }
                ']' => { self.bump(); Token::RBracket }
                '-' => {
                    self.bump();
                    if self.peek().map(|(c, ..)| c) == Some('[') {
                        self.bump();
                        Token::SnapshotOpen
                    } else {
                        // a bare `-` has no meaning in this grammar
                        continue;
                    }
                }
                c if c.is_ascii_digit() => {
                    let mut num = String::new();
                    while let Some((c, ..)) = self.peek() {
                        if c.is_ascii_digit() {
                            num.push(c);
                            self.bump();
                        } else {
                            break;
                        }
                    }
                    Token::Number(num.parse().unwrap_or(0))
                }
                c if is_ident_start(c) => {
                    let mut ident = String::new();
                    while let Some((c, ..)) = self.peek() {
                        if is_ident_continue(c) {
                            ident.push(c);
                            self.bump();
                        } else {
                            break;
                        }
                    }
                    match Keyword::from_ident(&ident) {
                        Some(kw) => Token::Keyword(kw),
                        None => Token::Ident(ident),
                    }
                }
                _ => {
                    self.bump();
                    continue;
                }
            };
            tokens.push(Spanned { value: token, line, column });
        }
        tokens
    }

    fn skip_whitespace(&mut self) {
        while let Some((c, ..)) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '\''
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

/// Joins lines ending in a trailing `\` with the next line, so a rule body
/// can be spread across several source lines.
fn join_continuations(source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending = String::new();
    for line in source.lines() {
        if let Some(stripped) = line.strip_suffix('\\') {
            pending.push_str(stripped);
            pending.push(' ');
        } else {
            pending.push_str(line);
            out.push(std::mem::take(&mut pending));
        }
    }
    if !pending.is_empty() {
        out.push(pending);
    }
    out
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_values(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().into_iter().map(|t| t.value).collect()
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        assert_eq!(
            token_values("rule r1 know x"),
            vec![
                Token::Keyword(Keyword::Rule),
                Token::Ident("r1".to_string()),
                Token::Keyword(Keyword::Know),
                Token::Ident("x".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn lexes_bracketed_nonce_and_arrow() {
        assert_eq!(
            token_values("[n1] =>"),
            vec![Token::Bracketed("n1".to_string()), Token::Arrow, Token::Eof]
        );
    }

    #[test]
    fn lexes_numbers() {
        assert_eq!(token_values("limit 10"), vec![Token::Keyword(Keyword::Limit), Token::Number(10), Token::Eof]);
    }

    #[test]
    fn strips_comments() {
        assert_eq!(token_values("know x # this is ignored"), vec![Token::Keyword(Keyword::Know), Token::Ident("x".to_string()), Token::Eof]);
    }

    #[test]
    fn joins_line_continuations() {
        assert_eq!(
            token_values("know x, \\\nknow y"),
            vec![
                Token::Keyword(Keyword::Know),
                Token::Ident("x".to_string()),
                Token::Comma,
                Token::Keyword(Keyword::Know),
                Token::Ident("y".to_string()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn lexes_snapshot_relation_brackets() {
        assert_eq!(
            token_values("-[ a < b ]"),
            vec![
                Token::SnapshotOpen,
                Token::Ident("a".to_string()),
                Token::LAngle,
                Token::Ident("b".to_string()),
                Token::RBracket,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn bare_hyphen_is_skipped() {
        assert_eq!(token_values("a - b"), vec![
            Token::Ident("a".to_string()),
            Token::Ident("b".to_string()),
            Token::Eof,
        ]);
    }

    #[test]
    fn lexes_not_equals() {
        assert_eq!(token_values("x != a"), vec![
            Token::Ident("x".to_string()),
            Token::NotEquals,
            Token::Ident("a".to_string()),
            Token::Eof,
        ]);
    }
}
