//! Tokenizer for plan dumps.
//!
//! Turns the `{...}` / `(...)` / `<>` / `:key value` notation into a flat,
//! depth-annotated token stream. Words are classified by context: the
//! previously emitted token and the innermost bracket that is still open.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use serde::Serialize;
use tracing::debug;

use crate::common::{PlanError, PlanResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    NodeOpen,
    NodeClose,
    NodeTypeId,
    Key,
    Value,
    ListOpen,
    ListClose,
    ListItemValue,
    Null,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::NodeOpen => "NodeOpen",
            TokenKind::NodeClose => "NodeClose",
            TokenKind::NodeTypeId => "NodeTypeId",
            TokenKind::Key => "Key",
            TokenKind::Value => "Value",
            TokenKind::ListOpen => "ListOpen",
            TokenKind::ListClose => "ListClose",
            TokenKind::ListItemValue => "ListItemValue",
            TokenKind::Null => "Null",
        };
        f.write_str(name)
    }
}

/// A classified piece of the dump.
///
/// Opening brackets carry the depth they create; the matching closing
/// bracket carries the same depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub depth: usize,
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(depth: usize, kind: TokenKind, text: &str) -> Self {
        Token {
            depth,
            kind,
            text: text.to_string(),
        }
    }

    /// True for a `Key` whose text contains `name`, so `lefttree` also
    /// matches `:scan.plan.lefttree`.
    pub fn is_key(&self, name: &str) -> bool {
        self.kind == TokenKind::Key && self.text.contains(name)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} {} '{}'}}", self.depth, self.kind, self.text)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == ':' || c == '.' || c == '_'
}

struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    depth: usize,
    // kinds of the brackets still open, innermost last
    open: Vec<TokenKind>,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Tokenizer {
            chars: input.chars().peekable(),
            depth: 0,
            open: Vec::new(),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(c) = self.chars.next() {
            match c {
                '{' => self.open_bracket(TokenKind::NodeOpen, "{"),
                '}' => self.close_bracket(TokenKind::NodeClose, "}"),
                '(' => self.open_bracket(TokenKind::ListOpen, "("),
                ')' => self.close_bracket(TokenKind::ListClose, ")"),
                '<' => {
                    if self.chars.next_if_eq(&'>').is_some() {
                        self.emit(TokenKind::Null, "<>");
                    }
                }
                c if is_word_char(c) => {
                    let word = self.word(c);
                    let kind = self.classify_word();
                    self.emit(kind, &word);
                }
                _ => {}
            }
        }
        self.tokens
    }

    fn emit(&mut self, kind: TokenKind, text: &str) {
        self.tokens.push(Token::new(self.depth, kind, text));
    }

    fn open_bracket(&mut self, kind: TokenKind, text: &str) {
        self.depth += 1;
        self.open.push(kind);
        self.emit(kind, text);
    }

    fn close_bracket(&mut self, kind: TokenKind, text: &str) {
        self.emit(kind, text);
        self.open.pop();
        self.depth = self.depth.saturating_sub(1);
    }

    fn word(&mut self, first: char) -> String {
        let mut word = String::from(first);
        while let Some(c) = self.chars.next_if(|c| is_word_char(*c)) {
            word.push(c);
        }
        word
    }

    /// The previous token decides first: a word after `{` is the node type
    /// and a word after a key is its value. Otherwise the innermost bracket
    /// still open decides, so in `({A x 1} foo)` the word `foo` is a list item
    /// even though a closed node sits between it and the `(`.
    fn classify_word(&self) -> TokenKind {
        match self.tokens.last().map(|t| t.kind) {
            Some(TokenKind::NodeOpen) => TokenKind::NodeTypeId,
            Some(TokenKind::Key) => TokenKind::Value,
            _ if self.open.last() == Some(&TokenKind::ListOpen) => TokenKind::ListItemValue,
            _ => TokenKind::Key,
        }
    }
}

/// Splits a plan dump into tokens. Never fails; characters outside the
/// notation are skipped.
pub fn tokenize(input: &str) -> Vec<Token> {
    let tokens = Tokenizer::new(input).run();
    debug!("tokenized {} chars into {} tokens", input.len(), tokens.len());
    tokens
}

/// Checks that every opening bracket is closed by the same bracket kind at
/// the same depth.
pub fn check_balanced(tokens: &[Token]) -> PlanResult<()> {
    let mut open: Vec<&Token> = Vec::new();
    for (pos, token) in tokens.iter().enumerate() {
        let expected = match token.kind {
            TokenKind::NodeOpen | TokenKind::ListOpen => {
                open.push(token);
                continue;
            }
            TokenKind::NodeClose => TokenKind::NodeOpen,
            TokenKind::ListClose => TokenKind::ListOpen,
            _ => continue,
        };
        match open.pop() {
            Some(start) if start.kind == expected && start.depth == token.depth => {}
            _ => {
                return Err(PlanError::Malformed(format!(
                    "unmatched '{}' at token {}",
                    token.text, pos
                )));
            }
        }
    }
    if let Some(start) = open.last() {
        return Err(PlanError::Malformed(format!(
            "'{}' at depth {} is never closed",
            start.text, start.depth
        )));
    }
    Ok(())
}
