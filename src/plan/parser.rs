//! Recursive-descent parser over the token stream.
//!
//! A single [`Parser`] owns the cursor; every recursive step borrows the
//! parser mutably, so nested nodes advance the same position their parent
//! continues from. Attribute keys are matched by substring because real
//! dumps qualify them (`:scan.plan.lefttree`, `:scan.scanrelid`).

use tracing::{debug, trace};

use super::node::{PlanNode, PlannedStatement, RangeTableEntry};
use super::tokenizer::{Token, TokenKind, check_balanced};
use crate::common::{PlanError, PlanResult};

const PLAN_TREE_KEY: &str = "planTree";
const RANGE_TABLE_KEY: &str = "rtable";
const LEFT_TREE_KEY: &str = "lefttree";
const RIGHT_TREE_KEY: &str = "righttree";
const RELID_KEY: &str = "relid";
const SET_OP_CMD_KEY: &str = "cmd";
const SET_OP_STRATEGY_KEY: &str = "strategy";

/// How the parser reacts to malformed input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Missing or malformed structure degrades to empty / zero values.
    #[default]
    Lenient,
    /// Missing or malformed structure is a [`PlanError::Malformed`].
    Strict,
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    cursor: usize,
    mode: ParseMode,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], mode: ParseMode) -> Self {
        Parser {
            tokens,
            cursor: 0,
            mode,
        }
    }

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.cursor)
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.cursor + 1)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
        self.current()
    }

    fn next_is(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    /// Lenient mode logs and yields the zero value, strict mode fails.
    fn degrade<T: Default>(&self, msg: String) -> PlanResult<T> {
        match self.mode {
            ParseMode::Strict => Err(PlanError::Malformed(msg)),
            ParseMode::Lenient => {
                debug!("ignoring malformed plan: {}", msg);
                Ok(T::default())
            }
        }
    }

    /// Consumes the token after a numeric key. In strict mode a structural
    /// value such as `:apprelids (b 1 2)` is left alone and yields `None`.
    fn integer_value(&mut self, key: &Token) -> PlanResult<Option<i64>> {
        if self.mode == ParseMode::Strict {
            let structural = self.peek().is_some_and(|t| {
                matches!(t.kind, TokenKind::ListOpen | TokenKind::NodeOpen | TokenKind::Null)
            });
            if structural {
                return Ok(None);
            }
        }
        let Some(token) = self.advance() else {
            return self.degrade(format!("'{}' has no value", key.text));
        };
        match token.text.parse::<i64>() {
            Ok(v) => Ok(Some(v)),
            Err(_) => {
                let msg = format!("'{}' is not an integer for '{}'", token.text, key.text);
                self.degrade::<i64>(msg).map(Some)
            }
        }
    }

    pub fn parse_statement(&mut self) -> PlanResult<PlannedStatement> {
        if self.mode == ParseMode::Strict {
            check_balanced(self.tokens)?;
        }

        let mut stmt = PlannedStatement::default();
        let mut found_plan_tree = false;
        self.cursor = 0;
        while let Some(token) = self.current() {
            if token.is_key(PLAN_TREE_KEY) {
                found_plan_tree = true;
                if self.next_is(TokenKind::NodeOpen) {
                    stmt.plan_tree = self.parse_node()?;
                } else {
                    self.degrade::<()>(format!("'{}' is not followed by a node", token.text))?;
                }
            } else if token.is_key(RANGE_TABLE_KEY) {
                self.advance();
                stmt.range_table = self.parse_range_table()?;
            }
            self.advance();
        }

        if !found_plan_tree {
            self.degrade::<()>(format!("no '{}' key in plan", PLAN_TREE_KEY))?;
        }
        debug!(
            "parsed plan with {} nodes and {} range table entries",
            if stmt.plan_tree.node_type.is_empty() { 0 } else { stmt.plan_tree.node_count() },
            stmt.range_table.len()
        );
        Ok(stmt)
    }

    /// Parses the node whose `{` is the next token. Leaves the cursor on the
    /// node's closing `}`.
    pub fn parse_node(&mut self) -> PlanResult<PlanNode> {
        let mut node = PlanNode::default();
        let mut start_depth: Option<usize> = None;

        while let Some(token) = self.advance() {
            match token.kind {
                TokenKind::NodeOpen if start_depth.is_none() => {
                    start_depth = Some(token.depth);
                }
                TokenKind::NodeTypeId if node.node_type.is_empty() => {
                    if start_depth.is_none() {
                        start_depth = Some(token.depth);
                    }
                    node.node_type = token.text.clone();
                    trace!("enter {} at depth {}", node.node_type, token.depth);
                }
                TokenKind::Key if token.is_key(LEFT_TREE_KEY) => {
                    if self.next_is(TokenKind::NodeOpen) {
                        node.left_child = Some(Box::new(self.parse_node()?));
                    }
                }
                TokenKind::Key if token.is_key(RIGHT_TREE_KEY) => {
                    if self.next_is(TokenKind::NodeOpen) {
                        node.right_child = Some(Box::new(self.parse_node()?));
                    }
                }
                TokenKind::Key if token.is_key(RELID_KEY) => {
                    if let Some(v) = self.integer_value(token)? {
                        node.relation_id = Some(v);
                    }
                }
                TokenKind::Key if token.is_key(SET_OP_CMD_KEY) => {
                    if let Some(v) = self.integer_value(token)? {
                        node.set_op_command = Some(v);
                    }
                }
                TokenKind::Key if token.is_key(SET_OP_STRATEGY_KEY) => {
                    if let Some(v) = self.integer_value(token)? {
                        node.set_op_strategy = Some(v);
                    }
                }
                TokenKind::NodeClose if Some(token.depth) == start_depth => {
                    trace!("leave {} at depth {}", node.node_type, token.depth);
                    return Ok(node);
                }
                _ => {}
            }
        }

        self.degrade::<()>(format!("node '{}' is never closed", node.node_type))?;
        Ok(node)
    }

    /// Parses the range-table list starting at the current token. Leaves the
    /// cursor on the list's closing `)`.
    pub fn parse_range_table(&mut self) -> PlanResult<Vec<RangeTableEntry>> {
        let mut entries = Vec::new();
        let list_depth = match self.current() {
            Some(token) if token.kind == TokenKind::ListOpen => token.depth,
            Some(token) => {
                return self.degrade(format!("range table must be a list, found '{}'", token.text));
            }
            None => return self.degrade("range table key at end of input".to_string()),
        };

        while let Some(token) = self.advance() {
            match token.kind {
                TokenKind::NodeOpen => {
                    let entry = self.parse_range_table_entry(entries.len() + 1)?;
                    entries.push(entry);
                }
                TokenKind::ListClose if token.depth == list_depth => return Ok(entries),
                _ => {}
            }
        }

        self.degrade::<()>("range table list is never closed".to_string())?;
        Ok(entries)
    }

    /// Parses one `{RANGETBLENTRY ...}` whose `{` is the current token.
    fn parse_range_table_entry(&mut self, index: usize) -> PlanResult<RangeTableEntry> {
        let mut entry = RangeTableEntry::new(index, 0);
        let Some(start_depth) = self.current().map(|t| t.depth) else {
            return Ok(entry);
        };

        while let Some(token) = self.advance() {
            match token.kind {
                TokenKind::Key if token.is_key(RELID_KEY) => {
                    if let Some(v) = self.integer_value(token)? {
                        entry.relation_id = v;
                    }
                }
                TokenKind::NodeClose if token.depth == start_depth => return Ok(entry),
                _ => {}
            }
        }

        self.degrade::<()>(format!("range table entry {} is never closed", index))?;
        Ok(entry)
    }
}

/// Parses a token stream, degrading silently on malformed input.
pub fn parse(tokens: &[Token]) -> PlannedStatement {
    // lenient mode never produces an error
    Parser::new(tokens, ParseMode::Lenient)
        .parse_statement()
        .unwrap_or_default()
}

/// Parses a token stream, rejecting malformed input.
pub fn parse_strict(tokens: &[Token]) -> PlanResult<PlannedStatement> {
    Parser::new(tokens, ParseMode::Strict).parse_statement()
}
