//! Plan dump handling: tokenizing, parsing and pretty printing.

pub mod node;
pub mod parser;
pub mod pretty_print;
pub mod tokenizer;

pub use node::{PlanNode, PlannedStatement, RangeTableEntry};
pub use parser::{ParseMode, Parser, parse, parse_strict};
pub use pretty_print::render;
pub use tokenizer::{Token, TokenKind, check_balanced, tokenize};
