//! pask-lex - Lexical analysis for Pask source code.
//!
//! Transforms source text into a stream of positioned tokens. Whitespace
//! and `{ ... }` comments are skipped; reserved words are resolved
//! case-insensitively while identifiers stay case-sensitive.

pub mod cursor;
mod lexer;
mod token;

pub use lexer::{tokenize, Lexer, LexerError};
pub use token::{keyword_from_str, Token, TokenKind, TokenValue};
