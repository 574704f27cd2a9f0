//! pask-par - Syntactic analysis for Pask.
//!
//! Consumes the token stream lazily and produces the AST. The parser is a
//! hand-written recursive-descent one; operator precedence is a cascade of
//! level functions and calls are disambiguated from assignments with a
//! single raw-character peek into the lexer.

pub mod ast;
mod parser;

pub use ast::{
    Assign, BinOp, Block, BooleanLit, Compound, Condition, Decl, Else, Expr, FunctionCall,
    FunctionDecl, Num, Param, ProcedureCall, ProcedureDecl, Program, Stmt, Then, TypeSpec,
    UnaryOp, Var, VarDecl, WhileLoop,
};
pub use parser::{ParseError, Parser, SyntaxError};

use pask_lex::Lexer;

/// Parse a source string into a [`Program`].
pub fn parse(source: &str) -> Result<Program, ParseError> {
    Parser::new(Lexer::new(source))?.parse()
}
