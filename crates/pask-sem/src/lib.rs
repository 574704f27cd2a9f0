//! pask-sem - Semantic analysis for Pask.
//!
//! Builds nested scoped symbol tables over the AST and validates names:
//! declare-before-use, same-scope duplicates, and call arity. Runtime
//! scoping is a separate (dynamic) story; this pass is purely lexical.

mod analyzer;
mod scope;
mod symbol;

pub use analyzer::{SemanticAnalyzer, SemanticError};
pub use scope::{ScopeId, ScopeTree, ScopedSymbolTable};
pub use symbol::{
    BuiltinTypeSymbol, FunctionSymbol, ProcedureSymbol, Symbol, VarSymbol,
};
