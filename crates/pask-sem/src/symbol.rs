//! Symbols: what a name means at analysis time.

use std::fmt;
use std::rc::Rc;

use pask_par::{FunctionDecl, ProcedureDecl};

/// One of the built-in type names: `INTEGER`, `REAL`, `BOOLEAN`.
#[derive(Clone, Debug)]
pub struct BuiltinTypeSymbol {
    pub name: String,
}

impl BuiltinTypeSymbol {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl fmt::Display for BuiltinTypeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<BuiltinTypeSymbol(name='{}')>", self.name)
    }
}

/// A declared variable together with its resolved type.
#[derive(Clone, Debug)]
pub struct VarSymbol {
    pub name: String,
    pub ty: Rc<BuiltinTypeSymbol>,
}

impl fmt::Display for VarSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<VarSymbol({}:{})>", self.name, self.ty.name)
    }
}

/// A declared procedure: formals plus a handle to its declaration node.
#[derive(Clone, Debug)]
pub struct ProcedureSymbol {
    pub name: String,
    pub params: Vec<VarSymbol>,
    pub decl: Rc<ProcedureDecl>,
}

impl fmt::Display for ProcedureSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        write!(
            f,
            "<ProcedureSymbol(name={}, parameters=[{}])>",
            self.name,
            params.join(", ")
        )
    }
}

/// A declared function: formals, return type, declaration handle.
#[derive(Clone, Debug)]
pub struct FunctionSymbol {
    pub name: String,
    pub params: Vec<VarSymbol>,
    pub return_type: Rc<BuiltinTypeSymbol>,
    pub decl: Rc<FunctionDecl>,
}

impl fmt::Display for FunctionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        write!(
            f,
            "<FunctionSymbol(name={}, parameters=[{}], returns={})>",
            self.name,
            params.join(", "),
            self.return_type.name
        )
    }
}

/// A symbol-table entry.
#[derive(Clone, Debug)]
pub enum Symbol {
    BuiltinType(Rc<BuiltinTypeSymbol>),
    Variable(VarSymbol),
    Procedure(ProcedureSymbol),
    Function(FunctionSymbol),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::BuiltinType(s) => &s.name,
            Symbol::Variable(s) => &s.name,
            Symbol::Procedure(s) => &s.name,
            Symbol::Function(s) => &s.name,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::BuiltinType(s) => s.fmt(f),
            Symbol::Variable(s) => s.fmt(f),
            Symbol::Procedure(s) => s.fmt(f),
            Symbol::Function(s) => s.fmt(f),
        }
    }
}
