//! The semantic analyzer.
//!
//! A read-only AST traversal that builds the scope tree, registers
//! declarations, and validates references: declare-before-use, same-scope
//! duplicates, and call arity. No static type checking happens beyond name
//! resolution.

use std::rc::Rc;

use pask_lex::Token;
use pask_par::{
    Block, Decl, Expr, FunctionDecl, Param, ProcedureDecl, Program, Stmt, TypeSpec, Var, VarDecl,
};
use pask_util::ErrorCode;
use thiserror::Error;
use tracing::debug;

use crate::scope::ScopeTree;
use crate::symbol::{
    BuiltinTypeSymbol, FunctionSymbol, ProcedureSymbol, Symbol, VarSymbol,
};

/// A semantic error at the offending token.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("SemanticError: {code} -> {token}")]
pub struct SemanticError {
    pub code: ErrorCode,
    pub token: Token,
}

/// Scope-building and name-validating pass.
#[derive(Debug)]
pub struct SemanticAnalyzer {
    scopes: ScopeTree,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            scopes: ScopeTree::new(),
        }
    }

    /// The scope tree, retained after analysis for inspection.
    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    /// Analyze a whole program.
    pub fn analyze(&mut self, program: &Program) -> Result<(), SemanticError> {
        debug!(program = %program.name, "analyze program");
        self.scopes.enter_scope("global");
        self.analyze_block(&program.block)?;
        self.scopes.exit_scope();
        Ok(())
    }

    fn error(&self, code: ErrorCode, token: &Token) -> SemanticError {
        SemanticError {
            code,
            token: token.clone(),
        }
    }

    // =========================================================================
    // DECLARATIONS
    // =========================================================================

    fn analyze_block(&mut self, block: &Block) -> Result<(), SemanticError> {
        for decl in &block.declarations {
            match decl {
                Decl::Var(var_decl) => self.analyze_var_decl(var_decl)?,
                Decl::Procedure(proc_decl) => self.analyze_procedure_decl(proc_decl)?,
                Decl::Function(func_decl) => self.analyze_function_decl(func_decl)?,
            }
        }
        self.analyze_stmts(&block.compound.children)
    }

    fn analyze_var_decl(&mut self, decl: &VarDecl) -> Result<(), SemanticError> {
        let ty = self.resolve_type(&decl.type_node)?;

        if self.scopes.lookup_local(&decl.var.name).is_some() {
            return Err(self.error(ErrorCode::DuplicateId, &decl.var.token));
        }

        self.scopes.define(Symbol::Variable(VarSymbol {
            name: decl.var.name.clone(),
            ty,
        }));
        Ok(())
    }

    fn analyze_procedure_decl(&mut self, decl: &Rc<ProcedureDecl>) -> Result<(), SemanticError> {
        if self.scopes.lookup_local(&decl.name).is_some() {
            return Err(self.error(ErrorCode::DuplicateProcDecl, &decl.token));
        }

        let params = self.resolve_params(&decl.params)?;
        self.scopes.define(Symbol::Procedure(ProcedureSymbol {
            name: decl.name.clone(),
            params: params.clone(),
            decl: decl.clone(),
        }));

        self.scopes.enter_scope(&decl.name);
        self.define_params(&decl.params, params)?;
        self.analyze_block(&decl.block)?;
        self.scopes.exit_scope();
        Ok(())
    }

    fn analyze_function_decl(&mut self, decl: &Rc<FunctionDecl>) -> Result<(), SemanticError> {
        if self.scopes.lookup_local(&decl.name).is_some() {
            return Err(self.error(ErrorCode::DuplicateProcDecl, &decl.token));
        }

        let params = self.resolve_params(&decl.params)?;
        let return_type = self.resolve_type(&decl.return_type)?;
        self.scopes.define(Symbol::Function(FunctionSymbol {
            name: decl.name.clone(),
            params: params.clone(),
            return_type,
            decl: decl.clone(),
        }));

        self.scopes.enter_scope(&decl.name);
        self.define_params(&decl.params, params)?;
        self.analyze_block(&decl.block)?;
        self.scopes.exit_scope();
        Ok(())
    }

    /// Resolve the formal parameters' types against the current scope.
    fn resolve_params(&mut self, params: &[Param]) -> Result<Vec<VarSymbol>, SemanticError> {
        params
            .iter()
            .map(|param| {
                let ty = self.resolve_type(&param.type_node)?;
                Ok(VarSymbol {
                    name: param.var.name.clone(),
                    ty,
                })
            })
            .collect()
    }

    /// Define the formal parameters inside the freshly entered scope.
    fn define_params(
        &mut self,
        params: &[Param],
        symbols: Vec<VarSymbol>,
    ) -> Result<(), SemanticError> {
        for (param, symbol) in params.iter().zip(symbols) {
            if self.scopes.lookup_local(&symbol.name).is_some() {
                return Err(self.error(ErrorCode::DuplicateId, &param.var.token));
            }
            self.scopes.define(Symbol::Variable(symbol));
        }
        Ok(())
    }

    fn resolve_type(&self, node: &TypeSpec) -> Result<Rc<BuiltinTypeSymbol>, SemanticError> {
        match self.scopes.lookup(&node.name) {
            Some(Symbol::BuiltinType(ty)) => Ok(ty.clone()),
            _ => Err(self.error(ErrorCode::IdNotFound, &node.token)),
        }
    }

    // =========================================================================
    // STATEMENTS
    // =========================================================================

    fn analyze_stmts(&mut self, stmts: &[Stmt]) -> Result<(), SemanticError> {
        for stmt in stmts {
            self.analyze_stmt(stmt)?;
        }
        Ok(())
    }

    fn analyze_stmt(&mut self, stmt: &Stmt) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Compound(compound) => self.analyze_stmts(&compound.children),
            Stmt::Assign(assign) => {
                self.analyze_expr(&assign.value)?;
                self.analyze_var(&assign.target)
            }
            Stmt::ProcedureCall(call) => {
                self.check_call(&call.name, call.args.len(), &call.token, CallKind::Procedure)?;
                for arg in &call.args {
                    self.analyze_expr(arg)?;
                }
                Ok(())
            }
            Stmt::Condition(cond) => {
                self.analyze_expr(&cond.cond)?;
                self.analyze_stmt(&cond.then_branch.child)?;
                if let Some(else_branch) = &cond.else_branch {
                    self.analyze_stmt(&else_branch.child)?;
                }
                Ok(())
            }
            Stmt::WhileLoop(while_loop) => {
                self.analyze_expr(&while_loop.cond)?;
                self.analyze_stmt(&while_loop.body)
            }
            // No static enclosure check; escaping signals are a runtime error.
            Stmt::Break(_) | Stmt::Continue(_) => Ok(()),
            Stmt::NoOp => Ok(()),
        }
    }

    // =========================================================================
    // EXPRESSIONS
    // =========================================================================

    fn analyze_expr(&mut self, expr: &Expr) -> Result<(), SemanticError> {
        match expr {
            Expr::Num(_) | Expr::Boolean(_) => Ok(()),
            Expr::Var(var) => self.analyze_var(var),
            Expr::BinOp(binop) => {
                self.analyze_expr(&binop.left)?;
                self.analyze_expr(&binop.right)
            }
            Expr::UnaryOp(unary) => self.analyze_expr(&unary.operand),
            Expr::FunctionCall(call) => {
                self.check_call(&call.name, call.args.len(), &call.token, CallKind::Function)?;
                for arg in &call.args {
                    self.analyze_expr(arg)?;
                }
                Ok(())
            }
        }
    }

    fn analyze_var(&mut self, var: &Var) -> Result<(), SemanticError> {
        if self.scopes.lookup(&var.name).is_none() {
            return Err(self.error(ErrorCode::IdNotFound, &var.token));
        }
        Ok(())
    }

    /// Resolve a callee and validate argument count against its formals.
    fn check_call(
        &mut self,
        name: &str,
        actual: usize,
        token: &Token,
        kind: CallKind,
    ) -> Result<(), SemanticError> {
        let formal = match (kind, self.scopes.lookup(name)) {
            (CallKind::Procedure, Some(Symbol::Procedure(proc))) => proc.params.len(),
            (CallKind::Function, Some(Symbol::Function(func))) => func.params.len(),
            _ => return Err(self.error(ErrorCode::IdNotFound, token)),
        };

        if actual != formal {
            return Err(self.error(ErrorCode::UnexpectedProcArgumentsNumber, token));
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum CallKind {
    Procedure,
    Function,
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
