//! Recursive-descent parser.
//!
//! The parser holds the lexer and a single current token. Expression
//! precedence is encoded as a cascade of level functions, each looping
//! `left = lower(); while op at this level { left = BinOp(...) }`, so all
//! binary operators are left-associative.
//!
//! # Grammar
//!
//! ```text
//! program                := PROGRAM ID SEMI block DOT
//! block                  := declarations compound_statement
//! declarations           := (VAR (variable_declaration SEMI)+)?
//!                           procedure_declaration*
//!                           function_declaration*
//! variable_declaration   := ID (COMMA ID)* COLON type_spec
//! procedure_declaration  := PROCEDURE ID (LPAREN formal_parameter_list RPAREN)?
//!                           SEMI block SEMI
//! function_declaration   := FUNCTION ID (LPAREN formal_parameter_list RPAREN)?
//!                           COLON type_spec SEMI block SEMI
//! formal_parameter_list  := formal_parameters (SEMI formal_parameters)*
//! formal_parameters      := ID (COMMA ID)* COLON type_spec
//! type_spec              := INTEGER | REAL | BOOLEAN
//! compound_statement     := BEGIN statement_list END
//! statement_list         := statement (SEMI statement)*
//! statement              := compound_statement | proccall_statement
//!                         | assignment_statement | condition_statement
//!                         | while_statement | BREAK | CONTINUE | empty
//! ```

use std::rc::Rc;

use pask_lex::{Lexer, LexerError, Token, TokenKind};
use pask_util::ErrorCode;
use thiserror::Error;

use crate::ast::{
    Assign, BinOp, Block, BooleanLit, Compound, Condition, Decl, Else, Expr, FunctionCall,
    FunctionDecl, Num, Param, ProcedureCall, ProcedureDecl, Program, Stmt, Then, TypeSpec,
    UnaryOp, Var, VarDecl, WhileLoop,
};

/// A syntax error at a specific token.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("SyntaxError: {code} -> {token}")]
pub struct SyntaxError {
    pub code: ErrorCode,
    pub token: Token,
}

/// Anything that can stop the parser: a lexical error from the token
/// source, or a syntax error of its own.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    #[error(transparent)]
    Lexer(#[from] LexerError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// Recursive-descent parser over a [`Lexer`].
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Creates a parser, fetching the first token.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self, ParseError> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parses a complete program and requires `EOF` to follow.
    pub fn parse(mut self) -> Result<Program, ParseError> {
        let program = self.program()?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.unexpected().into());
        }
        Ok(program)
    }

    // =========================================================================
    // TOKEN PLUMBING
    // =========================================================================

    /// Asserts the current token kind, consumes it, and returns it.
    fn eat(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.current.kind == kind {
            let next = self.lexer.next_token()?;
            Ok(std::mem::replace(&mut self.current, next))
        } else {
            Err(self.unexpected().into())
        }
    }

    fn unexpected(&self) -> SyntaxError {
        SyntaxError {
            code: ErrorCode::UnexpectedToken,
            token: self.current.clone(),
        }
    }

    /// Identifier text of a consumed token.
    fn ident_name(token: &Token) -> String {
        token.text().unwrap_or_default().to_string()
    }

    // =========================================================================
    // DECLARATIONS
    // =========================================================================

    /// `program := PROGRAM ID SEMI block DOT`
    fn program(&mut self) -> Result<Program, ParseError> {
        self.eat(TokenKind::Program)?;
        let name_token = self.eat(TokenKind::Id)?;
        self.eat(TokenKind::Semi)?;
        let block = self.block()?;
        self.eat(TokenKind::Dot)?;
        Ok(Program {
            name: Self::ident_name(&name_token),
            block,
        })
    }

    /// `block := declarations compound_statement`
    fn block(&mut self) -> Result<Block, ParseError> {
        let declarations = self.declarations()?;
        let compound = self.compound_statement()?;
        Ok(Block {
            declarations,
            compound,
        })
    }

    fn declarations(&mut self) -> Result<Vec<Decl>, ParseError> {
        let mut declarations = Vec::new();

        if self.current.kind == TokenKind::Var {
            self.eat(TokenKind::Var)?;
            while self.current.kind == TokenKind::Id {
                let var_decls = self.variable_declaration()?;
                declarations.extend(var_decls.into_iter().map(Decl::Var));
                self.eat(TokenKind::Semi)?;
            }
        }

        while self.current.kind == TokenKind::Procedure {
            let decl = self.procedure_declaration()?;
            declarations.push(Decl::Procedure(Rc::new(decl)));
        }

        while self.current.kind == TokenKind::Function {
            let decl = self.function_declaration()?;
            declarations.push(Decl::Function(Rc::new(decl)));
        }

        Ok(declarations)
    }

    /// `variable_declaration := ID (COMMA ID)* COLON type_spec`
    fn variable_declaration(&mut self) -> Result<Vec<VarDecl>, ParseError> {
        let mut vars = vec![self.variable()?];
        while self.current.kind == TokenKind::Comma {
            self.eat(TokenKind::Comma)?;
            vars.push(self.variable()?);
        }

        self.eat(TokenKind::Colon)?;
        let type_node = self.type_spec()?;

        Ok(vars
            .into_iter()
            .map(|var| VarDecl {
                var,
                type_node: type_node.clone(),
            })
            .collect())
    }

    /// `procedure_declaration := PROCEDURE ID (LPAREN formal_parameter_list
    /// RPAREN)? SEMI block SEMI`
    fn procedure_declaration(&mut self) -> Result<ProcedureDecl, ParseError> {
        self.eat(TokenKind::Procedure)?;
        let name_token = self.eat(TokenKind::Id)?;
        let params = self.optional_formal_parameters()?;
        self.eat(TokenKind::Semi)?;
        let block = self.block()?;
        self.eat(TokenKind::Semi)?;

        Ok(ProcedureDecl {
            name: Self::ident_name(&name_token),
            token: name_token,
            params,
            block,
        })
    }

    /// `function_declaration := FUNCTION ID (LPAREN formal_parameter_list
    /// RPAREN)? COLON type_spec SEMI block SEMI`
    fn function_declaration(&mut self) -> Result<FunctionDecl, ParseError> {
        self.eat(TokenKind::Function)?;
        let name_token = self.eat(TokenKind::Id)?;
        let params = self.optional_formal_parameters()?;
        self.eat(TokenKind::Colon)?;
        let return_type = self.type_spec()?;
        self.eat(TokenKind::Semi)?;
        let block = self.block()?;
        self.eat(TokenKind::Semi)?;

        Ok(FunctionDecl {
            name: Self::ident_name(&name_token),
            token: name_token,
            params,
            block,
            return_type,
        })
    }

    /// The parenthesized parameter list, if present.
    fn optional_formal_parameters(&mut self) -> Result<Vec<Param>, ParseError> {
        if self.current.kind != TokenKind::LParen {
            return Ok(Vec::new());
        }
        self.eat(TokenKind::LParen)?;
        let params = self.formal_parameter_list()?;
        self.eat(TokenKind::RParen)?;
        Ok(params)
    }

    /// `formal_parameter_list := formal_parameters (SEMI formal_parameters)*`
    fn formal_parameter_list(&mut self) -> Result<Vec<Param>, ParseError> {
        // empty parameter list: `procedure foo()`
        if self.current.kind != TokenKind::Id {
            return Ok(Vec::new());
        }

        let mut params = self.formal_parameters()?;
        while self.current.kind == TokenKind::Semi {
            self.eat(TokenKind::Semi)?;
            params.extend(self.formal_parameters()?);
        }
        Ok(params)
    }

    /// `formal_parameters := ID (COMMA ID)* COLON type_spec`
    fn formal_parameters(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut vars = vec![self.variable()?];
        while self.current.kind == TokenKind::Comma {
            self.eat(TokenKind::Comma)?;
            vars.push(self.variable()?);
        }

        self.eat(TokenKind::Colon)?;
        let type_node = self.type_spec()?;

        Ok(vars
            .into_iter()
            .map(|var| Param {
                var,
                type_node: type_node.clone(),
            })
            .collect())
    }

    /// `type_spec := INTEGER | REAL | BOOLEAN`
    fn type_spec(&mut self) -> Result<TypeSpec, ParseError> {
        match self.current.kind {
            TokenKind::Integer | TokenKind::Real | TokenKind::Boolean => {
                let token = self.eat(self.current.kind)?;
                Ok(TypeSpec {
                    name: Self::ident_name(&token),
                    token,
                })
            }
            _ => Err(self.unexpected().into()),
        }
    }

    // =========================================================================
    // STATEMENTS
    // =========================================================================

    /// `compound_statement := BEGIN statement_list END`
    fn compound_statement(&mut self) -> Result<Compound, ParseError> {
        self.eat(TokenKind::Begin)?;
        let children = self.statement_list()?;
        self.eat(TokenKind::End)?;
        Ok(Compound { children })
    }

    /// `statement_list := statement (SEMI statement)*`
    fn statement_list(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = vec![self.statement()?];
        while self.current.kind == TokenKind::Semi {
            self.eat(TokenKind::Semi)?;
            statements.push(self.statement()?);
        }
        Ok(statements)
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        match self.current.kind {
            TokenKind::Begin => Ok(Stmt::Compound(self.compound_statement()?)),
            TokenKind::Id => {
                // One raw character of lookahead past the identifier tells a
                // call apart from an assignment.
                if self.lexer.current_char() == '(' {
                    self.proccall_statement()
                } else {
                    self.assignment_statement()
                }
            }
            TokenKind::If => self.condition_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::Break => Ok(Stmt::Break(self.eat(TokenKind::Break)?)),
            TokenKind::Continue => Ok(Stmt::Continue(self.eat(TokenKind::Continue)?)),
            _ => Ok(Stmt::NoOp),
        }
    }

    /// `proccall_statement := ID LPAREN (expr (COMMA expr)*)? RPAREN`
    fn proccall_statement(&mut self) -> Result<Stmt, ParseError> {
        let token = self.eat(TokenKind::Id)?;
        let args = self.call_arguments()?;
        Ok(Stmt::ProcedureCall(ProcedureCall {
            name: Self::ident_name(&token),
            args,
            token,
        }))
    }

    /// `assignment_statement := variable ASSIGN expr`
    fn assignment_statement(&mut self) -> Result<Stmt, ParseError> {
        let target = self.variable()?;
        let op = self.eat(TokenKind::Assign)?;
        let value = self.expr()?;
        Ok(Stmt::Assign(Assign { target, op, value }))
    }

    /// `condition_statement := IF expr THEN statement (ELSE statement)?`
    fn condition_statement(&mut self) -> Result<Stmt, ParseError> {
        self.eat(TokenKind::If)?;
        let cond = self.expr()?;
        self.eat(TokenKind::Then)?;
        let then_branch = Then {
            child: self.statement()?,
        };

        let else_branch = if self.current.kind == TokenKind::Else {
            self.eat(TokenKind::Else)?;
            Some(Else {
                child: self.statement()?,
            })
        } else {
            None
        };

        Ok(Stmt::Condition(Box::new(Condition {
            cond,
            then_branch,
            else_branch,
        })))
    }

    /// `while_statement := WHILE expr DO statement`
    fn while_statement(&mut self) -> Result<Stmt, ParseError> {
        self.eat(TokenKind::While)?;
        let cond = self.expr()?;
        self.eat(TokenKind::Do)?;
        let body = self.statement()?;
        Ok(Stmt::WhileLoop(Box::new(WhileLoop { cond, body })))
    }

    /// `variable := ID`
    fn variable(&mut self) -> Result<Var, ParseError> {
        let token = self.eat(TokenKind::Id)?;
        Ok(Var {
            name: Self::ident_name(&token),
            token,
        })
    }

    /// The parenthesized argument list of a call.
    fn call_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.eat(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.current.kind != TokenKind::RParen {
            args.push(self.expr()?);
            while self.current.kind == TokenKind::Comma {
                self.eat(TokenKind::Comma)?;
                args.push(self.expr()?);
            }
        }
        self.eat(TokenKind::RParen)?;
        Ok(args)
    }

    // =========================================================================
    // EXPRESSIONS (precedence cascade, low to high)
    // =========================================================================

    /// Level 7: `OR`.
    fn expr(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.and_expr()?;
        while self.current.kind == TokenKind::Or {
            let op = self.eat(TokenKind::Or)?;
            let right = self.and_expr()?;
            node = Expr::BinOp(Box::new(BinOp {
                left: node,
                op,
                right,
            }));
        }
        Ok(node)
    }

    /// Level 6: `AND`.
    fn and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.equality_expr()?;
        while self.current.kind == TokenKind::And {
            let op = self.eat(TokenKind::And)?;
            let right = self.equality_expr()?;
            node = Expr::BinOp(Box::new(BinOp {
                left: node,
                op,
                right,
            }));
        }
        Ok(node)
    }

    /// Level 5: `=` and `<>`.
    fn equality_expr(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.comparison_expr()?;
        while matches!(self.current.kind, TokenKind::Equals | TokenKind::NotEquals) {
            let op = self.eat(self.current.kind)?;
            let right = self.comparison_expr()?;
            node = Expr::BinOp(Box::new(BinOp {
                left: node,
                op,
                right,
            }));
        }
        Ok(node)
    }

    /// Level 4: `<`, `<=`, `>`, `>=`.
    fn comparison_expr(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.additive_expr()?;
        while matches!(
            self.current.kind,
            TokenKind::Less | TokenKind::LessEquals | TokenKind::Greater | TokenKind::GreaterEquals
        ) {
            let op = self.eat(self.current.kind)?;
            let right = self.additive_expr()?;
            node = Expr::BinOp(Box::new(BinOp {
                left: node,
                op,
                right,
            }));
        }
        Ok(node)
    }

    /// Level 3: binary `+` and `-`.
    fn additive_expr(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.term()?;
        while matches!(self.current.kind, TokenKind::Plus | TokenKind::Minus) {
            let op = self.eat(self.current.kind)?;
            let right = self.term()?;
            node = Expr::BinOp(Box::new(BinOp {
                left: node,
                op,
                right,
            }));
        }
        Ok(node)
    }

    /// Level 2: `*`, `/`, `//`, `%`.
    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.factor()?;
        while matches!(
            self.current.kind,
            TokenKind::Mul | TokenKind::FloatDiv | TokenKind::IntegerDiv | TokenKind::Mod
        ) {
            let op = self.eat(self.current.kind)?;
            let right = self.factor()?;
            node = Expr::BinOp(Box::new(BinOp {
                left: node,
                op,
                right,
            }));
        }
        Ok(node)
    }

    /// Level 1 atoms: unary operators, literals, parens, calls, variables.
    fn factor(&mut self) -> Result<Expr, ParseError> {
        match self.current.kind {
            TokenKind::Plus | TokenKind::Minus | TokenKind::Not => {
                let op = self.eat(self.current.kind)?;
                let operand = self.factor()?;
                Ok(Expr::UnaryOp(Box::new(UnaryOp { op, operand })))
            }
            TokenKind::IntegerConst => {
                let token = self.eat(TokenKind::IntegerConst)?;
                Ok(Expr::Num(Num { token }))
            }
            TokenKind::RealConst => {
                let token = self.eat(TokenKind::RealConst)?;
                Ok(Expr::Num(Num { token }))
            }
            TokenKind::True | TokenKind::False => {
                let value = self.current.kind == TokenKind::True;
                let token = self.eat(self.current.kind)?;
                Ok(Expr::Boolean(BooleanLit { token, value }))
            }
            TokenKind::LParen => {
                self.eat(TokenKind::LParen)?;
                let node = self.expr()?;
                self.eat(TokenKind::RParen)?;
                Ok(node)
            }
            TokenKind::Id => {
                if self.lexer.current_char() == '(' {
                    let token = self.eat(TokenKind::Id)?;
                    let args = self.call_arguments()?;
                    Ok(Expr::FunctionCall(FunctionCall {
                        name: Self::ident_name(&token),
                        args,
                        token,
                    }))
                } else {
                    Ok(Expr::Var(self.variable()?))
                }
            }
            _ => Err(self.unexpected().into()),
        }
    }
}
