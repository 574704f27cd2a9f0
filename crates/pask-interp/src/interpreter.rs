//! The tree-walking interpreter.
//!
//! Statements execute by case analysis on the node kind and report their
//! outcome as a [`Flow`] value; `break`/`continue` travel as flows, not
//! errors, and only a `while` loop consumes them. Loop signals cross
//! procedure-call boundaries (the frame is still popped on the way out),
//! which matches the dynamic scoping of the call stack; a signal that
//! escapes the program body or a function body surfaces as a runtime
//! error.
//!
//! Arguments are evaluated in the caller's frame, left to right, before
//! the callee frame is pushed. `AND`/`OR` evaluate both operands
//! unconditionally and select one of the evaluated values.

use pask_lex::{Token, TokenKind, TokenValue};
use pask_par::{
    Assign, BinOp, Block, Compound, Condition, Decl, Expr, FunctionCall, ProcedureCall, Program,
    Stmt, UnaryOp, WhileLoop,
};
use pask_util::ErrorCode;
use thiserror::Error;
use tracing::trace;

use crate::frame::{CallStack, Frame, FrameKind};
use crate::trace::TraceSink;
use crate::value::Value;

/// A runtime error at the offending token.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("RuntimeError: {code} -> {token}")]
pub struct RuntimeError {
    pub code: ErrorCode,
    pub token: Token,
}

/// Outcome of executing one statement.
///
/// Loop signals carry their originating token so an escaping signal can
/// be reported precisely.
#[derive(Clone, Debug)]
pub enum Flow {
    Normal,
    Break(Token),
    Continue(Token),
}

/// AST walker owning the runtime call stack.
pub struct Interpreter<'a> {
    call_stack: CallStack,
    sink: &'a mut dyn TraceSink,
}

impl<'a> Interpreter<'a> {
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        Self {
            call_stack: CallStack::new(),
            sink,
        }
    }

    /// Current call-stack depth; zero after a completed run.
    pub fn stack_depth(&self) -> usize {
        self.call_stack.depth()
    }

    /// Execute a whole program.
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        self.enter_frame(&program.name, FrameKind::Program);
        let result = self.exec_block(&program.block);
        match result {
            Ok(Flow::Normal) => {
                self.trace_leave();
                self.call_stack.pop();
                Ok(())
            }
            Ok(Flow::Break(token)) => {
                self.call_stack.pop();
                Err(RuntimeError {
                    code: ErrorCode::BreakOutsideLoop,
                    token,
                })
            }
            Ok(Flow::Continue(token)) => {
                self.call_stack.pop();
                Err(RuntimeError {
                    code: ErrorCode::ContinueOutsideLoop,
                    token,
                })
            }
            Err(err) => {
                self.call_stack.pop();
                Err(err)
            }
        }
    }

    // =========================================================================
    // FRAMES AND TRACING
    // =========================================================================

    fn enter_frame(&mut self, name: &str, kind: FrameKind) {
        trace!(frame = name, %kind, "push frame");
        self.call_stack.push(Frame::new(name, kind));
        self.sink.trace(&format!("ENTER: {kind} {name}"));
    }

    /// Emit the LEAVE line and the stack dump for the current frame.
    ///
    /// Called on normal completion only, before the frame is popped, so
    /// the dump still shows the leaving frame's members.
    fn trace_leave(&mut self) {
        let Some(frame) = self.call_stack.current() else {
            return;
        };
        trace!(frame = frame.name.as_str(), "pop frame");
        let line = format!("LEAVE: {} {}", frame.kind, frame.name);
        let dump = self.call_stack.to_string();
        self.sink.trace(&line);
        self.sink.trace(&dump);
    }

    fn error(&self, code: ErrorCode, token: &Token) -> RuntimeError {
        RuntimeError {
            code,
            token: token.clone(),
        }
    }

    // =========================================================================
    // STATEMENTS
    // =========================================================================

    fn exec_block(&mut self, block: &Block) -> Result<Flow, RuntimeError> {
        for decl in &block.declarations {
            match decl {
                Decl::Var(var_decl) => self.call_stack.define(&var_decl.var.name),
                Decl::Procedure(decl) => {
                    self.call_stack.bind(&decl.name, Value::Proc(decl.clone()))
                }
                Decl::Function(decl) => {
                    self.call_stack.bind(&decl.name, Value::Func(decl.clone()))
                }
            }
        }
        self.exec_compound(&block.compound)
    }

    fn exec_compound(&mut self, compound: &Compound) -> Result<Flow, RuntimeError> {
        for stmt in &compound.children {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Compound(compound) => self.exec_compound(compound),
            Stmt::Assign(assign) => self.exec_assign(assign),
            Stmt::ProcedureCall(call) => self.exec_proccall(call),
            Stmt::Condition(cond) => self.exec_condition(cond),
            Stmt::WhileLoop(while_loop) => self.exec_while(while_loop),
            Stmt::Break(token) => Ok(Flow::Break(token.clone())),
            Stmt::Continue(token) => Ok(Flow::Continue(token.clone())),
            Stmt::NoOp => Ok(Flow::Normal),
        }
    }

    fn exec_assign(&mut self, assign: &Assign) -> Result<Flow, RuntimeError> {
        let value = self.eval_expr(&assign.value)?;

        // Inside a function frame, assigning to the function's own name
        // sets the return slot instead of a variable.
        if let Some(frame) = self.call_stack.current_mut() {
            if frame.kind == FrameKind::Function && frame.name == assign.target.name {
                frame.return_value = Some(value);
                return Ok(Flow::Normal);
            }
        }

        if self.call_stack.set_value(&assign.target.name, value) {
            Ok(Flow::Normal)
        } else {
            Err(self.error(ErrorCode::UndefinedId, &assign.target.token))
        }
    }

    fn exec_condition(&mut self, cond: &Condition) -> Result<Flow, RuntimeError> {
        let value = self.eval_expr(&cond.cond)?;
        if self.truthy(&value, cond.cond.token())? {
            self.exec_stmt(&cond.then_branch.child)
        } else if let Some(else_branch) = &cond.else_branch {
            self.exec_stmt(&else_branch.child)
        } else {
            Ok(Flow::Normal)
        }
    }

    fn exec_while(&mut self, while_loop: &WhileLoop) -> Result<Flow, RuntimeError> {
        loop {
            let cond = self.eval_expr(&while_loop.cond)?;
            if !self.truthy(&cond, while_loop.cond.token())? {
                return Ok(Flow::Normal);
            }
            match self.exec_stmt(&while_loop.body)? {
                Flow::Normal | Flow::Continue(_) => {}
                Flow::Break(_) => return Ok(Flow::Normal),
            }
        }
    }

    // =========================================================================
    // CALLS
    // =========================================================================

    fn exec_proccall(&mut self, call: &ProcedureCall) -> Result<Flow, RuntimeError> {
        let callee = match self.call_stack.get_value(&call.name) {
            Some(Value::Proc(decl)) => decl.clone(),
            _ => return Err(self.error(ErrorCode::UndefinedId, &call.token)),
        };

        // Arguments are evaluated in the caller's frame, left to right.
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval_expr(arg)?);
        }

        self.enter_frame(&call.name, FrameKind::Procedure);
        for (param, value) in callee.params.iter().zip(args) {
            self.call_stack.bind(&param.var.name, value);
        }

        match self.exec_block(&callee.block) {
            Ok(Flow::Normal) => {
                self.trace_leave();
                self.call_stack.pop();
                Ok(Flow::Normal)
            }
            // A loop signal leaves the procedure and continues unwinding
            // in the caller; the nearest dynamically enclosing loop will
            // consume it.
            Ok(flow) => {
                self.call_stack.pop();
                Ok(flow)
            }
            Err(err) => {
                self.call_stack.pop();
                Err(err)
            }
        }
    }

    fn eval_funccall(&mut self, call: &FunctionCall) -> Result<Value, RuntimeError> {
        let callee = match self.call_stack.get_value(&call.name) {
            Some(Value::Func(decl)) => decl.clone(),
            _ => return Err(self.error(ErrorCode::UndefinedId, &call.token)),
        };

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval_expr(arg)?);
        }

        self.enter_frame(&call.name, FrameKind::Function);
        for (param, value) in callee.params.iter().zip(args) {
            self.call_stack.bind(&param.var.name, value);
        }

        match self.exec_block(&callee.block) {
            Ok(Flow::Normal) => {
                self.trace_leave();
                let frame = self.call_stack.pop();
                frame
                    .and_then(|f| f.return_value)
                    .ok_or_else(|| self.error(ErrorCode::MissingReturn, &call.token))
            }
            // A loop signal cannot travel through an expression; it
            // escapes the function as the corresponding runtime error.
            Ok(Flow::Break(token)) => {
                self.call_stack.pop();
                Err(RuntimeError {
                    code: ErrorCode::BreakOutsideLoop,
                    token,
                })
            }
            Ok(Flow::Continue(token)) => {
                self.call_stack.pop();
                Err(RuntimeError {
                    code: ErrorCode::ContinueOutsideLoop,
                    token,
                })
            }
            Err(err) => {
                self.call_stack.pop();
                Err(err)
            }
        }
    }

    // =========================================================================
    // EXPRESSIONS
    // =========================================================================

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Num(num) => match &num.token.value {
                TokenValue::Int(v) => Ok(Value::Int(*v)),
                TokenValue::Real(v) => Ok(Value::Real(*v)),
                _ => Err(self.error(ErrorCode::InvalidOperand, &num.token)),
            },
            Expr::Boolean(lit) => Ok(Value::Bool(lit.value)),
            Expr::Var(var) => match self.call_stack.get_value(&var.name) {
                Some(value) => Ok(value.clone()),
                None => Err(self.error(ErrorCode::UndefinedId, &var.token)),
            },
            Expr::BinOp(binop) => self.eval_binop(binop),
            Expr::UnaryOp(unary) => self.eval_unary(unary),
            Expr::FunctionCall(call) => self.eval_funccall(call),
        }
    }

    fn eval_binop(&mut self, binop: &BinOp) -> Result<Value, RuntimeError> {
        let left = self.eval_expr(&binop.left)?;
        let right = self.eval_expr(&binop.right)?;
        let op = &binop.op;

        match op.kind {
            TokenKind::Plus | TokenKind::Minus | TokenKind::Mul => {
                self.eval_arith(op, &left, &right)
            }
            TokenKind::IntegerDiv | TokenKind::FloatDiv | TokenKind::Mod => {
                self.eval_division(op, &left, &right)
            }
            TokenKind::Equals => Ok(Value::Bool(values_equal(&left, &right))),
            TokenKind::NotEquals => Ok(Value::Bool(!values_equal(&left, &right))),
            TokenKind::Less
            | TokenKind::LessEquals
            | TokenKind::Greater
            | TokenKind::GreaterEquals => self.eval_compare(op, &left, &right),
            // Both operands were already evaluated; select one of the
            // evaluated values.
            TokenKind::And => {
                if self.truthy(&left, binop.left.token())? {
                    Ok(right)
                } else {
                    Ok(left)
                }
            }
            TokenKind::Or => {
                if self.truthy(&left, binop.left.token())? {
                    Ok(left)
                } else {
                    Ok(right)
                }
            }
            _ => Err(self.error(ErrorCode::InvalidOperand, op)),
        }
    }

    /// `+`, `-`, `*`: integer when both operands are integral, real
    /// otherwise.
    fn eval_arith(
        &self,
        op: &Token,
        left: &Value,
        right: &Value,
    ) -> Result<Value, RuntimeError> {
        let l = self.numeric(left, op)?;
        let r = self.numeric(right, op)?;

        Ok(match (op.kind, l, r) {
            (TokenKind::Plus, Numeric::Int(a), Numeric::Int(b)) => Value::Int(a.wrapping_add(b)),
            (TokenKind::Plus, a, b) => Value::Real(a.as_f64() + b.as_f64()),
            (TokenKind::Minus, Numeric::Int(a), Numeric::Int(b)) => Value::Int(a.wrapping_sub(b)),
            (TokenKind::Minus, a, b) => Value::Real(a.as_f64() - b.as_f64()),
            (TokenKind::Mul, Numeric::Int(a), Numeric::Int(b)) => Value::Int(a.wrapping_mul(b)),
            (TokenKind::Mul, a, b) => Value::Real(a.as_f64() * b.as_f64()),
            _ => return Err(self.error(ErrorCode::InvalidOperand, op)),
        })
    }

    /// `//` (floor), `/` (real), `%` (floored remainder).
    ///
    /// A zero integer divisor is a runtime error; real division follows
    /// IEEE semantics.
    fn eval_division(
        &self,
        op: &Token,
        left: &Value,
        right: &Value,
    ) -> Result<Value, RuntimeError> {
        let l = self.numeric(left, op)?;
        let r = self.numeric(right, op)?;

        if let (Numeric::Int(a), Numeric::Int(b)) = (l, r) {
            if b == 0 {
                return Err(self.error(ErrorCode::DivisionByZero, op));
            }
            return Ok(match op.kind {
                TokenKind::IntegerDiv => Value::Int(floor_div(a, b)),
                TokenKind::FloatDiv => Value::Real(a as f64 / b as f64),
                TokenKind::Mod => Value::Int(floor_mod(a, b)),
                _ => return Err(self.error(ErrorCode::InvalidOperand, op)),
            });
        }

        let a = l.as_f64();
        let b = r.as_f64();
        Ok(match op.kind {
            TokenKind::IntegerDiv => Value::Real((a / b).floor()),
            TokenKind::FloatDiv => Value::Real(a / b),
            TokenKind::Mod => Value::Real(a - b * (a / b).floor()),
            _ => return Err(self.error(ErrorCode::InvalidOperand, op)),
        })
    }

    fn eval_compare(
        &self,
        op: &Token,
        left: &Value,
        right: &Value,
    ) -> Result<Value, RuntimeError> {
        let a = self.numeric(left, op)?.as_f64();
        let b = self.numeric(right, op)?.as_f64();

        let result = match op.kind {
            TokenKind::Less => a < b,
            TokenKind::LessEquals => a <= b,
            TokenKind::Greater => a > b,
            TokenKind::GreaterEquals => a >= b,
            _ => return Err(self.error(ErrorCode::InvalidOperand, op)),
        };
        Ok(Value::Bool(result))
    }

    fn eval_unary(&mut self, unary: &UnaryOp) -> Result<Value, RuntimeError> {
        let value = self.eval_expr(&unary.operand)?;
        match unary.op.kind {
            TokenKind::Plus => Ok(match self.numeric(&value, &unary.op)? {
                Numeric::Int(v) => Value::Int(v),
                Numeric::Real(v) => Value::Real(v),
            }),
            TokenKind::Minus => Ok(match self.numeric(&value, &unary.op)? {
                Numeric::Int(v) => Value::Int(v.wrapping_neg()),
                Numeric::Real(v) => Value::Real(-v),
            }),
            TokenKind::Not => {
                let truthy = self.truthy(&value, unary.operand.token())?;
                Ok(Value::Bool(!truthy))
            }
            _ => Err(self.error(ErrorCode::InvalidOperand, &unary.op)),
        }
    }

    /// Truthiness of a value; `nil` as a condition is a runtime error.
    fn truthy(&self, value: &Value, token: &Token) -> Result<bool, RuntimeError> {
        value
            .truthiness()
            .ok_or_else(|| self.error(ErrorCode::InvalidOperand, token))
    }

    /// View a value as a number; booleans count as 1/0.
    fn numeric(&self, value: &Value, token: &Token) -> Result<Numeric, RuntimeError> {
        match value {
            Value::Int(v) => Ok(Numeric::Int(*v)),
            Value::Real(v) => Ok(Numeric::Real(*v)),
            Value::Bool(v) => Ok(Numeric::Int(*v as i64)),
            _ => Err(self.error(ErrorCode::InvalidOperand, token)),
        }
    }
}

/// Numeric operand view used by arithmetic dispatch.
#[derive(Clone, Copy)]
enum Numeric {
    Int(i64),
    Real(f64),
}

impl Numeric {
    fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(v) => v as f64,
            Numeric::Real(v) => v,
        }
    }
}

/// Equality with numeric coercion: `2 = 2.0` and `TRUE = 1` hold, `nil`
/// equals only `nil`, callables compare by identity.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,
        (Value::Proc(_), _) | (_, Value::Proc(_)) | (Value::Func(_), _) | (_, Value::Func(_)) => {
            left == right
        }
        (l, r) => match (l.as_number(), r.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

/// Quotient rounded toward negative infinity.
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Remainder carrying the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}
