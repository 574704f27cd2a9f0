//! Error-code catalogue shared by every phase.
//!
//! Each phase wraps one of these codes in its own error type; the code
//! carries the canonical human-readable message.

use std::fmt;

/// The closed set of diagnostic codes the pipeline can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    /// The lexer met a character that starts no token.
    UnexpectedCharacter,
    /// A `{ ... }` comment ran into end of input.
    UnterminatedComment,
    /// The parser met a token it did not expect.
    UnexpectedToken,
    /// A name was referenced but never declared.
    IdNotFound,
    /// The same name was declared twice in one scope.
    DuplicateId,
    /// The same procedure or function name was declared twice in one scope.
    DuplicateProcDecl,
    /// A call passed a different number of arguments than the declaration.
    UnexpectedProcArgumentsNumber,
    /// A function completed without assigning to its own name.
    MissingReturn,
    /// A `break` signal escaped every loop.
    BreakOutsideLoop,
    /// A `continue` signal escaped every loop.
    ContinueOutsideLoop,
    /// A name had no binding in any active frame.
    UndefinedId,
    /// Integer division or modulo with a zero divisor.
    DivisionByZero,
    /// A value of the wrong kind reached an operator.
    InvalidOperand,
}

impl ErrorCode {
    /// The canonical message for this code.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::UnexpectedCharacter => "Invalid character",
            ErrorCode::UnterminatedComment => "Unterminated comment",
            ErrorCode::UnexpectedToken => "Unexpected token",
            ErrorCode::IdNotFound => "Identifier not found",
            ErrorCode::DuplicateId => "Duplicate id found",
            ErrorCode::DuplicateProcDecl => "Duplicate procedure found",
            ErrorCode::UnexpectedProcArgumentsNumber => {
                "Unexpected procedure arguments number"
            }
            ErrorCode::MissingReturn => "Function missing return value",
            ErrorCode::BreakOutsideLoop => "Break outside loop",
            ErrorCode::ContinueOutsideLoop => "Continue outside loop",
            ErrorCode::UndefinedId => "Undefined id",
            ErrorCode::DivisionByZero => "Division by zero",
            ErrorCode::InvalidOperand => "Invalid operand",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
