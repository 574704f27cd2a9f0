//! pask-drv - Pipeline orchestration.
//!
//! Wires the phases together: lex, parse, analyze, interpret. The public
//! surface is [`run_source`], which takes a source string and a trace
//! sink and either runs the program to completion or returns the first
//! error any phase produced.

use pask_interp::{Interpreter, RuntimeError, TraceSink};
use pask_lex::LexerError;
use pask_par::{ParseError, SyntaxError};
use pask_sem::{SemanticAnalyzer, SemanticError};
use thiserror::Error;
use tracing::debug;

/// Any error the pipeline can stop with.
#[derive(Debug, Error)]
pub enum PaskError {
    #[error(transparent)]
    Lexer(#[from] LexerError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ParseError> for PaskError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Lexer(e) => PaskError::Lexer(e),
            ParseError::Syntax(e) => PaskError::Syntax(e),
        }
    }
}

/// Run a source program through the full pipeline.
///
/// Frame trace lines (ENTER/LEAVE and stack dumps) go to `sink`; all
/// errors abort immediately, there is no recovery.
pub fn run_source(source: &str, sink: &mut dyn TraceSink) -> Result<(), PaskError> {
    debug!("parsing");
    let program = pask_par::parse(source)?;

    debug!(program = program.name.as_str(), "semantic analysis");
    let mut analyzer = SemanticAnalyzer::new();
    analyzer.analyze(&program)?;

    debug!(program = program.name.as_str(), "interpreting");
    let mut interpreter = Interpreter::new(sink);
    interpreter.run(&program)?;
    Ok(())
}

/// Render the token stream of a source string, one token per line.
pub fn emit_tokens(source: &str) -> Result<String, PaskError> {
    let tokens = pask_lex::tokenize(source)?;
    Ok(tokens
        .iter()
        .map(|token| token.to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Render the parsed AST of a source string.
pub fn emit_ast(source: &str) -> Result<String, PaskError> {
    let program = pask_par::parse(source)?;
    Ok(format!("{program:#?}"))
}
