//! paski - the Pask interpreter CLI.
//!
//! Runs a source file through the full pipeline, or dumps an
//! intermediate representation with `--emit`. Without arguments it
//! prints the usage text and exits successfully.

use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pask_drv::{emit_ast, emit_tokens, run_source};
use pask_interp::{NullTrace, StdoutTrace};

/// Tree-walking interpreter for the Pask language.
#[derive(Parser, Debug)]
#[command(name = "paski")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tree-walking interpreter for the Pask language", long_about = None)]
struct Cli {
    /// Source file to run
    file: Option<PathBuf>,

    /// Dump an intermediate representation instead of running
    #[arg(long, value_enum)]
    emit: Option<Emit>,

    /// Suppress the ENTER/LEAVE frame trace
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug-level phase logging (to stderr)
    #[arg(short, long)]
    verbose: bool,
}

/// Intermediate representations the CLI can dump.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Emit {
    /// The lexer's token stream
    Tokens,
    /// The parser's AST
    Ast,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(file) = cli.file else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let source = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    match cli.emit {
        Some(Emit::Tokens) => {
            println!("{}", emit_tokens(&source)?);
            return Ok(());
        }
        Some(Emit::Ast) => {
            println!("{}", emit_ast(&source)?);
            return Ok(());
        }
        None => {}
    }

    if cli.quiet {
        let mut sink = NullTrace;
        run_source(&source, &mut sink)?;
    } else {
        let mut sink = StdoutTrace;
        run_source(&source, &mut sink)?;
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
