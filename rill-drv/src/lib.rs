//! Driver for the `rill` interpreter: argument parsing, source loading, and
//! wiring the lexer, parser, and evaluator into one pipeline.
//!
//! `main` itself is a few lines in `src/main.rs`; everything that can be
//! exercised without a real process (argument parsing, the pipeline, the
//! diagnostic formatting) lives here so it can be unit- and CLI-tested.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use rill_eval::Interpreter;
use rill_lex::Lexer;
use rill_par::parse_program;

/// `rill <path>` — run a source file. The two `--dump-*` flags print an
/// intermediate representation to stdout before evaluation and otherwise
/// don't change what the program does.
#[derive(Parser, Debug)]
#[command(name = "rill")]
#[command(author = "Fax Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run a rill script", long_about = None)]
pub struct Cli {
    /// Source file to run
    pub path: PathBuf,

    /// Print the token stream before parsing
    #[arg(long)]
    pub dump_tokens: bool,

    /// Print the parsed AST before evaluation
    #[arg(long)]
    pub dump_ast: bool,
}

/// Initializes `tracing-subscriber` from `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}

/// Runs the CLI: reads the source file, lexes, parses, optionally dumps
/// intermediate representations, then evaluates. Errors are returned to the
/// caller rather than printed/exited here, so `main` stays the only place
/// that knows about process exit codes; a language-level [`rill_util::Fatal`]
/// converts into this `anyhow::Error` via `?` and still renders as its own
/// one-line message, since `anyhow::Error`'s `Display` defers to the
/// wrapped error's.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&cli.path)
        .with_context(|| format!("cannot read {}", cli.path.display()))?;

    let tokens = Lexer::lex_all(&source)?;
    if cli.dump_tokens {
        for token in &tokens {
            println!("{token:?}");
        }
    }

    let mut heap = rill_par::Heap::new();
    let root = parse_program(&tokens, &mut heap)?;
    if cli.dump_ast {
        println!("{:#?}", heap.get(root));
    }

    let mut interp = Interpreter::new(heap, root);
    interp.run()?;
    Ok(())
}
