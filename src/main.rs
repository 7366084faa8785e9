use clap::Parser as ClapParser;
use sqlpath::{EvalError, Evaluator, ParseError};
use std::io::{self, BufRead, Write};

#[derive(ClapParser)]
#[command(name = "sqlpath")]
#[command(about = "Evaluate an SQL/JSON path program against JSON values read from stdin")]
#[command(version)]
struct Cli {
    /// The path program, e.g. '$.items[*] ? (@.price > 10)'
    path: String,

    /// Pretty-print each result sequence
    #[arg(short, long)]
    pretty: bool,

    /// Only compile the program, don't read any input
    #[arg(long)]
    syntax_only: bool,
}

/// Errors surfaced at the command-line boundary
#[derive(Debug)]
enum CliError {
    /// Path program failed to compile
    Parse(ParseError),
    /// Evaluation error
    Eval(EvalError),
    /// Input line was not valid JSON
    Json(serde_json::Error),
    /// IO error
    Io(io::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Parse(e) => write!(f, "Parse error: {}", e),
            CliError::Eval(e) => write!(f, "Evaluation error: {}", e),
            CliError::Json(e) => write!(f, "Invalid JSON: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Parse(e) => Some(e),
            CliError::Eval(e) => Some(e),
            CliError::Json(e) => Some(e),
            CliError::Io(e) => Some(e),
        }
    }
}

impl From<ParseError> for CliError {
    fn from(e: ParseError) -> Self {
        CliError::Parse(e)
    }
}

impl From<EvalError> for CliError {
    fn from(e: EvalError) -> Self {
        CliError::Eval(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let evaluator = Evaluator::compile(&cli.path)?;

    if cli.syntax_only {
        return Ok(());
    }

    if atty::is(atty::Stream::Stdin) {
        eprintln!("reading JSON values from stdin, one per line (ctrl-d to finish)");
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let root: serde_json::Value = serde_json::from_str(&line)?;
        let result = evaluator.run(&root)?;

        let rendered = if cli.pretty {
            serde_json::to_string_pretty(&result)?
        } else {
            serde_json::to_string(&result)?
        };
        writeln!(out, "{}", rendered)?;
    }
    Ok(())
}
