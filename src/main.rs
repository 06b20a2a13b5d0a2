use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use loxwalk::error::EXIT_USAGE;
use loxwalk::stmt::{print_stmt, Stmt};
use loxwalk::{Diagnostics, Interpreter};

const LOG_ENV: &str = "LOXWALK_LOG";

/// Tree-walking interpreter for a small Lox dialect. Runs SCRIPT, or starts an
/// interactive prompt when no script is given.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Print the parsed statements to stderr before running them.
    #[arg(long)]
    print_ast: bool,

    /// Increase log verbosity (-v debug, -vv trace). Overridden by LOXWALK_LOG.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    script: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => return Ok(usage_error(&error)),
    };
    install_tracing(args.verbose);

    match &args.script {
        Some(path) => run_file(path, &args),
        None => run_prompt(&args),
    }
}

// --help and --version exit cleanly, anything else is a usage error
fn usage_error(error: &clap::Error) -> ExitCode {
    let _ = error.print();
    if error.exit_code() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_USAGE)
    }
}

fn install_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_file(path: &Path, args: &Args) -> Result<ExitCode> {
    let contents = fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;

    let mut stdout = io::stdout();
    let mut interpreter = Interpreter::new(&mut stdout);
    let mut diagnostics = Diagnostics::new();

    run(&contents, &mut interpreter, &mut diagnostics, args);
    display_errors(&diagnostics);

    Ok(diagnostics.exit_code().map_or(ExitCode::SUCCESS, ExitCode::from))
}

fn run_prompt(args: &Args) -> Result<ExitCode> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut interpreter = Interpreter::new(&mut stdout);
    let mut diagnostics = Diagnostics::new();
    let mut buffer = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Flushing prompt")?;

        buffer.clear();
        if stdin.lock().read_line(&mut buffer).context("Reading prompt input")? == 0 {
            println!();
            break;
        }

        let line = buffer.trim();
        if line == "exit" || line == "quit" {
            break;
        }

        diagnostics.reset();
        run(line, &mut interpreter, &mut diagnostics, args);
        display_errors(&diagnostics);
    }

    Ok(ExitCode::SUCCESS)
}

fn run(code: &str, interpreter: &mut Interpreter, diagnostics: &mut Diagnostics, args: &Args) {
    loxwalk::run_with(code, interpreter, diagnostics, |statements: &[Stmt]| {
        if args.print_ast {
            for statement in statements {
                eprintln!("{}", print_stmt(statement));
            }
        }
    });
}

fn display_errors(diagnostics: &Diagnostics) {
    for error in diagnostics.errors() {
        eprintln!("{error}");
    }
    if let Some(error) = diagnostics.runtime_error() {
        eprintln!("{error}");
    }
}
