pub mod astgen;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod stmt;
pub mod value;

pub use error::{Diagnostics, ExecutionError};
pub use interpreter::Interpreter;

/// Scan and parse source text, reporting lexical and syntax errors to `diagnostics`.
pub fn parse_source(code: &str, diagnostics: &mut Diagnostics) -> Vec<stmt::Stmt> {
    let tokens = scanner::scan_tokens(code, diagnostics);
    parser::parse(&tokens, diagnostics)
}

/// Scan, parse, and interpret one top-level submission.
///
/// Lexical and syntax errors are all collected into `diagnostics`; if any were
/// found the program is not run. A runtime error stops the run and is recorded
/// as well. The caller decides when to [`Diagnostics::reset`].
pub fn run(code: &str, interpreter: &mut Interpreter, diagnostics: &mut Diagnostics) {
    run_with(code, interpreter, diagnostics, |_| {});
}

/// Like [`run`], calling `before_run` with the parsed program right before it
/// is interpreted. Not called when the program is skipped because of errors.
pub fn run_with<F>(code: &str, interpreter: &mut Interpreter, diagnostics: &mut Diagnostics, before_run: F)
where
    F: FnOnce(&[stmt::Stmt]),
{
    let statements = parse_source(code, diagnostics);

    if diagnostics.had_error() {
        tracing::debug!(errors = diagnostics.errors().len(), "skipping interpretation");
        return;
    }

    before_run(&statements);
    if let Err(error) = interpreter.interpret(&statements) {
        diagnostics.report_runtime(error);
    }
}

/// Like [`run`], with a fresh set of diagnostics turned into a `Result`.
pub fn execute(code: &str, interpreter: &mut Interpreter) -> Result<(), ExecutionError> {
    let mut diagnostics = Diagnostics::new();
    run(code, interpreter, &mut diagnostics);
    diagnostics.into_result()
}
