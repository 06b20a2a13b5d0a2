use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use loxwalk::astgen::{define_ast, EXPR_GRAMMAR, STMT_GRAMMAR};
use loxwalk::error::EXIT_USAGE;

/// Writes expr.rs and stmt.rs with the AST enum definitions into OUTPUT_DIR.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    output_dir: PathBuf,
}

fn main() -> Result<ExitCode> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error) => {
            let _ = error.print();
            let code = if error.exit_code() == 0 { ExitCode::SUCCESS } else { ExitCode::from(EXIT_USAGE) };
            return Ok(code);
        }
    };

    for (base_name, grammar, file_name) in [("Expr", EXPR_GRAMMAR, "expr.rs"), ("Stmt", STMT_GRAMMAR, "stmt.rs")] {
        let source = define_ast(base_name, grammar).with_context(|| format!("Generating {base_name}"))?;
        let path = args.output_dir.join(file_name);
        fs::write(&path, source).with_context(|| format!("Writing {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}
