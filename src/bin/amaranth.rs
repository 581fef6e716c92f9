use std::{fs, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};

use amaranth::{AmaranthError, Interpreter, Repl};

#[derive(Parser)]
#[command(author, version, about = "Amaranth language interpreter")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run an Amaranth script file
    Run { script: PathBuf },
    /// Start an interactive REPL session
    Repl,
    /// Evaluate a snippet of Amaranth code
    Eval { source: String },
}

fn main() -> ExitCode {
    let args = Args::parse();
    let outcome = match args.command.unwrap_or(Command::Repl) {
        Command::Run { script } => run_script(script),
        Command::Repl => {
            let mut repl = Repl::new();
            repl.run()
        }
        Command::Eval { source } => evaluate_source(&source),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(AmaranthError::Parse(diagnostics)) => {
            for diagnostic in &diagnostics {
                eprintln!("{diagnostic}");
            }
            ExitCode::FAILURE
        }
        Err(other) => {
            eprintln!("error: {other}");
            ExitCode::FAILURE
        }
    }
}

fn run_script(path: PathBuf) -> Result<(), AmaranthError> {
    let source = fs::read_to_string(&path)?;
    evaluate_source(&source)
}

fn evaluate_source(source: &str) -> Result<(), AmaranthError> {
    let mut interpreter = Interpreter::new();
    let value = interpreter.eval_source(source)?;
    if !value.is_empty() {
        println!("{value}");
    }
    Ok(())
}
