//! CLI entry point: run a script file, or drop into an interactive REPL.
//!
//! Dispatch and exit codes follow the contract in `SPEC_FULL.md` section 6:
//! no arguments starts the REPL, one argument runs that file, more than
//! one is a usage error.

mod ast;
mod builtin;
mod environment;
mod error;
mod interpreter;
mod parser;
mod scanner;
mod token;
mod value;

use error::Reporter;
use interpreter::Interpreter;
use parser::Parser;
use scanner::Scanner;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

const EXIT_USAGE: u8 = 64;
const EXIT_DATAERR: u8 = 65;
const EXIT_NOINPUT: u8 = 66;
const EXIT_SOFTWARE: u8 = 70;
const EXIT_OSERR: u8 = 71;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.len() {
        0 => run_prompt(),
        1 => run_file(&args[0]),
        _ => {
            eprintln!("Usage: lox [script]");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn run_file(path: &str) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            eprintln!("Can't open file '{}'.", path);
            return ExitCode::from(EXIT_NOINPUT);
        }
        Err(e) => {
            eprintln!("Failed to read '{}': {}", path, e);
            return ExitCode::from(EXIT_OSERR);
        }
    };

    let reporter = Reporter::new();
    let mut interpreter = Interpreter::new();
    run(&source, &mut interpreter, &reporter);

    if reporter.had_error() {
        ExitCode::from(EXIT_DATAERR)
    } else if reporter.had_runtime_error() {
        ExitCode::from(EXIT_SOFTWARE)
    } else {
        ExitCode::SUCCESS
    }
}

fn run_prompt() -> ExitCode {
    let reporter = Reporter::new();
    let mut interpreter = Interpreter::new();
    let stdin = io::stdin();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return ExitCode::from(EXIT_OSERR);
        }

        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => return ExitCode::SUCCESS, // EOF
            Ok(_) => {
                run(&line, &mut interpreter, &reporter);
                reporter.reset();
            }
            Err(e) => {
                eprintln!("Failed to read input: {}", e);
                return ExitCode::from(EXIT_OSERR);
            }
        }
    }
}

fn run(source: &str, interpreter: &mut Interpreter, reporter: &Reporter) {
    let tokens = Scanner::new(source).scan_tokens(reporter);
    let statements = Parser::new(tokens, reporter).parse();

    if reporter.had_error() {
        return;
    }

    interpreter.interpret(&statements, reporter);
}
