use std::io::{self, BufRead, Write as _};
use std::process::ExitCode;
use std::{env, fs};

use dust::{Repl, StdPrint};

fn main() -> ExitCode {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [] => {
            run_repl();
            ExitCode::SUCCESS
        }
        [path] => run_file(path),
        _ => {
            println!("Usage: dust [script]");
            ExitCode::from(64)
        }
    }
}

fn run_file(path: &str) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            println!("Error: File '{path}' not found.");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            println!("Error reading file: {err}");
            return ExitCode::FAILURE;
        }
    };

    match dust::run(&source, &mut StdPrint) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run_repl() {
    let mut repl = Repl::new();
    let mut out = StdPrint;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    repl.run(&mut out, |prompt| {
        print!("{prompt}");
        let _ = io::stdout().flush();
        match lines.next() {
            Some(Ok(line)) => Some(line),
            _ => None,
        }
    });
}
