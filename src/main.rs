// crustcc: compile a C subset to x86-64 assembly on stdout

use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use tracing::debug;

fn main() -> ExitCode {
    crustcc::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(String::as_str).unwrap_or("crustcc");

    if args.len() != 2 {
        eprintln!("Usage: {} <file.c>", program_name);
        return ExitCode::FAILURE;
    }
    let path = &args[1];

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", path, e);
            return ExitCode::FAILURE;
        }
    };
    debug!(path = %path, bytes = source.len(), "read source");

    let asm = match crustcc::compile(&source) {
        Ok(asm) => asm,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(asm.as_bytes()).and_then(|_| stdout.flush()) {
        eprintln!("Error: cannot write output: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
