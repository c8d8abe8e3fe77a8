//! Vasuki bytecode runner.
//!
//! Usage:
//!   vasuki <path-to-bytecode>   Load and run a compiled container file.
//!   vasuki --disasm <path>      Print a disassembly listing instead of running.
//!
//! Set `RUST_LOG=vasuki=trace` to see per-call/per-jump tracing on stderr;
//! program output (`PRINT`/`print`) always goes to stdout, unaffected by
//! the trace level.

use std::process::ExitCode;

use vasuki::bytecode::BytecodeImage;
use vasuki::disasm;
use vasuki::vm::Vm;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    match args.len() {
        2 => run(&args[1]),
        3 if args[1] == "--disasm" => show_disasm(&args[2]),
        _ => {
            eprintln!("usage: vasuki <path-to-bytecode> | vasuki --disasm <path>");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str) -> ExitCode {
    let image = match BytecodeImage::load_file(path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("vasuki: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut vm = Vm::new(image);
    match vm.run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("vasuki: {e}");
            ExitCode::FAILURE
        }
    }
}

fn show_disasm(path: &str) -> ExitCode {
    let image = match BytecodeImage::load_file(path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("vasuki: {e}");
            return ExitCode::FAILURE;
        }
    };
    for line in disasm::disassemble(&image) {
        println!("{line}");
    }
    ExitCode::SUCCESS
}
