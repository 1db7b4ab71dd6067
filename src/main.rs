//! Brainfuck virtual machine generator.
//!
//! Prints the generated machine to stdout: a minified Brainfuck program
//! that loads a byte stream from stdin (terminated by four nulls) into
//! its simulated RAM and then executes it. Diagnostics go to stderr,
//! never stdout.

use std::env;
use std::io::Write;
use std::process;

use tapevm::error;
use tapevm::layout::Layout;
use tapevm::machine::program::generate;

const USAGE: &str = "\
tapevm - Brainfuck virtual machine generator

USAGE:
    {program} [OPTIONS]

With no options, writes the generated Brainfuck program to stdout.
Feed it to an 8-bit wrap-around Brainfuck interpreter (EOF = 0xFF),
piping the machine's program bytes plus four 0x00 terminator bytes
to its stdin.

OPTIONS:
    -h, --help       Print this help message

EXIT STATUS:
    0 on success; 1 on a generation-time error (diagnostic on stderr).
";

/// Prints usage information to stderr.
fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("tapevm");

    for arg in &args[1..] {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage(program);
                process::exit(0);
            }
            other => {
                eprintln!("Unexpected argument: {}\n", other);
                print_usage(program);
                process::exit(1);
            }
        }
    }

    // Exactly the eight command characters; no trailing newline.
    match generate(&Layout::default()) {
        Ok(code) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(code.as_bytes()).and_then(|_| stdout.flush()) {
                error!("write failed: {e}");
                process::exit(1);
            }
        }
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}
