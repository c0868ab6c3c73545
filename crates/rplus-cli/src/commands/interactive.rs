//! The interactive REPL (`-i` / `interactive`).
//!
//! Reads lines from stdin until `exit` or `quit`, compiling each line in
//! isolation and printing `OK` or the error. Per §7, "the interactive mode
//! catches per-line exceptions so subsequent inputs still work" — a bad
//! line never ends the session.

use std::io::{self, BufRead, Write};

use crate::commands::common::compile_source;
use crate::error::Result;

pub fn run<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<()> {
    writeln!(output, "R+ interactive mode. Type 'exit' or 'quit' to leave.")?;

    loop {
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line {
            "" => continue,
            "exit" | "quit" => break,
            "help" => {
                writeln!(output, "Commands: exit, quit, help, clear")?;
            }
            "clear" => {
                write!(output, "\x1B[2J\x1B[1;1H")?;
            }
            _ => match compile_source(line) {
                Ok(_) => writeln!(output, "OK")?,
                Err(err) => writeln!(output, "error: {}", err)?,
            },
        }
    }

    Ok(())
}

pub fn run_stdio() -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run(stdin.lock(), stdout.lock())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_line_reports_ok() {
        let input = b"1+1;\nexit\n".as_slice();
        let mut output = Vec::new();
        run(input, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("OK"));
    }

    #[test]
    fn bad_line_reports_error_and_keeps_going() {
        let input = b"1 +;\n1+1;\nexit\n".as_slice();
        let mut output = Vec::new();
        run(input, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("error:"));
        assert!(text.contains("OK"));
    }

    #[test]
    fn help_and_clear_are_recognized() {
        let input = b"help\nclear\nquit\n".as_slice();
        let mut output = Vec::new();
        run(input, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Commands:"));
    }
}
