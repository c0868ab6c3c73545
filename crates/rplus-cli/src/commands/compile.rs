//! The `compile` subcommand (and its `-c`/bare-file-argument aliases).
//!
//! Prints the five-step progress log §6 specifies — reading, lexing
//! (token count), parsing, code generation, writing (byte count) — as
//! plain `println!`, since it's a user-facing progress report rather
//! than a log line (§11). The same counts also go out as `tracing::debug!`
//! spans for anyone running with `--verbose`.

use std::path::Path;

use crate::commands::common::compile_source;
use crate::error::Result;

pub fn run(input: &Path, output: &Path) -> Result<()> {
    println!("Reading {}...", input.display());
    let source = std::fs::read_to_string(input)?;
    tracing::debug!(path = %input.display(), bytes = source.len(), "read source file");

    let unit = compile_source(&source)?;
    println!("Lexed {} token(s)", unit.tokens.len());
    println!("Parsed {} top-level statement(s)", unit.program.body.len());
    println!("Generated {} function(s)", unit.module.functions.len());

    let listing = rplus::emit(&unit.module);
    std::fs::write(output, &listing)?;
    println!("Wrote {} ({} byte(s))", output.display(), listing.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn compiles_a_fixture_file_and_writes_a_listing() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        writeln!(input, "function f(){{ return 1+2*3; }} f();").unwrap();
        let output = tempfile::NamedTempFile::new().unwrap();

        run(input.path(), output.path()).unwrap();

        let contents = std::fs::read_to_string(output.path()).unwrap();
        assert!(contents.contains("function f() {"));
        assert!(contents.contains("function <script>() {"));
    }
}
