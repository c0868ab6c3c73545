//! The `run` subcommand (and its `-r` alias): compile a source file and
//! execute it on the configured backend, printing the result.
//!
//! This is what actually consumes `config::Options` — the backend choice
//! and the VM resource limits only affect behavior once something calls
//! `StackVm`/`RegisterVm::execute`, which `compile` and `interactive`
//! never do.

use std::path::Path;

use rplus::{Backend, RegisterVm, StackVm};

use crate::commands::common::compile_source;
use crate::config::Options;
use crate::error::Result;

pub fn run(input: &Path, options: &Options) -> Result<()> {
    let source = std::fs::read_to_string(input)?;
    let unit = compile_source(&source)?;
    tracing::debug!(backend = ?options.backend, "executing compiled module");

    let result = match options.backend {
        Backend::Stack => StackVm::with_stack_capacity(options.stack_capacity)
            .execute(&unit.module)?,
        Backend::Register => {
            RegisterVm::with_limits(options.register_heap_size, options.register_stack_size)
                .execute(&unit.module)?
        }
    };

    println!("{}", result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn runs_a_fixture_file_on_the_default_backend() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        writeln!(input, "function f(){{ return 1+2*3; }} f();").unwrap();

        run(input.path(), &Options::default()).unwrap();
    }

    #[test]
    fn runs_on_the_register_backend_when_selected() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        writeln!(input, "1+1;").unwrap();

        let options = Options {
            backend: Backend::Register,
            ..Options::default()
        };
        run(input.path(), &options).unwrap();
    }
}
