//! CLI-level configuration.
//!
//! No persisted config file is required — the language has no project
//! manifest. `Options` collects the handful of real, user-visible knobs
//! the two VM backends expose (which backend to run, and their resource
//! limits), read from environment variables with hard-coded defaults
//! matching §4.4, the same way littrs's `Limits` configures its sandbox.

use std::str::FromStr;

use rplus::Backend;

use crate::error::{CliError, Result};

/// Runtime options for a `compile`/`interactive` invocation.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub backend: Backend,
    pub stack_capacity: usize,
    pub register_stack_size: usize,
    pub register_heap_size: usize,
}

impl Options {
    /// Reads `RPLUS_BACKEND`, `RPLUS_MAX_REGISTERS`, `RPLUS_STACK_SIZE`,
    /// and `RPLUS_HEAP_SIZE`, falling back to §4.4's defaults for any that
    /// are unset or unparseable.
    pub fn from_env() -> Result<Self> {
        let backend = match std::env::var("RPLUS_BACKEND") {
            Ok(value) => Backend::from_str(&value)
                .map_err(|err| CliError::Usage(format!("RPLUS_BACKEND: {}", err)))?,
            Err(_) => Backend::default(),
        };

        Ok(Options {
            backend,
            stack_capacity: env_usize("RPLUS_MAX_REGISTERS", rplus::DEFAULT_STACK_CAPACITY),
            register_stack_size: env_usize("RPLUS_STACK_SIZE", rplus::DEFAULT_STACK_SIZE),
            register_heap_size: env_usize("RPLUS_HEAP_SIZE", rplus::DEFAULT_HEAP_SIZE),
        })
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            backend: Backend::default(),
            stack_capacity: rplus::DEFAULT_STACK_CAPACITY,
            register_stack_size: rplus::DEFAULT_STACK_SIZE,
            register_heap_size: rplus::DEFAULT_HEAP_SIZE,
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_virtual_machine_defaults() {
        let options = Options::default();
        assert_eq!(options.backend, Backend::Stack);
        assert_eq!(options.stack_capacity, rplus::DEFAULT_STACK_CAPACITY);
        assert_eq!(options.register_heap_size, rplus::DEFAULT_HEAP_SIZE);
    }

    #[test]
    fn env_usize_falls_back_on_garbage() {
        std::env::remove_var("RPLUS_DOES_NOT_EXIST");
        assert_eq!(env_usize("RPLUS_DOES_NOT_EXIST", 42), 42);
    }
}
