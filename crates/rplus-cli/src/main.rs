//! `rplus` — the R+ language compiler and virtual machines.
//!
//! Dispatches between `compile`, `run`, and `interactive` mode per §6's
//! external interfaces: a `compile` subcommand (aliased by `-c` and by
//! giving a bare source file), a `run`/`-r` subcommand that executes the
//! compiled module on the configured backend, an `interactive`/`-i` REPL,
//! and a custom `-v`/`--version` flag that prints build-date-inclusive
//! version text.

mod commands;
mod config;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Options;
use error::{CliError, Result};

const DEFAULT_OUTPUT: &str = "output.rpx";

#[derive(Parser, Debug)]
#[command(name = "rplus", about = "The R+ language compiler and virtual machines")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Print version text (including build date) and exit.
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Enable debug-level tracing output (also settable via RPLUS_LOG).
    #[arg(long = "verbose", global = true, env = "RPLUS_LOG")]
    verbose: bool,

    /// Alias for the `compile` subcommand.
    #[arg(short = 'c', conflicts_with_all = ["interactive_flag", "run_flag"])]
    compile_flag: bool,

    /// Alias for the `interactive` subcommand.
    #[arg(short = 'i', long = "interactive", conflicts_with = "run_flag")]
    interactive_flag: bool,

    /// Alias for the `run` subcommand.
    #[arg(short = 'r', long = "run")]
    run_flag: bool,

    #[command(subcommand)]
    command: Option<Commands>,

    /// Source file to compile, when no subcommand is given.
    input: Option<PathBuf>,

    /// Output `.rpx` file (default: `output.rpx`).
    output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a source file to a `.rpx` listing.
    Compile {
        input: PathBuf,
        output: Option<PathBuf>,
    },
    /// Compile and execute a source file, printing its result.
    Run { input: PathBuf },
    /// Read lines from stdin until `exit`/`quit`, compiling each.
    Interactive,
}

fn main() {
    let cli = Cli::parse();

    if cli.version {
        print_version();
        return;
    }

    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = Options::from_env()?;

    let interactive = cli.interactive_flag || matches!(cli.command, Some(Commands::Interactive));
    if interactive {
        return commands::interactive::run_stdio();
    }

    let run_mode = cli.run_flag || matches!(cli.command, Some(Commands::Run { .. }));
    if run_mode {
        let input = match cli.command {
            Some(Commands::Run { input }) => input,
            _ => cli.input.ok_or_else(|| {
                let flag = if cli.run_flag { "-r" } else { "run" };
                CliError::Usage(format!("{} requires an input file", flag))
            })?,
        };
        return commands::run::run(&input, &options);
    }

    let (input, output) = match cli.command {
        Some(Commands::Compile { input, output }) => (input, output),
        Some(Commands::Run { .. }) => unreachable!("handled above"),
        Some(Commands::Interactive) => unreachable!("handled above"),
        None => {
            let input = cli.input.ok_or_else(|| {
                let flag = if cli.compile_flag { "-c" } else { "compile" };
                CliError::Usage(format!("{} requires an input file", flag))
            })?;
            (input, cli.output)
        }
    };
    let output = output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    commands::compile::run(&input, &output)
}

fn print_version() {
    println!(
        "rplus {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("RPLUS_BUILD_DATE")
    );
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_new("debug")
    } else {
        EnvFilter::try_from_default_env()
    }
    .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_argument_parses_as_implicit_compile() {
        let cli = Cli::parse_from(["rplus", "in.rp"]);
        assert_eq!(cli.input, Some(PathBuf::from("in.rp")));
        assert!(cli.command.is_none());
    }

    #[test]
    fn compile_subcommand_parses() {
        let cli = Cli::parse_from(["rplus", "compile", "in.rp", "out.rpx"]);
        assert!(matches!(cli.command, Some(Commands::Compile { .. })));
    }

    #[test]
    fn interactive_flag_and_subcommand_both_select_interactive_mode() {
        let cli = Cli::parse_from(["rplus", "-i"]);
        assert!(cli.interactive_flag);

        let cli = Cli::parse_from(["rplus", "interactive"]);
        assert!(matches!(cli.command, Some(Commands::Interactive)));
    }

    #[test]
    fn version_flag_parses() {
        let cli = Cli::parse_from(["rplus", "-v"]);
        assert!(cli.version);
    }

    #[test]
    fn run_flag_and_subcommand_both_select_run_mode() {
        let cli = Cli::parse_from(["rplus", "-r", "in.rp"]);
        assert!(cli.run_flag);
        assert_eq!(cli.input, Some(PathBuf::from("in.rp")));

        let cli = Cli::parse_from(["rplus", "run", "in.rp"]);
        assert!(matches!(cli.command, Some(Commands::Run { .. })));
    }
}
