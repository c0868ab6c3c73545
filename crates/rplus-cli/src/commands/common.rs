//! Shared helpers for the `compile` and `interactive` commands.

use rplus::{BytecodeModule, Compiler, Lexer, Parser, Program, Token};

use crate::error::Result;

/// The token stream, AST, and bytecode for one source string, plus the
/// counts the five-step progress log (§6) reports.
pub struct CompiledUnit {
    pub tokens: Vec<Token>,
    pub program: Program,
    pub module: BytecodeModule,
}

/// Lexes, parses, and compiles `source`. Each phase either succeeds fully
/// or the whole pipeline aborts — §7's "all errors are fail-fast".
pub fn compile_source(source: &str) -> Result<CompiledUnit> {
    let tokens = Lexer::new(source).tokenize();
    tracing::debug!(count = tokens.len(), "lexed source");

    let program = Parser::new(tokens.clone()).parse()?;
    tracing::debug!(statements = program.body.len(), "parsed program");

    let module = Compiler::compile(&program)?;
    tracing::debug!(functions = module.functions.len(), "compiled bytecode");

    Ok(CompiledUnit {
        tokens,
        program,
        module,
    })
}
