//! R+ — a small C-family scripting language: lexer, parser, AST, bytecode
//! compiler, two virtual machine backends, and a native-code textual
//! emitter.
//!
//! # Quick start
//!
//! ```
//! use rplus::{Lexer, Parser, Compiler, StackVm};
//!
//! let source = "function f(){ return 1+2*3; } f();";
//! let tokens = Lexer::new(source).tokenize();
//! let program = Parser::new(tokens).parse().unwrap();
//! let module = Compiler::compile(&program).unwrap();
//! let result = StackVm::new().execute(&module).unwrap();
//! assert_eq!(result.to_string(), "7");
//! ```
//!
//! # Pipeline
//!
//! `source -> Lexer -> Vec<Token> -> Parser -> ast::Program -> Compiler ->
//! bytecode::BytecodeModule -> {StackVm, RegisterVm}`. `emitter::emit` turns
//! a compiled module into the textual `.rpx` listing the CLI writes to
//! disk; `optimize`'s passes sit between compile and emit as declared
//! no-ops.
//!
//! # Language
//!
//! C-family syntax: `var`/`function` declarations, `if`/`else`, `for`,
//! `while`, arithmetic/comparison/logical operators, array literals and
//! indexing, recursive function calls. See each module's doc comment for
//! the grammar and semantics it implements.
//!
//! # Not supported
//!
//! - Source-format-preserving pretty printing
//! - Debug symbols beyond per-instruction line numbers
//! - Unicode-aware lexing (identifiers and string content are byte/ASCII
//!   oriented)
//! - Garbage collection (the register VM's heap is bump-allocated and
//!   never compacts)
//! - Concurrent VM execution

mod ast;
mod bytecode;
mod compiler;
mod diagnostic;
mod emitter;
mod error;
mod lexer;
mod optimize;
mod operators;
mod parser;
mod register_vm;
mod token;
mod value;
mod vm;

pub use ast::{BinaryOp, Expr, Pos, Program, Stmt, UnaryOp};
pub use bytecode::{BytecodeModule, Function, Opcode};
pub use compiler::Compiler;
pub use diagnostic::{Diagnostic, Label, Span};
pub use emitter::emit;
pub use error::{Error, Result};
pub use lexer::Lexer;
pub use parser::Parser;
pub use register_vm::{RegisterVm, VmState, DEFAULT_HEAP_SIZE, DEFAULT_STACK_SIZE};
pub use token::{Token, TokenKind};
pub use value::Value;
pub use vm::{StackVm, DEFAULT_STACK_CAPACITY};

/// Which VM backend executes a compiled module. Both satisfy the same
/// observable contract (§8 of the design notes); they differ only in
/// internal representation (value stack vs. register file + byte heap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Stack,
    Register,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stack" => Ok(Backend::Stack),
            "register" => Ok(Backend::Register),
            other => Err(format!("unknown VM backend: {:?}", other)),
        }
    }
}

/// Runs a compiled module on the requested backend, bridging the two VMs'
/// otherwise-distinct APIs behind one call a CLI or test can make without
/// caring which backend it asked for.
pub fn run(module: &BytecodeModule, backend: Backend) -> Result<Value> {
    match backend {
        Backend::Stack => vm::StackVm::new().execute(module),
        Backend::Register => register_vm::RegisterVm::new().execute(module),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_from_str_accepts_both_names_case_insensitively() {
        assert_eq!("stack".parse::<Backend>().unwrap(), Backend::Stack);
        assert_eq!("REGISTER".parse::<Backend>().unwrap(), Backend::Register);
        assert!("quantum".parse::<Backend>().is_err());
    }

    #[test]
    fn run_dispatches_to_the_requested_backend() {
        let tokens = Lexer::new("1+1;").tokenize();
        let program = Parser::new(tokens).parse().unwrap();
        let module = Compiler::compile(&program).unwrap();
        assert_eq!(run(&module, Backend::Stack).unwrap(), Value::Number(2.0));
        assert_eq!(run(&module, Backend::Register).unwrap(), Value::Number(2.0));
    }
}
