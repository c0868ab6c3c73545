//! Native-code textual emitter.
//!
//! Produces the `.rpx` output §6 describes: one `function <name>() { ... }`
//! block per compiled function, each instruction rendered on its own line
//! with an inline comment naming the operand in human terms (a constant's
//! value, a call target's name, a jump's destination index) rather than
//! just its raw index. This is not a wire format — just the disassembly a
//! `compile` run writes to disk and a developer reads directly.

use std::fmt::Write as _;

use crate::bytecode::{BytecodeModule, Function, Opcode};
use crate::value::Value;

/// Renders every function in `module` as a textual listing.
pub fn emit(module: &BytecodeModule) -> String {
    let mut out = String::new();
    for function in &module.functions {
        emit_function(&mut out, module, function);
        out.push('\n');
    }
    out
}

fn emit_function(out: &mut String, module: &BytecodeModule, function: &Function) {
    let _ = writeln!(out, "function {}() {{", function.name);
    for (pc, op) in function.instructions.iter().enumerate() {
        let _ = writeln!(out, "    {:4}: {:<20} ; {}", pc, format_op(op), describe(module, op));
    }
    let _ = writeln!(out, "}}");
}

fn format_op(op: &Opcode) -> String {
    match op {
        Opcode::LoadConst(k) => format!("LoadConst {}", k),
        Opcode::LoadVar(s) => format!("LoadVar {}", s),
        Opcode::StoreVar(s) => format!("StoreVar {}", s),
        Opcode::DefineGlobal(s) => format!("DefineGlobal {}", s),
        Opcode::GetGlobal(s) => format!("GetGlobal {}", s),
        Opcode::SetGlobal(s) => format!("SetGlobal {}", s),
        Opcode::GetLocal(s) => format!("GetLocal {}", s),
        Opcode::SetLocal(s) => format!("SetLocal {}", s),
        Opcode::Add => "Add".to_string(),
        Opcode::Sub => "Sub".to_string(),
        Opcode::Mul => "Mul".to_string(),
        Opcode::Div => "Div".to_string(),
        Opcode::Mod => "Mod".to_string(),
        Opcode::Neg => "Neg".to_string(),
        Opcode::Equal => "Equal".to_string(),
        Opcode::NotEqual => "NotEqual".to_string(),
        Opcode::Less => "Less".to_string(),
        Opcode::LessEqual => "LessEqual".to_string(),
        Opcode::Greater => "Greater".to_string(),
        Opcode::GreaterEqual => "GreaterEqual".to_string(),
        Opcode::And => "And".to_string(),
        Opcode::Or => "Or".to_string(),
        Opcode::Not => "Not".to_string(),
        Opcode::Jump(t) => format!("Jump {}", t),
        Opcode::JumpIfFalse(t) => format!("JumpIfFalse {}", t),
        Opcode::JumpIfTrue(t) => format!("JumpIfTrue {}", t),
        Opcode::Loop(t) => format!("Loop {}", t),
        Opcode::Call(f, argc) => format!("Call {}, {}", f, argc),
        Opcode::Return => "Return".to_string(),
        Opcode::Pop => "Pop".to_string(),
        Opcode::Dup => "Dup".to_string(),
        Opcode::NewArray(n) => format!("NewArray {}", n),
        Opcode::IndexLoad => "IndexLoad".to_string(),
        Opcode::IndexStore => "IndexStore".to_string(),
        Opcode::Exit => "Exit".to_string(),
    }
}

/// A short, human-readable annotation for the instruction's operand.
fn describe(module: &BytecodeModule, op: &Opcode) -> String {
    match op {
        Opcode::LoadConst(k) => match module.constants.get(*k as usize) {
            Some(value) => describe_constant(value),
            None => "<invalid constant>".to_string(),
        },
        Opcode::Call(f, argc) => match module.functions.get(*f as usize) {
            Some(callee) => format!("call {}({} arg(s))", callee.name, argc),
            None => "<invalid call target>".to_string(),
        },
        Opcode::Jump(t) | Opcode::JumpIfFalse(t) | Opcode::JumpIfTrue(t) | Opcode::Loop(t) => {
            format!("-> {}", t)
        }
        Opcode::LoadVar(s) | Opcode::StoreVar(s) => format!("slot {}", s),
        _ => String::new(),
    }
}

fn describe_constant(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compile(src: &str) -> BytecodeModule {
        let tokens = Lexer::new(src).tokenize();
        let program = Parser::new(tokens).parse().unwrap();
        Compiler::compile(&program).unwrap()
    }

    #[test]
    fn emits_one_block_per_function() {
        let module = compile("function f(){ return 1; } f();");
        let text = emit(&module);
        assert!(text.contains("function f() {"));
        assert!(text.contains("function <script>() {"));
    }

    #[test]
    fn annotates_constants_and_call_targets() {
        let module = compile("function f(){ return 42; } f();");
        let text = emit(&module);
        assert!(text.contains("LoadConst"));
        assert!(text.contains("; 42"));
        assert!(text.contains("call f(0 arg(s))"));
    }
}
