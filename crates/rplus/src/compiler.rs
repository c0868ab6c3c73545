//! AST-to-bytecode lowering.
//!
//! Walks the AST once, maintaining a stack of lexical `FunctionScope`s, a
//! per-function monotonic register counter, and the module's label table
//! for forward jumps. Each function is compiled into its own
//! `bytecode::Function`; the top-level program compiles into function 0
//! (the "script" function), whose last instruction is `Exit` rather than
//! `Return`.

use crate::ast::*;
use crate::bytecode::{BytecodeModule, Function, Opcode};
use crate::error::{Error, Result};
use crate::value::Value;

/// Upper bound on the register/slot counter within a single function.
/// Growing past it is a compile error, not a silent wraparound.
const MAX_REGISTERS: u32 = 256;

const SCRIPT_FUNCTION: &str = "<script>";

struct FunctionScope {
    slots: Vec<(String, u32)>,
}

impl FunctionScope {
    fn new() -> Self {
        FunctionScope { slots: Vec::new() }
    }
}

pub struct Compiler {
    module: BytecodeModule,
    scopes: Vec<FunctionScope>,
    current: usize,
    register_counter: u32,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            module: BytecodeModule::new(),
            scopes: Vec::new(),
            current: 0,
            register_counter: 0,
        }
    }

    pub fn compile(program: &Program) -> Result<BytecodeModule> {
        let mut compiler = Compiler::new();
        let script = Function::new(SCRIPT_FUNCTION, 0);
        compiler.module.add_function(script);
        compiler.scopes.push(FunctionScope::new());

        let len = program.body.len();
        for (i, stmt) in program.body.iter().enumerate() {
            let is_last = i + 1 == len;
            if is_last {
                if let Stmt::ExprStmt { expr, .. } = stmt {
                    compiler.compile_expr(expr)?;
                    continue;
                }
            }
            compiler.compile_stmt(stmt)?;
        }

        let line = program.body.last().map(|s| s.pos().line).unwrap_or(1);
        compiler.emit(Opcode::Exit, line);
        compiler.scopes.pop();

        compiler.module.finalize()?;
        Ok(compiler.module)
    }

    // --- bookkeeping ---

    fn emit(&mut self, op: Opcode, line: usize) -> usize {
        self.module.functions[self.current].emit(op, line)
    }

    fn alloc_register(&mut self, line: usize) -> Result<u32> {
        if self.register_counter >= MAX_REGISTERS {
            return Err(Error::compile("Register overflow", line));
        }
        let slot = self.register_counter;
        self.register_counter += 1;
        Ok(slot)
    }

    fn allocate_variable(&mut self, name: &str, line: usize) -> Result<u32> {
        let slot = self.alloc_register(line)?;
        self.scopes
            .last_mut()
            .expect("no active scope")
            .slots
            .push((name.to_string(), slot));
        Ok(slot)
    }

    fn lookup_variable(&self, name: &str) -> Option<u32> {
        for scope in self.scopes.iter().rev() {
            for (n, slot) in scope.slots.iter().rev() {
                if n == name {
                    return Some(*slot);
                }
            }
        }
        None
    }

    fn here(&self) -> usize {
        self.module.functions[self.current].len()
    }

    /// Emits a jump-family instruction with a placeholder target,
    /// recording the patch so `BytecodeModule::finalize` can rewrite it
    /// once the label is marked.
    fn emit_jump(&mut self, make: impl FnOnce(u32) -> Opcode, label: u32, line: usize) {
        let idx = self.emit(make(u32::MAX), line);
        self.module.record_patch(self.current, idx, label);
    }

    fn mark_label(&mut self, label: u32) {
        let pc = self.here();
        self.module.mark_label(label, self.current, pc);
    }

    // --- statements ---

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Block { stmts, .. } => {
                self.scopes.push(FunctionScope::new());
                for s in stmts {
                    self.compile_stmt(s)?;
                }
                self.scopes.pop();
                Ok(())
            }
            Stmt::ExprStmt { expr, pos } => {
                self.compile_expr(expr)?;
                self.emit(Opcode::Pop, pos.line);
                Ok(())
            }
            Stmt::VarDecl {
                declarators, pos, ..
            } => {
                for decl in declarators {
                    match &decl.init {
                        Some(init) => self.compile_expr(init)?,
                        None => {
                            let k = self.module.add_constant(Value::Nil);
                            self.emit(Opcode::LoadConst(k), pos.line);
                        }
                    }
                    let slot = self.allocate_variable(&decl.name, pos.line)?;
                    self.emit(Opcode::StoreVar(slot), pos.line);
                    self.emit(Opcode::Pop, pos.line);
                }
                Ok(())
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                pos,
            } => {
                self.compile_expr(cond)?;
                let l_false = self.module.gen_label();
                self.emit_jump(Opcode::JumpIfFalse, l_false, pos.line);
                self.compile_stmt(then_branch)?;
                let l_end = self.module.gen_label();
                self.emit_jump(Opcode::Jump, l_end, pos.line);
                self.mark_label(l_false);
                if let Some(else_branch) = else_branch {
                    self.compile_stmt(else_branch)?;
                }
                self.mark_label(l_end);
                Ok(())
            }
            Stmt::While { cond, body, pos } => {
                let l_loop = self.module.gen_label();
                self.mark_label(l_loop);
                self.compile_expr(cond)?;
                let l_exit = self.module.gen_label();
                self.emit_jump(Opcode::JumpIfFalse, l_exit, pos.line);
                self.compile_stmt(body)?;
                self.emit_jump(Opcode::Jump, l_loop, pos.line);
                self.mark_label(l_exit);
                Ok(())
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
                pos,
            } => {
                self.scopes.push(FunctionScope::new());
                if let Some(init) = init {
                    self.compile_stmt(init)?;
                }
                let l_loop = self.module.gen_label();
                self.mark_label(l_loop);

                // A missing condition means "loop forever": no `JumpIfFalse`
                // is emitted at all, matching the unconditional `Jump Lloop`
                // the source falls back to.
                let l_exit = cond.as_ref().map(|_| self.module.gen_label());
                if let Some(cond) = cond {
                    self.compile_expr(cond)?;
                    self.emit_jump(Opcode::JumpIfFalse, l_exit.unwrap(), pos.line);
                }

                self.compile_stmt(body)?;

                if let Some(update) = update {
                    self.compile_expr(update)?;
                    self.emit(Opcode::Pop, pos.line);
                }

                self.emit_jump(Opcode::Jump, l_loop, pos.line);
                if let Some(l_exit) = l_exit {
                    self.mark_label(l_exit);
                }
                self.scopes.pop();
                Ok(())
            }
            Stmt::Return { arg, pos } => {
                match arg {
                    Some(expr) => self.compile_expr(expr)?,
                    None => {
                        let k = self.module.add_constant(Value::Nil);
                        self.emit(Opcode::LoadConst(k), pos.line);
                    }
                }
                self.emit(Opcode::Return, pos.line);
                Ok(())
            }
            Stmt::FunctionDecl {
                name,
                params,
                body,
                pos,
                ..
            } => self.compile_function_decl(name, params, body, pos.line),

            Stmt::Empty { .. } => Ok(()),

            Stmt::DoWhile { pos, .. }
            | Stmt::ForIn { pos, .. }
            | Stmt::ForOf { pos, .. }
            | Stmt::Switch { pos, .. }
            | Stmt::Break { pos, .. }
            | Stmt::Continue { pos, .. }
            | Stmt::Throw { pos, .. }
            | Stmt::Try { pos, .. }
            | Stmt::ClassDecl { pos, .. }
            | Stmt::Labeled { pos, .. }
            | Stmt::Debugger { pos } => Err(Error::compile("Unsupported statement", pos.line)),
        }
    }

    fn compile_function_decl(
        &mut self,
        name: &str,
        params: &[String],
        body: &Stmt,
        line: usize,
    ) -> Result<()> {
        let func_idx = self.module.add_function(Function::new(name, params.len()));

        let saved_current = self.current;
        let saved_scopes = std::mem::replace(&mut self.scopes, vec![FunctionScope::new()]);
        let saved_counter = self.register_counter;
        self.current = func_idx;
        self.register_counter = 0;

        for param in params {
            self.allocate_variable(param, line)?;
        }
        self.compile_stmt(body)?;

        let needs_terminator = !matches!(
            self.module.functions[self.current].instructions.last(),
            Some(Opcode::Return)
        );
        if needs_terminator {
            let k = self.module.add_constant(Value::Nil);
            self.emit(Opcode::LoadConst(k), line);
            self.emit(Opcode::Return, line);
        }

        self.scopes = saved_scopes;
        self.current = saved_current;
        self.register_counter = saved_counter;
        Ok(())
    }

    // --- expressions ---

    fn compile_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Literal { kind, text, pos } => {
                let value = literal_value(*kind, text);
                let k = self.module.add_constant(value);
                self.emit(Opcode::LoadConst(k), pos.line);
                self.alloc_register(pos.line)?;
                Ok(())
            }
            Expr::Identifier { name, pos } => {
                let slot = self.lookup_variable(name).ok_or_else(|| {
                    Error::compile(format!("Undefined variable: {}", name), pos.line)
                })?;
                self.emit(Opcode::LoadVar(slot), pos.line);
                self.alloc_register(pos.line)?;
                Ok(())
            }
            Expr::Binary {
                op,
                left,
                right,
                pos,
            } => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                self.emit(binary_opcode(*op), pos.line);
                self.alloc_register(pos.line)?;
                Ok(())
            }
            Expr::Unary {
                op, operand, pos, ..
            } => {
                self.compile_expr(operand)?;
                let opcode = match op {
                    UnaryOp::Neg => Opcode::Neg,
                    UnaryOp::Not => Opcode::Not,
                };
                self.emit(opcode, pos.line);
                self.alloc_register(pos.line)?;
                Ok(())
            }
            Expr::Call { callee, args, pos } => {
                let name = match callee.as_ref() {
                    Expr::Identifier { name, .. } => name,
                    _ => {
                        return Err(Error::compile(
                            "Call target must be a function name",
                            pos.line,
                        ))
                    }
                };
                for arg in args {
                    self.compile_expr(arg)?;
                }
                let func_idx = self.module.function_index(name).ok_or_else(|| {
                    Error::compile(format!("Undefined function: {}", name), pos.line)
                })?;
                self.emit(Opcode::Call(func_idx as u32, args.len() as u32), pos.line);
                self.alloc_register(pos.line)?;
                Ok(())
            }
            Expr::Index { array, index, pos } => {
                self.compile_expr(array)?;
                self.compile_expr(index)?;
                self.emit(Opcode::IndexLoad, pos.line);
                self.alloc_register(pos.line)?;
                Ok(())
            }
            Expr::Assign {
                target, value, pos, ..
            } => {
                let name = match target.as_ref() {
                    Expr::Identifier { name, .. } => name,
                    _ => return Err(Error::compile("Invalid assignment target", pos.line)),
                };
                self.compile_expr(value)?;
                self.emit(Opcode::Dup, pos.line);
                let slot = match self.lookup_variable(name) {
                    Some(slot) => slot,
                    None => self.allocate_variable(name, pos.line)?,
                };
                self.emit(Opcode::StoreVar(slot), pos.line);
                Ok(())
            }
            Expr::ArrayLit { elements, pos } => {
                for element in elements {
                    self.compile_expr(element)?;
                }
                self.emit(Opcode::NewArray(elements.len() as u32), pos.line);
                self.alloc_register(pos.line)?;
                Ok(())
            }
            Expr::Conditional { pos, .. }
            | Expr::Member { pos, .. }
            | Expr::ObjectLit { pos, .. }
            | Expr::Lambda { pos, .. }
            | Expr::This { pos }
            | Expr::New { pos, .. } => Err(Error::compile("Unsupported expression", pos.line)),
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

fn literal_value(kind: LiteralKind, text: &str) -> Value {
    match kind {
        LiteralKind::Number => Value::Number(parse_number(text)),
        LiteralKind::Float => Value::Number(text.parse::<f64>().unwrap_or(f64::NAN)),
        LiteralKind::String => Value::String(text.to_string()),
        LiteralKind::Bool => Value::Bool(text == "true"),
        LiteralKind::Null => Value::Nil,
    }
}

fn parse_number(text: &str) -> f64 {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map(|n| n as f64)
            .unwrap_or(0.0)
    } else {
        text.parse::<f64>().unwrap_or(f64::NAN)
    }
}

fn binary_opcode(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Sub => Opcode::Sub,
        BinaryOp::Mul => Opcode::Mul,
        BinaryOp::Div => Opcode::Div,
        BinaryOp::Mod => Opcode::Mod,
        BinaryOp::Eq => Opcode::Equal,
        BinaryOp::NotEq => Opcode::NotEqual,
        BinaryOp::Less => Opcode::Less,
        BinaryOp::LessEq => Opcode::LessEqual,
        BinaryOp::Greater => Opcode::Greater,
        BinaryOp::GreaterEq => Opcode::GreaterEqual,
        BinaryOp::And => Opcode::And,
        BinaryOp::Or => Opcode::Or,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compile(src: &str) -> Result<BytecodeModule> {
        let tokens = Lexer::new(src).tokenize();
        let program = Parser::new(tokens).parse().unwrap();
        Compiler::compile(&program)
    }

    #[test]
    fn arithmetic_expression_compiles() {
        let module = compile("1 + 2 * 3;").unwrap();
        let script = &module.functions[0];
        assert!(matches!(script.instructions.last(), Some(Opcode::Exit)));
    }

    #[test]
    fn undefined_variable_is_a_compile_error() {
        let err = compile("x;").unwrap_err();
        assert_eq!(err.to_string(), "Undefined variable: x at line 1");
    }

    #[test]
    fn undefined_function_is_a_compile_error() {
        let err = compile("f();").unwrap_err();
        assert_eq!(err.to_string(), "Undefined function: f at line 1");
    }

    #[test]
    fn function_without_explicit_return_gets_nil_return_appended() {
        let module = compile("function f() { 1; }").unwrap();
        let f = module.function_index("f").unwrap();
        assert!(matches!(
            module.functions[f].instructions.last(),
            Some(Opcode::Return)
        ));
    }

    #[test]
    fn recursive_call_resolves() {
        let module = compile(
            "function fact(n) { if (n<=1) return 1; return n*fact(n-1); } fact(5);",
        )
        .unwrap();
        assert!(module.function_index("fact").is_some());
    }

    #[test]
    fn for_loop_without_condition_has_no_conditional_jump() {
        let module = compile("for (;;) {}").unwrap();
        let script = &module.functions[0];
        assert!(!script
            .instructions
            .iter()
            .any(|op| matches!(op, Opcode::JumpIfFalse(_))));
    }

    #[test]
    fn register_overflow_is_reported() {
        let mut src = String::new();
        for i in 0..300 {
            src.push_str(&format!("var v{} = {};\n", i, i));
        }
        let err = compile(&src).unwrap_err();
        assert!(err.to_string().starts_with("Register overflow"));
    }
}
