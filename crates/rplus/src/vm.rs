//! Stack-based bytecode virtual machine.
//!
//! Executes a [`BytecodeModule`] with a flat fetch-decode-execute loop: one
//! operand value stack shared by every call frame, one instruction pointer
//! per frame, arithmetic through `f64`. This is the primary backend named
//! in §4.4; `register_vm::RegisterVm` conforms to the same observable
//! behavior over the same bytecode.

use crate::bytecode::{BytecodeModule, Opcode};
use crate::error::{Error, Result};
use crate::operators;
use crate::value::Value;

/// Default capacity of the operand value stack (§4.4: "a fixed-capacity
/// value stack (default 256 `Value`s)").
pub const DEFAULT_STACK_CAPACITY: usize = 256;

/// Capacity of each frame's variable-slot storage. Mirrors the compiler's
/// `MAX_REGISTERS`: the monotonic counter that allocates both expression
/// result registers and named-variable slots never exceeds this bound, so
/// a frame's slot array is sized to match rather than growing dynamically.
const LOCALS_CAPACITY: usize = 256;

struct CallFrame {
    function: usize,
    ip: usize,
    locals: Vec<Value>,
}

impl CallFrame {
    fn new(function: usize) -> Self {
        CallFrame {
            function,
            ip: 0,
            locals: vec![Value::Nil; LOCALS_CAPACITY],
        }
    }
}

/// The stack-based virtual machine.
///
/// A single instance is reusable across calls to [`StackVm::execute`];
/// `is_running`/`has_error` reflect the outcome of the most recent call.
pub struct StackVm {
    stack: Vec<Value>,
    stack_capacity: usize,
    frames: Vec<CallFrame>,
    running: bool,
    error: Option<Error>,
}

impl StackVm {
    pub fn new() -> Self {
        Self::with_stack_capacity(DEFAULT_STACK_CAPACITY)
    }

    pub fn with_stack_capacity(capacity: usize) -> Self {
        StackVm {
            stack: Vec::new(),
            stack_capacity: capacity,
            frames: Vec::new(),
            running: false,
            error: None,
        }
    }

    /// Whether the VM is mid-execution. False both before the first
    /// `execute` call and after the most recent one has returned.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the most recent `execute` call recorded a runtime error.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Execute the script function (index 0) of `module` to completion.
    ///
    /// Resets all runtime state first, so a `StackVm` can be reused across
    /// unrelated modules. Returns the value `Exit` receives.
    pub fn execute(&mut self, module: &BytecodeModule) -> Result<Value> {
        self.stack.clear();
        self.frames.clear();
        self.error = None;
        self.running = true;
        self.frames.push(CallFrame::new(0));

        let result = self.run(module);
        self.running = false;

        if let Err(ref err) = result {
            tracing::warn!(error = %err, "stack vm halted with a runtime error");
            self.error = Some(err.clone());
        }
        result
    }

    fn push(&mut self, value: Value, pc: usize) -> Result<()> {
        if self.stack.len() >= self.stack_capacity {
            return Err(Error::runtime("Stack overflow", pc));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, pc: usize) -> Result<Value> {
        self.stack
            .pop()
            .ok_or_else(|| Error::runtime("Stack underflow", pc))
    }

    fn binary(&mut self, pc: usize, f: impl Fn(&Value, &Value, usize) -> Result<Value>) -> Result<()> {
        let right = self.pop(pc)?;
        let left = self.pop(pc)?;
        let result = f(&left, &right, pc)?;
        self.push(result, pc)
    }

    fn compare(&mut self, pc: usize, f: impl Fn(&Value, &Value, usize) -> Result<bool>) -> Result<()> {
        let right = self.pop(pc)?;
        let left = self.pop(pc)?;
        let result = f(&left, &right, pc)?;
        self.push(Value::Bool(result), pc)
    }

    fn run(&mut self, module: &BytecodeModule) -> Result<Value> {
        loop {
            let (fn_idx, ip) = {
                let frame = self
                    .frames
                    .last()
                    .expect("call stack is never empty while running");
                (frame.function, frame.ip)
            };
            let function = &module.functions[fn_idx];
            let op = function.instructions[ip];
            self.frames.last_mut().unwrap().ip += 1;

            tracing::debug!(pc = ip, function = %function.name, ?op, "stack vm dispatch");

            match op {
                Opcode::LoadConst(k) => {
                    let value = module.constants[k as usize].clone();
                    self.push(value, ip)?;
                }
                Opcode::LoadVar(slot) => {
                    let value = self.frames.last().unwrap().locals[slot as usize].clone();
                    self.push(value, ip)?;
                }
                Opcode::StoreVar(slot) => {
                    let value = self.pop(ip)?;
                    self.frames.last_mut().unwrap().locals[slot as usize] = value;
                }
                Opcode::DefineGlobal(_)
                | Opcode::GetGlobal(_)
                | Opcode::SetGlobal(_)
                | Opcode::GetLocal(_)
                | Opcode::SetLocal(_) => {
                    return Err(Error::runtime("Unknown opcode", ip));
                }

                Opcode::Add => self.binary(ip, operators::add)?,
                Opcode::Sub => self.binary(ip, operators::sub)?,
                Opcode::Mul => self.binary(ip, operators::mul)?,
                Opcode::Div => self.binary(ip, operators::div)?,
                Opcode::Mod => self.binary(ip, operators::rem)?,
                Opcode::Neg => {
                    let v = self.pop(ip)?;
                    let result = operators::neg(&v, ip)?;
                    self.push(result, ip)?;
                }

                Opcode::Equal => {
                    let right = self.pop(ip)?;
                    let left = self.pop(ip)?;
                    self.push(Value::Bool(operators::equal(&left, &right)), ip)?;
                }
                Opcode::NotEqual => {
                    let right = self.pop(ip)?;
                    let left = self.pop(ip)?;
                    self.push(Value::Bool(!operators::equal(&left, &right)), ip)?;
                }
                Opcode::Less => self.compare(ip, operators::less)?,
                Opcode::LessEqual => self.compare(ip, operators::less_equal)?,
                Opcode::Greater => self.compare(ip, operators::greater)?,
                Opcode::GreaterEqual => self.compare(ip, operators::greater_equal)?,

                Opcode::And => {
                    let right = self.pop(ip)?;
                    let left = self.pop(ip)?;
                    self.push(operators::and(&left, &right), ip)?;
                }
                Opcode::Or => {
                    let right = self.pop(ip)?;
                    let left = self.pop(ip)?;
                    self.push(operators::or(&left, &right), ip)?;
                }
                Opcode::Not => {
                    let v = self.pop(ip)?;
                    self.push(operators::not(&v), ip)?;
                }

                Opcode::Jump(target) => {
                    self.frames.last_mut().unwrap().ip = target as usize;
                }
                Opcode::JumpIfFalse(target) => {
                    let cond = self.pop(ip)?;
                    if !cond.is_truthy() {
                        self.frames.last_mut().unwrap().ip = target as usize;
                    }
                }
                Opcode::JumpIfTrue(target) => {
                    let cond = self.pop(ip)?;
                    if cond.is_truthy() {
                        self.frames.last_mut().unwrap().ip = target as usize;
                    }
                }
                Opcode::Loop(target) => {
                    self.frames.last_mut().unwrap().ip = target as usize;
                }

                Opcode::Call(func_idx, argc) => {
                    let func_idx = func_idx as usize;
                    let argc = argc as usize;
                    let callee = module
                        .functions
                        .get(func_idx)
                        .ok_or_else(|| Error::runtime("Invalid call target", ip))?;
                    if callee.param_count != argc {
                        return Err(Error::runtime(
                            format!(
                                "{}() takes {} argument(s), {} given",
                                callee.name, callee.param_count, argc
                            ),
                            ip,
                        ));
                    }
                    if self.stack.len() < argc {
                        return Err(Error::runtime("Stack underflow", ip));
                    }
                    let mut frame = CallFrame::new(func_idx);
                    let start = self.stack.len() - argc;
                    for (i, arg) in self.stack.drain(start..).enumerate() {
                        frame.locals[i] = arg;
                    }
                    self.frames.push(frame);
                }
                Opcode::Return => {
                    let retval = self.pop(ip)?;
                    self.frames.pop();
                    if self.frames.is_empty() {
                        return Err(Error::runtime("Return from empty call stack", ip));
                    }
                    self.push(retval, ip)?;
                }

                Opcode::Pop => {
                    self.pop(ip)?;
                }
                Opcode::Dup => {
                    let top = self
                        .stack
                        .last()
                        .cloned()
                        .ok_or_else(|| Error::runtime("Stack underflow", ip))?;
                    self.push(top, ip)?;
                }

                Opcode::NewArray(n) => {
                    let n = n as usize;
                    if self.stack.len() < n {
                        return Err(Error::runtime("Stack underflow", ip));
                    }
                    let start = self.stack.len() - n;
                    let items: Vec<Value> = self.stack.drain(start..).collect();
                    self.push(Value::Array(items), ip)?;
                }
                Opcode::IndexLoad => {
                    let index = self.pop(ip)?;
                    let array = self.pop(ip)?;
                    let result = index_load(&array, &index, ip)?;
                    self.push(result, ip)?;
                }
                Opcode::IndexStore => {
                    let value = self.pop(ip)?;
                    let index = self.pop(ip)?;
                    let mut array = self.pop(ip)?;
                    index_store(&mut array, &index, value, ip)?;
                    self.push(array, ip)?;
                }

                Opcode::Exit => {
                    let result = self.stack.pop().unwrap_or(Value::Nil);
                    if !self.stack.is_empty() {
                        return Err(Error::runtime("Value stack not empty at Exit", ip));
                    }
                    return Ok(result);
                }
            }
        }
    }
}

impl Default for StackVm {
    fn default() -> Self {
        Self::new()
    }
}

fn index_load(array: &Value, index: &Value, pc: usize) -> Result<Value> {
    match (array, index) {
        (Value::Array(items), Value::Number(n)) => {
            let idx = *n as i64;
            if idx < 0 || idx as usize >= items.len() {
                return Err(Error::runtime(
                    format!("Memory read out of bounds: index {}", idx),
                    pc,
                ));
            }
            Ok(items[idx as usize].clone())
        }
        _ => Err(Error::runtime(
            format!("Cannot index {} with {}", array.type_name(), index.type_name()),
            pc,
        )),
    }
}

fn index_store(array: &mut Value, index: &Value, value: Value, pc: usize) -> Result<()> {
    match (array, index) {
        (Value::Array(items), Value::Number(n)) => {
            let idx = *n as i64;
            if idx < 0 || idx as usize >= items.len() {
                return Err(Error::runtime(
                    format!("Memory write out of bounds: index {}", idx),
                    pc,
                ));
            }
            items[idx as usize] = value;
            Ok(())
        }
        (other, _) => Err(Error::runtime(
            format!("Cannot index {} for assignment", other.type_name()),
            pc,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(src: &str) -> Result<Value> {
        let tokens = Lexer::new(src).tokenize();
        let program = Parser::new(tokens).parse().unwrap();
        let module = Compiler::compile(&program).unwrap();
        StackVm::new().execute(&module)
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(
            run("function f(){ return 1+2*3; } f();").unwrap(),
            Value::Number(7.0)
        );
    }

    #[test]
    fn for_loop_counts_to_five() {
        assert_eq!(
            run("var x = 0; for (x = 0; x < 5; x = x + 1) {} x;").unwrap(),
            Value::Number(5.0)
        );
    }

    #[test]
    fn recursive_factorial() {
        assert_eq!(
            run("function fact(n){ if (n<=1) return 1; return n*fact(n-1); } fact(5);").unwrap(),
            Value::Number(120.0)
        );
    }

    #[test]
    fn array_indexing() {
        assert_eq!(
            run("var a = [10,20,30]; a[1];").unwrap(),
            Value::Number(20.0)
        );
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(
            run(r#""ab\n" + "c";"#).unwrap(),
            Value::String("ab\nc".to_string())
        );
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let err = run("1/0;").unwrap_err();
        assert!(matches!(err, Error::Runtime { .. }));
        assert!(err.to_string().starts_with("Division by zero"));
    }

    #[test]
    fn call_stack_depth_is_restored_after_recursion() {
        let tokens = Lexer::new(
            "function fact(n){ if (n<=1) return 1; return n*fact(n-1); } fact(5);",
        )
        .tokenize();
        let program = Parser::new(tokens).parse().unwrap();
        let module = Compiler::compile(&program).unwrap();
        let mut vm = StackVm::new();
        vm.execute(&module).unwrap();
        assert_eq!(vm.frames.len(), 0);
    }

    #[test]
    fn has_error_implies_not_running() {
        let mut vm = StackVm::new();
        let tokens = Lexer::new("1/0;").tokenize();
        let program = Parser::new(tokens).parse().unwrap();
        let module = Compiler::compile(&program).unwrap();
        let _ = vm.execute(&module);
        assert!(vm.has_error());
        assert!(!vm.is_running());
    }
}
