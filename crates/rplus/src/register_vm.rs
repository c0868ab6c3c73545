//! Register-based bytecode virtual machine.
//!
//! A second, conforming backend over the same [`BytecodeModule`] the stack
//! VM executes (§4.4: "two dispatch styles ... identical observable
//! behavior"). Where `vm::StackVm` carries a `Vec<Value>` operand stack and
//! treats numbers as `f64`, this backend carries a 16-slot register file, a
//! byte-addressable bump-allocated heap, and a byte-addressed operand
//! stack, and treats numeric arithmetic as unsigned/signed 64-bit —
//! matching §4.4's description of the register flavor.
//!
//! **Bridging note**: the shared bytecode format addresses variables by an
//! abstract slot (`LoadVar`/`StoreVar`), not by one of the 16 physical
//! registers — a function can use more slots than there are registers
//! (`MAX_REGISTERS` is 256). Each call frame's variable slots therefore
//! live in a dedicated heap region (`LOCALS_CAPACITY` encoded values,
//! allocated on `Call` and never reclaimed — the heap's bump allocator has
//! no compaction, so deep recursion can exhaust it; this is the same
//! known limitation §9 calls out for the heap in general). The 16
//! registers proper are used as scratch space during arithmetic/compare
//! dispatch and as the flags register (15), exactly as §4.4 describes.
//! Jump targets in the shared bytecode already point at the instruction
//! to resume at (the same convention `vm::StackVm` uses), so this VM
//! advances `pc` before dispatch and does not apply the `target - 1`
//! encoding the original register machine needed for its own raw
//! instruction stream.

use crate::bytecode::{BytecodeModule, Opcode};
use crate::error::{Error, Result};
use crate::value::Value;

pub const REGISTER_COUNT: usize = 16;
pub const FLAGS_REGISTER: usize = 15;
pub const DEFAULT_HEAP_SIZE: usize = 64 * 1024;
pub const DEFAULT_STACK_SIZE: usize = 64 * 1024;

/// Encoded-value width on the operand stack: an 8-byte tag word (only the
/// low byte is meaningful) followed by an 8-byte payload word, kept 8-byte
/// aligned per §4.4's stack discipline.
const TAG_NIL: u64 = 0;
const TAG_BOOL: u64 = 1;
const TAG_NUMBER: u64 = 2;
const TAG_STRING: u64 = 3;
const TAG_ARRAY: u64 = 4;

/// Encoded-value slots per call frame, mirroring `vm::LOCALS_CAPACITY` /
/// the compiler's `MAX_REGISTERS`.
const LOCALS_CAPACITY: usize = 256;
const ENCODED_VALUE_SIZE: usize = 16;
const FRAME_SIZE: usize = LOCALS_CAPACITY * ENCODED_VALUE_SIZE;

/// A snapshot of the VM's control state, for `get_state`/`set_state`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VmState {
    pub pc: usize,
    pub sp: usize,
    pub fp: usize,
    pub halt: bool,
    pub registers: [u64; REGISTER_COUNT],
}

struct Frame {
    function: usize,
    pc: usize,
    locals_base: usize,
}

/// The register-based virtual machine.
pub struct RegisterVm {
    registers: [u64; REGISTER_COUNT],
    heap: Vec<u8>,
    heap_alloc_ptr: usize,
    stack: Vec<u8>,
    sp: usize,
    fp: usize,
    call_stack: Vec<(usize, usize)>,
    frames: Vec<Frame>,
    halt: bool,
    error: Option<Error>,
    trace: bool,
}

impl RegisterVm {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_HEAP_SIZE, DEFAULT_STACK_SIZE)
    }

    pub fn with_limits(heap_size: usize, stack_size: usize) -> Self {
        RegisterVm {
            registers: [0; REGISTER_COUNT],
            heap: vec![0; heap_size],
            heap_alloc_ptr: 0,
            stack: vec![0; stack_size],
            sp: 0,
            fp: 0,
            call_stack: Vec::new(),
            frames: Vec::new(),
            halt: false,
            error: None,
            trace: false,
        }
    }

    pub fn set_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn get_state(&self) -> VmState {
        let pc = self.frames.last().map(|f| f.pc).unwrap_or(0);
        VmState {
            pc,
            sp: self.sp,
            fp: self.fp,
            halt: self.halt,
            registers: self.registers,
        }
    }

    pub fn set_state(&mut self, state: VmState) {
        self.sp = state.sp;
        self.fp = state.fp;
        self.halt = state.halt;
        self.registers = state.registers;
        if let Some(frame) = self.frames.last_mut() {
            frame.pc = state.pc;
        }
    }

    pub fn dump_registers(&self) -> String {
        let mut out = String::new();
        for (i, r) in self.registers.iter().enumerate() {
            if i == FLAGS_REGISTER {
                out.push_str(&format!("r15(flags)={}\n", r));
            } else {
                out.push_str(&format!("r{}={}\n", i, r));
            }
        }
        out
    }

    pub fn dump_stack(&self, from: usize, to: usize) -> String {
        format!("{:02x?}", &self.stack[from.min(self.sp)..to.min(self.sp)])
    }

    pub fn dump_heap(&self, from: usize, to: usize) -> String {
        format!(
            "{:02x?}",
            &self.heap[from.min(self.heap_alloc_ptr)..to.min(self.heap_alloc_ptr)]
        )
    }

    // -- memory discipline --

    fn allocate(&mut self, n: usize, pc: usize) -> Result<usize> {
        if self.heap_alloc_ptr + n > self.heap.len() {
            return Err(Error::runtime("Heap out of memory", pc));
        }
        let addr = self.heap_alloc_ptr;
        self.heap_alloc_ptr += n;
        for b in &mut self.heap[addr..addr + n] {
            *b = 0;
        }
        Ok(addr)
    }

    fn deallocate(&mut self, addr: usize, n: usize, pc: usize) -> Result<()> {
        if addr + n > self.heap.len() {
            return Err(Error::runtime("Memory write out of bounds", pc));
        }
        for b in &mut self.heap[addr..addr + n] {
            *b = 0;
        }
        Ok(())
    }

    fn push_u64(&mut self, value: u64, pc: usize) -> Result<()> {
        if self.sp + 8 > self.stack.len() {
            return Err(Error::runtime("Stack overflow", pc));
        }
        self.stack[self.sp..self.sp + 8].copy_from_slice(&value.to_le_bytes());
        self.sp += 8;
        Ok(())
    }

    fn pop_u64(&mut self, pc: usize) -> Result<u64> {
        if self.sp < 8 {
            return Err(Error::runtime("Stack underflow", pc));
        }
        self.sp -= 8;
        let bytes: [u8; 8] = self.stack[self.sp..self.sp + 8].try_into().unwrap();
        Ok(u64::from_le_bytes(bytes))
    }

    // -- value encoding --

    fn encode(&mut self, value: &Value, pc: usize) -> Result<(u64, u64)> {
        match value {
            Value::Nil => Ok((TAG_NIL, 0)),
            Value::Bool(b) => Ok((TAG_BOOL, *b as u64)),
            Value::Number(n) => Ok((TAG_NUMBER, n.to_bits())),
            Value::String(s) => {
                let bytes = s.as_bytes();
                let addr = self.allocate(8 + bytes.len(), pc)?;
                self.heap[addr..addr + 8].copy_from_slice(&(bytes.len() as u64).to_le_bytes());
                self.heap[addr + 8..addr + 8 + bytes.len()].copy_from_slice(bytes);
                Ok((TAG_STRING, addr as u64))
            }
            Value::Array(items) => {
                let addr = self.allocate(8 + items.len() * ENCODED_VALUE_SIZE, pc)?;
                self.heap[addr..addr + 8].copy_from_slice(&(items.len() as u64).to_le_bytes());
                let mut offset = addr + 8;
                for item in items {
                    let (tag, payload) = self.encode(item, pc)?;
                    self.heap[offset..offset + 8].copy_from_slice(&tag.to_le_bytes());
                    self.heap[offset + 8..offset + 16].copy_from_slice(&payload.to_le_bytes());
                    offset += ENCODED_VALUE_SIZE;
                }
                Ok((TAG_ARRAY, addr as u64))
            }
        }
    }

    fn decode(&self, tag: u64, payload: u64, pc: usize) -> Result<Value> {
        match tag {
            TAG_NIL => Ok(Value::Nil),
            TAG_BOOL => Ok(Value::Bool(payload != 0)),
            TAG_NUMBER => Ok(Value::Number(f64::from_bits(payload))),
            TAG_STRING => {
                let addr = payload as usize;
                let len = self.read_heap_u64(addr, pc)? as usize;
                let bytes = &self.heap[addr + 8..addr + 8 + len];
                Ok(Value::String(String::from_utf8_lossy(bytes).into_owned()))
            }
            TAG_ARRAY => {
                let addr = payload as usize;
                let len = self.read_heap_u64(addr, pc)? as usize;
                let mut items = Vec::with_capacity(len);
                let mut offset = addr + 8;
                for _ in 0..len {
                    let t = self.read_heap_u64(offset, pc)?;
                    let p = self.read_heap_u64(offset + 8, pc)?;
                    items.push(self.decode(t, p, pc)?);
                    offset += ENCODED_VALUE_SIZE;
                }
                Ok(Value::Array(items))
            }
            _ => Err(Error::runtime("Invalid register index", pc)),
        }
    }

    fn read_heap_u64(&self, addr: usize, pc: usize) -> Result<u64> {
        if addr + 8 > self.heap.len() {
            return Err(Error::runtime("Memory read out of bounds", pc));
        }
        Ok(u64::from_le_bytes(self.heap[addr..addr + 8].try_into().unwrap()))
    }

    fn push_value(&mut self, value: &Value, pc: usize) -> Result<()> {
        let (tag, payload) = self.encode(value, pc)?;
        self.push_u64(tag, pc)?;
        self.push_u64(payload, pc)?;
        Ok(())
    }

    fn pop_value(&mut self, pc: usize) -> Result<Value> {
        let payload = self.pop_u64(pc)?;
        let tag = self.pop_u64(pc)?;
        self.decode(tag, payload, pc)
    }

    // -- variable slots --

    fn local_addr(&self, slot: u32) -> usize {
        self.frames.last().unwrap().locals_base + slot as usize * ENCODED_VALUE_SIZE
    }

    fn load_var(&self, slot: u32, pc: usize) -> Result<Value> {
        let addr = self.local_addr(slot);
        let tag = self.read_heap_u64(addr, pc)?;
        let payload = self.read_heap_u64(addr + 8, pc)?;
        self.decode(tag, payload, pc)
    }

    fn store_var(&mut self, slot: u32, value: &Value, pc: usize) -> Result<()> {
        let (tag, payload) = self.encode(value, pc)?;
        let addr = self.local_addr(slot);
        self.heap[addr..addr + 8].copy_from_slice(&tag.to_le_bytes());
        self.heap[addr + 8..addr + 16].copy_from_slice(&payload.to_le_bytes());
        Ok(())
    }

    fn set_flags(&mut self, ordering: std::cmp::Ordering) {
        self.registers[FLAGS_REGISTER] = match ordering {
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Less => 1,
            std::cmp::Ordering::Greater => 2,
        };
    }

    fn ordering(&self, left: &Value, right: &Value, pc: usize) -> Result<std::cmp::Ordering> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok((*a as i64).cmp(&(*b as i64))),
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            _ => Err(type_error(left, right, pc)),
        }
    }

    /// Execute the script function (index 0) to completion.
    pub fn execute(&mut self, module: &BytecodeModule) -> Result<Value> {
        self.sp = 0;
        self.fp = 0;
        self.heap_alloc_ptr = 0;
        self.call_stack.clear();
        self.frames.clear();
        self.halt = false;
        self.error = None;
        self.registers = [0; REGISTER_COUNT];

        let locals_base = self.allocate(FRAME_SIZE, 0)?;
        self.frames.push(Frame {
            function: 0,
            pc: 0,
            locals_base,
        });

        let result = self.run(module);
        self.halt = true;

        if let Err(ref err) = result {
            tracing::warn!(error = %err, "register vm halted with a runtime error");
            self.error = Some(err.clone());
        }
        result
    }

    fn run(&mut self, module: &BytecodeModule) -> Result<Value> {
        loop {
            let (fn_idx, pc) = {
                let frame = self.frames.last().expect("call stack is never empty while running");
                (frame.function, frame.pc)
            };
            let function = &module.functions[fn_idx];
            let op = function.instructions[pc];
            self.frames.last_mut().unwrap().pc += 1;

            if self.trace {
                tracing::debug!(pc, function = %function.name, ?op, "register vm dispatch");
            }

            match op {
                Opcode::LoadConst(k) => {
                    let value = module.constants[k as usize].clone();
                    self.push_value(&value, pc)?;
                }
                Opcode::LoadVar(slot) => {
                    let value = self.load_var(slot, pc)?;
                    self.push_value(&value, pc)?;
                }
                Opcode::StoreVar(slot) => {
                    let value = self.pop_value(pc)?;
                    self.store_var(slot, &value, pc)?;
                }
                Opcode::DefineGlobal(_)
                | Opcode::GetGlobal(_)
                | Opcode::SetGlobal(_)
                | Opcode::GetLocal(_)
                | Opcode::SetLocal(_) => {
                    return Err(Error::runtime("Unknown opcode", pc));
                }

                Opcode::Add => {
                    let right = self.pop_value(pc)?;
                    let left = self.pop_value(pc)?;
                    let result = match (&left, &right) {
                        (Value::Number(a), Value::Number(b)) => {
                            self.registers[0] = *a as u64;
                            self.registers[1] = *b as u64;
                            Value::Number(self.registers[0].wrapping_add(self.registers[1]) as f64)
                        }
                        (Value::String(a), Value::String(b)) => Value::String(format!("{}{}", a, b)),
                        _ => return Err(type_error(&left, &right, pc)),
                    };
                    self.push_value(&result, pc)?;
                }
                Opcode::Sub => self.numeric_binop(pc, |a, b| Ok(a.wrapping_sub(b)))?,
                Opcode::Mul => self.numeric_binop(pc, |a, b| Ok(a.wrapping_mul(b)))?,
                Opcode::Div => self.numeric_binop(pc, |a, b| {
                    if b == 0 {
                        Err(Error::runtime("Division by zero", pc))
                    } else {
                        Ok(a / b)
                    }
                })?,
                Opcode::Mod => self.numeric_binop(pc, |a, b| {
                    if b == 0 {
                        Err(Error::runtime("Modulo by zero", pc))
                    } else {
                        Ok(a % b)
                    }
                })?,
                Opcode::Neg => {
                    let v = self.pop_value(pc)?;
                    let result = match v {
                        Value::Number(n) => Value::Number(-(n as i64) as f64),
                        other => {
                            return Err(Error::runtime(
                                format!("Unknown unary operator for {}", other.type_name()),
                                pc,
                            ));
                        }
                    };
                    self.push_value(&result, pc)?;
                }

                Opcode::Equal => {
                    let right = self.pop_value(pc)?;
                    let left = self.pop_value(pc)?;
                    if let Ok(ord) = self.ordering(&left, &right, pc) {
                        self.set_flags(ord);
                    }
                    self.push_value(&Value::Bool(left == right), pc)?;
                }
                Opcode::NotEqual => {
                    let right = self.pop_value(pc)?;
                    let left = self.pop_value(pc)?;
                    if let Ok(ord) = self.ordering(&left, &right, pc) {
                        self.set_flags(ord);
                    }
                    self.push_value(&Value::Bool(left != right), pc)?;
                }
                Opcode::Less => self.compare(pc, |o| o == std::cmp::Ordering::Less)?,
                Opcode::LessEqual => self.compare(pc, |o| o != std::cmp::Ordering::Greater)?,
                Opcode::Greater => self.compare(pc, |o| o == std::cmp::Ordering::Greater)?,
                Opcode::GreaterEqual => self.compare(pc, |o| o != std::cmp::Ordering::Less)?,

                Opcode::And => {
                    let right = self.pop_value(pc)?;
                    let left = self.pop_value(pc)?;
                    self.push_value(&Value::Bool(left.is_truthy() && right.is_truthy()), pc)?;
                }
                Opcode::Or => {
                    let right = self.pop_value(pc)?;
                    let left = self.pop_value(pc)?;
                    self.push_value(&Value::Bool(left.is_truthy() || right.is_truthy()), pc)?;
                }
                Opcode::Not => {
                    let v = self.pop_value(pc)?;
                    self.push_value(&Value::Bool(!v.is_truthy()), pc)?;
                }

                Opcode::Jump(target) => {
                    self.frames.last_mut().unwrap().pc = target as usize;
                }
                Opcode::JumpIfFalse(target) => {
                    let cond = self.pop_value(pc)?;
                    if !cond.is_truthy() {
                        self.frames.last_mut().unwrap().pc = target as usize;
                    }
                }
                Opcode::JumpIfTrue(target) => {
                    let cond = self.pop_value(pc)?;
                    if cond.is_truthy() {
                        self.frames.last_mut().unwrap().pc = target as usize;
                    }
                }
                Opcode::Loop(target) => {
                    self.frames.last_mut().unwrap().pc = target as usize;
                }

                Opcode::Call(func_idx, argc) => {
                    let func_idx = func_idx as usize;
                    let argc = argc as usize;
                    let callee = module
                        .functions
                        .get(func_idx)
                        .ok_or_else(|| Error::runtime("Invalid call target", pc))?;
                    if callee.param_count != argc {
                        return Err(Error::runtime(
                            format!(
                                "{}() takes {} argument(s), {} given",
                                callee.name, callee.param_count, argc
                            ),
                            pc,
                        ));
                    }
                    let mut args = Vec::with_capacity(argc);
                    for _ in 0..argc {
                        args.push(self.pop_value(pc)?);
                    }
                    args.reverse();

                    self.call_stack.push((fn_idx, self.frames.last().unwrap().pc));
                    let locals_base = self.allocate(FRAME_SIZE, pc)?;
                    self.frames.push(Frame {
                        function: func_idx,
                        pc: 0,
                        locals_base,
                    });
                    for (i, arg) in args.into_iter().enumerate() {
                        self.store_var(i as u32, &arg, pc)?;
                    }
                }
                Opcode::Return => {
                    let retval = self.pop_value(pc)?;
                    let finished = self.frames.pop().unwrap();
                    self.deallocate(finished.locals_base, FRAME_SIZE, pc)?;
                    let (_, _) = self
                        .call_stack
                        .pop()
                        .ok_or_else(|| Error::runtime("Return from empty call stack", pc))?;
                    if self.frames.is_empty() {
                        return Err(Error::runtime("Return from empty call stack", pc));
                    }
                    self.push_value(&retval, pc)?;
                }

                Opcode::Pop => {
                    self.pop_value(pc)?;
                }
                Opcode::Dup => {
                    let v = self.pop_value(pc)?;
                    self.push_value(&v, pc)?;
                    self.push_value(&v, pc)?;
                }

                Opcode::NewArray(n) => {
                    let n = n as usize;
                    let mut items = Vec::with_capacity(n);
                    for _ in 0..n {
                        items.push(self.pop_value(pc)?);
                    }
                    items.reverse();
                    self.push_value(&Value::Array(items), pc)?;
                }
                Opcode::IndexLoad => {
                    let index = self.pop_value(pc)?;
                    let array = self.pop_value(pc)?;
                    let result = index_load(&array, &index, pc)?;
                    self.push_value(&result, pc)?;
                }
                Opcode::IndexStore => {
                    let value = self.pop_value(pc)?;
                    let index = self.pop_value(pc)?;
                    let mut array = self.pop_value(pc)?;
                    index_store(&mut array, &index, value, pc)?;
                    self.push_value(&array, pc)?;
                }

                Opcode::Exit => {
                    let result = self.pop_value(pc).unwrap_or(Value::Nil);
                    if self.sp != 0 {
                        return Err(Error::runtime("Value stack not empty at Exit", pc));
                    }
                    return Ok(result);
                }
            }
        }
    }

    fn numeric_binop(&mut self, pc: usize, f: impl Fn(u64, u64) -> Result<u64>) -> Result<()> {
        let right = self.pop_value(pc)?;
        let left = self.pop_value(pc)?;
        let (a, b) = match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => (*a as u64, *b as u64),
            _ => return Err(type_error(&left, &right, pc)),
        };
        self.registers[0] = a;
        self.registers[1] = b;
        let result = f(self.registers[0], self.registers[1])?;
        self.push_value(&Value::Number(result as f64), pc)
    }

    fn compare(&mut self, pc: usize, want: impl Fn(std::cmp::Ordering) -> bool) -> Result<()> {
        let right = self.pop_value(pc)?;
        let left = self.pop_value(pc)?;
        let ord = self.ordering(&left, &right, pc)?;
        self.set_flags(ord);
        self.push_value(&Value::Bool(want(ord)), pc)
    }
}

impl Default for RegisterVm {
    fn default() -> Self {
        Self::new()
    }
}

fn type_error(left: &Value, right: &Value, pc: usize) -> Error {
    Error::runtime(
        format!(
            "Unknown binary operator for {} and {}",
            left.type_name(),
            right.type_name()
        ),
        pc,
    )
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
        RegisterVm::new().execute(&module)
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(
            run("function f(){ return 1+2*3; } f();").unwrap(),
            Value::Number(7.0)
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
        assert!(err.to_string().starts_with("Division by zero"));
    }

    #[test]
    fn flags_register_reflects_last_comparison() {
        let tokens = Lexer::new("1 < 2;").tokenize();
        let program = Parser::new(tokens).parse().unwrap();
        let module = Compiler::compile(&program).unwrap();
        let mut vm = RegisterVm::new();
        vm.execute(&module).unwrap();
        assert_eq!(vm.registers[FLAGS_REGISTER], 1);
    }

    #[test]
    fn push_pop_round_trips_through_the_byte_stack() {
        let mut vm = RegisterVm::new();
        vm.push_value(&Value::Number(42.0), 0).unwrap();
        assert_eq!(vm.pop_value(0).unwrap(), Value::Number(42.0));
    }

    #[test]
    fn heap_allocate_zeroes_and_advances() {
        let mut vm = RegisterVm::new();
        let addr = vm.allocate(16, 0).unwrap();
        assert_eq!(&vm.heap[addr..addr + 16], &[0u8; 16]);
        assert_eq!(vm.heap_alloc_ptr, 16);
    }
}
