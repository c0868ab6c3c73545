//! End-to-end scenarios from the design notes' testable-properties table,
//! run against both VM backends to confirm the "two dispatch styles,
//! identical observable behavior" claim. Uses `pretty_assertions` for
//! diffable failures, the same as littrs's own integration tests.

use pretty_assertions::assert_eq;

use rplus::{Backend, Compiler, Lexer, Parser, Value};

fn run_on(source: &str, backend: Backend) -> rplus::Result<Value> {
    let tokens = Lexer::new(source).tokenize();
    let program = Parser::new(tokens).parse()?;
    let module = Compiler::compile(&program)?;
    rplus::run(&module, backend)
}

fn run_both(source: &str) -> (rplus::Result<Value>, rplus::Result<Value>) {
    (run_on(source, Backend::Stack), run_on(source, Backend::Register))
}

#[test]
fn arithmetic_precedence_returns_seven() {
    let (stack, register) = run_both("function f(){ return 1+2*3; } f();");
    assert_eq!(stack.unwrap(), Value::Number(7.0));
    assert_eq!(register.unwrap(), Value::Number(7.0));
}

#[test]
fn for_loop_counts_to_five() {
    let (stack, register) = run_both("var x = 0; for (x = 0; x < 5; x = x + 1) {} x;");
    assert_eq!(stack.unwrap(), Value::Number(5.0));
    assert_eq!(register.unwrap(), Value::Number(5.0));
}

#[test]
fn recursive_factorial_returns_120() {
    let source = "function fact(n){ if (n<=1) return 1; return n*fact(n-1); } fact(5);";
    let (stack, register) = run_both(source);
    assert_eq!(stack.unwrap(), Value::Number(120.0));
    assert_eq!(register.unwrap(), Value::Number(120.0));
}

#[test]
fn array_indexing_returns_the_element() {
    let (stack, register) = run_both("var a = [10,20,30]; a[1];");
    assert_eq!(stack.unwrap(), Value::Number(20.0));
    assert_eq!(register.unwrap(), Value::Number(20.0));
}

#[test]
fn string_concatenation_is_implemented_not_a_type_error() {
    let (stack, register) = run_both(r#""ab\n" + "c";"#);
    assert_eq!(stack.unwrap(), Value::String("ab\nc".to_string()));
    assert_eq!(register.unwrap(), Value::String("ab\nc".to_string()));
}

#[test]
fn division_by_zero_is_a_runtime_error_naming_the_failure() {
    let (stack, register) = run_both("1/0;");
    assert!(stack.unwrap_err().to_string().starts_with("Division by zero"));
    assert!(register.unwrap_err().to_string().starts_with("Division by zero"));
}

#[test]
fn empty_for_loop_compiles_to_an_unconditional_backward_jump() {
    // `for(;;){}` never terminates, so this only checks compilation — an
    // empty condition must not emit a `JumpIfFalse` that would need a
    // never-provided `Bool` on the stack.
    let tokens = Lexer::new("for(;;){}").tokenize();
    let program = Parser::new(tokens).parse().unwrap();
    let module = Compiler::compile(&program).unwrap();

    let script = &module.functions[0];
    assert!(script
        .instructions
        .iter()
        .any(|op| matches!(op, rplus::Opcode::Jump(_))));
    assert!(!script
        .instructions
        .iter()
        .any(|op| matches!(op, rplus::Opcode::JumpIfFalse(_))));
}

#[test]
fn call_stack_depth_is_restored_after_recursion() {
    let tokens = Lexer::new("function fact(n){ if (n<=1) return 1; return n*fact(n-1); } fact(5);")
        .tokenize();
    let program = Parser::new(tokens).parse().unwrap();
    let module = Compiler::compile(&program).unwrap();

    let mut vm = rplus::StackVm::new();
    let result = vm.execute(&module).unwrap();
    assert_eq!(result, Value::Number(120.0));
    assert!(!vm.is_running());
    assert!(!vm.has_error());
}

#[test]
fn has_error_implies_halted_for_both_backends() {
    let tokens = Lexer::new("1/0;").tokenize();
    let program = Parser::new(tokens).parse().unwrap();
    let module = Compiler::compile(&program).unwrap();

    let mut stack_vm = rplus::StackVm::new();
    assert!(stack_vm.execute(&module).is_err());
    assert!(stack_vm.has_error());
    assert!(!stack_vm.is_running());

    let mut register_vm = rplus::RegisterVm::new();
    assert!(register_vm.execute(&module).is_err());
    assert!(register_vm.has_error());
}
