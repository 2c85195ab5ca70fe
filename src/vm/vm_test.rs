// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

use super::*;

fn run(source: &str) -> Result<(), InterpretError> {
    let mut vm = Vm::new();
    vm.interpret(source)
}

#[test]
fn arithmetic_follows_precedence_and_associativity() {
    let mut vm = Vm::new();
    vm.interpret("var x = 1 + 2 * 3 - 4 / 2;").unwrap();
    let handle = vm.intern("x");
    assert_eq!(vm.globals.get(&handle), Some(&Value::Number(5.0)));
}

#[test]
fn string_concatenation_interns_the_result() {
    let mut vm = Vm::new();
    vm.interpret(r#"var greeting = "hello" + " " + "world";"#).unwrap();
    let handle = vm.intern("hello world");
    assert_eq!(vm.globals.get(&vm.intern("greeting")), Some(&Value::Obj(handle)));
}

#[test]
fn equal_strings_compare_equal_through_interning() {
    let mut vm = Vm::new();
    vm.interpret(r#"var same = ("a" + "b") == "ab";"#).unwrap();
    assert_eq!(vm.globals.get(&vm.intern("same")), Some(&Value::Bool(true)));
}

#[test]
fn globals_persist_across_separate_interpret_calls() {
    let mut vm = Vm::new();
    vm.interpret("var counter = 1;").unwrap();
    vm.interpret("counter = counter + 1;").unwrap();
    assert_eq!(vm.globals.get(&vm.intern("counter")), Some(&Value::Number(2.0)));
}

#[test]
fn reassigning_an_undefined_global_is_a_runtime_error() {
    let err = run("nope = 1;").unwrap_err();
    match err {
        InterpretError::Runtime(e) => assert_eq!(e.message, "Undefined variable 'nope'."),
        InterpretError::Compile(_) => panic!("expected a runtime error"),
    }
}

#[test]
fn reading_an_undefined_global_is_a_runtime_error() {
    let err = run("print nope;").unwrap_err();
    match err {
        InterpretError::Runtime(e) => assert_eq!(e.message, "Undefined variable 'nope'."),
        InterpretError::Compile(_) => panic!("expected a runtime error"),
    }
}

#[test]
fn adding_a_number_and_a_string_is_a_runtime_error() {
    let err = run(r#"print 1 + "x";"#).unwrap_err();
    match err {
        InterpretError::Runtime(e) => {
            assert_eq!(e.message, "Operands must be two numbers or two strings.");
        }
        InterpretError::Compile(_) => panic!("expected a runtime error"),
    }
}

#[test]
fn negating_a_string_is_a_runtime_error() {
    let err = run(r#"print -"x";"#).unwrap_err();
    match err {
        InterpretError::Runtime(e) => assert_eq!(e.message, "Operand must be a number."),
        InterpretError::Compile(_) => panic!("expected a runtime error"),
    }
}

#[test]
fn division_by_zero_yields_infinity_not_an_error() {
    let mut vm = Vm::new();
    vm.interpret("var x = 1 / 0;").unwrap();
    assert_eq!(vm.globals.get(&vm.intern("x")), Some(&Value::Number(f64::INFINITY)));
}

#[test]
fn runtime_error_message_includes_line_number() {
    let err = run("print 1;\nprint 2;\nprint x;").unwrap_err();
    match err {
        InterpretError::Runtime(e) => {
            assert_eq!(e.line, 3);
            assert_eq!(e.to_string(), "Undefined variable 'x'.\n[line 3] in script");
        }
        InterpretError::Compile(_) => panic!("expected a runtime error"),
    }
}

#[test]
fn a_syntax_error_is_reported_as_compile_error() {
    let err = run("var;").unwrap_err();
    assert!(matches!(err, InterpretError::Compile(_)));
}

#[test]
fn successful_programs_leave_the_stack_empty() {
    let mut vm = Vm::new();
    vm.interpret("print 1 + 1; var x = 2; print x;").unwrap();
    assert!(vm.stack.is_empty());
}

#[test]
fn a_runtime_error_clears_the_stack() {
    let mut vm = Vm::new();
    let _ = vm.interpret("1 + true;");
    assert!(vm.stack.is_empty());
}

#[test]
fn expression_statements_discard_their_value() {
    let mut vm = Vm::new();
    vm.interpret("1 + 2;").unwrap();
    assert!(vm.stack.is_empty());
}

#[test]
fn comparisons_and_boolean_literals() {
    let mut vm = Vm::new();
    vm.interpret("var r = (3 > 2) == !false;").unwrap();
    assert_eq!(vm.globals.get(&vm.intern("r")), Some(&Value::Bool(true)));
}

#[test]
fn nil_and_false_are_falsey_inside_not() {
    let mut vm = Vm::new();
    vm.interpret("var a = !nil; var b = !false; var c = !0;").unwrap();
    assert_eq!(vm.globals.get(&vm.intern("a")), Some(&Value::Bool(true)));
    assert_eq!(vm.globals.get(&vm.intern("b")), Some(&Value::Bool(true)));
    // 0 is truthy (only nil/false are falsey), so !0 is false.
    assert_eq!(vm.globals.get(&vm.intern("c")), Some(&Value::Bool(false)));
}
