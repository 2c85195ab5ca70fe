// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! The stack-based virtual machine.
//!
//! [`Vm`] owns the value stack, the global-variable table, and the
//! string-intern table, and executes a compiled [`Chunk`] to
//! completion. It is the only thing an embedder needs: construct one
//! with [`Vm::new`], call [`Vm::interpret`] as many times as needed
//! (globals and interned strings persist across calls on the same
//! `Vm`), and drop it when done — releasing every interned string and
//! every object it ever allocated, since they are all reached only
//! through `Rc` handles owned by `globals`/`strings` or values still on
//! the stack, rather than a separate intrusive all-objects list.

#[cfg(test)]
mod vm_test;

use std::rc::Rc;

use crate::chunk::{Chunk, OpCode};
use crate::compiler::{self, CompileError};
use crate::table::Table;
use crate::value::{Object, Value, fnv1a_hash};

/// Fixed value-stack capacity.
const STACK_MAX: usize = 256;

/// A runtime type/undefined-variable error, carrying the structured data
/// needed to reproduce the canonical diagnostic: the message, then
/// `[line L] in script`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}\n[line {line}] in script")]
pub struct RuntimeError {
    pub message: String,
    pub line: u32,
}

/// The three-way outcome of [`Vm::interpret`].
#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// The stack machine. One `Vm` corresponds to one embedder session: it
/// is safe to call `interpret` on it repeatedly (a REPL does exactly
/// this), but two `Vm`s must never share a `Value` — strings interned
/// in one are meaningless (by pointer identity) to the other.
pub struct Vm {
    stack: Vec<Value>,
    globals: Table,
    strings: Table,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Vm {
    fn drop(&mut self) {
        tracing::debug!(interned_strings = self.strings.len(), globals = self.globals.len(), "vm teardown");
    }
}

impl Vm {
    #[must_use]
    pub fn new() -> Self {
        Self { stack: Vec::with_capacity(STACK_MAX), globals: Table::new(), strings: Table::new() }
    }

    /// Compile and run `source`. Compile diagnostics and runtime
    /// diagnostics are written to stderr in their fixed wording; the
    /// returned error only distinguishes which of the two phases failed.
    ///
    /// # Errors
    ///
    /// Returns [`InterpretError::Compile`] if `source` fails to compile,
    /// or [`InterpretError::Runtime`] if execution raises a type error
    /// or references an undefined global.
    pub fn interpret(&mut self, source: &str) -> Result<(), InterpretError> {
        let chunk = compiler::compile(source, self)?;
        self.run(&chunk)?;
        Ok(())
    }

    /// Intern `s`: return the existing handle if this content is
    /// already interned, otherwise allocate a new string object and
    /// register it. Used both by the compiler (string/identifier
    /// literals) and by the VM itself (`OP_ADD` string concatenation).
    pub(crate) fn intern(&mut self, s: &str) -> Rc<Object> {
        let hash = fnv1a_hash(s.as_bytes());
        if let Some(existing) = self.strings.find_string(s, hash) {
            return existing;
        }
        let handle = Rc::new(Object::Str(crate::value::ObjString::new(s)));
        self.strings.set(&handle, Value::Nil);
        handle
    }

    fn run(&mut self, chunk: &Chunk) -> Result<(), RuntimeError> {
        let mut ip = 0usize;

        loop {
            let offset = ip;
            let Some(op) = OpCode::from_u8(chunk.code[ip]) else {
                return Err(self.runtime_error(chunk, offset, "Invalid opcode."));
            };
            ip += 1;

            match op {
                OpCode::Constant => {
                    let idx = chunk.code[ip];
                    ip += 1;
                    let value = chunk.constants[idx as usize].clone();
                    self.push(chunk, offset, value)?;
                }
                OpCode::Nil => self.push(chunk, offset, Value::Nil)?,
                OpCode::True => self.push(chunk, offset, Value::Bool(true))?,
                OpCode::False => self.push(chunk, offset, Value::Bool(false))?,
                OpCode::Pop => {
                    self.pop();
                }
                OpCode::DefineGlobal => {
                    let name = self.read_global_name(chunk, &mut ip);
                    let value = self.peek(0).clone();
                    self.globals.set(&name, value);
                    self.pop();
                }
                OpCode::GetGlobal => {
                    let name = self.read_global_name(chunk, &mut ip);
                    match self.globals.get(&name) {
                        Some(value) => {
                            let value = value.clone();
                            self.push(chunk, offset, value)?;
                        }
                        None => return Err(self.undefined_variable(chunk, offset, &name)),
                    }
                }
                OpCode::SetGlobal => {
                    let name = self.read_global_name(chunk, &mut ip);
                    let value = self.peek(0).clone();
                    // Must not create a new global: set, then undo + error
                    // if the set reports it would have created one.
                    if self.globals.set(&name, value) {
                        self.globals.delete(&name);
                        return Err(self.undefined_variable(chunk, offset, &name));
                    }
                }
                OpCode::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(chunk, offset, Value::Bool(a == b))?;
                }
                OpCode::Greater => self.numeric_binary(chunk, offset, |a, b| Value::Bool(a > b))?,
                OpCode::Less => self.numeric_binary(chunk, offset, |a, b| Value::Bool(a < b))?,
                OpCode::Add => self.add(chunk, offset)?,
                OpCode::Subtract => {
                    self.numeric_binary(chunk, offset, |a, b| Value::Number(a - b))?;
                }
                OpCode::Multiply => {
                    self.numeric_binary(chunk, offset, |a, b| Value::Number(a * b))?;
                }
                OpCode::Divide => {
                    self.numeric_binary(chunk, offset, |a, b| Value::Number(a / b))?;
                }
                OpCode::Not => {
                    let value = self.pop();
                    self.push(chunk, offset, Value::Bool(value.is_falsey()))?;
                }
                OpCode::Negate => {
                    let value = self.peek(0).clone();
                    match value.as_number() {
                        Some(n) => {
                            self.pop();
                            self.push(chunk, offset, Value::Number(-n))?;
                        }
                        None => {
                            return Err(self.runtime_error(
                                chunk,
                                offset,
                                "Operand must be a number.",
                            ));
                        }
                    }
                }
                OpCode::Print => {
                    let value = self.pop();
                    println!("{value}");
                }
                OpCode::Return => return Ok(()),
            }
        }
    }

    /// Read the one-byte constant-pool index following an opcode at
    /// `*ip`, advance `*ip` past it, and return the interned-string
    /// handle the compiler placed there for a global's name.
    fn read_global_name(&self, chunk: &Chunk, ip: &mut usize) -> Rc<Object> {
        let idx = chunk.code[*ip];
        *ip += 1;
        match &chunk.constants[idx as usize] {
            Value::Obj(handle) => Rc::clone(handle),
            _ => unreachable!("compiler always stores global names as interned strings"),
        }
    }

    fn undefined_variable(&mut self, chunk: &Chunk, offset: usize, name: &Rc<Object>) -> RuntimeError {
        let message = format!("Undefined variable '{}'.", name.as_str().as_str());
        self.runtime_error(chunk, offset, message)
    }

    fn numeric_binary(
        &mut self,
        chunk: &Chunk,
        offset: usize,
        f: impl FnOnce(f64, f64) -> Value,
    ) -> Result<(), RuntimeError> {
        let (a, b) = match (self.peek(1).as_number(), self.peek(0).as_number()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(self.runtime_error(chunk, offset, "Operands must be numbers.")),
        };
        self.pop();
        self.pop();
        self.push(chunk, offset, f(a, b))
    }

    fn add(&mut self, chunk: &Chunk, offset: usize) -> Result<(), RuntimeError> {
        let b = self.peek(0).clone();
        let a = self.peek(1).clone();

        if let (Some(a), Some(b)) = (a.as_number(), b.as_number()) {
            self.pop();
            self.pop();
            return self.push(chunk, offset, Value::Number(a + b));
        }

        if let (Some(a), Some(b)) = (a.as_obj_string(), b.as_obj_string()) {
            let combined = self.intern(&format!("{}{}", a.as_str(), b.as_str()));
            self.pop();
            self.pop();
            return self.push(chunk, offset, Value::Obj(combined));
        }

        Err(self.runtime_error(chunk, offset, "Operands must be two numbers or two strings."))
    }

    fn push(&mut self, chunk: &Chunk, offset: usize, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= STACK_MAX {
            return Err(self.runtime_error(chunk, offset, "Stack overflow."));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().expect("compiler guarantees the stack never underflows")
    }

    fn peek(&self, distance: usize) -> &Value {
        &self.stack[self.stack.len() - 1 - distance]
    }

    /// Build a `RuntimeError` for the instruction at `offset`, reset the
    /// stack so no partial state leaks into the next `interpret` call, and
    /// write the diagnostic to stderr in its fixed wording, exactly as the
    /// reference VM's `runtimeError` does at the point of failure.
    fn runtime_error(&mut self, chunk: &Chunk, offset: usize, message: impl Into<String>) -> RuntimeError {
        let line = chunk.line(offset);
        self.stack.clear();
        let error = RuntimeError { message: message.into(), line };
        eprintln!("{error}");
        error
    }
}
