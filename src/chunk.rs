// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Bytecode chunks for the Bramble virtual machine.
//!
//! A [`Chunk`] is three parallel arrays: the opcode/operand byte stream,
//! one source line per byte (for error reporting), and the constant pool
//! each `OP_CONSTANT`-family instruction indexes into.

#[cfg(test)]
mod chunk_test;

use crate::value::Value;

/// Maximum number of constants a single chunk may hold (operand is one byte).
pub const MAX_CONSTANTS: usize = 256;

/// Bytecode opcodes.
///
/// Every variant fits in one byte on the wire; operand bytes (if any)
/// immediately follow in `Chunk::code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Push `constants[operand]`.
    Constant = 0,
    Nil = 1,
    True = 2,
    False = 3,
    Pop = 4,
    /// `globals[constants[operand]] = peek(0); pop`
    DefineGlobal = 5,
    /// Push `globals[constants[operand]]`; runtime error if undefined.
    GetGlobal = 6,
    /// Assign to an existing global; runtime error if undefined.
    SetGlobal = 7,
    Equal = 8,
    Greater = 9,
    Less = 10,
    Add = 11,
    Subtract = 12,
    Multiply = 13,
    Divide = 14,
    Not = 15,
    Negate = 16,
    Print = 17,
    Return = 18,
}

impl OpCode {
    /// Decode a raw byte into an opcode.
    ///
    /// Returns `None` for bytes that never appear as an opcode (either an
    /// operand byte misread as an opcode, or corrupt input) — callers
    /// should treat this as an internal invariant violation, not a normal
    /// runtime error, since a correct compiler never emits such bytes.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Constant,
            1 => Self::Nil,
            2 => Self::True,
            3 => Self::False,
            4 => Self::Pop,
            5 => Self::DefineGlobal,
            6 => Self::GetGlobal,
            7 => Self::SetGlobal,
            8 => Self::Equal,
            9 => Self::Greater,
            10 => Self::Less,
            11 => Self::Add,
            12 => Self::Subtract,
            13 => Self::Multiply,
            14 => Self::Divide,
            15 => Self::Not,
            16 => Self::Negate,
            17 => Self::Print,
            18 => Self::Return,
            _ => return None,
        })
    }
}

/// A compiled bytecode unit: code bytes, per-byte line numbers, and a
/// constant pool.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    pub code: Vec<u8>,
    lines: Vec<u32>,
    pub constants: Vec<Value>,
}

impl Chunk {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single byte (opcode or operand) with its source line.
    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Append an opcode with its source line.
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write_byte(op as u8, line);
    }

    /// Source line that produced `code[offset]`.
    #[must_use]
    pub fn line(&self, offset: usize) -> u32 {
        self.lines.get(offset).copied().unwrap_or(0)
    }

    /// Add a value to the constant pool, returning its index.
    ///
    /// Returns `None` once the pool already holds [`MAX_CONSTANTS`] entries;
    /// the caller is responsible for reporting "Too many constants in one
    /// chunk." and substituting a placeholder index of 0 so compilation can
    /// continue.
    #[must_use]
    pub fn add_constant(&mut self, value: Value) -> Option<u8> {
        if self.constants.len() >= MAX_CONSTANTS {
            return None;
        }
        self.constants.push(value);
        Some((self.constants.len() - 1) as u8)
    }
}

/// Render a chunk's instructions as a human-readable listing.
///
/// Debug-only helper, never part of the embedder contract.
#[must_use]
pub fn disassemble(chunk: &Chunk, name: &str) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(out, "== {name} ==");

    let mut offset = 0;
    while offset < chunk.code.len() {
        let _ = write!(out, "{offset:04} ");
        if offset > 0 && chunk.line(offset) == chunk.line(offset - 1) {
            let _ = write!(out, "   | ");
        } else {
            let _ = write!(out, "{:4} ", chunk.line(offset));
        }

        let byte = chunk.code[offset];
        let Some(op) = OpCode::from_u8(byte) else {
            let _ = writeln!(out, "unknown opcode {byte}");
            offset += 1;
            continue;
        };

        offset = disassemble_instruction(chunk, op, offset, &mut out);
    }

    out
}

fn disassemble_instruction(chunk: &Chunk, op: OpCode, offset: usize, out: &mut String) -> usize {
    use std::fmt::Write as _;

    match op {
        OpCode::Constant | OpCode::DefineGlobal | OpCode::GetGlobal | OpCode::SetGlobal => {
            let idx = chunk.code[offset + 1];
            let name = match op {
                OpCode::Constant => "OP_CONSTANT",
                OpCode::DefineGlobal => "OP_DEFINE_GLOBAL",
                OpCode::GetGlobal => "OP_GET_GLOBAL",
                _ => "OP_SET_GLOBAL",
            };
            let value = chunk
                .constants
                .get(idx as usize)
                .map_or_else(|| "?".to_string(), ToString::to_string);
            let _ = writeln!(out, "{name:<18} {idx:4} '{value}'");
            offset + 2
        }
        _ => {
            let name = match op {
                OpCode::Nil => "OP_NIL",
                OpCode::True => "OP_TRUE",
                OpCode::False => "OP_FALSE",
                OpCode::Pop => "OP_POP",
                OpCode::Equal => "OP_EQUAL",
                OpCode::Greater => "OP_GREATER",
                OpCode::Less => "OP_LESS",
                OpCode::Add => "OP_ADD",
                OpCode::Subtract => "OP_SUBTRACT",
                OpCode::Multiply => "OP_MULTIPLY",
                OpCode::Divide => "OP_DIVIDE",
                OpCode::Not => "OP_NOT",
                OpCode::Negate => "OP_NEGATE",
                OpCode::Print => "OP_PRINT",
                OpCode::Return => "OP_RETURN",
                OpCode::Constant
                | OpCode::DefineGlobal
                | OpCode::GetGlobal
                | OpCode::SetGlobal => unreachable!("handled above"),
            };
            let _ = writeln!(out, "{name}");
            offset + 1
        }
    }
}
