// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! # Bramble
//!
//! A single-pass bytecode compiler and stack-based virtual machine for a
//! small dynamically-typed scripting language.
//!
//! This crate provides:
//! - A line-tracked scanner with keyword discrimination ([`reader`])
//! - A single-pass Pratt-style compiler that emits bytecode directly,
//!   with no intermediate AST ([`compiler`])
//! - A tagged-value runtime with interned strings and an open-addressed
//!   hash table ([`value`], [`table`])
//! - A growable bytecode [`chunk`] format
//! - A stack-based virtual machine that executes chunks ([`vm`])
//!
//! The only entry point an embedder needs is [`Vm::interpret`](vm::Vm::interpret):
//! it takes source text and returns one of `Ok`, [`CompileError`](vm::CompileError),
//! or [`RuntimeError`](vm::RuntimeError).

pub mod chunk;
pub mod compiler;
pub mod reader;
pub mod table;
pub mod value;
pub mod vm;

pub use chunk::Chunk;
pub use value::{Object, ObjString, Value};
pub use vm::{CompileError, InterpretError, RuntimeError, Vm};

/// Crate version, exposed for `--version` and diagnostic banners.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
