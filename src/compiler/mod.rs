// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Single-pass Pratt-style compiler.
//!
//! Consumes a [`Scanner`](crate::reader::Scanner)'s token stream and
//! emits bytecode directly into a [`Chunk`] — there is no intermediate
//! AST. Operator precedence is climbed via [`Precedence`] and the
//! per-token dispatch in [`Compiler::parse_prefix`]/[`parse_infix`],
//! rather than a table of stored function pointers.


use std::fmt;

use crate::chunk::{Chunk, OpCode};
use crate::reader::{Scanner, Token, TokenKind};
use crate::vm::Vm;

/// Precedence ladder, low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    /// One step higher; used to make binary operators left-associative.
    const fn next(self) -> Self {
        match self {
            Self::None => Self::Assignment,
            Self::Assignment => Self::Or,
            Self::Or => Self::And,
            Self::And => Self::Equality,
            Self::Equality => Self::Comparison,
            Self::Comparison => Self::Term,
            Self::Term => Self::Factor,
            Self::Factor => Self::Unary,
            Self::Unary => Self::Call,
            Self::Call | Self::Primary => Self::Primary,
        }
    }
}

/// Compilation failed; the actual diagnostics were already written to
/// stderr in their fixed wording. This type exists so `Vm::interpret`
/// has something `Display`-able and `Error`-able to return.
#[derive(Debug, thiserror::Error)]
#[error("compilation failed")]
pub struct CompileError;

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Single-pass compiler state: scanner cursor, one token of lookahead,
/// panic-mode bookkeeping, and the chunk being built.
pub struct Compiler<'vm, 'src> {
    scanner: Scanner<'src>,
    previous: Token<'src>,
    current: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    chunk: Chunk,
    vm: &'vm mut Vm,
}

impl<'vm, 'src> Compiler<'vm, 'src> {
    fn new(source: &'src str, vm: &'vm mut Vm) -> Self {
        let placeholder = Token { kind: TokenKind::Error, lexeme: "", line: 0 };
        Self {
            scanner: Scanner::new(source),
            previous: placeholder,
            current: placeholder,
            had_error: false,
            panic_mode: false,
            chunk: Chunk::new(),
            vm,
        }
    }

    fn compile(mut self) -> Result<Chunk, CompileError> {
        self.advance();
        while !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume_eof();
        self.end_compiler();

        if self.had_error { Err(CompileError) } else { Ok(self.chunk) }
    }

    // ---- token stream -------------------------------------------------

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            self.error_at_current(self.current.lexeme);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, kind: TokenKind, message: &'static str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    /// The scanner loop in `advance` already stops advancing past a real
    /// `Eof` token, so once `declaration*` is done, `current` already is
    /// `Eof` — this just documents the grammar's `EOF` terminal.
    fn consume_eof(&self) {}

    // ---- error reporting ------------------------------------------------

    fn error_at_current(&mut self, message: &str) {
        let token = self.current;
        self.error_at(token, message);
    }

    fn error(&mut self, message: &str) {
        let token = self.previous;
        self.error_at(token, message);
    }

    fn error_at(&mut self, token: Token<'_>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;

        if token.kind == TokenKind::Error {
            eprintln!("[line {}] Error: {}", token.line, token.lexeme);
        } else if token.kind == TokenKind::Eof {
            eprintln!("[line {}] Error at end: {}", token.line, message);
        } else {
            eprintln!("[line {}] Error at '{}': {}", token.line, token.lexeme, message);
        }
        self.had_error = true;
    }

    // ---- emission -------------------------------------------------------

    fn emit_byte(&mut self, byte: u8) {
        self.chunk.write_byte(byte, self.previous.line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.chunk.write_op(op, self.previous.line);
    }

    fn emit_ops(&mut self, a: OpCode, b: OpCode) {
        self.emit_op(a);
        self.emit_op(b);
    }

    fn emit_constant(&mut self, value: crate::value::Value) {
        match self.chunk.add_constant(value) {
            Some(idx) => {
                self.emit_op(OpCode::Constant);
                self.emit_byte(idx);
            }
            None => {
                self.error("Too many constants in one chunk.");
                self.emit_op(OpCode::Constant);
                self.emit_byte(0);
            }
        }
    }

    /// Emit `OP_DEFINE_GLOBAL`/`OP_GET_GLOBAL`/`OP_SET_GLOBAL`, whose
    /// operand is the constant-pool index of the interned variable name.
    fn emit_global_op(&mut self, op: OpCode, name_idx: u8) {
        self.emit_op(op);
        self.emit_byte(name_idx);
    }

    fn identifier_constant(&mut self, name: &str) -> u8 {
        let handle = self.vm.intern(name);
        match self.chunk.add_constant(crate::value::Value::Obj(handle)) {
            Some(idx) => idx,
            None => {
                self.error("Too many constants in one chunk.");
                0
            }
        }
    }

    fn end_compiler(&mut self) {
        self.emit_op(OpCode::Return);
        tracing::debug!(
            bytes = self.chunk.code.len(),
            constants = self.chunk.constants.len(),
            "compiled chunk"
        );
    }

    // ---- statement grammar ----------------------------------------------
    //
    // program     := declaration* EOF
    // declaration := varDecl | statement
    // varDecl     := "var" IDENTIFIER ( "=" expression )? ";"
    // statement   := printStmt | exprStmt
    // printStmt   := "print" expression ";"
    // exprStmt    := expression ";"

    fn declaration(&mut self) {
        if self.matches(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    fn var_declaration(&mut self) {
        self.consume(TokenKind::Identifier, "Expect variable name.");
        let name_idx = self.identifier_constant(self.previous.lexeme);

        if self.matches(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(OpCode::Nil);
        }
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.");
        self.emit_global_op(OpCode::DefineGlobal, name_idx);
    }

    fn statement(&mut self) {
        if self.matches(TokenKind::Print) {
            self.print_statement();
        } else {
            self.expression_statement();
        }
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after value.");
        self.emit_op(OpCode::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit_op(OpCode::Pop);
    }

    /// Advance until after a `;` or to the start of a statement
    /// keyword, clearing panic mode so the next declaration can report
    /// errors again.
    fn synchronize(&mut self) {
        self.panic_mode = false;

        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => self.advance(),
            }
        }
    }

    // ---- expression grammar (Pratt) --------------------------------------

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let can_assign = precedence <= Precedence::Assignment;

        if !self.parse_prefix(self.previous.kind, can_assign) {
            self.error("Expect expression.");
            return;
        }

        while precedence <= infix_precedence(self.current.kind) {
            self.advance();
            self.parse_infix(self.previous.kind, can_assign);
        }

        if can_assign && self.matches(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    /// Dispatch a prefix handler for `kind`. Returns `false` if `kind`
    /// has no prefix rule at all.
    fn parse_prefix(&mut self, kind: TokenKind, can_assign: bool) -> bool {
        match kind {
            TokenKind::LeftParen => self.grouping(),
            TokenKind::Minus | TokenKind::Bang => self.unary(kind),
            TokenKind::Number => self.number(),
            TokenKind::String => self.string(),
            TokenKind::Identifier => self.variable(can_assign),
            TokenKind::True | TokenKind::False | TokenKind::Nil => self.literal(kind),
            _ => return false,
        }
        true
    }

    fn parse_infix(&mut self, kind: TokenKind, _can_assign: bool) {
        match kind {
            TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::BangEqual
            | TokenKind::EqualEqual
            | TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual => self.binary(kind),
            _ => {}
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn unary(&mut self, operator: TokenKind) {
        self.parse_precedence(Precedence::Unary);
        match operator {
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            TokenKind::Bang => self.emit_op(OpCode::Not),
            _ => unreachable!("unary dispatch only reaches Minus/Bang"),
        }
    }

    fn binary(&mut self, operator: TokenKind) {
        let rule_precedence = infix_precedence(operator);
        self.parse_precedence(rule_precedence.next());

        match operator {
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Subtract),
            TokenKind::Star => self.emit_op(OpCode::Multiply),
            TokenKind::Slash => self.emit_op(OpCode::Divide),
            TokenKind::EqualEqual => self.emit_op(OpCode::Equal),
            TokenKind::BangEqual => self.emit_ops(OpCode::Equal, OpCode::Not),
            TokenKind::Less => self.emit_op(OpCode::Less),
            TokenKind::LessEqual => self.emit_ops(OpCode::Greater, OpCode::Not),
            TokenKind::Greater => self.emit_op(OpCode::Greater),
            TokenKind::GreaterEqual => self.emit_ops(OpCode::Less, OpCode::Not),
            _ => unreachable!("binary dispatch only reaches arithmetic/comparison tokens"),
        }
    }

    fn number(&mut self) {
        match self.previous.lexeme.parse::<f64>() {
            Ok(n) => self.emit_constant(crate::value::Value::Number(n)),
            Err(_) => self.error("Invalid number literal."),
        }
    }

    fn string(&mut self) {
        let lexeme = self.previous.lexeme;
        let contents = &lexeme[1..lexeme.len() - 1];
        let handle = self.vm.intern(contents);
        self.emit_constant(crate::value::Value::Obj(handle));
    }

    fn literal(&mut self, kind: TokenKind) {
        match kind {
            TokenKind::True => self.emit_op(OpCode::True),
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            _ => unreachable!("literal dispatch only reaches true/false/nil"),
        }
    }

    fn variable(&mut self, can_assign: bool) {
        let name_idx = self.identifier_constant(self.previous.lexeme);

        if can_assign && self.matches(TokenKind::Equal) {
            self.expression();
            self.emit_global_op(OpCode::SetGlobal, name_idx);
        } else {
            self.emit_global_op(OpCode::GetGlobal, name_idx);
        }
    }
}

/// Infix precedence for `kind`, or `Precedence::None` for tokens with no
/// infix rule.
const fn infix_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Minus | TokenKind::Plus => Precedence::Term,
        TokenKind::Star | TokenKind::Slash => Precedence::Factor,
        TokenKind::BangEqual | TokenKind::EqualEqual => Precedence::Equality,
        TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
            Precedence::Comparison
        }
        _ => Precedence::None,
    }
}

/// Compile `source` into a chunk, interning any string constants through
/// `vm`. Diagnostics for lexical/syntax errors go straight to stderr in
/// their already-fixed wording; this function only reports pass/fail.
///
/// # Errors
///
/// Returns [`CompileError`] if any lexical or syntax error was reported.
pub fn compile(source: &str, vm: &mut Vm) -> Result<Chunk, CompileError> {
    Compiler::new(source, vm).compile()
}
