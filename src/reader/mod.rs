// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Scanner for Bramble source code.
//!
//! Converts a source string into a stream of [`Token`]s on demand. The
//! compiler drives the scanner one token at a time; there is no
//! intermediate token vector.

mod scanner;

pub use scanner::{Scanner, Token, TokenKind};
