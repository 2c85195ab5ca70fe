// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Command-line driver for the Bramble interpreter.
//!
//! Thin `clap`-derived wrapper around [`bramble::Vm::interpret`]: parses
//! arguments, initializes logging, reads the source file, and maps the
//! library's three-way result onto process exit codes. None of this
//! reformats the diagnostics the library already writes to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use bramble::{InterpretError, Vm};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// EX_USAGE (`sysexits.h`): missing required argument.
const EXIT_USAGE: u8 = 64;
/// EX_IOERR (`sysexits.h`): the source file could not be read.
const EXIT_IOERR: u8 = 74;
/// Exit codes the core interpret contract fixes (never change these).
const EXIT_OK: u8 = 0;
const EXIT_COMPILE_ERROR: u8 = 65;
const EXIT_RUNTIME_ERROR: u8 = 70;

/// A bytecode interpreter for a small dynamically-typed scripting language.
#[derive(Parser, Debug)]
#[command(name = "bramble")]
#[command(version = bramble::VERSION)]
#[command(about = "Compile and run a Bramble source file", long_about = None)]
struct Cli {
    /// Path to a Bramble source file.
    path: Option<PathBuf>,

    /// Raise diagnostic verbosity (repeatable: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(path) = cli.path else {
        eprintln!("Usage: bramble <path>");
        return ExitCode::from(EXIT_USAGE);
    };

    let source = match std::fs::read_to_string(&path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("bramble: {}: {err}", path.display());
            return ExitCode::from(EXIT_IOERR);
        }
    };

    let mut vm = Vm::new();
    match vm.interpret(&source) {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(InterpretError::Compile(_)) => ExitCode::from(EXIT_COMPILE_ERROR),
        Err(InterpretError::Runtime(_)) => ExitCode::from(EXIT_RUNTIME_ERROR),
    }
}

/// Set up `tracing` at a verbosity raised by repeated `-v` flags. Silent
/// (warnings only) by default; the exact-wording diagnostics the core
/// contract fixes never go through this subscriber.
fn init_logging(verbose: u8) {
    let default_directive = match verbose {
        0 => "bramble=warn",
        1 => "bramble=debug",
        _ => "bramble=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
