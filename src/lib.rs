//! # Introduction
//!
//! crustcc compiles a small subset of C into x86-64 assembly (Intel syntax,
//! System V calling convention) in a single pass: the parser resolves every
//! type while it builds the AST, and the code generator consumes that typed
//! AST directly.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Lexer → Parser (+ types) → Program → CodeGen → assembly text
//! ```
//!
//! 1. [`parser`]: tokenises the source and builds a typed AST per function,
//!    plus the global-variable and string-literal tables.
//! 2. [`types`]: type representation, sizes, struct layout and result-type
//!    deduction for operators.
//! 3. [`codegen`]: stack-frame layout and instruction selection.
//! 4. [`errors`]: the single error type every stage reports through.
//!
//! ## Supported C subset
//!
//! Types: `char`, `short`, `int`, pointers, one-dimensional arrays, structs.
//! Control flow: `if/else`, `while`, `for`, `return`.
//! Every function returns `int`; calls go to named functions only.

pub mod codegen;
pub mod errors;
pub mod parser;
pub mod types;

use std::sync::Once;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub use errors::{CompileError, CompileResult};

/// Compile one translation unit to assembly text.
///
/// Nothing is returned unless the whole program compiled, so callers never
/// see partial output.
pub fn compile(source: &str) -> CompileResult<String> {
    let program = parser::parse_source(source)?;
    let asm = codegen::generate(&program)?;
    debug!(bytes = asm.len(), "generated assembly");
    Ok(asm)
}

static TRACING_INIT: Once = Once::new();

/// Install a stderr tracing subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset, so stdout carries only assembly and
/// stderr only diagnostics. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_err() {
            return;
        }

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .try_init();
    });
}
