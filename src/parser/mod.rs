//! C source code parser
//!
//! This module transforms C source text into a typed Abstract Syntax Tree:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parsing (tokens → AST), split across `declarations`,
//!   `statements` and `expressions`
//! - [`ast`]: AST node definitions
//! - [`symbols`]: symbol tables and the string-literal pool
//!
//! # Supported C Subset
//!
//! - Types: `char`, `short`, `int`, pointers, one-dimensional arrays, structs
//! - Statements: declarations, `if`/`else`, `while`, `for`, `return`, blocks
//! - Expressions: arithmetic, comparison, bitwise, short-circuit logical,
//!   assignment and compound assignment, `++`/`--`, `&`, `*`, indexing,
//!   member access, `sizeof`, calls to named functions
//! - No preprocessor (`#` lines are skipped)
//! - No typedefs, unions, enums, floating point or function pointers
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser, one method per precedence level.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;
pub mod symbols;

use crate::errors::CompileResult;
use ast::Program;
use parse::Parser;

/// Lex and parse a whole translation unit
pub fn parse_source(source: &str) -> CompileResult<Program> {
    Parser::new(source)?.parse_program()
}
