//! x86-64 code generation
//!
//! This module turns a parsed [`Program`] into Intel-syntax assembly for GNU `as`:
//! - [`frame`]: stack-frame layout of one function
//! - `emit`: instruction output and typed loads, stores and compares
//! - `expressions`, `lvalue`, `calls`, `statements`: tree walkers, split across
//!   `impl CodeGen` blocks
//!
//! # Evaluation Model
//!
//! Expressions are compiled as a stack machine. Every expression leaves its
//! value in `rax`; a pending left operand is pushed and later popped into
//! `rdi`. The generator tracks the number of bytes pushed since the frame was
//! set up so calls can keep `rsp` 16-byte aligned.
//!
//! # Output Layout
//!
//! ```text
//! .intel_syntax noprefix
//! .global main
//! .data             initialised globals
//! .bss              zero-initialised globals
//! .section .rodata  pooled string literals
//! .text             one block per function, in source order
//! .section .note.GNU-stack
//! ```

mod calls;
pub mod constants;
mod emit;
mod expressions;
pub mod frame;
mod lvalue;
mod statements;

use crate::errors::{CompileError, CompileResult};
use crate::parser::ast::{FunctionDef, GlobalVar, Program};
use crate::types::size_of;
use constants::{ARG_REGISTERS, STRING_LABEL_PREFIX};
use emit::access_size;
use frame::StackFrameLayout;
use tracing::{debug, trace};

/// Generate assembly for a whole program
pub fn generate(program: &Program) -> CompileResult<String> {
    let mut codegen = CodeGen::new();
    codegen.gen_program(program)?;
    Ok(codegen.out)
}

/// Code generator state for one program
pub struct CodeGen {
    /// Assembly emitted so far
    pub(crate) out: String,

    /// Next free control-flow label number, shared by all functions
    pub(crate) label_counter: usize,

    /// Bytes pushed below the 16-byte aligned frame base
    pub(crate) depth: usize,

    /// Layout of the function being generated
    pub(crate) frame: StackFrameLayout,
}

impl CodeGen {
    pub fn new() -> Self {
        CodeGen {
            out: String::new(),
            label_counter: 0,
            depth: 0,
            frame: StackFrameLayout::default(),
        }
    }

    fn gen_program(&mut self, program: &Program) -> CompileResult<()> {
        self.out.push_str(".intel_syntax noprefix\n");
        self.out.push_str(".global main\n");

        let (initialised, zeroed): (Vec<&GlobalVar>, Vec<&GlobalVar>) =
            program.globals.iter().partition(|g| g.init.is_some());

        if !initialised.is_empty() {
            self.out.push_str(".data\n");
            for global in initialised {
                self.gen_initialised_global(global)?;
            }
        }

        if !zeroed.is_empty() {
            self.out.push_str(".bss\n");
            for global in zeroed {
                trace!(name = %global.name, size = size_of(&global.ty), "zeroed global");
                self.emit_label(&global.name);
                self.emit(format!(".zero {}", size_of(&global.ty)));
            }
        }

        if !program.strings.is_empty() {
            self.out.push_str(".section .rodata\n");
            for (index, text) in program.strings.iter() {
                self.emit_label(&format!("{}{}", STRING_LABEL_PREFIX, index));
                self.emit(format!(".string \"{}\"", text));
            }
        }

        self.out.push_str(".text\n");
        for function in &program.functions {
            self.gen_function(function)?;
        }

        // Non-executable stack
        self.out.push_str(".section .note.GNU-stack,\"\",@progbits\n");

        Ok(())
    }

    fn gen_initialised_global(&mut self, global: &GlobalVar) -> CompileResult<()> {
        let value = global.init.unwrap_or_default();
        let directive = match access_size(&global.ty) {
            Some(1) => format!(".byte {}", value as u8),
            Some(2) => format!(".short {}", value as u16),
            Some(4) => format!(".long {}", value as u32),
            Some(_) => format!(".quad {}", value),
            None => {
                return Err(CompileError::semantic(
                    "Aggregate globals cannot have an initializer",
                    global.name.as_str(),
                    global.location,
                ))
            }
        };

        trace!(name = %global.name, value, "initialised global");
        self.emit_label(&global.name);
        self.emit(directive);
        Ok(())
    }

    fn gen_function(&mut self, function: &FunctionDef) -> CompileResult<()> {
        self.frame = StackFrameLayout::new(function)?;
        debug!(
            function = %function.name,
            frame_size = self.frame.size(),
            "generating function"
        );

        self.emit_label(&function.name);
        self.emit("push rbp");
        self.emit("mov rbp, rsp");
        // rsp is 16-byte aligned here
        self.depth = 0;
        if self.frame.size() > 0 {
            self.emit(format!("sub rsp, {}", self.frame.size()));
            self.depth += self.frame.size();
        }

        for (param, reg) in function.params.iter().zip(ARG_REGISTERS) {
            if let Some(offset) = self.frame.offset(&param.name) {
                self.emit(format!("mov qword ptr [rbp{:+}], {}", offset, reg));
            }
        }

        self.gen_statement(&function.body)?;

        self.emit("mov rax, 0");
        self.gen_epilogue();
        Ok(())
    }

    pub(crate) fn gen_epilogue(&mut self) {
        self.emit("mov rsp, rbp");
        self.emit("pop rbp");
        self.emit("ret");
    }
}

impl Default for CodeGen {
    fn default() -> Self {
        CodeGen::new()
    }
}
