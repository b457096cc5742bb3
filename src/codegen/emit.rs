//! Instruction emission and typed memory access
//!
//! Every push and pop goes through [`CodeGen::push`] and [`CodeGen::pop`] so
//! the compile-time stack depth always mirrors the runtime one.

use super::constants::{LABEL_PREFIX, SLOT_SIZE};
use super::CodeGen;
use crate::errors::{CompileError, CompileResult};
use crate::parser::ast::AstNode;
use crate::types::{size_of, Type};

/// Width in bytes of a load or store of `ty`, if it fits in a register
pub(crate) fn access_size(ty: &Type) -> Option<usize> {
    match ty {
        Type::Char | Type::Short | Type::Int | Type::Pointer(_) => Some(size_of(ty)),
        Type::Array(..) | Type::Struct(_) => None,
    }
}

impl CodeGen {
    /// Emit one indented instruction
    pub(crate) fn emit(&mut self, instr: impl AsRef<str>) {
        self.out.push('\t');
        self.out.push_str(instr.as_ref());
        self.out.push('\n');
    }

    pub(crate) fn emit_label(&mut self, label: &str) {
        self.out.push_str(label);
        self.out.push_str(":\n");
    }

    /// Fresh control-flow label
    pub(crate) fn new_label(&mut self) -> String {
        let label = format!("{}{}", LABEL_PREFIX, self.label_counter);
        self.label_counter += 1;
        label
    }

    pub(crate) fn push(&mut self, reg: &str) {
        self.emit(format!("push {}", reg));
        self.depth += SLOT_SIZE;
    }

    pub(crate) fn pop(&mut self, reg: &str) {
        debug_assert!(self.depth >= SLOT_SIZE, "pop from an empty shadow stack");
        self.emit(format!("pop {}", reg));
        self.depth -= SLOT_SIZE;
    }

    /// Replace the address in `rax` by the value it points to. Arrays and
    /// structs stay as addresses.
    pub(crate) fn load(&mut self, ty: &Type) {
        match access_size(ty) {
            Some(1) => self.emit("movzx eax, byte ptr [rax]"),
            Some(2) => self.emit("movzx eax, word ptr [rax]"),
            Some(4) => self.emit("movsxd rax, dword ptr [rax]"),
            Some(_) => self.emit("mov rax, qword ptr [rax]"),
            None => {}
        }
    }

    /// Store `rax` to the address in `rdi`
    pub(crate) fn store(&mut self, ty: &Type, target: &AstNode) -> CompileResult<()> {
        match access_size(ty) {
            Some(1) => self.emit("mov byte ptr [rdi], al"),
            Some(2) => self.emit("mov word ptr [rdi], ax"),
            Some(4) => self.emit("mov dword ptr [rdi], eax"),
            Some(_) => self.emit("mov qword ptr [rdi], rax"),
            None => {
                return Err(CompileError::semantic(
                    format!("Unsupported access width for type {}", ty),
                    target.describe(),
                    target.location(),
                ))
            }
        }
        Ok(())
    }

    /// Narrow `rax` to the value a store of `ty` just kept
    pub(crate) fn truncate(&mut self, ty: &Type) {
        match access_size(ty) {
            Some(1) => self.emit("movzx eax, al"),
            Some(2) => self.emit("movzx eax, ax"),
            Some(4) => self.emit("movsxd rax, eax"),
            _ => {}
        }
    }

    /// Compare `rax` against zero at the width of `ty`
    pub(crate) fn compare_zero(&mut self, ty: Option<&Type>) {
        match ty.and_then(access_size) {
            Some(1) => self.emit("cmp al, 0"),
            Some(2) => self.emit("cmp ax, 0"),
            Some(4) => self.emit("cmp eax, 0"),
            _ => self.emit("cmp rax, 0"),
        }
    }
}
