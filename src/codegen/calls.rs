//! Call lowering for the System V calling convention
//!
//! Arguments are evaluated right to left and pushed. The first six are then
//! popped into registers; the rest stay on the stack in argument order. `rsp`
//! is padded beforehand so that it is 16-byte aligned at the `call`.

use super::constants::{ARG_REGISTERS, SLOT_SIZE, STACK_ALIGNMENT};
use super::CodeGen;
use crate::errors::CompileResult;
use crate::parser::ast::AstNode;

impl CodeGen {
    pub(crate) fn gen_call(&mut self, name: &str, args: &[AstNode]) -> CompileResult<()> {
        let depth_before = self.depth;
        let in_registers = args.len().min(ARG_REGISTERS.len());
        let on_stack = args.len() - in_registers;

        let pad = (self.depth + SLOT_SIZE * on_stack) % STACK_ALIGNMENT != 0;
        if pad {
            self.emit(format!("sub rsp, {}", SLOT_SIZE));
            self.depth += SLOT_SIZE;
        }

        for arg in args.iter().rev() {
            self.gen_expr(arg)?;
            self.push("rax");
        }
        for reg in &ARG_REGISTERS[..in_registers] {
            self.pop(reg);
        }

        self.emit("mov rax, 0");
        self.emit(format!("call {}", name));

        if on_stack > 0 {
            self.emit(format!("add rsp, {}", SLOT_SIZE * on_stack));
            self.depth -= SLOT_SIZE * on_stack;
        }
        if pad {
            self.emit(format!("add rsp, {}", SLOT_SIZE));
            self.depth -= SLOT_SIZE;
        }

        debug_assert_eq!(self.depth, depth_before, "unbalanced call to {}", name);
        Ok(())
    }
}
