//! Address computation for lvalues
//!
//! `gen_lval` leaves the address of its operand in `rax`. Accepted forms are
//! variables, dereferences, pointer arithmetic and struct member access.

use super::CodeGen;
use crate::errors::{CompileError, CompileResult};
use crate::parser::ast::*;

impl CodeGen {
    pub(crate) fn gen_lval(&mut self, node: &AstNode) -> CompileResult<()> {
        match node {
            AstNode::Identifier { name, scope, .. } => self.gen_variable_address(name, *scope, node),

            // The address held by a pointer is its value; an array yields its own address
            AstNode::UnaryOp {
                op: UnOp::Deref,
                operand,
                ..
            } => self.gen_expr(operand),

            AstNode::BinaryOp {
                op: op @ (BinOp::Add | BinOp::Sub),
                lhs,
                rhs,
                ..
            } => self.gen_additive(*op, lhs, rhs, node),

            AstNode::MemberAccess { base, member, .. } => {
                let offset = base
                    .ty()
                    .as_ref()
                    .and_then(|ty| ty.as_struct())
                    .and_then(|layout| layout.member(member))
                    .map(|m| m.offset)
                    .ok_or_else(|| {
                        CompileError::semantic(
                            "Invalid struct member reference",
                            node.describe(),
                            node.location(),
                        )
                    })?;

                self.gen_lval(base)?;
                if offset > 0 {
                    self.emit(format!("add rax, {}", offset));
                }
                Ok(())
            }

            _ => Err(CompileError::semantic(
                "Invalid lvalue",
                node.describe(),
                node.location(),
            )),
        }
    }

    fn gen_variable_address(&mut self, name: &str, scope: Scope, node: &AstNode) -> CompileResult<()> {
        match scope {
            Scope::Local => {
                let offset = self.frame.offset(name).ok_or_else(|| {
                    CompileError::semantic("Unknown identifier", name, node.location())
                })?;
                self.emit(format!("lea rax, [rbp{:+}]", offset));
            }
            Scope::Global => self.emit(format!("lea rax, [rip + {}]", name)),
            Scope::Unresolved => {
                return Err(CompileError::semantic(
                    "Unknown identifier",
                    name,
                    node.location(),
                ))
            }
        }
        Ok(())
    }
}
