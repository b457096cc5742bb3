//! Statement code generation
//!
//! Control flow takes its labels from the generator-wide counter, so labels
//! stay unique across functions. Conditions are compared against zero at the
//! width of their own type.

use super::CodeGen;
use crate::errors::{CompileError, CompileResult};
use crate::parser::ast::*;

impl CodeGen {
    pub(crate) fn gen_statement(&mut self, node: &AstNode) -> CompileResult<()> {
        let depth_before = self.depth;

        match node {
            AstNode::Blank { .. } => {}

            AstNode::Compound { statements, .. } => {
                for statement in statements {
                    self.gen_statement(statement)?;
                }
            }

            AstNode::Declaration { name, ty, init, .. } => {
                if let Some(init) = init {
                    let offset = self.frame.offset(name).ok_or_else(|| {
                        CompileError::semantic("Unknown identifier", name.as_str(), node.location())
                    })?;
                    self.emit(format!("lea rax, [rbp{:+}]", offset));
                    self.push("rax");
                    self.gen_expr(init)?;
                    self.pop("rdi");
                    self.store(ty, node)?;
                }
            }

            AstNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let else_label = self.new_label();
                let end_label = self.new_label();

                self.gen_condition(condition, &else_label)?;
                self.gen_statement(then_branch)?;
                self.emit(format!("jmp {}", end_label));

                self.emit_label(&else_label);
                if let Some(else_branch) = else_branch {
                    self.gen_statement(else_branch)?;
                }
                self.emit_label(&end_label);
            }

            AstNode::While {
                condition, body, ..
            } => {
                let begin_label = self.new_label();
                let end_label = self.new_label();

                self.emit_label(&begin_label);
                self.gen_condition(condition, &end_label)?;
                self.gen_statement(body)?;
                self.emit(format!("jmp {}", begin_label));
                self.emit_label(&end_label);
            }

            AstNode::For {
                init,
                condition,
                step,
                body,
                ..
            } => {
                let begin_label = self.new_label();
                let end_label = self.new_label();

                if let Some(init) = init {
                    self.gen_expr(init)?;
                }
                self.emit_label(&begin_label);
                if let Some(condition) = condition {
                    self.gen_condition(condition, &end_label)?;
                }
                self.gen_statement(body)?;
                if let Some(step) = step {
                    self.gen_expr(step)?;
                }
                self.emit(format!("jmp {}", begin_label));
                self.emit_label(&end_label);
            }

            AstNode::Return { value, .. } => {
                match value {
                    Some(value) => self.gen_expr(value)?,
                    None => self.emit("mov rax, 0"),
                }
                self.gen_epilogue();
            }

            expr => self.gen_expr(expr)?,
        }

        debug_assert_eq!(
            self.depth,
            depth_before,
            "shadow stack unbalanced after statement at line {}",
            node.location().line
        );
        Ok(())
    }

    /// Evaluate `condition` and jump to `false_label` when it is zero
    fn gen_condition(&mut self, condition: &AstNode, false_label: &str) -> CompileResult<()> {
        self.gen_expr(condition)?;
        self.compare_zero(condition.ty().as_ref());
        self.emit(format!("je {}", false_label));
        Ok(())
    }
}
