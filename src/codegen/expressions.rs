//! Expression code generation
//!
//! Each `gen_*` method leaves the expression's value in `rax` and the stack
//! depth as it found it. Integer results are kept sign- or zero-extended to
//! 64 bits according to their static type.

use super::constants::STRING_LABEL_PREFIX;
use super::CodeGen;
use crate::errors::{CompileError, CompileResult};
use crate::parser::ast::*;
use crate::types::{size_of, Type};

/// Scale applied to the integer side of pointer arithmetic
fn pointer_scale(ty: Option<&Type>) -> Option<usize> {
    ty.filter(|t| t.is_pointer_like())
        .and_then(Type::pointee)
        .map(size_of)
}

impl CodeGen {
    pub(crate) fn gen_expr(&mut self, node: &AstNode) -> CompileResult<()> {
        match node {
            AstNode::IntLiteral { value, .. } => {
                self.emit(format!("mov rax, {}", value));
                Ok(())
            }

            AstNode::StringLiteral { index, .. } => {
                self.emit(format!("lea rax, [rip + {}{}]", STRING_LABEL_PREFIX, index));
                Ok(())
            }

            AstNode::Identifier { .. } | AstNode::MemberAccess { .. } => {
                let ty = Self::expr_type(node)?;
                self.gen_lval(node)?;
                self.load(&ty);
                Ok(())
            }

            AstNode::UnaryOp { op, operand, .. } => self.gen_unary(*op, operand, node),

            AstNode::BinaryOp { op, lhs, rhs, .. } => self.gen_binary(*op, lhs, rhs, node),

            AstNode::LogicalOp { op, lhs, rhs, .. } => self.gen_logical(*op, lhs, rhs),

            AstNode::Assignment { op, lhs, rhs, .. } => self.gen_assignment(*op, lhs, rhs),

            AstNode::Call { name, args, .. } => self.gen_call(name, args),

            _ => Err(CompileError::semantic(
                "Statement used as an expression",
                node.describe(),
                node.location(),
            )),
        }
    }

    /// Static type of `node`; only unresolved identifiers lack one
    pub(crate) fn expr_type(node: &AstNode) -> CompileResult<Type> {
        node.ty().ok_or_else(|| {
            CompileError::semantic("Unknown identifier", node.describe(), node.location())
        })
    }

    fn gen_unary(&mut self, op: UnOp, operand: &AstNode, node: &AstNode) -> CompileResult<()> {
        match op {
            UnOp::AddrOf => self.gen_lval(operand),
            UnOp::Deref => {
                let ty = Self::expr_type(node)?;
                self.gen_lval(node)?;
                self.load(&ty);
                Ok(())
            }
            UnOp::PreInc | UnOp::PreDec => {
                let ty = Self::expr_type(operand)?;
                self.gen_lval(operand)?;
                self.push("rax");
                self.emit("mov rax, qword ptr [rsp]");
                self.load(&ty);
                self.gen_step(op, &ty);
                self.pop("rdi");
                self.store(&ty, operand)?;
                self.truncate(&ty);
                Ok(())
            }
            UnOp::PostInc | UnOp::PostDec => {
                let ty = Self::expr_type(operand)?;
                self.gen_lval(operand)?;
                self.push("rax");
                self.load(&ty);
                self.push("rax");
                self.gen_step(op, &ty);
                self.emit("mov rdi, qword ptr [rsp+8]");
                self.store(&ty, operand)?;
                self.pop("rax");
                self.pop("rdi");
                Ok(())
            }
        }
    }

    /// Add or subtract one element to the value in `rax`
    fn gen_step(&mut self, op: UnOp, ty: &Type) {
        let step = pointer_scale(Some(ty)).unwrap_or(1);
        match op {
            UnOp::PreInc | UnOp::PostInc => self.emit(format!("add rax, {}", step)),
            _ => self.emit(format!("sub rax, {}", step)),
        }
    }

    fn gen_binary(
        &mut self,
        op: BinOp,
        lhs: &AstNode,
        rhs: &AstNode,
        node: &AstNode,
    ) -> CompileResult<()> {
        if matches!(op, BinOp::Add | BinOp::Sub) {
            return self.gen_additive(op, lhs, rhs, node);
        }

        self.gen_expr(lhs)?;
        self.push("rax");
        self.gen_expr(rhs)?;
        self.emit("mov rdi, rax");
        self.pop("rax");
        self.gen_operator(op, node)
    }

    /// `lhs ± rhs`, scaling the integer side when the other side is a pointer
    pub(crate) fn gen_additive(
        &mut self,
        op: BinOp,
        lhs: &AstNode,
        rhs: &AstNode,
        node: &AstNode,
    ) -> CompileResult<()> {
        let lhs_ty = lhs.ty();
        let rhs_ty = rhs.ty();
        let lhs_scale = pointer_scale(lhs_ty.as_ref());
        let rhs_scale = pointer_scale(rhs_ty.as_ref());

        if lhs_scale.is_some() && rhs_scale.is_some() {
            return Err(CompileError::semantic(
                "Pointer +/- pointer operation not supported",
                node.describe(),
                node.location(),
            ));
        }

        self.gen_expr(lhs)?;
        if let Some(scale) = rhs_scale.filter(|&s| s != 1) {
            self.emit(format!("imul rax, rax, {}", scale));
        }
        self.push("rax");
        self.gen_expr(rhs)?;
        if let Some(scale) = lhs_scale.filter(|&s| s != 1) {
            self.emit(format!("imul rax, rax, {}", scale));
        }
        self.emit("mov rdi, rax");
        self.pop("rax");
        self.gen_operator(op, node)
    }

    /// `rax = rax op rdi`
    pub(crate) fn gen_operator(&mut self, op: BinOp, node: &AstNode) -> CompileResult<()> {
        match op {
            BinOp::Add => self.emit("add rax, rdi"),
            BinOp::Sub => self.emit("sub rax, rdi"),
            BinOp::Mul => self.emit("imul rax, rdi"),
            BinOp::Div => {
                self.emit("cqo");
                self.emit("idiv rdi");
            }
            BinOp::BitAnd => self.emit("and rax, rdi"),
            BinOp::BitOr => self.emit("or rax, rdi"),
            BinOp::BitXor => self.emit("xor rax, rdi"),
            BinOp::Eq => self.gen_compare("sete"),
            BinOp::Ne => self.gen_compare("setne"),
            BinOp::Lt => self.gen_compare("setl"),
            BinOp::Le => self.gen_compare("setle"),
            BinOp::Gt => self.gen_compare("setg"),
            BinOp::Ge => self.gen_compare("setge"),
            BinOp::Assign => {
                return Err(CompileError::semantic(
                    "Unexpected operator",
                    node.describe(),
                    node.location(),
                ))
            }
        }
        Ok(())
    }

    fn gen_compare(&mut self, set: &str) {
        self.emit("cmp rax, rdi");
        self.emit(format!("{} al", set));
        self.emit("movzx eax, al");
    }

    /// Short-circuit `&&` and `||`, producing 0 or 1
    fn gen_logical(&mut self, op: LogicalOp, lhs: &AstNode, rhs: &AstNode) -> CompileResult<()> {
        let short_circuit = self.new_label();
        let end = self.new_label();
        let (jump, short_value, other_value) = match op {
            LogicalOp::And => ("je", 0, 1),
            LogicalOp::Or => ("jne", 1, 0),
        };

        for operand in [lhs, rhs] {
            self.gen_expr(operand)?;
            self.compare_zero(operand.ty().as_ref());
            self.emit(format!("{} {}", jump, short_circuit));
        }
        self.emit(format!("mov rax, {}", other_value));
        self.emit(format!("jmp {}", end));
        self.emit_label(&short_circuit);
        self.emit(format!("mov rax, {}", short_value));
        self.emit_label(&end);
        Ok(())
    }

    fn gen_assignment(
        &mut self,
        op: Option<BinOp>,
        lhs: &AstNode,
        rhs: &AstNode,
    ) -> CompileResult<()> {
        let ty = Self::expr_type(lhs)?;
        self.gen_lval(lhs)?;
        self.push("rax");
        self.gen_expr(rhs)?;

        if let Some(op) = op {
            self.push("rax");
            self.emit("mov rax, qword ptr [rsp+8]");
            self.load(&ty);
            self.pop("rdi");
            if let Some(scale) = pointer_scale(Some(&ty)).filter(|&s| s != 1) {
                if matches!(op, BinOp::Add | BinOp::Sub) {
                    self.emit(format!("imul rdi, rdi, {}", scale));
                }
            }
            self.gen_operator(op, lhs)?;
        }

        self.pop("rdi");
        self.store(&ty, lhs)?;
        self.truncate(&ty);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::CompileError;
    use crate::{codegen::generate, parser::parse_source};

    fn compile(source: &str) -> Result<String, CompileError> {
        generate(&parse_source(source)?)
    }

    fn main_body(body: &str) -> String {
        compile(&format!("int main() {{ {} }}", body)).unwrap()
    }

    #[test]
    fn test_typed_loads() {
        let asm = main_body("char c; short s; int i; int *p; c; s; i; p; return 0;");
        assert!(asm.contains("movzx eax, byte ptr [rax]"));
        assert!(asm.contains("movzx eax, word ptr [rax]"));
        assert!(asm.contains("movsxd rax, dword ptr [rax]"));
        assert!(asm.contains("mov rax, qword ptr [rax]"));
    }

    #[test]
    fn test_arrays_decay_without_load() {
        let asm = main_body("int a[3]; int *p; p = a; return 0;");
        assert!(asm.contains("lea rax, [rbp-16]\n\tpop rdi\n\tmov qword ptr [rdi], rax\n"));
    }

    #[test]
    fn test_pointer_arithmetic_scaling() {
        let asm = main_body("int *p; short *q; char *r; p + 2; 3 + q; r + 1; return 0;");
        assert!(asm.contains("mov rax, 2\n\timul rax, rax, 4\n"));
        assert!(asm.contains("mov rax, 3\n\timul rax, rax, 2\n"));
        assert_eq!(asm.matches("imul rax, rax").count(), 2);
    }

    #[test]
    fn test_signed_division_and_comparison() {
        let asm = main_body("return -5 / 5 < 0;");
        assert!(asm.contains("cqo\n\tidiv rdi\n"));
        assert!(asm.contains("cmp rax, rdi\n\tsetl al\n\tmovzx eax, al\n"));
    }

    #[test]
    fn test_assignment_stores_and_truncates() {
        let asm = main_body("char c; c = 257; return c;");
        assert!(asm.contains("pop rdi\n\tmov byte ptr [rdi], al\n\tmovzx eax, al\n"));
    }

    #[test]
    fn test_compound_assignment_reloads_target() {
        let asm = main_body("int *p; p -= 1; return 0;");
        assert!(asm.contains(
            "push rax\n\tmov rax, qword ptr [rsp+8]\n\tmov rax, qword ptr [rax]\n\tpop rdi\n\timul rdi, rdi, 4\n\tsub rax, rdi\n\tpop rdi\n\tmov qword ptr [rdi], rax\n"
        ));
    }

    #[test]
    fn test_increments() {
        let asm = main_body("int *p; char c; ++p; c--; return 0;");
        assert!(asm.contains("add rax, 4\n\tpop rdi\n\tmov qword ptr [rdi], rax\n"));
        assert!(asm.contains("sub rax, 1\n\tmov rdi, qword ptr [rsp+8]\n\tmov byte ptr [rdi], al\n\tpop rax\n\tpop rdi\n"));
    }

    #[test]
    fn test_logical_short_circuit_labels() {
        let asm = main_body("int a; int b; return a && b;");
        assert!(asm.contains("je .L0"));
        assert!(asm.contains("mov rax, 1\n\tjmp .L1\n.L0:\n\tmov rax, 0\n.L1:\n"));
    }

    #[test]
    fn test_struct_assignment_is_rejected() {
        let err = compile("int main() { struct { int x; } a; struct { int x; } b; a = b; return 0; }")
            .unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }
}
