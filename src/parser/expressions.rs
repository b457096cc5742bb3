//! Expression parsing implementation
//!
//! One method per precedence level, lowest first. Binary levels loop and are
//! left-associative; assignment recurses and is right-associative.
//!
//! ```text
//! assignment     ::= logical_or (assign_op assignment)?
//! logical_or     ::= logical_and ("||" logical_and)*
//! logical_and    ::= bitwise_or ("&&" bitwise_or)*
//! bitwise_or     ::= bitwise_xor ("|" bitwise_xor)*
//! bitwise_xor    ::= bitwise_and ("^" bitwise_and)*
//! bitwise_and    ::= equality ("&" equality)*
//! equality       ::= relational (("==" | "!=") relational)*
//! relational     ::= additive (("<" | "<=" | ">" | ">=") additive)*
//! additive       ::= multiplicative (("+" | "-") multiplicative)*
//! multiplicative ::= unary (("*" | "/") unary)*
//! unary          ::= ("++" | "--" | "*" | "&" | "-" | "+") unary
//!                  | "sizeof" "(" type_name ")" | "sizeof" unary | postfix
//! postfix        ::= primary ("[" expression "]" | "(" args? ")" | "." identifier
//!                  | "++" | "--")*
//! primary        ::= integer | string | identifier | "(" expression ")"
//! ```
//!
//! Every node is typed as it is built. `a[i]` becomes `*(a + i)`, unary minus
//! becomes `0 - x`, and `sizeof` folds to an integer literal.

use crate::errors::CompileResult;
use crate::parser::ast::*;
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::parse::Parser;
use crate::types::{deduce_type, size_of, Type};

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> CompileResult<AstNode> {
        self.parse_assignment()
    }

    /// Parse assignment (right-associative)
    pub(crate) fn parse_assignment(&mut self) -> CompileResult<AstNode> {
        let lhs = self.parse_logical_or()?;

        let op = match self.peek().kind {
            TokenKind::Eq => None,
            TokenKind::PlusEq => Some(BinOp::Add),
            TokenKind::MinusEq => Some(BinOp::Sub),
            TokenKind::StarEq => Some(BinOp::Mul),
            TokenKind::SlashEq => Some(BinOp::Div),
            TokenKind::PipeEq => Some(BinOp::BitOr),
            TokenKind::CaretEq => Some(BinOp::BitXor),
            TokenKind::AmpEq => Some(BinOp::BitAnd),
            _ => return Ok(lhs),
        };
        let op_token = self.advance();
        let rhs = self.parse_assignment()?;

        // Compound forms must also be valid as plain binary operations
        if let Some(op) = op {
            deduce_type(&op, lhs.ty().as_ref(), rhs.ty().as_ref())
                .map_err(|err| self.type_error(err, &op_token))?;
        }
        let ty = deduce_type(&BinOp::Assign, lhs.ty().as_ref(), rhs.ty().as_ref())
            .map_err(|err| self.type_error(err, &op_token))?;

        Ok(AstNode::Assignment {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            ty,
            location: op_token.location,
        })
    }

    /// Parse logical OR (||)
    fn parse_logical_or(&mut self) -> CompileResult<AstNode> {
        let mut left = self.parse_logical_and()?;

        while self.check(TokenKind::OrOr) {
            let location = self.advance().location;
            let right = self.parse_logical_and()?;
            left = AstNode::LogicalOp {
                op: LogicalOp::Or,
                lhs: Box::new(left),
                rhs: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    /// Parse logical AND (&&)
    fn parse_logical_and(&mut self) -> CompileResult<AstNode> {
        let mut left = self.parse_bitwise_or()?;

        while self.check(TokenKind::AndAnd) {
            let location = self.advance().location;
            let right = self.parse_bitwise_or()?;
            left = AstNode::LogicalOp {
                op: LogicalOp::And,
                lhs: Box::new(left),
                rhs: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    /// Parse bitwise OR (|)
    fn parse_bitwise_or(&mut self) -> CompileResult<AstNode> {
        let mut left = self.parse_bitwise_xor()?;

        while self.check(TokenKind::Pipe) {
            let op_token = self.advance();
            let right = self.parse_bitwise_xor()?;
            left = self.binary(BinOp::BitOr, left, right, &op_token)?;
        }

        Ok(left)
    }

    /// Parse bitwise XOR (^)
    fn parse_bitwise_xor(&mut self) -> CompileResult<AstNode> {
        let mut left = self.parse_bitwise_and()?;

        while self.check(TokenKind::Caret) {
            let op_token = self.advance();
            let right = self.parse_bitwise_and()?;
            left = self.binary(BinOp::BitXor, left, right, &op_token)?;
        }

        Ok(left)
    }

    /// Parse bitwise AND (&)
    fn parse_bitwise_and(&mut self) -> CompileResult<AstNode> {
        let mut left = self.parse_equality()?;

        while self.check(TokenKind::Amp) {
            let op_token = self.advance();
            let right = self.parse_equality()?;
            left = self.binary(BinOp::BitAnd, left, right, &op_token)?;
        }

        Ok(left)
    }

    /// Parse equality (==, !=)
    fn parse_equality(&mut self) -> CompileResult<AstNode> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                _ => break,
            };
            let op_token = self.advance();
            let right = self.parse_relational()?;
            left = self.binary(op, left, right, &op_token)?;
        }

        Ok(left)
    }

    /// Parse relational (<, <=, >, >=)
    fn parse_relational(&mut self) -> CompileResult<AstNode> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            let op_token = self.advance();
            let right = self.parse_additive()?;
            left = self.binary(op, left, right, &op_token)?;
        }

        Ok(left)
    }

    /// Parse additive (+, -)
    fn parse_additive(&mut self) -> CompileResult<AstNode> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let op_token = self.advance();
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right, &op_token)?;
        }

        Ok(left)
    }

    /// Parse multiplicative (*, /)
    fn parse_multiplicative(&mut self) -> CompileResult<AstNode> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            let op_token = self.advance();
            let right = self.parse_unary()?;
            left = self.binary(op, left, right, &op_token)?;
        }

        Ok(left)
    }

    /// Parse unary operators
    fn parse_unary(&mut self) -> CompileResult<AstNode> {
        let op_token = self.peek().clone();
        let location = op_token.location;

        let op = match op_token.kind {
            TokenKind::PlusPlus => UnOp::PreInc,
            TokenKind::MinusMinus => UnOp::PreDec,
            TokenKind::Star => UnOp::Deref,
            TokenKind::Amp => UnOp::AddrOf,
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                let zero = AstNode::IntLiteral { value: 0, location };
                return self.binary(BinOp::Sub, zero, operand, &op_token);
            }
            TokenKind::Plus => {
                self.advance();
                return self.parse_unary();
            }
            TokenKind::Sizeof => {
                self.advance();
                return self.parse_sizeof(&op_token);
            }
            _ => return self.parse_postfix(),
        };

        self.advance();
        let operand = self.parse_unary()?;
        self.unary(op, operand, &op_token)
    }

    /// Parse `sizeof(type)` or `sizeof unary` into an integer literal
    fn parse_sizeof(&mut self, op_token: &Token) -> CompileResult<AstNode> {
        let is_type_name = self.check(TokenKind::LParen)
            && self.peek_ahead(1).is_some_and(|t| {
                matches!(
                    t.kind,
                    TokenKind::Int | TokenKind::Char | TokenKind::Short | TokenKind::Struct
                )
            });

        let ty = if is_type_name {
            self.advance();
            let ty = self.parse_type_name()?;
            self.expect_token(
                TokenKind::RParen,
                "A closing parenthesis was expected but not found.",
            )?;
            ty
        } else {
            let operand = self.parse_unary()?;
            operand.ty().ok_or_else(|| {
                self.semantic_error("sizeof applied to an unknown identifier", op_token)
            })?
        };

        Ok(AstNode::IntLiteral {
            value: size_of(&ty) as i64,
            location: op_token.location,
        })
    }

    /// Parse postfix operators: indexing, calls, member access, `++`, `--`
    fn parse_postfix(&mut self) -> CompileResult<AstNode> {
        let mut node = self.parse_primary()?;

        loop {
            let op_token = self.peek().clone();
            match op_token.kind {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect_token(TokenKind::RBracket, "No closing bracket for array index.")?;
                    let sum = self.binary(BinOp::Add, node, index, &op_token)?;
                    node = self.unary(UnOp::Deref, sum, &op_token)?;
                }
                TokenKind::LParen => {
                    self.advance();
                    node = self.parse_call(node, &op_token)?;
                }
                TokenKind::Dot => {
                    self.advance();
                    node = self.parse_member_access(node)?;
                }
                TokenKind::PlusPlus => {
                    self.advance();
                    node = self.unary(UnOp::PostInc, node, &op_token)?;
                }
                TokenKind::MinusMinus => {
                    self.advance();
                    node = self.unary(UnOp::PostDec, node, &op_token)?;
                }
                _ => break,
            }
        }

        Ok(node)
    }

    /// Parse call arguments after `(`; only named functions can be called
    fn parse_call(&mut self, callee: AstNode, paren: &Token) -> CompileResult<AstNode> {
        let (name, location) = match callee {
            AstNode::Identifier { name, location, .. } => (name, location),
            _ => return Err(self.semantic_error("Only named functions can be called", paren)),
        };

        let mut args = Vec::new();
        if !self.match_token(TokenKind::RParen) {
            loop {
                args.push(self.parse_assignment()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
            self.expect_token(
                TokenKind::RParen,
                "No closing parenthesis ')' for function call.",
            )?;
        }

        Ok(AstNode::Call {
            name,
            args,
            location,
        })
    }

    /// Parse the member name after `.`
    fn parse_member_access(&mut self, base: AstNode) -> CompileResult<AstNode> {
        let member = self.expect_identifier("A member name is expected after '.'")?;

        let base_type = base.ty();
        let layout = base_type
            .as_ref()
            .and_then(Type::as_struct)
            .ok_or_else(|| self.semantic_error("Member reference base is not a struct", &member))?;
        let ty = layout
            .member(&member.text)
            .map(|m| m.ty.clone())
            .ok_or_else(|| self.semantic_error("No such struct member", &member))?;

        Ok(AstNode::MemberAccess {
            base: Box::new(base),
            member: member.text,
            ty,
            location: member.location,
        })
    }

    /// Parse primary expressions
    fn parse_primary(&mut self) -> CompileResult<AstNode> {
        let token = self.peek().clone();
        let location = token.location;

        match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                Ok(AstNode::IntLiteral {
                    value: token.value.unwrap_or_default(),
                    location,
                })
            }
            TokenKind::StringLiteral => {
                self.advance();
                let index = self.strings.intern(&token.text);
                let len = token.value.unwrap_or_default() as usize + 1;
                Ok(AstNode::StringLiteral {
                    text: token.text,
                    index,
                    ty: Type::array_of(Type::Char, len),
                    location,
                })
            }
            TokenKind::Ident => {
                self.advance();
                let (ty, scope) = match self.lookup_variable(&token.text) {
                    Some((ty, scope)) => (Some(ty), scope),
                    None => (None, Scope::Unresolved),
                };
                Ok(AstNode::Identifier {
                    name: token.text,
                    ty,
                    scope,
                    location,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_token(
                    TokenKind::RParen,
                    "A closing parenthesis was expected but not found.",
                )?;
                Ok(expr)
            }
            _ => Err(self.syntax_error("A token neither a number nor an opening parenthesis.")),
        }
    }

    // ===== Node builders =====

    /// Build a typed binary operation
    fn binary(
        &self,
        op: BinOp,
        lhs: AstNode,
        rhs: AstNode,
        op_token: &Token,
    ) -> CompileResult<AstNode> {
        let ty = deduce_type(&op, lhs.ty().as_ref(), rhs.ty().as_ref())
            .map_err(|err| self.type_error(err, op_token))?;

        Ok(AstNode::BinaryOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            ty,
            location: op_token.location,
        })
    }

    /// Build a typed unary operation
    fn unary(&self, op: UnOp, operand: AstNode, op_token: &Token) -> CompileResult<AstNode> {
        let operand_ty = operand.ty();
        let ty = match op {
            UnOp::AddrOf => operand_ty.map(Type::pointer_to),
            UnOp::Deref => match operand_ty {
                Some(ty) => Some(ty.pointee().cloned().ok_or_else(|| {
                    self.semantic_error("Dereference of a non-pointer value", op_token)
                })?),
                None => None,
            },
            UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec => operand_ty,
        };

        Ok(AstNode::UnaryOp {
            op,
            operand: Box::new(operand),
            ty,
            location: op_token.location,
        })
    }
}
