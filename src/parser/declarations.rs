//! Declaration parsing implementation
//!
//! This module handles parsing of declarations:
//!
//! - Type specifiers: `char`, `short`, `int`, `struct tag { ... }`, `struct tag`
//! - Declarators: pointers and one array dimension
//! - Global variables, with initialisers folded to constants
//! - Function definitions and their parameters
//! - Local declarations inside compound statements
//!
//! # Grammar
//!
//! ```text
//! extern_decl  ::= function_def | global_decl
//! function_def ::= "int" identifier "(" params? ")" compound
//! params       ::= specifier "*"* identifier ("," specifier "*"* identifier)*
//! global_decl  ::= specifier (declarator ("=" assignment)?)? ";"
//! specifier    ::= "char" | "short" | "int"
//!                | "struct" identifier? "{" (specifier declarator ";")* "}"
//!                | "struct" identifier
//! declarator   ::= "*"* identifier ("[" integer "]")?
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::errors::{CompileError, CompileResult};
use crate::parser::ast::*;
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::parse::Parser;
use crate::parser::symbols::SymbolTable;
use crate::types::{StructType, Type, TypeError};
use std::rc::Rc;
use tracing::debug;

impl Parser {
    /// Parse one top-level declaration into `program`.
    ///
    /// Functions and globals share a prefix, so the specifier, stars and name
    /// are parsed once to peek at the following token and then parsed again
    /// from the saved cursor.
    pub(crate) fn parse_extern_declaration(&mut self, program: &mut Program) -> CompileResult<()> {
        let saved = self.snapshot();

        self.parse_type_specifier()?;
        while self.match_token(TokenKind::Star) {}
        let is_function = self.check(TokenKind::Ident)
            && self
                .peek_ahead(1)
                .is_some_and(|t| t.kind == TokenKind::LParen);

        self.restore(saved);

        if is_function {
            let function = self.parse_function_definition()?;
            if program.functions.iter().any(|f| f.name == function.name) {
                return Err(CompileError::semantic(
                    "Redefinition of function",
                    function.name,
                    function.location,
                ));
            }
            program.functions.push(function);
        } else if let Some(global) = self.parse_global_declaration()? {
            program.globals.push(global);
        }
        Ok(())
    }

    /// Parse a type specifier: a scalar keyword or a struct
    pub(crate) fn parse_type_specifier(&mut self) -> CompileResult<Type> {
        let ty = match self.peek().kind {
            TokenKind::Int => Type::Int,
            TokenKind::Char => Type::Char,
            TokenKind::Short => Type::Short,
            TokenKind::Struct => {
                self.advance();
                return self.parse_struct_specifier();
            }
            _ => {
                return Err(
                    self.syntax_error("A type specifier of int, char, short or struct was expected")
                )
            }
        };
        self.advance();
        Ok(ty)
    }

    /// Parse the remainder of `struct [tag] [{ members }]`
    fn parse_struct_specifier(&mut self) -> CompileResult<Type> {
        let tag = if self.check(TokenKind::Ident) {
            Some(self.advance())
        } else {
            None
        };

        if !self.match_token(TokenKind::LBrace) {
            let Some(tag) = tag else {
                return Err(self.syntax_error("'{' or a struct tag expected but not found."));
            };
            return self
                .lookup_struct_tag(&tag.text)
                .map(Type::Struct)
                .ok_or_else(|| self.semantic_error("Unknown struct tag", &tag));
        }

        if let Some(tag) = &tag {
            if self.lookup_struct_tag(&tag.text).is_some() {
                return Err(self.semantic_error("Redefinition of struct", tag));
            }
        }

        let mut layout = StructType::new();
        while !self.match_token(TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(self.syntax_error("A struct declaration not terminated with '}'."));
            }
            let base = self.parse_type_specifier()?;
            let (name, ty) = self.parse_declarator(base)?;
            layout
                .add_member(&name.text, ty)
                .map_err(|err| self.type_error(err, &name))?;
            self.expect_token(TokenKind::Semicolon, "A struct member not terminated with ';'.")?;
        }

        let layout = Rc::new(layout);
        if let Some(tag) = tag {
            self.struct_tags.push((tag.text, Rc::clone(&layout)));
        }
        Ok(Type::Struct(layout))
    }

    /// Wrap `base` in one pointer level per `*`
    pub(crate) fn parse_pointers(&mut self, mut base: Type) -> Type {
        while self.match_token(TokenKind::Star) {
            base = Type::pointer_to(base);
        }
        base
    }

    /// Parse `"*"* identifier ("[" integer "]")?` on top of `base`
    pub(crate) fn parse_declarator(&mut self, base: Type) -> CompileResult<(Token, Type)> {
        let ty = self.parse_pointers(base);
        let name = self.expect_identifier("An identifier is expected but not found.")?;

        if !self.match_token(TokenKind::LBracket) {
            return Ok((name, ty));
        }

        let len = self.expect_token(
            TokenKind::IntLiteral,
            "Array length must be specified with an integer literal.",
        )?;
        self.expect_token(TokenKind::RBracket, "No closing bracket for array length.")?;

        let len = usize::try_from(len.value.unwrap_or_default()).unwrap_or(usize::MAX);
        let array = Type::checked_array_of(ty, len).map_err(|err| self.type_error(err, &name))?;
        Ok((name, array))
    }

    /// Parse a type name as used by `sizeof(type)`
    pub(crate) fn parse_type_name(&mut self) -> CompileResult<Type> {
        let base = self.parse_type_specifier()?;
        Ok(self.parse_pointers(base))
    }

    /// Parse a global declaration. A bare `struct tag { ... };` yields `None`.
    fn parse_global_declaration(&mut self) -> CompileResult<Option<GlobalVar>> {
        let base = self.parse_type_specifier()?;
        if self.match_token(TokenKind::Semicolon) {
            return Ok(None);
        }

        let (name, ty) = self.parse_declarator(base)?;
        if self.globals.lookup(&name.text).is_some() {
            return Err(self.semantic_error("Redefinition of global variable", &name));
        }

        let init = if self.match_token(TokenKind::Eq) {
            let start = self.peek().clone();
            let expr = self.parse_assignment()?;
            let value = fold_constant(&expr).ok_or_else(|| {
                self.semantic_error("Global initializer must be a constant expression", &start)
            })?;
            Some(value)
        } else {
            None
        };

        self.expect_token(TokenKind::Semicolon, "A declaration not terminated with ';'.")?;
        self.globals.declare(&name.text, ty.clone(), name.location);

        Ok(Some(GlobalVar {
            name: name.text,
            ty,
            init,
            location: name.location,
        }))
    }

    /// Parse function definition: int name(params) { body }
    fn parse_function_definition(&mut self) -> CompileResult<FunctionDef> {
        if !self.check(TokenKind::Int) {
            return Err(self.syntax_error("Missing return type of a function definition."));
        }
        self.advance();
        if self.check(TokenKind::Star) {
            return Err(self.syntax_error("Functions can only return int."));
        }

        let name = self.expect_identifier("A function definition expected but not found.")?;
        self.expect_token(TokenKind::LParen, "'(' expected but not found.")?;

        self.locals = Some(SymbolTable::new());
        let params = self.parse_parameter_list()?;
        self.expect_token(TokenKind::RParen, "No closing parenthesis ')' for parameter list.")?;

        let body = self.parse_compound()?;
        let locals = self.locals.take().unwrap_or_default();

        debug!(
            function = %name.text,
            params = params.len(),
            locals = locals.len(),
            "parsed function"
        );

        Ok(FunctionDef {
            name: name.text,
            params,
            body,
            return_type: Type::Int,
            locals,
            location: name.location,
        })
    }

    /// Parse parameter list up to (not including) the closing parenthesis
    fn parse_parameter_list(&mut self) -> CompileResult<Vec<Param>> {
        let mut params = Vec::new();

        if self.check(TokenKind::RParen) {
            return Ok(params);
        }

        loop {
            if !self.is_type_keyword() {
                return Err(
                    self.syntax_error("Missing type specifier for a function parameter.")
                );
            }
            let base = self.parse_type_specifier()?;
            let param_type = self.parse_pointers(base);
            let name = self.expect_identifier("An identifier is expected but not found.")?;
            if param_type.as_struct().is_some() {
                return Err(self.semantic_error("Struct parameters are not supported", &name));
            }

            self.declare_local(&name, param_type.clone());
            params.push(Param {
                name: name.text,
                param_type,
                location: name.location,
            });

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    /// Parse a local declaration statement. A bare struct specifier parses to
    /// [`AstNode::Blank`].
    pub(crate) fn parse_local_declaration(&mut self) -> CompileResult<AstNode> {
        let location = self.current_location();
        let base = self.parse_type_specifier()?;
        if self.match_token(TokenKind::Semicolon) {
            return Ok(AstNode::Blank { location });
        }

        let (name, ty) = self.parse_declarator(base)?;
        let init = if self.match_token(TokenKind::Eq) {
            Some(Box::new(self.parse_assignment()?))
        } else {
            None
        };
        self.expect_token(TokenKind::Semicolon, "A declaration not terminated with ';'.")?;

        self.declare_local(&name, ty.clone());
        Ok(AstNode::Declaration {
            name: name.text,
            ty,
            init,
            location: name.location,
        })
    }

    fn declare_local(&mut self, name: &Token, ty: Type) {
        if let Some(locals) = self.locals.as_mut() {
            locals.declare(&name.text, ty, name.location);
        }
    }

    pub(crate) fn type_error(&self, err: TypeError, token: &Token) -> CompileError {
        self.semantic_error(&err.to_string(), token)
    }
}

/// Evaluate an expression built only from literals, or `None` if it is not
/// constant
pub(crate) fn fold_constant(node: &AstNode) -> Option<i64> {
    match node {
        AstNode::IntLiteral { value, .. } => Some(*value),
        AstNode::BinaryOp { op, lhs, rhs, .. } => {
            let l = fold_constant(lhs)?;
            let r = fold_constant(rhs)?;
            let value = match op {
                BinOp::Add => l.wrapping_add(r),
                BinOp::Sub => l.wrapping_sub(r),
                BinOp::Mul => l.wrapping_mul(r),
                BinOp::Div => l.checked_div(r)?,
                BinOp::BitAnd => l & r,
                BinOp::BitOr => l | r,
                BinOp::BitXor => l ^ r,
                BinOp::Eq => (l == r) as i64,
                BinOp::Ne => (l != r) as i64,
                BinOp::Lt => (l < r) as i64,
                BinOp::Le => (l <= r) as i64,
                BinOp::Gt => (l > r) as i64,
                BinOp::Ge => (l >= r) as i64,
                BinOp::Assign => return None,
            };
            Some(value)
        }
        AstNode::LogicalOp { op, lhs, rhs, .. } => {
            let l = fold_constant(lhs)? != 0;
            let r = fold_constant(rhs)? != 0;
            let value = match op {
                LogicalOp::And => l && r,
                LogicalOp::Or => l || r,
            };
            Some(value as i64)
        }
        _ => None,
    }
}
