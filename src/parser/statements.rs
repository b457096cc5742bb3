//! Statement parsing implementation
//!
//! This module handles parsing of all statement types:
//!
//! - Compound statements: `{ ... }`, mixing declarations and statements
//! - Control flow: `if`, `while`, `for`
//! - `return`, with or without a value
//! - Empty statements and expression statements
//!
//! # Grammar
//!
//! ```text
//! compound  ::= "{" (declaration | statement)* "}"
//! statement ::= ";" | compound | if_stmt | while_stmt | for_stmt
//!             | "return" expression? ";" | expression ";"
//! for_stmt  ::= "for" "(" expression? ";" expression? ";" expression? ")" statement
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::errors::CompileResult;
use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::Parser;

impl Parser {
    /// Parse a compound statement including its braces
    pub(crate) fn parse_compound(&mut self) -> CompileResult<AstNode> {
        let location = self.current_location();
        self.expect_token(TokenKind::LBrace, "'{' expected but not found.")?;

        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            let statement = if self.is_type_keyword() {
                self.parse_local_declaration()?
            } else {
                self.parse_statement()?
            };
            statements.push(statement);
        }

        self.expect_token(
            TokenKind::RBrace,
            "A compound statement not terminated with '}'.",
        )?;

        Ok(AstNode::Compound {
            statements,
            location,
        })
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> CompileResult<AstNode> {
        let location = self.current_location();

        match self.peek().kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(AstNode::Blank { location })
            }
            TokenKind::LBrace => self.parse_compound(),
            TokenKind::If => {
                self.advance();
                self.parse_if_statement(location)
            }
            TokenKind::While => {
                self.advance();
                self.parse_while_statement(location)
            }
            TokenKind::For => {
                self.advance();
                self.parse_for_statement(location)
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(TokenKind::Semicolon) {
                    None
                } else {
                    Some(Box::new(self.parse_expression()?))
                };
                self.expect_semicolon()?;
                Ok(AstNode::Return { value, location })
            }
            _ => {
                let expr = self.parse_expression()?;
                self.expect_semicolon()?;
                Ok(expr)
            }
        }
    }

    fn expect_semicolon(&mut self) -> CompileResult<()> {
        self.expect_token(TokenKind::Semicolon, "A statement not terminated with ';'.")?;
        Ok(())
    }

    /// Parse a parenthesised condition
    fn parse_condition(&mut self, keyword: &str) -> CompileResult<AstNode> {
        self.expect_token(TokenKind::LParen, &format!("Expected '(' after '{keyword}'"))?;
        let condition = self.parse_expression()?;
        self.expect_token(
            TokenKind::RParen,
            &format!("Expected ')' after {keyword} condition"),
        )?;
        Ok(condition)
    }

    fn parse_if_statement(&mut self, location: SourceLocation) -> CompileResult<AstNode> {
        let condition = Box::new(self.parse_condition("if")?);
        let then_branch = Box::new(self.parse_statement()?);

        let else_branch = if self.match_token(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(AstNode::If {
            condition,
            then_branch,
            else_branch,
            location,
        })
    }

    fn parse_while_statement(&mut self, location: SourceLocation) -> CompileResult<AstNode> {
        let condition = Box::new(self.parse_condition("while")?);
        let body = Box::new(self.parse_statement()?);

        Ok(AstNode::While {
            condition,
            body,
            location,
        })
    }

    fn parse_for_statement(&mut self, location: SourceLocation) -> CompileResult<AstNode> {
        self.expect_token(TokenKind::LParen, "Expected '(' after 'for'")?;

        let init = self.parse_optional_expression(TokenKind::Semicolon)?;
        self.expect_token(TokenKind::Semicolon, "Expected ';' after for initializer")?;

        let condition = self.parse_optional_expression(TokenKind::Semicolon)?;
        self.expect_token(TokenKind::Semicolon, "Expected ';' after for condition")?;

        let step = self.parse_optional_expression(TokenKind::RParen)?;
        self.expect_token(TokenKind::RParen, "Expected ')' after for clauses")?;

        let body = Box::new(self.parse_statement()?);

        Ok(AstNode::For {
            init,
            condition,
            step,
            body,
            location,
        })
    }

    /// Parse an expression unless the next token is `terminator`
    fn parse_optional_expression(
        &mut self,
        terminator: TokenKind,
    ) -> CompileResult<Option<Box<AstNode>>> {
        if self.check(terminator) {
            Ok(None)
        } else {
            Ok(Some(Box::new(self.parse_expression()?)))
        }
    }
}
