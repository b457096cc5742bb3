//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure:
//! cursor helpers, scope lookup and the program entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: type specifiers, declarators, globals and function definitions
//! - `statements`: compound statements and control flow
//! - `expressions`: expressions, one method per precedence level
//!
//! Types are resolved while parsing. Every expression node leaves the parser
//! carrying its static type, so code generation never re-derives one.
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::errors::{CompileError, CompileResult};
use crate::parser::ast::*;
use crate::parser::lexer::{Lexer, Token, TokenKind};
use crate::parser::symbols::{StringPool, SymbolTable};
use crate::types::{StructType, Type};
use std::rc::Rc;
use tracing::debug;

/// Recursive descent parser for the C subset
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) globals: SymbolTable,
    /// Locals of the function being parsed; `None` at file scope
    pub(crate) locals: Option<SymbolTable>,
    pub(crate) struct_tags: Vec<(String, Rc<StructType>)>,
    pub(crate) strings: StringPool,
}

/// Cursor state saved before a speculative parse
#[derive(Debug, Clone, Copy)]
pub(crate) struct Snapshot {
    position: usize,
    struct_tags: usize,
}

impl Parser {
    pub fn new(source: &str) -> CompileResult<Self> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
            globals: SymbolTable::new(),
            locals: None,
            struct_tags: Vec::new(),
            strings: StringPool::new(),
        })
    }

    /// Parse the entire program (top-level declarations)
    pub fn parse_program(mut self) -> CompileResult<Program> {
        let mut program = Program::new();

        while !self.is_at_end() {
            self.parse_extern_declaration(&mut program)?;
        }

        debug!(
            functions = program.functions.len(),
            globals = program.globals.len(),
            strings = self.strings.len(),
            "parsed program"
        );
        program.strings = self.strings;
        Ok(program)
    }

    // ===== Cursor helpers =====

    pub(crate) fn is_type_keyword(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Int | TokenKind::Char | TokenKind::Short | TokenKind::Struct
        )
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    pub(crate) fn peek(&self) -> &Token {
        // The lexer always terminates the stream with Eof and the cursor never
        // moves past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            position: self.position,
            struct_tags: self.struct_tags.len(),
        }
    }

    /// Rewind to `snapshot`, forgetting struct tags declared since
    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.position = snapshot.position;
        self.struct_tags.truncate(snapshot.struct_tags);
    }

    // ===== Errors =====

    fn token_text(token: &Token) -> String {
        if token.kind == TokenKind::Eof {
            "end of file".to_string()
        } else {
            token.text.clone()
        }
    }

    /// Syntax error quoting the current token
    pub(crate) fn syntax_error(&self, message: &str) -> CompileError {
        let token = self.peek();
        CompileError::syntax(message, Self::token_text(token), token.location)
    }

    pub(crate) fn semantic_error(&self, message: &str, token: &Token) -> CompileError {
        CompileError::semantic(message, Self::token_text(token), token.location)
    }

    pub(crate) fn expect_token(&mut self, kind: TokenKind, message: &str) -> CompileResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.syntax_error(message))
        }
    }

    pub(crate) fn expect_identifier(&mut self, message: &str) -> CompileResult<Token> {
        self.expect_token(TokenKind::Ident, message)
    }

    // ===== Scopes =====

    /// Resolve a variable, locals first
    pub(crate) fn lookup_variable(&self, name: &str) -> Option<(Type, Scope)> {
        if let Some(symbol) = self.locals.as_ref().and_then(|l| l.lookup(name)) {
            return Some((symbol.ty.clone(), Scope::Local));
        }
        self.globals
            .lookup(name)
            .map(|symbol| (symbol.ty.clone(), Scope::Global))
    }

    pub(crate) fn lookup_struct_tag(&self, tag: &str) -> Option<Rc<StructType>> {
        self.struct_tags
            .iter()
            .rev()
            .find(|(name, _)| name == tag)
            .map(|(_, layout)| Rc::clone(layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    #[test]
    fn test_parse_simple_function() {
        let program = parse_source("int main() { return 0; }").unwrap();

        assert_eq!(program.functions.len(), 1);
        let main = &program.functions[0];
        assert_eq!(main.name, "main");
        assert!(main.params.is_empty());
        assert_eq!(main.return_type, Type::Int);
        match &main.body {
            AstNode::Compound { statements, .. } => assert_eq!(statements.len(), 1),
            other => panic!("Expected compound body, got {:?}", other),
        }
    }

    #[test]
    fn test_globals_and_functions_are_told_apart() {
        let source = "int g; int *gp; char gs[4]; int f(int a) { return a; } int main() { return f(g); }";
        let program = parse_source(source).unwrap();

        let names: Vec<_> = program.globals.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["g", "gp", "gs"]);
        assert_eq!(program.globals[2].ty, Type::array_of(Type::Char, 4));

        let funcs: Vec<_> = program.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(funcs, vec!["f", "main"]);
    }

    #[test]
    fn test_snapshot_forgets_speculative_struct_tags() {
        let source = "struct P { int x; } p; int main() { struct P q; return 0; }";
        let program = parse_source(source).unwrap();
        assert_eq!(program.globals.len(), 1);
    }

    #[test]
    fn test_lex_errors_surface_through_parser() {
        let err = parse_source("int main() { return $; }").unwrap_err();
        assert!(matches!(err, CompileError::Lex { .. }));
    }
}
