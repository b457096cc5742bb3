//! Lexer (tokenizer) for C source code
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Each token keeps the exact source text it was read from, so diagnostics can
//! quote it and string literals can be re-emitted verbatim into `.rodata`.
//! `#` directives are skipped rather than parsed; there is no preprocessor.

use super::ast::SourceLocation;
use crate::errors::{CompileError, CompileResult};
use tracing::trace;

/// Token categories produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    IntLiteral,
    StringLiteral,

    // Identifiers
    Ident,

    // Keywords
    Int,
    Char,
    Short,
    Struct,
    Sizeof,
    If,
    Else,
    While,
    For,
    Return,

    // Arithmetic
    Plus,  // +
    Minus, // -
    Star,  // *
    Slash, // /

    // Comparison
    EqEq,  // ==
    NotEq, // !=
    Lt,    // <
    Le,    // <=
    Gt,    // >
    Ge,    // >=

    // Logical
    AndAnd, // &&
    OrOr,   // ||

    // Bitwise
    Amp,   // &
    Pipe,  // |
    Caret, // ^

    // Assignment
    Eq,      // =
    PlusEq,  // +=
    MinusEq, // -=
    StarEq,  // *=
    SlashEq, // /=
    PipeEq,  // |=
    CaretEq, // ^=
    AmpEq,   // &=

    // Increment/Decrement
    PlusPlus,   // ++
    MinusMinus, // --

    // Punctuation
    Dot,       // .
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Semicolon, // ;
    Comma,     // ,

    // End of file
    Eof,
}

/// A single token.
///
/// `text` is the source span the token was read from. For string literals it
/// is the raw body between the quotes, escapes untouched, and `value` holds the
/// decoded byte length. For integer and character literals `value` is the
/// numeric value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub value: Option<i64>,
    pub location: SourceLocation,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, location: SourceLocation) -> Self {
        Token {
            kind,
            text: text.into(),
            value: None,
            location,
        }
    }

    fn with_value(mut self, value: i64) -> Self {
        self.value = Some(value);
        self
    }
}

/// Lexer for C source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> CompileResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, "", self.current_location()));
                break;
            }

            if self.peek() == Some('#') {
                self.skip_directive();
                continue;
            }

            tokens.push(self.next_token()?);
        }

        trace!(count = tokens.len(), "tokenized source");
        Ok(tokens)
    }

    /// Get next token
    fn next_token(&mut self) -> CompileResult<Token> {
        let loc = self.current_location();
        let ch = self
            .advance()
            .ok_or_else(|| CompileError::lex("Unexpected end of file", loc))?;

        match ch {
            '"' => self.string_literal(loc),
            '\'' => self.char_literal(loc),
            '0'..='9' => self.number_literal(ch, loc),
            'a'..='z' | 'A'..='Z' | '_' => Ok(self.identifier_or_keyword(ch, loc)),
            _ => self.operator(ch, loc),
        }
    }

    /// Operators and punctuation, longest match first
    fn operator(&mut self, ch: char, loc: SourceLocation) -> CompileResult<Token> {
        let next = self.peek();
        let (kind, len) = match (ch, next) {
            ('+', Some('+')) => (TokenKind::PlusPlus, 2),
            ('+', Some('=')) => (TokenKind::PlusEq, 2),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', Some('-')) => (TokenKind::MinusMinus, 2),
            ('-', Some('=')) => (TokenKind::MinusEq, 2),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', Some('=')) => (TokenKind::StarEq, 2),
            ('*', _) => (TokenKind::Star, 1),
            ('/', Some('=')) => (TokenKind::SlashEq, 2),
            ('/', _) => (TokenKind::Slash, 1),
            ('=', Some('=')) => (TokenKind::EqEq, 2),
            ('=', _) => (TokenKind::Eq, 1),
            ('!', Some('=')) => (TokenKind::NotEq, 2),
            ('<', Some('=')) => (TokenKind::Le, 2),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', Some('=')) => (TokenKind::Ge, 2),
            ('>', _) => (TokenKind::Gt, 1),
            ('&', Some('&')) => (TokenKind::AndAnd, 2),
            ('&', Some('=')) => (TokenKind::AmpEq, 2),
            ('&', _) => (TokenKind::Amp, 1),
            ('|', Some('|')) => (TokenKind::OrOr, 2),
            ('|', Some('=')) => (TokenKind::PipeEq, 2),
            ('|', _) => (TokenKind::Pipe, 1),
            ('^', Some('=')) => (TokenKind::CaretEq, 2),
            ('^', _) => (TokenKind::Caret, 1),
            ('.', _) => (TokenKind::Dot, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('{', _) => (TokenKind::LBrace, 1),
            ('}', _) => (TokenKind::RBrace, 1),
            ('[', _) => (TokenKind::LBracket, 1),
            (']', _) => (TokenKind::RBracket, 1),
            (';', _) => (TokenKind::Semicolon, 1),
            (',', _) => (TokenKind::Comma, 1),
            _ => {
                return Err(CompileError::lex(
                    format!("Unexpected character: '{}'", ch),
                    loc,
                ))
            }
        };

        let mut text = String::from(ch);
        if len == 2 {
            if let Some(second) = self.advance() {
                text.push(second);
            }
        }
        Ok(Token::new(kind, text, loc))
    }

    /// Parse string literal; the opening quote is already consumed
    fn string_literal(&mut self, loc: SourceLocation) -> CompileResult<Token> {
        let mut raw = String::new();
        let mut decoded_len: i64 = 0;

        while let Some(ch) = self.peek() {
            match ch {
                '"' => {
                    self.advance(); // consume closing quote
                    return Ok(
                        Token::new(TokenKind::StringLiteral, raw, loc).with_value(decoded_len)
                    );
                }
                '\n' => break,
                '\\' => {
                    self.advance();
                    let escaped = self.advance().ok_or_else(|| {
                        CompileError::lex("Unterminated string literal", loc)
                    })?;
                    Self::unescape(escaped).ok_or_else(|| {
                        CompileError::lex(
                            format!("Unknown escape sequence: \\{}", escaped),
                            self.current_location(),
                        )
                    })?;
                    raw.push('\\');
                    raw.push(escaped);
                    decoded_len += 1;
                }
                _ => {
                    self.advance();
                    raw.push(ch);
                    decoded_len += ch.len_utf8() as i64;
                }
            }
        }

        Err(CompileError::lex("Unterminated string literal", loc))
    }

    /// Parse character literal as an integer token
    fn char_literal(&mut self, loc: SourceLocation) -> CompileResult<Token> {
        let ch = self
            .advance()
            .ok_or_else(|| CompileError::lex("Unterminated character literal", loc))?;

        let (value, mut text) = if ch == '\\' {
            let escaped = self
                .advance()
                .ok_or_else(|| CompileError::lex("Unterminated character literal", loc))?;
            let value = Self::unescape(escaped).ok_or_else(|| {
                CompileError::lex(
                    format!("Unknown escape sequence: \\{}", escaped),
                    self.current_location(),
                )
            })?;
            (value, format!("'\\{}", escaped))
        } else {
            (ch as i64, format!("'{}", ch))
        };

        if self.advance() != Some('\'') {
            return Err(CompileError::lex(
                "Expected closing quote in character literal",
                self.current_location(),
            ));
        }
        text.push('\'');

        Ok(Token::new(TokenKind::IntLiteral, text, loc).with_value(value))
    }

    fn unescape(escaped: char) -> Option<i64> {
        let value = match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            '0' => '\0',
            _ => return None,
        };
        Some(value as i64)
    }

    /// Parse numeric literal (decimal integers only)
    fn number_literal(&mut self, first_digit: char, loc: SourceLocation) -> CompileResult<Token> {
        let mut num_str = String::new();
        num_str.push(first_digit);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let value = num_str.parse::<i64>().map_err(|_| {
            CompileError::lex(format!("Invalid integer literal: {}", num_str), loc)
        })?;

        Ok(Token::new(TokenKind::IntLiteral, num_str, loc).with_value(value))
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, first_char: char, loc: SourceLocation) -> Token {
        let mut ident = String::new();
        ident.push(first_char);

        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match ident.as_str() {
            "int" => TokenKind::Int,
            "char" => TokenKind::Char,
            "short" => TokenKind::Short,
            "struct" => TokenKind::Struct,
            "sizeof" => TokenKind::Sizeof,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "return" => TokenKind::Return,
            _ => TokenKind::Ident,
        };

        Token::new(kind, ident, loc)
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) -> CompileResult<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek_ahead(1) == Some('/') {
                        self.skip_line_comment();
                    } else if self.peek_ahead(1) == Some('*') {
                        self.skip_block_comment()?;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Skip single-line comment (// ...)
    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.advance() {
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skip multi-line comment (/* ... */)
    fn skip_block_comment(&mut self) -> CompileResult<()> {
        let start_loc = self.current_location();
        self.advance(); // skip '/'
        self.advance(); // skip '*'

        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_ahead(1) == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }

        Err(CompileError::lex("Unterminated block comment", start_loc))
    }

    /// Skip a `#` line (`#include` and friends)
    fn skip_directive(&mut self) {
        self.skip_line_comment();
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}
