use logos::Logos;
use std::fmt;
use thiserror::Error;

use crate::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")] // Skip whitespace
#[logos(skip r";[^\n\r]*")] // Skip comments
#[logos(error = LexerErrorKind)]
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    // The literal text is kept verbatim: range-checking is the reader's job,
    // so an over-long literal still reaches it as a `number` node.
    #[regex(r"-?[0-9]+", |lex| lex.slice().to_string(), priority = 3)]
    Number(String),
    #[regex(r"[a-zA-Z0-9_+\-*/\\=<>!&]+", |lex| lex.slice().to_string())]
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

// Implement Display for easy printing
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Number(text) => write!(f, "{}", text),
            TokenKind::Symbol(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Error)]
pub enum LexerErrorKind {
    #[default]
    #[error("invalid token")]
    InvalidToken,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct LexerError {
    pub kind: LexerErrorKind,
    pub span: Span,
}

// Result type alias for convenience
type LexerResult<T> = Result<T, LexerError>;

// Helper function to tokenize a string directly (useful for tests and parser)
pub fn tokenize(input: &str) -> LexerResult<Vec<Token>> {
    TokenKind::lexer(input)
        .spanned()
        .map(|(result, range)| match result {
            Ok(kind) => Ok(Token {
                kind,
                span: Span::new(range.start, range.end),
            }),
            Err(kind) => Err(LexerError {
                kind,
                span: Span::new(range.start, range.end),
            }),
        })
        .collect()
}
