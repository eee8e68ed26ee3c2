use crate::lexer::{LexerError, Token, TokenKind};
use std::iter::Peekable;
use std::vec::IntoIter; // To iterate over Vec<Token>
use thiserror::Error;

/// One node of the front-end parse tree.
///
/// This is the tagged shape the reader ingests: a `tag` naming the node kind,
/// the literal `contents` for atoms, and ordered `children` for composites.
/// Bracket punctuation is kept as `char`-tagged children and the whole
/// program is rooted at a `>` node, so the tree matches what the reader's
/// skipping rules expect.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub tag: String,
    pub contents: String,
    pub children: Vec<Ast>,
}

impl Ast {
    pub fn atom(tag: &str, contents: impl Into<String>) -> Ast {
        Ast {
            tag: tag.to_string(),
            contents: contents.into(),
            children: Vec::new(),
        }
    }

    pub fn branch(tag: &str, children: Vec<Ast>) -> Ast {
        Ast {
            tag: tag.to_string(),
            contents: String::new(),
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected token `{}`, expected {}", .found.kind, .expected)]
    UnexpectedToken { found: Token, expected: String },

    #[error("unexpected end of input, expected {0}")]
    UnexpectedEof(String),

    #[error("lexer error: {0}")]
    LexerError(#[from] LexerError),
}

// Result type alias for convenience
type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    // We iterate over owned Tokens, consuming them.
    tokens: Peekable<IntoIter<Token>>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: tokens.into_iter().peekable(),
        }
    }

    // Consumes the next token if available.
    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    // Peeks at the next token without consuming.
    fn peek_token(&mut self) -> Option<&Token> {
        self.tokens.peek()
    }

    /// Parses the whole token stream: `program : expr*`, rooted at `>`.
    pub fn parse(mut self) -> ParseResult<Ast> {
        let mut children = Vec::new();
        while self.peek_token().is_some() {
            children.push(self.parse_expr()?);
        }
        Ok(Ast::branch(">", children))
    }

    /// Parses a single expression: a number, a symbol, `( expr* )` or
    /// `{ expr* }`.
    fn parse_expr(&mut self) -> ParseResult<Ast> {
        match self.next_token() {
            Some(Token {
                kind: TokenKind::Number(text),
                ..
            }) => Ok(Ast::atom("number", text)),
            Some(Token {
                kind: TokenKind::Symbol(text),
                ..
            }) => Ok(Ast::atom("symbol", text)),
            Some(Token {
                kind: TokenKind::LParen,
                ..
            }) => self.parse_list("sexpr", "(", &TokenKind::RParen, ")"),
            Some(Token {
                kind: TokenKind::LBrace,
                ..
            }) => self.parse_list("qexpr", "{", &TokenKind::RBrace, "}"),
            Some(found) => Err(ParseError::UnexpectedToken {
                found,
                expected: "an expression".to_string(),
            }),
            None => Err(ParseError::UnexpectedEof("an expression".to_string())),
        }
    }

    /// Parses the remainder of a bracketed expression whose opening token has
    /// already been consumed.
    fn parse_list(
        &mut self,
        tag: &str,
        open: &str,
        close_kind: &TokenKind,
        close: &str,
    ) -> ParseResult<Ast> {
        let mut children = vec![Ast::atom("char", open)];
        loop {
            match self.peek_token() {
                Some(token) if token.kind == *close_kind => {
                    self.next_token();
                    children.push(Ast::atom("char", close));
                    return Ok(Ast::branch(tag, children));
                }
                Some(_) => children.push(self.parse_expr()?),
                None => return Err(ParseError::UnexpectedEof(format!("'{}'", close))),
            }
        }
    }
}

// Helper function to lex and parse a string directly (useful for tests and
// the REPL)
pub fn parse_str(input: &str) -> ParseResult<Ast> {
    let tokens = crate::lexer::tokenize(input)?;
    Parser::new(tokens).parse()
}
