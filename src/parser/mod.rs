use crate::ast::Program;
use crate::error::*;
use crate::lexer::*;

mod block;
mod expr;
mod function;
mod identifier;
mod program;
mod statement;

/// Recursive descent over an already lexed token stream, one token of
/// lookahead (two for telling assignments apart from expressions).
pub struct Parser<'t, 'source> {
    tokens: &'t [Token<'source>],
    current: usize,
}

/// Parses a whole program. The token sequence is expected to end with
/// [`TokenKind::Eof`]; running past the end behaves as if it did.
pub fn parse<'source>(tokens: &[Token<'source>]) -> ParseRes<Program<'source>> {
    tracing::info!(target: "parser", "parsing {} tokens", tokens.len());
    let program: Program = Parser::new(tokens).parse()?;
    tracing::debug!(target: "parser", "syntax tree:\n{}", program);
    Ok(program)
}

impl<'t, 'source> Parser<'t, 'source> {
    pub const fn new(tokens: &'t [Token<'source>]) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn peek_token(&self) -> TokenKind {
        self.nth_kind(0)
    }

    /// The kind of the token right after the current one.
    pub fn peek_second(&self) -> TokenKind {
        self.nth_kind(1)
    }

    fn nth_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.current + n)
            .map_or(TokenKind::Eof, |tok| tok.kind)
    }

    pub fn current_position(&self) -> Position {
        self.tokens
            .get(self.current)
            .or_else(|| self.tokens.last())
            .map_or_else(Position::start, |tok| tok.position)
    }

    pub fn current_token_source(&self) -> &'source str {
        self.tokens
            .get(self.current)
            .map_or("", |tok| tok.source.source)
    }

    pub fn current_value(&self) -> Option<TokenValue<'source>> {
        self.tokens.get(self.current).and_then(|tok| tok.value)
    }

    pub fn accept_current(&mut self) {
        if self.current < self.tokens.len() {
            self.current += 1;
        }
    }

    pub fn emit_error_at<T>(&self, position: Position, kind: ParseErrorKind) -> ParseRes<T> {
        Err(ParseError::new(kind).at(position))
    }

    pub fn expect_a_token(&mut self, wanted: Option<WantedSpec<TokenKind>>) -> ParseRes<TokenKind> {
        match self.peek_token() {
            TokenKind::Eof => {
                self.emit_error_at(self.current_position(), ParseErrorKind::UnexpectedEOF { wanted })
            }
            kind => Ok(kind),
        }
    }

    pub fn reject_current_token<T>(&self, reason: ParseErrorKind) -> ParseRes<T> {
        self.emit_error_at(self.current_position(), reason)
    }

    pub fn expect_token(&mut self, kind: TokenKind) -> ParseRes<()> {
        self.expect_a_token(Some(WantedSpec::Specific(kind)))
            .and_then(|tok| {
                if tok != kind {
                    self.reject_current_token(ParseErrorKind::Expected {
                        wanted: WantedSpec::Specific(kind),
                        found: tok,
                    })
                } else {
                    Ok(())
                }
            })
    }

    /// Expects the token and consumes it.
    pub fn consume(&mut self, kind: TokenKind) -> ParseRes<()> {
        self.expect_token(kind)?;
        self.accept_current();
        Ok(())
    }

    pub fn keyword(&mut self, kw: Keyword) -> ParseRes<()> {
        self.consume(TokenKind::Keyword(kw))
            .map_err(|e| e.add_context("parsing keyword"))
    }

    pub fn parse<T>(&mut self) -> ParseRes<T>
    where
        T: Parse<'source>,
    {
        T::parse(self)
    }

    pub fn with_context<F, T>(&mut self, context: &'static str, mut cont: F) -> ParseRes<T>
    where
        F: FnMut(&mut Self) -> ParseRes<T>,
    {
        cont(self).map_err(|x| x.add_context(context))
    }

    /// Parses `T` repeatedly, separated by commas, until the closing
    /// parenthesis. The parenthesis itself is left for the caller.
    pub fn comma_separated<T>(&mut self) -> ParseRes<Vec<T>>
    where
        T: Parse<'source>,
    {
        let mut result = Vec::new();
        if self.peek_token() == TokenKind::CloseParen {
            return Ok(result);
        }
        result.push(self.parse()?);
        while self.peek_token() == TokenKind::Comma {
            self.accept_current();
            result.push(self.parse()?);
        }
        Ok(result)
    }
}

pub type ParseRes<T> = Result<T, ParseError>;
pub type ParseError = Error<ParseErrorKind>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    Expected {
        wanted: WantedSpec<TokenKind>,
        found: TokenKind,
    },
    UnexpectedEOF {
        wanted: Option<WantedSpec<TokenKind>>,
    },
}

pub trait Parse<'source>: Sized {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self>;
}

use std::error;
impl error::Error for ParseErrorKind {}

use std::fmt;
impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnexpectedEOF { wanted } => {
                write!(f, "unexpected end of input")?;
                if let Some(wanted) = wanted {
                    write!(f, ", expected {}", wanted)
                } else {
                    Ok(())
                }
            }
            Self::Expected { wanted, found } => {
                write!(f, "expected {}, but found instead {}", wanted, found)
            }
        }
    }
}
