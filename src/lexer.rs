use crate::error::{self, Position, Span};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

impl Error for LexErrorKind {}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::CloseBrace => write!(f, "closing brace '}}'"),
            Self::OpenBrace => write!(f, "opening brace '{{'"),
            Self::Identifier => write!(f, "identifier"),
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
            Self::OpenParen => write!(f, "opening parentheses '('"),
            Self::CloseParen => write!(f, "closing parentheses ')'"),
            Self::Semicolon => write!(f, "semicolon ';'"),
            Self::Comma => write!(f, "comma ','"),
            Self::Keyword(kw) => write!(f, "keyword `{}`", kw),
            Self::Operator(kind) => write!(f, "operator `{}`", kind),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Equals => "=",
            Operator::DoubleEquals => "==",
            Operator::NotEquals => "!=",
            Operator::AngleLeft => "<",
            Operator::AngleRight => ">",
            Operator::AngleLeftEquals => "<=",
            Operator::AngleRightEquals => ">=",
        })
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.spelling())
    }
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnexpectedChar(ch) => write!(f, "unexpected character {:?}", ch),
            Self::InvalidNumber(text) => write!(f, "invalid number literal {:?}", text),
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.value {
            Some(TokenValue::Number(n)) => write!(f, "{:?}({})", self.kind, n),
            Some(TokenValue::String(s)) => write!(f, "{:?}({:?})", self.kind, s),
            Some(TokenValue::Raw(s)) => write!(f, "{:?}({})", self.kind, s),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

pub type LexError = error::Error<LexErrorKind>;

/// Turns the whole input into tokens. The returned sequence always ends with
/// exactly one [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    tracing::info!(target: "lexer", "tokenizing {} bytes of source", source.len());
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tracing::trace!(target: "lexer", "{token} at {}", token.position);
        tokens.push(token);
    }
    tokens.push(lexer.eof_token());
    tracing::debug!(target: "lexer", "produced {} tokens", tokens.len());
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub value: Option<TokenValue<'a>>,
    pub source: Source<'a>,
    pub position: Position,
}

impl<'a> Token<'a> {
    pub const fn new(kind: TokenKind, source: Source<'a>, position: Position) -> Self {
        Self {
            kind,
            value: None,
            source,
            position,
        }
    }
    #[must_use]
    pub fn with_value(mut self, value: TokenValue<'a>) -> Self {
        self.value = Some(value);
        self
    }
    pub const fn line(&self) -> usize {
        self.position.line
    }
    pub const fn column(&self) -> usize {
        self.position.col
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenValue<'a> {
    Number(f64),
    /// contents between the quotes, verbatim
    String(&'a str),
    /// spelling of identifiers and keywords
    Raw(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Number,
    String,
    Identifier,
    Semicolon,
    Comma,
    Keyword(Keyword),
    Operator(Operator),
    Eof,
}

impl TokenKind {
    pub const fn as_operator(self) -> Option<Operator> {
        if let TokenKind::Operator(kind) = self {
            Some(kind)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// `dhore`
    Let,
    /// `jode`
    If,
    /// `onnathay`
    Else,
    /// `jotokkhon`
    While,
    /// `function`
    Function,
    /// `ferot`
    Return,
    /// `dekhao`
    Print,
}

impl Keyword {
    pub const ALL: [Keyword; 7] = [
        Keyword::Let,
        Keyword::If,
        Keyword::Else,
        Keyword::While,
        Keyword::Function,
        Keyword::Return,
        Keyword::Print,
    ];

    pub const fn spelling(self) -> &'static str {
        match self {
            Keyword::Let => "dhore",
            Keyword::If => "jode",
            Keyword::Else => "onnathay",
            Keyword::While => "jotokkhon",
            Keyword::Function => "function",
            Keyword::Return => "ferot",
            Keyword::Print => "dekhao",
        }
    }

    pub fn from_spelling(word: &str) -> Option<Self> {
        KEYWORDS.get(word).copied()
    }
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, Keyword> = Keyword::ALL
        .iter()
        .map(|kw| (kw.spelling(), *kw))
        .collect();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Equals,
    DoubleEquals,
    NotEquals,
    AngleLeft,
    AngleRight,
    AngleLeftEquals,
    AngleRightEquals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source<'source> {
    pub span: Span,
    pub source: &'source str,
}

impl From<Source<'_>> for Span {
    fn from(s: Source<'_>) -> Self {
        s.span
    }
}

pub struct Lexer<'a> {
    input: std::iter::Peekable<std::str::CharIndices<'a>>,
    source: &'a str,
    line: usize,
    col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    UnexpectedChar(char),
    InvalidNumber(String),
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Self {
            input: source.char_indices().peekable(),
            source,
            line: 1,
            col: 1,
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token<'source>>, LexError> {
        self.skip_whitespace();
        let position = self.current_position();
        let (start, ch) = match self.input.peek().copied() {
            None => return Ok(None),
            Some(next) => next,
        };
        let single = |kind| Some(kind);
        let delimiter = match ch {
            '(' => single(TokenKind::OpenParen),
            ')' => single(TokenKind::CloseParen),
            '{' => single(TokenKind::OpenBrace),
            '}' => single(TokenKind::CloseBrace),
            ';' => single(TokenKind::Semicolon),
            ',' => single(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = delimiter {
            self.advance();
            return Ok(Some(Token::new(
                kind,
                self.source_until_current(start),
                position,
            )));
        }
        if let Some(src) = self.number() {
            let value = src
                .source
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| self.error(position, LexErrorKind::InvalidNumber(src.source.into())))?;
            return Ok(Some(
                Token::new(TokenKind::Number, src, position).with_value(TokenValue::Number(value)),
            ));
        }
        if let Some((src, contents)) = self.string() {
            return Ok(Some(
                Token::new(TokenKind::String, src, position)
                    .with_value(TokenValue::String(contents)),
            ));
        }
        if let Some(src) = self.identifier() {
            let kind = Keyword::from_spelling(src.source)
                .map_or(TokenKind::Identifier, TokenKind::Keyword);
            return Ok(Some(
                Token::new(kind, src, position).with_value(TokenValue::Raw(src.source)),
            ));
        }
        if let Some(kind) = self.operator() {
            return Ok(Some(Token::new(
                TokenKind::Operator(kind),
                self.source_until_current(start),
                position,
            )));
        }
        Err(self.error(position, LexErrorKind::UnexpectedChar(ch)))
    }

    // the token for the end of input, placed right after the last character
    pub fn eof_token(&mut self) -> Token<'source> {
        let end = self.current_offset();
        Token::new(
            TokenKind::Eof,
            self.source_from(end, end),
            self.current_position(),
        )
    }

    // two-character operators are tried before their one-character prefixes
    fn operator(&mut self) -> Option<Operator> {
        let (_, first) = *self.input.peek()?;
        let with_equals = match first {
            '<' => Some((Operator::AngleLeft, Operator::AngleLeftEquals)),
            '>' => Some((Operator::AngleRight, Operator::AngleRightEquals)),
            '=' => Some((Operator::Equals, Operator::DoubleEquals)),
            _ => None,
        };
        if let Some((short, long)) = with_equals {
            self.advance();
            return Some(if self.skip_if(|c| c == '=').is_some() {
                long
            } else {
                short
            });
        }
        let op = match first {
            '!' => {
                // a lone `!` is not an operator of the language
                if self.rest().starts_with("!=") {
                    self.advance();
                    self.advance();
                    return Some(Operator::NotEquals);
                }
                return None;
            }
            '+' => Operator::Plus,
            '-' => Operator::Minus,
            '*' => Operator::Star,
            '/' => Operator::Slash,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn identifier(&mut self) -> Option<Source<'source>> {
        let (start, _) = self.skip_if(is_identifier_start)?;
        self.skip_while(is_identifier_continue);
        Some(self.source_until_current(start))
    }

    fn number(&mut self) -> Option<Source<'source>> {
        let (start, _) = self.skip_if(|c| c.is_ascii_digit())?;
        self.skip_while(|c| c.is_ascii_digit());
        Some(self.source_until_current(start))
    }

    // no escape sequences; an unterminated string runs until the end of input
    fn string(&mut self) -> Option<(Source<'source>, &'source str)> {
        let (start, _) = self.skip_if(|c| c == '"')?;
        let contents = self.skip_while(|c| c != '"');
        self.skip_if(|c| c == '"');
        Some((self.source_until_current(start), contents.source))
    }

    fn skip_while<F>(&mut self, filter: F) -> Source<'source>
    where
        F: Fn(char) -> bool,
    {
        let current = self.current_offset();
        while self.input.peek().filter(|(_, ch)| filter(*ch)).is_some() {
            self.advance();
        }
        self.source_until_current(current)
    }

    fn skip_if<F>(&mut self, filter: F) -> Option<(usize, char)>
    where
        F: Fn(char) -> bool,
    {
        let (pos, ch) = *self.input.peek()?;
        if filter(ch) {
            self.advance();
            Some((pos, ch))
        } else {
            None
        }
    }

    fn skip_whitespace(&mut self) {
        self.skip_while(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    }

    fn advance(&mut self) {
        if let Some((_, ch)) = self.input.next() {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    fn rest(&mut self) -> &'source str {
        let offset = self.current_offset();
        &self.source[offset..]
    }

    fn source_until_current(&mut self, start: usize) -> Source<'source> {
        let current = self.current_offset();
        self.source_from(start, current)
    }

    fn source_from(&self, start: usize, end: usize) -> Source<'source> {
        Source {
            span: Span {
                offset: start,
                len: end - start,
            },
            source: &self.source[start..end],
        }
    }

    fn error(&self, position: Position, kind: LexErrorKind) -> LexError {
        LexError::new(kind).at(position)
    }

    pub const fn current_position(&self) -> Position {
        Position {
            line: self.line,
            col: self.col,
        }
    }

    fn current_offset(&mut self) -> usize {
        self.input
            .peek()
            .map(|(x, _)| *x)
            .unwrap_or_else(|| self.source.len())
    }
}

// letters of the Bengali block are accepted so identifiers can be written in
// the native script
#[inline]
fn is_bengali(ch: char) -> bool {
    ('\u{0980}'..='\u{09FF}').contains(&ch)
}

#[inline]
fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || is_bengali(ch)
}

#[inline]
fn is_identifier_continue(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_ascii_digit()
}
