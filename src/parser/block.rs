use super::{Parse, ParseRes, Parser};
use crate::ast::Block;
use crate::lexer::TokenKind;

impl<'source> Parse<'source> for Block<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        parser.with_context("parsing statement block", |parser| {
            parser.consume(TokenKind::OpenBrace)?;

            let mut statements = Vec::new();

            while !matches!(parser.peek_token(), TokenKind::CloseBrace | TokenKind::Eof) {
                statements.push(parser.parse()?);
            }

            parser.consume(TokenKind::CloseBrace)?;

            Ok(Self(statements))
        })
    }
}
