use super::{Parse, ParseRes, Parser};
use crate::ast::{Function, Identifier};
use crate::lexer::{Keyword, TokenKind};

impl<'source> Parse<'source> for Function<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        parser.with_context("parsing function", |parser| {
            parser.keyword(Keyword::Function)?;
            let Identifier(name) = parser.parse()?;
            parser.consume(TokenKind::OpenParen)?;

            let params = parser
                .with_context("parsing parameter list", |parser| {
                    parser.comma_separated::<Identifier>()
                })?
                .into_iter()
                .map(|Identifier(param)| param)
                .collect();

            parser.consume(TokenKind::CloseParen)?;

            let body = parser.parse()?;

            Ok(Self { name, params, body })
        })
    }
}
