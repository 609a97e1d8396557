use super::{Parse, ParseRes, Parser};
use crate::ast::Program;
use crate::lexer::TokenKind;

impl<'source> Parse<'source> for Program<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        let mut vec = Vec::new();
        while parser.peek_token() != TokenKind::Eof {
            vec.push(parser.parse()?);
        }
        Ok(Program(vec))
    }
}
