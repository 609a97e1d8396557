use super::{Parse, ParseRes, Parser};
use crate::ast::{Block, Expr, Identifier, Statement};
use crate::lexer::{Keyword, Operator, TokenKind};

impl<'source> Parse<'source> for Statement<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        parser.with_context("parsing statement", |parser| {
            Ok(match parser.peek_token() {
                TokenKind::Keyword(Keyword::Let) => declaration(parser)?,
                TokenKind::Keyword(Keyword::If) => if_statement(parser)?,
                TokenKind::Keyword(Keyword::While) => {
                    parser.accept_current();
                    let condition = parenthesized_condition(parser)?;
                    let body = parser.parse()?;
                    Statement::While { condition, body }
                }
                TokenKind::Keyword(Keyword::Function) => {
                    Statement::FunctionDeclaration(parser.parse()?)
                }
                TokenKind::Keyword(Keyword::Return) => {
                    parser.accept_current();
                    let value = if parser.peek_token() == TokenKind::Semicolon {
                        None
                    } else {
                        Some(parser.parse()?)
                    };
                    parser.consume(TokenKind::Semicolon)?;
                    Statement::Return(value)
                }
                TokenKind::Keyword(Keyword::Print) => {
                    parser.accept_current();
                    parser.consume(TokenKind::OpenParen)?;
                    let expr = parser.parse()?;
                    parser.consume(TokenKind::CloseParen)?;
                    parser.consume(TokenKind::Semicolon)?;
                    Statement::Print(expr)
                }
                TokenKind::Identifier
                    if parser.peek_second() == TokenKind::Operator(Operator::Equals) =>
                {
                    let Identifier(name) = parser.parse()?;
                    parser.accept_current();
                    let value = parser.parse()?;
                    parser.consume(TokenKind::Semicolon)?;
                    Statement::Assignment { name, value }
                }
                TokenKind::OpenBrace => Statement::Block(parser.parse()?),
                _ => single_expr(parser)?,
            })
        })
    }
}

fn declaration<'source>(parser: &mut Parser<'_, 'source>) -> ParseRes<Statement<'source>> {
    parser.with_context("parsing variable declaration", |parser| {
        parser.keyword(Keyword::Let)?;
        let Identifier(name) = parser.parse()?;
        let init = if parser.peek_token() == TokenKind::Operator(Operator::Equals) {
            parser.accept_current();
            parser.parse().map(Some)?
        } else {
            None
        };
        parser.consume(TokenKind::Semicolon)?;
        Ok(Statement::VariableDeclaration { name, init })
    })
}

fn single_expr<'source>(parser: &mut Parser<'_, 'source>) -> ParseRes<Statement<'source>> {
    let expr: Expr = parser.parse()?;
    parser.consume(TokenKind::Semicolon)?;
    Ok(Statement::Expression(expr))
}

fn parenthesized_condition<'source>(parser: &mut Parser<'_, 'source>) -> ParseRes<Expr<'source>> {
    parser.with_context("parsing condition", |parser| {
        parser.consume(TokenKind::OpenParen)?;
        let condition = parser.parse()?;
        parser.consume(TokenKind::CloseParen)?;
        Ok(condition)
    })
}

fn if_statement<'source>(parser: &mut Parser<'_, 'source>) -> ParseRes<Statement<'source>> {
    parser.with_context("parsing if statement", |parser| {
        parser.keyword(Keyword::If)?;
        let condition = parenthesized_condition(parser)?;
        let then: Block = parser.parse()?;
        let otherwise = if parser.peek_token() == TokenKind::Keyword(Keyword::Else) {
            parser.accept_current();
            Some(parser.parse()?)
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then,
            otherwise,
        })
    })
}
