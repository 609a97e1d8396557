use super::{Parse, ParseErrorKind, ParseRes, Parser};
use crate::ast::{BinaryOp, Expr, Literal};
use crate::error::WantedSpec;
use crate::lexer::{TokenKind, TokenValue};

impl<'source> Parse<'source> for Expr<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        parse_primary(parser)
            .and_then(|lhs| {
                parse_binary_expression(parser, lhs, 0)
                    .map_err(|e| e.add_context("parsing binary expression"))
            })
            .map_err(|x| x.add_context("parsing expression"))
    }
}

fn peek_binary_op(parser: &Parser) -> Option<BinaryOp> {
    parser
        .peek_token()
        .as_operator()
        .and_then(BinaryOp::from_operator)
}

// literal, variable, call or parenthesis
fn parse_primary<'source>(parser: &mut Parser<'_, 'source>) -> ParseRes<Expr<'source>> {
    parser.with_context("parsing primary expression", |parser| {
        match parser.expect_a_token(Some(WantedSpec::Description("expression")))? {
            TokenKind::OpenParen => {
                parser.accept_current();
                let e = parser.parse()?;
                parser
                    .consume(TokenKind::CloseParen)
                    .map_err(|x| x.add_context("as the end of the expression"))?;
                Ok(e)
            }
            TokenKind::Number => {
                let num = match parser.current_value() {
                    Some(TokenValue::Number(num)) => num,
                    _ => {
                        return parser.reject_current_token(ParseErrorKind::Expected {
                            found: TokenKind::Number,
                            wanted: WantedSpec::Description("number with a value"),
                        })
                    }
                };
                parser.accept_current();
                Ok(Expr::Literal(Literal::Number(num)))
            }
            TokenKind::String => {
                let contents = match parser.current_value() {
                    Some(TokenValue::String(s)) => s,
                    _ => parser.current_token_source().trim_matches('"'),
                };
                parser.accept_current();
                Ok(Expr::Literal(Literal::String(contents)))
            }
            TokenKind::Identifier => {
                let name = parser.current_token_source();
                parser.accept_current();
                if parser.peek_token() == TokenKind::OpenParen {
                    parse_call(parser, name)
                } else {
                    Ok(Expr::Identifier(name))
                }
            }
            tok => parser.reject_current_token(ParseErrorKind::Expected {
                found: tok,
                wanted: WantedSpec::Description("number, string, identifier or '('"),
            }),
        }
    })
}

fn parse_call<'source>(
    parser: &mut Parser<'_, 'source>,
    name: &'source str,
) -> ParseRes<Expr<'source>> {
    parser.with_context("parsing function call", |parser| {
        parser.consume(TokenKind::OpenParen)?;
        let args = parser.comma_separated()?;
        parser.consume(TokenKind::CloseParen)?;
        Ok(Expr::Call { name, args })
    })
}

// precedence climbing; every operator is left associative so a tighter
// operator on the right is the only reason to recurse
fn parse_binary_expression<'source>(
    parser: &mut Parser<'_, 'source>,
    mut lhs: Expr<'source>,
    min_precedence: u8,
) -> ParseRes<Expr<'source>> {
    while let Some(op) = peek_binary_op(parser).filter(|x| x.precedence() >= min_precedence) {
        parser.accept_current();
        let mut rhs = parse_primary(parser)?;
        while peek_binary_op(parser)
            .filter(|op2| op2.precedence() > op.precedence())
            .is_some()
        {
            rhs = parse_binary_expression(parser, rhs, op.precedence() + 1)?;
        }
        lhs = Expr::Binary {
            operator: op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
    }
    Ok(lhs)
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse_source;
    use super::super::ParseErrorKind;
    use crate::ast::*;
    use crate::lexer::{Operator, TokenKind};

    fn expr(source: &str) -> Expr<'_> {
        let mut program = parse_source(source).expect("expression should parse");
        match program.0.pop() {
            Some(Statement::Expression(e)) => e,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    fn num(n: f64) -> Box<Expr<'static>> {
        Box::new(Expr::Literal(Literal::Number(n)))
    }

    fn bin<'a>(operator: BinaryOp, lhs: Box<Expr<'a>>, rhs: Box<Expr<'a>>) -> Box<Expr<'a>> {
        Box::new(Expr::Binary { operator, lhs, rhs })
    }

    #[test]
    fn multiplication_binds_tighter() {
        assert_eq!(
            expr("1 + 2 * 3;"),
            *bin(
                BinaryOp::Add,
                num(1.0),
                bin(BinaryOp::Multiply, num(2.0), num(3.0))
            )
        );
    }

    #[test]
    fn left_associative() {
        assert_eq!(
            expr("10 - 4 - 3;"),
            *bin(
                BinaryOp::Subtract,
                bin(BinaryOp::Subtract, num(10.0), num(4.0)),
                num(3.0)
            )
        );
        assert_eq!(
            expr("8 / 4 / 2;"),
            *bin(
                BinaryOp::Divide,
                bin(BinaryOp::Divide, num(8.0), num(4.0)),
                num(2.0)
            )
        );
    }

    #[test]
    fn full_precedence_ladder() {
        // ((a + (b * c)) < d) == e
        let a = || Box::new(Expr::Identifier("a"));
        assert_eq!(
            expr("a + b * c < d == e;"),
            *bin(
                BinaryOp::Equals,
                bin(
                    BinaryOp::Less,
                    bin(
                        BinaryOp::Add,
                        a(),
                        bin(
                            BinaryOp::Multiply,
                            Box::new(Expr::Identifier("b")),
                            Box::new(Expr::Identifier("c"))
                        )
                    ),
                    Box::new(Expr::Identifier("d"))
                ),
                Box::new(Expr::Identifier("e"))
            )
        );
    }

    #[test]
    fn parentheses_override_precedence() {
        assert_eq!(
            expr("(1 + 2) * 3;"),
            *bin(
                BinaryOp::Multiply,
                bin(BinaryOp::Add, num(1.0), num(2.0)),
                num(3.0)
            )
        );
    }

    #[test]
    fn calls() {
        assert_eq!(
            expr("jog(1, x + 2, f());"),
            Expr::Call {
                name: "jog",
                args: vec![
                    Expr::Literal(Literal::Number(1.0)),
                    *bin(BinaryOp::Add, Box::new(Expr::Identifier("x")), num(2.0)),
                    Expr::Call {
                        name: "f",
                        args: vec![]
                    },
                ]
            }
        );
    }

    #[test]
    fn no_unary_minus() {
        let err = parse_source("dhore x = -1;").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::Expected {
                found: TokenKind::Operator(Operator::Minus),
                wanted: crate::error::WantedSpec::Description("number, string, identifier or '('"),
            }
        );
    }

    #[test]
    fn string_literal() {
        assert_eq!(
            expr("\"Hello \" + naam;"),
            *bin(
                BinaryOp::Add,
                Box::new(Expr::Literal(Literal::String("Hello "))),
                Box::new(Expr::Identifier("naam"))
            )
        );
    }
}
