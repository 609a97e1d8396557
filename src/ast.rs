//! Syntax tree produced by the parser. Names borrow from the source text.
use crate::lexer::Operator;

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Program<'source>(pub Vec<Statement<'source>>);

#[derive(Clone, PartialEq)]
pub struct Block<'source>(pub Vec<Statement<'source>>);

impl fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg_struct = f.debug_struct("Block");
        for (i, stmt) in self.0.iter().enumerate() {
            dbg_struct.field(&i.to_string(), stmt);
        }
        dbg_struct.finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function<'source> {
    pub name: &'source str,
    pub params: Vec<&'source str>,
    pub body: Block<'source>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement<'source> {
    VariableDeclaration {
        name: &'source str,
        init: Option<Expr<'source>>,
    },
    Assignment {
        name: &'source str,
        value: Expr<'source>,
    },
    If {
        condition: Expr<'source>,
        then: Block<'source>,
        otherwise: Option<Block<'source>>,
    },
    While {
        condition: Expr<'source>,
        body: Block<'source>,
    },
    Block(Block<'source>),
    FunctionDeclaration(Function<'source>),
    Return(Option<Expr<'source>>),
    Print(Expr<'source>),
    Expression(Expr<'source>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier<'source>(pub &'source str);

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'source> {
    Binary {
        operator: BinaryOp,
        lhs: Box<Expr<'source>>,
        rhs: Box<Expr<'source>>,
    },
    Identifier(&'source str),
    Literal(Literal<'source>),
    Call {
        name: &'source str,
        args: Vec<Expr<'source>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'source> {
    Number(f64),
    String(&'source str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+` operator
    Add,
    /// `-` operator
    Subtract,
    /// `*` operator
    Multiply,
    /// `/` operator
    Divide,
    Equals,
    NotEquals,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
}

impl BinaryOp {
    pub const fn from_operator(op: Operator) -> Option<Self> {
        Some(match op {
            Operator::Plus => Self::Add,
            Operator::Minus => Self::Subtract,
            Operator::Star => Self::Multiply,
            Operator::Slash => Self::Divide,
            Operator::DoubleEquals => Self::Equals,
            Operator::NotEquals => Self::NotEquals,
            Operator::AngleLeft => Self::Less,
            Operator::AngleRight => Self::Greater,
            Operator::AngleLeftEquals => Self::LessEqual,
            Operator::AngleRightEquals => Self::GreaterEqual,
            // assignment is a statement, never part of an expression
            Operator::Equals => return None,
        })
    }

    /// Higher binds tighter. Every level is left associative.
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Equals | Self::NotEquals => 1,
            Self::Less | Self::Greater | Self::LessEqual | Self::GreaterEqual => 2,
            Self::Add | Self::Subtract => 3,
            Self::Multiply | Self::Divide => 4,
        }
    }

    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide
        )
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{:?}", s),
        }
    }
}

// Node counting follows the shape of the tree: every statement, block and
// expression is one node, parameter names are not.
impl Program<'_> {
    pub fn node_count(&self) -> usize {
        1 + self.0.iter().map(Statement::node_count).sum::<usize>()
    }
}

impl Block<'_> {
    pub fn node_count(&self) -> usize {
        1 + self.0.iter().map(Statement::node_count).sum::<usize>()
    }
}

impl Statement<'_> {
    pub fn node_count(&self) -> usize {
        1 + match self {
            Self::VariableDeclaration { init, .. } => init.as_ref().map_or(0, Expr::node_count),
            Self::Assignment { value, .. } => value.node_count(),
            Self::If {
                condition,
                then,
                otherwise,
            } => {
                condition.node_count()
                    + then.node_count()
                    + otherwise.as_ref().map_or(0, Block::node_count)
            }
            Self::While { condition, body } => condition.node_count() + body.node_count(),
            // the block statement itself is the node
            Self::Block(block) => return block.node_count(),
            Self::FunctionDeclaration(function) => function.body.node_count(),
            Self::Return(value) => value.as_ref().map_or(0, Expr::node_count),
            Self::Print(expr) => expr.node_count(),
            Self::Expression(expr) => return expr.node_count(),
        }
    }
}

impl Expr<'_> {
    pub fn node_count(&self) -> usize {
        1 + match self {
            Self::Binary { lhs, rhs, .. } => lhs.node_count() + rhs.node_count(),
            Self::Identifier(_) | Self::Literal(_) => 0,
            Self::Call { args, .. } => args.iter().map(Expr::node_count).sum(),
        }
    }
}

struct Indent(usize);

impl fmt::Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:width$}", "", width = self.0 * 2)
    }
}

impl fmt::Display for Program<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Program")?;
        for stmt in &self.0 {
            stmt.write_tree(f, 1)?;
        }
        Ok(())
    }
}

impl Block<'_> {
    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{}BlockStatement", Indent(depth))?;
        for stmt in &self.0 {
            stmt.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl Statement<'_> {
    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = Indent(depth);
        match self {
            Self::VariableDeclaration { name, init } => {
                writeln!(f, "{indent}VariableDeclaration {name}")?;
                if let Some(init) = init {
                    init.write_tree(f, depth + 1)?;
                }
            }
            Self::Assignment { name, value } => {
                writeln!(f, "{indent}Assignment {name}")?;
                value.write_tree(f, depth + 1)?;
            }
            Self::If {
                condition,
                then,
                otherwise,
            } => {
                writeln!(f, "{indent}IfStatement")?;
                writeln!(f, "{indent}  Condition:")?;
                condition.write_tree(f, depth + 2)?;
                writeln!(f, "{indent}  Then:")?;
                then.write_tree(f, depth + 2)?;
                if let Some(otherwise) = otherwise {
                    writeln!(f, "{indent}  Else:")?;
                    otherwise.write_tree(f, depth + 2)?;
                }
            }
            Self::While { condition, body } => {
                writeln!(f, "{indent}WhileStatement")?;
                writeln!(f, "{indent}  Condition:")?;
                condition.write_tree(f, depth + 2)?;
                writeln!(f, "{indent}  Body:")?;
                body.write_tree(f, depth + 2)?;
            }
            Self::Block(block) => block.write_tree(f, depth)?,
            Self::FunctionDeclaration(Function { name, params, body }) => {
                writeln!(f, "{indent}FunctionDeclaration {name}")?;
                writeln!(f, "{indent}  Parameters: {}", params.join(", "))?;
                body.write_tree(f, depth + 1)?;
            }
            Self::Return(value) => {
                writeln!(f, "{indent}ReturnStatement")?;
                if let Some(value) = value {
                    value.write_tree(f, depth + 1)?;
                }
            }
            Self::Print(expr) => {
                writeln!(f, "{indent}PrintStatement")?;
                expr.write_tree(f, depth + 1)?;
            }
            Self::Expression(expr) => expr.write_tree(f, depth)?,
        }
        Ok(())
    }
}

impl Expr<'_> {
    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = Indent(depth);
        match self {
            Self::Binary { operator, lhs, rhs } => {
                writeln!(f, "{indent}BinaryExpression {operator}")?;
                lhs.write_tree(f, depth + 1)?;
                rhs.write_tree(f, depth + 1)
            }
            Self::Identifier(name) => writeln!(f, "{indent}Identifier {name}"),
            Self::Literal(lit) => writeln!(f, "{indent}Literal {lit}"),
            Self::Call { name, args } => {
                writeln!(f, "{indent}FunctionCall {name}")?;
                for arg in args {
                    arg.write_tree(f, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Expr<'static> {
        Expr::Literal(Literal::Number(n))
    }

    #[test]
    fn counts_nodes_like_the_tree_dump() {
        // dhore x = 5 + 3; jode (x > 1) { dekhao(x); }
        let program = Program(vec![
            Statement::VariableDeclaration {
                name: "x",
                init: Some(Expr::Binary {
                    operator: BinaryOp::Add,
                    lhs: Box::new(num(5.0)),
                    rhs: Box::new(num(3.0)),
                }),
            },
            Statement::If {
                condition: Expr::Binary {
                    operator: BinaryOp::Greater,
                    lhs: Box::new(Expr::Identifier("x")),
                    rhs: Box::new(num(1.0)),
                },
                then: Block(vec![Statement::Print(Expr::Identifier("x"))]),
                otherwise: None,
            },
        ]);
        // program, decl, binary, 2 literals, if, binary, ident, literal, block, print, ident
        assert_eq!(program.node_count(), 12);
    }

    #[test]
    fn tree_dump() {
        let program = Program(vec![Statement::FunctionDeclaration(Function {
            name: "jog",
            params: vec!["a", "b"],
            body: Block(vec![Statement::Return(Some(Expr::Binary {
                operator: BinaryOp::Add,
                lhs: Box::new(Expr::Identifier("a")),
                rhs: Box::new(Expr::Identifier("b")),
            }))]),
        })]);
        let expected = "\
Program
  FunctionDeclaration jog
    Parameters: a, b
    BlockStatement
      ReturnStatement
        BinaryExpression +
          Identifier a
          Identifier b
";
        assert_eq!(program.to_string(), expected);
    }

    #[test]
    fn precedence_levels() {
        assert!(BinaryOp::Multiply.precedence() > BinaryOp::Add.precedence());
        assert!(BinaryOp::Add.precedence() > BinaryOp::Less.precedence());
        assert!(BinaryOp::Less.precedence() > BinaryOp::Equals.precedence());
        assert_eq!(BinaryOp::from_operator(Operator::Equals), None);
        assert_eq!(
            BinaryOp::from_operator(Operator::NotEquals),
            Some(BinaryOp::NotEquals)
        );
    }
}
