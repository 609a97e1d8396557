use super::IRGenState;
use crate::ast::{Expr, Literal};
use crate::ir::{BinaryOpcode, Instruction, Operand};

/// Lowers an expression and returns the operand holding its value.
pub fn compile_expr(state: &mut IRGenState, expr: &Expr) -> Operand {
    match expr {
        Expr::Literal(Literal::Number(n)) => Operand::Number(*n),
        Expr::Literal(Literal::String(s)) => Operand::Str(s.to_string()),
        Expr::Identifier(name) => state.variable(name),
        Expr::Binary { operator, lhs, rhs } => {
            let lhs = compile_expr(state, lhs);
            let rhs = compile_expr(state, rhs);
            let target = state.next_temp();
            state.push(Instruction::Binary {
                op: BinaryOpcode::from_ast(*operator),
                target,
                lhs,
                rhs,
            });
            Operand::Temp(target)
        }
        Expr::Call { name, args } => {
            let args: Vec<_> = args.iter().map(|arg| compile_expr(state, arg)).collect();
            let result = state.next_temp();
            let count = args.len();
            for arg in args {
                state.push(Instruction::Push(arg));
            }
            state.push(Instruction::Call {
                name: name.to_string(),
                args: count,
            });
            state.push(Instruction::Pop(result));
            Operand::Temp(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::listing;

    #[test]
    fn nested_operands_are_lowered_first() {
        assert_eq!(
            listing("dhore y = (1 + 2) * (3 - x);"),
            vec![
                "ADD t1, 1, 2",
                "SUB t2, 3, x",
                "MUL t3, t1, t2",
                "ASSIGN y, t3",
            ]
        );
    }

    #[test]
    fn call_arguments_are_evaluated_before_pushing() {
        assert_eq!(
            listing("f(a + 1, \"s\");"),
            vec!["ADD t1, a, 1", "PUSH t1", "PUSH \"s\"", "CALL f, 2", "POP t2"]
        );
    }

    #[test]
    fn relational_opcodes() {
        let code = listing("a == b; a != b; a <= b; a >= b;");
        let opcodes: Vec<_> = code
            .iter()
            .map(|line| line.split(' ').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(opcodes, vec!["EQ", "NE", "LE", "GE"]);
    }
}
