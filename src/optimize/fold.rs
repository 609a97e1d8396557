use std::collections::HashMap;

use crate::ir::{IRCode, Instruction, Operand, Place, Temp};

/// Evaluates arithmetic whose operands are both known numbers and replaces it
/// with an assignment of the result. Temporaries known to hold a number are
/// substituted into the operands of later binary operations and assignments,
/// so chains of constant arithmetic collapse in one sweep.
///
/// Results that are not finite are left alone, and so is division by zero.
pub fn constant_fold(code: IRCode) -> IRCode {
    let mut constants: HashMap<Temp, f64> = HashMap::new();
    code.into_iter()
        .map(|instruction| fold_instruction(&mut constants, instruction))
        .collect()
}

fn fold_instruction(constants: &mut HashMap<Temp, f64>, instruction: Instruction) -> Instruction {
    match instruction {
        Instruction::Binary {
            op,
            target,
            lhs,
            rhs,
        } => {
            let lhs = substitute(constants, lhs);
            let rhs = substitute(constants, rhs);
            let folded = lhs
                .as_number()
                .zip(rhs.as_number())
                .filter(|_| op.is_arithmetic())
                .and_then(|(l, r)| op.evaluate(l, r))
                .filter(|value| value.is_finite());
            match folded {
                Some(value) => {
                    tracing::trace!(target: "optimize::fold", "{} {lhs}, {rhs} => {target} = {value}", op.name());
                    constants.insert(target, value);
                    Instruction::Assign {
                        target: Place::Temp(target),
                        value: Operand::Number(value),
                    }
                }
                None => Instruction::Binary {
                    op,
                    target,
                    lhs,
                    rhs,
                },
            }
        }
        Instruction::Assign { target, value } => {
            let value = substitute(constants, value);
            if let (Place::Temp(t), Some(n)) = (&target, value.as_number()) {
                constants.insert(*t, n);
            }
            Instruction::Assign { target, value }
        }
        other => other,
    }
}

fn substitute(constants: &HashMap<Temp, f64>, operand: Operand) -> Operand {
    match operand.as_temp().and_then(|t| constants.get(&t)) {
        Some(value) => Operand::Number(*value),
        None => operand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::BinaryOpcode;

    fn binary(op: BinaryOpcode, target: usize, lhs: Operand, rhs: Operand) -> Instruction {
        Instruction::Binary {
            op,
            target: Temp(target),
            lhs,
            rhs,
        }
    }

    fn listing(code: &[Instruction]) -> Vec<String> {
        code.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn folds_numeric_arithmetic() {
        let code = constant_fold(vec![
            binary(BinaryOpcode::Add, 1, 5.0.into(), 3.0.into()),
            Instruction::Assign {
                target: Place::var("x"),
                value: Temp(1).into(),
            },
        ]);
        assert_eq!(listing(&code), vec!["ASSIGN t1, 8", "ASSIGN x, 8"]);
    }

    #[test]
    fn propagates_into_later_operations() {
        let code = constant_fold(vec![
            binary(BinaryOpcode::Mul, 1, 2.0.into(), 3.0.into()),
            binary(BinaryOpcode::Add, 2, Temp(1).into(), 1.0.into()),
            binary(BinaryOpcode::Gt, 3, Temp(2).into(), Operand::var("y")),
        ]);
        assert_eq!(
            listing(&code),
            vec!["ASSIGN t1, 6", "ASSIGN t2, 7", "GT t3, 7, y"]
        );
    }

    #[test]
    fn keeps_division_by_zero() {
        let div = binary(BinaryOpcode::Div, 1, 1.0.into(), 0.0.into());
        assert_eq!(constant_fold(vec![div.clone()]), vec![div]);
    }

    #[test]
    fn keeps_overflowing_results() {
        let mul = binary(BinaryOpcode::Mul, 1, f64::MAX.into(), 2.0.into());
        assert_eq!(constant_fold(vec![mul.clone()]), vec![mul]);
    }

    #[test]
    fn comparisons_are_not_evaluated() {
        let eq = binary(BinaryOpcode::Eq, 1, 1.0.into(), 1.0.into());
        assert_eq!(constant_fold(vec![eq.clone()]), vec![eq]);
    }

    #[test]
    fn variables_block_folding() {
        let add = binary(BinaryOpcode::Add, 1, Operand::var("x"), 1.0.into());
        assert_eq!(constant_fold(vec![add.clone()]), vec![add]);
    }
}
