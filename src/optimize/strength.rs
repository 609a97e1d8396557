use crate::ir::{BinaryOpcode, IRCode, Instruction, Operand};

/// Multiplication and division by a positive power of two become shifts by
/// its exponent.
pub fn reduce_strength(code: IRCode) -> IRCode {
    code.into_iter()
        .map(|instruction| match instruction {
            Instruction::Binary {
                op: op @ (BinaryOpcode::Mul | BinaryOpcode::Div),
                target,
                lhs,
                rhs,
            } => match rhs.as_number().and_then(power_of_two) {
                Some(shift) => {
                    let op = if op == BinaryOpcode::Mul {
                        BinaryOpcode::Shl
                    } else {
                        BinaryOpcode::Shr
                    };
                    tracing::trace!(target: "optimize::strength", "{target}: {rhs} => {} {shift}", op.name());
                    Instruction::Binary {
                        op,
                        target,
                        lhs,
                        rhs: Operand::Number(shift as f64),
                    }
                }
                None => Instruction::Binary {
                    op,
                    target,
                    lhs,
                    rhs,
                },
            },
            other => other,
        })
        .collect()
}

/// The exponent of `n` if it is a positive integral power of two.
fn power_of_two(n: f64) -> Option<u32> {
    if n < 1.0 || n.fract() != 0.0 || n > u64::MAX as f64 {
        return None;
    }
    let n = n as u64;
    n.is_power_of_two().then(|| n.trailing_zeros())
}
