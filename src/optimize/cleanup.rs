use std::collections::HashSet;

use crate::ir::{IRCode, Instruction, OperandUsage, Place};

/// Drops assignments to temporaries nobody reads. Program variables are
/// always kept, as is any assignment copying another temporary, so a single
/// sweep reaches a fixed point.
pub fn remove_dead_code(code: IRCode) -> IRCode {
    // #1. every temporary that is read anywhere
    let mut used = HashSet::new();
    code.for_each_read(|operand| {
        if let Some(temp) = operand.as_temp() {
            used.insert(temp);
        }
    });

    // #2. anything written and never read goes
    code.into_iter()
        .filter(|instruction| match instruction {
            Instruction::Assign {
                target: Place::Temp(temp),
                value,
            } => {
                let live = used.contains(temp) || value.is_temp();
                if !live {
                    tracing::trace!(target: "optimize::dce", "removing `{instruction}`");
                }
                live
            }
            _ => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Operand, Temp};

    #[test]
    fn removes_unread_temporaries() {
        let code = vec![
            Instruction::Assign {
                target: Place::Temp(Temp(1)),
                value: Operand::Number(8.0),
            },
            Instruction::Assign {
                target: Place::var("x"),
                value: Operand::Number(8.0),
            },
        ];
        assert_eq!(remove_dead_code(code.clone()), code[1..].to_vec());
    }

    #[test]
    fn keeps_read_temporaries_and_variables() {
        let code = vec![
            Instruction::Assign {
                target: Place::Temp(Temp(1)),
                value: Operand::Number(2.0),
            },
            Instruction::Print(Operand::Temp(Temp(1))),
            Instruction::Assign {
                target: Place::var("unused"),
                value: Operand::Number(1.0),
            },
        ];
        assert_eq!(remove_dead_code(code.clone()), code);
    }

    #[test]
    fn keeps_copies_between_temporaries() {
        let code = vec![Instruction::Assign {
            target: Place::Temp(Temp(2)),
            value: Operand::Temp(Temp(1)),
        }];
        assert_eq!(remove_dead_code(code.clone()), code);
    }

    #[test]
    fn side_effects_survive() {
        let code = vec![
            Instruction::Push(Operand::Number(1.0)),
            Instruction::Call {
                name: "f".into(),
                args: 1,
            },
            Instruction::Pop(Temp(1)),
        ];
        assert_eq!(remove_dead_code(code.clone()), code);
    }
}
