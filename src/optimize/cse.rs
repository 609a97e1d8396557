use std::cmp::Ordering;
use std::collections::HashMap;

use crate::ir::{BinaryOpcode, IRCode, Instruction, Operand, Place, Temp};

/// Reuses the result of an arithmetic operation that was already computed
/// with the same operands. The repeated operation becomes a copy of the
/// first result.
///
/// Entries die when one of their operands is written. Labels, function
/// boundaries and calls forget everything.
pub fn eliminate_common_subexpressions(code: IRCode) -> IRCode {
    let mut available = Available::default();
    code.into_iter()
        .map(|instruction| {
            let instruction = match instruction {
                Instruction::Binary {
                    op,
                    target,
                    lhs,
                    rhs,
                } if op.is_arithmetic() => match available.find(op, &lhs, &rhs) {
                    Some(previous) => {
                        tracing::trace!(target: "optimize::cse", "{} {lhs}, {rhs} already in {previous}", op.name());
                        Instruction::Assign {
                            target: Place::Temp(target),
                            value: Operand::Temp(previous),
                        }
                    }
                    None => {
                        available.invalidate(&Place::Temp(target));
                        available.insert(op, lhs.clone(), rhs.clone(), target);
                        return Instruction::Binary {
                            op,
                            target,
                            lhs,
                            rhs,
                        };
                    }
                },
                other => other,
            };
            match &instruction {
                Instruction::Label(_)
                | Instruction::Function { .. }
                | Instruction::EndFunction { .. }
                | Instruction::Call { .. } => available.clear(),
                _ => {
                    if let Some(place) = instruction.target() {
                        available.invalidate(&place);
                    }
                }
            }
            instruction
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ExprKey {
    op: BinaryOpcode,
    lhs: String,
    rhs: String,
}

impl ExprKey {
    fn new(op: BinaryOpcode, lhs: &Operand, rhs: &Operand) -> Self {
        let (mut a, mut b) = (lhs, rhs);
        if op.is_commutative() && operand_order(a, b) == Ordering::Greater {
            std::mem::swap(&mut a, &mut b);
        }
        Self {
            op,
            lhs: a.to_string(),
            rhs: b.to_string(),
        }
    }
}

/// Numbers compare by value, anything else by its printed form.
fn operand_order(a: &Operand, b: &Operand) -> Ordering {
    match (a.as_number(), b.as_number()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[derive(Debug)]
struct Entry {
    lhs: Operand,
    rhs: Operand,
    result: Temp,
}

#[derive(Debug, Default)]
struct Available {
    entries: HashMap<ExprKey, Entry>,
}

impl Available {
    fn find(&self, op: BinaryOpcode, lhs: &Operand, rhs: &Operand) -> Option<Temp> {
        self.entries
            .get(&ExprKey::new(op, lhs, rhs))
            .map(|entry| entry.result)
    }

    fn insert(&mut self, op: BinaryOpcode, lhs: Operand, rhs: Operand, result: Temp) {
        // `t1 = t1 + 1` can't be reused once written
        let place = Place::Temp(result);
        if lhs.refers_to(&place) || rhs.refers_to(&place) {
            return;
        }
        self.entries
            .insert(ExprKey::new(op, &lhs, &rhs), Entry { lhs, rhs, result });
    }

    fn invalidate(&mut self, place: &Place) {
        self.entries.retain(|_, entry| {
            !entry.lhs.refers_to(place)
                && !entry.rhs.refers_to(place)
                && Place::Temp(entry.result) != *place
        });
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
