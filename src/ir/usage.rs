use super::{Instruction, Operand, Place};
use core::ops::ControlFlow;

pub trait OperandUsage {
    /// Visits every operand the instruction reads. Written places are not
    /// visited.
    fn visit_reads<B, F: FnMut(&Operand) -> ControlFlow<B>>(&self, f: F) -> ControlFlow<B>;

    /// Calls `f` on every operand the instruction reads.
    fn for_each_read<F: FnMut(&Operand)>(&self, mut f: F) {
        let flow = self.visit_reads(|operand| {
            f(operand);
            ControlFlow::<()>::Continue(())
        });
        debug_assert!(flow.is_continue());
    }

    fn reads(&self, place: &Place) -> bool {
        self.visit_reads(|operand| {
            if operand.refers_to(place) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .is_break()
    }
}

impl OperandUsage for Operand {
    fn visit_reads<B, F: FnMut(&Operand) -> ControlFlow<B>>(&self, mut f: F) -> ControlFlow<B> {
        f(self)
    }
}

impl OperandUsage for Instruction {
    fn visit_reads<B, F: FnMut(&Operand) -> ControlFlow<B>>(&self, mut f: F) -> ControlFlow<B> {
        match self {
            Instruction::Assign { value, .. } => f(value),
            Instruction::Binary { lhs, rhs, .. } => {
                f(lhs)?;
                f(rhs)
            }
            Instruction::If { condition, .. } => f(condition),
            Instruction::Push(value) | Instruction::Print(value) => f(value),
            Instruction::Return(Some(value)) => f(value),
            Instruction::Return(None)
            | Instruction::Goto(_)
            | Instruction::Label(_)
            | Instruction::Function { .. }
            | Instruction::EndFunction { .. }
            | Instruction::Call { .. }
            | Instruction::Pop(_) => ControlFlow::Continue(()),
        }
    }
}

impl<T: OperandUsage> OperandUsage for [T] {
    fn visit_reads<B, F: FnMut(&Operand) -> ControlFlow<B>>(&self, mut f: F) -> ControlFlow<B> {
        for item in self {
            item.visit_reads(&mut f)?;
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOpcode, Temp};

    #[test]
    fn reads_ignore_targets() {
        let add = Instruction::Binary {
            op: BinaryOpcode::Add,
            target: Temp(2),
            lhs: Operand::Temp(Temp(1)),
            rhs: Operand::var("x"),
        };
        assert!(add.reads(&Place::Temp(Temp(1))));
        assert!(add.reads(&Place::var("x")));
        assert!(!add.reads(&Place::Temp(Temp(2))));
        assert!(!Instruction::Pop(Temp(3)).reads(&Place::Temp(Temp(3))));
    }

    #[test]
    fn collects_over_slices() {
        let code = vec![
            Instruction::Print(Operand::var("a")),
            Instruction::Return(Some(Operand::Number(1.0))),
        ];
        let mut seen = Vec::new();
        code.for_each_read(|operand| seen.push(operand.clone()));
        assert_eq!(seen, vec![Operand::var("a"), Operand::Number(1.0)]);
    }
}
