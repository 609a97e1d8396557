//! Local rewrites over the intermediate code.
//!
//! Four passes always run in the same order, each over the whole list:
//! constant folding, dead code elimination, common subexpression
//! elimination and strength reduction. None of them does data-flow
//! analysis; they rely on temporaries being written exactly once.
use crate::ir::IRCode;

mod cleanup;
mod cse;
mod fold;
mod strength;

pub use cleanup::remove_dead_code;
pub use cse::eliminate_common_subexpressions;
pub use fold::constant_fold;
pub use strength::reduce_strength;

pub trait Pass {
    fn name(&self) -> &'static str;
    fn run(&self, code: IRCode) -> IRCode;
}

pub struct ConstantFolding;
pub struct DeadCodeElimination;
pub struct CommonSubexpressionElimination;
pub struct StrengthReduction;

impl Pass for ConstantFolding {
    fn name(&self) -> &'static str {
        "constant folding"
    }
    fn run(&self, code: IRCode) -> IRCode {
        constant_fold(code)
    }
}

impl Pass for DeadCodeElimination {
    fn name(&self) -> &'static str {
        "dead code elimination"
    }
    fn run(&self, code: IRCode) -> IRCode {
        remove_dead_code(code)
    }
}

impl Pass for CommonSubexpressionElimination {
    fn name(&self) -> &'static str {
        "common subexpression elimination"
    }
    fn run(&self, code: IRCode) -> IRCode {
        eliminate_common_subexpressions(code)
    }
}

impl Pass for StrengthReduction {
    fn name(&self) -> &'static str {
        "strength reduction"
    }
    fn run(&self, code: IRCode) -> IRCode {
        reduce_strength(code)
    }
}

/// The passes in the order they run.
pub const PASSES: [&dyn Pass; 4] = [
    &ConstantFolding,
    &DeadCodeElimination,
    &CommonSubexpressionElimination,
    &StrengthReduction,
];

/// How many instructions a pass removed. Only passes that removed something
/// get a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub pass: &'static str,
    pub removed: usize,
}

impl std::fmt::Display for PassReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: removed {} instructions", self.pass, self.removed)
    }
}

pub fn optimize(code: IRCode) -> IRCode {
    optimize_with_report(code).0
}

pub fn optimize_with_report(code: IRCode) -> (IRCode, Vec<PassReport>) {
    tracing::info!(target: "optimize", "optimizing {} instructions", code.len());
    let mut reports = Vec::new();
    let code = PASSES.iter().fold(code, |code, pass| {
        let before = code.len();
        let code = pass.run(code);
        let removed = before.saturating_sub(code.len());
        if removed > 0 {
            let report = PassReport {
                pass: pass.name(),
                removed,
            };
            tracing::info!(target: "optimize", "{report}");
            reports.push(report);
        } else {
            tracing::debug!(target: "optimize", "{}: nothing removed", pass.name());
        }
        code
    });
    tracing::debug!(target: "optimize", "optimized code:\n{}", crate::ir::Listing(&code));
    (code, reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{self, Instruction, Operand, Place};
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn lower(source: &str) -> IRCode {
        let tokens = tokenize(source).expect("test source should lex");
        let program = parse(&tokens).expect("test source should parse");
        ir::generate(&program)
    }

    #[test]
    fn folded_declaration() {
        let (code, reports) = optimize_with_report(lower("dhore x = 5 + 3;"));
        assert_eq!(
            code,
            vec![Instruction::Assign {
                target: Place::var("x"),
                value: Operand::Number(8.0),
            }]
        );
        assert_eq!(
            reports,
            vec![PassReport {
                pass: "dead code elimination",
                removed: 1
            }]
        );
    }

    #[test]
    fn chained_constants_fold_completely() {
        let code = optimize(lower("dhore x = 2 * 3 + 4 * 5;"));
        assert_eq!(code.len(), 1);
        assert_eq!(code[0].to_string(), "ASSIGN x, 26");
    }

    #[test]
    fn later_passes_reach_a_fixed_point() {
        let sources = [
            "dhore x = 5 + 3;",
            "dhore a = 4; dhore b = a * 8 + a * 8; dekhao(b / 2);",
            "dhore i = 0; jotokkhon (i < 10) { i = i + 1; dekhao(i * 2); }",
            "function jog(a, b) { ferot a + b; } dhore r = jog(1, 2) * 4; dekhao(r);",
            "dhore n = 10; jode (n > 5) { dekhao(n - 1); } onnathay { dekhao(n + 1); }",
        ];
        for source in sources {
            let once = optimize(lower(source));
            let again = PASSES[1..]
                .iter()
                .fold(once.clone(), |code, pass| pass.run(code));
            assert_eq!(once, again, "{source}");
        }
    }

    #[test]
    fn nothing_to_do() {
        let code = lower("dekhao(\"hi\");");
        let (optimized, reports) = optimize_with_report(code.clone());
        assert_eq!(optimized, code);
        assert!(reports.is_empty());
    }

    #[test]
    fn pass_order() {
        let names: Vec<_> = PASSES.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec![
                "constant folding",
                "dead code elimination",
                "common subexpression elimination",
                "strength reduction"
            ]
        );
    }
}
