//! Recovers structured control flow from the label/jump shape of the
//! intermediate code.
//!
//! The generator only produces four shapes:
//!
//! ```text
//! if:       IF c, Lt, Le   LABEL Lt  <then>                        LABEL Le
//! if/else:  IF c, Lt, Lx   LABEL Lt  <then>  GOTO Le  LABEL Lx  <else>  LABEL Le
//! while:    LABEL Ls  <prelude>  IF c, Lb, Le  LABEL Lb  <body>  GOTO Ls  LABEL Le
//! function: LABEL Lf  FUNCTION name, n  <body>  ENDFUNCTION name
//! ```
//!
//! Anything else is kept as [`Node::Unstructured`].
use std::collections::{HashMap, HashSet};

use crate::ir::{Instruction, Label, Operand, Temp};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `ASSIGN`, arithmetic, comparisons, `PRINT` and `RETURN`
    Simple(Instruction),
    /// `PUSH`es followed by `CALL` and the `POP` of its result
    Call {
        name: String,
        args: Vec<Operand>,
        result: Option<Temp>,
    },
    If {
        condition: Operand,
        then: Vec<Node>,
        otherwise: Option<Vec<Node>>,
    },
    While {
        /// instructions computing the condition, run before every test
        prelude: Vec<Node>,
        condition: Operand,
        body: Vec<Node>,
    },
    Function {
        name: String,
        params: usize,
        body: Vec<Node>,
    },
    Unstructured(Instruction),
}

/// Where every label is defined and which labels something jumps to.
#[derive(Debug, Default)]
pub struct LabelMap {
    positions: HashMap<Label, usize>,
    targets: HashSet<Label>,
}

impl LabelMap {
    pub fn collect(code: &[Instruction]) -> Self {
        let mut map = Self::default();
        for (index, instruction) in code.iter().enumerate() {
            match instruction {
                Instruction::Label(label) => {
                    map.positions.insert(*label, index);
                }
                Instruction::Goto(label) => {
                    map.targets.insert(*label);
                }
                Instruction::If {
                    then, otherwise, ..
                } => {
                    map.targets.insert(*then);
                    map.targets.insert(*otherwise);
                }
                _ => {}
            }
        }
        map
    }

    pub fn position(&self, label: Label) -> Option<usize> {
        self.positions.get(&label).copied()
    }

    pub fn is_target(&self, label: Label) -> bool {
        self.targets.contains(&label)
    }
}

pub fn reconstruct(code: &[Instruction]) -> Vec<Node> {
    let structurer = Structurer {
        code,
        labels: LabelMap::collect(code),
    };
    structurer.sequence(0, code.len())
}

struct Structurer<'a> {
    code: &'a [Instruction],
    labels: LabelMap,
}

impl Structurer<'_> {
    /// Structures `code[start..end]`.
    fn sequence(&self, start: usize, end: usize) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut pos = start;
        while pos < end {
            let (node, next) = self.node(pos, end);
            debug_assert!(next > pos);
            nodes.extend(node);
            pos = next;
        }
        nodes
    }

    /// The node starting at `pos` and the position right after it.
    fn node(&self, pos: usize, end: usize) -> (Option<Node>, usize) {
        let instruction = &self.code[pos];
        let structured = match instruction {
            Instruction::Label(label) => match self.code.get(pos + 1) {
                Some(Instruction::Function { .. }) if pos + 1 < end => self.function(pos + 1, end),
                _ if self.labels.is_target(*label) => self.while_loop(pos, *label, end),
                // nothing jumps here
                _ => return (None, pos + 1),
            },
            Instruction::Function { .. } => self.function(pos, end),
            Instruction::If {
                condition,
                then,
                otherwise,
            } => self.branch(pos, end, condition, *then, *otherwise),
            Instruction::Push(_) | Instruction::Call { .. } => self.call(pos, end),
            Instruction::Assign { .. }
            | Instruction::Binary { .. }
            | Instruction::Print(_)
            | Instruction::Return(_) => Some((Node::Simple(instruction.clone()), pos + 1)),
            Instruction::Goto(_) | Instruction::EndFunction { .. } | Instruction::Pop(_) => None,
        };
        match structured {
            Some((node, next)) => (Some(node), next),
            None => {
                tracing::warn!(target: "codegen::structure", "no structure for `{instruction}` at {pos}");
                (Some(Node::Unstructured(instruction.clone())), pos + 1)
            }
        }
    }

    fn function(&self, pos: usize, end: usize) -> Option<(Node, usize)> {
        let Instruction::Function { name, params } = &self.code[pos] else {
            return None;
        };
        let mut depth = 0usize;
        let close = (pos + 1..end).find(|&i| match &self.code[i] {
            Instruction::Function { .. } => {
                depth += 1;
                false
            }
            Instruction::EndFunction { .. } if depth > 0 => {
                depth -= 1;
                false
            }
            Instruction::EndFunction { name: closing } => closing == name,
            _ => false,
        })?;
        tracing::trace!(target: "codegen::structure", "function {name} spans {pos}..{close}");
        let node = Node::Function {
            name: name.clone(),
            params: *params,
            body: self.sequence(pos + 1, close),
        };
        Some((node, close + 1))
    }

    fn while_loop(&self, pos: usize, start: Label, end: usize) -> Option<(Node, usize)> {
        let back = (pos + 1..end)
            .rev()
            .find(|&i| self.code[i] == Instruction::Goto(start))?;
        let test = (pos + 1..back).find(|&i| matches!(self.code[i], Instruction::If { .. }))?;
        let Instruction::If {
            condition,
            then,
            otherwise,
        } = &self.code[test]
        else {
            return None;
        };
        let enters_body = self.code.get(test + 1) == Some(&Instruction::Label(*then));
        let exits = back + 1 < end && self.code[back + 1] == Instruction::Label(*otherwise);
        if !(enters_body && exits) {
            return None;
        }
        tracing::trace!(target: "codegen::structure", "loop at {pos}, test at {test}, back edge at {back}");
        let node = Node::While {
            prelude: self.sequence(pos + 1, test),
            condition: condition.clone(),
            body: self.sequence(test + 2, back),
        };
        Some((node, back + 2))
    }

    fn branch(
        &self,
        pos: usize,
        end: usize,
        condition: &Operand,
        then: Label,
        otherwise: Label,
    ) -> Option<(Node, usize)> {
        if self.code.get(pos + 1) != Some(&Instruction::Label(then)) {
            return None;
        }
        let split = self.labels.position(otherwise)?;
        if split <= pos + 1 || split >= end {
            return None;
        }
        // a forward jump right before the false label skips the else part
        if let Instruction::Goto(exit) = &self.code[split - 1] {
            if let Some(join) = self.labels.position(*exit).filter(|&j| j > split && j < end) {
                tracing::trace!(target: "codegen::structure", "if/else at {pos}, else at {split}, join at {join}");
                let node = Node::If {
                    condition: condition.clone(),
                    then: self.sequence(pos + 2, split - 1),
                    otherwise: Some(self.sequence(split + 1, join)),
                };
                return Some((node, join + 1));
            }
        }
        tracing::trace!(target: "codegen::structure", "if at {pos}, join at {split}");
        let node = Node::If {
            condition: condition.clone(),
            then: self.sequence(pos + 2, split),
            otherwise: None,
        };
        Some((node, split + 1))
    }

    fn call(&self, pos: usize, end: usize) -> Option<(Node, usize)> {
        let mut args = Vec::new();
        let mut at = pos;
        while at < end {
            match &self.code[at] {
                Instruction::Push(arg) => args.push(arg.clone()),
                _ => break,
            }
            at += 1;
        }
        let name = match self.code.get(at) {
            Some(Instruction::Call { name, args: count }) if at < end && *count == args.len() => {
                name.clone()
            }
            _ => return None,
        };
        let (result, next) = match self.code.get(at + 1) {
            Some(Instruction::Pop(temp)) if at + 1 < end => (Some(*temp), at + 2),
            _ => (None, at + 1),
        };
        Some((Node::Call { name, args, result }, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{self, BinaryOpcode, IRCode, Place};
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn lower(source: &str) -> IRCode {
        let tokens = tokenize(source).expect("test source should lex");
        let program = parse(&tokens).expect("test source should parse");
        ir::generate(&program)
    }

    fn print(n: f64) -> Node {
        Node::Simple(Instruction::Print(Operand::Number(n)))
    }

    #[test]
    fn collects_labels_and_targets() {
        let code = lower("jode (a) { dekhao(1); }");
        let labels = LabelMap::collect(&code);
        assert_eq!(labels.position(Label(1)), Some(1));
        assert_eq!(labels.position(Label(2)), Some(3));
        assert!(labels.is_target(Label(1)));
        assert!(labels.is_target(Label(2)));
        assert!(!labels.is_target(Label(3)));
    }

    #[test]
    fn if_without_else() {
        assert_eq!(
            reconstruct(&lower("jode (a) { dekhao(1); } dekhao(2);")),
            vec![
                Node::If {
                    condition: Operand::var("a"),
                    then: vec![print(1.0)],
                    otherwise: None,
                },
                print(2.0),
            ]
        );
    }

    #[test]
    fn if_else() {
        assert_eq!(
            reconstruct(&lower("jode (a) { dekhao(1); } onnathay { dekhao(2); }")),
            vec![Node::If {
                condition: Operand::var("a"),
                then: vec![print(1.0)],
                otherwise: Some(vec![print(2.0)]),
            }]
        );
    }

    #[test]
    fn empty_then_block() {
        assert_eq!(
            reconstruct(&lower("jode (a) { }")),
            vec![Node::If {
                condition: Operand::var("a"),
                then: vec![],
                otherwise: None,
            }]
        );
    }

    #[test]
    fn while_with_condition_prelude() {
        let nodes = reconstruct(&lower("jotokkhon (i < 3) { dekhao(i); }"));
        assert_eq!(
            nodes,
            vec![Node::While {
                prelude: vec![Node::Simple(Instruction::Binary {
                    op: BinaryOpcode::Lt,
                    target: Temp(1),
                    lhs: Operand::var("i"),
                    rhs: Operand::Number(3.0),
                })],
                condition: Operand::Temp(Temp(1)),
                body: vec![Node::Simple(Instruction::Print(Operand::var("i")))],
            }]
        );
    }

    #[test]
    fn nested_control_flow() {
        let source = "jotokkhon (a) { jode (b) { dekhao(1); } onnathay { jotokkhon (c) { dekhao(2); } } }";
        let nodes = reconstruct(&lower(source));
        let inner_loop = Node::While {
            prelude: vec![],
            condition: Operand::var("c"),
            body: vec![print(2.0)],
        };
        assert_eq!(
            nodes,
            vec![Node::While {
                prelude: vec![],
                condition: Operand::var("a"),
                body: vec![Node::If {
                    condition: Operand::var("b"),
                    then: vec![print(1.0)],
                    otherwise: Some(vec![inner_loop]),
                }],
            }]
        );
    }

    #[test]
    fn functions_and_calls() {
        let nodes = reconstruct(&lower("function f(a) { ferot a; } dhore x = f(2); f(x);"));
        assert_eq!(
            nodes,
            vec![
                Node::Function {
                    name: "f".into(),
                    params: 1,
                    body: vec![Node::Simple(Instruction::Return(Some(Operand::var(
                        "param0"
                    ))))],
                },
                Node::Call {
                    name: "f".into(),
                    args: vec![Operand::Number(2.0)],
                    result: Some(Temp(1)),
                },
                Node::Simple(Instruction::Assign {
                    target: Place::var("x"),
                    value: Operand::Temp(Temp(1)),
                }),
                Node::Call {
                    name: "f".into(),
                    args: vec![Operand::var("x")],
                    result: Some(Temp(2)),
                },
            ]
        );
    }

    #[test]
    fn stray_jumps_stay_unstructured() {
        let code = vec![
            Instruction::Goto(Label(7)),
            Instruction::Print(Operand::Number(1.0)),
            Instruction::Pop(Temp(1)),
        ];
        assert_eq!(
            reconstruct(&code),
            vec![
                Node::Unstructured(Instruction::Goto(Label(7))),
                print(1.0),
                Node::Unstructured(Instruction::Pop(Temp(1))),
            ]
        );
    }

    #[test]
    fn mismatched_call_arity_is_unstructured() {
        let code = vec![
            Instruction::Push(Operand::Number(1.0)),
            Instruction::Call {
                name: "f".into(),
                args: 2,
            },
        ];
        let nodes = reconstruct(&code);
        assert!(matches!(nodes[0], Node::Unstructured(Instruction::Push(_))));
    }
}
