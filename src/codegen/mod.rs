//! JavaScript emission.
//!
//! The instruction list is first turned back into structured control flow
//! (see [`structure`]), then every node is written out with two spaces of
//! indentation per nesting level.
use std::collections::HashSet;

use itertools::Itertools;

use crate::ir::{self, BinaryOpcode, Instruction};

mod declarations;
mod output;
pub mod structure;

use declarations::Declarations;
pub use output::{Line, Output};
use structure::Node;

pub fn generate(code: &[Instruction]) -> String {
    tracing::info!(target: "codegen", "emitting javascript for {} instructions", code.len());
    let nodes = structure::reconstruct(code);
    let mut emitter = Emitter::default();
    let output = emitter.scope(&nodes, 0, &[]);
    tracing::debug!(target: "codegen", "emitted {} lines", output.len());
    output.to_string()
}

/// Infix spelling of an opcode.
pub const fn operator(op: BinaryOpcode) -> &'static str {
    match op {
        BinaryOpcode::Add => "+",
        BinaryOpcode::Sub => "-",
        BinaryOpcode::Mul => "*",
        BinaryOpcode::Div => "/",
        BinaryOpcode::Eq => "===",
        BinaryOpcode::Ne => "!==",
        BinaryOpcode::Lt => "<",
        BinaryOpcode::Gt => ">",
        BinaryOpcode::Le => "<=",
        BinaryOpcode::Ge => ">=",
        BinaryOpcode::Shl => "<<",
        BinaryOpcode::Shr => ">>",
    }
}

struct ScopeState {
    plan: Declarations,
    declared: HashSet<String>,
}

#[derive(Default)]
struct Emitter {
    // names declared by each open block, innermost last
    blocks: Vec<Vec<String>>,
    // one per program or function body being emitted
    scopes: Vec<ScopeState>,
}

impl Emitter {
    fn visible(&self) -> HashSet<String> {
        self.blocks.iter().flatten().cloned().collect()
    }

    /// Emits a program or function body. Hoisted declarations go first.
    fn scope(&mut self, nodes: &[Node], depth: usize, params: &[String]) -> Output<Line> {
        let mut outer = self.visible();
        outer.extend(params.iter().cloned());
        // the program scope is the only one not inside a function
        let plan = Declarations::plan(nodes, &outer, self.scopes.len());
        let hoisted = plan.hoisted().to_vec();

        self.scopes.push(ScopeState {
            plan,
            declared: hoisted.iter().cloned().collect(),
        });
        self.blocks
            .push(params.iter().chain(&hoisted).cloned().collect());
        let mut output = Output::new();
        self.sequence(&mut output, nodes, depth);
        self.blocks.pop();
        self.scopes.pop();

        if !hoisted.is_empty() {
            output.cons(Line::new(depth, format!("let {};", hoisted.join(", "))));
        }
        output
    }

    fn block(&mut self, output: &mut Output<Line>, nodes: &[Node], depth: usize) {
        self.blocks.push(Vec::new());
        self.sequence(output, nodes, depth);
        self.blocks.pop();
    }

    fn sequence(&mut self, output: &mut Output<Line>, nodes: &[Node], depth: usize) {
        for node in nodes {
            self.node(output, node, depth);
        }
    }

    /// The left hand side of a write to `name`, with `let` on the write
    /// that declares it.
    fn binding(&mut self, name: String) -> String {
        let Some(scope) = self.scopes.last_mut() else {
            return name;
        };
        if scope.plan.is_inline(&name) && scope.declared.insert(name.clone()) {
            if let Some(block) = self.blocks.last_mut() {
                block.push(name.clone());
            }
            format!("let {}", name)
        } else {
            name
        }
    }

    fn node(&mut self, output: &mut Output<Line>, node: &Node, depth: usize) {
        match node {
            Node::Simple(Instruction::Assign { target, value }) => {
                let target = self.binding(target.to_string());
                output.push(Line::new(depth, format!("{} = {};", target, value)));
            }
            Node::Simple(Instruction::Binary {
                op,
                target,
                lhs,
                rhs,
            }) => {
                let target = self.binding(target.to_string());
                let text = format!("{} = {} {} {};", target, lhs, operator(*op), rhs);
                output.push(Line::new(depth, text));
            }
            Node::Simple(Instruction::Print(value)) => {
                output.push(Line::new(depth, format!("console.log({});", value)));
            }
            Node::Simple(Instruction::Return(Some(value))) => {
                output.push(Line::new(depth, format!("return {};", value)));
            }
            Node::Simple(Instruction::Return(None)) => output.push(Line::new(depth, "return;")),
            Node::Call { name, args, result } => {
                let call = format!("{}({})", name, args.iter().join(", "));
                let text = match result {
                    Some(result) => format!("{} = {};", self.binding(result.to_string()), call),
                    None => format!("{};", call),
                };
                output.push(Line::new(depth, text));
            }
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                output.push(Line::new(depth, format!("if ({}) {{", condition)));
                self.block(output, then, depth + 1);
                if let Some(otherwise) = otherwise {
                    output.push(Line::new(depth, "} else {"));
                    self.block(output, otherwise, depth + 1);
                }
                output.push(Line::new(depth, "}"));
            }
            Node::While {
                prelude,
                condition,
                body,
            } if prelude.is_empty() => {
                output.push(Line::new(depth, format!("while ({}) {{", condition)));
                self.block(output, body, depth + 1);
                output.push(Line::new(depth, "}"));
            }
            Node::While {
                prelude,
                condition,
                body,
            } => {
                output.push(Line::new(depth, "while (true) {"));
                self.blocks.push(Vec::new());
                self.sequence(output, prelude, depth + 1);
                output.push(Line::new(depth + 1, format!("if (!{}) break;", condition)));
                self.sequence(output, body, depth + 1);
                self.blocks.pop();
                output.push(Line::new(depth, "}"));
            }
            Node::Function { name, params, body } => {
                let nesting = self.scopes.len().saturating_sub(1);
                let params: Vec<_> = (0..*params)
                    .map(|index| ir::parameter_slot(nesting, index))
                    .collect();
                tracing::trace!(target: "codegen", "function {name}({})", params.join(", "));
                output.push(Line::new(
                    depth,
                    format!("function {}({}) {{", name, params.join(", ")),
                ));
                let body = self.scope(body, depth + 1, &params);
                output.extend(body);
                output.push(Line::new(depth, "}"));
            }
            Node::Simple(instruction) | Node::Unstructured(instruction) => {
                tracing::debug!(target: "codegen", "`{instruction}` kept as a comment");
                output.push(Line::new(depth, format!("// {}", instruction)));
            }
        }
    }
}
