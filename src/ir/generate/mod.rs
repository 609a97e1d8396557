use std::collections::HashMap;

use super::{IRCode, Instruction, Label, Operand, Place, Temp};
use crate::ast;

mod expr;
mod statement;

/// Lowers a program into three-address code. Temporaries and labels are
/// numbered from 1 on every call.
pub fn generate(program: &ast::Program) -> IRCode {
    tracing::info!(target: "irgen", "generating intermediate code");
    let mut state = IRGenState::default();
    state.enter_scope();
    for stmt in &program.0 {
        statement::compile_statement(&mut state, stmt);
    }
    let code = state.release();
    tracing::debug!(target: "irgen", "generated {} instructions:\n{}", code.len(), super::Listing(&code));
    code
}

#[derive(Debug, Default)]
pub struct IRGenState {
    instructions: IRCode,
    temps: BindingCounter,
    labels: BindingCounter,
    renames: BindingCounter,
    // source name to generated name, innermost scope last
    scopes: Vec<HashMap<String, String>>,
    // number of functions being lowered
    functions: usize,
}

impl IRGenState {
    pub fn push(&mut self, instruction: Instruction) {
        tracing::trace!(target: "irgen", "{instruction}");
        self.instructions.push(instruction);
    }

    pub fn next_temp(&mut self) -> Temp {
        Temp(self.temps.next_binding())
    }

    pub fn next_label(&mut self) -> Label {
        Label(self.labels.next_binding())
    }

    /// The name a source level variable has in the generated code.
    pub fn resolve(&self, name: &str) -> String {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    pub fn variable(&self, name: &str) -> Operand {
        Operand::Variable(self.resolve(name))
    }

    pub fn place(&self, name: &str) -> Place {
        Place::Variable(self.resolve(name))
    }

    /// Binds a declared variable in the innermost scope. A declaration
    /// hiding a visible one gets a fresh name.
    pub fn declare(&mut self, name: &str) -> Place {
        let visible = self.scopes.iter().any(|scope| scope.contains_key(name));
        let generated = if visible {
            let renamed = format!("{}${}", name, self.renames.next_binding());
            tracing::trace!(target: "irgen", "{name} is shadowed, lowering it as {renamed}");
            renamed
        } else {
            name.to_string()
        };
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), generated.clone());
        }
        Place::Variable(generated)
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    /// Opens the scope of a function body, binding every parameter to its
    /// slot.
    pub fn enter_function(&mut self, params: &[&str]) {
        let depth = self.functions;
        let scope = params
            .iter()
            .enumerate()
            .map(|(index, param)| (param.to_string(), super::parameter_slot(depth, index)))
            .collect();
        self.scopes.push(scope);
        self.functions += 1;
    }

    pub fn exit_function(&mut self) {
        self.functions -= 1;
        self.scopes.pop();
    }

    pub fn release(self) -> IRCode {
        self.instructions
    }
}

#[derive(Debug, Default)]
pub struct BindingCounter {
    pub latest_binding: usize,
}

impl BindingCounter {
    /// Bindings start at 1.
    pub fn next_binding(&mut self) -> usize {
        self.latest_binding += 1;
        self.latest_binding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::BinaryOpcode;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    pub(super) fn lower(source: &str) -> IRCode {
        let tokens = tokenize(source).expect("test source should lex");
        let program = parse(&tokens).expect("test source should parse");
        generate(&program)
    }

    pub(super) fn listing(source: &str) -> Vec<String> {
        lower(source).iter().map(ToString::to_string).collect()
    }

    #[test]
    fn declaration_with_sum() {
        assert_eq!(
            lower("dhore x = 5 + 3;"),
            vec![
                Instruction::Binary {
                    op: BinaryOpcode::Add,
                    target: Temp(1),
                    lhs: Operand::Number(5.0),
                    rhs: Operand::Number(3.0),
                },
                Instruction::Assign {
                    target: Place::var("x"),
                    value: Operand::Temp(Temp(1)),
                },
            ]
        );
    }

    #[test]
    fn counters_restart_per_run() {
        let source = "dhore a = 1 * 2; jode (a > 1) { dekhao(a); }";
        assert_eq!(lower(source), lower(source));
        assert_eq!(listing(source)[0], "MUL t1, 1, 2");
    }

    #[test]
    fn parameter_names_are_scoped_to_their_function() {
        let mut state = IRGenState::default();
        state.enter_function(&["a", "b"]);
        assert_eq!(state.resolve("b"), "param1");
        state.enter_function(&["b"]);
        assert_eq!(state.resolve("b"), "param0$1");
        assert_eq!(state.resolve("a"), "param0");
        state.exit_function();
        state.exit_function();
        assert_eq!(state.resolve("a"), "a");
    }

    #[test]
    fn shadowing_declarations_are_renamed() {
        let mut state = IRGenState::default();
        state.enter_scope();
        assert_eq!(state.declare("x"), Place::var("x"));
        state.enter_scope();
        assert_eq!(state.declare("x"), Place::var("x$1"));
        assert_eq!(state.resolve("x"), "x$1");
        state.exit_scope();
        assert_eq!(state.resolve("x"), "x");
        state.enter_scope();
        assert_eq!(state.declare("y"), Place::var("y"));
        state.exit_scope();
        state.enter_scope();
        assert_eq!(state.declare("y"), Place::var("y"));
    }
}
