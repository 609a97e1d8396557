use super::expr::compile_expr;
use super::IRGenState;
use crate::ast::{Block, Function, Statement};
use crate::ir::{Instruction, Operand, Place};

pub fn compile_statement(state: &mut IRGenState, stmt: &Statement) {
    match stmt {
        Statement::VariableDeclaration { name, init } => {
            // the initializer still sees any variable the name hides
            let value = init.as_ref().map(|init| compile_expr(state, init));
            let target = state.declare(name);
            // without an initializer there is nothing to compute yet
            if let Some(value) = value {
                assign(state, target, value);
            }
        }
        Statement::Assignment { name, value } => {
            let value = compile_expr(state, value);
            let target = state.place(name);
            assign(state, target, value);
        }
        Statement::If {
            condition,
            then,
            otherwise,
        } => {
            let condition = compile_expr(state, condition);
            let then_label = state.next_label();
            let end_label = state.next_label();
            let else_label = otherwise.as_ref().map(|_| state.next_label());

            state.push(Instruction::If {
                condition,
                then: then_label,
                otherwise: else_label.unwrap_or(end_label),
            });
            state.push(Instruction::Label(then_label));
            compile_block(state, then);

            if let (Some(otherwise), Some(else_label)) = (otherwise, else_label) {
                state.push(Instruction::Goto(end_label));
                state.push(Instruction::Label(else_label));
                compile_block(state, otherwise);
            }

            state.push(Instruction::Label(end_label));
        }
        Statement::While { condition, body } => {
            let start_label = state.next_label();
            let body_label = state.next_label();
            let end_label = state.next_label();

            state.push(Instruction::Label(start_label));
            // the condition is evaluated again on every iteration
            let condition = compile_expr(state, condition);
            state.push(Instruction::If {
                condition,
                then: body_label,
                otherwise: end_label,
            });
            state.push(Instruction::Label(body_label));
            compile_block(state, body);
            state.push(Instruction::Goto(start_label));
            state.push(Instruction::Label(end_label));
        }
        Statement::Block(block) => compile_block(state, block),
        Statement::FunctionDeclaration(function) => compile_function(state, function),
        Statement::Return(value) => {
            let value = value.as_ref().map(|value| compile_expr(state, value));
            state.push(Instruction::Return(value));
        }
        Statement::Print(expr) => {
            let value = compile_expr(state, expr);
            state.push(Instruction::Print(value));
        }
        Statement::Expression(expr) => {
            compile_expr(state, expr);
        }
    }
}

fn assign(state: &mut IRGenState, target: Place, value: Operand) {
    // `x = x` has no effect
    if !value.refers_to(&target) {
        state.push(Instruction::Assign { target, value });
    }
}

pub fn compile_block(state: &mut IRGenState, Block(statements): &Block) {
    state.enter_scope();
    for stmt in statements {
        compile_statement(state, stmt);
    }
    state.exit_scope();
}

fn compile_function(state: &mut IRGenState, function: &Function) {
    let Function { name, params, body } = function;
    tracing::trace!(target: "irgen", "lowering function {name} with {} params", params.len());
    let label = state.next_label();
    state.push(Instruction::Label(label));
    state.push(Instruction::Function {
        name: name.to_string(),
        params: params.len(),
    });
    state.enter_function(params);
    compile_block(state, body);
    state.exit_function();
    state.push(Instruction::EndFunction {
        name: name.to_string(),
    });
}
