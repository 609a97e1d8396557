//! Type inference and name resolution over the syntax tree.
//!
//! Diagnostics are collected instead of aborting: the walk always covers the
//! whole program, and any error makes the program invalid.
use crate::ast::{BinaryOp, Block, Expr, Function, Literal, Program, Statement};

mod symbols;

pub use symbols::{Scoping, Symbol, SymbolId, SymbolKind, SymbolTable, Type};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticError {
    #[error("Variable '{name}' is already defined in scope '{scope}'")]
    AlreadyDefined { name: String, scope: String },
    #[error("Function '{name}' is already defined")]
    FunctionAlreadyDefined { name: String },
    #[error("Variable '{name}' is not defined")]
    UndefinedVariable { name: String },
    #[error("Function '{name}' is not defined")]
    UndefinedFunction { name: String },
    #[error("Cannot assign value of type '{value}' to variable '{name}' of type '{target}'")]
    AssignMismatch {
        name: String,
        value: Type,
        target: Type,
    },
    #[error("Arithmetic operation '{operator}' requires numeric operands, got '{lhs}' and '{rhs}'")]
    ArithmeticOperands {
        operator: BinaryOp,
        lhs: Type,
        rhs: Type,
    },
    #[error(
        "Comparison operation '{operator}' requires operands of the same type, got '{lhs}' and '{rhs}'"
    )]
    ComparisonOperands {
        operator: BinaryOp,
        lhs: Type,
        rhs: Type,
    },
    #[error("{construct} condition must be boolean, got '{found}'")]
    NonBooleanCondition {
        construct: &'static str,
        found: Type,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticWarning {
    #[error("Variable '{name}' is used before initialization")]
    UsedBeforeInit { name: String },
}

#[derive(Debug, Clone)]
pub struct SemanticResult {
    pub errors: Vec<SemanticError>,
    pub warnings: Vec<SemanticWarning>,
    /// what was successfully checked, one line per declaration, assignment,
    /// call argument, return and print
    pub notes: Vec<String>,
    pub symbol_table: SymbolTable,
}

impl SemanticResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Analyzes a whole program with a fresh symbol table.
pub fn analyze(program: &Program, scoping: Scoping) -> SemanticResult {
    tracing::info!(target: "semantic", "analyzing {} top level statements ({:?} scoping)", program.0.len(), scoping);
    let mut analyzer = Analyzer {
        table: SymbolTable::new(scoping),
        errors: Vec::new(),
        warnings: Vec::new(),
        notes: Vec::new(),
    };
    for stmt in &program.0 {
        analyzer.statement(stmt);
    }
    let result = analyzer.finish();
    if result.is_valid() {
        tracing::info!(target: "semantic", "analysis passed with {} warnings", result.warnings.len());
    } else {
        for error in &result.errors {
            tracing::debug!(target: "semantic", "error: {error}");
        }
        tracing::info!(target: "semantic", "analysis found {} errors", result.errors.len());
    }
    tracing::debug!(target: "semantic", "{}", result.symbol_table);
    result
}

struct Analyzer {
    table: SymbolTable,
    errors: Vec<SemanticError>,
    warnings: Vec<SemanticWarning>,
    notes: Vec<String>,
}

impl Analyzer {
    fn finish(self) -> SemanticResult {
        SemanticResult {
            errors: self.errors,
            warnings: self.warnings,
            notes: self.notes,
            symbol_table: self.table,
        }
    }

    fn error(&mut self, error: SemanticError) -> Type {
        tracing::trace!(target: "semantic", "{error}");
        self.errors.push(error);
        Type::Error
    }

    fn note(&mut self, note: String) {
        tracing::trace!(target: "semantic", "✓ {note}");
        self.notes.push(note);
    }

    fn statement(&mut self, stmt: &Statement) -> Type {
        match stmt {
            Statement::VariableDeclaration { name, init } => self.declaration(name, init.as_ref()),
            Statement::Assignment { name, value } => self.assignment(name, value),
            Statement::If {
                condition,
                then,
                otherwise,
            } => {
                self.condition("If", condition);
                self.block(then);
                if let Some(otherwise) = otherwise {
                    self.block(otherwise);
                }
                Type::Void
            }
            Statement::While { condition, body } => {
                self.condition("While", condition);
                self.block(body);
                Type::Void
            }
            Statement::Block(block) => self.block(block),
            Statement::FunctionDeclaration(function) => self.function(function),
            Statement::Return(value) => {
                let ty = value.as_ref().map_or(Type::Void, |v| self.expr(v));
                self.note(format!("Return statement in function: {}", ty));
                Type::Void
            }
            Statement::Print(expr) => {
                let ty = self.expr(expr);
                self.note(format!("Print statement: {}", ty));
                Type::Void
            }
            Statement::Expression(expr) => self.expr(expr),
        }
    }

    fn block(&mut self, block: &Block) -> Type {
        self.table.enter_block();
        for stmt in &block.0 {
            self.statement(stmt);
        }
        self.table.exit_scope();
        Type::Void
    }

    fn declaration(&mut self, name: &str, init: Option<&Expr>) -> Type {
        // a declaration without initializer can hold anything later on
        let ty = init.map_or(Type::Any, |init| self.expr(init));
        if let Some(existing) = self.table.lookup_conflict(name) {
            let scope = existing.scope.clone();
            return self.error(SemanticError::AlreadyDefined {
                name: name.to_string(),
                scope,
            });
        }
        let id = self.table.declare(name, ty, SymbolKind::Variable);
        if init.is_some() {
            self.table.set_initialized(id);
        }
        self.note(format!("Variable '{}' declared with type '{}'", name, ty));
        ty
    }

    fn assignment(&mut self, name: &str, value: &Expr) -> Type {
        let value = self.expr(value);
        let target = match self.table.lookup(name) {
            Some(symbol) => symbol.ty,
            None => {
                return self.error(SemanticError::UndefinedVariable {
                    name: name.to_string(),
                })
            }
        };
        let compatible = value == target
            || matches!(value, Type::Any | Type::Error)
            || matches!(target, Type::Any | Type::Error);
        if !compatible {
            return self.error(SemanticError::AssignMismatch {
                name: name.to_string(),
                value,
                target,
            });
        }
        self.table.mark_initialized(name);
        self.note(format!("Assignment to '{}' ({})", name, target));
        target
    }

    fn condition(&mut self, construct: &'static str, condition: &Expr) {
        let found = self.expr(condition);
        if !matches!(found, Type::Boolean | Type::Any | Type::Error) {
            self.error(SemanticError::NonBooleanCondition { construct, found });
        }
    }

    fn function(&mut self, function: &Function) -> Type {
        let Function { name, params, body } = function;
        if self.table.lookup_conflict(name).is_some() {
            return self.error(SemanticError::FunctionAlreadyDefined {
                name: name.to_string(),
            });
        }
        let id = self.table.declare(name, Type::Function, SymbolKind::Function);
        // declared before the body so it can call itself
        self.table.set_initialized(id);
        self.note(format!(
            "Function '{}' declared with {} parameters",
            name,
            params.len()
        ));

        self.table.enter_function(name);
        for param in params {
            let id = self.table.declare(param, Type::Any, SymbolKind::Parameter);
            self.table.set_initialized(id);
        }
        self.block(body);
        self.table.exit_scope();
        Type::Void
    }

    fn expr(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::Literal(Literal::Number(_)) => Type::Number,
            Expr::Literal(Literal::String(_)) => Type::String,
            Expr::Identifier(name) => self.identifier(name),
            Expr::Binary { operator, lhs, rhs } => {
                let lhs = self.expr(lhs);
                let rhs = self.expr(rhs);
                self.binary(*operator, lhs, rhs)
            }
            Expr::Call { name, args } => {
                let is_function = self
                    .table
                    .lookup(name)
                    .filter(|symbol| symbol.kind == SymbolKind::Function)
                    .is_some();
                if !is_function {
                    self.error(SemanticError::UndefinedFunction {
                        name: name.to_string(),
                    });
                }
                for (index, arg) in args.iter().enumerate() {
                    let ty = self.expr(arg);
                    if is_function {
                        self.note(format!("Function call argument {}: {}", index + 1, ty));
                    }
                }
                Type::Any
            }
        }
    }

    fn identifier(&mut self, name: &str) -> Type {
        let (ty, initialized) = match self.table.lookup(name) {
            Some(symbol) => (symbol.ty, symbol.initialized),
            None if name == "true" || name == "false" => return Type::Boolean,
            None => {
                return self.error(SemanticError::UndefinedVariable {
                    name: name.to_string(),
                })
            }
        };
        if !initialized {
            self.warnings.push(SemanticWarning::UsedBeforeInit {
                name: name.to_string(),
            });
        }
        ty
    }

    fn binary(&mut self, operator: BinaryOp, lhs: Type, rhs: Type) -> Type {
        if lhs == Type::Error || rhs == Type::Error {
            return Type::Error;
        }
        if operator == BinaryOp::Add && (lhs == Type::String || rhs == Type::String) {
            return Type::String;
        }
        if operator.is_arithmetic() {
            match (lhs, rhs) {
                (Type::Number, Type::Number) => Type::Number,
                (Type::Any, _) | (_, Type::Any) => Type::Any,
                _ => self.error(SemanticError::ArithmeticOperands { operator, lhs, rhs }),
            }
        } else if lhs == rhs || lhs == Type::Any || rhs == Type::Any {
            Type::Boolean
        } else {
            self.error(SemanticError::ComparisonOperands { operator, lhs, rhs })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn analyze_source(source: &str, scoping: Scoping) -> SemanticResult {
        let tokens = tokenize(source).expect("test source should lex");
        let program = parse(&tokens).expect("test source should parse");
        analyze(&program, scoping)
    }

    fn flat(source: &str) -> SemanticResult {
        analyze_source(source, Scoping::Flat)
    }

    #[test]
    fn reassignment_keeps_number_type() {
        let result = flat("dhore x = 10; x = 20;");
        assert!(result.is_valid(), "{:?}", result.errors);
        let x = result.symbol_table.lookup("x").unwrap();
        assert_eq!(x.ty, Type::Number);
        assert!(x.initialized);
        assert_eq!(
            result.notes,
            vec![
                "Variable 'x' declared with type 'number'".to_string(),
                "Assignment to 'x' (number)".to_string(),
            ]
        );
    }

    #[test]
    fn true_is_boolean_without_declaration() {
        let result = flat("jode (true) { dekhao(\"Yes\"); }");
        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(result.symbol_table.is_empty());
    }

    #[test]
    fn flat_redeclaration_across_blocks() {
        let result = flat("jode (true) { dhore x = 1; } jode (false) { dhore x = 2; }");
        assert_eq!(
            result.errors,
            vec![SemanticError::AlreadyDefined {
                name: "x".into(),
                scope: "block_1".into()
            }]
        );
        assert_eq!(
            result.errors[0].to_string(),
            "Variable 'x' is already defined in scope 'block_1'"
        );
    }

    #[test]
    fn lexical_scoping_allows_sibling_blocks() {
        let source = "jode (true) { dhore x = 1; } jode (false) { dhore x = 2; }";
        let result = analyze_source(source, Scoping::Lexical);
        assert!(result.is_valid(), "{:?}", result.errors);
        assert_eq!(result.symbol_table.len(), 2);
    }

    #[test]
    fn lexical_scoping_hides_block_locals() {
        let result = analyze_source("{ dhore x = 1; } dekhao(x);", Scoping::Lexical);
        assert_eq!(
            result.errors,
            vec![SemanticError::UndefinedVariable { name: "x".into() }]
        );
    }

    #[test]
    fn undefined_function_still_checks_arguments() {
        let result = flat("dekhao(nai(1, y));");
        assert_eq!(
            result.errors,
            vec![
                SemanticError::UndefinedFunction { name: "nai".into() },
                SemanticError::UndefinedVariable { name: "y".into() },
            ]
        );
        assert_eq!(result.notes, vec!["Print statement: any".to_string()]);
    }

    #[test]
    fn calling_a_variable_is_an_error() {
        let result = flat("dhore f = 1; f();");
        assert_eq!(
            result.errors,
            vec![SemanticError::UndefinedFunction { name: "f".into() }]
        );
    }

    #[test]
    fn string_concatenation() {
        let result = flat("dhore naam = \"Rahim\"; dhore msg = \"Hello \" + naam; dhore n = 1 + \"a\";");
        assert!(result.is_valid(), "{:?}", result.errors);
        assert_eq!(result.symbol_table.lookup("msg").unwrap().ty, Type::String);
        assert_eq!(result.symbol_table.lookup("n").unwrap().ty, Type::String);
    }

    #[test]
    fn arithmetic_type_errors() {
        let result = flat("dhore s = \"a\" - 1;");
        assert_eq!(
            result.errors,
            vec![SemanticError::ArithmeticOperands {
                operator: BinaryOp::Subtract,
                lhs: Type::String,
                rhs: Type::Number
            }]
        );
        assert_eq!(
            result.errors[0].to_string(),
            "Arithmetic operation '-' requires numeric operands, got 'string' and 'number'"
        );
    }

    #[test]
    fn errors_do_not_cascade() {
        // the undefined variable is the only diagnostic
        let result = flat("dhore a = (b + 1) * 2 < 3;");
        assert_eq!(
            result.errors,
            vec![SemanticError::UndefinedVariable { name: "b".into() }]
        );
    }

    #[test]
    fn comparison_of_mismatched_types() {
        let result = flat("dhore a = 1 == \"1\";");
        assert_eq!(
            result.errors,
            vec![SemanticError::ComparisonOperands {
                operator: BinaryOp::Equals,
                lhs: Type::Number,
                rhs: Type::String
            }]
        );
    }

    #[test]
    fn conditions_must_be_boolean() {
        let result = flat("dhore i = 0; jotokkhon (i) { i = i + 1; } jode (\"x\") { }");
        assert_eq!(
            result.errors,
            vec![
                SemanticError::NonBooleanCondition {
                    construct: "While",
                    found: Type::Number
                },
                SemanticError::NonBooleanCondition {
                    construct: "If",
                    found: Type::String
                },
            ]
        );
        assert_eq!(
            result.errors[0].to_string(),
            "While condition must be boolean, got 'number'"
        );
    }

    #[test]
    fn assignment_checks() {
        let result = flat("y = 1; dhore x = 1; x = \"s\";");
        assert_eq!(
            result.errors,
            vec![
                SemanticError::UndefinedVariable { name: "y".into() },
                SemanticError::AssignMismatch {
                    name: "x".into(),
                    value: Type::String,
                    target: Type::Number
                },
            ]
        );
    }

    #[test]
    fn uninitialized_declaration_warns_until_assigned() {
        let result = flat("dhore x; dekhao(x); x = \"now\"; dekhao(x);");
        assert!(result.is_valid(), "{:?}", result.errors);
        assert_eq!(
            result.warnings,
            vec![SemanticWarning::UsedBeforeInit { name: "x".into() }]
        );
        assert_eq!(
            result.warnings[0].to_string(),
            "Variable 'x' is used before initialization"
        );
        assert!(result.symbol_table.lookup("x").unwrap().initialized);
    }

    #[test]
    fn functions_and_parameters() {
        let result = flat(
            "function jog(a, b) { ferot a + b; } dhore fol = jog(5, 3); dekhao(fol);",
        );
        assert!(result.is_valid(), "{:?}", result.errors);
        assert!(result.warnings.is_empty());
        let table = &result.symbol_table;
        let jog = table.lookup("jog").unwrap();
        assert_eq!((jog.ty, jog.kind), (Type::Function, SymbolKind::Function));
        let a = table.lookup("a").unwrap();
        assert_eq!(
            (a.ty, a.kind, a.scope.as_str()),
            (Type::Any, SymbolKind::Parameter, "function_jog")
        );
        assert_eq!(table.lookup("fol").unwrap().ty, Type::Any);
        assert!(result
            .notes
            .contains(&"Function 'jog' declared with 2 parameters".to_string()));
        assert!(result
            .notes
            .contains(&"Return statement in function: any".to_string()));
        assert!(result
            .notes
            .contains(&"Function call argument 2: number".to_string()));
    }

    #[test]
    fn recursion_and_redefinition() {
        let result = flat("function f(n) { ferot f(n - 1); } function f() { }");
        assert_eq!(
            result.errors,
            vec![SemanticError::FunctionAlreadyDefined { name: "f".into() }]
        );
    }

    #[test]
    fn fresh_state_per_run() {
        let program_source = "dhore x = 1;";
        assert!(flat(program_source).is_valid());
        assert!(flat(program_source).is_valid());
    }
}
