//! Decides where each name of an emission scope gets its `let`.
//!
//! A name is declared inline (`let x = ...`) when its first occurrence is a
//! write at the top level of the innermost block containing all of its
//! occurrences. Every other name is declared once at the start of the scope.
//! Uses inside nested functions count as reads at the function's position,
//! but only for names the scope itself uses.
use std::collections::{HashMap, HashSet};

use super::structure::Node;
use crate::ir::{self, Operand, OperandUsage};

/// Names the target language already defines.
const BUILTIN_NAMES: [&str; 2] = ["true", "false"];

#[derive(Debug, Default)]
pub struct Declarations {
    inline: HashSet<String>,
    hoisted: Vec<String>,
}

impl Declarations {
    /// Plans the declarations of `nodes`, which sit inside `functions`
    /// function bodies. Names in `outer` are already declared by enclosing
    /// scopes.
    pub fn plan(nodes: &[Node], outer: &HashSet<String>, functions: usize) -> Self {
        let mut planner = Planner {
            outer,
            functions,
            events: Vec::new(),
            next_block: 0,
        };
        planner.walk(nodes, &mut Vec::new());
        planner.finish()
    }

    pub fn is_inline(&self, name: &str) -> bool {
        self.inline.contains(name)
    }

    pub fn hoisted(&self) -> &[String] {
        &self.hoisted
    }
}

/// Name of the storage behind an operand, if it has one.
pub fn storage(operand: &Operand) -> Option<String> {
    match operand {
        Operand::Variable(name) => Some(name.clone()),
        Operand::Temp(t) => Some(t.to_string()),
        Operand::Number(_) | Operand::Str(_) => None,
    }
}

#[derive(Debug)]
struct Event {
    name: String,
    path: Vec<usize>,
    write: bool,
    // false for uses inside a nested function
    direct: bool,
}

struct Planner<'a> {
    outer: &'a HashSet<String>,
    functions: usize,
    events: Vec<Event>,
    next_block: usize,
}

impl Planner<'_> {
    fn note(&mut self, name: String, path: &[usize], write: bool, direct: bool) {
        if self.outer.contains(&name) || BUILTIN_NAMES.contains(&name.as_str()) {
            return;
        }
        self.events.push(Event {
            name,
            path: path.to_vec(),
            write,
            direct,
        });
    }

    fn read(&mut self, operand: &Operand, path: &[usize]) {
        if let Some(name) = storage(operand) {
            self.note(name, path, false, true);
        }
    }

    fn block(&mut self, nodes: &[Node], path: &mut Vec<usize>) {
        self.next_block += 1;
        path.push(self.next_block);
        self.walk(nodes, path);
        path.pop();
    }

    fn walk(&mut self, nodes: &[Node], path: &mut Vec<usize>) {
        for node in nodes {
            match node {
                Node::Simple(instruction) => {
                    instruction.for_each_read(|operand| self.read(operand, path));
                    if let Some(place) = instruction.target() {
                        if let Some(name) = storage(&place.into()) {
                            self.note(name, path, true, true);
                        }
                    }
                }
                Node::Call { args, result, .. } => {
                    for arg in args {
                        self.read(arg, path);
                    }
                    if let Some(result) = result {
                        self.note(result.to_string(), path, true, true);
                    }
                }
                Node::If {
                    condition,
                    then,
                    otherwise,
                } => {
                    self.read(condition, path);
                    self.block(then, path);
                    if let Some(otherwise) = otherwise {
                        self.block(otherwise, path);
                    }
                }
                Node::While {
                    prelude,
                    condition,
                    body,
                } if prelude.is_empty() => {
                    self.read(condition, path);
                    self.block(body, path);
                }
                Node::While {
                    prelude,
                    condition,
                    body,
                } => {
                    // prelude, test and body share one block
                    self.next_block += 1;
                    path.push(self.next_block);
                    self.walk(prelude, path);
                    self.read(condition, path);
                    self.walk(body, path);
                    path.pop();
                }
                Node::Function { params, body, .. } => {
                    let mut names = Vec::new();
                    function_variables(body, self.functions, *params, &mut names);
                    // all at the function's position
                    for name in names {
                        self.note(name, path, false, false);
                    }
                }
                Node::Unstructured(_) => {}
            }
        }
    }

    fn finish(self) -> Declarations {
        let direct: HashSet<&str> = self
            .events
            .iter()
            .filter(|event| event.direct)
            .map(|event| event.name.as_str())
            .collect();

        let mut order: Vec<&str> = Vec::new();
        let mut first: HashMap<&str, &Event> = HashMap::new();
        let mut common: HashMap<&str, Vec<usize>> = HashMap::new();
        for event in self.events.iter().filter(|e| direct.contains(e.name.as_str())) {
            let name = event.name.as_str();
            match common.get_mut(name) {
                Some(prefix) => {
                    let shared = prefix
                        .iter()
                        .zip(&event.path)
                        .take_while(|(a, b)| a == b)
                        .count();
                    prefix.truncate(shared);
                }
                None => {
                    order.push(name);
                    first.insert(name, event);
                    common.insert(name, event.path.clone());
                }
            }
        }

        let mut declarations = Declarations::default();
        for name in order {
            let event = first[name];
            if event.write && event.direct && event.path == common[name] {
                declarations.inline.insert(name.to_string());
            } else {
                declarations.hoisted.push(name.to_string());
            }
        }
        tracing::trace!(target: "codegen", "declarations: {declarations:?}");
        declarations
    }
}

/// Every variable a function at nesting `depth` with `params` parameters
/// reads or writes, other than its own parameters.
fn function_variables(body: &[Node], depth: usize, params: usize, names: &mut Vec<String>) {
    let mut inner = Vec::new();
    collect_variables(body, depth + 1, &mut inner);
    let own: HashSet<_> = (0..params).map(|i| ir::parameter_slot(depth, i)).collect();
    for name in inner {
        if !own.contains(&name) && !names.contains(&name) {
            names.push(name);
        }
    }
}

/// Every variable read or written in `nodes`. Functions nested at `depth`
/// contribute everything but their own parameters.
fn collect_variables(nodes: &[Node], depth: usize, names: &mut Vec<String>) {
    fn remember(names: &mut Vec<String>, operand: &Operand) {
        if let Operand::Variable(name) = operand {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
    }
    for node in nodes {
        match node {
            Node::Simple(instruction) => {
                instruction.for_each_read(|operand| remember(names, operand));
                if let Some(place) = instruction.target() {
                    remember(names, &place.into());
                }
            }
            Node::Call { args, .. } => {
                for arg in args {
                    remember(names, arg);
                }
            }
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                remember(names, condition);
                collect_variables(then, depth, names);
                if let Some(otherwise) = otherwise {
                    collect_variables(otherwise, depth, names);
                }
            }
            Node::While {
                prelude,
                condition,
                body,
            } => {
                collect_variables(prelude, depth, names);
                remember(names, condition);
                collect_variables(body, depth, names);
            }
            Node::Function { params, body, .. } => {
                function_variables(body, depth, *params, names)
            }
            Node::Unstructured(_) => {}
        }
    }
}
