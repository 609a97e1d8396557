pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod demos;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod optimize;
pub mod parser;
pub mod semantic;

pub use compiler::{compile, CompilationResult, CompileError, Compiler, Options};
