//! Runs the six phases back to back.
//!
//! Lexing and parsing stop at the first error. Semantic problems are data:
//! a program with semantic errors never reaches intermediate code
//! generation, and the analysis is handed back inside the error.
use std::fmt;

use crate::ast::Program;
use crate::codegen;
use crate::error::SourceMetadata;
use crate::ir::{self, IRCode};
use crate::lexer::{self, LexError, Token};
use crate::optimize::{self, PassReport};
use crate::parser::{self, ParseError};
use crate::semantic::{self, Scoping, SemanticResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub scoping: Scoping,
    /// run the optimizer; when off the optimized code is a copy of the
    /// intermediate code
    pub optimize: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scoping: Scoping::Flat,
            optimize: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("lexical error: {0}")]
    Lex(LexError),
    #[error("syntax error: {0}")]
    Parse(ParseError),
    #[error("semantic analysis found {} errors", .result.errors.len())]
    Semantic { result: SemanticResult },
}

/// Every intermediate product of a successful compilation.
#[derive(Debug)]
pub struct CompilationResult<'source> {
    pub tokens: Vec<Token<'source>>,
    pub ast: Program<'source>,
    pub semantic: SemanticResult,
    pub intermediate: IRCode,
    pub optimized: IRCode,
    pub report: Vec<PassReport>,
    pub generated: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// not counting the end of input
    pub tokens: usize,
    pub ast_nodes: usize,
    pub symbols: usize,
    pub instructions: usize,
    pub optimized_instructions: usize,
    pub generated_lines: usize,
}

impl CompilationResult<'_> {
    pub fn summary(&self) -> Summary {
        Summary {
            tokens: self.tokens.len().saturating_sub(1),
            ast_nodes: self.ast.node_count(),
            symbols: self.semantic.symbol_table.len(),
            instructions: self.intermediate.len(),
            optimized_instructions: self.optimized.len(),
            generated_lines: self.generated.lines().count(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tokens generated: {}", self.tokens)?;
        writeln!(f, "AST nodes: {}", self.ast_nodes)?;
        writeln!(f, "Variables declared: {}", self.symbols)?;
        writeln!(f, "Intermediate instructions: {}", self.instructions)?;
        writeln!(f, "Optimized instructions: {}", self.optimized_instructions)?;
        write!(f, "Generated code lines: {}", self.generated_lines)?;
        let saved = self.instructions.saturating_sub(self.optimized_instructions);
        if saved > 0 {
            write!(f, "\nInstructions optimized away: {}", saved)?;
        }
        Ok(())
    }
}

/// Holds nothing but its options, so one compiler can serve any number of
/// compilations, from any thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    options: Options,
}

impl Compiler {
    pub const fn new(options: Options) -> Self {
        Self { options }
    }

    pub const fn options(&self) -> Options {
        self.options
    }

    pub fn try_compile<'source>(
        &self,
        source: &'source str,
    ) -> Result<CompilationResult<'source>, CompileError> {
        self.try_compile_with(&SourceMetadata::new(source))
    }

    /// Like [`Compiler::try_compile`], with lexical and syntax errors pointing
    /// into the named file.
    pub fn try_compile_with<'source>(
        &self,
        meta: &SourceMetadata<'source>,
    ) -> Result<CompilationResult<'source>, CompileError> {
        tracing::info!(target: "compiler", "compiling {} bytes", meta.input().len());

        let tokens = lexer::tokenize(meta.input())
            .map_err(|e| CompileError::Lex(e.with_source(meta)))?;
        let ast = parser::parse(&tokens).map_err(|e| CompileError::Parse(e.with_source(meta)))?;

        let semantic = semantic::analyze(&ast, self.options.scoping);
        if !semantic.is_valid() {
            tracing::info!(target: "compiler", "stopping after semantic analysis");
            return Err(CompileError::Semantic { result: semantic });
        }

        let intermediate = ir::generate(&ast);
        let (optimized, report) = if self.options.optimize {
            optimize::optimize_with_report(intermediate.clone())
        } else {
            (intermediate.clone(), Vec::new())
        };
        let generated = codegen::generate(&optimized);

        let result = CompilationResult {
            tokens,
            ast,
            semantic,
            intermediate,
            optimized,
            report,
            generated,
        };
        tracing::info!(target: "compiler", "compilation finished\n{}", result.summary());
        Ok(result)
    }
}

/// Compiles with the default options. Any failure gives `None`.
pub fn compile(source: &str) -> Option<CompilationResult<'_>> {
    match Compiler::default().try_compile(source) {
        Ok(result) => Some(result),
        Err(error) => {
            tracing::info!(target: "compiler", "compilation failed: {error}");
            None
        }
    }
}
