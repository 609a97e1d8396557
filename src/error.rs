use std::error;
use std::fmt;

/// An error located somewhere in the source, with an optional chain of
/// contexts describing what the compiler was doing when it happened.
#[derive(Debug, Clone)]
pub struct Error<T> {
    pub kind: T,
    position: Option<Position>,
    file: Option<std::path::PathBuf>,
    snippet: Option<String>,
    contexts: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

/// 1-based line and column, columns counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub const fn start() -> Self {
        Self { line: 1, col: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

#[derive(Debug)]
pub struct SourceMetadata<'a> {
    file: Option<std::path::PathBuf>,
    source: &'a str,
}

impl<'a> SourceMetadata<'a> {
    pub const fn input(&self) -> &'a str {
        self.source
    }
    pub const fn new(source: &'a str) -> Self {
        Self { file: None, source }
    }
    #[must_use]
    pub fn with_file(mut self, file: std::path::PathBuf) -> Self {
        self.file = Some(file);
        self
    }
    pub fn line(&self, line: usize) -> Option<&'a str> {
        self.source.lines().nth(line.checked_sub(1)?)
    }
}

impl<T> Error<T> {
    pub const fn new(kind: T) -> Self {
        Self {
            kind,
            position: None,
            file: None,
            snippet: None,
            contexts: Vec::new(),
        }
    }
    pub const fn position(&self) -> Option<Position> {
        self.position
    }
    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
    /// Attaches the file name and the offending line. Only has an effect if
    /// the error already knows where it happened.
    #[must_use]
    pub fn with_source(mut self, source: &SourceMetadata) -> Self {
        if let Some(position) = self.position {
            self.file = source.file.clone();
            self.snippet = source.line(position.line).map(str::to_string);
        }
        self
    }
    #[must_use]
    pub fn add_context(mut self, ctx: &'static str) -> Self {
        self.contexts.push(ctx);
        self
    }
    pub fn contexts(&self) -> &[&'static str] {
        &self.contexts
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WantedSpec<T> {
    Specific(T),
    Description(&'static str),
}

impl<T: fmt::Display> fmt::Display for WantedSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Description(desc) => f.write_str(desc),
            Self::Specific(t) => write!(f, "{}", t),
        }
    }
}

impl<T: error::Error + 'static> error::Error for Error<T> {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl<T: fmt::Display> fmt::Display for Error<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let whiles = self
            .contexts
            .iter()
            .copied()
            .fold(String::new(), |acc, next| acc + "\nwhile " + next);
        let position = if let Some(position) = self.position {
            position
        } else {
            return write!(f, "{}(no location info){}", self.kind, whiles);
        };
        let file = self
            .file
            .as_ref()
            .and_then(|x| x.to_str())
            .unwrap_or("<unknown source>");
        let snippet = if let Some(snip) = &self.snippet {
            snip
        } else {
            return write!(
                f,
                "{}\n   --> {}:{}:{}{}",
                self.kind, file, position.line, position.col, whiles
            );
        };

        write!(
            f,
            "\
{kind}
   --> {file}:{line}:{col}
    |
{line:3} | {snippet}
    | {marker:>0$}{whiles}",
            position.col,
            marker = '^',
            line = position.line,
            col = position.col,
            file = file,
            kind = self.kind,
            snippet = snippet,
            whiles = whiles,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("boom")
        }
    }

    #[test]
    fn renders_caret_under_column() {
        let meta = SourceMetadata::new("dhore x = 1;\ndhore y = @;");
        let err = Error::new(Boom)
            .at(Position { line: 2, col: 11 })
            .with_source(&meta)
            .add_context("lexing");
        let rendered = err.to_string();
        assert!(rendered.starts_with("boom\n   --> <unknown source>:2:11"));
        assert!(rendered.contains("  2 | dhore y = @;"));
        assert!(rendered.contains("    |           ^"));
        assert!(rendered.ends_with("\nwhile lexing"));
    }

    #[test]
    fn renders_without_location() {
        let err = Error::new(Boom).add_context("parsing");
        assert_eq!(err.to_string(), "boom(no location info)\nwhile parsing");
    }
}
