use std::collections::vec_deque::VecDeque;
use std::fmt;

/// Ordered output that can grow on both ends. Declarations hoisted to the
/// start of a scope are `cons`ed after the body has been written.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output<O> {
    inner: VecDeque<O>,
}

impl<O> Default for Output<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Output<O> {
    pub fn new() -> Self {
        Self {
            inner: VecDeque::new(),
        }
    }

    pub fn push(&mut self, value: impl Into<O>) {
        self.inner.push_back(value.into())
    }

    pub fn cons(&mut self, value: impl Into<O>) {
        self.inner.push_front(value.into())
    }

    pub fn extend<T: Into<O>>(&mut self, iter: impl IntoIterator<Item = T>) {
        self.inner.extend(iter.into_iter().map(Into::into))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &O> {
        self.inner.iter()
    }
}

impl<O> IntoIterator for Output<O> {
    type IntoIter = <VecDeque<O> as IntoIterator>::IntoIter;
    type Item = O;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

/// One line of generated text at some nesting depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub depth: usize,
    pub text: String,
}

impl Line {
    pub fn new(depth: usize, text: impl Into<String>) -> Self {
        Self {
            depth,
            text: text.into(),
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:width$}{}", "", self.text, width = self.depth * 2)
    }
}

impl fmt::Display for Output<Line> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.iter() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
