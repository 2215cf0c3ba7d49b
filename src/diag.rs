use std::fmt::{Display, Formatter, Result};

/// Source position attached to AST nodes and propagated into debug
/// locations. Lines and columns are zero-based in the input and rendered
/// one-based, matching the debug-info convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SrcPos {
    pub line: u32,
    pub column: u32,
}

impl SrcPos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Display for SrcPos {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}
