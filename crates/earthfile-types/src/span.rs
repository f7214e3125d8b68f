use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a statement in its Earthfile.
///
/// Lines and columns are 1-based. Nodes built programmatically (tests,
/// generated files) use [`Span::default`], which displays as `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// A whole-line span; statements are line-oriented.
    pub fn line(line: u32) -> Self {
        Self::new(line, 1, line, 1)
    }

    /// Returns `true` when the span carries no position.
    pub fn is_unknown(&self) -> bool {
        self.start_line == 0
    }

    /// Smallest span covering both inputs. Unknown spans are ignored.
    pub fn merge(self, other: Span) -> Span {
        if self.is_unknown() {
            return other;
        }
        if other.is_unknown() {
            return self;
        }
        let start = self.start().min(other.start());
        let end = self.end().max(other.end());
        Span::new(start.0, start.1, end.0, end.1)
    }

    fn start(&self) -> (u32, u32) {
        (self.start_line, self.start_col)
    }

    fn end(&self) -> (u32, u32) {
        (self.end_line, self.end_col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "?")
        } else {
            write!(f, "{}:{}", self.start_line, self.start_col)
        }
    }
}
