use serde::Serialize;

/// Half-open byte range into source text.
///
/// The core treats spans as opaque: the parser attaches them to AST nodes
/// and diagnostics thread them through unchanged. Hosts that hold the
/// source text turn them into line/column pairs with a [`LineIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(end >= start, "backwards span {start}..{end}");
        Self { start, end }
    }

    /// A zero-length placeholder for synthesized nodes.
    pub fn zero() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The smallest span enclosing both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        let start = if other.start < self.start {
            other.start
        } else {
            self.start
        };
        let end = if other.end > self.end {
            other.end
        } else {
            self.end
        };
        Span { start, end }
    }
}

/// Maps byte offsets to 1-based (line, column) pairs.
///
/// Holds the starting offset of every line, collected in one pass over the
/// source; lookups binary-search that table.
#[derive(Debug)]
pub struct LineIndex {
    starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(
                source
                    .match_indices('\n')
                    .map(|(at, _)| (at + 1) as u32),
            )
            .collect();
        Self { starts }
    }

    /// Line and column of a byte offset, both 1-based. Column counts bytes
    /// from the start of the line.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = match self.starts.binary_search(&offset) {
            // Exactly at a line start.
            Ok(at) => at,
            // Between two line starts; the line is the one before the
            // insertion point.
            Err(after) => after - 1,
        };
        (line as u32 + 1, offset - self.starts[line] + 1)
    }
}
