//! Byte ranges into the scanned source buffer

/// Half-open byte range `[start, end)` into the original source.
///
/// Offsets always index the unmodified input buffer, so a span of a token
/// whose spelling contains escaped line breaks covers those bytes too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at a single offset.
    pub fn at(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
