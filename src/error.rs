//! Spans, diagnostics and the bounded diagnostic queue.

use thiserror::Error;

use crate::containers::Queue;
use crate::token::Location;

/// Most diagnostics a single parse will keep. Further ones are dropped
/// silently; a file with a hundred errors has said enough.
pub const MAX_DIAGNOSTICS: usize = 100;

/// Byte span into the source, half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    /// Zero-width span, for diagnostics anchored at a point.
    #[inline]
    pub fn empty_at(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    #[inline]
    pub fn from_range(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end.max(r.start))
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Which stage produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagKind {
    /// Character-level problem found while scanning.
    Lex,
    /// Structural problem found while parsing.
    Parse,
}

/// A single recoverable problem tied to a source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diag {
    pub kind: DiagKind,
    pub span: Span,
    pub message: String,
}

impl Diag {
    pub fn location<'a>(&self, file: &'a str, src: &str) -> Location<'a> {
        Location::of(file, src, self.span)
    }
}

/// Lexical error categories. The scanner reports these and keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Default)]
pub enum LexErrorKind {
    #[default]
    #[error("invalid character")]
    InvalidToken,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated text block")]
    UnterminatedTextBlock,
}

/// A lexical error with its location, convertible into a [`Diag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    pub fn diag(&self) -> Diag {
        Diag {
            kind: DiagKind::Lex,
            span: self.span,
            message: self.kind.to_string(),
        }
    }
}

/// FIFO of diagnostics, bounded at [`MAX_DIAGNOSTICS`].
///
/// Pushing beyond the bound drops the new diagnostic; the earliest
/// problems are the ones worth reading.
#[derive(Debug, Default)]
pub struct Diagnostics {
    queue: Queue<Diag>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diag) {
        if self.queue.len() < MAX_DIAGNOSTICS {
            self.queue.push_back(diag);
        }
    }

    pub fn pop(&mut self) -> Option<Diag> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue.len() == MAX_DIAGNOSTICS
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diag> {
        self.queue.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(n: u32) -> Diag {
        Diag {
            kind: DiagKind::Parse,
            span: Span::new(n as usize, n as usize + 1),
            message: format!("problem {n}"),
        }
    }

    #[test]
    fn diagnostics_are_fifo() {
        let mut diags = Diagnostics::new();
        diags.push(diag(0));
        diags.push(diag(1));
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.pop().unwrap().message, "problem 0");
        assert_eq!(diags.pop().unwrap().message, "problem 1");
        assert!(diags.pop().is_none());
    }

    #[test]
    fn diagnostics_drop_past_the_bound() {
        let mut diags = Diagnostics::new();
        for n in 0..(MAX_DIAGNOSTICS as u32 + 50) {
            diags.push(diag(n));
        }
        assert_eq!(diags.len(), MAX_DIAGNOSTICS);
        assert!(diags.is_full());
        assert_eq!(diags.pop().unwrap().message, "problem 0");
    }

    #[test]
    fn lex_error_renders_its_kind() {
        let err = LexError {
            kind: LexErrorKind::UnterminatedString,
            span: Span::new(3, 8),
        };
        let d = err.diag();
        assert_eq!(d.kind, DiagKind::Lex);
        assert_eq!(d.message, "unterminated string literal");
    }
}
