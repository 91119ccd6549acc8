//! Token model and source positions.
//!
//! Tokens are byte ranges into the source text. Lexemes are not copied at
//! scan time; [`Token::text`] resolves them on demand, preferring the
//! canonical spelling for fixed-shape kinds so keywords and punctuation
//! never touch the source buffer.

use std::fmt;

use crate::error::Span;

/// Every kind of token the tokenizer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `=`
    Equals,
    /// `;`, written or inserted at a line break.
    Semi,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBrack,
    /// `]`
    RBrack,

    KwPackage,
    KwImport,
    KwUsing,
    KwType,
    KwRecord,
    KwTempl,

    /// Identifier: letter or `_`, then letters, digits, `_`.
    Ident,
    /// Quoted string literal, quotes included in the span.
    String,
    /// `"""` text block, possibly spanning several merged lines.
    TextBlock,
    /// `#name` compiler directive.
    Directive,

    /// `//` comment, possibly spanning several merged lines.
    Comment,

    /// Line terminator. Kept in the taxonomy for completeness; the
    /// tokenizer folds newlines into inserted `Semi` tokens and never
    /// emits this kind itself.
    Eol,
    /// End of input. Returned forever once the source is exhausted.
    Eof,
    /// A character sequence that is not part of the language.
    Invalid,
}

impl TokenKind {
    /// Canonical spelling for kinds whose lexeme is always the same.
    /// Returns `None` for kinds that need the source text.
    pub const fn canonical(self) -> Option<&'static str> {
        Some(match self {
            TokenKind::Colon => ":",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Equals => "=",
            TokenKind::Semi => ";",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBrack => "[",
            TokenKind::RBrack => "]",
            TokenKind::KwPackage => "package",
            TokenKind::KwImport => "import",
            TokenKind::KwUsing => "using",
            TokenKind::KwType => "type",
            TokenKind::KwRecord => "record",
            TokenKind::KwTempl => "templ",
            _ => return None,
        })
    }

    /// Whether a token of this kind can end a statement, which makes a
    /// following line break act as a terminator. This is the default
    /// semicolon-insertion policy.
    pub const fn ends_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::String
                | TokenKind::TextBlock
                | TokenKind::RParen
                | TokenKind::RBrace
                | TokenKind::RBrack
        )
    }

    /// Kinds the parser skips without looking at them.
    pub const fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::Eol)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical() {
            Some(s) => write!(f, "`{s}`"),
            None => match self {
                TokenKind::Ident => f.write_str("identifier"),
                TokenKind::String => f.write_str("string"),
                TokenKind::TextBlock => f.write_str("text block"),
                TokenKind::Directive => f.write_str("directive"),
                TokenKind::Comment => f.write_str("comment"),
                TokenKind::Eol => f.write_str("end of line"),
                TokenKind::Eof => f.write_str("end of file"),
                TokenKind::Invalid => f.write_str("invalid token"),
                _ => unreachable!(),
            },
        }
    }
}

/// A single token: kind plus the half-open byte range it covers.
///
/// Inserted semicolons are zero width, `start == end` at the line break
/// that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: u32,
    pub end: u32,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self {
            kind,
            start: start as u32,
            end: end as u32,
        }
    }

    #[inline]
    pub const fn span(&self) -> Span {
        Span {
            start: self.start,
            end: self.end,
        }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The token's text. Fixed-shape kinds resolve to their canonical
    /// spelling without consulting `src`.
    pub fn text<'s>(&self, src: &'s str) -> &'s str {
        match self.kind.canonical() {
            Some(s) => s,
            None => &src[self.start as usize..self.end as usize],
        }
    }
}

/// 1-based line and column, counted in bytes within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Line/column of `offset` in `src`. `\n`, `\r` and `\r\n` each count as
/// one line break. Offsets past the end clamp to the end.
pub fn pos_at(src: &str, offset: usize) -> Pos {
    let offset = offset.min(src.len());
    let bytes = src.as_bytes();
    let mut line = 1u32;
    let mut col = 1u32;
    let mut i = 0;
    while i < offset {
        match bytes[i] {
            b'\n' => {
                line += 1;
                col = 1;
                i += 1;
            }
            b'\r' => {
                line += 1;
                col = 1;
                i += 1;
                if i < offset && bytes[i] == b'\n' {
                    i += 1;
                }
            }
            _ => {
                col += 1;
                i += 1;
            }
        }
    }
    Pos { line, col }
}

/// A span resolved to human-readable positions in a named file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    pub file: &'a str,
    pub start: Pos,
    pub end: Pos,
}

impl<'a> Location<'a> {
    pub fn of(file: &'a str, src: &str, span: Span) -> Self {
        Self {
            file,
            start: pos_at(src, span.start as usize),
            end: pos_at(src, span.end as usize),
        }
    }
}

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.start)?;
        if self.end != self.start {
            write!(f, "-{}", self.end)?;
        }
        Ok(())
    }
}
