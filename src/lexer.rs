//! Tokenizer with automatic semicolon insertion.
//!
//! A [`logos`] scanner produces raw tokens; the [`Tokenizer`] wrapper
//! turns line breaks into terminators. A break ends the statement when
//! the previous token could end one (see [`TokenKind::ends_statement`]),
//! in which case a zero-width `Semi` token is emitted at the break. The
//! same rule fires once at end of input.
//!
//! Comments and text blocks that continue over several lines are merged
//! into single tokens by bumping the scanner past each continuation
//! line, so downstream consumers only ever see one token per block.

use logos::{Lexer as LogosLexer, Logos};
use memchr::memchr2;

use crate::error::{Diag, LexError, LexErrorKind, Span};
use crate::token::{Token, TokenKind};

/// Byte length of the line terminator at `bytes[i]`: 2 for `\r\n`,
/// 1 for `\n` or lone `\r`, 0 otherwise.
#[inline]
fn line_terminator_len(bytes: &[u8], i: usize) -> usize {
    match bytes.get(i) {
        Some(b'\r') => {
            if bytes.get(i + 1) == Some(&b'\n') {
                2
            } else {
                1
            }
        }
        Some(b'\n') => 1,
        _ => 0,
    }
}

/// Extends the current match over every following line whose first
/// non-blank bytes are `marker`, consuming the terminator, the leading
/// blanks, the marker and the rest of each continuation line.
fn merge_marked_lines(lex: &mut LogosLexer<'_, RawTok>, marker: &[u8]) {
    loop {
        let rem = lex.remainder().as_bytes();
        let nl = line_terminator_len(rem, 0);
        if nl == 0 {
            return;
        }
        let mut i = nl;
        while matches!(rem.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        if rem.len() < i + marker.len() || &rem[i..i + marker.len()] != marker {
            return;
        }
        i += marker.len();
        while i < rem.len() && line_terminator_len(rem, i) == 0 {
            i += 1;
        }
        lex.bump(i);
    }
}

fn lex_comment(lex: &mut LogosLexer<'_, RawTok>) {
    merge_marked_lines(lex, b"//");
}

fn lex_text_block(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    merge_marked_lines(lex, b"\"\"\"");
    // a block line is only terminated by a line break; none left means
    // the block runs off the end of the file
    if lex.remainder().is_empty() {
        return Err(LexErrorKind::UnterminatedTextBlock);
    }
    Ok(())
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t]+")]
enum RawTok {
    // Newlines stay tokens so the wrapper can insert semicolons.
    #[regex(r"\r\n|\n|\r")]
    Newline,

    // Line comment; consecutive comment-only lines merge into one token.
    #[regex(r"//[^\n\r]*", lex_comment)]
    Comment,

    #[token("package")]
    KwPackage,
    #[token("import")]
    KwImport,
    #[token("using")]
    KwUsing,
    #[token("type")]
    KwType,
    #[token("record")]
    KwRecord,
    #[token("templ")]
    KwTempl,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"#[A-Za-z_][A-Za-z0-9_]*")]
    Directive,

    // Text block: `"""` to end of line, merging continuation lines.
    #[regex(r#""""[^\n\r]*"#, lex_text_block)]
    TextBlock,

    #[regex(r#""[^"\n\r]*""#)]
    String,

    // String that hit a line break or EOF before its closing quote.
    #[regex(r#""[^"\n\r]*"#)]
    UnterminatedString,

    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("=")]
    Equals,
    #[token(";")]
    Semi,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,

    // Catch-all so scanning always makes progress.
    #[regex(r".", priority = 0)]
    Error,
}

impl RawTok {
    const fn kind(self) -> TokenKind {
        match self {
            RawTok::Newline => TokenKind::Eol,
            RawTok::Comment => TokenKind::Comment,
            RawTok::KwPackage => TokenKind::KwPackage,
            RawTok::KwImport => TokenKind::KwImport,
            RawTok::KwUsing => TokenKind::KwUsing,
            RawTok::KwType => TokenKind::KwType,
            RawTok::KwRecord => TokenKind::KwRecord,
            RawTok::KwTempl => TokenKind::KwTempl,
            RawTok::Ident => TokenKind::Ident,
            RawTok::Directive => TokenKind::Directive,
            RawTok::TextBlock => TokenKind::TextBlock,
            RawTok::String | RawTok::UnterminatedString => TokenKind::String,
            RawTok::Colon => TokenKind::Colon,
            RawTok::Comma => TokenKind::Comma,
            RawTok::Dot => TokenKind::Dot,
            RawTok::Equals => TokenKind::Equals,
            RawTok::Semi => TokenKind::Semi,
            RawTok::LParen => TokenKind::LParen,
            RawTok::RParen => TokenKind::RParen,
            RawTok::LBrace => TokenKind::LBrace,
            RawTok::RBrace => TokenKind::RBrace,
            RawTok::LBrack => TokenKind::LBrack,
            RawTok::RBrack => TokenKind::RBrack,
            RawTok::Error => TokenKind::Invalid,
        }
    }
}

/// Decides, per token kind, whether a following line break terminates
/// the statement.
pub type SemiPolicy = fn(TokenKind) -> bool;

/// Callback invoked for every lexical error: byte offset, offending
/// lexeme, message.
pub type ErrorHandler = Box<dyn FnMut(usize, &str, &str)>;

/// Snapshot of the scan state, created by [`Tokenizer::mark`].
#[derive(Clone)]
pub struct Mark<'src> {
    raw: LogosLexer<'src, RawTok>,
    pending: Option<Token>,
    insert_semi: bool,
    eof_done: bool,
}

/// Streaming tokenizer over a source buffer.
///
/// [`next_token`](Tokenizer::next_token) never fails: lexical errors are
/// counted, reported and folded into `Invalid` (or partial `String`)
/// tokens, and scanning continues. After the input is exhausted the
/// tokenizer returns `Eof` tokens forever.
pub struct Tokenizer<'src> {
    raw: LogosLexer<'src, RawTok>,
    src_len: usize,
    /// Token held back while an inserted semicolon takes its turn.
    pending: Option<Token>,
    insert_semi: bool,
    eof_done: bool,
    emitted_eof: bool,
    err_count: u32,
    diags: Vec<Diag>,
    semi_policy: SemiPolicy,
    on_error: Option<ErrorHandler>,
}

impl<'src> Tokenizer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            raw: RawTok::lexer(src),
            src_len: src.len(),
            pending: None,
            insert_semi: false,
            eof_done: false,
            emitted_eof: false,
            err_count: 0,
            diags: Vec::new(),
            semi_policy: TokenKind::ends_statement,
            on_error: None,
        }
    }

    /// Replaces the default semicolon-insertion policy.
    pub fn with_semi_policy(mut self, policy: SemiPolicy) -> Self {
        self.semi_policy = policy;
        self
    }

    /// Installs a callback invoked on every lexical error, in addition
    /// to the diagnostic that is always recorded.
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.on_error = Some(handler);
        self
    }

    /// Number of lexical errors seen so far.
    pub fn err_count(&self) -> u32 {
        self.err_count
    }

    pub fn has_diags(&self) -> bool {
        !self.diags.is_empty()
    }

    /// Drains the diagnostics accumulated since the last call.
    pub fn take_diags(&mut self) -> Vec<Diag> {
        std::mem::take(&mut self.diags)
    }

    /// Snapshots the scan position for bounded lookahead. Diagnostics
    /// and the error count are not rolled back by [`restore`], so marks
    /// should not be held across error tokens.
    ///
    /// [`restore`]: Tokenizer::restore
    pub fn mark(&self) -> Mark<'src> {
        Mark {
            raw: self.raw.clone(),
            pending: self.pending,
            insert_semi: self.insert_semi,
            eof_done: self.eof_done,
        }
    }

    /// Rewinds to a previously taken [`Mark`].
    pub fn restore(&mut self, mark: Mark<'src>) {
        self.raw = mark.raw;
        self.pending = mark.pending;
        self.insert_semi = mark.insert_semi;
        self.eof_done = mark.eof_done;
        self.emitted_eof = false;
    }

    fn report(&mut self, kind: LexErrorKind, span: std::ops::Range<usize>) {
        self.err_count += 1;
        let sp = Span::from_range(span.clone());
        if let Some(handler) = self.on_error.as_mut() {
            let lexeme = &self.raw.source()[span];
            handler(sp.start as usize, lexeme, &kind.to_string());
        }
        self.diags.push(LexError { kind, span: sp }.diag());
    }

    /// Produces the next token. Newlines are consumed here; when the
    /// insertion rule fires they surface as zero-width `Semi` tokens
    /// positioned at the break.
    pub fn next_token(&mut self) -> Token {
        loop {
            if let Some(tok) = self.pending.take() {
                return tok;
            }
            if self.eof_done {
                return Token::new(TokenKind::Eof, self.src_len, self.src_len);
            }
            let Some(res) = self.raw.next() else {
                self.eof_done = true;
                if self.insert_semi {
                    self.insert_semi = false;
                    return Token::new(TokenKind::Semi, self.src_len, self.src_len);
                }
                return Token::new(TokenKind::Eof, self.src_len, self.src_len);
            };
            let span = self.raw.span();
            match res {
                Err(kind) => {
                    self.report(kind, span.clone());
                    self.insert_semi = false;
                    return Token::new(TokenKind::Invalid, span.start, span.end);
                }
                Ok(RawTok::Newline) => {
                    if self.insert_semi {
                        self.insert_semi = false;
                        return Token::new(TokenKind::Semi, span.start, span.start);
                    }
                }
                Ok(RawTok::Comment) => {
                    // A merged comment swallows its interior line breaks;
                    // an owed semicolon still lands at the first of them.
                    if self.insert_semi {
                        if let Some(off) = memchr2(b'\n', b'\r', self.raw.slice().as_bytes()) {
                            self.insert_semi = false;
                            let at = span.start + off;
                            self.pending = Some(Token::new(TokenKind::Semi, at, at));
                        }
                    }
                    return Token::new(TokenKind::Comment, span.start, span.end);
                }
                Ok(RawTok::UnterminatedString) => {
                    self.report(LexErrorKind::UnterminatedString, span.clone());
                    let tok = Token::new(TokenKind::String, span.start, span.end);
                    self.insert_semi = (self.semi_policy)(tok.kind);
                    return tok;
                }
                Ok(RawTok::Error) => {
                    self.report(LexErrorKind::InvalidToken, span.clone());
                    self.insert_semi = false;
                    return Token::new(TokenKind::Invalid, span.start, span.end);
                }
                Ok(raw) => {
                    let kind = raw.kind();
                    self.insert_semi = (self.semi_policy)(kind);
                    return Token::new(kind, span.start, span.end);
                }
            }
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    /// Yields every token through the final `Eof`, then `None`.
    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let tok = self.next_token();
        if tok.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(tok)
    }
}
