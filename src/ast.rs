//! The namespace arena: a flattened parse tree.
//!
//! All committed declarations live in per-kind vectors on [`Namespace`];
//! the tokens they reference live in two parallel arrays, one of token
//! records and one of resolved lexemes. Nodes point into those arrays
//! with [`ListRef`] index ranges instead of owning children, so the tree
//! is flat, append-only and cheap to walk.
//!
//! Tokens enter the arena in parse order, which gives two invariants the
//! tests lean on: indices only grow, and the ranges held by any two
//! committed declarations never overlap.

use core::marker::PhantomData;

use crate::error::Span;
use crate::token::{Token, TokenKind};

/// Range of indices into one of the namespace's flat arrays.
///
/// `(start, len)` pair; `T` only marks which array the range points
/// into. An empty range is `ListRef::EMPTY`.
pub struct ListRef<T> {
    start: u32,
    len: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ListRef<T> {
    pub const EMPTY: ListRef<T> = ListRef {
        start: 0,
        len: 0,
        _marker: PhantomData,
    };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        Self {
            start,
            len,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn start(&self) -> u32 {
        self.start
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub const fn end(&self) -> u32 {
        self.start + self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.start..self.end()
    }
}

impl<T> Clone for ListRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for ListRef<T> {}
impl<T> Default for ListRef<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}
impl<T> core::fmt::Debug for ListRef<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ListRef({}..{})", self.start, self.end())
    }
}
impl<T> PartialEq for ListRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.len == other.len
    }
}
impl<T> Eq for ListRef<T> {}

/// Range over the namespace token arrays.
pub type TokenRange = ListRef<Token>;

/// Payload common to every declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decl {
    /// Bytes the whole declaration covers.
    pub span: Span,
    /// The declared names; never empty.
    pub idents: TokenRange,
    /// Explicit type annotation, when the form carries one.
    pub typ: Option<TokenRange>,
}

/// `p :: package("home") templ(tag)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageDecl {
    pub decl: Decl,
    /// The package name string literal.
    pub name: TokenRange,
    /// Template kind identifier from a `templ(...)` suffix.
    pub templ_kind: Option<TokenRange>,
    /// `#directive` tokens attached to the expression.
    pub directives: TokenRange,
}

/// `h :: import("lib/html")`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportDecl {
    pub decl: Decl,
    /// The import path string literal.
    pub path: TokenRange,
}

/// `u :: using(h)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsingDecl {
    pub decl: Decl,
    pub target: TokenRange,
}

/// `Name :: type(Other)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDecl {
    pub decl: Decl,
    pub target: TokenRange,
}

/// `Model :: record{ ... }`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordDecl {
    pub decl: Decl,
    pub fields: ListRef<VarDecl>,
}

/// `greet :: templ(m: Model){ ... }`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateDecl {
    pub decl: Decl,
    /// Exactly one parameter, enforced at commit.
    pub param: ListRef<VarDecl>,
    /// Tag declarations forming the body, a contiguous run in `tags`.
    pub body: ListRef<TagDecl>,
}

/// A variable: standalone, record field or template parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarDecl {
    pub decl: Decl,
}

/// Documentation attached to names: `greet "Renders a greeting";`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocDecl {
    pub decl: Decl,
    /// String and text block tokens, in source order; never empty.
    pub content: TokenRange,
}

/// Tag annotation: `html { lang = "en" };`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDecl {
    pub decl: Decl,
    pub attrs: ListRef<AttrDecl>,
}

/// One `name = "value"` pair inside a tag body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrDecl {
    pub decl: Decl,
    pub value: TokenRange,
}

/// Rough tokens-per-byte ratio of tem sources, used to pre-size the
/// token arrays from the source length.
fn token_estimate(source_len: usize) -> usize {
    source_len * 13 / 20
}

/// Flat, append-only store for one parsed file.
///
/// Write methods only ever append; nothing is rewritten once committed.
/// Index methods panic on out-of-range input, that is a bug in the
/// caller, not a parse error.
#[derive(Debug, Default)]
pub struct Namespace {
    /// File name the source came from, for rendering locations.
    pub file: Box<str>,
    /// Every token referenced by a committed declaration, parse order.
    pub tokens: Vec<Token>,
    /// Resolved lexeme of `tokens[i]`, same indexing.
    pub texts: Vec<Box<str>>,

    /// At most one package declaration per file.
    pub package: Option<PackageDecl>,
    pub imports: Vec<ImportDecl>,
    pub usings: Vec<UsingDecl>,
    pub types: Vec<TypeDecl>,
    pub records: Vec<RecordDecl>,
    pub templates: Vec<TemplateDecl>,
    pub vars: Vec<VarDecl>,
    pub docs: Vec<DocDecl>,
    pub tags: Vec<TagDecl>,
    pub attrs: Vec<AttrDecl>,
}

impl Namespace {
    pub fn new(file: &str, source_len: usize) -> Self {
        let cap = token_estimate(source_len);
        Self {
            file: file.into(),
            tokens: Vec::with_capacity(cap),
            texts: Vec::with_capacity(cap),
            ..Self::default()
        }
    }

    // ---- token intake ----

    /// Appends one token and its resolved text, returning its index.
    ///
    /// Resolution prefers the canonical spelling of fixed-shape kinds;
    /// everything else is sliced out of `src`. Panics if the token's
    /// span does not fit the source.
    pub fn add_token(&mut self, src: &str, tok: Token) -> u32 {
        let idx = self.tokens.len() as u32;
        let text: Box<str> = match tok.kind.canonical() {
            Some(s) => s.into(),
            None => {
                let (start, end) = (tok.start as usize, tok.end as usize);
                assert!(
                    end <= src.len(),
                    "token span {start}..{end} outside source of length {}",
                    src.len()
                );
                src[start..end].into()
            }
        };
        self.tokens.push(tok);
        self.texts.push(text);
        idx
    }

    /// Appends a run of tokens, returning the covering range.
    pub fn set_tokens(&mut self, src: &str, toks: &[Token]) -> TokenRange {
        let start = self.tokens.len() as u32;
        for &tok in toks {
            self.add_token(src, tok);
        }
        ListRef::new(start, toks.len() as u32)
    }

    /// Appends an identifier list. Panics on an empty list; the grammar
    /// never produces one.
    pub fn set_ident_list(&mut self, src: &str, toks: &[Token]) -> TokenRange {
        assert!(!toks.is_empty(), "identifier list must not be empty");
        self.set_tokens(src, toks)
    }

    /// Appends a single token as a one-element range, for singular
    /// fields like a package name or a type target.
    pub fn set_value(&mut self, src: &str, tok: Token) -> TokenRange {
        self.set_tokens(src, &[tok])
    }

    // ---- declaration intake ----

    /// Panics if a package was already committed; the parser checks
    /// ordering first, so a second call is a parser bug.
    pub fn add_package(&mut self, decl: PackageDecl) {
        assert!(
            self.package.is_none(),
            "namespace already has a package declaration"
        );
        self.package = Some(decl);
    }

    pub fn add_import(&mut self, decl: ImportDecl) -> u32 {
        self.imports.push(decl);
        self.imports.len() as u32 - 1
    }

    pub fn add_using(&mut self, decl: UsingDecl) -> u32 {
        self.usings.push(decl);
        self.usings.len() as u32 - 1
    }

    pub fn add_type(&mut self, decl: TypeDecl) -> u32 {
        self.types.push(decl);
        self.types.len() as u32 - 1
    }

    pub fn add_record(&mut self, decl: RecordDecl) -> u32 {
        self.records.push(decl);
        self.records.len() as u32 - 1
    }

    /// Panics unless the declaration carries exactly one parameter.
    pub fn add_template(&mut self, decl: TemplateDecl) -> u32 {
        assert_eq!(decl.param.len(), 1, "template takes exactly one parameter");
        self.templates.push(decl);
        self.templates.len() as u32 - 1
    }

    pub fn add_var(&mut self, decl: VarDecl) -> u32 {
        self.vars.push(decl);
        self.vars.len() as u32 - 1
    }

    pub fn add_doc(&mut self, decl: DocDecl) -> u32 {
        self.docs.push(decl);
        self.docs.len() as u32 - 1
    }

    pub fn add_tag(&mut self, decl: TagDecl) -> u32 {
        self.tags.push(decl);
        self.tags.len() as u32 - 1
    }

    pub fn add_attr(&mut self, decl: AttrDecl) -> u32 {
        self.attrs.push(decl);
        self.attrs.len() as u32 - 1
    }

    // ---- queries ----

    pub fn token(&self, idx: u32) -> Token {
        self.tokens[idx as usize]
    }

    pub fn text(&self, idx: u32) -> &str {
        &self.texts[idx as usize]
    }

    pub fn token_slice(&self, range: TokenRange) -> &[Token] {
        &self.tokens[range.range()]
    }

    pub fn text_slice(&self, range: TokenRange) -> impl Iterator<Item = &str> {
        self.texts[range.range()].iter().map(AsRef::as_ref)
    }

    /// Text of a one-element range such as a name or type target.
    pub fn value_text(&self, range: TokenRange) -> &str {
        debug_assert_eq!(range.len(), 1);
        self.text(range.start())
    }

    pub fn var_slice(&self, range: ListRef<VarDecl>) -> &[VarDecl] {
        &self.vars[range.range()]
    }

    pub fn tag_slice(&self, range: ListRef<TagDecl>) -> &[TagDecl] {
        &self.tags[range.range()]
    }

    pub fn attr_slice(&self, range: ListRef<AttrDecl>) -> &[AttrDecl] {
        &self.attrs[range.range()]
    }

    /// Documentation content with literal syntax stripped: quotes off
    /// strings, the `"""` marker and leading blanks off each block
    /// line, pieces joined with single newlines.
    pub fn doc_text(&self, doc: &DocDecl) -> String {
        let mut out = String::new();
        for idx in doc.content.iter() {
            let tok = self.token(idx);
            let text = self.text(idx);
            match tok.kind {
                TokenKind::String => {
                    let inner = text.strip_prefix('"').unwrap_or(text);
                    let inner = inner.strip_suffix('"').unwrap_or(inner);
                    push_doc_line(&mut out, inner);
                }
                TokenKind::TextBlock => {
                    for line in text.split(['\r', '\n']).filter(|l| !l.is_empty()) {
                        let line = line.trim_start_matches([' ', '\t']);
                        let line = line.strip_prefix("\"\"\"").unwrap_or(line);
                        push_doc_line(&mut out, line);
                    }
                }
                _ => {}
            }
        }
        out
    }
}

fn push_doc_line(out: &mut String, line: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(line);
}
