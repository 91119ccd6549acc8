//! Recursive-descent parser with per-declaration recovery.
//!
//! The parser pulls tokens one at a time, builds a transient tree per
//! declaration, and commits it into the [`Namespace`] only once the
//! whole declaration parsed cleanly. A structural error inside a
//! declaration queues one diagnostic, throws the transient tree away
//! and steps past a single token before trying again, so one broken
//! declaration never takes its neighbors with it.

use std::fmt;

use smallvec::SmallVec;

use crate::ast::{
    AttrDecl, Decl, DocDecl, ImportDecl, ListRef, Namespace, PackageDecl, RecordDecl, TagDecl,
    TemplateDecl, TypeDecl, UsingDecl, VarDecl,
};
use crate::containers::Stack;
use crate::error::{Diag, DiagKind, Diagnostics, Span};
use crate::lexer::Tokenizer;
use crate::token::{Token, TokenKind};

/// Declaration kinds, in the order the file-level grammar admits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Package,
    Import,
    Using,
    Type,
    Record,
    Template,
    Var,
    Doc,
    Tag,
}

impl DeclKind {
    fn from_keyword(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::KwPackage => DeclKind::Package,
            TokenKind::KwImport => DeclKind::Import,
            TokenKind::KwUsing => DeclKind::Using,
            TokenKind::KwType => DeclKind::Type,
            TokenKind::KwRecord => DeclKind::Record,
            TokenKind::KwTempl => DeclKind::Template,
            _ => return None,
        })
    }

    /// File-level ordering stage: package, then imports, then usings,
    /// then everything else.
    const fn stage(self) -> u8 {
        match self {
            DeclKind::Package => 0,
            DeclKind::Import => 1,
            DeclKind::Using => 2,
            _ => 3,
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeclKind::Package => "package",
            DeclKind::Import => "import",
            DeclKind::Using => "using",
            DeclKind::Type => "type",
            DeclKind::Record => "record",
            DeclKind::Template => "template",
            DeclKind::Var => "variable",
            DeclKind::Doc => "documentation",
            DeclKind::Tag => "tag",
        })
    }
}

type IdentList = SmallVec<[Token; 4]>;

/// A variable parsed but not yet committed; record fields and the
/// template parameter sit on the parser's scope stack in this form.
struct VarTree {
    span: Span,
    idents: IdentList,
    typ: Option<Token>,
}

struct AttrTree {
    span: Span,
    idents: IdentList,
    value: Token,
}

struct DocTree {
    span: Span,
    idents: IdentList,
    content: SmallVec<[Token; 2]>,
}

struct TagTree {
    span: Span,
    idents: IdentList,
    attrs: SmallVec<[AttrTree; 4]>,
}

/// One element of a template body, held until the template commits so
/// a declaration that fails after its body leaves nothing behind.
enum BodyTree {
    Doc(DocTree),
    Tag(TagTree),
}

/// Right-hand side of a declaration, held until commit.
enum ExprTree {
    Package {
        name: Token,
        templ_kind: Option<Token>,
    },
    Import {
        path: Token,
    },
    Using {
        target: Token,
    },
    Type {
        target: Token,
    },
    Record {
        fields_mark: usize,
    },
    Template {
        param_mark: usize,
        body: Vec<BodyTree>,
    },
    /// `x :: TypeName`, a variable typed by its initializer position.
    TypeName {
        name: Token,
    },
    /// Plain variable, `x;` or `x : T;`.
    Value,
}

impl ExprTree {
    fn kind(&self) -> DeclKind {
        match self {
            ExprTree::Package { .. } => DeclKind::Package,
            ExprTree::Import { .. } => DeclKind::Import,
            ExprTree::Using { .. } => DeclKind::Using,
            ExprTree::Type { .. } => DeclKind::Type,
            ExprTree::Record { .. } => DeclKind::Record,
            ExprTree::Template { .. } => DeclKind::Template,
            ExprTree::TypeName { .. } | ExprTree::Value => DeclKind::Var,
        }
    }
}

struct DeclTree {
    span: Span,
    idents: IdentList,
    typ: Option<Token>,
    directives: SmallVec<[Token; 2]>,
    expr: ExprTree,
}

/// Parser over one source file.
pub struct Parser<'src> {
    lexer: Tokenizer<'src>,
    src: &'src str,
    /// Current token; comments are skipped on the way in.
    tok: Token,
    /// End offset of the last consumed token, for declaration spans.
    prev_end: u32,
    ns: Namespace,
    diags: Diagnostics,
    /// Pending record fields and template parameters.
    vars: Stack<VarTree>,
    /// Kind of the last committed file-level declaration, for ordering.
    /// Doc and tag annotations do not advance it.
    last_kind: Option<DeclKind>,
}

impl<'src> Parser<'src> {
    pub fn new(file: &str, src: &'src str) -> Self {
        let mut parser = Self {
            lexer: Tokenizer::new(src),
            src,
            tok: Token::new(TokenKind::Eof, 0, 0),
            prev_end: 0,
            ns: Namespace::new(file, src.len()),
            diags: Diagnostics::new(),
            vars: Stack::new(),
            last_kind: None,
        };
        parser.advance();
        parser
    }

    /// Parses the whole file. Always returns a namespace; what failed
    /// to parse is described by the diagnostics instead.
    pub fn parse(mut self) -> (Namespace, Diagnostics) {
        while self.tok.kind != TokenKind::Eof {
            if self.tok.kind == TokenKind::Semi {
                self.advance();
                continue;
            }
            if self.decl().is_err() {
                self.recover();
            }
        }
        self.drain_lex_diags();
        (self.ns, self.diags)
    }

    // ---- token plumbing ----

    fn advance(&mut self) {
        self.prev_end = self.tok.end;
        loop {
            let tok = self.lexer.next_token();
            self.drain_lex_diags();
            if tok.kind == TokenKind::Comment {
                continue;
            }
            self.tok = tok;
            return;
        }
    }

    fn drain_lex_diags(&mut self) {
        if self.lexer.has_diags() {
            for diag in self.lexer.take_diags() {
                self.diags.push(diag);
            }
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.tok.kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.tok.kind == kind {
            let tok = self.tok;
            self.advance();
            Some(tok)
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ()> {
        if self.tok.kind == kind {
            let tok = self.tok;
            self.advance();
            Ok(tok)
        } else {
            self.error_here(format!("expected {what}, found {}", self.tok.kind));
            Err(())
        }
    }

    /// A terminator: an explicit or inserted semicolon. A closing brace
    /// or the end of input may stand in for one.
    fn expect_semi(&mut self) -> Result<(), ()> {
        match self.tok.kind {
            TokenKind::Semi => {
                self.advance();
                Ok(())
            }
            TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => {
                self.error_here(format!("expected `;`, found {}", self.tok.kind));
                Err(())
            }
        }
    }

    fn skip_semis(&mut self) {
        while self.tok.kind == TokenKind::Semi {
            self.advance();
        }
    }

    fn error_here(&mut self, message: String) {
        self.error_at(self.tok.span(), message);
    }

    fn error_at(&mut self, span: Span, message: String) {
        self.diags.push(Diag {
            kind: DiagKind::Parse,
            span,
            message,
        });
    }

    /// Bounded local recovery: drop pending scope state and consume one
    /// token, then let the file loop try again from there. No anchor
    /// token is searched for; a declaration that ended without a
    /// terminator cannot swallow its healthy neighbor this way, and the
    /// loop still progresses on every failure.
    fn recover(&mut self) {
        self.vars.clear();
        if self.tok.kind != TokenKind::Eof {
            self.advance();
        }
    }

    // ---- grammar ----

    /// `decl := identList (doc | tag)* (':' typed-part)? ';'`
    ///
    /// Doc and tag annotations commit on their own as they are parsed;
    /// a trailing typed part commits the declaration it introduces.
    fn decl(&mut self) -> Result<(), ()> {
        let mut idents = self.ident_list()?;
        loop {
            match self.tok.kind {
                TokenKind::String | TokenKind::TextBlock => self.doc_decl(&idents)?,
                TokenKind::LBrace => self.tag_decl(&idents)?,
                _ => break,
            }
            if self.tok.kind != TokenKind::Ident {
                return Ok(());
            }
            idents = self.ident_list()?;
        }

        let start = idents[0].start as usize;
        let mut directives: SmallVec<[Token; 2]> = SmallVec::new();
        let mut typ = None;
        let expr = if self.eat(TokenKind::Colon).is_some() {
            if let Some(declared) = DeclKind::from_keyword(self.tok.kind) {
                // explicit kind: `t : record : record{...}`
                let keyword = self.tok;
                self.advance();
                self.expect(TokenKind::Colon, "`:`")?;
                self.directive_list(&mut directives);
                let expr = self.gen_expr()?;
                if expr.kind() != declared {
                    self.error_at(
                        keyword.span(),
                        format!("declared as {declared} but defined as {}", expr.kind()),
                    );
                    return Err(());
                }
                expr
            } else if self.eat(TokenKind::Colon).is_some() {
                // inferred kind: `t :: record{...}`
                self.directive_list(&mut directives);
                self.gen_expr()?
            } else {
                // typed variable: `x : T`
                typ = Some(self.expect(TokenKind::Ident, "type name")?);
                ExprTree::Value
            }
        } else {
            ExprTree::Value
        };
        self.expect_semi()?;
        let span = Span::new(start, self.prev_end as usize);
        self.commit(DeclTree {
            span,
            idents,
            typ,
            directives,
            expr,
        });
        Ok(())
    }

    /// `ident (',' ident)*`
    fn ident_list(&mut self) -> Result<IdentList, ()> {
        let mut idents = IdentList::new();
        idents.push(self.expect(TokenKind::Ident, "identifier")?);
        while self.eat(TokenKind::Comma).is_some() {
            idents.push(self.expect(TokenKind::Ident, "identifier")?);
        }
        Ok(idents)
    }

    fn directive_list(&mut self, out: &mut SmallVec<[Token; 2]>) {
        while let Some(tok) = self.eat(TokenKind::Directive) {
            out.push(tok);
        }
    }

    /// Standalone documentation declaration; commits as soon as it
    /// parses since it is a declaration of its own.
    fn doc_decl(&mut self, idents: &IdentList) -> Result<(), ()> {
        let tree = self.doc_tree(idents)?;
        self.commit_doc(tree);
        Ok(())
    }

    /// One or more string or text block literals naming documentation.
    /// Only called with the literal in view.
    fn doc_tree(&mut self, idents: &IdentList) -> Result<DocTree, ()> {
        let mut content: SmallVec<[Token; 2]> = SmallVec::new();
        while matches!(self.tok.kind, TokenKind::String | TokenKind::TextBlock) {
            content.push(self.tok);
            self.advance();
        }
        self.expect_semi()?;
        Ok(DocTree {
            span: Span::new(idents[0].start as usize, self.prev_end as usize),
            idents: idents.clone(),
            content,
        })
    }

    fn commit_doc(&mut self, tree: DocTree) {
        let idents = self.ns.set_ident_list(self.src, &tree.idents);
        let content = self.ns.set_tokens(self.src, &tree.content);
        self.ns.add_doc(DocDecl {
            decl: Decl {
                span: tree.span,
                idents,
                typ: None,
            },
            content,
        });
    }

    /// Standalone tag declaration; commits as soon as it parses.
    fn tag_decl(&mut self, idents: &IdentList) -> Result<(), ()> {
        let tree = self.tag_tree(idents)?;
        self.commit_tag(tree);
        Ok(())
    }

    /// `'{' (attr (',' attr)* ','?)? '}'` with `attr := identList '=' literal`.
    /// Inserted semicolons inside the braces are treated as line noise.
    fn tag_tree(&mut self, idents: &IdentList) -> Result<TagTree, ()> {
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut attrs: SmallVec<[AttrTree; 4]> = SmallVec::new();
        self.skip_semis();
        if !self.at(TokenKind::RBrace) {
            loop {
                let attr_idents = self.ident_list()?;
                self.expect(TokenKind::Equals, "`=`")?;
                let value = self.literal()?;
                attrs.push(AttrTree {
                    span: Span::new(attr_idents[0].start as usize, value.end as usize),
                    idents: attr_idents,
                    value,
                });
                self.skip_semis();
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
                self.skip_semis();
                if self.at(TokenKind::RBrace) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        self.expect_semi()?;
        Ok(TagTree {
            span: Span::new(idents[0].start as usize, self.prev_end as usize),
            idents: idents.clone(),
            attrs,
        })
    }

    fn commit_tag(&mut self, tree: TagTree) {
        let attrs_start = self.ns.attrs.len() as u32;
        for attr in tree.attrs {
            let attr_idents = self.ns.set_ident_list(self.src, &attr.idents);
            let value = self.ns.set_value(self.src, attr.value);
            self.ns.add_attr(AttrDecl {
                decl: Decl {
                    span: attr.span,
                    idents: attr_idents,
                    typ: None,
                },
                value,
            });
        }
        let attrs = ListRef::new(attrs_start, self.ns.attrs.len() as u32 - attrs_start);
        let idents = self.ns.set_ident_list(self.src, &tree.idents);
        self.ns.add_tag(TagDecl {
            decl: Decl {
                span: tree.span,
                idents,
                typ: None,
            },
            attrs,
        });
    }

    fn literal(&mut self) -> Result<Token, ()> {
        if matches!(self.tok.kind, TokenKind::String | TokenKind::TextBlock) {
            let tok = self.tok;
            self.advance();
            Ok(tok)
        } else {
            self.error_here(format!("expected string, found {}", self.tok.kind));
            Err(())
        }
    }

    fn gen_expr(&mut self) -> Result<ExprTree, ()> {
        match self.tok.kind {
            TokenKind::KwPackage => self.package_expr(),
            TokenKind::KwImport => {
                let path = self.paren_arg(TokenKind::String, "import path")?;
                Ok(ExprTree::Import { path })
            }
            TokenKind::KwUsing => {
                let target = self.paren_arg(TokenKind::Ident, "import name")?;
                Ok(ExprTree::Using { target })
            }
            TokenKind::KwType => {
                let target = self.paren_arg(TokenKind::Ident, "type name")?;
                Ok(ExprTree::Type { target })
            }
            TokenKind::KwRecord => self.record_expr(),
            TokenKind::KwTempl => self.templ_expr(),
            TokenKind::Ident => {
                let name = self.tok;
                self.advance();
                Ok(ExprTree::TypeName { name })
            }
            _ => {
                self.error_here(format!(
                    "expected declaration expression, found {}",
                    self.tok.kind
                ));
                Err(())
            }
        }
    }

    /// `keyword '(' arg ')'`, shared by import, using and type.
    fn paren_arg(&mut self, arg: TokenKind, what: &str) -> Result<Token, ()> {
        self.advance();
        self.expect(TokenKind::LParen, "`(`")?;
        let tok = self.expect(arg, what)?;
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(tok)
    }

    /// `package '(' string ')' (templ '(' ident ')')?`
    fn package_expr(&mut self) -> Result<ExprTree, ()> {
        let name = self.paren_arg(TokenKind::String, "package name")?;
        let templ_kind = if self.at(TokenKind::KwTempl) {
            self.advance();
            self.expect(TokenKind::LParen, "`(`")?;
            let kind = self.expect(TokenKind::Ident, "template kind")?;
            self.expect(TokenKind::RParen, "`)`")?;
            Some(kind)
        } else {
            None
        };
        Ok(ExprTree::Package { name, templ_kind })
    }

    /// `record '{' field* '}'` with `field := identList ':' ident ';'`.
    /// Fields go through the doc pipeline too, so they can carry their
    /// own documentation lines.
    fn record_expr(&mut self) -> Result<ExprTree, ()> {
        self.advance();
        self.expect(TokenKind::LBrace, "`{`")?;
        let fields_mark = self.vars.len();
        loop {
            self.skip_semis();
            if self.at(TokenKind::RBrace) || self.at(TokenKind::Eof) {
                break;
            }
            self.record_field()?;
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        Ok(ExprTree::Record { fields_mark })
    }

    fn record_field(&mut self) -> Result<(), ()> {
        let idents = self.ident_list()?;
        if matches!(self.tok.kind, TokenKind::String | TokenKind::TextBlock) {
            return self.doc_decl(&idents);
        }
        self.expect(TokenKind::Colon, "`:`")?;
        let typ = self.expect(TokenKind::Ident, "type name")?;
        let span = Span::new(idents[0].start as usize, typ.end as usize);
        self.expect_semi()?;
        self.vars.push(VarTree {
            span,
            idents,
            typ: Some(typ),
        });
        Ok(())
    }

    /// `templ '(' ident ':' ident ')' '{' bodyElement* '}'`
    ///
    /// Exactly one parameter; anything else is a structural error.
    fn templ_expr(&mut self) -> Result<ExprTree, ()> {
        self.advance();
        self.expect(TokenKind::LParen, "`(`")?;
        if self.at(TokenKind::RParen) {
            self.error_here("template takes exactly one parameter".to_string());
            return Err(());
        }
        let idents = self.ident_list()?;
        self.expect(TokenKind::Colon, "`:`")?;
        let typ = self.expect(TokenKind::Ident, "type name")?;
        let span = Span::new(idents[0].start as usize, typ.end as usize);
        if idents.len() != 1 || self.at(TokenKind::Comma) {
            self.error_at(span, "template takes exactly one parameter".to_string());
            return Err(());
        }
        let param_mark = self.vars.len();
        self.vars.push(VarTree {
            span,
            idents,
            typ: Some(typ),
        });
        self.expect(TokenKind::RParen, "`)`")?;
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut body = Vec::new();
        loop {
            self.skip_semis();
            if self.at(TokenKind::RBrace) || self.at(TokenKind::Eof) {
                break;
            }
            body.push(self.body_element()?);
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        Ok(ExprTree::Template { param_mark, body })
    }

    /// Template bodies hold the annotation forms only: tags and docs.
    /// Elements stay transient until the whole template commits.
    fn body_element(&mut self) -> Result<BodyTree, ()> {
        let idents = self.ident_list()?;
        match self.tok.kind {
            TokenKind::String | TokenKind::TextBlock => Ok(BodyTree::Doc(self.doc_tree(&idents)?)),
            TokenKind::LBrace => Ok(BodyTree::Tag(self.tag_tree(&idents)?)),
            _ => {
                self.error_here(format!(
                    "expected tag body or documentation string, found {}",
                    self.tok.kind
                ));
                Err(())
            }
        }
    }

    // ---- commit ----

    /// Ordering check for file-level declarations. The declaration that
    /// violates its predecessor constraint is the one reported and
    /// withheld from the namespace.
    fn check_order(&mut self, kind: DeclKind, span: Span) -> bool {
        let ok = match kind {
            DeclKind::Package => self.last_kind.is_none() && self.ns.package.is_none(),
            DeclKind::Import => self.last_kind.map_or(true, |k| k.stage() <= 1),
            // a using names an import, so at least one import must
            // already stand before it
            DeclKind::Using => {
                self.last_kind.map_or(true, |k| k.stage() <= 2) && !self.ns.imports.is_empty()
            }
            _ => true,
        };
        if !ok {
            let message = match kind {
                DeclKind::Package => "package declaration must be the first declaration",
                DeclKind::Import => "import declarations must come before everything but the package",
                DeclKind::Using => "using declarations must come after imports and before type, record, template and variable declarations",
                _ => unreachable!(),
            };
            self.error_at(span, message.to_string());
        }
        ok
    }

    fn commit(&mut self, tree: DeclTree) {
        let kind = tree.expr.kind();
        if !matches!(tree.expr, ExprTree::Package { .. }) {
            if let Some(first) = tree.directives.first() {
                self.error_at(
                    first.span(),
                    format!("directives are only valid on package declarations, not {kind} declarations"),
                );
            }
        }
        if !self.check_order(kind, tree.span) {
            self.vars.clear();
            return;
        }
        self.last_kind = Some(kind);

        let idents = self.ns.set_ident_list(self.src, &tree.idents);
        let typ_tok = match &tree.expr {
            ExprTree::TypeName { name } => Some(*name),
            _ => tree.typ,
        };
        let typ = typ_tok.map(|tok| self.ns.set_value(self.src, tok));
        let decl = Decl {
            span: tree.span,
            idents,
            typ,
        };

        match tree.expr {
            ExprTree::Package { name, templ_kind } => {
                let name = self.ns.set_value(self.src, name);
                let templ_kind = templ_kind.map(|tok| self.ns.set_value(self.src, tok));
                let directives = self.ns.set_tokens(self.src, &tree.directives);
                self.ns.add_package(PackageDecl {
                    decl,
                    name,
                    templ_kind,
                    directives,
                });
            }
            ExprTree::Import { path } => {
                let path = self.ns.set_value(self.src, path);
                self.ns.add_import(ImportDecl { decl, path });
            }
            ExprTree::Using { target } => {
                let target = self.ns.set_value(self.src, target);
                self.ns.add_using(UsingDecl { decl, target });
            }
            ExprTree::Type { target } => {
                let target = self.ns.set_value(self.src, target);
                self.ns.add_type(TypeDecl { decl, target });
            }
            ExprTree::Record { fields_mark } => {
                let fields = self.commit_vars(fields_mark);
                self.ns.add_record(RecordDecl { decl, fields });
            }
            ExprTree::Template { param_mark, body } => {
                let param = self.commit_vars(param_mark);
                let tags_start = self.ns.tags.len() as u32;
                for elem in body {
                    match elem {
                        BodyTree::Tag(tag) => self.commit_tag(tag),
                        BodyTree::Doc(doc) => self.commit_doc(doc),
                    }
                }
                let body = ListRef::new(tags_start, self.ns.tags.len() as u32 - tags_start);
                self.ns.add_template(TemplateDecl { decl, param, body });
            }
            ExprTree::TypeName { .. } | ExprTree::Value => {
                self.ns.add_var(VarDecl { decl });
            }
        }
    }

    /// Moves variables pushed after `mark` off the scope stack into the
    /// namespace, returning the contiguous range they now occupy.
    fn commit_vars(&mut self, mark: usize) -> ListRef<VarDecl> {
        let start = self.ns.vars.len() as u32;
        let trees: Vec<VarTree> = self.vars.drain_from(mark).collect();
        for var in trees {
            let idents = self.ns.set_ident_list(self.src, &var.idents);
            let typ = var.typ.map(|tok| self.ns.set_value(self.src, tok));
            self.ns.add_var(VarDecl {
                decl: Decl {
                    span: var.span,
                    idents,
                    typ,
                },
            });
        }
        ListRef::new(start, self.ns.vars.len() as u32 - start)
    }
}
