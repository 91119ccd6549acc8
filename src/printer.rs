//! Namespace pretty-printer.
//!
//! Renders a parsed namespace as indented S-expressions, one line per
//! declaration, each annotated with its file location. Diagnostics get
//! the same location treatment through [`render_diag`].

use std::fmt::{self, Write};

use crate::ast::{
    DocDecl, ImportDecl, Namespace, PackageDecl, RecordDecl, TagDecl, TemplateDecl, TokenRange,
    TypeDecl, UsingDecl, VarDecl,
};
use crate::error::{Diag, Span};
use crate::token::Location;

/// One diagnostic as a single human-readable line.
pub fn render_diag(diag: &Diag, file: &str, src: &str) -> String {
    format!("{} at {}", diag.message, diag.location(file, src))
}

pub struct Printer<'a, W> {
    out: &'a mut W,
    src: &'a str,
}

impl<'a, W: Write> Printer<'a, W> {
    pub fn new(out: &'a mut W, src: &'a str) -> Self {
        Self { out, src }
    }

    /// Renders every committed declaration, grouped by kind in file
    /// order within each group. Variables and tags referenced by a
    /// record or template render nested under it, not at file level.
    pub fn file(&mut self, ns: &Namespace) -> fmt::Result {
        if let Some(pkg) = &ns.package {
            self.package(ns, pkg)?;
        }
        for decl in &ns.imports {
            self.import(ns, decl)?;
        }
        for decl in &ns.usings {
            self.using(ns, decl)?;
        }
        for decl in &ns.types {
            self.type_decl(ns, decl)?;
        }
        for decl in &ns.records {
            self.record(ns, decl)?;
        }
        for decl in &ns.templates {
            self.template(ns, decl)?;
        }

        let mut nested_vars = vec![false; ns.vars.len()];
        for decl in &ns.records {
            for idx in decl.fields.range() {
                nested_vars[idx] = true;
            }
        }
        for decl in &ns.templates {
            for idx in decl.param.range() {
                nested_vars[idx] = true;
            }
        }
        for (idx, decl) in ns.vars.iter().enumerate() {
            if !nested_vars[idx] {
                self.var(ns, decl, 0)?;
            }
        }

        let mut nested_tags = vec![false; ns.tags.len()];
        for decl in &ns.templates {
            for idx in decl.body.range() {
                nested_tags[idx] = true;
            }
        }
        for (idx, decl) in ns.tags.iter().enumerate() {
            if !nested_tags[idx] {
                self.tag(ns, decl, 0)?;
            }
        }

        for decl in &ns.docs {
            self.doc(ns, decl)?;
        }
        Ok(())
    }

    fn package(&mut self, ns: &Namespace, decl: &PackageDecl) -> fmt::Result {
        self.indent(0)?;
        write!(self.out, "(package {} ", self.idents(ns, decl.decl.idents))?;
        write!(self.out, "{}", ns.value_text(decl.name))?;
        if let Some(kind) = decl.templ_kind {
            write!(self.out, " kind={}", ns.value_text(kind))?;
        }
        for text in ns.text_slice(decl.directives) {
            write!(self.out, " {text}")?;
        }
        self.close(ns, decl.decl.span)
    }

    fn import(&mut self, ns: &Namespace, decl: &ImportDecl) -> fmt::Result {
        self.indent(0)?;
        write!(
            self.out,
            "(import {} {}",
            self.idents(ns, decl.decl.idents),
            ns.value_text(decl.path)
        )?;
        self.close(ns, decl.decl.span)
    }

    fn using(&mut self, ns: &Namespace, decl: &UsingDecl) -> fmt::Result {
        self.indent(0)?;
        write!(
            self.out,
            "(using {} {}",
            self.idents(ns, decl.decl.idents),
            ns.value_text(decl.target)
        )?;
        self.close(ns, decl.decl.span)
    }

    fn type_decl(&mut self, ns: &Namespace, decl: &TypeDecl) -> fmt::Result {
        self.indent(0)?;
        write!(
            self.out,
            "(type {} {}",
            self.idents(ns, decl.decl.idents),
            ns.value_text(decl.target)
        )?;
        self.close(ns, decl.decl.span)
    }

    fn record(&mut self, ns: &Namespace, decl: &RecordDecl) -> fmt::Result {
        self.indent(0)?;
        write!(self.out, "(record {}", self.idents(ns, decl.decl.idents))?;
        if decl.fields.is_empty() {
            return self.close(ns, decl.decl.span);
        }
        writeln!(self.out, " {}", self.loc(ns, decl.decl.span))?;
        for field in ns.var_slice(decl.fields) {
            self.var(ns, field, 1)?;
        }
        self.indent(0)?;
        writeln!(self.out, ")")
    }

    fn template(&mut self, ns: &Namespace, decl: &TemplateDecl) -> fmt::Result {
        self.indent(0)?;
        let param = &ns.var_slice(decl.param)[0];
        write!(
            self.out,
            "(templ {} (param {}",
            self.idents(ns, decl.decl.idents),
            self.idents(ns, param.decl.idents),
        )?;
        if let Some(typ) = param.decl.typ {
            write!(self.out, " : {}", ns.value_text(typ))?;
        }
        write!(self.out, ")")?;
        if decl.body.is_empty() {
            return self.close(ns, decl.decl.span);
        }
        writeln!(self.out, " {}", self.loc(ns, decl.decl.span))?;
        for tag in ns.tag_slice(decl.body) {
            self.tag(ns, tag, 1)?;
        }
        self.indent(0)?;
        writeln!(self.out, ")")
    }

    fn var(&mut self, ns: &Namespace, decl: &VarDecl, depth: usize) -> fmt::Result {
        self.indent(depth)?;
        write!(self.out, "(var {}", self.idents(ns, decl.decl.idents))?;
        if let Some(typ) = decl.decl.typ {
            write!(self.out, " : {}", ns.value_text(typ))?;
        }
        self.close(ns, decl.decl.span)
    }

    fn tag(&mut self, ns: &Namespace, decl: &TagDecl, depth: usize) -> fmt::Result {
        self.indent(depth)?;
        write!(self.out, "(tag {}", self.idents(ns, decl.decl.idents))?;
        if decl.attrs.is_empty() {
            return self.close(ns, decl.decl.span);
        }
        writeln!(self.out, " {}", self.loc(ns, decl.decl.span))?;
        for attr in ns.attr_slice(decl.attrs) {
            self.indent(depth + 1)?;
            write!(
                self.out,
                "(attr {} = {}",
                self.idents(ns, attr.decl.idents),
                ns.value_text(attr.value)
            )?;
            self.close(ns, attr.decl.span)?;
        }
        self.indent(depth)?;
        writeln!(self.out, ")")
    }

    fn doc(&mut self, ns: &Namespace, decl: &DocDecl) -> fmt::Result {
        self.indent(0)?;
        write!(
            self.out,
            "(doc {} {:?}",
            self.idents(ns, decl.decl.idents),
            ns.doc_text(decl)
        )?;
        self.close(ns, decl.decl.span)
    }

    // ---- plumbing ----

    fn idents(&self, ns: &Namespace, range: TokenRange) -> String {
        let mut out = String::new();
        for (n, text) in ns.text_slice(range).enumerate() {
            if n > 0 {
                out.push_str(", ");
            }
            out.push_str(text);
        }
        out
    }

    fn loc(&self, ns: &Namespace, span: Span) -> String {
        format!("@{}", Location::of(&ns.file, self.src, span))
    }

    fn indent(&mut self, depth: usize) -> fmt::Result {
        write!(self.out, "{:width$}", "", width = depth * 2)
    }

    fn close(&mut self, ns: &Namespace, span: Span) -> fmt::Result {
        writeln!(self.out, " {})", self.loc(ns, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_file;

    #[test]
    fn renders_package_with_kind_and_location() {
        let src = "p :: package(\"home\") templ(tag)\n";
        let (ns, diags) = parse_file("demo.tem", src);
        assert!(diags.is_empty());
        let mut out = String::new();
        Printer::new(&mut out, src).file(&ns).unwrap();
        assert!(out.contains("(package p \"home\" kind=tag"));
        assert!(out.contains("@demo.tem:1:1"));
    }

    #[test]
    fn renders_nested_record_fields() {
        let src = "t :: record{ a: String; b: String };\n";
        let (ns, diags) = parse_file("demo.tem", src);
        assert!(diags.is_empty());
        let mut out = String::new();
        Printer::new(&mut out, src).file(&ns).unwrap();
        assert!(out.contains("(record t"));
        assert!(out.contains("  (var a : String"));
        assert!(out.contains("  (var b : String"));
        // nested fields are not repeated at file level
        assert_eq!(out.matches("(var a").count(), 1);
    }

    #[test]
    fn diag_rendering_names_file_and_position() {
        let src = "p :: package(\n";
        let (_, diags) = parse_file("demo.tem", src);
        assert!(!diags.is_empty());
        let line = render_diag(diags.iter().next().unwrap(), "demo.tem", src);
        assert!(line.contains(" at demo.tem:"), "{line}");
    }
}
