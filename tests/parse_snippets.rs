//! End-to-end parses of well-formed tem sources.

use tem_parser::ast::Namespace;
use tem_parser::parse_file;

fn parse_ok(src: &str) -> Namespace {
    let (ns, diags) = parse_file("snippet.tem", src);
    assert!(
        diags.is_empty(),
        "expected clean parse, got: {:#?}",
        diags.iter().collect::<Vec<_>>()
    );
    ns
}

#[test]
fn package_with_template_kind() {
    let ns = parse_ok("p :: package(\"home\") templ(tag)");
    let pkg = ns.package.expect("package declaration");
    assert_eq!(ns.value_text(pkg.name), "\"home\"");
    assert_eq!(ns.value_text(pkg.templ_kind.expect("kind")), "tag");
    assert_eq!(ns.text_slice(pkg.decl.idents).collect::<Vec<_>>(), ["p"]);
}

#[test]
fn package_with_directives() {
    let ns = parse_ok("p :: #static #inline package(\"home\")");
    let pkg = ns.package.unwrap();
    assert_eq!(
        ns.text_slice(pkg.directives).collect::<Vec<_>>(),
        ["#static", "#inline"]
    );
    assert!(pkg.templ_kind.is_none());
}

#[test]
fn record_with_two_fields() {
    let ns = parse_ok("t :: record{ a: String; b: String };");
    assert_eq!(ns.records.len(), 1);
    let rec = &ns.records[0];
    let fields = ns.var_slice(rec.fields);
    assert_eq!(fields.len(), 2);
    assert_eq!(ns.text_slice(fields[0].decl.idents).collect::<Vec<_>>(), ["a"]);
    assert_eq!(ns.value_text(fields[0].decl.typ.unwrap()), "String");
    assert_eq!(ns.text_slice(fields[1].decl.idents).collect::<Vec<_>>(), ["b"]);
    assert_eq!(ns.value_text(fields[1].decl.typ.unwrap()), "String");
}

#[test]
fn record_fields_split_across_lines() {
    // inserted semicolons terminate the fields
    let ns = parse_ok("t :: record{\n  a: String\n  b: Int\n}");
    let fields = ns.var_slice(ns.records[0].fields);
    assert_eq!(fields.len(), 2);
    assert_eq!(ns.value_text(fields[1].decl.typ.unwrap()), "Int");
}

#[test]
fn template_with_one_param_and_empty_body() {
    let ns = parse_ok("c :: templ(m: Model){}");
    assert_eq!(ns.templates.len(), 1);
    let templ = &ns.templates[0];
    let param = ns.var_slice(templ.param);
    assert_eq!(param.len(), 1);
    assert_eq!(ns.text_slice(param[0].decl.idents).collect::<Vec<_>>(), ["m"]);
    assert_eq!(ns.value_text(param[0].decl.typ.unwrap()), "Model");
    assert!(templ.body.is_empty());
}

#[test]
fn template_body_holds_tags() {
    let ns = parse_ok(
        "c :: templ(m: Model){\n  html { lang = \"en\" };\n  body { class = \"page\" };\n}",
    );
    let templ = &ns.templates[0];
    let body = ns.tag_slice(templ.body);
    assert_eq!(body.len(), 2);
    assert_eq!(ns.text_slice(body[0].decl.idents).collect::<Vec<_>>(), ["html"]);
    let attrs = ns.attr_slice(body[0].attrs);
    assert_eq!(attrs.len(), 1);
    assert_eq!(ns.text_slice(attrs[0].decl.idents).collect::<Vec<_>>(), ["lang"]);
    assert_eq!(ns.value_text(attrs[0].value), "\"en\"");
}

#[test]
fn explicit_and_inferred_kinds_commit_the_same() {
    let explicit = parse_ok("u : type : type(Other)");
    let inferred = parse_ok("u :: type(Other)");
    assert_eq!(explicit.types.len(), 1);
    assert_eq!(inferred.types.len(), 1);
    assert_eq!(
        explicit.value_text(explicit.types[0].target),
        inferred.value_text(inferred.types[0].target),
    );
}

#[test]
fn bare_identifier_list_is_a_variable() {
    let ns = parse_ok("x, y : Int\nz\n");
    assert_eq!(ns.vars.len(), 2);
    assert_eq!(
        ns.text_slice(ns.vars[0].decl.idents).collect::<Vec<_>>(),
        ["x", "y"]
    );
    assert_eq!(ns.value_text(ns.vars[0].decl.typ.unwrap()), "Int");
    assert!(ns.vars[1].decl.typ.is_none());
}

#[test]
fn type_name_initializer_types_the_variable() {
    // `x :: Model` is a variable whose type comes from the right side
    let ns = parse_ok("x :: Model\n");
    assert_eq!(ns.vars.len(), 1);
    assert_eq!(ns.value_text(ns.vars[0].decl.typ.unwrap()), "Model");
}

#[test]
fn doc_declarations_attach_to_names() {
    let ns = parse_ok("greet \"Renders a greeting\"\n");
    assert_eq!(ns.docs.len(), 1);
    let doc = &ns.docs[0];
    assert_eq!(ns.text_slice(doc.decl.idents).collect::<Vec<_>>(), ["greet"]);
    assert_eq!(ns.doc_text(doc), "Renders a greeting");
}

#[test]
fn doc_runs_precede_the_declaration_they_annotate() {
    let src = "greet \"says hello\"\ngreet :: templ(m: Model){}\n";
    let ns = parse_ok(src);
    assert_eq!(ns.docs.len(), 1);
    assert_eq!(ns.templates.len(), 1);
}

#[test]
fn text_block_doc_joins_lines() {
    let src = "greet \"\"\"first line\n\"\"\"second line\n";
    let ns = parse_ok(src);
    assert_eq!(ns.doc_text(&ns.docs[0]), "first line\nsecond line");
}

#[test]
fn record_fields_may_carry_docs() {
    let ns = parse_ok("t :: record{\n  a \"the a field\"\n  a: String\n}");
    assert_eq!(ns.docs.len(), 1);
    assert_eq!(ns.doc_text(&ns.docs[0]), "the a field");
    assert_eq!(ns.var_slice(ns.records[0].fields).len(), 1);
}

#[test]
fn tag_with_several_attrs() {
    let ns = parse_ok("meta { charset = \"utf-8\", viewport = \"device-width\" };");
    assert_eq!(ns.tags.len(), 1);
    let attrs = ns.attr_slice(ns.tags[0].attrs);
    assert_eq!(attrs.len(), 2);
    assert_eq!(ns.value_text(attrs[1].value), "\"device-width\"");
}

#[test]
fn full_file_in_order() {
    let src = "\
p :: package(\"home\") templ(html)
h :: import(\"lib/html\")
s :: import(\"lib/strings\")
u :: using(h)
Name :: type(String)
Model :: record{ title: Name };
render \"Renders the page\"
render :: templ(m: Model){ html { lang = \"en\" }; }
";
    let ns = parse_ok(src);
    assert!(ns.package.is_some());
    assert_eq!(ns.imports.len(), 2);
    assert_eq!(ns.usings.len(), 1);
    assert_eq!(ns.types.len(), 1);
    assert_eq!(ns.records.len(), 1);
    assert_eq!(ns.templates.len(), 1);
    assert_eq!(ns.docs.len(), 1);
    assert_eq!(ns.value_text(ns.imports[0].path), "\"lib/html\"");
    assert_eq!(ns.value_text(ns.usings[0].target), "h");
}

#[test]
fn committed_token_ranges_never_overlap() {
    let src = "\
p :: package(\"home\")
Model :: record{ a: String; b: Int };
c :: templ(m: Model){}
";
    let ns = parse_ok(src);

    let mut ranges = Vec::new();
    let mut collect = |r: tem_parser::ast::TokenRange| {
        if !r.is_empty() {
            ranges.push((r.start(), r.end()));
        }
    };
    let pkg = ns.package.as_ref().unwrap();
    collect(pkg.decl.idents);
    collect(pkg.name);
    for rec in &ns.records {
        collect(rec.decl.idents);
    }
    for var in &ns.vars {
        collect(var.decl.idents);
        if let Some(t) = var.decl.typ {
            collect(t);
        }
    }
    for templ in &ns.templates {
        collect(templ.decl.idents);
    }

    ranges.sort();
    for pair in ranges.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "overlapping ranges: {pair:?}");
    }
    assert_eq!(ns.tokens.len(), ns.texts.len());
}
