use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box as bb;
use tem_parser::token::TokenKind;
use tem_parser::{parse_file, Tokenizer};

// =============================================================================
// Test Corpus - Different sizes of tem source
// =============================================================================

const SMALL_PACKAGE: &str = r#"
p :: package("home") templ(tag)
"#;

const MEDIUM_RECORDS: &str = r#"
p :: package("site") templ(html)
h :: import("lib/html")
s :: import("lib/strings")
u :: using(h)

Name :: type(String)

Author :: record{
    name: Name
    email: String
};

Post :: record{
    title: String
    author: Author
    body: Text
};
"#;

const LARGE_TEMPLATES: &str = r#"
p :: package("blog") templ(html)
h :: import("lib/html")
f :: import("lib/format")
u :: using(h)
v :: using(f)

Slug :: type(String)

Author "A person who writes posts"
Author :: record{
    name: String
    handle: Slug
    bio: Text
};

Post "A single blog entry"
Post :: record{
    title "Shown in the page header"
    title: String
    slug: Slug
    author: Author
    published: Date
    body: Text
};

Page :: record{
    post: Post
    related: PostList
};

head :: templ(p: Page){
    meta { charset = "utf-8" };
    title { text = "blog" };
}

article :: templ(p: Post){
    header { class = "post-header" };
    time { datetime = "published" };
    section { class = "post-body" };
}

footer :: templ(p: Page){
    nav { class = "related" };
    small { text = """rendered by tem
""" tiny print at the bottom of every page
    };
}
"#;

fn corpus() -> [(&'static str, &'static str); 3] {
    [
        ("small", SMALL_PACKAGE),
        ("medium", MEDIUM_RECORDS),
        ("large", LARGE_TEMPLATES),
    ]
}

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    for (name, src) in corpus() {
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), src, |b, src| {
            b.iter(|| {
                let mut lex = Tokenizer::new(bb(src));
                let mut count = 0usize;
                while lex.next_token().kind != TokenKind::Eof {
                    count += 1;
                }
                bb(count)
            })
        });
    }
    group.finish();
}

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");
    for (name, src) in corpus() {
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), src, |b, src| {
            b.iter(|| {
                let (ns, diags) = parse_file("bench.tem", bb(src));
                bb((ns.tokens.len(), diags.len()))
            })
        });
    }
    group.finish();
}

fn bench_parser_with_errors(c: &mut Criterion) {
    // recovery path: every other declaration is broken
    let src: String = (0..40)
        .map(|n| {
            if n % 2 == 0 {
                format!("r{n} :: record{{ a: String }};\n")
            } else {
                format!("b{n} :: record{{ broken\n")
            }
        })
        .collect();
    let mut group = c.benchmark_group("parser_recovery");
    group.throughput(Throughput::Bytes(src.len() as u64));
    group.bench_function("mixed_errors", |b| {
        b.iter(|| {
            let (ns, diags) = parse_file("bench.tem", bb(src.as_str()));
            bb((ns.records.len(), diags.len()))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_lexer, bench_parser, bench_parser_with_errors);
criterion_main!(benches);
