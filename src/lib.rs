//! Front end for the tem templating language.
//!
//! - Tokenizer built on Logos with line-break semicolon insertion.
//! - Hand-written recursive-descent parser that recovers per
//!   declaration and commits results into a flat namespace arena.
//!
//! The usual entry point is [`parse_file`]; the pieces are public for
//! callers that want to drive the tokenizer or parser themselves.

pub mod ast;
pub mod containers;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;

pub use lexer::Tokenizer;
pub use parser::Parser;

use crate::ast::Namespace;
use crate::error::Diagnostics;

/// Parses one source file into a namespace.
///
/// Never fails: everything that parsed is in the namespace, everything
/// that did not is described in the diagnostics. `file` is only used to
/// render locations.
pub fn parse_file(file: &str, src: &str) -> (Namespace, Diagnostics) {
    Parser::new(file, src).parse()
}

#[cfg(test)]
mod tests {
    use super::parse_file;

    #[test]
    fn smoke() {
        let src = "\
p :: package(\"home\") templ(tag)
h :: import(\"lib/html\")
u :: using(h)
Model :: record{ name: String }
greet :: templ(m: Model){}
";
        let (ns, diags) = parse_file("smoke.tem", src);
        assert!(diags.is_empty(), "{:?}", diags.iter().collect::<Vec<_>>());
        assert!(ns.package.is_some());
        assert_eq!(ns.imports.len(), 1);
        assert_eq!(ns.usings.len(), 1);
        assert_eq!(ns.records.len(), 1);
        assert_eq!(ns.templates.len(), 1);
    }
}
