//! Parse a tem file and print its namespace.
//!
//! Usage: temc FILE
//!
//! The namespace goes to stdout, diagnostics to stderr. Exit code is 0
//! for a clean parse, 1 when there were diagnostics, 2 on usage or I/O
//! problems.

use std::{env, fs, process};

use tem_parser::printer::{render_diag, Printer};

fn main() {
    let mut args = env::args().skip(1);
    let (Some(path), None) = (args.next(), args.next()) else {
        eprintln!("usage: temc FILE");
        process::exit(2);
    };

    let src = match fs::read_to_string(&path) {
        Ok(src) => src,
        Err(err) => {
            eprintln!("temc: {path}: {err}");
            process::exit(2);
        }
    };

    let (ns, diags) = tem_parser::parse_file(&path, &src);

    let mut out = String::new();
    // writing to a String cannot fail
    let _ = Printer::new(&mut out, &src).file(&ns);
    print!("{out}");

    for diag in diags.iter() {
        eprintln!("{}", render_diag(diag, &path, &src));
    }
    if !diags.is_empty() {
        process::exit(1);
    }
}
