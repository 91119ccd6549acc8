//! Property tests: the tokenizer must survive anything.

use proptest::prelude::*;
use tem_parser::token::TokenKind;
use tem_parser::Tokenizer;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn never_panics_and_always_progresses(src in ".*") {
        let len = src.len() as u32;
        let mut lex = Tokenizer::new(&src);
        // frontier of non-comment tokens; merged comments may run past
        // a pending inserted semicolon, so they are tracked separately
        let mut frontier = 0u32;
        let mut steps = 0usize;
        let budget = 4 * src.len() + 64;
        loop {
            let tok = lex.next_token();
            steps += 1;
            prop_assert!(steps <= budget, "tokenizer is not making progress");
            prop_assert!(tok.start <= tok.end);
            prop_assert!(tok.end <= len);
            match tok.kind {
                TokenKind::Eof => {
                    prop_assert_eq!(tok.start, len);
                    break;
                }
                TokenKind::Comment => {
                    prop_assert!(tok.start >= frontier);
                }
                TokenKind::Semi if tok.is_empty() => {
                    // inserted; sits at a break at or after the last token
                    prop_assert!(tok.start >= frontier);
                    frontier = tok.start;
                }
                _ => {
                    prop_assert!(tok.start >= frontier);
                    prop_assert!(!tok.is_empty(), "only inserted semis are zero width");
                    frontier = tok.end;
                }
            }
        }
        // one Eof, then the iterator is done
        prop_assert_eq!(lex.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn diag_count_matches_err_count(src in ".*") {
        let mut lex = Tokenizer::new(&src);
        while lex.next_token().kind != TokenKind::Eof {}
        let diags = lex.take_diags();
        prop_assert_eq!(diags.len() as u32, lex.err_count());
    }

    #[test]
    fn parser_never_panics(src in ".*") {
        let (ns, diags) = tem_parser::parse_file("prop.tem", &src);
        // committed tokens always resolve
        for idx in 0..ns.tokens.len() as u32 {
            let _ = ns.text(idx);
        }
        let _ = diags.len();
    }
}
