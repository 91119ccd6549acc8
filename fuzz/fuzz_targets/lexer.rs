#![no_main]

use libfuzzer_sys::fuzz_target;
use tem_parser::token::TokenKind;
use tem_parser::Tokenizer;

fuzz_target!(|data: &[u8]| {
    // lossy conversion so invalid UTF-8 cannot abort the run
    let s = String::from_utf8_lossy(data);

    let mut lex = Tokenizer::new(&s);

    let mut frontier = 0usize;
    let mut steps = 0usize;
    let max_steps = s.len().saturating_mul(4) + 64;

    loop {
        let tok = lex.next_token();
        steps += 1;
        assert!(steps <= max_steps, "tokenizer stopped making progress");
        assert!(tok.start <= tok.end);
        assert!(tok.end as usize <= s.len());

        match tok.kind {
            TokenKind::Eof => break,
            // inserted semis are zero width at a break past the frontier
            TokenKind::Semi if tok.is_empty() => {
                assert!(tok.start as usize >= frontier);
            }
            _ => {
                assert!(tok.start as usize >= frontier);
                frontier = tok.end as usize;
            }
        }
    }

    // the whole pipeline must hold up too
    let (ns, _diags) = tem_parser::parse_file("fuzz.tem", &s);
    for idx in 0..ns.tokens.len() as u32 {
        let _ = ns.text(idx);
    }
});
