//! A minimal two-token grammar, `start: NAME ENDMARKER`, should emit a
//! single rule function and no synthesized helpers.

mod support;

use peg_packrat_gen::ir::Grammar;
use peg_packrat_gen::{generate, GeneratorConfig};
use support::{name, rule};

#[test]
fn emits_one_forward_declaration_and_no_helpers() {
    let mut g = Grammar::new();
    let n = name(&mut g, "NAME");
    let e = name(&mut g, "ENDMARKER");
    rule(&mut g, "start", vec![vec![n, e]]);

    let config = GeneratorConfig::new("minimal.gram");
    let mut out = String::new();
    let report = generate(&g, &config, &mut out).unwrap();

    assert!(out.contains("static void * start_rule(Parser *p);"));
    assert!(!out.contains("start_raw"));
    assert!(out.contains("#define start_type 1000"));
    assert!(report.helper_for.is_empty());
    assert_eq!(report.expanded_grammar.len(), 1);
}
