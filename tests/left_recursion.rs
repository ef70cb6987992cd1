//! Direct and indirect left recursion: a left-recursive rule gets a
//! seed-growing `_rule`/`_raw` split, and an indirectly-recursive cycle
//! picks exactly one leader.

mod support;

use peg_packrat_gen::ir::Grammar;
use peg_packrat_gen::{generate, GeneratorConfig};
use support::{name, lit, rule};

#[test]
fn direct_left_recursion_emits_raw_and_seed_growing_loop() {
    // expr: expr '+' NAME | NAME ;
    let mut g = Grammar::new();
    let expr_ref = name(&mut g, "expr");
    let plus = lit(&mut g, "+");
    let n = name(&mut g, "NAME");
    let n2 = name(&mut g, "NAME");
    rule(&mut g, "expr", vec![vec![expr_ref, plus, n], vec![n2]]);

    let config = GeneratorConfig::new("expr.gram");
    let mut out = String::new();
    let report = generate(&g, &config, &mut out).unwrap();

    let expr = report.expanded_grammar.rule("expr").unwrap();
    assert!(expr.flags.left_recursive);
    assert!(expr.flags.leader);

    assert!(out.contains("expr_raw(Parser *p)"));
    assert!(out.contains("update_memo(p, mark, expr_type, res);"));
}

#[test]
fn indirect_left_recursion_has_exactly_one_leader() {
    // a: b 'x' | 'y' ;
    // b: a 'z' | 'w' ;
    let mut g = Grammar::new();
    let b_ref = name(&mut g, "b");
    let x = lit(&mut g, "x");
    let y = lit(&mut g, "y");
    rule(&mut g, "a", vec![vec![b_ref, x], vec![y]]);

    let a_ref = name(&mut g, "a");
    let z = lit(&mut g, "z");
    let w = lit(&mut g, "w");
    rule(&mut g, "b", vec![vec![a_ref, z], vec![w]]);

    let config = GeneratorConfig::new("indirect.gram");
    let mut out = String::new();
    let report = generate(&g, &config, &mut out).unwrap();

    let a = report.expanded_grammar.rule("a").unwrap();
    let b = report.expanded_grammar.rule("b").unwrap();
    assert!(a.flags.left_recursive && b.flags.left_recursive);
    assert!(a.flags.leader, "lexicographically smaller name (\"a\") is the leader");
    assert!(!b.flags.leader);

    assert!(out.contains("a_raw(Parser *p)"));
    assert!(!out.contains("b_raw(Parser *p)"));
}
