//! The first-set graph: `A -> B` iff `A` may invoke `B` at its initial
//! input position.
//!
//! Grounded directly on `make_first_graph` in
//! `examples/original_source/pegen/parser_generator.py`. Requires
//! [`crate::nullable::compute_nullable`] to have already run — a rule
//! reference's nullability is read straight off its `RuleFlags`.

use indexmap::IndexMap;
use std::collections::BTreeSet;

use crate::ir::{Alt, Grammar, Item, Node, Rhs};
use crate::token::is_token_class;

/// Adjacency list of the first-set graph, keyed by rule name, in the
/// grammar's insertion order. Every rule name is a key, even if its
/// initial-name set is empty.
pub type FirstGraph = IndexMap<String, BTreeSet<String>>;

/// Builds the first-set graph over `grammar`.
pub fn build_first_graph(grammar: &Grammar) -> FirstGraph {
    let mut graph: FirstGraph = IndexMap::new();
    for rule in grammar.rules() {
        graph.entry(rule.name.clone()).or_default();
    }
    for rule in grammar.rules() {
        let names = rule_initial_names(&rule.rhs, grammar);
        for name in &names {
            graph.entry(name.clone()).or_default();
        }
        graph.insert(rule.name.clone(), names);
    }
    graph
}

fn rule_initial_names(rhs: &Rhs, grammar: &Grammar) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for alt in &rhs.alts {
        out.extend(alt_initial_names(alt, grammar));
    }
    out
}

fn alt_initial_names(alt: &Alt, grammar: &Grammar) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for named in &alt.items {
        out.extend(initial_names(&named.node, grammar));
        if !is_nullable_item(&named.node.item, grammar) {
            break;
        }
    }
    out
}

fn initial_names(node: &Node, grammar: &Grammar) -> BTreeSet<String> {
    match &node.item {
        Item::NameLeaf(name) => {
            let mut out = BTreeSet::new();
            if !is_token_class(name) {
                out.insert(name.clone());
            }
            out
        }
        Item::StringLeaf(_) | Item::Cut => BTreeSet::new(),
        Item::Opt(inner) | Item::Repeat0(inner) | Item::Repeat1(inner) => {
            initial_names(inner, grammar)
        }
        Item::Group(rhs) => rule_initial_names(rhs, grammar),
        Item::PositiveLookahead(inner) | Item::NegativeLookahead(inner) => {
            initial_names(inner, grammar)
        }
    }
}

/// Nullability of a single item, consulting the grammar for rule
/// references (valid once `compute_nullable` has run).
fn is_nullable_item(item: &Item, grammar: &Grammar) -> bool {
    match item {
        Item::NameLeaf(name) => {
            if is_token_class(name) {
                false
            } else {
                grammar.rule(name).map(|r| r.flags.nullable).unwrap_or(false)
            }
        }
        Item::StringLeaf(_) => false,
        Item::Opt(_) | Item::Repeat0(_) => true,
        Item::PositiveLookahead(_) | Item::NegativeLookahead(_) | Item::Cut => true,
        Item::Repeat1(inner) => is_nullable_item(&inner.item, grammar),
        Item::Group(rhs) => rhs.alts.iter().any(|alt| {
            alt.items
                .iter()
                .all(|named| is_nullable_item(&named.node.item, grammar))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{NamedItem, Rule};
    use crate::nullable::compute_nullable;

    #[test]
    fn direct_self_reference_is_an_edge() {
        let mut g = Grammar::new();
        let a = g.node(Item::NameLeaf("expr".into()));
        let plus = g.node(Item::StringLeaf("+".into()));
        let b = g.node(Item::NameLeaf("NAME".into()));
        let alt1 = Alt::new(vec![
            NamedItem::new(a),
            NamedItem::new(plus),
            NamedItem::new(b),
        ]);
        let c = g.node(Item::NameLeaf("NAME".into()));
        let alt2 = Alt::new(vec![NamedItem::new(c)]);
        let rhs = g.rhs(vec![alt1, alt2]);
        g.insert_rule(Rule::new("expr", None, rhs));

        compute_nullable(&mut g);
        let graph = build_first_graph(&g);
        assert!(graph["expr"].contains("expr"));
    }

    #[test]
    fn nullable_prefix_exposes_the_next_item() {
        let mut g = Grammar::new();
        let opt = {
            let inner = g.node(Item::NameLeaf("NAME".into()));
            g.node(Item::Opt(Box::new(inner)))
        };
        let b = g.node(Item::NameLeaf("b".into()));
        let rhs = g.rhs(vec![Alt::new(vec![NamedItem::new(opt), NamedItem::new(b)])]);
        g.insert_rule(Rule::new("a", None, rhs));

        let rhs_b = {
            let tok = g.node(Item::NameLeaf("NUMBER".into()));
            g.rhs(vec![Alt::new(vec![NamedItem::new(tok)])])
        };
        g.insert_rule(Rule::new("b", None, rhs_b));

        compute_nullable(&mut g);
        let graph = build_first_graph(&g);
        assert!(graph["a"].contains("b"));
    }

    #[test]
    fn nullable_rule_reference_exposes_the_next_item() {
        let mut g = Grammar::new();
        // maybe: NAME? ;
        let inner = g.node(Item::NameLeaf("NAME".into()));
        let opt = g.node(Item::Opt(Box::new(inner)));
        let rhs = g.rhs(vec![Alt::new(vec![NamedItem::new(opt)])]);
        g.insert_rule(Rule::new("maybe", None, rhs));

        // start: maybe tail ;
        let maybe_ref = g.node(Item::NameLeaf("maybe".into()));
        let tail_ref = g.node(Item::NameLeaf("tail".into()));
        let rhs = g.rhs(vec![Alt::new(vec![
            NamedItem::new(maybe_ref),
            NamedItem::new(tail_ref),
        ])]);
        g.insert_rule(Rule::new("start", None, rhs));

        let tail_rhs = {
            let tok = g.node(Item::NameLeaf("NUMBER".into()));
            g.rhs(vec![Alt::new(vec![NamedItem::new(tok)])])
        };
        g.insert_rule(Rule::new("tail", None, tail_rhs));

        compute_nullable(&mut g);
        let graph = build_first_graph(&g);
        assert!(graph["start"].contains("maybe"));
        assert!(graph["start"].contains("tail"));
    }

    #[test]
    fn token_leaf_contributes_no_vertex() {
        let mut g = Grammar::new();
        let a = g.node(Item::NameLeaf("NAME".into()));
        let rhs = g.rhs(vec![Alt::new(vec![NamedItem::new(a)])]);
        g.insert_rule(Rule::new("start", None, rhs));

        compute_nullable(&mut g);
        let graph = build_first_graph(&g);
        assert!(graph["start"].is_empty());
    }
}
