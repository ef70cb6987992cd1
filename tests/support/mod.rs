//! Terse `Grammar` fixture builders shared by the scenario tests.

use peg_packrat_gen::ir::{Alt, Grammar, Item, NamedItem, Rule};

/// A bare `NameLeaf` reference (token class or rule, the grammar doesn't
/// care which at construction time).
pub fn name(g: &mut Grammar, ident: &str) -> NamedItem {
    NamedItem::new(g.node(Item::NameLeaf(ident.into())))
}

/// A bare `StringLeaf` literal.
pub fn lit(g: &mut Grammar, spelling: &str) -> NamedItem {
    NamedItem::new(g.node(Item::StringLeaf(spelling.into())))
}

/// A cut marker (`~`).
pub fn cut(g: &mut Grammar) -> NamedItem {
    NamedItem::new(g.node(Item::Cut))
}

/// `item+`, wrapping an existing `NamedItem`'s node.
pub fn repeat1(g: &mut Grammar, item: NamedItem) -> NamedItem {
    NamedItem::new(g.node(Item::Repeat1(Box::new(item.node))))
}

/// Declares a rule from a list of alternatives, each given as a `Vec` of
/// `NamedItem`.
pub fn rule(g: &mut Grammar, name: &str, alts: Vec<Vec<NamedItem>>) {
    let alts = alts.into_iter().map(Alt::new).collect();
    let rhs = g.rhs(alts);
    g.insert_rule(Rule::new(name, None, rhs));
}
