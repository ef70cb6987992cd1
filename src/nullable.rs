//! Nullability: the least fixed point of "may match the empty input".
//!
//! Iterate-to-fixpoint in the style of `src/prediction.rs`'s
//! `FirstSets::new` ("Based on code by Niko Matsakis"): a scratch boolean
//! per rule, updated every pass until a pass changes nothing. The scratch
//! array is a `bit_vec::BitVec` indexed by the rule's position in the
//! grammar's insertion-ordered map, mirroring how `src/rhs_closure.rs`
//! threads a `BitVec` "property" through a monotonic fixpoint.

use bit_vec::BitVec;

use crate::ir::{Alt, Grammar, Item, Rhs};
use crate::token::is_token_class;

/// Computes `nullable` for every rule in `grammar`, to a fixed point.
pub fn compute_nullable(grammar: &mut Grammar) {
    let n = grammar.len();
    let mut nullable = BitVec::from_elem(n, false);

    let mut changed = true;
    while changed {
        changed = false;
        for (i, rule) in grammar.rules().enumerate() {
            let n = rhs_nullable(&rule.rhs, grammar, &nullable);
            if n != nullable[i] {
                nullable.set(i, n);
                changed = true;
            }
        }
    }

    for (i, rule) in grammar.rules_mut().enumerate() {
        rule.flags.nullable = nullable[i];
    }
}

fn rhs_nullable(rhs: &Rhs, grammar: &Grammar, nullable: &BitVec) -> bool {
    rhs.alts.iter().any(|alt| alt_nullable(alt, grammar, nullable))
}

fn alt_nullable(alt: &Alt, grammar: &Grammar, nullable: &BitVec) -> bool {
    alt.items
        .iter()
        .all(|named| item_nullable(&named.node.item, grammar, nullable))
}

fn item_nullable(item: &Item, grammar: &Grammar, nullable: &BitVec) -> bool {
    match item {
        Item::NameLeaf(name) => {
            if is_token_class(name) {
                false
            } else {
                grammar
                    .get_index_of(name)
                    .map(|i| nullable[i])
                    .unwrap_or(false)
            }
        }
        Item::StringLeaf(_) => false,
        Item::Opt(_) | Item::Repeat0(_) => true,
        Item::Repeat1(inner) => item_nullable(&inner.item, grammar, nullable),
        Item::Group(rhs) => rhs_nullable(rhs, grammar, nullable),
        Item::PositiveLookahead(_) | Item::NegativeLookahead(_) => true,
        Item::Cut => true,
    }
}
