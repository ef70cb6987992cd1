//! Call-site planning: for each item, the run-time call shape and the
//! temporary variable name that carries its result.
//!
//! Grounded on `CCallMakerVisitor` in
//! `examples/original_source/pegen/c_generator.py`: each `visit_*` method
//! there returns a `(name, call)` pair; this module is that same table,
//! restated as data instead of a dispatch method per variant, matched
//! exhaustively by the emitter instead of double-dispatched.

use std::collections::HashMap;

use crate::expand::HelperFor;
use crate::ir::{Alt, Grammar, Item, Node};
use crate::token::{classify_string_leaf, is_token_class, StringLeafKind};

/// The shape of the runtime call a planned item compiles to: token
/// fetchers, keyword and punctuation matchers, rule invocation, and the
/// three lookahead wrapper variants.
#[derive(Debug, Clone)]
pub enum CallShape {
    TokenFetch { class: String },
    RuleInvocation { rule: String },
    Keyword { literal: String },
    Punctuation { code: u16 },
    Opt { inner: Box<CallShape> },
    Loop { helper: String },
    PositiveLookahead { inner: Box<CallShape>, arity: ArgArity },
    NegativeLookahead { inner: Box<CallShape>, arity: ArgArity },
}

/// The extra-argument shape of a call, used to pick which of the three
/// lookahead wrapper functions a lookahead compiles to: plain, an extra
/// int (punctuation code), or an extra string (keyword literal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgArity {
    Zero,
    Int,
    Str,
}

fn arg_arity(shape: &CallShape) -> ArgArity {
    match shape {
        CallShape::TokenFetch { .. } | CallShape::RuleInvocation { .. } | CallShape::Loop { .. } => {
            ArgArity::Zero
        }
        CallShape::Keyword { .. } => ArgArity::Str,
        CallShape::Punctuation { .. } => ArgArity::Int,
        CallShape::Opt { inner } => arg_arity(inner),
        CallShape::PositiveLookahead { .. } | CallShape::NegativeLookahead { .. } => ArgArity::Zero,
    }
}

/// A planned item: the variable its result is bound to (`None` for
/// unnamed assertions: lookaheads and cuts) and its call shape (`None`
/// only for `Cut`, which has no runtime call at all).
#[derive(Debug, Clone)]
pub struct PlannedItem {
    pub var: Option<String>,
    pub call: Option<CallShape>,
}

/// Plans every item of `alt`, one `PlannedItem` per `NamedItem` in order,
/// with variable names de-duplicated within the alternative by appending
/// a numeric suffix on collision.
pub fn plan_alt(alt: &Alt, grammar: &Grammar, helper_for: &HelperFor) -> Vec<PlannedItem> {
    let mut seen: HashMap<String, u32> = HashMap::new();
    alt.items
        .iter()
        .map(|named| {
            let mut planned = plan_node(&named.node, grammar, helper_for);
            if let Some(bind) = &named.bind {
                planned.var = Some(bind.clone());
            }
            if let Some(var) = &planned.var {
                let count = seen.entry(var.clone()).or_insert(0);
                if *count > 0 {
                    planned.var = Some(format!("{}{}", var, *count));
                }
                *count += 1;
            }
            planned
        })
        .collect()
}

fn plan_node(node: &Node, grammar: &Grammar, helper_for: &HelperFor) -> PlannedItem {
    match &node.item {
        Item::Cut => PlannedItem { var: None, call: None },

        Item::NameLeaf(name) => {
            if is_token_class(name) {
                PlannedItem {
                    var: Some(format!("{}_var", name.to_lowercase())),
                    call: Some(CallShape::TokenFetch { class: name.clone() }),
                }
            } else {
                PlannedItem {
                    var: Some(format!("{}_var", name)),
                    call: Some(CallShape::RuleInvocation { rule: name.clone() }),
                }
            }
        }

        Item::StringLeaf(value) => {
            // `classify_string_leaf` only fails on a spelling that is
            // neither identifier-like nor recognized punctuation; the
            // grammar is assumed referentially closed and pre-validated
            // before planning runs (the generator checks this first).
            match classify_string_leaf(value).expect("string leaf was validated before planning") {
                StringLeafKind::Keyword => PlannedItem {
                    var: Some("keyword".into()),
                    call: Some(CallShape::Keyword { literal: value.clone() }),
                },
                StringLeafKind::Punctuation(code) => PlannedItem {
                    var: Some("literal".into()),
                    call: Some(CallShape::Punctuation { code }),
                },
            }
        }

        Item::Opt(inner) => {
            let inner_planned = plan_node(inner, grammar, helper_for);
            PlannedItem {
                var: Some("opt_var".into()),
                call: inner_planned
                    .call
                    .map(|c| CallShape::Opt { inner: Box::new(c) }),
            }
        }

        Item::Repeat0(_) | Item::Repeat1(_) => {
            let helper = helper_for
                .get(&node.id)
                .unwrap_or_else(|| panic!("repetition node {:?} has no synthesized helper", node.id));
            PlannedItem {
                var: Some(format!("{}_var", helper)),
                call: Some(CallShape::Loop { helper: helper.clone() }),
            }
        }

        Item::Group(rhs) => {
            if rhs.is_trivial() {
                plan_node(&rhs.alts[0].items[0].node, grammar, helper_for)
            } else {
                let helper = helper_for
                    .get(&node.id)
                    .unwrap_or_else(|| panic!("group node {:?} has no synthesized helper", node.id));
                PlannedItem {
                    var: Some(format!("{}_var", helper)),
                    call: Some(CallShape::RuleInvocation { rule: helper.clone() }),
                }
            }
        }

        Item::PositiveLookahead(inner) => {
            let inner_planned = plan_node(inner, grammar, helper_for);
            let call = inner_planned.call.map(|c| {
                let arity = arg_arity(&c);
                CallShape::PositiveLookahead {
                    inner: Box::new(c),
                    arity,
                }
            });
            PlannedItem { var: None, call }
        }

        Item::NegativeLookahead(inner) => {
            let inner_planned = plan_node(inner, grammar, helper_for);
            let call = inner_planned.call.map(|c| {
                let arity = arg_arity(&c);
                CallShape::NegativeLookahead {
                    inner: Box::new(c),
                    arity,
                }
            });
            PlannedItem { var: None, call }
        }
    }
}
