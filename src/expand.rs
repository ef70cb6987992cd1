//! Rule expansion: synthesizing helper rules for repetitions and non-trivial
//! groups.
//!
//! Grounded directly on `ParserGenerator.name_node` / `name_loop` /
//! `CCallMakerVisitor.visit_Rhs` / `visit_Repeat0` / `visit_Repeat1` in
//! `examples/original_source/pegen/parser_generator.py` and
//! `c_generator.py`. Two independent counters (`_tmp_N`, `_loopK_N`) match
//! the original's separate `self._counter` / `self._loop_counter`.
//!
//! New rules are appended to the grammar and pushed onto a FIFO queue,
//! exactly mirroring pegen's round-based `while self.todo: for rulename,
//! rule in list(self.todo.items()): ...` — a helper rule's own body is only
//! walked once it is dequeued in a later round, never inline with the
//! alternative that introduced it. `Opt`/`PositiveLookahead`/
//! `NegativeLookahead`, however, are walked synchronously (matching
//! `CCallMakerVisitor.visit_Opt` et al., which call `self.visit(node.node)`
//! directly): they never get a helper rule of their own, but a `Group` or
//! repetition nested inside one does.

use std::collections::{HashMap, VecDeque};

use crate::ir::{
    Alt, Grammar, Item, ItemId, NamedItem, Node, Rhs, Rule, LOOP0_PREFIX, LOOP1_PREFIX, TMP_PREFIX,
};

/// Maps the `ItemId` of a `Group`/`Repeat0`/`Repeat1` node to the name of
/// the helper rule synthesized for it. Consulted by the call-site planner
/// to decide whether an item calls a helper rule or is handled inline.
pub type HelperFor = HashMap<ItemId, String>;

/// Expands `grammar` in place: walks every rule's body (including rules
/// added by this same pass), synthesizing `_tmp_N` rules for non-trivial
/// groups and `_loop0_N` / `_loop1_N` rules for repetitions.
pub fn expand_rules(grammar: &mut Grammar) -> HelperFor {
    let mut helper_for = HelperFor::new();
    let mut tmp_counter: u32 = 0;
    let mut loop_counter: u32 = 0;
    let mut queue: VecDeque<String> = grammar.rule_names().map(String::from).collect();

    while let Some(name) = queue.pop_front() {
        let rhs = match grammar.rule(&name) {
            Some(rule) => rule.rhs.clone(),
            None => continue,
        };
        walk_rhs(&rhs, grammar, &mut helper_for, &mut tmp_counter, &mut loop_counter, &mut queue);
    }

    helper_for
}

fn walk_rhs(
    rhs: &Rhs,
    grammar: &mut Grammar,
    helper_for: &mut HelperFor,
    tmp_counter: &mut u32,
    loop_counter: &mut u32,
    queue: &mut VecDeque<String>,
) {
    for alt in &rhs.alts {
        walk_alt(alt, grammar, helper_for, tmp_counter, loop_counter, queue);
    }
}

fn walk_alt(
    alt: &Alt,
    grammar: &mut Grammar,
    helper_for: &mut HelperFor,
    tmp_counter: &mut u32,
    loop_counter: &mut u32,
    queue: &mut VecDeque<String>,
) {
    for named in &alt.items {
        walk_node(&named.node, grammar, helper_for, tmp_counter, loop_counter, queue);
    }
}

fn walk_node(
    node: &Node,
    grammar: &mut Grammar,
    helper_for: &mut HelperFor,
    tmp_counter: &mut u32,
    loop_counter: &mut u32,
    queue: &mut VecDeque<String>,
) {
    if helper_for.contains_key(&node.id) {
        return;
    }

    match &node.item {
        Item::NameLeaf(_) | Item::StringLeaf(_) | Item::Cut => {}

        Item::Opt(inner)
        | Item::PositiveLookahead(inner)
        | Item::NegativeLookahead(inner) => {
            walk_node(inner, grammar, helper_for, tmp_counter, loop_counter, queue);
        }

        Item::Repeat0(inner) => {
            synthesize_loop(node.id, inner, LOOP0_PREFIX, loop_counter, grammar, helper_for, queue);
        }
        Item::Repeat1(inner) => {
            synthesize_loop(node.id, inner, LOOP1_PREFIX, loop_counter, grammar, helper_for, queue);
        }

        Item::Group(group_rhs) => {
            if group_rhs.is_trivial() {
                let only = &group_rhs.alts[0].items[0].node;
                walk_node(only, grammar, helper_for, tmp_counter, loop_counter, queue);
            } else {
                synthesize_tmp(node.id, group_rhs.clone(), tmp_counter, grammar, helper_for, queue);
            }
        }
    }
}

fn synthesize_tmp(
    id: ItemId,
    rhs: Rhs,
    tmp_counter: &mut u32,
    grammar: &mut Grammar,
    helper_for: &mut HelperFor,
    queue: &mut VecDeque<String>,
) {
    *tmp_counter += 1;
    let name = format!("{}{}", TMP_PREFIX, tmp_counter);
    helper_for.insert(id, name.clone());
    grammar.insert_rule(Rule::new(name.clone(), None, rhs));
    queue.push_back(name);
}

fn synthesize_loop(
    id: ItemId,
    inner: &Node,
    prefix: &str,
    loop_counter: &mut u32,
    grammar: &mut Grammar,
    helper_for: &mut HelperFor,
    queue: &mut VecDeque<String>,
) {
    *loop_counter += 1;
    let name = format!("{}{}", prefix, loop_counter);
    helper_for.insert(id, name.clone());
    let body = inner.clone();
    let rhs = grammar.rhs(vec![Alt::new(vec![NamedItem::new(body)])]);
    grammar.insert_rule(Rule::new(name.clone(), None, rhs));
    queue.push_back(name);
}
