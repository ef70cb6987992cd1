//! Grammar intermediate representation.
//!
//! A concrete, tagged-variant IR, matched exhaustively everywhere it's
//! consumed, in place of a double-dispatch visitor. Structurally grounded
//! on the shape of `src/grammar.rs` / `src/rule/mod.rs` / `src/history.rs`
//! (rule map, ordered by name, rule-carried "history"/metadata), without
//! the generic `ContextFree`/`History` trait hierarchy those files build
//! around: this IR's symbols are rule names, not interned integers, so
//! there is no lifetime-parameterized reference trait to route through.

use indexmap::IndexMap;

/// A stable identity for an IR node, assigned once at construction time.
///
/// The rule expander and call-site planner cache helper-rule allocations
/// keyed on `ItemId`, not on structural equality — two structurally equal
/// but distinct nodes get distinct helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u32);

/// A leaf or composite grammar item.
#[derive(Debug, Clone)]
pub enum Item {
    /// A bare identifier: either a token-class fetch or a rule invocation.
    NameLeaf(String),
    /// An already-unquoted literal: either a keyword match or a punctuation
    /// expect-token. Quoting/unquoting is the front-end's job.
    StringLeaf(String),
    /// `item?` — match or skip, always succeeds.
    Opt(Box<Node>),
    /// `item*` — greedy repetition, zero or more.
    Repeat0(Box<Node>),
    /// `item+` — greedy repetition, one or more; fails on zero matches.
    Repeat1(Box<Node>),
    /// `(rhs)` — a parenthesized sub-choice.
    Group(Rhs),
    /// `&item` — assert without consuming.
    PositiveLookahead(Box<Node>),
    /// `!item` — assert the negation without consuming.
    NegativeLookahead(Box<Node>),
    /// `~` — a commit marker within an alternative.
    Cut,
}

/// An `Item` plus the stable identity it was allocated with.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: ItemId,
    pub item: Item,
}

/// A single named binding within an `Alt`: an item, plus an optional
/// override for the variable name its result is bound to.
#[derive(Debug, Clone)]
pub struct NamedItem {
    pub bind: Option<String>,
    pub node: Node,
}

impl NamedItem {
    pub fn new(node: Node) -> Self {
        NamedItem { bind: None, node }
    }

    pub fn named(bind: impl Into<String>, node: Node) -> Self {
        NamedItem {
            bind: Some(bind.into()),
            node,
        }
    }
}

/// One alternative: a sequence of named items, plus an optional semantic
/// action (an unparsed, brace-delimited target-language expression).
#[derive(Debug, Clone)]
pub struct Alt {
    pub items: Vec<NamedItem>,
    pub action: Option<String>,
}

impl Alt {
    pub fn new(items: Vec<NamedItem>) -> Self {
        Alt {
            items,
            action: None,
        }
    }

    pub fn with_action(items: Vec<NamedItem>, action: impl Into<String>) -> Self {
        let action = action.into();
        assert!(
            action.starts_with('{') && action.ends_with('}'),
            "action text must be brace-delimited: {:?}",
            action
        );
        Alt {
            items,
            action: Some(action),
        }
    }
}

/// An ordered, non-empty list of alternatives. Earlier alternatives win on
/// success (ordered choice).
#[derive(Debug, Clone)]
pub struct Rhs {
    pub id: ItemId,
    pub alts: Vec<Alt>,
}

impl Rhs {
    /// True for the "trivial" shape pegen's call-maker collapses instead of
    /// synthesizing a helper rule for: exactly one alternative with exactly
    /// one item (`examples/original_source/pegen/c_generator.py`,
    /// `CCallMakerVisitor.visit_Rhs`).
    pub fn is_trivial(&self) -> bool {
        self.alts.len() == 1 && self.alts[0].items.len() == 1
    }
}

/// Flags set by the analyses; never touched by the expander or emitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleFlags {
    /// May match the empty input.
    pub nullable: bool,
    /// Appears in a first-set cycle of size > 1, or has a self-loop.
    pub left_recursive: bool,
    /// Chosen cycle leader in its SCC; only leaders emit the seed-growing
    /// loop.
    pub leader: bool,
}

/// A named production.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    /// Target-language type annotation for the rule's semantic result.
    /// Absent means an opaque reference type.
    pub type_: Option<String>,
    pub rhs: Rhs,
    pub flags: RuleFlags,
}

impl Rule {
    pub fn new(name: impl Into<String>, type_: Option<String>, rhs: Rhs) -> Self {
        Rule {
            name: name.into(),
            type_,
            rhs,
            flags: RuleFlags::default(),
        }
    }

    /// True iff this rule was synthesized as a repetition helper. Loop
    /// rules always produce a sequence-of-children result.
    pub fn is_loop(&self) -> bool {
        self.is_repeat0_loop() || self.is_repeat1_loop()
    }

    pub fn is_repeat0_loop(&self) -> bool {
        self.name.starts_with(LOOP0_PREFIX)
    }

    pub fn is_repeat1_loop(&self) -> bool {
        self.name.starts_with(LOOP1_PREFIX)
    }
}

pub const LOOP0_PREFIX: &str = "_loop0_";
pub const LOOP1_PREFIX: &str = "_loop1_";
pub const TMP_PREFIX: &str = "_tmp_";

/// A grammar: an insertion-ordered map from rule name to `Rule`, plus
/// metadata. Insertion order is emission order.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    rules: IndexMap<String, Rule>,
    metadata: IndexMap<String, Option<String>>,
    next_id: u32,
}

impl Grammar {
    pub fn new() -> Self {
        Grammar::default()
    }

    /// Allocates a fresh, globally unique `ItemId` for a new IR node.
    pub fn alloc_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn node(&mut self, item: Item) -> Node {
        Node {
            id: self.alloc_id(),
            item,
        }
    }

    pub fn rhs(&mut self, alts: Vec<Alt>) -> Rhs {
        assert!(!alts.is_empty(), "Rhs must have at least one alternative");
        Rhs {
            id: self.alloc_id(),
            alts,
        }
    }

    /// Inserts a rule, preserving the caller's insertion order. Panics on a
    /// duplicate name — referential/structural integrity of the work-list
    /// is the caller's responsibility (front-end or expander).
    pub fn insert_rule(&mut self, rule: Rule) {
        let prev = self.rules.insert(rule.name.clone(), rule);
        assert!(prev.is_none(), "duplicate rule name");
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: Option<String>) {
        self.metadata.insert(key.into(), value);
    }

    pub fn metadata(&self) -> &IndexMap<String, Option<String>> {
        &self.metadata
    }

    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn rule_mut(&mut self, name: &str) -> Option<&mut Rule> {
        self.rules.get_mut(name)
    }

    pub fn contains_rule(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Rules in work-list (insertion) order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn rules_mut(&mut self) -> impl Iterator<Item = &mut Rule> {
        self.rules.values_mut()
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get_index_of(&self, name: &str) -> Option<usize> {
        self.rules.get_index_of(name)
    }

    /// The sole entry point of the generated parser. `None` if the
    /// grammar has no `start` rule — a `GrammarError::MissingStartRule`,
    /// checked explicitly before generation rather than panicking here.
    pub fn start_rule(&self) -> Option<&Rule> {
        self.rule("start")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_preserved() {
        let mut g = Grammar::new();
        let a = g.node(Item::NameLeaf("NAME".into()));
        let rhs = g.rhs(vec![Alt::new(vec![NamedItem::new(a)])]);
        g.insert_rule(Rule::new("start", None, rhs));

        let b = g.node(Item::NameLeaf("NAME".into()));
        let rhs = g.rhs(vec![Alt::new(vec![NamedItem::new(b)])]);
        g.insert_rule(Rule::new("expr", None, rhs));

        let names: Vec<_> = g.rule_names().collect();
        assert_eq!(names, vec!["start", "expr"]);
    }

    #[test]
    fn node_ids_are_unique_and_monotonic() {
        let mut g = Grammar::new();
        let a = g.node(Item::Cut);
        let b = g.node(Item::Cut);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn is_loop_detects_synthesized_prefix() {
        let mut g = Grammar::new();
        let a = g.node(Item::NameLeaf("NAME".into()));
        let rhs = g.rhs(vec![Alt::new(vec![NamedItem::new(a)])]);
        let rule = Rule::new(format!("{}1", LOOP1_PREFIX), None, rhs);
        assert!(rule.is_loop());
        assert!(rule.is_repeat1_loop());
    }
}
