//! The generation pass orchestrator: wires analyses, expansion, planning,
//! and emission into the single pipeline external callers drive.
//!
//! Grounded on `ParserGenerator.generate_parser` in
//! `examples/original_source/pegen/parser_generator.py`, which runs this
//! same sequence (compute nullable/first sets, detect left recursion,
//! expand rules, emit) as one top-level call. The `log::debug!`/`trace!`
//! tracing at each phase boundary mirrors the diagnostic style of
//! `src/earley/grammar.rs`'s `debug!` calls in this corpus's other
//! multi-phase grammar pipeline.

use std::fmt::Write as FmtWrite;

use log::{debug, trace};

use crate::emit;
use crate::error::GrammarError;
use crate::expand::{self, HelperFor};
use crate::first::{self, FirstGraph};
use crate::ir::{Alt, Grammar, Item, Node, Rhs};
use crate::nullable;
use crate::scc;
use crate::token::classify_string_leaf;

/// Configuration for one generation pass.
///
/// Builder-style, following the construction pattern of `src/rule_builder.rs`:
/// required inputs go to `new`, optional ones get a setter each.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    source_name: String,
    ast_root_type: Option<String>,
}

impl GeneratorConfig {
    /// `source_name` is recorded verbatim in the emitted `@generated`
    /// header marker.
    pub fn new(source_name: impl Into<String>) -> Self {
        GeneratorConfig {
            source_name: source_name.into(),
            ast_root_type: None,
        }
    }

    /// Declares the module's AST root type, so the entry shim can select
    /// mode 1 (direct AST return) when `start`'s declared type matches it.
    pub fn with_ast_root_type(mut self, type_name: impl Into<String>) -> Self {
        self.ast_root_type = Some(type_name.into());
        self
    }
}

/// Result of a successful generation pass, exposed for callers (and
/// tests) that want to inspect analysis output without re-running it.
pub struct GenerationReport {
    pub first_graph: FirstGraph,
    pub helper_for: HelperFor,
    /// The grammar after analysis tagging and rule expansion: the
    /// caller's own `Grammar` is left untouched (`generate` only ever
    /// borrows it), so this is the only place the expanded work-list and
    /// flipped `RuleFlags` are observable.
    pub expanded_grammar: Grammar,
}

/// Runs the full pipeline over `grammar` and writes the generated source
/// text to `out`. `grammar` itself is never mutated: this pass clones it
/// once, then tags flags and appends helper rules on the clone, the way a
/// single `Generator` instance owns its own work-list for the lifetime of
/// one pass without reaching back into the caller's copy.
///
/// On a `GrammarError`, `out` is never touched — the pass builds the
/// complete output into memory before writing any of it, so a failed
/// pass never leaves partial output behind.
pub fn generate(
    grammar: &Grammar,
    config: &GeneratorConfig,
    out: &mut impl FmtWrite,
) -> Result<GenerationReport, GrammarError> {
    if grammar.start_rule().is_none() {
        return Err(GrammarError::MissingStartRule);
    }

    debug!("validating string leaves for {} rules", grammar.len());
    validate_string_leaves(grammar)?;

    let mut grammar = grammar.clone();

    trace!("computing nullability");
    nullable::compute_nullable(&mut grammar);

    trace!("building first-set graph");
    let first_graph = first::build_first_graph(&grammar);

    trace!("computing strongly-connected components / left recursion");
    scc::compute_left_recursion(&mut grammar, &first_graph)?;

    trace!("expanding rules");
    let helper_for = expand::expand_rules(&mut grammar);
    debug!("expansion produced {} helper rules", helper_for.len());

    if let Some(root) = &config.ast_root_type {
        grammar.set_metadata("ast_root_type", Some(root.clone()));
    }

    trace!("emitting");
    let text = emit::emit(&grammar, &helper_for, &config.source_name);
    out.write_str(&text)
        .expect("writing generated text to the caller's sink failed");

    Ok(GenerationReport {
        first_graph,
        helper_for,
        expanded_grammar: grammar,
    })
}

fn validate_string_leaves(grammar: &Grammar) -> Result<(), GrammarError> {
    for rule in grammar.rules() {
        validate_rhs(&rule.rhs)?;
    }
    Ok(())
}

fn validate_rhs(rhs: &Rhs) -> Result<(), GrammarError> {
    for alt in &rhs.alts {
        validate_alt(alt)?;
    }
    Ok(())
}

fn validate_alt(alt: &Alt) -> Result<(), GrammarError> {
    for named in &alt.items {
        validate_node(&named.node)?;
    }
    Ok(())
}

fn validate_node(node: &Node) -> Result<(), GrammarError> {
    match &node.item {
        Item::StringLeaf(value) => classify_string_leaf(value).map(|_| ()),
        Item::NameLeaf(_) | Item::Cut => Ok(()),
        Item::Opt(inner)
        | Item::Repeat0(inner)
        | Item::Repeat1(inner)
        | Item::PositiveLookahead(inner)
        | Item::NegativeLookahead(inner) => validate_node(inner),
        Item::Group(rhs) => validate_rhs(rhs),
    }
}
