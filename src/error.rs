//! Grammar errors: the only recoverable failure mode of a generation pass.
//!
//! Shaped after `cfg-load`'s `LoadError` (`cfg-load/src/lib.rs`): a plain
//! enum with a hand-written `Display`, no `thiserror`. Anything else wrong
//! with the IR (a malformed action, a loop rule with more than one
//! alternative) is an internal invariant and panics instead — it signals a
//! bug in this crate's own construction of the IR, not a bad input grammar.

use std::fmt;

/// A fatal, user-facing error in the input grammar.
///
/// A `GrammarError` aborts the generation pass with no output produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// A `StringLeaf` unquoted to something that is neither identifier-like
    /// nor a recognized punctuation spelling.
    UnknownPunctuation {
        /// The offending (already unquoted) spelling.
        spelling: String,
    },
    /// A first-set SCC of size > 1 has no member common to every simple
    /// cycle within it, so no leader can be chosen.
    NoLeaderCandidate {
        /// The rule names making up the offending SCC, in grammar order.
        members: Vec<String>,
    },
    /// The grammar has no rule named `start`.
    MissingStartRule,
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::UnknownPunctuation { spelling } => {
                write!(f, "{:?} is not a known punctuation literal", spelling)
            }
            GrammarError::NoLeaderCandidate { members } => {
                write!(
                    f,
                    "SCC {{{}}} has no leadership candidate (no element is included in all cycles)",
                    members.join(", ")
                )
            }
            GrammarError::MissingStartRule => {
                write!(f, "grammar has no rule named `start`")
            }
        }
    }
}

impl std::error::Error for GrammarError {}
