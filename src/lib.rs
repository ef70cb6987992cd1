//! Analyzes a PEG grammar and emits a packrat recursive-descent parser.
//!
//! The pipeline, leaves first: [`ir`] holds the grammar representation;
//! [`nullable`], [`first`], and [`scc`] are the analyses; [`expand`]
//! synthesizes helper rules for groups and repetitions; [`plan`] decides
//! each item's run-time call shape; [`emit`] streams the target-language
//! text. [`generator`] wires all of it into the one entry point most
//! callers want.

#![deny(missing_copy_implementations, trivial_casts, trivial_numeric_casts, unused_import_braces)]
#![cfg_attr(test, deny(warnings))]

pub mod emit;
pub mod error;
pub mod expand;
pub mod first;
pub mod generator;
pub mod ir;
pub mod nullable;
pub mod plan;
pub mod scc;
pub mod token;

pub use error::GrammarError;
pub use generator::{generate, GenerationReport, GeneratorConfig};
pub use ir::{Grammar, Item, Rule};
