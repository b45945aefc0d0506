//! Membership testing for Watson-Crick (double-stranded) context-free
//! grammars.
//!
//! This crate provides:
//! - Word and rule representation for double-stranded sentential forms
//! - A rewriting engine that keeps words in compact canonical form
//! - Best-first tree search with pluggable pruning and precedence
//!   heuristics
//! - Grammar normalization into a Chomsky-like binary form
//! - A generalized CYK recognizer (WK-CYK) over four-index spans
//!
//! A grammar is built and validated once ([`Grammar::new`]), answers
//! membership queries directly via [`Grammar::search`], and — after
//! [`Grammar::to_normal_form`] — via the usually faster
//! [`Grammar::recognize`]. Both queries respect a per-grammar wall-clock
//! budget and report [`Outcome::Unknown`] when it runs out.

pub mod analysis;
pub mod cyk;
pub mod grammar;
pub mod heuristics;
pub mod normalize;
pub mod rewrite;
pub mod rule;
pub mod search;
pub mod word;

// Re-exports for convenience
pub use grammar::{
    ConsistencyError, Grammar, GrammarSnapshot, HeuristicError, Outcome, DEFAULT_TIME_LIMIT,
};
pub use heuristics::{Precedence, PruneFilter};
pub use rewrite::apply_rule;
pub use rule::Rule;
pub use search::SearchReport;
pub use word::{nt, seg, Letter, NonTerm, Segment, Word};
