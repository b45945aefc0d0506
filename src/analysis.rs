//! Fixed-point analyses over a rule set.
//!
//! These are whole-grammar batch computations; the grammar re-runs them
//! after every structural change rather than patching tables
//! incrementally. The search heuristics and the normalization passes both
//! consume the results.

use crate::rule::Rule;
use crate::word::{Letter, NonTerm, Word};
use rustc_hash::{FxHashMap, FxHashSet};

/// Saturation bound for [`min_distances`].
pub const MAX_DISTANCE: u32 = 20;

/// Saturation bound for [`min_yields`].
pub const MAX_YIELD: u32 = 20;

fn is_erasable_word(word: &Word, erasable: &FxHashSet<NonTerm>) -> bool {
    word.iter().all(|letter| match letter {
        Letter::NonTerm(n) => erasable.contains(n),
        Letter::Seg(seg) => seg.is_empty(),
    })
}

/// Least fixed point of the erasable-nonterminal relation: a nonterminal
/// is erasable iff some rule rewrites it into erasable nonterminals and
/// empty segments only.
pub fn find_erasable(rules: &[Rule]) -> FxHashSet<NonTerm> {
    let mut erasable = FxHashSet::default();
    let mut changed = true;
    while changed {
        changed = false;
        for rule in rules {
            if !erasable.contains(&rule.lhs) && is_erasable_word(rule.rhs(), &erasable) {
                erasable.insert(rule.lhs.clone());
                changed = true;
            }
        }
    }
    erasable
}

fn word_distance(word: &Word, distances: &FxHashMap<NonTerm, u32>) -> u32 {
    word.iter()
        .filter_map(Letter::as_nonterm)
        .map(|n| distances[n])
        .sum()
}

/// Minimum number of rule applications each nonterminal needs to reach a
/// fully-terminal word, saturating at [`MAX_DISTANCE`].
pub fn min_distances(
    rules: &[Rule],
    nonterminals: &FxHashSet<NonTerm>,
) -> FxHashMap<NonTerm, u32> {
    let mut distances: FxHashMap<NonTerm, u32> = nonterminals
        .iter()
        .map(|n| (n.clone(), MAX_DISTANCE))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for rule in rules {
            let distance = word_distance(rule.rhs(), &distances) + 1;
            if distance < distances[&rule.lhs] {
                distances.insert(rule.lhs.clone(), distance);
                changed = true;
            }
        }
    }
    distances
}

fn word_yield(word: &Word, yields: &FxHashMap<NonTerm, u32>) -> u32 {
    word.iter()
        .map(|letter| match letter {
            Letter::NonTerm(n) => yields[n],
            Letter::Seg(seg) => seg.len() as u32,
        })
        .sum()
}

/// Minimum combined terminal count (upper plus lower strand) each
/// nonterminal can generate, saturating at [`MAX_YIELD`].
pub fn min_yields(rules: &[Rule], nonterminals: &FxHashSet<NonTerm>) -> FxHashMap<NonTerm, u32> {
    let mut yields: FxHashMap<NonTerm, u32> = nonterminals
        .iter()
        .map(|n| (n.clone(), MAX_YIELD))
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for rule in rules {
            let terms = word_yield(rule.rhs(), &yields);
            if terms < yields[&rule.lhs] {
                yields.insert(rule.lhs.clone(), terms);
                changed = true;
            }
        }
    }
    yields
}
