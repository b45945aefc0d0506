//! Rule representation for Watson-Crick grammars.
//!
//! A rule rewrites one nonterminal into a word. Right-hand sides are kept
//! compact (no adjacent segment letters) and carry cached counts consumed
//! by the search and its pruning filters.

use crate::word::{Letter, NonTerm, Word};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A production `lhs -> rhs`.
///
/// Rules compare and hash by `(lhs, rhs)` only; the cached counts are
/// derived data.
#[derive(Clone, Debug)]
pub struct Rule {
    /// The rewritten nonterminal.
    pub lhs: NonTerm,
    rhs: Word,
    nt_count: usize,
    upper_len: usize,
    lower_len: usize,
    nt_weight: i64,
}

impl Rule {
    /// Create a rule, compacting the right-hand side.
    pub fn new(lhs: impl Into<NonTerm>, rhs: Vec<Letter>) -> Self {
        let rhs = Word::compacted(rhs);
        let mut rule = Rule {
            lhs: lhs.into(),
            rhs,
            nt_count: 0,
            upper_len: 0,
            lower_len: 0,
            nt_weight: 0,
        };
        rule.recount();
        rule
    }

    fn recount(&mut self) {
        self.nt_count = 0;
        self.upper_len = 0;
        self.lower_len = 0;
        for letter in &self.rhs {
            match letter {
                Letter::NonTerm(_) => self.nt_count += 1,
                Letter::Seg(seg) => {
                    self.upper_len += seg.upper.len();
                    self.lower_len += seg.lower.len();
                }
            }
        }
    }

    pub fn rhs(&self) -> &Word {
        &self.rhs
    }

    /// Number of nonterminal occurrences on the right-hand side.
    pub fn nt_count(&self) -> usize {
        self.nt_count
    }

    /// Terminals this rule contributes to the upper strand.
    pub fn upper_len(&self) -> usize {
        self.upper_len
    }

    /// Terminals this rule contributes to the lower strand.
    pub fn lower_len(&self) -> usize {
        self.lower_len
    }

    /// Adjusted nonterminal weight: the change in the sum of minimal
    /// yields when this rule is applied. Maintained by the grammar after
    /// every analysis pass.
    pub fn nt_weight(&self) -> i64 {
        self.nt_weight
    }

    pub(crate) fn set_nt_weight(&mut self, weight: i64) {
        self.nt_weight = weight;
    }

    /// A unit rule rewrites into exactly one nonterminal.
    pub fn is_unit(&self) -> bool {
        self.rhs.len() == 1 && self.rhs[0].is_nonterm()
    }

    /// A normal-form rule is either a single segment of combined length
    /// one, or exactly two nonterminals.
    pub fn is_normal_form(&self) -> bool {
        match self.rhs.letters() {
            [Letter::Seg(seg)] => seg.len() == 1,
            [Letter::NonTerm(_), Letter::NonTerm(_)] => true,
            _ => false,
        }
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.lhs == other.lhs && self.rhs == other.rhs
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lhs.hash(state);
        self.rhs.hash(state);
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.lhs, self.rhs)
    }
}
