//! Core word representation for Watson-Crick grammars.
//!
//! This module provides the fundamental data structures for sentential
//! forms of a double-stranded derivation: terminal runs paired into
//! segments, letters, and words.

use rustc_hash::FxHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Interned nonterminal name.
pub type NonTerm = Rc<str>;

/// A contiguous block of terminals contributed simultaneously to the
/// upper and the lower strand. Either run may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Segment {
    pub upper: Vec<char>,
    pub lower: Vec<char>,
}

impl Segment {
    /// Create a segment from two terminal runs.
    pub fn new(upper: Vec<char>, lower: Vec<char>) -> Self {
        Segment { upper, lower }
    }

    /// Create a segment from two string slices, one character per terminal.
    pub fn from_strs(upper: &str, lower: &str) -> Self {
        Segment {
            upper: upper.chars().collect(),
            lower: lower.chars().collect(),
        }
    }

    /// Combined number of terminals on both strands.
    pub fn len(&self) -> usize {
        self.upper.len() + self.lower.len()
    }

    /// True if both runs are empty (the lambda segment).
    pub fn is_empty(&self) -> bool {
        self.upper.is_empty() && self.lower.is_empty()
    }

    /// Concatenate two segments strand-wise: `(u1 u2, l1 l2)`.
    pub fn merged(&self, other: &Segment) -> Segment {
        let mut upper = self.upper.clone();
        upper.extend_from_slice(&other.upper);
        let mut lower = self.lower.clone();
        lower.extend_from_slice(&other.lower);
        Segment { upper, lower }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn run(f: &mut fmt::Formatter<'_>, r: &[char]) -> fmt::Result {
            if r.is_empty() {
                write!(f, "λ")
            } else {
                r.iter().try_for_each(|c| write!(f, "{}", c))
            }
        }
        run(f, &self.upper)?;
        write!(f, "/")?;
        run(f, &self.lower)
    }
}

/// A letter of a word: either a nonterminal or a strand segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Letter {
    NonTerm(NonTerm),
    Seg(Segment),
}

impl Letter {
    pub fn is_nonterm(&self) -> bool {
        matches!(self, Letter::NonTerm(_))
    }

    pub fn is_seg(&self) -> bool {
        matches!(self, Letter::Seg(_))
    }

    pub fn as_nonterm(&self) -> Option<&NonTerm> {
        match self {
            Letter::NonTerm(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_seg(&self) -> Option<&Segment> {
        match self {
            Letter::Seg(s) => Some(s),
            _ => None,
        }
    }
}

/// Nonterminal letter.
pub fn nt(name: impl Into<NonTerm>) -> Letter {
    Letter::NonTerm(name.into())
}

/// Segment letter with the given upper and lower runs.
pub fn seg(upper: &str, lower: &str) -> Letter {
    Letter::Seg(Segment::from_strs(upper, lower))
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Letter::NonTerm(n) => write!(f, "{}", n),
            Letter::Seg(s) => write!(f, "{}", s),
        }
    }
}

/// A sentential form of the double-stranded derivation.
///
/// A word is *canonical* when no two segment letters are adjacent; every
/// constructor that could violate this ([`Word::compacted`], the rewriter)
/// merges neighbours instead.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Word(Vec<Letter>);

impl Word {
    /// Create a word from letters, as given.
    pub fn new(letters: Vec<Letter>) -> Self {
        Word(letters)
    }

    /// Create a word from letters, merging adjacent segments:
    /// `(a/λ)(λ/a)` becomes `(a/a)`.
    pub fn compacted(letters: Vec<Letter>) -> Self {
        let mut out: Vec<Letter> = Vec::with_capacity(letters.len());
        for letter in letters {
            match (out.last_mut(), letter) {
                (Some(Letter::Seg(prev)), Letter::Seg(next)) => {
                    prev.upper.extend_from_slice(&next.upper);
                    prev.lower.extend_from_slice(&next.lower);
                }
                (_, letter) => out.push(letter),
            }
        }
        Word(out)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn letters(&self) -> &[Letter] {
        &self.0
    }

    pub fn into_letters(self) -> Vec<Letter> {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Letter> {
        self.0.iter()
    }

    pub fn first(&self) -> Option<&Letter> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Letter> {
        self.0.last()
    }

    /// Position and name of the leftmost nonterminal letter, if any.
    pub fn leftmost_nonterm(&self) -> Option<(usize, &NonTerm)> {
        self.0.iter().enumerate().find_map(|(i, letter)| match letter {
            Letter::NonTerm(n) => Some((i, n)),
            Letter::Seg(_) => None,
        })
    }

    /// True if no two segment letters are adjacent.
    pub fn is_canonical(&self) -> bool {
        !self.0.windows(2).any(|w| w[0].is_seg() && w[1].is_seg())
    }

    /// 64-bit key of the word's printed form, used by the search to
    /// deduplicate states. Words with identical renderings share a key
    /// even when their structure differs.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.to_string().hash(&mut hasher);
        hasher.finish()
    }
}

impl std::ops::Index<usize> for Word {
    type Output = Letter;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IntoIterator for Word {
    type Item = Letter;
    type IntoIter = std::vec::IntoIter<Letter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Word {
    type Item = &'a Letter;
    type IntoIter = std::slice::Iter<'a, Letter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, letter) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", letter)?;
        }
        Ok(())
    }
}
