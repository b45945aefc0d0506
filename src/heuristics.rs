//! Pruning filters and node-precedence heuristics for the tree search.
//!
//! Both families are modelled as enums dispatched by variant, so heuristic
//! configuration is plain data: the grammar stores which filters are
//! enabled and which precedence is active, and the search asks the variant
//! to do the work.

use crate::grammar::Grammar;
use crate::word::{Letter, Word};
use regex::Regex;

/// Goal string of a membership query, prepared once per query.
pub(crate) struct Goal<'a> {
    pub text: &'a str,
    pub chars: &'a [char],
}

/// A candidate node as seen by the pruning filters.
pub(crate) struct Candidate<'a> {
    pub word: &'a Word,
    pub upper_len: usize,
    pub lower_len: usize,
    /// Sum of minimal yields over the word's nonterminals.
    pub nt_weight: i64,
}

/// Feasibility filters; a node failing any enabled filter is discarded
/// before being scored or enqueued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PruneFilter {
    /// SL: neither strand may exceed the goal length.
    StrandLen,
    /// TL: strands plus remaining minimal yields fit in twice the goal.
    TotalLen,
    /// WS: a leading segment's upper run must prefix the goal.
    WordStart,
    /// RL: a leading segment's aligned columns must be in the relation.
    Relation,
    /// RE: a coarse shape pattern of the word must occur in the goal.
    RegexShape,
}

impl PruneFilter {
    pub const ALL: [PruneFilter; 5] = [
        PruneFilter::StrandLen,
        PruneFilter::TotalLen,
        PruneFilter::WordStart,
        PruneFilter::Relation,
        PruneFilter::RegexShape,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PruneFilter::StrandLen => "SL",
            PruneFilter::TotalLen => "TL",
            PruneFilter::WordStart => "WS",
            PruneFilter::Relation => "RL",
            PruneFilter::RegexShape => "RE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub(crate) fn admits(self, cand: &Candidate<'_>, goal: &Goal<'_>, grammar: &Grammar) -> bool {
        match self {
            PruneFilter::StrandLen => {
                cand.upper_len.max(cand.lower_len) <= goal.chars.len()
            }
            PruneFilter::TotalLen => {
                cand.upper_len as i64 + cand.lower_len as i64 + cand.nt_weight
                    <= 2 * goal.chars.len() as i64
            }
            PruneFilter::WordStart => match cand.word.first() {
                Some(Letter::Seg(seg)) => {
                    seg.upper.len() <= goal.chars.len()
                        && seg.upper.iter().zip(goal.chars).all(|(a, b)| a == b)
                }
                _ => true,
            },
            PruneFilter::Relation => match cand.word.first() {
                Some(Letter::Seg(seg)) => {
                    let shorter = seg.upper.len().min(seg.lower.len());
                    (0..shorter)
                        .all(|i| grammar.relation_contains(seg.upper[i], seg.lower[i]))
                }
                _ => true,
            },
            PruneFilter::RegexShape => {
                let pattern = shape_pattern(cand.word);
                Regex::new(&pattern)
                    .map(|re| re.is_match(goal.text))
                    .unwrap_or(true)
            }
        }
    }
}

/// Coarse pattern of a word: literal upper-run terminals, a wildcard for
/// a nonterminal that follows a segment, and anchors when the word starts
/// or ends with a segment. A nonterminal following another nonterminal
/// contributes nothing.
fn shape_pattern(word: &Word) -> String {
    let letters = word.letters();
    let mut pattern = String::new();
    if letters.first().map_or(false, |l| l.is_seg()) {
        pattern.push('^');
    }
    for (idx, letter) in letters.iter().enumerate() {
        match letter {
            Letter::NonTerm(_) => {
                if idx > 0 && letters[idx - 1].is_seg() {
                    pattern.push_str(".*");
                }
            }
            Letter::Seg(seg) => {
                let run: String = seg.upper.iter().collect();
                pattern.push_str(&regex::escape(&run));
            }
        }
    }
    if letters.last().map_or(false, |l| l.is_seg()) {
        pattern.push('$');
    }
    pattern
}

/// Node-precedence heuristics; exactly one is active per grammar and a
/// lower score is dequeued first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Precedence {
    None,
    Nta,
    Wnta,
    Tm1,
    Tm2,
    Tm3,
    #[default]
    NtaTm1,
    NtaTm2,
    NtaTm3,
    WntaTm1,
    WntaTm2,
    WntaTm3,
}

impl Precedence {
    pub const ALL: [Precedence; 12] = [
        Precedence::Nta,
        Precedence::Wnta,
        Precedence::Tm1,
        Precedence::Tm2,
        Precedence::Tm3,
        Precedence::NtaTm1,
        Precedence::NtaTm2,
        Precedence::NtaTm3,
        Precedence::WntaTm1,
        Precedence::WntaTm2,
        Precedence::WntaTm3,
        Precedence::None,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Precedence::None => "NONE",
            Precedence::Nta => "NTA",
            Precedence::Wnta => "WNTA",
            Precedence::Tm1 => "TM1",
            Precedence::Tm2 => "TM2",
            Precedence::Tm3 => "TM3",
            Precedence::NtaTm1 => "NTA+TM1",
            Precedence::NtaTm2 => "NTA+TM2",
            Precedence::NtaTm3 => "NTA+TM3",
            Precedence::WntaTm1 => "WNTA+TM1",
            Precedence::WntaTm2 => "WNTA+TM2",
            Precedence::WntaTm3 => "WNTA+TM3",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Score a word against the goal; lower scores are expanded first.
    pub(crate) fn score(self, word: &Word, goal: &[char], grammar: &Grammar) -> i64 {
        match self {
            Precedence::None => 0,
            Precedence::Nta => word.iter().filter(|l| l.is_nonterm()).count() as i64,
            Precedence::Wnta => word
                .iter()
                .filter_map(Letter::as_nonterm)
                .map(|n| grammar.min_distance(n) as i64)
                .sum(),
            Precedence::Tm1 => tm_stop(word.letters(), goal, 1),
            Precedence::Tm2 => tm_continue(word.letters(), goal, 1, 0, |_| 0),
            Precedence::Tm3 => tm_stop(&word.letters()[..word.len().min(1)], goal, 1),
            Precedence::NtaTm1 => tm_stop_weighted(word, goal, |_| 1),
            Precedence::NtaTm2 => tm_continue(word.letters(), goal, 10, 10, |_| 1),
            Precedence::NtaTm3 => {
                let nts = word.iter().filter(|l| l.is_nonterm()).count() as i64;
                nts + tm_stop(&word.letters()[..word.len().min(1)], goal, 10)
            }
            Precedence::WntaTm1 => tm_stop_weighted(word, goal, |n| grammar.min_distance(n) as i64),
            Precedence::WntaTm2 => {
                tm_continue(word.letters(), goal, 10, 10, |n| grammar.min_distance(n) as i64)
            }
            Precedence::WntaTm3 => {
                let nts: i64 = word
                    .iter()
                    .filter_map(Letter::as_nonterm)
                    .map(|n| grammar.min_distance(n) as i64)
                    .sum();
                nts + tm_stop(&word.letters()[..word.len().min(1)], goal, 10)
            }
        }
    }
}

/// Walk upper-run terminals against the goal; subtract `reward` per match
/// and stop at the first mismatch. Nonterminal letters are skipped without
/// advancing the goal position.
fn tm_stop(letters: &[Letter], goal: &[char], reward: i64) -> i64 {
    let mut goal_idx = 0;
    let mut score = 0;
    for letter in letters {
        if let Letter::Seg(seg) = letter {
            for &sym in &seg.upper {
                if goal_idx < goal.len() && sym == goal[goal_idx] {
                    score -= reward;
                    goal_idx += 1;
                } else {
                    return score;
                }
            }
        }
    }
    score
}

/// Like [`tm_stop`], but a nonterminal letter adds `nt_cost` to the score
/// and a mismatch still aborts the whole walk.
fn tm_stop_weighted(word: &Word, goal: &[char], nt_cost: impl Fn(&crate::word::NonTerm) -> i64) -> i64 {
    let mut goal_idx = 0;
    let mut score = 0;
    for letter in word {
        match letter {
            Letter::Seg(seg) => {
                for &sym in &seg.upper {
                    if goal_idx < goal.len() && sym == goal[goal_idx] {
                        score -= 10;
                        goal_idx += 1;
                    } else {
                        return score;
                    }
                }
            }
            Letter::NonTerm(n) => score += nt_cost(n),
        }
    }
    score
}

/// Walk upper-run terminals against the goal without stopping: matches
/// subtract `reward`, mismatches add `penalty`, nonterminals add
/// `nt_cost`.
fn tm_continue(
    letters: &[Letter],
    goal: &[char],
    reward: i64,
    penalty: i64,
    nt_cost: impl Fn(&crate::word::NonTerm) -> i64,
) -> i64 {
    let mut goal_idx = 0;
    let mut score = 0;
    for letter in letters {
        match letter {
            Letter::Seg(seg) => {
                for &sym in &seg.upper {
                    if goal_idx < goal.len() && sym == goal[goal_idx] {
                        score -= reward;
                    } else {
                        score += penalty;
                    }
                    goal_idx += 1;
                }
            }
            Letter::NonTerm(n) => score += nt_cost(n),
        }
    }
    score
}
