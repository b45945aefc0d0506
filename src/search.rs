//! Best-first tree search for membership queries.
//!
//! The search explores leftmost derivations of the grammar from the start
//! symbol, ordered by the active node-precedence heuristic and narrowed by
//! the enabled pruning filters. Nodes live in an arena owned by the query;
//! parent links are arena indices used only to reconstruct the derivation
//! path for diagnostics.

use crate::grammar::{Grammar, Outcome};
use crate::heuristics::{Candidate, Goal, PruneFilter};
use crate::rewrite::apply_rule;
use crate::word::{Letter, Word};
use log::debug;
use priority_queue::PriorityQueue;
use rustc_hash::FxHashSet;
use std::cmp::Reverse;
use std::time::Instant;

/// Statistics and outcome of one membership search.
#[derive(Clone, Debug)]
pub struct SearchReport {
    /// Largest number of nodes simultaneously on the frontier.
    pub peak_frontier: usize,
    /// Distinct states ever enqueued.
    pub states_visited: usize,
    /// Per-filter discard counts, in reporting order.
    pub prune_counts: Vec<(&'static str, u64)>,
    pub outcome: Outcome,
}

struct SearchNode {
    word: Word,
    upper_len: usize,
    lower_len: usize,
    /// Sum of minimal yields over the word's nonterminals.
    nt_weight: i64,
    parent: Option<usize>,
    priority: i64,
}

fn report(outcome: Outcome, peak: usize, states: usize, counts: &[u64]) -> SearchReport {
    SearchReport {
        peak_frontier: peak,
        states_visited: states,
        prune_counts: PruneFilter::ALL
            .iter()
            .map(|&f| (f.name(), counts[f as usize]))
            .collect(),
        outcome,
    }
}

impl Grammar {
    /// Decide membership of `goal` by best-first search.
    ///
    /// Only the leftmost nonterminal of a word is ever rewritten; children
    /// are deduplicated by the fingerprint of their printed form. The
    /// query gives up with [`Outcome::Unknown`] once the grammar's time
    /// budget is spent.
    pub fn search(&self, goal: &str) -> SearchReport {
        let goal_chars: Vec<char> = goal.chars().collect();
        let goal = Goal {
            text: goal,
            chars: &goal_chars,
        };
        let mut counts = [0u64; PruneFilter::ALL.len()];

        let root_word = Word::new(vec![Letter::NonTerm(self.start.clone())]);
        let root = SearchNode {
            priority: self.precedence().score(&root_word, goal.chars, self),
            upper_len: 0,
            lower_len: 0,
            nt_weight: self.min_yield(&self.start) as i64,
            parent: None,
            word: root_word,
        };

        let mut seen: FxHashSet<u64> = FxHashSet::default();
        seen.insert(root.word.fingerprint());

        let mut arena: Vec<SearchNode> = Vec::new();
        let mut frontier: PriorityQueue<usize, Reverse<i64>> = PriorityQueue::new();
        frontier.push(0, Reverse(root.priority));
        arena.push(root);
        let mut peak = 1usize;

        let start_time = Instant::now();

        while let Some((current, _)) = frontier.pop() {
            if start_time.elapsed() > self.time_limit() {
                return report(Outcome::Unknown, peak, seen.len(), &counts);
            }

            // Expand the leftmost nonterminal; fully-terminal words that
            // were not accepting when enqueued are dead ends.
            let Some((position, lhs)) = arena[current].word.leftmost_nonterm() else {
                continue;
            };
            let lhs = lhs.clone();
            let parent_word = arena[current].word.clone();
            let upper_len = arena[current].upper_len;
            let lower_len = arena[current].lower_len;
            let nt_weight = arena[current].nt_weight;

            for rule in self.rules_for(&lhs) {
                let word = apply_rule(&parent_word, position, rule.rhs());
                let cand = Candidate {
                    word: &word,
                    upper_len: upper_len + rule.upper_len(),
                    lower_len: lower_len + rule.lower_len(),
                    nt_weight: nt_weight + rule.nt_weight(),
                };

                let mut pruned = false;
                for filter in PruneFilter::ALL {
                    if self.is_pruning_enabled(filter) && !filter.admits(&cand, &goal, self) {
                        counts[filter as usize] += 1;
                        debug!("pruned by {}: {}", filter.name(), word);
                        pruned = true;
                        break;
                    }
                }
                if pruned {
                    continue;
                }

                if self.is_accepting(&word, goal.chars) {
                    if log::log_enabled!(log::Level::Debug) {
                        debug!(" >>> {}", word);
                        let mut cursor = Some(current);
                        while let Some(idx) = cursor {
                            debug!(" >>> {}", arena[idx].word);
                            cursor = arena[idx].parent;
                        }
                    }
                    return report(Outcome::Accept, peak, seen.len(), &counts);
                }

                if !seen.insert(word.fingerprint()) {
                    continue;
                }

                let node = SearchNode {
                    priority: self.precedence().score(&word, goal.chars, self),
                    upper_len: cand.upper_len,
                    lower_len: cand.lower_len,
                    nt_weight: cand.nt_weight,
                    parent: Some(current),
                    word,
                };
                let idx = arena.len();
                frontier.push(idx, Reverse(node.priority));
                arena.push(node);
                peak = peak.max(frontier.len());
            }
        }

        report(Outcome::Reject, peak, seen.len(), &counts)
    }

    /// A word is accepting when it is a single segment whose strands both
    /// have the goal's length, whose aligned columns are all in the
    /// relation, and whose upper strand spells the goal.
    fn is_accepting(&self, word: &Word, goal: &[char]) -> bool {
        let [Letter::Seg(seg)] = word.letters() else {
            return false;
        };
        seg.upper.len() == seg.lower.len()
            && seg.upper.len() == goal.len()
            && seg
                .upper
                .iter()
                .zip(&seg.lower)
                .all(|(&u, &l)| self.relation_contains(u, l))
            && seg.upper.as_slice() == goal
    }
}
