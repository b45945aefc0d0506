//! Dynamic-programming recognizer over a normal-form grammar (WK-CYK).
//!
//! The table maps a four-index span — a range on the upper strand
//! combined with a range on the lower strand, `(0, 0)` meaning "no
//! contribution from that strand" — to the nonterminals that generate
//! exactly that span. Spans are filled in order of increasing combined
//! length; the start symbol covering both full strands means acceptance.

use crate::grammar::{Grammar, Outcome};
use crate::rule::Rule;
use crate::word::{Letter, NonTerm};
use rustc_hash::{FxHashMap, FxHashSet};
use std::time::Instant;

/// Strand position, 1-based; 0 marks an untouched strand.
type Pos = u16;

/// Upper span `[i..j]` combined with lower span `[k..l]`.
type Span = (Pos, Pos, Pos, Pos);

fn span(i: usize, j: usize, k: usize, l: usize) -> Span {
    (i as Pos, j as Pos, k as Pos, l as Pos)
}

/// Nonterminal sets indexed by span.
#[derive(Default)]
struct SpanTable {
    sets: FxHashMap<Span, FxHashSet<NonTerm>>,
}

impl SpanTable {
    fn add(&mut self, span: Span, nt: NonTerm) {
        self.sets.entry(span).or_default().insert(nt);
    }

    fn get(&self, span: Span) -> Option<&FxHashSet<NonTerm>> {
        self.sets.get(&span)
    }

    /// Record every binary rule whose right-hand nonterminals cover the
    /// two sub-spans.
    fn combine(&mut self, binary: &[(NonTerm, NonTerm, NonTerm)], a: Span, b: Span, target: Span) {
        let found: Vec<NonTerm> = {
            let (Some(left), Some(right)) = (self.get(a), self.get(b)) else {
                return;
            };
            binary
                .iter()
                .filter(|(_, first, second)| left.contains(first) && right.contains(second))
                .map(|(lhs, _, _)| lhs.clone())
                .collect()
        };
        for nt in found {
            self.add(target, nt);
        }
    }

    /// Fill one target span from every admissible split into two
    /// sub-spans.
    fn compute_set(
        &mut self,
        binary: &[(NonTerm, NonTerm, NonTerm)],
        (i, j, k, l): (usize, usize, usize, usize),
    ) {
        let target = span(i, j, k, l);

        if i == 0 && j == 0 {
            // Lower strand only.
            for t in k..l {
                self.combine(binary, span(0, 0, k, t), span(0, 0, t + 1, l), target);
            }
        } else if k == 0 && l == 0 {
            // Upper strand only.
            for s in i..j {
                self.combine(binary, span(i, s, 0, 0), span(s + 1, j, 0, 0), target);
            }
        } else {
            // Both strands: one side takes the whole upper and the other
            // the whole lower, in either order ...
            self.combine(binary, span(i, j, 0, 0), span(0, 0, k, l), target);
            self.combine(binary, span(0, 0, k, l), span(i, j, 0, 0), target);

            // ... or both sides mix, with independent split points ...
            for s in i..j {
                for t in k..l {
                    self.combine(binary, span(i, s, k, t), span(s + 1, j, t + 1, l), target);
                }
            }

            // ... or one side carries the full lower strand and part of
            // the upper ...
            for s in i..j {
                self.combine(binary, span(i, s, k, l), span(s + 1, j, 0, 0), target);
                self.combine(binary, span(i, s, 0, 0), span(s + 1, j, k, l), target);
            }

            // ... or the full upper strand and part of the lower.
            for t in k..l {
                self.combine(binary, span(i, j, k, t), span(0, 0, t + 1, l), target);
                self.combine(binary, span(0, 0, k, t), span(i, j, t + 1, l), target);
            }
        }
    }
}

impl Grammar {
    /// Decide membership of `goal` bottom-up over spans.
    ///
    /// The grammar must already be in normal form (see
    /// [`Grammar::to_normal_form`]). Returns [`Outcome::Unknown`] when the
    /// time budget runs out mid-table.
    pub fn recognize(&self, goal: &str) -> Outcome {
        debug_assert!(
            self.rules.iter().all(Rule::is_normal_form),
            "recognize requires a normal-form grammar"
        );

        let start_time = Instant::now();
        let goal: Vec<char> = goal.chars().collect();
        let n = goal.len();

        let binary: Vec<(NonTerm, NonTerm, NonTerm)> = self
            .rules
            .iter()
            .filter_map(|rule| match rule.rhs().letters() {
                [Letter::NonTerm(a), Letter::NonTerm(b)] => {
                    Some((rule.lhs.clone(), a.clone(), b.clone()))
                }
                _ => None,
            })
            .collect();

        let mut table = SpanTable::default();

        // Base case: single-terminal rules cover one position of one
        // strand.
        for (pos, &c) in goal.iter().enumerate() {
            for rule in &self.rules {
                let [Letter::Seg(seg)] = rule.rhs().letters() else {
                    continue;
                };
                if seg.upper.len() == 1 && seg.upper[0] == c {
                    table.add(span(pos + 1, pos + 1, 0, 0), rule.lhs.clone());
                } else if seg.lower.len() == 1 && seg.lower[0] == c {
                    table.add(span(0, 0, pos + 1, pos + 1), rule.lhs.clone());
                }
            }
        }

        // Induction on the combined span length.
        for y in 2..=2 * n {
            if start_time.elapsed() > self.time_limit() {
                return Outcome::Unknown;
            }

            for beta in y.saturating_sub(n)..=n.min(y) {
                let alpha = y - beta;

                if alpha == 0 {
                    for k in 1..=n - y + 1 {
                        table.compute_set(&binary, (0, 0, k, k + y - 1));
                    }
                } else if beta == 0 {
                    for i in 1..=n - y + 1 {
                        table.compute_set(&binary, (i, i + y - 1, 0, 0));
                    }
                } else {
                    for i in 1..=n - alpha + 1 {
                        for k in 1..=n - beta + 1 {
                            table.compute_set(&binary, (i, i + alpha - 1, k, k + beta - 1));
                        }
                    }
                }
            }
        }

        let full = span(1, n, 1, n);
        match table.get(full) {
            Some(set) if set.contains(&self.start) => Outcome::Accept,
            _ => Outcome::Reject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::{nt, seg};
    use std::time::Duration;

    fn normalized_anbn() -> Grammar {
        let mut g = crate::search::tests::anbn();
        g.to_normal_form();
        g
    }

    #[test]
    fn test_recognize_members() {
        let g = normalized_anbn();
        assert_eq!(g.recognize("ab"), Outcome::Accept);
        assert_eq!(g.recognize("aabb"), Outcome::Accept);
        assert_eq!(g.recognize("aaabbb"), Outcome::Accept);
    }

    #[test]
    fn test_recognize_non_members() {
        let g = normalized_anbn();
        assert_eq!(g.recognize("aabbb"), Outcome::Reject);
        assert_eq!(g.recognize("aaabb"), Outcome::Reject);
        assert_eq!(g.recognize("ba"), Outcome::Reject);
        assert_eq!(g.recognize(""), Outcome::Reject);
    }

    #[test]
    fn test_recognize_agrees_with_search() {
        let g = normalized_anbn();
        for input in ["ab", "aabb", "aaabbb", "a", "b", "abb", "aab", "abab"] {
            let searched = g.search(input).outcome;
            let recognized = g.recognize(input);
            assert_ne!(searched, Outcome::Unknown);
            assert_ne!(recognized, Outcome::Unknown);
            assert_eq!(searched, recognized, "disagreement on {:?}", input);
        }
    }

    #[test]
    fn test_recognize_with_exhausted_budget_is_unknown() {
        let mut g = normalized_anbn();
        g.set_time_limit(Duration::ZERO);
        assert_eq!(g.recognize("aabb"), Outcome::Unknown);
    }

    #[test]
    fn test_recognize_odd_length_language() {
        // a(aa)*: S -> S S S | a/a, already almost normal form.
        let mut g = Grammar::new(
            vec!["S"],
            vec!['a'],
            "S",
            vec![
                Rule::new("S", vec![nt("S"), nt("S"), nt("S")]),
                Rule::new("S", vec![seg("a", "a")]),
            ],
            vec![('a', 'a')],
        )
        .unwrap();
        g.to_normal_form();

        assert_eq!(g.recognize("a"), Outcome::Accept);
        assert_eq!(g.recognize("aaa"), Outcome::Accept);
        assert_eq!(g.recognize("aaaaa"), Outcome::Accept);
        assert_eq!(g.recognize("aa"), Outcome::Reject);
        assert_eq!(g.recognize("aaaa"), Outcome::Reject);
    }
}
