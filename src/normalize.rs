//! Transformation of a grammar into binary normal form.
//!
//! The pipeline rewrites the rule set in place through ordered passes;
//! each pass shrinks or replaces structure and triggers a full rebuild of
//! the grammar's derived tables. None of the passes can fail on a
//! consistent grammar — a malformed rule reaching a late pass is a
//! contract violation of the earlier ones.

use crate::grammar::Grammar;
use crate::rule::Rule;
use crate::word::{Letter, NonTerm, Segment};
use rustc_hash::{FxHashMap, FxHashSet};

/// Split a single terminal off the front of the longer run.
fn pop_terminal(seg: &mut Segment) -> Segment {
    if seg.upper.len() > seg.lower.len() {
        let t = seg.upper.remove(0);
        Segment::new(vec![t], vec![])
    } else {
        let t = seg.lower.remove(0);
        Segment::new(vec![], vec![t])
    }
}

/// Collects rules while dropping duplicates.
#[derive(Default)]
struct RuleSet {
    rules: Vec<Rule>,
    seen: FxHashSet<Rule>,
}

impl RuleSet {
    fn add(&mut self, rule: Rule) {
        if self.seen.insert(rule.clone()) {
            self.rules.push(rule);
        }
    }
}

impl Grammar {
    /// Drop lambda rules by enumerating, for every rule, each subset of
    /// its erasable-nonterminal occurrences and keeping the non-empty
    /// variants.
    pub fn remove_lambda_rules(&mut self) {
        let erasable = self.erasable().clone();
        let mut out = RuleSet::default();

        for rule in &self.rules {
            let erasable_idxs: Vec<usize> = rule
                .rhs()
                .iter()
                .enumerate()
                .filter(|(_, letter)| {
                    letter.as_nonterm().map_or(false, |n| erasable.contains(n))
                })
                .map(|(idx, _)| idx)
                .collect();
            debug_assert!(erasable_idxs.len() < u64::BITS as usize);

            for mask in 0..(1u64 << erasable_idxs.len()) {
                let kept: Vec<Letter> = rule
                    .rhs()
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| {
                        match erasable_idxs.iter().position(|e| e == idx) {
                            Some(bit) => (mask >> bit) & 1 == 1,
                            None => true,
                        }
                    })
                    .map(|(_, letter)| letter.clone())
                    .collect();

                let candidate = Rule::new(rule.lhs.clone(), kept);
                let rhs = candidate.rhs();
                let vanished = rhs.is_empty()
                    || matches!(rhs.letters(), [Letter::Seg(s)] if s.is_empty());
                if !vanished {
                    out.add(candidate);
                }
            }
        }

        self.rules = out.rules;
        self.recompute();
    }

    /// Drop unit rules, replaying every non-unit rule under each
    /// nonterminal that can reach its left-hand side through a chain of
    /// unit rules.
    pub fn remove_unit_rules(&mut self) {
        // reach[k]: nonterminals k rewrites into via unit chains,
        // reflexively including k itself.
        let mut reach: FxHashMap<NonTerm, FxHashSet<NonTerm>> = self
            .nonterminals
            .iter()
            .map(|n| (n.clone(), std::iter::once(n.clone()).collect()))
            .collect();

        let mut changed = true;
        while changed {
            changed = false;
            for rule in &self.rules {
                if !rule.is_unit() {
                    continue;
                }
                let Letter::NonTerm(target) = &rule.rhs()[0] else {
                    unreachable!("unit rule with non-nonterminal rhs");
                };
                for set in reach.values_mut() {
                    if set.contains(&rule.lhs) && !set.contains(target) {
                        set.insert(target.clone());
                        changed = true;
                    }
                }
            }
        }

        let mut out = RuleSet::default();
        for rule in &self.rules {
            if rule.is_unit() {
                continue;
            }
            for (origin, reached) in &reach {
                if reached.contains(&rule.lhs) {
                    out.add(Rule::new(origin.clone(), rule.rhs().letters().to_vec()));
                }
            }
        }

        self.rules = out.rules;
        self.recompute();
    }

    /// Drop nonterminals (and their rules) from which no fully-terminal
    /// word is derivable.
    pub fn remove_unterminatable_symbols(&mut self) {
        let mut terminating: FxHashSet<NonTerm> = FxHashSet::default();
        let mut changed = true;
        while changed {
            changed = false;
            for rule in &self.rules {
                if terminating.contains(&rule.lhs) {
                    continue;
                }
                let ok = rule
                    .rhs()
                    .iter()
                    .filter_map(Letter::as_nonterm)
                    .all(|n| terminating.contains(n));
                if ok {
                    terminating.insert(rule.lhs.clone());
                    changed = true;
                }
            }
        }

        self.rules.retain(|rule| {
            terminating.contains(&rule.lhs)
                && rule
                    .rhs()
                    .iter()
                    .filter_map(Letter::as_nonterm)
                    .all(|n| terminating.contains(n))
        });
        self.nonterminals.retain(|n| terminating.contains(n));
        self.recompute();
    }

    /// Drop symbols the start symbol cannot reach through rule
    /// right-hand sides.
    pub fn remove_unreachable_symbols(&mut self) {
        let mut reachable_nts: FxHashSet<NonTerm> =
            std::iter::once(self.start.clone()).collect();
        let mut reachable_ts: FxHashSet<char> = FxHashSet::default();

        let mut changed = true;
        while changed {
            changed = false;
            for rule in &self.rules {
                if !reachable_nts.contains(&rule.lhs) {
                    continue;
                }
                for letter in rule.rhs() {
                    match letter {
                        Letter::NonTerm(n) => {
                            if !reachable_nts.contains(n) {
                                reachable_nts.insert(n.clone());
                                changed = true;
                            }
                        }
                        Letter::Seg(seg) => {
                            for &t in seg.upper.iter().chain(&seg.lower) {
                                if reachable_ts.insert(t) {
                                    changed = true;
                                }
                            }
                        }
                    }
                }
            }
        }

        self.rules.retain(|rule| {
            reachable_nts.contains(&rule.lhs)
                && rule
                    .rhs()
                    .iter()
                    .filter_map(Letter::as_nonterm)
                    .all(|n| reachable_nts.contains(n))
        });
        self.nonterminals.retain(|n| reachable_nts.contains(n));
        self.terminals.retain(|t| reachable_ts.contains(t));
        self.recompute();
    }

    /// Break multi-terminal segments apart: every segment letter ends up
    /// holding exactly one terminal, with fresh nonterminals chaining the
    /// popped-off rest.
    pub fn dismantle_terminal_segments(&mut self) {
        let rules = std::mem::take(&mut self.rules);
        let mut out = RuleSet::default();

        for rule in rules {
            if matches!(rule.rhs().letters(), [Letter::Seg(s)] if s.len() == 1) {
                out.add(rule);
                continue;
            }

            let mut letters = rule.rhs().letters().to_vec();
            if let [Letter::Seg(first_seg)] = letters.as_slice() {
                // A lone multi-terminal segment: splitting off the first
                // terminal avoids creating a unit rule.
                let mut seg = first_seg.clone();
                let head = self.fresh_nonterm();
                let popped = pop_terminal(&mut seg);
                letters = vec![Letter::Seg(popped), Letter::NonTerm(head.clone())];
                self.chain_segment(seg, head, &mut out);
            } else {
                for idx in 0..letters.len() {
                    if let Letter::Seg(seg) = &letters[idx] {
                        let seg = seg.clone();
                        let head = self.fresh_nonterm();
                        letters[idx] = Letter::NonTerm(head.clone());
                        self.chain_segment(seg, head, &mut out);
                    }
                }
            }
            out.add(Rule::new(rule.lhs.clone(), letters));
        }

        self.rules = out.rules;
        self.recompute();
    }

    /// Emit `head -> t1 N -> t2 N' -> ...` rules popping one terminal of
    /// `seg` at a time.
    fn chain_segment(&mut self, mut seg: Segment, head: NonTerm, out: &mut RuleSet) {
        let mut current = head;
        while seg.len() > 1 {
            let popped = pop_terminal(&mut seg);
            let next = self.fresh_nonterm();
            out.add(Rule::new(
                current,
                vec![Letter::Seg(popped), Letter::NonTerm(next.clone())],
            ));
            current = next;
        }
        out.add(Rule::new(current, vec![Letter::Seg(seg)]));
    }

    /// Finish the shape: replace remaining segment letters by fresh
    /// nonterminals and right-fold long rules into binary chains.
    pub fn binarize(&mut self) {
        let rules = std::mem::take(&mut self.rules);
        let mut out = RuleSet::default();

        for rule in rules {
            let keep = matches!(rule.rhs().letters(), [Letter::Seg(_)])
                || matches!(
                    rule.rhs().letters(),
                    [Letter::NonTerm(_), Letter::NonTerm(_)]
                );
            if keep {
                out.add(rule);
                continue;
            }
            // Unit rules cannot reach this pass; the earlier passes own
            // that precondition.
            debug_assert!(rule.rhs().len() >= 2, "unexpected rule shape: {}", rule);
            if rule.rhs().len() < 2 {
                continue;
            }

            let mut letters = rule.rhs().letters().to_vec();
            for slot in letters.iter_mut() {
                if let Letter::Seg(seg) = slot {
                    let fresh = self.fresh_nonterm();
                    out.add(Rule::new(fresh.clone(), vec![Letter::Seg(seg.clone())]));
                    *slot = Letter::NonTerm(fresh);
                }
            }

            let mut current = rule.lhs.clone();
            while letters.len() > 2 {
                let head = letters.remove(0);
                let next = self.fresh_nonterm();
                out.add(Rule::new(current, vec![head, Letter::NonTerm(next.clone())]));
                current = next;
            }
            out.add(Rule::new(current, letters));
        }

        self.rules = out.rules;
        self.recompute();
    }

    /// Run the full pipeline; afterwards every rule is either a single
    /// segment of combined length one or exactly two nonterminals.
    pub fn to_normal_form(&mut self) {
        self.remove_lambda_rules();
        self.remove_unit_rules();
        self.remove_unterminatable_symbols();
        self.remove_unreachable_symbols();
        self.dismantle_terminal_segments();
        self.binarize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Outcome;
    use crate::word::{nt, seg};

    fn rule_strings(g: &Grammar) -> Vec<String> {
        let mut out: Vec<String> = g.rules().iter().map(Rule::to_string).collect();
        out.sort();
        out
    }

    #[test]
    fn test_remove_lambda_rules_enumerates_subsets() {
        let mut g = Grammar::new(
            vec!["S", "A"],
            vec!['a'],
            "S",
            vec![
                Rule::new("S", vec![nt("A"), seg("a", "a"), nt("A")]),
                Rule::new("A", vec![seg("", "")]),
                Rule::new("A", vec![seg("a", "a")]),
            ],
            vec![('a', 'a')],
        )
        .unwrap();
        g.remove_lambda_rules();

        let rules = rule_strings(&g);
        assert!(rules.contains(&"S -> A a/a A".to_string()));
        assert!(rules.contains(&"S -> A a/a".to_string()));
        assert!(rules.contains(&"S -> a/a A".to_string()));
        assert!(rules.contains(&"S -> a/a".to_string()));
        // The lambda rule itself is gone.
        assert!(!rules.iter().any(|r| r.contains("λ/λ")));
    }

    #[test]
    fn test_remove_unit_rules_replays_reached_rules() {
        let mut g = Grammar::new(
            vec!["S", "A", "B"],
            vec!['a'],
            "S",
            vec![
                Rule::new("S", vec![nt("A")]),
                Rule::new("A", vec![nt("B")]),
                Rule::new("B", vec![seg("a", "a")]),
            ],
            vec![('a', 'a')],
        )
        .unwrap();
        g.remove_unit_rules();

        let rules = rule_strings(&g);
        assert_eq!(
            rules,
            vec![
                "A -> a/a".to_string(),
                "B -> a/a".to_string(),
                "S -> a/a".to_string(),
            ]
        );
    }

    #[test]
    fn test_remove_unterminatable_symbols() {
        let mut g = Grammar::new(
            vec!["S", "A", "L"],
            vec!['a'],
            "S",
            vec![
                Rule::new("S", vec![seg("a", "a")]),
                Rule::new("S", vec![nt("L")]),
                Rule::new("L", vec![nt("L")]),
                Rule::new("A", vec![seg("a", "a")]),
            ],
            vec![('a', 'a')],
        )
        .unwrap();
        g.remove_unterminatable_symbols();

        assert!(!g.nonterminals().contains("L"));
        assert!(g.nonterminals().contains("A"));
        assert!(!rule_strings(&g).iter().any(|r| r.contains('L')));
    }

    #[test]
    fn test_remove_unreachable_symbols() {
        let mut g = Grammar::new(
            vec!["S", "A", "X"],
            vec!['a', 'x'],
            "S",
            vec![
                Rule::new("S", vec![seg("a", "a"), nt("A")]),
                Rule::new("A", vec![seg("a", "a")]),
                Rule::new("X", vec![seg("x", "x")]),
            ],
            vec![('a', 'a'), ('x', 'x')],
        )
        .unwrap();
        g.remove_unreachable_symbols();

        assert!(!g.nonterminals().contains("X"));
        assert!(!g.terminals().contains(&'x'));
        assert_eq!(g.rules().len(), 2);
    }

    #[test]
    fn test_dismantle_leaves_single_terminal_segments() {
        let mut g = Grammar::new(
            vec!["S"],
            vec!['a', 'b'],
            "S",
            vec![Rule::new("S", vec![seg("ab", "ab")])],
            vec![('a', 'a'), ('b', 'b')],
        )
        .unwrap();
        g.dismantle_terminal_segments();

        for rule in g.rules() {
            for letter in rule.rhs() {
                if let Letter::Seg(s) = letter {
                    assert_eq!(s.len(), 1, "oversized segment in {}", rule);
                }
            }
        }
        // Terminals pop off the front of the longer run, lower strand
        // first on ties.
        assert_eq!(
            rule_strings(&g),
            vec![
                "N1 -> a/λ N2".to_string(),
                "N2 -> λ/b N3".to_string(),
                "N3 -> b/λ".to_string(),
                "S -> λ/a N1".to_string(),
            ]
        );
    }

    #[test]
    fn test_to_normal_form_shapes_every_rule() {
        let mut g = crate::search::tests::anbn();
        g.to_normal_form();
        assert!(!g.rules().is_empty());
        for rule in g.rules() {
            assert!(rule.is_normal_form(), "not normal form: {}", rule);
        }
    }

    #[test]
    fn test_normalization_preserves_language() {
        let inputs = ["ab", "aabb", "aaabbb", "", "a", "ba", "aab", "abb"];
        let before = crate::search::tests::anbn();
        let mut after = crate::search::tests::anbn();
        after.to_normal_form();

        for input in inputs {
            let expected = before.search(input).outcome;
            let got = after.search(input).outcome;
            assert_ne!(expected, Outcome::Unknown);
            assert_eq!(expected, got, "membership of {:?} changed", input);
        }
    }

    #[test]
    fn test_normal_form_of_triple_rule() {
        // S -> S S S needs one fresh nonterminal for the right fold.
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
        for rule in g.rules() {
            assert!(rule.is_normal_form(), "not normal form: {}", rule);
        }
        assert!(g.nonterminals().len() > 1);
    }
}
