//! The Watson-Crick context-free grammar.
//!
//! A grammar owns its symbol sets, rules and complementarity relation,
//! plus derived tables (rule index, erasable set, minimal distances and
//! yields) that are rebuilt wholesale after construction and after every
//! transformation pass — never patched incrementally.

use crate::analysis::{self, MAX_DISTANCE, MAX_YIELD};
use crate::heuristics::{Precedence, PruneFilter};
use crate::rule::Rule;
use crate::word::{Letter, NonTerm};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Per-query time budget applied when none is configured.
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(10);

/// Result of a membership query. `Unknown` means the time budget ran out
/// before an answer was reached; it is an ordinary outcome, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Accept,
    Reject,
    Unknown,
}

/// A structural invariant violated at grammar construction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("start symbol {0} is not a declared nonterminal")]
    StartSymbol(String),
    #[error("symbol {0} is declared both as a terminal and a nonterminal")]
    SymbolOverlap(char),
    #[error("rule `{rule}` uses undeclared nonterminal {symbol}")]
    UndeclaredNonterminal { rule: String, symbol: String },
    #[error("rule `{rule}` uses undeclared terminal {symbol}")]
    UndeclaredTerminal { rule: String, symbol: char },
    #[error("relation pair ({0}, {1}) uses an undeclared terminal")]
    UndeclaredRelationTerminal(char, char),
}

/// A heuristic-configuration call named something the grammar does not
/// know. Grammar state is unchanged when this is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HeuristicError {
    #[error("unknown heuristic: \"{0}\"")]
    Unknown(String),
}

/// Value copy of a grammar's defining sets, taken before an exploratory
/// transformation and handed back to [`Grammar::restore`].
#[derive(Clone, Debug)]
pub struct GrammarSnapshot {
    rules: Vec<Rule>,
    nonterminals: FxHashSet<NonTerm>,
    terminals: FxHashSet<char>,
}

/// A Watson-Crick context-free grammar.
#[derive(Debug)]
pub struct Grammar {
    pub(crate) nonterminals: FxHashSet<NonTerm>,
    pub(crate) terminals: FxHashSet<char>,
    pub(crate) start: NonTerm,
    pub(crate) rules: Vec<Rule>,
    pub(crate) relation: FxHashSet<(char, char)>,

    // Derived, rebuilt by `recompute`.
    rules_by_lhs: FxHashMap<NonTerm, Vec<usize>>,
    pairs_following: FxHashMap<char, Vec<char>>,
    erasable: FxHashSet<NonTerm>,
    min_distance: FxHashMap<NonTerm, u32>,
    min_yield: FxHashMap<NonTerm, u32>,

    pub(crate) fresh_counter: usize,
    time_limit: Duration,
    precedence: Precedence,
    pruning_enabled: [bool; PruneFilter::ALL.len()],
}

impl Grammar {
    /// Build and validate a grammar. Duplicate rules are dropped, keeping
    /// the first occurrence.
    pub fn new<N, S, T, R>(
        nonterminals: N,
        terminals: T,
        start: S,
        rules: Vec<Rule>,
        relation: R,
    ) -> Result<Self, ConsistencyError>
    where
        N: IntoIterator,
        N::Item: Into<NonTerm>,
        S: Into<NonTerm>,
        T: IntoIterator<Item = char>,
        R: IntoIterator<Item = (char, char)>,
    {
        let nonterminals: FxHashSet<NonTerm> =
            nonterminals.into_iter().map(Into::into).collect();
        let terminals: FxHashSet<char> = terminals.into_iter().collect();
        let start = start.into();
        let relation: FxHashSet<(char, char)> = relation.into_iter().collect();

        let mut seen = FxHashSet::default();
        let rules: Vec<Rule> = rules
            .into_iter()
            .filter(|rule| seen.insert(rule.clone()))
            .collect();

        let mut grammar = Grammar {
            nonterminals,
            terminals,
            start,
            rules,
            relation,
            rules_by_lhs: FxHashMap::default(),
            pairs_following: FxHashMap::default(),
            erasable: FxHashSet::default(),
            min_distance: FxHashMap::default(),
            min_yield: FxHashMap::default(),
            fresh_counter: 0,
            time_limit: DEFAULT_TIME_LIMIT,
            precedence: Precedence::default(),
            pruning_enabled: [true; PruneFilter::ALL.len()],
        };
        grammar.validate()?;
        grammar.recompute();
        Ok(grammar)
    }

    fn validate(&self) -> Result<(), ConsistencyError> {
        if !self.nonterminals.contains(&self.start) {
            return Err(ConsistencyError::StartSymbol(self.start.to_string()));
        }

        for &t in &self.terminals {
            if self.nonterminals.contains(t.to_string().as_str()) {
                return Err(ConsistencyError::SymbolOverlap(t));
            }
        }

        for rule in &self.rules {
            if !self.nonterminals.contains(&rule.lhs) {
                return Err(ConsistencyError::UndeclaredNonterminal {
                    rule: rule.to_string(),
                    symbol: rule.lhs.to_string(),
                });
            }
            for letter in rule.rhs() {
                match letter {
                    Letter::NonTerm(n) => {
                        if !self.nonterminals.contains(n) {
                            return Err(ConsistencyError::UndeclaredNonterminal {
                                rule: rule.to_string(),
                                symbol: n.to_string(),
                            });
                        }
                    }
                    Letter::Seg(seg) => {
                        for &t in seg.upper.iter().chain(&seg.lower) {
                            if !self.terminals.contains(&t) {
                                return Err(ConsistencyError::UndeclaredTerminal {
                                    rule: rule.to_string(),
                                    symbol: t,
                                });
                            }
                        }
                    }
                }
            }
        }

        for &(a, b) in &self.relation {
            if !self.terminals.contains(&a) || !self.terminals.contains(&b) {
                return Err(ConsistencyError::UndeclaredRelationTerminal(a, b));
            }
        }

        Ok(())
    }

    /// Rebuild every derived table from the defining sets.
    pub(crate) fn recompute(&mut self) {
        self.rules_by_lhs.clear();
        for (idx, rule) in self.rules.iter().enumerate() {
            self.rules_by_lhs
                .entry(rule.lhs.clone())
                .or_default()
                .push(idx);
        }

        self.pairs_following.clear();
        for &(a, b) in &self.relation {
            self.pairs_following.entry(a).or_default().push(b);
        }

        self.erasable = analysis::find_erasable(&self.rules);
        self.min_distance = analysis::min_distances(&self.rules, &self.nonterminals);
        self.min_yield = analysis::min_yields(&self.rules, &self.nonterminals);

        let weights: Vec<i64> = self
            .rules
            .iter()
            .map(|rule| {
                let rhs: i64 = rule
                    .rhs()
                    .iter()
                    .filter_map(Letter::as_nonterm)
                    .map(|n| self.min_yield(n) as i64)
                    .sum();
                rhs - self.min_yield(&rule.lhs) as i64
            })
            .collect();
        for (rule, weight) in self.rules.iter_mut().zip(weights) {
            rule.set_nt_weight(weight);
        }
    }

    pub fn start(&self) -> &NonTerm {
        &self.start
    }

    pub fn nonterminals(&self) -> &FxHashSet<NonTerm> {
        &self.nonterminals
    }

    pub fn terminals(&self) -> &FxHashSet<char> {
        &self.terminals
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules whose left-hand side is `nt`.
    pub fn rules_for(&self, nt: &str) -> impl Iterator<Item = &Rule> {
        self.rules_by_lhs
            .get(nt)
            .into_iter()
            .flatten()
            .map(|&idx| &self.rules[idx])
    }

    pub fn relation_contains(&self, upper: char, lower: char) -> bool {
        self.relation.contains(&(upper, lower))
    }

    /// Lower-strand terminals that may pair with `upper`.
    pub fn pairs_following(&self, upper: char) -> &[char] {
        self.pairs_following
            .get(&upper)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Nonterminals from which the empty double-stranded word is
    /// derivable.
    pub fn erasable(&self) -> &FxHashSet<NonTerm> {
        &self.erasable
    }

    /// Minimum rule applications from `nt` to a fully-terminal word,
    /// saturated at [`MAX_DISTANCE`].
    pub fn min_distance(&self, nt: &str) -> u32 {
        self.min_distance.get(nt).copied().unwrap_or(MAX_DISTANCE)
    }

    /// Minimum combined terminal count derivable from `nt`, saturated at
    /// [`MAX_YIELD`].
    pub fn min_yield(&self, nt: &str) -> u32 {
        self.min_yield.get(nt).copied().unwrap_or(MAX_YIELD)
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    /// Set the per-query wall-clock budget for `search` and `recognize`.
    pub fn set_time_limit(&mut self, limit: Duration) {
        self.time_limit = limit;
    }

    /// Take a value copy of the defining sets for a later [`restore`].
    ///
    /// [`restore`]: Grammar::restore
    pub fn snapshot(&self) -> GrammarSnapshot {
        GrammarSnapshot {
            rules: self.rules.clone(),
            nonterminals: self.nonterminals.clone(),
            terminals: self.terminals.clone(),
        }
    }

    /// Replace the defining sets with a snapshot and rebuild the derived
    /// tables.
    pub fn restore(&mut self, snapshot: GrammarSnapshot) {
        self.rules = snapshot.rules;
        self.nonterminals = snapshot.nonterminals;
        self.terminals = snapshot.terminals;
        self.recompute();
    }

    /// Mint a nonterminal name unused by the current grammar and declare
    /// it.
    pub(crate) fn fresh_nonterm(&mut self) -> NonTerm {
        loop {
            self.fresh_counter += 1;
            let name = format!("N{}", self.fresh_counter);
            if !self.nonterminals.contains(name.as_str()) {
                let fresh = NonTerm::from(name);
                self.nonterminals.insert(fresh.clone());
                return fresh;
            }
        }
    }

    /// The active node-precedence heuristic.
    pub fn precedence(&self) -> Precedence {
        self.precedence
    }

    /// Activate the node-precedence heuristic with the given name.
    pub fn set_precedence(&mut self, name: &str) -> Result<(), HeuristicError> {
        match Precedence::from_name(name) {
            Some(p) => {
                self.precedence = p;
                Ok(())
            }
            None => Err(HeuristicError::Unknown(name.to_string())),
        }
    }

    pub fn is_pruning_enabled(&self, filter: PruneFilter) -> bool {
        self.pruning_enabled[filter as usize]
    }

    /// Enable or disable the pruning filter with the given name.
    pub fn set_pruning(&mut self, name: &str, enabled: bool) -> Result<(), HeuristicError> {
        match PruneFilter::from_name(name) {
            Some(f) => {
                self.pruning_enabled[f as usize] = enabled;
                Ok(())
            }
            None => Err(HeuristicError::Unknown(name.to_string())),
        }
    }

    /// Names of the node-precedence heuristics, in selection order.
    pub fn precedence_names() -> Vec<&'static str> {
        Precedence::ALL.iter().map(|p| p.name()).collect()
    }

    /// Names of the pruning filters, in reporting order.
    pub fn pruning_names() -> Vec<&'static str> {
        PruneFilter::ALL.iter().map(|f| f.name()).collect()
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::{nt, seg};

    fn sample() -> Grammar {
        Grammar::new(
            vec!["S", "A"],
            vec!['a', 'b'],
            "S",
            vec![
                Rule::new("S", vec![seg("a", "a"), nt("A")]),
                Rule::new("A", vec![seg("b", "b")]),
                Rule::new("A", vec![seg("", "")]),
            ],
            vec![('a', 'a'), ('b', 'b')],
        )
        .unwrap()
    }

    #[test]
    fn test_construction_rejects_unknown_start() {
        let err = Grammar::new(vec!["S"], vec!['a'], "T", vec![], vec![]).unwrap_err();
        assert_eq!(err, ConsistencyError::StartSymbol("T".to_string()));
    }

    #[test]
    fn test_construction_rejects_symbol_overlap() {
        let err = Grammar::new(vec!["S", "a"], vec!['a'], "S", vec![], vec![]).unwrap_err();
        assert_eq!(err, ConsistencyError::SymbolOverlap('a'));
    }

    #[test]
    fn test_construction_rejects_undeclared_rule_symbols() {
        let err = Grammar::new(
            vec!["S"],
            vec!['a'],
            "S",
            vec![Rule::new("S", vec![nt("B")])],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ConsistencyError::UndeclaredNonterminal { .. }));

        let err = Grammar::new(
            vec!["S"],
            vec!['a'],
            "S",
            vec![Rule::new("S", vec![seg("b", "")])],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConsistencyError::UndeclaredTerminal { symbol: 'b', .. }
        ));
    }

    #[test]
    fn test_construction_rejects_undeclared_relation() {
        let err =
            Grammar::new(vec!["S"], vec!['a'], "S", vec![], vec![('a', 'c')]).unwrap_err();
        assert_eq!(err, ConsistencyError::UndeclaredRelationTerminal('a', 'c'));
    }

    #[test]
    fn test_derived_tables() {
        let g = sample();
        assert!(g.erasable().contains("A"));
        assert!(!g.erasable().contains("S"));
        assert_eq!(g.min_yield("A"), 0);
        assert_eq!(g.min_yield("S"), 2);
        assert_eq!(g.min_distance("A"), 1);
        assert_eq!(g.min_distance("S"), 2);
        assert_eq!(g.rules_for("A").count(), 2);
        assert_eq!(g.pairs_following('a'), &['a']);
    }

    #[test]
    fn test_rule_weights_follow_yields() {
        let g = sample();
        // S -> a/a A: rhs nonterminal yield 0, minus yield(S) = 2.
        let rule = g.rules_for("S").next().unwrap();
        assert_eq!(rule.nt_weight(), -2);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut g = sample();
        let snapshot = g.snapshot();
        let rules_before = g.rules().len();

        g.to_normal_form();
        assert_ne!(g.rules().len(), rules_before);

        g.restore(snapshot);
        assert_eq!(g.rules().len(), rules_before);
        assert!(g.erasable().contains("A"));
    }

    #[test]
    fn test_unknown_heuristic_names_are_reported() {
        let mut g = sample();
        assert_eq!(
            g.set_precedence("TM9"),
            Err(HeuristicError::Unknown("TM9".to_string()))
        );
        assert_eq!(
            g.set_pruning("XX", false),
            Err(HeuristicError::Unknown("XX".to_string()))
        );
        // State unchanged by the failed calls.
        assert_eq!(g.precedence(), Precedence::NtaTm1);
        assert!(PruneFilter::ALL.iter().all(|&f| g.is_pruning_enabled(f)));
    }

    #[test]
    fn test_heuristic_configuration() {
        let mut g = sample();
        g.set_precedence("WNTA").unwrap();
        assert_eq!(g.precedence(), Precedence::Wnta);

        g.set_pruning("RE", false).unwrap();
        assert!(!g.is_pruning_enabled(PruneFilter::RegexShape));
        assert!(g.is_pruning_enabled(PruneFilter::StrandLen));

        assert_eq!(Grammar::pruning_names(), vec!["SL", "TL", "WS", "RL", "RE"]);
        assert!(Grammar::precedence_names().contains(&"NTA+TM1"));
    }

    #[test]
    fn test_fresh_nonterm_avoids_declared_names() {
        let mut g = Grammar::new(
            vec!["S", "N1"],
            vec!['a'],
            "S",
            vec![Rule::new("S", vec![seg("a", "a")])],
            vec![('a', 'a')],
        )
        .unwrap();
        let fresh = g.fresh_nonterm();
        assert_eq!(fresh.as_ref(), "N2");
        assert!(g.nonterminals().contains("N2"));
    }
}
