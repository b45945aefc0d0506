//! Benchmark of the best-first tree search on growing inputs.
//!
//! Run with: cargo bench --bench tree_search_bench

use std::time::{Duration, Instant};

use wk_grammar::{nt, seg, Grammar, Rule};

/// The aⁿbⁿ grammar used across the test suite.
fn anbn() -> Grammar {
    Grammar::new(
        vec!["S", "A", "B"],
        vec!['a', 'b'],
        "S",
        vec![
            Rule::new("S", vec![seg("a", ""), nt("S")]),
            Rule::new("S", vec![seg("a", ""), nt("A")]),
            Rule::new("A", vec![seg("b", "a"), nt("A")]),
            Rule::new("A", vec![seg("b", "a"), nt("B")]),
            Rule::new("B", vec![seg("", "b"), nt("B")]),
            Rule::new("B", vec![seg("", "b")]),
        ],
        vec![('a', 'a'), ('b', 'b')],
    )
    .expect("benchmark grammar is consistent")
}

fn member_input(n: usize) -> String {
    let mut s = "a".repeat(n);
    s.push_str(&"b".repeat(n));
    s
}

fn main() {
    let mut grammar = anbn();
    grammar.set_time_limit(Duration::from_secs(30));

    println!(
        "{:>6} {:>12} {:>10} {:>12} {:>10}",
        "len", "outcome", "time (ms)", "visited", "peak"
    );

    for n in [5, 10, 20, 40, 80, 160] {
        let input = member_input(n);

        let start = Instant::now();
        let report = grammar.search(&input);
        let elapsed = start.elapsed();

        println!(
            "{:>6} {:>12?} {:>10.2} {:>12} {:>10}",
            input.len(),
            report.outcome,
            elapsed.as_secs_f64() * 1000.0,
            report.states_visited,
            report.peak_frontier
        );
    }
}
