//! Benchmark comparing WK-CYK against the tree search on a normal-form
//! grammar.
//!
//! Run with: cargo bench --bench wk_cyk_bench

use std::time::{Duration, Instant};

use wk_grammar::{nt, seg, Grammar, Rule};

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
    grammar.set_time_limit(Duration::from_secs(60));
    grammar.to_normal_form();

    println!(
        "{:>6} {:>12} {:>14} {:>14}",
        "len", "outcome", "wk-cyk (ms)", "search (ms)"
    );

    for n in [2, 4, 6, 8, 10] {
        let input = member_input(n);

        let start = Instant::now();
        let recognized = grammar.recognize(&input);
        let cyk_time = start.elapsed();

        let start = Instant::now();
        let searched = grammar.search(&input);
        let search_time = start.elapsed();
        assert_eq!(recognized, searched.outcome);

        println!(
            "{:>6} {:>12?} {:>14.2} {:>14.2}",
            input.len(),
            recognized,
            cyk_time.as_secs_f64() * 1000.0,
            search_time.as_secs_f64() * 1000.0
        );
    }
}
