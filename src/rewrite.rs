//! The rule rewriter: applies one production to one word.
//!
//! Replacing a nonterminal with a right-hand side can leave segment
//! letters adjacent to each other; the rewriter merges them on the way
//! through so the result is always canonical.

use crate::word::{Letter, Segment, Word};

/// Replace the nonterminal at `position` in `word` with `rhs`, merging
/// segment letters that become adjacent.
///
/// `position` must index a nonterminal letter. The inputs are not
/// mutated; the result contains no two adjacent segment letters.
pub fn apply_rule(word: &Word, position: usize, rhs: &Word) -> Word {
    let letters = word.letters();
    debug_assert!(letters[position].is_nonterm());

    let prev_seg = (position > 0).then(|| letters[position - 1].as_seg()).flatten();
    let next_seg = letters.get(position + 1).and_then(Letter::as_seg);

    let mut out: Vec<Letter> = Vec::with_capacity(letters.len() + rhs.len());

    if let [Letter::Seg(single)] = rhs.letters() {
        // Single-segment right-hand side: it may fuse with both
        // neighbours at once.
        match (prev_seg, next_seg) {
            (Some(prev), Some(next)) => {
                out.extend_from_slice(&letters[..position - 1]);
                out.push(Letter::Seg(prev.merged(single).merged(next)));
                out.extend_from_slice(&letters[position + 2..]);
            }
            (Some(prev), None) => {
                out.extend_from_slice(&letters[..position - 1]);
                out.push(Letter::Seg(prev.merged(single)));
                out.extend_from_slice(&letters[position + 1..]);
            }
            (None, Some(next)) => {
                out.extend_from_slice(&letters[..position]);
                out.push(Letter::Seg(single.merged(next)));
                out.extend_from_slice(&letters[position + 2..]);
            }
            (None, None) => {
                out.extend_from_slice(&letters[..position]);
                out.push(Letter::Seg(single.clone()));
                out.extend_from_slice(&letters[position + 1..]);
            }
        }
    } else {
        // Longer right-hand side: only its first and last letters can
        // merge, and only when they are segments.
        let rhs_letters = rhs.letters();
        let merge_prev: Option<(&Segment, &Segment)> = prev_seg
            .zip(rhs_letters.first().and_then(Letter::as_seg));
        let merge_next: Option<(&Segment, &Segment)> = next_seg
            .zip(rhs_letters.last().and_then(Letter::as_seg));

        let keep_left = if merge_prev.is_some() { position - 1 } else { position };
        out.extend_from_slice(&letters[..keep_left]);

        let interior_from = usize::from(merge_prev.is_some());
        let interior_to = rhs_letters.len() - usize::from(merge_next.is_some());

        if let Some((prev, first)) = merge_prev {
            out.push(Letter::Seg(prev.merged(first)));
        }
        out.extend_from_slice(&rhs_letters[interior_from..interior_to]);
        if let Some((next, last)) = merge_next {
            out.push(Letter::Seg(last.merged(next)));
        }

        let keep_right = if merge_next.is_some() { position + 2 } else { position + 1 };
        out.extend_from_slice(&letters[keep_right..]);
    }

    let result = Word::new(out);
    debug_assert!(result.is_canonical());
    result
}
