// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Insertion-index search over ordered item spans.
//!
//! Items of a container occupy non-overlapping, ascending spans along the
//! container axis. [`find_insertion_index`] bisects those spans to find where
//! a pointer projection falls, in `O(log n)` span lookups.
//!
//! ```
//! use understory_dnd::search::{find_insertion_index, SearchMode};
//! use understory_dnd::types::Span;
//!
//! let spans = [Span::new(0.0, 20.0), Span::new(20.0, 40.0), Span::new(40.0, 60.0)];
//! let at = |i: usize| spans[i];
//! assert_eq!(find_insertion_index(3, at, 25.0, SearchMode::Midpoint), 1);
//! assert_eq!(find_insertion_index(3, at, 35.0, SearchMode::Midpoint), 2);
//! assert_eq!(find_insertion_index(3, at, 35.0, SearchMode::Housing), 1);
//! ```
//!
//! The span accessor must not observe the item list changing during a call.

use crate::types::Span;

/// How a position inside an item is resolved.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum SearchMode {
    /// Before the item's midpoint inserts before it, at or after inserts after it.
    #[default]
    Midpoint,
    /// Return the index of the item itself.
    Housing,
}

/// Find the index for `pos` among `len` ascending spans.
///
/// In [`SearchMode::Midpoint`] the result is the number of items whose
/// midpoint is at or before `pos`, in `0..=len`.
///
/// In [`SearchMode::Housing`] a position inside an item returns that item.
/// A position in a gap resolves to a neighbor of the gap, and a position past
/// every item returns the last item (or `len` when empty).
pub fn find_insertion_index(
    len: usize,
    span_at: impl Fn(usize) -> Span,
    pos: f64,
    mode: SearchMode,
) -> usize {
    let resolve = |index: usize, span: Span| match mode {
        SearchMode::Midpoint if pos < span.mid() => index,
        SearchMode::Midpoint => index + 1,
        SearchMode::Housing => index,
    };

    // Half-open candidate range.
    let mut lo = 0;
    let mut hi = len;
    while lo < hi {
        if hi - lo == 1 {
            return resolve(lo, span_at(lo));
        }
        let mid = lo + (hi - 1 - lo) / 2;
        let span = span_at(mid);
        if pos < span.begin {
            hi = mid;
        } else if pos > span.end {
            lo = mid + 1;
        } else {
            return resolve(mid, span);
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn stacked(sizes: &[f64]) -> Vec<Span> {
        let mut at = 0.0;
        sizes
            .iter()
            .map(|s| {
                let span = Span::new(at, at + s);
                at += s;
                span
            })
            .collect()
    }

    #[test]
    fn empty_list_inserts_at_zero() {
        let spans: Vec<Span> = Vec::new();
        assert_eq!(
            find_insertion_index(0, |i| spans[i], 10.0, SearchMode::Midpoint),
            0
        );
        assert_eq!(
            find_insertion_index(0, |i| spans[i], 10.0, SearchMode::Housing),
            0
        );
    }

    #[test]
    fn midpoint_splits_each_item() {
        let spans = stacked(&[20.0, 20.0, 20.0]);
        let f = |pos| find_insertion_index(spans.len(), |i| spans[i], pos, SearchMode::Midpoint);
        assert_eq!(f(-5.0), 0);
        assert_eq!(f(9.9), 0);
        assert_eq!(f(10.0), 1);
        assert_eq!(f(29.0), 1);
        assert_eq!(f(31.0), 2);
        assert_eq!(f(55.0), 3);
        assert_eq!(f(500.0), 3);
    }

    #[test]
    fn housing_returns_containing_item() {
        let spans = stacked(&[10.0, 30.0, 5.0, 40.0]);
        let f = |pos| find_insertion_index(spans.len(), |i| spans[i], pos, SearchMode::Housing);
        assert_eq!(f(1.0), 0);
        assert_eq!(f(12.0), 1);
        assert_eq!(f(42.0), 2);
        assert_eq!(f(60.0), 3);
        // Past the end resolves to the last item.
        assert_eq!(f(1000.0), 3);
    }

    #[test]
    fn gaps_resolve_to_the_following_slot() {
        let spans = [Span::new(0.0, 10.0), Span::new(20.0, 30.0), Span::new(40.0, 50.0)];
        let f = |pos| find_insertion_index(spans.len(), |i| spans[i], pos, SearchMode::Midpoint);
        assert_eq!(f(15.0), 1);
        assert_eq!(f(35.0), 2);
    }
}
