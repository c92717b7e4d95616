// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-based tests for the insertion-index search.
//!
//! Properties:
//! 1. Midpoint search agrees with a linear scan over item midpoints.
//! 2. The midpoint result is monotonic in the probe position.
//! 3. Housing search returns an item that contains the probe whenever one does.
//! 4. Probes before the first item or after the last one clamp to the ends.

use proptest::prelude::*;
use understory_dnd::search::{SearchMode, find_insertion_index};
use understory_dnd::types::Span;

/// Lay out items from `(gap_before, length)` pairs.
fn lay_out(layout: &[(f64, f64)]) -> Vec<Span> {
    let mut at = 0.0;
    layout
        .iter()
        .map(|&(gap, len)| {
            let span = Span::new(at + gap, at + gap + len);
            at = span.end;
            span
        })
        .collect()
}

/// Reference implementation: count items whose midpoint is at or before `pos`.
fn linear_midpoint(spans: &[Span], pos: f64) -> usize {
    spans.iter().take_while(|s| s.mid() <= pos).count()
}

fn midpoint(spans: &[Span], pos: f64) -> usize {
    find_insertion_index(spans.len(), |i| spans[i], pos, SearchMode::Midpoint)
}

fn housing(spans: &[Span], pos: f64) -> usize {
    find_insertion_index(spans.len(), |i| spans[i], pos, SearchMode::Housing)
}

fn layout_strategy(max_len: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((0.0_f64..20.0, 0.5_f64..50.0), 0..=max_len)
}

fn uniform_sizes() -> impl Strategy<Value = usize> {
    prop::sample::select(vec![0_usize, 1, 2, 50])
}

proptest! {
    #[test]
    fn midpoint_matches_linear_scan(layout in layout_strategy(64), probe in -100.0_f64..4000.0) {
        let spans = lay_out(&layout);
        prop_assert_eq!(midpoint(&spans, probe), linear_midpoint(&spans, probe));
    }

    #[test]
    fn midpoint_matches_linear_scan_for_uniform_items(n in uniform_sizes(), probe in -50.0_f64..1100.0) {
        let spans = lay_out(&vec![(0.0, 20.0); n]);
        prop_assert_eq!(midpoint(&spans, probe), linear_midpoint(&spans, probe));
    }

    #[test]
    fn midpoint_is_monotonic(layout in layout_strategy(32), a in -50.0_f64..2000.0, b in -50.0_f64..2000.0) {
        let spans = lay_out(&layout);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(midpoint(&spans, lo) <= midpoint(&spans, hi));
    }
}

proptest! {
    #[test]
    fn housing_finds_the_containing_item(layout in layout_strategy(64), pick in any::<prop::sample::Index>(), t in 0.0_f64..=1.0) {
        let spans = lay_out(&layout);
        prop_assume!(!spans.is_empty());
        let span = spans[pick.index(spans.len())];
        let probe = (span.begin + t * span.len()).min(span.end);
        let found = housing(&spans, probe);
        prop_assert!(found < spans.len());
        prop_assert!(spans[found].contains(probe), "{probe} not in {:?}", spans[found]);
    }

    #[test]
    fn out_of_range_probes_clamp(layout in layout_strategy(32), overshoot in 0.001_f64..500.0) {
        let spans = lay_out(&layout);
        prop_assume!(!spans.is_empty());
        let first = spans[0].begin - overshoot;
        let last = spans[spans.len() - 1].end + overshoot;
        prop_assert_eq!(midpoint(&spans, first), 0);
        prop_assert_eq!(midpoint(&spans, last), spans.len());
        prop_assert_eq!(housing(&spans, first), 0);
        prop_assert_eq!(housing(&spans, last), spans.len() - 1);
    }
}
