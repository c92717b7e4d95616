// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_dnd::search::{SearchMode, find_insertion_index};
use understory_dnd::types::Span;

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

/// Items of random length between 10 and 60, separated by random gaps below 8.
fn gen_spans(n: usize, seed: u64) -> Vec<Span> {
    let mut rng = Rng::new(seed);
    let mut at = 0.0;
    (0..n)
        .map(|_| {
            let begin = at + rng.next_f64() * 8.0;
            let span = Span::new(begin, begin + 10.0 + rng.next_f64() * 50.0);
            at = span.end;
            span
        })
        .collect()
}

fn gen_probes(count: usize, extent: f64, seed: u64) -> Vec<f64> {
    let mut rng = Rng::new(seed);
    (0..count).map(|_| rng.next_f64() * extent).collect()
}

fn linear_midpoint(spans: &[Span], pos: f64) -> usize {
    spans.iter().take_while(|s| s.mid() <= pos).count()
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("insertion_search");
    for &n in &[16usize, 256, 4096] {
        let spans = gen_spans(n, 0x9e37_79b9_7f4a_7c15);
        let extent = spans.last().map_or(0.0, |s| s.end);
        let probes = gen_probes(1024, extent, 42);
        group.throughput(Throughput::Elements(probes.len() as u64));
        group.bench_function(format!("midpoint_n{}", n), |b| {
            b.iter(|| {
                let mut acc = 0usize;
                for &p in &probes {
                    acc += find_insertion_index(spans.len(), |i| spans[i], p, SearchMode::Midpoint);
                }
                black_box(acc)
            })
        });
        group.bench_function(format!("housing_n{}", n), |b| {
            b.iter(|| {
                let mut acc = 0usize;
                for &p in &probes {
                    acc += find_insertion_index(spans.len(), |i| spans[i], p, SearchMode::Housing);
                }
                black_box(acc)
            })
        });
        if n <= 256 {
            group.bench_function(format!("linear_scan_n{}", n), |b| {
                b.iter(|| {
                    let mut acc = 0usize;
                    for &p in &probes {
                        acc += linear_midpoint(&spans, p);
                    }
                    black_box(acc)
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
