// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::time::Duration;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect};
use understory_dnd::config::ContainerOptions;
use understory_dnd::scene::{NodeId, Scene};
use understory_dnd::session::SessionManager;
use understory_dnd::types::PointerEvent;

const FRAME: Duration = Duration::from_millis(16);
const ITEM: f64 = 24.0;

type Dnd = SessionManager<NodeId, ()>;

/// `lists` side-by-side lists of `n` items sharing a group, with a drag
/// already started on the first item of the first list.
fn setup(lists: usize, n: usize) -> (Scene, Dnd, Vec<NodeId>) {
    let mut scene = Scene::new();
    let mut dnd = Dnd::new();
    let height = n as f64 * ITEM + 100.0;
    let keys: Vec<_> = (0..lists)
        .map(|i| {
            let x = i as f64 * 200.0;
            let key = scene.add_list(None, Rect::new(x, 0.0, x + 150.0, height), &vec![ITEM; n]);
            let options = ContainerOptions {
                group_name: Some("bench".into()),
                ..Default::default()
            };
            dnd.register_container(&mut scene, key, options)
                .expect("fresh container");
            key
        })
        .collect();
    let first = scene.item(keys[0], 0).expect("non-empty list");
    let press = Point::new(75.0, ITEM / 2.0);
    dnd.pointer_down(&mut scene, &PointerEvent::mouse(press, Some(first)));
    dnd.pointer_move(&mut scene, Point::new(78.0, ITEM / 2.0));
    scene.advance(&mut dnd, FRAME);
    (scene, dnd, keys)
}

fn bench_reorder_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder_sweep");
    for &n in &[16usize, 128, 1024] {
        let steps = 64;
        group.throughput(Throughput::Elements(steps as u64));
        group.bench_function(format!("single_list_n{}", n), |b| {
            b.iter_batched(
                || setup(1, n),
                |(mut scene, mut dnd, keys)| {
                    let bottom = n as f64 * ITEM;
                    for step in 0..steps {
                        let y = bottom * step as f64 / steps as f64;
                        dnd.pointer_move(&mut scene, Point::new(75.0, y));
                        scene.advance(&mut dnd, FRAME);
                    }
                    black_box(dnd.drag_result(keys[0]).and_then(|r| r.insertion_index));
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_cross_list_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_list_sweep");
    for &lists in &[2usize, 8] {
        let steps = 64;
        group.throughput(Throughput::Elements(steps as u64));
        group.bench_function(format!("lists{}_n64", lists), |b| {
            b.iter_batched(
                || setup(lists, 64),
                |(mut scene, mut dnd, keys)| {
                    let right = lists as f64 * 200.0;
                    for step in 0..steps {
                        let x = right * step as f64 / steps as f64;
                        dnd.pointer_move(&mut scene, Point::new(x, 300.0));
                        scene.advance(&mut dnd, FRAME);
                    }
                    dnd.pointer_up(&mut scene);
                    scene.run_until_idle(&mut dnd);
                    black_box((dnd.take_events().len(), keys.len()));
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_idle_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("idle_refresh");
    for &n in &[128usize, 1024] {
        let (mut scene, mut dnd, _) = setup(1, n);
        group.bench_function(format!("refresh_n{}", n), |b| {
            b.iter(|| {
                dnd.refresh(&mut scene);
                black_box(scene.take_ops().len())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_reorder_sweep,
    bench_cross_list_sweep,
    bench_idle_refresh,
);
criterion_main!(benches);
