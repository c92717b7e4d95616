// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reorder a single list.
//!
//! Drags the first task of a five-item list below the fourth one, printing
//! every event and keeping an application model in sync from `Drop` events.
//!
//! Run:
//! - `RUST_LOG=understory_dnd=debug cargo run -p understory_dnd_demos --example reorder_list`

use std::time::Duration;

use kurbo::{Point, Rect};
use tracing::info;
use tracing_subscriber::EnvFilter;
use understory_dnd::config::ContainerOptions;
use understory_dnd::scene::Scene;
use understory_dnd::session::SessionManager;
use understory_dnd::types::{DragEvent, PointerEvent};

const FRAME: Duration = Duration::from_millis(16);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut model = vec!["write", "review", "test", "ship", "celebrate"];
    let mut scene = Scene::new();
    let list = scene.add_list(None, Rect::new(0.0, 0.0, 160.0, 200.0), &[30.0; 5]);

    let mut dnd: SessionManager<_, &str> = SessionManager::new();
    let snapshot = model.clone();
    let options = ContainerOptions {
        payload_of: Some(std::rc::Rc::new(move |i: usize| snapshot[i])),
        ..Default::default()
    };
    dnd.register_container(&mut scene, list, options)
        .expect("fresh container");

    // Grab "write" and walk it down past "ship".
    let grabbed = scene.item(list, 0).expect("list has items");
    dnd.pointer_down(
        &mut scene,
        &PointerEvent::mouse(Point::new(80.0, 15.0), Some(grabbed)),
    );
    for y in (15..=110).step_by(5) {
        dnd.pointer_move(&mut scene, Point::new(80.0, f64::from(y)));
        scene.advance(&mut dnd, FRAME);
        if let Some(result) = dnd.drag_result(list) {
            info!(y, insertion = ?result.insertion_index, "hover");
        }
    }
    println!("translations while hovering: {:?}", dnd.translations(list));

    dnd.pointer_up(&mut scene);
    scene.run_until_idle(&mut dnd);

    for event in dnd.take_events() {
        println!("{event:?}");
        if let DragEvent::Drop { result, .. } = event {
            if let Some(removed) = result.removed_index {
                model.remove(removed);
            }
            if let (Some(added), Some(payload)) = (result.added_index, result.payload) {
                model.insert(added, payload);
            }
        }
    }

    println!("model: {model:?}");
    assert_eq!(model, ["review", "test", "ship", "write", "celebrate"]);
    assert_eq!(scene.items(list).len(), 5);
}
