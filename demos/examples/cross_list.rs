// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Move and copy items between lists.
//!
//! A palette of card templates copies into a "todo" column, and cards move
//! from "todo" to "done". The application models are kept in sync from
//! `Drop` events and double as payload sources.
//!
//! Run:
//! - `RUST_LOG=understory_dnd=trace cargo run -p understory_dnd_demos --example cross_list`

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use kurbo::{Point, Rect};
use tracing::info;
use tracing_subscriber::EnvFilter;
use understory_dnd::config::ContainerOptions;
use understory_dnd::scene::{NodeId, Scene};
use understory_dnd::session::SessionManager;
use understory_dnd::types::{Behaviour, DragEvent, PointerEvent};

const FRAME: Duration = Duration::from_millis(16);

type Model = Rc<RefCell<Vec<&'static str>>>;
type Dnd = SessionManager<NodeId, &'static str>;

fn column(model: &Model, behaviour: Behaviour) -> ContainerOptions<&'static str> {
    let source = Rc::clone(model);
    ContainerOptions {
        behaviour,
        group_name: Some("board".into()),
        payload_of: Some(Rc::new(move |i: usize| source.borrow()[i])),
        ..Default::default()
    }
}

/// Press on `item`, walk the pointer to `to` one frame at a time, and drop.
fn drag(scene: &mut Scene, dnd: &mut Dnd, item: NodeId, from: Point, to: Point) {
    dnd.pointer_down(scene, &PointerEvent::mouse(from, Some(item)));
    let steps = 20;
    for step in 1..=steps {
        let at = from.lerp(to, f64::from(step) / f64::from(steps));
        dnd.pointer_move(scene, at);
        scene.advance(dnd, FRAME);
    }
    info!(target = ?dnd.target(), "releasing");
    dnd.pointer_up(scene);
    scene.run_until_idle(dnd);
}

fn apply(models: &[(NodeId, &Model)], events: Vec<DragEvent<NodeId, &'static str>>) {
    for event in events {
        let DragEvent::Drop { container, result } = event else {
            continue;
        };
        println!("drop into {container:?}: {result:?}");
        let Some((_, model)) = models.iter().find(|(key, _)| *key == container) else {
            continue;
        };
        let mut model = model.borrow_mut();
        if let Some(removed) = result.removed_index {
            model.remove(removed);
        }
        if let (Some(added), Some(payload)) = (result.added_index, result.payload) {
            model.insert(added, payload);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let palette_model: Model = Rc::new(RefCell::new(vec!["bug", "feature"]));
    let todo_model: Model = Rc::new(RefCell::new(vec!["triage", "fix"]));
    let done_model: Model = Rc::new(RefCell::new(vec!["deploy"]));

    let mut scene = Scene::new();
    let palette = scene.add_list(None, Rect::new(0.0, 0.0, 100.0, 200.0), &[20.0; 2]);
    let todo = scene.add_list(None, Rect::new(200.0, 0.0, 300.0, 200.0), &[20.0; 2]);
    let done = scene.add_list(None, Rect::new(400.0, 0.0, 500.0, 200.0), &[20.0; 1]);

    let mut dnd = Dnd::new();
    dnd.register_container(&mut scene, palette, column(&palette_model, Behaviour::Copy))
        .expect("fresh container");
    dnd.register_container(&mut scene, todo, column(&todo_model, Behaviour::Move))
        .expect("fresh container");
    dnd.register_container(&mut scene, done, column(&done_model, Behaviour::Move))
        .expect("fresh container");
    let models = [
        (palette, &palette_model),
        (todo, &todo_model),
        (done, &done_model),
    ];

    // Copy the "bug" template to the end of "todo".
    let template = scene.item(palette, 0).expect("palette has templates");
    drag(
        &mut scene,
        &mut dnd,
        template,
        Point::new(50.0, 10.0),
        Point::new(250.0, 60.0),
    );
    apply(&models, dnd.take_events());

    // Move the first card from "todo" to the top of "done".
    let card = scene.item(todo, 0).expect("todo has cards");
    drag(
        &mut scene,
        &mut dnd,
        card,
        Point::new(250.0, 10.0),
        Point::new(450.0, 5.0),
    );
    apply(&models, dnd.take_events());

    println!("palette: {:?}", palette_model.borrow());
    println!("todo:    {:?}", todo_model.borrow());
    println!("done:    {:?}", done_model.borrow());
    assert_eq!(*palette_model.borrow(), ["bug", "feature"]);
    assert_eq!(*todo_model.borrow(), ["fix", "bug"]);
    assert_eq!(*done_model.borrow(), ["triage", "deploy"]);
    assert_eq!(scene.items(todo).len(), 2);
    assert_eq!(scene.items(done).len(), 2);
}
