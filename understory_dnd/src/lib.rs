// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dnd --heading-base-level=0

//! Understory DnD: a deterministic drag-and-drop session engine for reorderable containers.
//!
//! Understory DnD turns a stream of pointer events into a drag session over any number of
//! containers: reordering within a list, moving items between lists, copying out of palettes, and
//! dropping into zones.
//!
//! - Computes insertion indices by bisecting item spans along each container's axis.
//! - Shifts neighbors out of the way and reserves a gap (the *shadow*) where the item would land.
//! - Picks exactly one target container per evaluation pass, even when containers nest.
//! - Scrolls enclosing scrollers while the pointer hovers near their edges.
//! - Reports everything as an ordered queue of [`DragEvent`](types::DragEvent)s.
//!
//! ## Not a toolkit adapter
//!
//! This crate never touches a DOM, a widget tree, or a window. Everything it needs from the
//! outside world goes through small traits in [`host`]: geometry queries, press-target
//! resolution, visual effects, structural mutation, programmatic scrolling, and a
//! [`Scheduler`](scheduler::Scheduler) for animation frames and timers. Hosts pass themselves by
//! `&mut` into every call, so the engine stays single-threaded and fully deterministic.
//!
//! ## Architecture
//!
//! - [`search`]: pure binary search over ascending item spans.
//! - [`engine`]: one [`ContainerEngine`](engine::ContainerEngine) per container; turns a
//!   [`DragSample`](engine::DragSample) into a [`DragResult`](engine::DragResult) incrementally.
//! - [`session`]: the [`SessionManager`](session::SessionManager) owning the registry, the
//!   pointer state machine, frame coalescing, drop animation, and commit.
//! - [`autoscroll`]: edge-proximity scrolling plans.
//! - [`config`]: per-container [`ContainerOptions`](config::ContainerOptions) and
//!   session-wide [`SessionSettings`](config::SessionSettings).
//! - [`scene`]: a retained reference host used by tests, benchmarks, and demos.
//!
//! ## Workflow
//!
//! 1. Register containers with [`SessionManager::register_container`](session::SessionManager::register_container).
//! 2. Forward presses, moves, and releases.
//! 3. Call [`SessionManager::run_task`](session::SessionManager::run_task) for every task id the
//!    host's scheduler reports as due.
//! 4. Drain [`SessionManager::take_events`](session::SessionManager::take_events) and update the
//!    application model on [`DragEvent::Drop`](types::DragEvent::Drop).
//!
//! ## Example
//!
//! ```
//! use core::time::Duration;
//! use kurbo::{Point, Rect};
//! use understory_dnd::config::ContainerOptions;
//! use understory_dnd::scene::Scene;
//! use understory_dnd::session::SessionManager;
//! use understory_dnd::types::{DragEvent, PointerEvent};
//!
//! let mut scene = Scene::new();
//! let todo = scene.add_list(None, Rect::new(0.0, 0.0, 100.0, 200.0), &[20.0, 20.0]);
//! let done = scene.add_list(None, Rect::new(200.0, 0.0, 300.0, 200.0), &[20.0]);
//!
//! let shared = || ContainerOptions::<u32> {
//!     group_name: Some("tasks".into()),
//!     ..Default::default()
//! };
//! let mut dnd = SessionManager::new();
//! dnd.register_container(&mut scene, todo, shared()).unwrap();
//! dnd.register_container(&mut scene, done, shared()).unwrap();
//!
//! // Drag the first task into the second list, below its only item.
//! let task = scene.item(todo, 0).unwrap();
//! dnd.pointer_down(&mut scene, &PointerEvent::mouse(Point::new(50.0, 10.0), Some(task)));
//! dnd.pointer_move(&mut scene, Point::new(60.0, 12.0));
//! scene.advance(&mut dnd, Duration::from_millis(20));
//! dnd.pointer_move(&mut scene, Point::new(250.0, 30.0));
//! scene.advance(&mut dnd, Duration::from_millis(20));
//! dnd.pointer_up(&mut scene);
//! scene.run_until_idle(&mut dnd);
//!
//! let drops: Vec<_> = dnd
//!     .take_events()
//!     .into_iter()
//!     .filter_map(|e| match e {
//!         DragEvent::Drop { container, result } => Some((container, result.removed_index, result.added_index)),
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(drops, [(todo, Some(0), None), (done, None, Some(1))]);
//! assert_eq!(scene.items(todo).len(), 1);
//! assert_eq!(scene.items(done).len(), 2);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod autoscroll;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod scene;
pub mod scheduler;
pub mod search;
pub mod session;
pub mod types;
