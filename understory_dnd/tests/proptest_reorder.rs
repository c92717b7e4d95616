// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-based tests for reordering within one list.
//!
//! Properties:
//! 1. While hovering, every item other than the dragged one is drawn exactly
//!    where it will sit after the drop. Outside the list the items close the
//!    dragged item's gap.
//! 2. The committed order equals removing the dragged item and reinserting it
//!    at the removal-adjusted insertion index.
//! 3. Dropping outside the list leaves the order untouched.

use std::time::Duration;

use kurbo::{Point, Rect, Vec2};
use proptest::prelude::*;
use understory_dnd::config::ContainerOptions;
use understory_dnd::engine::adjust_for_removal;
use understory_dnd::scene::{NodeId, Scene};
use understory_dnd::session::SessionManager;
use understory_dnd::types::PointerEvent;

const FRAME: Duration = Duration::from_millis(20);
const ITEM: f64 = 20.0;

fn reorder_case(n: usize, grab: usize, probes: &[f64]) -> Result<(), TestCaseError> {
    let mut scene = Scene::new();
    let height = n as f64 * ITEM + 60.0;
    let list = scene.add_list(None, Rect::new(0.0, 0.0, 100.0, height), &vec![ITEM; n]);
    let original = scene.items(list).to_vec();
    let mut dnd: SessionManager<NodeId, ()> = SessionManager::new();
    dnd.register_container(&mut scene, list, ContainerOptions::default())
        .unwrap();

    let press = Point::new(50.0, grab as f64 * ITEM + ITEM / 2.0);
    prop_assert!(dnd.pointer_down(&mut scene, &PointerEvent::mouse(press, Some(original[grab]))));
    dnd.pointer_move(&mut scene, press + Vec2::new(3.0, 0.0));
    scene.advance(&mut dnd, FRAME);
    for &y in probes {
        dnd.pointer_move(&mut scene, Point::new(50.0, y));
        scene.advance(&mut dnd, FRAME);
    }

    let result = dnd.drag_result(list).cloned().unwrap();
    prop_assert_eq!(result.removal_index, Some(grab));
    // Outside the list the source gap stays closed; inside it reopens at the insertion.
    let moved = original[grab];
    let mut layout = original.clone();
    layout.remove(grab);
    if let Some(insertion) = result.insertion_index {
        layout.insert(adjust_for_removal(insertion, Some(grab)), moved);
    }
    for (slot, &id) in layout.iter().enumerate() {
        if id == moved {
            continue;
        }
        let drawn = scene.rect(id).y0 + scene.translation(id).y;
        prop_assert_eq!(drawn, slot as f64 * ITEM, "item {:?} at slot {}", id, slot);
    }
    let expected = if result.insertion_index.is_some() {
        layout
    } else {
        original.clone()
    };

    dnd.pointer_up(&mut scene);
    scene.run_until_idle(&mut dnd);
    prop_assert!(!dnd.is_dragging());
    prop_assert_eq!(scene.items(list), expected.as_slice());
    Ok(())
}

fn case_strategy() -> impl Strategy<Value = (usize, usize, Vec<f64>)> {
    (1_usize..8).prop_flat_map(|n| {
        (
            Just(n),
            0..n,
            prop::collection::vec(-40.0_f64..200.0, 1..6),
        )
    })
}

proptest! {
    #[test]
    fn hover_layout_and_commit_agree((n, grab, probes) in case_strategy()) {
        reorder_case(n, grab, &probes)?;
    }

    #[test]
    fn dropping_outside_keeps_the_order((n, grab, _) in case_strategy(), beyond in 1.0_f64..300.0) {
        let bottom = n as f64 * ITEM + 60.0;
        reorder_case(n, grab, &[bottom + beyond])?;
    }
}
