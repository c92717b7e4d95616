// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edge autoscroll.
//!
//! While the pointer hovers near the edge of a scrollable ancestor, that
//! ancestor scrolls at a speed proportional to how close the pointer is:
//!
//! `speed = max_speed * min(1, (threshold - distance) / threshold)`
//!
//! The threshold never exceeds a third of the viewport extent, so the middle
//! of a small scroller does not scroll.
//!
//! Scrollers are considered innermost first and the first one that can still
//! scroll towards the nearby edge wins. Planning is pure; the
//! [session](crate::session) owns the timer that applies the plan.

use alloc::vec::Vec;
use core::time::Duration;

use kurbo::{Point, Vec2};

use crate::host::Scrollable;
use crate::types::Orientation;

/// Default distance from an edge at which scrolling starts.
pub const DEFAULT_THRESHOLD: f64 = 100.0;

/// Scroll one node at a constant velocity until re-planned.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScrollPlan<K> {
    /// Node to scroll.
    pub scroller: K,
    /// Velocity in pixels per second.
    pub velocity: Vec2,
}

impl<K> ScrollPlan<K> {
    /// Offset to apply after `elapsed`.
    pub fn delta(&self, elapsed: Duration) -> Vec2 {
        self.velocity * elapsed.as_secs_f64()
    }
}

fn axis_velocity<K>(
    scroller: &Scrollable<K>,
    axis: Orientation,
    pointer: Point,
    threshold: f64,
    max_speed: f64,
) -> f64 {
    let cross = match axis {
        Orientation::Horizontal => Orientation::Vertical,
        Orientation::Vertical => Orientation::Horizontal,
    };
    let cross_pos = cross.coord(pointer);
    if cross_pos < cross.begin(scroller.viewport) || cross_pos > cross.end(scroller.viewport) {
        return 0.0;
    }
    // At most a third of the viewport; the middle band never scrolls.
    let threshold = threshold.min(axis.extent(scroller.viewport.size()) / 3.0);
    if threshold <= 0.0 {
        return 0.0;
    }
    let pos = axis.coord(pointer);
    let speed = |distance: f64| max_speed * ((threshold - distance) / threshold).min(1.0);

    let to_begin = pos - axis.begin(scroller.viewport);
    let to_end = axis.end(scroller.viewport) - pos;
    if to_begin < to_end {
        if -threshold < to_begin && to_begin < threshold && scroller.can_scroll_back(axis) {
            return -speed(to_begin);
        }
    } else if -threshold < to_end && to_end < threshold && scroller.can_scroll_forward(axis) {
        return speed(to_end);
    }
    0.0
}

/// Pick the innermost scroller the pointer is close to an edge of.
///
/// Returns `None` when no scroller qualifies or `threshold` is not positive.
pub fn plan_autoscroll<K: Copy>(
    scrollers: &[Scrollable<K>],
    pointer: Point,
    threshold: f64,
    max_speed: f64,
) -> Option<ScrollPlan<K>> {
    if threshold <= 0.0 {
        return None;
    }
    scrollers.iter().find_map(|s| {
        let velocity = Vec2::new(
            axis_velocity(s, Orientation::Horizontal, pointer, threshold, max_speed),
            axis_velocity(s, Orientation::Vertical, pointer, threshold, max_speed),
        );
        (velocity != Vec2::ZERO).then_some(ScrollPlan {
            scroller: s.key,
            velocity,
        })
    })
}

/// Collect scrollers from several lists, keeping the first occurrence of each key.
pub fn merge_scrollers<K: PartialEq>(
    lists: impl IntoIterator<Item = Vec<Scrollable<K>>>,
) -> Vec<Scrollable<K>> {
    let mut out: Vec<Scrollable<K>> = Vec::new();
    for list in lists {
        for s in list {
            if !out.iter().any(|o| o.key == s.key) {
                out.push(s);
            }
        }
    }
    out
}

/// Current autoscroll state of a session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AutoScroller<K> {
    plan: Option<ScrollPlan<K>>,
}

impl<K: Copy + PartialEq> AutoScroller<K> {
    /// An idle scroller.
    pub fn new() -> Self {
        Self { plan: None }
    }

    /// The active plan.
    pub fn plan(&self) -> Option<&ScrollPlan<K>> {
        self.plan.as_ref()
    }

    /// Whether a plan is active.
    pub fn is_active(&self) -> bool {
        self.plan.is_some()
    }

    /// Replace the plan.
    pub fn set_plan(&mut self, plan: Option<ScrollPlan<K>>) {
        self.plan = plan;
    }

    /// Stop scrolling.
    pub fn reset(&mut self) {
        self.plan = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScrollAxes;
    use alloc::vec;
    use kurbo::Rect;

    fn column(key: u32, viewport: Rect, offset: f64, max: f64) -> Scrollable<u32> {
        Scrollable {
            key,
            viewport,
            axes: ScrollAxes::Y,
            offset: Vec2::new(0.0, offset),
            max_offset: Vec2::new(0.0, max),
        }
    }

    #[test]
    fn speed_grows_towards_the_edge() {
        let s = [column(1, Rect::new(0.0, 0.0, 100.0, 400.0), 0.0, 500.0)];
        let far = plan_autoscroll(&s, Point::new(50.0, 320.0), 100.0, 1500.0).unwrap();
        let near = plan_autoscroll(&s, Point::new(50.0, 390.0), 100.0, 1500.0).unwrap();
        assert!(near.velocity.y > far.velocity.y);
        assert_eq!(far.velocity, Vec2::new(0.0, 1500.0 * 0.2));
        assert_eq!(far.scroller, 1);
    }

    #[test]
    fn no_plan_in_the_middle_or_at_range_end() {
        let s = [column(1, Rect::new(0.0, 0.0, 100.0, 400.0), 0.0, 500.0)];
        assert_eq!(plan_autoscroll(&s, Point::new(50.0, 200.0), 100.0, 1500.0), None);
        // Already at the top: nothing to scroll back to.
        assert_eq!(plan_autoscroll(&s, Point::new(50.0, 10.0), 100.0, 1500.0), None);
        let at_end = [column(1, Rect::new(0.0, 0.0, 100.0, 400.0), 500.0, 500.0)];
        assert_eq!(plan_autoscroll(&at_end, Point::new(50.0, 390.0), 100.0, 1500.0), None);
    }

    #[test]
    fn small_viewports_keep_a_still_middle() {
        let s = [column(1, Rect::new(0.0, 0.0, 100.0, 100.0), 0.0, 200.0)];
        assert_eq!(plan_autoscroll(&s, Point::new(50.0, 50.0), 100.0, 1500.0), None);
        assert_eq!(plan_autoscroll(&s, Point::new(50.0, 60.0), 100.0, 1500.0), None);
        let near = plan_autoscroll(&s, Point::new(50.0, 80.0), 100.0, 1500.0).unwrap();
        let threshold = 100.0 / 3.0;
        assert_eq!(near.velocity.y, 1500.0 * ((threshold - 20.0) / threshold));
    }

    #[test]
    fn innermost_scroller_wins() {
        let inner = column(1, Rect::new(0.0, 100.0, 100.0, 300.0), 0.0, 100.0);
        let outer = column(2, Rect::new(0.0, 0.0, 200.0, 320.0), 0.0, 100.0);
        let plan = plan_autoscroll(&[inner, outer], Point::new(50.0, 290.0), 100.0, 1000.0).unwrap();
        assert_eq!(plan.scroller, 1);
        // Just past the inner edge still drives the inner scroller, at full speed.
        let plan = plan_autoscroll(&[inner, outer], Point::new(50.0, 310.0), 100.0, 1000.0).unwrap();
        assert_eq!((plan.scroller, plan.velocity.y), (1, 1000.0));
        // Outside the inner viewport on the cross axis falls through to the outer one.
        let plan = plan_autoscroll(&[inner, outer], Point::new(150.0, 300.0), 100.0, 1000.0);
        assert_eq!(plan.map(|p| p.scroller), Some(2));
    }

    #[test]
    fn merge_keeps_first_occurrence() {
        let a = column(1, Rect::new(0.0, 0.0, 10.0, 10.0), 0.0, 0.0);
        let b = column(2, Rect::new(0.0, 0.0, 10.0, 10.0), 0.0, 0.0);
        let merged = merge_scrollers([vec![a, b], vec![b, a]]);
        assert_eq!(merged.iter().map(|s| s.key).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn delta_scales_with_time() {
        let plan = ScrollPlan {
            scroller: 0_u32,
            velocity: Vec2::new(0.0, 1000.0),
        };
        assert_eq!(plan.delta(Duration::from_millis(16)), Vec2::new(0.0, 16.0));
    }
}
