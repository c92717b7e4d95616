// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: orientation helpers, behaviours, spans, pointer input, and emitted events.
//!
//! ## Overview
//!
//! These types describe the inputs the [session](crate::session) consumes and
//! the outputs it produces. They carry no behaviour beyond small geometric
//! helpers; all policy lives in the [engine](crate::engine) and the
//! [session](crate::session).

use core::time::Duration;

use kurbo::{Insets, Point, Rect, Size, Vec2};

/// Layout direction of a container.
///
/// Every geometric query in the engine goes through these helpers so that
/// x/width and y/height are selected consistently.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Orientation {
    /// Items flow left to right.
    Horizontal,
    /// Items flow top to bottom.
    #[default]
    Vertical,
}

impl Orientation {
    /// Leading edge of `rect` along this axis.
    pub const fn begin(self, rect: Rect) -> f64 {
        match self {
            Self::Horizontal => rect.x0,
            Self::Vertical => rect.y0,
        }
    }

    /// Trailing edge of `rect` along this axis.
    pub const fn end(self, rect: Rect) -> f64 {
        match self {
            Self::Horizontal => rect.x1,
            Self::Vertical => rect.y1,
        }
    }

    /// Leading edge of `rect` on the cross axis.
    pub const fn cross_begin(self, rect: Rect) -> f64 {
        match self {
            Self::Horizontal => rect.y0,
            Self::Vertical => rect.x0,
        }
    }

    /// The `[begin, end]` interval of `rect` along this axis.
    pub const fn span(self, rect: Rect) -> Span {
        Span::new(self.begin(rect), self.end(rect))
    }

    /// Coordinate of `pt` along this axis.
    pub const fn coord(self, pt: Point) -> f64 {
        match self {
            Self::Horizontal => pt.x,
            Self::Vertical => pt.y,
        }
    }

    /// Length of `size` along this axis.
    pub const fn extent(self, size: Size) -> f64 {
        match self {
            Self::Horizontal => size.width,
            Self::Vertical => size.height,
        }
    }

    /// Length of an offset vector along this axis.
    pub const fn component(self, v: Vec2) -> f64 {
        match self {
            Self::Horizontal => v.x,
            Self::Vertical => v.y,
        }
    }

    /// Sum of the two paddings that lie on this axis.
    pub fn padding(self, insets: Insets) -> f64 {
        match self {
            Self::Horizontal => insets.x0 + insets.x1,
            Self::Vertical => insets.y0 + insets.y1,
        }
    }

    /// Build a point from a coordinate along this axis and one on the cross axis.
    pub const fn point(self, along: f64, cross: f64) -> Point {
        match self {
            Self::Horizontal => Point::new(along, cross),
            Self::Vertical => Point::new(cross, along),
        }
    }

    /// Top-left corner of a box starting at `begin` inside `container`.
    pub const fn top_left_for_begin(self, container: Rect, begin: f64) -> Point {
        self.point(begin, self.cross_begin(container))
    }

    /// An offset of `amount` along this axis.
    pub const fn offset(self, amount: f64) -> Vec2 {
        match self {
            Self::Horizontal => Vec2::new(amount, 0.0),
            Self::Vertical => Vec2::new(0.0, amount),
        }
    }

    /// Replace the coordinate of `pt` along this axis.
    pub const fn with_coord(self, pt: Point, value: f64) -> Point {
        match self {
            Self::Horizontal => Point::new(value, pt.y),
            Self::Vertical => Point::new(pt.x, value),
        }
    }

    /// Lowercase name, used as a class on the proxy.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

/// Screen axis used to lock pointer tracking.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Axis {
    /// Only horizontal motion is tracked.
    X,
    /// Only vertical motion is tracked.
    Y,
}

impl Axis {
    /// The orientation that moves along this axis.
    pub const fn orientation(self) -> Orientation {
        match self {
            Self::X => Orientation::Horizontal,
            Self::Y => Orientation::Vertical,
        }
    }
}

/// How a container treats items dragged out of and into it.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Behaviour {
    /// Items leave the source and land in the target.
    #[default]
    Move,
    /// Items are copied out; the container never accepts drops.
    Copy,
    /// The dragged item cannot leave the source's visible rect.
    Contain,
    /// Accepts drops without internal reordering; the insertion index is always `0`.
    DropZone,
}

/// A closed interval along an orientation axis.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Span {
    /// Leading coordinate.
    pub begin: f64,
    /// Trailing coordinate.
    pub end: f64,
}

impl Span {
    /// Create a span from its two edges.
    pub const fn new(begin: f64, end: f64) -> Self {
        Self { begin, end }
    }

    /// A zero-width span at `at`.
    pub const fn point(at: f64) -> Self {
        Self { begin: at, end: at }
    }

    /// Length of the span.
    pub fn len(self) -> f64 {
        self.end - self.begin
    }

    /// Whether the span has no length.
    pub fn is_empty(self) -> bool {
        self.end <= self.begin
    }

    /// Center of the span.
    pub fn mid(self) -> f64 {
        (self.begin + self.end) / 2.0
    }

    /// Whether `pos` lies within the closed interval.
    pub fn contains(self, pos: f64) -> bool {
        self.begin <= pos && pos <= self.end
    }

    /// Shift the span by `delta`.
    pub fn translate(self, delta: f64) -> Self {
        Self::new(self.begin + delta, self.end + delta)
    }
}

/// The reserved gap where the dragged item would land.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShadowBounds {
    /// Leading edge of the reservation (shrunk to center smaller items).
    pub begin: f64,
    /// Trailing edge of the reservation.
    pub end: f64,
    /// Unshrunk neighbor-to-neighbor span, used to place a visible placeholder.
    pub drop_area: Span,
    /// One-time correction applied to `begin` on the first insertion after entry.
    pub begin_adjustment: f64,
    /// Where the dragged item's top-left corner lands if dropped now.
    pub top_left: Point,
}

impl ShadowBounds {
    /// Leading edge including the first-insert adjustment.
    pub fn effective_begin(&self) -> f64 {
        self.begin + self.begin_adjustment
    }
}

/// One item inside one container.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ItemRef<K> {
    /// The owning container.
    pub container: K,
    /// Index of the item within the container.
    pub index: usize,
}

impl<K> ItemRef<K> {
    /// Create an item reference.
    pub const fn new(container: K, index: usize) -> Self {
        Self { container, index }
    }
}

/// Structural change reported to a container.
///
/// Emitted with [`DragEvent::DropReady`] while hovering and with
/// [`DragEvent::Drop`] once the drop commits. `added_index` is already
/// adjusted for a removal earlier in the same container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropResult<P> {
    /// Index removed from this container, if it was the source.
    pub removed_index: Option<usize>,
    /// Index inserted into this container, if it was the target.
    pub added_index: Option<usize>,
    /// Payload of the dragged item.
    pub payload: Option<P>,
}

impl<P> DropResult<P> {
    /// Whether the result describes no structural change.
    pub fn is_noop(&self) -> bool {
        self.removed_index.is_none() && self.added_index.is_none()
    }
}

/// Information delivered to every registered container at drag start and end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragStartInfo<P> {
    /// Whether the receiving container owns the dragged item.
    pub is_source: bool,
    /// Whether the receiving container accepts the dragged item.
    pub will_accept_drop: bool,
    /// Payload of the dragged item.
    pub payload: Option<P>,
}

/// Notifications produced by the session, in the order they happened.
///
/// Drain them with [`SessionManager::take_events`](crate::session::SessionManager::take_events).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragEvent<K, P> {
    /// A session started.
    DragStart {
        /// Receiving container.
        container: K,
        /// Source/acceptance details.
        info: DragStartInfo<P>,
    },
    /// A session ended, emitted before any [`DragEvent::Drop`].
    DragEnd {
        /// Receiving container.
        container: K,
        /// Source/acceptance details.
        info: DragStartInfo<P>,
    },
    /// The pointer entered the container's visible bounds.
    DragEnter {
        /// Entered container.
        container: K,
    },
    /// The pointer left the container's visible bounds.
    DragLeave {
        /// Left container.
        container: K,
    },
    /// The pending insertion index changed.
    DropReady {
        /// Container that would receive the item.
        container: K,
        /// Pending change.
        result: DropResult<P>,
    },
    /// The drop committed.
    Drop {
        /// Container reporting the change.
        container: K,
        /// Committed change.
        result: DropResult<P>,
    },
}

impl<K: Copy, P> DragEvent<K, P> {
    /// Container the event is addressed to.
    pub fn container(&self) -> K {
        match self {
            Self::DragStart { container, .. }
            | Self::DragEnd { container, .. }
            | Self::DragEnter { container }
            | Self::DragLeave { container }
            | Self::DropReady { container, .. }
            | Self::Drop { container, .. } => *container,
        }
    }
}

/// Mouse button of a press.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PointerButton {
    /// Usually the left button.
    Primary,
    /// Usually the right button.
    Secondary,
    /// Usually the wheel button.
    Auxiliary,
}

/// Device that produced a pointer event.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PointerKind {
    /// A mouse with the given button.
    Mouse(PointerButton),
    /// A touch contact.
    Touch,
}

/// A press, move, or release in viewport coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent<T> {
    /// Pointer position.
    pub position: Point,
    /// Input device.
    pub kind: PointerKind,
    /// Host-specific press target, if any.
    pub target: Option<T>,
}

impl<T> PointerEvent<T> {
    /// A primary mouse event.
    pub fn mouse(position: Point, target: Option<T>) -> Self {
        Self {
            position,
            kind: PointerKind::Mouse(PointerButton::Primary),
            target,
        }
    }

    /// A touch event.
    pub fn touch(position: Point, target: Option<T>) -> Self {
        Self {
            position,
            kind: PointerKind::Touch,
            target,
        }
    }

    /// A primary mouse event without a target, for moves and releases.
    pub fn at(position: Point) -> Self {
        Self::mouse(position, None)
    }

    /// Whether this event can start a drag.
    pub fn can_grab(&self) -> bool {
        matches!(
            self.kind,
            PointerKind::Touch | PointerKind::Mouse(PointerButton::Primary)
        )
    }
}

/// Per-container position in the session state machine.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ContainerPhase {
    /// No session involves the container.
    #[default]
    Idle,
    /// A session is active and the container is relevant.
    Armed,
    /// The pointer is inside the container's visible bounds.
    Targeted,
    /// The last drop was accepted.
    Committed,
    /// The last drop was rejected or cancelled.
    Reverted,
}

/// Handle of a scheduled callback, issued by the host's [`Scheduler`](crate::scheduler::Scheduler).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// Opaque structural handle of an item detached by the [`Mutator`](crate::host::Mutator).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ItemHandle(pub u64);

/// Handle of the floating proxy created by the [`Renderer`](crate::host::Renderer).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ProxyHandle(pub u64);

/// How the proxy should reach a new position.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProxyMotion {
    /// Jump immediately, tracking the pointer.
    Follow,
    /// Animate to the position.
    Glide {
        /// Animation length.
        duration: Duration,
    },
    /// Animate while collapsing out of view.
    Disappear {
        /// Animation length.
        duration: Duration,
    },
}

/// Where the renderer should apply a class.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ClassTarget {
    /// The floating proxy.
    Proxy(ProxyHandle),
    /// The whole document (selection and touch-action suppression).
    Document,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_selects_axis() {
        let r = Rect::new(1.0, 2.0, 11.0, 32.0);
        assert_eq!(Orientation::Vertical.span(r), Span::new(2.0, 32.0));
        assert_eq!(Orientation::Horizontal.span(r), Span::new(1.0, 11.0));
        assert_eq!(Orientation::Vertical.cross_begin(r), 1.0);
        assert_eq!(
            Orientation::Vertical.top_left_for_begin(r, 20.0),
            Point::new(1.0, 20.0)
        );
        assert_eq!(
            Orientation::Horizontal.top_left_for_begin(r, 5.0),
            Point::new(5.0, 2.0)
        );
    }

    #[test]
    fn padding_uses_insets_on_axis() {
        let insets = Insets::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(Orientation::Horizontal.padding(insets), 4.0);
        assert_eq!(Orientation::Vertical.padding(insets), 6.0);
    }

    #[test]
    fn span_contains_is_closed() {
        let s = Span::new(10.0, 20.0);
        assert!(s.contains(10.0));
        assert!(s.contains(20.0));
        assert!(!s.contains(20.5));
        assert_eq!(s.mid(), 15.0);
        assert!(Span::point(3.0).is_empty());
    }

    #[test]
    fn only_primary_or_touch_grabs() {
        assert!(PointerEvent::<()>::at(Point::ZERO).can_grab());
        assert!(PointerEvent::<()>::touch(Point::ZERO, None).can_grab());
        let right = PointerEvent::<()> {
            position: Point::ZERO,
            kind: PointerKind::Mouse(PointerButton::Secondary),
            target: None,
        };
        assert!(!right.can_grab());
    }
}
