// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator traits implemented by the embedding toolkit.
//!
//! The session never touches a widget tree directly. It measures through
//! [`Geometry`], resolves press targets through [`HitTest`], draws through
//! [`Renderer`], changes structure through [`Mutator`], scrolls through
//! [`ScrollDriver`], and defers work through [`Scheduler`].
//!
//! All coordinates are in one shared viewport space. Geometry is read-only;
//! callers cache results within one evaluation pass and invalidate explicitly.
//!
//! [`Host`] bundles all of them and is implemented automatically.
//! [`Scene`](crate::scene::Scene) is a complete in-memory implementation.

use alloc::vec::Vec;
use core::time::Duration;

use kurbo::{Point, Rect, Size, Vec2};

use crate::scheduler::Scheduler;
use crate::types::{ClassTarget, ItemHandle, ItemRef, Orientation, ProxyHandle, ProxyMotion};

bitflags::bitflags! {
    /// Axes along which a scrollable ancestor can move.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ScrollAxes: u8 {
        /// Horizontal scrolling.
        const X = 0b0000_0001;
        /// Vertical scrolling.
        const Y = 0b0000_0010;
    }
}

impl ScrollAxes {
    /// The flag that scrolls along `orientation`.
    pub const fn along(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Horizontal => Self::X,
            Orientation::Vertical => Self::Y,
        }
    }
}

/// Scroll state of a container.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScrollMetrics {
    /// Size of the visible client area.
    pub client: Size,
    /// Size of the scrollable content.
    pub content: Size,
    /// Current scroll offset.
    pub offset: Vec2,
}

/// A scrollable ancestor of a container (or the container itself).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Scrollable<K> {
    /// Host key of the scrolling node, passed back to [`ScrollDriver::scroll_by`].
    pub key: K,
    /// Visible viewport of the scroller.
    pub viewport: Rect,
    /// Axes on which it scrolls.
    pub axes: ScrollAxes,
    /// Current scroll offset.
    pub offset: Vec2,
    /// Largest reachable scroll offset.
    pub max_offset: Vec2,
}

impl<K> Scrollable<K> {
    /// Whether the scroller can still move towards the leading edge on `axis`.
    pub fn can_scroll_back(&self, axis: Orientation) -> bool {
        self.axes.contains(ScrollAxes::along(axis)) && axis.component(self.offset) > 0.0
    }

    /// Whether the scroller can still move towards the trailing edge on `axis`.
    pub fn can_scroll_forward(&self, axis: Orientation) -> bool {
        self.axes.contains(ScrollAxes::along(axis))
            && axis.component(self.offset) < axis.component(self.max_offset)
    }
}

/// Read-only measurement of containers and their items.
pub trait Geometry<K> {
    /// Number of items in the container.
    fn item_count(&self, container: K) -> usize;

    /// Layout rect of an item, ignoring any translation applied by the renderer.
    fn item_rect(&self, container: K, index: usize) -> Rect;

    /// Full extent of the container, including overflowing content.
    fn container_rect(&self, container: K) -> Rect;

    /// Container rect intersected with every clipping ancestor.
    ///
    /// An empty rect means the container is fully clipped out.
    fn visible_rect(&self, container: K) -> Rect;

    /// Client, content, and offset of the container's own scrolling.
    fn scroll_metrics(&self, container: K) -> ScrollMetrics;

    /// Scrollable nodes enclosing the container, innermost first.
    fn scrollable_ancestors(&self, container: K) -> Vec<Scrollable<K>>;

    /// Whether `inner` is nested inside `outer`.
    fn contains(&self, outer: K, inner: K) -> bool;

    /// Whether `inner` is nested inside the item at `index` of `container`.
    fn item_contains(&self, container: K, index: usize, inner: K) -> bool {
        let _ = (container, index, inner);
        false
    }
}

/// Resolution of press targets.
pub trait HitTest<K> {
    /// Toolkit-specific press target.
    type Target;

    /// The draggable item a press target belongs to.
    fn resolve_item(&self, target: &Self::Target) -> Option<ItemRef<K>>;

    /// Whether the target (or an ancestor up to its item) matches `selector`.
    ///
    /// Selectors the host does not understand match nothing.
    fn matches_selector(&self, target: &Self::Target, selector: &str) -> bool;
}

/// Visual effects requested during a session.
pub trait Renderer<K> {
    /// Create a floating copy of an item at `rect`.
    fn clone_visual(&mut self, item: ItemRef<K>, rect: Rect) -> ProxyHandle;

    /// Move the proxy so its top-left corner sits at `top_left`.
    fn position_proxy(&mut self, proxy: ProxyHandle, top_left: Point, motion: ProxyMotion);

    /// Remove the proxy.
    fn remove_proxy(&mut self, proxy: ProxyHandle);

    /// Add a class name to a target.
    fn add_class(&mut self, target: ClassTarget, class: &str);

    /// Remove a class name from a target.
    fn remove_class(&mut self, target: ClassTarget, class: &str);

    /// Offset an item from its layout position.
    fn set_item_translation(&mut self, item: ItemRef<K>, offset: Vec2);

    /// Show or hide an item.
    fn set_item_visibility(&mut self, item: ItemRef<K>, visible: bool);

    /// Enable (`Some`) or disable (`None`) animated translation of an item.
    fn set_item_transition(&mut self, item: ItemRef<K>, duration: Option<Duration>);

    /// Append a trailing filler of `size` to the container.
    fn show_stretcher(&mut self, container: K, size: Size);

    /// Remove the trailing filler.
    fn remove_stretcher(&mut self, container: K);

    /// Show the drop placeholder at `offset` from the container begin along its axis.
    fn show_drop_placeholder(&mut self, container: K, offset: f64, size: f64);

    /// Move an existing drop placeholder.
    fn move_drop_placeholder(&mut self, container: K, offset: f64, size: f64);

    /// Remove the drop placeholder.
    fn remove_drop_placeholder(&mut self, container: K);
}

/// Structural changes applied when a drop commits.
pub trait Mutator<K> {
    /// Detach the item at `index`, returning a handle for re-insertion.
    fn remove_item_at(&mut self, container: K, index: usize) -> Option<ItemHandle>;

    /// Insert an item at `index`.
    ///
    /// `handle` is the item detached from the source when the drag moved it;
    /// `None` means the host materializes the item from the drop payload.
    fn insert_item_at(&mut self, container: K, index: usize, handle: Option<ItemHandle>);
}

/// Programmatic scrolling for autoscroll.
pub trait ScrollDriver<K> {
    /// Scroll the node by `delta`, clamped to its range.
    fn scroll_by(&mut self, scroller: K, delta: Vec2);
}

/// Everything the [`SessionManager`](crate::session::SessionManager) needs from its host.
pub trait Host<K>:
    Geometry<K> + HitTest<K> + Renderer<K> + Mutator<K> + ScrollDriver<K> + Scheduler
{
}

impl<K, H> Host<K> for H where
    H: Geometry<K> + HitTest<K> + Renderer<K> + Mutator<K> + ScrollDriver<K> + Scheduler
{
}
