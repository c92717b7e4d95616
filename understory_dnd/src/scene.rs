// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A retained, in-memory reference host.
//!
//! ## Overview
//!
//! [`Scene`] implements every collaborator trait of [`Host`](crate::host::Host)
//! over a small node tree:
//!
//! - **Panels** are free-standing boxes, optionally clipping and scrolling
//!   their children.
//! - **Containers** stack their items along their [`Orientation`].
//! - **Items** belong to exactly one container. Their position is derived from
//!   the sizes of the items before them; they may host nested panels and
//!   containers.
//!
//! Renderer calls are applied to the scene state (item translations,
//! visibility, proxies, classes, stretchers, placeholders) and recorded in an
//! operation log, so tests can assert on either. Scheduling uses an embedded
//! [`ManualScheduler`].
//!
//! Selectors are node tags: a selector `".handle"` or `"handle"` matches a press
//! target when the target, or one of its ancestors up to the item, carries the
//! tag `handle`.
//!
//! ## Node identity
//!
//! Nodes are addressed by generational [`NodeId`]s: removing a node frees its
//! slot and bumps the generation so stale ids never alias a new node.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::time::Duration;

use kurbo::{Point, Rect, Size, Vec2};

use crate::host::{
    Geometry, HitTest, Mutator, Renderer, ScrollAxes, ScrollDriver, ScrollMetrics, Scrollable,
};
use crate::scheduler::{ManualScheduler, Scheduler};
use crate::session::SessionManager;
use crate::types::{
    ClassTarget, ItemHandle, ItemRef, Orientation, ProxyHandle, ProxyMotion, TaskId,
};

/// Identifier for a node in a [`Scene`]: a slot index and a generation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32, u32);

impl NodeId {
    const fn idx(self) -> usize {
        self.0 as usize
    }

    fn to_handle(self) -> ItemHandle {
        ItemHandle((u64::from(self.1) << 32) | u64::from(self.0))
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Handles are only built from 32-bit slot and generation halves."
    )]
    fn from_handle(handle: ItemHandle) -> Self {
        Self(handle.0 as u32, (handle.0 >> 32) as u32)
    }
}

bitflags::bitflags! {
    /// Clipping and scrolling behavior of a node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SceneFlags: u8 {
        /// Descendants are clipped to the node's box.
        const CLIP     = 0b0000_0001;
        /// The node scrolls horizontally.
        const SCROLL_X = 0b0000_0010;
        /// The node scrolls vertically.
        const SCROLL_Y = 0b0000_0100;
    }
}

/// What a node is.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// A positioned box.
    Panel,
    /// A list stacking its items along the orientation.
    Container(Orientation),
    /// An entry of a container.
    Item,
}

/// One renderer or mutator call, as recorded by [`Scene`].
#[derive(Clone, Debug, PartialEq)]
pub enum RenderOp {
    /// A proxy was cloned from an item.
    CloneVisual {
        /// Source item.
        item: ItemRef<NodeId>,
        /// New proxy.
        proxy: ProxyHandle,
    },
    /// A proxy moved.
    PositionProxy {
        /// Moved proxy.
        proxy: ProxyHandle,
        /// New top-left corner.
        top_left: Point,
        /// How it got there.
        motion: ProxyMotion,
    },
    /// A proxy was removed.
    RemoveProxy(ProxyHandle),
    /// A class was added.
    AddClass(ClassTarget, String),
    /// A class was removed.
    RemoveClass(ClassTarget, String),
    /// An item was offset.
    Translate(ItemRef<NodeId>, Vec2),
    /// An item was shown or hidden.
    Visibility(ItemRef<NodeId>, bool),
    /// Item animation was toggled.
    Transition(ItemRef<NodeId>, Option<Duration>),
    /// A stretcher was appended.
    ShowStretcher(NodeId, Size),
    /// A stretcher was removed.
    RemoveStretcher(NodeId),
    /// A drop placeholder appeared at `offset` with length `size`.
    ShowPlaceholder(NodeId, f64, f64),
    /// A drop placeholder moved.
    MovePlaceholder(NodeId, f64, f64),
    /// A drop placeholder was removed.
    RemovePlaceholder(NodeId),
    /// A node scrolled.
    ScrollBy(NodeId, Vec2),
    /// An item was detached.
    RemoveItem(NodeId, usize),
    /// An item was inserted.
    InsertItem(NodeId, usize),
}

/// A live proxy.
#[derive(Clone, Debug, PartialEq)]
pub struct ProxyState {
    /// Handle given to the session.
    pub handle: ProxyHandle,
    /// Item the proxy was cloned from.
    pub item: ItemRef<NodeId>,
    /// Size of the cloned item.
    pub size: Size,
    /// Current top-left corner.
    pub top_left: Point,
    /// Motion of the latest move.
    pub motion: ProxyMotion,
    /// Classes on the proxy.
    pub classes: Vec<String>,
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    /// Offset from the parent's content origin and size. Items only use the size.
    bounds: Rect,
    flags: SceneFlags,
    scroll: Vec2,
    tags: Vec<String>,
    translation: Vec2,
    visible: bool,
    transition: Option<Duration>,
    stretcher: Option<Size>,
    placeholder: Option<(f64, f64)>,
}

impl Node {
    fn new(generation: u32, kind: NodeKind, bounds: Rect, flags: SceneFlags) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            kind,
            bounds,
            flags,
            scroll: Vec2::ZERO,
            tags: Vec::new(),
            translation: Vec2::ZERO,
            visible: true,
            transition: None,
            stretcher: None,
            placeholder: None,
        }
    }
}

/// Retained host for tests, demos, and benchmarks.
pub struct Scene {
    nodes: Vec<Option<Node>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    scheduler: ManualScheduler,
    proxies: Vec<ProxyState>,
    next_proxy: u64,
    document_classes: Vec<String>,
    ops: Vec<RenderOp>,
    last_clone_size: Size,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Scene")
            .field("nodes_alive", &alive)
            .field("scheduler", &self.scheduler)
            .field("proxies", &self.proxies)
            .field("document_classes", &self.document_classes)
            .field("ops", &self.ops.len())
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Upper bound on tasks run by [`Scene::run_until_idle`].
const IDLE_TASK_LIMIT: usize = 4096;

impl Scene {
    /// Create an empty scene at virtual time zero.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            scheduler: ManualScheduler::new(),
            proxies: Vec::new(),
            next_proxy: 1,
            document_classes: Vec::new(),
            ops: Vec::new(),
            last_clone_size: Size::ZERO,
        }
    }

    // --- building ---

    fn insert(&mut self, parent: Option<NodeId>, mut node: Node) -> NodeId {
        let id = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            node.generation = generation;
            self.nodes[idx] = Some(node);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            NodeId(idx as u32, generation)
        } else {
            node.generation = 1;
            self.nodes.push(Some(node));
            self.generations.push(1);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            NodeId((self.nodes.len() - 1) as u32, 1)
        };
        if let Some(p) = parent.filter(|&p| self.is_alive(p)) {
            self.node_mut(id).parent = Some(p);
            self.node_mut(p).children.push(id);
        }
        id
    }

    /// Add a panel at `rect`, relative to the parent's content origin.
    pub fn add_panel(&mut self, parent: Option<NodeId>, rect: Rect, flags: SceneFlags) -> NodeId {
        self.insert(parent, Node::new(0, NodeKind::Panel, rect, flags))
    }

    /// Add an empty container at `rect`, relative to the parent's content origin.
    pub fn add_container(
        &mut self,
        parent: Option<NodeId>,
        rect: Rect,
        orientation: Orientation,
        flags: SceneFlags,
    ) -> NodeId {
        let kind = NodeKind::Container(orientation);
        self.insert(parent, Node::new(0, kind, rect, flags))
    }

    /// Add a clipping vertical container with full-width items of the given heights.
    pub fn add_list(&mut self, parent: Option<NodeId>, rect: Rect, heights: &[f64]) -> NodeId {
        let list = self.add_container(parent, rect, Orientation::Vertical, SceneFlags::CLIP);
        for &h in heights {
            self.add_item(list, Size::new(rect.width(), h));
        }
        list
    }

    /// Append an item of `size` to `container`.
    pub fn add_item(&mut self, container: NodeId, size: Size) -> NodeId {
        let bounds = Rect::from_origin_size(Point::ORIGIN, size);
        self.insert(
            Some(container),
            Node::new(0, NodeKind::Item, bounds, SceneFlags::empty()),
        )
    }

    /// Remove a node and its subtree.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.detach(id);
        for child in self.node(id).children.clone() {
            self.remove(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            if self.is_alive(parent) {
                self.node_mut(parent).children.retain(|&c| c != id);
            }
        }
    }

    /// Tag a node for selector matching.
    pub fn add_tag(&mut self, id: NodeId, tag: &str) {
        if self.is_alive(id) {
            self.node_mut(id).tags.push(tag.to_string());
        }
    }

    /// Move or resize a panel or container.
    pub fn set_bounds(&mut self, id: NodeId, rect: Rect) {
        if self.is_alive(id) {
            self.node_mut(id).bounds = rect;
        }
    }

    /// Set a node's scroll offset, clamped to its range.
    pub fn set_scroll(&mut self, id: NodeId, offset: Vec2) {
        if !self.is_alive(id) {
            return;
        }
        let max = self.max_scroll(id);
        self.node_mut(id).scroll = Vec2::new(offset.x.clamp(0.0, max.x), offset.y.clamp(0.0, max.y));
    }

    // --- inspection ---

    /// Whether `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(Option::as_ref)
            .is_some_and(|n| n.generation == id.1)
    }

    /// Kind of a live node.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(|n| n.kind)
    }

    /// The item at `index` of `container`.
    pub fn item(&self, container: NodeId, index: usize) -> Option<NodeId> {
        self.get(container)?.children.get(index).copied()
    }

    /// Items of `container` in order.
    pub fn items(&self, container: NodeId) -> &[NodeId] {
        self.get(container).map_or(&[], |n| &n.children)
    }

    /// Box of a node in viewport coordinates, ignoring translations.
    pub fn rect(&self, id: NodeId) -> Rect {
        match self.get(id) {
            Some(node) => Rect::from_origin_size(self.origin(id), node.bounds.size()),
            None => Rect::ZERO,
        }
    }

    /// Scroll offset of a node.
    pub fn scroll(&self, id: NodeId) -> Vec2 {
        self.get(id).map_or(Vec2::ZERO, |n| n.scroll)
    }

    /// Translation applied to an item.
    pub fn translation(&self, item: NodeId) -> Vec2 {
        self.get(item).map_or(Vec2::ZERO, |n| n.translation)
    }

    /// Whether an item is shown.
    pub fn is_visible(&self, item: NodeId) -> bool {
        self.get(item).is_some_and(|n| n.visible)
    }

    /// Animation duration enabled on an item.
    pub fn transition(&self, item: NodeId) -> Option<Duration> {
        self.get(item).and_then(|n| n.transition)
    }

    /// Stretcher size of a container.
    pub fn stretcher(&self, container: NodeId) -> Option<Size> {
        self.get(container).and_then(|n| n.stretcher)
    }

    /// Drop placeholder offset and length of a container.
    pub fn placeholder(&self, container: NodeId) -> Option<(f64, f64)> {
        self.get(container).and_then(|n| n.placeholder)
    }

    /// The live proxy, if any.
    pub fn proxy(&self) -> Option<&ProxyState> {
        self.proxies.last()
    }

    /// Classes currently on the document.
    pub fn document_classes(&self) -> &[String] {
        &self.document_classes
    }

    /// Recorded operations, oldest first.
    pub fn ops(&self) -> &[RenderOp] {
        &self.ops
    }

    /// Drain recorded operations.
    pub fn take_ops(&mut self) -> Vec<RenderOp> {
        core::mem::take(&mut self.ops)
    }

    /// The embedded scheduler.
    pub fn scheduler(&self) -> &ManualScheduler {
        &self.scheduler
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    // --- driving ---

    /// Run every task due within `elapsed` from now, then advance the clock.
    ///
    /// Returns the number of tasks run.
    pub fn advance<P: Clone>(
        &mut self,
        dnd: &mut SessionManager<NodeId, P>,
        elapsed: Duration,
    ) -> usize {
        let until = self.scheduler.now() + elapsed;
        let mut ran = 0;
        while let Some(task) = self.scheduler.pop_due(until) {
            dnd.run_task(self, task);
            ran += 1;
        }
        self.scheduler.advance_to(until);
        ran
    }

    /// Run tasks in due order until none is pending.
    ///
    /// A dragging session keeps rescheduling its rect watcher, so this only
    /// settles once the session has ended. Gives up after a fixed number of
    /// tasks and returns how many ran.
    pub fn run_until_idle<P: Clone>(&mut self, dnd: &mut SessionManager<NodeId, P>) -> usize {
        let mut ran = 0;
        while ran < IDLE_TASK_LIMIT {
            let Some((due, _)) = self.scheduler.next_due() else {
                break;
            };
            let Some(task) = self.scheduler.pop_due(due) else {
                break;
            };
            dnd.run_task(self, task);
            ran += 1;
        }
        ran
    }

    // --- internals ---

    fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.idx())
            .and_then(Option::as_ref)
            .filter(|n| n.generation == id.1)
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn item_node(&self, item: ItemRef<NodeId>) -> Option<NodeId> {
        self.item(item.container, item.index)
    }

    fn origin(&self, id: NodeId) -> Point {
        let Some(node) = self.get(id) else {
            return Point::ORIGIN;
        };
        let Some(parent) = node.parent.filter(|&p| self.is_alive(p)) else {
            return node.bounds.origin();
        };
        let base = self.content_origin(parent);
        match (node.kind, self.node(parent).kind) {
            (NodeKind::Item, NodeKind::Container(o)) => {
                let before: f64 = self
                    .node(parent)
                    .children
                    .iter()
                    .take_while(|&&c| c != id)
                    .map(|&c| o.extent(self.node(c).bounds.size()))
                    .sum();
                base + o.offset(before)
            }
            _ => base + node.bounds.origin().to_vec2(),
        }
    }

    fn content_origin(&self, id: NodeId) -> Point {
        self.origin(id) - self.scroll(id)
    }

    fn content_size(&self, id: NodeId) -> Size {
        let node = self.node(id);
        let size = node.bounds.size();
        match node.kind {
            NodeKind::Container(o) => {
                let along: f64 = node
                    .children
                    .iter()
                    .map(|&c| o.extent(self.node(c).bounds.size()))
                    .sum::<f64>()
                    + node.stretcher.map_or(0.0, |s| o.extent(s));
                match o {
                    Orientation::Horizontal => Size::new(along, size.height),
                    Orientation::Vertical => Size::new(size.width, along),
                }
            }
            NodeKind::Panel | NodeKind::Item => {
                node.children.iter().fold(size, |acc, &c| {
                    let b = self.node(c).bounds;
                    Size::new(acc.width.max(b.x1), acc.height.max(b.y1))
                })
            }
        }
    }

    fn max_scroll(&self, id: NodeId) -> Vec2 {
        let node = self.node(id);
        let client = node.bounds.size();
        let content = self.content_size(id);
        let axis = |enabled: bool, c: f64, v: f64| if enabled { (c - v).max(0.0) } else { 0.0 };
        Vec2::new(
            axis(node.flags.contains(SceneFlags::SCROLL_X), content.width, client.width),
            axis(node.flags.contains(SceneFlags::SCROLL_Y), content.height, client.height),
        )
    }

    fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(self.get(id).and_then(|n| n.parent), move |&p| {
            self.get(p).and_then(|n| n.parent)
        })
    }

    fn clipped(&self, id: NodeId) -> Rect {
        self.ancestors(id)
            .filter(|&a| self.node(a).flags.contains(SceneFlags::CLIP))
            .fold(self.rect(id), |r, a| r.intersect(self.rect(a)))
    }

    fn scrollable(&self, id: NodeId) -> Option<Scrollable<NodeId>> {
        let node = self.get(id)?;
        let mut axes = ScrollAxes::empty();
        axes.set(ScrollAxes::X, node.flags.contains(SceneFlags::SCROLL_X));
        axes.set(ScrollAxes::Y, node.flags.contains(SceneFlags::SCROLL_Y));
        (!axes.is_empty()).then(|| Scrollable {
            key: id,
            viewport: self.clipped(id),
            axes,
            offset: node.scroll,
            max_offset: self.max_scroll(id),
        })
    }

    fn record(&mut self, op: RenderOp) {
        self.ops.push(op);
    }

    fn classes_mut(&mut self, target: ClassTarget) -> Option<&mut Vec<String>> {
        match target {
            ClassTarget::Document => Some(&mut self.document_classes),
            ClassTarget::Proxy(handle) => self
                .proxies
                .iter_mut()
                .find(|p| p.handle == handle)
                .map(|p| &mut p.classes),
        }
    }
}

impl Geometry<NodeId> for Scene {
    fn item_count(&self, container: NodeId) -> usize {
        self.items(container).len()
    }

    fn item_rect(&self, container: NodeId, index: usize) -> Rect {
        self.item(container, index)
            .map_or(Rect::ZERO, |item| self.rect(item))
    }

    fn container_rect(&self, container: NodeId) -> Rect {
        let Some(node) = self.get(container) else {
            return Rect::ZERO;
        };
        let rect = self.rect(container);
        if node.flags.contains(SceneFlags::CLIP) {
            rect
        } else {
            rect.union(Rect::from_origin_size(
                self.content_origin(container),
                self.content_size(container),
            ))
        }
    }

    fn visible_rect(&self, container: NodeId) -> Rect {
        if self.is_alive(container) {
            self.clipped(container)
        } else {
            Rect::ZERO
        }
    }

    fn scroll_metrics(&self, container: NodeId) -> ScrollMetrics {
        match self.get(container) {
            Some(node) => ScrollMetrics {
                client: node.bounds.size(),
                content: self.content_size(container),
                offset: node.scroll,
            },
            None => ScrollMetrics::default(),
        }
    }

    fn scrollable_ancestors(&self, container: NodeId) -> Vec<Scrollable<NodeId>> {
        core::iter::once(container)
            .chain(self.ancestors(container))
            .filter_map(|id| self.scrollable(id))
            .collect()
    }

    fn contains(&self, outer: NodeId, inner: NodeId) -> bool {
        self.ancestors(inner).any(|a| a == outer)
    }

    fn item_contains(&self, container: NodeId, index: usize, inner: NodeId) -> bool {
        self.item(container, index)
            .is_some_and(|item| self.contains(item, inner))
    }
}

impl HitTest<NodeId> for Scene {
    type Target = NodeId;

    fn resolve_item(&self, target: &NodeId) -> Option<ItemRef<NodeId>> {
        core::iter::once(*target)
            .chain(self.ancestors(*target))
            .find(|&id| self.kind(id) == Some(NodeKind::Item))
            .and_then(|item| {
                let container = self.get(item)?.parent?;
                let index = self.items(container).iter().position(|&c| c == item)?;
                Some(ItemRef::new(container, index))
            })
    }

    fn matches_selector(&self, target: &NodeId, selector: &str) -> bool {
        let tag = selector.strip_prefix('.').unwrap_or(selector);
        if tag.is_empty() {
            return false;
        }
        for id in core::iter::once(*target).chain(self.ancestors(*target)) {
            let Some(node) = self.get(id) else {
                return false;
            };
            if node.tags.iter().any(|t| t == tag) {
                return true;
            }
            if node.kind == NodeKind::Item {
                return false;
            }
        }
        false
    }
}

impl Renderer<NodeId> for Scene {
    fn clone_visual(&mut self, item: ItemRef<NodeId>, rect: Rect) -> ProxyHandle {
        let handle = ProxyHandle(self.next_proxy);
        self.next_proxy += 1;
        self.last_clone_size = rect.size();
        self.proxies.push(ProxyState {
            handle,
            item,
            size: rect.size(),
            top_left: rect.origin(),
            motion: ProxyMotion::Follow,
            classes: Vec::new(),
        });
        self.record(RenderOp::CloneVisual {
            item,
            proxy: handle,
        });
        handle
    }

    fn position_proxy(&mut self, proxy: ProxyHandle, top_left: Point, motion: ProxyMotion) {
        if let Some(p) = self.proxies.iter_mut().find(|p| p.handle == proxy) {
            p.top_left = top_left;
            p.motion = motion;
        }
        self.record(RenderOp::PositionProxy {
            proxy,
            top_left,
            motion,
        });
    }

    fn remove_proxy(&mut self, proxy: ProxyHandle) {
        self.proxies.retain(|p| p.handle != proxy);
        self.record(RenderOp::RemoveProxy(proxy));
    }

    fn add_class(&mut self, target: ClassTarget, class: &str) {
        if let Some(classes) = self.classes_mut(target) {
            if !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
            }
        }
        self.record(RenderOp::AddClass(target, class.to_string()));
    }

    fn remove_class(&mut self, target: ClassTarget, class: &str) {
        if let Some(classes) = self.classes_mut(target) {
            classes.retain(|c| c != class);
        }
        self.record(RenderOp::RemoveClass(target, class.to_string()));
    }

    fn set_item_translation(&mut self, item: ItemRef<NodeId>, offset: Vec2) {
        if let Some(id) = self.item_node(item) {
            self.node_mut(id).translation = offset;
        }
        self.record(RenderOp::Translate(item, offset));
    }

    fn set_item_visibility(&mut self, item: ItemRef<NodeId>, visible: bool) {
        if let Some(id) = self.item_node(item) {
            self.node_mut(id).visible = visible;
        }
        self.record(RenderOp::Visibility(item, visible));
    }

    fn set_item_transition(&mut self, item: ItemRef<NodeId>, duration: Option<Duration>) {
        if let Some(id) = self.item_node(item) {
            self.node_mut(id).transition = duration;
        }
        self.record(RenderOp::Transition(item, duration));
    }

    fn show_stretcher(&mut self, container: NodeId, size: Size) {
        if self.is_alive(container) {
            self.node_mut(container).stretcher = Some(size);
        }
        self.record(RenderOp::ShowStretcher(container, size));
    }

    fn remove_stretcher(&mut self, container: NodeId) {
        if self.is_alive(container) {
            self.node_mut(container).stretcher = None;
        }
        self.record(RenderOp::RemoveStretcher(container));
    }

    fn show_drop_placeholder(&mut self, container: NodeId, offset: f64, size: f64) {
        if self.is_alive(container) {
            self.node_mut(container).placeholder = Some((offset, size));
        }
        self.record(RenderOp::ShowPlaceholder(container, offset, size));
    }

    fn move_drop_placeholder(&mut self, container: NodeId, offset: f64, size: f64) {
        if self.is_alive(container) {
            self.node_mut(container).placeholder = Some((offset, size));
        }
        self.record(RenderOp::MovePlaceholder(container, offset, size));
    }

    fn remove_drop_placeholder(&mut self, container: NodeId) {
        if self.is_alive(container) {
            self.node_mut(container).placeholder = None;
        }
        self.record(RenderOp::RemovePlaceholder(container));
    }
}

impl Mutator<NodeId> for Scene {
    fn remove_item_at(&mut self, container: NodeId, index: usize) -> Option<ItemHandle> {
        let item = self.item(container, index)?;
        self.detach(item);
        let node = self.node_mut(item);
        node.translation = Vec2::ZERO;
        node.visible = true;
        node.transition = None;
        self.record(RenderOp::RemoveItem(container, index));
        Some(item.to_handle())
    }

    fn insert_item_at(&mut self, container: NodeId, index: usize, handle: Option<ItemHandle>) {
        if !self.is_alive(container) {
            return;
        }
        let detached = handle
            .map(NodeId::from_handle)
            .filter(|&id| self.get(id).is_some_and(|n| n.parent.is_none()));
        let item = match detached {
            Some(id) => id,
            None => {
                let size = self.last_clone_size;
                let bounds = Rect::from_origin_size(Point::ORIGIN, size);
                self.insert(None, Node::new(0, NodeKind::Item, bounds, SceneFlags::empty()))
            }
        };
        let at = index.min(self.node(container).children.len());
        self.node_mut(container).children.insert(at, item);
        self.node_mut(item).parent = Some(container);
        self.record(RenderOp::InsertItem(container, at));
    }
}

impl ScrollDriver<NodeId> for Scene {
    fn scroll_by(&mut self, scroller: NodeId, delta: Vec2) {
        let current = self.scroll(scroller);
        self.set_scroll(scroller, current + delta);
        self.record(RenderOp::ScrollBy(scroller, delta));
    }
}

impl Scheduler for Scene {
    fn request_frame(&mut self) -> TaskId {
        self.scheduler.request_frame()
    }

    fn schedule_after(&mut self, delay: Duration) -> TaskId {
        self.scheduler.schedule_after(delay)
    }

    fn cancel(&mut self, task: TaskId) {
        self.scheduler.cancel(task);
    }
}
