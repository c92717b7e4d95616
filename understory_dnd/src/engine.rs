// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-container geometry engine.
//!
//! ## Overview
//!
//! Each registered container owns a [`ContainerEngine`]. During a session the
//! coordinator feeds it the current [`DragSample`] once per evaluation pass and
//! the engine incrementally updates its [`DragResult`]:
//!
//! 1. latch the removal index (the source item, unless copying) and hide it,
//! 2. project the sample position onto the axis if it lies in the visible rect,
//! 3. resolve the item size on entry,
//! 4. search for the next insertion index relative to the current shadow,
//! 5. maintain the stretcher, neighbor translations, shadow, and placeholder,
//! 6. report enter/leave and drop-ready transitions.
//!
//! Every step compares against the previous pass, so re-evaluating an
//! unchanged sample issues no renderer calls and yields an equal result.
//!
//! ## Visual spans
//!
//! Searches and shadow bounds use *visual* spans: the cached layout span of
//! an item plus the translation this engine applied to it. The hidden source
//! item contributes a zero-width span at the visual end of its predecessor so
//! spans stay ascending.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};
use tracing::{debug, trace, warn};

use crate::config::ContainerOptions;
use crate::host::{Geometry, Renderer};
use crate::search::{SearchMode, find_insertion_index};
use crate::types::{
    Behaviour, ContainerPhase, DragEvent, DropResult, ItemRef, Orientation, ShadowBounds, Span,
};

/// Distance kept between the pointer and the shadow on the first insertion.
const FIRST_INSERT_SLACK: f64 = 5.0;

/// Snapshot of the dragged item, owned by the coordinator.
#[derive(Clone, Debug, PartialEq)]
pub struct DragSample<K, P> {
    /// Container the item was grabbed from.
    pub source: K,
    /// Index of the item within the source.
    pub item_index: usize,
    /// Size of the item at grab time.
    pub size: Size,
    /// Payload of the item.
    pub payload: Option<P>,
    /// Latest pointer position.
    pub pointer: Point,
    /// Latest center of the dragged item.
    pub position: Point,
    /// Container currently under the item, if any.
    pub target: Option<K>,
    /// Containers accepting the item, innermost first.
    pub relevant: Vec<K>,
    /// The session was cancelled.
    pub cancel_requested: bool,
    /// Engines must recompute cached shadow geometry.
    pub invalidate_geometry: bool,
}

/// Per-container outcome of the latest evaluation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DragResult {
    /// Pending insertion index, counted with the source item still in place.
    pub insertion_index: Option<usize>,
    /// Index of the source item, if this container is the source.
    pub removal_index: Option<usize>,
    /// Length of the dragged item along this container's axis, without paddings.
    pub item_size: Option<f64>,
    /// Item center projected onto this container's axis, while inside.
    pub pointer_projection: Option<f64>,
    /// The reserved gap.
    pub shadow: Option<ShadowBounds>,
    /// The container's extent changed; every rect must be re-measured.
    pub bounds_changed: bool,
}

/// Memoized measurements of one container.
///
/// Rects are fetched lazily and kept until invalidated.
#[derive(Clone, Debug, Default)]
pub struct LayoutCache {
    item_count: Option<usize>,
    container: Option<Rect>,
    visible: Option<Rect>,
    items: Option<Vec<Rect>>,
    last_visible: Option<Rect>,
}

impl LayoutCache {
    /// Drop everything, including the item count.
    pub fn invalidate(&mut self) {
        self.item_count = None;
        self.invalidate_rects();
    }

    /// Drop cached rects, keeping the item count.
    pub fn invalidate_rects(&mut self) {
        self.container = None;
        self.visible = None;
        self.items = None;
    }

    /// Number of items.
    pub fn item_count<K, G: Geometry<K> + ?Sized>(&mut self, geometry: &G, key: K) -> usize {
        *self
            .item_count
            .get_or_insert_with(|| geometry.item_count(key))
    }

    /// Rect of the container.
    pub fn container_rect<K, G: Geometry<K> + ?Sized>(&mut self, geometry: &G, key: K) -> Rect {
        *self
            .container
            .get_or_insert_with(|| geometry.container_rect(key))
    }

    /// Visible rect of the container. Non-empty results are remembered.
    pub fn visible_rect<K, G: Geometry<K> + ?Sized>(&mut self, geometry: &G, key: K) -> Rect {
        if let Some(rect) = self.visible {
            return rect;
        }
        let rect = geometry.visible_rect(key);
        if is_visible(rect) {
            self.last_visible = Some(rect);
        }
        self.visible = Some(rect);
        rect
    }

    /// The last visible rect that was not empty.
    pub fn last_visible(&self) -> Option<Rect> {
        self.last_visible
    }

    /// Layout rects of every item.
    pub fn item_rects<K: Copy, G: Geometry<K> + ?Sized>(
        &mut self,
        geometry: &G,
        key: K,
    ) -> &[Rect] {
        let n = self.item_count(geometry, key);
        self.items
            .get_or_insert_with(|| (0..n).map(|i| geometry.item_rect(key, i)).collect())
    }
}

pub(crate) fn is_visible(rect: Rect) -> bool {
    rect.width() > 0.0 && rect.height() > 0.0
}

/// Inclusive containment; [`Rect::contains`] excludes the far edges.
pub(crate) fn contains_closed(rect: Rect, pt: Point) -> bool {
    is_visible(rect) && rect.x0 <= pt.x && pt.x <= rect.x1 && rect.y0 <= pt.y && pt.y <= rect.y1
}

/// Per-pass inputs that are not part of the sample.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PassContext {
    /// A container earlier in the pass already holds the target.
    pub target_claimed: bool,
    /// Paddings of the source container along its own axis.
    pub source_padding: f64,
}

/// Incremental drag state of one container.
pub struct ContainerEngine<K, P> {
    key: K,
    options: ContainerOptions<P>,
    cache: LayoutCache,
    phase: ContainerPhase,
    result: DragResult,
    translations: Vec<f64>,
    transitions_on: bool,
    /// Item size from the latest entry; outlives leaving so the source gap stays closed.
    latched_size: Option<f64>,
    hidden: Option<usize>,
    translated_for: Option<(Option<usize>, Option<usize>)>,
    shadow_for: Option<usize>,
    adjustment_for: Option<usize>,
    first_insert_for: Option<usize>,
    placeholder_for: Option<Option<usize>>,
    stretcher: bool,
    was_inside: bool,
    ready_for: Option<usize>,
}

impl<K: core::fmt::Debug, P> core::fmt::Debug for ContainerEngine<K, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContainerEngine")
            .field("key", &self.key)
            .field("phase", &self.phase)
            .field("result", &self.result)
            .field("translations", &self.translations)
            .field("stretcher", &self.stretcher)
            .finish_non_exhaustive()
    }
}

impl<K, P> ContainerEngine<K, P>
where
    K: Copy + Eq + core::fmt::Debug,
    P: Clone,
{
    /// Create an idle engine for the container `key`.
    pub fn new(key: K, options: ContainerOptions<P>) -> Self {
        Self {
            key,
            options,
            cache: LayoutCache::default(),
            phase: ContainerPhase::Idle,
            result: DragResult::default(),
            translations: Vec::new(),
            transitions_on: false,
            latched_size: None,
            hidden: None,
            translated_for: None,
            shadow_for: None,
            adjustment_for: None,
            first_insert_for: None,
            placeholder_for: None,
            stretcher: false,
            was_inside: false,
            ready_for: None,
        }
    }

    /// Host key of the container.
    pub fn key(&self) -> K {
        self.key
    }

    /// Current options.
    pub fn options(&self) -> &ContainerOptions<P> {
        &self.options
    }

    /// Mutable access to the options.
    pub fn options_mut(&mut self) -> &mut ContainerOptions<P> {
        &mut self.options
    }

    /// Position in the session state machine.
    pub fn phase(&self) -> ContainerPhase {
        self.phase
    }

    /// Result of the latest evaluation.
    pub fn result(&self) -> &DragResult {
        &self.result
    }

    /// Offsets currently applied to each item along the axis.
    pub fn translations(&self) -> &[f64] {
        &self.translations
    }

    /// Measurement cache.
    pub fn cache(&self) -> &LayoutCache {
        &self.cache
    }

    /// Drop all cached measurements.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Drop cached rects.
    pub fn invalidate_rects(&mut self) {
        self.cache.invalidate_rects();
    }

    /// Visible rect of the container, from the cache.
    pub fn visible_rect<G: Geometry<K> + ?Sized>(&mut self, geometry: &G) -> Rect {
        self.cache.visible_rect(geometry, self.key)
    }

    /// Read and clear the one-shot bounds-changed flag.
    pub fn take_bounds_changed(&mut self) -> bool {
        core::mem::take(&mut self.result.bounds_changed)
    }

    /// Whether this container accepts items dragged from `source`.
    ///
    /// `geometry` answers whether this container is nested inside the dragged item.
    pub fn is_drag_relevant<G: Geometry<K> + ?Sized>(
        &self,
        geometry: &G,
        source: &Self,
        item_index: usize,
        payload: Option<&P>,
    ) -> bool {
        if self.options.disabled {
            return false;
        }
        if let Some(accept) = &self.options.accept_drop {
            return match accept(&source.options, payload) {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(container = ?self.key, %err, "accept_drop failed; treating as rejected");
                    false
                }
            };
        }
        if self.options.behaviour == Behaviour::Copy {
            return false;
        }
        if geometry.item_contains(source.key, item_index, self.key) {
            return false;
        }
        if source.key == self.key {
            return true;
        }
        self.options.shares_group_with(&source.options)
    }

    /// Arm the engine for a new session.
    pub fn prepare<H: Geometry<K> + Renderer<K> + ?Sized>(&mut self, host: &mut H) {
        self.reset_session_state();
        self.cache.invalidate();
        let n = self.cache.item_count(&*host, self.key);
        self.translations = vec![0.0; n];
        for index in 0..n {
            host.set_item_transition(
                ItemRef::new(self.key, index),
                Some(self.options.animation_duration),
            );
        }
        self.transitions_on = true;
        self.phase = ContainerPhase::Armed;
    }

    fn reset_session_state(&mut self) {
        self.result = DragResult::default();
        self.translations.clear();
        self.transitions_on = false;
        self.latched_size = None;
        self.hidden = None;
        self.translated_for = None;
        self.shadow_for = None;
        self.adjustment_for = None;
        self.first_insert_for = None;
        self.placeholder_for = None;
        self.stretcher = false;
        self.was_inside = false;
        self.ready_for = None;
    }

    fn orientation(&self) -> Orientation {
        self.options.orientation
    }

    fn sync_item_count<G: Geometry<K> + ?Sized>(&mut self, geometry: &G) -> usize {
        let n = self.cache.item_count(geometry, self.key);
        if self.translations.len() != n {
            self.translations.resize(n, 0.0);
        }
        n
    }

    /// Visual span of item `index`.
    fn visual_span<G: Geometry<K> + ?Sized>(&mut self, geometry: &G, index: usize) -> Span {
        let orientation = self.orientation();
        if self.result.removal_index == Some(index) {
            let at = match index.checked_sub(1) {
                Some(prev) => self.visual_span(geometry, prev).end,
                None => orientation.begin(self.cache.container_rect(geometry, self.key)),
            };
            return Span::point(at);
        }
        let rect = self.cache.item_rects(geometry, self.key)[index];
        orientation
            .span(rect)
            .translate(self.translations.get(index).copied().unwrap_or(0.0))
    }

    fn search<G: Geometry<K> + ?Sized>(
        &mut self,
        geometry: &G,
        n: usize,
        pos: f64,
        mode: SearchMode,
    ) -> usize {
        // Warm the caches so the search only reads.
        let container_begin = self
            .orientation()
            .begin(self.cache.container_rect(geometry, self.key));
        let _ = self.cache.item_rects(geometry, self.key);
        let orientation = self.orientation();
        let removed = self.result.removal_index;
        let rects = self.cache.items.as_deref().unwrap_or(&[]);
        let translations = &self.translations;
        let span_of = |i: usize| -> Span {
            orientation
                .span(rects[i])
                .translate(translations.get(i).copied().unwrap_or(0.0))
        };
        let span_at = |i: usize| {
            if removed == Some(i) {
                Span::point(i.checked_sub(1).map_or(container_begin, |p| span_of(p).end))
            } else {
                span_of(i)
            }
        };
        find_insertion_index(n.min(rects.len()), &span_at, pos, mode)
    }

    /// Next insertion index for `pos` given the current shadow.
    fn next_insertion_index<G: Geometry<K> + ?Sized>(
        &mut self,
        geometry: &G,
        n: usize,
        pos: f64,
    ) -> usize {
        let Some(shadow) = self.result.shadow else {
            return self.search(geometry, n, pos, SearchMode::Midpoint).min(n);
        };
        let index = if pos < shadow.effective_begin() {
            let i = self.search(geometry, n, pos, SearchMode::Housing);
            if i < n && self.visual_span(geometry, i).end < pos {
                i + 1
            } else {
                i
            }
        } else if pos > shadow.end {
            let i = self.search(geometry, n, pos, SearchMode::Housing);
            if i < n && self.visual_span(geometry, i).begin <= pos {
                i + 1
            } else {
                i
            }
        } else {
            match self.result.insertion_index {
                Some(index) => index,
                None => self.search(geometry, n, pos, SearchMode::Midpoint),
            }
        };
        index.min(n)
    }

    fn compute_shadow<G: Geometry<K> + ?Sized>(
        &mut self,
        geometry: &G,
        n: usize,
        added: usize,
        size: f64,
    ) -> ShadowBounds {
        let orientation = self.orientation();
        let removed = self.result.removal_index;
        let container = self.cache.container_rect(geometry, self.key);

        let mut before = added.checked_sub(1);
        if before.is_some() && before == removed {
            before = before.and_then(|b| b.checked_sub(1));
        }
        let (begin, drop_begin) = match before {
            Some(b) if b < n => {
                let span = self.visual_span(geometry, b);
                let shrink = if size < span.len() {
                    (span.len() - size) / 2.0
                } else {
                    0.0
                };
                (span.end - shrink, span.end)
            }
            _ => (orientation.begin(container), orientation.begin(container)),
        };

        let mut after = added;
        if Some(after) == removed {
            after += 1;
        }
        let (end, drop_end) = if after < n {
            let span = self.visual_span(geometry, after);
            let shrink = if size < span.len() {
                (span.len() - size) / 2.0
            } else {
                0.0
            };
            (span.begin + shrink, span.begin)
        } else {
            (orientation.end(container), orientation.end(container))
        };

        ShadowBounds {
            begin,
            end,
            drop_area: Span::new(drop_begin, drop_end),
            begin_adjustment: self.result.shadow.map_or(0.0, |s| s.begin_adjustment),
            top_left: orientation.top_left_for_begin(container, drop_begin),
        }
    }

    fn apply_translations<H: Geometry<K> + Renderer<K> + ?Sized>(
        &mut self,
        host: &mut H,
        added: Option<usize>,
        removed: Option<usize>,
        size: f64,
    ) {
        let step = size + self.options.item_padding();
        let orientation = self.orientation();
        for index in 0..self.translations.len() {
            if Some(index) == removed {
                continue;
            }
            let mut offset = 0.0;
            if removed.is_some_and(|r| r < index) {
                offset -= step;
            }
            if added.is_some_and(|a| a <= index) {
                offset += step;
            }
            if self.translations[index] != offset {
                self.translations[index] = offset;
                host.set_item_translation(ItemRef::new(self.key, index), orientation.offset(offset));
            }
        }
    }

    fn update_stretcher<H: Geometry<K> + Renderer<K> + ?Sized>(
        &mut self,
        host: &mut H,
        n: usize,
        added: Option<usize>,
        size: f64,
    ) {
        if self.result.removal_index.is_some() {
            return;
        }
        let orientation = self.orientation();
        match added {
            Some(_) if !self.stretcher => {
                let rect = self.cache.container_rect(&*host, self.key);
                let metrics = host.scroll_metrics(self.key);
                let content = orientation.extent(metrics.content);
                let client = orientation.extent(metrics.client);
                let container_end = if content > client {
                    orientation.begin(rect) + content - orientation.component(metrics.offset)
                } else {
                    orientation.end(rect)
                };
                let last_end = match n.checked_sub(1) {
                    Some(last) => orientation.end(self.cache.item_rects(&*host, self.key)[last]),
                    None => orientation.begin(rect),
                };
                if last_end + size > container_end {
                    let along = size + self.options.item_padding();
                    let stretch = match orientation {
                        Orientation::Horizontal => Size::new(along, rect.height()),
                        Orientation::Vertical => Size::new(rect.width(), along),
                    };
                    host.show_stretcher(self.key, stretch);
                    self.stretcher = true;
                    self.result.bounds_changed = true;
                    trace!(container = ?self.key, along, "stretcher shown");
                }
            }
            None if self.stretcher => {
                host.remove_stretcher(self.key);
                self.stretcher = false;
                self.result.bounds_changed = true;
                trace!(container = ?self.key, "stretcher removed");
            }
            _ => {}
        }
    }

    fn update_placeholder<H: Geometry<K> + Renderer<K> + ?Sized>(
        &mut self,
        host: &mut H,
        added: Option<usize>,
        size: f64,
    ) {
        if self.options.drop_placeholder.is_none() {
            return;
        }
        let container_begin = self
            .orientation()
            .begin(self.cache.container_rect(&*host, self.key));
        match (added, self.placeholder_for) {
            (Some(a), None) => {
                let offset = self
                    .result
                    .shadow
                    .map_or(0.0, |s| s.drop_area.begin - container_begin);
                host.show_drop_placeholder(self.key, offset, size);
                self.placeholder_for = Some(Some(a));
            }
            (Some(a), Some(prev)) if prev != Some(a) => {
                let offset = self
                    .result
                    .shadow
                    .map_or(0.0, |s| s.drop_area.begin - container_begin);
                host.move_drop_placeholder(self.key, offset, size);
                self.placeholder_for = Some(Some(a));
            }
            (None, Some(_)) => {
                host.remove_drop_placeholder(self.key);
                self.placeholder_for = None;
            }
            _ => {}
        }
    }

    fn update_enter_leave(&mut self, inside: bool, events: &mut Vec<DragEvent<K, P>>) {
        if inside == self.was_inside {
            return;
        }
        self.was_inside = inside;
        if inside {
            self.phase = ContainerPhase::Targeted;
            events.push(DragEvent::DragEnter {
                container: self.key,
            });
        } else {
            self.phase = ContainerPhase::Armed;
            events.push(DragEvent::DragLeave {
                container: self.key,
            });
        }
    }

    fn update_drop_ready(
        &mut self,
        sample: &DragSample<K, P>,
        added: Option<usize>,
        events: &mut Vec<DragEvent<K, P>>,
    ) {
        let Some(added) = added else {
            self.ready_for = None;
            return;
        };
        if self.ready_for == Some(added) {
            return;
        }
        self.ready_for = Some(added);
        let removed = self.result.removal_index;
        events.push(DragEvent::DropReady {
            container: self.key,
            result: DropResult {
                removed_index: removed,
                added_index: Some(adjust_for_removal(added, removed)),
                payload: sample.payload.clone(),
            },
        });
    }

    /// Run one evaluation pass and return the updated result.
    ///
    /// Events produced by the pass are appended to `events`.
    pub fn evaluate<H: Geometry<K> + Renderer<K> + ?Sized>(
        &mut self,
        host: &mut H,
        sample: &DragSample<K, P>,
        ctx: PassContext,
        events: &mut Vec<DragEvent<K, P>>,
    ) -> &DragResult {
        let orientation = self.orientation();
        let n = self.sync_item_count(&*host);

        if self.result.removal_index.is_none()
            && sample.source == self.key
            && self.options.behaviour != Behaviour::Copy
            && sample.item_index < n
        {
            self.result.removal_index = Some(sample.item_index);
        }
        if let Some(removed) = self.result.removal_index {
            if self.hidden != Some(removed) {
                host.set_item_visibility(ItemRef::new(self.key, removed), false);
                self.hidden = Some(removed);
            }
        }

        let visible = self.cache.visible_rect(&*host, self.key);
        let inside = !ctx.target_claimed && contains_closed(visible, sample.position);
        let projection = inside.then(|| orientation.coord(sample.position));

        let entry_size = orientation.extent(sample.size) - ctx.source_padding;
        let size = projection.map(|_| self.result.item_size.unwrap_or(entry_size));
        self.result.item_size = size;
        if size.is_some() {
            self.latched_size = size;
        }
        let item_size = self.latched_size.unwrap_or(entry_size);

        if self.options.behaviour == Behaviour::DropZone {
            self.evaluate_drop_zone(&*host, projection);
        } else {
            if sample.invalidate_geometry {
                self.result.shadow = match (projection, self.result.insertion_index) {
                    (Some(_), Some(added)) => Some(self.compute_shadow(&*host, n, added, item_size)),
                    _ => None,
                };
            }

            let added = projection.map(|pos| self.next_insertion_index(&*host, n, pos));

            if added != self.adjustment_for && self.adjustment_for.is_some() {
                if let Some(shadow) = &mut self.result.shadow {
                    shadow.begin_adjustment = 0.0;
                }
            }
            self.adjustment_for = added;

            self.update_stretcher(host, n, added, item_size);

            let removed = self.result.removal_index;
            if self.translated_for != Some((added, removed)) {
                self.apply_translations(host, added, removed, item_size);
                self.translated_for = Some((added, removed));
            }
            self.result.insertion_index = added;

            match (projection, added) {
                (Some(_), Some(a)) => {
                    if sample.invalidate_geometry || self.shadow_for != Some(a) {
                        self.result.shadow = Some(self.compute_shadow(&*host, n, a, item_size));
                        self.shadow_for = Some(a);
                    }
                }
                _ => {
                    self.result.shadow = None;
                    self.shadow_for = None;
                }
            }

            self.update_placeholder(host, added, item_size);

            match (projection, added) {
                (Some(pos), Some(_)) => {
                    if self.first_insert_for.is_none() {
                        if let Some(shadow) = &mut self.result.shadow {
                            if pos < shadow.begin {
                                shadow.begin_adjustment = pos - shadow.begin - FIRST_INSERT_SLACK;
                            }
                        }
                        self.first_insert_for = added;
                    }
                }
                _ => self.first_insert_for = None,
            }
        }
        self.result.pointer_projection = projection;

        self.update_enter_leave(inside, events);
        let added = self.result.insertion_index;
        self.update_drop_ready(sample, added, events);

        trace!(
            container = ?self.key,
            projection = ?self.result.pointer_projection,
            insertion = ?self.result.insertion_index,
            removal = ?self.result.removal_index,
            "evaluated"
        );
        &self.result
    }

    fn evaluate_drop_zone<G: Geometry<K> + ?Sized>(&mut self, geometry: &G, projection: Option<f64>) {
        let added = projection.map(|_| 0);
        if added != self.shadow_for {
            self.shadow_for = added;
            self.result.shadow = added.map(|_| {
                let container = self.cache.container_rect(geometry, self.key);
                let span = self.orientation().span(container);
                ShadowBounds {
                    begin: span.begin,
                    end: span.end,
                    drop_area: span,
                    begin_adjustment: 0.0,
                    top_left: self.orientation().top_left_for_begin(container, span.begin),
                }
            });
        }
        self.result.insertion_index = added;
    }

    /// Reopen the source slot and return where the proxy should glide back to.
    ///
    /// Falls back to the last visible rect when the container is scrolled or
    /// clipped out of view. Returns `None` when this engine holds no removal.
    pub fn glide_back_target<H: Geometry<K> + Renderer<K> + ?Sized>(
        &mut self,
        host: &mut H,
    ) -> Option<Point> {
        let removed = self.result.removal_index?;
        let visible = self.cache.visible_rect(&*host, self.key);
        if !is_visible(visible) {
            if let Some(last) = self.cache.last_visible() {
                return Some(last.origin());
            }
        }
        let size = self.latched_size.or(self.result.item_size).unwrap_or(0.0);
        self.apply_translations(host, Some(removed), Some(removed), size);
        self.translated_for = Some((Some(removed), Some(removed)));
        let container = self.cache.container_rect(&*host, self.key);
        let begin = match removed.checked_sub(1) {
            Some(prev) => self.visual_span(&*host, prev).end,
            None => self.orientation().begin(container),
        };
        Some(self.orientation().top_left_for_begin(container, begin))
    }

    /// Clear every visual effect of the session.
    pub fn reset_visuals<H: Renderer<K> + ?Sized>(&mut self, host: &mut H) {
        let orientation = self.orientation();
        for (index, offset) in self.translations.iter_mut().enumerate() {
            let item = ItemRef::new(self.key, index);
            if self.transitions_on {
                host.set_item_transition(item, None);
            }
            if *offset != 0.0 {
                *offset = 0.0;
                host.set_item_translation(item, orientation.offset(0.0));
            }
        }
        self.transitions_on = false;
        if let Some(hidden) = self.hidden.take() {
            host.set_item_visibility(ItemRef::new(self.key, hidden), true);
        }
        if self.stretcher {
            host.remove_stretcher(self.key);
            self.stretcher = false;
        }
        if self.placeholder_for.take().is_some() {
            host.remove_drop_placeholder(self.key);
        }
    }

    /// Finish the session for this container.
    ///
    /// Returns the structural change to apply, or `None` when the drop was
    /// cancelled or landed nowhere. With `for_dispose` the container is going
    /// away mid-drag and only reports its removal.
    pub fn commit<H: Renderer<K> + ?Sized>(
        &mut self,
        host: &mut H,
        sample: &DragSample<K, P>,
        for_dispose: bool,
    ) -> Option<DropResult<P>> {
        self.reset_visuals(host);
        let lands = sample.target.is_some() || self.options.remove_on_drop_out || for_dispose;
        let result = if sample.cancel_requested || !lands {
            None
        } else {
            let removed = self.result.removal_index;
            let added = if for_dispose {
                None
            } else {
                self.result.insertion_index
            };
            Some(DropResult {
                removed_index: removed,
                added_index: added.map(|a| adjust_for_removal(a, removed)),
                payload: sample.payload.clone(),
            })
            .filter(|r| !r.is_noop())
        };
        self.phase = if result.is_some() {
            ContainerPhase::Committed
        } else {
            ContainerPhase::Reverted
        };
        debug!(container = ?self.key, phase = ?self.phase, result = ?result.as_ref().map(|r| (r.removed_index, r.added_index)), "committed");
        self.reset_session_state();
        self.cache.invalidate();
        result
    }

    /// Return to idle without reporting anything.
    pub fn reset<H: Renderer<K> + ?Sized>(&mut self, host: &mut H) {
        self.reset_visuals(host);
        self.reset_session_state();
        self.phase = ContainerPhase::Idle;
    }
}

/// Insertion index after the removal at `removed` has been applied.
pub fn adjust_for_removal(added: usize, removed: Option<usize>) -> usize {
    match removed {
        Some(r) if r < added => added - 1,
        _ => added,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ScrollMetrics, Scrollable};
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::time::Duration;
    use kurbo::Vec2;

    /// A single vertical column of stacked items.
    struct Column {
        rect: Rect,
        heights: Vec<f64>,
        calls: Vec<String>,
    }

    impl Column {
        fn new(heights: &[f64]) -> Self {
            Self {
                rect: Rect::new(0.0, 0.0, 100.0, 200.0),
                heights: heights.to_vec(),
                calls: Vec::new(),
            }
        }
    }

    impl Geometry<u32> for Column {
        fn item_count(&self, _: u32) -> usize {
            self.heights.len()
        }
        fn item_rect(&self, _: u32, index: usize) -> Rect {
            let y: f64 = self.heights[..index].iter().sum();
            Rect::new(0.0, y, 100.0, y + self.heights[index])
        }
        fn container_rect(&self, _: u32) -> Rect {
            self.rect
        }
        fn visible_rect(&self, _: u32) -> Rect {
            self.rect
        }
        fn scroll_metrics(&self, _: u32) -> ScrollMetrics {
            ScrollMetrics::default()
        }
        fn scrollable_ancestors(&self, _: u32) -> Vec<Scrollable<u32>> {
            Vec::new()
        }
        fn contains(&self, _: u32, _: u32) -> bool {
            false
        }
    }

    impl Renderer<u32> for Column {
        fn clone_visual(&mut self, _: ItemRef<u32>, _: Rect) -> crate::types::ProxyHandle {
            crate::types::ProxyHandle(1)
        }
        fn position_proxy(&mut self, _: crate::types::ProxyHandle, _: Point, _: crate::types::ProxyMotion) {}
        fn remove_proxy(&mut self, _: crate::types::ProxyHandle) {}
        fn add_class(&mut self, _: crate::types::ClassTarget, _: &str) {}
        fn remove_class(&mut self, _: crate::types::ClassTarget, _: &str) {}
        fn set_item_translation(&mut self, item: ItemRef<u32>, offset: Vec2) {
            self.calls.push(alloc::format!("translate {} {}", item.index, offset.y));
        }
        fn set_item_visibility(&mut self, item: ItemRef<u32>, visible: bool) {
            self.calls.push(alloc::format!("visible {} {}", item.index, visible));
        }
        fn set_item_transition(&mut self, _: ItemRef<u32>, _: Option<Duration>) {}
        fn show_stretcher(&mut self, _: u32, _: Size) {
            self.calls.push("stretcher".into());
        }
        fn remove_stretcher(&mut self, _: u32) {
            self.calls.push("unstretch".into());
        }
        fn show_drop_placeholder(&mut self, _: u32, _: f64, _: f64) {}
        fn move_drop_placeholder(&mut self, _: u32, _: f64, _: f64) {}
        fn remove_drop_placeholder(&mut self, _: u32) {}
    }

    fn sample(y: f64) -> DragSample<u32, u32> {
        DragSample {
            source: 0,
            item_index: 0,
            size: Size::new(100.0, 20.0),
            payload: Some(7),
            pointer: Point::new(50.0, y),
            position: Point::new(50.0, y),
            target: None,
            relevant: vec![0],
            cancel_requested: false,
            invalidate_geometry: false,
        }
    }

    fn armed(col: &mut Column) -> ContainerEngine<u32, u32> {
        let mut engine = ContainerEngine::new(0, ContainerOptions::default());
        engine.prepare(col);
        engine
    }

    #[test]
    fn dragging_down_shifts_neighbors_up() {
        let mut col = Column::new(&[20.0, 20.0, 20.0]);
        let mut engine = armed(&mut col);
        let mut events = Vec::new();

        engine.evaluate(&mut col, &sample(10.0), PassContext::default(), &mut events);
        assert_eq!(engine.result().insertion_index, Some(1));
        assert_eq!(engine.result().removal_index, Some(0));
        assert_eq!(engine.translations(), &[0.0, 0.0, 0.0]);

        engine.evaluate(&mut col, &sample(35.0), PassContext::default(), &mut events);
        assert_eq!(engine.result().insertion_index, Some(2));
        assert_eq!(engine.translations(), &[0.0, -20.0, 0.0]);

        engine.evaluate(&mut col, &sample(55.0), PassContext::default(), &mut events);
        assert_eq!(engine.result().insertion_index, Some(3));
        assert_eq!(engine.translations(), &[0.0, -20.0, -20.0]);
        let shadow = engine.result().shadow.unwrap();
        assert_eq!((shadow.begin, shadow.end), (40.0, 200.0));
    }

    #[test]
    fn unchanged_sample_is_idempotent() {
        let mut col = Column::new(&[20.0, 20.0, 20.0]);
        let mut engine = armed(&mut col);
        let mut events = Vec::new();
        engine.evaluate(&mut col, &sample(35.0), PassContext::default(), &mut events);
        let before = engine.result().clone();
        col.calls.clear();
        events.clear();

        engine.evaluate(&mut col, &sample(35.0), PassContext::default(), &mut events);
        assert_eq!(engine.result(), &before);
        assert!(col.calls.is_empty(), "unexpected calls: {:?}", col.calls);
        assert!(events.is_empty(), "unexpected events: {events:?}");
    }

    #[test]
    fn claimed_target_suppresses_projection() {
        let mut col = Column::new(&[20.0, 20.0]);
        let mut engine = armed(&mut col);
        let mut events = Vec::new();
        let ctx = PassContext {
            target_claimed: true,
            ..PassContext::default()
        };
        engine.evaluate(&mut col, &sample(10.0), ctx, &mut events);
        assert_eq!(engine.result().pointer_projection, None);
        assert_eq!(engine.result().insertion_index, None);
        assert_eq!(engine.phase(), ContainerPhase::Armed);
        assert!(events.is_empty(), "no enter expected: {events:?}");
    }

    #[test]
    fn enter_and_drop_ready_fire_once() {
        let mut col = Column::new(&[20.0, 20.0, 20.0]);
        let mut engine = armed(&mut col);
        let mut events = Vec::new();
        engine.evaluate(&mut col, &sample(10.0), PassContext::default(), &mut events);
        engine.evaluate(&mut col, &sample(12.0), PassContext::default(), &mut events);
        assert_eq!(
            events,
            vec![
                DragEvent::DragEnter { container: 0 },
                DragEvent::DropReady {
                    container: 0,
                    result: DropResult {
                        removed_index: Some(0),
                        added_index: Some(0),
                        payload: Some(7),
                    },
                },
            ]
        );
        assert_eq!(engine.phase(), ContainerPhase::Targeted);

        events.clear();
        engine.evaluate(&mut col, &sample(500.0), PassContext::default(), &mut events);
        assert_eq!(events, vec![DragEvent::DragLeave { container: 0 }]);
        assert_eq!(engine.result().insertion_index, None);
        assert_eq!(engine.translations(), &[0.0, -20.0, -20.0]);
    }

    #[test]
    fn source_gap_stays_closed_after_leaving() {
        let mut col = Column::new(&[20.0, 20.0, 20.0]);
        let mut engine = armed(&mut col);
        let mut events = Vec::new();
        engine.evaluate(&mut col, &sample(10.0), PassContext::default(), &mut events);
        engine.evaluate(&mut col, &sample(55.0), PassContext::default(), &mut events);
        col.calls.clear();

        let mut far = sample(500.0);
        far.position.x = 500.0;
        engine.evaluate(&mut col, &far, PassContext::default(), &mut events);
        assert_eq!(engine.result().item_size, None);
        assert_eq!(engine.result().removal_index, Some(0));
        assert_eq!(engine.translations(), &[0.0, -20.0, -20.0]);
        assert!(col.calls.is_empty(), "unexpected calls: {:?}", col.calls);

        // Gliding back reopens the slot with the size seen on entry.
        let back = engine.glide_back_target(&mut col);
        assert_eq!(back, Some(Point::new(0.0, 0.0)));
        assert_eq!(engine.translations(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn first_insert_adjustment_resets_when_the_index_moves() {
        let mut col = Column::new(&[40.0, 40.0, 40.0]);
        let mut engine = armed(&mut col);
        let mut events = Vec::new();
        let mut s = sample(25.0);
        s.source = 9;

        // Entering between item 0's midpoint and the shrunken shadow begin.
        engine.evaluate(&mut col, &s, PassContext::default(), &mut events);
        assert_eq!(engine.result().insertion_index, Some(1));
        let shadow = engine.result().shadow.unwrap();
        assert_eq!((shadow.begin, shadow.end), (30.0, 70.0));
        assert_eq!(shadow.begin_adjustment, -10.0);

        // Inside the widened shadow the index holds.
        s.position.y = 22.0;
        engine.evaluate(&mut col, &s, PassContext::default(), &mut events);
        assert_eq!(engine.result().insertion_index, Some(1));
        assert_eq!(engine.result().shadow.unwrap().begin_adjustment, -10.0);

        s.position.y = 10.0;
        engine.evaluate(&mut col, &s, PassContext::default(), &mut events);
        assert_eq!(engine.result().insertion_index, Some(0));
        assert_eq!(engine.result().shadow.unwrap().begin_adjustment, 0.0);
    }

    #[test]
    fn commit_adjusts_for_removal_and_resets() {
        let mut col = Column::new(&[20.0, 20.0, 20.0]);
        let mut engine = armed(&mut col);
        let mut events = Vec::new();
        engine.evaluate(&mut col, &sample(10.0), PassContext::default(), &mut events);
        engine.evaluate(&mut col, &sample(55.0), PassContext::default(), &mut events);

        let mut s = sample(55.0);
        s.target = Some(0);
        let result = engine.commit(&mut col, &s, false).unwrap();
        assert_eq!((result.removed_index, result.added_index), (Some(0), Some(2)));
        assert_eq!(engine.phase(), ContainerPhase::Committed);
        assert!(engine.translations().is_empty());
        assert!(col.calls.iter().any(|c| c == "visible 0 true"));
    }

    #[test]
    fn cancelled_commit_reverts() {
        let mut col = Column::new(&[20.0, 20.0]);
        let mut engine = armed(&mut col);
        let mut events = Vec::new();
        engine.evaluate(&mut col, &sample(10.0), PassContext::default(), &mut events);
        let mut s = sample(10.0);
        s.cancel_requested = true;
        assert_eq!(engine.commit(&mut col, &s, false), None);
        assert_eq!(engine.phase(), ContainerPhase::Reverted);
    }

    #[test]
    fn foreign_container_grows_stretcher_when_full() {
        let mut col = Column::new(&[100.0, 90.0]);
        let mut engine = armed(&mut col);
        let mut events = Vec::new();
        let mut s = sample(150.0);
        s.source = 9;
        engine.evaluate(&mut col, &s, PassContext::default(), &mut events);
        assert!(col.calls.iter().any(|c| c == "stretcher"));
        assert!(engine.take_bounds_changed());
        assert!(!engine.take_bounds_changed());

        s.position.y = 900.0;
        engine.evaluate(&mut col, &s, PassContext::default(), &mut events);
        assert!(col.calls.iter().any(|c| c == "unstretch"));
    }

    #[test]
    fn drop_zone_always_inserts_at_zero() {
        let mut col = Column::new(&[20.0, 20.0, 20.0]);
        let mut engine = ContainerEngine::new(
            0,
            ContainerOptions {
                behaviour: Behaviour::DropZone,
                ..ContainerOptions::default()
            },
        );
        engine.prepare(&mut col);
        let mut events = Vec::new();
        let mut s = sample(55.0);
        s.source = 9;
        engine.evaluate(&mut col, &s, PassContext::default(), &mut events);
        assert_eq!(engine.result().insertion_index, Some(0));
        assert_eq!(engine.translations(), &[0.0, 0.0, 0.0]);
        assert_eq!(engine.result().shadow.unwrap().top_left, Point::new(0.0, 0.0));
    }
}
