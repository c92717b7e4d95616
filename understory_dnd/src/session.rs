// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag session coordinator.
//!
//! ## Overview
//!
//! [`SessionManager`] owns the container registry and at most one active
//! session. The host forwards pointer input and scheduler callbacks to it; the
//! manager answers through the host's collaborator traits and queues
//! [`DragEvent`]s for the host to drain.
//!
//! A session goes through these stages:
//!
//! - **Pending**: a press landed on a draggable item. The drag starts after a
//!   small move, or once the start delay elapses when one applies. Moving too
//!   far during the delay aborts.
//! - **Dragging**: each move repositions the proxy and requests an evaluation
//!   pass. Passes are coalesced to one leading pass plus at most one trailing
//!   pass per animation frame. Every relevant container is evaluated in
//!   innermost-first order and the first one containing the item claims the
//!   target.
//! - **Dropping**: the proxy animates to its destination. Moves are ignored.
//!   When the animation finishes every container receives
//!   [`DragEvent::DragEnd`], structural changes are applied through the
//!   [`Mutator`](crate::host::Mutator), and [`DragEvent::Drop`] is emitted.
//!
//! Misuse of the lifecycle (a release without a press, a second press during a
//! session, a stale task id) is ignored.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::time::Duration;

use kurbo::{Insets, Point, Vec2};
use tracing::{debug, trace, warn};

use crate::autoscroll::{AutoScroller, ScrollPlan, merge_scrollers, plan_autoscroll};
use crate::config::{
    ContainerOptions, DEFAULT_ANIMATION_DURATION, OptionsUpdate, SessionSettings, UpdateMode,
};
use crate::engine::{ContainerEngine, DragResult, DragSample, PassContext};
use crate::error::DndError;
use crate::host::{Geometry, HitTest, Host};
use crate::types::{
    Axis, Behaviour, ClassTarget, ContainerPhase, DragEvent, DragStartInfo, ItemRef, PointerEvent,
    PointerKind, ProxyHandle, ProxyMotion, TaskId,
};

/// Class added to the document while a press is held.
pub const NO_USER_SELECT_CLASS: &str = "dnd-no-user-select";
/// Class added to the document while a press is held.
pub const DISABLE_TOUCH_ACTIONS_CLASS: &str = "dnd-disable-touch-actions";
/// Class added to every proxy.
pub const GHOST_CLASS: &str = "dnd-ghost";
/// Class added to the proxy while it animates to its destination.
pub const DROP_ANIMATION_CLASS: &str = "dnd-animated";

/// Position used to push every container out of reach when cancelling.
const FAR_AWAY: f64 = 1.0e15;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum TaskKind {
    StartDelay,
    DragFrame,
    Relayout,
    RectWatch,
    AutoScrollTick,
    DropAnimationEnd,
}

#[derive(Clone, Debug)]
struct Grab<K> {
    item: ItemRef<K>,
    origin: Point,
    latest: Point,
    timer: Option<TaskId>,
}

#[derive(Clone, Debug)]
struct Proxy {
    handle: ProxyHandle,
    top_left: Point,
    /// Item center minus the press position.
    center_delta: Vec2,
    /// Item top-left minus the press position.
    position_delta: Vec2,
}

struct Session<K, P> {
    sample: DragSample<K, P>,
    proxy: Proxy,
    lock_axis: Option<Axis>,
    autoscroll: AutoScroller<K>,
    frame: Option<TaskId>,
    trailing: bool,
    relayout: Option<TaskId>,
    rect_watch: Option<TaskId>,
    scroll_tick: Option<TaskId>,
    drop_task: Option<TaskId>,
    dropping: bool,
    canceling: bool,
}

enum State<K, P> {
    Idle,
    Pending(Grab<K>),
    Dragging(Box<Session<K, P>>),
}

/// Registry of containers plus the active drag session.
///
/// `K` is the host's container key and `P` the payload carried by dragged
/// items. Every operation that touches the outside world takes the host by
/// `&mut`.
///
/// ```
/// use kurbo::{Point, Rect};
/// use understory_dnd::config::ContainerOptions;
/// use understory_dnd::scene::Scene;
/// use understory_dnd::session::SessionManager;
/// use understory_dnd::types::{DragEvent, PointerEvent};
///
/// let mut scene = Scene::new();
/// let list = scene.add_list(None, Rect::new(0.0, 0.0, 100.0, 300.0), &[20.0, 20.0, 20.0]);
/// let mut dnd: SessionManager<_, ()> = SessionManager::new();
/// dnd.register_container(&mut scene, list, ContainerOptions::default()).unwrap();
///
/// let first = scene.item(list, 0).unwrap();
/// dnd.pointer_down(&mut scene, &PointerEvent::mouse(Point::new(50.0, 10.0), Some(first)));
/// dnd.pointer_move(&mut scene, Point::new(50.0, 30.0));
/// assert!(dnd.is_dragging());
/// dnd.pointer_up(&mut scene);
/// scene.run_until_idle(&mut dnd);
///
/// let drop = dnd.take_events().into_iter().find_map(|e| match e {
///     DragEvent::Drop { result, .. } => Some(result),
///     _ => None,
/// });
/// assert_eq!(drop.map(|r| (r.removed_index, r.added_index)), Some((Some(0), Some(1))));
/// ```
pub struct SessionManager<K, P> {
    settings: SessionSettings,
    containers: Vec<ContainerEngine<K, P>>,
    state: State<K, P>,
    tasks: BTreeMap<TaskId, TaskKind>,
    events: Vec<DragEvent<K, P>>,
}

impl<K: Debug, P> Debug for SessionManager<K, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = match &self.state {
            State::Idle => "idle",
            State::Pending(_) => "pending",
            State::Dragging(s) if s.dropping => "dropping",
            State::Dragging(_) => "dragging",
        };
        f.debug_struct("SessionManager")
            .field("settings", &self.settings)
            .field("containers", &self.containers)
            .field("state", &state)
            .field("tasks", &self.tasks.len())
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl<K, P> Default for SessionManager<K, P>
where
    K: Copy + Eq + Debug,
    P: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, P> SessionManager<K, P>
where
    K: Copy + Eq + Debug,
    P: Clone,
{
    /// Create an empty manager with default settings.
    pub fn new() -> Self {
        Self::with_settings(SessionSettings::default())
    }

    /// Create an empty manager with custom settings.
    pub fn with_settings(settings: SessionSettings) -> Self {
        Self {
            settings,
            containers: Vec::new(),
            state: State::Idle,
            tasks: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Session tunables.
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    // --- registry ---

    /// Register a container under the host key `key`.
    ///
    /// A container registered mid-drag joins the session when it accepts the
    /// dragged item.
    pub fn register_container<H: Host<K> + ?Sized>(
        &mut self,
        host: &mut H,
        key: K,
        options: ContainerOptions<P>,
    ) -> Result<(), DndError<K>> {
        if self.index_of(key).is_some() {
            return Err(DndError::AlreadyRegistered(key));
        }
        self.containers.push(ContainerEngine::new(key, options));
        debug!(container = ?key, "registered container");

        let Some(mut s) = self.take_session() else {
            return Ok(());
        };
        if !s.dropping {
            self.join_session(host, &mut s, key);
        }
        self.put_session(s);
        Ok(())
    }

    fn join_session<H: Host<K> + ?Sized>(&mut self, host: &mut H, s: &mut Session<K, P>, key: K) {
        let (Some(src), Some(idx)) = (self.index_of(s.sample.source), self.index_of(key)) else {
            return;
        };
        let relevant = self.containers[idx].is_drag_relevant(
            &*host,
            &self.containers[src],
            s.sample.item_index,
            s.sample.payload.as_ref(),
        );
        if !relevant {
            return;
        }
        insert_nested(&mut s.sample.relevant, key, &*host);
        self.containers[idx].prepare(host);
        debug!(container = ?key, "container joined the session");
        // Full pass: a newcomer nested in the current target takes it over.
        self.evaluate_pass(host, s);
    }

    /// Remove a container.
    ///
    /// When it is the source of the active session it reports the removal of
    /// the dragged item with [`DragEvent::Drop`] and the session carries on
    /// without it.
    pub fn unregister_container<H: Host<K> + ?Sized>(
        &mut self,
        host: &mut H,
        key: K,
    ) -> Result<(), DndError<K>> {
        let idx = self.index_of(key).ok_or(DndError::UnknownContainer(key))?;

        if let State::Pending(grab) = &self.state {
            if grab.item.container == key {
                self.abort_pending(host);
            }
        }
        if let Some(mut s) = self.take_session() {
            let engine = &mut self.containers[idx];
            if s.sample.relevant.contains(&key) {
                if key == s.sample.source {
                    if let Some(result) = engine.commit(host, &s.sample, true) {
                        self.events.push(DragEvent::Drop {
                            container: key,
                            result,
                        });
                    }
                } else {
                    engine.reset(host);
                }
                s.sample.relevant.retain(|&k| k != key);
            }
            if s.sample.target == Some(key) {
                debug!(container = ?key, "target unregistered");
                s.sample.target = None;
            }
            self.containers.remove(idx);
            if !s.dropping {
                self.replan_autoscroll(host, &mut s);
            }
            self.put_session(s);
        } else {
            self.containers.remove(idx);
        }
        debug!(container = ?key, "unregistered container");
        Ok(())
    }

    /// Update the options of a registered container.
    pub fn set_options(
        &mut self,
        key: K,
        update: OptionsUpdate<P>,
        mode: UpdateMode,
    ) -> Result<(), DndError<K>> {
        let engine = self
            .engine_mut(key)
            .ok_or(DndError::UnknownContainer(key))?;
        engine.options_mut().apply(update, mode);
        Ok(())
    }

    /// Options of a registered container.
    pub fn options(&self, key: K) -> Option<&ContainerOptions<P>> {
        self.engine(key).map(ContainerEngine::options)
    }

    /// Registered container keys, in registration order.
    pub fn containers(&self) -> impl Iterator<Item = K> + '_ {
        self.containers.iter().map(ContainerEngine::key)
    }

    // --- queries ---

    /// Whether a drag session is active, including its drop animation.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, State::Dragging(_))
    }

    /// Whether a press is waiting to turn into a drag.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, State::Pending(_))
    }

    /// Whether the drop animation is running.
    pub fn is_dropping(&self) -> bool {
        matches!(&self.state, State::Dragging(s) if s.dropping)
    }

    /// The sample of the active session.
    pub fn sample(&self) -> Option<&DragSample<K, P>> {
        match &self.state {
            State::Dragging(s) => Some(&s.sample),
            _ => None,
        }
    }

    /// The container currently holding the target.
    pub fn target(&self) -> Option<K> {
        self.sample().and_then(|s| s.target)
    }

    /// Latest result of a container taking part in the active session.
    pub fn drag_result(&self, key: K) -> Option<&DragResult> {
        let sample = self.sample()?;
        if !sample.relevant.contains(&key) {
            return None;
        }
        self.engine(key).map(ContainerEngine::result)
    }

    /// Offsets applied to the items of a container.
    pub fn translations(&self, key: K) -> Option<&[f64]> {
        self.engine(key).map(ContainerEngine::translations)
    }

    /// Phase of a container.
    pub fn container_phase(&self, key: K) -> Option<ContainerPhase> {
        self.engine(key).map(ContainerEngine::phase)
    }

    /// The active autoscroll plan.
    pub fn autoscroll_plan(&self) -> Option<&ScrollPlan<K>> {
        match &self.state {
            State::Dragging(s) => s.autoscroll.plan(),
            _ => None,
        }
    }

    /// Drain queued events, oldest first.
    pub fn take_events(&mut self) -> Vec<DragEvent<K, P>> {
        core::mem::take(&mut self.events)
    }

    // --- pointer input ---

    /// Handle a press. Returns `true` when it grabbed a draggable item.
    pub fn pointer_down<H: Host<K> + ?Sized>(
        &mut self,
        host: &mut H,
        event: &PointerEvent<<H as HitTest<K>>::Target>,
    ) -> bool {
        if !matches!(self.state, State::Idle) || !event.can_grab() {
            return false;
        }
        let Some(target) = &event.target else {
            return false;
        };
        let Some(item) = host.resolve_item(target) else {
            return false;
        };
        let Some(engine) = self.engine(item.container) else {
            return false;
        };
        let options = engine.options();
        if options.disabled {
            return false;
        }
        if let Some(handle) = &options.drag_handle_selector {
            if !host.matches_selector(target, handle) {
                return false;
            }
        }
        if let Some(excluded) = &options.non_drag_area_selector {
            if host.matches_selector(target, excluded) {
                return false;
            }
        }
        let delay = options
            .drag_begin_delay
            .or(match event.kind {
                PointerKind::Touch => Some(self.settings.touch_start_delay),
                PointerKind::Mouse(_) => None,
            })
            .filter(|d| !d.is_zero());

        host.add_class(ClassTarget::Document, NO_USER_SELECT_CLASS);
        host.add_class(ClassTarget::Document, DISABLE_TOUCH_ACTIONS_CLASS);
        let timer = delay.map(|d| self.schedule(host, TaskKind::StartDelay, Some(d)));
        debug!(?item, ?delay, "pressed draggable item");
        self.state = State::Pending(Grab {
            item,
            origin: event.position,
            latest: event.position,
            timer,
        });
        true
    }

    /// Handle a pointer move.
    pub fn pointer_move<H: Host<K> + ?Sized>(&mut self, host: &mut H, position: Point) {
        match &mut self.state {
            State::Idle => {}
            State::Pending(grab) => {
                let delta = position - grab.origin;
                let beyond = |t: f64| delta.x.abs() > t || delta.y.abs() > t;
                if grab.timer.is_none() {
                    if beyond(self.settings.start_move_threshold) {
                        self.start_session(host);
                        self.pointer_move(host, position);
                    }
                } else if beyond(self.settings.delay_move_tolerance) {
                    debug!("moved during start delay; not dragging");
                    self.abort_pending(host);
                } else {
                    grab.latest = position;
                }
            }
            State::Dragging(s) if s.dropping => {}
            State::Dragging(_) => {
                let Some(mut s) = self.take_session() else {
                    return;
                };
                self.track_pointer(host, &mut s, position);
                host.position_proxy(s.proxy.handle, s.proxy.top_left, ProxyMotion::Follow);
                self.request_evaluation(host, &mut s);
                self.put_session(s);
            }
        }
    }

    /// Handle a release.
    pub fn pointer_up<H: Host<K> + ?Sized>(&mut self, host: &mut H) {
        match &self.state {
            State::Idle => {}
            State::Pending(_) => self.abort_pending(host),
            State::Dragging(s) if s.dropping => {}
            State::Dragging(_) => {
                if let Some(s) = self.take_session() {
                    self.end_drag(host, s);
                }
            }
        }
    }

    /// Cancel the active session. The dragged item returns to its slot and no
    /// container reports a drop.
    pub fn cancel<H: Host<K> + ?Sized>(&mut self, host: &mut H) {
        if matches!(self.state, State::Pending(_)) {
            self.abort_pending(host);
            return;
        }
        let Some(mut s) = self.take_session() else {
            return;
        };
        if s.dropping || s.canceling {
            self.put_session(s);
            return;
        }
        s.canceling = true;
        if let Some(frame) = s.frame.take() {
            self.cancel_task(host, frame);
        }
        s.trailing = false;

        let mut far = s.sample.clone();
        far.pointer = Point::new(FAR_AWAY, FAR_AWAY);
        far.position = far.pointer;
        far.target = None;
        let source_padding = self.source_padding(&s);
        for &key in &s.sample.relevant {
            if let Some(engine) = self.containers.iter_mut().find(|e| e.key() == key) {
                let ctx = PassContext {
                    target_claimed: false,
                    source_padding,
                };
                engine.evaluate(host, &far, ctx, &mut self.events);
                engine.take_bounds_changed();
            }
        }
        s.sample.target = None;
        s.sample.cancel_requested = true;
        debug!(source = ?s.sample.source, "drag cancelled");
        self.end_drag(host, s);
    }

    /// A scrollable ancestor scrolled: re-measure and re-evaluate.
    pub fn on_scroll<H: Host<K> + ?Sized>(&mut self, host: &mut H) {
        let Some(mut s) = self.take_session() else {
            return;
        };
        if !s.dropping {
            self.remeasure(host, &mut s);
        }
        self.put_session(s);
    }

    /// Re-evaluate the current sample without new input.
    pub fn refresh<H: Host<K> + ?Sized>(&mut self, host: &mut H) {
        let Some(mut s) = self.take_session() else {
            return;
        };
        if !s.dropping {
            self.evaluate_pass(host, &mut s);
        }
        self.put_session(s);
    }

    /// Run a task previously issued by the host's scheduler.
    ///
    /// Unknown, cancelled, or stale ids are ignored.
    pub fn run_task<H: Host<K> + ?Sized>(&mut self, host: &mut H, task: TaskId) {
        let Some(kind) = self.tasks.remove(&task) else {
            return;
        };
        if kind == TaskKind::StartDelay {
            if let State::Pending(grab) = &mut self.state {
                if grab.timer == Some(task) {
                    grab.timer = None;
                    let (origin, latest) = (grab.origin, grab.latest);
                    self.start_session(host);
                    if latest != origin {
                        self.pointer_move(host, latest);
                    }
                }
            }
            return;
        }
        let Some(mut s) = self.take_session() else {
            return;
        };
        match kind {
            TaskKind::StartDelay => {}
            TaskKind::DragFrame => {
                if s.frame == Some(task) {
                    s.frame = None;
                    if s.trailing && !s.dropping {
                        s.trailing = false;
                        self.evaluate_pass(host, &mut s);
                        s.frame = Some(self.schedule(host, TaskKind::DragFrame, None));
                    }
                }
            }
            TaskKind::Relayout => {
                if s.relayout == Some(task) {
                    s.relayout = None;
                    if !s.dropping {
                        for engine in &mut self.containers {
                            engine.invalidate_rects();
                        }
                        s.sample.invalidate_geometry = true;
                        self.evaluate_pass(host, &mut s);
                    }
                }
            }
            TaskKind::RectWatch => {
                if s.rect_watch == Some(task) && !s.dropping {
                    self.invalidate_relevant(&s);
                    let interval = self.settings.rect_watch_interval;
                    s.rect_watch = Some(self.schedule(host, TaskKind::RectWatch, Some(interval)));
                }
            }
            TaskKind::AutoScrollTick => {
                if s.scroll_tick == Some(task) {
                    s.scroll_tick = None;
                    if let Some(plan) = s.autoscroll.plan().copied() {
                        let delta = plan.delta(self.settings.autoscroll_tick);
                        trace!(scroller = ?plan.scroller, ?delta, "autoscroll step");
                        host.scroll_by(plan.scroller, delta);
                        self.remeasure(host, &mut s);
                        if s.autoscroll.is_active() && s.scroll_tick.is_none() {
                            s.scroll_tick = Some(self.schedule_tick(host));
                        }
                    }
                }
            }
            TaskKind::DropAnimationEnd => {
                if s.drop_task == Some(task) {
                    s.drop_task = None;
                    self.finish_drop(host, s);
                    return;
                }
            }
        }
        self.put_session(s);
    }

    // --- session lifecycle ---

    fn abort_pending<H: Host<K> + ?Sized>(&mut self, host: &mut H) {
        if let State::Pending(grab) = core::mem::replace(&mut self.state, State::Idle) {
            if let Some(timer) = grab.timer {
                self.cancel_task(host, timer);
            }
            host.remove_class(ClassTarget::Document, NO_USER_SELECT_CLASS);
            host.remove_class(ClassTarget::Document, DISABLE_TOUCH_ACTIONS_CLASS);
        }
    }

    fn start_session<H: Host<K> + ?Sized>(&mut self, host: &mut H) {
        let grab = match core::mem::replace(&mut self.state, State::Idle) {
            State::Pending(grab) => grab,
            other => {
                self.state = other;
                return;
            }
        };
        let source = grab.item.container;
        let index = grab.item.index;
        let Some(src) = self.index_of(source) else {
            self.abort_grab_classes(host);
            return;
        };
        if index >= host.item_count(source) {
            warn!(container = ?source, index, "grabbed item is out of range");
            self.abort_grab_classes(host);
            return;
        }

        let item_rect = host.item_rect(source, index);
        let visible = self.containers[src].visible_rect(&*host);
        let visible_part = visible.intersect(item_rect);
        let center = if visible_part.area() > 0.0 {
            visible_part.center()
        } else {
            item_rect.center()
        };
        let at = grab.origin;
        let source_options = self.containers[src].options();
        let payload = source_options.payload_of.as_ref().map(|f| f(index));
        let lock_axis = source_options.lock_axis;
        let orientation = source_options.orientation;
        let drag_class = source_options.drag_class.clone();

        let mut relevant = Vec::new();
        for engine in &self.containers {
            if engine.is_drag_relevant(&*host, &self.containers[src], index, payload.as_ref()) {
                insert_nested(&mut relevant, engine.key(), &*host);
            }
        }

        let sample = DragSample {
            source,
            item_index: index,
            size: item_rect.size(),
            payload,
            pointer: at,
            position: center,
            target: None,
            relevant,
            cancel_requested: false,
            invalidate_geometry: false,
        };
        for engine in &mut self.containers {
            if sample.relevant.contains(&engine.key()) {
                engine.prepare(host);
            } else {
                engine.reset(host);
            }
        }
        self.emit_lifecycle(&sample, true);

        let handle = host.clone_visual(grab.item, item_rect);
        host.add_class(ClassTarget::Proxy(handle), GHOST_CLASS);
        host.add_class(ClassTarget::Proxy(handle), orientation.name());
        if let Some(class) = &drag_class {
            host.add_class(ClassTarget::Proxy(handle), class);
        }
        host.position_proxy(handle, item_rect.origin(), ProxyMotion::Follow);

        debug!(
            container = ?source,
            index,
            relevant = ?sample.relevant,
            "drag started"
        );
        let mut s = Box::new(Session {
            sample,
            proxy: Proxy {
                handle,
                top_left: item_rect.origin(),
                center_delta: center - at,
                position_delta: item_rect.origin() - at,
            },
            lock_axis,
            autoscroll: AutoScroller::new(),
            frame: None,
            trailing: false,
            relayout: None,
            rect_watch: None,
            scroll_tick: None,
            drop_task: None,
            dropping: false,
            canceling: false,
        });
        self.request_evaluation(host, &mut s);
        let interval = self.settings.rect_watch_interval;
        s.rect_watch = Some(self.schedule(host, TaskKind::RectWatch, Some(interval)));
        self.put_session(s);
    }

    fn abort_grab_classes<H: Host<K> + ?Sized>(&mut self, host: &mut H) {
        host.remove_class(ClassTarget::Document, NO_USER_SELECT_CLASS);
        host.remove_class(ClassTarget::Document, DISABLE_TOUCH_ACTIONS_CLASS);
    }

    fn track_pointer<H: Host<K> + ?Sized>(
        &mut self,
        host: &mut H,
        s: &mut Session<K, P>,
        at: Point,
    ) {
        let contain = self
            .engine(s.sample.source)
            .filter(|e| e.options().behaviour == Behaviour::Contain)
            .map(|e| e.options().orientation);
        if let Some(orientation) = contain {
            let Some(engine) = self.engine_mut(s.sample.source) else {
                return;
            };
            let visible = engine.visible_rect(&*host);
            let begin = orientation.begin(visible);
            let end = orientation.end(visible);
            let size = orientation.extent(s.sample.size);
            let pos = orientation.coord(at);

            let top_left = (pos + orientation.component(s.proxy.position_delta))
                .min(end - size)
                .max(begin);
            let mut center = (pos + orientation.component(s.proxy.center_delta))
                .min(end)
                .max(begin);
            if center < begin + size / 2.0 {
                center = begin + 2.0;
            }
            if center > end - size / 2.0 {
                center = end - 2.0;
            }
            let pointer = pos.min(end).max(begin);

            s.proxy.top_left = orientation.with_coord(s.proxy.top_left, top_left);
            s.sample.position = orientation.with_coord(s.sample.position, center);
            s.sample.pointer = orientation.with_coord(s.sample.pointer, pointer);
        } else if let Some(axis) = s.lock_axis {
            let o = axis.orientation();
            let pos = o.coord(at);
            s.proxy.top_left = o.with_coord(
                s.proxy.top_left,
                pos + o.component(s.proxy.position_delta),
            );
            s.sample.position =
                o.with_coord(s.sample.position, pos + o.component(s.proxy.center_delta));
            s.sample.pointer = o.with_coord(s.sample.pointer, pos);
        } else {
            s.proxy.top_left = at + s.proxy.position_delta;
            s.sample.position = at + s.proxy.center_delta;
            s.sample.pointer = at;
        }
    }

    fn end_drag<H: Host<K> + ?Sized>(&mut self, host: &mut H, mut s: Box<Session<K, P>>) {
        if let Some(frame) = s.frame.take() {
            self.cancel_task(host, frame);
            if s.trailing {
                s.trailing = false;
                self.evaluate_pass(host, &mut s);
            }
        }
        self.stop_autoscroll(host, &mut s);
        for task in [s.rect_watch.take(), s.relayout.take()].into_iter().flatten() {
            self.cancel_task(host, task);
        }
        s.dropping = true;
        self.abort_grab_classes(host);

        match self.animate_drop(host, &mut s) {
            None => self.finish_drop(host, s),
            Some(duration) => {
                let delay = duration + self.settings.drop_settle;
                s.drop_task = Some(self.schedule(host, TaskKind::DropAnimationEnd, Some(delay)));
                self.put_session(s);
            }
        }
    }

    /// Start the drop animation and return its duration, or `None` to finish now.
    fn animate_drop<H: Host<K> + ?Sized>(
        &mut self,
        host: &mut H,
        s: &mut Session<K, P>,
    ) -> Option<Duration> {
        if let Some(target) = s.sample.target {
            let engine = self.engine(target)?;
            let options = engine.options();
            let source_options = self.engine(s.sample.source).map(ContainerEngine::options);
            let animate = match (&options.animate_drop, source_options) {
                (Some(f), Some(src)) => f(src, s.sample.payload.as_ref()).unwrap_or_else(|err| {
                    warn!(container = ?target, %err, "animate_drop failed; not animating");
                    false
                }),
                _ => true,
            };
            if !animate {
                return None;
            }
            let shadow = engine.result().shadow?;
            let source_pad = source_options
                .and_then(|o| o.element_paddings)
                .unwrap_or(Insets::ZERO);
            let target_pad = options.element_paddings.unwrap_or(Insets::ZERO);
            let top_left = shadow.top_left
                + Vec2::new(target_pad.x0 - source_pad.x0, target_pad.y0 - source_pad.y0);
            let duration = self
                .settings
                .min_drop_glide
                .max(options.animation_duration / 2);
            let class = options.drop_class.clone();
            self.glide(host, s, top_left, duration, class.as_deref());
            return Some(duration);
        }

        let Some(src) = self.index_of(s.sample.source) else {
            self.disappear(host, s, DEFAULT_ANIMATION_DURATION);
            return Some(DEFAULT_ANIMATION_DURATION);
        };
        let engine = &mut self.containers[src];
        let options = engine.options();
        let duration = options.animation_duration;
        let returns = matches!(options.behaviour, Behaviour::Move | Behaviour::Contain)
            && (s.canceling || !options.remove_on_drop_out);
        let class = options.drop_class.clone();
        if returns {
            if let Some(top_left) = engine.glide_back_target(host) {
                self.glide(host, s, top_left, duration, class.as_deref());
                return Some(duration);
            }
        }
        self.disappear(host, s, duration);
        Some(duration)
    }

    fn glide<H: Host<K> + ?Sized>(
        &mut self,
        host: &mut H,
        s: &mut Session<K, P>,
        top_left: Point,
        duration: Duration,
        class: Option<&str>,
    ) {
        let proxy = ClassTarget::Proxy(s.proxy.handle);
        host.add_class(proxy, DROP_ANIMATION_CLASS);
        if let Some(class) = class {
            host.add_class(proxy, class);
        }
        s.proxy.top_left = top_left;
        host.position_proxy(s.proxy.handle, top_left, ProxyMotion::Glide { duration });
    }

    fn disappear<H: Host<K> + ?Sized>(
        &mut self,
        host: &mut H,
        s: &mut Session<K, P>,
        duration: Duration,
    ) {
        host.add_class(ClassTarget::Proxy(s.proxy.handle), DROP_ANIMATION_CLASS);
        host.position_proxy(
            s.proxy.handle,
            s.proxy.top_left,
            ProxyMotion::Disappear { duration },
        );
    }

    fn finish_drop<H: Host<K> + ?Sized>(&mut self, host: &mut H, s: Box<Session<K, P>>) {
        host.remove_proxy(s.proxy.handle);
        for &task in self.tasks.keys() {
            host.cancel(task);
        }
        self.tasks.clear();
        self.state = State::Idle;
        self.emit_lifecycle(&s.sample, false);

        let mut results = Vec::new();
        for &key in &s.sample.relevant {
            if let Some(engine) = self.containers.iter_mut().find(|e| e.key() == key) {
                if let Some(result) = engine.commit(host, &s.sample, false) {
                    results.push((key, result));
                }
            }
        }
        // Removals first so insertion indices refer to the list without the item.
        let mut moved = None;
        for (key, result) in &results {
            if let Some(index) = result.removed_index {
                let handle = host.remove_item_at(*key, index);
                if *key == s.sample.source {
                    moved = handle;
                }
            }
        }
        for (key, result) in &results {
            if let Some(index) = result.added_index {
                host.insert_item_at(*key, index, moved.take());
            }
        }
        debug!(
            source = ?s.sample.source,
            target = ?s.sample.target,
            cancelled = s.sample.cancel_requested,
            drops = results.len(),
            "drag finished"
        );
        self.events.extend(
            results
                .into_iter()
                .map(|(container, result)| DragEvent::Drop { container, result }),
        );
    }

    fn emit_lifecycle(&mut self, sample: &DragSample<K, P>, start: bool) {
        for engine in &self.containers {
            let container = engine.key();
            let info = DragStartInfo {
                is_source: container == sample.source,
                will_accept_drop: sample.relevant.contains(&container),
                payload: sample.payload.clone(),
            };
            self.events.push(if start {
                DragEvent::DragStart { container, info }
            } else {
                DragEvent::DragEnd { container, info }
            });
        }
    }

    // --- evaluation ---

    /// Evaluate now unless a pass already ran this frame, in which case one
    /// trailing pass runs on the next frame.
    fn request_evaluation<H: Host<K> + ?Sized>(&mut self, host: &mut H, s: &mut Session<K, P>) {
        if s.dropping {
            return;
        }
        if s.frame.is_some() {
            s.trailing = true;
            return;
        }
        self.evaluate_pass(host, s);
        s.frame = Some(self.schedule(host, TaskKind::DragFrame, None));
    }

    fn evaluate_pass<H: Host<K> + ?Sized>(&mut self, host: &mut H, s: &mut Session<K, P>) {
        let source_padding = self.source_padding(s);
        let mut target = None;
        let mut bounds_changed = false;
        for &key in &s.sample.relevant {
            let Some(engine) = self.containers.iter_mut().find(|e| e.key() == key) else {
                continue;
            };
            let ctx = PassContext {
                target_claimed: target.is_some(),
                source_padding,
            };
            let claims = engine
                .evaluate(host, &s.sample, ctx, &mut self.events)
                .pointer_projection
                .is_some();
            if claims && target.is_none() {
                target = Some(key);
            }
            bounds_changed |= engine.take_bounds_changed();
        }
        if target != s.sample.target {
            debug!(from = ?s.sample.target, to = ?target, "target changed");
            s.sample.target = target;
        }
        s.sample.invalidate_geometry = false;
        if bounds_changed && s.relayout.is_none() {
            s.relayout = Some(self.schedule(host, TaskKind::Relayout, None));
        }
        self.replan_autoscroll(host, s);
    }

    fn remeasure<H: Host<K> + ?Sized>(&mut self, host: &mut H, s: &mut Session<K, P>) {
        self.invalidate_relevant(s);
        s.sample.invalidate_geometry = true;
        self.evaluate_pass(host, s);
    }

    fn invalidate_relevant(&mut self, s: &Session<K, P>) {
        for engine in &mut self.containers {
            if s.sample.relevant.contains(&engine.key()) {
                engine.invalidate_rects();
            }
        }
    }

    fn source_padding(&self, s: &Session<K, P>) -> f64 {
        self.engine(s.sample.source)
            .map_or(0.0, |e| e.options().item_padding())
    }

    // --- autoscroll ---

    fn replan_autoscroll<H: Host<K> + ?Sized>(&mut self, host: &mut H, s: &mut Session<K, P>) {
        let source = self
            .engine(s.sample.source)
            .map(ContainerEngine::options)
            .filter(|o| o.auto_scroll_enabled);
        let Some(max_speed) = source.map(|o| o.max_scroll_speed) else {
            self.stop_autoscroll(host, s);
            return;
        };
        let scrollers = match s.sample.target {
            Some(target) => host.scrollable_ancestors(target),
            None => merge_scrollers(
                s.sample
                    .relevant
                    .iter()
                    .map(|&k| host.scrollable_ancestors(k)),
            ),
        };
        let plan = plan_autoscroll(
            &scrollers,
            s.sample.pointer,
            self.settings.autoscroll_threshold,
            max_speed,
        );
        if plan.is_some() != s.autoscroll.is_active() {
            trace!(?plan, "autoscroll replanned");
        }
        s.autoscroll.set_plan(plan);
        if plan.is_none() {
            if let Some(tick) = s.scroll_tick.take() {
                self.cancel_task(host, tick);
            }
        } else if s.scroll_tick.is_none() {
            s.scroll_tick = Some(self.schedule_tick(host));
        }
    }

    fn stop_autoscroll<H: Host<K> + ?Sized>(&mut self, host: &mut H, s: &mut Session<K, P>) {
        s.autoscroll.reset();
        if let Some(tick) = s.scroll_tick.take() {
            self.cancel_task(host, tick);
        }
    }

    fn schedule_tick<H: Host<K> + ?Sized>(&mut self, host: &mut H) -> TaskId {
        let tick = self.settings.autoscroll_tick;
        self.schedule(host, TaskKind::AutoScrollTick, Some(tick))
    }

    // --- plumbing ---

    fn schedule<H: Host<K> + ?Sized>(
        &mut self,
        host: &mut H,
        kind: TaskKind,
        delay: Option<Duration>,
    ) -> TaskId {
        let id = match delay {
            Some(delay) => host.schedule_after(delay),
            None => host.request_frame(),
        };
        self.tasks.insert(id, kind);
        id
    }

    fn cancel_task<H: Host<K> + ?Sized>(&mut self, host: &mut H, task: TaskId) {
        if self.tasks.remove(&task).is_some() {
            host.cancel(task);
        }
    }

    fn take_session(&mut self) -> Option<Box<Session<K, P>>> {
        match core::mem::replace(&mut self.state, State::Idle) {
            State::Dragging(s) => Some(s),
            other => {
                self.state = other;
                None
            }
        }
    }

    fn put_session(&mut self, s: Box<Session<K, P>>) {
        self.state = State::Dragging(s);
    }

    fn index_of(&self, key: K) -> Option<usize> {
        self.containers.iter().position(|e| e.key() == key)
    }

    fn engine(&self, key: K) -> Option<&ContainerEngine<K, P>> {
        self.containers.iter().find(|e| e.key() == key)
    }

    fn engine_mut(&mut self, key: K) -> Option<&mut ContainerEngine<K, P>> {
        self.containers.iter_mut().find(|e| e.key() == key)
    }
}

/// Insert `key` so that every container precedes the containers enclosing it.
fn insert_nested<K: Copy, G: Geometry<K> + ?Sized>(order: &mut Vec<K>, key: K, geometry: &G) {
    match order.iter().position(|&outer| geometry.contains(outer, key)) {
        Some(at) => order.insert(at, key),
        None => order.push(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ScrollMetrics, Scrollable};
    use alloc::vec;
    use kurbo::Rect;

    struct Nesting;

    impl Geometry<u32> for Nesting {
        fn item_count(&self, _: u32) -> usize {
            0
        }
        fn item_rect(&self, _: u32, _: usize) -> Rect {
            Rect::ZERO
        }
        fn container_rect(&self, _: u32) -> Rect {
            Rect::ZERO
        }
        fn visible_rect(&self, _: u32) -> Rect {
            Rect::ZERO
        }
        fn scroll_metrics(&self, _: u32) -> ScrollMetrics {
            ScrollMetrics::default()
        }
        fn scrollable_ancestors(&self, _: u32) -> Vec<Scrollable<u32>> {
            Vec::new()
        }
        // Smaller keys are nested in larger ones.
        fn contains(&self, outer: u32, inner: u32) -> bool {
            inner < outer
        }
    }

    #[test]
    fn nested_containers_sort_innermost_first() {
        let mut order = Vec::new();
        for key in [3, 1, 4, 2] {
            insert_nested(&mut order, key, &Nesting);
        }
        assert_eq!(order, vec![1, 2, 3, 4]);
    }
}
