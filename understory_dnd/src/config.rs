// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-container configuration.
//!
//! ## Overview
//!
//! [`ContainerOptions`] is a plain struct with explicit defaults; construct it
//! with struct update syntax:
//!
//! ```
//! use understory_dnd::config::ContainerOptions;
//! use understory_dnd::types::{Behaviour, Orientation};
//!
//! let options: ContainerOptions<u32> = ContainerOptions {
//!     orientation: Orientation::Horizontal,
//!     group_name: Some("cards".into()),
//!     ..Default::default()
//! };
//! assert_eq!(options.behaviour, Behaviour::Move);
//! ```
//!
//! Later changes go through [`OptionsUpdate`], applied either on top of the
//! current options ([`UpdateMode::Merge`]) or on top of the defaults
//! ([`UpdateMode::Replace`]).

use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;
use core::time::Duration;

use kurbo::Insets;

use crate::error::PredicateError;
use crate::types::{Axis, Behaviour, Orientation};

/// Predicate deciding whether a container accepts (or animates) a drop.
///
/// Receives the source container's options and the dragged payload. An `Err`
/// is logged and counts as `false`.
pub type AcceptFn<P> = Rc<dyn Fn(&ContainerOptions<P>, Option<&P>) -> Result<bool, PredicateError>>;

/// Produces the payload of the item at an index.
pub type PayloadFn<P> = Rc<dyn Fn(usize) -> P>;

/// Default animation duration for neighbor shifting and the drop animation.
pub const DEFAULT_ANIMATION_DURATION: Duration = Duration::from_millis(250);

/// Default maximum autoscroll speed, in pixels per second.
pub const DEFAULT_MAX_SCROLL_SPEED: f64 = 1500.0;

/// Appearance of the visible drop placeholder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DropPlaceholderOptions {
    /// Class applied to the placeholder; the renderer picks a default when `None`.
    pub class_name: Option<String>,
    /// Transition used when the placeholder moves.
    pub animation_duration: Option<Duration>,
    /// Render above the items instead of beneath them.
    pub show_on_top: bool,
}

/// Configuration of one container.
pub struct ContainerOptions<P> {
    /// Axis along which items flow.
    pub orientation: Orientation,
    /// Move/copy/contain/drop-zone behaviour.
    pub behaviour: Behaviour,
    /// Containers sharing a non-empty group exchange items.
    pub group_name: Option<String>,
    /// Track pointer motion along one axis only.
    pub lock_axis: Option<Axis>,
    /// When set, drags only start from targets matching this selector.
    pub drag_handle_selector: Option<String>,
    /// Drags never start from targets matching this selector.
    pub non_drag_area_selector: Option<String>,
    /// Press-and-hold time before a drag starts. Touch presses default to 200 ms.
    pub drag_begin_delay: Option<Duration>,
    /// Length of neighbor shifting and drop animations.
    pub animation_duration: Duration,
    /// Scroll ancestors when the pointer nears their edges.
    pub auto_scroll_enabled: bool,
    /// Autoscroll speed at the very edge, in pixels per second.
    pub max_scroll_speed: f64,
    /// Neither starts drags nor accepts drops.
    pub disabled: bool,
    /// Class added to the proxy while dragging.
    pub drag_class: Option<String>,
    /// Class added to the proxy while it animates into place.
    pub drop_class: Option<String>,
    /// Remove the item when it is dropped outside every container.
    pub remove_on_drop_out: bool,
    /// Paddings of each item, excluded from its measured size.
    pub element_paddings: Option<Insets>,
    /// Show a visible placeholder at the pending drop position.
    pub drop_placeholder: Option<DropPlaceholderOptions>,
    /// Custom acceptance test, replacing group matching.
    pub accept_drop: Option<AcceptFn<P>>,
    /// Whether a drop into this container animates the proxy into place.
    pub animate_drop: Option<AcceptFn<P>>,
    /// Payload of the item at an index.
    pub payload_of: Option<PayloadFn<P>>,
}

impl<P> Default for ContainerOptions<P> {
    fn default() -> Self {
        Self {
            orientation: Orientation::Vertical,
            behaviour: Behaviour::Move,
            group_name: None,
            lock_axis: None,
            drag_handle_selector: None,
            non_drag_area_selector: None,
            drag_begin_delay: None,
            animation_duration: DEFAULT_ANIMATION_DURATION,
            auto_scroll_enabled: true,
            max_scroll_speed: DEFAULT_MAX_SCROLL_SPEED,
            disabled: false,
            drag_class: None,
            drop_class: None,
            remove_on_drop_out: false,
            element_paddings: None,
            drop_placeholder: None,
            accept_drop: None,
            animate_drop: None,
            payload_of: None,
        }
    }
}

// Manual impl: closures are shared, so `P` need not be `Clone`.
impl<P> Clone for ContainerOptions<P> {
    fn clone(&self) -> Self {
        Self {
            orientation: self.orientation,
            behaviour: self.behaviour,
            group_name: self.group_name.clone(),
            lock_axis: self.lock_axis,
            drag_handle_selector: self.drag_handle_selector.clone(),
            non_drag_area_selector: self.non_drag_area_selector.clone(),
            drag_begin_delay: self.drag_begin_delay,
            animation_duration: self.animation_duration,
            auto_scroll_enabled: self.auto_scroll_enabled,
            max_scroll_speed: self.max_scroll_speed,
            disabled: self.disabled,
            drag_class: self.drag_class.clone(),
            drop_class: self.drop_class.clone(),
            remove_on_drop_out: self.remove_on_drop_out,
            element_paddings: self.element_paddings,
            drop_placeholder: self.drop_placeholder.clone(),
            accept_drop: self.accept_drop.clone(),
            animate_drop: self.animate_drop.clone(),
            payload_of: self.payload_of.clone(),
        }
    }
}

impl<P> fmt::Debug for ContainerOptions<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerOptions")
            .field("orientation", &self.orientation)
            .field("behaviour", &self.behaviour)
            .field("group_name", &self.group_name)
            .field("lock_axis", &self.lock_axis)
            .field("drag_handle_selector", &self.drag_handle_selector)
            .field("non_drag_area_selector", &self.non_drag_area_selector)
            .field("drag_begin_delay", &self.drag_begin_delay)
            .field("animation_duration", &self.animation_duration)
            .field("auto_scroll_enabled", &self.auto_scroll_enabled)
            .field("max_scroll_speed", &self.max_scroll_speed)
            .field("disabled", &self.disabled)
            .field("drag_class", &self.drag_class)
            .field("drop_class", &self.drop_class)
            .field("remove_on_drop_out", &self.remove_on_drop_out)
            .field("element_paddings", &self.element_paddings)
            .field("drop_placeholder", &self.drop_placeholder)
            .field("accept_drop", &self.accept_drop.is_some())
            .field("animate_drop", &self.animate_drop.is_some())
            .field("payload_of", &self.payload_of.is_some())
            .finish()
    }
}

impl<P> ContainerOptions<P> {
    /// Sum of the item paddings on this container's axis.
    pub fn item_padding(&self) -> f64 {
        self.element_paddings
            .map(|p| self.orientation.padding(p))
            .unwrap_or(0.0)
    }

    /// Whether `other` names the same non-empty group.
    pub fn shares_group_with(&self, other: &Self) -> bool {
        match (&self.group_name, &other.group_name) {
            (Some(a), Some(b)) => !a.is_empty() && a == b,
            _ => false,
        }
    }

    /// Apply an update, either on top of the current values or on top of the defaults.
    pub fn apply(&mut self, update: OptionsUpdate<P>, mode: UpdateMode) {
        if mode == UpdateMode::Replace {
            *self = Self::default();
        }

        macro_rules! set {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = update.$field { self.$field = v; })*
            };
        }
        macro_rules! set_some {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = update.$field { self.$field = Some(v); })*
            };
        }

        set!(
            orientation,
            behaviour,
            animation_duration,
            auto_scroll_enabled,
            max_scroll_speed,
            disabled,
            remove_on_drop_out,
        );
        set_some!(
            group_name,
            lock_axis,
            drag_handle_selector,
            non_drag_area_selector,
            drag_begin_delay,
            drag_class,
            drop_class,
            element_paddings,
            drop_placeholder,
            accept_drop,
            animate_drop,
            payload_of,
        );
    }
}

/// How [`ContainerOptions::apply`] combines an update with existing options.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum UpdateMode {
    /// Only the fields present in the update change.
    #[default]
    Merge,
    /// Start over from the defaults, then apply the update.
    Replace,
}

/// A partial set of option overrides. `None` leaves a field alone.
///
/// Optional fields cannot be cleared by a merge; use [`UpdateMode::Replace`].
pub struct OptionsUpdate<P> {
    /// See [`ContainerOptions::orientation`].
    pub orientation: Option<Orientation>,
    /// See [`ContainerOptions::behaviour`].
    pub behaviour: Option<Behaviour>,
    /// See [`ContainerOptions::group_name`].
    pub group_name: Option<String>,
    /// See [`ContainerOptions::lock_axis`].
    pub lock_axis: Option<Axis>,
    /// See [`ContainerOptions::drag_handle_selector`].
    pub drag_handle_selector: Option<String>,
    /// See [`ContainerOptions::non_drag_area_selector`].
    pub non_drag_area_selector: Option<String>,
    /// See [`ContainerOptions::drag_begin_delay`].
    pub drag_begin_delay: Option<Duration>,
    /// See [`ContainerOptions::animation_duration`].
    pub animation_duration: Option<Duration>,
    /// See [`ContainerOptions::auto_scroll_enabled`].
    pub auto_scroll_enabled: Option<bool>,
    /// See [`ContainerOptions::max_scroll_speed`].
    pub max_scroll_speed: Option<f64>,
    /// See [`ContainerOptions::disabled`].
    pub disabled: Option<bool>,
    /// See [`ContainerOptions::drag_class`].
    pub drag_class: Option<String>,
    /// See [`ContainerOptions::drop_class`].
    pub drop_class: Option<String>,
    /// See [`ContainerOptions::remove_on_drop_out`].
    pub remove_on_drop_out: Option<bool>,
    /// See [`ContainerOptions::element_paddings`].
    pub element_paddings: Option<Insets>,
    /// See [`ContainerOptions::drop_placeholder`].
    pub drop_placeholder: Option<DropPlaceholderOptions>,
    /// See [`ContainerOptions::accept_drop`].
    pub accept_drop: Option<AcceptFn<P>>,
    /// See [`ContainerOptions::animate_drop`].
    pub animate_drop: Option<AcceptFn<P>>,
    /// See [`ContainerOptions::payload_of`].
    pub payload_of: Option<PayloadFn<P>>,
}

impl<P> Default for OptionsUpdate<P> {
    fn default() -> Self {
        Self {
            orientation: None,
            behaviour: None,
            group_name: None,
            lock_axis: None,
            drag_handle_selector: None,
            non_drag_area_selector: None,
            drag_begin_delay: None,
            animation_duration: None,
            auto_scroll_enabled: None,
            max_scroll_speed: None,
            disabled: None,
            drag_class: None,
            drop_class: None,
            remove_on_drop_out: None,
            element_paddings: None,
            drop_placeholder: None,
            accept_drop: None,
            animate_drop: None,
            payload_of: None,
        }
    }
}

impl<P> fmt::Debug for OptionsUpdate<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsUpdate")
            .field("orientation", &self.orientation)
            .field("behaviour", &self.behaviour)
            .field("group_name", &self.group_name)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

/// Session-wide timing and distance tunables.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SessionSettings {
    /// How often every relevant container is re-measured while dragging.
    pub rect_watch_interval: Duration,
    /// Interval between autoscroll steps.
    pub autoscroll_tick: Duration,
    /// Distance from a scrollable edge at which autoscroll starts.
    pub autoscroll_threshold: f64,
    /// Movement that starts a drag when no delay applies.
    pub start_move_threshold: f64,
    /// Movement that aborts a delayed start.
    pub delay_move_tolerance: f64,
    /// Start delay for touch presses without an explicit delay.
    pub touch_start_delay: Duration,
    /// Extra time after the drop animation before the drop commits.
    pub drop_settle: Duration,
    /// Shortest glide into a target container.
    pub min_drop_glide: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            rect_watch_interval: Duration::from_millis(50),
            autoscroll_tick: Duration::from_millis(16),
            autoscroll_threshold: 100.0,
            start_move_threshold: 1.0,
            delay_move_tolerance: 5.0,
            touch_start_delay: Duration::from_millis(200),
            drop_settle: Duration::from_millis(20),
            min_drop_glide: Duration::from_millis(150),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let o: ContainerOptions<()> = ContainerOptions::default();
        assert_eq!(o.orientation, Orientation::Vertical);
        assert_eq!(o.behaviour, Behaviour::Move);
        assert_eq!(o.animation_duration, Duration::from_millis(250));
        assert!(o.auto_scroll_enabled);
        assert_eq!(o.item_padding(), 0.0);
    }

    #[test]
    fn merge_keeps_untouched_fields() {
        let mut o: ContainerOptions<()> = ContainerOptions {
            group_name: Some("g".into()),
            orientation: Orientation::Horizontal,
            ..Default::default()
        };
        o.apply(
            OptionsUpdate {
                disabled: Some(true),
                ..Default::default()
            },
            UpdateMode::Merge,
        );
        assert!(o.disabled);
        assert_eq!(o.group_name.as_deref(), Some("g"));
        assert_eq!(o.orientation, Orientation::Horizontal);
    }

    #[test]
    fn replace_starts_from_defaults() {
        let mut o: ContainerOptions<()> = ContainerOptions {
            group_name: Some("g".into()),
            remove_on_drop_out: true,
            ..Default::default()
        };
        o.apply(
            OptionsUpdate {
                behaviour: Some(Behaviour::Copy),
                ..Default::default()
            },
            UpdateMode::Replace,
        );
        assert_eq!(o.behaviour, Behaviour::Copy);
        assert_eq!(o.group_name, None);
        assert!(!o.remove_on_drop_out);
    }

    #[test]
    fn empty_groups_never_match() {
        let a: ContainerOptions<()> = ContainerOptions {
            group_name: Some(String::new()),
            ..Default::default()
        };
        let b = a.clone();
        assert!(!a.shares_group_with(&b));
        let c: ContainerOptions<()> = ContainerOptions::default();
        assert!(!c.shares_group_with(&c.clone()));
    }

    #[test]
    fn item_padding_follows_orientation() {
        let o: ContainerOptions<()> = ContainerOptions {
            orientation: Orientation::Horizontal,
            element_paddings: Some(Insets::new(2.0, 5.0, 3.0, 7.0)),
            ..Default::default()
        };
        assert_eq!(o.item_padding(), 5.0);
    }
}
