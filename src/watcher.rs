//! The viewport watcher: cached state, listener registry, native-listener
//! lifecycle and the per-frame flush.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use indexmap::IndexSet;
use smallvec::SmallVec;

use crate::breakpoint::{
    resolve, BreakpointError, BreakpointName, BreakpointSpec, BreakpointSpecs,
};
use crate::listener::{
    BreakpointListener, Mutation, ResizeListener, ScrollEntry, ScrollListener,
};
use crate::viewport::{EventHandler, Viewport, ViewportEvent};

bitflags! {
    /// Pending change notifications consumed by the next frame flush.
    #[derive(Default, Copy, Clone, Debug)]
    #[must_use]
    struct ChangeFlags: u8 {
        const SIZE = 1 << 0;
        const BREAKPOINT = 1 << 1;
        const SCROLL = 1 << 2;
    }
}

struct ViewportState {
    width: f64,
    height: f64,
    scroll_y: f64,
    breakpoint: Option<BreakpointName>,
}

struct WatcherInner {
    viewport: Rc<dyn Viewport>,
    /// Capability captured once at construction, applied to every native
    /// registration.
    passive_events: bool,
    state: RefCell<ViewportState>,
    specs: RefCell<Option<BreakpointSpecs>>,
    changes: Cell<ChangeFlags>,
    frame_pending: Cell<bool>,
    resize_listening: Cell<bool>,
    scroll_listening: Cell<bool>,
    resize_listeners: RefCell<Vec<ResizeListener>>,
    scroll_listeners: RefCell<Vec<ScrollEntry>>,
    breakpoint_listeners: RefCell<Vec<BreakpointListener>>,
}

/// Observes a [`Viewport`]: tracks its width, height, scroll offset and the
/// breakpoint the width falls into, and notifies registered listeners of
/// changes, coalesced into one flush per animation frame.
///
/// Native resize/scroll handlers are attached only while some registered
/// listener needs them; the getters stay fresh regardless by measuring on
/// demand. The watcher is a cheap-to-clone handle; clones share state. It is
/// single-threaded by construction and not `Send`.
///
/// ```
/// use windowatch::headless::HeadlessViewport;
/// use windowatch::{BreakpointSpec, BreakpointSpecs, ViewportWatcher};
///
/// let viewport = HeadlessViewport::new(800.0, 600.0);
/// let watcher = ViewportWatcher::new(viewport.clone());
///
/// let mut specs = BreakpointSpecs::new();
/// specs.insert("s".into(), BreakpointSpec::new(None, 599.0));
/// specs.insert("l".into(), BreakpointSpec::new(600.0, None));
/// watcher.set_breakpoint_specs(specs)?;
///
/// assert_eq!(watcher.breakpoint()?, "l");
/// # Ok::<(), windowatch::BreakpointError>(())
/// ```
#[derive(Clone)]
pub struct ViewportWatcher {
    inner: Rc<WatcherInner>,
}

impl ViewportWatcher {
    /// Creates a watcher over `viewport`, capturing its current dimensions.
    pub fn new(viewport: impl Viewport + 'static) -> Self {
        let viewport: Rc<dyn Viewport> = Rc::new(viewport);
        let passive_events = viewport.supports_passive_events();
        let state = ViewportState {
            width: viewport.width(),
            height: viewport.height(),
            scroll_y: 0.0,
            breakpoint: None,
        };
        Self {
            inner: Rc::new(WatcherInner {
                viewport,
                passive_events,
                state: RefCell::new(state),
                specs: RefCell::new(None),
                changes: Cell::new(ChangeFlags::empty()),
                frame_pending: Cell::new(false),
                resize_listening: Cell::new(false),
                scroll_listening: Cell::new(false),
                resize_listeners: RefCell::new(Vec::new()),
                scroll_listeners: RefCell::new(Vec::new()),
                breakpoint_listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Current viewport width, measured on demand while no native resize
    /// handler is attached.
    pub fn window_width(&self) -> f64 {
        if !self.inner.resize_listening.get() {
            WatcherInner::refresh_size(&self.inner);
        }
        self.inner.state.borrow().width
    }

    /// Current viewport height, measured on demand while no native resize
    /// handler is attached.
    pub fn window_height(&self) -> f64 {
        if !self.inner.resize_listening.get() {
            WatcherInner::refresh_size(&self.inner);
        }
        self.inner.state.borrow().height
    }

    /// Current vertical scroll offset, measured on demand while no native
    /// scroll handler is attached.
    pub fn scroll_y(&self) -> f64 {
        if !self.inner.scroll_listening.get() {
            WatcherInner::window_did_scroll(&self.inner);
        }
        self.inner.state.borrow().scroll_y
    }

    /// Name of the breakpoint the current width falls into.
    pub fn breakpoint(&self) -> Result<BreakpointName, BreakpointError> {
        if self.inner.specs.borrow().is_none() {
            return Err(BreakpointError::NoSpecs);
        }
        if !self.inner.resize_listening.get() {
            WatcherInner::window_did_resize(&self.inner)?;
        }
        let state = self.inner.state.borrow();
        state
            .breakpoint
            .clone()
            .ok_or(BreakpointError::Unresolved { width: state.width })
    }

    /// Spec of the breakpoint the current width falls into.
    pub fn breakpoint_spec(&self) -> Result<BreakpointSpec, BreakpointError> {
        let name = self.breakpoint()?;
        let specs = self.inner.specs.borrow();
        specs
            .as_ref()
            .and_then(|specs| specs.get(&name))
            .cloned()
            .ok_or(BreakpointError::UnknownName(name))
    }

    /// Whether the viewport is narrower than the named breakpoint's lower
    /// bound.
    ///
    /// The comparison is against the named spec's own `min`, not against the
    /// currently resolved breakpoint: a spec with no lower bound reads as
    /// smaller unconditionally, itself included.
    pub fn is_smaller_than(&self, name: &str) -> Result<bool, BreakpointError> {
        let specs = self.inner.specs.borrow();
        let specs = specs.as_ref().ok_or(BreakpointError::NoSpecs)?;
        let state = self.inner.state.borrow();
        if state.breakpoint.is_none() {
            return Err(BreakpointError::Unresolved { width: state.width });
        }
        let spec = specs
            .get(name)
            .ok_or_else(|| BreakpointError::UnknownName(name.to_owned()))?;
        Ok(spec.min.is_none_or(|min| state.width < min))
    }

    /// Whether the viewport is wider than the named breakpoint's upper bound.
    ///
    /// Mirror of [`is_smaller_than`](Self::is_smaller_than): a spec with no
    /// upper bound reads as bigger unconditionally.
    pub fn is_bigger_than(&self, name: &str) -> Result<bool, BreakpointError> {
        let specs = self.inner.specs.borrow();
        let specs = specs.as_ref().ok_or(BreakpointError::NoSpecs)?;
        let state = self.inner.state.borrow();
        if state.breakpoint.is_none() {
            return Err(BreakpointError::Unresolved { width: state.width });
        }
        let spec = specs
            .get(name)
            .ok_or_else(|| BreakpointError::UnknownName(name.to_owned()))?;
        Ok(spec.max.is_none_or(|max| state.width > max))
    }

    /// Replaces the breakpoint table wholesale and re-evaluates the current
    /// width against it immediately, so a newly matching or no-longer
    /// matching breakpoint is detected right away.
    pub fn set_breakpoint_specs(
        &self,
        specs: BreakpointSpecs,
    ) -> Result<&Self, BreakpointError> {
        *self.inner.specs.borrow_mut() = Some(specs);
        WatcherInner::window_did_resize(&self.inner)?;
        Ok(self)
    }

    /// Registers `listener` for size changes. Re-adding the same handle is a
    /// no-op.
    pub fn add_resize_listener(&self, listener: ResizeListener) -> &Self {
        let added = {
            let mut listeners = self.inner.resize_listeners.borrow_mut();
            if listeners.iter().any(|l| Rc::ptr_eq(l, &listener)) {
                false
            } else {
                listeners.push(listener);
                true
            }
        };
        if added {
            WatcherInner::update_native_listeners(&self.inner);
        }
        self
    }

    /// Removes a previously registered resize listener; unknown handles are
    /// ignored.
    pub fn remove_resize_listener(&self, listener: &ResizeListener) -> &Self {
        let removed = {
            let mut listeners = self.inner.resize_listeners.borrow_mut();
            match listeners.iter().position(|l| Rc::ptr_eq(l, listener)) {
                Some(index) => {
                    listeners.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            WatcherInner::update_native_listeners(&self.inner);
        }
        self
    }

    /// Registers `listener` for scroll changes, active only while the current
    /// breakpoint is one of `breakpoints` (an empty slice means every
    /// breakpoint). Re-adding the same handle is a no-op.
    pub fn add_scroll_listener(&self, listener: ScrollListener, breakpoints: &[&str]) -> &Self {
        let added = {
            let mut listeners = self.inner.scroll_listeners.borrow_mut();
            if listeners
                .iter()
                .any(|entry| Rc::ptr_eq(&entry.listener, &listener))
            {
                false
            } else {
                let breakpoints: IndexSet<BreakpointName> =
                    breakpoints.iter().map(|name| (*name).to_owned()).collect();
                listeners.push(ScrollEntry {
                    listener,
                    breakpoints,
                });
                true
            }
        };
        if added {
            WatcherInner::update_native_listeners(&self.inner);
        }
        self
    }

    /// Removes a previously registered scroll listener together with its
    /// breakpoint filter; unknown handles are ignored.
    pub fn remove_scroll_listener(&self, listener: &ScrollListener) -> &Self {
        let removed = {
            let mut listeners = self.inner.scroll_listeners.borrow_mut();
            match listeners
                .iter()
                .position(|entry| Rc::ptr_eq(&entry.listener, listener))
            {
                Some(index) => {
                    listeners.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            WatcherInner::update_native_listeners(&self.inner);
        }
        self
    }

    /// Registers `listener` for breakpoint changes. Re-adding the same handle
    /// is a no-op.
    pub fn add_breakpoint_listener(&self, listener: BreakpointListener) -> &Self {
        let added = {
            let mut listeners = self.inner.breakpoint_listeners.borrow_mut();
            if listeners.iter().any(|l| Rc::ptr_eq(l, &listener)) {
                false
            } else {
                listeners.push(listener);
                true
            }
        };
        if added {
            WatcherInner::update_native_listeners(&self.inner);
        }
        self
    }

    /// Removes a previously registered breakpoint listener; unknown handles
    /// are ignored.
    pub fn remove_breakpoint_listener(&self, listener: &BreakpointListener) -> &Self {
        let removed = {
            let mut listeners = self.inner.breakpoint_listeners.borrow_mut();
            match listeners.iter().position(|l| Rc::ptr_eq(l, listener)) {
                Some(index) => {
                    listeners.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            WatcherInner::update_native_listeners(&self.inner);
        }
        self
    }
}

impl WatcherInner {
    fn mark(&self, flags: ChangeFlags) {
        self.changes.set(self.changes.get() | flags);
    }

    fn clear(&self, flags: ChangeFlags) {
        self.changes.set(self.changes.get() - flags);
    }

    /// Attaches or detaches the native handlers to match the registry.
    ///
    /// Scroll listening depends transitively on resize being tracked, since
    /// breakpoint changes originate from resize; the resize handler is kept
    /// while any listener of any kind is registered. Idempotent, re-run after
    /// every registry mutation and every breakpoint change.
    fn update_native_listeners(inner: &Rc<Self>) {
        let listener_count = inner.resize_listeners.borrow().len()
            + inner.scroll_listeners.borrow().len()
            + inner.breakpoint_listeners.borrow().len();

        if !inner.resize_listening.get() && listener_count > 0 {
            inner.resize_listening.set(true);
            let handler: EventHandler = Rc::new({
                let weak = Rc::downgrade(inner);
                move || {
                    if let Some(inner) = weak.upgrade() {
                        Self::refresh_size(&inner);
                    }
                }
            });
            inner
                .viewport
                .add_event_listener(ViewportEvent::Resize, handler, inner.passive_events);
            tracing::debug!("attached native resize listener");
            // seed the cache; this may resolve the initial breakpoint and
            // cascade into the scroll conditions below
            Self::refresh_size(inner);
        }

        if inner.resize_listening.get() && listener_count == 0 {
            inner.viewport.remove_event_listener(ViewportEvent::Resize);
            inner.resize_listening.set(false);
            tracing::debug!("detached native resize listener");
        }

        let active_scroll = {
            let state = inner.state.borrow();
            let breakpoint = state.breakpoint.as_deref();
            inner
                .scroll_listeners
                .borrow()
                .iter()
                .filter(|entry| entry.is_active_for(breakpoint))
                .count()
        };

        if !inner.scroll_listening.get() && active_scroll > 0 {
            inner.scroll_listening.set(true);
            let handler: EventHandler = Rc::new({
                let weak = Rc::downgrade(inner);
                move || {
                    if let Some(inner) = weak.upgrade() {
                        Self::window_did_scroll(&inner);
                    }
                }
            });
            inner
                .viewport
                .add_event_listener(ViewportEvent::Scroll, handler, inner.passive_events);
            tracing::debug!("attached native scroll listener");
            Self::window_did_scroll(inner);
        }

        if inner.scroll_listening.get() && active_scroll == 0 {
            inner.viewport.remove_event_listener(ViewportEvent::Scroll);
            inner.scroll_listening.set(false);
            tracing::debug!("detached native scroll listener");
        }
    }

    /// One synchronous resize pass: measure, classify, schedule notification.
    fn window_did_resize(inner: &Rc<Self>) -> Result<(), BreakpointError> {
        let width = inner.viewport.width();
        let height = inner.viewport.height();

        let size_changed = {
            let mut state = inner.state.borrow_mut();
            let changed = state.width != width || state.height != height;
            state.width = width;
            state.height = height;
            changed
        };
        if size_changed {
            inner.mark(ChangeFlags::SIZE);
            Self::request_frame(inner);
        }

        let matched = {
            let specs = inner.specs.borrow();
            let Some(specs) = specs.as_ref() else {
                // no breakpoint concept in play
                return Ok(());
            };
            resolve(specs, width).cloned()
        };
        let Some(breakpoint) = matched else {
            // never leave a stale breakpoint behind
            inner.state.borrow_mut().breakpoint = None;
            return Err(BreakpointError::Unresolved { width });
        };

        {
            let mut state = inner.state.borrow_mut();
            if state.breakpoint.as_deref() == Some(breakpoint.as_str()) {
                return Ok(());
            }
            state.breakpoint = Some(breakpoint);
        }
        inner.mark(ChangeFlags::BREAKPOINT);
        // scroll listener activity can depend on the new breakpoint
        Self::update_native_listeners(inner);
        Self::request_frame(inner);
        Ok(())
    }

    /// Resize pass for paths with no caller to surface a `Result` to: the
    /// native event handler and the infallible getters. A classification
    /// failure clears the cached breakpoint and is reported here; the next
    /// breakpoint-dependent query re-raises it.
    fn refresh_size(inner: &Rc<Self>) {
        if let Err(err) = Self::window_did_resize(inner) {
            tracing::error!("viewport measurement left breakpoint unresolved: {}", err);
        }
    }

    /// One synchronous scroll pass.
    fn window_did_scroll(inner: &Rc<Self>) {
        let scroll_y = inner.viewport.scroll_y();
        {
            let mut state = inner.state.borrow_mut();
            if state.scroll_y == scroll_y {
                return;
            }
            state.scroll_y = scroll_y;
        }
        inner.mark(ChangeFlags::SCROLL);
        Self::request_frame(inner);
    }

    /// Schedules one flush on the next frame; idempotent for a burst of
    /// changes within the same tick.
    fn request_frame(inner: &Rc<Self>) {
        if inner.frame_pending.get() {
            return;
        }
        inner.frame_pending.set(true);
        let weak = Rc::downgrade(inner);
        inner.viewport.request_frame(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                Self::frame(&inner);
            }
        }));
    }

    /// Per-frame flush: the measure phase walks each dirty category in the
    /// fixed size, breakpoint, scroll order over a flush-time snapshot of the
    /// listener lists, then the mutate phase runs the collected mutations in
    /// order.
    fn frame(inner: &Rc<Self>) {
        inner.frame_pending.set(false);

        let mut mutations: SmallVec<[Mutation; 8]> = SmallVec::new();

        if inner.changes.get().contains(ChangeFlags::SIZE) {
            let (width, height) = {
                let state = inner.state.borrow();
                (state.width, state.height)
            };
            let listeners = inner.resize_listeners.borrow().clone();
            for listener in listeners {
                if let Some(mutation) = (*listener)(width, height) {
                    mutations.push(mutation);
                }
            }
            inner.clear(ChangeFlags::SIZE);
        }

        if inner.changes.get().contains(ChangeFlags::BREAKPOINT) {
            let resolved = {
                let state = inner.state.borrow();
                let specs = inner.specs.borrow();
                state.breakpoint.as_ref().and_then(|name| {
                    specs
                        .as_ref()
                        .and_then(|specs| specs.get(name))
                        .map(|spec| (name.clone(), spec.clone()))
                })
            };
            // breakpoint listeners only run while a breakpoint is resolved
            if let Some((name, spec)) = resolved {
                let listeners = inner.breakpoint_listeners.borrow().clone();
                for listener in listeners {
                    if let Some(mutation) = (*listener)(&name, &spec) {
                        mutations.push(mutation);
                    }
                }
                inner.clear(ChangeFlags::BREAKPOINT);
            }
        }

        if inner.changes.get().contains(ChangeFlags::SCROLL) {
            let (scroll_y, breakpoint) = {
                let state = inner.state.borrow();
                (state.scroll_y, state.breakpoint.clone())
            };
            // filtered by the breakpoint current at flush time, not at
            // registration time
            let listeners: Vec<ScrollListener> = inner
                .scroll_listeners
                .borrow()
                .iter()
                .filter(|entry| entry.is_active_for(breakpoint.as_deref()))
                .map(|entry| entry.listener.clone())
                .collect();
            for listener in listeners {
                if let Some(mutation) = (*listener)(scroll_y) {
                    mutations.push(mutation);
                }
            }
            inner.clear(ChangeFlags::SCROLL);
        }

        for mutation in mutations {
            mutation();
        }
    }
}

impl fmt::Debug for ViewportWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("ViewportWatcher")
            .field("width", &state.width)
            .field("height", &state.height)
            .field("scroll_y", &state.scroll_y)
            .field("breakpoint", &state.breakpoint)
            .field("resize_listening", &self.inner.resize_listening.get())
            .field("scroll_listening", &self.inner.scroll_listening.get())
            .finish_non_exhaustive()
    }
}

impl PartialEq for ViewportWatcher {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ViewportWatcher {}
