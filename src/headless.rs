//! In-memory viewport for tests and benchmarks.
//!
//! [`HeadlessViewport`] plays the platform's part without a window system:
//! metrics are plain settable values, native events are emitted manually and
//! requested frames queue up until the test drains them. Registration and
//! attachment state is introspectable, so lifecycle behavior can be asserted
//! directly.
//!
//! ```
//! use windowatch::headless::HeadlessViewport;
//! use windowatch::{resize_listener, ViewportWatcher};
//!
//! let viewport = HeadlessViewport::new(800.0, 600.0);
//! let watcher = ViewportWatcher::new(viewport.clone());
//! watcher.add_resize_listener(resize_listener(|width, _| {
//!     println!("resized to {width}");
//!     None
//! }));
//!
//! viewport.set_size(1024.0, 768.0);
//! viewport.emit_resize();
//! viewport.run_frames();
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::viewport::{EventHandler, FrameCallback, Viewport, ViewportEvent};

/// An in-memory [`Viewport`] with settable metrics and manual event
/// delivery. Cheap to clone; clones share state, so a test can hand one
/// clone to the watcher and keep another to drive it.
#[derive(Clone, Default)]
pub struct HeadlessViewport {
    state: Rc<HeadlessState>,
}

#[derive(Default)]
struct HeadlessState {
    width: Cell<f64>,
    height: Cell<f64>,
    scroll_y: Cell<f64>,
    passive_supported: Cell<bool>,
    handlers: RefCell<HashMap<ViewportEvent, EventHandler>>,
    frames: RefCell<VecDeque<FrameCallback>>,
    registrations: Cell<usize>,
    last_passive: Cell<Option<bool>>,
}

impl HeadlessViewport {
    pub fn new(width: f64, height: f64) -> Self {
        let viewport = Self::default();
        viewport.state.width.set(width);
        viewport.state.height.set(height);
        viewport
    }

    /// Advertises passive-event support, as a browser adapter whose probe
    /// succeeded would.
    pub fn with_passive_events(self, supported: bool) -> Self {
        self.state.passive_supported.set(supported);
        self
    }

    pub fn set_size(&self, width: f64, height: f64) {
        self.state.width.set(width);
        self.state.height.set(height);
    }

    pub fn set_scroll_y(&self, scroll_y: f64) {
        self.state.scroll_y.set(scroll_y);
    }

    /// Fires the attached resize handler, if any.
    pub fn emit_resize(&self) {
        self.emit(ViewportEvent::Resize);
    }

    /// Fires the attached scroll handler, if any.
    pub fn emit_scroll(&self) {
        self.emit(ViewportEvent::Scroll);
    }

    fn emit(&self, event: ViewportEvent) {
        // clone the handler out so it can re-enter add/remove_event_listener
        let handler = self.state.handlers.borrow().get(&event).cloned();
        if let Some(handler) = handler {
            (*handler)();
        }
    }

    /// Whether a handler is currently attached for `event`.
    pub fn is_listening(&self, event: ViewportEvent) -> bool {
        self.state.handlers.borrow().contains_key(&event)
    }

    /// Number of callbacks waiting for the next frame.
    pub fn pending_frames(&self) -> usize {
        self.state.frames.borrow().len()
    }

    /// Runs the oldest pending frame callback. Returns whether one ran.
    pub fn run_frame(&self) -> bool {
        let frame = self.state.frames.borrow_mut().pop_front();
        match frame {
            Some(frame) => {
                frame();
                true
            }
            None => false,
        }
    }

    /// Drains the frame queue, including frames requested while draining.
    /// Returns how many callbacks ran.
    pub fn run_frames(&self) -> usize {
        let mut ran = 0;
        while self.run_frame() {
            ran += 1;
        }
        ran
    }

    /// Total `add_event_listener` registrations seen.
    pub fn registration_count(&self) -> usize {
        self.state.registrations.get()
    }

    /// Passive flag of the most recent registration.
    pub fn last_passive(&self) -> Option<bool> {
        self.state.last_passive.get()
    }
}

impl Viewport for HeadlessViewport {
    fn width(&self) -> f64 {
        self.state.width.get()
    }

    fn height(&self) -> f64 {
        self.state.height.get()
    }

    fn scroll_y(&self) -> f64 {
        self.state.scroll_y.get()
    }

    fn supports_passive_events(&self) -> bool {
        self.state.passive_supported.get()
    }

    fn add_event_listener(&self, event: ViewportEvent, handler: EventHandler, passive: bool) {
        self.state.registrations.set(self.state.registrations.get() + 1);
        self.state.last_passive.set(Some(passive));
        self.state.handlers.borrow_mut().insert(event, handler);
    }

    fn remove_event_listener(&self, event: ViewportEvent) {
        self.state.handlers.borrow_mut().remove(&event);
    }

    fn request_frame(&self, callback: FrameCallback) {
        self.state.frames.borrow_mut().push_back(callback);
    }
}
