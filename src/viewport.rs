//! The platform seam: everything the watcher needs from its host
//! environment, expressed as a trait so the core stays host-agnostic.

use std::rc::Rc;

/// Native event kinds a [`Viewport`] can deliver.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ViewportEvent {
    Resize,
    Scroll,
}

/// Handler registered for a native event.
pub type EventHandler = Rc<dyn Fn()>;

/// One-shot callback scheduled to run before the next repaint.
pub type FrameCallback = Box<dyn FnOnce()>;

/// Host environment the watcher observes.
///
/// Implementations adapt a concrete platform (a browser window, a native
/// window, or the in-memory [`HeadlessViewport`](crate::headless::HeadlessViewport))
/// to the small surface the watcher needs: current metrics, named-event
/// registration with a passive-mode hint, and a frame-scheduling primitive.
pub trait Viewport {
    /// Current viewport width in logical pixels.
    fn width(&self) -> f64;

    /// Current viewport height in logical pixels.
    fn height(&self) -> f64;

    /// Current vertical scroll offset in logical pixels.
    fn scroll_y(&self) -> f64;

    /// Whether event registration honors a passive-mode hint.
    ///
    /// Browser adapters detect this by probing the event-registration options
    /// during a throwaway registration; adapters that cannot probe, or whose
    /// probe fails, report `false`. The watcher reads this once at
    /// construction and passes the result with every native registration.
    fn supports_passive_events(&self) -> bool {
        false
    }

    /// Registers `handler` for `event`. At most one handler per event kind is
    /// registered at a time; registering again replaces the previous handler.
    fn add_event_listener(&self, event: ViewportEvent, handler: EventHandler, passive: bool);

    /// Drops the handler registered for `event`, if any.
    fn remove_event_listener(&self, event: ViewportEvent);

    /// Schedules `callback` to run once before the next repaint.
    fn request_frame(&self, callback: FrameCallback);
}
