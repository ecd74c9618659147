//! The conventional process-wide watcher instance.
//!
//! [`ViewportWatcher`] itself carries no global state; the shared instance
//! lives here in a thread local, so tests and embedders can still construct
//! as many independent watchers as they need.

use std::cell::RefCell;

use crate::viewport::Viewport;
use crate::watcher::ViewportWatcher;

thread_local! {
    static SHARED: RefCell<Option<ViewportWatcher>> = const { RefCell::new(None) };
}

/// Initializes the shared watcher over `viewport` and returns it.
///
/// If a shared watcher already exists, the existing instance is returned and
/// `viewport` is dropped.
pub fn init_shared(viewport: impl Viewport + 'static) -> ViewportWatcher {
    SHARED.with(|shared| {
        shared
            .borrow_mut()
            .get_or_insert_with(|| ViewportWatcher::new(viewport))
            .clone()
    })
}

/// The shared watcher, if one has been initialized on this thread.
pub fn try_shared() -> Option<ViewportWatcher> {
    SHARED.with(|shared| shared.borrow().clone())
}

/// The shared watcher.
///
/// Panics when called before [`init_shared`]. All shared-watcher access must
/// happen on the thread that initialized it.
pub fn shared() -> ViewportWatcher {
    try_shared()
        .expect("the shared ViewportWatcher has not been initialized; call init_shared first")
}
