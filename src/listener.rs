//! Listener types and the deferred-mutation contract.
//!
//! Listeners run during the measure phase of a frame flush and may return a
//! [`Mutation`] to be run in the trailing mutate phase. Reads of layout state
//! belong in the listener body, writes in the returned mutation, so that one
//! frame never interleaves reads and writes.

use std::rc::Rc;

use indexmap::IndexSet;

use crate::breakpoint::{BreakpointName, BreakpointSpec};

/// Deferred action collected during the measure phase of a frame flush and
/// run after every listener of that flush has been invoked.
pub type Mutation = Box<dyn FnOnce()>;

/// Listener invoked with the viewport `(width, height)` after a size change.
pub type ResizeListener = Rc<dyn Fn(f64, f64) -> Option<Mutation>>;

/// Listener invoked with the vertical scroll offset after a scroll change.
pub type ScrollListener = Rc<dyn Fn(f64) -> Option<Mutation>>;

/// Listener invoked with the breakpoint name and its spec after the resolved
/// breakpoint changes.
pub type BreakpointListener = Rc<dyn Fn(&str, &BreakpointSpec) -> Option<Mutation>>;

/// Wraps a closure as a [`ResizeListener`].
///
/// Registration and removal compare listeners by `Rc` identity, so keep a
/// clone of the returned handle to remove the listener later.
pub fn resize_listener(f: impl Fn(f64, f64) -> Option<Mutation> + 'static) -> ResizeListener {
    Rc::new(f)
}

/// Wraps a closure as a [`ScrollListener`].
pub fn scroll_listener(f: impl Fn(f64) -> Option<Mutation> + 'static) -> ScrollListener {
    Rc::new(f)
}

/// Wraps a closure as a [`BreakpointListener`].
pub fn breakpoint_listener(
    f: impl Fn(&str, &BreakpointSpec) -> Option<Mutation> + 'static,
) -> BreakpointListener {
    Rc::new(f)
}

/// Wraps a closure as a [`Mutation`] for returning from a listener.
pub fn mutation(f: impl FnOnce() + 'static) -> Mutation {
    Box::new(f)
}

/// A scroll callback paired with the breakpoints it is active in.
pub(crate) struct ScrollEntry {
    pub(crate) listener: ScrollListener,
    pub(crate) breakpoints: IndexSet<BreakpointName>,
}

impl ScrollEntry {
    /// An empty filter set matches every breakpoint; a non-empty one requires
    /// the current breakpoint to be resolved and listed.
    pub(crate) fn is_active_for(&self, breakpoint: Option<&str>) -> bool {
        self.breakpoints.is_empty()
            || breakpoint.is_some_and(|name| self.breakpoints.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_every_breakpoint() {
        let entry = ScrollEntry {
            listener: scroll_listener(|_| None),
            breakpoints: IndexSet::new(),
        };
        assert!(entry.is_active_for(Some("m")));
        assert!(entry.is_active_for(None));
    }

    #[test]
    fn filter_requires_a_listed_breakpoint() {
        let mut breakpoints = IndexSet::new();
        breakpoints.insert("m".to_owned());
        let entry = ScrollEntry {
            listener: scroll_listener(|_| None),
            breakpoints,
        };
        assert!(entry.is_active_for(Some("m")));
        assert!(!entry.is_active_for(Some("s")));
        assert!(!entry.is_active_for(None));
    }
}
