//! # Windowatch
//!
//! Windowatch observes a viewport (width, height, vertical scroll offset
//! and a configurable set of named width breakpoints) and notifies
//! registered listeners of changes, coalescing every notification into a
//! single flush per animation frame.
//!
//! ```
//! use windowatch::headless::HeadlessViewport;
//! use windowatch::{scroll_listener, BreakpointSpec, BreakpointSpecs, ViewportWatcher};
//!
//! let viewport = HeadlessViewport::new(800.0, 600.0);
//! let watcher = ViewportWatcher::new(viewport.clone());
//!
//! let mut specs = BreakpointSpecs::new();
//! specs.insert("s".into(), BreakpointSpec::new(None, 599.0));
//! specs.insert("m".into(), BreakpointSpec::new(600.0, 999.0));
//! specs.insert("l".into(), BreakpointSpec::new(1000.0, None));
//! watcher.set_breakpoint_specs(specs)?;
//! assert_eq!(watcher.breakpoint()?, "m");
//!
//! // only called while the breakpoint is "s" or "m"
//! watcher.add_scroll_listener(
//!     scroll_listener(|scroll_y| {
//!         println!("scrolled to {scroll_y}");
//!         None
//!     }),
//!     &["s", "m"],
//! );
//! # Ok::<(), windowatch::BreakpointError>(())
//! ```
//!
//! ## Listeners and the frame flush
//!
//! Listeners are registered per concern (resize, scroll, breakpoint) and
//! fire at most once per animation frame, in that fixed order, with the
//! latest measured state. A listener may return a [`Mutation`]: listeners
//! run first as the measure phase of a flush, and every returned mutation
//! runs afterwards as the mutate phase, so reads and writes of layout state
//! never interleave within a frame.
//!
//! Scroll listeners take an optional breakpoint filter and only fire (and
//! only keep the native scroll handler alive) while the current breakpoint
//! is in their filter.
//!
//! ## Native listener lifecycle
//!
//! The watcher attaches platform handlers only while some registered
//! listener needs them and detaches them when the last one is removed.
//! Getters stay accurate either way: with no native handler attached they
//! measure synchronously on demand.
//!
//! ## Platform adapters
//!
//! The host environment is reached through the [`Viewport`] trait. The crate
//! ships [`headless::HeadlessViewport`] for tests and benchmarks; real
//! adapters (a browser window, a native window) live with the embedder. A
//! conventional process-wide instance is available through [`init_shared`] /
//! [`shared`].

pub mod breakpoint;
pub mod headless;
pub mod listener;
mod shared;
pub mod viewport;
mod watcher;

pub use breakpoint::{BreakpointError, BreakpointName, BreakpointSpec, BreakpointSpecs};
pub use listener::{
    breakpoint_listener, mutation, resize_listener, scroll_listener, BreakpointListener,
    Mutation, ResizeListener, ScrollListener,
};
pub use shared::{init_shared, shared, try_shared};
pub use viewport::{EventHandler, FrameCallback, Viewport, ViewportEvent};
pub use watcher::ViewportWatcher;
