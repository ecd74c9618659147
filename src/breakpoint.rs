//! Named width breakpoints: spec table, classification and errors.

use indexmap::IndexMap;
use thiserror::Error;

/// Name of one entry in a [`BreakpointSpecs`] table.
pub type BreakpointName = String;

/// Table of breakpoint specs, keyed by name.
///
/// Classification scans the table in insertion order and picks the first
/// matching spec, so with overlapping ranges the earlier entry wins. The
/// table is always replaced wholesale via
/// [`ViewportWatcher::set_breakpoint_specs`](crate::ViewportWatcher::set_breakpoint_specs);
/// there is no merging of partial tables.
pub type BreakpointSpecs = IndexMap<BreakpointName, BreakpointSpec>;

/// Width bounds for one breakpoint, in logical pixels.
///
/// A `None` bound is open on that side: `min: None` matches any width below
/// the maximum, `max: None` any width above the minimum.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BreakpointSpec {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Opaque payload handed to breakpoint listeners alongside the name.
    /// The watcher never interprets it.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "serde_json::Value::is_null")
    )]
    pub extra: serde_json::Value,
}

impl BreakpointSpec {
    pub fn new(min: impl Into<Option<f64>>, max: impl Into<Option<f64>>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
            extra: serde_json::Value::Null,
        }
    }

    pub fn with_extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = extra;
        self
    }

    /// Whether `width` falls within this spec's bounds (inclusive on both
    /// sides, open bounds always match).
    pub fn matches(&self, width: f64) -> bool {
        self.min.is_none_or(|min| width >= min) && self.max.is_none_or(|max| width <= max)
    }
}

/// First entry of `specs` whose bounds contain `width`, in insertion order.
pub(crate) fn resolve(specs: &BreakpointSpecs, width: f64) -> Option<&BreakpointName> {
    specs
        .iter()
        .find(|(_, spec)| spec.matches(width))
        .map(|(name, _)| name)
}

/// Errors raised by breakpoint-dependent queries.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BreakpointError {
    /// A breakpoint-dependent query ran before any specs were set.
    #[error("no breakpoint specs defined")]
    NoSpecs,

    /// Specs are set but none of them matches the current viewport width.
    /// This is a configuration gap, not a recoverable state: the cached
    /// breakpoint is cleared when it occurs.
    #[error("no breakpoint defined for window width {width}px")]
    Unresolved { width: f64 },

    /// A comparison named a breakpoint absent from the current spec table.
    #[error("no breakpoint specs found for breakpoint `{0}`")]
    UnknownName(BreakpointName),
}
