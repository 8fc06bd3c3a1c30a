//! Floating panel management.
//!
//! [`Registry`] tracks every open panel, reconciles its state against the
//! [`Widget`] that draws it, and feeds snapshots to subscribers such as the
//! sidebar.

mod deferred;
mod record;
mod registry;
mod widget;

#[cfg(test)]
pub(crate) mod fake;

pub use record::{WindowId, WindowView};
pub use registry::{Registry, Subscription};
pub use widget::{Widget, WidgetHooks};
