//! Contract between the registry and the windowing widget that draws a panel.
//!
//! The widget is owned elsewhere. The registry only issues commands, reads the
//! two pieces of live state it needs for drift correction, and installs hooks
//! so the widget can report what happened on its side.

use crate::error::WidgetError;

type Hook = Box<dyn Fn(bool) + Send + Sync>;

pub trait Widget: Send + Sync {
    fn minimize(&self) -> Result<(), WidgetError>;

    fn restore(&self) -> Result<(), WidgetError>;

    fn focus(&self) -> Result<(), WidgetError>;

    /// Close the widget. `force` skips any interactive confirmation.
    fn close(&self, force: bool) -> Result<(), WidgetError>;

    fn is_minimized(&self) -> bool;

    /// Whether the widget's visual element is still present in the UI.
    fn is_attached(&self) -> bool;

    /// Replace the widget's callback slots. Hooks may be invoked from inside
    /// any of the commands above.
    fn set_hooks(&self, hooks: WidgetHooks);
}

/// The three callback slots a widget reports through.
pub struct WidgetHooks {
    on_close: Hook,
    on_minimize: Hook,
    on_restore: Hook,
}

impl WidgetHooks {
    pub fn new(
        on_close: impl Fn(bool) + Send + Sync + 'static,
        on_minimize: impl Fn(bool) + Send + Sync + 'static,
        on_restore: impl Fn(bool) + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_close: Box::new(on_close),
            on_minimize: Box::new(on_minimize),
            on_restore: Box::new(on_restore),
        }
    }

    /// The widget closed for good; `forced` when no confirmation was shown.
    pub fn closed(&self, forced: bool) {
        (self.on_close)(forced)
    }

    pub fn minimized(&self, minimized: bool) {
        (self.on_minimize)(minimized)
    }

    pub fn restored(&self, restored: bool) {
        (self.on_restore)(restored)
    }
}

impl std::fmt::Debug for WidgetHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetHooks").finish_non_exhaustive()
    }
}
