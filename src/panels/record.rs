use super::widget::Widget;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Registry-assigned panel identifier. Allocated monotonically, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(u64);

impl WindowId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Tracked state of one floating panel.
pub(crate) struct WindowRecord {
    pub id: WindowId,
    pub title: String,
    pub widget: Arc<dyn Widget>,
    pub is_minimized: bool,
    pub is_active: bool,
}

impl WindowRecord {
    pub fn new(id: WindowId, title: String, widget: Arc<dyn Widget>) -> Self {
        Self {
            id,
            title,
            widget,
            is_minimized: false,
            is_active: true,
        }
    }

    /// Minimized panels can never hold focus.
    pub fn set_minimized(&mut self, minimized: bool) {
        self.is_minimized = minimized;
        if minimized {
            self.is_active = false;
        }
    }

    pub fn is_visible_and_active(&self) -> bool {
        self.is_active && !self.is_minimized
    }

    pub fn view(&self) -> WindowView {
        WindowView {
            id: self.id,
            title: self.title.clone(),
            is_minimized: self.is_minimized,
            is_active: self.is_active,
        }
    }
}

/// What subscribers see of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowView {
    pub id: WindowId,
    pub title: String,
    pub is_minimized: bool,
    pub is_active: bool,
}
