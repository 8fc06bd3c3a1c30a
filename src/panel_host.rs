//! Floating panels backed by native Tauri webview windows.

use crate::error::WidgetError;
use crate::panels::{Widget, WidgetHooks};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder, WindowEvent};
use tracing::{debug, warn};

pub const PANEL_LABEL_PREFIX: &str = "panel-";

const DEFAULT_ROUTE: &str = "panel.html";

pub struct TauriPanel {
    window: WebviewWindow,
    hooks: Mutex<Option<Arc<WidgetHooks>>>,
    minimized: AtomicBool,
    force_closing: AtomicBool,
}

impl TauriPanel {
    fn new(window: WebviewWindow) -> Self {
        Self {
            window,
            hooks: Mutex::new(None),
            minimized: AtomicBool::new(false),
            force_closing: AtomicBool::new(false),
        }
    }

    pub fn label(&self) -> &str {
        self.window.label()
    }

    fn hooks(&self) -> Option<Arc<WidgetHooks>> {
        match self.hooks.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        }
    }

    /// Translate a native window event into the matching hook.
    fn handle_event(&self, event: &WindowEvent) {
        match event {
            WindowEvent::Destroyed => {
                let forced = self.force_closing.load(Ordering::SeqCst);
                debug!(label = %self.label(), forced, "panel window destroyed");
                if let Some(hooks) = self.hooks() {
                    hooks.closed(forced);
                }
            }
            // Tauri has no minimize event; minimizing shows up as a resize
            // or a focus change.
            WindowEvent::Resized(_) | WindowEvent::Focused(_) => {
                let now = self.is_minimized();
                let before = self.minimized.swap(now, Ordering::SeqCst);
                if now == before {
                    return;
                }
                if let Some(hooks) = self.hooks() {
                    if now {
                        hooks.minimized(true);
                    } else {
                        hooks.restored(true);
                    }
                }
            }
            _ => {}
        }
    }
}

impl Widget for TauriPanel {
    fn minimize(&self) -> Result<(), WidgetError> {
        self.window
            .minimize()
            .map_err(|e| WidgetError::command("minimize", e))
    }

    fn restore(&self) -> Result<(), WidgetError> {
        self.window
            .unminimize()
            .map_err(|e| WidgetError::command("restore", e))
    }

    fn focus(&self) -> Result<(), WidgetError> {
        self.window
            .set_focus()
            .map_err(|e| WidgetError::command("focus", e))
    }

    fn close(&self, force: bool) -> Result<(), WidgetError> {
        if !self.is_attached() {
            return Err(WidgetError::Unavailable);
        }
        if force {
            self.force_closing.store(true, Ordering::SeqCst);
            self.window
                .destroy()
                .map_err(|e| WidgetError::command("close", e))
        } else {
            self.window
                .close()
                .map_err(|e| WidgetError::command("close", e))
        }
    }

    fn is_minimized(&self) -> bool {
        self.window.is_minimized().unwrap_or(false)
    }

    fn is_attached(&self) -> bool {
        self.window
            .app_handle()
            .get_webview_window(self.window.label())
            .is_some()
    }

    fn set_hooks(&self, hooks: WidgetHooks) {
        if let Ok(mut guard) = self.hooks.lock() {
            *guard = Some(Arc::new(hooks));
        }
    }
}

/// Creates panel windows and routes their native events.
pub struct PanelHost {
    panels: Mutex<HashMap<String, Arc<TauriPanel>>>,
    next_label: AtomicU64,
}

impl PanelHost {
    pub fn new() -> Self {
        Self {
            panels: Mutex::new(HashMap::new()),
            next_label: AtomicU64::new(1),
        }
    }

    pub fn open(
        &self,
        app: &AppHandle,
        title: &str,
        route: Option<&str>,
    ) -> Result<Arc<TauriPanel>, String> {
        let label = format!(
            "{}{}",
            PANEL_LABEL_PREFIX,
            self.next_label.fetch_add(1, Ordering::SeqCst)
        );
        let url = WebviewUrl::App(route.unwrap_or(DEFAULT_ROUTE).into());

        let window = WebviewWindowBuilder::new(app, &label, url)
            .title(title)
            .inner_size(480.0, 360.0)
            .build()
            .map_err(|e| format!("Failed to create panel window: {}", e))?;

        let panel = Arc::new(TauriPanel::new(window));
        match self.panels.lock() {
            Ok(mut panels) => {
                panels.insert(label, Arc::clone(&panel));
            }
            Err(e) => warn!(error = %e, "panel table poisoned"),
        }
        Ok(panel)
    }

    pub fn dispatch(&self, label: &str, event: &WindowEvent) {
        let panel = match self.panels.lock() {
            Ok(mut panels) => match event {
                WindowEvent::Destroyed => panels.remove(label),
                _ => panels.get(label).cloned(),
            },
            Err(_) => return,
        };

        // Hooks run without the table locked.
        if let Some(panel) = panel {
            panel.handle_event(event);
        }
    }
}

impl Default for PanelHost {
    fn default() -> Self {
        Self::new()
    }
}
