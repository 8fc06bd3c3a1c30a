//! Floatdesk - a desktop starter shell.
//!
//! The web UI runs inside a Tauri window; floating panels are native webview
//! windows tracked by [`panels::Registry`], and the UI reaches the shell only
//! through the allowlisted [`bridge`].

pub mod bridge;
pub mod config;
pub mod error;
pub mod logging;
pub mod panels;

#[cfg(feature = "desktop")]
mod commands;
#[cfg(feature = "desktop")]
pub mod panel_host;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use crate::bridge::Bridge;
    use crate::commands;
    use crate::config::RegistryConfig;
    use crate::panel_host::{PanelHost, PANEL_LABEL_PREFIX};
    use crate::panels::{Registry, WindowView};
    use tauri::{Emitter, Manager};

    /// Event carrying the panel snapshot to the sidebar.
    pub const PANELS_CHANGED: &str = "panels-changed";

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        tauri::Builder::default()
            .plugin(tauri_plugin_shell::init())
            .plugin(tauri_plugin_fs::init())
            .plugin(tauri_plugin_dialog::init())
            .setup(|app| {
                let config = RegistryConfig::from_env()?;
                // The registry's timers live on Tauri's runtime.
                let registry = tauri::async_runtime::block_on(async { Registry::new(config) })?;

                let handle = app.handle().clone();
                // Kept for the registry's whole lifetime.
                let _feed = registry.subscribe(move |snapshot: &[WindowView]| {
                    if let Err(e) = handle.emit(PANELS_CHANGED, snapshot.to_vec()) {
                        tracing::warn!(error = %e, "failed to publish panel snapshot");
                    }
                });

                app.manage(registry);
                app.manage(PanelHost::new());
                app.manage(Bridge::new());

                tracing::info!("Floatdesk starting");
                Ok(())
            })
            .on_window_event(|window, event| {
                let label = window.label();
                if label.starts_with(PANEL_LABEL_PREFIX) {
                    if let Some(host) = window.app_handle().try_state::<PanelHost>() {
                        host.dispatch(label, event);
                    }
                } else if let tauri::WindowEvent::Destroyed = event {
                    // Main window is gone - stop the registry's timers
                    if let Some(registry) = window.app_handle().try_state::<Registry>() {
                        tracing::info!(%label, "window destroyed, stopping panel registry");
                        registry.shutdown();
                    }
                }
            })
            .invoke_handler(tauri::generate_handler![
                commands::open_panel,
                commands::toggle_panel,
                commands::minimize_panel,
                commands::minimize_all_panels,
                commands::close_panel,
                commands::close_all_panels,
                commands::list_panels,
                commands::bridge_call,
            ])
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}
