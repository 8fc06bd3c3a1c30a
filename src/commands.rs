//! Tauri commands - invokable from the web UI.

use crate::bridge::{Bridge, BridgeRequest, BridgeResponse};
use crate::panel_host::PanelHost;
use crate::panels::{Registry, WindowId, WindowView};
use tauri::{AppHandle, State};

/// Open a new floating panel and make it the active one
#[tauri::command]
pub async fn open_panel(
    app: AppHandle,
    registry: State<'_, Registry>,
    host: State<'_, PanelHost>,
    title: String,
    route: Option<String>,
) -> Result<WindowId, String> {
    let panel = host.open(&app, &title, route.as_deref())?;
    tracing::info!(label = %panel.label(), %title, "panel window opened");
    Ok(registry.register(title, panel))
}

#[tauri::command]
pub async fn toggle_panel(registry: State<'_, Registry>, id: WindowId) -> Result<(), String> {
    registry.toggle(id);
    Ok(())
}

#[tauri::command]
pub async fn minimize_panel(registry: State<'_, Registry>, id: WindowId) -> Result<(), String> {
    registry.minimize(id);
    Ok(())
}

#[tauri::command]
pub async fn minimize_all_panels(registry: State<'_, Registry>) -> Result<(), String> {
    registry.minimize_all();
    Ok(())
}

#[tauri::command]
pub async fn close_panel(registry: State<'_, Registry>, id: WindowId) -> Result<(), String> {
    registry.close(id);
    Ok(())
}

#[tauri::command]
pub async fn close_all_panels(registry: State<'_, Registry>) -> Result<(), String> {
    registry.close_all();
    Ok(())
}

/// Current panel snapshot, for UI that mounts after the last change event
#[tauri::command]
pub async fn list_panels(registry: State<'_, Registry>) -> Result<Vec<WindowView>, String> {
    Ok(registry.snapshot())
}

/// Answer a restricted bridge request
#[tauri::command]
pub async fn bridge_call(
    bridge: State<'_, Bridge>,
    request: BridgeRequest,
) -> Result<BridgeResponse, String> {
    Ok(bridge.handle(&request))
}
