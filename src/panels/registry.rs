//! Registry of open floating panels.
//!
//! The registry holds what it believes about every panel (minimized, active)
//! and keeps that belief in line with the widgets through two paths:
//!
//! - widget hooks, applied one tick later and coalesced per panel so a hook
//!   that re-enters through a widget command cannot recurse;
//! - a periodic drift pass that re-reads live widget state and drops panels
//!   whose visual element vanished without a close report.
//!
//! No registry lock is held while a widget command, a widget read, or a
//! subscriber runs.

use super::deferred::Deferred;
use super::record::{WindowId, WindowRecord, WindowView};
use super::widget::{Widget, WidgetHooks};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, WidgetError};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

type Callback = Arc<dyn Fn(&[WindowView]) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Widget failures never leave the registry; drift correction repairs
/// whatever state they leave behind.
fn command(id: WindowId, name: &'static str, result: Result<(), WidgetError>) {
    if let Err(err) = result {
        debug!(%id, command = name, error = %err, "widget command failed");
    }
}

#[derive(Default)]
struct State {
    records: BTreeMap<WindowId, WindowRecord>,
    next_id: u64,
}

impl State {
    fn allocate_id(&mut self) -> WindowId {
        self.next_id += 1;
        WindowId::new(self.next_id)
    }

    /// Make `id` the only active record.
    fn activate_only(&mut self, id: WindowId) {
        for record in self.records.values_mut() {
            record.is_active = record.id == id;
        }
    }

    fn deactivate_all(&mut self) {
        for record in self.records.values_mut() {
            record.is_active = false;
        }
    }

    fn widget(&self, id: WindowId) -> Option<Arc<dyn Widget>> {
        self.records.get(&id).map(|record| Arc::clone(&record.widget))
    }

    fn views(&self) -> Vec<WindowView> {
        self.records.values().map(WindowRecord::view).collect()
    }
}

/// Publication state. One caller delivers at a time; anyone else asking to
/// publish meanwhile marks the round dirty and the deliverer goes again.
#[derive(Default)]
struct Delivery {
    notifying: bool,
    dirty: bool,
}

#[derive(Default)]
struct Subscribers {
    next_token: u64,
    callbacks: BTreeMap<u64, Callback>,
}

/// Widget commands decided under the lock, issued after it is released.
enum ToggleAction {
    Minimize {
        target: Arc<dyn Widget>,
        promoted: Option<(WindowId, Arc<dyn Widget>)>,
    },
    Activate {
        target: Arc<dyn Widget>,
        restore: bool,
    },
}

struct Shared {
    config: RegistryConfig,
    runtime: Handle,
    state: Mutex<State>,
    subscribers: Mutex<Subscribers>,
    delivery: Mutex<Delivery>,
    deferred: Mutex<Deferred>,
    drift: Mutex<Option<AbortHandle>>,
}

/// Tracks every open floating panel and publishes snapshots to subscribers.
///
/// Dropping the registry cancels its timers; the widgets stay open.
pub struct Registry {
    shared: Arc<Shared>,
}

impl Registry {
    /// Create a registry on the ambient tokio runtime.
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let runtime = Handle::try_current().map_err(|_| RegistryError::NoRuntime)?;
        Ok(Self::with_runtime(config, runtime))
    }

    pub fn with_runtime(config: RegistryConfig, runtime: Handle) -> Self {
        let shared = Arc::new(Shared {
            config,
            runtime,
            state: Mutex::new(State::default()),
            subscribers: Mutex::new(Subscribers::default()),
            delivery: Mutex::new(Delivery::default()),
            deferred: Mutex::new(Deferred::default()),
            drift: Mutex::new(None),
        });

        let task = shared
            .runtime
            .spawn(drift_loop(Arc::downgrade(&shared), config.drift_interval));
        *lock(&shared.drift) = Some(task.abort_handle());

        info!(
            drift_interval_ms = config.drift_interval.as_millis() as u64,
            activation_delay_ms = config.activation_delay.as_millis() as u64,
            "panel registry started"
        );

        Self { shared }
    }

    /// Track a newly created widget. It becomes the active panel.
    ///
    /// Subscribers are notified right away and again once the delayed
    /// activation pass has focused the widget.
    pub fn register(&self, title: impl Into<String>, widget: Arc<dyn Widget>) -> WindowId {
        self.shared.register(title.into(), widget)
    }

    /// Minimize the panel if it is the visible active one, otherwise bring it
    /// forward (restoring it if needed) as the sole active panel.
    pub fn toggle(&self, id: WindowId) {
        self.shared.toggle(id)
    }

    /// Ask the widget to minimize. The record follows once the widget reports
    /// back or the next drift pass sees it.
    pub fn minimize(&self, id: WindowId) {
        let Some(widget) = lock(&self.shared.state).widget(id) else {
            debug!(%id, "minimize on unknown panel");
            return;
        };
        command(id, "minimize", widget.minimize());
    }

    pub fn minimize_all(&self) {
        let visible: Vec<(WindowId, Arc<dyn Widget>)> = lock(&self.shared.state)
            .records
            .values()
            .filter(|record| !record.is_minimized)
            .map(|record| (record.id, Arc::clone(&record.widget)))
            .collect();

        for (id, widget) in visible {
            command(id, "minimize", widget.minimize());
        }
    }

    /// Force-close the widget. The record goes away when the widget reports
    /// the close, or on the drift pass once its element is gone.
    pub fn close(&self, id: WindowId) {
        let Some(widget) = lock(&self.shared.state).widget(id) else {
            debug!(%id, "close on unknown panel");
            return;
        };
        command(id, "close", widget.close(true));
    }

    /// Close every widget and forget every record without waiting for
    /// confirmation.
    pub fn close_all(&self) {
        self.shared.close_all()
    }

    /// Deliver the current snapshot to `callback` now and after every change.
    ///
    /// Subscribing from inside a callback, or while another thread is
    /// publishing, defers the first delivery to the round in progress.
    pub fn subscribe(
        &self,
        callback: impl Fn(&[WindowView]) + Send + Sync + 'static,
    ) -> Subscription {
        let callback: Callback = Arc::new(callback);
        let token = {
            let mut subscribers = lock(&self.shared.subscribers);
            subscribers.next_token += 1;
            let token = subscribers.next_token;
            subscribers.callbacks.insert(token, Arc::clone(&callback));
            token
        };

        self.shared.publish(Some(callback));

        Subscription {
            shared: Arc::downgrade(&self.shared),
            token,
        }
    }

    pub fn snapshot(&self) -> Vec<WindowView> {
        lock(&self.shared.state).views()
    }

    pub fn get(&self, id: WindowId) -> Option<WindowView> {
        lock(&self.shared.state).records.get(&id).map(WindowRecord::view)
    }

    pub fn len(&self) -> usize {
        lock(&self.shared.state).records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop the drift pass and drop every pending deferred update.
    pub fn shutdown(&self) {
        if let Some(task) = lock(&self.shared.drift).take() {
            task.abort();
            info!("panel registry stopped");
        }
        lock(&self.shared.deferred).cancel_all();
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Handle returned by [`Registry::subscribe`].
pub struct Subscription {
    shared: Weak<Shared>,
    token: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(shared) = self.shared.upgrade() {
            lock(&shared.subscribers).callbacks.remove(&self.token);
        }
    }
}

impl Shared {
    fn notify(&self) {
        self.publish(None)
    }

    /// Deliver snapshots in order, newest last. A publish requested while a
    /// round is running (from a subscriber or another thread) only marks it
    /// dirty; the running deliverer then starts a fresh round for everyone.
    /// `first` alone receives the opening round.
    fn publish(&self, first: Option<Callback>) {
        {
            let mut delivery = lock(&self.delivery);
            if delivery.notifying {
                delivery.dirty = true;
                return;
            }
            delivery.notifying = true;
        }

        let mut first = first;
        loop {
            let snapshot = lock(&self.state).views();
            let callbacks: Vec<Callback> = match first.take() {
                Some(callback) => vec![callback],
                None => lock(&self.subscribers).callbacks.values().cloned().collect(),
            };

            trace!(
                panels = snapshot.len(),
                subscribers = callbacks.len(),
                "publishing panel snapshot"
            );
            for callback in callbacks {
                callback(&snapshot);
            }

            let mut delivery = lock(&self.delivery);
            if delivery.dirty {
                delivery.dirty = false;
                continue;
            }
            delivery.notifying = false;
            break;
        }
    }

    fn register(self: &Arc<Self>, title: String, widget: Arc<dyn Widget>) -> WindowId {
        let id = {
            let mut state = lock(&self.state);
            let id = state.allocate_id();
            state.deactivate_all();
            state
                .records
                .insert(id, WindowRecord::new(id, title.clone(), Arc::clone(&widget)));
            id
        };

        widget.set_hooks(self.hooks_for(id));
        info!(%id, %title, "panel registered");

        self.notify();
        self.schedule_activation(id);
        id
    }

    fn hooks_for(self: &Arc<Self>, id: WindowId) -> WidgetHooks {
        let on_close = {
            let shared = Arc::downgrade(self);
            move |forced: bool| {
                if let Some(shared) = shared.upgrade() {
                    shared.widget_closed(id, forced);
                }
            }
        };
        let on_minimize = {
            let shared = Arc::downgrade(self);
            move |minimized: bool| {
                if let Some(shared) = shared.upgrade() {
                    shared.report_minimized(id, minimized);
                }
            }
        };
        let on_restore = {
            let shared = Arc::downgrade(self);
            move |restored: bool| {
                if let Some(shared) = shared.upgrade() {
                    shared.report_minimized(id, !restored);
                }
            }
        };

        WidgetHooks::new(on_close, on_minimize, on_restore)
    }

    fn schedule_activation(self: &Arc<Self>, id: WindowId) {
        let shared = Arc::downgrade(self);
        let delay = self.config.activation_delay;

        let mut deferred = lock(&self.deferred);
        deferred.cancel_activations();
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = shared.upgrade() {
                shared.activate_registered(id);
            }
        });
        deferred.track_activation(id, task.abort_handle());
    }

    /// Second activation of a fresh panel, for widgets that finish laying
    /// themselves out after construction.
    fn activate_registered(&self, id: WindowId) {
        lock(&self.deferred).finish_activation(id);

        let widget = {
            let mut state = lock(&self.state);
            match state.records.get(&id) {
                Some(record) if !record.is_minimized => {}
                _ => return,
            }
            state.activate_only(id);
            state.widget(id)
        };

        if let Some(widget) = widget {
            command(id, "focus", widget.focus());
        }
        self.notify();
    }

    fn toggle(&self, id: WindowId) {
        let action = {
            let mut state = lock(&self.state);
            let Some(record) = state.records.get_mut(&id) else {
                debug!(%id, "toggle on unknown panel");
                return;
            };

            if record.is_visible_and_active() {
                record.set_minimized(true);
                let target = Arc::clone(&record.widget);

                let next = state
                    .records
                    .values()
                    .rev()
                    .find(|other| other.id != id && !other.is_minimized)
                    .map(|other| other.id);
                let promoted = match next {
                    Some(next) => {
                        state.activate_only(next);
                        state.widget(next).map(|widget| (next, widget))
                    }
                    None => {
                        state.deactivate_all();
                        None
                    }
                };

                ToggleAction::Minimize { target, promoted }
            } else {
                let restore = record.is_minimized;
                record.is_minimized = false;
                let target = Arc::clone(&record.widget);
                state.activate_only(id);

                ToggleAction::Activate { target, restore }
            }
        };

        match action {
            ToggleAction::Minimize { target, promoted } => {
                debug!(%id, promoted = ?promoted.as_ref().map(|(next, _)| *next), "toggle minimized panel");
                command(id, "minimize", target.minimize());
                if let Some((next, widget)) = promoted {
                    command(next, "focus", widget.focus());
                }
            }
            ToggleAction::Activate { target, restore } => {
                debug!(%id, restore, "toggle activated panel");
                if restore {
                    command(id, "restore", target.restore());
                }
                command(id, "focus", target.focus());
            }
        }

        self.notify();
    }

    /// Queue a minimize/restore report for the next tick. A later report for
    /// the same panel before that tick replaces the queued value.
    fn report_minimized(self: &Arc<Self>, id: WindowId, minimized: bool) {
        if !lock(&self.state).records.contains_key(&id) {
            debug!(%id, minimized, "report for unknown panel");
            return;
        }

        let mut deferred = lock(&self.deferred);
        if deferred.coalesce(id, minimized) {
            trace!(%id, minimized, "superseded pending report");
            return;
        }

        let shared = Arc::downgrade(self);
        let task = self.runtime.spawn(async move {
            tokio::task::yield_now().await;
            if let Some(shared) = shared.upgrade() {
                shared.apply_report(id);
            }
        });
        deferred.track_report(id, minimized, task.abort_handle());
    }

    fn apply_report(&self, id: WindowId) {
        let Some(minimized) = lock(&self.deferred).take_report(id) else {
            return;
        };

        let applied = match lock(&self.state).records.get_mut(&id) {
            Some(record) => {
                record.set_minimized(minimized);
                true
            }
            None => false,
        };

        if applied {
            debug!(%id, minimized, "applied widget report");
            self.notify();
        }
    }

    fn widget_closed(&self, id: WindowId, forced: bool) {
        let removed = lock(&self.state).records.remove(&id).is_some();
        lock(&self.deferred).cancel(id);

        if removed {
            info!(%id, forced, "panel closed");
            self.notify();
        } else {
            debug!(%id, forced, "close report for unknown panel");
        }
    }

    fn close_all(&self) {
        let records = std::mem::take(&mut lock(&self.state).records);
        lock(&self.deferred).cancel_all();

        for record in records.values() {
            command(record.id, "close", record.widget.close(true));
        }

        info!(closed = records.len(), "closed all panels");
        self.notify();
    }

    /// Re-read every widget and repair records that no longer match it.
    fn correct_drift(&self) {
        let probes: Vec<(WindowId, Arc<dyn Widget>)> = lock(&self.state)
            .records
            .values()
            .map(|record| (record.id, Arc::clone(&record.widget)))
            .collect();

        // Observed outside the lock: widget reads may call back into us.
        let observed: Vec<(WindowId, Option<bool>)> = probes
            .into_iter()
            .map(|(id, widget)| {
                let live = widget.is_attached().then(|| widget.is_minimized());
                (id, live)
            })
            .collect();

        let mut removed = Vec::new();
        let mut corrected = 0usize;
        {
            let mut state = lock(&self.state);
            for (id, live) in observed {
                match live {
                    None => {
                        if state.records.remove(&id).is_some() {
                            removed.push(id);
                        }
                    }
                    Some(minimized) => {
                        if let Some(record) = state.records.get_mut(&id) {
                            if record.is_minimized != minimized {
                                record.set_minimized(minimized);
                                corrected += 1;
                            }
                        }
                    }
                }
            }
        }

        if !removed.is_empty() {
            let mut deferred = lock(&self.deferred);
            for id in &removed {
                deferred.cancel(*id);
            }
        }

        if !removed.is_empty() || corrected > 0 {
            debug!(removed = ?removed, corrected, "drift correction");
            self.notify();
        }
    }
}

async fn drift_loop(shared: Weak<Shared>, period: Duration) {
    let period = period.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        shared.correct_drift();
    }
}
