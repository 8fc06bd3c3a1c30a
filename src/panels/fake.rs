//! In-memory widget used by the registry tests.

use super::record::WindowView;
use super::widget::{Widget, WidgetHooks};
use crate::error::WidgetError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Minimize,
    Restore,
    Focus,
    Close { force: bool },
}

/// A widget that records every command. With `echo`, commands also fire the
/// matching hook synchronously, the way real widgets re-enter their owner.
pub struct FakeWidget {
    minimized: AtomicBool,
    attached: AtomicBool,
    echo: bool,
    calls: Mutex<Vec<Call>>,
    hooks: Mutex<Option<Arc<WidgetHooks>>>,
}

impl FakeWidget {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(false))
    }

    pub fn echoing() -> Arc<Self> {
        Arc::new(Self::build(true))
    }

    fn build(echo: bool) -> Self {
        Self {
            minimized: AtomicBool::new(false),
            attached: AtomicBool::new(true),
            echo,
            calls: Mutex::new(Vec::new()),
            hooks: Mutex::new(None),
        }
    }

    fn hooks(&self) -> Option<Arc<WidgetHooks>> {
        self.hooks.lock().unwrap().clone()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fire_minimize(&self, minimized: bool) {
        if let Some(hooks) = self.hooks() {
            hooks.minimized(minimized);
        }
    }

    pub fn fire_restore(&self, restored: bool) {
        if let Some(hooks) = self.hooks() {
            hooks.restored(restored);
        }
    }

    pub fn fire_close(&self, forced: bool) {
        self.attached.store(false, Ordering::SeqCst);
        if let Some(hooks) = self.hooks() {
            hooks.closed(forced);
        }
    }

    /// Remove the visual element without telling anyone.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    /// Change the live minimized flag without firing a hook.
    pub fn set_minimized_silently(&self, minimized: bool) {
        self.minimized.store(minimized, Ordering::SeqCst);
    }
}

impl Widget for FakeWidget {
    fn minimize(&self) -> Result<(), WidgetError> {
        self.push(Call::Minimize);
        self.minimized.store(true, Ordering::SeqCst);
        if self.echo {
            self.fire_minimize(true);
        }
        Ok(())
    }

    fn restore(&self) -> Result<(), WidgetError> {
        self.push(Call::Restore);
        self.minimized.store(false, Ordering::SeqCst);
        if self.echo {
            self.fire_restore(true);
        }
        Ok(())
    }

    fn focus(&self) -> Result<(), WidgetError> {
        self.push(Call::Focus);
        Ok(())
    }

    fn close(&self, force: bool) -> Result<(), WidgetError> {
        self.push(Call::Close { force });
        self.attached.store(false, Ordering::SeqCst);
        if self.echo {
            self.fire_close(force);
        }
        Ok(())
    }

    fn is_minimized(&self) -> bool {
        self.minimized.load(Ordering::SeqCst)
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    fn set_hooks(&self, hooks: WidgetHooks) {
        *self.hooks.lock().unwrap() = Some(Arc::new(hooks));
    }
}

/// Every snapshot a subscriber has been handed, in order.
#[derive(Clone, Default)]
pub struct Recorder {
    seen: Arc<Mutex<Vec<Vec<WindowView>>>>,
}

impl Recorder {
    pub fn callback(&self) -> impl Fn(&[WindowView]) + Send + Sync + 'static {
        let seen = Arc::clone(&self.seen);
        move |snapshot| seen.lock().unwrap().push(snapshot.to_vec())
    }

    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last(&self) -> Vec<WindowView> {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn take(&self) -> Vec<Vec<WindowView>> {
        std::mem::take(&mut *self.seen.lock().unwrap())
    }
}
