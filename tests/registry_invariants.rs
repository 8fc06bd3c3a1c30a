use floatdesk_lib::config::RegistryConfig;
use floatdesk_lib::error::WidgetError;
use floatdesk_lib::panels::{Registry, Widget, WidgetHooks, WindowId, WindowView};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DRIFT: Duration = Duration::from_millis(100);

/// Widget that behaves like a real one: commands change its state and fire
/// the matching hook synchronously.
struct LiveWidget {
    minimized: AtomicBool,
    attached: AtomicBool,
    hooks: Mutex<Option<Arc<WidgetHooks>>>,
}

impl LiveWidget {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            minimized: AtomicBool::new(false),
            attached: AtomicBool::new(true),
            hooks: Mutex::new(None),
        })
    }

    fn hooks(&self) -> Option<Arc<WidgetHooks>> {
        self.hooks.lock().unwrap().clone()
    }

    /// The user clicked the native minimize/restore control.
    fn user_sets_minimized(&self, minimized: bool) {
        self.minimized.store(minimized, Ordering::SeqCst);
        if let Some(hooks) = self.hooks() {
            if minimized {
                hooks.minimized(true);
            } else {
                hooks.restored(true);
            }
        }
    }

    /// The panel vanished without reporting a close.
    fn vanish(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }
}

impl Widget for LiveWidget {
    fn minimize(&self) -> Result<(), WidgetError> {
        self.user_sets_minimized(true);
        Ok(())
    }

    fn restore(&self) -> Result<(), WidgetError> {
        self.user_sets_minimized(false);
        Ok(())
    }

    fn focus(&self) -> Result<(), WidgetError> {
        if self.attached.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(WidgetError::Unavailable)
        }
    }

    fn close(&self, force: bool) -> Result<(), WidgetError> {
        self.attached.store(false, Ordering::SeqCst);
        if let Some(hooks) = self.hooks() {
            hooks.closed(force);
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

#[derive(Debug, Clone)]
enum Op {
    Register,
    Toggle(usize),
    Minimize(usize),
    MinimizeAll,
    Close(usize),
    CloseAll,
    UserMinimize(usize, bool),
    Vanish(usize),
    Wait(u64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Register),
        4 => any::<usize>().prop_map(Op::Toggle),
        1 => any::<usize>().prop_map(Op::Minimize),
        1 => Just(Op::MinimizeAll),
        1 => any::<usize>().prop_map(Op::Close),
        1 => Just(Op::CloseAll),
        2 => (any::<usize>(), any::<bool>()).prop_map(|(i, m)| Op::UserMinimize(i, m)),
        1 => any::<usize>().prop_map(Op::Vanish),
        2 => (1u64..250).prop_map(Op::Wait),
    ]
}

fn check(view: &[WindowView]) -> Result<(), TestCaseError> {
    let active = view.iter().filter(|v| v.is_active).count();
    prop_assert!(active <= 1, "{} active panels: {:?}", active, view);
    for panel in view {
        prop_assert!(
            !(panel.is_minimized && panel.is_active),
            "minimized panel is active: {:?}",
            panel
        );
    }
    Ok(())
}

fn run(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap();

    runtime.block_on(async move {
        let registry = Registry::new(RegistryConfig {
            drift_interval: DRIFT,
            activation_delay: Duration::from_millis(20),
        })
        .unwrap();

        // Every snapshot any subscriber is ever handed must hold the invariants.
        let violations = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&violations);
        let _subscription = registry.subscribe(move |snapshot: &[WindowView]| {
            if let Err(e) = check(snapshot) {
                sink.lock().unwrap().push(e.to_string());
            }
        });

        let mut panels: Vec<(WindowId, Arc<LiveWidget>)> = Vec::new();
        let pick = |panels: &[(WindowId, Arc<LiveWidget>)], i: usize| {
            (!panels.is_empty()).then(|| panels[i % panels.len()].clone())
        };

        for op in ops {
            match op {
                Op::Register => {
                    let widget = LiveWidget::new();
                    let id = registry.register(format!("panel {}", panels.len()), widget.clone());
                    panels.push((id, widget));
                }
                Op::Toggle(i) => {
                    if let Some((id, _)) = pick(&panels, i) {
                        registry.toggle(id);
                    }
                }
                Op::Minimize(i) => {
                    if let Some((id, _)) = pick(&panels, i) {
                        registry.minimize(id);
                    }
                }
                Op::MinimizeAll => registry.minimize_all(),
                Op::Close(i) => {
                    if let Some((id, _)) = pick(&panels, i) {
                        registry.close(id);
                    }
                }
                Op::CloseAll => registry.close_all(),
                Op::UserMinimize(i, minimized) => {
                    if let Some((_, widget)) = pick(&panels, i) {
                        widget.user_sets_minimized(minimized);
                    }
                }
                Op::Vanish(i) => {
                    if let Some((_, widget)) = pick(&panels, i) {
                        widget.vanish();
                    }
                }
                Op::Wait(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            }

            tokio::time::sleep(Duration::from_millis(1)).await;
            check(&registry.snapshot())?;
        }

        // After a full drift pass nothing detached is still tracked.
        tokio::time::sleep(DRIFT * 2).await;
        let view = registry.snapshot();
        check(&view)?;
        for panel in &view {
            let widget = panels
                .iter()
                .find(|(id, _)| *id == panel.id)
                .map(|(_, widget)| widget.clone())
                .unwrap();
            prop_assert!(widget.is_attached());
            prop_assert_eq!(widget.is_minimized(), panel.is_minimized);
        }

        let violations = violations.lock().unwrap();
        prop_assert!(violations.is_empty(), "{:?}", *violations);
        Ok::<(), TestCaseError>(())
    })
}

proptest! {
    /// Property: no sequence of commands and widget reports breaks the
    /// single-active or minimized-implies-inactive invariants, and drift
    /// correction converges on the widgets' live state.
    #[test]
    fn prop_invariants_hold(ops in prop::collection::vec(arb_op(), 1..60)) {
        run(ops)?;
    }
}

#[test]
fn fresh_subscriber_after_close_all_sees_nothing() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap();
    runtime.block_on(async {
        let registry = Registry::new(RegistryConfig::default()).unwrap();
        registry.register("A", LiveWidget::new());
        registry.register("B", LiveWidget::new());
        registry.close_all();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = registry.subscribe(move |snapshot: &[WindowView]| {
            sink.lock().unwrap().push(snapshot.to_vec());
        });
        tokio::time::sleep(Duration::from_millis(300)).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_empty());
        assert!(registry.is_empty());
    });
}
