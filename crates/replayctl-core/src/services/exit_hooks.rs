//! Deferred cleanup callbacks run when the owning program exits.
//!
//! The composition root owns one registry and runs it on normal return and
//! on termination signals. Hooks run in reverse registration order and each
//! runs at most once.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type Hook = Box<dyn FnOnce() -> HookFuture + Send + 'static>;

/// Registry of cleanup callbacks, shared by clone.
#[derive(Clone, Default)]
pub struct ExitHooks {
    hooks: Arc<Mutex<Vec<(String, Hook)>>>,
}

impl ExitHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cleanup callback under a diagnostic name.
    pub fn register<F, Fut>(&self, name: impl Into<String>, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        debug!(hook = %name, "Registering exit hook");
        let boxed: Hook = Box::new(move || Box::pin(hook()) as HookFuture);
        self.lock().push((name, boxed));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run and drain every registered hook, newest first.
    ///
    /// Returns the number of hooks that ran. Hooks registered while this runs
    /// are left for the next call.
    pub async fn run_all(&self) -> usize {
        let hooks = std::mem::take(&mut *self.lock());
        let count = hooks.len();

        for (name, hook) in hooks.into_iter().rev() {
            debug!(hook = %name, "Running exit hook");
            hook().await;
        }

        count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, Hook)>> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ExitHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.lock().iter().map(|(n, _)| n.clone()).collect();
        f.debug_struct("ExitHooks").field("hooks", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LaunchOptions, PortSet, ReplayerInfo, StopReport, SupervisorState};
    use crate::ports::{ReplayerRunner, SupervisorError};
    use async_trait::async_trait;

    #[tokio::test]
    async fn hooks_run_in_reverse_order() {
        let hooks = ExitHooks::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            hooks.register(format!("hook-{i}"), move || async move {
                order.lock().unwrap().push(i);
            });
        }
        assert_eq!(hooks.len(), 3);

        assert_eq!(hooks.run_all().await, 3);
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn hooks_run_only_once() {
        let hooks = ExitHooks::new();
        let runs = Arc::new(Mutex::new(0));
        let counter = runs.clone();
        hooks.register("once", move || async move {
            *counter.lock().unwrap() += 1;
        });

        hooks.run_all().await;
        assert_eq!(hooks.run_all().await, 0);
        assert_eq!(*runs.lock().unwrap(), 1);
        assert!(hooks.is_empty());
    }

    struct MockRunner {
        stops: Mutex<Vec<StopReport>>,
        running: Mutex<bool>,
    }

    #[async_trait]
    impl ReplayerRunner for MockRunner {
        async fn start(&self, options: LaunchOptions) -> Result<ReplayerInfo, SupervisorError> {
            self.fast_start(options).await
        }

        async fn fast_start(
            &self,
            _options: LaunchOptions,
        ) -> Result<ReplayerInfo, SupervisorError> {
            *self.running.lock().unwrap() = true;
            Ok(ReplayerInfo {
                pid: Some(4242),
                command: "replayer".to_string(),
                ports: PortSet::inbound_outbound(7001, 7002),
                started_at: chrono::Utc::now(),
            })
        }

        async fn stop(&self) -> StopReport {
            let mut running = self.running.lock().unwrap();
            let report = if *running {
                StopReport::Stopped {
                    pid: Some(4242),
                    recovery: crate::domain::Recovery::Skipped,
                }
            } else {
                StopReport::NotRunning
            };
            *running = false;
            self.stops.lock().unwrap().push(report.clone());
            report
        }

        async fn state(&self) -> SupervisorState {
            if *self.running.lock().unwrap() {
                SupervisorState::Running
            } else {
                SupervisorState::Idle
            }
        }
    }

    #[tokio::test]
    async fn duplicate_stop_hooks_are_harmless() {
        let runner = Arc::new(MockRunner {
            stops: Mutex::new(Vec::new()),
            running: Mutex::new(false),
        });
        runner.start(LaunchOptions::new()).await.unwrap();

        let hooks = ExitHooks::new();
        for _ in 0..2 {
            let runner = runner.clone();
            hooks.register("replayer-stop", move || async move {
                runner.stop().await;
            });
        }
        hooks.run_all().await;

        let stops = runner.stops.lock().unwrap();
        assert!(stops[0].was_running());
        assert_eq!(stops[1], StopReport::NotRunning);
        drop(stops);
        assert_eq!(runner.state().await, SupervisorState::Idle);
    }
}
