//! A single replaceable delayed task.
//!
//! Scheduling while a task is pending aborts the pending one first, so at
//! most one scheduled action ever runs per owner.

use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct ScheduledTask {
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `delay`, replacing any pending action.
    ///
    /// Outside a tokio runtime nothing is spawned and `action` is handed
    /// back for the caller to run once it has released any locks.
    #[must_use]
    pub fn schedule<F>(&mut self, delay: Duration, action: F) -> Option<F>
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                self.handle = Some(runtime.spawn(async move {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    action();
                }));
                None
            }
            Err(_) => {
                log::warn!("No runtime for delayed task; running it now");
                Some(action)
            }
        }
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_runs_after_delay() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut task = ScheduledTask::new();
        let counter = runs.clone();
        let inline = task.schedule(Duration::from_millis(200), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(inline.is_none());

        tokio::time::sleep(Duration::from_millis(199)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(task.is_pending());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_pending() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut task = ScheduledTask::new();
        for _ in 0..3 {
            let counter = runs.clone();
            let _ = task.schedule(Duration::from_millis(200), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut task = ScheduledTask::new();
        let counter = runs.clone();
        let _ = task.schedule(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        task.cancel();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!task.is_pending());
    }

    #[test]
    fn test_without_runtime_hands_action_back() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut task = ScheduledTask::new();
        let counter = runs.clone();
        let action = task.schedule(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(!task.is_pending());

        action.expect("action returned without a runtime")();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
