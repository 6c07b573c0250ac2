//! Fixed-rate ticker driving smooth cursor motion during playback.
//!
//! Media players report their position far less often than a display
//! refreshes, so while audio is playing the player recomputes progress on
//! every tick of this timer instead.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval_at};

use super::event::Tick;
use crate::constants::TICK_INTERVAL;
use crate::events::{EventBus, Subscription};

pub struct Timer {
    period: Duration,
    ticks: Arc<EventBus<Tick>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

impl Timer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            ticks: Arc::new(EventBus::new()),
            task: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn on_tick<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Tick) + Send + Sync + 'static,
    {
        self.ticks.on(Tick, handler)
    }

    pub fn is_running(&self) -> bool {
        self.task().as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Begin ticking. Calling this while already running does nothing.
    pub fn start(&self) {
        let mut task = self.task();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("Timer started outside a tokio runtime; progress ticks disabled");
            return;
        };

        let ticks = Arc::clone(&self.ticks);
        let period = self.period;
        *task = Some(runtime.spawn(async move {
            let mut interval = interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                ticks.emit(Tick);
            }
        }));
        log::debug!("Timer started ({:?} period)", period);
    }

    /// Halt ticking. Calling this while stopped does nothing.
    pub fn stop(&self) {
        if let Some(task) = self.task().take() {
            task.abort();
            log::debug!("Timer stopped");
        }
    }

    /// Stop and drop every tick listener.
    pub fn destroy(&self) {
        self.stop();
        self.ticks.un_all();
    }

    fn task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}
