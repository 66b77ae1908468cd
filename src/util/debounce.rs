//! Trailing-edge debouncing on tokio timers.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::BindConfig;

/// Coalesces a burst of calls into one: each [`debounce`](Self::debounce)
/// cancels the previously scheduled callback, so only the last call in a
/// quiet window runs.
///
/// Callbacks capture whatever state they need; nothing is bound implicitly.
/// Dropping the debouncer cancels the pending callback.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::with_config(&BindConfig::default())
    }
}

impl Debouncer {
    /// A debouncer whose calls default to `delay`.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn with_config(config: &BindConfig) -> Self {
        Self::new(config.debounce_delay)
    }

    /// The delay used when a call does not pass one.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `callback` after `delay` (or the default), replacing any
    /// callback still waiting. Must be called within a tokio runtime.
    pub fn debounce<F>(&mut self, callback: F, delay: Option<Duration>)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let delay = delay.unwrap_or(self.delay);
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        }));
    }

    /// Drop the waiting callback, if any. Does not interrupt one already running.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether a callback is scheduled and has not fired yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicUsize::new(0));
        let make = {
            let count = Arc::clone(&count);
            move || {
                let count = Arc::clone(&count);
                Box::new(move || {
                    count.fetch_add(1, Ordering::SeqCst);
                }) as Box<dyn FnOnce() + Send>
            }
        };
        (count, make)
    }

    #[tokio::test(start_paused = true)]
    async fn only_last_call_fires() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::default();

        for n in 0..5 {
            let fired = Arc::clone(&fired);
            debouncer.debounce(move || fired.lock().unwrap().push(n), None);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(fired.lock().unwrap().is_empty());
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(*fired.lock().unwrap(), vec![4]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn default_delay_is_300ms() {
        let (count, make) = counter();
        let mut debouncer = Debouncer::default();
        assert_eq!(debouncer.delay(), Duration::from_millis(300));

        debouncer.debounce(make(), None);
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_delay_overrides_default() {
        let (count, make) = counter();
        let mut debouncer = Debouncer::with_config(
            &BindConfig::new().with_debounce_delay(Duration::from_secs(10)),
        );
        debouncer.debounce(make(), Some(Duration::from_millis(20)));
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn calls_outside_the_window_each_fire() {
        let (count, make) = counter();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        debouncer.debounce(make(), None);
        tokio::time::sleep(Duration::from_millis(60)).await;
        debouncer.debounce(make(), None);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_prevent_firing() {
        let (count, make) = counter();
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        debouncer.debounce(make(), None);
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        debouncer.debounce(make(), None);
        drop(debouncer);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
