//! Repeating timer backed by a tokio task.

use std::{ops::ControlFlow, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

/// A repeating action scheduled every `period`.
///
/// The first tick fires one full period after arming. Dropping the timer
/// cancels it; work the tick already spawned elsewhere keeps running.
pub struct RepeatingTimer {
    handle: JoinHandle<()>,
    period: Duration,
}

impl RepeatingTimer {
    /// Arm a timer calling `tick` every `period` until it returns `Break`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if tick().is_break() {
                    tracing::debug!("Repeating timer finished");
                    break;
                }
            }
        });

        Self { handle, period }
    }

    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Whether the timer stopped on its own.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel future ticks.
    pub fn cancel(self) {
        tracing::debug!(period = ?self.period, "Cancelling repeating timer");
        drop(self);
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    fn counting_timer(period: Duration, limit: Option<usize>) -> (RepeatingTimer, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let ticks = Arc::clone(&count);
        let timer = RepeatingTimer::arm(period, move || {
            let n = ticks.fetch_add(1, Ordering::SeqCst) + 1;
            match limit {
                Some(limit) if n >= limit => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        });
        (timer, count)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let (_timer, count) = counting_timer(Duration::from_secs(60), None);

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let (timer, count) = counting_timer(Duration::from_secs(60), None);

        tokio::time::sleep(Duration::from_secs(61)).await;
        timer.cancel();
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_break_finishes_timer() {
        let (timer, count) = counting_timer(Duration::from_secs(1), Some(2));

        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(timer.is_finished());
    }
}
