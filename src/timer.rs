//! A periodic timer that can be reprogrammed from any thread while a single task waits on it.
//!
//! [`PeriodicTimer`] is the programming side and is owned by the ticker's locked state.
//! [`TimerFire`] is the waiting side and is owned by the ticker's worker task.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Schedule {
    next: Instant,
    period: Duration,
}

impl Schedule {
    fn starting_now(period: Duration) -> Self {
        Self {
            next: deadline_after(period),
            period,
        }
    }
}

/// Roughly 30 years, the same horizon `tokio::time::sleep` falls back to.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + delay`, capped at a far-future deadline instead of overflowing.
pub(crate) fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE)
}

#[derive(Debug)]
pub struct PeriodicTimer {
    tx: watch::Sender<Option<Schedule>>,
}

#[derive(Debug)]
pub struct TimerFire {
    rx: watch::Receiver<Option<Schedule>>,
    armed: Option<Schedule>,
}

impl PeriodicTimer {
    /// Starts a timer firing every `period`, the first time one `period` from now.
    pub fn start(period: Duration) -> (Self, TimerFire) {
        let (tx, rx) = watch::channel(Some(Schedule::starting_now(period)));
        let armed = *rx.borrow();
        let fire = TimerFire { armed, rx };
        (Self { tx }, fire)
    }

    /// Fires next in `period` from now, and every `period` after that.
    pub fn reset(&self, period: Duration) {
        self.tx.send_replace(Some(Schedule::starting_now(period)));
    }

    /// Disarms the timer. A later [`reset`](Self::reset) re-arms it.
    pub fn stop(&self) {
        self.tx.send_replace(None);
    }

    #[cfg(test)]
    pub(crate) fn next_fire(&self) -> Option<Instant> {
        self.tx.borrow().map(|s| s.next)
    }
}

impl TimerFire {
    /// Waits for the timer to fire and returns the time it fired at. Reprogramming the timer
    /// re-arms the wait on the new deadline instead of firing. Returns `None` once the
    /// [`PeriodicTimer`] is dropped.
    ///
    /// Cancel safe.
    pub async fn fired(&mut self) -> Option<Instant> {
        loop {
            let armed = match self.armed {
                Some(armed) => armed,
                None => {
                    self.rx.changed().await.ok()?;
                    self.armed = *self.rx.borrow_and_update();
                    continue;
                }
            };

            tokio::select! {
                biased;

                changed = self.rx.changed() => {
                    changed.ok()?;
                    self.armed = *self.rx.borrow_and_update();
                }
                _ = tokio::time::sleep_until(armed.next) => {
                    // a late fire is followed by a full period, not by a burst of catch-up fires
                    self.armed = Some(Schedule::starting_now(armed.period));
                    return Some(Instant::now());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(100);

    #[tokio::test(start_paused = true)]
    async fn fires_periodically() {
        let start = Instant::now();
        let (_timer, mut fire) = PeriodicTimer::start(PERIOD);

        let first = fire.fired().await.unwrap();
        assert_eq!(first - start, PERIOD);
        let second = fire.fired().await.unwrap();
        assert_eq!(second - first, PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_moves_the_next_fire() {
        let (timer, mut fire) = PeriodicTimer::start(PERIOD);

        tokio::time::advance(Duration::from_millis(60)).await;
        let reset_at = Instant::now();
        timer.reset(Duration::from_millis(250));
        assert_eq!(
            timer.next_fire(),
            Some(reset_at + Duration::from_millis(250))
        );

        let fired = fire.fired().await.unwrap();
        assert_eq!(fired - reset_at, Duration::from_millis(250));
        let fired_again = fire.fired().await.unwrap();
        assert_eq!(fired_again - fired, Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_timer_never_fires() {
        let (timer, mut fire) = PeriodicTimer::start(PERIOD);
        timer.stop();
        assert_eq!(timer.next_fire(), None);

        let res = tokio::time::timeout(PERIOD * 10, fire.fired()).await;
        assert!(res.is_err());

        timer.reset(PERIOD);
        assert!(fire.fired().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn huge_period_does_not_overflow() {
        let start = Instant::now();
        let (timer, mut fire) = PeriodicTimer::start(Duration::MAX);
        assert_eq!(timer.next_fire(), Some(start + FAR_FUTURE));

        timer.reset(Duration::MAX);
        assert_eq!(timer.next_fire(), Some(start + FAR_FUTURE));

        let res = tokio::time::timeout(Duration::from_secs(3600), fire.fired()).await;
        assert!(res.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_timer_ends_the_wait() {
        let (timer, mut fire) = PeriodicTimer::start(PERIOD);
        timer.stop();
        drop(timer);
        assert_eq!(fire.fired().await, None);
    }
}
