use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::Instant;

use crate::config::TickerConfig;
use crate::error::Error;
use crate::ticks::Ticks;
use crate::timer::{self, PeriodicTimer, TimerFire};
use crate::utils::secs;
use crate::utils::shutdown::{Shutdown, ShutdownHandle};

/// Delivers ticks to a single [`Ticks`] consumer every `period`.
///
/// A consumer that falls behind never blocks the ticker: at most one tick is pending, further
/// ticks are dropped until it is received. Every delivery, no matter if it came from the
/// period elapsing, from [`tick`](Self::tick) or from [`tick_after`](Self::tick_after), restarts
/// the period. Dropping the ticker stops it.
#[derive(Debug)]
pub struct ManagedTicker {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    period: Duration,
    runtime: Handle,
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    /// `None` once stopped.
    tx: Option<mpsc::Sender<Instant>>,
    timer: PeriodicTimer,
    shutdown: Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent,
    /// A tick was still pending, the new one got dropped.
    Coalesced,
    /// The consumer is gone.
    Abandoned,
    Stopped,
}

impl ManagedTicker {
    /// Creates and starts a ticker. With `tick_on_init`, a first tick is pending right away,
    /// otherwise the first tick arrives after `period`.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero or if called outside of a tokio runtime.
    pub fn new(period: Duration, tick_on_init: bool) -> (Self, Ticks) {
        match Self::try_new(period, tick_on_init) {
            Ok(ticker) => ticker,
            Err(err) => panic!("failed to create ticker: {}", err),
        }
    }

    pub fn try_new(period: Duration, tick_on_init: bool) -> Result<(Self, Ticks), Error> {
        if period.is_zero() {
            return Err(Error::InvalidPeriod);
        }
        let runtime = Handle::try_current()?;

        let (tx, rx) = mpsc::channel(1);
        let (timer, fire) = PeriodicTimer::start(period);
        let shutdown = Shutdown::default();
        let shutdown_handle = shutdown.handle();

        let shared = Arc::new(Shared {
            period,
            runtime,
            state: Mutex::new(State {
                tx: Some(tx),
                timer,
                shutdown,
            }),
        });
        shared
            .runtime
            .spawn(run(shared.clone(), fire, shutdown_handle));
        tracing::debug!(period = %secs(period), tick_on_init, "ticker started");

        if tick_on_init {
            shared.deliver(Instant::now());
        }

        Ok((Self { shared }, Ticks::new(rx)))
    }

    pub fn from_config(config: &TickerConfig) -> Result<(Self, Ticks), Error> {
        config.validate()?;
        Self::try_new(config.period(), config.tick_on_init)
    }

    /// The period the ticker was created with.
    pub fn period(&self) -> Duration {
        self.shared.period
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.lock().tx.is_none()
    }

    /// Delivers a tick right away.
    pub fn tick(&self) {
        self.shared.deliver(Instant::now());
    }

    /// Delivers a tick once `delay` elapsed, counted from this call. The current schedule is
    /// left untouched until then.
    pub fn tick_after(&self, delay: Duration) {
        let deadline = timer::deadline_after(delay);
        let shared = self.shared.clone();
        self.shared.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            shared.deliver(Instant::now());
        });
    }

    /// Lets the next tick arrive `period` from now (and keeps that cadence until the next
    /// delivery, which falls back to the period the ticker was created with).
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn reset(&self, period: Duration) {
        if let Err(err) = self.try_reset(period) {
            panic!("failed to reset ticker: {}", err);
        }
    }

    pub fn try_reset(&self, period: Duration) -> Result<(), Error> {
        if period.is_zero() {
            return Err(Error::InvalidPeriod);
        }

        self.shared.lock().timer.reset(period);
        tracing::debug!(period = %secs(period), "ticker reset");
        Ok(())
    }

    /// Stops the ticker and closes the [`Ticks`]. Stopping an already stopped ticker does
    /// nothing.
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        if state.tx.take().is_none() {
            return;
        }

        state.timer.stop();
        state.shutdown.shutdown();
        tracing::debug!("ticker stopped");
    }
}

impl Drop for ManagedTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // the state is never left half-updated while the lock is held
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, tm: Instant) -> Delivery {
        let state = self.lock();
        let tx = match &state.tx {
            Some(tx) => tx,
            None => {
                tracing::trace!("tick discarded, ticker stopped");
                return Delivery::Stopped;
            }
        };

        let delivery = match tx.try_send(tm) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(_)) => Delivery::Coalesced,
            Err(TrySendError::Closed(_)) => Delivery::Abandoned,
        };
        state.timer.reset(self.period);

        match delivery {
            Delivery::Sent => tracing::trace!("tick sent"),
            Delivery::Coalesced => tracing::trace!("tick coalesced, previous tick still pending"),
            Delivery::Abandoned => tracing::trace!("tick discarded, consumer gone"),
            Delivery::Stopped => {}
        }
        delivery
    }
}

#[tracing::instrument(skip_all, fields(period = %secs(shared.period)))]
async fn run(shared: Arc<Shared>, mut fire: TimerFire, shutdown: ShutdownHandle) {
    let signal = shutdown.signal();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            biased;

            _ = &mut signal => break,
            fired = fire.fired() => match fired {
                Some(tm) => {
                    shared.deliver(tm);
                }
                None => break,
            },
        }
    }

    tracing::debug!("ticker worker exited");
}
