use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{select, Either};
use futures_util::StreamExt;
use managed_ticker::utils::interval::interval;
use managed_ticker::utils::secs;
use managed_ticker::utils::shutdown::ShutdownHandle;
use managed_ticker::{Error, ManagedTicker, TickerConfig};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(clap::Parser)]
pub struct Opts {
    /// Tick period in milliseconds
    #[clap(long, env = "TICKER_PERIOD_MS", default_value = "1000")]
    period: u64,
    /// Deliver a first tick right away
    #[clap(long)]
    tick_on_init: bool,
    /// Read period and tick-on-init from a JSON file instead
    #[clap(long, env = "TICKER_CONFIG")]
    config: Option<PathBuf>,
    /// Simulated processing time per tick, in milliseconds
    #[clap(long, default_value = "0")]
    consumer_delay: u64,
    /// How often to log a status line, in milliseconds
    #[clap(long, default_value = "10000")]
    status_every: u64,
}

pub async fn execute(opts: Opts, shutdown_handle: ShutdownHandle) -> Result<(), Error> {
    let config = match opts.config.as_deref() {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading ticker config");
            TickerConfig::load(path).await?
        }
        None => {
            let config = TickerConfig::new(Duration::from_millis(opts.period), opts.tick_on_init);
            config.validate()?;
            config
        }
    };
    let consumer_delay = Duration::from_millis(opts.consumer_delay);
    if opts.status_every == 0 {
        return Err(Error::InvalidPeriod);
    }

    let (ticker, mut ticks) = ManagedTicker::from_config(&config)?;
    tracing::info!(
        period = %secs(config.period()),
        tick_on_init = config.tick_on_init,
        consumer_delay = %secs(consumer_delay),
        "Ticker running, press CTRL+C to stop"
    );

    let received = Arc::new(AtomicU64::new(0));
    tokio::task::spawn({
        let received = received.clone();
        let mut status = interval(
            Duration::from_millis(opts.status_every),
            shutdown_handle.clone(),
        );
        async move {
            while status.next().await.is_some() {
                tracing::info!(received = received.load(Ordering::Relaxed), "status");
            }
        }
    });

    loop {
        match select(ticks.next(), Box::pin(shutdown_handle.signal())).await {
            Either::Left((Some(tm), _)) => {
                let n = received.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::info!(n, at = %wall_clock(), lag = ?tm.elapsed(), "tick");
                if !consumer_delay.is_zero() {
                    tokio::time::sleep(consumer_delay).await;
                }
            }
            Either::Left((None, _)) => break,
            Either::Right(_) => {
                ticker.stop();
            }
        }
    }

    tracing::info!(
        received = received.load(Ordering::Relaxed),
        "Ticker stopped"
    );
    Ok(())
}

fn wall_clock() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("-"))
}
