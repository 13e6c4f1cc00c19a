use std::time::Duration;

use crate::ManagedTicker;

const PERIOD: Duration = Duration::from_millis(100);

macro_rules! test_logged {
    ($name:ident, $expected:expr, |$ticker:ident| $body:block) => {
        #[tokio::test(start_paused = true)]
        #[tracing_test::traced_test]
        async fn $name() {
            let ($ticker, _ticks) = ManagedTicker::new(PERIOD, false);
            $body
            assert!(logs_contain($expected));
        }
    };
}

test_logged!(logs_start, "ticker started", |ticker| {
    ticker.tick();
});

test_logged!(logs_sent_tick, "tick sent", |ticker| {
    ticker.tick();
});

test_logged!(
    logs_coalesced_tick,
    "tick coalesced, previous tick still pending",
    |ticker| {
        ticker.tick();
        ticker.tick();
    }
);

test_logged!(logs_reset, "ticker reset", |ticker| {
    ticker.reset(Duration::from_secs(1));
});

test_logged!(logs_stop, "ticker stopped", |ticker| {
    ticker.stop();
});

test_logged!(
    logs_discarded_tick_after_stop,
    "tick discarded, ticker stopped",
    |ticker| {
        ticker.stop();
        ticker.tick();
    }
);

#[tokio::test(start_paused = true)]
#[tracing_test::traced_test]
async fn second_stop_is_silent() {
    let (ticker, _ticks) = ManagedTicker::new(PERIOD, false);
    ticker.stop();
    ticker.stop();
    // a discarded tick mentions the stopped ticker too, but must not count as a stop
    ticker.tick();
    logs_assert(|lines: &[&str]| {
        match lines
            .iter()
            .filter(|line| line.trim_end().ends_with(": ticker stopped"))
            .count()
        {
            1 => Ok(()),
            n => Err(format!("expected one stop to be logged, got {}", n)),
        }
    });
}
