use std::time::Duration;

use futures_util::Stream;
use tokio::time::{Instant, MissedTickBehavior};

use super::shutdown::{ShutdownHandle, ShutdownStream};

/// A plain, non-resettable interval that ends once `shutdown` is signalled. Unlike
/// [`tokio::time::interval`], the first item is yielded after one `period`, not immediately.
pub fn interval(
    period: Duration,
    shutdown: ShutdownHandle,
) -> ShutdownStream<impl Stream<Item = Instant>> {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let stream = futures_util::stream::poll_fn(move |cx| interval.poll_tick(cx).map(Some));
    shutdown.wrap_stream(stream)
}
