use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Receive-only side of a [`ManagedTicker`](crate::ManagedTicker).
///
/// Holds at most one pending tick. Once the ticker is stopped, a pending tick can still be
/// received, after which the source reports closure.
#[derive(Debug)]
pub struct Ticks {
    rx: mpsc::Receiver<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TryRecvError {
    #[error("no tick pending")]
    Empty,
    #[error("ticker stopped")]
    Closed,
}

impl Ticks {
    pub(crate) fn new(rx: mpsc::Receiver<Instant>) -> Self {
        Self { rx }
    }

    /// Waits for the next tick. Returns `None` once the ticker is stopped and drained.
    pub async fn recv(&mut self) -> Option<Instant> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Result<Instant, TryRecvError> {
        self.rx.try_recv().map_err(|err| match err {
            mpsc::error::TryRecvError::Empty => TryRecvError::Empty,
            mpsc::error::TryRecvError::Disconnected => TryRecvError::Closed,
        })
    }
}

impl Stream for Ticks {
    type Item = Instant;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
