use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, Stream};
use pin_project::pin_project;
use tokio::sync::watch;

/// Owner side of a cancellation signal. Triggering it is permanent.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

/// Observer side of a [`Shutdown`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            rx: self.tx.subscribe(),
        }
    }

    /// Signals every handle. Calling it again has no further effect.
    pub fn shutdown(&self) {
        self.tx.send_if_modified(|triggered| !std::mem::replace(triggered, true));
    }

    #[cfg(test)]
    pub(crate) fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    /// Resolves once shutdown was triggered, or once the owning [`Shutdown`] is gone.
    pub fn signal(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.rx.clone();
        async move {
            // an error means the sender was dropped, which counts as shutdown as well
            let _ = rx.wait_for(|triggered| *triggered).await;
        }
    }

    /// Ends the given stream as soon as shutdown is signalled.
    pub fn wrap_stream<S: Stream>(&self, stream: S) -> ShutdownStream<S> {
        ShutdownStream {
            stream,
            signal: self.signal().boxed(),
            done: false,
        }
    }
}

#[pin_project]
pub struct ShutdownStream<S> {
    #[pin]
    stream: S,
    signal: BoxFuture<'static, ()>,
    done: bool,
}

impl<S: Stream> Stream for ShutdownStream<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        if this.signal.as_mut().poll(cx).is_ready() {
            *this.done = true;
            return Poll::Ready(None);
        }

        let item = futures_util::ready!(this.stream.poll_next(cx));
        if item.is_none() {
            *this.done = true;
        }
        Poll::Ready(item)
    }
}
