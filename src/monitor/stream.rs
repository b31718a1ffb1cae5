//! Async adapter over `urlChanged`.

use std::fmt;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::snapshot::UrlChangeEvent;
use super::url_monitor::URL_CHANGED;
use crate::emitter::{EventEmitter, SubscriptionId};

/// A stream of URL changes.
///
/// Returned by [`super::UrlMonitor::changes`]. Each detected change is
/// buffered until polled. Dropping the stream removes its subscription; the
/// stream ends when the monitor is dropped.
pub struct UrlChangeStream {
    events: UnboundedReceiverStream<UrlChangeEvent>,
    emitter: Weak<EventEmitter<UrlChangeEvent>>,
    subscription: SubscriptionId,
}

impl UrlChangeStream {
    pub(super) fn subscribe(emitter: &Rc<EventEmitter<UrlChangeEvent>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = emitter.on(URL_CHANGED, move |event: &UrlChangeEvent| {
            tx.send(event.clone())?;
            Ok(())
        });

        Self {
            events: UnboundedReceiverStream::new(rx),
            emitter: Rc::downgrade(emitter),
            subscription,
        }
    }
}

impl Stream for UrlChangeStream {
    type Item = UrlChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl Drop for UrlChangeStream {
    fn drop(&mut self) {
        if let Some(emitter) = self.emitter.upgrade() {
            emitter.off(&self.subscription);
        }
    }
}

impl fmt::Debug for UrlChangeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlChangeStream")
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}
