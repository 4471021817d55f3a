//! Push subscriptions delivering decoded events into a bounded channel.
//!
//! A [`Subscription`] owns one ingest task. The task reads the transport log
//! stream, decodes each log in order and awaits the sink for every event, so
//! a slow consumer slows the ingest down instead of events being buffered or
//! dropped.

use crate::contract::{EventStatus, LogDecoder};
use crate::errors::{EventError, ExecutionError};
use crate::transport::{Log, LogSubscription, TransportError};
use futures::future::BoxFuture;
use futures::stream::{BoxStream, StreamExt as _};
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

type PinnedError = Arc<Mutex<Option<Arc<EventError>>>>;

/// The sending half of the bounded channel a subscription delivers into.
pub type EventSink<E> = mpsc::Sender<EventStatus<E>>;

/// The receiving half of an event channel.
pub type EventReceiver<E> = mpsc::Receiver<EventStatus<E>>;

/// Creates a bounded event channel. A full channel blocks the subscription
/// until the receiver catches up.
pub fn channel<E>(capacity: usize) -> (EventSink<E>, EventReceiver<E>) {
    mpsc::channel(capacity)
}

/// A live event subscription.
///
/// The subscription ends when the receiving side of the sink is dropped,
/// when the transport or decoding fails, or when it is cancelled. Failures
/// are pinned and available through [`Subscription::err`]. Dropping the
/// subscription cancels it.
pub struct Subscription {
    signature: String,
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    teardown: Option<BoxFuture<'static, ()>>,
    error: PinnedError,
}

impl Subscription {
    /// Spawns the ingest task on the current Tokio runtime.
    pub(crate) fn spawn<E>(
        decoder: LogDecoder<E>,
        subscription: LogSubscription,
        sink: mpsc::Sender<EventStatus<E>>,
    ) -> Self
    where
        E: Send + 'static,
    {
        let LogSubscription {
            stream,
            unsubscribe,
        } = subscription;
        let signature = decoder.signature().to_owned();
        let (cancel, cancelled) = oneshot::channel();
        let error = PinnedError::default();

        debug!(event = %signature, "starting subscription");
        let task = tokio::spawn(ingest(decoder, stream, sink, cancelled, error.clone()));

        Subscription {
            signature,
            cancel: Some(cancel),
            task: Some(task),
            teardown: unsubscribe,
            error,
        }
    }

    /// The error that ended the subscription, if any.
    pub fn err(&self) -> Option<Arc<EventError>> {
        match self.error.lock() {
            Ok(error) => error.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns `true` once the ingest task stopped.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the ingest task to stop on its own, which happens when the
    /// log stream ends, fails or the sink is closed.
    pub async fn closed(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(event = %self.signature, "subscription task failed: {}", err);
            }
        }
    }

    /// Cancels the subscription and tears it down on the transport.
    ///
    /// Once this returns no further event is delivered into the sink.
    /// Unsubscribing more than once has no effect.
    pub async fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            // The task may already have stopped and dropped the receiver.
            let _ = cancel.send(());
        }
        self.closed().await;
        if let Some(teardown) = self.teardown.take() {
            debug!(event = %self.signature, "tearing down subscription");
            teardown.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(teardown) = self.teardown.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn(teardown);
                }
                Err(_) => {
                    warn!(event = %self.signature, "dropped subscription outside of a runtime")
                }
            }
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("signature", &self.signature)
            .field("finished", &self.is_finished())
            .field("error", &self.err())
            .finish()
    }
}

async fn ingest<E>(
    decoder: LogDecoder<E>,
    mut logs: BoxStream<'static, Result<Log, TransportError>>,
    sink: mpsc::Sender<EventStatus<E>>,
    mut cancelled: oneshot::Receiver<()>,
    error: PinnedError,
) {
    let signature = decoder.signature();
    let pin = |err: ExecutionError| {
        warn!(event = %signature, "subscription failed: {}", err);
        let err = EventError::from_parts(signature.to_owned(), err);
        match error.lock() {
            Ok(mut pinned) => *pinned = Some(Arc::new(err)),
            Err(poisoned) => *poisoned.into_inner() = Some(Arc::new(err)),
        }
    };

    let mut last_position = None;
    loop {
        let next = tokio::select! {
            biased;
            _ = &mut cancelled => break,
            _ = sink.closed() => {
                debug!(event = %signature, "subscription sink closed");
                break;
            }
            next = logs.next() => next,
        };

        let log = match next {
            Some(Ok(log)) => log,
            Some(Err(err)) => {
                pin(err.into());
                break;
            }
            None => {
                debug!(event = %signature, "subscription log stream ended");
                break;
            }
        };

        if !log.removed {
            if let Some(position) = log.position() {
                if matches!(last_position, Some(last) if position <= last) {
                    warn!(
                        event = %signature,
                        block_number = position.0,
                        log_index = position.1,
                        "log received out of order",
                    );
                }
                last_position = Some(position);
            }
        }

        trace!(
            event = %signature,
            block_number = ?log.block_number,
            log_index = ?log.log_index,
            removed = log.removed,
            "delivering log",
        );
        let status = match decoder.decode(log) {
            Ok(status) => status,
            Err(err) => {
                pin(err);
                break;
            }
        };

        tokio::select! {
            biased;
            _ = &mut cancelled => break,
            sent = sink.send(status) => {
                if sent.is_err() {
                    debug!(event = %signature, "subscription sink closed");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{DecodeLog, EventBuilder};
    use crate::errors::ErrorKind;
    use crate::test::prelude::*;
    use assetbind_common::abi::{Event as AbiEvent, EventParam, ParamType};
    use assetbind_common::{Address, H256, U256};
    use std::time::Duration;

    #[derive(Debug, PartialEq)]
    struct Uri {
        value: String,
        id: U256,
    }

    impl DecodeLog for Uri {
        fn decode_log(event: &AbiEvent, log: Log) -> Result<Self, ExecutionError> {
            let mut tokens = event.parse_log(&log.to_raw())?.into_iter();
            let value = tokens.next().and_then(|token| token.into_string());
            let id = tokens.next().and_then(|token| token.into_uint());
            match (value, id) {
                (Some(value), Some(id)) => Ok(Uri { value, id }),
                _ => Err(crate::tokens::Error::TypeMismatch.into()),
            }
        }
    }

    fn uri_event() -> AbiEvent {
        AbiEvent {
            name: "URI".to_owned(),
            inputs: vec![
                EventParam::new("value", ParamType::String, false),
                EventParam::new("id", ParamType::Uint(256), true),
            ],
            anonymous: false,
        }
    }

    fn uri_log(id: u64, block: Option<u64>, index: u64) -> Log {
        // abi.encode("x")
        let mut data = vec![0u8; 96];
        data[31] = 0x20;
        data[63] = 1;
        data[64] = b'x';
        let mut topic = [0u8; 32];
        U256::from(id).to_big_endian(&mut topic);
        Log {
            address: Address::repeat_byte(7),
            topics: vec![uri_event().signature(), H256(topic)],
            data,
            block_number: block,
            log_index: block.map(|_| index),
            ..Default::default()
        }
    }

    async fn watch(
        node: &TestNode,
        capacity: usize,
    ) -> (Subscription, mpsc::Receiver<EventStatus<Uri>>) {
        let (sink, receiver) = mpsc::channel(capacity);
        let subscription = EventBuilder::<Uri>::new(
            uri_event(),
            Address::repeat_byte(7),
            Some(Arc::new(node.clone())),
        )
        .watch(sink)
        .await
        .unwrap();
        (subscription, receiver)
    }

    #[tokio::test]
    async fn delivers_events_in_order() {
        let node = TestNode::new();
        let logs = node.add_subscription();
        let (mut subscription, mut receiver) = watch(&node, 1).await;

        for (id, block) in [(1, 10), (2, 10), (3, 11)] {
            logs.unbounded_send(Ok(uri_log(id, Some(block), id))).unwrap();
        }
        let mut retracted = uri_log(3, Some(11), 3);
        retracted.removed = true;
        logs.unbounded_send(Ok(retracted)).unwrap();

        let mut ids = Vec::new();
        for _ in 0..3 {
            let event = receiver.recv().await.unwrap().added().unwrap();
            ids.push(event.id.low_u64());
        }
        assert_eq!(ids, vec![1, 2, 3]);
        let removed = receiver.recv().await.unwrap();
        assert_eq!(removed.removed().unwrap().id, U256::from(3));

        drop(logs);
        subscription.closed().await;
        assert!(subscription.err().is_none());
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn out_of_order_logs_are_still_delivered() {
        let node = TestNode::new();
        let logs = node.add_subscription();
        let (_subscription, mut receiver) = watch(&node, 4).await;

        logs.unbounded_send(Ok(uri_log(1, Some(11), 0))).unwrap();
        logs.unbounded_send(Ok(uri_log(2, Some(10), 0))).unwrap();
        logs.unbounded_send(Ok(uri_log(3, None, 0))).unwrap();

        for id in [1, 2, 3] {
            let event = receiver.recv().await.unwrap().added().unwrap();
            assert_eq!(event.id, U256::from(id));
        }
    }

    #[tokio::test]
    async fn applies_back_pressure() {
        let node = TestNode::new();
        let logs = node.add_subscription();
        let (subscription, mut receiver) = watch(&node, 1).await;

        for id in 0..4 {
            logs.unbounded_send(Ok(uri_log(id, Some(1), id))).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!subscription.is_finished());

        for id in 0..4 {
            let event = receiver.recv().await.unwrap().into_inner();
            assert_eq!(event.id, U256::from(id));
        }
    }

    #[tokio::test]
    async fn pins_decode_errors() {
        let node = TestNode::new();
        let logs = node.add_subscription();
        let (mut subscription, mut receiver) = watch(&node, 4).await;

        let mut malformed = uri_log(1, Some(1), 0);
        malformed.data.truncate(10);
        logs.unbounded_send(Ok(malformed)).unwrap();
        logs.unbounded_send(Ok(uri_log(2, Some(1), 1))).unwrap();

        subscription.closed().await;
        assert!(receiver.recv().await.is_none());
        let err = subscription.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Subscription);
        assert_eq!(err.source_kind(), ErrorKind::Decode);
        assert_eq!(err.signature, "URI(string,uint256)");
    }

    #[tokio::test]
    async fn pins_transport_errors() {
        let node = TestNode::new();
        let logs = node.add_subscription();
        let (mut subscription, _receiver) = watch(&node, 4).await;

        logs.unbounded_send(Err(TransportError::Closed)).unwrap();
        subscription.closed().await;
        assert_eq!(subscription.err().unwrap().source_kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn closes_quietly_when_the_receiver_is_dropped() {
        let node = TestNode::new();
        let _logs = node.add_subscription();
        let (mut subscription, receiver) = watch(&node, 1).await;

        drop(receiver);
        subscription.closed().await;
        assert!(subscription.err().is_none());
    }

    #[tokio::test]
    async fn unsubscribe_is_final() {
        let node = TestNode::new();
        let logs = node.add_subscription();
        let (mut subscription, mut receiver) = watch(&node, 1).await;

        logs.unbounded_send(Ok(uri_log(1, Some(1), 0))).unwrap();
        logs.unbounded_send(Ok(uri_log(2, Some(1), 1))).unwrap();
        let first = receiver.recv().await.unwrap();
        assert_eq!(first.into_inner().id, U256::from(1));

        subscription.unsubscribe().await;
        subscription.unsubscribe().await;
        assert!(subscription.is_finished());
        assert_eq!(node.unsubscribed(), 1);

        logs.unbounded_send(Ok(uri_log(3, Some(2), 0))).ok();
        while let Some(status) = receiver.recv().await {
            // An event already handed to the channel before cancelling may
            // still be buffered, nothing after it.
            assert_eq!(status.into_inner().id, U256::from(2));
        }
    }

    #[tokio::test]
    async fn drop_tears_down() {
        let node = TestNode::new();
        let _logs = node.add_subscription();
        let (subscription, mut receiver) = watch(&node, 1).await;

        drop(subscription);
        assert!(receiver.recv().await.is_none());
        for _ in 0..10 {
            if node.unsubscribed() > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(node.unsubscribed(), 1);
    }

    #[tokio::test]
    async fn requires_filterer() {
        let (sink, _receiver) = mpsc::channel(1);
        let err = EventBuilder::<Uri>::new(uri_event(), Address::zero(), None)
            .watch(sink)
            .await
            .unwrap_err();
        assert_eq!(err.source_kind(), ErrorKind::Configuration);
    }
}
