//! Module implements type-safe event queries, iterators and subscriptions
//! from an ABI event definition with detokenization of the data included in
//! the log.

mod data;

pub(crate) use self::data::LogDecoder;
pub use self::data::{DecodeLog, EventStatus, ParseLog};
use crate::errors::{Capability, EventError, ExecutionError};
use crate::subscription::Subscription;
use crate::tokens::Tokenize;
use crate::transport::{BlockNumber, ContractFilterer, Log, LogFilter, TransportError};
pub use assetbind_common::abi::Topic;
use assetbind_common::abi::{Event as AbiEvent, Token, TopicFilter};
use assetbind_common::{Address, H256};
use futures::future::{self, TryFutureExt as _};
use futures::stream::{BoxStream, Stream, StreamExt as _};
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

/// Block range and size options for filtering logs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterOptions {
    /// The first block to include. Defaults to the latest block.
    pub from_block: Option<BlockNumber>,
    /// The last block to include. Defaults to the latest block.
    pub to_block: Option<BlockNumber>,
    /// Limit on the number of logs. This parameter is non-standard.
    pub limit: Option<usize>,
}

impl FilterOptions {
    fn into_filter(self, address: Address, topics: TopicFilter) -> LogFilter {
        LogFilter {
            address,
            topics,
            from_block: self.from_block,
            to_block: self.to_block,
            limit: self.limit,
        }
    }
}

/// A builder for creating a filtered query, iterator or subscription of
/// contract events that are decoded into `E`.
#[derive(Debug)]
#[must_use = "event builders do nothing unless you query or watch them"]
pub struct EventBuilder<E: DecodeLog> {
    /// The event ABI data for encoding topic filters and decoding logs.
    event: AbiEvent,
    address: Address,
    filterer: Option<Arc<dyn ContractFilterer>>,
    /// The block range and limit of the filter.
    pub options: FilterOptions,
    /// Filters on the indexed parameters, in declaration order.
    pub topics: Vec<Topic<Token>>,
    _event: PhantomData<fn() -> E>,
}

impl<E: DecodeLog> EventBuilder<E> {
    /// Creates a new event builder from a filterer and a contract event and
    /// address.
    pub fn new(
        event: AbiEvent,
        address: Address,
        filterer: Option<Arc<dyn ContractFilterer>>,
    ) -> Self {
        EventBuilder {
            event,
            address,
            filterer,
            options: FilterOptions::default(),
            topics: Vec::new(),
            _event: PhantomData,
        }
    }

    /// Replaces the block range and limit of the filter.
    pub fn options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the starting block from which to filter logs.
    ///
    /// If left unset defaults to the latest block.
    #[allow(clippy::wrong_self_convention)]
    pub fn from_block(mut self, block: BlockNumber) -> Self {
        self.options.from_block = Some(block);
        self
    }

    /// Sets the last block from which to filter logs.
    #[allow(clippy::wrong_self_convention)]
    pub fn to_block(mut self, block: BlockNumber) -> Self {
        self.options.to_block = Some(block);
        self
    }

    /// Limit the number of events that can be retrieved by this filter.
    ///
    /// Note that this parameter is non-standard.
    pub fn limit(mut self, value: usize) -> Self {
        self.options.limit = Some(value);
        self
    }

    /// Adds a filter for the first indexed parameter.
    ///
    /// This corresponds to the first indexed property, which for anonymous
    /// events corresponds to `topic[0]` in the log, and for named events is
    /// actually `topic[1]`.
    pub fn topic0<P: Tokenize>(self, topic: Topic<P>) -> Self {
        self.topic(0, topic)
    }

    /// Adds a filter for the second indexed parameter.
    pub fn topic1<P: Tokenize>(self, topic: Topic<P>) -> Self {
        self.topic(1, topic)
    }

    /// Adds a filter for the third indexed parameter.
    pub fn topic2<P: Tokenize>(self, topic: Topic<P>) -> Self {
        self.topic(2, topic)
    }

    /// Adds a filter for the fourth indexed parameter. Only anonymous events
    /// have one.
    pub fn topic3<P: Tokenize>(self, topic: Topic<P>) -> Self {
        self.topic(3, topic)
    }

    fn topic<P: Tokenize>(mut self, index: usize, topic: Topic<P>) -> Self {
        if self.topics.len() <= index {
            self.topics.resize_with(index + 1, Topic::default);
        }
        self.topics[index] = topic.map(P::into_token);
        self
    }

    /// Returns the ABI event, the filterer and the log filter for the current
    /// builder.
    pub fn into_inner(
        self,
    ) -> Result<(AbiEvent, Arc<dyn ContractFilterer>, LogFilter), EventError> {
        let EventBuilder {
            event,
            address,
            filterer,
            options,
            topics,
            ..
        } = self;

        let filterer = match filterer {
            Some(filterer) => filterer,
            None => {
                return Err(EventError::new(
                    &event,
                    ExecutionError::MissingCapability(Capability::Filterer),
                ))
            }
        };
        let topics = event
            .topic_filter(topics)
            .map_err(|err| EventError::new(&event, err))?;

        Ok((event, filterer, options.into_filter(address, topics)))
    }

    /// Returns a pull iterator over the existing logs matching the builder
    /// parameters.
    pub fn iter(self) -> Result<EventIterator<E>, EventError> {
        let (event, filterer, filter) = self.into_inner()?;
        debug!(
            event = %event.name,
            address = ?filter.address,
            from_block = ?filter.from_block,
            to_block = ?filter.to_block,
            "filtering logs",
        );
        let stream = filterer.filter_logs(filter);
        Ok(EventIterator::new(LogDecoder::for_event(event), stream))
    }

    /// Returns a future that resolves with a collection of all existing
    /// events matching the builder parameters.
    pub async fn query(self) -> Result<Vec<E>, EventError> {
        let mut events = self.iter()?;
        let mut result = Vec::new();
        while let Some(event) = events.next().await {
            result.push(event);
        }
        match events.take_error() {
            Some(err) => Err(err),
            None => Ok(result),
        }
    }

    /// Subscribes to new events, delivering them into a bounded sink.
    ///
    /// Must be called from within a Tokio runtime, the subscription runs on
    /// its own task.
    pub async fn watch(
        self,
        sink: mpsc::Sender<EventStatus<E>>,
    ) -> Result<Subscription, EventError>
    where
        E: Send + 'static,
    {
        let (event, filterer, filter) = self.into_inner()?;
        debug!(event = %event.name, address = ?filter.address, "subscribing to logs");
        let logs = filterer
            .subscribe_logs(filter)
            .await
            .map_err(|err| EventError::new(&event, err))?;
        Ok(Subscription::spawn(LogDecoder::for_event(event), logs, sink))
    }

    /// Creates an event stream from the current event builder that emits new
    /// events as they are received, without a separate task.
    pub fn stream(self) -> impl Stream<Item = Result<EventStatus<E>, EventError>> {
        future::ready(self.into_inner())
            .and_then(|(event, filterer, filter)| async move {
                let logs = filterer
                    .subscribe_logs(filter)
                    .await
                    .map_err(|err| EventError::new(&event, err))?;
                let decoder = LogDecoder::<E>::for_event(event);
                Ok(logs.stream.map(move |log| decode(&decoder, log)))
            })
            .try_flatten_stream()
    }
}

/// A builder for querying any event of a contract, decoded into a type that
/// dispatches on the log topics.
#[derive(Debug)]
#[must_use = "event builders do nothing unless you query them"]
pub struct AllEventsBuilder<E: ParseLog> {
    address: Address,
    filterer: Option<Arc<dyn ContractFilterer>>,
    /// The block range and limit of the filter.
    pub options: FilterOptions,
    /// Raw filters on the topic slots.
    pub topics: TopicFilter,
    _events: PhantomData<fn() -> E>,
}

impl<E: ParseLog> AllEventsBuilder<E> {
    /// Creates a new all events builder from a filterer and an address.
    pub fn new(address: Address, filterer: Option<Arc<dyn ContractFilterer>>) -> Self {
        AllEventsBuilder {
            address,
            filterer,
            options: FilterOptions::default(),
            topics: TopicFilter::default(),
            _events: PhantomData,
        }
    }

    /// Replaces the block range and limit of the filter.
    pub fn options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds a filter for the first topic.
    ///
    /// For regular events, this corresponds to the event signature. For
    /// anonymous events, this is the first indexed property.
    pub fn topic0(mut self, topic: Topic<H256>) -> Self {
        self.topics.topic0 = topic;
        self
    }

    fn into_inner(self) -> Result<(Arc<dyn ContractFilterer>, LogFilter), EventError> {
        let filterer = self.filterer.ok_or_else(|| {
            EventError::from_parts(
                "*".to_owned(),
                ExecutionError::MissingCapability(Capability::Filterer),
            )
        })?;
        Ok((filterer, self.options.into_filter(self.address, self.topics)))
    }

    /// Returns a pull iterator over the existing logs of the contract.
    pub fn iter(self) -> Result<EventIterator<E>, EventError> {
        let (filterer, filter) = self.into_inner()?;
        debug!(address = ?filter.address, "filtering all contract logs");
        let stream = filterer.filter_logs(filter);
        Ok(EventIterator::new(LogDecoder::for_contract(), stream))
    }

    /// Collects all existing logs of the contract.
    pub async fn query(self) -> Result<Vec<E>, EventError> {
        let mut events = self.iter()?;
        let mut result = Vec::new();
        while let Some(event) = events.next().await {
            result.push(event);
        }
        match events.take_error() {
            Some(err) => Err(err),
            None => Ok(result),
        }
    }

    /// Subscribes to new logs of the contract, delivering them into a
    /// bounded sink.
    pub async fn watch(
        self,
        sink: mpsc::Sender<EventStatus<E>>,
    ) -> Result<Subscription, EventError>
    where
        E: Send + 'static,
    {
        let (filterer, filter) = self.into_inner()?;
        debug!(address = ?filter.address, "subscribing to all contract logs");
        let logs = filterer
            .subscribe_logs(filter)
            .await
            .map_err(|err| EventError::from_parts("*".to_owned(), err.into()))?;
        Ok(Subscription::spawn(LogDecoder::for_contract(), logs, sink))
    }
}

fn decode<E>(
    decoder: &LogDecoder<E>,
    log: Result<Log, TransportError>,
) -> Result<EventStatus<E>, EventError> {
    log.map_err(ExecutionError::from)
        .and_then(|log| decoder.decode(log))
        .map_err(|err| EventError::from_parts(decoder.signature().to_owned(), err))
}

/// The state of an [`EventIterator`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IteratorState {
    /// Events may still be produced.
    Active,
    /// A log could not be fetched or decoded. The error is pinned.
    Failed,
    /// All matching logs were produced.
    Drained,
    /// The iterator was closed.
    Closed,
}

/// A pull iterator over decoded events.
///
/// The iterator moves from `Active` to either `Failed` or `Drained` and is
/// `Closed` explicitly. Once it left `Active` it never produces another
/// event. The error that failed the iterator stays available through
/// [`EventIterator::error`], also after closing.
#[must_use = "iterators do nothing unless polled"]
pub struct EventIterator<E> {
    decoder: LogDecoder<E>,
    logs: Option<BoxStream<'static, Result<Log, TransportError>>>,
    state: IteratorState,
    error: Option<EventError>,
}

impl<E> EventIterator<E> {
    pub(crate) fn new(
        decoder: LogDecoder<E>,
        logs: BoxStream<'static, Result<Log, TransportError>>,
    ) -> Self {
        EventIterator {
            decoder,
            logs: Some(logs),
            state: IteratorState::Active,
            error: None,
        }
    }

    /// Returns the next added event, or `None` once the iterator left the
    /// `Active` state. Retracted logs are skipped; use the `Stream`
    /// implementation to observe them.
    pub async fn next(&mut self) -> Option<E> {
        loop {
            let status = future::poll_fn(|cx| self.poll_status(cx)).await?;
            match status {
                EventStatus::Added(event) => return Some(event),
                EventStatus::Removed(_) => debug!(
                    event = %self.decoder.signature(),
                    "skipping retracted log"
                ),
            }
        }
    }

    /// Blocks the current thread on the next added event.
    pub fn blocking_next(&mut self) -> Option<E> {
        futures::executor::block_on(self.next())
    }

    /// The error that failed the iterator, if any.
    pub fn error(&self) -> Option<&EventError> {
        self.error.as_ref()
    }

    /// Takes the error that failed the iterator, if any.
    pub fn take_error(&mut self) -> Option<EventError> {
        self.error.take()
    }

    /// The current state of the iterator.
    pub fn state(&self) -> IteratorState {
        self.state
    }

    /// Closes the iterator, dropping the underlying log stream and with it
    /// any in-flight fetch. Closing more than once has no effect.
    pub fn close(&mut self) {
        if self.state != IteratorState::Closed {
            debug!(event = %self.decoder.signature(), "closing event iterator");
            self.logs = None;
            self.state = IteratorState::Closed;
        }
    }

    fn poll_status(&mut self, cx: &mut Context) -> Poll<Option<EventStatus<E>>> {
        if self.state != IteratorState::Active {
            return Poll::Ready(None);
        }
        let logs = match self.logs.as_mut() {
            Some(logs) => logs,
            None => return Poll::Ready(None),
        };

        let log = match logs.poll_next_unpin(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Some(log)) => log,
            Poll::Ready(None) => {
                self.finish(IteratorState::Drained);
                return Poll::Ready(None);
            }
        };

        match decode(&self.decoder, log) {
            Ok(status) => Poll::Ready(Some(status)),
            Err(err) => {
                self.error = Some(err);
                self.finish(IteratorState::Failed);
                Poll::Ready(None)
            }
        }
    }

    fn finish(&mut self, state: IteratorState) {
        self.logs = None;
        self.state = state;
    }
}

/// Streaming hands a failure to the consumer as the final item instead of
/// pinning it on the iterator.
impl<E> Stream for EventIterator<E> {
    type Item = Result<EventStatus<E>, EventError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.poll_status(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(status)) => Poll::Ready(Some(Ok(status))),
            Poll::Ready(None) => Poll::Ready(this.error.take().map(Err)),
        }
    }
}

impl<E> std::fmt::Debug for EventIterator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("EventIterator")
            .field("decoder", &self.decoder)
            .field("state", &self.state)
            .field("error", &self.error)
            .finish()
    }
}
