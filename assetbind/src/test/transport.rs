//! Scripted transports for testing purposes.
//!
//! `TestTransport` sits below `Web3Transport` at the JSON RPC level and is
//! largely based on the `rust-web3` `TestTransport`. `TestNode` implements
//! the contract transport façade directly, for testing bindings without
//! going through JSON RPC.

use crate::transport::{
    BlockId, CallOutcome, CallRequest, ContractCaller, ContractFilterer, ContractTransactor, Log,
    LogFilter, LogSubscription, TransactionHandle, TransactionRequest, TransportError,
};
use futures::channel::mpsc;
use futures::future::{self as futures_future, BoxFuture, FutureExt as _};
use futures::stream::{self, BoxStream, StreamExt as _};
use jsonrpc_core::{Call, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use web3::error::Error;
use web3::futures::future::{self, Ready};
use web3::helpers;
use web3::{RequestId, Transport};

/// Type alias for request method and value pairs
type Requests = Vec<(String, Vec<Value>)>;

#[derive(Debug, Default)]
struct Inner {
    asserted: usize,
    requests: Requests,
    responses: VecDeque<Result<Value, jsonrpc_core::Error>>,
}

/// Test transport
#[derive(Debug, Default, Clone)]
pub struct TestTransport {
    inner: Arc<Mutex<Inner>>,
}

impl Transport for TestTransport {
    type Out = Ready<Result<Value, Error>>;

    fn prepare(&self, method: &str, params: Vec<Value>) -> (RequestId, Call) {
        let request = helpers::build_request(1, method, params.clone());
        let mut inner = self.inner.lock().unwrap();
        inner.requests.push((method.into(), params));
        (inner.requests.len(), request)
    }

    fn send(&self, id: RequestId, request: Call) -> Self::Out {
        let response = self.inner.lock().unwrap().responses.pop_front();
        match response {
            Some(Ok(response)) => future::ok(response),
            Some(Err(err)) => future::err(Error::Rpc(err)),
            None => {
                println!("Unexpected request (id: {:?}): {:?}", id, request);
                future::err(Error::Unreachable)
            }
        }
    }
}

impl TestTransport {
    /// Create a new test transport instance.
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a response to an eventual request.
    pub fn add_response(&mut self, value: Value) {
        let mut inner = self.inner.lock().unwrap();
        inner.responses.push_back(Ok(value));
    }

    /// Add a JSON RPC error response to an eventual request.
    pub fn add_error(&mut self, err: jsonrpc_core::Error) {
        let mut inner = self.inner.lock().unwrap();
        inner.responses.push_back(Err(err));
    }

    /// Returns the next request that was not asserted yet.
    pub fn next_request(&mut self) -> (String, Vec<Value>) {
        let mut inner = self.inner.lock().unwrap();
        let idx = inner.asserted;
        inner.asserted += 1;
        inner.requests.get(idx).expect("Expected result.").clone()
    }

    /// Assert that a request was made.
    pub fn assert_request(&mut self, method: &str, params: &[Value]) {
        let (m, p) = self.next_request();
        assert_eq!(&m, method);
        assert_eq!(&p[..], params);
    }

    /// Assert that there are no more pending requests.
    pub fn assert_no_more_requests(&self) {
        let inner = self.inner.lock().unwrap();
        assert_eq!(
            inner.asserted,
            inner.requests.len(),
            "Expected no more requests, got: {:?}",
            &inner.requests[inner.asserted..]
        );
    }
}

#[derive(Debug, Default)]
struct NodeState {
    calls: Vec<(CallRequest, BlockId)>,
    call_outcomes: VecDeque<Result<CallOutcome, TransportError>>,
    transactions: Vec<TransactionRequest>,
    filters: Vec<LogFilter>,
    log_batches: VecDeque<Vec<Result<Log, TransportError>>>,
    subscriptions: VecDeque<LogSubscription>,
}

/// A scripted node implementing the transport façade.
#[derive(Clone, Debug, Default)]
pub struct TestNode {
    state: Arc<Mutex<NodeState>>,
    unsubscribed: Arc<AtomicUsize>,
}

impl TestNode {
    /// Creates a new scripted node.
    pub fn new() -> Self {
        Default::default()
    }

    /// Queues the outcome of the next call.
    pub fn add_call_outcome(&self, outcome: Result<CallOutcome, TransportError>) {
        self.state.lock().unwrap().call_outcomes.push_back(outcome);
    }

    /// Queues the logs returned by the next log query.
    pub fn add_logs(&self, logs: Vec<Result<Log, TransportError>>) {
        self.state.lock().unwrap().log_batches.push_back(logs);
    }

    /// Queues a live subscription, returning the sender that feeds it.
    pub fn add_subscription(&self) -> mpsc::UnboundedSender<Result<Log, TransportError>> {
        let (sender, receiver) = mpsc::unbounded();
        let unsubscribed = self.unsubscribed.clone();
        let subscription = LogSubscription {
            stream: receiver.boxed(),
            unsubscribe: Some(
                async move {
                    unsubscribed.fetch_add(1, Ordering::SeqCst);
                }
                .boxed(),
            ),
        };
        self.state.lock().unwrap().subscriptions.push_back(subscription);
        sender
    }

    /// The calls made so far.
    pub fn calls(&self) -> Vec<(CallRequest, BlockId)> {
        self.state.lock().unwrap().calls.clone()
    }

    /// The transactions submitted so far.
    pub fn transactions(&self) -> Vec<TransactionRequest> {
        self.state.lock().unwrap().transactions.clone()
    }

    /// The log filters queried or subscribed to so far.
    pub fn filters(&self) -> Vec<LogFilter> {
        self.state.lock().unwrap().filters.clone()
    }

    /// The number of subscriptions torn down on the node side.
    pub fn unsubscribed(&self) -> usize {
        self.unsubscribed.load(Ordering::SeqCst)
    }
}

impl ContractCaller for TestNode {
    fn call(
        &self,
        request: CallRequest,
        block: BlockId,
    ) -> BoxFuture<'static, Result<CallOutcome, TransportError>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((request, block));
        let outcome = state
            .call_outcomes
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("unexpected call".to_owned())));
        futures_future::ready(outcome).boxed()
    }
}

impl ContractTransactor for TestNode {
    fn submit(
        &self,
        request: TransactionRequest,
    ) -> BoxFuture<'static, Result<TransactionHandle, TransportError>> {
        let mut state = self.state.lock().unwrap();
        state.transactions.push(request);
        let hash = assetbind_common::H256::from_low_u64_be(state.transactions.len() as u64);
        futures_future::ready(Ok(TransactionHandle { hash })).boxed()
    }
}

impl ContractFilterer for TestNode {
    fn filter_logs(&self, filter: LogFilter) -> BoxStream<'static, Result<Log, TransportError>> {
        let mut state = self.state.lock().unwrap();
        state.filters.push(filter);
        let logs = state.log_batches.pop_front().unwrap_or_default();
        stream::iter(logs).boxed()
    }

    fn subscribe_logs(
        &self,
        filter: LogFilter,
    ) -> BoxFuture<'static, Result<LogSubscription, TransportError>> {
        let mut state = self.state.lock().unwrap();
        state.filters.push(filter);
        let subscription = state
            .subscriptions
            .pop_front()
            .ok_or_else(|| TransportError::Other("unexpected subscription".to_owned()));
        futures_future::ready(subscription).boxed()
    }
}
