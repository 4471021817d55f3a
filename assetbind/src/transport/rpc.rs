//! Implementation of the transport façade on top of a `web3` JSON RPC
//! transport.

use crate::errors::revert_payload;
use crate::transport::{
    BlockId, CallOutcome, CallRequest, ContractCaller, ContractFilterer, ContractTransactor, Log,
    LogFilter, LogSubscription, TransactionHandle, TransactionRequest, TransportError,
};
use assetbind_common::abi::Topic;
use assetbind_common::{Address, H256};
use futures::future::{BoxFuture, FutureExt as _, TryFutureExt as _};
use futures::stream::{self, BoxStream, StreamExt as _, TryStreamExt as _};
use futures_timer::Delay;
use std::time::Duration;
use tracing::{debug, warn};
use web3::api::Web3;
use web3::error::Error as Web3Error;
use web3::types::{Bytes, Filter, FilterBuilder, Log as Web3Log};

/// The default interval between polls of a node log filter.
#[cfg(not(test))]
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(0);

/// A transport that speaks Ethereum JSON RPC through a `web3` transport.
///
/// Reverts of read-only calls are recognized in the error formats of Geth,
/// Hardhat, Nethermind and Ganache and reported as [`CallOutcome::Revert`].
/// Live log subscriptions are implemented by polling a node-side log filter.
#[derive(Clone, Debug)]
pub struct Web3Transport<T: web3::Transport> {
    web3: Web3<T>,
    poll_interval: Duration,
    default_from: Option<Address>,
}

impl<T: web3::Transport> Web3Transport<T> {
    /// Creates a transport from a `web3` instance.
    pub fn new(web3: Web3<T>) -> Self {
        Web3Transport {
            web3,
            poll_interval: DEFAULT_POLL_INTERVAL,
            default_from: None,
        }
    }

    /// Sets the interval between polls of log filters for subscriptions.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the sender used for transactions that do not specify one. The
    /// account must be unlocked on the node.
    pub fn with_default_from(mut self, from: Address) -> Self {
        self.default_from = Some(from);
        self
    }

    /// The underlying `web3` instance.
    pub fn web3(&self) -> &Web3<T> {
        &self.web3
    }
}

impl<T> ContractCaller for Web3Transport<T>
where
    T: web3::Transport + Send + Sync + 'static,
    T::Out: Send + 'static,
{
    fn call(
        &self,
        request: CallRequest,
        block: BlockId,
    ) -> BoxFuture<'static, Result<CallOutcome, TransportError>> {
        let eth = self.web3.eth();
        let request = web3::types::CallRequest {
            from: request.from,
            to: Some(request.to),
            data: Some(Bytes(request.data)),
            ..Default::default()
        };

        async move {
            match eth.call(request, Some(block)).await {
                Ok(bytes) => Ok(CallOutcome::Return(bytes.0)),
                Err(Web3Error::Rpc(err)) => match revert_payload(&err) {
                    Some(data) => Ok(CallOutcome::Revert(data)),
                    None => Err(TransportError::Rpc(err)),
                },
                Err(err) => Err(err.into()),
            }
        }
        .boxed()
    }
}

impl<T> ContractTransactor for Web3Transport<T>
where
    T: web3::Transport + Send + Sync + 'static,
    T::Out: Send + 'static,
{
    fn submit(
        &self,
        request: TransactionRequest,
    ) -> BoxFuture<'static, Result<TransactionHandle, TransportError>> {
        let eth = self.web3.eth();
        let from = request.from.or(self.default_from);

        async move {
            let from = from.ok_or(TransportError::MissingSender)?;
            let request = web3::types::TransactionRequest {
                from,
                to: Some(request.to),
                gas: request.gas,
                gas_price: request.gas_price,
                value: request.value,
                nonce: request.nonce,
                data: Some(Bytes(request.data)),
                ..Default::default()
            };
            let hash = eth.send_transaction(request).await?;
            Ok(TransactionHandle { hash })
        }
        .boxed()
    }
}

impl<T> ContractFilterer for Web3Transport<T>
where
    T: web3::Transport + Send + Sync + 'static,
    T::Out: Send + 'static,
{
    fn filter_logs(&self, filter: LogFilter) -> BoxStream<'static, Result<Log, TransportError>> {
        let eth = self.web3.eth();
        let filter = to_web3_filter(&filter);

        async move {
            let logs = eth.logs(filter).await?;
            Ok(stream::iter(logs.into_iter().map(|log| Ok(convert_log(log)))))
        }
        .try_flatten_stream()
        .boxed()
    }

    fn subscribe_logs(
        &self,
        filter: LogFilter,
    ) -> BoxFuture<'static, Result<LogSubscription, TransportError>> {
        let transport = self.web3.transport().clone();
        let poll_interval = self.poll_interval;
        let filter = to_web3_filter(&filter);

        async move {
            let id = transport
                .execute("eth_newFilter", vec![serde_json::to_value(&filter)?])
                .await?;
            debug!(filter_id = %id, "installed log filter");

            let polling = {
                let transport = transport.clone();
                let id = id.clone();
                stream::try_unfold((), move |()| {
                    let changes = transport.execute("eth_getFilterChanges", vec![id.clone()]);
                    async move {
                        Delay::new(poll_interval).await;
                        let logs: Vec<Web3Log> = serde_json::from_value(changes.await?)?;
                        let logs = stream::iter(logs.into_iter().map(|log| Ok(convert_log(log))));
                        Ok::<_, TransportError>(Some((logs, ())))
                    }
                })
                .try_flatten()
            };

            let unsubscribe = async move {
                match transport.execute("eth_uninstallFilter", vec![id.clone()]).await {
                    Ok(_) => debug!(filter_id = %id, "uninstalled log filter"),
                    Err(err) => warn!(filter_id = %id, %err, "failed to uninstall log filter"),
                }
            };

            Ok(LogSubscription {
                stream: polling.boxed(),
                unsubscribe: Some(unsubscribe.boxed()),
            })
        }
        .boxed()
    }
}

fn to_web3_filter(filter: &LogFilter) -> Filter {
    let topics = filter.topics.slots().map(|topic| match topic {
        Topic::Any => None,
        Topic::OneOf(values) => Some(values.clone()),
        Topic::This(value) => Some(vec![*value]),
    });
    let [topic0, topic1, topic2, topic3]: [Option<Vec<H256>>; 4] = topics;

    let mut builder = FilterBuilder::default()
        .address(vec![filter.address])
        .topics(topic0, topic1, topic2, topic3);
    if let Some(from_block) = filter.from_block {
        builder = builder.from_block(from_block);
    }
    if let Some(to_block) = filter.to_block {
        builder = builder.to_block(to_block);
    }
    if let Some(limit) = filter.limit {
        builder = builder.limit(limit);
    }
    builder.build()
}

fn convert_log(log: Web3Log) -> Log {
    Log {
        address: log.address,
        topics: log.topics,
        data: log.data.0,
        block_hash: log.block_hash,
        block_number: log.block_number.map(|number| number.as_u64()),
        transaction_hash: log.transaction_hash,
        transaction_index: log.transaction_index.map(|index| index.as_u64()),
        log_index: log.log_index.map(|index| index.low_u64()),
        removed: log.removed.unwrap_or(false),
    }
}
