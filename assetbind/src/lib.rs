#![deny(missing_docs, unsafe_code)]

//! Type-safe client bindings for tokenized asset contracts. The generated
//! types talk to a node through a small transport façade and a custom
//! [`Instance`](crate::contract::Instance) runtime that can also be used
//! directly without code generation.
//!
//! Every binding comes as three facets: a caller for read-only calls, a
//! transactor for submitting transactions and a filterer for querying and
//! watching events. A contract handle bundles all three.
//!
//! ```ignore
//! use assetbind::prelude::*;
//! use assetbind::transport::Web3Transport;
//! use std::sync::Arc;
//!
//! // this proc macro generates an `Equity` type with type-safe bindings to
//! // contract functions, events and errors
//! assetbind::contract!("abi/Equity.json");
//!
//! let web3 = Web3::new(web3::transports::Http::new("http://localhost:8545")?);
//! let transport = Arc::new(Web3Transport::new(web3));
//! let equity = Equity::at(transport, address);
//!
//! // view functions are called with a read-only call
//! let balance = equity.balance_of(holder, id).call().await?;
//!
//! // state changing functions submit a transaction and return its handle
//! let handle = equity
//!     .safe_transfer_from(holder, recipient, id, amount, Vec::new())
//!     .from(holder)
//!     .send()
//!     .await?;
//!
//! // events can be iterated or watched
//! let (sink, mut receiver) = assetbind::subscription::channel(16);
//! let subscription = equity
//!     .events()
//!     .watch_transfer_single(FilterOptions::default(), sink, vec![], vec![], vec![])
//!     .await?;
//! ```
//!
//! See the [`contract!`](crate::contract) proc macro documentation for more
//! information on usage and parameters.

#[cfg(test)]
#[allow(missing_docs)]
#[macro_use]
#[path = "test/macros.rs"]
mod test_macros;

pub mod blocking;
pub mod contract;
pub mod errors;
mod int;
pub mod subscription;
pub mod tokens;
pub mod transport;

pub use crate::contract::Instance;
pub use crate::prelude::*;
pub use assetbind_common as common;
pub use assetbind_common::hash::to_checksum as checksum;
#[cfg(feature = "derive")]
pub use assetbind_derive::contract;
pub use futures;
pub use jsonrpc_core as jsonrpc;
pub use serde_json as json;
pub use web3;

pub mod prelude {
    //! A prelude module for importing commonly used types when interacting with
    //! generated contracts.

    pub use crate::blocking::Wait;
    pub use crate::contract::{
        CallOptions, EventStatus, FilterOptions, IteratorState, Topic, TransactionOptions,
    };
    pub use crate::int::I256;
    pub use crate::subscription::{EventReceiver, EventSink, Subscription};
    pub use crate::transport::{BlockId, BlockNumber, Log, TransactionHandle, Transport};
    pub use assetbind_common::{Address, TransactionHash, H160, H256, U256};
    pub use web3::api::Web3;
    #[cfg(feature = "http")]
    pub use web3::transports::Http;
}

pub mod dyns {
    //! Type aliases to the runtime types used throughout the generated code.
    //! The builders hold their capabilities as trait objects.

    use crate::contract::{
        AllEventsBuilder, EventBuilder, Instance, MethodBuilder, ViewMethodBuilder,
    };

    /// Type alias for an `Instance` bound through trait objects.
    pub type DynInstance = Instance;

    /// Type alias for a `MethodBuilder` of a generated binding.
    pub type DynMethodBuilder<R> = MethodBuilder<R>;

    /// Type alias for a `ViewMethodBuilder` of a generated binding.
    pub type DynViewMethodBuilder<R> = ViewMethodBuilder<R>;

    /// Type alias for an `EventBuilder` of a generated binding.
    pub type DynEventBuilder<E> = EventBuilder<E>;

    /// Type alias for an `AllEventsBuilder` of a generated binding.
    pub type DynAllEventsBuilder<E> = AllEventsBuilder<E>;
}

#[doc(hidden)]
pub mod private {
    //! Private definitions that are needed by the generated contract code or
    //! but do not appear in public interfaces. No documentation is generated
    //! for these definitions.

    pub use lazy_static::lazy_static;
}
