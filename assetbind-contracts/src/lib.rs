//! Type-safe bindings to the tokenized asset contracts.
//!
//! Each contract gets a module with its calls, transactions, events, custom
//! errors and Solidity structs, and a contract handle re-exported at the
//! crate root:
//!
//! - [`Alternate`] for alternate assets,
//! - [`Equity`] for equities,
//! - [`StockAsset`] for stocks.
//!
//! ```ignore
//! use assetbind_contracts::Equity;
//!
//! let equity = Equity::at(transport, address);
//! let supply = equity.total_equities().call().await?;
//! ```

assetbind::contract!(pub "abi/Alternate.json");
assetbind::contract!(pub "abi/Equity.json");
assetbind::contract!(pub "abi/StockAsset.json");
