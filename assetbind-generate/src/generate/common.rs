use crate::generate::Context;
use crate::util;
use proc_macro2::{Literal, TokenStream};
use quote::quote;

/// Expands the embedded ABI, the contract handle and its three facets.
pub(crate) fn expand(cx: &Context) -> TokenStream {
    let contract_name = &cx.contract_name;
    let name = Literal::string(&contract_name.to_string());
    let abi_json = Literal::string(&cx.contract.abi_json);

    let doc = util::expand_doc(&format!(
        "Type-safe bindings to the `{}` contract. The handle is bound with a \
         caller, a transactor and a filterer; see [`Caller`], [`Transactor`] \
         and [`Filterer`] for handles with a single capability.",
        contract_name,
    ));

    quote! {
        /// The contract ABI as JSON.
        pub const ABI: &str = #abi_json;

        /// Returns the contract embedded in the bindings.
        pub fn raw_contract() -> &'static assetbind::common::Contract {
            assetbind::private::lazy_static! {
                static ref CONTRACT: assetbind::common::Contract =
                    assetbind::common::ArtifactLoader::new()
                        .name(#name)
                        .load_contract_from_str(ABI)
                        .expect("valid contract ABI");
            }
            &CONTRACT
        }

        /// Returns the parsed contract ABI.
        pub fn abi() -> std::sync::Arc<assetbind::common::Abi> {
            raw_contract().abi.clone()
        }

        #doc
        #[derive(Clone)]
        pub struct Contract {
            instance: assetbind::dyns::DynInstance,
        }

        impl Contract {
            /// Returns the contract embedded in the bindings.
            pub fn raw_contract() -> &'static assetbind::common::Contract {
                raw_contract()
            }

            /// Creates a new contract handle at `address` that uses the
            /// transport for calls, transactions and logs.
            ///
            /// Note that this does not verify that a contract with a matching
            /// ABI is actually deployed at the given address.
            pub fn at<T>(transport: std::sync::Arc<T>, address: assetbind::Address) -> Self
            where
                T: assetbind::Transport + 'static,
            {
                Contract::with_instance(assetbind::Instance::at(transport, abi(), address))
            }

            /// Creates a new contract handle from a raw instance.
            pub fn with_instance(instance: assetbind::dyns::DynInstance) -> Self {
                Contract { instance }
            }

            /// Creates a caller bound to `address`.
            pub fn caller_at(
                caller: std::sync::Arc<dyn assetbind::transport::ContractCaller>,
                address: assetbind::Address,
            ) -> Caller {
                Caller {
                    instance: assetbind::Instance::new(abi(), address).with_caller(caller),
                }
            }

            /// Creates a transactor bound to `address`.
            pub fn transactor_at(
                transactor: std::sync::Arc<dyn assetbind::transport::ContractTransactor>,
                address: assetbind::Address,
            ) -> Transactor {
                Transactor {
                    instance: assetbind::Instance::new(abi(), address)
                        .with_transactor(transactor),
                }
            }

            /// Creates a filterer bound to `address`.
            pub fn filterer_at(
                filterer: std::sync::Arc<dyn assetbind::transport::ContractFilterer>,
                address: assetbind::Address,
            ) -> Filterer {
                Filterer {
                    instance: assetbind::Instance::new(abi(), address).with_filterer(filterer),
                }
            }

            /// Returns the contract address.
            pub fn address(&self) -> assetbind::Address {
                self.instance.address()
            }

            /// Returns a reference to the raw runtime instance used by this
            /// contract.
            pub fn raw_instance(&self) -> &assetbind::dyns::DynInstance {
                &self.instance
            }

            /// Returns the method defaults applied to every method.
            pub fn defaults(&self) -> &assetbind::contract::MethodDefaults {
                &self.instance.defaults
            }

            /// Returns mutable access to the method defaults.
            pub fn defaults_mut(&mut self) -> &mut assetbind::contract::MethodDefaults {
                self.instance.defaults_mut()
            }

            /// Returns the read-only facet of this contract.
            pub fn as_caller(&self) -> Caller {
                Caller {
                    instance: self.instance.only(assetbind::errors::Capability::Caller),
                }
            }

            /// Returns the transaction facet of this contract.
            pub fn as_transactor(&self) -> Transactor {
                Transactor {
                    instance: self.instance.only(assetbind::errors::Capability::Transactor),
                }
            }

            /// Returns the event facet of this contract.
            pub fn as_filterer(&self) -> Filterer {
                Filterer {
                    instance: self.instance.only(assetbind::errors::Capability::Filterer),
                }
            }

            /// Returns the event facet of this contract.
            pub fn events(&self) -> Filterer {
                self.as_filterer()
            }

            /// Returns a session that applies the options to every call and
            /// transaction.
            pub fn session(
                &self,
                call_options: assetbind::CallOptions,
                transact_options: assetbind::TransactionOptions,
            ) -> Session {
                Session {
                    contract: self.clone(),
                    call_options,
                    transact_options,
                }
            }

            /// Returns a builder for a plain value transfer to the contract.
            pub fn raw_transfer(&self) -> assetbind::dyns::DynMethodBuilder<()> {
                assetbind::contract::MethodBuilder::transfer(
                    self.instance.address(),
                    self.instance.transactor().cloned(),
                )
                .with_defaults(&self.instance.defaults)
            }
        }

        impl std::fmt::Debug for Contract {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.debug_tuple(#name)
                    .field(&self.address())
                    .finish()
            }
        }

        /// Read-only bindings holding only a caller.
        #[derive(Clone, Debug)]
        pub struct Caller {
            instance: assetbind::dyns::DynInstance,
        }

        impl Caller {
            /// Returns the contract address.
            pub fn address(&self) -> assetbind::Address {
                self.instance.address()
            }

            /// Returns the raw runtime instance.
            pub fn raw_instance(&self) -> &assetbind::dyns::DynInstance {
                &self.instance
            }

            /// Returns a session that calls with the given options.
            pub fn session(&self, call_options: assetbind::CallOptions) -> CallerSession {
                CallerSession {
                    caller: self.clone(),
                    call_options,
                }
            }
        }

        /// Transaction bindings holding only a transactor.
        #[derive(Clone, Debug)]
        pub struct Transactor {
            instance: assetbind::dyns::DynInstance,
        }

        impl Transactor {
            /// Returns the contract address.
            pub fn address(&self) -> assetbind::Address {
                self.instance.address()
            }

            /// Returns the raw runtime instance.
            pub fn raw_instance(&self) -> &assetbind::dyns::DynInstance {
                &self.instance
            }

            /// Returns a session that transacts with the given options.
            pub fn session(
                &self,
                transact_options: assetbind::TransactionOptions,
            ) -> TransactorSession {
                TransactorSession {
                    transactor: self.clone(),
                    transact_options,
                }
            }

            /// Sends a plain value transfer with empty call data.
            pub async fn raw_transfer(
                &self,
                options: assetbind::TransactionOptions,
            ) -> Result<assetbind::TransactionHandle, assetbind::errors::MethodError> {
                self.instance.raw_transfer(options).await
            }
        }

        /// Event bindings holding only a filterer.
        #[derive(Clone, Debug)]
        pub struct Filterer {
            instance: assetbind::dyns::DynInstance,
        }

        impl Filterer {
            /// Returns the contract address.
            pub fn address(&self) -> assetbind::Address {
                self.instance.address()
            }

            /// Returns the raw runtime instance.
            pub fn raw_instance(&self) -> &assetbind::dyns::DynInstance {
                &self.instance
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tests::context;

    #[test]
    fn embeds_the_abi() {
        let cx = context(r#"[{ "type": "receive", "stateMutability": "payable" }]"#);
        let abi_json = Literal::string(&cx.contract.abi_json);
        let expected = quote! { pub const ABI: &str = #abi_json; };
        assert!(expand(&cx).to_string().contains(&expected.to_string()));
    }
}
