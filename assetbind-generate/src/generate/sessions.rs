use crate::generate::methods::Method;
use proc_macro2::TokenStream;
use quote::quote;

/// Expands the session types, which curry call and transaction options into
/// every method.
pub(crate) fn expand(methods: &[Method]) -> TokenStream {
    let session_methods = methods.iter().map(expand_session_method);
    let caller_methods = methods
        .iter()
        .filter(|method| method.view)
        .map(expand_caller_method);
    let transactor_methods = methods
        .iter()
        .filter(|method| !method.view)
        .map(expand_transactor_method);

    quote! {
        /// Contract bindings with options applied to every call and
        /// transaction.
        #[derive(Clone, Debug)]
        pub struct Session {
            contract: Contract,
            /// Options for calls.
            pub call_options: assetbind::CallOptions,
            /// Options for transactions.
            pub transact_options: assetbind::TransactionOptions,
        }

        impl Session {
            /// The underlying contract handle.
            pub fn contract(&self) -> &Contract {
                &self.contract
            }

            #( #session_methods )*
        }

        /// Caller bindings that execute view functions with fixed call
        /// options.
        #[derive(Clone, Debug)]
        pub struct CallerSession {
            caller: Caller,
            /// Options for calls.
            pub call_options: assetbind::CallOptions,
        }

        impl CallerSession {
            #( #caller_methods )*
        }

        /// Transactor bindings that submit transactions with fixed options.
        #[derive(Clone, Debug)]
        pub struct TransactorSession {
            transactor: Transactor,
            /// Options for transactions.
            pub transact_options: assetbind::TransactionOptions,
        }

        impl TransactorSession {
            #( #transactor_methods )*
        }
    }
}

fn expand_session_method(method: &Method) -> TokenStream {
    let Method {
        name,
        doc,
        inputs,
        arguments,
        output,
        ..
    } = method;

    if method.view {
        quote! {
            #doc
            pub fn #name(&self, #inputs) -> assetbind::dyns::DynViewMethodBuilder<#output> {
                self.contract
                    .#name(#arguments)
                    .options(self.call_options.clone())
            }
        }
    } else {
        quote! {
            #doc
            pub fn #name(&self, #inputs) -> assetbind::dyns::DynMethodBuilder<#output> {
                self.contract
                    .#name(#arguments)
                    .options(self.transact_options.clone())
            }
        }
    }
}

fn expand_caller_method(method: &Method) -> TokenStream {
    let Method {
        name,
        doc,
        inputs,
        arguments,
        output,
        ..
    } = method;

    quote! {
        #doc
        pub async fn #name(&self, #inputs) -> Result<#output, assetbind::errors::MethodError> {
            self.caller
                .#name(#arguments)
                .options(self.call_options.clone())
                .call()
                .await
        }
    }
}

fn expand_transactor_method(method: &Method) -> TokenStream {
    let Method {
        name,
        doc,
        inputs,
        arguments,
        ..
    } = method;

    quote! {
        #doc
        pub async fn #name(
            &self,
            #inputs
        ) -> Result<assetbind::TransactionHandle, assetbind::errors::MethodError> {
            self.transactor
                .#name(#arguments)
                .options(self.transact_options.clone())
                .send()
                .await
        }
    }
}
