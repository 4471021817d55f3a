use crate::generate::{types, Context};
use crate::util;
use anyhow::{anyhow, Context as _, Result};
use assetbind_common::abi::{Event, EventParam};
use proc_macro2::{Ident, Literal, TokenStream};
use quote::quote;
use std::collections::HashSet;

/// Expands the filterer methods and the `events` module with one struct per
/// event and the `Event` enum over all of them.
pub(crate) fn expand(cx: &Context) -> Result<TokenStream> {
    let events = cx.contract.abi.events();

    let mut names = HashSet::new();
    for event in events {
        if !names.insert(&event.name) {
            return Err(anyhow!(
                "overloaded event {} is not supported",
                event.abi_signature()
            ));
        }
    }

    let structs = events
        .iter()
        .enumerate()
        .map(|(index, event)| {
            expand_data_struct(cx, index, event)
                .with_context(|| format!("error expanding event {}", event.abi_signature()))
        })
        .collect::<Result<Vec<_>>>()?;

    // Anonymous events have no topic to select them by.
    let named = events
        .iter()
        .filter(|event| !event.anonymous)
        .collect::<Vec<_>>();
    let filters = named
        .iter()
        .map(|event| expand_filter(cx, event))
        .collect::<Result<Vec<_>>>()?;
    let event_enum = expand_event_enum(cx, &named);

    Ok(quote! {
        impl Filterer {
            #( #filters )*

            /// Returns a log builder for all events of the contract.
            pub fn all_events(&self) -> assetbind::dyns::DynAllEventsBuilder<events::Event> {
                self.instance.all_events()
            }
        }

        /// Module containing the generated event structs.
        pub mod events {
            #[allow(unused_imports)]
            use super::*;

            #( #structs )*

            #event_enum
        }
    })
}

/// The Rust field names of an event, with `raw` kept free for the log.
fn field_names(event: &Event) -> Vec<Ident> {
    util::param_names(event.inputs.iter().map(|input| match input.name() {
        "raw" => "raw_",
        name => name,
    }))
}

/// Indexed reference types are only available as the hash of their value.
fn expand_field_type(cx: &Context, input: &EventParam) -> Result<TokenStream> {
    if input.indexed && !input.kind().is_value_type() {
        Ok(quote! { assetbind::H256 })
    } else {
        types::expand_param(cx, &input.param)
    }
}

fn expand_data_struct(cx: &Context, index: usize, event: &Event) -> Result<TokenStream> {
    let name = util::type_ident(&event.name);
    let derives = &cx.event_derives;
    let doc = util::expand_doc(&format!("Solidity: `{}`", solidity_declaration(event)));

    let fields = field_names(event);
    let types = event
        .inputs
        .iter()
        .map(|input| expand_field_type(cx, input))
        .collect::<Result<Vec<_>>>()?;
    let count = Literal::usize_unsuffixed(fields.len());
    let index = Literal::usize_unsuffixed(index);
    let signature = util::expand_bytes(event.signature().as_bytes());
    let abi_signature = Literal::string(&event.abi_signature());

    Ok(quote! {
        #doc
        #[derive(Clone, Debug, Eq, PartialEq, #( #derives ),*)]
        pub struct #name {
            #( pub #fields: #types, )*
            /// The log the event was decoded from.
            pub raw: assetbind::Log,
        }

        impl #name {
            /// The event topic 0, the hash of its ABI signature.
            pub fn signature() -> assetbind::H256 {
                assetbind::H256(#signature)
            }

            /// The canonical ABI signature of the event.
            pub fn abi_signature() -> &'static str {
                #abi_signature
            }

            /// Decodes a log of this event.
            pub fn parse(
                log: assetbind::Log,
            ) -> Result<Self, assetbind::errors::ExecutionError> {
                let abi = super::abi();
                let event = abi.events().get(#index).ok_or_else(|| {
                    assetbind::errors::ExecutionError::UnknownEvent(
                        Self::abi_signature().to_owned(),
                    )
                })?;
                <Self as assetbind::contract::DecodeLog>::decode_log(event, log)
            }
        }

        impl assetbind::contract::DecodeLog for #name {
            fn decode_log(
                event: &assetbind::common::abi::Event,
                log: assetbind::Log,
            ) -> Result<Self, assetbind::errors::ExecutionError> {
                let tokens = event.parse_log(&log.to_raw())?;
                let raw = log;
                let [#( #fields ),*] = assetbind::tokens::into_tuple::<#count>(
                    assetbind::common::abi::Token::Tuple(tokens),
                )?;
                Ok(#name {
                    #( #fields: assetbind::tokens::Tokenize::from_token(#fields)?, )*
                    raw,
                })
            }
        }
    })
}

fn expand_filter(cx: &Context, event: &Event) -> Result<TokenStream> {
    let name = util::type_ident(&event.name);
    let method = util::snake_ident(&event.name, 0);
    let filter = util::ident(&format!("filter_{}", method));
    let watch = util::ident(&format!("watch_{}", method));
    let parse = util::ident(&format!("parse_{}", method));

    let fields = field_names(event);
    let (indexed, indexed_types): (Vec<_>, Vec<_>) = event
        .inputs
        .iter()
        .zip(&fields)
        .filter(|(input, _)| input.indexed)
        .map(|(input, field)| Ok((field.clone(), types::expand_param(cx, &input.param)?)))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .unzip();
    let topics = indexed
        .iter()
        .zip(&indexed_types)
        .enumerate()
        .map(|(i, (field, ty))| {
            let topic = util::ident(&format!("topic{}", i));
            quote! { .#topic(assetbind::Topic::<#ty>::from(#field)) }
        })
        .collect::<Vec<_>>();

    let builder_doc = util::expand_doc(&format!(
        "Returns an event builder for `{}` events.",
        event.abi_signature(),
    ));
    let filter_doc = util::expand_doc(&format!(
        "Iterates over past `{}` events. Each indexed parameter takes a set of \
         accepted values; an empty set accepts any value.",
        event.name,
    ));
    let watch_doc = util::expand_doc(&format!(
        "Subscribes to `{}` events, delivering them into `sink`.",
        event.name,
    ));
    let parse_doc = util::expand_doc(&format!("Decodes a `{}` log.", event.name));

    Ok(quote! {
        #builder_doc
        pub fn #method(&self) -> assetbind::dyns::DynEventBuilder<events::#name> {
            self.instance
                .event(events::#name::signature())
                .expect("generated event")
        }

        #filter_doc
        pub fn #filter(
            &self,
            options: assetbind::FilterOptions,
            #( #indexed: Vec<#indexed_types>, )*
        ) -> Result<assetbind::contract::EventIterator<events::#name>, assetbind::errors::EventError> {
            self.#method()
                .options(options)
                #( #topics )*
                .iter()
        }

        #watch_doc
        pub async fn #watch(
            &self,
            options: assetbind::FilterOptions,
            sink: assetbind::EventSink<events::#name>,
            #( #indexed: Vec<#indexed_types>, )*
        ) -> Result<assetbind::Subscription, assetbind::errors::EventError> {
            self.#method()
                .options(options)
                #( #topics )*
                .watch(sink)
                .await
        }

        #parse_doc
        pub fn #parse(
            &self,
            log: assetbind::Log,
        ) -> Result<events::#name, assetbind::errors::EventError> {
            events::#name::parse(log).map_err(|err| {
                assetbind::errors::EventError::from_parts(
                    events::#name::abi_signature().to_owned(),
                    err,
                )
            })
        }
    })
}

fn expand_event_enum(cx: &Context, events: &[&Event]) -> TokenStream {
    let derives = &cx.event_derives;
    let variants = events
        .iter()
        .map(|event| util::type_ident(&event.name))
        .collect::<Vec<_>>();

    quote! {
        /// A contract event.
        #[derive(Clone, Debug, Eq, PartialEq, #( #derives ),*)]
        pub enum Event {
            #( #variants(#variants), )*
        }

        impl Event {
            /// Decodes any log of the contract, dispatching on its topic 0.
            pub fn parse(
                log: assetbind::Log,
            ) -> Result<Self, assetbind::errors::ExecutionError> {
                let topic = log.topics.first().copied();
                match topic {
                    #(
                        Some(topic) if topic == #variants::signature() => {
                            #variants::parse(log).map(Event::#variants)
                        }
                    )*
                    topic => Err(assetbind::errors::ExecutionError::UnknownEvent(
                        topic.map(|topic| format!("{:?}", topic)).unwrap_or_default(),
                    )),
                }
            }
        }

        impl assetbind::contract::ParseLog for Event {
            fn parse_log(
                log: assetbind::Log,
            ) -> Result<Self, assetbind::errors::ExecutionError> {
                Event::parse(log)
            }
        }
    }
}

/// The event declaration as it reads in Solidity source.
fn solidity_declaration(event: &Event) -> String {
    let inputs = event
        .inputs
        .iter()
        .map(|input| {
            let kind = types::solidity_type(&input.param);
            let indexed = if input.indexed { " indexed" } else { "" };
            if input.name().is_empty() {
                format!("{}{}", kind, indexed)
            } else {
                format!("{}{} {}", kind, indexed, input.name())
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    let anonymous = if event.anonymous { " anonymous" } else { "" };
    format!("event {}({}){}", event.name, inputs, anonymous)
}
