//! The in-memory model of a contract interface and the codec for its values.
//!
//! An [`Abi`] is built once from its JSON description and is immutable
//! afterwards, so it can be shared freely between threads.

mod decode;
mod encode;
mod entries;
mod json;
mod param;
mod param_type;
mod path;
mod token;
mod topic;

pub use self::decode::decode;
pub use self::encode::{encode, encode_topic};
pub use self::entries::{AbiError, Constructor, Event, Function};
pub use self::param::{EventParam, Param, StateMutability};
pub use self::param_type::ParamType;
pub use self::token::Token;
pub use self::topic::{RawLog, Topic, TopicFilter};

use self::json::{Entry, JsonEntry};
use crate::errors::ParseError;
use crate::hash::H32;
use crate::H256;
use serde::de::{Deserialize, Deserializer, Error as _};
use serde_json::Value;
use std::collections::HashMap;

/// A contract interface with indexes for constant time lookups of its
/// functions, events and errors.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Abi {
    constructor: Option<Constructor>,
    functions: Vec<Function>,
    events: Vec<Event>,
    errors: Vec<AbiError>,
    receive: bool,
    fallback: bool,
    functions_by_name: HashMap<String, Vec<usize>>,
    functions_by_selector: HashMap<H32, usize>,
    events_by_name: HashMap<String, Vec<usize>>,
    events_by_topic: HashMap<H256, usize>,
    errors_by_selector: HashMap<H32, usize>,
}

impl Abi {
    /// Builds the model from ABI JSON text.
    ///
    /// The text is either an array of entries or an object holding one in
    /// its `abi` field, as found in compiler artifacts.
    pub fn build(text: &str) -> Result<Self, ParseError> {
        let value = serde_json::from_str::<Value>(text)?;
        Abi::from_value(value)
    }

    /// Builds the model from a parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        let entries = match value {
            Value::Array(_) => value,
            Value::Object(mut object) => object.remove("abi").ok_or(ParseError::InvalidDocument)?,
            _ => return Err(ParseError::InvalidDocument),
        };
        let entries = serde_json::from_value::<Vec<JsonEntry>>(entries)?;
        Abi::from_json_entries(entries)
    }

    fn from_json_entries(entries: Vec<JsonEntry>) -> Result<Self, ParseError> {
        let mut constructor = None;
        let mut functions = Vec::new();
        let mut events = Vec::new();
        let mut errors = Vec::new();
        let mut receive = false;
        let mut fallback = false;

        for entry in entries {
            match entry.into_entry()? {
                Entry::Function(function) => functions.push(function),
                Entry::Event(event) => events.push(event),
                Entry::Error(error) => errors.push(error),
                Entry::Constructor(value) => constructor = Some(value),
                Entry::Receive => receive = true,
                Entry::Fallback => fallback = true,
            }
        }

        Abi::from_parts(constructor, functions, events, errors, receive, fallback)
    }

    /// Assembles and validates a model from its entries.
    ///
    /// Fails if two functions or two errors share a selector or if an event
    /// has more indexed parameters than available topics. Events with
    /// duplicate signatures are kept but logged.
    pub fn from_parts(
        constructor: Option<Constructor>,
        functions: Vec<Function>,
        events: Vec<Event>,
        errors: Vec<AbiError>,
        receive: bool,
        fallback: bool,
    ) -> Result<Self, ParseError> {
        let mut functions_by_name = HashMap::<_, Vec<_>>::new();
        let mut functions_by_selector = HashMap::new();
        for (i, function) in functions.iter().enumerate() {
            if let Some(previous) = functions_by_selector.insert(function.selector(), i) {
                return Err(ParseError::DuplicateSelector {
                    kind: "function",
                    first: functions[previous].signature(),
                    second: function.signature(),
                    selector: function.selector(),
                });
            }
            functions_by_name
                .entry(function.name.clone())
                .or_default()
                .push(i);
        }

        let mut errors_by_selector = HashMap::new();
        for (i, error) in errors.iter().enumerate() {
            if let Some(previous) = errors_by_selector.insert(error.selector(), i) {
                return Err(ParseError::DuplicateSelector {
                    kind: "error",
                    first: errors[previous].signature(),
                    second: error.signature(),
                    selector: error.selector(),
                });
            }
        }

        let mut events_by_name = HashMap::<_, Vec<_>>::new();
        let mut events_by_topic = HashMap::new();
        for (i, event) in events.iter().enumerate() {
            let indexed = event.inputs.iter().filter(|param| param.indexed).count();
            if indexed > event.max_indexed() {
                return Err(ParseError::TooManyIndexed {
                    event: event.abi_signature(),
                    count: indexed,
                    max: event.max_indexed(),
                });
            }
            if !event.anonymous {
                if events_by_topic.contains_key(&event.signature()) {
                    tracing::warn!(
                        event = %event.abi_signature(),
                        "duplicate event signature in ABI"
                    );
                } else {
                    events_by_topic.insert(event.signature(), i);
                }
            }
            events_by_name
                .entry(event.name.clone())
                .or_default()
                .push(i);
        }

        Ok(Abi {
            constructor,
            functions,
            events,
            errors,
            receive,
            fallback,
            functions_by_name,
            functions_by_selector,
            events_by_name,
            events_by_topic,
            errors_by_selector,
        })
    }

    /// The contract constructor, if declared.
    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    /// All functions in declaration order.
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// All events in declaration order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// All errors in declaration order.
    pub fn errors(&self) -> &[AbiError] {
        &self.errors
    }

    /// Whether the contract declares a `receive` entry point.
    pub fn has_receive(&self) -> bool {
        self.receive
    }

    /// Whether the contract declares a `fallback` entry point.
    pub fn has_fallback(&self) -> bool {
        self.fallback
    }

    /// Finds a function by name. For overloaded functions this is the first
    /// one declared; see [`Abi::functions_by_name`].
    pub fn find_function(&self, name: &str) -> Option<&Function> {
        let index = *self.functions_by_name.get(name)?.first()?;
        self.functions.get(index)
    }

    /// Finds all overloads of a function in declaration order.
    pub fn functions_by_name(&self, name: &str) -> impl Iterator<Item = &Function> + '_ {
        self.functions_by_name
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(move |index| self.functions.get(*index))
    }

    /// Finds a function by its selector.
    pub fn function_by_selector(&self, selector: &H32) -> Option<&Function> {
        let index = *self.functions_by_selector.get(selector)?;
        self.functions.get(index)
    }

    /// Finds an event by name. For overloaded events this is the first one
    /// declared.
    pub fn find_event(&self, name: &str) -> Option<&Event> {
        let index = *self.events_by_name.get(name)?.first()?;
        self.events.get(index)
    }

    /// Finds a non-anonymous event by its topic 0.
    pub fn event_by_topic(&self, topic: &H256) -> Option<&Event> {
        let index = *self.events_by_topic.get(topic)?;
        self.events.get(index)
    }

    /// Finds an error by its selector.
    pub fn find_error_by_selector(&self, selector: &H32) -> Option<&AbiError> {
        let index = *self.errors_by_selector.get(selector)?;
        self.errors.get(index)
    }
}

impl<'de> Deserialize<'de> for Abi {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<JsonEntry>::deserialize(deserializer)?;
        Abi::from_json_entries(entries).map_err(D::Error::custom)
    }
}
