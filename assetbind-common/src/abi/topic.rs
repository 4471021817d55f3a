//! Log topics and topic filters.

use crate::H256;
use serde::ser::{Serialize, Serializer};

/// A raw log as it appears on chain: up to four topics and the encoded
/// non-indexed data.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RawLog {
    /// The log topics.
    pub topics: Vec<H256>,
    /// The log data.
    pub data: Vec<u8>,
}

/// A filter on a single topic slot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Topic<T> {
    /// Matches any value.
    Any,
    /// Matches any of the given values.
    OneOf(Vec<T>),
    /// Matches exactly this value.
    This(T),
}

impl<T> Topic<T> {
    /// Maps the topic values.
    pub fn map<U, F>(self, mut f: F) -> Topic<U>
    where
        F: FnMut(T) -> U,
    {
        match self {
            Topic::Any => Topic::Any,
            Topic::OneOf(values) => Topic::OneOf(values.into_iter().map(f).collect()),
            Topic::This(value) => Topic::This(f(value)),
        }
    }

    /// Maps the topic values with a fallible function.
    pub fn try_map<U, E, F>(self, mut f: F) -> Result<Topic<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(match self {
            Topic::Any => Topic::Any,
            Topic::OneOf(values) => {
                Topic::OneOf(values.into_iter().map(f).collect::<Result<_, _>>()?)
            }
            Topic::This(value) => Topic::This(f(value)?),
        })
    }

    /// Returns `true` if the topic matches anything.
    pub fn is_any(&self) -> bool {
        matches!(self, Topic::Any)
    }

    /// Checks whether a topic value passes this filter.
    pub fn matches(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        match self {
            Topic::Any => true,
            Topic::OneOf(values) => values.contains(value),
            Topic::This(expected) => expected == value,
        }
    }
}

impl<T> Default for Topic<T> {
    fn default() -> Self {
        Topic::Any
    }
}

impl<T> From<Option<T>> for Topic<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Topic::This(value),
            None => Topic::Any,
        }
    }
}

/// A set of candidate values where the empty set is a wildcard.
impl<T> From<Vec<T>> for Topic<T> {
    fn from(mut values: Vec<T>) -> Self {
        match values.len() {
            0 => Topic::Any,
            1 => Topic::This(values.remove(0)),
            _ => Topic::OneOf(values),
        }
    }
}

impl<T: Serialize> Serialize for Topic<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Topic::Any => serializer.serialize_none(),
            Topic::OneOf(values) => values.serialize(serializer),
            Topic::This(value) => value.serialize(serializer),
        }
    }
}

/// A filter over all four topic slots of a log.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TopicFilter {
    /// Topic slot 0.
    pub topic0: Topic<H256>,
    /// Topic slot 1.
    pub topic1: Topic<H256>,
    /// Topic slot 2.
    pub topic2: Topic<H256>,
    /// Topic slot 3.
    pub topic3: Topic<H256>,
}

impl TopicFilter {
    /// Returns the topic slots in order.
    pub fn slots(&self) -> [&Topic<H256>; 4] {
        [&self.topic0, &self.topic1, &self.topic2, &self.topic3]
    }

    /// Returns the topic filter in the node's `eth_getLogs` format, with
    /// trailing wildcards trimmed.
    pub fn to_topics(&self) -> Vec<Option<Vec<H256>>> {
        let mut topics = self
            .slots()
            .iter()
            .map(|topic| match topic {
                Topic::Any => None,
                Topic::OneOf(values) => Some(values.clone()),
                Topic::This(value) => Some(vec![*value]),
            })
            .collect::<Vec<_>>();
        while let Some(None) = topics.last() {
            topics.pop();
        }
        topics
    }

    /// Checks whether a log's topics pass this filter.
    pub fn matches(&self, topics: &[H256]) -> bool {
        self.slots()
            .iter()
            .enumerate()
            .all(|(i, topic)| match topics.get(i) {
                Some(value) => topic.matches(value),
                None => topic.is_any(),
            })
    }
}
