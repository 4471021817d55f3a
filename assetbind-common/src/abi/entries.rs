//! Functions, events, errors and constructors of a contract interface.

use crate::abi::decode::decode_params;
use crate::abi::encode::{encode_params, encode_topic};
use crate::abi::{EventParam, Param, ParamType, RawLog, StateMutability, Token, Topic, TopicFilter};
use crate::errors::{DecodeError, DecodeErrorKind, EncodeError};
use crate::hash::{self, H32};
use crate::H256;

fn signature_of<'a>(name: &str, kinds: impl Iterator<Item = &'a ParamType>) -> String {
    format!(
        "{}({})",
        name,
        kinds.map(ToString::to_string).collect::<Vec<_>>().join(","),
    )
}

fn types_and_names(params: &[Param]) -> (Vec<&ParamType>, Vec<&str>) {
    params
        .iter()
        .map(|param| (&param.kind, param.name.as_str()))
        .unzip()
}

/// A contract function.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Function {
    /// The function name, exactly as declared.
    pub name: String,
    /// The function inputs.
    pub inputs: Vec<Param>,
    /// The function outputs.
    pub outputs: Vec<Param>,
    /// The function state mutability.
    pub state_mutability: StateMutability,
}

impl Function {
    /// The canonical signature, for example `balanceOf(address,uint256)`.
    pub fn signature(&self) -> String {
        signature_of(&self.name, self.inputs.iter().map(|param| &param.kind))
    }

    /// The signature including outputs, for example
    /// `balanceOf(address,uint256):(uint256)`.
    pub fn abi_signature(&self) -> String {
        format!(
            "{}:{}",
            self.signature(),
            signature_of("", self.outputs.iter().map(|param| &param.kind)),
        )
    }

    /// The 4-byte selector derived from the canonical signature.
    pub fn selector(&self) -> H32 {
        hash::function_selector(self.signature())
    }

    /// Returns `true` if the function can be evaluated with a read-only call.
    pub fn is_constant(&self) -> bool {
        self.state_mutability.is_constant()
    }

    /// Encodes call data: the selector followed by the encoded arguments.
    pub fn encode_input(&self, tokens: &[Token]) -> Result<Vec<u8>, EncodeError> {
        let (types, names) = types_and_names(&self.inputs);
        let arguments = encode_params(&types, &names, tokens)?;

        let mut data = Vec::with_capacity(4 + arguments.len());
        data.extend_from_slice(&self.selector());
        data.extend_from_slice(&arguments);
        Ok(data)
    }

    /// Decodes arguments from call data with the selector already stripped.
    pub fn decode_input(&self, data: &[u8]) -> Result<Vec<Token>, DecodeError> {
        let (types, names) = types_and_names(&self.inputs);
        decode_params(&types, &names, data)
    }

    /// Encodes return values.
    pub fn encode_output(&self, tokens: &[Token]) -> Result<Vec<u8>, EncodeError> {
        let (types, names) = types_and_names(&self.outputs);
        encode_params(&types, &names, tokens)
    }

    /// Decodes return data into output values.
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<Token>, DecodeError> {
        let (types, names) = types_and_names(&self.outputs);
        decode_params(&types, &names, data)
    }
}

/// A contract event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Event {
    /// The event name, exactly as declared.
    pub name: String,
    /// The event parameters in declaration order.
    pub inputs: Vec<EventParam>,
    /// Whether the event omits its signature from topic 0.
    pub anonymous: bool,
}

impl Event {
    /// The canonical signature, for example
    /// `URI(string,uint256)`.
    pub fn abi_signature(&self) -> String {
        signature_of(&self.name, self.inputs.iter().map(EventParam::kind))
    }

    /// The topic 0 of the event, the Keccak256 hash of its canonical
    /// signature.
    pub fn signature(&self) -> H256 {
        hash::event_topic(self.abi_signature())
    }

    /// The number of topics a log of this event has.
    pub fn topic_count(&self) -> usize {
        let indexed = self.inputs.iter().filter(|param| param.indexed).count();
        indexed + usize::from(!self.anonymous)
    }

    /// The maximum number of indexed parameters this event can declare.
    pub fn max_indexed(&self) -> usize {
        if self.anonymous {
            4
        } else {
            3
        }
    }

    /// Builds a topic filter from filters on the indexed parameters in
    /// declaration order. Missing trailing filters match anything.
    pub fn topic_filter<I>(&self, indexed: I) -> Result<TopicFilter, EncodeError>
    where
        I: IntoIterator<Item = Topic<Token>>,
    {
        let params = self
            .inputs
            .iter()
            .filter(|param| param.indexed)
            .collect::<Vec<_>>();
        let indexed = indexed.into_iter().collect::<Vec<_>>();
        if indexed.len() > params.len() {
            return Err(EncodeError::LengthMismatch {
                path: "topics".to_owned(),
                expected: params.len(),
                actual: indexed.len(),
            });
        }

        let mut slots = Vec::with_capacity(4);
        if !self.anonymous {
            slots.push(Topic::This(self.signature()));
        }
        for (param, topic) in params
            .iter()
            .zip(indexed.into_iter().chain(std::iter::repeat_with(|| Topic::Any)))
        {
            slots.push(topic.try_map(|token| encode_topic(param.kind(), &token, param.name()))?);
        }

        let mut slots = slots.into_iter();
        Ok(TopicFilter {
            topic0: slots.next().unwrap_or_default(),
            topic1: slots.next().unwrap_or_default(),
            topic2: slots.next().unwrap_or_default(),
            topic3: slots.next().unwrap_or_default(),
        })
    }

    /// Decodes the parameters of a log of this event in declaration order.
    ///
    /// Indexed parameters of reference types cannot be recovered from their
    /// topic and decode to the 32-byte topic hash as a `FixedBytes` token.
    pub fn parse_log(&self, log: &RawLog) -> Result<Vec<Token>, DecodeError> {
        let expected = self.topic_count();
        if log.topics.len() != expected {
            return Err(DecodeError::new(
                "topics",
                0,
                DecodeErrorKind::TopicCount {
                    expected,
                    actual: log.topics.len(),
                },
            ));
        }

        let mut topics = log.topics.iter();
        if !self.anonymous && topics.next() != Some(&self.signature()) {
            return Err(DecodeError::new(
                "topic0",
                0,
                DecodeErrorKind::TopicMismatch,
            ));
        }

        let (types, names): (Vec<_>, Vec<_>) = self
            .inputs
            .iter()
            .filter(|param| !param.indexed)
            .map(|param| (param.kind(), param.name()))
            .unzip();
        let mut data = decode_params(&types, &names, &log.data)?.into_iter();

        let mut tokens = Vec::with_capacity(self.inputs.len());
        for param in &self.inputs {
            let token = if param.indexed {
                let topic = topics.next().ok_or_else(|| missing(param))?;
                if param.kind().is_value_type() {
                    let kinds = [param.kind()];
                    decode_params(&kinds, &[param.name()], topic.as_bytes())?
                        .pop()
                        .ok_or_else(|| missing(param))?
                } else {
                    Token::FixedBytes(topic.as_bytes().to_vec())
                }
            } else {
                data.next().ok_or_else(|| missing(param))?
            };
            tokens.push(token);
        }
        Ok(tokens)
    }
}

fn missing(param: &EventParam) -> DecodeError {
    DecodeError::new(
        param.name(),
        0,
        DecodeErrorKind::Truncated {
            needed: 1,
            available: 0,
        },
    )
}

/// A custom error declared by a contract.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AbiError {
    /// The error name, exactly as declared.
    pub name: String,
    /// The error arguments.
    pub inputs: Vec<Param>,
}

impl AbiError {
    /// The canonical signature, for example
    /// `OwnableUnauthorizedAccount(address)`.
    pub fn signature(&self) -> String {
        signature_of(&self.name, self.inputs.iter().map(|param| &param.kind))
    }

    /// The 4-byte selector that prefixes revert data for this error.
    pub fn selector(&self) -> H32 {
        hash::function_selector(self.signature())
    }

    /// Encodes revert data: the selector followed by the encoded arguments.
    pub fn encode(&self, tokens: &[Token]) -> Result<Vec<u8>, EncodeError> {
        let (types, names) = types_and_names(&self.inputs);
        let arguments = encode_params(&types, &names, tokens)?;

        let mut data = Vec::with_capacity(4 + arguments.len());
        data.extend_from_slice(&self.selector());
        data.extend_from_slice(&arguments);
        Ok(data)
    }

    /// Decodes error arguments from revert data with the selector already
    /// stripped.
    pub fn decode(&self, data: &[u8]) -> Result<Vec<Token>, DecodeError> {
        let (types, names) = types_and_names(&self.inputs);
        decode_params(&types, &names, data)
    }
}

/// A contract constructor.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Constructor {
    /// The constructor arguments.
    pub inputs: Vec<Param>,
}
