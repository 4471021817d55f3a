//! Predicates over the requests a [`MockNode`](crate::MockNode) receives.
//!
//! These plug into `mockall`'s `with` the same way the predicates from
//! [`mockall::predicate`] do, for example:
//!
//! ```ignore
//! node.expect_submit()
//!     .with(predicate::sends_with(safe_transfer_from, (from, to, id, amount, data)))
//!     .returning(|_| assetbind_mock::accepted(hash));
//! ```

use assetbind::common::abi::{Event, Function, Token};
use assetbind::common::hash::H32;
use assetbind::tokens::Tokenize;
use assetbind::transport::{CallRequest, LogFilter, TransactionRequest};
use assetbind::Address;
use predicates::function::{function, FnPredicate};
use predicates::Predicate;

fn has_selector(data: &[u8], selector: &H32) -> bool {
    data.get(..4) == Some(&selector[..])
}

/// Decodes call data against `function`, returning the argument tokens when
/// the selector matches.
fn arguments(function: &Function, data: &[u8]) -> Option<Vec<Token>> {
    if !has_selector(data, &function.selector()) {
        return None;
    }
    function.decode_input(&data[4..]).ok()
}

fn expected_tokens<A: Tokenize>(function: &Function, arguments: A) -> Vec<Token> {
    match (function.inputs.len(), arguments.into_token()) {
        (0, _) => Vec::new(),
        (1, token) => vec![token],
        (_, Token::Tuple(tokens)) => tokens,
        (_, token) => vec![token],
    }
}

/// Matches calls of `function`, whatever their arguments.
pub fn calls(function: &Function) -> impl Predicate<CallRequest> + Send {
    let selector = function.selector();
    function_predicate("calls", move |request: &CallRequest| {
        has_selector(&request.data, &selector)
    })
}

/// Matches calls of `function` with exactly the given arguments.
pub fn calls_with<A: Tokenize>(function: &Function, args: A) -> impl Predicate<CallRequest> + Send {
    let expected = expected_tokens(function, args);
    let function = function.clone();
    function_predicate("calls_with", move |request: &CallRequest| {
        arguments(&function, &request.data).as_ref() == Some(&expected)
    })
}

/// Matches transactions invoking `function`, whatever their arguments.
pub fn sends(function: &Function) -> impl Predicate<TransactionRequest> + Send {
    let selector = function.selector();
    function_predicate("sends", move |request: &TransactionRequest| {
        has_selector(&request.data, &selector)
    })
}

/// Matches transactions invoking `function` with exactly the given
/// arguments.
pub fn sends_with<A: Tokenize>(
    function: &Function,
    args: A,
) -> impl Predicate<TransactionRequest> + Send {
    let expected = expected_tokens(function, args);
    let function = function.clone();
    function_predicate("sends_with", move |request: &TransactionRequest| {
        arguments(&function, &request.data).as_ref() == Some(&expected)
    })
}

/// Matches plain value transfers, transactions without call data.
pub fn transfers() -> impl Predicate<TransactionRequest> + Send {
    function_predicate("transfers", |request: &TransactionRequest| {
        request.data.is_empty()
    })
}

/// Matches transactions from `sender`.
pub fn sent_from(sender: Address) -> impl Predicate<TransactionRequest> + Send {
    function_predicate("sent_from", move |request: &TransactionRequest| {
        request.from == Some(sender)
    })
}

/// Matches log queries and subscriptions for `event` at `address`.
pub fn filters(address: Address, event: &Event) -> impl Predicate<LogFilter> + Send {
    let topic = event.signature();
    function_predicate("filters", move |filter: &LogFilter| {
        filter.address == address && filter.topics.topic0.matches(&topic)
    })
}

fn function_predicate<T, F>(name: &'static str, f: F) -> FnPredicate<F, T>
where
    F: Fn(&T) -> bool,
{
    function(f).fn_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetbind::common::abi::{Param, ParamType, StateMutability};
    use assetbind::U256;

    fn buy() -> Function {
        Function {
            name: "buy".to_owned(),
            inputs: vec![Param::new("_id", ParamType::Uint(256))],
            outputs: vec![],
            state_mutability: StateMutability::Payable,
        }
    }

    fn request(function: &Function, id: u64) -> TransactionRequest {
        TransactionRequest {
            data: function.encode_input(&[Token::Uint(id.into())]).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn matches_selectors() {
        let buy = buy();
        assert!(sends(&buy).eval(&request(&buy, 1)));
        assert!(!sends(&buy).eval(&TransactionRequest::default()));
        assert!(transfers().eval(&TransactionRequest::default()));
    }

    #[test]
    fn matches_arguments() {
        let buy = buy();
        assert!(sends_with(&buy, U256::from(7)).eval(&request(&buy, 7)));
        assert!(!sends_with(&buy, U256::from(7)).eval(&request(&buy, 8)));
    }
}
