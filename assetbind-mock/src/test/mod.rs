use crate::predicate;
use crate::*;
use assetbind::common::Abi;
use assetbind::errors::{ExecutionError, RevertReason};
use assetbind::futures::StreamExt as _;
use assetbind::transport::TransportError;
use assetbind::{Instance, U256};
use mockall::predicate::always;

const ABI: &str = r#"[
    {
        "type": "function",
        "name": "balanceOf",
        "inputs": [
            { "name": "account", "type": "address" },
            { "name": "id", "type": "uint256" }
        ],
        "outputs": [{ "name": "", "type": "uint256" }],
        "stateMutability": "view"
    },
    {
        "type": "function",
        "name": "buy",
        "inputs": [{ "name": "_id", "type": "uint256" }],
        "outputs": [],
        "stateMutability": "payable"
    },
    {
        "type": "event",
        "name": "URI",
        "inputs": [
            { "name": "value", "type": "string", "indexed": false },
            { "name": "id", "type": "uint256", "indexed": true }
        ],
        "anonymous": false
    },
    {
        "type": "error",
        "name": "OwnableUnauthorizedAccount",
        "inputs": [{ "name": "account", "type": "address" }]
    }
]"#;

fn abi() -> Arc<Abi> {
    Arc::new(Abi::build(ABI).unwrap())
}

fn function(name: &str) -> Function {
    abi().find_function(name).unwrap().clone()
}

#[tokio::test]
async fn returns_encoded_outputs() {
    let balance_of = function("balanceOf");
    let holder = address_for("holder");

    let mut node = MockNode::new();
    node.expect_call()
        .with(
            predicate::calls_with(&balance_of, (holder, U256::from(1))),
            always(),
        )
        .times(1)
        .returning({
            let balance_of = balance_of.clone();
            move |_, _| returns(&balance_of, U256::from(42))
        });

    let instance = Instance::at(Arc::new(node), abi(), address_for("equity"));
    let balance: U256 = instance
        .view_method(balance_of.selector(), (holder, U256::from(1)))
        .unwrap()
        .call()
        .await
        .unwrap();
    assert_eq!(balance, 42.into());
}

#[tokio::test]
async fn reverts_with_custom_errors() {
    let abi = abi();
    let error = abi.errors()[0].clone();
    let account = address_for("intruder");

    let mut node = MockNode::new();
    node.expect_call()
        .returning(move |_, _| reverts_with(&error, account));

    let instance = Instance::at(Arc::new(node), abi.clone(), address_for("equity"));
    let err = instance
        .view_method::<_, U256>(function("balanceOf").selector(), (account, U256::zero()))
        .unwrap()
        .call()
        .await
        .unwrap_err();

    let revert = err.inner.as_revert().unwrap();
    assert_eq!(revert.selector(), Some([0x11, 0x8c, 0xda, 0xa7]));
    let (error, tokens) = revert.resolve(&abi).unwrap();
    assert_eq!(error.name, "OwnableUnauthorizedAccount");
    assert_eq!(tokens, vec![Token::Address(account)]);
}

#[tokio::test]
async fn reverts_with_reasons() {
    let mut node = MockNode::new();
    node.expect_call()
        .returning(|_, _| reverts_with_reason("not for sale"));

    let instance = Instance::at(Arc::new(node), abi(), address_for("equity"));
    let err = instance
        .view_method::<_, U256>(function("balanceOf").selector(), (Address::zero(), U256::zero()))
        .unwrap()
        .call()
        .await
        .unwrap_err();

    let revert = err.inner.as_revert().unwrap();
    assert_eq!(revert.reason().as_deref(), Some("not for sale"));
    assert!(matches!(
        revert.decode::<NoErrors>(),
        RevertReason::Error(reason) if reason == "not for sale"
    ));
}

#[derive(Debug)]
struct NoErrors;

impl assetbind::errors::ContractRevert for NoErrors {
    fn decode_revert(_: &assetbind::errors::Revert) -> Option<Self> {
        None
    }
}

#[tokio::test]
async fn accepts_transactions() {
    let buy = function("buy");
    let buyer = address_for("buyer");
    let hash = H256::repeat_byte(0x42);

    let mut node = MockNode::new();
    node.expect_submit()
        .with(predicate::sends_with(&buy, U256::from(3)))
        .times(1)
        .returning(move |request| {
            assert_eq!(request.from, Some(buyer));
            assert_eq!(request.value, Some(U256::exp10(18)));
            accepted(hash)
        });

    let instance = Instance::at(Arc::new(node), abi(), address_for("equity"));
    let handle = instance
        .method::<_, ()>(buy.selector(), U256::from(3))
        .unwrap()
        .from(buyer)
        .value(U256::exp10(18))
        .send()
        .await
        .unwrap();
    assert_eq!(handle.hash, hash);
}

#[tokio::test]
async fn transport_failures_are_execution_errors() {
    let mut node = MockNode::new();
    node.expect_submit()
        .returning(|_| fails(TransportError::Closed));

    let instance = Instance::at(Arc::new(node), abi(), address_for("equity"));
    let err = instance
        .method::<_, ()>(function("buy").selector(), U256::from(3))
        .unwrap()
        .send()
        .await
        .unwrap_err();
    assert!(matches!(
        err.inner,
        ExecutionError::Transport(TransportError::Closed)
    ));
}

#[test]
fn encodes_event_logs() {
    let abi = abi();
    let uri = abi.find_event("URI").unwrap();
    let log = event_log(
        address_for("equity"),
        uri,
        ("ipfs://share".to_owned(), U256::from(7)),
    )
    .unwrap();

    assert_eq!(log.topics.len(), 2);
    assert_eq!(log.topics[0], uri.signature());
    assert_eq!(log.topics[1], H256::from_low_u64_be(7));
    let tokens = uri.parse_log(&log.to_raw()).unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::String("ipfs://share".to_owned()),
            Token::Uint(7.into())
        ]
    );

    let log = mined(log, 10, 2);
    assert_eq!(log.position(), Some((10, 2)));
}

#[tokio::test]
async fn feeds_subscriptions() {
    let (feed, mut subscription) = log_feed();
    assert!(feed.push(Log::default()));
    feed.close();

    let logs = subscription.stream.by_ref().collect::<Vec<_>>().await;
    assert_eq!(logs.len(), 1);

    assert!(!feed.is_unsubscribed());
    subscription.unsubscribe.take().unwrap().await;
    assert!(feed.is_unsubscribed());
}
