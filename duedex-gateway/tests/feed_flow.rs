//! Message sequences driven through the router, without a socket.

use duedex_core::config::{ApiCredentials, ApiSecret};
use duedex_core::models::{OrderKey, OrderStatus};
use duedex_gateway::feed::{
    EventEmitter, FeedAuthenticator, FeedEvent, MessageRouter, OutboundMessage, SessionAction,
};
use duedex_gateway::store::FeedStores;
use std::sync::Arc;
use tokio::sync::broadcast;

fn setup() -> (MessageRouter, Arc<FeedStores>, broadcast::Receiver<FeedEvent>) {
    let stores = Arc::new(FeedStores::new());
    let emitter = EventEmitter::new(64);
    let events = emitter.subscribe();
    let auth = FeedAuthenticator::from_credentials(&ApiCredentials {
        key: "my-key".to_string(),
        secret: ApiSecret::new("c2VjcmV0"),
    })
    .unwrap();
    let router = MessageRouter::new(Arc::clone(&stores), emitter, Some(auth));
    (router, stores, events)
}

fn order_json(status: &str) -> String {
    format!(
        r#"{{"instrument":"BTCUSD","orderId":1,"type":"limit","isCloseOrder":false,
            "side":"long","price":"9000","size":10,"timeInForce":"gtc",
            "notionalValue":"0.0011","status":"{status}","fillPrice":"0","filledSize":0,
            "accumulatedFees":"0","createTime":"2024-01-01T00:00:00Z",
            "updateTime":"2024-01-01T00:00:00Z"}}"#
    )
}

#[test]
fn test_handshake_then_order_lifecycle() {
    let (router, stores, mut events) = setup();

    let reply = router.route(r#"{"type":"challenge","challenge":"abc123"}"#);
    assert_eq!(
        reply,
        Some(SessionAction::Send(OutboundMessage::Auth {
            key: "my-key".to_string(),
            answer: "5ae5ac802a1a5c94fb683e1bfa121f9f700a26995213ff2fc1c503eb43ec71c6".to_string(),
        }))
    );
    assert_eq!(
        router.route(r#"{"type":"auth"}"#),
        Some(SessionAction::Authenticated)
    );

    let snapshot = format!(
        r#"{{"type":"snapshot","channel":"orders","timestamp":"2024-01-01T00:00:00Z","data":[{}]}}"#,
        order_json("new")
    );
    assert_eq!(router.route(&snapshot), None);
    router.route(
        r#"{"type":"update","channel":"orders","timestamp":"2024-01-01T00:00:01Z",
            "data":[{"instrument":"BTCUSD","orderId":1,"status":"filled","filledSize":10}]}"#,
    );

    let key = OrderKey::new("BTCUSD", 1);
    match events.try_recv().unwrap() {
        FeedEvent::OrdersLoaded { orders, .. } => {
            assert_eq!(orders.len(), 1);
            assert_eq!(orders[&key].status, OrderStatus::New);
        }
        other => panic!("expected OrdersLoaded, got {other:?}"),
    }
    match events.try_recv().unwrap() {
        FeedEvent::OrdersUpdated {
            updated, active, ..
        } => {
            assert!(active.is_empty());
            assert_eq!(updated.len(), 1);
            assert_eq!(updated[0].order_id, 1);
            assert_eq!(updated[0].status, OrderStatus::Filled);
            assert_eq!(updated[0].filled_size, 10);
        }
        other => panic!("expected OrdersUpdated, got {other:?}"),
    }
    assert!(events.try_recv().is_err());
    assert!(stores.orders.is_empty());
}

#[test]
fn test_bad_message_does_not_interrupt_stream() {
    let (router, stores, mut events) = setup();

    router.route(
        r#"{"type":"snapshot","channel":"level2","instrument":"BTCUSD",
            "data":{"bids":[[100,5],[99,3]],"asks":[]}}"#,
    );
    assert_eq!(router.route("{\"type\":\"update\",\"channel\":\"level2\""), None);
    assert_eq!(
        router.route(r#"{"type":"update","channel":"level2","instrument":"BTCUSD","data":{"bids":"x"}}"#),
        None
    );
    router.route(
        r#"{"type":"update","channel":"level2","instrument":"BTCUSD",
            "data":{"bids":[[99,0]],"asks":[[101,1]]}}"#,
    );

    let book = stores.orderbooks.get("BTCUSD").unwrap();
    let bids: Vec<_> = book.bids().map(|l| (l.price.to_string(), l.size)).collect();
    assert_eq!(bids, vec![("100".to_string(), 5)]);
    assert_eq!(book.best_ask().map(|l| l.size), Some(1));

    let mut count = 0;
    while let Ok(event) = events.try_recv() {
        assert!(matches!(event, FeedEvent::OrderbookUpdated { .. }));
        count += 1;
    }
    assert_eq!(count, 2);
}

#[test]
fn test_reconnect_snapshot_replaces_stale_state() {
    let (router, stores, _events) = setup();

    router.route(
        r#"{"type":"snapshot","channel":"positions","data":[{"instrument":"BTCUSD",
            "quantity":10,"leverage":"10","entryValue":"0.001","entryPrice":"9000",
            "markPrice":"9000","liquidationPrice":"8200","positionMargin":"0.0001",
            "buyOrderMargin":"0","sellOrderMargin":"0","unrealisedPnl":"0",
            "realisedPnl":"0","riskValue":"0.001","riskLimit":"100"}]}"#,
    );
    stores.mark_stale();
    assert!(stores.positions.is_stale(&"BTCUSD".to_string()));

    router.route(r#"{"type":"snapshot","channel":"positions","data":[]}"#);
    assert!(!stores.positions.is_stale(&"BTCUSD".to_string()));
    assert!(stores.positions.is_empty());
}
