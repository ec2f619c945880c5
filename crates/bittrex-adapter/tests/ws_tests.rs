/*
[INPUT]:  In-process WebSocket stub server
[OUTPUT]: Test results for stream lifecycle and delivery ordering
[POS]:    Integration tests - WebSocket stream manager
[UPDATE]: When stream channels or reconnect behavior change
*/

use std::time::Duration;

use bittrex_adapter::ws::{BittrexWebSocket, StreamConfig, StreamState};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

const WAIT: Duration = Duration::from_secs(5);

type ServerWs = WebSocketStream<TcpStream>;

async fn stub_listener() -> (TcpListener, StreamConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let config = StreamConfig {
        url: format!("ws://{addr}"),
        base_backoff: Duration::from_millis(50),
        max_backoff: Duration::from_millis(200),
        max_reconnect_attempts: 5,
        ..StreamConfig::default()
    };
    (listener, config)
}

async fn accept_session(listener: &TcpListener) -> ServerWs {
    let (socket, _) = timeout(WAIT, listener.accept())
        .await
        .expect("accept deadline")
        .expect("accept");
    timeout(WAIT, accept_async(socket))
        .await
        .expect("handshake deadline")
        .expect("handshake")
}

/// Next text frame parsed as JSON; close frames and pings are skipped.
async fn recv_json(server: &mut ServerWs) -> Option<Value> {
    loop {
        let frame = timeout(WAIT, server.next())
            .await
            .expect("frame deadline")?
            .ok()?;
        match frame {
            Message::Text(text) => return serde_json::from_str(&text.to_string()).ok(),
            Message::Close(_) => return None,
            _ => {}
        }
    }
}

fn subscribed_symbol(frame: &Value) -> Option<&str> {
    frame["subscribe"]["symbol"].as_str()
}

async fn send_ack(server: &mut ServerWs, symbol: &str) {
    let frame = json!({ "channel": "ack", "action": "subscribe", "symbol": symbol });
    server
        .send(Message::Text(frame.to_string().into()))
        .await
        .expect("send ack");
}

async fn send_delta(server: &mut ServerWs, symbol: &str, nonce: u64) {
    let frame = json!({
        "channel": "market_delta",
        "symbol": symbol,
        "data": { "nonce": nonce, "buys": [], "sells": [], "fills": [] }
    });
    server
        .send(Message::Text(frame.to_string().into()))
        .await
        .expect("send delta");
}

#[tokio::test]
async fn test_deltas_before_the_subscribe_ack_are_discarded() {
    let (listener, config) = stub_listener().await;
    let client = BittrexWebSocket::with_config(config);

    let mut sub = timeout(WAIT, client.subscribe("BTC-USD"))
        .await
        .expect("subscribe deadline")
        .expect("subscribe");

    let mut server = accept_session(&listener).await;
    let frame = recv_json(&mut server).await.expect("subscribe frame");
    assert_eq!(subscribed_symbol(&frame), Some("BTC-USD"));

    // sent before the ack: belongs to no session, must never be delivered
    send_delta(&mut server, "BTC-USD", 1).await;
    send_ack(&mut server, "BTC-USD").await;
    send_delta(&mut server, "BTC-USD", 2).await;
    send_delta(&mut server, "BTC-USD", 3).await;

    let first = timeout(WAIT, sub.recv())
        .await
        .expect("recv deadline")
        .expect("delta");
    assert_eq!(first.nonce, 2);

    let second = timeout(WAIT, sub.recv())
        .await
        .expect("recv deadline")
        .expect("delta");
    assert_eq!(second.nonce, 3);

    assert_eq!(client.state(), StreamState::Subscribed);
    client.shutdown().await;
}

#[tokio::test]
async fn test_reconnect_replays_subscriptions_in_order_and_gates_delivery() {
    let (listener, config) = stub_listener().await;
    let client = BittrexWebSocket::with_config(config);

    let mut sub_a = timeout(WAIT, client.subscribe("BTC-USD"))
        .await
        .expect("subscribe deadline")
        .expect("subscribe A");

    let mut server = accept_session(&listener).await;
    let frame = recv_json(&mut server).await.expect("subscribe frame");
    assert_eq!(subscribed_symbol(&frame), Some("BTC-USD"));

    let mut sub_b = timeout(WAIT, client.subscribe("ETH-USD"))
        .await
        .expect("subscribe deadline")
        .expect("subscribe B");
    let frame = recv_json(&mut server).await.expect("subscribe frame");
    assert_eq!(subscribed_symbol(&frame), Some("ETH-USD"));

    send_ack(&mut server, "BTC-USD").await;
    send_ack(&mut server, "ETH-USD").await;
    send_delta(&mut server, "BTC-USD", 1).await;

    let first = timeout(WAIT, sub_a.recv())
        .await
        .expect("recv deadline")
        .expect("delta");
    assert_eq!(first.nonce, 1);

    // force a disconnect; the task must reconnect on its own
    drop(server);

    let mut server = accept_session(&listener).await;

    // replay arrives in original subscription order
    let frame = recv_json(&mut server).await.expect("replayed frame");
    assert_eq!(subscribed_symbol(&frame), Some("BTC-USD"));
    let frame = recv_json(&mut server).await.expect("replayed frame");
    assert_eq!(subscribed_symbol(&frame), Some("ETH-USD"));

    // nothing may be delivered until BOTH replayed subscribes are acked
    send_delta(&mut server, "BTC-USD", 99).await;
    send_ack(&mut server, "BTC-USD").await;
    send_delta(&mut server, "BTC-USD", 100).await;
    send_ack(&mut server, "ETH-USD").await;
    send_delta(&mut server, "BTC-USD", 101).await;
    send_delta(&mut server, "ETH-USD", 7).await;

    let resumed = timeout(WAIT, sub_a.recv())
        .await
        .expect("recv deadline")
        .expect("delta");
    assert_eq!(resumed.nonce, 101);

    let other = timeout(WAIT, sub_b.recv())
        .await
        .expect("recv deadline")
        .expect("delta");
    assert_eq!(other.nonce, 7);

    client.shutdown().await;
}

#[tokio::test]
async fn test_removing_the_last_subscription_tears_the_connection_down() {
    let (listener, config) = stub_listener().await;
    let client = BittrexWebSocket::with_config(config);

    let mut sub = timeout(WAIT, client.subscribe("BTC-USD"))
        .await
        .expect("subscribe deadline")
        .expect("subscribe");

    let mut server = accept_session(&listener).await;
    let frame = recv_json(&mut server).await.expect("subscribe frame");
    assert_eq!(subscribed_symbol(&frame), Some("BTC-USD"));
    send_ack(&mut server, "BTC-USD").await;

    let handle = sub.handle().clone();
    timeout(WAIT, client.unsubscribe(&handle))
        .await
        .expect("unsubscribe deadline")
        .expect("unsubscribe");

    // the wire sees an unsubscribe frame, then the connection closes
    let frame = recv_json(&mut server).await.expect("unsubscribe frame");
    assert_eq!(frame["unsubscribe"]["symbol"].as_str(), Some("BTC-USD"));
    assert!(recv_json(&mut server).await.is_none());

    // the delivery channel closes with the subscription
    assert!(timeout(WAIT, sub.recv()).await.expect("recv deadline").is_none());

    client.shutdown().await;
}

#[tokio::test]
async fn test_two_subscribers_for_one_market_both_receive_the_delta() {
    let (listener, config) = stub_listener().await;
    let client = BittrexWebSocket::with_config(config);

    let mut first = timeout(WAIT, client.subscribe("BTC-USD"))
        .await
        .expect("subscribe deadline")
        .expect("subscribe");
    let mut second = timeout(WAIT, client.subscribe("BTC-USD"))
        .await
        .expect("subscribe deadline")
        .expect("subscribe");

    let mut server = accept_session(&listener).await;
    let frame = recv_json(&mut server).await.expect("subscribe frame");
    assert_eq!(subscribed_symbol(&frame), Some("BTC-USD"));
    send_ack(&mut server, "BTC-USD").await;
    send_delta(&mut server, "BTC-USD", 5).await;

    let a = timeout(WAIT, first.recv())
        .await
        .expect("recv deadline")
        .expect("delta");
    let b = timeout(WAIT, second.recv())
        .await
        .expect("recv deadline")
        .expect("delta");
    assert_eq!(a.nonce, 5);
    assert_eq!(b.nonce, 5);

    // dropping one handle must not unsubscribe the market for the other
    let handle = first.handle().clone();
    timeout(WAIT, client.unsubscribe(&handle))
        .await
        .expect("unsubscribe deadline")
        .expect("unsubscribe");

    send_delta(&mut server, "BTC-USD", 6).await;
    let still = timeout(WAIT, second.recv())
        .await
        .expect("recv deadline")
        .expect("delta");
    assert_eq!(still.nonce, 6);

    client.shutdown().await;
}
