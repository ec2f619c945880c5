/*
[INPUT]:  Raw WebSocket frame payloads
[OUTPUT]: Parsed stream messages and outbound subscription frames
[POS]:    WebSocket layer - message parsing and validation
[UPDATE]: When adding new message types or changing format
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::OrderSide;

/// Inbound stream messages, tagged by channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "channel")]
pub enum StreamMessage {
    /// Server confirmation of a subscribe/unsubscribe frame
    #[serde(rename = "ack")]
    Ack { action: AckAction, symbol: String },
    #[serde(rename = "market_delta")]
    MarketDelta { symbol: String, data: MarketDelta },
    #[serde(rename = "heartbeat")]
    Heartbeat,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckAction {
    Subscribe,
    Unsubscribe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaKind {
    Add,
    Update,
    Remove,
}

/// One price-level change on a book side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDelta {
    pub kind: DeltaKind,
    pub rate: Decimal,
    pub quantity: Decimal,
}

/// One trade print
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillDelta {
    pub side: OrderSide,
    pub rate: Decimal,
    pub quantity: Decimal,
}

/// Incremental update for one market.
///
/// The per-market nonce increases with every delta; deltas for the same
/// market are delivered in nonce order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDelta {
    pub nonce: u64,
    #[serde(default)]
    pub buys: Vec<BookDelta>,
    #[serde(default)]
    pub sells: Vec<BookDelta>,
    #[serde(default)]
    pub fills: Vec<FillDelta>,
}

pub(crate) fn subscribe_frame(symbol: &str) -> serde_json::Value {
    json!({
        "subscribe": {
            "channel": "market_delta",
            "symbol": symbol
        }
    })
}

pub(crate) fn unsubscribe_frame(symbol: &str) -> serde_json::Value {
    json!({
        "unsubscribe": {
            "channel": "market_delta",
            "symbol": symbol
        }
    })
}
