/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Order book slice selector for the depth endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSide {
    Buy,
    Sell,
    Both,
}

impl BookSide {
    /// Wire value for the `type` query parameter
    pub fn as_param(&self) -> &'static str {
        match self {
            BookSide::Buy => "buy",
            BookSide::Sell => "sell",
            BookSide::Both => "both",
        }
    }
}

/// Exchange order type as reported on open/closed order rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    #[serde(rename = "LIMIT_BUY")]
    LimitBuy,
    #[serde(rename = "LIMIT_SELL")]
    LimitSell,
}

impl OrderType {
    pub fn side(&self) -> OrderSide {
        match self {
            OrderType::LimitBuy => OrderSide::Buy,
            OrderType::LimitSell => OrderSide::Sell,
        }
    }
}

/// Lifecycle state derived from exchange-reported order fields.
///
/// The exchange reports `Closed`, `CancelInitiated` and `QuantityRemaining`;
/// transitions come only from those fields, never from local actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
}

/// Taker side of a public trade history row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Fill classification on public trade history rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FillType {
    Fill,
    #[serde(rename = "PARTIAL_FILL")]
    PartialFill,
}
