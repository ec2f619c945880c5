/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::enums::{FillType, OrderStatus, OrderType, TradeSide};

/// Tradable market reference data, refreshed periodically by callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Market {
    pub market_currency: String,
    pub base_currency: String,
    pub market_currency_long: String,
    pub base_currency_long: String,
    pub min_trade_size: Decimal,
    pub market_name: String,
    pub is_active: bool,
    pub created: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Currency {
    pub currency: String,
    pub currency_long: String,
    pub min_confirmation: u32,
    pub tx_fee: Decimal,
    pub is_active: bool,
    pub coin_type: String,
    #[serde(default)]
    pub base_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ticker {
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketSummary {
    pub market_name: String,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
    pub last: Decimal,
    pub base_volume: Decimal,
    pub time_stamp: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub open_buy_orders: u32,
    pub open_sell_orders: u32,
    pub prev_day: Decimal,
    pub created: String,
}

/// One price level of an order book snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderBookEntry {
    pub quantity: Decimal,
    pub rate: Decimal,
}

/// Depth snapshot. The wire uses lowercase `buy` / `sell` keys while the
/// entries themselves are PascalCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    #[serde(default)]
    pub buy: Vec<OrderBookEntry>,
    #[serde(default)]
    pub sell: Vec<OrderBookEntry>,
}

/// Public trade history row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketTrade {
    pub id: u64,
    pub time_stamp: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub total: Decimal,
    pub fill_type: FillType,
    pub order_type: TradeSide,
}

/// Open or historical order row as reported by the exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    #[serde(default)]
    pub uuid: Option<String>,
    pub order_uuid: String,
    /// Market identifier, e.g. `BTC-LTC`
    pub exchange: String,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub quantity_remaining: Decimal,
    pub limit: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub price_per_unit: Option<Decimal>,
    #[serde(default)]
    pub commission_paid: Decimal,
    pub opened: String,
    #[serde(default)]
    pub closed: Option<String>,
    #[serde(default)]
    pub cancel_initiated: bool,
    #[serde(default)]
    pub immediate_or_cancel: bool,
}

impl Order {
    /// Lifecycle state, derived only from exchange-reported fields.
    pub fn status(&self) -> OrderStatus {
        if self.closed.is_some() {
            if self.cancel_initiated || self.quantity_remaining > Decimal::ZERO {
                OrderStatus::Cancelled
            } else {
                OrderStatus::Filled
            }
        } else if self.quantity_remaining < self.quantity {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Open
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountBalance {
    pub currency: String,
    pub balance: Decimal,
    pub available: Decimal,
    pub pending: Decimal,
    #[serde(default)]
    pub crypto_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DepositAddress {
    pub currency: String,
    pub address: String,
}
